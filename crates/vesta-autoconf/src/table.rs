//! The table store: validated registries the engine matches against.
//!
//! Everything here is immutable after [`TableBuilder::build`] except the
//! attachment registry, which loadable drivers may mutate at runtime.
//! Validation is strict: corrupt tables mean the generator that emitted
//! them is broken, so the engine refuses to construct rather than boot
//! and misbehave later.

use alloc::collections::BTreeMap;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use spin::RwLock;
use vesta_driver_api::{CfAttach, CfData, CfDriver, CfIattr, DriverAttachment, PseudoDevice};

use crate::error::TableError;

/// Attachment implementations grouped by driver name.
type AttachMap = BTreeMap<&'static str, BTreeMap<&'static str, Arc<dyn DriverAttachment>>>;

/// The validated, mostly-immutable configuration tables.
pub struct TableStore {
    drivers: BTreeMap<&'static str, CfDriver>,
    /// Canonical interface attributes by name. Multiple drivers may expose
    /// the same attribute; their declarations are verified identical.
    iattrs: BTreeMap<&'static str, CfIattr>,
    attachments: RwLock<AttachMap>,
    cfdata: Vec<CfData>,
    roots: Vec<usize>,
    pseudo: Vec<PseudoDevice>,
}

impl TableStore {
    /// Starts building a table store.
    #[must_use]
    pub fn builder() -> TableBuilder {
        TableBuilder::default()
    }

    /// Looks up a driver descriptor.
    #[must_use]
    pub fn driver(&self, name: &str) -> Option<&CfDriver> {
        self.drivers.get(name)
    }

    /// Looks up the canonical declaration of an interface attribute.
    #[must_use]
    pub fn iattr(&self, name: &str) -> Option<&CfIattr> {
        self.iattrs.get(name)
    }

    /// Looks up an attachment implementation.
    #[must_use]
    pub fn attachment(&self, driver: &str, attachment: &str) -> Option<Arc<dyn DriverAttachment>> {
        self.attachments
            .read()
            .get(driver)
            .and_then(|per_driver| per_driver.get(attachment))
            .cloned()
    }

    /// The static instance entries, in declaration order.
    #[must_use]
    pub fn cfdata(&self) -> &[CfData] {
        &self.cfdata
    }

    /// Indices of the root entries, in boot order.
    #[must_use]
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    /// The pseudo-device list.
    #[must_use]
    pub fn pseudo(&self) -> &[PseudoDevice] {
        &self.pseudo
    }

    /// Registers an attachment at runtime (loadable driver).
    ///
    /// Re-registering the same key with the same implementation is a
    /// no-op, so re-loading a module is harmless.
    ///
    /// # Errors
    ///
    /// [`TableError::UnknownDriver`] if the driver does not exist;
    /// [`TableError::ConflictingAttachment`] if the key is taken by a
    /// different implementation.
    pub fn register_attachment(&self, attach: CfAttach) -> Result<(), TableError> {
        if !self.drivers.contains_key(attach.driver) {
            return Err(TableError::UnknownDriver(attach.driver));
        }
        let mut map = self.attachments.write();
        let per_driver = map.entry(attach.driver).or_default();
        if let Some(existing) = per_driver.get(attach.attachment) {
            if Arc::ptr_eq(existing, &attach.ops) {
                return Ok(());
            }
            return Err(TableError::ConflictingAttachment {
                driver: attach.driver,
                attachment: attach.attachment,
            });
        }
        per_driver.insert(attach.attachment, attach.ops);
        Ok(())
    }

    /// Removes an attachment from the registry.
    ///
    /// Crate-internal: only the engine may call this, after verifying no
    /// live instance still uses the attachment. Going through the store
    /// directly would skip that check.
    ///
    /// # Errors
    ///
    /// [`TableError::UnknownAttachment`] if the key is not registered.
    pub(crate) fn deregister_attachment(
        &self,
        driver: &'static str,
        attachment: &'static str,
    ) -> Result<(), TableError> {
        match self
            .attachments
            .write()
            .get_mut(driver)
            .and_then(|per_driver| per_driver.remove(attachment))
        {
            Some(_) => Ok(()),
            None => Err(TableError::UnknownAttachment { driver, attachment }),
        }
    }
}

// The attachment registry holds trait objects; summarize instead of
// recursing into it.
impl fmt::Debug for TableStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableStore")
            .field("drivers", &self.drivers.keys().collect::<Vec<_>>())
            .field("cfdata", &self.cfdata)
            .field("roots", &self.roots)
            .field("pseudo", &self.pseudo.len())
            .finish_non_exhaustive()
    }
}

/// Collects descriptors and validates them into a [`TableStore`].
#[derive(Default)]
pub struct TableBuilder {
    drivers: Vec<CfDriver>,
    attachments: Vec<CfAttach>,
    cfdata: Vec<CfData>,
    roots: Vec<usize>,
    pseudo: Vec<PseudoDevice>,
}

impl TableBuilder {
    /// Adds a driver descriptor.
    pub fn driver(&mut self, driver: CfDriver) -> &mut Self {
        self.drivers.push(driver);
        self
    }

    /// Adds an attachment.
    pub fn attachment(&mut self, attach: CfAttach) -> &mut Self {
        self.attachments.push(attach);
        self
    }

    /// Adds a static instance entry, returning its table index.
    pub fn cfdata(&mut self, entry: CfData) -> usize {
        self.cfdata.push(entry);
        self.cfdata.len() - 1
    }

    /// Marks a previously added entry as a configuration root.
    pub fn root(&mut self, index: usize) -> &mut Self {
        self.roots.push(index);
        self
    }

    /// Adds a pseudo-device.
    pub fn pseudo(&mut self, dev: PseudoDevice) -> &mut Self {
        self.pseudo.push(dev);
        self
    }

    /// Validates the collected tables and builds the store.
    ///
    /// # Errors
    ///
    /// Returns the first [`TableError`] found; the checks cover duplicate
    /// driver names, dangling driver/attachment/iattr references,
    /// inconsistent attribute declarations, locator count mismatches and
    /// malformed root entries.
    pub fn build(self) -> Result<TableStore, TableError> {
        let mut drivers = BTreeMap::new();
        for driver in self.drivers {
            let name = driver.name;
            if drivers.insert(name, driver).is_some() {
                return Err(TableError::DuplicateDriver(name));
            }
        }

        let mut iattrs: BTreeMap<&'static str, CfIattr> = BTreeMap::new();
        for driver in drivers.values() {
            for iattr in &driver.iattrs {
                match iattrs.get(iattr.name) {
                    Some(existing) if *existing != *iattr => {
                        return Err(TableError::InconsistentIattr(iattr.name));
                    }
                    Some(_) => {}
                    None => {
                        iattrs.insert(iattr.name, iattr.clone());
                    }
                }
            }
        }

        let mut attachments = AttachMap::new();
        for attach in self.attachments {
            if !drivers.contains_key(attach.driver) {
                return Err(TableError::UnknownDriver(attach.driver));
            }
            let per_driver = attachments.entry(attach.driver).or_default();
            if let Some(existing) = per_driver.get(attach.attachment) {
                if !Arc::ptr_eq(existing, &attach.ops) {
                    return Err(TableError::ConflictingAttachment {
                        driver: attach.driver,
                        attachment: attach.attachment,
                    });
                }
                continue;
            }
            per_driver.insert(attach.attachment, attach.ops);
        }

        for (index, entry) in self.cfdata.iter().enumerate() {
            if !drivers.contains_key(entry.driver) {
                return Err(TableError::UnknownDriver(entry.driver));
            }
            let has_attachment = attachments
                .get(entry.driver)
                .is_some_and(|per_driver| per_driver.contains_key(entry.attachment));
            if !has_attachment {
                return Err(TableError::UnknownAttachment {
                    driver: entry.driver,
                    attachment: entry.attachment,
                });
            }
            if let Some(spec) = &entry.parent {
                let Some(iattr) = iattrs.get(spec.iattr) else {
                    return Err(TableError::UnknownIattr(spec.iattr));
                };
                if let Some(parent_driver) = spec.driver
                    && !drivers.contains_key(parent_driver)
                {
                    return Err(TableError::UnknownDriver(parent_driver));
                }
                if entry.locators.len() != iattr.locators.len() {
                    return Err(TableError::LocatorCountMismatch {
                        index,
                        expected: iattr.locators.len(),
                        found: entry.locators.len(),
                    });
                }
            }
        }

        for &index in &self.roots {
            match self.cfdata.get(index) {
                None => return Err(TableError::BadRootIndex(index)),
                Some(entry) if entry.parent.is_some() => {
                    return Err(TableError::RootHasParent(index));
                }
                Some(_) => {}
            }
        }

        Ok(TableStore {
            drivers,
            iattrs,
            attachments: RwLock::new(attachments),
            cfdata: self.cfdata,
            roots: self.roots,
            pseudo: self.pseudo,
        })
    }
}
