//! Static instance descriptors and parent constraints.

use alloc::vec::Vec;
use core::fmt;

bitflags::bitflags! {
    /// Per-entry configuration flag bits.
    ///
    /// The low bit is interpreted by the engine; the remaining bits are
    /// carried through [`AttachArgs`](crate::attachment::AttachArgs)
    /// untouched for the driver to interpret.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CfFlags: u32 {
        /// Entry is administratively disabled: the matcher never
        /// considers it.
        const DISABLED = 1 << 0;
    }
}

/// The unit number a static instance descriptor claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitSpec {
    /// An explicit unit. At most one live instance may bind the entry.
    Fixed(u32),
    /// Wildcard ("star") unit: the entry may bind any number of live
    /// instances, each assigned the smallest free unit at attach time.
    Star,
}

impl fmt::Display for UnitSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(unit) => write!(f, "{unit}"),
            Self::Star => f.write_str("*"),
        }
    }
}

/// Constraint on the parents a [`CfData`] entry may attach beneath.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CfParentSpec {
    /// Interface attribute the parent must expose.
    pub iattr: &'static str,
    /// Required parent driver name; `None` matches any driver exposing
    /// the attribute.
    pub driver: Option<&'static str>,
    /// Required parent unit; `None` matches any unit.
    pub unit: Option<u32>,
}

impl CfParentSpec {
    /// Constrains only the interface attribute (any parent driver, any unit).
    #[must_use]
    pub const fn iattr(iattr: &'static str) -> Self {
        Self {
            iattr,
            driver: None,
            unit: None,
        }
    }

    /// Additionally requires a specific parent driver.
    #[must_use]
    pub const fn at_driver(mut self, driver: &'static str) -> Self {
        self.driver = Some(driver);
        self
    }

    /// Additionally requires a specific parent unit.
    #[must_use]
    pub const fn at_unit(mut self, unit: u32) -> Self {
        self.unit = Some(unit);
        self
    }
}

/// A static instance descriptor: one potential device instance.
///
/// Entries are immutable once loaded; which entries are currently bound to
/// live instances is tracked by the engine out-of-band. Declaration order
/// within the table is semantic — it is the probe order and the match
/// tie-break.
#[derive(Debug, Clone)]
pub struct CfData {
    /// Driver this entry instantiates.
    pub driver: &'static str,
    /// Attachment (bus-specific implementation) to use.
    pub attachment: &'static str,
    /// Unit claim: explicit or wildcard.
    pub unit: UnitSpec,
    /// Locator vector, one value per locator declared by the parent
    /// spec's interface attribute. Empty for root entries.
    pub locators: Vec<i32>,
    /// Configuration flag bits.
    pub flags: CfFlags,
    /// Parent constraint; `None` marks a root entry.
    pub parent: Option<CfParentSpec>,
}

impl CfData {
    /// Creates a root entry (no parent constraint, no locators).
    #[must_use]
    pub fn root(driver: &'static str, attachment: &'static str, unit: UnitSpec) -> Self {
        Self {
            driver,
            attachment,
            unit,
            locators: Vec::new(),
            flags: CfFlags::empty(),
            parent: None,
        }
    }

    /// Creates a child entry attaching under `parent`.
    #[must_use]
    pub fn child(
        driver: &'static str,
        attachment: &'static str,
        unit: UnitSpec,
        parent: CfParentSpec,
    ) -> Self {
        Self {
            driver,
            attachment,
            unit,
            locators: Vec::new(),
            flags: CfFlags::empty(),
            parent: Some(parent),
        }
    }

    /// Sets the locator vector, returning the entry for chaining.
    #[must_use]
    pub fn with_locators(mut self, locators: Vec<i32>) -> Self {
        self.locators = locators;
        self
    }

    /// Sets flag bits, returning the entry for chaining.
    #[must_use]
    pub fn with_flags(mut self, flags: CfFlags) -> Self {
        self.flags = flags;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_spec_display() {
        assert_eq!(format!("{}", UnitSpec::Fixed(3)), "3");
        assert_eq!(format!("{}", UnitSpec::Star), "*");
    }

    #[test]
    fn parent_spec_builders() {
        let spec = CfParentSpec::iattr("scsi").at_driver("spc").at_unit(1);
        assert_eq!(spec.iattr, "scsi");
        assert_eq!(spec.driver, Some("spc"));
        assert_eq!(spec.unit, Some(1));

        let any = CfParentSpec::iattr("mainbus");
        assert_eq!(any.driver, None);
        assert_eq!(any.unit, None);
    }

    #[test]
    fn root_entry_has_no_parent() {
        let cf = CfData::root("mainbus", "mainbus", UnitSpec::Fixed(0));
        assert!(cf.parent.is_none());
        assert!(cf.locators.is_empty());
        assert_eq!(cf.flags, CfFlags::empty());
    }
}
