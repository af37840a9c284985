//! The autoconfiguration engine entry points.
//!
//! [`Autoconf`] owns the validated tables and the live instance tree. One
//! engine-wide lock serializes all structural mutation — boot probing,
//! hot-plug rescans and detaches — so sibling candidates are always
//! evaluated in table order and unit assignment is reproducible across
//! boots. Callbacks run with that lock held and must not re-enter the
//! engine; they never need to, because the engine itself probes a newly
//! attached instance's children.

use alloc::string::String;
use alloc::vec::Vec;
use core::any::Any;

use spin::Mutex;
use vesta_driver_api::{CfAttach, DetachFlags};

use crate::attacher;
use crate::detacher;
use crate::error::{AttachError, DetachError, TableError};
use crate::pseudo;
use crate::table::TableStore;
use crate::tree::{DeviceId, DeviceTree, InstanceState};
use crate::unit::UnitAllocator;

/// Per-entry live bookkeeping, parallel to the instance table.
pub(crate) struct Binding {
    /// Number of live instances bound to the entry.
    pub(crate) live: u32,
    /// Whether a conflict/locator diagnostic has been emitted for the
    /// entry, to keep repeated scans from repeating it.
    pub(crate) warned: bool,
}

/// All mutable engine state, guarded by the tree lock.
pub(crate) struct LiveState {
    /// The live instance forest.
    pub(crate) tree: DeviceTree,
    /// Per-driver unit bitmaps.
    pub(crate) units: UnitAllocator,
    /// Per-entry binding counts.
    pub(crate) bindings: Vec<Binding>,
}

impl LiveState {
    fn new(entries: usize) -> Self {
        let mut bindings = Vec::with_capacity(entries);
        bindings.resize_with(entries, || Binding {
            live: 0,
            warned: false,
        });
        Self {
            tree: DeviceTree::new(),
            units: UnitAllocator::new(),
            bindings,
        }
    }
}

/// A read-only snapshot of one live instance, for inspection and logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSummary {
    /// Instance id.
    pub id: DeviceId,
    /// Formatted name (e.g. "sio0").
    pub name: String,
    /// Driver name.
    pub driver: &'static str,
    /// Unit number.
    pub unit: u32,
    /// Attachment the instance was created through.
    pub attachment: &'static str,
    /// Parent instance, `None` for roots.
    pub parent: Option<DeviceId>,
    /// Lifecycle state.
    pub state: InstanceState,
}

/// The autoconfiguration engine.
pub struct Autoconf {
    tables: TableStore,
    live: Mutex<LiveState>,
}

impl Autoconf {
    /// Creates an engine over validated tables.
    #[must_use]
    pub fn new(tables: TableStore) -> Self {
        let live = Mutex::new(LiveState::new(tables.cfdata().len()));
        Self { tables, live }
    }

    /// The engine's table store, for read-only inspection.
    ///
    /// Registry mutation goes through [`Self::register_attachment`] and
    /// [`Self::deregister_attachment`], which also check live instances.
    #[must_use]
    pub fn tables(&self) -> &TableStore {
        &self.tables
    }

    /// Boot-time configuration: runs the pseudo-device list, then probes
    /// each configuration root depth-first.
    ///
    /// Idempotent for fixed-unit roots: calling it again attaches nothing
    /// that is already bound.
    pub fn configure(&self) {
        let mut live = self.live.lock();
        pseudo::init_pseudo(self.tables.pseudo());
        for &root in self.tables.roots() {
            attacher::attach_root(&self.tables, &mut live, root);
        }
    }

    /// Hot-plug entry: runs one scan pass over a live parent, attaching
    /// every candidate that matches with the given bus aux data.
    ///
    /// Returns the ids of the instances attached directly under `parent`
    /// (their own children are probed too but not listed).
    ///
    /// # Errors
    ///
    /// [`AttachError::ParentNotFound`] if `parent` is not live.
    pub fn rescan(
        &self,
        parent: DeviceId,
        aux: Option<&dyn Any>,
    ) -> Result<Vec<DeviceId>, AttachError> {
        let mut live = self.live.lock();
        if live.tree.node(parent).is_none() {
            return Err(AttachError::ParentNotFound);
        }
        Ok(attacher::probe_children(&self.tables, &mut live, parent, aux))
    }

    /// Detaches an instance; with [`DetachFlags::FORCE`], its whole
    /// subtree, children first.
    ///
    /// # Errors
    ///
    /// See [`DetachError`]. Policy violations are checked before any
    /// callback runs and leave the tree unchanged.
    pub fn detach(&self, device: DeviceId, flags: DetachFlags) -> Result<(), DetachError> {
        detacher::detach(&self.tables, &mut self.live.lock(), device, flags)
    }

    /// Registers a loadable driver's attachment. Idempotent for identical
    /// re-registration.
    ///
    /// # Errors
    ///
    /// See [`TableStore::register_attachment`].
    pub fn register_attachment(&self, attach: CfAttach) -> Result<(), TableError> {
        self.tables.register_attachment(attach)
    }

    /// Removes an attachment from the registry, refusing while any live
    /// instance was created through it.
    ///
    /// # Errors
    ///
    /// [`TableError::AttachmentInUse`] if instances are live;
    /// [`TableError::UnknownAttachment`] if it is not registered.
    pub fn deregister_attachment(
        &self,
        driver: &'static str,
        attachment: &'static str,
    ) -> Result<(), TableError> {
        let live = self.live.lock();
        let in_use = live
            .tree
            .iter()
            .any(|n| n.driver == driver && n.attachment == attachment);
        if in_use {
            return Err(TableError::AttachmentInUse { driver, attachment });
        }
        self.tables.deregister_attachment(driver, attachment)
    }

    /// Looks up a live instance by driver name and unit.
    #[must_use]
    pub fn lookup(&self, driver: &str, unit: u32) -> Option<DeviceId> {
        self.live.lock().tree.lookup(driver, unit)
    }

    /// Looks up a live instance by formatted name (e.g. "sio0").
    #[must_use]
    pub fn lookup_name(&self, name: &str) -> Option<DeviceId> {
        self.live.lock().tree.lookup_name(name)
    }

    /// The parent of a live instance (`None` for roots and unknown ids).
    #[must_use]
    pub fn parent_of(&self, device: DeviceId) -> Option<DeviceId> {
        self.live.lock().tree.node(device).and_then(|n| n.parent)
    }

    /// The children of a live instance, in attach order.
    #[must_use]
    pub fn children_of(&self, device: DeviceId) -> Vec<DeviceId> {
        self.live
            .lock()
            .tree
            .node(device)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// Snapshots all live instances in attach order.
    #[must_use]
    pub fn devices(&self) -> Vec<DeviceSummary> {
        self.live
            .lock()
            .tree
            .iter()
            .map(|n| DeviceSummary {
                id: n.id,
                name: n.name.clone(),
                driver: n.driver,
                unit: n.unit,
                attachment: n.attachment,
                parent: n.parent,
                state: n.state,
            })
            .collect()
    }

    /// Runs `f` against an instance's softc, downcast to `T`.
    ///
    /// Returns `None` if the instance is not live or its softc is not a
    /// `T`. `f` runs under the tree lock and must not re-enter the engine.
    pub fn with_device_state<T: 'static, R>(
        &self,
        device: DeviceId,
        f: impl FnOnce(&mut T) -> R,
    ) -> Option<R> {
        let mut live = self.live.lock();
        let node = live.tree.node_mut(device)?;
        let state = node.softc.downcast_mut::<T>()?;
        Some(f(state))
    }

    /// Logs the live forest, one line per instance, indented by depth.
    pub fn log_tree(&self) {
        self.live.lock().tree.log_tree();
    }
}
