//! The live device instance tree.
//!
//! Instances form a forest: parents own their child lists, children keep a
//! plain id back-reference. Ids are handed out monotonically and never
//! reused, so a child's id is always greater than its parent's — cycles
//! cannot be constructed.

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use vesta_driver_api::{DriverAttachment, Softc};

/// Opaque handle to a live device instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceId(u32);

/// Lifecycle state of a live instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    /// Attach callback returned; children are being probed.
    Attaching,
    /// Fully attached.
    Alive,
    /// Detach callback in progress.
    Detaching,
}

/// A live device instance.
pub struct DeviceInstance {
    /// This instance's id.
    pub id: DeviceId,
    /// Formatted name, driver plus unit (e.g. "sio0").
    pub name: String,
    /// Owning driver name.
    pub driver: &'static str,
    /// Assigned unit number.
    pub unit: u32,
    /// Index of the originating instance entry in the table.
    pub cfdata: usize,
    /// Attachment name the instance was created through.
    pub attachment: &'static str,
    /// The attachment implementation, pinned for the instance's lifetime
    /// so detach survives registry changes.
    pub ops: Arc<dyn DriverAttachment>,
    /// Parent instance; `None` for roots.
    pub parent: Option<DeviceId>,
    /// Child instances, in attach order.
    pub children: Vec<DeviceId>,
    /// Lifecycle state.
    pub state: InstanceState,
    /// The driver's owned softc.
    pub softc: Softc,
}

/// The forest of live device instances.
#[derive(Default)]
pub struct DeviceTree {
    nodes: BTreeMap<DeviceId, DeviceInstance>,
    roots: Vec<DeviceId>,
    next_id: u32,
}

impl DeviceTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new instance under `parent` (or as a root) and returns
    /// its id. The instance starts in [`InstanceState::Attaching`].
    #[allow(clippy::too_many_arguments)]
    pub fn insert(
        &mut self,
        parent: Option<DeviceId>,
        driver: &'static str,
        unit: u32,
        cfdata: usize,
        attachment: &'static str,
        ops: Arc<dyn DriverAttachment>,
        softc: Softc,
    ) -> DeviceId {
        let id = DeviceId(self.next_id);
        self.next_id += 1;

        self.nodes.insert(
            id,
            DeviceInstance {
                id,
                name: format!("{driver}{unit}"),
                driver,
                unit,
                cfdata,
                attachment,
                ops,
                parent,
                children: Vec::new(),
                state: InstanceState::Attaching,
                softc,
            },
        );

        match parent.and_then(|p| self.nodes.get_mut(&p)) {
            Some(parent_node) => parent_node.children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    /// Removes an instance, unlinking it from its parent (or the root
    /// list). The instance must have no children left.
    ///
    /// Returns the removed instance, or `None` if the id is not live.
    pub fn remove(&mut self, id: DeviceId) -> Option<DeviceInstance> {
        let node = self.nodes.remove(&id)?;
        debug_assert!(node.children.is_empty(), "removing {} with children", node.name);
        match node.parent.and_then(|p| self.nodes.get_mut(&p)) {
            Some(parent_node) => parent_node.children.retain(|&c| c != id),
            None => self.roots.retain(|&r| r != id),
        }
        Some(node)
    }

    /// Looks up an instance by id.
    #[must_use]
    pub fn node(&self, id: DeviceId) -> Option<&DeviceInstance> {
        self.nodes.get(&id)
    }

    /// Mutable lookup by id.
    pub fn node_mut(&mut self, id: DeviceId) -> Option<&mut DeviceInstance> {
        self.nodes.get_mut(&id)
    }

    /// Looks up an instance by driver name and unit.
    #[must_use]
    pub fn lookup(&self, driver: &str, unit: u32) -> Option<DeviceId> {
        self.nodes
            .values()
            .find(|n| n.driver == driver && n.unit == unit)
            .map(|n| n.id)
    }

    /// Looks up an instance by formatted name (e.g. "sio0").
    #[must_use]
    pub fn lookup_name(&self, name: &str) -> Option<DeviceId> {
        self.nodes.values().find(|n| n.name == name).map(|n| n.id)
    }

    /// Root instances, in attach order.
    #[must_use]
    pub fn roots(&self) -> &[DeviceId] {
        &self.roots
    }

    /// Iterates all live instances in id (attach) order.
    pub fn iter(&self) -> impl Iterator<Item = &DeviceInstance> {
        self.nodes.values()
    }

    /// Number of live instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Logs the forest with one line per instance, indented by depth.
    pub fn log_tree(&self) {
        for &root in &self.roots {
            self.log_subtree(root, 0);
        }
    }

    fn log_subtree(&self, id: DeviceId, depth: usize) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        log::info!("{:indent$}{}", "", node.name, indent = depth * 2);
        for &child in &node.children {
            self.log_subtree(child, depth + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vesta_driver_api::{AttachArgs, DriverError};

    struct NopAttachment;

    impl DriverAttachment for NopAttachment {
        fn match_device(&self, _args: &AttachArgs<'_>) -> u32 {
            1
        }

        fn attach(&self, _args: &AttachArgs<'_>) -> Result<Softc, DriverError> {
            Ok(Box::new(()))
        }
    }

    fn insert(tree: &mut DeviceTree, parent: Option<DeviceId>, driver: &'static str, unit: u32) -> DeviceId {
        tree.insert(
            parent,
            driver,
            unit,
            0,
            "test",
            Arc::new(NopAttachment),
            Box::new(()),
        )
    }

    #[test]
    fn insert_links_parent_and_child() {
        let mut tree = DeviceTree::new();
        let bus = insert(&mut tree, None, "mainbus", 0);
        let child = insert(&mut tree, Some(bus), "sio", 0);

        assert_eq!(tree.roots(), &[bus]);
        assert_eq!(tree.node(child).unwrap().parent, Some(bus));
        assert_eq!(tree.node(bus).unwrap().children, vec![child]);
        assert_eq!(tree.node(child).unwrap().name, "sio0");
    }

    #[test]
    fn remove_unlinks_from_parent() {
        let mut tree = DeviceTree::new();
        let bus = insert(&mut tree, None, "mainbus", 0);
        let child = insert(&mut tree, Some(bus), "sio", 0);

        let removed = tree.remove(child).unwrap();
        assert_eq!(removed.name, "sio0");
        assert!(tree.node(bus).unwrap().children.is_empty());
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn remove_root_unlinks_from_root_list() {
        let mut tree = DeviceTree::new();
        let bus = insert(&mut tree, None, "mainbus", 0);
        tree.remove(bus).unwrap();
        assert!(tree.roots().is_empty());
        assert!(tree.is_empty());
    }

    #[test]
    fn lookup_by_driver_unit_and_name() {
        let mut tree = DeviceTree::new();
        let bus = insert(&mut tree, None, "mainbus", 0);
        let sio = insert(&mut tree, Some(bus), "sio", 2);

        assert_eq!(tree.lookup("sio", 2), Some(sio));
        assert_eq!(tree.lookup("sio", 0), None);
        assert_eq!(tree.lookup_name("mainbus0"), Some(bus));
        assert_eq!(tree.lookup_name("sio0"), None);
    }

    #[test]
    fn ids_are_never_reused() {
        let mut tree = DeviceTree::new();
        let a = insert(&mut tree, None, "mainbus", 0);
        tree.remove(a).unwrap();
        let b = insert(&mut tree, None, "mainbus", 0);
        assert_ne!(a, b);
    }

    #[test]
    fn parent_ids_precede_child_ids() {
        // Monotonic ids make the parent relation acyclic by construction.
        let mut tree = DeviceTree::new();
        let bus = insert(&mut tree, None, "mainbus", 0);
        let spc = insert(&mut tree, Some(bus), "spc", 0);
        let scsibus = insert(&mut tree, Some(spc), "scsibus", 0);

        for node in tree.iter() {
            if let Some(parent) = node.parent {
                assert!(parent < node.id);
            }
        }
        assert!(bus < spc && spc < scsibus);
    }
}
