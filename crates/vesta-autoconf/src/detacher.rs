//! Instance removal.
//!
//! Detach is checked before anything runs: children (when not forced) and
//! permanently-resident attachments anywhere in the subtree are rejected
//! up front, so those failures leave the tree untouched. Only a detach
//! callback refusing mid-way can stop a forced subtree detach after some
//! descendants are already gone; the engine cannot re-attach on a driver's
//! behalf.

use alloc::vec::Vec;

use vesta_driver_api::{DetachFlags, UnitSpec};

use crate::engine::LiveState;
use crate::error::DetachError;
use crate::table::TableStore;
use crate::tree::{DeviceId, InstanceState};

/// Detaches `id`, and with [`DetachFlags::FORCE`] its whole subtree,
/// children first.
pub(crate) fn detach(
    tables: &TableStore,
    live: &mut LiveState,
    id: DeviceId,
    flags: DetachFlags,
) -> Result<(), DetachError> {
    let node = live.tree.node(id).ok_or(DetachError::NotFound)?;
    if !flags.contains(DetachFlags::FORCE) && !node.children.is_empty() {
        return Err(DetachError::HasChildren);
    }
    check_detachable(live, id)?;
    detach_subtree(tables, live, id, flags)
}

/// Verifies every attachment in the subtree supports detaching.
fn check_detachable(live: &LiveState, id: DeviceId) -> Result<(), DetachError> {
    let node = live.tree.node(id).ok_or(DetachError::NotFound)?;
    if !node.ops.can_detach() {
        return Err(DetachError::Permanent);
    }
    for &child in &node.children {
        check_detachable(live, child)?;
    }
    Ok(())
}

/// Post-order detach: children, then the instance itself.
fn detach_subtree(
    tables: &TableStore,
    live: &mut LiveState,
    id: DeviceId,
    flags: DetachFlags,
) -> Result<(), DetachError> {
    let children: Vec<DeviceId> = live
        .tree
        .node(id)
        .ok_or(DetachError::NotFound)?
        .children
        .clone();
    for child in children {
        detach_subtree(tables, live, child, flags)?;
    }

    let (driver, unit, cfdata) = {
        let node = live.tree.node_mut(id).ok_or(DetachError::NotFound)?;
        node.state = InstanceState::Detaching;
        let ops = node.ops.clone();
        if let Err(err) = ops.detach(node.softc.as_mut(), flags) {
            node.state = InstanceState::Alive;
            return Err(DetachError::Busy(err));
        }
        (node.driver, node.unit, node.cfdata)
    };

    live.tree.remove(id);
    live.units.release(driver, unit);
    live.bindings[cfdata].live -= 1;
    // The unit is free again: re-arm the conflict warning on every entry
    // that claims it, so a recurring conflict is reported once more.
    for (index, entry) in tables.cfdata().iter().enumerate() {
        if entry.driver == driver && entry.unit == UnitSpec::Fixed(unit) {
            live.bindings[index].warned = false;
        }
    }

    if !flags.contains(DetachFlags::QUIET) {
        log::info!("{driver}{unit} detached");
    }
    Ok(())
}
