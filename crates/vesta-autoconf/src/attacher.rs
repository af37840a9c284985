//! Instance creation and recursive probing.

use alloc::collections::BTreeSet;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::Any;

use vesta_driver_api::{AttachArgs, DriverAttachment, ParentInfo, UnitSpec};

use crate::engine::LiveState;
use crate::error::AttachError;
use crate::matcher;
use crate::table::TableStore;
use crate::tree::{DeviceId, InstanceState};

/// Attaches one instance for `index` and depth-first probes its children.
///
/// The instance stays in [`InstanceState::Attaching`] until its whole
/// subtree has been probed, mirroring the fact that probing children is
/// part of bringing a bus up.
///
/// Errors are local: the caller logs nothing further and simply moves on
/// to its remaining candidates.
pub(crate) fn attach_and_probe(
    tables: &TableStore,
    live: &mut LiveState,
    parent: Option<DeviceId>,
    index: usize,
    ops: Arc<dyn DriverAttachment>,
    aux: Option<&dyn Any>,
) -> Result<DeviceId, AttachError> {
    let id = attach_one(tables, live, parent, index, ops, aux)?;
    probe_children(tables, live, id, None);
    if let Some(node) = live.tree.node_mut(id) {
        node.state = InstanceState::Alive;
    }
    Ok(id)
}

/// Allocates the unit, runs the attach callback and registers the
/// instance. Rolls the unit back if the callback fails.
fn attach_one(
    tables: &TableStore,
    live: &mut LiveState,
    parent: Option<DeviceId>,
    index: usize,
    ops: Arc<dyn DriverAttachment>,
    aux: Option<&dyn Any>,
) -> Result<DeviceId, AttachError> {
    let entry = &tables.cfdata()[index];

    let parent_ident: Option<(String, &'static str, u32)> = match parent {
        Some(pid) => {
            let node = live.tree.node(pid).ok_or(AttachError::ParentNotFound)?;
            Some((node.name.clone(), node.driver, node.unit))
        }
        None => None,
    };

    let unit = match live.units.allocate(entry.driver, entry.unit) {
        Ok(unit) => unit,
        Err(err) => {
            log::warn!("{}{}: {err}", entry.driver, entry.unit);
            return Err(err);
        }
    };

    let args = AttachArgs {
        parent: parent_ident
            .as_ref()
            .map(|(name, driver, punit)| ParentInfo {
                name,
                driver,
                unit: *punit,
            }),
        locators: &entry.locators,
        flags: entry.flags,
        aux,
    };

    let softc = match ops.attach(&args) {
        Ok(softc) => softc,
        Err(err) => {
            live.units.release(entry.driver, unit);
            log::warn!("{}{}: attach failed: {err}", entry.driver, unit);
            return Err(AttachError::Callback(err));
        }
    };

    let id = live
        .tree
        .insert(parent, entry.driver, unit, index, entry.attachment, ops, softc);
    live.bindings[index].live += 1;

    match &parent_ident {
        Some((parent_name, _, _)) => {
            log::info!("{}{} at {parent_name}", entry.driver, unit);
        }
        None => log::info!("{}{} (root)", entry.driver, unit),
    }
    Ok(id)
}

/// Runs one scan pass over `parent`: repeatedly searches for the best
/// remaining candidate and attaches it, until the matcher comes up empty.
///
/// Every entry gets at most one match/attach opportunity per pass (a
/// wildcard entry binds one new instance per pass per parent; a rescan
/// starts a fresh pass). A failed candidate does not stop its siblings.
pub(crate) fn probe_children(
    tables: &TableStore,
    live: &mut LiveState,
    parent: DeviceId,
    aux: Option<&dyn Any>,
) -> Vec<DeviceId> {
    let mut attached = Vec::new();
    let mut exhausted = BTreeSet::new();
    while let Some(winner) = matcher::search(tables, live, parent, aux, &exhausted) {
        exhausted.insert(winner.index);
        if let Ok(id) = attach_and_probe(tables, live, Some(parent), winner.index, winner.ops, aux)
        {
            attached.push(id);
        }
    }
    attached
}

/// Attaches a configuration root: no parent, no parent-spec checks.
///
/// The root's match callback is still consulted; a root that reports
/// score zero simply does not appear. Returns `None` when the root did
/// not attach (already bound, absent, or failed — failures are logged by
/// the attach path).
pub(crate) fn attach_root(
    tables: &TableStore,
    live: &mut LiveState,
    index: usize,
) -> Option<DeviceId> {
    let entry = &tables.cfdata()[index];
    if matches!(entry.unit, UnitSpec::Fixed(_)) && live.bindings[index].live > 0 {
        return None;
    }
    let ops = tables.attachment(entry.driver, entry.attachment)?;

    let args = AttachArgs {
        parent: None,
        locators: &entry.locators,
        flags: entry.flags,
        aux: None,
    };
    if ops.match_device(&args) == 0 {
        return None;
    }
    attach_and_probe(tables, live, None, index, ops, None).ok()
}
