//! Candidate enumeration and best-match selection.

use alloc::collections::BTreeSet;
use alloc::sync::Arc;
use core::any::Any;

use vesta_driver_api::{AttachArgs, CfFlags, DriverAttachment, ParentInfo, UnitSpec};

use crate::engine::LiveState;
use crate::locator;
use crate::table::TableStore;
use crate::tree::DeviceId;

/// The winning candidate of one search round.
pub(crate) struct Winner {
    /// Index of the entry in the instance table.
    pub index: usize,
    /// The entry's attachment implementation.
    pub ops: Arc<dyn DriverAttachment>,
    /// The score its match callback reported.
    pub score: u32,
}

/// Searches the instance table for the best candidate to attach under
/// `parent`.
///
/// Entries are visited in declaration order. The winner is the candidate
/// with the strictly highest non-zero score; on a tie the earliest
/// declaration wins, so repeated boots probe identically. Entries in
/// `exhausted` have already had their chance in this scan pass and are
/// skipped, which is what terminates a probe loop over wildcard entries.
///
/// Returns `None` when no candidate scores above zero. That is the normal
/// "hardware not present" outcome and is not logged.
pub(crate) fn search(
    tables: &TableStore,
    live: &mut LiveState,
    parent: DeviceId,
    aux: Option<&dyn Any>,
    exhausted: &BTreeSet<usize>,
) -> Option<Winner> {
    let (parent_name, parent_driver, parent_unit) = {
        let node = live.tree.node(parent)?;
        (node.name.clone(), node.driver, node.unit)
    };
    let parent_desc = tables.driver(parent_driver)?;

    let mut best: Option<Winner> = None;
    for (index, entry) in tables.cfdata().iter().enumerate() {
        if exhausted.contains(&index) || entry.flags.contains(CfFlags::DISABLED) {
            continue;
        }
        let Some(spec) = &entry.parent else {
            continue;
        };

        // Static eligibility: the parent must expose the interface
        // attribute and satisfy the driver/unit constraints.
        let Some(iattr) = parent_desc.iattr(spec.iattr) else {
            continue;
        };
        if spec.driver.is_some_and(|d| d != parent_driver) {
            continue;
        }
        if spec.unit.is_some_and(|u| u != parent_unit) {
            continue;
        }

        if let UnitSpec::Fixed(unit) = entry.unit {
            // A fixed entry binds at most one instance.
            if live.bindings[index].live > 0 {
                continue;
            }
            // Explicit unit taken by another entry's instance: a
            // configuration conflict, reported once and skipped.
            if live.units.is_bound(entry.driver, unit) {
                if !live.bindings[index].warned {
                    live.bindings[index].warned = true;
                    log::warn!(
                        "{}{} at {}: unit already bound, entry skipped",
                        entry.driver,
                        unit,
                        parent_name
                    );
                }
                continue;
            }
        }

        if !locator::validate(&entry.locators, iattr) {
            if !live.bindings[index].warned {
                live.bindings[index].warned = true;
                log::warn!(
                    "{}{} at {}: locators violate '{}', entry skipped",
                    entry.driver,
                    entry.unit,
                    parent_name,
                    spec.iattr
                );
            }
            continue;
        }

        // The attachment may have been deregistered since table load.
        let Some(ops) = tables.attachment(entry.driver, entry.attachment) else {
            continue;
        };

        let args = AttachArgs {
            parent: Some(ParentInfo {
                name: &parent_name,
                driver: parent_driver,
                unit: parent_unit,
            }),
            locators: &entry.locators,
            flags: entry.flags,
            aux,
        };
        let score = ops.match_device(&args);
        if score == 0 {
            continue;
        }
        if best.as_ref().is_none_or(|b| score > b.score) {
            best = Some(Winner { index, ops, score });
        }
    }
    best
}
