//! The Vesta device autoconfiguration engine.
//!
//! Binds drivers to devices at boot and at runtime by walking static
//! configuration tables (see `vesta-driver-api` for the table types):
//!
//! - [`TableBuilder`] validates descriptors into an immutable
//!   [`TableStore`]; corrupt tables are refused outright.
//! - [`Autoconf::configure`] runs boot-time probing: pseudo-devices
//!   first, then each configuration root depth-first. For every live
//!   parent the matcher scores candidate entries (highest score wins,
//!   declaration order breaks ties) and the winner's attach callback
//!   creates a [`tree::DeviceInstance`].
//! - [`Autoconf::rescan`] repeats that scan for one parent when a bus
//!   discovers hardware later; [`Autoconf::detach`] removes instances,
//!   children first.
//!
//! Absent hardware is silent, a failed candidate never stops its
//! siblings, and all structural mutation is serialized under one
//! engine-wide lock, so a given table always produces the same tree.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

mod attacher;
mod detacher;
mod matcher;
mod pseudo;

pub mod engine;
pub mod error;
pub mod locator;
pub mod table;
pub mod tree;
pub mod unit;

pub use engine::{Autoconf, DeviceSummary};
pub use error::{AttachError, DetachError, TableError};
pub use table::{TableBuilder, TableStore};
pub use tree::{DeviceId, DeviceInstance, DeviceTree, InstanceState};
pub use unit::UnitAllocator;
