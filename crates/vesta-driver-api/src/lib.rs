//! Autoconfiguration descriptor and driver callback types for Vesta.
//!
//! This crate defines the data model shared between the autoconfiguration
//! engine (`vesta-autoconf`) and individual driver crates:
//!
//! - **Descriptors** — [`CfDriver`], [`CfIattr`], [`CfData`], [`CfParentSpec`]:
//!   the static description of what drivers exist and where their instances
//!   may attach. These are the link-time tables a machine description
//!   compiles down to.
//! - **Callbacks** — the [`DriverAttachment`] trait bundling a driver's
//!   match/attach/detach implementation for one bus, plus [`AttachArgs`],
//!   the argument bundle those callbacks receive.
//! - **State** — [`Softc`], the owned per-instance state that replaces the
//!   traditional untyped state block; drivers downcast it back via [`Any`].
//!
//! [`Any`]: core::any::Any
//! - **Errors** — [`DriverError`], the result type callbacks report through.
//!
//! The engine consumes these types; it never interprets a driver's softc or
//! its bus-specific auxiliary data.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod attachment;
pub mod cfdata;
pub mod driver;
pub mod error;
pub mod pseudo;

// Re-export all public types at the crate root for ergonomic imports.
pub use attachment::{AttachArgs, CfAttach, DetachFlags, DriverAttachment, ParentInfo, Softc};
pub use cfdata::{CfData, CfFlags, CfParentSpec, UnitSpec};
pub use driver::{CfDriver, CfIattr, DeviceKind, LocatorConstraint, LocatorDecl, LOC_ANY};
pub use error::DriverError;
pub use pseudo::PseudoDevice;
