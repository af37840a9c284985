//! Pseudo-device entries.

use crate::error::DriverError;

/// A pseudo-device: a software-only driver attached unconditionally at
/// boot, with no hardware parent and no matching step.
#[derive(Clone, Copy)]
pub struct PseudoDevice {
    /// Name, for diagnostics (e.g. "loop", "pty", "bpf").
    pub name: &'static str,
    /// Attach function, called once with `count`.
    pub attach: fn(count: u32) -> Result<(), DriverError>,
    /// How many units to pre-create. Some drivers ignore this and size
    /// themselves on demand.
    pub count: u32,
}

impl PseudoDevice {
    /// Creates a pseudo-device entry.
    #[must_use]
    pub const fn new(
        name: &'static str,
        attach: fn(u32) -> Result<(), DriverError>,
        count: u32,
    ) -> Self {
        Self {
            name,
            attach,
            count,
        }
    }
}
