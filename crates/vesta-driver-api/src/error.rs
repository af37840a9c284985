//! Driver callback error type.

use core::fmt;

/// Errors a driver's match/attach/detach callbacks can report.
///
/// The engine treats these as local to the instance being probed: an attach
/// failure rolls back that one instance and probing continues elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverError {
    /// The hardware device was not found or did not respond.
    DeviceNotFound,
    /// Driver initialization failed.
    InitFailed,
    /// A hardware operation timed out.
    Timeout,
    /// The requested operation is not supported by this attachment.
    Unsupported,
    /// An I/O error occurred during a hardware operation.
    IoError,
    /// The device is busy and cannot be released.
    Busy,
    /// The driver is not in a valid state for this operation.
    InvalidState,
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeviceNotFound => f.write_str("device not found"),
            Self::InitFailed => f.write_str("driver initialization failed"),
            Self::Timeout => f.write_str("hardware operation timed out"),
            Self::Unsupported => f.write_str("operation not supported"),
            Self::IoError => f.write_str("I/O error"),
            Self::Busy => f.write_str("device busy"),
            Self::InvalidState => f.write_str("invalid driver state"),
        }
    }
}
