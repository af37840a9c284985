//! Engine error types.
//!
//! The taxonomy separates fatal table corruption ([`TableError`], the
//! generator that produced the tables is broken) from recoverable
//! per-instance conditions ([`AttachError`], [`DetachError`]) that never
//! abort probing elsewhere in the tree.

use core::fmt;

use vesta_driver_api::DriverError;

/// Fatal table-load and registry errors.
///
/// Raised while validating a [`TableStore`](crate::table::TableStore) or
/// mutating the attachment registry. Load-time variants indicate corrupt
/// generator output; the engine refuses to construct rather than boot on
/// bad tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableError {
    /// Two driver descriptors share a name.
    DuplicateDriver(&'static str),
    /// An entry references a driver that is not registered.
    UnknownDriver(&'static str),
    /// An entry references an attachment that is not registered.
    UnknownAttachment {
        /// Driver name of the missing attachment.
        driver: &'static str,
        /// Attachment name.
        attachment: &'static str,
    },
    /// A parent spec names an interface attribute no driver exposes.
    UnknownIattr(&'static str),
    /// Two drivers declare the same interface attribute with different
    /// locator declarations.
    InconsistentIattr(&'static str),
    /// An instance entry's locator vector does not have one value per
    /// locator declared by its parent spec's interface attribute.
    LocatorCountMismatch {
        /// Index of the offending entry in the instance table.
        index: usize,
        /// Locator count the interface attribute declares.
        expected: usize,
        /// Length of the entry's locator vector.
        found: usize,
    },
    /// A root-list index is out of range for the instance table.
    BadRootIndex(usize),
    /// A root-list entry carries a parent spec.
    RootHasParent(usize),
    /// An attachment was registered twice with different implementations.
    ConflictingAttachment {
        /// Driver name.
        driver: &'static str,
        /// Attachment name.
        attachment: &'static str,
    },
    /// The attachment cannot be deregistered while instances use it.
    AttachmentInUse {
        /// Driver name.
        driver: &'static str,
        /// Attachment name.
        attachment: &'static str,
    },
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateDriver(name) => write!(f, "duplicate driver '{name}'"),
            Self::UnknownDriver(name) => write!(f, "unknown driver '{name}'"),
            Self::UnknownAttachment { driver, attachment } => {
                write!(f, "unknown attachment '{attachment}' for driver '{driver}'")
            }
            Self::UnknownIattr(name) => {
                write!(f, "no driver exposes interface attribute '{name}'")
            }
            Self::InconsistentIattr(name) => {
                write!(f, "conflicting declarations of interface attribute '{name}'")
            }
            Self::LocatorCountMismatch {
                index,
                expected,
                found,
            } => write!(
                f,
                "instance entry {index}: expected {expected} locators, found {found}"
            ),
            Self::BadRootIndex(index) => write!(f, "root index {index} out of range"),
            Self::RootHasParent(index) => {
                write!(f, "root entry {index} carries a parent spec")
            }
            Self::ConflictingAttachment { driver, attachment } => {
                write!(
                    f,
                    "attachment '{attachment}' for driver '{driver}' already \
                     registered with a different implementation"
                )
            }
            Self::AttachmentInUse { driver, attachment } => {
                write!(
                    f,
                    "attachment '{attachment}' for driver '{driver}' has live instances"
                )
            }
        }
    }
}

/// Recoverable attach-time errors, local to one candidate instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachError {
    /// The entry's explicit unit is already bound for this driver.
    UnitConflict {
        /// Driver name.
        driver: &'static str,
        /// The contested unit number.
        unit: u32,
    },
    /// The attach callback reported failure; the instance was rolled back.
    Callback(DriverError),
    /// The parent instance is no longer in the live tree.
    ParentNotFound,
}

impl fmt::Display for AttachError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnitConflict { driver, unit } => {
                write!(f, "unit {driver}{unit} already bound")
            }
            Self::Callback(err) => write!(f, "attach callback failed: {err}"),
            Self::ParentNotFound => f.write_str("parent instance not found"),
        }
    }
}

/// Detach-time policy violations. No state is mutated when one is returned,
/// except that a forced subtree detach stops at the first busy callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetachError {
    /// The instance is not in the live tree.
    NotFound,
    /// The instance has live children and the detach was not forced.
    HasChildren,
    /// The attachment (or one in the subtree, when forced) does not
    /// support detaching.
    Permanent,
    /// The detach callback refused; the instance stays live and bound.
    Busy(DriverError),
}

impl fmt::Display for DetachError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => f.write_str("no such device instance"),
            Self::HasChildren => f.write_str("device has live children"),
            Self::Permanent => f.write_str("attachment is permanently resident"),
            Self::Busy(err) => write!(f, "detach callback failed: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_error_display() {
        assert_eq!(
            format!("{}", TableError::DuplicateDriver("le")),
            "duplicate driver 'le'"
        );
        assert_eq!(
            format!(
                "{}",
                TableError::UnknownAttachment {
                    driver: "sio",
                    attachment: "sio_isa",
                }
            ),
            "unknown attachment 'sio_isa' for driver 'sio'"
        );
        assert_eq!(
            format!(
                "{}",
                TableError::LocatorCountMismatch {
                    index: 3,
                    expected: 2,
                    found: 1,
                }
            ),
            "instance entry 3: expected 2 locators, found 1"
        );
    }

    #[test]
    fn attach_error_display() {
        assert_eq!(
            format!(
                "{}",
                AttachError::UnitConflict {
                    driver: "le",
                    unit: 0,
                }
            ),
            "unit le0 already bound"
        );
        assert_eq!(
            format!("{}", AttachError::Callback(DriverError::InitFailed)),
            "attach callback failed: driver initialization failed"
        );
    }

    #[test]
    fn detach_error_display() {
        assert_eq!(
            format!("{}", DetachError::HasChildren),
            "device has live children"
        );
        assert_eq!(
            format!("{}", DetachError::Busy(DriverError::Busy)),
            "detach callback failed: device busy"
        );
    }
}
