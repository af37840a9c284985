//! Device class descriptors and interface attributes.

use alloc::vec::Vec;

/// Sentinel locator value meaning "don't care".
///
/// A locator set to `LOC_ANY` in a [`CfData`](crate::cfdata::CfData) entry
/// matches regardless of the interface attribute's declared constraint.
pub const LOC_ANY: i32 = -1;

/// The kind of hardware a device class represents.
///
/// Used by generic subsystems (e.g. the disk or network layer) to hook up
/// instances without knowing the individual driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    /// Generic device with no subsystem-specific properties.
    Generic,
    /// A bus or controller that other devices attach beneath.
    Bus,
    /// A processor.
    Cpu,
    /// Block storage.
    Disk,
    /// Network interface.
    Network,
    /// Sequential-access storage.
    Tape,
    /// Terminal / serial line.
    Tty,
}

/// The value constraint declared for one locator position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocatorConstraint {
    /// Any integer is permitted.
    Free,
    /// Only the given value (or [`LOC_ANY`]) is permitted.
    Valued(i32),
    /// Values must lie within the inclusive range (or be [`LOC_ANY`]).
    Ranged(i32, i32),
}

/// One named locator declared by an interface attribute.
///
/// The position of the declaration within its [`CfIattr`] is the locator's
/// numeric id; locator vectors are indexed by that position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorDecl {
    /// Locator name (e.g. "addr", "channel", "target").
    pub name: &'static str,
    /// Default value a table generator fills in when the machine
    /// description leaves this locator unspecified.
    pub default: i32,
    /// Constraint candidate values must satisfy.
    pub constraint: LocatorConstraint,
}

impl LocatorDecl {
    /// Declares an unconstrained locator defaulting to [`LOC_ANY`].
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            default: LOC_ANY,
            constraint: LocatorConstraint::Free,
        }
    }

    /// Declares a locator that only permits `value`.
    #[must_use]
    pub const fn valued(name: &'static str, value: i32) -> Self {
        Self {
            name,
            default: value,
            constraint: LocatorConstraint::Valued(value),
        }
    }

    /// Declares a locator restricted to the inclusive range `lo..=hi`.
    #[must_use]
    pub const fn ranged(name: &'static str, lo: i32, hi: i32) -> Self {
        Self {
            name,
            default: LOC_ANY,
            constraint: LocatorConstraint::Ranged(lo, hi),
        }
    }
}

/// An interface attribute: the named attachment surface a driver exposes
/// to prospective children, along with the locators that parameterize it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CfIattr {
    /// Attribute name (e.g. "mainbus", "scsi", "i2cbus").
    pub name: &'static str,
    /// Ordered locator declarations. Child locator vectors must have
    /// exactly this many elements.
    pub locators: Vec<LocatorDecl>,
}

impl CfIattr {
    /// Creates an interface attribute with no locators.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            locators: Vec::new(),
        }
    }

    /// Creates an interface attribute with the given locator declarations.
    #[must_use]
    pub fn with_locators(name: &'static str, locators: Vec<LocatorDecl>) -> Self {
        Self { name, locators }
    }
}

/// A device class descriptor.
///
/// One `CfDriver` exists per driver name. Its interface attributes determine
/// whether (and how) instances of this class can parent other devices; a
/// driver with no attributes is always a leaf.
#[derive(Debug, Clone)]
pub struct CfDriver {
    /// Unique driver name (e.g. "mainbus", "sio", "le").
    pub name: &'static str,
    /// What kind of hardware this class represents.
    pub kind: DeviceKind,
    /// Interface attributes exposed to children, in declaration order.
    pub iattrs: Vec<CfIattr>,
}

impl CfDriver {
    /// Creates a leaf driver descriptor exposing no interface attributes.
    #[must_use]
    pub const fn new(name: &'static str, kind: DeviceKind) -> Self {
        Self {
            name,
            kind,
            iattrs: Vec::new(),
        }
    }

    /// Adds an interface attribute, returning the descriptor for chaining.
    #[must_use]
    pub fn with_iattr(mut self, iattr: CfIattr) -> Self {
        self.iattrs.push(iattr);
        self
    }

    /// Looks up an interface attribute by name.
    #[must_use]
    pub fn iattr(&self, name: &str) -> Option<&CfIattr> {
        self.iattrs.iter().find(|ia| ia.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iattr_lookup() {
        let drv = CfDriver::new("mainbus", DeviceKind::Bus)
            .with_iattr(CfIattr::new("mainbus"))
            .with_iattr(CfIattr::with_locators(
                "obio",
                vec![LocatorDecl::new("addr")],
            ));
        assert!(drv.iattr("mainbus").is_some());
        assert_eq!(drv.iattr("obio").unwrap().locators.len(), 1);
        assert!(drv.iattr("pci").is_none());
    }

    #[test]
    fn locator_decl_defaults() {
        let free = LocatorDecl::new("addr");
        assert_eq!(free.default, LOC_ANY);
        assert_eq!(free.constraint, LocatorConstraint::Free);

        let valued = LocatorDecl::valued("channel", 2);
        assert_eq!(valued.default, 2);
        assert_eq!(valued.constraint, LocatorConstraint::Valued(2));

        let ranged = LocatorDecl::ranged("target", 0, 7);
        assert_eq!(ranged.default, LOC_ANY);
        assert_eq!(ranged.constraint, LocatorConstraint::Ranged(0, 7));
    }
}
