//! The driver attachment trait and callback argument types.
//!
//! A [`DriverAttachment`] bundles the match/attach/detach implementation
//! binding one driver to one bus. A driver that can live on several buses
//! registers one attachment per bus under the same driver name.

use alloc::boxed::Box;
use alloc::sync::Arc;
use core::any::Any;

use crate::cfdata::CfFlags;
use crate::error::DriverError;

bitflags::bitflags! {
    /// Flags passed to detach callbacks.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DetachFlags: u32 {
        /// Detach the whole subtree, children first.
        const FORCE = 1 << 0;
        /// Suppress the detach log line.
        const QUIET = 1 << 1;
    }
}

/// Identity of the parent a candidate would attach beneath.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentInfo<'a> {
    /// Formatted instance name (e.g. "mainbus0").
    pub name: &'a str,
    /// Parent driver name.
    pub driver: &'a str,
    /// Parent unit number.
    pub unit: u32,
}

/// Argument bundle passed to match and attach callbacks.
///
/// The same bundle used for the match decision is passed to the subsequent
/// attach, so a driver never sees a device it did not agree to.
pub struct AttachArgs<'a> {
    /// The prospective parent; `None` when probing a root.
    pub parent: Option<ParentInfo<'a>>,
    /// The candidate entry's locator vector.
    pub locators: &'a [i32],
    /// The candidate entry's configuration flag bits.
    pub flags: CfFlags,
    /// Bus-specific auxiliary data supplied by whoever initiated the scan.
    /// Opaque to the engine; a callback downcasts it to the aux type its
    /// parent bus publishes.
    pub aux: Option<&'a dyn Any>,
}

impl<'a> AttachArgs<'a> {
    /// Downcasts the auxiliary data to a concrete bus aux type.
    #[must_use]
    pub fn aux_as<T: 'static>(&self) -> Option<&'a T> {
        self.aux.and_then(<dyn Any>::downcast_ref)
    }

    /// Returns the locator at `index`, if the vector is that long.
    #[must_use]
    pub fn locator(&self, index: usize) -> Option<i32> {
        self.locators.get(index).copied()
    }
}

/// Owned per-instance driver state (the softc).
///
/// A driver returns its concrete state from [`DriverAttachment::attach`]
/// (any `Send + 'static` type boxes into this) and downcasts it back with
/// the [`Any`] methods in later callbacks.
pub type Softc = Box<dyn Any + Send>;

/// One driver-to-bus binding: the match/attach/detach implementation the
/// engine invokes on behalf of a [`CfData`](crate::cfdata::CfData) entry.
///
/// Detach support is opt-in: an attachment that leaves [`can_detach`]
/// returning `false` is permanently resident once attached.
///
/// [`can_detach`]: DriverAttachment::can_detach
pub trait DriverAttachment: Send + Sync {
    /// Probes for the device described by `args`.
    ///
    /// Returns a score: `0` means "not present", higher values mean a
    /// better match (a more specific attachment outbids a generic one).
    /// Must not block and must not mutate driver or engine state; a
    /// callback that cannot decide reports `0`, since absence of a device
    /// is normal rather than exceptional.
    fn match_device(&self, args: &AttachArgs<'_>) -> u32;

    /// Attaches the device, returning its owned softc.
    ///
    /// Receives the same `args` the successful match saw. May block on
    /// hardware. On `Err` the engine rolls the instance back and continues
    /// with other candidates.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError`] if hardware initialization fails.
    fn attach(&self, args: &AttachArgs<'_>) -> Result<Softc, DriverError>;

    /// Reports whether this attachment supports detaching at all.
    ///
    /// The engine checks this before invoking any detach callback, so a
    /// forced subtree detach can refuse up front instead of half-way.
    fn can_detach(&self) -> bool {
        false
    }

    /// Detaches the device, releasing hardware resources.
    ///
    /// Only called when [`can_detach`](Self::can_detach) returns `true`.
    /// The softc is dropped by the engine after a successful return.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError`] if the device cannot be released; the
    /// instance then stays live and bound.
    fn detach(&self, state: &mut (dyn Any + Send), flags: DetachFlags) -> Result<(), DriverError> {
        let _ = (state, flags);
        Err(DriverError::Unsupported)
    }
}

/// A registered attachment: the `(driver, attachment)` key plus its
/// implementation.
#[derive(Clone)]
pub struct CfAttach {
    /// Driver name this attachment belongs to.
    pub driver: &'static str,
    /// Attachment name, unique within the driver (conventionally the
    /// parent bus, e.g. "sio_mainbus").
    pub attachment: &'static str,
    /// The callback implementation.
    pub ops: Arc<dyn DriverAttachment>,
}

impl CfAttach {
    /// Creates an attachment record.
    #[must_use]
    pub fn new(
        driver: &'static str,
        attachment: &'static str,
        ops: Arc<dyn DriverAttachment>,
    ) -> Self {
        Self {
            driver,
            attachment,
            ops,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullAttachment;

    impl DriverAttachment for NullAttachment {
        fn match_device(&self, _args: &AttachArgs<'_>) -> u32 {
            0
        }

        fn attach(&self, _args: &AttachArgs<'_>) -> Result<Softc, DriverError> {
            Ok(Box::new(()))
        }
    }

    #[test]
    fn detach_defaults_to_unsupported() {
        let att = NullAttachment;
        assert!(!att.can_detach());
        let mut state: Softc = Box::new(());
        assert_eq!(
            att.detach(state.as_mut(), DetachFlags::empty()),
            Err(DriverError::Unsupported)
        );
    }

    #[test]
    fn aux_downcast() {
        let aux: u32 = 7;
        let args = AttachArgs {
            parent: None,
            locators: &[1, -1],
            flags: CfFlags::empty(),
            aux: Some(&aux),
        };
        assert_eq!(args.aux_as::<u32>(), Some(&7));
        assert_eq!(args.aux_as::<i64>(), None);
        assert_eq!(args.locator(0), Some(1));
        assert_eq!(args.locator(2), None);
    }

    #[test]
    fn softc_downcast_round_trip() {
        struct SerialState {
            baud: u32,
        }

        let mut state: Softc = Box::new(SerialState { baud: 9600 });
        assert_eq!(state.downcast_ref::<SerialState>().unwrap().baud, 9600);
        state.downcast_mut::<SerialState>().unwrap().baud = 115_200;
        assert_eq!(state.downcast_ref::<SerialState>().unwrap().baud, 115_200);
        assert!(state.downcast_ref::<u32>().is_none());
    }

    #[test]
    fn detach_sees_the_attached_softc() {
        struct EchoAttachment;

        impl DriverAttachment for EchoAttachment {
            fn match_device(&self, _args: &AttachArgs<'_>) -> u32 {
                1
            }

            fn attach(&self, _args: &AttachArgs<'_>) -> Result<Softc, DriverError> {
                Ok(Box::new(7u8))
            }

            fn can_detach(&self) -> bool {
                true
            }

            fn detach(
                &self,
                state: &mut (dyn Any + Send),
                _flags: DetachFlags,
            ) -> Result<(), DriverError> {
                match state.downcast_mut::<u8>() {
                    Some(v) => {
                        *v = 0;
                        Ok(())
                    }
                    None => Err(DriverError::InvalidState),
                }
            }
        }

        let att = EchoAttachment;
        let args = AttachArgs {
            parent: None,
            locators: &[],
            flags: CfFlags::empty(),
            aux: None,
        };
        let mut state = att.attach(&args).unwrap();
        att.detach(state.as_mut(), DetachFlags::empty()).unwrap();
        assert_eq!(state.downcast_ref::<u8>(), Some(&0));
    }
}
