//! Pseudo-device initialization.

use vesta_driver_api::PseudoDevice;

/// Runs each pseudo-device attach function once, in list order.
///
/// A failing pseudo-device is logged and skipped; the rest of the list
/// still runs.
pub(crate) fn init_pseudo(devices: &[PseudoDevice]) {
    for dev in devices {
        log::debug!("pseudo-device {} ({} units)", dev.name, dev.count);
        if let Err(err) = (dev.attach)(dev.count) {
            log::warn!("pseudo-device {}: attach failed: {err}", dev.name);
        }
    }
}
