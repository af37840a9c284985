//! Locator vector validation.

use vesta_driver_api::{CfIattr, LocatorConstraint, LOC_ANY};

/// Checks a candidate's locator vector against an interface attribute's
/// declared constraints.
///
/// The vector must have exactly one value per declared locator, and each
/// value must be [`LOC_ANY`] or satisfy the constraint at its position.
/// Pure and side-effect-free.
#[must_use]
pub fn validate(locators: &[i32], iattr: &CfIattr) -> bool {
    if locators.len() != iattr.locators.len() {
        return false;
    }
    locators
        .iter()
        .zip(&iattr.locators)
        .all(|(&value, decl)| {
            value == LOC_ANY
                || match decl.constraint {
                    LocatorConstraint::Free => true,
                    LocatorConstraint::Valued(v) => value == v,
                    LocatorConstraint::Ranged(lo, hi) => (lo..=hi).contains(&value),
                }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use vesta_driver_api::LocatorDecl;

    fn scsi_iattr() -> CfIattr {
        CfIattr::with_locators(
            "scsi",
            vec![
                LocatorDecl::ranged("target", 0, 7),
                LocatorDecl::new("lun"),
                LocatorDecl::valued("channel", 1),
            ],
        )
    }

    #[test]
    fn length_must_match_exactly() {
        let iattr = scsi_iattr();
        assert!(!validate(&[0, 0], &iattr));
        assert!(!validate(&[0, 0, 1, 0], &iattr));
        assert!(validate(&[0, 0, 1], &iattr));
    }

    #[test]
    fn any_always_passes() {
        let iattr = scsi_iattr();
        assert!(validate(&[LOC_ANY, LOC_ANY, LOC_ANY], &iattr));
    }

    #[test]
    fn ranged_constraint() {
        let iattr = scsi_iattr();
        assert!(validate(&[7, 0, 1], &iattr));
        assert!(!validate(&[8, 0, 1], &iattr));
    }

    #[test]
    fn valued_constraint() {
        let iattr = scsi_iattr();
        assert!(!validate(&[0, 0, 2], &iattr));
        assert!(validate(&[0, 0, 1], &iattr));
    }

    #[test]
    fn free_constraint_accepts_anything() {
        let iattr = scsi_iattr();
        assert!(validate(&[0, 12345, 1], &iattr));
        assert!(validate(&[0, -7, 1], &iattr));
    }

    #[test]
    fn empty_attribute_needs_empty_vector() {
        let iattr = CfIattr::new("mainbus");
        assert!(validate(&[], &iattr));
        assert!(!validate(&[0], &iattr));
    }
}
