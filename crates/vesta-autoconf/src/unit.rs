//! Per-driver unit number allocation.
//!
//! Each driver gets a growable bitmap of bound unit numbers. Wildcard
//! requests take the first zero bit, so unit assignment is deterministic
//! and the smallest free number is always reused first.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use vesta_driver_api::UnitSpec;

use crate::error::AttachError;

const WORD_BITS: u32 = u64::BITS;

/// A growable bitmap of bound unit numbers for one driver.
#[derive(Debug, Default)]
struct UnitMap {
    words: Vec<u64>,
}

impl UnitMap {
    fn is_bound(&self, unit: u32) -> bool {
        let word = (unit / WORD_BITS) as usize;
        let bit = unit % WORD_BITS;
        self.words.get(word).is_some_and(|w| w & (1 << bit) != 0)
    }

    fn set(&mut self, unit: u32) {
        let word = (unit / WORD_BITS) as usize;
        let bit = unit % WORD_BITS;
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= 1 << bit;
    }

    fn clear(&mut self, unit: u32) -> bool {
        let word = (unit / WORD_BITS) as usize;
        let bit = unit % WORD_BITS;
        match self.words.get_mut(word) {
            Some(w) if *w & (1 << bit) != 0 => {
                *w &= !(1 << bit);
                true
            }
            _ => false,
        }
    }

    fn first_free(&self) -> u32 {
        for (i, word) in self.words.iter().enumerate() {
            if *word != u64::MAX {
                return i as u32 * WORD_BITS + (!word).trailing_zeros();
            }
        }
        self.words.len() as u32 * WORD_BITS
    }
}

/// Tracks which unit numbers are bound, per driver.
#[derive(Debug, Default)]
pub struct UnitAllocator {
    maps: BTreeMap<&'static str, UnitMap>,
}

impl UnitAllocator {
    /// Creates an empty allocator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether `unit` is currently bound for `driver`.
    #[must_use]
    pub fn is_bound(&self, driver: &str, unit: u32) -> bool {
        self.maps.get(driver).is_some_and(|m| m.is_bound(unit))
    }

    /// Binds a unit for `driver`.
    ///
    /// A [`UnitSpec::Star`] request returns the smallest unbound unit.
    ///
    /// # Errors
    ///
    /// Returns [`AttachError::UnitConflict`] if a fixed unit is already
    /// bound.
    pub fn allocate(&mut self, driver: &'static str, spec: UnitSpec) -> Result<u32, AttachError> {
        let map = self.maps.entry(driver).or_default();
        let unit = match spec {
            UnitSpec::Fixed(unit) => {
                if map.is_bound(unit) {
                    return Err(AttachError::UnitConflict { driver, unit });
                }
                unit
            }
            UnitSpec::Star => map.first_free(),
        };
        map.set(unit);
        Ok(unit)
    }

    /// Releases a bound unit.
    ///
    /// # Panics
    ///
    /// Panics if the unit is not bound. That is an engine bookkeeping bug,
    /// not a runtime failure path.
    pub fn release(&mut self, driver: &str, unit: u32) {
        let released = self
            .maps
            .get_mut(driver)
            .is_some_and(|m| m.clear(unit));
        assert!(released, "release of unbound unit {driver}{unit}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_allocates_smallest_free() {
        let mut alloc = UnitAllocator::new();
        assert_eq!(alloc.allocate("sd", UnitSpec::Star), Ok(0));
        assert_eq!(alloc.allocate("sd", UnitSpec::Star), Ok(1));
        assert_eq!(alloc.allocate("sd", UnitSpec::Star), Ok(2));
    }

    #[test]
    fn star_reuses_released_unit() {
        let mut alloc = UnitAllocator::new();
        assert_eq!(alloc.allocate("sd", UnitSpec::Star), Ok(0));
        assert_eq!(alloc.allocate("sd", UnitSpec::Star), Ok(1));
        alloc.release("sd", 0);
        assert_eq!(alloc.allocate("sd", UnitSpec::Star), Ok(0));
    }

    #[test]
    fn fixed_conflict() {
        let mut alloc = UnitAllocator::new();
        assert_eq!(alloc.allocate("le", UnitSpec::Fixed(0)), Ok(0));
        assert_eq!(
            alloc.allocate("le", UnitSpec::Fixed(0)),
            Err(AttachError::UnitConflict {
                driver: "le",
                unit: 0,
            })
        );
    }

    #[test]
    fn fixed_and_star_share_the_namespace() {
        let mut alloc = UnitAllocator::new();
        assert_eq!(alloc.allocate("sd", UnitSpec::Fixed(1)), Ok(1));
        // Star skips the bound unit 1.
        assert_eq!(alloc.allocate("sd", UnitSpec::Star), Ok(0));
        assert_eq!(alloc.allocate("sd", UnitSpec::Star), Ok(2));
    }

    #[test]
    fn drivers_are_independent() {
        let mut alloc = UnitAllocator::new();
        assert_eq!(alloc.allocate("sd", UnitSpec::Star), Ok(0));
        assert_eq!(alloc.allocate("cd", UnitSpec::Star), Ok(0));
        assert!(alloc.is_bound("sd", 0));
        assert!(alloc.is_bound("cd", 0));
        assert!(!alloc.is_bound("st", 0));
    }

    #[test]
    fn allocation_past_a_full_word() {
        let mut alloc = UnitAllocator::new();
        for expected in 0..70 {
            assert_eq!(alloc.allocate("vnd", UnitSpec::Star), Ok(expected));
        }
        alloc.release("vnd", 65);
        assert_eq!(alloc.allocate("vnd", UnitSpec::Star), Ok(65));
    }

    #[test]
    #[should_panic(expected = "release of unbound unit le0")]
    fn release_unbound_panics() {
        let mut alloc = UnitAllocator::new();
        alloc.release("le", 0);
    }
}
