//! Detector-model target (spec §3 "Detector-model target", §6 "Detector-model
//! target string form").
//!
//! Grounded on `original_source/src/stim/dem/dem_instruction.cc`: a 64-bit
//! word whose top bit marks an observable, whose all-ones value is a
//! separator, and whose remaining bits are a relative detector id.

use std::fmt;

const OBSERVABLE_BIT: u64 = 1 << 63;
const SEPARATOR: u64 = u64::MAX;

/// Largest relative detector id this word can carry (63 usable bits).
pub const MAX_ID: u64 = OBSERVABLE_BIT - 1;

/// Largest observable id: unlike detector ids, observable ids are bounded to
/// 32 bits (spec §6).
pub const MAX_OBSERVABLE_ID: u64 = (1 << 32) - 1;

/// A reference, relative to the instruction that uses it, to a detector, an
/// observable, or the `^` separator joining the two halves of a correlated
/// error's target list.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DemTarget {
    data: u64,
}

impl DemTarget {
    #[must_use]
    pub fn relative_detector_id(id: u64) -> Self {
        debug_assert!(id <= MAX_ID);
        DemTarget { data: id }
    }

    #[must_use]
    pub fn observable_id(id: u64) -> Self {
        debug_assert!(id <= MAX_OBSERVABLE_ID);
        DemTarget {
            data: id | OBSERVABLE_BIT,
        }
    }

    #[must_use]
    pub fn separator() -> Self {
        DemTarget { data: SEPARATOR }
    }

    #[must_use]
    pub fn is_separator(self) -> bool {
        self.data == SEPARATOR
    }

    #[must_use]
    pub fn is_observable_id(self) -> bool {
        self.data != SEPARATOR && self.data & OBSERVABLE_BIT != 0
    }

    #[must_use]
    pub fn is_relative_detector_id(self) -> bool {
        self.data != SEPARATOR && self.data & OBSERVABLE_BIT == 0
    }

    /// The id without the observable flag. Meaningless on a separator.
    #[must_use]
    pub fn raw_id(self) -> u64 {
        self.data & !OBSERVABLE_BIT
    }

    /// The raw 64-bit word, for use as a stable sort/hash key in
    /// [`crate::sparse_xor_vec::SparseXorVec`].
    #[must_use]
    pub fn raw(self) -> u64 {
        self.data
    }

    pub(crate) fn from_raw(data: u64) -> Self {
        DemTarget { data }
    }

    /// Shifts a relative detector id by `offset`. A no-op on observables and
    /// on the separator.
    #[must_use]
    pub fn shift_if_detector_id(self, offset: i64) -> Self {
        if !self.is_relative_detector_id() {
            return self;
        }
        let shifted = (self.data as i64) + offset;
        debug_assert!(shifted >= 0);
        DemTarget {
            data: shifted as u64,
        }
    }

    /// Parses `^`, `D<k>`, or `L<k>`.
    #[must_use]
    pub fn from_text(text: &str) -> Option<Self> {
        if text == "^" {
            return Some(DemTarget::separator());
        }
        if let Some(digits) = text.strip_prefix('D') {
            let id: u64 = digits.parse().ok()?;
            if id > MAX_ID {
                return None;
            }
            return Some(DemTarget::relative_detector_id(id));
        }
        if let Some(digits) = text.strip_prefix('L') {
            let id: u64 = digits.parse().ok()?;
            if id > MAX_OBSERVABLE_ID {
                return None;
            }
            return Some(DemTarget::observable_id(id));
        }
        None
    }
}

impl fmt::Display for DemTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_separator() {
            write!(f, "^")
        } else if self.is_observable_id() {
            write!(f, "L{}", self.raw_id())
        } else {
            write!(f, "D{}", self.raw_id())
        }
    }
}

impl fmt::Debug for DemTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DemTarget({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_parse_round_trip() {
        for target in [
            DemTarget::relative_detector_id(0),
            DemTarget::relative_detector_id(41),
            DemTarget::observable_id(2),
            DemTarget::separator(),
        ] {
            let text = target.to_string();
            assert_eq!(DemTarget::from_text(&text).unwrap(), target);
        }
    }

    #[test]
    fn classification_is_mutually_exclusive() {
        let d = DemTarget::relative_detector_id(3);
        let l = DemTarget::observable_id(3);
        let sep = DemTarget::separator();
        assert!(d.is_relative_detector_id() && !d.is_observable_id() && !d.is_separator());
        assert!(l.is_observable_id() && !l.is_relative_detector_id() && !l.is_separator());
        assert!(sep.is_separator() && !sep.is_observable_id() && !sep.is_relative_detector_id());
    }

    #[test]
    fn observable_ids_are_bounded_to_32_bits_but_detector_ids_are_not() {
        assert!(DemTarget::from_text("L4294967295").is_some());
        assert!(DemTarget::from_text("L4294967296").is_none());
        assert!(DemTarget::from_text("D9223372036854775806").is_some());
    }

    #[test]
    fn shift_only_moves_detectors() {
        let d = DemTarget::relative_detector_id(5).shift_if_detector_id(3);
        assert_eq!(d.raw_id(), 8);
        let l = DemTarget::observable_id(5).shift_if_detector_id(3);
        assert_eq!(l.raw_id(), 5);
        let sep = DemTarget::separator().shift_if_detector_id(3);
        assert!(sep.is_separator());
    }
}
