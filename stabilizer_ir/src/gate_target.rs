//! Bit-packed instruction target word (spec §3 "Gate target", §6 "Gate-target
//! bit layout").
//!
//! A [`GateTarget`] is one 32-bit word. The top bits carry flags; the low 24
//! bits carry a payload whose meaning depends on the flags: a qubit index, a
//! measurement lookback (`rec[-k]`), or a sweep-bit index (`sweep[k]`).

use std::fmt;

use crate::error::{Error, Result};

const VALUE_MASK: u32 = 0x00FF_FFFF;

const INVERTED_BIT: u32 = 1 << 31;
const PAULI_X_BIT: u32 = 1 << 30;
const PAULI_Z_BIT: u32 = 1 << 29;
const RECORD_BIT: u32 = 1 << 28;
const SWEEP_BIT: u32 = 1 << 27;
const COMBINER_BIT: u32 = 1 << 26;

/// Largest qubit index / lookback / sweep index representable in the 24-bit
/// payload.
pub const MAX_TARGET_VALUE: u32 = VALUE_MASK;

/// One target slot of a [`crate::circuit::CircuitInstruction`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct GateTarget {
    data: u32,
}

impl GateTarget {
    #[must_use]
    pub fn qubit(q: u32) -> Self {
        debug_assert!(q <= MAX_TARGET_VALUE);
        GateTarget { data: q }
    }

    #[must_use]
    pub fn x(q: u32) -> Self {
        GateTarget {
            data: q | PAULI_X_BIT,
        }
    }

    #[must_use]
    pub fn y(q: u32) -> Self {
        GateTarget {
            data: q | PAULI_X_BIT | PAULI_Z_BIT,
        }
    }

    #[must_use]
    pub fn z(q: u32) -> Self {
        GateTarget {
            data: q | PAULI_Z_BIT,
        }
    }

    /// A measurement-record target, `rec[-lookback]`. `lookback` must be
    /// strictly positive (`rec[0]` does not exist).
    #[must_use]
    pub fn rec(lookback: u32) -> Self {
        debug_assert!(lookback > 0 && lookback <= MAX_TARGET_VALUE);
        GateTarget {
            data: lookback | RECORD_BIT,
        }
    }

    #[must_use]
    pub fn sweep_bit(index: u32) -> Self {
        GateTarget {
            data: index | SWEEP_BIT,
        }
    }

    /// The `*` pseudo-target joining adjacent Pauli terms of a product.
    #[must_use]
    pub fn combiner() -> Self {
        GateTarget { data: COMBINER_BIT }
    }

    #[must_use]
    pub fn inverted(self) -> Self {
        GateTarget {
            data: self.data ^ INVERTED_BIT,
        }
    }

    #[must_use]
    pub fn is_inverted(self) -> bool {
        self.data & INVERTED_BIT != 0
    }

    #[must_use]
    pub fn is_combiner(self) -> bool {
        self.data & COMBINER_BIT != 0
    }

    #[must_use]
    pub fn is_measurement_record_target(self) -> bool {
        self.data & RECORD_BIT != 0
    }

    #[must_use]
    pub fn is_sweep_bit_target(self) -> bool {
        self.data & SWEEP_BIT != 0
    }

    #[must_use]
    pub fn is_x(self) -> bool {
        self.data & PAULI_X_BIT != 0 && self.data & PAULI_Z_BIT == 0
    }

    #[must_use]
    pub fn is_y(self) -> bool {
        self.data & PAULI_X_BIT != 0 && self.data & PAULI_Z_BIT != 0
    }

    #[must_use]
    pub fn is_z(self) -> bool {
        self.data & PAULI_X_BIT == 0 && self.data & PAULI_Z_BIT != 0
    }

    #[must_use]
    pub fn is_pauli_target(self) -> bool {
        self.data & (PAULI_X_BIT | PAULI_Z_BIT) != 0
    }

    #[must_use]
    pub fn has_x_component(self) -> bool {
        self.data & PAULI_X_BIT != 0
    }

    #[must_use]
    pub fn has_z_component(self) -> bool {
        self.data & PAULI_Z_BIT != 0
    }

    #[must_use]
    pub fn is_qubit_target(self) -> bool {
        self.data & (RECORD_BIT | SWEEP_BIT | COMBINER_BIT) == 0
    }

    /// The low-24-bit payload: a qubit index, a lookback, or a sweep index
    /// depending on which kind of target this is. Panics on a combiner.
    #[must_use]
    pub fn value(self) -> u32 {
        debug_assert!(!self.is_combiner());
        self.data & VALUE_MASK
    }

    /// Alias for [`GateTarget::value`] when the target is known to be a
    /// qubit or Pauli target.
    #[must_use]
    pub fn qubit_value(self) -> u32 {
        self.value()
    }

    /// The measurement record offset this target refers to, as used by
    /// `DETECTOR`/`OBSERVABLE_INCLUDE` (`rec[-k]` has offset `-k`).
    #[must_use]
    pub fn rec_offset(self) -> i64 {
        debug_assert!(self.is_measurement_record_target());
        -(i64::from(self.value()))
    }

    /// The raw 32-bit word, for use as a stable sort/hash key.
    #[must_use]
    pub fn raw(self) -> u32 {
        self.data
    }

    pub(crate) fn from_raw(data: u32) -> Self {
        GateTarget { data }
    }

    /// Parses one whitespace-delimited target token from a circuit's textual
    /// lexical surface (spec §6): `5`, `X5`, `Y5`, `Z5`, `!5`, `!X5`,
    /// `rec[-3]`, `sweep[2]`, `*`.
    pub fn parse(token: &str) -> Result<Self> {
        let mut rest = token;
        let mut inverted = false;
        if let Some(stripped) = rest.strip_prefix('!') {
            inverted = true;
            rest = stripped;
        }
        let mut target = if rest == "*" {
            if inverted {
                return Err(Error::InvalidTargetForGate {
                    gate: String::new(),
                    target: token.to_string(),
                });
            }
            GateTarget::combiner()
        } else if let Some(stripped) = rest.strip_prefix("rec[-") {
            let digits = stripped.strip_suffix(']').ok_or_else(|| {
                Error::InvalidTargetForGate {
                    gate: String::new(),
                    target: token.to_string(),
                }
            })?;
            let lookback: u32 = digits.parse().map_err(|_| Error::InvalidTargetForGate {
                gate: String::new(),
                target: token.to_string(),
            })?;
            if lookback == 0 {
                return Err(Error::InvalidTargetForGate {
                    gate: String::new(),
                    target: token.to_string(),
                });
            }
            GateTarget::rec(lookback)
        } else if let Some(stripped) = rest.strip_prefix("sweep[") {
            let digits = stripped.strip_suffix(']').ok_or_else(|| {
                Error::InvalidTargetForGate {
                    gate: String::new(),
                    target: token.to_string(),
                }
            })?;
            let index: u32 = digits.parse().map_err(|_| Error::InvalidTargetForGate {
                gate: String::new(),
                target: token.to_string(),
            })?;
            GateTarget::sweep_bit(index)
        } else {
            let (pauli, digits) = match rest.as_bytes().first() {
                Some(b'X') => (Some('X'), &rest[1..]),
                Some(b'Y') => (Some('Y'), &rest[1..]),
                Some(b'Z') => (Some('Z'), &rest[1..]),
                _ => (None, rest),
            };
            let q: u32 = digits.parse().map_err(|_| Error::InvalidTargetForGate {
                gate: String::new(),
                target: token.to_string(),
            })?;
            match pauli {
                Some('X') => GateTarget::x(q),
                Some('Y') => GateTarget::y(q),
                Some('Z') => GateTarget::z(q),
                _ => GateTarget::qubit(q),
            }
        };
        if inverted {
            target = target.inverted();
        }
        Ok(target)
    }
}

impl fmt::Display for GateTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_combiner() {
            return write!(f, "*");
        }
        if self.is_inverted() {
            write!(f, "!")?;
        }
        if self.is_measurement_record_target() {
            return write!(f, "rec[-{}]", self.value());
        }
        if self.is_sweep_bit_target() {
            return write!(f, "sweep[{}]", self.value());
        }
        if self.is_y() {
            write!(f, "Y{}", self.value())
        } else if self.is_x() {
            write!(f, "X{}", self.value())
        } else if self.is_z() {
            write!(f, "Z{}", self.value())
        } else {
            write!(f, "{}", self.value())
        }
    }
}

impl fmt::Debug for GateTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GateTarget({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_display_and_parse() {
        let cases = [
            GateTarget::qubit(5),
            GateTarget::x(5),
            GateTarget::y(12),
            GateTarget::z(0),
            GateTarget::x(3).inverted(),
            GateTarget::rec(1),
            GateTarget::rec(3),
            GateTarget::sweep_bit(2),
            GateTarget::combiner(),
        ];
        for target in cases {
            let text = target.to_string();
            let parsed = GateTarget::parse(&text).unwrap();
            assert_eq!(parsed.raw(), target.raw(), "round trip of {text}");
        }
    }

    #[test]
    fn pauli_classification() {
        assert!(GateTarget::x(0).is_x());
        assert!(GateTarget::y(0).is_y());
        assert!(GateTarget::z(0).is_z());
        assert!(!GateTarget::qubit(0).is_pauli_target());
    }

    #[test]
    fn rec_offset_is_negative_lookback() {
        assert_eq!(GateTarget::rec(1).rec_offset(), -1);
        assert_eq!(GateTarget::rec(5).rec_offset(), -5);
    }
}
