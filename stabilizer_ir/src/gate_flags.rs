//! Gate flag bit set (spec §3 "Gate flags").

use bitflags::bitflags;

bitflags! {
    /// Bit-packed details about a gate, consulted by the validator, the
    /// target-group iterator, SURFT, the simplifier, and both exporters.
    ///
    /// Every defined gate has at least one flag set.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct GateFlags: u16 {
        /// Unitary and tableau/flow data is available for the gate.
        const UNITARY = 1 << 0;
        /// Omitted when computing a reference sample; represents physical noise.
        const NOISY = 1 << 1;
        /// Parens arguments are probabilities that must individually lie in
        /// `[0, 1]` and sum to at most `1 + 1e-7`.
        const ARGS_ARE_DISJOINT_PROBABILITIES = 1 << 2;
        /// The gate appends entries to the measurement record; inverted
        /// targets (`!q`) are only meaningful on such gates.
        const PRODUCES_RESULTS = 1 << 3;
        /// Adjacent instructions of this gate are never combined by `safe_append`.
        const NOT_FUSABLE = 1 << 4;
        /// The instruction is a control-flow block (`REPEAT`).
        const IS_BLOCK = 1 << 5;
        /// Targets come in qubit pairs.
        const TARGETS_PAIRS = 1 << 6;
        /// Targets are Pauli terms of a correlated Pauli string (without combiners).
        const TARGETS_PAULI_STRING = 1 << 7;
        /// Targets must (by default) be measurement-record targets; other
        /// flags can widen this.
        const ONLY_TARGETS_MEASUREMENT_RECORD = 1 << 8;
        /// Targets may be measurement-record or sweep-bit targets.
        const CAN_TARGET_BITS = 1 << 9;
        /// The gate takes no targets at all.
        const TAKES_NO_TARGETS = 1 << 10;
        /// Parens arguments must equal their own round (unsigned integers).
        const ARGS_ARE_UNSIGNED_INTEGERS = 1 << 11;
        /// Pauli targets may be separated by combiner (`*`) targets.
        const TARGETS_COMBINERS = 1 << 12;
        /// The gate is a dissipative reset (clears, rather than rotates, a qubit's frame).
        const IS_RESET = 1 << 13;
        /// The instruction has no effect on qubits (it is a classical annotation).
        const HAS_NO_EFFECT_ON_QUBITS = 1 << 14;
        /// The gate trivially broadcasts over any number of single-qubit targets.
        const IS_SINGLE_QUBIT_GATE = 1 << 15;
    }
}

/// Sentinel `arg_count` meaning "any number of parens arguments is allowed"
/// (e.g. `DETECTOR`'s coordinate data).
pub const ARG_COUNT_ANY: u8 = 0xFF;

/// Sentinel `arg_count` meaning "0 or 1 parens arguments" (noiseless vs.
/// noisy measurement).
pub const ARG_COUNT_ZERO_OR_ONE: u8 = 0xFE;
