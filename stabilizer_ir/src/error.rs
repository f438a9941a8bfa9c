//! Errors surfaced by the circuit model, validator, and analysis passes.

use thiserror::Error;

/// Errors produced while building, validating, or analyzing a [`crate::circuit::Circuit`].
///
/// Every pass in this crate aborts at the first failure and propagates it to
/// the caller; there is no local recovery (see spec §7).
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Error {
    #[error("Gate not found: '{0}'")]
    UnknownGate(String),

    #[error("gate {gate} was given {given} parens arguments but takes {expected}")]
    WrongArgCount {
        gate: String,
        given: usize,
        expected: String,
    },

    #[error("{gate} argument {value} is not in the range [0, 1]")]
    ProbabilityOutOfRange { gate: String, value: f64 },

    #[error("{gate} arguments must sum to at most 1 (got {sum})")]
    ProbabilitiesSumTooLarge { gate: String, sum: f64 },

    #[error("{gate} argument {value} is not an integer")]
    ArgumentNotInteger { gate: String, value: f64 },

    #[error("gate {gate} takes no targets but was given {given}")]
    TakesNoTargets { gate: String, given: usize },

    #[error("the two qubit gate {gate} was applied to a target pair with the same target ({qubit}) twice")]
    RepeatedPairTarget { gate: String, qubit: u32 },

    #[error("the two qubit gate {gate} was given an odd number of targets")]
    OddTargetCount { gate: String },

    #[error("gate {gate} was given target '{target}' which it does not support")]
    InvalidTargetForGate { gate: String, target: String },

    #[error("a trailing combiner ('*') is not allowed in {gate}")]
    TrailingCombiner { gate: String },

    #[error("a pauli product specified the same qubit twice.\nThe operation: {0}")]
    PauliProductRepeatedQubit(String),

    #[error("{gate} was applied to a non-Hermitian Pauli product")]
    NonHermitianPauliProduct { gate: String },

    #[error("Referred to a measurement result before the beginning of time.")]
    MeasurementRecordBeforeStart,

    #[error("A detector or observable anticommuted with a dissipative operation.")]
    AnticommutingDissipation,

    #[error("Not implemented: splitting {0}")]
    UnsupportedTargetGroupShape(String),

    #[error("REPEAT block must repeat at least once")]
    EmptyRepeatBlock,

    #[error("REPEAT block target array must have exactly 3 entries, got {0}")]
    MalformedRepeatTargets(usize),

    #[error("{feature} is not supported when exporting to {target}")]
    UnsupportedExportTarget { target: String, feature: String },

    #[error("{0} has no visual representation in the Quirk editor")]
    NoQuirkVisual(String),
}

pub type Result<T> = std::result::Result<T, Error>;
