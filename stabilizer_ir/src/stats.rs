//! Circuit-wide statistics, folded through `REPEAT` blocks with saturating
//! arithmetic (spec §3 "CircuitStats", §4.2).
//!
//! Grounded on `original_source/src/stim/circuit/circuit_instruction.h`
//! (`CircuitStats::repeated`).

/// Aggregate counts describing a circuit or a block of one, used to
/// pre-size buffers and to answer "how many detectors does this circuit
/// declare" without a second pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CircuitStats {
    pub num_detectors: u64,
    pub num_observables: u32,
    pub num_measurements: u64,
    pub num_qubits: u32,
    pub num_ticks: u64,
    /// The largest measurement lookback (`rec[-k]`) referenced anywhere.
    pub max_lookback: u64,
    pub num_sweep_bits: u32,
}

impl CircuitStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Combines `self` (the stats of one instruction or sub-block) into an
    /// accumulator, as if the two had been concatenated.
    pub fn accumulate(&mut self, other: &CircuitStats) {
        self.num_detectors = self.num_detectors.saturating_add(other.num_detectors);
        self.num_measurements = self.num_measurements.saturating_add(other.num_measurements);
        self.num_ticks = self.num_ticks.saturating_add(other.num_ticks);
        self.num_observables = self.num_observables.max(other.num_observables);
        self.num_qubits = self.num_qubits.max(other.num_qubits);
        self.max_lookback = self.max_lookback.max(other.max_lookback);
        self.num_sweep_bits = self.num_sweep_bits.max(other.num_sweep_bits);
    }

    /// The stats of a `REPEAT <repetitions> { <self> }` block: detector,
    /// measurement, and tick counts scale with the repetition count (and
    /// saturate rather than overflow); qubit count, observable count,
    /// lookback, and sweep-bit count do not, since those describe resources
    /// rather than events.
    #[must_use]
    pub fn repeated(&self, repetitions: u64) -> CircuitStats {
        CircuitStats {
            num_detectors: self.num_detectors.saturating_mul(repetitions),
            num_observables: self.num_observables,
            num_measurements: self.num_measurements.saturating_mul(repetitions),
            num_qubits: self.num_qubits,
            num_ticks: self.num_ticks.saturating_mul(repetitions),
            max_lookback: self.max_lookback,
            num_sweep_bits: self.num_sweep_bits,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_scales_events_not_resources() {
        let body = CircuitStats {
            num_detectors: 2,
            num_observables: 1,
            num_measurements: 3,
            num_qubits: 5,
            num_ticks: 1,
            max_lookback: 4,
            num_sweep_bits: 2,
        };
        let folded = body.repeated(1_000);
        assert_eq!(folded.num_detectors, 2_000);
        assert_eq!(folded.num_measurements, 3_000);
        assert_eq!(folded.num_ticks, 1_000);
        assert_eq!(folded.num_qubits, 5);
        assert_eq!(folded.num_observables, 1);
        assert_eq!(folded.max_lookback, 4);
        assert_eq!(folded.num_sweep_bits, 2);
    }

    #[test]
    fn repeated_saturates_instead_of_overflowing() {
        let body = CircuitStats {
            num_measurements: u64::MAX / 2,
            ..CircuitStats::new()
        };
        let folded = body.repeated(10);
        assert_eq!(folded.num_measurements, u64::MAX);
    }

    #[test]
    fn accumulate_takes_max_of_resource_fields() {
        let mut total = CircuitStats {
            num_qubits: 3,
            ..CircuitStats::new()
        };
        total.accumulate(&CircuitStats {
            num_qubits: 9,
            num_detectors: 4,
            ..CircuitStats::new()
        });
        assert_eq!(total.num_qubits, 9);
        assert_eq!(total.num_detectors, 4);
    }
}
