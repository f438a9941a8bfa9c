//! Classical-feedback inlining (spec §4.5).
//!
//! Grounded on `original_source/src/stim/transformers/transform_without_feedback.cc`:
//! a classically-controlled Pauli gate (`CX rec[-1] 0`, a correction applied
//! in response to a measurement result) never needs to be physically
//! applied, because its effect on every downstream detector and observable
//! can instead be folded directly into that detector's/observable's own
//! target list. [`crate::surft::SurfTracker`] computes which detectors and
//! observables a dropped correction's controlling measurement now affects;
//! this module splices that sensitivity back into the `DETECTOR`/
//! `OBSERVABLE_INCLUDE` instructions that reference it, so the resulting
//! circuit has the same detector error model as the input (spec §8.4) with
//! no feedback gates left in it. A sweep-bit-controlled correction
//! (`CX sweep[5] 0`) has no run-time anticommutation semantics to fold —
//! its controlling bit isn't known until simulation time — so it is always
//! kept unchanged in the output.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::circuit::{Circuit, GateInstruction, Operation};
use crate::dem_target::DemTarget;
use crate::error::Result;
use crate::gate_flags::GateFlags;
use crate::gate_target::GateTarget;
use crate::gate_type::GateType;
use crate::sparse_xor_vec::SparseXorVec;
use crate::surft::SurfTracker;

/// A pair within a classically-controlled Pauli gate is eligible for
/// folding only when its classical operand is a measurement record: a
/// sweep bit carries no information until simulation time, so it must stay
/// in the output.
fn is_foldable_pair(a: GateTarget, b: GateTarget) -> bool {
    a.is_measurement_record_target() || b.is_measurement_record_target()
}

fn is_feedback_candidate(gate_type: GateType) -> bool {
    matches!(gate_type, GateType::Cx | GateType::Cy | GateType::Cz | GateType::Xcz | GateType::Ycz)
}

/// Converts a set of absolute measurement indices into the `rec[-k]`
/// targets a `DETECTOR`/`OBSERVABLE_INCLUDE` instruction would use to refer
/// to them, ordered so the most distant lookback comes first (matching the
/// lexical convention already used throughout this crate).
fn resolve_record_targets(indices: &SparseXorVec<u64>, total_measurements: u64) -> Vec<GateTarget> {
    indices
        .iter()
        .map(|&index| GateTarget::rec((total_measurements - index) as u32))
        .collect()
}

/// Drives the single backward pass that inlines feedback: walks the circuit
/// from its end to its start through [`SurfTracker`], dropping foldable
/// feedback pairs and recording which absolute measurement indices end up
/// contributing to which detector/observable, then patches the recorded
/// `DETECTOR`/`OBSERVABLE_INCLUDE` placeholders once the whole pass (and
/// every unrolled `REPEAT` body) has converged.
struct Inliner {
    tracker: SurfTracker,
    out: Vec<Operation>,
    /// Absolute measurement indices whose result is folded into each
    /// detector/observable, keyed by its `DemTarget` identity.
    membership: FxHashMap<DemTarget, SparseXorVec<u64>>,
    /// `(position in `out` at push time, that instruction's DemTarget)`,
    /// patched once `membership` has its final value.
    annotation_slots: Vec<(usize, DemTarget)>,
}

impl Inliner {
    fn new(num_qubits: usize) -> Self {
        Inliner {
            tracker: SurfTracker::new(num_qubits),
            out: Vec::new(),
            membership: FxHashMap::default(),
            annotation_slots: Vec::new(),
        }
    }

    fn run(&mut self, circuit: &Circuit) -> Result<()> {
        for op in circuit.operations.iter().rev() {
            match op {
                Operation::Repeat { repetitions, body } => {
                    // Feedback can be inlined differently across iterations (the
                    // controlling measurement differs each time), so the loop is
                    // unrolled here; loop folding back down is a separate
                    // concern (spec §4.3, handled by `SurfTracker::undo_loop`).
                    for _ in 0..*repetitions {
                        self.run(body)?;
                    }
                }
                Operation::Gate(instruction) => self.handle_gate(instruction)?,
            }
        }
        Ok(())
    }

    fn handle_gate(&mut self, instruction: &GateInstruction) -> Result<()> {
        let view = instruction.as_view();
        match view.gate_type {
            GateType::Detector => {
                let dem = DemTarget::relative_detector_id(self.tracker.num_detectors_in_past() - 1);
                self.annotation_slots.push((self.out.len(), dem));
                self.out.push(Operation::Gate(instruction.clone()));
                self.tracker.undo_gate(view)?;
            }
            GateType::ObservableInclude => {
                let id = view.args.first().copied().unwrap_or(0.0) as u64;
                let dem = DemTarget::observable_id(id);
                self.annotation_slots.push((self.out.len(), dem));
                self.out.push(Operation::Gate(instruction.clone()));
                self.tracker.undo_gate(view)?;
            }
            gate_type if is_feedback_candidate(gate_type) => {
                let mut kept = Vec::with_capacity(view.targets.len());
                for pair in view.targets.chunks_exact(2) {
                    if !is_foldable_pair(pair[0], pair[1]) {
                        kept.push(pair[0]);
                        kept.push(pair[1]);
                    }
                }
                self.tracker.undo_gate(view)?;
                if !kept.is_empty() {
                    self.out.push(Operation::Gate(
                        GateInstruction::new(gate_type, view.args.to_vec(), kept).with_tag(view.tag),
                    ));
                }
            }
            _ => {
                self.record_measurement_membership(view.flags(), view.count_measurement_results());
                self.tracker.undo_gate(view)?;
                self.out.push(Operation::Gate(instruction.clone()));
            }
        }
        Ok(())
    }

    /// Before a measurement-producing instruction's own `undo_gate` call
    /// consumes and clears its entries in `SurfTracker`'s record-bit map,
    /// reads off which detectors/observables each about-to-be-assigned
    /// absolute measurement index has picked up — whether from its own
    /// original `DETECTOR`/`OBSERVABLE_INCLUDE` target list or from a
    /// feedback pair folded into it further ahead in time.
    fn record_measurement_membership(&mut self, flags: GateFlags, result_count: usize) {
        if !flags.contains(GateFlags::PRODUCES_RESULTS) {
            return;
        }
        let base = self.tracker.num_measurements_in_past();
        for offset in 0..result_count as u64 {
            let index = base - 1 - offset;
            let sensitivity = self.tracker.pending_sensitivity(index);
            for &dem in sensitivity.iter() {
                self.membership.entry(dem).or_default().xor_item(index);
            }
        }
    }

    /// Rewrites every recorded `DETECTOR`/`OBSERVABLE_INCLUDE` placeholder
    /// with its final target list. When several instructions share the same
    /// observable id, the combined membership is assigned to whichever one
    /// comes first in this (backward) pass — the one latest in the original
    /// circuit — and the rest are left with no targets, since only the
    /// union across all of them needs to match the original parity.
    fn patch_annotations(&mut self, total_measurements: u64) {
        let mut assigned: FxHashSet<DemTarget> = FxHashSet::default();
        for (position, dem) in &self.annotation_slots {
            let targets = if assigned.insert(*dem) {
                self.membership
                    .get(dem)
                    .map(|indices| resolve_record_targets(indices, total_measurements))
                    .unwrap_or_default()
            } else {
                Vec::new()
            };
            if let Operation::Gate(instruction) = &mut self.out[*position] {
                instruction.targets = targets;
            }
        }
    }
}

/// Returns a circuit with every classically-controlled Pauli correction
/// removed, its effect folded into the `DETECTOR`/`OBSERVABLE_INCLUDE`
/// instructions it would otherwise have corrected, erroring if a reset or
/// measurement in `circuit` would have collided with an unresolved frame
/// dependency ([`crate::error::Error::AnticommutingDissipation`]).
pub fn circuit_with_inlined_feedback(circuit: &Circuit) -> Result<Circuit> {
    let stats = circuit.compute_stats();
    let mut inliner = Inliner::new(stats.num_qubits.max(1) as usize);
    inliner.tracker.shift(stats.num_measurements as i64, stats.num_detectors as i64);
    inliner.run(circuit)?;
    inliner.patch_annotations(stats.num_measurements);
    inliner.out.reverse();
    Ok(Circuit { operations: inliner.out })
}

/// Merges adjacent `REPEAT` blocks with identical bodies into one block,
/// recursing into nested bodies first. A cleanup pass run after feedback
/// inlining re-exposes loop structure that unrolling in
/// [`circuit_with_inlined_feedback`] would otherwise leave fragmented.
#[must_use]
pub fn circuit_with_identical_adjacent_loops_fused(circuit: &Circuit) -> Circuit {
    let mut out: Vec<Operation> = Vec::new();
    for op in &circuit.operations {
        match op {
            Operation::Repeat { repetitions, body } => {
                let folded_body = circuit_with_identical_adjacent_loops_fused(body);
                if let Some(Operation::Repeat {
                    repetitions: prev_reps,
                    body: prev_body,
                }) = out.last_mut()
                {
                    if **prev_body == folded_body {
                        *prev_reps += repetitions;
                        continue;
                    }
                }
                out.push(Operation::Repeat {
                    repetitions: *repetitions,
                    body: Box::new(folded_body),
                });
            }
            Operation::Gate(instruction) => out.push(Operation::Gate(instruction.clone())),
        }
    }
    Circuit { operations: out }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::GateInstruction;
    use crate::gate_target::GateTarget;

    #[test]
    fn drops_a_classically_controlled_correction() {
        let mut circuit = Circuit::new();
        circuit
            .safe_append(GateInstruction::new(GateType::M, vec![], vec![GateTarget::qubit(0)]))
            .unwrap();
        circuit
            .safe_append(GateInstruction::new(
                GateType::Cx,
                vec![],
                vec![GateTarget::rec(1), GateTarget::qubit(1)],
            ))
            .unwrap();
        let inlined = circuit_with_inlined_feedback(&circuit).unwrap();
        assert_eq!(inlined.operations.len(), 1);
        assert!(matches!(&inlined.operations[0], Operation::Gate(g) if g.gate_type == GateType::M));
    }

    #[test]
    fn keeps_a_purely_quantum_controlled_not() {
        let mut circuit = Circuit::new();
        circuit
            .safe_append(GateInstruction::new(
                GateType::Cx,
                vec![],
                vec![GateTarget::qubit(0), GateTarget::qubit(1)],
            ))
            .unwrap();
        let inlined = circuit_with_inlined_feedback(&circuit).unwrap();
        assert_eq!(inlined.operations.len(), 1);
    }

    #[test]
    fn keeps_a_sweep_bit_controlled_correction_unchanged() {
        let mut circuit = Circuit::new();
        circuit
            .safe_append(GateInstruction::new(
                GateType::Cx,
                vec![],
                vec![GateTarget::sweep_bit(5), GateTarget::qubit(0)],
            ))
            .unwrap();
        let inlined = circuit_with_inlined_feedback(&circuit).unwrap();
        assert_eq!(inlined.to_string(), "CX sweep[5] 0\n");
    }

    #[test]
    fn folds_a_dropped_correction_into_the_detector_it_would_have_fixed() {
        let mut circuit = Circuit::new();
        circuit
            .safe_append(GateInstruction::new(GateType::M, vec![], vec![GateTarget::qubit(0)]))
            .unwrap();
        circuit
            .safe_append(GateInstruction::new(
                GateType::Cx,
                vec![],
                vec![GateTarget::rec(1), GateTarget::qubit(1)],
            ))
            .unwrap();
        circuit
            .safe_append(GateInstruction::new(GateType::M, vec![], vec![GateTarget::qubit(1)]))
            .unwrap();
        circuit
            .safe_append(GateInstruction::new(GateType::Detector, vec![], vec![GateTarget::rec(1)]))
            .unwrap();

        let inlined = circuit_with_inlined_feedback(&circuit).unwrap();
        assert_eq!(inlined.to_string(), "M 0\nM 1\nDETECTOR rec[-2] rec[-1]\n");
    }

    #[test]
    fn a_mixed_instruction_drops_only_its_record_controlled_pairs() {
        let mut circuit = Circuit::new();
        circuit
            .safe_append(GateInstruction::new(GateType::M, vec![], vec![GateTarget::qubit(0)]))
            .unwrap();
        circuit
            .safe_append(GateInstruction::new(
                GateType::Cx,
                vec![],
                vec![
                    GateTarget::rec(1),
                    GateTarget::qubit(1),
                    GateTarget::sweep_bit(2),
                    GateTarget::qubit(2),
                ],
            ))
            .unwrap();
        let inlined = circuit_with_inlined_feedback(&circuit).unwrap();
        assert_eq!(inlined.to_string(), "M 0\nCX sweep[2] 2\n");
    }

    #[test]
    fn fuses_identical_adjacent_loops() {
        let mut body = Circuit::new();
        body.safe_append(GateInstruction::new(GateType::H, vec![], vec![GateTarget::qubit(0)]))
            .unwrap();
        let mut circuit = Circuit::new();
        circuit.append_repeat_block(3, body.clone()).unwrap();
        circuit.append_repeat_block(4, body).unwrap();
        let fused = circuit_with_identical_adjacent_loops_fused(&circuit);
        assert_eq!(fused.operations.len(), 1);
        let Operation::Repeat { repetitions, .. } = &fused.operations[0] else {
            panic!("expected a single fused REPEAT block");
        };
        assert_eq!(*repetitions, 7);
    }
}
