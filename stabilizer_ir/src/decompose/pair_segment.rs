//! Splits a pair-targeting instruction (e.g. `MXX`) into segments where no
//! qubit is used as a control twice (spec §4.4).
//!
//! Grounded on `original_source/src/stim/circuit/gate_decomposition.cc`
//! (`decompose_pair_instruction_into_segments_with_single_use_controls`):
//! downstream consumers (classical feedback, certain hardware backends)
//! cannot reuse a control within one segment, so a pair-gate instruction is
//! cut into the fewest segments respecting that constraint.

use rustc_hash::FxHashSet;

use crate::circuit::{CircuitInstruction, GateInstruction};
use crate::error::Result;

/// Invokes `callback` once per segment of `instruction`'s target pairs,
/// treating each pair's first target as its control.
pub fn decompose_pair_instruction_into_segments_with_single_use_controls(
    instruction: CircuitInstruction<'_>,
    mut callback: impl FnMut(GateInstruction) -> Result<()>,
) -> Result<()> {
    let targets = instruction.targets;
    debug_assert_eq!(targets.len() % 2, 0);
    let mut used_as_control: FxHashSet<u32> = FxHashSet::default();
    let mut start = 0;
    let mut pair_start = 0;
    while pair_start < targets.len() {
        let control = targets[pair_start];
        let other = targets[pair_start + 1];
        if used_as_control.contains(&control.qubit_value()) || used_as_control.contains(&other.qubit_value()) {
            callback(GateInstruction::new(
                instruction.gate_type,
                instruction.args.to_vec(),
                targets[start..pair_start].to_vec(),
            ))?;
            start = pair_start;
            used_as_control.clear();
        }
        used_as_control.insert(control.qubit_value());
        pair_start += 2;
    }
    if start < targets.len() {
        callback(GateInstruction::new(
            instruction.gate_type,
            instruction.args.to_vec(),
            targets[start..].to_vec(),
        ))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::GateInstruction;
    use crate::gate_target::GateTarget;
    use crate::gate_type::GateType;

    #[test]
    fn single_use_controls_need_no_split() {
        let instruction = GateInstruction::new(
            GateType::Mxx,
            vec![],
            vec![
                GateTarget::qubit(0),
                GateTarget::qubit(1),
                GateTarget::qubit(2),
                GateTarget::qubit(3),
            ],
        );
        let mut segments = 0;
        decompose_pair_instruction_into_segments_with_single_use_controls(instruction.as_view(), |_| {
            segments += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(segments, 1);
    }

    #[test]
    fn reused_control_forces_a_split() {
        let instruction = GateInstruction::new(
            GateType::Mxx,
            vec![],
            vec![
                GateTarget::qubit(0),
                GateTarget::qubit(1),
                GateTarget::qubit(0),
                GateTarget::qubit(2),
            ],
        );
        let mut segments = Vec::new();
        decompose_pair_instruction_into_segments_with_single_use_controls(instruction.as_view(), |segment| {
            segments.push(segment.targets.len());
            Ok(())
        })
        .unwrap();
        assert_eq!(segments, vec![2, 2]);
    }
}
