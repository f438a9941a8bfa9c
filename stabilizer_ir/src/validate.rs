//! Target-shape and argument validation (spec §4.2), including
//! `for_combined_target_groups`, the single utility every decomposition and
//! stats pass in this crate uses to walk an instruction's targets in the
//! shape its gate expects (spec §9: factor target-shape-splitting into one
//! utility).
//!
//! Grounded on `original_source/src/stim/circuit/circuit_instruction.h`
//! (`CircuitInstruction::for_combined_target_groups`,
//! `CircuitInstruction::validate`).

use crate::circuit::CircuitInstruction;
use crate::error::{Error, Result};
use crate::gate_data::GATE_DATA;
use crate::gate_flags::{GateFlags, ARG_COUNT_ANY, ARG_COUNT_ZERO_OR_ONE};
use crate::gate_target::GateTarget;
use crate::gate_type::GateType;

/// Walks `instruction`'s targets in the groups its gate's flags say they
/// should be split into, calling `visit` once per group. Returns the number
/// of groups visited.
///
/// Branch order (mirrors the upstream method exactly):
/// 1. `TARGETS_COMBINERS`: a group starts at one non-combiner target and
///    swallows every `(combiner, target)` pair that follows it.
/// 2. `IS_SINGLE_QUBIT_GATE`: groups of size 1.
/// 3. `TARGETS_PAIRS`: groups of size 2.
/// 4. `TARGETS_PAULI_STRING` (and not `TARGETS_COMBINERS`): one group
///    containing the whole remaining target list (e.g. `CORRELATED_ERROR`).
/// 5. `ONLY_TARGETS_MEASUREMENT_RECORD`: groups of size 1 (e.g. `DETECTOR`).
/// 6. `MPAD` / `QUBIT_COORDS`: groups of size 1.
/// 7. otherwise: an error, since this gate's targets have no known shape.
pub fn for_combined_target_groups<'a>(
    instruction: CircuitInstruction<'a>,
    mut visit: impl FnMut(&'a [GateTarget]) -> Result<()>,
) -> Result<usize> {
    let flags = instruction.flags();
    let targets = instruction.targets;
    let mut start = 0;
    let mut groups = 0;
    while start < targets.len() {
        let end = if flags.contains(GateFlags::TARGETS_COMBINERS) {
            if targets[start].is_combiner() {
                return Err(Error::TrailingCombiner {
                    gate: instruction.gate_name().to_string(),
                });
            }
            let mut end = start + 1;
            while end < targets.len() && targets[end].is_combiner() {
                if end + 1 >= targets.len() {
                    return Err(Error::TrailingCombiner {
                        gate: instruction.gate_name().to_string(),
                    });
                }
                end += 2;
            }
            end
        } else if flags.contains(GateFlags::IS_SINGLE_QUBIT_GATE) {
            start + 1
        } else if flags.contains(GateFlags::TARGETS_PAIRS) {
            start + 2
        } else if flags.contains(GateFlags::TARGETS_PAULI_STRING) {
            targets.len()
        } else if flags.contains(GateFlags::ONLY_TARGETS_MEASUREMENT_RECORD) {
            start + 1
        } else if matches!(instruction.gate_type, GateType::Mpad | GateType::QubitCoords) {
            start + 1
        } else {
            return Err(Error::UnsupportedTargetGroupShape(
                instruction.gate_name().to_string(),
            ));
        };
        if end > targets.len() {
            return Err(Error::OddTargetCount {
                gate: instruction.gate_name().to_string(),
            });
        }
        visit(&targets[start..end])?;
        groups += 1;
        start = end;
    }
    Ok(groups)
}

/// Full validation of one instruction: argument count/shape, and target
/// count/shape for every gate family (spec §4.2, §8 scenario (f)).
pub fn validate_instruction(instruction: CircuitInstruction<'_>) -> Result<()> {
    if instruction.gate_type == GateType::Repeat {
        return Ok(());
    }
    let gate = GATE_DATA.get(instruction.gate_type);
    validate_arg_count(instruction, gate.arg_count)?;
    if gate.flags.contains(GateFlags::ARGS_ARE_DISJOINT_PROBABILITIES) {
        validate_probabilities(instruction)?;
    }
    if gate.flags.contains(GateFlags::ARGS_ARE_UNSIGNED_INTEGERS) {
        validate_unsigned_integer_args(instruction)?;
    }

    if gate.flags.contains(GateFlags::TAKES_NO_TARGETS) {
        if !instruction.targets.is_empty() {
            return Err(Error::TakesNoTargets {
                gate: instruction.gate_name().to_string(),
                given: instruction.targets.len(),
            });
        }
        return Ok(());
    }

    if gate.flags.contains(GateFlags::TARGETS_PAIRS) {
        validate_pair_targets(instruction)?;
        validate_target_kinds(instruction)?;
    } else if gate.flags.contains(GateFlags::TARGETS_PAULI_STRING) {
        validate_pauli_string_targets(instruction)?;
    } else if gate.flags.contains(GateFlags::ONLY_TARGETS_MEASUREMENT_RECORD)
        && !gate.flags.contains(GateFlags::CAN_TARGET_BITS)
    {
        for target in instruction.targets {
            if !target.is_measurement_record_target() {
                return Err(Error::InvalidTargetForGate {
                    gate: instruction.gate_name().to_string(),
                    target: target.to_string(),
                });
            }
        }
    } else {
        validate_target_kinds(instruction)?;
    }

    Ok(())
}

/// Rejects any target bit outside the gate's `valid_target_mask` (spec
/// §4.2): a combiner unless `TARGETS_COMBINERS`, an inverted bit unless
/// `PRODUCES_RESULTS`, a record/sweep bit unless `CAN_TARGET_BITS`, and a
/// Pauli tag on any gate that isn't a Pauli-product gate (those are
/// checked separately by [`validate_pauli_string_targets`]).
fn validate_target_kinds(instruction: CircuitInstruction<'_>) -> Result<()> {
    let flags = instruction.flags();
    let invalid = |target: GateTarget| Error::InvalidTargetForGate {
        gate: instruction.gate_name().to_string(),
        target: target.to_string(),
    };
    for &target in instruction.targets {
        if target.is_combiner() {
            if !flags.contains(GateFlags::TARGETS_COMBINERS) {
                return Err(invalid(target));
            }
            continue;
        }
        if target.is_inverted() && !flags.contains(GateFlags::PRODUCES_RESULTS) {
            return Err(invalid(target));
        }
        if (target.is_measurement_record_target() || target.is_sweep_bit_target())
            && !flags.contains(GateFlags::CAN_TARGET_BITS)
        {
            return Err(invalid(target));
        }
        if target.is_pauli_target() {
            return Err(invalid(target));
        }
    }
    Ok(())
}

fn validate_arg_count(instruction: CircuitInstruction<'_>, arg_count: u8) -> Result<()> {
    let given = instruction.args.len();
    let ok = match arg_count {
        ARG_COUNT_ANY => true,
        ARG_COUNT_ZERO_OR_ONE => given <= 1,
        exact => given == exact as usize,
    };
    if ok {
        return Ok(());
    }
    let expected = match arg_count {
        ARG_COUNT_ZERO_OR_ONE => "0 or 1".to_string(),
        exact => exact.to_string(),
    };
    Err(Error::WrongArgCount {
        gate: instruction.gate_name().to_string(),
        given,
        expected,
    })
}

fn validate_probabilities(instruction: CircuitInstruction<'_>) -> Result<()> {
    let gate_name = || instruction.gate_name().to_string();
    let mut sum = 0.0;
    for &value in instruction.args {
        if !(0.0..=1.0).contains(&value) {
            return Err(Error::ProbabilityOutOfRange {
                gate: gate_name(),
                value,
            });
        }
        sum += value;
    }
    if sum > 1.0 + 1e-7 {
        return Err(Error::ProbabilitiesSumTooLarge {
            gate: gate_name(),
            sum,
        });
    }
    Ok(())
}

fn validate_unsigned_integer_args(instruction: CircuitInstruction<'_>) -> Result<()> {
    for &value in instruction.args {
        if value < 0.0 || value.fract() != 0.0 {
            return Err(Error::ArgumentNotInteger {
                gate: instruction.gate_name().to_string(),
                value,
            });
        }
    }
    Ok(())
}

fn validate_pair_targets(instruction: CircuitInstruction<'_>) -> Result<()> {
    if instruction.targets.len() % 2 != 0 {
        return Err(Error::OddTargetCount {
            gate: instruction.gate_name().to_string(),
        });
    }
    for pair in instruction.targets.chunks_exact(2) {
        let [a, b] = pair else { unreachable!() };
        if a.is_qubit_target() && b.is_qubit_target() && a.qubit_value() == b.qubit_value() {
            return Err(Error::RepeatedPairTarget {
                gate: instruction.gate_name().to_string(),
                qubit: a.qubit_value(),
            });
        }
    }
    Ok(())
}

fn validate_pauli_string_targets(instruction: CircuitInstruction<'_>) -> Result<()> {
    for_combined_target_groups(instruction, |group| {
        let mut seen: Vec<(u32, bool, bool)> = Vec::with_capacity(group.len());
        for target in group {
            if target.is_combiner() {
                continue;
            }
            if !target.is_pauli_target() {
                return Err(Error::InvalidTargetForGate {
                    gate: instruction.gate_name().to_string(),
                    target: target.to_string(),
                });
            }
            let qubit = target.qubit_value();
            let pauli = (target.has_x_component(), target.has_z_component());
            if let Some(&(_, x, z)) = seen.iter().find(|&&(q, _, _)| q == qubit) {
                // The same single-qubit Pauli combined with itself is a
                // literal duplicate target; two or three distinct Paulis on
                // one qubit multiply to a Hermitian operator only when an
                // even number of them anticommute, which never happens for
                // 2 or 3 of {X, Y, Z} — every such combination is
                // non-Hermitian.
                return Err(if (x, z) == pauli {
                    Error::PauliProductRepeatedQubit(instruction.to_string())
                } else {
                    Error::NonHermitianPauliProduct {
                        gate: instruction.gate_name().to_string(),
                    }
                });
            }
            seen.push((qubit, pauli.0, pauli.1));
        }
        Ok(())
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::GateInstruction;

    #[test]
    fn cx_rejects_a_target_paired_with_itself() {
        let instruction = GateInstruction::new(GateType::Cx, vec![], vec![GateTarget::qubit(0), GateTarget::qubit(0)]);
        let err = instruction.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "the two qubit gate CX was applied to a target pair with the same target (0) twice"
        );
    }

    #[test]
    fn h_rejects_parens_arguments() {
        let instruction = GateInstruction::new(GateType::H, vec![0.1], vec![GateTarget::qubit(0)]);
        let err = instruction.validate().unwrap_err();
        assert_eq!(err.to_string(), "gate H was given 1 parens arguments but takes 0");
    }

    #[test]
    fn x_error_rejects_probability_above_one() {
        let instruction = GateInstruction::new(GateType::XError, vec![1.5], vec![GateTarget::qubit(0)]);
        assert!(instruction.validate().is_err());
    }

    #[test]
    fn h_rejects_a_measurement_record_target() {
        let instruction = GateInstruction::new(GateType::H, vec![], vec![GateTarget::rec(1)]);
        assert!(instruction.validate().is_err());
    }

    #[test]
    fn m_rejects_a_sweep_bit_target() {
        let instruction = GateInstruction::new(GateType::M, vec![], vec![GateTarget::sweep_bit(0)]);
        assert!(instruction.validate().is_err());
    }

    #[test]
    fn h_rejects_a_combiner_target() {
        let instruction = GateInstruction::new(GateType::H, vec![], vec![GateTarget::combiner()]);
        assert!(instruction.validate().is_err());
    }

    #[test]
    fn mpp_rejects_a_leading_combiner() {
        let instruction = GateInstruction::new(GateType::Mpp, vec![], vec![GateTarget::combiner(), GateTarget::x(0)]);
        let err = for_combined_target_groups(instruction.as_view(), |_| Ok(())).unwrap_err();
        assert!(matches!(err, Error::TrailingCombiner { .. }));
    }

    #[test]
    fn mpp_rejects_a_trailing_combiner() {
        let instruction = GateInstruction::new(GateType::Mpp, vec![], vec![GateTarget::x(0), GateTarget::combiner()]);
        let err = for_combined_target_groups(instruction.as_view(), |_| Ok(())).unwrap_err();
        assert!(matches!(err, Error::TrailingCombiner { .. }));
    }

    #[test]
    fn mpp_two_distinct_paulis_on_one_qubit_is_non_hermitian() {
        let instruction = GateInstruction::new(
            GateType::Mpp,
            vec![],
            vec![GateTarget::x(0), GateTarget::combiner(), GateTarget::y(0)],
        );
        let err = instruction.validate().unwrap_err();
        assert!(matches!(err, Error::NonHermitianPauliProduct { .. }));
    }

    #[test]
    fn mpp_three_distinct_paulis_on_one_qubit_is_non_hermitian() {
        let instruction = GateInstruction::new(
            GateType::Mpp,
            vec![],
            vec![
                GateTarget::x(0),
                GateTarget::combiner(),
                GateTarget::y(0),
                GateTarget::combiner(),
                GateTarget::z(0),
            ],
        );
        let err = instruction.validate().unwrap_err();
        assert!(matches!(err, Error::NonHermitianPauliProduct { .. }));
    }

    #[test]
    fn mpp_same_pauli_twice_on_one_qubit_is_a_repeated_target() {
        let instruction = GateInstruction::new(
            GateType::Mpp,
            vec![],
            vec![GateTarget::x(0), GateTarget::combiner(), GateTarget::x(0)],
        );
        let err = instruction.validate().unwrap_err();
        assert!(matches!(err, Error::PauliProductRepeatedQubit(_)));
    }

    #[test]
    fn mpp_groups_combiner_joined_targets() {
        let instruction = GateInstruction::new(
            GateType::Mpp,
            vec![],
            vec![
                GateTarget::x(0),
                GateTarget::combiner(),
                GateTarget::z(1),
                GateTarget::y(2),
            ],
        );
        let groups = for_combined_target_groups(instruction.as_view(), |_| Ok(())).unwrap();
        assert_eq!(groups, 2);
    }
}
