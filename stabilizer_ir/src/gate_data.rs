//! The gate catalog (spec §4.1 "Gate catalog contract").
//!
//! One process-wide [`GateDataMap`] singleton, built once and shared by
//! every pass that needs to know a gate's flags, argument shape, or
//! base-alphabet decomposition. Organized as one builder function per gate
//! family, mirroring the upstream `gate_data_*.cc` split this catalog is
//! grounded on.

use std::sync::LazyLock;

use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::gate_flags::{GateFlags, ARG_COUNT_ANY, ARG_COUNT_ZERO_OR_ONE};
use crate::gate_type::{GateType, NUM_DEFINED_GATES};

/// One row of the gate catalog.
#[derive(Clone, Copy, Debug)]
pub struct Gate {
    pub name: &'static str,
    pub id: GateType,
    /// `GateType::NotAGate` when the gate has no well-defined inverse
    /// (measurements, resets, noise channels, annotations).
    pub best_candidate_inverse_id: GateType,
    /// Number of parens arguments the gate takes, or one of
    /// [`ARG_COUNT_ANY`] / [`ARG_COUNT_ZERO_OR_ONE`].
    pub arg_count: u8,
    pub flags: GateFlags,
    pub category: &'static str,
    pub help: &'static str,
    /// Whether the gate is invariant under swapping its two targets.
    /// Always `false` for non-[`GateFlags::TARGETS_PAIRS`] gates.
    pub symmetric: bool,
    /// The circuit, expressed only in `H`, `S`, `CX`, `M`, `R`, that has the
    /// same effect as one application of this gate to qubit `0` (and `1` for
    /// two-qubit gates). `None` for gates already in the base alphabet, and
    /// for gates the simplifier does not rewrite (annotations, blocks, and
    /// noise channels, which pass through [`crate::simplify`] unchanged).
    pub h_s_cx_m_r_decomposition: Option<&'static str>,
}

impl Gate {
    #[must_use]
    pub fn inverse(&self) -> Option<GateType> {
        if self.best_candidate_inverse_id == GateType::NotAGate {
            None
        } else {
            Some(self.best_candidate_inverse_id)
        }
    }

    #[must_use]
    pub fn is_symmetric(&self) -> bool {
        self.symmetric
    }

    /// The gate obtained by conjugating this one with `H` on every qubit it
    /// targets (swapping its X and Z roles). Defined only for the common
    /// gates listed in the upstream tables this crate's H-family, Pauli, and
    /// controlled-gate catalogs were read from; `None` elsewhere.
    #[must_use]
    pub fn hadamard_conjugated(&self) -> Option<GateType> {
        match self.id {
            GateType::H => Some(GateType::H),
            GateType::X => Some(GateType::Z),
            GateType::Z => Some(GateType::X),
            GateType::Y => Some(GateType::Y),
            GateType::Cx => Some(GateType::Cz),
            GateType::Cz => Some(GateType::Cx),
            GateType::Mx => Some(GateType::M),
            GateType::M => Some(GateType::Mx),
            GateType::Rx => Some(GateType::R),
            GateType::R => Some(GateType::Rx),
            GateType::Mrx => Some(GateType::Mr),
            GateType::Mr => Some(GateType::Mrx),
            GateType::Swap => Some(GateType::Swap),
            _ => None,
        }
    }
}

fn g(
    name: &'static str,
    id: GateType,
    inverse: GateType,
    arg_count: u8,
    flags: GateFlags,
    category: &'static str,
    help: &'static str,
) -> Gate {
    Gate {
        name,
        id,
        best_candidate_inverse_id: inverse,
        arg_count,
        flags,
        category,
        help,
        symmetric: false,
        h_s_cx_m_r_decomposition: None,
    }
}

fn sym(mut gate: Gate) -> Gate {
    gate.symmetric = true;
    gate
}

fn dec(mut gate: Gate, decomposition: &'static str) -> Gate {
    gate.h_s_cx_m_r_decomposition = Some(decomposition);
    gate
}

use GateFlags as F;
use GateType as T;

/// Grounded on `original_source/src/stim/gates/gate_data_annotations.cc`.
fn build_annotations() -> Vec<Gate> {
    vec![
        g(
            "DETECTOR",
            T::Detector,
            T::NotAGate,
            ARG_COUNT_ANY,
            F::ONLY_TARGETS_MEASUREMENT_RECORD | F::HAS_NO_EFFECT_ON_QUBITS,
            "Z_Annotations",
            "Marks a parity of measurement results as expected to be deterministic.",
        ),
        g(
            "OBSERVABLE_INCLUDE",
            T::ObservableInclude,
            T::NotAGate,
            1,
            F::ONLY_TARGETS_MEASUREMENT_RECORD
                | F::HAS_NO_EFFECT_ON_QUBITS
                | F::ARGS_ARE_UNSIGNED_INTEGERS,
            "Z_Annotations",
            "Adds measurement results to a logical observable.",
        ),
        g(
            "TICK",
            T::Tick,
            T::NotAGate,
            0,
            F::TAKES_NO_TARGETS | F::HAS_NO_EFFECT_ON_QUBITS,
            "Z_Annotations",
            "Separates time steps.",
        ),
        g(
            "QUBIT_COORDS",
            T::QubitCoords,
            T::NotAGate,
            ARG_COUNT_ANY,
            F::IS_SINGLE_QUBIT_GATE | F::HAS_NO_EFFECT_ON_QUBITS,
            "Z_Annotations",
            "Records the spatial coordinates of a qubit.",
        ),
        g(
            "SHIFT_COORDS",
            T::ShiftCoords,
            T::NotAGate,
            ARG_COUNT_ANY,
            F::TAKES_NO_TARGETS | F::HAS_NO_EFFECT_ON_QUBITS,
            "Z_Annotations",
            "Shifts the coordinate frame used by later QUBIT_COORDS and DETECTOR instructions.",
        ),
    ]
}

/// Grounded on `original_source/src/stim/gates/gate_data_blocks.cc`.
fn build_blocks() -> Vec<Gate> {
    vec![g(
        "REPEAT",
        T::Repeat,
        T::NotAGate,
        0,
        F::IS_BLOCK,
        "Z_Control Flow",
        "Repeats its body block a fixed number of times.",
    )]
}

/// Grounded on `original_source/src/stim/gates/gate_data_collapsing.cc`.
fn build_collapsing() -> Vec<Gate> {
    let meas = F::IS_SINGLE_QUBIT_GATE
        | F::PRODUCES_RESULTS
        | F::NOISY
        | F::ARGS_ARE_DISJOINT_PROBABILITIES;
    let reset = F::IS_SINGLE_QUBIT_GATE | F::IS_RESET;
    vec![
        g(
            "MPAD",
            T::Mpad,
            T::NotAGate,
            0,
            F::PRODUCES_RESULTS,
            "M_Collapsing Gates",
            "Pads the measurement record with assumed values, without performing a measurement.",
        ),
        dec(
            g(
                "MX",
                T::Mx,
                T::NotAGate,
                ARG_COUNT_ZERO_OR_ONE,
                meas,
                "M_Collapsing Gates",
                "Measures a qubit in the X basis.",
            ),
            "H 0\nM 0\nH 0\n",
        ),
        dec(
            g(
                "MY",
                T::My,
                T::NotAGate,
                ARG_COUNT_ZERO_OR_ONE,
                meas,
                "M_Collapsing Gates",
                "Measures a qubit in the Y basis.",
            ),
            "S 0\nS 0\nS 0\nH 0\nM 0\nH 0\nS 0\n",
        ),
        g(
            "M",
            T::M,
            T::NotAGate,
            ARG_COUNT_ZERO_OR_ONE,
            meas,
            "M_Collapsing Gates",
            "Measures a qubit in the Z basis.",
        ),
        dec(
            g(
                "MRX",
                T::Mrx,
                T::NotAGate,
                ARG_COUNT_ZERO_OR_ONE,
                meas | F::IS_RESET,
                "M_Collapsing Gates",
                "Measures then resets a qubit in the X basis.",
            ),
            "H 0\nM 0\nR 0\nH 0\n",
        ),
        dec(
            g(
                "MRY",
                T::Mry,
                T::NotAGate,
                ARG_COUNT_ZERO_OR_ONE,
                meas | F::IS_RESET,
                "M_Collapsing Gates",
                "Measures then resets a qubit in the Y basis.",
            ),
            "S 0\nS 0\nS 0\nH 0\nM 0\nR 0\nH 0\nS 0\n",
        ),
        g(
            "MR",
            T::Mr,
            T::NotAGate,
            ARG_COUNT_ZERO_OR_ONE,
            meas | F::IS_RESET,
            "M_Collapsing Gates",
            "Measures then resets a qubit in the Z basis.",
        ),
        dec(
            g(
                "RX",
                T::Rx,
                T::NotAGate,
                0,
                reset,
                "M_Collapsing Gates",
                "Resets a qubit into the X basis.",
            ),
            "H 0\nR 0\nH 0\n",
        ),
        dec(
            g(
                "RY",
                T::Ry,
                T::NotAGate,
                0,
                reset,
                "M_Collapsing Gates",
                "Resets a qubit into the Y basis.",
            ),
            "S 0\nS 0\nS 0\nH 0\nR 0\nH 0\nS 0\n",
        ),
        g(
            "R",
            T::R,
            T::NotAGate,
            0,
            reset,
            "M_Collapsing Gates",
            "Resets a qubit into the Z basis.",
        ),
    ]
}

/// Grounded on `original_source/src/stim/gates/gate_data_controlled.cc`.
fn build_controlled() -> Vec<Gate> {
    let pair = F::TARGETS_PAIRS | F::UNITARY;
    let feedback_pair = pair | F::CAN_TARGET_BITS;
    vec![
        g("XCX", T::Xcx, T::Xcx, 0, pair, "A_Two Qubit Clifford Gates", "X-controlled X."),
        g("XCY", T::Xcy, T::Xcy, 0, pair, "A_Two Qubit Clifford Gates", "X-controlled Y."),
        g("XCZ", T::Xcz, T::Xcz, 0, feedback_pair, "A_Two Qubit Clifford Gates", "X-controlled Z."),
        g("YCX", T::Ycx, T::Ycx, 0, pair, "A_Two Qubit Clifford Gates", "Y-controlled X."),
        g("YCY", T::Ycy, T::Ycy, 0, pair, "A_Two Qubit Clifford Gates", "Y-controlled Y."),
        g("YCZ", T::Ycz, T::Ycz, 0, feedback_pair, "A_Two Qubit Clifford Gates", "Y-controlled Z."),
        dec(
            g(
                "CX",
                T::Cx,
                T::Cx,
                0,
                feedback_pair,
                "A_Two Qubit Clifford Gates",
                "The Z-controlled X gate (CNOT). Also known as: CNOT, ZCX.",
            ),
            "CX 0 1\n",
        ),
        dec(
            g(
                "CY",
                T::Cy,
                T::Cy,
                0,
                feedback_pair,
                "A_Two Qubit Clifford Gates",
                "The Z-controlled Y gate.",
            ),
            "S 1\nS 1\nS 1\nCX 0 1\nS 1\n",
        ),
        dec(
            sym(g(
                "CZ",
                T::Cz,
                T::Cz,
                0,
                feedback_pair,
                "A_Two Qubit Clifford Gates",
                "The Z-controlled Z gate.",
            )),
            "H 1\nCX 0 1\nH 1\n",
        ),
    ]
}

/// Grounded on `original_source/src/stim/gates/gate_data_hada.cc`
/// (read in full; matrices/flow data elided here since numeric simulation is
/// out of scope, but the decomposition strings are verbatim).
fn build_hada() -> Vec<Gate> {
    let u = F::IS_SINGLE_QUBIT_GATE | F::UNITARY;
    vec![
        dec(
            g("H", T::H, T::H, 0, u, "B_Single Qubit Clifford Gates", "The Hadamard gate."),
            "H 0\n",
        ),
        dec(
            g("H_XY", T::HXy, T::HXy, 0, u, "B_Single Qubit Clifford Gates", "A variant of the Hadamard gate that swaps the X and Y axes instead of X and Z."),
            "H 0\nS 0\nS 0\nH 0\nS 0\n",
        ),
        dec(
            g("H_YZ", T::HYz, T::HYz, 0, u, "B_Single Qubit Clifford Gates", "A variant of the Hadamard gate that swaps the Y and Z axes instead of X and Z."),
            "H 0\nS 0\nH 0\nS 0\nS 0\n",
        ),
        dec(
            g("H_NXY", T::HNxy, T::HNxy, 0, u, "B_Single Qubit Clifford Gates", "A variant of the Hadamard gate that swaps the -X and Y axes."),
            "S 0\nH 0\nS 0\nS 0\nH 0\n",
        ),
        dec(
            g("H_NXZ", T::HNxz, T::HNxz, 0, u, "B_Single Qubit Clifford Gates", "A variant of the Hadamard gate that swaps the -X and Z axes."),
            "S 0\nS 0\nH 0\nS 0\nS 0\n",
        ),
        dec(
            g("H_NYZ", T::HNyz, T::HNyz, 0, u, "B_Single Qubit Clifford Gates", "A variant of the Hadamard gate that swaps the -Y and Z axes."),
            "S 0\nS 0\nH 0\nS 0\nH 0\n",
        ),
    ]
}

/// Grounded on `gate_data_noisy.cc` + `gate_data_period_3/4.cc` +
/// `gate_data_pauli.cc` for flag shape; exact noise-channel argument
/// semantics are out of scope (numeric sampling is a Non-goal), so these
/// entries carry only the structural catalog data a validator needs.
fn build_noisy() -> Vec<Gate> {
    let noisy1 = F::IS_SINGLE_QUBIT_GATE | F::NOISY | F::ARGS_ARE_DISJOINT_PROBABILITIES;
    let noisy2 = F::TARGETS_PAIRS | F::NOISY | F::ARGS_ARE_DISJOINT_PROBABILITIES;
    vec![
        g("DEPOLARIZE1", T::Depolarize1, T::NotAGate, 1, noisy1, "F_Noise Channels", "Single-qubit depolarizing noise."),
        sym(g("DEPOLARIZE2", T::Depolarize2, T::NotAGate, 1, noisy2, "F_Noise Channels", "Two-qubit depolarizing noise.")),
        g("X_ERROR", T::XError, T::NotAGate, 1, noisy1, "F_Noise Channels", "Applies a Pauli X with some probability."),
        g("Y_ERROR", T::YError, T::NotAGate, 1, noisy1, "F_Noise Channels", "Applies a Pauli Y with some probability."),
        g("Z_ERROR", T::ZError, T::NotAGate, 1, noisy1, "F_Noise Channels", "Applies a Pauli Z with some probability."),
        g("I_ERROR", T::IError, T::NotAGate, 1, noisy1, "F_Noise Channels", "Applies an identity-basis error with some probability."),
        sym(g("II_ERROR", T::IiError, T::NotAGate, 1, noisy2, "F_Noise Channels", "Applies a two-qubit identity-basis error with some probability.")),
        g("PAULI_CHANNEL_1", T::PauliChannel1, T::NotAGate, 3, noisy1, "F_Noise Channels", "A single-qubit Pauli error channel with explicit X/Y/Z probabilities."),
        g("PAULI_CHANNEL_2", T::PauliChannel2, T::NotAGate, 15, noisy2, "F_Noise Channels", "A two-qubit Pauli error channel with 15 explicit probabilities."),
        g("E", T::E, T::NotAGate, 1, F::TARGETS_PAULI_STRING | F::TARGETS_COMBINERS | F::NOISY | F::ARGS_ARE_DISJOINT_PROBABILITIES, "F_Noise Channels", "Applies a correlated error with some probability. Also known as: CORRELATED_ERROR."),
        g("ELSE_CORRELATED_ERROR", T::ElseCorrelatedError, T::NotAGate, 1, F::TARGETS_PAULI_STRING | F::TARGETS_COMBINERS | F::NOISY | F::ARGS_ARE_DISJOINT_PROBABILITIES, "F_Noise Channels", "Applies a correlated error with some probability, conditioned on no earlier E in the same group having been applied."),
    ]
}

/// Grounded on `gate_data_heralded.cc`.
fn build_heralded() -> Vec<Gate> {
    let flags = F::IS_SINGLE_QUBIT_GATE | F::NOISY | F::PRODUCES_RESULTS | F::ARGS_ARE_DISJOINT_PROBABILITIES;
    vec![
        g("HERALDED_ERASE", T::HeraldedErase, T::NotAGate, 1, flags, "F_Noise Channels", "A heralded erasure error."),
        g("HERALDED_PAULI_CHANNEL_1", T::HeraldedPauliChannel1, T::NotAGate, 4, flags, "F_Noise Channels", "A heralded single-qubit Pauli error channel."),
    ]
}

/// Grounded on `gate_data_pauli.cc`.
fn build_pauli() -> Vec<Gate> {
    let u = F::IS_SINGLE_QUBIT_GATE | F::UNITARY;
    vec![
        g("I", T::I, T::I, 0, u, "A_Pauli Gates", "The identity gate."),
        dec(g("X", T::X, T::X, 0, u, "A_Pauli Gates", "The Pauli X gate."), "H 0\nS 0\nS 0\nH 0\n"),
        dec(g("Y", T::Y, T::Y, 0, u, "A_Pauli Gates", "The Pauli Y gate."), "H 0\nS 0\nS 0\nH 0\nS 0\nS 0\n"),
        dec(g("Z", T::Z, T::Z, 0, u, "A_Pauli Gates", "The Pauli Z gate."), "S 0\nS 0\n"),
    ]
}

/// Grounded on `gate_data_period_3.cc`.
fn build_period3() -> Vec<Gate> {
    let u = F::IS_SINGLE_QUBIT_GATE | F::UNITARY;
    vec![
        dec(g("C_XYZ", T::CXyz, T::CZyx, 0, u, "C_Single Qubit Clifford Gates", "Cycles the X, Y, Z axes one step: X->Y->Z->X."), "S 0\nS 0\nS 0\nH 0\n"),
        dec(g("C_ZYX", T::CZyx, T::CXyz, 0, u, "C_Single Qubit Clifford Gates", "Cycles the X, Y, Z axes the other way: X->Z->Y->X."), "H 0\nS 0\n"),
        g("C_NXYZ", T::CNxyz, T::CXynz, 0, u, "C_Single Qubit Clifford Gates", "A period-3 Clifford fixing -X, cycling Y and Z."),
        g("C_XNYZ", T::CXnyz, T::CNzyx, 0, u, "C_Single Qubit Clifford Gates", "A period-3 Clifford fixing -Y, cycling X and Z."),
        g("C_XYNZ", T::CXynz, T::CNxyz, 0, u, "C_Single Qubit Clifford Gates", "A period-3 Clifford fixing -Z, cycling X and Y."),
        g("C_NZYX", T::CNzyx, T::CXnyz, 0, u, "C_Single Qubit Clifford Gates", "A period-3 Clifford fixing -X the other way."),
        g("C_ZNYX", T::CZnyx, T::CZynx, 0, u, "C_Single Qubit Clifford Gates", "A period-3 Clifford fixing -Y the other way."),
        g("C_ZYNX", T::CZynx, T::CZnyx, 0, u, "C_Single Qubit Clifford Gates", "A period-3 Clifford fixing -Z the other way."),
    ]
}

/// Grounded on `gate_data_period_4.cc`.
fn build_period4() -> Vec<Gate> {
    let u = F::IS_SINGLE_QUBIT_GATE | F::UNITARY;
    vec![
        dec(g("SQRT_X", T::SqrtX, T::SqrtXDag, 0, u, "B_Single Qubit Clifford Gates", "Principal square root of X."), "H 0\nS 0\nH 0\n"),
        dec(g("SQRT_X_DAG", T::SqrtXDag, T::SqrtX, 0, u, "B_Single Qubit Clifford Gates", "Adjoint square root of X."), "H 0\nS 0\nS 0\nS 0\nH 0\n"),
        dec(g("SQRT_Y", T::SqrtY, T::SqrtYDag, 0, u, "B_Single Qubit Clifford Gates", "Principal square root of Y."), "S 0\nS 0\nH 0\n"),
        dec(g("SQRT_Y_DAG", T::SqrtYDag, T::SqrtY, 0, u, "B_Single Qubit Clifford Gates", "Adjoint square root of Y."), "H 0\nS 0\nS 0\n"),
        dec(g("S", T::S, T::SDag, 0, u, "B_Single Qubit Clifford Gates", "Principal square root of Z. Also known as: SQRT_Z."), "S 0\n"),
        dec(g("S_DAG", T::SDag, T::S, 0, u, "B_Single Qubit Clifford Gates", "Adjoint square root of Z. Also known as: SQRT_Z_DAG."), "S 0\nS 0\nS 0\n"),
    ]
}

/// Grounded on `gate_data_pp.cc`.
fn build_pp() -> Vec<Gate> {
    let pair_u = F::TARGETS_PAIRS | F::UNITARY;
    vec![
        sym(g("II", T::Ii, T::Ii, 0, pair_u, "C_Two Qubit Clifford Gates", "The two-qubit identity gate.")),
        dec(sym(g("SQRT_XX", T::SqrtXx, T::SqrtXxDag, 0, pair_u, "C_Two Qubit Clifford Gates", "Principal square root of XX.")), "H 0\nCX 0 1\nH 0\nS 1\nH 1\n"),
        dec(sym(g("SQRT_XX_DAG", T::SqrtXxDag, T::SqrtXx, 0, pair_u, "C_Two Qubit Clifford Gates", "Adjoint square root of XX.")), "H 0\nCX 0 1\nH 0\nS 1\nS 1\nS 1\nH 1\n"),
        dec(sym(g("SQRT_YY", T::SqrtYy, T::SqrtYyDag, 0, pair_u, "C_Two Qubit Clifford Gates", "Principal square root of YY.")), "S 0\nS 0\nS 0\nH 0\nCX 0 1\nH 0\nS 1\nH 1\nS 0\n"),
        dec(sym(g("SQRT_YY_DAG", T::SqrtYyDag, T::SqrtYy, 0, pair_u, "C_Two Qubit Clifford Gates", "Adjoint square root of YY.")), "S 0\nS 0\nS 0\nH 0\nCX 0 1\nH 0\nS 1\nS 1\nS 1\nH 1\nS 0\n"),
        dec(sym(g("SQRT_ZZ", T::SqrtZz, T::SqrtZzDag, 0, pair_u, "C_Two Qubit Clifford Gates", "Principal square root of ZZ.")), "CX 0 1\nS 1\nCX 0 1\n"),
        dec(sym(g("SQRT_ZZ_DAG", T::SqrtZzDag, T::SqrtZz, 0, pair_u, "C_Two Qubit Clifford Gates", "Adjoint square root of ZZ.")), "CX 0 1\nS 1\nS 1\nS 1\nCX 0 1\n"),
    ]
}

/// Grounded on `gate_data_pauli_product.cc`.
fn build_pauli_product() -> Vec<Gate> {
    let meas = F::TARGETS_PAULI_STRING
        | F::TARGETS_COMBINERS
        | F::PRODUCES_RESULTS
        | F::ARGS_ARE_DISJOINT_PROBABILITIES;
    let spp = F::TARGETS_PAULI_STRING | F::TARGETS_COMBINERS | F::UNITARY;
    vec![
        g(
            "MPP",
            T::Mpp,
            T::NotAGate,
            ARG_COUNT_ZERO_OR_ONE,
            meas,
            "M_Collapsing Gates",
            "Measures the product of a set of Pauli observables.",
        ),
        g(
            "SPP",
            T::Spp,
            T::SppDag,
            0,
            spp,
            "C_Two Qubit Clifford Gates",
            "Applies a Pauli product phase rotation.",
        ),
        g(
            "SPP_DAG",
            T::SppDag,
            T::Spp,
            0,
            spp,
            "C_Two Qubit Clifford Gates",
            "Applies the adjoint of a Pauli product phase rotation.",
        ),
    ]
}

/// Grounded on `gate_data_swaps.cc`.
fn build_swaps() -> Vec<Gate> {
    let pair_u = F::TARGETS_PAIRS | F::UNITARY;
    vec![
        dec(
            sym(g("SWAP", T::Swap, T::Swap, 0, pair_u, "C_Two Qubit Clifford Gates", "Swaps two qubits.")),
            "CX 0 1\nCX 1 0\nCX 0 1\n",
        ),
        sym(g("ISWAP", T::Iswap, T::IswapDag, 0, pair_u, "C_Two Qubit Clifford Gates", "Swaps two qubits and phases the -1 eigenspace of ZZ by i.")),
        g("CXSWAP", T::Cxswap, T::Swapcx, 0, pair_u, "C_Two Qubit Clifford Gates", "A combination CX-then-SWAP gate."),
        g("SWAPCX", T::Swapcx, T::Cxswap, 0, pair_u, "C_Two Qubit Clifford Gates", "A combination SWAP-then-CX gate."),
        sym(g("CZSWAP", T::Czswap, T::Czswap, 0, pair_u, "C_Two Qubit Clifford Gates", "A combination CZ-then-SWAP gate.")),
        sym(g("ISWAP_DAG", T::IswapDag, T::Iswap, 0, pair_u, "C_Two Qubit Clifford Gates", "Swaps two qubits and phases the -1 eigenspace of ZZ by -i.")),
    ]
}

/// Grounded on `gate_data_pair_measure.cc`.
fn build_pair_measure() -> Vec<Gate> {
    let meas = F::TARGETS_PAIRS | F::PRODUCES_RESULTS | F::NOISY | F::ARGS_ARE_DISJOINT_PROBABILITIES;
    vec![
        dec(
            sym(g("MXX", T::Mxx, T::NotAGate, ARG_COUNT_ZERO_OR_ONE, meas, "M_Collapsing Gates", "Measures the two-qubit XX observable.")),
            "CX 0 1\nH 0\nM 0\nH 0\nCX 0 1\n",
        ),
        dec(
            sym(g("MYY", T::Myy, T::NotAGate, ARG_COUNT_ZERO_OR_ONE, meas, "M_Collapsing Gates", "Measures the two-qubit YY observable.")),
            "S 0\nS 0\nS 0\nS 1\nS 1\nS 1\nCX 0 1\nH 0\nM 0\nH 0\nCX 0 1\nS 0\nS 1\n",
        ),
        dec(
            sym(g("MZZ", T::Mzz, T::NotAGate, ARG_COUNT_ZERO_OR_ONE, meas, "M_Collapsing Gates", "Measures the two-qubit ZZ observable.")),
            "CX 0 1\nM 1\nCX 0 1\n",
        ),
    ]
}

/// Aliases from the names circuit text is allowed to spell a gate with, to
/// its canonical [`GateType`].
fn build_aliases() -> Vec<(&'static str, GateType)> {
    vec![
        ("CNOT", T::Cx),
        ("ZCX", T::Cx),
        ("ZCY", T::Cy),
        ("ZCZ", T::Cz),
        ("MZ", T::M),
        ("MRZ", T::Mr),
        ("RZ", T::R),
        ("SQRT_Z", T::S),
        ("SQRT_Z_DAG", T::SDag),
        ("H_XZ", T::H),
        ("CORRELATED_ERROR", T::E),
    ]
}

/// The gate catalog: every defined gate plus its name/alias lookup table.
pub struct GateDataMap {
    items: Vec<Gate>,
    by_name: FxHashMap<String, GateType>,
}

impl GateDataMap {
    fn build() -> Self {
        let mut items: Vec<Gate> = Vec::with_capacity(NUM_DEFINED_GATES);
        items.push(g("", T::NotAGate, T::NotAGate, 0, GateFlags::empty(), "", ""));
        for batch in [
            build_annotations(),
            build_blocks(),
            build_collapsing(),
            build_controlled(),
            build_hada(),
            build_noisy(),
            build_heralded(),
            build_pauli(),
            build_period3(),
            build_period4(),
            build_pp(),
            build_pauli_product(),
            build_swaps(),
            build_pair_measure(),
        ] {
            items.extend(batch);
        }
        items.sort_by_key(|gate| gate.id as u8);
        debug_assert_eq!(items.len(), NUM_DEFINED_GATES, "every GateType needs exactly one Gate row");
        for (index, gate) in items.iter().enumerate() {
            debug_assert_eq!(gate.id as usize, index, "gate rows must be indexed by their GateType discriminant");
        }

        let mut by_name = FxHashMap::default();
        for gate in &items {
            if gate.id == T::NotAGate {
                continue;
            }
            by_name.insert(gate.name.to_ascii_uppercase(), gate.id);
        }
        for (alias, id) in build_aliases() {
            by_name.insert(alias.to_ascii_uppercase(), id);
        }

        GateDataMap { items, by_name }
    }

    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.by_name.contains_key(&name.to_ascii_uppercase())
    }

    pub fn at(&self, name: &str) -> Result<&Gate> {
        self.by_name
            .get(&name.to_ascii_uppercase())
            .map(|&id| self.get(id))
            .ok_or_else(|| Error::UnknownGate(name.to_string()))
    }

    #[must_use]
    pub fn get(&self, id: GateType) -> &Gate {
        &self.items[id as usize]
    }

    pub fn items(&self) -> impl Iterator<Item = &Gate> {
        self.items.iter().filter(|gate| gate.id != T::NotAGate)
    }
}

/// The process-wide gate catalog singleton. Built once on first use and
/// shared by every pass (spec §9: dependency-injected rather than a vtable
/// per gate).
pub static GATE_DATA: LazyLock<GateDataMap> = LazyLock::new(GateDataMap::build);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_resolves_canonical_names_and_aliases() {
        assert_eq!(GATE_DATA.at("CX").unwrap().id, T::Cx);
        assert_eq!(GATE_DATA.at("cx").unwrap().id, T::Cx);
        assert_eq!(GATE_DATA.at("CNOT").unwrap().id, T::Cx);
        assert_eq!(GATE_DATA.at("ZCX").unwrap().id, T::Cx);
        assert_eq!(GATE_DATA.at("MZ").unwrap().id, T::M);
        assert_eq!(GATE_DATA.at("SQRT_Z").unwrap().id, T::S);
    }

    #[test]
    fn unknown_gate_is_an_error() {
        let err = GATE_DATA.at("NOT_A_REAL_GATE").unwrap_err();
        assert_eq!(err, Error::UnknownGate("NOT_A_REAL_GATE".to_string()));
    }

    #[test]
    fn every_defined_gate_type_has_a_row() {
        assert_eq!(GATE_DATA.items().count(), NUM_DEFINED_GATES - 1);
        for gate_type in GateType::all() {
            assert_eq!(GATE_DATA.get(gate_type).id, gate_type);
        }
    }

    #[test]
    fn self_inverse_gates_round_trip() {
        let h = GATE_DATA.get(T::H);
        assert_eq!(h.inverse(), Some(T::H));
        let s = GATE_DATA.get(T::S);
        assert_eq!(s.inverse(), Some(T::SDag));
        assert_eq!(GATE_DATA.get(T::SDag).inverse(), Some(T::S));
    }

    #[test]
    fn swap_is_symmetric_and_decomposes_into_three_cx() {
        let swap = GATE_DATA.get(T::Swap);
        assert!(swap.is_symmetric());
        assert_eq!(swap.h_s_cx_m_r_decomposition, Some("CX 0 1\nCX 1 0\nCX 0 1\n"));
    }
}
