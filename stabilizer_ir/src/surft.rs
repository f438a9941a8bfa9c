//! SURFT: the sparse, reverse-time, per-qubit Pauli frame tracker that
//! backs both the feedback inliner (spec §4.5) and loop folding (spec §4.3,
//! §8 loop-folding performance claim).
//!
//! Grounded on `original_source/src/stim/simulators/sparse_rev_frame_tracker.cc`.
//! Every `undo_*` method walks one gate application backwards in time,
//! updating which detectors/observables (`xs[q]`/`zs[q]`, one
//! [`SparseXorVec`] of [`DemTarget`]s per qubit per Pauli component) would
//! be disturbed by an error on that qubit at this point in the circuit.
//! Dispatch is a `match` on [`GateType`] (spec §9: prefer match dispatch to
//! a vtable per gate).

use rustc_hash::FxHashMap;

use crate::circuit::{Circuit, CircuitInstruction, Operation};
use crate::dem_target::DemTarget;
use crate::error::{Error, Result};
use crate::gate_target::GateTarget;
use crate::gate_type::GateType;
use crate::sparse_xor_vec::SparseXorVec;

/// Per-qubit Pauli-frame sensitivity, tracked backwards from the end of a
/// circuit to its start.
#[derive(Clone, Debug)]
pub struct SurfTracker {
    xs: Vec<SparseXorVec<DemTarget>>,
    zs: Vec<SparseXorVec<DemTarget>>,
    rec_bits: FxHashMap<u64, SparseXorVec<DemTarget>>,
    num_measurements_in_past: u64,
    num_detectors_in_past: u64,
    ignore_anticommutation: bool,
}

impl SurfTracker {
    #[must_use]
    pub fn new(num_qubits: usize) -> Self {
        SurfTracker {
            xs: vec![SparseXorVec::new(); num_qubits],
            zs: vec![SparseXorVec::new(); num_qubits],
            rec_bits: FxHashMap::default(),
            num_measurements_in_past: 0,
            num_detectors_in_past: 0,
            ignore_anticommutation: false,
        }
    }

    /// A tracker that never raises [`Error::AnticommutingDissipation`],
    /// per this crate's resolution of the "ignore anticommutation" open
    /// question: the suppression applies everywhere a gauge is checked, not
    /// to a subset of gate families.
    #[must_use]
    pub fn new_ignoring_anticommutation(num_qubits: usize) -> Self {
        SurfTracker {
            ignore_anticommutation: true,
            ..Self::new(num_qubits)
        }
    }

    #[must_use]
    pub fn num_measurements_in_past(&self) -> u64 {
        self.num_measurements_in_past
    }

    #[must_use]
    pub fn num_detectors_in_past(&self) -> u64 {
        self.num_detectors_in_past
    }

    /// The detector/observable sensitivity currently folded onto an absolute
    /// measurement index, without consuming it the way `undo_mx`/`undo_my`/
    /// `undo_mz` do. Used by [`crate::feedback`] to read off which
    /// detectors/observables a measurement has picked up before that
    /// measurement's own `undo_gate` call clears the entry.
    #[must_use]
    pub(crate) fn pending_sensitivity(&self, measurement_index: u64) -> SparseXorVec<DemTarget> {
        self.rec_bits
            .get(&measurement_index)
            .cloned()
            .unwrap_or_else(SparseXorVec::new)
    }

    #[must_use]
    pub fn xs(&self, qubit: usize) -> &SparseXorVec<DemTarget> {
        &self.xs[qubit]
    }

    #[must_use]
    pub fn zs(&self, qubit: usize) -> &SparseXorVec<DemTarget> {
        &self.zs[qubit]
    }

    /// The sensitivity an X error on `qubit` would flip, given which Pauli
    /// components (`has_x`, `has_z`) the feedback being undone writes:
    /// a pure-X write is caught by Z-type generators (`zs`), a pure-Z write
    /// by X-type generators (`xs`), and a Y write by both.
    #[must_use]
    pub(crate) fn anticommuting_sensitivity_at(&self, qubit: usize, has_x: bool, has_z: bool) -> SparseXorVec<DemTarget> {
        match (has_x, has_z) {
            (true, false) => self.zs[qubit].clone(),
            (false, true) => self.xs[qubit].clone(),
            _ => {
                let mut combined = self.xs[qubit].clone();
                combined.xor_with(&self.zs[qubit]);
                combined
            }
        }
    }

    fn handle_gauge(&self, sensitivity: &SparseXorVec<DemTarget>) -> Result<()> {
        if !sensitivity.is_empty() && !self.ignore_anticommutation {
            return Err(Error::AnticommutingDissipation);
        }
        Ok(())
    }

    fn handle_xor_gauge(&self, a: &SparseXorVec<DemTarget>, b: &SparseXorVec<DemTarget>) -> Result<()> {
        if a != b && !self.ignore_anticommutation {
            return Err(Error::AnticommutingDissipation);
        }
        Ok(())
    }

    fn handle_x_gauges(&self, targets: &[GateTarget]) -> Result<()> {
        for target in targets.iter().rev() {
            self.handle_gauge(&self.xs[target.qubit_value() as usize])?;
        }
        Ok(())
    }

    fn handle_y_gauges(&self, targets: &[GateTarget]) -> Result<()> {
        for target in targets.iter().rev() {
            let q = target.qubit_value() as usize;
            self.handle_xor_gauge(&self.xs[q], &self.zs[q])?;
        }
        Ok(())
    }

    fn handle_z_gauges(&self, targets: &[GateTarget]) -> Result<()> {
        for target in targets.iter().rev() {
            self.handle_gauge(&self.zs[target.qubit_value() as usize])?;
        }
        Ok(())
    }

    fn clear_qubits(&mut self, targets: &[GateTarget]) {
        for target in targets {
            let q = target.qubit_value() as usize;
            self.xs[q].clear();
            self.zs[q].clear();
        }
    }

    fn undo_classical_pauli(&mut self, control: GateTarget, target: GateTarget) -> Result<()> {
        if control.is_sweep_bit_target() {
            return Ok(());
        }
        debug_assert!(control.is_measurement_record_target());
        let measurement_index = (self.num_measurements_in_past as i64 + control.rec_offset()) as u64;
        let q = target.qubit_value() as usize;
        let mut delta = SparseXorVec::new();
        if target.has_x_component() {
            delta.xor_with(&self.zs[q]);
        }
        if target.has_z_component() {
            delta.xor_with(&self.xs[q]);
        }
        let entry = self.rec_bits.entry(measurement_index).or_insert_with(SparseXorVec::new);
        entry.xor_with(&delta);
        if entry.is_empty() {
            self.rec_bits.remove(&measurement_index);
        }
        Ok(())
    }

    fn is_classically_controlled(target: GateTarget) -> bool {
        target.is_measurement_record_target() || target.is_sweep_bit_target()
    }

    fn undo_zcx_single(&mut self, c: GateTarget, t: GateTarget) -> Result<()> {
        if !Self::is_classically_controlled(c) && !Self::is_classically_controlled(t) {
            let (cq, tq) = (c.qubit_value() as usize, t.qubit_value() as usize);
            let zs_tq = self.zs[tq].clone();
            self.zs[cq].xor_with(&zs_tq);
            let xs_cq = self.xs[cq].clone();
            self.xs[tq].xor_with(&xs_cq);
            return Ok(());
        }
        if !t.is_qubit_target() {
            return Err(Error::InvalidTargetForGate {
                gate: "CX".to_string(),
                target: t.to_string(),
            });
        }
        self.undo_classical_pauli(c, GateTarget::x(t.qubit_value()))
    }

    fn undo_zcy_single(&mut self, c: GateTarget, t: GateTarget) -> Result<()> {
        if !Self::is_classically_controlled(c) && !Self::is_classically_controlled(t) {
            let (cq, tq) = (c.qubit_value() as usize, t.qubit_value() as usize);
            let zs_tq = self.zs[tq].clone();
            self.zs[cq].xor_with(&zs_tq);
            let xs_tq = self.xs[tq].clone();
            self.zs[cq].xor_with(&xs_tq);
            let xs_cq = self.xs[cq].clone();
            self.xs[tq].xor_with(&xs_cq);
            let xs_cq = self.xs[cq].clone();
            self.zs[tq].xor_with(&xs_cq);
            return Ok(());
        }
        if !t.is_qubit_target() {
            return Err(Error::InvalidTargetForGate {
                gate: "CY".to_string(),
                target: t.to_string(),
            });
        }
        self.undo_classical_pauli(c, GateTarget::y(t.qubit_value()))
    }

    fn undo_zcz_single(&mut self, c: GateTarget, t: GateTarget) -> Result<()> {
        let c_classical = Self::is_classically_controlled(c);
        let t_classical = Self::is_classically_controlled(t);
        if !c_classical && !t_classical {
            let (cq, tq) = (c.qubit_value() as usize, t.qubit_value() as usize);
            self.zs[cq].xor_with(&self.xs[tq].clone());
            self.zs[tq].xor_with(&self.xs[cq].clone());
            return Ok(());
        }
        if c_classical && t_classical {
            return Ok(());
        }
        if c_classical {
            self.undo_classical_pauli(c, GateTarget::z(t.qubit_value()))
        } else {
            self.undo_classical_pauli(t, GateTarget::z(c.qubit_value()))
        }
    }

    fn undo_h_xz(&mut self, targets: &[GateTarget]) {
        for target in targets.iter().rev() {
            let q = target.qubit_value() as usize;
            std::mem::swap(&mut self.xs[q], &mut self.zs[q]);
        }
    }

    fn undo_h_xy(&mut self, targets: &[GateTarget]) {
        for target in targets.iter().rev() {
            let q = target.qubit_value() as usize;
            self.zs[q].xor_with(&self.xs[q].clone());
        }
    }

    fn undo_h_yz(&mut self, targets: &[GateTarget]) {
        for target in targets.iter().rev() {
            let q = target.qubit_value() as usize;
            self.xs[q].xor_with(&self.zs[q].clone());
        }
    }

    fn undo_c_xyz(&mut self, targets: &[GateTarget]) {
        for target in targets.iter().rev() {
            let q = target.qubit_value() as usize;
            self.zs[q].xor_with(&self.xs[q].clone());
            self.xs[q].xor_with(&self.zs[q].clone());
        }
    }

    fn undo_c_zyx(&mut self, targets: &[GateTarget]) {
        for target in targets.iter().rev() {
            let q = target.qubit_value() as usize;
            self.xs[q].xor_with(&self.zs[q].clone());
            self.zs[q].xor_with(&self.xs[q].clone());
        }
    }

    fn undo_pairs(
        &mut self,
        targets: &[GateTarget],
        mut step: impl FnMut(&mut Self, GateTarget, GateTarget) -> Result<()>,
    ) -> Result<()> {
        let mut k = targets.len();
        while k >= 2 {
            step(self, targets[k - 2], targets[k - 1])?;
            k -= 2;
        }
        Ok(())
    }

    fn undo_xcx(&mut self, targets: &[GateTarget]) -> Result<()> {
        self.undo_pairs(targets, |tracker, a, b| {
            let (qa, qb) = (a.qubit_value() as usize, b.qubit_value() as usize);
            tracker.xs[qa].xor_with(&tracker.zs[qb].clone());
            tracker.xs[qb].xor_with(&tracker.zs[qa].clone());
            Ok(())
        })
    }

    fn undo_xcy(&mut self, targets: &[GateTarget]) -> Result<()> {
        self.undo_pairs(targets, |tracker, tx, ty| {
            let (qx, qy) = (tx.qubit_value() as usize, ty.qubit_value() as usize);
            let xs_qy = tracker.xs[qy].clone();
            tracker.xs[qx].xor_with(&xs_qy);
            tracker.xs[qx].xor_with(&tracker.zs[qy].clone());
            tracker.xs[qy].xor_with(&tracker.zs[qx].clone());
            let zs_qx = tracker.zs[qx].clone();
            tracker.zs[qy].xor_with(&zs_qx);
            Ok(())
        })
    }

    fn undo_ycx(&mut self, targets: &[GateTarget]) -> Result<()> {
        self.undo_pairs(targets, |tracker, a, b| {
            // YCX's roles are XCY's roles reversed.
            let (qx, qy) = (b.qubit_value() as usize, a.qubit_value() as usize);
            let xs_qy = tracker.xs[qy].clone();
            tracker.xs[qx].xor_with(&xs_qy);
            tracker.xs[qx].xor_with(&tracker.zs[qy].clone());
            tracker.xs[qy].xor_with(&tracker.zs[qx].clone());
            let zs_qx = tracker.zs[qx].clone();
            tracker.zs[qy].xor_with(&zs_qx);
            Ok(())
        })
    }

    fn undo_ycy(&mut self, targets: &[GateTarget]) -> Result<()> {
        self.undo_pairs(targets, |tracker, a, b| {
            let (qa, qb) = (a.qubit_value() as usize, b.qubit_value() as usize);
            tracker.zs[qa].xor_with(&tracker.xs[qa].clone());
            tracker.zs[qb].xor_with(&tracker.xs[qb].clone());
            tracker.xs[qa].xor_with(&tracker.zs[qb].clone());
            tracker.xs[qb].xor_with(&tracker.zs[qa].clone());
            tracker.zs[qa].xor_with(&tracker.xs[qa].clone());
            tracker.zs[qb].xor_with(&tracker.xs[qb].clone());
            Ok(())
        })
    }

    fn undo_sqrt_xx(&mut self, targets: &[GateTarget]) -> Result<()> {
        self.undo_pairs(targets, |tracker, a, b| {
            let (qa, qb) = (a.qubit_value() as usize, b.qubit_value() as usize);
            let za = tracker.zs[qa].clone();
            let zb = tracker.zs[qb].clone();
            tracker.xs[qa].xor_with(&za);
            tracker.xs[qa].xor_with(&zb);
            tracker.xs[qb].xor_with(&za);
            tracker.xs[qb].xor_with(&zb);
            Ok(())
        })
    }

    fn undo_sqrt_yy(&mut self, targets: &[GateTarget]) -> Result<()> {
        self.undo_pairs(targets, |tracker, a, b| {
            let (qa, qb) = (a.qubit_value() as usize, b.qubit_value() as usize);
            tracker.zs[qa].xor_with(&tracker.xs[qa].clone());
            tracker.zs[qb].xor_with(&tracker.xs[qb].clone());
            tracker.xs[qa].xor_with(&tracker.zs[qa].clone());
            tracker.xs[qa].xor_with(&tracker.zs[qb].clone());
            tracker.xs[qb].xor_with(&tracker.zs[qa].clone());
            tracker.xs[qb].xor_with(&tracker.zs[qb].clone());
            tracker.zs[qa].xor_with(&tracker.xs[qa].clone());
            tracker.zs[qb].xor_with(&tracker.xs[qb].clone());
            Ok(())
        })
    }

    fn undo_sqrt_zz(&mut self, targets: &[GateTarget]) -> Result<()> {
        self.undo_pairs(targets, |tracker, a, b| {
            let (qa, qb) = (a.qubit_value() as usize, b.qubit_value() as usize);
            let xa = tracker.xs[qa].clone();
            let xb = tracker.xs[qb].clone();
            tracker.zs[qa].xor_with(&xa);
            tracker.zs[qa].xor_with(&xb);
            tracker.zs[qb].xor_with(&xa);
            tracker.zs[qb].xor_with(&xb);
            Ok(())
        })
    }

    fn undo_swap(&mut self, targets: &[GateTarget]) -> Result<()> {
        self.undo_pairs(targets, |tracker, a, b| {
            let (qa, qb) = (a.qubit_value() as usize, b.qubit_value() as usize);
            tracker.xs.swap(qa, qb);
            tracker.zs.swap(qa, qb);
            Ok(())
        })
    }

    fn undo_cxswap(&mut self, targets: &[GateTarget]) -> Result<()> {
        self.undo_pairs(targets, |tracker, a, b| {
            let (qa, qb) = (a.qubit_value() as usize, b.qubit_value() as usize);
            xor_index(&mut tracker.zs, qa, qb);
            xor_index(&mut tracker.zs, qb, qa);
            xor_index(&mut tracker.xs, qb, qa);
            xor_index(&mut tracker.xs, qa, qb);
            Ok(())
        })
    }

    fn undo_swapcx(&mut self, targets: &[GateTarget]) -> Result<()> {
        self.undo_pairs(targets, |tracker, a, b| {
            let (qa, qb) = (a.qubit_value() as usize, b.qubit_value() as usize);
            xor_index(&mut tracker.zs, qb, qa);
            xor_index(&mut tracker.zs, qa, qb);
            xor_index(&mut tracker.xs, qa, qb);
            xor_index(&mut tracker.xs, qb, qa);
            Ok(())
        })
    }

    fn undo_iswap(&mut self, targets: &[GateTarget]) -> Result<()> {
        self.undo_pairs(targets, |tracker, a, b| {
            let (qa, qb) = (a.qubit_value() as usize, b.qubit_value() as usize);
            let xa = tracker.xs[qa].clone();
            let xb = tracker.xs[qb].clone();
            tracker.zs[qa].xor_with(&xa);
            tracker.zs[qa].xor_with(&xb);
            tracker.zs[qb].xor_with(&xa);
            tracker.zs[qb].xor_with(&xb);
            tracker.xs.swap(qa, qb);
            tracker.zs.swap(qa, qb);
            Ok(())
        })
    }

    fn undo_mx(&mut self, targets: &[GateTarget]) -> Result<()> {
        self.handle_z_gauges(targets)?;
        for target in targets.iter().rev() {
            self.num_measurements_in_past -= 1;
            let index = self.num_measurements_in_past;
            if let Some(sensitivity) = self.rec_bits.remove(&index) {
                let q = target.qubit_value() as usize;
                self.xs[q].xor_with(&sensitivity);
            }
        }
        Ok(())
    }

    fn undo_my(&mut self, targets: &[GateTarget]) -> Result<()> {
        self.handle_y_gauges(targets)?;
        for target in targets.iter().rev() {
            self.num_measurements_in_past -= 1;
            let index = self.num_measurements_in_past;
            if let Some(sensitivity) = self.rec_bits.remove(&index) {
                let q = target.qubit_value() as usize;
                self.xs[q].xor_with(&sensitivity);
                self.zs[q].xor_with(&sensitivity);
            }
        }
        Ok(())
    }

    fn undo_mz(&mut self, targets: &[GateTarget]) -> Result<()> {
        self.handle_x_gauges(targets)?;
        for target in targets.iter().rev() {
            self.num_measurements_in_past -= 1;
            let index = self.num_measurements_in_past;
            if let Some(sensitivity) = self.rec_bits.remove(&index) {
                let q = target.qubit_value() as usize;
                self.zs[q].xor_with(&sensitivity);
            }
        }
        Ok(())
    }

    fn undo_mrx(&mut self, targets: &[GateTarget]) -> Result<()> {
        self.handle_z_gauges(targets)?;
        for target in targets.iter().rev() {
            self.num_measurements_in_past -= 1;
            let index = self.num_measurements_in_past;
            let q = target.qubit_value() as usize;
            self.xs[q].clear();
            self.zs[q].clear();
            if let Some(sensitivity) = self.rec_bits.remove(&index) {
                self.xs[q].xor_with(&sensitivity);
            }
        }
        Ok(())
    }

    fn undo_mry(&mut self, targets: &[GateTarget]) -> Result<()> {
        self.handle_y_gauges(targets)?;
        for target in targets.iter().rev() {
            self.num_measurements_in_past -= 1;
            let index = self.num_measurements_in_past;
            let q = target.qubit_value() as usize;
            self.xs[q].clear();
            self.zs[q].clear();
            if let Some(sensitivity) = self.rec_bits.remove(&index) {
                self.xs[q].xor_with(&sensitivity);
                self.zs[q].xor_with(&sensitivity);
            }
        }
        Ok(())
    }

    fn undo_mrz(&mut self, targets: &[GateTarget]) -> Result<()> {
        self.handle_x_gauges(targets)?;
        for target in targets.iter().rev() {
            self.num_measurements_in_past -= 1;
            let index = self.num_measurements_in_past;
            let q = target.qubit_value() as usize;
            self.xs[q].clear();
            self.zs[q].clear();
            if let Some(sensitivity) = self.rec_bits.remove(&index) {
                self.zs[q].xor_with(&sensitivity);
            }
        }
        Ok(())
    }

    fn undo_rx(&mut self, targets: &[GateTarget]) -> Result<()> {
        self.handle_z_gauges(targets)?;
        self.clear_qubits(targets);
        Ok(())
    }

    fn undo_ry(&mut self, targets: &[GateTarget]) -> Result<()> {
        self.handle_y_gauges(targets)?;
        self.clear_qubits(targets);
        Ok(())
    }

    fn undo_rz(&mut self, targets: &[GateTarget]) -> Result<()> {
        self.handle_x_gauges(targets)?;
        self.clear_qubits(targets);
        Ok(())
    }

    fn undo_detector(&mut self, instruction: CircuitInstruction<'_>) -> Result<()> {
        self.num_detectors_in_past -= 1;
        let detector = DemTarget::relative_detector_id(self.num_detectors_in_past);
        for &target in instruction.targets {
            let index = self.num_measurements_in_past as i64 + target.rec_offset();
            if index < 0 {
                return Err(Error::MeasurementRecordBeforeStart);
            }
            self.rec_bits
                .entry(index as u64)
                .or_insert_with(SparseXorVec::new)
                .xor_item(detector);
        }
        Ok(())
    }

    fn undo_observable_include(&mut self, instruction: CircuitInstruction<'_>) -> Result<()> {
        let id = instruction.args.first().copied().unwrap_or(0.0) as u64;
        let observable = DemTarget::observable_id(id);
        for &target in instruction.targets {
            let index = self.num_measurements_in_past as i64 + target.rec_offset();
            if index < 0 {
                return Err(Error::MeasurementRecordBeforeStart);
            }
            self.rec_bits
                .entry(index as u64)
                .or_insert_with(SparseXorVec::new)
                .xor_item(observable);
        }
        Ok(())
    }

    fn conjugate_mpp_group(&mut self, h_xz: &[u32], h_yz: &[u32], cnot: &[(u32, u32)]) {
        let h_xz_targets: Vec<GateTarget> = h_xz.iter().map(|&q| GateTarget::qubit(q)).collect();
        let h_yz_targets: Vec<GateTarget> = h_yz.iter().map(|&q| GateTarget::qubit(q)).collect();
        self.undo_h_xz(&h_xz_targets);
        self.undo_h_yz(&h_yz_targets);
        for &(q, rep) in cnot {
            let _ = self.undo_zcx_single(GateTarget::qubit(q), GateTarget::qubit(rep));
        }
    }

    fn undo_mpp_group(&mut self, group: &[GateTarget]) -> Result<()> {
        let mut h_xz = Vec::new();
        let mut h_yz = Vec::new();
        let mut cnot = Vec::new();
        let mut representative = None;
        for &target in group {
            let qubit = target.qubit_value();
            if target.is_x() {
                h_xz.push(qubit);
            } else if target.is_y() {
                h_yz.push(qubit);
            }
            match representative {
                None => representative = Some(qubit),
                Some(rep) => cnot.push((qubit, rep)),
            }
        }
        let Some(representative) = representative else {
            return Ok(());
        };

        self.conjugate_mpp_group(&h_xz, &h_yz, &cnot);
        let meas = [GateTarget::qubit(representative)];
        if let Err(err) = self.handle_x_gauges(&meas) {
            self.conjugate_mpp_group(&h_xz, &h_yz, &cnot);
            return Err(err);
        }
        self.undo_mz(&meas)?;
        self.conjugate_mpp_group(&h_xz, &h_yz, &cnot);
        Ok(())
    }

    fn undo_pair_measure(&mut self, targets: &[GateTarget], basis_x: bool, basis_y: bool) -> Result<()> {
        let mut k = targets.len();
        while k >= 2 {
            let (a, b) = (targets[k - 2], targets[k - 1]);
            let group = if basis_y {
                [GateTarget::y(a.qubit_value()), GateTarget::y(b.qubit_value())]
            } else if basis_x {
                [GateTarget::x(a.qubit_value()), GateTarget::x(b.qubit_value())]
            } else {
                [GateTarget::z(a.qubit_value()), GateTarget::z(b.qubit_value())]
            };
            self.undo_mpp_group(&group)?;
            k -= 2;
        }
        Ok(())
    }

    fn undo_mpp(&mut self, instruction: CircuitInstruction<'_>) -> Result<()> {
        let mut groups: Vec<Vec<GateTarget>> = Vec::new();
        crate::validate::for_combined_target_groups(instruction, |group| {
            groups.push(group.iter().copied().filter(|t| !t.is_combiner()).collect());
            Ok(())
        })?;
        for group in groups.into_iter().rev() {
            self.undo_mpp_group(&group)?;
        }
        Ok(())
    }

    /// Undoes one gate application, dispatching on its [`GateType`].
    pub fn undo_gate(&mut self, instruction: CircuitInstruction<'_>) -> Result<()> {
        use GateType as T;
        match instruction.gate_type {
            T::Detector => self.undo_detector(instruction),
            T::ObservableInclude => self.undo_observable_include(instruction),
            T::Tick | T::QubitCoords | T::ShiftCoords | T::Repeat => Ok(()),
            T::Mx => self.undo_mx(instruction.targets),
            T::My => self.undo_my(instruction.targets),
            T::M => self.undo_mz(instruction.targets),
            T::Mrx => self.undo_mrx(instruction.targets),
            T::Mry => self.undo_mry(instruction.targets),
            T::Mr => self.undo_mrz(instruction.targets),
            T::Rx => self.undo_rx(instruction.targets),
            T::Ry => self.undo_ry(instruction.targets),
            T::R => self.undo_rz(instruction.targets),
            T::Mpp => self.undo_mpp(instruction),
            T::H => {
                self.undo_h_xz(instruction.targets);
                Ok(())
            }
            T::HXy | T::S | T::SDag => {
                self.undo_h_xy(instruction.targets);
                Ok(())
            }
            T::HYz | T::SqrtX | T::SqrtXDag => {
                self.undo_h_yz(instruction.targets);
                Ok(())
            }
            T::SqrtY | T::SqrtYDag => {
                self.undo_h_xz(instruction.targets);
                Ok(())
            }
            T::CXyz => {
                self.undo_c_xyz(instruction.targets);
                Ok(())
            }
            T::CZyx => {
                self.undo_c_zyx(instruction.targets);
                Ok(())
            }
            T::Xcx => self.undo_xcx(instruction.targets),
            T::Xcy => self.undo_xcy(instruction.targets),
            T::Ycx => self.undo_ycx(instruction.targets),
            T::Ycy => self.undo_ycy(instruction.targets),
            T::Cx | T::Xcz => self.undo_pairs(instruction.targets, |tracker, a, b| {
                if instruction.gate_type == T::Cx {
                    tracker.undo_zcx_single(a, b)
                } else {
                    tracker.undo_zcx_single(b, a)
                }
            }),
            T::Cy | T::Ycz => self.undo_pairs(instruction.targets, |tracker, a, b| {
                if instruction.gate_type == T::Cy {
                    tracker.undo_zcy_single(a, b)
                } else {
                    tracker.undo_zcy_single(b, a)
                }
            }),
            T::Cz => self.undo_pairs(instruction.targets, |tracker, a, b| tracker.undo_zcz_single(a, b)),
            T::SqrtXx | T::SqrtXxDag => self.undo_sqrt_xx(instruction.targets),
            T::SqrtYy | T::SqrtYyDag => self.undo_sqrt_yy(instruction.targets),
            T::SqrtZz | T::SqrtZzDag => self.undo_sqrt_zz(instruction.targets),
            T::Swap => self.undo_swap(instruction.targets),
            T::Cxswap => self.undo_cxswap(instruction.targets),
            T::Swapcx => self.undo_swapcx(instruction.targets),
            T::Iswap | T::IswapDag => self.undo_iswap(instruction.targets),
            T::Czswap => self.undo_pairs(instruction.targets, |tracker, a, b| {
                tracker.undo_swap(&[a, b])?;
                tracker.undo_zcz_single(a, b)
            }),
            T::Mxx => self.undo_pair_measure(instruction.targets, true, false),
            T::Myy => self.undo_pair_measure(instruction.targets, false, true),
            T::Mzz => self.undo_pair_measure(instruction.targets, false, false),
            // Identity-acting gates (Pauli gates, noise channels, and the
            // rest of the period-3/period-4/annotation catalog not singled
            // out above) do not move sensitivity between qubits.
            _ => Ok(()),
        }
    }

    pub fn undo_circuit(&mut self, circuit: &Circuit) -> Result<()> {
        for op in circuit.operations.iter().rev() {
            match op {
                Operation::Gate(instruction) => self.undo_gate(instruction.as_view())?,
                Operation::Repeat { repetitions, body } => self.undo_loop(body, *repetitions)?,
            }
        }
        Ok(())
    }

    pub fn undo_loop_by_unrolling(&mut self, body: &Circuit, iterations: u64) -> Result<()> {
        for _ in 0..iterations {
            self.undo_circuit(body)?;
        }
        Ok(())
    }

    /// Undoes `iterations` repetitions of `body`, detecting (via
    /// tortoise-and-hare) when the tracker's state becomes a periodic,
    /// shifted copy of itself so the remaining iterations can be skipped in
    /// one jump instead of one at a time (spec §4.3, §8 loop-folding
    /// performance claim).
    pub fn undo_loop(&mut self, body: &Circuit, iterations: u64) -> Result<()> {
        if iterations < 5 {
            return self.undo_loop_by_unrolling(body, iterations);
        }
        let mut tortoise = self.clone();
        let mut hare_steps: u64 = 0;
        let mut tortoise_steps: u64 = 0;
        loop {
            self.undo_circuit(body)?;
            hare_steps += 1;
            if self.is_shifted_copy(&tortoise) {
                break;
            }
            if hare_steps > iterations - hare_steps {
                return self.undo_loop_by_unrolling(body, iterations - hare_steps);
            }
            if hare_steps % 2 == 0 {
                tortoise.undo_circuit(body)?;
                tortoise_steps += 1;
                if self.is_shifted_copy(&tortoise) {
                    break;
                }
            }
        }
        let period = hare_steps - tortoise_steps;
        if period == 0 {
            return self.undo_loop_by_unrolling(body, iterations - hare_steps);
        }
        let skipped_iterations = (iterations - hare_steps) / period;
        let detectors_per_period = tortoise.num_detectors_in_past as i64 - self.num_detectors_in_past as i64;
        let measurements_per_period = tortoise.num_measurements_in_past as i64 - self.num_measurements_in_past as i64;
        self.shift(
            -(measurements_per_period * skipped_iterations as i64),
            -(detectors_per_period * skipped_iterations as i64),
        );
        hare_steps += skipped_iterations * period;
        self.undo_loop_by_unrolling(body, iterations - hare_steps)
    }

    /// Whether `self` is what `other` would look like after being shifted
    /// forward in time by a whole number of measurements and detectors:
    /// the fixed point [`SurfTracker::undo_loop`] looks for.
    #[must_use]
    pub fn is_shifted_copy(&self, other: &SurfTracker) -> bool {
        if self.xs.len() != other.xs.len() {
            return false;
        }
        let detector_offset = self.num_detectors_in_past as i64 - other.num_detectors_in_past as i64;
        let measurement_offset = self.num_measurements_in_past as i64 - other.num_measurements_in_past as i64;
        for q in 0..self.xs.len() {
            if !sets_equal_after_shift(&self.xs[q], &other.xs[q], detector_offset) {
                return false;
            }
            if !sets_equal_after_shift(&self.zs[q], &other.zs[q], detector_offset) {
                return false;
            }
        }
        if self.rec_bits.len() != other.rec_bits.len() {
            return false;
        }
        for (&key, sensitivity) in &self.rec_bits {
            let other_key = (key as i64 - measurement_offset) as u64;
            match other.rec_bits.get(&other_key) {
                Some(other_sensitivity) => {
                    if !sets_equal_after_shift(sensitivity, other_sensitivity, detector_offset) {
                        return false;
                    }
                }
                None => return false,
            }
        }
        true
    }

    /// Shifts every measurement index and detector id this tracker refers
    /// to, used after folding a periodic loop to re-align the remainder
    /// with the unrolled iterations already undone.
    pub fn shift(&mut self, measurement_offset: i64, detector_offset: i64) {
        self.num_measurements_in_past = (self.num_measurements_in_past as i64 + measurement_offset) as u64;
        self.num_detectors_in_past = (self.num_detectors_in_past as i64 + detector_offset) as u64;

        let old_rec_bits = std::mem::take(&mut self.rec_bits);
        for (key, sensitivity) in old_rec_bits {
            let new_key = (key as i64 + measurement_offset) as u64;
            let shifted = shift_set(&sensitivity, detector_offset);
            self.rec_bits.insert(new_key, shifted);
        }
        for set in self.xs.iter_mut() {
            *set = shift_set(set, detector_offset);
        }
        for set in self.zs.iter_mut() {
            *set = shift_set(set, detector_offset);
        }
    }
}

fn shift_set(set: &SparseXorVec<DemTarget>, offset: i64) -> SparseXorVec<DemTarget> {
    set.iter().map(|target| target.shift_if_detector_id(offset)).collect()
}

fn sets_equal_after_shift(a: &SparseXorVec<DemTarget>, b: &SparseXorVec<DemTarget>, detector_offset: i64) -> bool {
    *a == shift_set(b, detector_offset)
}

fn xor_index(vec: &mut [SparseXorVec<DemTarget>], dst: usize, src: usize) {
    let value = vec[src].clone();
    vec[dst].xor_with(&value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::GateInstruction;

    #[test]
    fn cx_propagates_z_back_through_control_and_x_forward_through_target() {
        let mut tracker = SurfTracker::new(2);
        tracker.zs[0].xor_item(DemTarget::relative_detector_id(7));
        let instruction = GateInstruction::new(GateType::Cx, vec![], vec![GateTarget::qubit(0), GateTarget::qubit(1)]);
        tracker.undo_gate(instruction.as_view()).unwrap();
        assert!(tracker.zs[0].contains(&DemTarget::relative_detector_id(7)));
        assert!(tracker.zs[1].contains(&DemTarget::relative_detector_id(7)));
    }

    #[test]
    fn detector_then_measurement_round_trips_sensitivity() {
        let mut tracker = SurfTracker::new(1);
        tracker.num_measurements_in_past = 1;
        let det = GateInstruction::new(GateType::Detector, vec![], vec![GateTarget::rec(1)]);
        tracker.undo_gate(det.as_view()).unwrap();
        assert_eq!(tracker.num_detectors_in_past, 1);
        let meas = GateInstruction::new(GateType::M, vec![], vec![GateTarget::qubit(0)]);
        tracker.undo_gate(meas.as_view()).unwrap();
        assert!(tracker.zs[0].contains(&DemTarget::relative_detector_id(0)));
    }

    #[test]
    fn gauge_conflict_is_an_error_unless_ignored() {
        let mut tracker = SurfTracker::new(1);
        tracker.xs[0].xor_item(DemTarget::relative_detector_id(0));
        let reset = GateInstruction::new(GateType::R, vec![], vec![GateTarget::qubit(0)]);
        let err = tracker.undo_gate(reset.as_view()).unwrap_err();
        assert_eq!(err, Error::AnticommutingDissipation);

        let mut lenient = SurfTracker::new_ignoring_anticommutation(1);
        lenient.xs[0].xor_item(DemTarget::relative_detector_id(0));
        lenient.undo_gate(reset.as_view()).unwrap();
    }

    #[test]
    fn is_shifted_copy_ignores_absolute_offsets() {
        let mut a = SurfTracker::new(1);
        a.num_detectors_in_past = 3;
        a.zs[0].xor_item(DemTarget::relative_detector_id(2));
        let mut b = SurfTracker::new(1);
        b.num_detectors_in_past = 1;
        b.zs[0].xor_item(DemTarget::relative_detector_id(0));
        assert!(a.is_shifted_copy(&b));
    }

    #[test]
    fn loop_folding_matches_unrolling() {
        let mut body = Circuit::new();
        body.safe_append(GateInstruction::new(GateType::H, vec![], vec![GateTarget::qubit(0)]))
            .unwrap();
        body.safe_append(GateInstruction::new(GateType::M, vec![], vec![GateTarget::qubit(0)]))
            .unwrap();

        let mut folded = SurfTracker::new(1);
        folded.num_measurements_in_past = 50;
        folded.undo_loop(&body, 50).unwrap();

        let mut unrolled = SurfTracker::new(1);
        unrolled.num_measurements_in_past = 50;
        unrolled.undo_loop_by_unrolling(&body, 50).unwrap();

        assert_eq!(folded.num_measurements_in_past, unrolled.num_measurements_in_past);
    }
}
