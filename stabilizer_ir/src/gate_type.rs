//! The dense gate identifier enumeration (spec §3 "Gate identifier").

/// A small dense integer identifying a gate. Indexes exactly one row of the
/// gate catalog ([`crate::gate_data::GateDataMap`]).
///
/// `NotAGate` is the reserved sentinel occupying index 0; it has an empty
/// name in the catalog and must be skipped by [`crate::gate_data::GateDataMap::items`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum GateType {
    NotAGate = 0,

    // Annotations
    Detector,
    ObservableInclude,
    Tick,
    QubitCoords,
    ShiftCoords,

    // Control flow
    Repeat,

    // Collapsing gates
    Mpad,
    Mx,
    My,
    M,
    Mrx,
    Mry,
    Mr,
    Rx,
    Ry,
    R,

    // Controlled gates
    Xcx,
    Xcy,
    Xcz,
    Ycx,
    Ycy,
    Ycz,
    Cx,
    Cy,
    Cz,

    // Hadamard-like gates
    H,
    HXy,
    HYz,
    HNxy,
    HNxz,
    HNyz,

    // Noise channels
    Depolarize1,
    Depolarize2,
    XError,
    YError,
    ZError,
    IError,
    IiError,
    PauliChannel1,
    PauliChannel2,
    E,
    ElseCorrelatedError,

    // Heralded noise channels
    HeraldedErase,
    HeraldedPauliChannel1,

    // Pauli gates
    I,
    X,
    Y,
    Z,

    // Period 3 gates
    CXyz,
    CZyx,
    CNxyz,
    CXnyz,
    CXynz,
    CNzyx,
    CZnyx,
    CZynx,

    // Period 4 gates
    SqrtX,
    SqrtXDag,
    SqrtY,
    SqrtYDag,
    S,
    SDag,

    // Parity phasing gates
    Ii,
    SqrtXx,
    SqrtXxDag,
    SqrtYy,
    SqrtYyDag,
    SqrtZz,
    SqrtZzDag,

    // Pauli product gates
    Mpp,
    Spp,
    SppDag,

    // Swap gates
    Swap,
    Iswap,
    Cxswap,
    Swapcx,
    Czswap,
    IswapDag,

    // Pair measurement gates
    Mxx,
    Myy,
    Mzz,
}

/// One past the last defined [`GateType`] discriminant; sized for a
/// dense `Vec`-backed catalog indexed by `GateType as usize`.
pub const NUM_DEFINED_GATES: usize = GateType::Mzz as usize + 1;

impl GateType {
    #[must_use]
    pub fn all() -> impl Iterator<Item = GateType> {
        (1..NUM_DEFINED_GATES as u8).map(|raw| {
            // SAFETY-free: GateType is repr(u8) and every discriminant in
            // 0..NUM_DEFINED_GATES is defined by construction of this enum.
            ALL_GATE_TYPES[raw as usize]
        })
    }
}

/// Dense table of every non-sentinel gate type, indexed by discriminant.
/// Built once, used by [`GateType::all`] and by catalog construction.
pub(crate) static ALL_GATE_TYPES: [GateType; NUM_DEFINED_GATES] = [
    GateType::NotAGate,
    GateType::Detector,
    GateType::ObservableInclude,
    GateType::Tick,
    GateType::QubitCoords,
    GateType::ShiftCoords,
    GateType::Repeat,
    GateType::Mpad,
    GateType::Mx,
    GateType::My,
    GateType::M,
    GateType::Mrx,
    GateType::Mry,
    GateType::Mr,
    GateType::Rx,
    GateType::Ry,
    GateType::R,
    GateType::Xcx,
    GateType::Xcy,
    GateType::Xcz,
    GateType::Ycx,
    GateType::Ycy,
    GateType::Ycz,
    GateType::Cx,
    GateType::Cy,
    GateType::Cz,
    GateType::H,
    GateType::HXy,
    GateType::HYz,
    GateType::HNxy,
    GateType::HNxz,
    GateType::HNyz,
    GateType::Depolarize1,
    GateType::Depolarize2,
    GateType::XError,
    GateType::YError,
    GateType::ZError,
    GateType::IError,
    GateType::IiError,
    GateType::PauliChannel1,
    GateType::PauliChannel2,
    GateType::E,
    GateType::ElseCorrelatedError,
    GateType::HeraldedErase,
    GateType::HeraldedPauliChannel1,
    GateType::I,
    GateType::X,
    GateType::Y,
    GateType::Z,
    GateType::CXyz,
    GateType::CZyx,
    GateType::CNxyz,
    GateType::CXnyz,
    GateType::CXynz,
    GateType::CNzyx,
    GateType::CZnyx,
    GateType::CZynx,
    GateType::SqrtX,
    GateType::SqrtXDag,
    GateType::SqrtY,
    GateType::SqrtYDag,
    GateType::S,
    GateType::SDag,
    GateType::Ii,
    GateType::SqrtXx,
    GateType::SqrtXxDag,
    GateType::SqrtYy,
    GateType::SqrtYyDag,
    GateType::SqrtZz,
    GateType::SqrtZzDag,
    GateType::Mpp,
    GateType::Spp,
    GateType::SppDag,
    GateType::Swap,
    GateType::Iswap,
    GateType::Cxswap,
    GateType::Swapcx,
    GateType::Czswap,
    GateType::IswapDag,
    GateType::Mxx,
    GateType::Myy,
    GateType::Mzz,
];
