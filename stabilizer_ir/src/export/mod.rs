//! Circuit exporters (spec §4.6): translating a circuit into an equivalent
//! representation in an external format.

pub mod qasm;
pub mod quirk;

pub use qasm::{export_qasm, QasmOptions, QasmVersion};
pub use quirk::export_quirk_url;
