//! The register-machine IR consumed by both backends.
//!
//! Everything in this module is "taken as given" conceptually — a production
//! ELVM-style toolchain would hand these types to us fully built, parsed and
//! optimized upstream. This crate still has to define them somewhere, so it
//! does, alongside the pc-chunk walker (`walk`) whose callback contract the
//! two backends' lowering strategies depend on directly.

mod instruction;
mod module;
mod register;
pub mod text;
mod value;
mod walker;

pub use instruction::{CompareKind, Inst, Opcode};
pub use module::Module;
pub use register::Register;
pub use value::Value;
pub use walker::{ChunkSink, walk};
