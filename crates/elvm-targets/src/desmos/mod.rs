//! The Desmos backend: compiles a [`Module`](crate::ir::Module) into a
//! Desmos graph-state JSON document that simulates the machine via the
//! calculator's ticker.
//!
//! Memory is split into fixed-size chunk lists and the pc space into
//! fixed-size function chunks (see [`crate::ir::walk`]) because Desmos has
//! no unbounded list-indexing or recursion primitive that would let one
//! expression address arbitrary memory or dispatch to arbitrary code.

mod config;
mod emitter;
mod expr;
mod lower;
mod runtime;
mod symbols;

pub use config::DesmosConfig;

use crate::error::Result;
use crate::ir::Module;

/// Compile `module` to a Desmos graph-state JSON document.
///
/// # Errors
///
/// Returns an error if the document cannot be serialized.
pub fn compile(module: &Module, cfg: &DesmosConfig) -> Result<String> {
    emitter::compile(module, cfg)
}
