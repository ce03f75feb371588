//! The Piet backend: compiles a [`Module`](crate::ir::Module) into a Piet
//! esolang program, rendered as a PPM image.
//!
//! Piet has neither registers, memory, nor named subroutines, so this
//! backend synthesises all three over Piet's one primitive, a stack: the
//! register file and memory become fixed stack-slot positions ([`abi`]), a
//! symbolic instruction list ([`opcode`]) and per-pc lowering ([`lower`])
//! build the program against that layout, and [`render`] turns the result
//! into codel colors. Piet has no function-chunking concept the way Desmos
//! does ([`crate::desmos`]'s `chunk_size`): the whole program is one image,
//! one pc-block per row.

mod abi;
mod config;
mod lower;
mod opcode;
mod render;

pub use config::PietConfig;

use crate::error::Result;
use crate::ir::{ChunkSink, Inst, Module, walk};

/// Compile `module` to a binary PPM Piet program.
///
/// # Errors
///
/// Returns an error if any instruction can't be lowered (an unsupported
/// opcode, a malformed operand, or a dynamic jump target — Piet can only
/// dispatch to jump targets known at compile time).
pub fn compile(module: &Module, cfg: &PietConfig) -> Result<Vec<u8>> {
    let by_pc = group_by_pc(module);
    let blocks = lower::lower_blocks(cfg, &by_pc)?;
    render::render(&blocks)
}

/// Groups `module.text` by pc, in ascending pc order, reusing
/// [`crate::ir::walk`]'s pc-ordering guarantee rather than re-deriving it
/// (a single chunk spanning every pc turns the walker into a plain grouper).
fn group_by_pc(module: &Module) -> Vec<(u32, Vec<Inst>)> {
    let Some(max_pc) = module.max_pc() else {
        return Vec::new();
    };

    let mut grouper = Grouper::default();
    walk(module, max_pc as usize + 1, &mut grouper);
    grouper.by_pc
}

#[derive(Default)]
struct Grouper {
    by_pc: Vec<(u32, Vec<Inst>)>,
}

impl ChunkSink for Grouper {
    fn func_prologue(&mut self, _chunk_id: usize) {}

    fn func_epilogue(&mut self) {}

    fn pc_change(&mut self, pc: u32) {
        self.by_pc.push((pc, Vec::new()));
    }

    fn emit_inst(&mut self, inst: &Inst) {
        self.by_pc
            .last_mut()
            .expect("pc_change always runs before emit_inst")
            .1
            .push(inst.clone());
    }
}
