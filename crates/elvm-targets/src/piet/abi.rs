//! Stack-slot layout for the Piet backend (P0): the synthesised "register
//! file" over a machine with no registers or addressable memory, only a
//! single stack.
//!
//! The permanent, bottom-of-stack layout established by the header program
//! (see [`super::render`]) is, bottom to top: memory words, then the seven
//! registers, then whatever scratch values an instruction's own lowering
//! temporarily pushes above that. Depths below are all measured the way
//! [`super::opcode::load`]/[`super::opcode::store_top`] expect: 0-indexed
//! from the *current* top of stack, which callers get by adding the
//! lowerer's running scratch depth (`stk`) to the slot's permanent offset.

use crate::ir::Register;

/// Permanent depth of register `reg`, measured from the top of the
/// fixed base layout (before any scratch values are pushed on top of it).
#[must_use]
pub fn reg_slot(reg: Register) -> i64 {
    i64::from(u8::from(reg))
}

/// Permanent depth of the first memory word, directly above the seven
/// registers.
pub const MEM_BASE: i64 = 7;

/// Permanent depth of memory word `addr`.
#[must_use]
pub fn mem_slot(addr: i64) -> i64 {
    MEM_BASE + addr
}
