//! Per-instruction lowering (P2): turns the instructions at one pc into a
//! block of Piet opcodes against the stack layout of [`super::abi`].
//!
//! Piet has no single-assignment restriction the way Desmos actions do, so
//! unlike [`crate::desmos::lower`] there is no micro-step splitting here:
//! every instruction at a pc lowers straight into the block in source
//! order. The only instruction that gets special treatment is the last one,
//! since only it may end the block (a jump, a conditional jump, or `EXIT`);
//! everything else falls through into the next instruction at the same pc.

use crate::error::{Error, Result};
use crate::ir::{CompareKind, Inst, Opcode, Register, Value};

use super::abi;
use super::config::PietConfig;
use super::opcode::{self, PietOp};

/// The "no more input" sentinel a GETC read yields, mirroring the IR's own
/// convention for an empty STDIN.
const EOF_SENTINEL: i64 = 256;

/// One pc's worth of opcodes plus the source pc, for the renderer to lay
/// out as a row.
pub struct Block {
    pub pc: u32,
    pub ops: Vec<PietOp>,
}

/// Lower every pc's instructions (already grouped by [`crate::ir::walk`])
/// into one [`Block`] each, in ascending pc order.
pub fn lower_blocks(cfg: &PietConfig, by_pc: &[(u32, Vec<Inst>)]) -> Result<Vec<Block>> {
    by_pc
        .iter()
        .map(|(pc, insts)| {
            let ops = lower_pc(cfg, *pc, insts)?;
            Ok(Block { pc: *pc, ops })
        })
        .collect()
}

fn lower_pc(cfg: &PietConfig, pc: u32, insts: &[Inst]) -> Result<Vec<PietOp>> {
    let mut b = BlockBuilder::new(cfg);
    b.push(PietOp::Pop);

    let mut terminated = false;
    for (i, inst) in insts.iter().enumerate() {
        let is_last = i + 1 == insts.len();
        terminated = b.lower_inst(inst, is_last, pc)?;
    }
    if !terminated {
        b.push_imm(i64::from(pc) + 1);
        b.push(PietOp::Jmp);
    }
    Ok(b.into_ops())
}

/// Accumulates one pc-block's opcode stream, tracking the scratch depth
/// above the base [`abi`] layout so every `load`/`store_top` call can
/// compute its absolute stack position. Every instruction is expected to
/// leave `depth` back at 0 once it's done (registers/memory are read and
/// written in place, nothing is left lying around on the stack).
struct BlockBuilder<'a> {
    cfg: &'a PietConfig,
    ops: Vec<PietOp>,
    depth: i64,
}

impl<'a> BlockBuilder<'a> {
    fn new(cfg: &'a PietConfig) -> Self {
        BlockBuilder { cfg, ops: Vec::new(), depth: 0 }
    }

    fn into_ops(self) -> Vec<PietOp> {
        self.ops
    }

    fn push(&mut self, op: PietOp) {
        self.depth += op.stack_delta();
        self.ops.push(op);
    }

    fn push_all(&mut self, ops: Vec<PietOp>) {
        for op in ops {
            self.push(op);
        }
    }

    fn push_imm(&mut self, v: i64) {
        self.push_all(opcode::push_value(v));
    }

    fn push_value(&mut self, v: Value) {
        match v {
            Value::Imm(i) => self.push_imm(i),
            Value::Reg(r) => self.load_reg(r),
        }
    }

    fn load_reg(&mut self, r: Register) {
        let pos = abi::reg_slot(r) + self.depth;
        self.push_all(opcode::load(pos));
    }

    fn store_reg(&mut self, r: Register) {
        let pos = abi::reg_slot(r) + self.depth - 1;
        self.push_all(opcode::store_top(pos));
    }

    fn load_mem(&mut self, addr: Value) {
        match addr {
            Value::Imm(a) => {
                let pos = abi::mem_slot(a) + self.depth;
                self.push_all(opcode::load(pos));
            }
            Value::Reg(r) => {
                self.load_reg(r);
                let base = abi::MEM_BASE + self.depth;
                self.push_imm(base);
                self.push(PietOp::Add);
                self.push_all(opcode::load_dynamic());
            }
        }
    }

    /// Writes the value currently on top of the stack into memory address
    /// `addr`, consuming it.
    fn store_mem(&mut self, addr: Value) {
        match addr {
            Value::Imm(a) => {
                let pos = abi::mem_slot(a) + self.depth - 1;
                self.push_all(opcode::store_top(pos));
            }
            Value::Reg(r) => {
                self.load_reg(r);
                let base = abi::MEM_BASE + self.depth;
                self.push_imm(base);
                self.push(PietOp::Add);
                self.push_all(opcode::store_dynamic());
            }
        }
    }

    /// Pushes the 0/1 result of a comparison instruction's condition.
    fn push_compare(&mut self, inst: &Inst) -> Result<()> {
        let kind = inst
            .op
            .comparison_kind()
            .ok_or_else(|| Error::Internal(format!("{:?} is not a comparison", inst.op)))?;
        let (kind, swapped) = kind.normalize();
        let dst = required_dst(inst)?;
        let src = required_src(inst)?;
        if swapped {
            self.push_value(src);
            self.load_reg(dst);
        } else {
            self.load_reg(dst);
            self.push_value(src);
        }
        match kind {
            CompareKind::Eq => {
                self.push(PietOp::Sub);
                self.push(PietOp::Not);
            }
            CompareKind::Ne => {
                self.push(PietOp::Sub);
            }
            CompareKind::Gt => {
                self.push(PietOp::Gt);
            }
            CompareKind::Le => {
                self.push(PietOp::Gt);
                self.push(PietOp::Not);
            }
            CompareKind::Lt | CompareKind::Ge => {
                unreachable!("normalize() rewrites Lt/Ge away")
            }
        }
        Ok(())
    }

    /// Lowers one instruction. Returns whether it ended the block (a jump
    /// or `EXIT`, which only the last instruction at a pc may be).
    fn lower_inst(&mut self, inst: &Inst, is_last: bool, pc: u32) -> Result<bool> {
        if !is_last && (inst.op == Opcode::Jmp || inst.op == Opcode::Exit || inst.op.is_conditional_jump()) {
            return Err(Error::Internal(format!(
                "{:?} at pc {pc} must be the last instruction of its block",
                inst.op
            )));
        }

        match inst.op {
            Opcode::Mov => {
                self.push_value(required_src(inst)?);
                self.store_reg(required_dst(inst)?);
            }
            Opcode::Add => {
                let dst = required_dst(inst)?;
                self.load_reg(dst);
                self.push_value(required_src(inst)?);
                self.push(PietOp::Add);
                self.push_imm(self.cfg.reg_mask);
                self.push(PietOp::Mod);
                self.store_reg(dst);
            }
            Opcode::Sub => {
                let dst = required_dst(inst)?;
                self.load_reg(dst);
                self.push_value(required_src(inst)?);
                self.push(PietOp::Sub);
                self.push_imm(self.cfg.reg_mask);
                self.push(PietOp::Mod);
                self.store_reg(dst);
            }
            Opcode::Load => {
                self.load_mem(required_src(inst)?);
                self.store_reg(required_dst(inst)?);
            }
            Opcode::Store => {
                self.load_reg(required_dst(inst)?);
                self.store_mem(required_src(inst)?);
            }
            Opcode::Putc => {
                self.push_value(required_src(inst)?);
                self.push(PietOp::OutChar);
            }
            Opcode::Getc => {
                self.push(PietOp::InChar);
                self.push_imm(EOF_SENTINEL);
                self.push(PietOp::Mod);
                self.store_reg(required_dst(inst)?);
            }
            Opcode::Exit => {
                self.push(PietOp::Exit);
                return Ok(true);
            }
            Opcode::Dump => {}
            _ if inst.op.is_compare() => {
                self.push_compare(inst)?;
                self.store_reg(required_dst(inst)?);
            }
            Opcode::Jmp => {
                self.push_imm(i64::from(jmp_target(inst)?));
                self.push(PietOp::Jmp);
                return Ok(true);
            }
            _ if inst.op.is_conditional_jump() => {
                let target = jmp_target(inst)?;
                let fallthrough = pc + 1;
                self.push_imm(i64::from(target));
                self.push_imm(i64::from(fallthrough));
                self.push(PietOp::Sub);
                self.push_compare(inst)?;
                self.push(PietOp::Mul);
                self.push_imm(i64::from(fallthrough));
                self.push(PietOp::Add);
                self.push(PietOp::Jmp);
                return Ok(true);
            }
            other => {
                return Err(Error::Unsupported(format!("opcode {other:?} has no Piet lowering")));
            }
        }

        debug_assert_eq!(self.depth, 0, "instruction lowering must leave the scratch stack empty");
        Ok(false)
    }
}

fn required_dst(inst: &Inst) -> Result<Register> {
    inst.dst
        .ok_or_else(|| Error::Internal(format!("{:?} requires a dst operand", inst.op)))
}

fn required_src(inst: &Inst) -> Result<Value> {
    inst.src
        .ok_or_else(|| Error::Internal(format!("{:?} requires a src operand", inst.op)))
}

fn jmp_target(inst: &Inst) -> Result<u32> {
    match inst.jmp {
        Some(Value::Imm(v)) => Ok(v as u32),
        Some(Value::Reg(_)) => Err(Error::Unsupported(
            "dynamic jump targets are not supported by the Piet backend".to_string(),
        )),
        None => Err(Error::Internal(format!("{:?} requires a jmp operand", inst.op))),
    }
}
