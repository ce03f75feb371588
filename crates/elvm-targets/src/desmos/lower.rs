//! Per-opcode instruction lowering (D1): turns one pc's instructions into
//! one or more `check(pc,ip)`-gated branches of a chunk function.
//!
//! A single pc can carry more than one instruction (the walker makes no
//! promise otherwise). Since a Desmos action may assign a given variable at
//! most once, instructions that would collide are spread across several
//! ticks of the same pc, using the auxiliary `IP` register to tell them
//! apart — `plan` is the grouping step that decides where the splits go.
//!
//! Every helper that reads an instruction's operands returns a `Result`
//! rather than panicking on a malformed `Inst` (a `MOV` with no `src`, a
//! comparison with no `dst`, ...): such an instruction is an upstream
//! contract violation, but this crate has no IR validator of its own to
//! catch it earlier, so the lowerer is the last line of defense and reports
//! it as `Error::Internal` instead of crashing the process.

use crate::error::{Error, Result};
use crate::ir::{CompareKind, Inst, Opcode, Register, Value};

use super::config::DesmosConfig;
use super::expr::Expr;
use super::symbols;

/// One instruction's effect, as an ordered list of `(variable, value)`
/// writes. Order matters only for readability; two entries never name the
/// same variable (that's what `plan` uses to find a split point).
///
/// `STORE` expands directly into one write per memory chunk (mirroring
/// `store()`'s own bundling) rather than nesting a call to `store` inside a
/// single slot, since an action's value can't itself be another action.
fn lower_assignments(cfg: &DesmosConfig, inst: &Inst) -> Result<Vec<(String, Expr)>> {
    Ok(match inst.op {
        Opcode::Mov => vec![(reg(required_dst(inst)?), value(required_src(inst)?))],
        Opcode::Add => {
            let dst = required_dst(inst)?;
            vec![(reg(dst), wrap(reg_expr(dst).add(value(required_src(inst)?))))]
        }
        Opcode::Sub => {
            let dst = required_dst(inst)?;
            vec![(reg(dst), wrap(reg_expr(dst).sub(value(required_src(inst)?))))]
        }
        Opcode::Load => vec![(
            reg(required_dst(inst)?),
            Expr::Call(symbols::LOAD.to_string(), vec![value(required_src(inst)?)]),
        )],
        Opcode::Store => {
            let addr = value(required_src(inst)?);
            let val = reg_expr(required_dst(inst)?);
            (0..cfg.num_mem_chunks())
                .map(|c| {
                    let call = Expr::Call(
                        super::runtime::store_chunk_symbol(c),
                        vec![addr.clone(), val.clone()],
                    );
                    (symbols::mem_symbol(c), call)
                })
                .collect()
        }
        Opcode::Putc => vec![(
            symbols::STDOUT.to_string(),
            Expr::Call(
                symbols::APPEND.to_string(),
                vec![Expr::ident(symbols::STDOUT), value(required_src(inst)?)],
            ),
        )],
        Opcode::Getc => vec![
            (reg(required_dst(inst)?), Expr::Call(symbols::GETC.to_string(), Vec::new())),
            (
                symbols::STDIN.to_string(),
                Expr::Call(symbols::POP.to_string(), vec![Expr::ident(symbols::STDIN)]),
            ),
        ],
        Opcode::Exit => vec![(symbols::RUNNING.to_string(), Expr::num(0))],
        Opcode::Dump => Vec::new(),
        _ if inst.op.is_compare() => {
            let (kind, swapped) = comparison_kind(inst)?.normalize();
            let (lhs, rhs) = operands(inst, swapped)?;
            vec![(reg(required_dst(inst)?), compare_to_flag(kind, lhs, rhs))]
        }
        Opcode::Jmp => Vec::new(),
        _ if inst.op.is_conditional_jump() => Vec::new(),
        other => {
            return Err(Error::Unsupported(format!(
                "opcode {other:?} has no Desmos lowering"
            )));
        }
    })
}

/// The expression a jump instruction transfers control to — its `jmp`
/// operand, register or immediate alike. Unlike the Piet backend (whose
/// dispatch is fixed geometry baked in at compile time), Desmos's
/// `changepc` takes an ordinary expression argument, so a register-valued
/// jump target is no harder to lower than a constant one; `None` for
/// opcodes that always fall through.
fn target_expr(inst: &Inst) -> Result<Option<Expr>> {
    match inst.op {
        Opcode::Jmp => Ok(Some(value(required_jmp(inst)?))),
        _ if inst.op.is_conditional_jump() => Ok(Some(value(required_jmp(inst)?))),
        _ => Ok(None),
    }
}

/// A conditional jump's guard, or `None` for opcodes that always fall
/// through / always jump.
fn jump_guard(inst: &Inst) -> Result<Option<Expr>> {
    if !inst.op.is_conditional_jump() {
        return Ok(None);
    }
    let kind = comparison_kind(inst)?;
    let (kind, swapped) = kind.normalize();
    let (lhs, rhs) = operands(inst, swapped)?;
    Ok(Some(compare_bool(kind, lhs, rhs)))
}

fn comparison_kind(inst: &Inst) -> Result<CompareKind> {
    inst.op
        .comparison_kind()
        .ok_or_else(|| Error::Internal(format!("{:?} is not a comparison", inst.op)))
}

/// Group a pc's instructions into touch-disjoint micro-steps: add each
/// instruction's assignments to the current step unless one of its
/// variables is already written there, in which case start a new step.
pub fn plan<'a>(cfg: &DesmosConfig, insts: &[&'a Inst]) -> Result<Vec<Vec<&'a Inst>>> {
    let mut groups: Vec<Vec<&Inst>> = Vec::new();
    let mut current: Vec<&Inst> = Vec::new();
    let mut written: std::collections::HashSet<String> = std::collections::HashSet::new();

    for &inst in insts {
        let vars = lower_assignments(cfg, inst)?;
        let collides = vars.iter().any(|(name, _)| written.contains(name));
        if collides && !current.is_empty() {
            groups.push(std::mem::take(&mut current));
            written.clear();
        }
        for (name, _) in &vars {
            written.insert(name.clone());
        }
        current.push(inst);
    }
    if !current.is_empty() {
        groups.push(current);
    }
    Ok(groups)
}

/// Build every `check(pc,ip)`-gated branch for one pc, given the pc itself,
/// its instructions, and the fallthrough pc (`pc + 1`, unless the group's
/// last instruction is a jump).
pub fn lower_pc(
    cfg: &DesmosConfig,
    pc: u32,
    insts: &[&Inst],
    fallthrough: u32,
) -> Result<Vec<(Vec<Expr>, Expr)>> {
    let groups = plan(cfg, insts)?;
    let last_idx = groups.len().saturating_sub(1);
    let mut branches = Vec::new();

    for (ip, group) in groups.iter().enumerate() {
        let guard = vec![
            Expr::Call(
                symbols::CHECK.to_string(),
                vec![Expr::num(pc as i64), Expr::num(ip as i64)],
            )
            .eq(Expr::num(1)),
        ];

        let mut assignments: Vec<(String, Expr)> = Vec::new();
        for inst in group {
            assignments.extend(lower_assignments(cfg, inst)?);
        }

        if ip != last_idx {
            assignments.push((
                symbols::IP.to_string(),
                Expr::ident(symbols::IP).add(Expr::num(1)),
            ));
            branches.push((guard, Expr::Action(assignments)));
            continue;
        }

        // Last micro-step of this pc: decide where control goes next and
        // fold the two `changepc` writes into this same action.
        let last_inst = group.last().expect("plan never yields an empty group");
        match (target_expr(last_inst)?, jump_guard(last_inst)?) {
            (Some(target), None) => {
                branches.push((guard, with_changepc(assignments, target)));
            }
            (Some(target), Some(cond)) => {
                let taken = with_changepc(assignments.clone(), target);
                let not_taken = with_changepc(assignments, Expr::num(fallthrough as i64));
                let mut taken_guard = guard.clone();
                taken_guard.push(cond);
                branches.push((taken_guard, taken));
                branches.push((guard, not_taken));
            }
            (None, _) => {
                branches.push((guard, with_changepc(assignments, Expr::num(fallthrough as i64))));
            }
        }
    }

    Ok(branches)
}

/// `changepc(p)`, inlined: if the machine's current pc already equals the
/// jump target (a self-loop), only `IP` advances, exactly like a
/// non-pc-changing instruction's `inc_ip`; otherwise `PC` lands at the
/// target with `IP` reset to 0. Spec: "if the current PC already equals p,
/// increment IP... otherwise emit the bundled action (PC←p, IP←0)".
fn with_changepc(mut assignments: Vec<(String, Expr)>, target: Expr) -> Expr {
    let pc_sym = symbols::reg_symbol(Register::Pc).to_string();
    let ip_next = Expr::Piecewise(
        vec![(
            vec![Expr::ident(pc_sym.clone()).eq(target.clone())],
            Expr::ident(symbols::IP).add(Expr::num(1)),
        )],
        Some(Box::new(Expr::num(0))),
    );
    assignments.push((pc_sym, target));
    assignments.push((symbols::IP.to_string(), ip_next));
    Expr::Action(assignments)
}

fn operands(inst: &Inst, swapped: bool) -> Result<(Expr, Expr)> {
    let a = reg_expr(required_dst(inst)?);
    let b = value(required_src(inst)?);
    Ok(if swapped { (b, a) } else { (a, b) })
}

fn compare_to_flag(kind: CompareKind, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Piecewise(
        vec![(vec![compare_bool(kind, lhs, rhs)], Expr::num(1))],
        Some(Box::new(Expr::num(0))),
    )
}

fn compare_bool(kind: CompareKind, lhs: Expr, rhs: Expr) -> Expr {
    match kind {
        CompareKind::Eq => lhs.eq(rhs),
        CompareKind::Ne => Expr::Cmp(super::expr::CmpOp::Ne, Box::new(lhs), Box::new(rhs)),
        CompareKind::Gt => Expr::Cmp(super::expr::CmpOp::Gt, Box::new(lhs), Box::new(rhs)),
        CompareKind::Le => Expr::Cmp(super::expr::CmpOp::Le, Box::new(lhs), Box::new(rhs)),
        CompareKind::Lt | CompareKind::Ge => unreachable!("normalize() rewrites Lt/Ge away"),
    }
}

fn wrap(e: Expr) -> Expr {
    Expr::Call(symbols::WRAP.to_string(), vec![e])
}

fn reg(r: Register) -> String {
    symbols::reg_symbol(r).to_string()
}

fn reg_expr(r: Register) -> Expr {
    Expr::ident(symbols::reg_symbol(r))
}

fn required_dst(inst: &Inst) -> Result<Register> {
    inst.dst
        .ok_or_else(|| Error::Internal(format!("{:?} requires a dst operand", inst.op)))
}

fn required_src(inst: &Inst) -> Result<Value> {
    inst.src
        .ok_or_else(|| Error::Internal(format!("{:?} requires a src operand", inst.op)))
}

fn required_jmp(inst: &Inst) -> Result<Value> {
    inst.jmp
        .ok_or_else(|| Error::Internal(format!("{:?} requires a jmp operand", inst.op)))
}

fn value(v: Value) -> Expr {
    match v {
        Value::Imm(i) => Expr::num(i),
        Value::Reg(r) => reg_expr(r),
    }
}
