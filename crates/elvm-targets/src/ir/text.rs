//! A minimal line-oriented IR text format, just enough to build `Module`
//! values from a file for the CLI and test fixtures. This is not a general
//! ELVM assembler — no labels, no macros, no relocations.
//!
//! ```text
//! .data
//! 72
//! 0
//!
//! .text
//! 0: MOV A, 72
//! 1: PUTC A
//! 2: EXIT
//! ```

use crate::{Error, Result};

use super::{Inst, Module, Opcode, Register, Value};

enum Section {
    None,
    Data,
    Text,
}

/// Parse the text format described above into a [`Module`].
pub fn parse(source: &str) -> Result<Module> {
    let mut data = Vec::new();
    let mut text = Vec::new();
    let mut section = Section::None;

    for (line_no, raw_line) in source.lines().enumerate() {
        let line_no = line_no + 1;
        let line = strip_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        match line {
            ".data" => {
                section = Section::Data;
                continue;
            }
            ".text" => {
                section = Section::Text;
                continue;
            }
            _ => {}
        }

        match section {
            Section::None => {
                return Err(Error::ParseError {
                    line: line_no,
                    message: "expected a .data or .text section header first".to_string(),
                });
            }
            Section::Data => {
                let value = parse_int(line).map_err(|message| Error::ParseError {
                    line: line_no,
                    message,
                })?;
                data.push(value);
            }
            Section::Text => {
                let inst = parse_inst_line(line).map_err(|message| Error::ParseError {
                    line: line_no,
                    message,
                })?;
                text.push(inst);
            }
        }
    }

    Ok(Module::new(data, text))
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

fn parse_inst_line(line: &str) -> std::result::Result<Inst, String> {
    let (pc_str, rest) = line
        .split_once(':')
        .ok_or_else(|| format!("expected '<pc>: OPCODE ...', got '{line}'"))?;
    let pc: u32 = pc_str
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a valid pc", pc_str.trim()))?;

    let rest = rest.trim();
    let (op_str, operand_str) = match rest.split_once(char::is_whitespace) {
        Some((op, operands)) => (op, operands.trim()),
        None => (rest, ""),
    };

    let operands: Vec<&str> = if operand_str.is_empty() {
        Vec::new()
    } else {
        operand_str.split(',').map(str::trim).collect()
    };

    let op = parse_opcode(op_str)?;
    build_inst(op, pc, &operands)
}

fn parse_opcode(s: &str) -> std::result::Result<Opcode, String> {
    Ok(match s.to_ascii_uppercase().as_str() {
        "MOV" => Opcode::Mov,
        "ADD" => Opcode::Add,
        "SUB" => Opcode::Sub,
        "LOAD" => Opcode::Load,
        "STORE" => Opcode::Store,
        "PUTC" => Opcode::Putc,
        "GETC" => Opcode::Getc,
        "EXIT" => Opcode::Exit,
        "DUMP" => Opcode::Dump,
        "EQ" => Opcode::Eq,
        "NE" => Opcode::Ne,
        "LT" => Opcode::Lt,
        "GT" => Opcode::Gt,
        "LE" => Opcode::Le,
        "GE" => Opcode::Ge,
        "JEQ" => Opcode::Jeq,
        "JNE" => Opcode::Jne,
        "JLT" => Opcode::Jlt,
        "JGT" => Opcode::Jgt,
        "JLE" => Opcode::Jle,
        "JGE" => Opcode::Jge,
        "JMP" => Opcode::Jmp,
        other => return Err(format!("unknown opcode '{other}'")),
    })
}

fn build_inst(op: Opcode, pc: u32, operands: &[&str]) -> std::result::Result<Inst, String> {
    let mut inst = Inst::new(op, pc);

    match op {
        Opcode::Exit | Opcode::Dump => expect_arity(operands, 0)?,

        Opcode::Putc => {
            expect_arity(operands, 1)?;
            inst = inst.with_src(parse_value(operands[0])?);
        }

        Opcode::Getc => {
            expect_arity(operands, 1)?;
            inst = inst.with_dst(parse_register(operands[0])?);
        }

        Opcode::Jmp => {
            expect_arity(operands, 1)?;
            inst = inst.with_jmp(parse_value(operands[0])?);
        }

        Opcode::Mov
        | Opcode::Add
        | Opcode::Sub
        | Opcode::Load
        | Opcode::Store
        | Opcode::Eq
        | Opcode::Ne
        | Opcode::Lt
        | Opcode::Gt
        | Opcode::Le
        | Opcode::Ge => {
            expect_arity(operands, 2)?;
            inst = inst
                .with_dst(parse_register(operands[0])?)
                .with_src(parse_value(operands[1])?);
        }

        Opcode::Jeq | Opcode::Jne | Opcode::Jlt | Opcode::Jgt | Opcode::Jle | Opcode::Jge => {
            expect_arity(operands, 3)?;
            inst = inst
                .with_dst(parse_register(operands[0])?)
                .with_src(parse_value(operands[1])?)
                .with_jmp(parse_value(operands[2])?);
        }
    }

    Ok(inst)
}

fn expect_arity(operands: &[&str], n: usize) -> std::result::Result<(), String> {
    if operands.len() == n {
        Ok(())
    } else {
        Err(format!(
            "expected {n} operand(s), got {}: {:?}",
            operands.len(),
            operands
        ))
    }
}

fn parse_register(s: &str) -> std::result::Result<Register, String> {
    s.parse::<Register>().map_err(|e| e.to_string())
}

fn parse_value(s: &str) -> std::result::Result<Value, String> {
    if let Ok(reg) = s.parse::<Register>() {
        return Ok(Value::Reg(reg));
    }
    parse_int(s).map(Value::Imm)
}

fn parse_int(s: &str) -> std::result::Result<i64, String> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).map_err(|e| e.to_string())
    } else {
        s.parse::<i64>().map_err(|e| e.to_string())
    }
}
