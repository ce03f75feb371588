//! Desmos variable/function symbol names.
//!
//! Desmos reads adjacent letters as implicit multiplication, so any
//! multi-letter name (`append`, `getc`, ...) has to be written as one base
//! letter plus the remaining letters in a subscript — e.g. `append` becomes
//! `a_{ppend}`, which Desmos treats as a single identifier that happens to
//! *display* as "append". Single registers keep a bare lowercase letter;
//! two-letter registers (`BP`, `SP`, `PC`) get the same subscript treatment.

use crate::ir::Register;

#[must_use]
pub fn reg_symbol(reg: Register) -> &'static str {
    match reg {
        Register::A => "a",
        Register::B => "b",
        Register::C => "c",
        Register::D => "d",
        Register::Bp => "b_{p}",
        Register::Sp => "s_{p}",
        Register::Pc => "p_{c}",
    }
}

pub const RUNNING: &str = "r";
pub const STDOUT: &str = "o_{ut}";
pub const STDIN: &str = "i_{n}";
pub const IP: &str = "i_{p}";

#[must_use]
pub fn mem_symbol(chunk: usize) -> String {
    format!("m_{{{chunk}}}")
}

pub const APPEND: &str = "a_{ppend}";
pub const POP: &str = "p_{op}";
pub const WRAP: &str = "w_{rap}";
pub const GETC: &str = "g_{etc}";
pub const CHECK: &str = "c_{heck}";
pub const CHANGEPC: &str = "c_{hangepc}";
pub const LOAD: &str = "l_{oad}";
pub const STORE: &str = "s_{tore}";
pub const STORE_CHUNK: &str = "s_{c}";
/// The ticker entry point. Kept as a bare `u` (no subscript) to match the
/// fixed `"u\\left(\\right)"` ticker handler literal.
pub const UPDATE: &str = "u";

#[must_use]
pub fn chunk_fn_symbol(chunk: usize) -> String {
    format!("f_{{{chunk}}}")
}
