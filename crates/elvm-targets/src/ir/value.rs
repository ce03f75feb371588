use super::Register;

/// An operand: either one of the seven registers or a plain immediate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    Reg(Register),
    Imm(i64),
}

impl Value {
    #[must_use]
    pub fn is_reg(self) -> bool {
        matches!(self, Value::Reg(_))
    }

    #[must_use]
    pub fn as_reg(self) -> Option<Register> {
        match self {
            Value::Reg(r) => Some(r),
            Value::Imm(_) => None,
        }
    }

    #[must_use]
    pub fn as_imm(self) -> Option<i64> {
        match self {
            Value::Imm(v) => Some(v),
            Value::Reg(_) => None,
        }
    }
}

impl From<Register> for Value {
    fn from(reg: Register) -> Self {
        Value::Reg(reg)
    }
}

impl From<i64> for Value {
    fn from(imm: i64) -> Self {
        Value::Imm(imm)
    }
}
