/// One of the seven general-purpose registers of the IR machine.
///
/// `Pc` is a real, addressable register here — both backends read and write
/// it like any other, distinct from the Desmos-only auxiliary micro-IP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Register {
    A = 0,
    B = 1,
    C = 2,
    D = 3,
    Bp = 4,
    Sp = 5,
    Pc = 6,
}

impl Register {
    pub const ALL: [Register; 7] = [
        Register::A,
        Register::B,
        Register::C,
        Register::D,
        Register::Bp,
        Register::Sp,
        Register::Pc,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Register::A => "A",
            Register::B => "B",
            Register::C => "C",
            Register::D => "D",
            Register::Bp => "BP",
            Register::Sp => "SP",
            Register::Pc => "PC",
        }
    }
}

impl From<Register> for u8 {
    fn from(reg: Register) -> u8 {
        reg as u8
    }
}

impl TryFrom<u8> for Register {
    type Error = crate::Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Register::A),
            1 => Ok(Register::B),
            2 => Ok(Register::C),
            3 => Ok(Register::D),
            4 => Ok(Register::Bp),
            5 => Ok(Register::Sp),
            6 => Ok(Register::Pc),
            other => Err(crate::Error::InvalidValue(format!(
                "register index {other} out of range 0..=6"
            ))),
        }
    }
}

impl std::str::FromStr for Register {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "A" => Ok(Register::A),
            "B" => Ok(Register::B),
            "C" => Ok(Register::C),
            "D" => Ok(Register::D),
            "BP" => Ok(Register::Bp),
            "SP" => Ok(Register::Sp),
            "PC" => Ok(Register::Pc),
            other => Err(crate::Error::InvalidValue(format!(
                "'{other}' is not a register name"
            ))),
        }
    }
}
