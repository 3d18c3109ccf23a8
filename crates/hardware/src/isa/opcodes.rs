//! Opcode table of the simulated instruction set.
//!
//! Twenty-one numbered opcodes: nine ALU operations, seven branches (JAL
//! included), two memory operations, and HALT. Codes 18 and 19 are reserved
//! and decode to no operation.

/// Machine opcodes, numbered as encoded in bits `[31:24]` of the word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// `rd = rs + rt`
    Add = 0,
    /// `rd = rs - rt`
    Sub = 1,
    /// `rd = rs & rt`
    And = 2,
    /// `rd = rs | rt`
    Or = 3,
    /// `rd = rs ^ rt`
    Xor = 4,
    /// `rd = rs * rt`
    Mul = 5,
    /// `rd = rs << rt` (logical)
    Sll = 6,
    /// `rd = rs >> rt` (arithmetic)
    Sra = 7,
    /// `rd = rs >> rt` (logical)
    Srl = 8,
    /// Branch if `rs == rt`.
    Beq = 9,
    /// Branch if `rs != rt`.
    Bne = 10,
    /// Branch if `rs < rt`.
    Blt = 11,
    /// Branch if `rs > rt`.
    Bgt = 12,
    /// Branch if `rs <= rt`.
    Ble = 13,
    /// Branch if `rs >= rt`.
    Bge = 14,
    /// Unconditional jump; the link register receives the stage result.
    Jal = 15,
    /// Load word through the data cache.
    Lw = 16,
    /// Store word through the data cache.
    Sw = 17,
    /// Stop fetching; the core drains and halts.
    Halt = 20,
}

impl Opcode {
    /// Decodes an 8-bit opcode field; reserved and out-of-range codes yield
    /// `None` and flow through the pipeline as inert instructions.
    pub fn from_bits(bits: u8) -> Option<Self> {
        Some(match bits {
            0 => Self::Add,
            1 => Self::Sub,
            2 => Self::And,
            3 => Self::Or,
            4 => Self::Xor,
            5 => Self::Mul,
            6 => Self::Sll,
            7 => Self::Sra,
            8 => Self::Srl,
            9 => Self::Beq,
            10 => Self::Bne,
            11 => Self::Blt,
            12 => Self::Bgt,
            13 => Self::Ble,
            14 => Self::Bge,
            15 => Self::Jal,
            16 => Self::Lw,
            17 => Self::Sw,
            20 => Self::Halt,
            _ => return None,
        })
    }

    /// Returns whether this opcode resolves in the decode stage (BEQ..JAL).
    #[inline]
    pub fn is_branch(self) -> bool {
        matches!(
            self,
            Self::Beq | Self::Bne | Self::Blt | Self::Bgt | Self::Ble | Self::Bge | Self::Jal
        )
    }

    /// Returns whether this opcode accesses the data cache (LW or SW).
    #[inline]
    pub fn is_memory(self) -> bool {
        matches!(self, Self::Lw | Self::Sw)
    }

    /// Returns whether this opcode is a plain ALU operation (ADD..SRL).
    #[inline]
    pub fn is_alu(self) -> bool {
        (self as u8) <= (Self::Srl as u8)
    }
}
