//! ALU and branch-comparison semantics.
//!
//! Pure functions over register values; the pipeline routes operands in and
//! results out. Comparisons are unsigned, matching the modeled hardware.

use crate::isa::opcodes::Opcode;

/// Computes the result of an ALU opcode over `rs` and `rt`.
///
/// Shifts use the full `rt` value; arithmetic wraps. Non-ALU opcodes return
/// `rs` unchanged, but the pipeline never routes them here.
pub fn execute(op: Opcode, rs: u32, rt: u32) -> u32 {
    match op {
        Opcode::Add => rs.wrapping_add(rt),
        Opcode::Sub => rs.wrapping_sub(rt),
        Opcode::And => rs & rt,
        Opcode::Or => rs | rt,
        Opcode::Xor => rs ^ rt,
        Opcode::Mul => rs.wrapping_mul(rt),
        Opcode::Sll => rs.wrapping_shl(rt),
        Opcode::Sra => ((rs as i32).wrapping_shr(rt)) as u32,
        Opcode::Srl => rs.wrapping_shr(rt),
        _ => rs,
    }
}

/// Evaluates a branch condition over `rs` and `rt`.
///
/// JAL is unconditionally taken. Non-branch opcodes are never taken.
pub fn branch_taken(op: Opcode, rs: u32, rt: u32) -> bool {
    match op {
        Opcode::Beq => rs == rt,
        Opcode::Bne => rs != rt,
        Opcode::Blt => rs < rt,
        Opcode::Bgt => rs > rt,
        Opcode::Ble => rs <= rt,
        Opcode::Bge => rs >= rt,
        Opcode::Jal => true,
        _ => false,
    }
}
