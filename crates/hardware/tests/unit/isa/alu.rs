//! ALU and branch-comparison semantics tests.

use mcsim_core::isa::Opcode;
use mcsim_core::isa::alu::{branch_taken, execute};
use rstest::rstest;

#[rstest]
#[case(Opcode::Add, 3, 4, 7)]
#[case(Opcode::Add, u32::MAX, 1, 0)] // wraps
#[case(Opcode::Sub, 3, 5, u32::MAX - 1)]
#[case(Opcode::And, 0xF0F0, 0xFF00, 0xF000)]
#[case(Opcode::Or, 0xF0F0, 0x0F00, 0xFFF0)]
#[case(Opcode::Xor, 0xFF00, 0x0FF0, 0xF0F0)]
#[case(Opcode::Mul, 0x10000, 0x10000, 0)] // wraps
#[case(Opcode::Sll, 1, 4, 0x10)]
#[case(Opcode::Srl, 0x8000_0000, 4, 0x0800_0000)]
#[case(Opcode::Sra, 0x8000_0000, 4, 0xF800_0000)] // sign-fills
fn alu_results(#[case] op: Opcode, #[case] rs: u32, #[case] rt: u32, #[case] expected: u32) {
    assert_eq!(execute(op, rs, rt), expected);
}

#[rstest]
#[case(Opcode::Beq, 5, 5, true)]
#[case(Opcode::Beq, 5, 6, false)]
#[case(Opcode::Bne, 5, 6, true)]
#[case(Opcode::Bne, 5, 5, false)]
#[case(Opcode::Blt, 4, 5, true)]
#[case(Opcode::Blt, 5, 4, false)]
#[case(Opcode::Bgt, 5, 4, true)]
#[case(Opcode::Ble, 5, 5, true)]
#[case(Opcode::Bge, 4, 5, false)]
#[case(Opcode::Jal, 0, 0, true)]
fn branch_conditions(#[case] op: Opcode, #[case] rs: u32, #[case] rt: u32, #[case] taken: bool) {
    assert_eq!(branch_taken(op, rs, rt), taken);
}

/// Comparisons are unsigned: -1 as a register value is the largest word.
#[test]
fn comparisons_are_unsigned() {
    assert!(!branch_taken(Opcode::Blt, 0xFFFF_FFFF, 1));
    assert!(branch_taken(Opcode::Bgt, 0xFFFF_FFFF, 1));
}

#[test]
fn non_branch_opcodes_are_never_taken() {
    assert!(!branch_taken(Opcode::Add, 1, 1));
    assert!(!branch_taken(Opcode::Lw, 0, 0));
}
