//! Read-after-write hazard detection.
//!
//! The decode stage stalls while any in-flight instruction's destination
//! register aliases a source of the instruction being decoded. There is no
//! forwarding network; the producer must reach write-back first.
//!
//! Classification matches the modeled hardware: plain ALU opcodes and LW read
//! rs/rt; everything else is assumed to read rd as well. The opcode fields
//! are compared numerically, so reserved encodings take the conservative
//! (rd-included) path. The decode slot's bubble status is deliberately not
//! checked; a stale decode record can keep the stall wire asserted, exactly
//! as the hardware's comparators would.

use crate::common::constants::{IMM_REG, PIPE_DEPTH, ZERO_REG};
use crate::core::pipeline::latches::{Stage, StageSlot};
use crate::isa::Opcode;

/// Returns whether the instruction in decode must stall this cycle.
pub fn data_hazard(slots: &[StageSlot; PIPE_DEPTH]) -> bool {
    hazard_against(slots, Stage::Execute)
        || hazard_against(slots, Stage::Mem)
        || hazard_against(slots, Stage::WriteBack)
}

fn hazard_against(slots: &[StageSlot; PIPE_DEPTH], producer: Stage) -> bool {
    let slot = &slots[producer as usize];
    if slot.is_bubble() {
        return false;
    }

    let reg = slot.inst.rd();
    if reg == IMM_REG || reg == ZERO_REG {
        return false;
    }

    let decode = slots[Stage::Decode as usize].inst;
    let decode_op = decode.opcode_bits();
    let wb_op = slots[Stage::WriteBack as usize].inst.opcode_bits();

    let reads_sources_only = decode_op <= Opcode::Srl as u8
        || decode_op == Opcode::Lw as u8
        || (decode_op == Opcode::Sw as u8 && wb_op == Opcode::Sw as u8);

    if reads_sources_only {
        reg == decode.rs() || reg == decode.rt()
    } else {
        reg == decode.rd() || reg == decode.rs() || reg == decode.rt()
    }
}
