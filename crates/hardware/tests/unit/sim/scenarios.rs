//! End-to-end simulation scenarios.
//!
//! Whole programs run through the real machine; assertions cover trace and
//! dump file contents, the stats counters (including their deliberate
//! off-by-one emission), and cross-core coherence outcomes.

use mcsim_core::common::CacheAddr;
use mcsim_core::core::cache::MesiState;
use mcsim_core::isa::Opcode;
use pretty_assertions::assert_eq;

use crate::common::asm::{encode, halt, load_imm, lw, nop, sw};
use crate::common::harness::{FileRun, boot, check_coherence_invariants, run_to_halt};

/// Runs in memory, checking the coherence invariants after every cycle.
fn run_checked(programs: [Vec<u32>; 4], mem: Vec<u32>) -> mcsim_core::Simulator {
    let mut sim = boot(programs, mem);
    let mut cycles = 0;
    while !sim.halted() {
        sim.tick().expect("tick");
        check_coherence_invariants(&sim);
        cycles += 1;
        assert!(cycles < 200_000, "simulation did not halt");
    }
    sim
}

// ══════════════════════════════════════════════════════════
// 1. Single-core drain: trace layout and stats off-by-one
// ══════════════════════════════════════════════════════════

#[test]
fn single_core_add_drains_in_six_cycles() {
    let program = [load_imm(2, 1), halt()];
    let run = FileRun::run([&program, &[], &[], &[]], &[]);

    let zeros14 = "00000000 ".repeat(14);
    let mut tail13 = String::from("00000001 ");
    tail13.push_str(&"00000000 ".repeat(13));
    let expected = [
        format!("0 000 --- --- --- --- {zeros14}"),
        format!("1 001 000 --- --- --- {zeros14}"),
        format!("2 002 001 000 --- --- {zeros14}"),
        format!("3 --- --- 001 000 --- {zeros14}"),
        format!("4 --- --- --- 001 000 {zeros14}"),
        format!("5 --- --- --- --- 001 {tail13}"),
    ];
    assert_eq!(run.lines(&run.paths.trace[0]), expected);

    assert_eq!(
        run.read(&run.paths.stats[0]),
        "cycles 6\ninstructions 2\nread_hit 0\nwrite_hit 0\nread_miss 0\n\
         write_miss 0\ndecode_stall 0\nmem_stall 0\n"
    );

    // R2 holds 1; everything else is untouched.
    let mut regout = vec!["00000001".to_owned()];
    regout.extend(std::iter::repeat_n("00000000".to_owned(), 13));
    assert_eq!(run.lines(&run.paths.regout[0]), regout);

    // Nothing touched memory.
    assert_eq!(run.read(&run.paths.memout), "");
    assert_eq!(run.read(&run.paths.bustrace), "");
}

#[test]
fn core_with_no_instructions_starts_halted() {
    let run = FileRun::run([&[halt()], &[], &[], &[]], &[]);

    assert_eq!(run.read(&run.paths.trace[1]), "", "never stepped");
    assert_eq!(
        run.read(&run.paths.stats[1]),
        "cycles 0\ninstructions -1\nread_hit 0\nwrite_hit 0\nread_miss 0\n\
         write_miss 0\ndecode_stall 0\nmem_stall 0\n"
    );
}

// ══════════════════════════════════════════════════════════
// 2. Load-use hazard
// ══════════════════════════════════════════════════════════

#[test]
fn load_use_hazard_stalls_decode() {
    let program = [lw(2, 0, 1, 0x100), encode(Opcode::Add, 3, 2, 1, 1), halt()];
    let mut mem = vec![0u32; 0x101];
    mem[0x100] = 0x42;
    let run = FileRun::run([&program, &[], &[], &[]], &mem);

    let regout = run.lines(&run.paths.regout[0]);
    assert_eq!(regout[0], "00000042", "R2 holds the loaded word");
    assert_eq!(regout[1], "00000043", "R3 = R2 + 1");

    assert_eq!(
        run.read(&run.paths.stats[0]),
        "cycles 31\ninstructions 3\nread_hit 0\nwrite_hit 0\nread_miss 1\n\
         write_miss 0\ndecode_stall 3\nmem_stall 21\n"
    );

    // One transaction: start line plus four served words.
    let bus = run.lines(&run.paths.bustrace);
    assert_eq!(bus.len(), 5);
    assert_eq!(bus[0], "5 0 1 00100 00000000 0");
    assert_eq!(bus[1], "21 4 3 00100 00000042 0");
}

// ══════════════════════════════════════════════════════════
// 3. Two-core sharing
// ══════════════════════════════════════════════════════════

#[test]
fn written_block_is_shared_with_a_later_reader() {
    let writer = vec![load_imm(2, 0xAA), sw(2, 0, 1, 0x40), halt()];
    let mut reader = vec![nop(); 44];
    reader.push(lw(3, 0, 1, 0x40));
    reader.push(halt());

    let sim = run_checked([writer, reader, vec![], vec![]], vec![]);

    let index = CacheAddr::new(0x40).index();
    assert_eq!(sim.cache(0).line(index).mesi, MesiState::Shared, "writer downgraded");
    assert_eq!(sim.cache(1).line(index).mesi, MesiState::Shared, "reader filled shared");
    assert_eq!(sim.cache(0).word(0x40), 0xAA);
    assert_eq!(sim.cache(1).word(0x40), 0xAA);
    assert_eq!(sim.core(1).regs().read(3), 0xAA, "reader observed the write");
    assert_eq!(
        sim.memory().word(CacheAddr::new(0x40)),
        0xAA,
        "cache-to-cache transfer wrote memory back"
    );
}

// ══════════════════════════════════════════════════════════
// 4. Invalidation race
// ══════════════════════════════════════════════════════════

#[test]
fn store_invalidates_the_other_sharer() {
    let mut writer = vec![lw(2, 0, 1, 0x80)];
    writer.extend(std::iter::repeat_n(nop(), 60));
    writer.push(sw(2, 0, 1, 0x80));
    writer.push(halt());

    let mut reader = vec![nop(); 25];
    reader.push(lw(3, 0, 1, 0x80));
    reader.push(halt());

    let mut mem = vec![0u32; 0x81];
    mem[0x80] = 0x1234;
    let sim = run_checked([writer, reader, vec![], vec![]], mem);

    let index = CacheAddr::new(0x80).index();
    assert_eq!(sim.core(1).regs().read(3), 0x1234, "reader cached the block");
    assert_eq!(sim.cache(0).line(index).mesi, MesiState::Modified);
    assert_eq!(sim.cache(1).line(index).mesi, MesiState::Invalid, "sharer invalidated");
    assert_eq!(sim.core(0).regs().read(2), 0x1234);
}

// ══════════════════════════════════════════════════════════
// 5. Dirty eviction
// ══════════════════════════════════════════════════════════

#[test]
fn conflicting_store_evicts_the_dirty_block_first() {
    let program = [
        load_imm(2, 0xAA),
        sw(2, 0, 1, 0x40),
        load_imm(3, 0xBB),
        sw(3, 0, 1, 0x440),
        halt(),
    ];
    let run = FileRun::run([&program, &[], &[], &[]], &[]);

    // The victim write-back precedes the replacement fill on the bus.
    let bus = run.read(&run.paths.bustrace);
    let flush = bus.find(" 0 3 00040 ").expect("victim flush traced");
    let fill = bus.find(" 0 2 00440 ").expect("replacement request traced");
    assert!(flush < fill, "flush of line A before RdX of line A'");

    // The flushed value reached memory; the new block never did.
    let memout = run.lines(&run.paths.memout);
    assert_eq!(memout.len(), 0x41);
    assert_eq!(memout[0x40], "000000AA");

    // The cache now owns the colliding block, dirty.
    assert_eq!(run.lines(&run.paths.tsram[0])[0x10], "00003004");
    assert_eq!(run.lines(&run.paths.dsram[0])[0x40], "000000BB");
}

// ══════════════════════════════════════════════════════════
// 6. Branch resolution in decode
// ══════════════════════════════════════════════════════════

#[test]
fn taken_branch_redirects_fetch_without_squashing() {
    let program = [
        // Branch target comes through R1: rd = R1 = imm = 5.
        encode(Opcode::Beq, 1, 0, 0, 5),
        load_imm(2, 0x11),
        load_imm(3, 0x22),
        nop(),
        nop(),
        load_imm(4, 0x33),
        halt(),
    ];
    let sim = run_checked([program.to_vec(), vec![], vec![], vec![]], vec![]);

    let regs = sim.core(0).regs();
    assert_eq!(regs.read(4), 0x33, "target path executed");
    assert_eq!(regs.read(3), 0, "skipped instruction never fetched");
    // The instruction fetched alongside the branch is not squashed.
    assert_eq!(regs.read(2), 0x11, "in-flight wrong-path instruction completed");
}

#[test]
fn jal_writes_the_target_into_the_link_register() {
    let mut program = vec![encode(Opcode::Jal, 1, 0, 0, 7)];
    program.extend(std::iter::repeat_n(nop(), 6));
    program.push(halt());
    let mut sim = boot([program, vec![], vec![], vec![]], vec![]);
    run_to_halt(&mut sim);

    assert_eq!(sim.core(0).regs().read(15), 7);
}

// ══════════════════════════════════════════════════════════
// Round-trip within one core
// ══════════════════════════════════════════════════════════

#[test]
fn store_then_load_round_trips() {
    let program = [
        load_imm(2, 0x5A5),
        sw(2, 0, 1, 0x204),
        lw(3, 0, 1, 0x204),
        halt(),
    ];
    let sim = run_checked([program.to_vec(), vec![], vec![], vec![]], vec![]);
    assert_eq!(sim.core(0).regs().read(3), 0x5A5);
}
