//! Bus arbiter tests.
//!
//! These drive the real caches and main memory through `Bus::tick`, with the
//! memory latency collapsed to zero so a block transfer takes exactly the
//! four data cycles.

use mcsim_core::common::CacheAddr;
use mcsim_core::common::constants::NUM_CORES;
use mcsim_core::config::MemoryConfig;
use mcsim_core::core::cache::{Cache, MesiState};
use mcsim_core::soc::interconnect::{Bus, BusCmd, Transaction};
use mcsim_core::soc::memory::MainMemory;
use pretty_assertions::assert_eq;

fn rig(image: Vec<u32>) -> (Bus, [Cache; NUM_CORES], MainMemory) {
    let memory = MainMemory::new(&MemoryConfig { latency_cycles: 0 }, image);
    (Bus::new(), std::array::from_fn(Cache::new), memory)
}

fn tick(bus: &mut Bus, caches: &mut [Cache; NUM_CORES], mem: &mut MainMemory, trace: &mut Vec<u8>) {
    bus.tick(caches, mem, trace).expect("trace write");
}

#[test]
fn enqueue_moves_the_caller_to_wait() {
    let mut bus = Bus::new();
    assert!(!bus.in_transaction(1));

    bus.enqueue(Transaction::request(1, BusCmd::BusRd, CacheAddr::new(0x100)));
    assert!(bus.in_transaction(1));
    assert!(bus.awaiting(1));
}

#[test]
fn idle_bus_only_counts_iterations() {
    let (mut bus, mut caches, mut mem) = rig(vec![]);
    let mut trace = Vec::new();
    for _ in 0..3 {
        tick(&mut bus, &mut caches, &mut mem, &mut trace);
    }
    assert_eq!(bus.iteration(), 3);
    assert!(trace.is_empty(), "no transactions, no trace lines");
}

#[test]
fn read_transfer_traces_start_and_each_data_cycle() {
    let mut image = vec![0; 0x104];
    image[0x100] = 0xAAAA_0000;
    image[0x101] = 0xAAAA_0001;
    image[0x102] = 0xAAAA_0002;
    image[0x103] = 0xAAAA_0003;
    let (mut bus, mut caches, mut mem) = rig(image);
    let mut trace = Vec::new();

    // The request carries the originally requested word, offset 1.
    bus.enqueue(Transaction::request(0, BusCmd::BusRd, CacheAddr::new(0x101)));
    for _ in 0..4 {
        tick(&mut bus, &mut caches, &mut mem, &mut trace);
    }

    let text = String::from_utf8(trace).expect("utf8");
    assert_eq!(
        text,
        "1 0 1 00101 00000000 0\n\
         1 4 3 00100 AAAA0000 0\n\
         2 4 3 00101 AAAA0001 0\n\
         3 4 3 00102 AAAA0002 0\n\
         4 4 3 00103 AAAA0003 0\n"
    );
}

#[test]
fn completed_transfer_fills_the_requester_and_releases_it() {
    let (mut bus, mut caches, mut mem) = rig(vec![0x11, 0x22, 0x33, 0x44]);
    let mut trace = Vec::new();

    bus.enqueue(Transaction::request(0, BusCmd::BusRd, CacheAddr::new(0x2)));
    for _ in 0..4 {
        tick(&mut bus, &mut caches, &mut mem, &mut trace);
        assert!(bus.in_transaction(0));
    }
    // The release tick moves the requester back to idle.
    tick(&mut bus, &mut caches, &mut mem, &mut trace);
    assert!(!bus.in_transaction(0));

    let line = caches[0].line(0);
    assert_eq!(line.mesi, MesiState::Exclusive, "no sharer, fill is exclusive");
    assert_eq!(line.tag, 0);
    assert_eq!(
        [0, 1, 2, 3].map(|i| caches[0].word(i)),
        [0x11, 0x22, 0x33, 0x44]
    );
}

#[test]
fn transactions_serialize_in_fifo_order() {
    let (mut bus, mut caches, mut mem) = rig(vec![0; 0x500]);
    let mut trace = Vec::new();

    bus.enqueue(Transaction::request(2, BusCmd::BusRd, CacheAddr::new(0x200)));
    bus.enqueue(Transaction::request(1, BusCmd::BusRdX, CacheAddr::new(0x400)));

    for _ in 0..12 {
        tick(&mut bus, &mut caches, &mut mem, &mut trace);
    }

    let text = String::from_utf8(trace).expect("utf8");
    let starts: Vec<&str> = text
        .lines()
        .filter(|l| l.split_whitespace().nth(2) != Some("3"))
        .collect();
    assert_eq!(starts, ["1 2 1 00200 00000000 0", "5 1 2 00400 00000000 0"]);
}

#[test]
fn delay_slot_burns_one_cycle_without_tracing() {
    let (mut bus, mut caches, mut mem) = rig(vec![0; 0x200]);
    let mut trace = Vec::new();

    bus.enqueue(Transaction::delay());
    bus.enqueue(Transaction::request(0, BusCmd::BusRd, CacheAddr::new(0x100)));

    tick(&mut bus, &mut caches, &mut mem, &mut trace);
    assert!(trace.is_empty(), "delay slot is not traced");
    assert!(bus.awaiting(0), "request is still queued behind the delay");

    tick(&mut bus, &mut caches, &mut mem, &mut trace);
    let text = String::from_utf8(trace).expect("utf8");
    assert!(
        text.starts_with("2 0 1 00100"),
        "request starts on the cycle after the delay: {text}"
    );
}
