//! Per-core data cache with MESI snooping.
//!
//! Direct-mapped, 256 words in 64 blocks of 4 words, write-back and
//! write-allocate. Two SRAMs back each cache: the DSRAM holds data words and
//! the TSRAM holds one `{tag, mesi}` line per block. The CPU side services
//! the pipeline's MEM stage; the bus side implements [`BusAgent`] so the
//! arbiter can probe, snoop, and deliver fills every cycle.

use std::io::{self, Write};

use crate::common::CacheAddr;
use crate::common::constants::{BLOCK_WORDS, CACHE_WORDS, NUM_BLOCKS};
use crate::soc::interconnect::{Bus, BusCmd, Originator, Transaction};
use crate::soc::traits::{BusAgent, LineProbe};
use crate::stats::CacheStats;

/// MESI coherence states, numbered as encoded in TSRAM dumps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum MesiState {
    /// The line holds no valid block.
    #[default]
    Invalid = 0,
    /// The block is valid and may be cached elsewhere; memory is current.
    Shared = 1,
    /// The block is valid only here; memory is current.
    Exclusive = 2,
    /// The block is valid only here and dirtier than memory.
    Modified = 3,
}

/// One TSRAM line: the tag of the resident block and its MESI state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TsramLine {
    /// Tag of the resident block.
    pub tag: u16,
    /// Coherence state of the resident block.
    pub mesi: MesiState,
}

impl TsramLine {
    /// Returns whether this line holds a valid block with the given tag.
    #[inline]
    fn matches(self, tag: u16) -> bool {
        self.tag == tag && self.mesi != MesiState::Invalid
    }
}

/// The data cache of one core.
pub struct Cache {
    id: usize,
    tsram: [TsramLine; NUM_BLOCKS],
    dsram: [u32; CACHE_WORDS],
    stats: CacheStats,
    // A hit that completes an outstanding miss is the fill, not a new hit;
    // one sticky flag per request kind keeps the accounting straight.
    read_fill_pending: bool,
    write_fill_pending: bool,
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("id", &self.id)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl Cache {
    /// Creates an empty cache (all lines Invalid, tag zero) for core `id`.
    pub fn new(id: usize) -> Self {
        Self {
            id,
            tsram: [TsramLine::default(); NUM_BLOCKS],
            dsram: [0; CACHE_WORDS],
            stats: CacheStats::default(),
            read_fill_pending: false,
            write_fill_pending: false,
        }
    }

    /// Hit/miss counters accumulated so far.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// TSRAM line currently at `index` (tests and dumps).
    pub fn line(&self, index: usize) -> TsramLine {
        self.tsram[index]
    }

    /// DSRAM word at the given word index (tests and dumps).
    pub fn word(&self, dsram_index: usize) -> u32 {
        self.dsram[dsram_index]
    }

    /// Services a CPU read of `addr`.
    ///
    /// Returns the word on a hit. On a miss, enqueues the coherence traffic
    /// (write-back of a dirty victim, then `BusRd`) and returns `None`; the
    /// pipeline retries until the fill lands. A cache whose request is still
    /// in flight refuses service outright.
    pub fn read(&mut self, addr: u32, bus: &mut Bus) -> Option<u32> {
        if self.busy(bus) {
            return None;
        }

        let addr = CacheAddr::new(addr);
        if self.tsram[addr.index()].matches(addr.tag()) {
            if self.read_fill_pending {
                self.read_fill_pending = false;
            } else {
                self.stats.read_hits += 1;
            }
            return Some(self.dsram[addr.dsram_index()]);
        }

        self.stats.read_misses += 1;
        self.read_fill_pending = true;
        self.evict_if_dirty(addr, bus);
        bus.enqueue(Transaction::request(self.id, BusCmd::BusRd, addr));
        None
    }

    /// Services a CPU write of `data` to `addr`.
    ///
    /// A hit in Modified or Exclusive commits immediately and leaves the line
    /// Modified. A hit in Shared upgrades through `BusRdX` (followed by a
    /// delay slot separating the invalidation from ownership) and counts as a
    /// write miss. Returns whether the write committed this cycle.
    pub fn write(&mut self, addr: u32, data: u32, bus: &mut Bus) -> bool {
        if self.busy(bus) {
            return false;
        }

        let addr = CacheAddr::new(addr);
        let index = addr.index();
        if self.tsram[index].matches(addr.tag()) {
            if self.tsram[index].mesi == MesiState::Shared {
                bus.enqueue(Transaction::request(self.id, BusCmd::BusRdX, addr));
                bus.enqueue(Transaction::delay());
                self.stats.write_misses += 1;
                self.write_fill_pending = true;
                return false;
            }
            if self.write_fill_pending {
                self.write_fill_pending = false;
            } else {
                self.stats.write_hits += 1;
            }
            self.dsram[addr.dsram_index()] = data;
            self.tsram[index].mesi = MesiState::Modified;
            return true;
        }

        self.stats.write_misses += 1;
        self.write_fill_pending = true;
        self.evict_if_dirty(addr, bus);
        bus.enqueue(Transaction::request(self.id, BusCmd::BusRdX, addr));
        false
    }

    /// Writes the TSRAM image (`mesi << 12 | tag` per line) and the DSRAM
    /// image, one 8-digit hex word per line each.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from either writer.
    pub fn dump(&self, dsram_out: &mut dyn Write, tsram_out: &mut dyn Write) -> io::Result<()> {
        for line in &self.tsram {
            writeln!(
                tsram_out,
                "{:08X}",
                (u32::from(line.mesi as u8) << 12) | u32::from(line.tag)
            )?;
        }
        for word in &self.dsram {
            writeln!(dsram_out, "{word:08X}")?;
        }
        Ok(())
    }

    fn busy(&self, bus: &Bus) -> bool {
        bus.in_transaction(self.id) || bus.awaiting(self.id)
    }

    /// Enqueues a write-back for the victim before a miss replaces it.
    ///
    /// The eviction address is rebuilt from the victim's tag; the riding data
    /// word is taken at the requested offset, and the actual per-cycle words
    /// are supplied by this cache's own snoop during the transfer.
    fn evict_if_dirty(&mut self, addr: CacheAddr, bus: &mut Bus) {
        let index = addr.index();
        if self.tsram[index].mesi == MesiState::Modified {
            let victim = CacheAddr::from_parts(self.tsram[index].tag, index);
            let word = self.dsram[addr.dsram_index()];
            bus.enqueue(Transaction::flush(self.id, victim, word));
        }
    }

    /// Next MESI state for a snooped transaction, per the snooping-side
    /// transition table. A Modified line answers by rewriting the in-flight
    /// transaction into a Flush carrying its own word for this cycle.
    fn transition(&self, state: MesiState, txn: &mut Transaction) -> MesiState {
        match (state, txn.cmd) {
            (MesiState::Shared, BusCmd::BusRdX) => MesiState::Invalid,
            (MesiState::Exclusive, BusCmd::BusRd) => MesiState::Shared,
            (MesiState::Exclusive, BusCmd::BusRdX) => MesiState::Invalid,
            (MesiState::Modified, BusCmd::BusRd) => {
                self.supply(txn);
                MesiState::Shared
            }
            (MesiState::Modified, BusCmd::BusRdX) => {
                self.supply(txn);
                MesiState::Invalid
            }
            (MesiState::Modified, BusCmd::Flush) => {
                self.supply(txn);
                MesiState::Modified
            }
            (state, _) => state,
        }
    }

    /// Takes over the transfer as the data supplier for this cycle.
    fn supply(&self, txn: &mut Transaction) {
        let addr = CacheAddr::new(txn.addr);
        txn.data = self.dsram[addr.dsram_index()];
        txn.cmd = BusCmd::Flush;
        txn.origid = Originator::Core(self.id);
    }
}

impl BusAgent for Cache {
    fn probe(&self, txn: &Transaction) -> LineProbe {
        if txn.origid == Originator::Core(self.id) {
            return LineProbe::default();
        }
        let addr = CacheAddr::new(txn.addr);
        let line = self.tsram[addr.index()];
        LineProbe {
            shared: line.matches(addr.tag()),
            modified: line.mesi == MesiState::Modified,
        }
    }

    fn snoop(&mut self, txn: &mut Transaction, offset: u8) -> bool {
        if txn.original_caller == Originator::Core(self.id) && txn.cmd != BusCmd::Flush {
            return false;
        }
        let addr = CacheAddr::new(txn.addr);
        let index = addr.index();
        let line = self.tsram[index];
        if line.tag != addr.tag() || line.mesi == MesiState::Invalid {
            return false;
        }

        let next = self.transition(line.mesi, txn);
        // A Modified owner keeps its state until the last word has been
        // flushed; everyone else commits immediately.
        if offset as usize == BLOCK_WORDS - 1 || line.mesi != MesiState::Modified {
            self.tsram[index].mesi = next;
        }
        true
    }

    fn respond(&mut self, txn: &Transaction, offset: &mut u8) -> bool {
        if txn.origid == Originator::Core(self.id) {
            if txn.cmd != BusCmd::Flush {
                return false;
            }
            // Our own write-back draining: count the words out.
            if *offset as usize == BLOCK_WORDS - 1 {
                return true;
            }
            *offset += 1;
            return false;
        }

        // Fill path: we are the requester receiving one word per cycle.
        let addr = CacheAddr::new(txn.addr);
        let index = addr.index();
        self.tsram[index].tag = addr.tag();
        if txn.cmd == BusCmd::Flush {
            self.dsram[addr.dsram_index()] = txn.data;
        }
        if *offset as usize == BLOCK_WORDS - 1 {
            self.tsram[index].mesi = if txn.shared {
                MesiState::Shared
            } else {
                MesiState::Exclusive
            };
            return true;
        }
        *offset += 1;
        false
    }
}
