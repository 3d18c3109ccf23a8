//! Main memory: flat word array behind a fixed-latency single port.
//!
//! Services one block transfer at a time. A transfer served from memory pays
//! the configured access latency and then delivers one word per cycle; when a
//! cache supplies the data instead, the latency is skipped and memory only
//! absorbs the flushed words.

use std::io::{self, Write};

use crate::common::CacheAddr;
use crate::common::constants::{BLOCK_WORDS, MEM_WORDS};
use crate::config::MemoryConfig;
use crate::soc::interconnect::{BusCmd, Originator, Transaction};
use crate::soc::traits::MemoryAgent;

/// Main memory model (2^20 words) with its transfer state machine.
pub struct MainMemory {
    words: Vec<u32>,
    latency: u64,
    busy: bool,
    counter: u64,
}

impl std::fmt::Debug for MainMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MainMemory")
            .field("latency", &self.latency)
            .field("busy", &self.busy)
            .field("counter", &self.counter)
            .finish_non_exhaustive()
    }
}

impl MainMemory {
    /// Creates main memory preloaded with `image`; the remainder is zero.
    ///
    /// Images longer than the memory are truncated.
    pub fn new(config: &MemoryConfig, mut image: Vec<u32>) -> Self {
        image.truncate(MEM_WORDS);
        image.resize(MEM_WORDS, 0);
        Self {
            words: image,
            latency: config.latency_cycles,
            busy: false,
            counter: 0,
        }
    }

    /// Reads the word at `addr` (test and dump access; bus traffic goes
    /// through [`MemoryAgent::service`]).
    pub fn word(&self, addr: CacheAddr) -> u32 {
        self.words[addr.mem_index()]
    }

    /// Writes the memory image up to the highest nonzero word, one 8-digit
    /// hex word per line.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from the writer.
    pub fn dump(&self, out: &mut dyn Write) -> io::Result<()> {
        let used = self
            .words
            .iter()
            .rposition(|&w| w != 0)
            .map_or(0, |i| i + 1);
        for word in &self.words[..used] {
            writeln!(out, "{word:08X}")?;
        }
        Ok(())
    }
}

impl MemoryAgent for MainMemory {
    fn service(&mut self, txn: &mut Transaction, direct: bool) -> bool {
        if txn.cmd == BusCmd::None {
            return false;
        }

        // First call of a transfer arms the countdown; a cache-to-cache
        // transfer starts past the latency window.
        if !self.busy {
            self.busy = true;
            self.counter = if direct { self.latency } else { 0 };
        }

        if self.counter < self.latency {
            self.counter += 1;
            return false;
        }

        let index = CacheAddr::new(txn.addr).mem_index();
        match txn.cmd {
            BusCmd::BusRd | BusCmd::BusRdX => {
                txn.origid = Originator::Memory;
                txn.cmd = BusCmd::Flush;
                txn.data = self.words[index];
            }
            BusCmd::Flush => {
                self.words[index] = txn.data;
            }
            BusCmd::None => {}
        }

        if self.counter == self.latency + BLOCK_WORDS as u64 - 1 {
            self.busy = false;
        }
        self.counter += 1;
        true
    }
}
