//! Participant traits for the shared bus.
//!
//! This module defines the seams between the bus arbiter and the components
//! it drives every cycle. It provides:
//! 1. **`BusAgent`:** The cache-side contract (probe, snoop, response).
//! 2. **`MemoryAgent`:** The main-memory contract (latency and data service).
//!
//! The arbiter is generic over both, so tests can substitute scripted agents
//! for the real cache and memory models.

use crate::soc::interconnect::Transaction;

/// Outcome of a shared-line probe on one cache.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LineProbe {
    /// The probed cache holds a valid, tag-matching copy of the block.
    pub shared: bool,
    /// The probed cache's line at the block's index is in Modified state.
    ///
    /// Reported regardless of tag match, exactly as the modeled hardware's
    /// dirty wire behaves.
    pub modified: bool,
}

/// Cache-side participant in bus transactions.
///
/// The arbiter invokes these in a fixed order each cycle: `probe` on every
/// agent, then `snoop` on every agent, then `respond` on the originator once
/// memory has produced or accepted the cycle's word.
pub trait BusAgent {
    /// Reports whether this agent shares the transaction's block, and whether
    /// its line at that index is modified. The transaction's originator
    /// reports nothing.
    fn probe(&self, txn: &Transaction) -> LineProbe;

    /// Observes the in-flight transaction and applies the MESI transition for
    /// this cycle. A Modified owner rewrites `txn` in place to supply the
    /// word at `offset`. Returns whether this agent reacted.
    fn snoop(&mut self, txn: &mut Transaction, offset: u8) -> bool;

    /// Consumes the cycle's served word as the transaction's originator.
    ///
    /// Advances `offset`; returns `true` when the block transfer is complete.
    fn respond(&mut self, txn: &Transaction, offset: &mut u8) -> bool;
}

/// Memory-side participant in bus transactions.
pub trait MemoryAgent {
    /// Services the in-flight transaction for one cycle.
    ///
    /// `direct` is set when a cache is supplying the data, which skips the
    /// access latency. Returns `true` in cycles where a word was produced
    /// (reads are rewritten to Flush with the memory word) or accepted
    /// (Flush data is committed to memory).
    fn service(&mut self, txn: &mut Transaction, direct: bool) -> bool;
}
