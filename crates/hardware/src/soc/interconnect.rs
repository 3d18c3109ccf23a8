//! Shared snoopy bus: arbiter and transaction state machine.
//!
//! This module implements the interconnect between the four data caches and
//! main memory. It provides:
//! 1. **Transaction Queue:** A FIFO of pending coherence transactions.
//! 2. **Arbitration:** One transaction owns the bus until its block transfer
//!    completes; per-core request states gate the caches in the meantime.
//! 3. **Snooping:** Every cycle, all caches probe and snoop the in-flight
//!    transaction; a Modified owner takes over as the data supplier.
//! 4. **Tracing:** One trace line when a transaction starts and one per cycle
//!    in which memory produces or accepts a word.

use std::collections::VecDeque;
use std::io::{self, Write};

use crate::common::CacheAddr;
use crate::common::constants::NUM_CORES;
use crate::soc::traits::{BusAgent, MemoryAgent};

/// Identity of a bus-transaction participant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Originator {
    /// One of the four cores (by id).
    Core(usize),
    /// Main memory, once it has taken over as the supplier.
    Memory,
    /// No participant; marks delay-slot transactions and an idle bus.
    None,
}

impl Originator {
    /// Core id when this originator is a core.
    #[inline]
    pub fn core_index(self) -> Option<usize> {
        match self {
            Self::Core(id) => Some(id),
            _ => None,
        }
    }

    /// Numeric id used in bus-trace lines (cores 0-3, memory 4).
    pub fn trace_code(self) -> u32 {
        match self {
            Self::Core(id) => id as u32,
            Self::Memory => NUM_CORES as u32,
            Self::None => 0xFFFF,
        }
    }
}

/// Command carried by a bus transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum BusCmd {
    /// No command.
    None = 0,
    /// Read request for a block.
    BusRd = 1,
    /// Read-for-ownership request for a block.
    BusRdX = 2,
    /// Write-back of a block word (from a cache or from memory).
    Flush = 3,
}

/// A coherence transaction on the shared bus.
///
/// `origid` identifies the current supplier-or-requester and may be rewritten
/// mid-transfer (by a Modified owner or by main memory); `original_caller`
/// stays pinned to the cache that started the block transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transaction {
    /// The cache that initiated this block transfer.
    pub original_caller: Originator,
    /// Current owner of the transaction; rewritten while data flows.
    pub origid: Originator,
    /// Bus command.
    pub cmd: BusCmd,
    /// Word address (20-bit space); the offset bits step through the block.
    pub addr: u32,
    /// Data word for the current cycle.
    pub data: u32,
    /// Recomputed each cycle: some other cache holds the block.
    pub shared: bool,
}

impl Transaction {
    /// A request (`BusRd`/`BusRdX`) from a core for the block at `addr`.
    pub fn request(core: usize, cmd: BusCmd, addr: CacheAddr) -> Self {
        Self {
            original_caller: Originator::None,
            origid: Originator::Core(core),
            cmd,
            addr: addr.raw(),
            data: 0,
            shared: false,
        }
    }

    /// A write-back of a dirty block from a core.
    pub fn flush(core: usize, addr: CacheAddr, data: u32) -> Self {
        Self {
            original_caller: Originator::None,
            origid: Originator::Core(core),
            cmd: BusCmd::Flush,
            addr: addr.raw(),
            data,
            shared: false,
        }
    }

    /// A no-op delay slot; consumes one bus cycle at dequeue time.
    pub fn delay() -> Self {
        Self {
            original_caller: Originator::None,
            origid: Originator::None,
            cmd: BusCmd::None,
            addr: 0,
            data: 0,
            shared: false,
        }
    }

    /// The cycle's view of this transaction with the block offset overridden.
    pub fn at_offset(&self, offset: u8) -> Self {
        Self {
            addr: CacheAddr::new(self.addr).with_offset(offset).raw(),
            ..*self
        }
    }
}

/// Per-core request state tracked by the arbiter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TxnState {
    /// No request outstanding.
    #[default]
    Idle,
    /// Request enqueued, waiting for the bus.
    WaitCmd,
    /// Request being serviced.
    Operation,
    /// Transfer finished this cycle; released to idle on the next tick.
    Finally,
}

/// The bus arbiter.
///
/// Owns the transaction FIFO, the per-core request states, and the in-flight
/// transaction. `tick` advances one bus cycle, driving probe/snoop/memory
/// callbacks into the participants it is handed.
#[derive(Debug)]
pub struct Bus {
    queue: VecDeque<Transaction>,
    states: [TxnState; NUM_CORES],
    ongoing: Transaction,
    active: bool,
    offset: u8,
    iteration: u32,
    first_modified_pending: bool,
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus {
    /// Creates an idle bus with an empty queue.
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            states: [TxnState::Idle; NUM_CORES],
            ongoing: Transaction::delay(),
            active: false,
            offset: 0,
            iteration: 0,
            first_modified_pending: true,
        }
    }

    /// Appends a transaction to the queue.
    ///
    /// A transaction with a core originator moves that core to `WaitCmd`;
    /// delay slots enqueue without touching any state.
    pub fn enqueue(&mut self, txn: Transaction) {
        if let Some(core) = txn.origid.core_index() {
            self.states[core] = TxnState::WaitCmd;
        }
        self.queue.push_front(txn);
    }

    /// Returns whether `core` has a request anywhere in flight.
    #[inline]
    pub fn in_transaction(&self, core: usize) -> bool {
        self.states[core] != TxnState::Idle
    }

    /// Returns whether `core` has a request still waiting for the bus.
    #[inline]
    pub fn awaiting(&self, core: usize) -> bool {
        self.states[core] == TxnState::WaitCmd
    }

    /// Bus cycles elapsed (trace timestamps).
    #[inline]
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    /// Advances the bus by one cycle.
    ///
    /// Releases a finished transaction, dequeues the next one if the bus is
    /// free, then drives one probe/snoop/memory round for the in-flight
    /// transfer. Trace lines go to `trace`.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from the trace writer.
    pub fn tick<A: BusAgent, M: MemoryAgent>(
        &mut self,
        agents: &mut [A; NUM_CORES],
        memory: &mut M,
        trace: &mut dyn Write,
    ) -> io::Result<()> {
        self.iteration += 1;

        // Release the originator of a transfer that completed last cycle.
        if let Some(core) = self.ongoing.origid.core_index() {
            if self.states[core] == TxnState::Finally {
                self.states[core] = TxnState::Idle;
            }
        }

        if self.queue.is_empty() && !self.active {
            self.ongoing.origid = Originator::None;
            return Ok(());
        }

        if !self.active {
            self.first_modified_pending = true;
            let Some(next) = self.queue.pop_back() else {
                return Ok(());
            };
            self.ongoing = next;
            // A delay slot burns this cycle without claiming the bus.
            let Some(core) = self.ongoing.origid.core_index() else {
                return Ok(());
            };
            self.ongoing.original_caller = self.ongoing.origid;
            self.active = true;
            self.states[core] = TxnState::Operation;
            self.offset = 0;
            tracing::debug!(
                iteration = self.iteration,
                core,
                cmd = ?self.ongoing.cmd,
                addr = self.ongoing.addr,
                "bus transaction started"
            );
            self.write_trace_line(trace, &self.ongoing)?;
        }

        let mut view = self.ongoing.at_offset(self.offset);

        // Shared-line probe across all caches; the dirty wire is observed
        // even on a tag mismatch.
        let mut shared = false;
        let mut modified = false;
        for agent in agents.iter() {
            let probe = agent.probe(&self.ongoing);
            shared |= probe.shared;
            modified |= probe.modified;
        }
        view.shared = shared;

        // A Modified owner is given one cycle to be observed before it takes
        // over the transfer; its Flush rewrite lands on the next snoop round.
        if modified && self.first_modified_pending {
            self.first_modified_pending = false;
            return Ok(());
        }

        for agent in agents.iter_mut() {
            let _ = agent.snoop(&mut view, self.offset);
        }

        if memory.service(&mut view, modified) {
            self.write_trace_line(trace, &view)?;
            let Some(requester) = self.ongoing.origid.core_index() else {
                return Ok(());
            };
            if agents[requester].respond(&view, &mut self.offset) {
                self.states[requester] = TxnState::Finally;
                self.active = false;
            }
        }
        Ok(())
    }

    fn write_trace_line(&self, trace: &mut dyn Write, txn: &Transaction) -> io::Result<()> {
        writeln!(
            trace,
            "{} {} {} {:05X} {:08X} {}",
            self.iteration,
            txn.origid.trace_code(),
            txn.cmd as u8,
            txn.addr,
            txn.data,
            u8::from(txn.shared)
        )
    }
}
