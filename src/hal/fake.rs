//! In-memory RFM69 model for exercising the driver without hardware.
//!
//! The fake keeps a 128-byte register file and a FIFO, and reacts to the
//! handful of register writes the driver relies on:
//!
//! - writing the mode field of REG_OPMODE raises ModeReady; entering TX
//!   raises PacketSent and captures the FIFO as a transmitted frame
//! - entering RX lands the next queued air frame in the FIFO, raises
//!   PayloadReady and fires a DIO0 edge
//! - writing FifoOverrun to REG_IRQFLAGS2 clears the FIFO
//! - setting RestartRx in REG_PACKETCONFIG2 drops any pending payload
//!
//! Clones share the same chip, so a test keeps one clone for scripting and
//! inspection while the [`Radio`](crate::Radio) owns another.

use super::{Board, InterruptLine};
use crate::error::BoardError;
use crate::radio::registers::*;
use std::collections::VecDeque;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// One bus-level event observed by the fake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transaction {
    Read(u8),
    Write(u8, u8),
    FifoWrite(Vec<u8>),
    FifoRead(usize),
    Reset(bool),
}

/// Failure injection rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    /// The nth transfer from now (1-based)
    Transfer(usize),
    /// The nth FIFO burst read from now (1-based)
    FifoRead(usize),
    /// Every write to the register
    Write(u8),
    /// Every read of the register
    Read(u8),
}

#[derive(Debug)]
struct AirFrame {
    rssi_raw: u8,
    bytes: Vec<u8>,
}

#[derive(Debug)]
struct Chip {
    regs: [u8; 128],
    fifo: VecDeque<u8>,
    air: VecDeque<AirFrame>,
    transmitted: Vec<Vec<u8>>,
    journal: Vec<Transaction>,
    failures: Vec<FailOn>,
    transfers_seen: usize,
    fifo_reads_seen: usize,
    sync_writes_to_ignore: u32,
    stall_mode_ready: bool,
    stall_packet_sent: bool,
    restarts: usize,
}

impl Chip {
    fn new() -> Self {
        Self {
            regs: [0; 128],
            fifo: VecDeque::new(),
            air: VecDeque::new(),
            transmitted: Vec::new(),
            journal: Vec::new(),
            failures: Vec::new(),
            transfers_seen: 0,
            fifo_reads_seen: 0,
            sync_writes_to_ignore: 0,
            stall_mode_ready: false,
            stall_packet_sent: false,
            restarts: 0,
        }
    }

    fn set_flag(&mut self, reg: u8, bits: u8, on: bool) {
        if on {
            self.regs[reg as usize] |= bits;
        } else {
            self.regs[reg as usize] &= !bits;
        }
    }

    fn should_fail(&mut self, write: &[u8]) -> bool {
        self.transfers_seen += 1;
        let addr = write.first().copied().unwrap_or(0);
        let is_write = addr & WRITE_FLAG != 0;
        let reg = addr & ADDR_MASK;
        let fifo_read = !is_write && reg == REG_FIFO;
        if fifo_read {
            self.fifo_reads_seen += 1;
        }

        let transfers = self.transfers_seen;
        let fifo_reads = self.fifo_reads_seen;
        self.failures.iter().any(|rule| match *rule {
            FailOn::Transfer(n) => transfers == n,
            FailOn::FifoRead(n) => fifo_read && fifo_reads == n,
            FailOn::Write(target) => is_write && reg == target,
            FailOn::Read(target) => !is_write && reg == target,
        })
    }

    fn write_register(&mut self, reg: u8, value: u8, edge: &mpsc::Sender<()>) {
        self.journal.push(Transaction::Write(reg, value));
        match reg {
            REG_SYNCVALUE1 if self.sync_writes_to_ignore > 0 => {
                self.sync_writes_to_ignore -= 1;
            }
            REG_OPMODE => {
                self.regs[reg as usize] = value;
                self.enter_mode(value & OPMODE_MODE_MASK, edge);
            }
            REG_IRQFLAGS2 => {
                if value & IrqFlags2::FIFO_OVERRUN.bits() != 0 {
                    self.fifo.clear();
                    self.set_flag(REG_IRQFLAGS2, IrqFlags2::PAYLOAD_READY.bits(), false);
                }
            }
            REG_PACKETCONFIG2 => {
                if value & RF_PACKET2_RXRESTART != 0 {
                    self.restarts += 1;
                    self.fifo.clear();
                    self.set_flag(REG_IRQFLAGS2, IrqFlags2::PAYLOAD_READY.bits(), false);
                }
                self.regs[reg as usize] = value & !RF_PACKET2_RXRESTART;
            }
            _ => self.regs[reg as usize] = value,
        }
    }

    fn enter_mode(&mut self, mode: u8, edge: &mpsc::Sender<()>) {
        if !self.stall_mode_ready {
            self.set_flag(REG_IRQFLAGS1, IrqFlags1::MODE_READY.bits(), true);
        }
        match mode {
            RF_OPMODE_TRANSMITTER => {
                let frame: Vec<u8> = self.fifo.drain(..).collect();
                self.transmitted.push(frame);
                if !self.stall_packet_sent {
                    self.set_flag(REG_IRQFLAGS2, IrqFlags2::PACKET_SENT.bits(), true);
                }
            }
            RF_OPMODE_RECEIVER => {
                self.set_flag(REG_IRQFLAGS2, IrqFlags2::PACKET_SENT.bits(), false);
                if let Some(frame) = self.air.pop_front() {
                    self.fifo.extend(frame.bytes);
                    self.regs[REG_RSSIVALUE as usize] = frame.rssi_raw;
                    self.set_flag(REG_IRQFLAGS2, IrqFlags2::PAYLOAD_READY.bits(), true);
                    let _ = edge.send(());
                }
            }
            _ => {
                self.set_flag(REG_IRQFLAGS2, IrqFlags2::PACKET_SENT.bits(), false);
            }
        }
    }

    fn read_fifo(&mut self, count: usize, read: &mut [u8]) {
        self.journal.push(Transaction::FifoRead(count));
        for slot in read.iter_mut().skip(1).take(count) {
            *slot = self.fifo.pop_front().unwrap_or(0);
        }
        if self.fifo.is_empty() {
            self.set_flag(REG_IRQFLAGS2, IrqFlags2::PAYLOAD_READY.bits(), false);
        }
    }
}

/// Fake [`Board`] backed by a shared in-memory chip
#[derive(Clone)]
pub struct FakeBoard {
    chip: Arc<Mutex<Chip>>,
    edge_tx: mpsc::Sender<()>,
    line: Arc<FakeInterrupt>,
}

/// DIO0 line of a [`FakeBoard`]
pub struct FakeInterrupt {
    edges: Mutex<mpsc::Receiver<()>>,
}

impl InterruptLine for FakeInterrupt {
    fn wait_for_edge(&self, timeout: Duration) -> bool {
        let edges = self.edges.lock().unwrap_or_else(|e| e.into_inner());
        match edges.recv_timeout(timeout) {
            Ok(()) => true,
            Err(RecvTimeoutError::Timeout) => false,
            // Every board clone is gone; no edge can ever arrive.
            Err(RecvTimeoutError::Disconnected) => {
                std::thread::sleep(timeout);
                false
            }
        }
    }
}

impl Default for FakeBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeBoard {
    pub fn new() -> Self {
        let (edge_tx, edge_rx) = mpsc::channel();
        Self {
            chip: Arc::new(Mutex::new(Chip::new())),
            edge_tx,
            line: Arc::new(FakeInterrupt {
                edges: Mutex::new(edge_rx),
            }),
        }
    }

    fn chip(&self) -> MutexGuard<'_, Chip> {
        self.chip.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue a frame (length byte first) that arrives the next time the
    /// receiver is armed.
    pub fn queue_air_frame(&self, rssi_raw: u8, bytes: &[u8]) {
        self.chip().air.push_back(AirFrame {
            rssi_raw,
            bytes: bytes.to_vec(),
        });
    }

    /// Fire a DIO0 edge directly.
    pub fn fire_edge(&self) {
        let _ = self.edge_tx.send(());
    }

    pub fn fail_on(&self, rule: FailOn) {
        let mut chip = self.chip();
        // Counters restart so "nth from now" holds for the new rule.
        chip.transfers_seen = 0;
        chip.fifo_reads_seen = 0;
        chip.failures.push(rule);
    }

    pub fn clear_failures(&self) {
        self.chip().failures.clear();
    }

    /// Ignore the next `count` writes to the sync register.
    pub fn refuse_sync_writes(&self, count: u32) {
        self.chip().sync_writes_to_ignore = count;
    }

    pub fn stall_mode_ready(&self, stalled: bool) {
        self.chip().stall_mode_ready = stalled;
    }

    pub fn stall_packet_sent(&self, stalled: bool) {
        self.chip().stall_packet_sent = stalled;
    }

    /// Poke a register behind the driver's back.
    pub fn set_register(&self, reg: u8, value: u8) {
        self.chip().regs[(reg & ADDR_MASK) as usize] = value;
    }

    pub fn register(&self, reg: u8) -> u8 {
        self.chip().regs[(reg & ADDR_MASK) as usize]
    }

    pub fn journal(&self) -> Vec<Transaction> {
        self.chip().journal.clone()
    }

    pub fn clear_journal(&self) {
        self.chip().journal.clear();
    }

    /// Register writes in order, FIFO bursts excluded
    pub fn register_writes(&self) -> Vec<(u8, u8)> {
        self.chip()
            .journal
            .iter()
            .filter_map(|t| match t {
                Transaction::Write(reg, value) => Some((*reg, *value)),
                _ => None,
            })
            .collect()
    }

    /// Frames captured when the chip entered TX
    pub fn transmitted(&self) -> Vec<Vec<u8>> {
        self.chip().transmitted.clone()
    }

    /// Number of receiver restarts requested through REG_PACKETCONFIG2
    pub fn restarts(&self) -> usize {
        self.chip().restarts
    }
}

impl Board for FakeBoard {
    fn transfer(&mut self, write: &[u8], read: &mut [u8]) -> Result<(), BoardError> {
        let mut chip = self.chip();
        if chip.should_fail(write) {
            return Err(BoardError::Spi("injected failure".to_string()));
        }

        let Some((&addr, data)) = write.split_first() else {
            return Ok(());
        };
        let reg = addr & ADDR_MASK;

        if addr & WRITE_FLAG != 0 {
            if reg == REG_FIFO {
                chip.journal.push(Transaction::FifoWrite(data.to_vec()));
                chip.fifo.extend(data.iter().copied());
            } else if let Some(&value) = data.first() {
                chip.write_register(reg, value, &self.edge_tx);
            }
            return Ok(());
        }

        if reg == REG_FIFO {
            chip.read_fifo(data.len(), read);
        } else {
            chip.journal.push(Transaction::Read(reg));
            if let Some(slot) = read.get_mut(1) {
                *slot = chip.regs[reg as usize];
            }
        }
        if let Some(echo) = read.first_mut() {
            *echo = 0;
        }
        Ok(())
    }

    fn set_reset(&mut self, asserted: bool) -> Result<(), BoardError> {
        let mut chip = self.chip();
        chip.journal.push(Transaction::Reset(asserted));
        if !asserted {
            chip.regs = [0; 128];
            chip.fifo.clear();
        }
        Ok(())
    }

    fn interrupt_line(&self) -> Arc<dyn InterruptLine> {
        self.line.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_read_returns_echo_then_value() {
        let mut board = FakeBoard::new();
        board.set_register(REG_RSSIVALUE, 0x50);
        let mut rx = [0xFF; 2];
        board.transfer(&[REG_RSSIVALUE, 0], &mut rx).unwrap();
        assert_eq!(rx, [0x00, 0x50]);
    }

    #[test]
    fn test_rx_mode_lands_air_frame() {
        let mut board = FakeBoard::new();
        board.queue_air_frame(80, &[4, 1, 2, 0, 0xAB]);
        board
            .transfer(&[REG_OPMODE | WRITE_FLAG, RF_OPMODE_RECEIVER], &mut [])
            .unwrap();
        assert_ne!(board.register(REG_IRQFLAGS2) & IrqFlags2::PAYLOAD_READY.bits(), 0);

        let mut rx = [0u8; 6];
        board.transfer(&[REG_FIFO, 0, 0, 0, 0, 0], &mut rx).unwrap();
        assert_eq!(rx, [0, 4, 1, 2, 0, 0xAB]);
        assert_eq!(board.register(REG_IRQFLAGS2) & IrqFlags2::PAYLOAD_READY.bits(), 0);
    }

    #[test]
    fn test_injected_failure_hits_nth_fifo_read() {
        let mut board = FakeBoard::new();
        board.fail_on(FailOn::FifoRead(2));
        let mut rx = [0u8; 2];
        assert!(board.transfer(&[REG_FIFO, 0], &mut rx).is_ok());
        assert!(board.transfer(&[REG_IRQFLAGS1, 0], &mut rx).is_ok());
        assert!(board.transfer(&[REG_FIFO, 0], &mut rx).is_err());

        board.fail_on(FailOn::Transfer(1));
        board.clear_failures();
        assert!(board.transfer(&[REG_FIFO, 0], &mut rx).is_ok());
    }

    #[test]
    fn test_edge_wait_is_bounded() {
        let board = FakeBoard::new();
        let line = board.interrupt_line();
        assert!(!line.wait_for_edge(Duration::from_millis(10)));
        board.fire_edge();
        assert!(line.wait_for_edge(Duration::from_millis(10)));
    }

    #[test]
    fn test_sync_register_can_refuse_writes() {
        let mut board = FakeBoard::new();
        board.refuse_sync_writes(1);
        board
            .transfer(&[REG_SYNCVALUE1 | WRITE_FLAG, 0xAA], &mut [])
            .unwrap();
        assert_eq!(board.register(REG_SYNCVALUE1), 0x00);
        board
            .transfer(&[REG_SYNCVALUE1 | WRITE_FLAG, 0xAA], &mut [])
            .unwrap();
        assert_eq!(board.register(REG_SYNCVALUE1), 0xAA);
    }
}
