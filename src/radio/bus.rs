//! Register access: every chip interaction is one of these transactions.
//! The address byte carries the direction in bit 7; the first byte clocked
//! back is the echo of the address phase and never carries data.

use super::registers::{ADDR_MASK, WRITE_FLAG};
use super::Radio;
use crate::config::EditPolicy;
use crate::error::RadioError;
use crate::hal::Board;
use log::warn;

impl<B: Board> Radio<B> {
    /// Read one register.
    pub fn read_register(&mut self, addr: u8) -> Result<u8, RadioError> {
        let mut rx = [0u8; 2];
        self.board
            .transfer(&[addr & ADDR_MASK, 0], &mut rx)
            .map_err(|e| RadioError::bus(format!("read 0x{addr:02X}"), e))?;
        Ok(rx[1])
    }

    /// Write one register.
    pub fn write_register(&mut self, addr: u8, value: u8) -> Result<(), RadioError> {
        let mut rx = [0u8; 2];
        self.board
            .transfer(&[addr | WRITE_FLAG, value], &mut rx)
            .map_err(|e| RadioError::bus(format!("write 0x{addr:02X}"), e))
    }

    /// Read-modify-write. Not atomic against a failure between the two
    /// transactions; either failure is returned.
    pub fn edit_register(
        &mut self,
        addr: u8,
        edit: impl FnOnce(u8) -> u8,
    ) -> Result<(), RadioError> {
        let current = self.read_register(addr)?;
        self.write_register(addr, edit(current))
    }

    /// Read-modify-write for bit toggles, honouring the configured
    /// [`EditPolicy`]. Returns whether the write-back landed.
    pub(crate) fn poke_register(
        &mut self,
        addr: u8,
        edit: impl FnOnce(u8) -> u8,
    ) -> Result<bool, RadioError> {
        let current = self.read_register(addr)?;
        match self.write_register(addr, edit(current)) {
            Ok(()) => Ok(true),
            Err(e) if self.config.edit_policy == EditPolicy::BestEffort => {
                if self.warn_throttle.allow() {
                    warn!("Dropping failed write-back to 0x{addr:02X}: {e}");
                }
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Write `data` to consecutive addresses (or into the FIFO) in one transaction.
    pub(crate) fn burst_write(&mut self, addr: u8, data: &[u8]) -> Result<(), RadioError> {
        let mut tx = Vec::with_capacity(data.len() + 1);
        tx.push(addr | WRITE_FLAG);
        tx.extend_from_slice(data);
        self.board
            .transfer(&tx, &mut [])
            .map_err(|e| RadioError::bus(format!("burst write 0x{addr:02X}"), e))
    }

    /// Read `len` bytes in one transaction, dropping the echo byte.
    pub(crate) fn burst_read(&mut self, addr: u8, len: usize) -> Result<Vec<u8>, RadioError> {
        let mut tx = vec![0u8; len + 1];
        tx[0] = addr & ADDR_MASK;
        let mut rx = vec![0u8; len + 1];
        self.board
            .transfer(&tx, &mut rx)
            .map_err(|e| RadioError::bus(format!("burst read 0x{addr:02X}"), e))?;
        Ok(rx.split_off(1))
    }
}
