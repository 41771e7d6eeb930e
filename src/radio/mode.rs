//! Mode controller: the three operating modes the driver uses and the
//! bounded waits on their completion flags.

use super::registers::*;
use super::Radio;
use crate::error::RadioError;
use crate::hal::Board;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Operating modes for the RFM69
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Standby,
    Receive,
    Transmit,
}

impl Mode {
    /// Bit pattern of the REG_OPMODE mode field
    pub fn opmode_bits(self) -> u8 {
        match self {
            Mode::Standby => RF_OPMODE_STANDBY,
            Mode::Receive => RF_OPMODE_RECEIVER,
            Mode::Transmit => RF_OPMODE_TRANSMITTER,
        }
    }

    /// Decode the mode field of a REG_OPMODE value.
    pub fn from_opmode(value: u8) -> Option<Self> {
        match value & OPMODE_MODE_MASK {
            RF_OPMODE_STANDBY => Some(Mode::Standby),
            RF_OPMODE_RECEIVER => Some(Mode::Receive),
            RF_OPMODE_TRANSMITTER => Some(Mode::Transmit),
            _ => None,
        }
    }
}

impl<B: Board> Radio<B> {
    /// Mode last written to the chip, by the mode controller or by a setup
    /// recipe entry for REG_OPMODE. `None` means unknown: before setup, or
    /// after a mode the driver does not use.
    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }

    /// Rewrite the mode field, preserving the other REG_OPMODE bits.
    pub(crate) fn request_mode(&mut self, mode: Mode) -> Result<(), RadioError> {
        let bits = mode.opmode_bits();
        if self.poke_register(REG_OPMODE, |v| (v & !OPMODE_MODE_MASK) | bits)? {
            self.mode = Some(mode);
        }
        Ok(())
    }

    pub(crate) async fn wait_mode_ready(&mut self) -> Result<(), RadioError> {
        let limit = self.config.mode_ready_timeout();
        self.wait_for_flag(REG_IRQFLAGS1, IrqFlags1::MODE_READY.bits(), "mode ready", limit)
            .await
    }

    pub(crate) async fn wait_packet_sent(&mut self) -> Result<(), RadioError> {
        let limit = self.config.packet_sent_timeout();
        self.wait_for_flag(REG_IRQFLAGS2, IrqFlags2::PACKET_SENT.bits(), "packet sent", limit)
            .await
    }

    async fn wait_for_flag(
        &mut self,
        reg: u8,
        mask: u8,
        waiting_for: &'static str,
        limit: Duration,
    ) -> Result<(), RadioError> {
        let start = Instant::now();
        let interval = self.config.poll_interval();

        loop {
            if self.read_register(reg)? & mask != 0 {
                return Ok(());
            }
            if start.elapsed() >= limit {
                return Err(RadioError::Timeout {
                    waiting_for,
                    after: limit,
                });
            }
            sleep(interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EditPolicy, RadioConfig};
    use crate::hal::fake::{FailOn, FakeBoard};
    use crate::logging::silent_sink;

    #[tokio::test]
    async fn test_mode_field_rewrite_keeps_sequencer_bits() {
        let board = FakeBoard::new();
        board.set_register(REG_OPMODE, 0x80 | RF_OPMODE_RECEIVER);
        let mut radio = Radio::new(board.clone(), silent_sink(), RadioConfig::default());

        radio.request_mode(Mode::Standby).unwrap();
        radio.wait_mode_ready().await.unwrap();

        assert_eq!(board.register(REG_OPMODE), 0x80 | RF_OPMODE_STANDBY);
        assert_eq!(radio.mode(), Some(Mode::Standby));
    }

    #[tokio::test]
    async fn test_mode_ready_wait_is_bounded() {
        let board = FakeBoard::new();
        board.stall_mode_ready(true);
        let config = RadioConfig {
            mode_ready_timeout_ms: 20,
            ..RadioConfig::default()
        };
        let mut radio = Radio::new(board, silent_sink(), config);

        radio.request_mode(Mode::Standby).unwrap();
        let err = radio.wait_mode_ready().await.unwrap_err();
        assert!(matches!(
            err,
            RadioError::Timeout {
                waiting_for: "mode ready",
                ..
            }
        ));
    }

    #[test]
    fn test_opmode_decoding() {
        assert_eq!(Mode::from_opmode(0x80 | RF_OPMODE_RECEIVER), Some(Mode::Receive));
        assert_eq!(Mode::from_opmode(RF_OPMODE_STANDBY), Some(Mode::Standby));
        // Sleep
        assert_eq!(Mode::from_opmode(0x00), None);
    }

    #[test]
    fn test_dropped_write_leaves_believed_mode() {
        let board = FakeBoard::new();
        let config = RadioConfig {
            edit_policy: EditPolicy::BestEffort,
            ..RadioConfig::default()
        };
        let mut radio = Radio::new(board.clone(), silent_sink(), config);
        radio.request_mode(Mode::Standby).unwrap();

        board.fail_on(FailOn::Write(REG_OPMODE));
        radio.request_mode(Mode::Transmit).unwrap();
        assert_eq!(radio.mode(), Some(Mode::Standby));
    }
}
