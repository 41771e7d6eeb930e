//! Synchronization sequencer: reset the chip, prove the bus works by making
//! the sync register latch two sentinel values, then load the register
//! recipe and the initial transmit power.

use super::mode::Mode;
use super::presets;
use super::registers::{REG_OPMODE, REG_SYNCVALUE1};
use super::Radio;
use crate::error::RadioError;
use crate::hal::Board;
use log::info;
use std::time::Duration;
use tokio::time::sleep;

/// First and second values the sync register must echo back
pub const SYNC_SENTINELS: [u8; 2] = [0xAA, 0x55];

impl<B: Board> Radio<B> {
    /// Reset and initialize the chip with the preset recipe for the
    /// configured band and bit rate.
    pub async fn setup(&mut self) -> Result<(), RadioError> {
        let recipe = presets::config_for(self.config.band, self.config.bitrate_bps);
        self.setup_with(&recipe).await
    }

    /// Reset and initialize the chip, applying `recipe` verbatim after the
    /// handshake.
    pub async fn setup_with(&mut self, recipe: &[(u8, u8)]) -> Result<(), RadioError> {
        info!("Initializing RFM69 radio (node 0x{:02X})", self.node_address);
        self.reset().await?;

        for sentinel in SYNC_SENTINELS {
            self.sync_phase(sentinel)?;
        }

        for &(reg, value) in recipe {
            self.narrate(&format!("config 0x{reg:02X} <- 0x{value:02X}"));
            self.write_register(reg, value)?;
            if reg == REG_OPMODE {
                self.mode = Mode::from_opmode(value);
            }
        }

        self.apply_power(self.tx_power_dbm)?;
        info!("RFM69 radio initialized at {} dBm", self.tx_power_dbm);
        Ok(())
    }

    async fn reset(&mut self) -> Result<(), RadioError> {
        self.board
            .set_reset(true)
            .map_err(|e| RadioError::bus("assert reset", e))?;
        sleep(Duration::from_micros(self.config.reset_hold_us)).await;
        self.board
            .set_reset(false)
            .map_err(|e| RadioError::bus("release reset", e))?;
        sleep(Duration::from_millis(self.config.reset_settle_ms)).await;
        self.mode = None;
        Ok(())
    }

    fn sync_phase(&mut self, sentinel: u8) -> Result<(), RadioError> {
        let attempts = self.config.sync_attempts;
        for attempt in 1..=attempts {
            let seen = self.read_register(REG_SYNCVALUE1)?;
            self.narrate(&format!(
                "sync 0x{sentinel:02X}: read 0x{seen:02X} (attempt {attempt}/{attempts})"
            ));
            if seen == sentinel {
                return Ok(());
            }
            self.write_register(REG_SYNCVALUE1, sentinel)?;
        }
        Err(RadioError::NotSyncing { sentinel, attempts })
    }
}
