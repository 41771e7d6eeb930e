//! # Driver Configuration
//!
//! The driver supports configuration via JSON:
//! ```json
//! {
//!   "node_address": 2,
//!   "tx_power_dbm": 13,
//!   "band": "Mhz433",
//!   "bitrate_bps": 100000,
//!   "edit_policy": "Strict"
//! }
//! ```
//!
//! Every field is optional; omitted fields take the defaults below.

use crate::error::RadioError;
use crate::radio::presets::Band;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Failure handling for best-effort read-modify-write pokes (mode and
/// restart bit toggles).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditPolicy {
    /// A failed write-back is returned to the caller.
    Strict,
    /// A failed write-back is logged and dropped.
    BestEffort,
}

/// What the receive loop does with a frame whose header is unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorruptFramePolicy {
    /// Clear the FIFO, count the frame as dropped and keep receiving.
    Skip,
    /// Stop the pipeline with [`RadioError::Frame`].
    Abort,
}

/// Configuration for the RFM69 driver
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RadioConfig {
    /// This node's address, sent as the source byte of every frame
    pub node_address: u8,
    /// Configured transmit power in dBm (-2..=20)
    pub tx_power_dbm: i8,
    /// Power the amplifier drops to between sends
    pub idle_power_dbm: i8,
    /// Frequency band handed to the preset provider
    pub band: Band,
    /// Bit rate handed to the preset provider
    pub bitrate_bps: u32,
    /// Attempts per sentinel phase of the sync handshake
    pub sync_attempts: u32,
    /// How long the reset line is held asserted
    pub reset_hold_us: u64,
    /// Settling time after reset is released
    pub reset_settle_ms: u64,
    /// Bound on the mode-ready wait
    pub mode_ready_timeout_ms: u64,
    /// Bound on the packet-sent wait
    pub packet_sent_timeout_ms: u64,
    /// Delay between status register polls
    pub poll_interval_us: u64,
    pub edit_policy: EditPolicy,
    pub on_corrupt_frame: CorruptFramePolicy,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            node_address: 1,
            tx_power_dbm: 13,
            idle_power_dbm: -2,
            band: Band::Mhz433,
            bitrate_bps: 100_000,
            sync_attempts: 15,
            reset_hold_us: 100,
            reset_settle_ms: 5,
            mode_ready_timeout_ms: 500,
            packet_sent_timeout_ms: 1_000,
            poll_interval_us: 100,
            edit_policy: EditPolicy::BestEffort,
            on_corrupt_frame: CorruptFramePolicy::Skip,
        }
    }
}

impl RadioConfig {
    /// Load and validate a configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RadioError> {
        let text = std::fs::read_to_string(path)?;
        let config: RadioConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the driver cannot run with.
    pub fn validate(&self) -> Result<(), RadioError> {
        if self.sync_attempts == 0 {
            return Err(RadioError::Config(
                "sync_attempts must be at least 1".to_string(),
            ));
        }
        if self.mode_ready_timeout_ms == 0 || self.packet_sent_timeout_ms == 0 {
            return Err(RadioError::Config(
                "status wait timeouts must be non-zero".to_string(),
            ));
        }
        if self.bitrate_bps == 0 || u64::from(self.bitrate_bps) > crate::radio::registers::FXOSC_HZ {
            return Err(RadioError::Config(format!(
                "unsupported bit rate {} bps",
                self.bitrate_bps
            )));
        }
        Ok(())
    }

    pub fn mode_ready_timeout(&self) -> Duration {
        Duration::from_millis(self.mode_ready_timeout_ms)
    }

    pub fn packet_sent_timeout(&self) -> Duration {
        Duration::from_millis(self.packet_sent_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_micros(self.poll_interval_us)
    }
}
