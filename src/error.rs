//! # Radio Error Handling
//!
//! This module defines the error types returned by the driver. Board
//! implementations report [`BoardError`]; everything above the bus speaks
//! [`RadioError`], which names the operation that failed.

use std::time::Duration;
use thiserror::Error;

/// Errors reported by a [`Board`](crate::hal::Board) implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BoardError {
    /// A bus transaction failed.
    #[error("SPI transfer failed: {0}")]
    Spi(String),

    /// A GPIO line could not be driven or read.
    #[error("GPIO operation failed: {0}")]
    Gpio(String),

    /// The hardware is missing or was not built in.
    #[error("Board unavailable: {0}")]
    Unavailable(String),
}

/// Packet-level corruption detected while draining the FIFO.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FrameError {
    /// The length byte cannot cover the destination/source/control header.
    #[error("Frame length {length} is shorter than the 3-byte header")]
    HeaderTooShort { length: u8 },
}

/// Represents the different error types that can occur in the driver.
#[derive(Debug, Error)]
pub enum RadioError {
    /// A bus transaction or reset-line write failed.
    #[error("Bus error during {op}: {source}")]
    Bus {
        op: String,
        #[source]
        source: BoardError,
    },

    /// The sync register never latched the sentinel value.
    #[error("Radio is not syncing: sentinel 0x{sentinel:02X} not seen after {attempts} attempts")]
    NotSyncing { sentinel: u8, attempts: u32 },

    /// A status flag was not raised within the configured bound.
    #[error("Timeout waiting for {waiting_for} after {after:?}")]
    Timeout {
        waiting_for: &'static str,
        after: Duration,
    },

    /// Transmit payload does not fit in a single frame.
    #[error("Payload too large: {len} > {max} bytes")]
    PayloadTooLarge { len: usize, max: usize },

    /// A received frame was malformed.
    #[error("Corrupted frame: {0}")]
    Frame(#[from] FrameError),

    /// The interrupt-waiting task is gone.
    #[error("Interrupt edge task stopped")]
    EdgeTaskStopped,

    /// Invalid driver configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Reading a configuration file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing a configuration file failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RadioError {
    /// Wrap a board failure with the name of the operation it interrupted.
    pub fn bus(op: impl Into<String>, source: BoardError) -> Self {
        RadioError::Bus {
            op: op.into(),
            source,
        }
    }

    /// True for transport faults, false for packet-level or setup problems.
    pub fn is_bus_fault(&self) -> bool {
        matches!(self, RadioError::Bus { .. })
    }
}
