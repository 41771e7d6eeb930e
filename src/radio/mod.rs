//! # RFM69 Radio Driver
//!
//! Async driver for RFM69-class transceivers in variable-length packet mode.
//! It turns single-register SPI transactions into:
//!
//! - a reset and sync-word handshake that proves the bus is wired ([`Radio::setup`])
//! - a framed transmit path with power management ([`Radio::send`])
//! - an interrupt-driven receive pipeline that emits [`Packet`]s ([`Radio::receive`])
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rfm69_link::{hal::fake::FakeBoard, logging, Radio, RadioConfig};
//! use tokio::sync::mpsc;
//!
//! # async fn run() -> Result<(), rfm69_link::RadioError> {
//! let mut radio = Radio::new(FakeBoard::new(), logging::default_sink(), RadioConfig::default());
//! radio.setup().await?;
//! radio.send(2, b"abc123").await?;
//!
//! let (tx, mut rx) = mpsc::channel(1);
//! tokio::spawn(async move { radio.receive(tx).await });
//! while let Some(packet) = rx.recv().await {
//!     println!("from {} at {} dBm: {:?}", packet.src, packet.rssi, packet.payload);
//! }
//! # Ok(())
//! # }
//! ```

mod bus;
mod mode;
mod receive;
mod sync;
mod transmit;

pub mod frame;
pub mod power;
pub mod presets;
pub mod registers;

pub use frame::Packet;
pub use mode::Mode;

use crate::config::RadioConfig;
use crate::hal::Board;
use crate::logging::{LogSink, LogThrottle};

/// Counters kept by the transmit and receive paths
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RadioStats {
    pub packets_sent: u64,
    pub packets_received: u64,
    /// Frames discarded for a corrupted header
    pub frames_dropped: u64,
    /// Receiver restarts forced by a stale PayloadReady flag
    pub receiver_restarts: u64,
    pub last_rssi_dbm: Option<i32>,
}

/// Main driver structure; owns the board for its whole lifetime.
pub struct Radio<B: Board> {
    board: B,
    log: LogSink,
    config: RadioConfig,
    node_address: u8,
    tx_power_dbm: i8,
    /// Last mode the mode controller successfully wrote
    mode: Option<Mode>,
    stats: RadioStats,
    warn_throttle: LogThrottle,
    /// DIO0 edge thread, started by the first `receive`
    edges: Option<receive::EdgeTask>,
}

impl<B: Board> Radio<B> {
    pub fn new(board: B, log: LogSink, config: RadioConfig) -> Self {
        Self {
            board,
            log,
            node_address: config.node_address,
            tx_power_dbm: power::power_setting(config.tx_power_dbm).dbm,
            config,
            mode: None,
            stats: RadioStats::default(),
            warn_throttle: LogThrottle::new(60_000, 5),
            edges: None,
        }
    }

    pub fn node_address(&self) -> u8 {
        self.node_address
    }

    /// Currently configured transmit power in dBm
    pub fn tx_power(&self) -> i8 {
        self.tx_power_dbm
    }

    pub fn config(&self) -> &RadioConfig {
        &self.config
    }

    pub fn stats(&self) -> RadioStats {
        self.stats
    }

    fn narrate(&self, message: &str) {
        (self.log)(message);
    }
}
