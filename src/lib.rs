//! # rfm69-link - Packet Radio Driver for RFM69-class Transceivers
//!
//! The rfm69-link crate drives an RFM69 (HopeRF / Semtech SX1231 family)
//! transceiver over SPI, with the DIO0 line as its packet interrupt.
//!
//! ## Features
//!
//! - Reset and sync-word handshake that proves the bus is alive
//! - Register recipes for the 315/433/868/915 MHz bands at a chosen bit rate
//! - Transmit power from -2 to +20 dBm, including the PA boost tier
//! - Framed transmit with power dropped to an idle level between sends
//! - Interrupt-driven receive pipeline delivering [`Packet`]s with RSSI
//! - Bounded waits on every chip status flag
//! - A scriptable in-memory board for tests and a Raspberry Pi board
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! rfm69-link = { version = "0.1.0", features = ["raspberry-pi"] }
//! ```
//!
//! ```rust
//! use rfm69_link::{
//!     init_logger, Board, Packet, Radio, RadioConfig, RadioError, RadioStats,
//! };
//! ```

pub mod config;
pub mod error;
pub mod hal;
pub mod logging;
pub mod radio;

pub use crate::config::{CorruptFramePolicy, EditPolicy, RadioConfig};
pub use crate::error::{BoardError, FrameError, RadioError};
pub use crate::hal::{Board, InterruptLine};
pub use crate::logging::{init_logger, log_info, LogSink};

// Radio core
pub use radio::presets::Band;
pub use radio::{Mode, Packet, Radio, RadioStats};
