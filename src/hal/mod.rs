//! # Hardware Abstraction Layer for the Radio Board
//!
//! The driver needs exactly three things from the hardware: a duplex SPI
//! transaction, control of the reset line, and a way to block until the
//! next rising edge on the DIO0 interrupt line (in bounded slices). [`Board`] captures the first
//! two and hands out the third as a shareable [`InterruptLine`] so the
//! edge-waiting task never touches the bus.
//!
//! Two implementations ship with the crate:
//! - [`fake::FakeBoard`]: an in-memory chip model for tests
//! - `raspberry_pi::RaspberryPiBoard`: rppal-backed SPI/GPIO (feature `raspberry-pi`)

use crate::error::BoardError;
use std::sync::Arc;
use std::time::Duration;

/// Bus and reset-line capability, exclusively owned by one [`Radio`](crate::Radio).
pub trait Board: Send {
    /// Clock `write` out while filling `read` with what the chip returns.
    ///
    /// `read` is either empty (write-only transaction) or the same length as
    /// `write`; the first byte read back is the echo of the address phase.
    fn transfer(&mut self, write: &[u8], read: &mut [u8]) -> Result<(), BoardError>;

    /// Drive the reset line (`true` holds the chip in reset).
    fn set_reset(&mut self, asserted: bool) -> Result<(), BoardError>;

    /// Handle to the DIO0 interrupt line.
    fn interrupt_line(&self) -> Arc<dyn InterruptLine>;
}

/// Blocking wait on the chip's interrupt output.
pub trait InterruptLine: Send + Sync {
    /// Block until the next rising edge or until `timeout` passes, returning
    /// whether an edge was seen. A fault on the underlying line is
    /// unrecoverable at this layer and is reported as no edge.
    fn wait_for_edge(&self, timeout: Duration) -> bool;
}

pub mod fake;

// Platform implementations
#[cfg(feature = "raspberry-pi")]
pub mod raspberry_pi;

#[cfg(feature = "raspberry-pi")]
pub use raspberry_pi::{GpioPins, RaspberryPiBoard};
