//! # Raspberry Pi Board
//!
//! rppal-backed [`Board`] for an RFM69HCW breakout on the 40-pin header.
//!
//! ## Pinout
//!
//! ```text
//! Pi Pin │ BCM GPIO │ RFM69 Pin │ Function
//! ───────┼──────────┼───────────┼──────────────────
//! 19     │ GPIO 10  │ MOSI      │ SPI data out
//! 21     │ GPIO 9   │ MISO      │ SPI data in
//! 23     │ GPIO 11  │ SCK       │ SPI clock
//! 24     │ GPIO 8   │ NSS       │ Chip select (CE0)
//! 29     │ GPIO 5   │ RESET     │ Reset (output, active high)
//! 18     │ GPIO 24  │ DIO0      │ Interrupt (input)
//! ```
//!
//! SPI must be enabled in `/boot/config.txt` (`dtparam=spi=on`).
//!
//! The bus runs in SPI mode 0 at 4 MHz. Older Go tooling for the same
//! wiring opened the device in mode 3; the RFM69 samples correctly in
//! either, so boards brought up that way need no changes.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rfm69_link::hal::{GpioPins, RaspberryPiBoard};
//!
//! let board = RaspberryPiBoard::new(0, &GpioPins::default())?;
//! # Ok::<(), rfm69_link::BoardError>(())
//! ```

use super::{Board, InterruptLine};
use crate::error::BoardError;
use rppal::gpio::{Gpio, InputPin, OutputPin, Trigger};
use rppal::spi::{BitOrder, Bus, Mode, SlaveSelect, Spi};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// SPI clock used for the RFM69 (the chip accepts up to 10 MHz)
pub const SPI_CLOCK_HZ: u32 = 4_000_000;

/// GPIO pin configuration (BCM numbering)
#[derive(Debug, Clone)]
pub struct GpioPins {
    /// RESET pin (output), high holds the chip in reset
    pub reset: u8,
    /// DIO0 pin (input), PayloadReady / PacketSent interrupt
    pub dio0: u8,
}

impl Default for GpioPins {
    fn default() -> Self {
        Self {
            reset: 5,  // GPIO 5 (Pin 29)
            dio0: 24, // GPIO 24 (Pin 18)
        }
    }
}

/// Raspberry Pi board: SPI bus, reset line and DIO0 interrupt
pub struct RaspberryPiBoard {
    spi: Spi,
    reset_pin: OutputPin,
    dio0: Arc<Dio0Line>,
}

impl RaspberryPiBoard {
    /// Open SPI bus `spi_bus` (0 or 1, chip select 0) and claim the pins.
    pub fn new(spi_bus: u8, pins: &GpioPins) -> Result<Self, BoardError> {
        let bus = match spi_bus {
            0 => Bus::Spi0,
            1 => Bus::Spi1,
            _ => {
                return Err(BoardError::Unavailable(format!(
                    "Invalid SPI bus {spi_bus}, only 0 and 1 are supported"
                )))
            }
        };

        let spi = Spi::new(bus, SlaveSelect::Ss0, SPI_CLOCK_HZ, Mode::Mode0)
            .map_err(|e| BoardError::Spi(e.to_string()))?;
        spi.set_bit_order(BitOrder::MsbFirst)
            .map_err(|e| BoardError::Spi(e.to_string()))?;

        let gpio = Gpio::new().map_err(|e| BoardError::Gpio(e.to_string()))?;
        let mut reset_pin = gpio
            .get(pins.reset)
            .map_err(|e| BoardError::Gpio(e.to_string()))?
            .into_output();
        reset_pin.set_low();

        let mut dio0 = gpio
            .get(pins.dio0)
            .map_err(|e| BoardError::Gpio(e.to_string()))?
            .into_input();
        dio0.set_interrupt(Trigger::RisingEdge, None)
            .map_err(|e| BoardError::Gpio(e.to_string()))?;

        log::info!("Raspberry Pi board initialized:");
        log::info!("  SPI: SPI{spi_bus} at {} MHz", SPI_CLOCK_HZ / 1_000_000);
        log::info!("  RESET: GPIO {}", pins.reset);
        log::info!("  DIO0: GPIO {}", pins.dio0);

        Ok(Self {
            spi,
            reset_pin,
            dio0: Arc::new(Dio0Line {
                pin: Mutex::new(dio0),
            }),
        })
    }
}

impl Board for RaspberryPiBoard {
    fn transfer(&mut self, write: &[u8], read: &mut [u8]) -> Result<(), BoardError> {
        let result = if read.is_empty() {
            self.spi.write(write)
        } else {
            self.spi.transfer(read, write)
        };
        result
            .map(|_| ())
            .map_err(|e| BoardError::Spi(e.to_string()))
    }

    fn set_reset(&mut self, asserted: bool) -> Result<(), BoardError> {
        if asserted {
            self.reset_pin.set_high();
        } else {
            self.reset_pin.set_low();
        }
        Ok(())
    }

    fn interrupt_line(&self) -> Arc<dyn InterruptLine> {
        self.dio0.clone()
    }
}

/// DIO0 configured for rising-edge interrupts
struct Dio0Line {
    pin: Mutex<InputPin>,
}

impl InterruptLine for Dio0Line {
    fn wait_for_edge(&self, timeout: Duration) -> bool {
        let mut pin = self.pin.lock().unwrap_or_else(|e| e.into_inner());
        match pin.poll_interrupt(false, Some(timeout)) {
            Ok(Some(_)) => true,
            Ok(None) => false,
            Err(e) => {
                // Nothing to report to; avoid spinning on a dead line.
                log::error!("DIO0 interrupt poll failed: {e}");
                std::thread::sleep(timeout);
                false
            }
        }
    }
}
