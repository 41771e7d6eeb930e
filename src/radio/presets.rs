//! # Frequency and Bit-Rate Presets
//!
//! Produces the ordered (register, value) recipe that Setup applies verbatim
//! after the sync handshake. The values follow the common packet-mode FSK
//! configuration for RFM69 modules: variable-length frames with CRC, a
//! two-byte sync word, 50 kHz deviation and automatic RX restart.

use super::registers::*;
use serde::{Deserialize, Serialize};

/// First sync word byte written by the preset
pub const SYNC_WORD: u8 = 0x2D;

/// Network id carried in the second sync word byte
pub const NETWORK_ID: u8 = 100;

/// Maximum received length accepted by the packet engine
pub const RX_PAYLOAD_LIMIT: u8 = FIFO_SIZE as u8;

/// ISM band selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Band {
    Mhz315,
    Mhz433,
    Mhz868,
    Mhz915,
}

impl Band {
    /// Carrier frequency used for the band
    pub fn carrier_hz(self) -> u64 {
        match self {
            Band::Mhz315 => 315_000_000,
            Band::Mhz433 => 433_000_000,
            Band::Mhz868 => 868_000_000,
            Band::Mhz915 => 915_000_000,
        }
    }
}

impl std::str::FromStr for Band {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().trim_end_matches("mhz") {
            "315" => Ok(Band::Mhz315),
            "433" => Ok(Band::Mhz433),
            "868" => Ok(Band::Mhz868),
            "915" => Ok(Band::Mhz915),
            other => Err(format!("unknown band: {other}")),
        }
    }
}

/// Frf register value: f * 2^19 / Fxosc
pub fn frf_for(carrier_hz: u64) -> u32 {
    ((carrier_hz << 19) / FXOSC_HZ) as u32
}

/// Bit rate divisor: Fxosc / bitrate, saturated to the 16-bit register pair.
/// A zero bit rate is rejected by `RadioConfig::validate` before this runs.
pub fn bitrate_divisor(bitrate_bps: u32) -> u16 {
    let divisor = FXOSC_HZ / u64::from(bitrate_bps.max(1));
    divisor.min(u64::from(u16::MAX)) as u16
}

/// Ordered register recipe for a band and bit rate.
pub fn config_for(band: Band, bitrate_bps: u32) -> Vec<(u8, u8)> {
    let frf = frf_for(band.carrier_hz());
    let divisor = bitrate_divisor(bitrate_bps);

    // DCC 4%, mantissa 16; exponent 2 is ~125 kHz, exponent 1 ~250 kHz
    let rx_bw = if bitrate_bps <= 55_555 { 0x42 } else { 0x41 };

    vec![
        (REG_OPMODE, RF_OPMODE_STANDBY),
        (REG_DATAMODUL, 0x00),
        (REG_BITRATEMSB, (divisor >> 8) as u8),
        (REG_BITRATELSB, divisor as u8),
        (REG_FDEVMSB, 0x03),
        (REG_FDEVLSB, 0x33),
        (REG_FRFMSB, (frf >> 16) as u8),
        (REG_FRFMID, (frf >> 8) as u8),
        (REG_FRFLSB, frf as u8),
        (REG_RXBW, rx_bw),
        (REG_DIOMAPPING1, RF_DIOMAPPING1_DIO0_01),
        (REG_DIOMAPPING2, RF_DIOMAPPING2_CLKOUT_OFF),
        (REG_IRQFLAGS2, IrqFlags2::FIFO_OVERRUN.bits()),
        (REG_RSSITHRESH, 220),
        (REG_SYNCCONFIG, RF_SYNC_ON | RF_SYNC_SIZE_2),
        (REG_SYNCVALUE1, SYNC_WORD),
        (REG_SYNCVALUE2, NETWORK_ID),
        (REG_PACKETCONFIG1, RF_PACKET1_FORMAT_VARIABLE | RF_PACKET1_CRC_ON),
        (REG_PAYLOADLENGTH, RX_PAYLOAD_LIMIT),
        (
            REG_FIFOTHRESH,
            RF_FIFOTHRESH_TXSTART_FIFONOTEMPTY | RF_FIFOTHRESH_VALUE,
        ),
        (
            REG_PACKETCONFIG2,
            RF_PACKET2_RXRESTARTDELAY_2BITS | RF_PACKET2_AUTORXRESTART_ON,
        ),
        (REG_TESTDAGC, RF_DAGC_IMPROVED_LOWBETA0),
    ]
}
