//! # RFM69 Register Map
//!
//! Addresses and bit fields used by the driver, after the HopeRF RFM69HCW
//! datasheet. Only the subset the driver and its presets touch is listed.

use bitflags::bitflags;

/// Direction bit OR-ed into the address byte for writes.
pub const WRITE_FLAG: u8 = 0x80;

/// Mask that clears the direction bit for reads.
pub const ADDR_MASK: u8 = 0x7F;

pub const REG_FIFO: u8 = 0x00;
pub const REG_OPMODE: u8 = 0x01;
pub const REG_DATAMODUL: u8 = 0x02;
pub const REG_BITRATEMSB: u8 = 0x03;
pub const REG_BITRATELSB: u8 = 0x04;
pub const REG_FDEVMSB: u8 = 0x05;
pub const REG_FDEVLSB: u8 = 0x06;
pub const REG_FRFMSB: u8 = 0x07;
pub const REG_FRFMID: u8 = 0x08;
pub const REG_FRFLSB: u8 = 0x09;
pub const REG_PALEVEL: u8 = 0x11;
pub const REG_OCP: u8 = 0x13;
pub const REG_RXBW: u8 = 0x19;
pub const REG_RSSIVALUE: u8 = 0x24;
pub const REG_DIOMAPPING1: u8 = 0x25;
pub const REG_DIOMAPPING2: u8 = 0x26;
pub const REG_IRQFLAGS1: u8 = 0x27;
pub const REG_IRQFLAGS2: u8 = 0x28;
pub const REG_RSSITHRESH: u8 = 0x29;
pub const REG_SYNCCONFIG: u8 = 0x2E;

/// Sync word byte 1, doubling as the scratch register for the handshake
pub const REG_SYNCVALUE1: u8 = 0x2F;
pub const REG_SYNCVALUE2: u8 = 0x30;
pub const REG_PACKETCONFIG1: u8 = 0x37;
pub const REG_PAYLOADLENGTH: u8 = 0x38;
pub const REG_FIFOTHRESH: u8 = 0x3C;
pub const REG_PACKETCONFIG2: u8 = 0x3D;
pub const REG_TESTPA1: u8 = 0x5A;
pub const REG_TESTPA2: u8 = 0x5C;
pub const REG_TESTDAGC: u8 = 0x6F;

/// Mode field inside REG_OPMODE (bits 4..2)
pub const OPMODE_MODE_MASK: u8 = 0x1C;
pub const RF_OPMODE_STANDBY: u8 = 0x04;
pub const RF_OPMODE_TRANSMITTER: u8 = 0x0C;
pub const RF_OPMODE_RECEIVER: u8 = 0x10;

bitflags! {
    /// REG_IRQFLAGS1 status bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IrqFlags1: u8 {
        const SYNC_ADDRESS_MATCH = 0x01;
        const AUTO_MODE = 0x02;
        const TIMEOUT = 0x04;
        const RSSI = 0x08;
        const PLL_LOCK = 0x10;
        const TX_READY = 0x20;
        const RX_READY = 0x40;
        const MODE_READY = 0x80;
    }
}

bitflags! {
    /// REG_IRQFLAGS2 status bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IrqFlags2: u8 {
        const LOW_BAT = 0x01;
        const CRC_OK = 0x02;
        const PAYLOAD_READY = 0x04;
        const PACKET_SENT = 0x08;
        /// Writing this bit clears the FIFO
        const FIFO_OVERRUN = 0x10;
        const FIFO_LEVEL = 0x20;
        const FIFO_NOT_EMPTY = 0x40;
        const FIFO_FULL = 0x80;
    }
}

bitflags! {
    /// Amplifier enables in REG_PALEVEL; the low five bits hold the level
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PaLevel: u8 {
        const PA0_ON = 0x80;
        const PA1_ON = 0x40;
        const PA2_ON = 0x20;
    }
}

/// Output power field of REG_PALEVEL
pub const PALEVEL_OUTPUT_MASK: u8 = 0x1F;

/// REG_OCP: protection enabled with 95 mA trim
pub const RF_OCP_ON: u8 = 0x1A;
/// REG_OCP: protection disabled, required for the +18..+20 dBm tier
pub const RF_OCP_OFF: u8 = 0x0F;

/// REG_TESTPA1/REG_TESTPA2 values for normal and boosted amplifier bias
pub const TESTPA1_NORMAL: u8 = 0x55;
pub const TESTPA2_NORMAL: u8 = 0x70;
pub const TESTPA1_BOOST: u8 = 0x5D;
pub const TESTPA2_BOOST: u8 = 0x7C;

/// DIO0 mapping 00: PacketSent in TX
pub const RF_DIOMAPPING1_DIO0_00: u8 = 0x00;
/// DIO0 mapping 01: PayloadReady in RX
pub const RF_DIOMAPPING1_DIO0_01: u8 = 0x40;
pub const RF_DIOMAPPING2_CLKOUT_OFF: u8 = 0x07;

/// RestartRx bit in REG_PACKETCONFIG2
pub const RF_PACKET2_RXRESTART: u8 = 0x04;
pub const RF_PACKET2_AUTORXRESTART_ON: u8 = 0x02;
pub const RF_PACKET2_RXRESTARTDELAY_2BITS: u8 = 0x10;

pub const RF_PACKET1_FORMAT_VARIABLE: u8 = 0x80;
pub const RF_PACKET1_CRC_ON: u8 = 0x10;

pub const RF_SYNC_ON: u8 = 0x80;
pub const RF_SYNC_SIZE_2: u8 = 0x08;

pub const RF_FIFOTHRESH_TXSTART_FIFONOTEMPTY: u8 = 0x80;
pub const RF_FIFOTHRESH_VALUE: u8 = 0x0F;

pub const RF_DAGC_IMPROVED_LOWBETA0: u8 = 0x30;

/// Crystal oscillator frequency
pub const FXOSC_HZ: u64 = 32_000_000;

/// FIFO size in bytes
pub const FIFO_SIZE: usize = 66;
