//! # Link-Layer Frames
//!
//! On air (and in the FIFO) a frame is:
//!
//! ```text
//! ┌────────┬─────┬─────┬─────┬──────────────┐
//! │ length │ dst │ src │ ctl │ payload ...  │
//! └────────┴─────┴─────┴─────┴──────────────┘
//! ```
//!
//! `length` counts everything after itself, so it is the payload length
//! plus three. The control byte carries the chip-level ack flag; this driver
//! always sends zero and does not interpret it on receive.

use crate::error::{FrameError, RadioError};
use serde::{Deserialize, Serialize};

/// dst + src + ctl
pub const HEADER_LEN: usize = 3;

/// Largest payload that fits behind the header in a single length byte.
///
/// The receiving chip enforces its own limit: with the bundled presets
/// (REG_PAYLOADLENGTH = 66, the FIFO size) a peer drops any frame carrying
/// more than 63 payload bytes.
pub const MAX_PAYLOAD: usize = u8::MAX as usize - HEADER_LEN;

/// A received frame with its signal strength
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    #[serde(rename = "Src")]
    pub src: u8,
    #[serde(rename = "Dst")]
    pub dst: u8,
    #[serde(rename = "RSSI")]
    pub rssi: i32,
    #[serde(rename = "Payload")]
    pub payload: Vec<u8>,
}

impl Packet {
    /// Encode as a CBOR map keyed `Src`/`Dst`/`RSSI`/`Payload`.
    pub fn to_cbor(&self) -> Result<Vec<u8>, RadioError> {
        let mut out = Vec::new();
        ciborium::ser::into_writer(self, &mut out)
            .map_err(|e| RadioError::Config(format!("CBOR encode failed: {e}")))?;
        Ok(out)
    }

    pub fn from_cbor(bytes: &[u8]) -> Result<Self, RadioError> {
        ciborium::de::from_reader(bytes)
            .map_err(|e| RadioError::Config(format!("CBOR decode failed: {e}")))
    }
}

/// The four header bytes drained ahead of the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub length: u8,
    pub dst: u8,
    pub src: u8,
    pub ctl: u8,
}

impl FrameHeader {
    /// Parse `[length, dst, src, ctl]` (echo byte already stripped).
    pub fn parse(bytes: [u8; 4]) -> Result<Self, FrameError> {
        let [length, dst, src, ctl] = bytes;
        if usize::from(length) < HEADER_LEN {
            return Err(FrameError::HeaderTooShort { length });
        }
        Ok(Self {
            length,
            dst,
            src,
            ctl,
        })
    }

    /// Payload bytes still waiting in the FIFO
    pub fn payload_len(&self) -> usize {
        usize::from(self.length) - HEADER_LEN
    }
}

/// Build the FIFO image for one frame, length byte first.
pub fn encode_frame(dst: u8, src: u8, payload: &[u8]) -> Result<Vec<u8>, RadioError> {
    if payload.len() > MAX_PAYLOAD {
        return Err(RadioError::PayloadTooLarge {
            len: payload.len(),
            max: MAX_PAYLOAD,
        });
    }

    let mut frame = Vec::with_capacity(1 + HEADER_LEN + payload.len());
    frame.push((payload.len() + HEADER_LEN) as u8);
    frame.push(dst);
    frame.push(src);
    frame.push(0); // ack/control
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// REG_RSSIVALUE holds -2 x dBm; integer division truncates toward zero.
pub fn rssi_dbm(raw: u8) -> i32 {
    -i32::from(raw) / 2
}
