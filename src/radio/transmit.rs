//! Transmit path: stage one frame in the FIFO and key the transmitter.

use super::frame::encode_frame;
use super::mode::Mode;
use super::registers::*;
use super::Radio;
use crate::error::RadioError;
use crate::hal::Board;
use log::debug;

impl<B: Board> Radio<B> {
    /// Send `payload` to `dst`.
    ///
    /// The configured power is restored before keying up and the chip is
    /// left in standby at the idle power level afterwards. A bus failure
    /// aborts the send; the FIFO is cleared again by the next call.
    ///
    /// Payloads up to [`MAX_PAYLOAD`](super::frame::MAX_PAYLOAD) bytes are
    /// accepted, but a receiver running the bundled presets only takes 63.
    pub async fn send(&mut self, dst: u8, payload: &[u8]) -> Result<(), RadioError> {
        let frame = encode_frame(dst, self.node_address, payload)?;

        self.request_mode(Mode::Standby)?;
        self.wait_mode_ready().await?;
        self.write_register(REG_IRQFLAGS2, IrqFlags2::FIFO_OVERRUN.bits())?;

        self.apply_power(self.tx_power_dbm)?;
        self.write_register(REG_DIOMAPPING1, RF_DIOMAPPING1_DIO0_00)?;

        self.narrate(&format!("tx -> 0x{dst:02X}: {}", hex::encode(&frame)));
        self.burst_write(REG_FIFO, &frame)?;

        self.request_mode(Mode::Transmit)?;
        self.wait_packet_sent().await?;

        self.request_mode(Mode::Standby)?;
        self.wait_mode_ready().await?;
        self.apply_power(self.config.idle_power_dbm)?;

        self.stats.packets_sent += 1;
        debug!("Sent {} byte payload to 0x{dst:02X}", payload.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RadioConfig;
    use crate::hal::fake::{FailOn, FakeBoard, Transaction};
    use crate::logging::silent_sink;
    use crate::radio::frame::MAX_PAYLOAD;
    use crate::radio::power::power_setting;

    fn radio() -> (Radio<FakeBoard>, FakeBoard) {
        let board = FakeBoard::new();
        let config = RadioConfig {
            node_address: 1,
            ..RadioConfig::default()
        };
        (Radio::new(board.clone(), silent_sink(), config), board)
    }

    #[tokio::test]
    async fn test_send_stages_frame() {
        let (mut radio, board) = radio();
        radio.send(2, b"abc123").await.unwrap();

        assert_eq!(
            board.transmitted(),
            vec![vec![9, 2, 1, 0, b'a', b'b', b'c', b'1', b'2', b'3']]
        );
        assert_eq!(radio.stats().packets_sent, 1);
        assert_eq!(radio.mode(), Some(Mode::Standby));
    }

    #[tokio::test]
    async fn test_send_step_order() {
        let (mut radio, board) = radio();
        radio.send(2, b"hi").await.unwrap();

        let journal = board.journal();
        let position = |wanted: &Transaction| {
            journal
                .iter()
                .position(|t| t == wanted)
                .unwrap_or_else(|| panic!("missing {wanted:?}"))
        };

        let clear = position(&Transaction::Write(REG_IRQFLAGS2, 0x10));
        let power = position(&Transaction::Write(REG_PALEVEL, power_setting(13).pa_level()));
        let dio = position(&Transaction::Write(REG_DIOMAPPING1, 0x00));
        let fifo = position(&Transaction::FifoWrite(vec![5, 2, 1, 0, b'h', b'i']));
        let tx = position(&Transaction::Write(REG_OPMODE, RF_OPMODE_TRANSMITTER));
        assert!(clear < power && power < dio && dio < fifo && fifo < tx);

        // Ends at idle power.
        let writes = board.register_writes();
        let idle = power_setting(-2).recipe();
        assert_eq!(&writes[writes.len() - 4..], &idle[..]);
    }

    #[tokio::test]
    async fn test_send_rejects_oversized_payload_before_bus() {
        let (mut radio, board) = radio();
        let err = radio.send(2, &[0u8; MAX_PAYLOAD + 1]).await.unwrap_err();
        assert!(matches!(err, RadioError::PayloadTooLarge { .. }));
        assert!(board.journal().is_empty());
    }

    #[tokio::test]
    async fn test_send_surfaces_bus_failure() {
        let (mut radio, board) = radio();
        board.fail_on(FailOn::Write(REG_DIOMAPPING1));
        let err = radio.send(2, b"x").await.unwrap_err();
        assert!(err.is_bus_fault());
        assert!(board.transmitted().is_empty());
        assert_eq!(radio.stats().packets_sent, 0);
    }

    #[tokio::test]
    async fn test_packet_sent_wait_is_bounded() {
        let board = FakeBoard::new();
        board.stall_packet_sent(true);
        let config = RadioConfig {
            packet_sent_timeout_ms: 10,
            ..RadioConfig::default()
        };
        let mut radio = Radio::new(board, silent_sink(), config);

        let err = radio.send(2, b"x").await.unwrap_err();
        assert!(matches!(
            err,
            RadioError::Timeout {
                waiting_for: "packet sent",
                ..
            }
        ));
    }
}
