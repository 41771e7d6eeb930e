//! # Setup and Transmit Tests
//!
//! End-to-end driver behaviour against the in-memory board: setup with the
//! band presets, framed transmit, and a frame carried from one radio to
//! another.

use rfm69_link::hal::fake::{FailOn, FakeBoard, Transaction};
use rfm69_link::logging::{silent_sink, LogSink};
use rfm69_link::radio::power::power_setting;
use rfm69_link::radio::presets::{config_for, Band};
use rfm69_link::radio::registers::*;
use rfm69_link::{Mode, Radio, RadioConfig, RadioError};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

fn fast_config(node_address: u8) -> RadioConfig {
    RadioConfig {
        node_address,
        reset_hold_us: 1,
        reset_settle_ms: 0,
        ..RadioConfig::default()
    }
}

fn capture_sink() -> (LogSink, Arc<Mutex<Vec<String>>>) {
    let lines = Arc::new(Mutex::new(Vec::new()));
    let captured = lines.clone();
    let sink: LogSink = Arc::new(move |message: &str| {
        captured.lock().unwrap().push(message.to_string());
    });
    (sink, lines)
}

#[tokio::test]
async fn test_setup_applies_band_preset() {
    let board = FakeBoard::new();
    let config = RadioConfig {
        band: Band::Mhz915,
        ..fast_config(1)
    };
    let mut radio = Radio::new(board.clone(), silent_sink(), config);
    radio.setup().await.unwrap();

    assert_eq!(board.register(REG_FRFMSB), 0xE4);
    assert_eq!(board.register(REG_FRFMID), 0xC0);
    assert_eq!(board.register(REG_FRFLSB), 0x00);
    assert_eq!(board.register(REG_PAYLOADLENGTH), 66);
    assert_eq!(board.register(REG_PALEVEL), power_setting(13).pa_level());
    assert_eq!(board.register(REG_OCP), RF_OCP_ON);
    assert_eq!(radio.mode(), Some(Mode::Standby));
}

#[tokio::test]
async fn test_setup_narrates_handshake_and_recipe() {
    let board = FakeBoard::new();
    let (sink, lines) = capture_sink();
    let mut radio = Radio::new(board, sink, fast_config(1));
    radio.setup().await.unwrap();

    let lines = lines.lock().unwrap();
    assert!(lines.iter().any(|l| l.starts_with("sync 0xAA")));
    assert!(lines.iter().any(|l| l.starts_with("sync 0x55")));
    let recipe_lines = lines.iter().filter(|l| l.starts_with("config ")).count();
    assert_eq!(recipe_lines, config_for(Band::Mhz433, 100_000).len());
}

#[tokio::test]
async fn test_setup_fails_when_sync_never_latches() {
    let board = FakeBoard::new();
    board.refuse_sync_writes(u32::MAX);
    let mut radio = Radio::new(board.clone(), silent_sink(), fast_config(1));

    let err = radio.setup().await.unwrap_err();
    assert!(matches!(err, RadioError::NotSyncing { sentinel: 0xAA, attempts: 15 }));
    // Nothing from the recipe reached the chip.
    assert!(!board
        .register_writes()
        .iter()
        .any(|(reg, _)| *reg == REG_FRFMSB));
}

#[tokio::test]
async fn test_setup_succeeds_on_last_attempt() {
    let board = FakeBoard::new();
    board.refuse_sync_writes(13);
    let mut radio = Radio::new(board, silent_sink(), fast_config(1));
    assert!(radio.setup().await.is_ok());
}

#[tokio::test]
async fn test_setup_reports_spi_failure() {
    let board = FakeBoard::new();
    board.fail_on(FailOn::Transfer(1));
    let mut radio = Radio::new(board, silent_sink(), fast_config(1));

    let err = radio.setup().await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Bus error during read 0x2F: SPI transfer failed: injected failure"
    );
}

#[tokio::test]
async fn test_send_restores_power_each_time() {
    let board = FakeBoard::new();
    let mut radio = Radio::new(board.clone(), silent_sink(), fast_config(1));
    radio.setup().await.unwrap();
    radio.set_tx_power(20).unwrap();

    for _ in 0..2 {
        board.clear_journal();
        radio.send(3, b"ping").await.unwrap();
        let writes = board.register_writes();
        let boost = power_setting(20).recipe();
        let start = writes
            .windows(4)
            .position(|w| w == boost)
            .expect("boost recipe written");
        let tx = writes
            .iter()
            .position(|w| *w == (REG_OPMODE, RF_OPMODE_TRANSMITTER))
            .unwrap();
        assert!(start < tx);
        assert_eq!(board.register(REG_OCP), RF_OCP_ON);
    }

    assert_eq!(radio.stats().packets_sent, 2);
    assert_eq!(radio.mode(), Some(Mode::Standby));
}

#[tokio::test]
async fn test_send_writes_frame_in_one_burst() {
    let board = FakeBoard::new();
    let mut radio = Radio::new(board.clone(), silent_sink(), fast_config(1));
    radio.setup().await.unwrap();
    board.clear_journal();

    radio.send(2, b"abc123").await.unwrap();
    let bursts: Vec<_> = board
        .journal()
        .into_iter()
        .filter(|t| matches!(t, Transaction::FifoWrite(_)))
        .collect();
    assert_eq!(
        bursts,
        vec![Transaction::FifoWrite(vec![
            9, 2, 1, 0, b'a', b'b', b'c', b'1', b'2', b'3'
        ])]
    );
}

#[tokio::test]
async fn test_frame_carried_between_radios() {
    let sender_board = FakeBoard::new();
    let mut sender = Radio::new(sender_board.clone(), silent_sink(), fast_config(0x10));
    sender.setup().await.unwrap();
    sender.send(0x20, b"hello").await.unwrap();

    let receiver_board = FakeBoard::new();
    for frame in sender_board.transmitted() {
        receiver_board.queue_air_frame(100, &frame);
    }
    let mut receiver = Radio::new(receiver_board, silent_sink(), fast_config(0x20));
    receiver.setup().await.unwrap();

    let (tx, mut rx) = mpsc::channel(1);
    let pipeline = tokio::spawn(async move { receiver.receive(tx).await });

    let packet = timeout(Duration::from_secs(2), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(packet.src, 0x10);
    assert_eq!(packet.dst, 0x20);
    assert_eq!(packet.rssi, -50);
    assert_eq!(packet.payload, b"hello");

    let record = packet.to_cbor().unwrap();
    assert_eq!(rfm69_link::Packet::from_cbor(&record).unwrap(), packet);

    drop(rx);
    assert!(pipeline.await.unwrap().is_ok());
}
