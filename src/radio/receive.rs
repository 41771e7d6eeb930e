//! # Receive Pipeline
//!
//! Two tasks cooperate:
//!
//! - the **edge thread** waits on DIO0 and hands each rising edge to the
//!   loop. It belongs to the [`Radio`], starts on the first `receive` and
//!   is reused by later calls
//! - the **receive loop** owns the radio: it arms the receiver, waits for an
//!   edge, drains one frame from the FIFO and emits a [`Packet`]
//!
//! The handoff is a rendezvous. The edge thread posts an acknowledgement
//! sender and then blocks until the loop has taken it, so at most one edge
//! is ever outstanding and an edge that fires while the loop is still
//! arming is delivered once the loop reaches its wait point.
//!
//! The edge thread is a plain OS thread rather than a runtime task, so a
//! line stuck in its wait never holds up runtime shutdown. It waits in
//! bounded slices and exits once its [`Radio`] is dropped.

use super::frame::{rssi_dbm, FrameHeader, Packet};
use super::mode::Mode;
use super::registers::*;
use super::Radio;
use crate::config::CorruptFramePolicy;
use crate::error::RadioError;
use crate::hal::{Board, InterruptLine};
use log::{debug, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

type EdgeEvent = oneshot::Sender<()>;

/// Longest single wait on DIO0 before the edge thread rechecks shutdown
const EDGE_WAIT: Duration = Duration::from_millis(100);

/// Edge thread owned by a [`Radio`]
pub(super) struct EdgeTask {
    events: mpsc::Receiver<EdgeEvent>,
    shutdown: Arc<AtomicBool>,
    thread: thread::JoinHandle<()>,
}

impl EdgeTask {
    fn spawn(line: Arc<dyn InterruptLine>) -> Result<Self, RadioError> {
        let (events_tx, events) = mpsc::channel(1);
        let shutdown = Arc::new(AtomicBool::new(false));
        let stop = shutdown.clone();
        let thread = thread::Builder::new()
            .name("rfm69-dio0".to_string())
            .spawn(move || forward_edges(line, events_tx, stop))?;
        Ok(Self {
            events,
            shutdown,
            thread,
        })
    }

    fn is_running(&self) -> bool {
        !self.thread.is_finished()
    }

    /// Release edges left over from before this run; the arm step deals
    /// with whatever they announced.
    fn discard_stale(&mut self) {
        while let Ok(ack) = self.events.try_recv() {
            debug!("Discarding DIO0 edge from an earlier run");
            let _ = ack.send(());
        }
    }
}

impl Drop for EdgeTask {
    fn drop(&mut self) {
        // Signalled, not joined.
        self.shutdown.store(true, Ordering::Release);
    }
}

impl<B: Board> Radio<B> {
    /// Run the receive pipeline, delivering packets in arrival order.
    ///
    /// Returns `Ok(())` once `packets` is closed by the consumer; the
    /// pipeline can then be started again with a new channel. Any bus
    /// failure stops the pipeline and is returned; corrupted frames follow
    /// [`RadioConfig::on_corrupt_frame`](crate::RadioConfig).
    pub async fn receive(&mut self, packets: mpsc::Sender<Packet>) -> Result<(), RadioError> {
        let running = self.edges.as_ref().map_or(false, EdgeTask::is_running);
        if !running {
            self.edges = Some(EdgeTask::spawn(self.board.interrupt_line())?);
        }
        if let Some(edges) = self.edges.as_mut() {
            edges.discard_stale();
        }

        let result = self.receive_loop(&packets).await;
        if let Err(e) = &result {
            warn!("Receive pipeline stopped: {e}");
        }
        result
    }

    async fn receive_loop(&mut self, packets: &mpsc::Sender<Packet>) -> Result<(), RadioError> {
        loop {
            self.arm_receiver()?;

            let edges = self.edges.as_mut().ok_or(RadioError::EdgeTaskStopped)?;
            let ack = tokio::select! {
                event = edges.events.recv() => event.ok_or(RadioError::EdgeTaskStopped)?,
                _ = packets.closed() => return Ok(()),
            };
            // The edge thread only needs to know the event was taken.
            let _ = ack.send(());

            let packet = match self.drain_frame() {
                Ok(packet) => packet,
                Err(RadioError::Frame(e))
                    if self.config.on_corrupt_frame == CorruptFramePolicy::Skip =>
                {
                    self.stats.frames_dropped += 1;
                    self.write_register(REG_IRQFLAGS2, IrqFlags2::FIFO_OVERRUN.bits())?;
                    if self.warn_throttle.allow() {
                        warn!("Dropping corrupted frame: {e}");
                    }
                    continue;
                }
                Err(e) => return Err(e),
            };

            self.stats.packets_received += 1;
            self.stats.last_rssi_dbm = Some(packet.rssi);
            if packets.send(packet).await.is_err() {
                return Ok(());
            }
        }
    }

    fn arm_receiver(&mut self) -> Result<(), RadioError> {
        let flags = IrqFlags2::from_bits_truncate(self.read_register(REG_IRQFLAGS2)?);
        if flags.contains(IrqFlags2::PAYLOAD_READY) {
            self.narrate("payload ready already set, restarting receiver");
            let landed = self.poke_register(REG_PACKETCONFIG2, |v| {
                (v & !RF_PACKET2_RXRESTART) | RF_PACKET2_RXRESTART
            })?;
            if landed {
                self.stats.receiver_restarts += 1;
            }
        }

        self.write_register(REG_DIOMAPPING1, RF_DIOMAPPING1_DIO0_01)?;
        self.request_mode(Mode::Receive)?;
        self.write_register(REG_TESTPA1, TESTPA1_NORMAL)?;
        self.write_register(REG_TESTPA2, TESTPA2_NORMAL)
    }

    fn drain_frame(&mut self) -> Result<Packet, RadioError> {
        let rssi = rssi_dbm(self.read_register(REG_RSSIVALUE)?);

        let head = self.burst_read(REG_FIFO, 4)?;
        let header = FrameHeader::parse([head[0], head[1], head[2], head[3]])?;

        let payload = match header.payload_len() {
            0 => Vec::new(),
            len => self.burst_read(REG_FIFO, len)?,
        };

        self.narrate(&format!(
            "rx <- 0x{:02X} ({rssi} dBm): {}{}",
            header.src,
            hex::encode(&head),
            hex::encode(&payload)
        ));
        debug!(
            "Received {} byte payload from 0x{:02X} to 0x{:02X}",
            payload.len(),
            header.src,
            header.dst
        );

        Ok(Packet {
            src: header.src,
            dst: header.dst,
            rssi,
            payload,
        })
    }
}

/// Body of the edge thread.
fn forward_edges(
    line: Arc<dyn InterruptLine>,
    events: mpsc::Sender<EdgeEvent>,
    shutdown: Arc<AtomicBool>,
) {
    while !shutdown.load(Ordering::Acquire) {
        if !line.wait_for_edge(EDGE_WAIT) {
            continue;
        }
        let (ack_tx, ack_rx) = oneshot::channel();
        if events.blocking_send(ack_tx).is_err() {
            break;
        }
        if ack_rx.blocking_recv().is_err() {
            break;
        }
    }
    debug!("Interrupt edge thread exiting");
}
