//! # Logging
//!
//! The radio core never writes to a logger directly for narration; it is handed
//! a [`LogSink`] callback at construction. The helpers here build the usual
//! sinks and install `env_logger` for the binary.

use log::{debug, info, log_enabled, Level};
use std::sync::Arc;
use std::time::Instant;

/// Single-argument narration callback handed to [`Radio`](crate::Radio).
pub type LogSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Target used for narration routed through the `log` facade.
pub const LOG_TARGET: &str = "rfm69";

/// Initializes the logger with the `env_logger` crate.
pub fn init_logger() {
    env_logger::init();
}

/// Sink that forwards narration to `log::debug!` under [`LOG_TARGET`].
pub fn default_sink() -> LogSink {
    Arc::new(|message: &str| {
        debug!(target: LOG_TARGET, "{}", message.trim_end());
    })
}

/// Sink that discards everything.
pub fn silent_sink() -> LogSink {
    Arc::new(|_: &str| {})
}

/// Logs an informational message.
pub fn log_info(message: &str) {
    if log_enabled!(Level::Info) {
        info!("{message}");
    }
}

/// Throttling structure for rate-limiting log messages
///
/// A noisy channel can corrupt many frames per second; the receive loop uses
/// this to keep its warnings readable.
#[derive(Debug)]
pub struct LogThrottle {
    /// Time window for throttling (in milliseconds)
    window_ms: u64,
    /// Maximum messages allowed per window
    cap: u32,
    /// Current message count in window
    count: u32,
    /// Start time of current window
    t0: Instant,
}

impl LogThrottle {
    /// Create new throttle with time window and message cap
    pub fn new(window_ms: u64, cap: u32) -> Self {
        Self {
            window_ms,
            cap,
            count: 0,
            t0: Instant::now(),
        }
    }

    /// Returns `true` if the message should be logged, `false` if it
    /// should be throttled.
    pub fn allow(&mut self) -> bool {
        let elapsed_ms = self.t0.elapsed().as_millis() as u64;

        if elapsed_ms > self.window_ms {
            self.t0 = Instant::now();
            self.count = 0;
        }

        self.count += 1;
        self.count <= self.cap
    }
}
