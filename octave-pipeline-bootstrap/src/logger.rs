// /////////////////////////////////////////////////////////////////////////////
// octave
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Bootstrap Logger
//!
//! A lightweight logging abstraction for the bootstrap phase, in the spirit
//! of the teacher crate's `bootstrap::logger`: a trait so bootstrap-phase
//! decisions (which flags parsed, which bucket URL resolved) can be asserted
//! in tests without routing through a global `tracing` subscriber, plus a
//! `ConsoleLogger` that forwards to `tracing` for anything that actually
//! runs as a process.

pub trait BootstrapLogger: Send + Sync {
    fn error(&self, message: &str);
    fn warn(&self, message: &str);
    fn info(&self, message: &str);
    fn debug(&self, message: &str);
}

/// Routes bootstrap-phase messages through `tracing`, under the `bootstrap`
/// target, so they interleave with the pipeline's own spans/events once
/// `init_tracing` has installed a subscriber.
pub struct ConsoleLogger {
    prefix: String,
}

impl ConsoleLogger {
    pub fn new() -> Self {
        Self::with_prefix("bootstrap")
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }
}

impl Default for ConsoleLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl BootstrapLogger for ConsoleLogger {
    fn error(&self, message: &str) {
        tracing::error!(target: "bootstrap", "[{}] {}", self.prefix, message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "bootstrap", "[{}] {}", self.prefix, message);
    }

    fn info(&self, message: &str) {
        tracing::info!(target: "bootstrap", "[{}] {}", self.prefix, message);
    }

    fn debug(&self, message: &str) {
        tracing::debug!(target: "bootstrap", "[{}] {}", self.prefix, message);
    }
}

/// Discards every message. Used by tests that exercise bootstrap logic
/// without wanting log noise.
#[derive(Default)]
pub struct NoOpLogger;

impl BootstrapLogger for NoOpLogger {
    fn error(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
    fn info(&self, _message: &str) {}
    fn debug(&self, _message: &str) {}
}

/// Installs a `tracing-subscriber` `fmt` subscriber reading its filter from
/// `RUST_LOG` (default `info`), matching the teacher's process-entry-point
/// logging setup. Returns an error rather than panicking if a global
/// subscriber is already installed, so tests that call this more than once
/// in the same process don't abort.
pub fn init_tracing() -> Result<(), tracing_subscriber::util::TryInitError> {
    use tracing_subscriber::{fmt, EnvFilter};

    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingLogger {
        messages: Arc<Mutex<Vec<String>>>,
    }

    impl BootstrapLogger for RecordingLogger {
        fn error(&self, message: &str) {
            self.messages.lock().unwrap().push(format!("error: {message}"));
        }
        fn warn(&self, message: &str) {
            self.messages.lock().unwrap().push(format!("warn: {message}"));
        }
        fn info(&self, message: &str) {
            self.messages.lock().unwrap().push(format!("info: {message}"));
        }
        fn debug(&self, message: &str) {
            self.messages.lock().unwrap().push(format!("debug: {message}"));
        }
    }

    #[test]
    fn a_no_op_logger_discards_everything() {
        let logger = NoOpLogger;
        logger.error("x");
        logger.warn("x");
        logger.info("x");
        logger.debug("x");
    }

    #[test]
    fn a_custom_logger_receives_every_level() {
        let logger = RecordingLogger::default();
        logger.info("starting");
        logger.warn("heads up");
        logger.error("boom");
        let messages = logger.messages.lock().unwrap().clone();
        assert_eq!(messages, vec!["info: starting", "warn: heads up", "error: boom"]);
    }
}
