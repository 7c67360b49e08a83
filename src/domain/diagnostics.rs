//! Level-filtered diagnostics emitted through `tracing`.
//!
//! Nothing is formatted or emitted unless diagnostics are enabled and the
//! event's level is within the configured verbosity.

use serde_json::Value;

use super::options::{DebugLevel, DebugOptions};

/// Copyable handle carrying the diagnostics settings of one options set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Diagnostics {
    enabled: bool,
    level: DebugLevel,
}

impl Diagnostics {
    pub fn new(options: &DebugOptions) -> Self {
        Self {
            enabled: options.enabled,
            level: options.level,
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    /// Whether an event at `level` would be emitted.
    pub fn is_enabled_for(&self, level: DebugLevel) -> bool {
        self.enabled && level != DebugLevel::Silent && level <= self.level
    }

    pub fn log(&self, level: DebugLevel, context: &str, message: &str, payload: Option<&Value>) {
        if !self.is_enabled_for(level) {
            return;
        }

        let payload = payload.map(Value::to_string).unwrap_or_default();
        match level {
            DebugLevel::Error => {
                tracing::error!(target: "nosql_sanitize", context, payload = %payload, "{message}")
            }
            DebugLevel::Warn => {
                tracing::warn!(target: "nosql_sanitize", context, payload = %payload, "{message}")
            }
            DebugLevel::Info => {
                tracing::info!(target: "nosql_sanitize", context, payload = %payload, "{message}")
            }
            DebugLevel::Debug => {
                tracing::debug!(target: "nosql_sanitize", context, payload = %payload, "{message}")
            }
            DebugLevel::Trace => {
                tracing::trace!(target: "nosql_sanitize", context, payload = %payload, "{message}")
            }
            DebugLevel::Silent => {}
        }
    }

    pub fn error(&self, context: &str, message: &str, payload: Option<&Value>) {
        self.log(DebugLevel::Error, context, message, payload);
    }

    pub fn warn(&self, context: &str, message: &str, payload: Option<&Value>) {
        self.log(DebugLevel::Warn, context, message, payload);
    }

    pub fn info(&self, context: &str, message: &str, payload: Option<&Value>) {
        self.log(DebugLevel::Info, context, message, payload);
    }

    pub fn debug(&self, context: &str, message: &str, payload: Option<&Value>) {
        self.log(DebugLevel::Debug, context, message, payload);
    }

    pub fn trace(&self, context: &str, message: &str, payload: Option<&Value>) {
        self.log(DebugLevel::Trace, context, message, payload);
    }
}

/// In-memory log sink for asserting on what was emitted.
#[cfg(test)]
pub(crate) mod testing {
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Debug, Clone, Default)]
    pub(crate) struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        /// A subscriber writing every event, unformatted by color or time,
        /// into this sink. Install it with `with_default` or `set_default`.
        pub(crate) fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync {
            tracing_subscriber::fmt()
                .with_writer(self.clone())
                .with_max_level(tracing::Level::TRACE)
                .with_ansi(false)
                .without_time()
                .finish()
        }

        pub(crate) fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }
}
