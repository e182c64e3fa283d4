//! Captures tracing output for assertions in the crate's own tests.

use std::io::{Result as IoResult, Write};
use std::sync::{Arc, Mutex};

use tracing::Level;
use tracing::subscriber::with_default;
use tracing_subscriber::fmt;

struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> IoResult<usize> {
        self.bytes
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}

/// Runs `action`, capturing logs at `max_level` and below without
/// timestamps, and returns the captured lines alongside the closure
/// result.
pub fn capture_logs<F, R>(max_level: Level, action: F) -> (Vec<String>, R)
where
    F: FnOnce() -> R,
{
    let bytes = Arc::new(Mutex::new(Vec::new()));
    let writer_bytes = Arc::clone(&bytes);
    let subscriber = fmt()
        .with_max_level(max_level)
        .without_time()
        .with_writer(move || SharedBuffer {
            bytes: Arc::clone(&writer_bytes),
        })
        .finish();

    let result = with_default(subscriber, action);

    let captured = bytes
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .clone();
    let content = String::from_utf8_lossy(&captured).into_owned();
    let lines = content.lines().map(str::to_owned).collect();
    (lines, result)
}

/// Convenience wrapper over [`capture_logs`] for warning-level capture.
pub fn capture_warn_logs<F, R>(action: F) -> (Vec<String>, R)
where
    F: FnOnce() -> R,
{
    capture_logs(Level::WARN, action)
}
