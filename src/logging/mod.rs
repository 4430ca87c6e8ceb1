use crate::config::EnvConfig;
use std::io;

/// Buffers one formatted event and hands it to `console.log` when dropped.
#[derive(Default)]
pub(crate) struct ConsoleWriter {
    buf: Vec<u8>,
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let line = String::from_utf8_lossy(&self.buf);
        emit(line.trim_end());
    }
}

#[cfg(target_arch = "wasm32")]
fn emit(line: &str) {
    web_sys::console::log_1(&line.into());
}

#[cfg(not(target_arch = "wasm32"))]
fn emit(line: &str) {
    eprintln!("{line}");
}

/// Installs the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub(crate) fn init(cfg: &EnvConfig) {
    // No timer: `SystemTime::now` is unavailable on wasm32-unknown-unknown.
    let result = tracing_subscriber::fmt()
        .with_max_level(cfg.max_level())
        .with_writer(ConsoleWriter::default)
        .with_ansi(false)
        .with_target(false)
        .without_time()
        .try_init();

    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
