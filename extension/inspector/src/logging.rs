//! Routes `tracing` output to the browser console.

use std::io;

use tracing::{Level, Metadata};
use tracing_subscriber::fmt::MakeWriter;

/// Writer factory picking the console method from the event level.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleMakeWriter;

/// Buffers one formatted event and hands it to the console on drop.
pub struct ConsoleWriter {
	level: Level,
	buffer: Vec<u8>,
}

impl io::Write for ConsoleWriter {
	fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
		self.buffer.extend_from_slice(bytes);
		Ok(bytes.len())
	}

	fn flush(&mut self) -> io::Result<()> {
		Ok(())
	}
}

impl Drop for ConsoleWriter {
	fn drop(&mut self) {
		let text = String::from_utf8_lossy(&self.buffer);
		let line = text.trim_end();
		if line.is_empty() {
			return;
		}
		let line = line.into();
		match self.level {
			Level::ERROR => web_sys::console::error_1(&line),
			Level::WARN => web_sys::console::warn_1(&line),
			Level::INFO => web_sys::console::info_1(&line),
			_ => web_sys::console::debug_1(&line),
		}
	}
}

impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
	type Writer = ConsoleWriter;

	fn make_writer(&'a self) -> Self::Writer {
		ConsoleWriter {
			level: Level::INFO,
			buffer: Vec::new(),
		}
	}

	fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
		ConsoleWriter {
			level: *meta.level(),
			buffer: Vec::new(),
		}
	}
}

/// Installs the console subscriber. A second call is a no-op.
pub fn init_logging() {
	let subscriber = tracing_subscriber::fmt()
		.with_writer(ConsoleMakeWriter)
		.without_time()
		.with_target(false)
		.with_max_level(Level::DEBUG)
		.finish();
	// another subscriber may already be installed by the embedding page
	let _ = tracing::subscriber::set_global_default(subscriber);
}
