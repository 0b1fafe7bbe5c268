use rotator_core::io::truncate_file;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// `RUST_LOG` refines `default_level`. Console output goes to stdout for the
/// long-running modes and to stderr for one-shot commands so it never mixes
/// with `--json` output. When `log_file` is given it is truncated and gets a
/// plain-text copy of every event.
pub fn init(default_level: tracing::Level, log_file: Option<&Path>, to_stderr: bool) {
    let filter = EnvFilter::from_default_env().add_directive(default_level.into());

    let console_writer = if to_stderr {
        BoxMakeWriter::new(std::io::stderr)
    } else {
        BoxMakeWriter::new(std::io::stdout)
    };
    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(console_writer);

    let (file, file_error) = match log_file.map(truncate_file) {
        Some(Ok(f)) => (
            Some(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(Mutex::new(f)),
            ),
            None,
        ),
        Some(Err(e)) => (None, Some(e)),
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .init();

    if let (Some(path), Some(e)) = (log_file, file_error) {
        tracing::warn!(path = %path.display(), error = %e, "could not open log file");
    }
}
