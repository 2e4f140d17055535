use crate::logging::context::ExecutionContext;
use crate::logging::layers::{fmt_layer, BoxLayer, LogFormat};
use serde::Deserialize;
use std::fmt;
use std::io;
use std::str::FromStr;
use tracing::Subscriber;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::registry::LookupSpan;

#[cfg(test)]
use std::io::Write;

#[cfg(test)]
use std::sync::{Arc, Mutex, OnceLock};

/// Where console logs should be emitted.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleOutput {
    Stdout,
    #[default]
    Stderr,
    None,
}

impl fmt::Display for ConsoleOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsoleOutput::Stdout => write!(f, "stdout"),
            ConsoleOutput::Stderr => write!(f, "stderr"),
            ConsoleOutput::None => write!(f, "none"),
        }
    }
}

impl FromStr for ConsoleOutput {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "stdout" => Ok(ConsoleOutput::Stdout),
            "stderr" => Ok(ConsoleOutput::Stderr),
            "none" => Ok(ConsoleOutput::None),
            _ => Err(format!(
                "invalid logging.console_output '{}'; supported values are stdout, stderr, none",
                value
            )),
        }
    }
}

/// Derive the console output sink from the execution context and optional user override.
///
/// Command results go to stdout, so logs default to stderr.
pub fn select_console_output(
    context: ExecutionContext,
    configured: Option<ConsoleOutput>,
) -> ConsoleOutput {
    match configured {
        Some(output) => output,
        None if context.disables_console() => ConsoleOutput::None,
        None => ConsoleOutput::Stderr,
    }
}

/// Build the console tracing layer for the provided subscriber type.
pub fn console_layer<S>(output: ConsoleOutput, format: LogFormat) -> BoxLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a> + 'static,
{
    let make_writer = test_override_writer().unwrap_or_else(|| match output {
        ConsoleOutput::Stdout => BoxMakeWriter::new(io::stdout),
        ConsoleOutput::Stderr => BoxMakeWriter::new(io::stderr),
        ConsoleOutput::None => BoxMakeWriter::new(io::sink),
    });
    fmt_layer(make_writer, format)
}

fn test_override_writer() -> Option<BoxMakeWriter> {
    #[cfg(test)]
    {
        if let Some(slot) = TEST_OUTPUT.get() {
            if let Some(buffer) = slot.lock().unwrap().clone() {
                return Some(BoxMakeWriter::new(move || CaptureWriter(buffer.clone())));
            }
        }
    }
    None
}

#[cfg(test)]
static TEST_OUTPUT: OnceLock<Mutex<Option<Arc<Mutex<Vec<u8>>>>>> = OnceLock::new();

/// Route console output into `buffer` until [`clear_test_output`] is called.
#[cfg(test)]
pub fn set_test_output(buffer: Arc<Mutex<Vec<u8>>>) {
    TEST_OUTPUT
        .get_or_init(|| Mutex::new(None))
        .lock()
        .unwrap()
        .replace(buffer);
}

#[cfg(test)]
pub fn clear_test_output() {
    if let Some(slot) = TEST_OUTPUT.get() {
        slot.lock().unwrap().take();
    }
}

#[cfg(test)]
struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

#[cfg(test)]
impl Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
