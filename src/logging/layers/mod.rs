use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use tracing::Subscriber;
use tracing_subscriber::fmt::{self as tracing_fmt, writer::BoxMakeWriter};
use tracing_subscriber::layer::Layer;
use tracing_subscriber::registry::LookupSpan;

pub mod console;
pub mod file;

/// Boxed layer type that can wrap any concrete subscriber layer.
pub type BoxLayer<S> = Box<dyn Layer<S> + Send + Sync>;

/// Line format of a log sink.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!(
                "invalid log format '{}'; supported values are text, json",
                value
            )),
        }
    }
}

/// Build a fmt layer writing to `writer` in the requested format.
pub(crate) fn fmt_layer<S>(writer: BoxMakeWriter, format: LogFormat) -> BoxLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a> + 'static,
{
    let layer = tracing_fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false);
    match format {
        LogFormat::Text => Box::new(layer),
        LogFormat::Json => Box::new(layer.json().with_current_span(false)),
    }
}
