//! Structured telemetry initialisation for the daemon.
//!
//! Diagnostics go to stderr, or to the configured error log, filtered by the
//! configured `EnvFilter` expression. When an access log is configured, the
//! `webdavd::access` target is routed there instead.

use std::fs::{File, OpenOptions};
use std::io::{self, IsTerminal};
use std::sync::Mutex;

use camino::{Utf8Path, Utf8PathBuf};
use once_cell::sync::OnceCell;
use tracing::Level;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::fmt::{self, time::UtcTime, writer::BoxMakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use webdavd_config::{Config, LogFormat};

use crate::dispatch::ACCESS_TARGET;

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

/// Handle returned when telemetry has been initialised.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to parse the configured log filter expression.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// A log file could not be opened for appending.
    #[error("failed to open log file {path}: {source}")]
    LogFile {
        /// Log file path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Failed to install the tracing subscriber.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Configures the global tracing subscriber when invoked for the first time.
///
/// Later calls return a fresh [`TelemetryHandle`] without touching the
/// global state again.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter does not parse, a log file
/// cannot be opened, or another subscriber is already installed.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| install_subscriber(config))
        .map(|_| TelemetryHandle)
}

fn install_subscriber(config: &Config) -> Result<(), TelemetryError> {
    let access_log = config.access_log().map(open_log).transpose()?;

    let mut directives = config.log_filter().to_owned();
    if access_log.is_some() {
        directives.push_str(&format!(",{ACCESS_TARGET}=off"));
    }
    let filter = EnvFilter::try_new(&directives)
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;

    let (writer, ansi) = match config.error_log() {
        Some(path) => (BoxMakeWriter::new(Mutex::new(open_log(path)?)), false),
        None => (BoxMakeWriter::new(io::stderr), io::stderr().is_terminal()),
    };

    let mut layers: Vec<BoxedLayer> = vec![diagnostics_layer(
        config.log_format(),
        writer,
        ansi,
        filter,
    )];
    if let Some(file) = access_log {
        layers.push(access_layer(file));
    }

    let subscriber = Registry::default().with(layers);
    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}

fn diagnostics_layer(
    format: LogFormat,
    writer: BoxMakeWriter,
    ansi: bool,
    filter: EnvFilter,
) -> BoxedLayer {
    let builder = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(writer)
        .with_ansi(ansi)
        .with_timer(UtcTime::rfc_3339());
    match format {
        LogFormat::Json => builder
            .json()
            .flatten_event(true)
            .with_filter(filter)
            .boxed(),
        LogFormat::Compact => builder.compact().with_filter(filter).boxed(),
    }
}

fn access_layer(file: File) -> BoxedLayer {
    fmt::layer()
        .json()
        .flatten_event(true)
        .with_target(false)
        .with_level(false)
        .with_ansi(false)
        .with_timer(UtcTime::rfc_3339())
        .with_writer(Mutex::new(file))
        .with_filter(Targets::new().with_target(ACCESS_TARGET, Level::INFO))
        .boxed()
}

fn open_log(path: &Utf8Path) -> Result<File, TelemetryError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| TelemetryError::LogFile {
            path: path.to_path_buf(),
            source,
        })
}
