//! Command-line surface of the daemon binary.

use camino::Utf8PathBuf;
use clap::Parser;
use serde::Deserialize;
use strum::{Display, EnumString};

use crate::defaults::DEFAULT_CONFIG_PATH;

/// Output encoding for log records.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per line, for log shippers.
    #[default]
    Json,
    /// Single line text for terminals.
    Compact,
}

/// Arguments accepted by `webdavd`.
#[derive(Debug, Clone, Parser)]
#[command(name = "webdavd", version, about = "Privilege-separated WebDAV server")]
pub struct DaemonArgs {
    /// Path to the TOML configuration file.
    #[arg(long, env = "WEBDAVD_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: Utf8PathBuf,
    /// `tracing` filter directive, such as `info,webdavd::rap=debug`.
    #[arg(long, env = "WEBDAVD_LOG_FILTER")]
    pub log_filter: Option<String>,
    /// Log record encoding: `json` or `compact`.
    #[arg(long, env = "WEBDAVD_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,
}
