//! Log subscriber setup for the CLI.
//!
//! Logs go to stderr so stdout stays reserved for replay output.

use std::io::{self, IsTerminal};

use anyhow::Context;
use timeline::config::{LogFormat, LoggingConfig};
use tracing::{Subscriber, level_filters::LevelFilter};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, MakeWriter},
};

/// Installs the global subscriber described by `logging`.
///
/// # Errors
/// Returns an error if a global subscriber is already installed.
pub fn initialize_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    let ansi = io::stderr().is_terminal();
    tracing::subscriber::set_global_default(subscriber_with_writer(logging, io::stderr, ansi))
        .context("failed to install tracing subscriber")
}

pub fn subscriber_with_writer<W>(
    logging: &LoggingConfig,
    writer: W,
    ansi: bool,
) -> Box<dyn Subscriber + Send + Sync>
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let builder = fmt::fmt()
        .with_env_filter(build_env_filter(logging))
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(writer);

    match logging.format {
        LogFormat::Json => Box::new(builder.json().with_ansi(false).finish()),
        LogFormat::Text => Box::new(builder.with_ansi(ansi).finish()),
    }
}

fn build_env_filter(logging: &LoggingConfig) -> EnvFilter {
    let default_level = logging
        .level
        .parse::<LevelFilter>()
        .unwrap_or(LevelFilter::INFO);

    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::builder()
            .with_default_directive(default_level.into())
            .from_env_lossy()
    })
}
