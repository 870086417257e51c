use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::SubscriberBuilder;

use crate::errors::{Result, RuleDeskError};

/// Initializes the tracing subscriber used by the binaries.
///
/// `RUST_LOG` takes precedence over `level`; logs go to stderr so command
/// output on stdout stays machine readable.
pub fn init_tracing(level: Option<&str>) -> Result<()> {
    let default_level = level.unwrap_or("info");
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    SubscriberBuilder::default()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_ansi(atty::is(atty::Stream::Stderr))
        .try_init()
        .map_err(|err| RuleDeskError::GeneralError(err.to_string()))?;

    Ok(())
}
