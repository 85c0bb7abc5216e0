//! Logging setup for the Sharkwatch binary.
//!
//! Log events go through `tracing`. Step narration (the `verbose` cleaning
//! option) is a separate, user-facing channel and does not depend on the
//! log level chosen here.

use tracing_subscriber::EnvFilter;

use crate::Result;

/// Maps CLI verbosity flags to a tracing level.
pub fn level_for(verbose: u8, quiet: bool) -> tracing::Level {
    match (quiet, verbose) {
        (true, _) => tracing::Level::ERROR,
        (false, 0) => tracing::Level::WARN,
        (false, 1) => tracing::Level::INFO,
        (false, 2) => tracing::Level::DEBUG,
        (false, _) => tracing::Level::TRACE,
    }
}

/// Initializes structured logging based on verbosity level.
///
/// # Arguments
/// * `verbose` - Verbosity level (0=WARN, 1=INFO, 2=DEBUG, 3+=TRACE)
/// * `quiet` - If true, only show ERROR level logs
/// * `json` - Emit newline-delimited JSON instead of human-readable lines
///
/// `RUST_LOG`, when set, takes precedence over the flag-derived level.
///
/// # Example
/// ```rust,no_run
/// use sharkwatch_core::logging::init_logging;
///
/// init_logging(1, false, false).expect("Failed to initialize logging");
/// ```
pub fn init_logging(verbose: u8, quiet: bool, json: bool) -> Result<()> {
    let level = level_for(verbose, quiet);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_lowercase()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let initialized = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    initialized.map_err(|e| {
        crate::error::SharkwatchError::invalid_options(format!(
            "Failed to initialize logging: {}",
            e
        ))
    })?;

    Ok(())
}
