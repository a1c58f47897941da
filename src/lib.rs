//! # plotmerge
//!
//! Pen-plotter G-code post-processor. Merges a writing program and a drawing
//! program into one artifact, inserting re-ink macros according to each job's
//! ink policy and a single paper change between the two jobs.
//!
//! ## Architecture
//!
//! plotmerge is organized as a workspace with multiple crates:
//!
//! 1. **plotmerge-core** - Error types and numeric helpers
//! 2. **plotmerge-gcode** - Line classification, pen tracking, ink policy, macros, merge
//! 3. **plotmerge-settings** - Persisted settings document and run configuration
//! 4. **plotmerge** - Command-line binary that integrates all crates

pub use plotmerge_core::{ConfigError, Error, InputError, Result};
pub use plotmerge_gcode::{
    post_process, FileSink, FileSource, InkMode, InkModeKind, Job, LineSink, LineSource,
    MemorySink, MemorySource, PostConfig, PostResult,
};
pub use plotmerge_settings::{JobKind, Settings, SettingsError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging
///
/// Sets up structured logging with:
/// - Output on stderr so stdout carries only command results
/// - RUST_LOG environment variable support
/// - INFO by default, DEBUG when `verbose` is set
pub fn init_logging(verbose: bool) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let env_filter = EnvFilter::from_default_env().add_directive(level.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
