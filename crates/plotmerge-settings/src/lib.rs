//! plotmerge Settings Crate
//!
//! Handles the persisted settings document and turns it into a run
//! configuration for the post-processor.

pub mod config;
pub mod error;

pub use config::{
    deep_merge, GcodeSettings, JobInkSettings, JobKind, MacroSettings, MarkerSettings,
    PathSettings, PlotterSettings, Position, PositionSettings, PostPaths, Settings,
};
pub use error::{SettingsError, SettingsResult};
