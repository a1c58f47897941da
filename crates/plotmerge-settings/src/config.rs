//! Settings document for plotmerge
//!
//! Provides the persisted settings, their built-in defaults and file handling.
//! Supports JSON and TOML files, chosen by extension.
//!
//! Settings are organized into sections:
//! - Plotter heights
//! - Ink and paper service positions
//! - Ink and paper macros
//! - Default file paths
//! - Per-job G-code options (feed rate, marker token, ink modes)
//!
//! A stored document may be partial. Loading deep-merges it over the defaults,
//! so every absent field takes its built-in value.

use plotmerge_core::{ConfigError, Error};
use plotmerge_gcode::{
    InkMode, InkModeKind, Job, LineSource, Macro, MacroContext, PaperPolicy, PostConfig,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{SettingsError, SettingsResult};

/// Directory name under the platform config dir
const APP_DIR: &str = "plotmerge";

/// Settings file name
const CONFIG_FILE: &str = "config.json";

/// Plotter tool heights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotterSettings {
    /// Travel height
    pub pen_up_z: f64,
    /// Contact height
    pub pen_down_z: f64,
    /// Neutral height for macros; pen-up height when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safe_z: Option<f64>,
}

impl Default for PlotterSettings {
    fn default() -> Self {
        Self {
            pen_up_z: 0.0,
            pen_down_z: 8.0,
            safe_z: Some(1.0),
        }
    }
}

/// XY location of a service station
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// X coordinate (mm)
    pub x: f64,
    /// Y coordinate (mm)
    pub y: f64,
}

/// Service station positions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionSettings {
    /// Ink well
    pub ink: Position,
    /// Paper exchange spot
    pub paper: Position,
}

impl Default for PositionSettings {
    fn default() -> Self {
        Self {
            ink: Position { x: 10.0, y: -10.0 },
            paper: Position { x: 0.0, y: 0.0 },
        }
    }
}

/// Macro templates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacroSettings {
    /// Re-ink sequence
    pub ink_macro: Vec<String>,
    /// Paper change sequence
    pub paper_macro: Vec<String>,
    /// Reject runs whose paper macro is empty instead of skipping the change
    pub require_paper_macro: bool,
}

impl Default for MacroSettings {
    fn default() -> Self {
        Self {
            ink_macro: ["G0 Z0", "G0 X10 Y-10", "G1 Z8", "G4 P0.5", "G0 Z0"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            paper_macro: ["G0 Z0", "G0 X0 Y0", "G4 P1.0"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            require_paper_macro: false,
        }
    }
}

/// Default locations of the post-processing files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostPaths {
    /// Writing program
    pub writing_input: PathBuf,
    /// Drawing program
    pub drawing_input: PathBuf,
    /// Merged output
    pub merged_output: PathBuf,
}

impl Default for PostPaths {
    fn default() -> Self {
        Self {
            writing_input: PathBuf::from("artifacts/gcode/writing.nc"),
            drawing_input: PathBuf::from("artifacts/gcode/drawing.nc"),
            merged_output: PathBuf::from("artifacts/gcode/merged.nc"),
        }
    }
}

/// File path settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// Post-processing paths
    pub post: PostPaths,
}

/// Marker token settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerSettings {
    /// Whole-line token requesting a manual re-ink
    pub token: String,
}

impl Default for MarkerSettings {
    fn default() -> Self {
        Self {
            token: ";#AUTO_INK#".to_string(),
        }
    }
}

/// Ink policy of one job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobInkSettings {
    /// Insertion mode
    pub ink_mode: InkModeKind,
    /// Strokes between insertions in stroke mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_interval: Option<u32>,
}

/// G-code processing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GcodeSettings {
    /// Feed rate inserted when a job does not set one
    pub default_feedrate: f64,
    /// Marker token
    pub marker: MarkerSettings,
    /// Writing job policy
    pub writing: JobInkSettings,
    /// Drawing job policy
    pub drawing: JobInkSettings,
}

impl Default for GcodeSettings {
    fn default() -> Self {
        Self {
            default_feedrate: 1000.0,
            marker: MarkerSettings::default(),
            writing: JobInkSettings {
                ink_mode: InkModeKind::Marker,
                stroke_interval: Some(40),
            },
            drawing: JobInkSettings {
                ink_mode: InkModeKind::Stroke,
                stroke_interval: Some(80),
            },
        }
    }
}

/// Complete settings document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Tool heights
    pub plotter: PlotterSettings,
    /// Service positions
    pub positions: PositionSettings,
    /// Macro templates
    pub macros: MacroSettings,
    /// File paths
    pub paths: PathSettings,
    /// G-code options
    pub gcode: GcodeSettings,
}

/// Which job a setting belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    /// Processed first
    Writing,
    /// Processed after the paper change
    Drawing,
}

impl JobKind {
    /// Display name used in annotations and errors
    pub fn name(&self) -> &'static str {
        match self {
            Self::Writing => "writing",
            Self::Drawing => "drawing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Toml,
}

fn format_of(path: &Path) -> SettingsResult<Format> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        other => Err(SettingsError::UnsupportedFormat(
            other.unwrap_or("<none>").to_string(),
        )),
    }
}

/// Recursively merge `extra` into `base`; `extra` wins, nulls are ignored
pub fn deep_merge(base: &mut Value, extra: Value) {
    match (base, extra) {
        (Value::Object(base_map), Value::Object(extra_map)) => {
            for (key, value) in extra_map {
                match base_map.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None if !value.is_null() => {
                        base_map.insert(key, value);
                    }
                    None => {}
                }
            }
        }
        (_, Value::Null) => {}
        (base, extra) => *base = extra,
    }
}

impl Settings {
    /// Create settings with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Platform location of the settings file
    pub fn default_path() -> SettingsResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
            .ok_or_else(|| {
                SettingsError::ConfigDirectory("no configuration directory on this platform".into())
            })
    }

    /// Parse a possibly partial document and fill in defaults
    pub fn from_value(user: Value) -> SettingsResult<Self> {
        let mut merged = serde_json::to_value(Self::default())?;
        deep_merge(&mut merged, user);
        let settings: Self = serde_json::from_value(merged)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = format_of(path)?;
        let content = fs::read_to_string(path).map_err(|e| {
            SettingsError::LoadError(format!("{}: {}", path.display(), e))
        })?;

        let user: Value = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };
        debug!("Loaded settings from {}", path.display());
        Self::from_value(user)
    }

    /// Save settings to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match format_of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)
            .map_err(|e| SettingsError::SaveError(format!("{}: {}", path.display(), e)))?;
        Ok(())
    }

    /// Write the defaults to `path` unless a file already exists there
    pub fn ensure_file(path: &Path) -> SettingsResult<PathBuf> {
        if !path.exists() {
            info!("Writing default settings to {}", path.display());
            Self::default().save_to_file(path)?;
        }
        Ok(path.to_path_buf())
    }

    /// Load from `path`, writing the defaults first when it is missing
    pub fn load_or_create(path: &Path) -> SettingsResult<Self> {
        Self::ensure_file(path)?;
        Self::load_from_file(path)
    }

    /// Deep-merge `partial` over the stored document and save the result
    pub fn update_file(path: &Path, partial: Value) -> SettingsResult<Self> {
        let current = Self::load_or_create(path)?;
        let mut merged = serde_json::to_value(&current)?;
        deep_merge(&mut merged, partial);
        let updated: Self = serde_json::from_value(merged)?;
        updated.save_to_file(path)?;
        Ok(updated)
    }

    /// Validate document-level constraints
    ///
    /// Height ordering and per-mode requirements are checked when a run is
    /// built, so that command-line overrides can still repair them.
    pub fn validate(&self) -> SettingsResult<()> {
        let feed = self.gcode.default_feedrate;
        if !feed.is_finite() || feed <= 0.0 {
            return Err(SettingsError::InvalidSetting {
                key: "gcode.default_feedrate".to_string(),
                reason: "must be > 0".to_string(),
            });
        }

        for (key, job) in [
            ("gcode.writing.stroke_interval", &self.gcode.writing),
            ("gcode.drawing.stroke_interval", &self.gcode.drawing),
        ] {
            if job.stroke_interval == Some(0) {
                return Err(SettingsError::InvalidSetting {
                    key: key.to_string(),
                    reason: "must be a positive integer".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Placeholder values for macro templates
    pub fn macro_context(&self) -> MacroContext {
        let p = &self.plotter;
        let pos = &self.positions;
        MacroContext::plotter(
            p.pen_up_z,
            p.pen_down_z,
            p.safe_z,
            (pos.ink.x, pos.ink.y),
            (pos.paper.x, pos.paper.y),
        )
    }

    /// Policy settings of one job
    pub fn job_ink(&self, job: JobKind) -> &JobInkSettings {
        match job {
            JobKind::Writing => &self.gcode.writing,
            JobKind::Drawing => &self.gcode.drawing,
        }
    }

    /// Ink mode of one job, with its parameters checked
    pub fn ink_mode(&self, job: JobKind) -> Result<InkMode, ConfigError> {
        let ink = self.job_ink(job);
        InkMode::from_settings(
            job.name(),
            ink.ink_mode,
            ink.stroke_interval,
            &self.gcode.marker.token,
        )
    }

    /// Paper policy
    pub fn paper_policy(&self) -> PaperPolicy {
        if self.macros.require_paper_macro {
            PaperPolicy::Required
        } else {
            PaperPolicy::Lenient
        }
    }

    /// Resolve a complete run configuration
    pub fn build_post_config(
        &self,
        writing: Box<dyn LineSource>,
        drawing: Box<dyn LineSource>,
    ) -> Result<PostConfig, Error> {
        Ok(PostConfig {
            writing: Job::new(
                JobKind::Writing.name(),
                writing,
                self.ink_mode(JobKind::Writing)?,
            ),
            drawing: Job::new(
                JobKind::Drawing.name(),
                drawing,
                self.ink_mode(JobKind::Drawing)?,
            ),
            pen_up_z: self.plotter.pen_up_z,
            pen_down_z: self.plotter.pen_down_z,
            default_feedrate: self.gcode.default_feedrate,
            ink_macro: Macro::new("ink", self.macros.ink_macro.clone()),
            paper_macro: Macro::new("paper", self.macros.paper_macro.clone()),
            macro_context: self.macro_context(),
            paper_policy: self.paper_policy(),
        })
    }
}
