//! Ink insertion policy
//!
//! Each job runs under one of three modes:
//! - `off`: never re-ink
//! - `marker`: re-ink wherever the input has a line equal to the marker token
//! - `stroke`: re-ink after every N completed strokes
//!
//! Mode parameters live inside the variant, so a stroke mode without an
//! interval or a marker mode without a token cannot be constructed.

use plotmerge_core::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use super::pen_state::PenTransition;

/// Ink mode name as it appears in settings and on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InkModeKind {
    /// Never re-ink
    Off,
    /// Re-ink at marker lines
    Marker,
    /// Re-ink every N strokes
    Stroke,
}

impl fmt::Display for InkModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => write!(f, "off"),
            Self::Marker => write!(f, "marker"),
            Self::Stroke => write!(f, "stroke"),
        }
    }
}

impl FromStr for InkModeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "marker" => Ok(Self::Marker),
            "stroke" => Ok(Self::Stroke),
            _ => Err(format!("Unknown ink mode: {}", s)),
        }
    }
}

/// Non-empty, trimmed marker token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerToken(String);

impl MarkerToken {
    /// Create a token for `job`; an empty or whitespace-only token is rejected
    pub fn new(job: &str, token: &str) -> Result<Self, ConfigError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ConfigError::EmptyMarkerToken {
                job: job.to_string(),
            });
        }
        Ok(Self(token.to_string()))
    }

    /// Token text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Ink mode with its required parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InkMode {
    /// Never re-ink
    Off,
    /// Re-ink at whole-line matches of the token
    Marker(MarkerToken),
    /// Re-ink after this many completed strokes
    Stroke(NonZeroU32),
}

impl InkMode {
    /// Marker mode for `job`
    pub fn marker(job: &str, token: &str) -> Result<Self, ConfigError> {
        Ok(Self::Marker(MarkerToken::new(job, token)?))
    }

    /// Stroke mode for `job`; the interval must be positive
    pub fn stroke(job: &str, interval: u32) -> Result<Self, ConfigError> {
        NonZeroU32::new(interval)
            .map(Self::Stroke)
            .ok_or_else(|| ConfigError::MissingStrokeInterval {
                job: job.to_string(),
            })
    }

    /// Build a mode from loosely typed settings values
    pub fn from_settings(
        job: &str,
        kind: InkModeKind,
        stroke_interval: Option<u32>,
        marker_token: &str,
    ) -> Result<Self, ConfigError> {
        match kind {
            InkModeKind::Off => Ok(Self::Off),
            InkModeKind::Marker => Self::marker(job, marker_token),
            InkModeKind::Stroke => Self::stroke(job, stroke_interval.unwrap_or(0)),
        }
    }

    /// Parse a mode name, then build it like [`InkMode::from_settings`]
    pub fn parse(
        job: &str,
        mode: &str,
        stroke_interval: Option<u32>,
        marker_token: &str,
    ) -> Result<Self, ConfigError> {
        let kind = mode
            .parse::<InkModeKind>()
            .map_err(|_| ConfigError::UnknownInkMode {
                job: job.to_string(),
                mode: mode.to_string(),
            })?;
        Self::from_settings(job, kind, stroke_interval, marker_token)
    }

    /// Mode name
    pub fn kind(&self) -> InkModeKind {
        match self {
            Self::Off => InkModeKind::Off,
            Self::Marker(_) => InkModeKind::Marker,
            Self::Stroke(_) => InkModeKind::Stroke,
        }
    }

    /// Marker token when in marker mode
    pub fn marker_token(&self) -> Option<&str> {
        match self {
            Self::Marker(token) => Some(token.as_str()),
            _ => None,
        }
    }
}

/// Why an insertion fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerCause {
    /// A marker line was found
    Marker,
    /// The stroke counter reached the interval
    StrokeInterval(u32),
}

/// One decided ink insertion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InkTrigger {
    /// 1-based sequence number within the job, for annotations only
    pub sequence: u32,
    /// What fired it
    pub cause: TriggerCause,
}

impl InkTrigger {
    /// Annotation label, e.g. `writing manual ink #2`
    pub fn label(&self, job: &str) -> String {
        match self.cause {
            TriggerCause::Marker => format!("{} manual ink #{}", job, self.sequence),
            TriggerCause::StrokeInterval(_) => format!("{} auto ink #{}", job, self.sequence),
        }
    }
}

/// Per-job ink decision engine
#[derive(Debug, Clone)]
pub struct InkPolicy {
    mode: InkMode,
    stroke_counter: u32,
    completed_strokes: u32,
    insertions: u32,
}

impl InkPolicy {
    /// Fresh engine, counters at zero
    pub fn new(mode: InkMode) -> Self {
        Self {
            mode,
            stroke_counter: 0,
            completed_strokes: 0,
            insertions: 0,
        }
    }

    /// Active mode
    pub fn mode(&self) -> &InkMode {
        &self.mode
    }

    /// A marker line was read; fires only in marker mode
    pub fn on_marker(&mut self) -> Option<InkTrigger> {
        if !matches!(self.mode, InkMode::Marker(_)) {
            return None;
        }
        self.stroke_counter = 0;
        Some(self.next_trigger(TriggerCause::Marker))
    }

    /// A line changed (or kept) the pen engagement
    pub fn on_transition(&mut self, transition: PenTransition) -> Option<InkTrigger> {
        if !transition.is_lift() {
            return None;
        }
        self.completed_strokes += 1;

        let InkMode::Stroke(interval) = self.mode else {
            return None;
        };
        self.stroke_counter += 1;
        if self.stroke_counter < interval.get() {
            return None;
        }
        let strokes = self.stroke_counter;
        self.stroke_counter = 0;
        Some(self.next_trigger(TriggerCause::StrokeInterval(strokes)))
    }

    fn next_trigger(&mut self, cause: TriggerCause) -> InkTrigger {
        self.insertions += 1;
        InkTrigger {
            sequence: self.insertions,
            cause,
        }
    }

    /// Strokes counted since the last insertion
    pub fn stroke_counter(&self) -> u32 {
        self.stroke_counter
    }

    /// All engaged-to-disengaged transitions seen, in any mode
    pub fn completed_strokes(&self) -> u32 {
        self.completed_strokes
    }

    /// Insertions fired so far
    pub fn insertions(&self) -> u32 {
        self.insertions
    }
}
