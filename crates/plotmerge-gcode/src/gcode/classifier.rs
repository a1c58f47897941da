//! Line classification
//!
//! Turns one raw G-code line into a read-only view: blank/comment/command,
//! the values bound to the tracked axis letters, the command word and
//! whether the line is the manual ink marker. Classification never fails;
//! a line without recognisable words is simply a command with no axes.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Prefixes that start a full-line comment
pub const COMMENT_PREFIXES: [char; 2] = [';', '('];

fn axis_regex() -> &'static Regex {
    static AXIS_REGEX: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    AXIS_REGEX.get_or_init(|| {
        Regex::new(r"(?i)([XYZF])\s*([+-]?(?:\d+(?:\.\d*)?|\.\d+))")
            .expect("invalid regex pattern")
    })
}

/// Axis letters tracked by the post-processor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    /// X coordinate
    X,
    /// Y coordinate
    Y,
    /// Tool height
    Z,
    /// Feed rate
    F,
}

impl Axis {
    fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'X' => Some(Self::X),
            'Y' => Some(Self::Y),
            'Z' => Some(Self::Z),
            'F' => Some(Self::F),
            _ => None,
        }
    }
}

/// Values found on one line, first occurrence per letter
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisValues {
    /// X value
    pub x: Option<f64>,
    /// Y value
    pub y: Option<f64>,
    /// Z value
    pub z: Option<f64>,
    /// F value
    pub f: Option<f64>,
}

impl AxisValues {
    /// Extract axis values from a line
    pub fn extract(line: &str) -> Self {
        let mut values = Self::default();
        for caps in axis_regex().captures_iter(line) {
            let Some(axis) = caps[1].chars().next().and_then(Axis::from_letter) else {
                continue;
            };
            let Ok(value) = caps[2].parse::<f64>() else {
                continue;
            };
            let slot = values.slot_mut(axis);
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        values
    }

    /// Value bound to `axis`, if any
    pub fn get(&self, axis: Axis) -> Option<f64> {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
            Axis::F => self.f,
        }
    }

    fn slot_mut(&mut self, axis: Axis) -> &mut Option<f64> {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::Z => &mut self.z,
            Axis::F => &mut self.f,
        }
    }

    /// True when no tracked axis was found
    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none() && self.z.is_none() && self.f.is_none()
    }
}

/// Coarse line category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    /// Empty or whitespace only
    Blank,
    /// Starts with `;` or `(`
    Comment,
    /// Anything else
    Command,
}

/// Structured view of one input line
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedLine<'a> {
    /// The line as read
    pub raw: &'a str,
    /// Line category
    pub kind: LineKind,
    /// First word, upper-cased (commands only)
    pub command: Option<String>,
    /// Axis values (commands only)
    pub axes: AxisValues,
    /// Trimmed line equals the marker token
    pub is_marker: bool,
}

impl<'a> ClassifiedLine<'a> {
    /// True for blank and comment lines
    pub fn is_trivial(&self) -> bool {
        self.kind != LineKind::Command
    }
}

/// True when the trimmed line is empty or a comment
pub fn is_blank_or_comment(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with(COMMENT_PREFIXES)
}

/// Classify a line
///
/// `marker` is the manual ink token; the match is against the whole trimmed
/// line, so a line that merely contains the token is not a marker.
pub fn classify<'a>(raw: &'a str, marker: Option<&str>) -> ClassifiedLine<'a> {
    let trimmed = raw.trim();
    let is_marker = marker
        .map(str::trim)
        .is_some_and(|token| !token.is_empty() && trimmed == token);

    if trimmed.is_empty() {
        return ClassifiedLine {
            raw,
            kind: LineKind::Blank,
            command: None,
            axes: AxisValues::default(),
            is_marker,
        };
    }

    if trimmed.starts_with(COMMENT_PREFIXES) {
        return ClassifiedLine {
            raw,
            kind: LineKind::Comment,
            command: None,
            axes: AxisValues::default(),
            is_marker,
        };
    }

    ClassifiedLine {
        raw,
        kind: LineKind::Command,
        command: trimmed.split_whitespace().next().map(str::to_uppercase),
        axes: AxisValues::extract(trimmed),
        is_marker,
    }
}
