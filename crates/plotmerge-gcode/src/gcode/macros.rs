//! Macro templates and rendering
//!
//! A macro is an ordered list of G-code template lines. Template lines may
//! reference `{name}` placeholders that are resolved from a [`MacroContext`].
//! A placeholder may carry a fixed-point spec, `{name:.2f}`. Doubled braces
//! `{{` and `}}` emit a literal brace. Any other brace group (unknown name,
//! unsupported spec, malformed name) is left in place and reported, never
//! fatal.
//!
//! After a macro has been emitted the pen is always back at pen-up height and
//! disengaged, whatever the template did.

use plotmerge_core::format_value;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use super::classifier::classify;
use super::output::{Diagnostic, LineOrigin, OutputLine};
use super::pen_state::{MachineState, PenHeights};

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER_REGEX: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    PLACEHOLDER_REGEX.get_or_init(|| {
        Regex::new(r"\{\{|\}\}|\{([^{}]*)\}").expect("invalid regex pattern")
    })
}

fn precision_regex() -> &'static Regex {
    static PRECISION_REGEX: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    PRECISION_REGEX.get_or_init(|| Regex::new(r"^\.(\d+)f$").expect("invalid regex pattern"))
}

/// Resolve the inside of one brace group, `None` when it cannot be rendered
fn resolve_placeholder(inner: &str, context: &MacroContext) -> Option<String> {
    let (name, spec) = match inner.split_once(':') {
        Some((name, spec)) => (name, Some(spec)),
        None => (inner, None),
    };
    let value = context.get(name)?;
    match spec {
        None => Some(format_value(value)),
        Some(spec) => {
            let digits: usize = precision_regex().captures(spec)?[1].parse().ok()?;
            Some(format!("{:.*}", digits, value))
        }
    }
}

/// Named, ordered list of template lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Macro {
    /// Name used in annotations and diagnostics
    pub name: String,
    /// Template lines in execution order
    pub lines: Vec<String>,
}

impl Macro {
    /// Create a macro
    pub fn new(name: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            name: name.into(),
            lines,
        }
    }

    /// True when the macro has no template lines
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Placeholder values available to templates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroContext {
    values: BTreeMap<String, f64>,
}

impl MacroContext {
    /// Empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Standard plotter context
    ///
    /// Provides `pen_up_z`, `pen_down_z`, `safe_z` (pen-up height when not
    /// given), `ink_x`, `ink_y`, `paper_x` and `paper_y`.
    pub fn plotter(
        pen_up_z: f64,
        pen_down_z: f64,
        safe_z: Option<f64>,
        ink: (f64, f64),
        paper: (f64, f64),
    ) -> Self {
        Self::new()
            .with_value("pen_up_z", pen_up_z)
            .with_value("pen_down_z", pen_down_z)
            .with_value("safe_z", safe_z.unwrap_or(pen_up_z))
            .with_value("ink_x", ink.0)
            .with_value("ink_y", ink.1)
            .with_value("paper_x", paper.0)
            .with_value("paper_y", paper.1)
    }

    /// Builder-style insert
    pub fn with_value(mut self, name: impl Into<String>, value: f64) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace a value
    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }

    /// Look up a value
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Number of values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when no values are set
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Result of substituting one template line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLine {
    /// Line with every known placeholder replaced
    pub line: String,
    /// Names of placeholders that had no value
    pub unresolved: Vec<String>,
}

/// Substitute `{name}` placeholders in one template line
pub fn render_template(template: &str, context: &MacroContext) -> RenderedLine {
    let mut unresolved = Vec::new();
    let line = placeholder_regex()
        .replace_all(template, |caps: &Captures| {
            let Some(inner) = caps.get(1) else {
                // `{{` or `}}`
                return caps[0][..1].to_string();
            };
            match resolve_placeholder(inner.as_str(), context) {
                Some(text) => text,
                None => {
                    unresolved.push(inner.as_str().to_string());
                    caps[0].to_string()
                }
            }
        })
        .into_owned();
    RenderedLine { line, unresolved }
}

/// Lines and diagnostics produced by one macro expansion
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expansion {
    /// Annotated output block
    pub lines: Vec<OutputLine>,
    /// Non-fatal problems found while rendering
    pub diagnostics: Vec<Diagnostic>,
}

impl Expansion {
    /// Number of rendered template lines plus the safety lift, if any
    pub fn command_count(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| matches!(l.origin, LineOrigin::Macro | LineOrigin::SafetyLift))
            .count()
    }

    /// True when a lift back to pen-up height had to be appended
    pub fn has_safety_lift(&self) -> bool {
        self.lines.iter().any(|l| l.origin == LineOrigin::SafetyLift)
    }
}

/// Expands macros and keeps the machine state in step
#[derive(Debug, Clone)]
pub struct MacroRenderer {
    heights: PenHeights,
    context: MacroContext,
}

impl MacroRenderer {
    /// Create a renderer
    pub fn new(heights: PenHeights, context: MacroContext) -> Self {
        Self { heights, context }
    }

    /// Heights used for tracking and the closing lift
    pub fn heights(&self) -> &PenHeights {
        &self.heights
    }

    /// Placeholder values
    pub fn context(&self) -> &MacroContext {
        &self.context
    }

    /// Emit `mac` wrapped in `label` annotations
    ///
    /// Every emitted Z updates `state`. On exit the state is pen-up and
    /// disengaged; a `G0 Z<pen_up>` line is appended inside the block when the
    /// macro left the pen elsewhere.
    pub fn expand(&self, mac: &Macro, label: &str, state: &mut MachineState) -> Expansion {
        let mut expansion = Expansion::default();

        if mac.is_empty() {
            warn!("{}: macro '{}' is empty, nothing to insert", label, mac.name);
            expansion.diagnostics.push(Diagnostic::EmptyMacro {
                macro_name: mac.name.clone(),
            });
        }

        expansion
            .lines
            .push(OutputLine::annotation(format!("; ---- {} start ----", label)));

        for template in &mac.lines {
            let rendered = render_template(template, &self.context);
            for placeholder in rendered.unresolved {
                warn!(
                    "Macro '{}' references unknown placeholder {{{}}}",
                    mac.name, placeholder
                );
                expansion.diagnostics.push(Diagnostic::UnresolvedPlaceholder {
                    macro_name: mac.name.clone(),
                    placeholder,
                });
            }
            state.observe(classify(&rendered.line, None).axes.z, &self.heights);
            expansion
                .lines
                .push(OutputLine::new(rendered.line, LineOrigin::Macro));
        }

        if !state.is_at_pen_up(&self.heights) {
            expansion.lines.push(OutputLine::new(
                format!("G0 Z{}", format_value(self.heights.pen_up_z())),
                LineOrigin::SafetyLift,
            ));
        }
        state.reset_to_pen_up(&self.heights);

        expansion
            .lines
            .push(OutputLine::annotation(format!("; ---- {} end ----", label)));
        expansion
    }
}
