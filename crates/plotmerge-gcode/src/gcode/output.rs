//! Emitted lines and run diagnostics

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where an emitted line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineOrigin {
    /// Copied verbatim from the job's input
    Source,
    /// Velocity line added by the feed-rate pass
    SyntheticFeed,
    /// `;`-prefixed traceability comment or block separator
    Annotation,
    /// Rendered macro template line
    Macro,
    /// Move back to pen-up height appended after a macro
    SafetyLift,
}

/// One line of the merged artifact with its provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputLine {
    /// Line text without the trailing newline
    pub text: String,
    /// Provenance tag
    pub origin: LineOrigin,
}

impl OutputLine {
    /// Create a line with the given origin
    pub fn new(text: impl Into<String>, origin: LineOrigin) -> Self {
        Self {
            text: text.into(),
            origin,
        }
    }

    /// Line copied from the input stream
    pub fn source(text: impl Into<String>) -> Self {
        Self::new(text, LineOrigin::Source)
    }

    /// Annotation line
    pub fn annotation(text: impl Into<String>) -> Self {
        Self::new(text, LineOrigin::Annotation)
    }

    /// True for lines that were not part of the job's input
    pub fn is_inserted(&self) -> bool {
        self.origin != LineOrigin::Source
    }
}

/// Non-fatal condition reported by a run
///
/// Diagnostics never abort processing; they are returned so callers can show
/// or assert on them, and each one is also logged as a warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A `{name}` placeholder had no value in the macro context
    UnresolvedPlaceholder {
        /// Macro the template line belongs to
        macro_name: String,
        /// Placeholder name without braces
        placeholder: String,
    },
    /// A macro with no template lines was invoked
    EmptyMacro {
        /// Macro name
        macro_name: String,
    },
    /// The paper macro is empty, so no paper change was inserted
    PaperChangeSkipped,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedPlaceholder {
                macro_name,
                placeholder,
            } => write!(
                f,
                "{}: unknown placeholder {{{}}} left as-is",
                macro_name, placeholder
            ),
            Self::EmptyMacro { macro_name } => write!(f, "{}: macro is empty", macro_name),
            Self::PaperChangeSkipped => {
                write!(f, "paper macro not configured, paper change skipped")
            }
        }
    }
}
