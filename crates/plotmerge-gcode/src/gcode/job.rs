//! Job pipeline
//!
//! Runs one input stream end to end: feed-rate pre-pass, then line-by-line
//! pen tracking with ink insertions, wrapped in job start/end annotations.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

use super::classifier::classify;
use super::feedrate::ensure_feedrate;
use super::ink_policy::{InkMode, InkModeKind, InkPolicy, InkTrigger};
use super::macros::{Macro, MacroRenderer};
use super::output::{Diagnostic, LineOrigin, OutputLine};
use super::pen_state::MachineState;
use crate::utils::LineSource;

/// One input stream plus its ink policy
pub struct Job {
    name: String,
    source: Box<dyn LineSource>,
    ink_mode: InkMode,
}

impl Job {
    /// Create a job
    pub fn new(name: impl Into<String>, source: Box<dyn LineSource>, ink_mode: InkMode) -> Self {
        Self {
            name: name.into(),
            source,
            ink_mode,
        }
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ink mode
    pub fn ink_mode(&self) -> &InkMode {
        &self.ink_mode
    }

    /// Where the lines come from
    pub fn source(&self) -> &dyn LineSource {
        self.source.as_ref()
    }

    /// Read the source; the job is consumed
    pub fn load(self) -> plotmerge_core::Result<LoadedJob> {
        let lines = self.source.read_lines(&self.name)?;
        Ok(LoadedJob {
            name: self.name,
            origin: self.source.describe(),
            lines,
            ink_mode: self.ink_mode,
        })
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("name", &self.name)
            .field("source", &self.source.describe())
            .field("ink_mode", &self.ink_mode)
            .finish()
    }
}

/// A job whose lines are in memory
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedJob {
    /// Display name
    pub name: String,
    /// Description of the source the lines came from
    pub origin: String,
    /// Raw input lines
    pub lines: Vec<String>,
    /// Ink mode
    pub ink_mode: InkMode,
}

impl LoadedJob {
    /// True when every line is whitespace
    pub fn is_blank(&self) -> bool {
        self.lines.iter().all(|line| line.trim().is_empty())
    }
}

/// Per-job counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    /// Job name
    pub name: String,
    /// Mode the job ran under
    pub ink_mode: InkModeKind,
    /// Ink macros inserted
    pub ink_insertions: u32,
    /// Engaged-to-disengaged transitions seen
    pub completed_strokes: u32,
    /// Stroke counter when the job ended
    pub pending_strokes: u32,
    /// Whether the feed-rate pass added a line
    pub feedrate_inserted: bool,
}

/// Emitted block and counters for one job
#[derive(Debug, Clone, PartialEq)]
pub struct JobOutput {
    /// Annotated output block
    pub lines: Vec<OutputLine>,
    /// Counters
    pub summary: JobSummary,
    /// Diagnostics from macro rendering
    pub diagnostics: Vec<Diagnostic>,
    /// Machine state after the last line
    pub final_state: MachineState,
}

/// Runs jobs against a shared renderer and ink macro
#[derive(Debug, Clone, Copy)]
pub struct JobPipeline<'a> {
    renderer: &'a MacroRenderer,
    ink_macro: &'a Macro,
    default_feedrate: f64,
}

impl<'a> JobPipeline<'a> {
    /// Create a pipeline
    pub fn new(renderer: &'a MacroRenderer, ink_macro: &'a Macro, default_feedrate: f64) -> Self {
        Self {
            renderer,
            ink_macro,
            default_feedrate,
        }
    }

    /// Process one job
    ///
    /// The machine state and ink counters are created here and dropped on
    /// return, so nothing leaks into the next job.
    pub fn run(&self, job: LoadedJob) -> JobOutput {
        let heights = *self.renderer.heights();
        let LoadedJob {
            name,
            lines,
            ink_mode,
            ..
        } = job;

        let pass = ensure_feedrate(lines, self.default_feedrate);
        let marker = ink_mode.marker_token().map(str::to_owned);
        let mode_kind = ink_mode.kind();
        let mut policy = InkPolicy::new(ink_mode);
        let mut state = MachineState::at_pen_up(&heights);
        let mut diagnostics = Vec::new();

        let mut out = Vec::with_capacity(pass.lines.len() + 2);
        out.push(OutputLine::annotation(format!("; === {} start ===", name)));

        for (idx, raw) in pass.lines.iter().enumerate() {
            let line = classify(raw, marker.as_deref());

            if line.is_marker {
                if let Some(trigger) = policy.on_marker() {
                    self.insert_ink(&name, trigger, &mut state, &mut out, &mut diagnostics);
                    continue;
                }
            }

            let origin = if pass.inserted_at == Some(idx) {
                LineOrigin::SyntheticFeed
            } else {
                LineOrigin::Source
            };

            if line.is_trivial() {
                out.push(OutputLine::new(raw.as_str(), origin));
                continue;
            }

            let transition = state.observe(line.axes.z, &heights);
            out.push(OutputLine::new(raw.as_str(), origin));

            if let Some(trigger) = policy.on_transition(transition) {
                self.insert_ink(&name, trigger, &mut state, &mut out, &mut diagnostics);
            }
        }

        out.push(OutputLine::annotation(format!("; === {} end ===", name)));
        out.push(OutputLine::annotation(""));

        info!(
            "{}: {} ink insertion(s), {} stroke(s)",
            name,
            policy.insertions(),
            policy.completed_strokes()
        );

        JobOutput {
            lines: out,
            summary: JobSummary {
                name,
                ink_mode: mode_kind,
                ink_insertions: policy.insertions(),
                completed_strokes: policy.completed_strokes(),
                pending_strokes: policy.stroke_counter(),
                feedrate_inserted: pass.inserted_at.is_some(),
            },
            diagnostics,
            final_state: state,
        }
    }

    fn insert_ink(
        &self,
        job: &str,
        trigger: InkTrigger,
        state: &mut MachineState,
        out: &mut Vec<OutputLine>,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        let expansion = self
            .renderer
            .expand(self.ink_macro, &trigger.label(job), state);
        out.extend(expansion.lines);
        diagnostics.extend(expansion.diagnostics);
    }
}
