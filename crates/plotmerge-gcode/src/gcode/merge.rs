//! Merge orchestration
//!
//! One run walks a fixed sequence of stages:
//!
//! ```text
//! validate -> run-writing -> insert-paper -> run-drawing -> finalize
//! ```
//!
//! Any stage may fail, which ends the run before anything is written. The
//! sink is written exactly once, in `finalize`. Writing always precedes the
//! paper change, which always precedes drawing; the stages are never
//! reordered or run concurrently.

use plotmerge_core::{ConfigError, InputError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use tracing::{debug, info, warn};

use super::job::{Job, JobPipeline, JobSummary, LoadedJob};
use super::macros::{Macro, MacroContext, MacroRenderer};
use super::output::{Diagnostic, OutputLine};
use super::pen_state::{MachineState, PenHeights};
use crate::utils::LineSink;

/// What to do when the paper macro is empty
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperPolicy {
    /// Skip the paper change and report a diagnostic
    #[default]
    Lenient,
    /// Reject the configuration
    Required,
}

/// Stage of a merge run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Configuration and input checks
    Validate,
    /// Writing job
    RunWriting,
    /// Paper change between the jobs
    InsertPaper,
    /// Drawing job
    RunDrawing,
    /// Assemble and write the artifact
    Finalize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validate => write!(f, "validate"),
            Self::RunWriting => write!(f, "run-writing"),
            Self::InsertPaper => write!(f, "insert-paper"),
            Self::RunDrawing => write!(f, "run-drawing"),
            Self::Finalize => write!(f, "finalize"),
        }
    }
}

/// Everything one merge run needs
#[derive(Debug)]
pub struct PostConfig {
    /// Job processed first
    pub writing: Job,
    /// Job processed after the paper change
    pub drawing: Job,
    /// Travel height
    pub pen_up_z: f64,
    /// Contact height, strictly above `pen_up_z`
    pub pen_down_z: f64,
    /// Feed rate used when a job does not set one
    pub default_feedrate: f64,
    /// Re-ink macro
    pub ink_macro: Macro,
    /// Paper change macro
    pub paper_macro: Macro,
    /// Placeholder values for both macros
    pub macro_context: MacroContext,
    /// Handling of an empty paper macro
    pub paper_policy: PaperPolicy,
}

/// Line ranges of the three blocks in the merged program
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockLayout {
    /// Writing job block
    pub writing: Range<usize>,
    /// Paper change block (empty when skipped)
    pub paper: Range<usize>,
    /// Drawing job block
    pub drawing: Range<usize>,
}

/// Summary of a finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostResult {
    /// Writing job counters
    pub writing: JobSummary,
    /// Drawing job counters
    pub drawing: JobSummary,
    /// Paper changes inserted (1, or 0 when skipped)
    pub paper_changes: u32,
    /// Lines in the artifact
    pub total_lines: usize,
    /// Where the artifact went
    pub output: String,
    /// Non-fatal problems from the whole run
    pub diagnostics: Vec<Diagnostic>,
    /// Where each block sits in the artifact
    pub layout: BlockLayout,
}

impl PostResult {
    /// Ink insertions in the writing job
    pub fn writing_ink(&self) -> u32 {
        self.writing.ink_insertions
    }

    /// Ink insertions in the drawing job
    pub fn drawing_ink(&self) -> u32 {
        self.drawing.ink_insertions
    }

    /// Ink insertions across both jobs
    pub fn total_ink(&self) -> u32 {
        self.writing_ink() + self.drawing_ink()
    }
}

struct Validated {
    renderer: MacroRenderer,
    writing: LoadedJob,
    drawing: LoadedJob,
    default_feedrate: f64,
    ink_macro: Macro,
    paper_macro: Macro,
}

/// Drives one merge run
#[derive(Debug)]
pub struct PostProcessor {
    config: PostConfig,
}

impl PostProcessor {
    /// Create a processor
    pub fn new(config: PostConfig) -> Self {
        Self { config }
    }

    /// Run every stage and write the artifact to `sink`
    pub fn run(self, sink: &mut dyn LineSink) -> Result<PostResult> {
        info!(
            "Merging {} + {} -> {}",
            self.config.writing.source().describe(),
            self.config.drawing.source().describe(),
            sink.describe()
        );

        enter(Stage::Validate);
        let validated = validate(self.config, sink)?;
        let pipeline = JobPipeline::new(
            &validated.renderer,
            &validated.ink_macro,
            validated.default_feedrate,
        );
        let mut diagnostics = Vec::new();

        enter(Stage::RunWriting);
        let writing = pipeline.run(validated.writing);
        diagnostics.extend(writing.diagnostics);

        enter(Stage::InsertPaper);
        let mut paper_state = writing.final_state;
        let (paper_lines, paper_changes) = insert_paper(
            &validated.renderer,
            &validated.paper_macro,
            &mut paper_state,
            &mut diagnostics,
        );

        enter(Stage::RunDrawing);
        let drawing = pipeline.run(validated.drawing);
        diagnostics.extend(drawing.diagnostics);

        enter(Stage::Finalize);
        let writing_end = writing.lines.len();
        let paper_end = writing_end + paper_lines.len();
        let layout = BlockLayout {
            writing: 0..writing_end,
            paper: writing_end..paper_end,
            drawing: paper_end..paper_end + drawing.lines.len(),
        };

        let program: Vec<String> = writing
            .lines
            .into_iter()
            .chain(paper_lines)
            .chain(drawing.lines)
            .map(|line| line.text)
            .collect();

        sink.write_lines(&program)?;
        info!("G-code written to {} ({} lines)", sink.describe(), program.len());

        Ok(PostResult {
            writing: writing.summary,
            drawing: drawing.summary,
            paper_changes,
            total_lines: program.len(),
            output: sink.describe(),
            diagnostics,
            layout,
        })
    }
}

/// Run a merge with `config`, writing to `sink`
pub fn post_process(config: PostConfig, sink: &mut dyn LineSink) -> Result<PostResult> {
    PostProcessor::new(config).run(sink)
}

fn enter(stage: Stage) {
    debug!("Post stage: {}", stage);
}

fn validate(config: PostConfig, sink: &mut dyn LineSink) -> Result<Validated> {
    let heights = PenHeights::new(config.pen_up_z, config.pen_down_z)?;

    if !config.default_feedrate.is_finite() {
        return Err(ConfigError::NonFiniteValue {
            key: "default_feedrate".to_string(),
        }
        .into());
    }
    if config.default_feedrate <= 0.0 {
        return Err(ConfigError::NonPositiveFeedrate(config.default_feedrate).into());
    }
    if config.paper_policy == PaperPolicy::Required && config.paper_macro.is_empty() {
        return Err(ConfigError::MissingPaperMacro.into());
    }

    let writing = load_job(config.writing)?;
    let drawing = load_job(config.drawing)?;

    sink.prepare()?;

    Ok(Validated {
        renderer: MacroRenderer::new(heights, config.macro_context),
        writing,
        drawing,
        default_feedrate: config.default_feedrate,
        ink_macro: config.ink_macro,
        paper_macro: config.paper_macro,
    })
}

fn load_job(job: Job) -> Result<LoadedJob> {
    let loaded = job.load()?;
    if loaded.is_blank() {
        return Err(InputError::Empty {
            job: loaded.name,
            path: loaded.origin,
        }
        .into());
    }
    Ok(loaded)
}

fn insert_paper(
    renderer: &MacroRenderer,
    paper_macro: &Macro,
    state: &mut MachineState,
    diagnostics: &mut Vec<Diagnostic>,
) -> (Vec<OutputLine>, u32) {
    if paper_macro.is_empty() {
        warn!("No paper macro configured, skipping the paper change");
        diagnostics.push(Diagnostic::PaperChangeSkipped);
        return (Vec::new(), 0);
    }

    let mut lines = vec![OutputLine::annotation("; === paper change ===")];
    let expansion = renderer.expand(paper_macro, "paper change #1", state);
    lines.extend(expansion.lines);
    lines.push(OutputLine::annotation(""));
    diagnostics.extend(expansion.diagnostics);
    (lines, 1)
}
