//! # plotmerge G-code
//!
//! Post-processing for pen-plotter G-code: merges a writing program and a
//! drawing program into one file, inserting re-ink macros according to each
//! job's ink policy and a paper change between the two.
//!
//! ```ignore
//! let mut sink = FileSink::new("merged.nc");
//! let result = post_process(config, &mut sink)?;
//! println!("{} ink insertions", result.total_ink());
//! ```

pub mod gcode;
pub mod utils;

pub use gcode::{
    classify, ensure_feedrate, post_process, render_template, AxisValues, BlockLayout,
    ClassifiedLine, Diagnostic, Expansion, FeedRatePass, InkMode, InkModeKind, InkPolicy,
    InkTrigger, Job, JobOutput, JobPipeline, JobSummary, LineKind, LineOrigin, LoadedJob, Macro,
    MacroContext, MacroRenderer, MachineState, MarkerToken, OutputLine, PaperPolicy, PenHeights,
    PenTransition, PostConfig, PostProcessor, PostResult, Stage, TriggerCause,
};

pub use utils::{FileSink, FileSource, LineSink, LineSource, MemorySink, MemorySource};
