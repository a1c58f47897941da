//! G-code post-processing
//!
//! This module provides:
//! - Line classification (comments, axis values, marker lines)
//! - Pen state tracking with a tolerance band
//! - Feed-rate pre-pass
//! - Ink insertion policy
//! - Macro template rendering
//! - Per-job pipeline and the writing/paper/drawing merge

pub mod classifier;
pub mod feedrate;
pub mod ink_policy;
pub mod job;
pub mod macros;
pub mod merge;
pub mod output;
pub mod pen_state;

pub use classifier::*;
pub use feedrate::*;
pub use ink_policy::*;
pub use job::*;
pub use macros::*;
pub use merge::*;
pub use output::*;
pub use pen_state::*;
