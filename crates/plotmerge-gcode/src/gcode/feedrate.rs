//! Feed-rate pre-pass
//!
//! GRBL refuses (or worse, runs at an undefined speed) a `G1` issued before
//! any `F` word. Before a job is processed, its first two command lines are
//! checked; when neither carries a feed rate a `G1 F<default>` line is placed
//! right after the first one.

use plotmerge_core::format_value;
use tracing::debug;

use super::classifier::{is_blank_or_comment, AxisValues};

/// Number of leading command lines inspected
const CANDIDATE_COUNT: usize = 2;

/// Lines after the pre-pass
#[derive(Debug, Clone, PartialEq)]
pub struct FeedRatePass {
    /// Input lines, possibly with one synthetic line added
    pub lines: Vec<String>,
    /// Index of the synthetic line in `lines`, if one was added
    pub inserted_at: Option<usize>,
}

/// The synthetic velocity line for `feedrate`
pub fn feedrate_line(feedrate: f64) -> String {
    format!("G1 F{}", format_value(feedrate))
}

/// Ensure a feed rate is set before the first motion lines
pub fn ensure_feedrate(lines: Vec<String>, default_feedrate: f64) -> FeedRatePass {
    let candidates: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| !is_blank_or_comment(line))
        .map(|(idx, _)| idx)
        .take(CANDIDATE_COUNT)
        .collect();

    let has_feed = candidates
        .iter()
        .any(|&idx| AxisValues::extract(&lines[idx]).f.is_some());

    let Some(&first) = candidates.first() else {
        return FeedRatePass {
            lines,
            inserted_at: None,
        };
    };
    if has_feed {
        return FeedRatePass {
            lines,
            inserted_at: None,
        };
    }

    let insert_pos = first + 1;
    let injection = feedrate_line(default_feedrate);
    debug!(
        "No feed rate in leading commands, inserting '{}' at line {}",
        injection,
        insert_pos + 1
    );

    let mut lines = lines;
    lines.insert(insert_pos, injection);
    FeedRatePass {
        lines,
        inserted_at: Some(insert_pos),
    }
}
