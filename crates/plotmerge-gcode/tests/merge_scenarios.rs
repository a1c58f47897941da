use plotmerge_gcode::{
    post_process, Diagnostic, InkMode, Job, LineSink, Macro, MacroContext, MemorySink,
    MemorySource, PaperPolicy, PostConfig,
};

const MARKER: &str = ";#AUTO_INK#";

fn ink_macro() -> Macro {
    Macro::new(
        "ink",
        vec![
            "G0 Z{pen_up_z}".to_string(),
            "G0 X{ink_x} Y{ink_y}".to_string(),
            "G1 Z{pen_down_z}".to_string(),
            "G4 P0.5".to_string(),
            "G0 Z{pen_up_z}".to_string(),
        ],
    )
}

fn paper_macro() -> Macro {
    Macro::new(
        "paper",
        vec![
            "G0 Z{safe_z}".to_string(),
            "G0 X{paper_x} Y{paper_y}".to_string(),
            "G4 P1.0".to_string(),
        ],
    )
}

fn job(name: &str, lines: &[&str], ink_mode: InkMode) -> Job {
    Job::new(
        name,
        Box::new(MemorySource::new(format!("{}.nc", name), lines.iter().copied())),
        ink_mode,
    )
}

fn config(writing: Job, drawing: Job) -> PostConfig {
    PostConfig {
        writing,
        drawing,
        pen_up_z: 0.0,
        pen_down_z: 8.0,
        default_feedrate: 1000.0,
        ink_macro: ink_macro(),
        paper_macro: paper_macro(),
        macro_context: MacroContext::plotter(0.0, 8.0, Some(1.0), (10.0, -10.0), (0.0, 0.0)),
        paper_policy: PaperPolicy::Lenient,
    }
}

/// `count` pen-down/pen-up cycles, each drawing a short segment
fn strokes(count: usize) -> Vec<String> {
    let mut lines = vec!["G90".to_string(), "G1 F1200".to_string()];
    for i in 0..count {
        lines.push(format!("G0 X{} Y0", i * 10));
        lines.push("G1 Z8".to_string());
        lines.push(format!("G1 X{} Y5", i * 10 + 5));
        lines.push("G0 Z0".to_string());
    }
    lines
}

fn as_refs(lines: &[String]) -> Vec<&str> {
    lines.iter().map(String::as_str).collect()
}

#[test]
fn test_stroke_counts_across_both_jobs() {
    let writing_lines = strokes(3);
    let drawing_lines = strokes(2);
    let cfg = config(
        job("writing", &as_refs(&writing_lines), InkMode::stroke("writing", 2).unwrap()),
        job("drawing", &as_refs(&drawing_lines), InkMode::stroke("drawing", 1).unwrap()),
    );

    let mut sink = MemorySink::new();
    let result = post_process(cfg, &mut sink).unwrap();

    assert_eq!(result.writing_ink(), 1);
    assert_eq!(result.writing.pending_strokes, 1);
    assert_eq!(result.writing.completed_strokes, 3);
    assert_eq!(result.drawing_ink(), 2);
    assert_eq!(result.drawing.pending_strokes, 0);
    assert_eq!(result.paper_changes, 1);
    assert_eq!(result.total_ink(), 3);
    assert!(result.diagnostics.is_empty());

    // The writing insertion follows the second lift, not the first or third.
    let lines = sink.lines();
    let block = &lines[result.layout.writing.clone()];
    let lifts: Vec<usize> = block
        .iter()
        .enumerate()
        .filter(|(_, l)| l.as_str() == "G0 Z0")
        .map(|(i, _)| i)
        .collect();
    let start = block
        .iter()
        .position(|l| l == "; ---- writing auto ink #1 start ----")
        .unwrap();
    assert_eq!(start, lifts[1] + 1);
}

#[test]
fn test_feedrate_inserted_once_after_first_command() {
    let writing = ["; generated", "G90", "G0 X0 Y0", "G1 Z8", "G1 X5 F900"];
    let cfg = config(
        job("writing", &writing, InkMode::Off),
        job("drawing", &["G1 F1200", "G1 X1"], InkMode::Off),
    );

    let mut sink = MemorySink::new();
    let result = post_process(cfg, &mut sink).unwrap();
    let lines = sink.lines();
    let block = &lines[result.layout.writing.clone()];

    assert!(result.writing.feedrate_inserted);
    assert!(!result.drawing.feedrate_inserted);
    // start annotation + input + synthetic feed + end annotation + separator
    assert_eq!(block.len(), writing.len() + 1 + 3);
    assert_eq!(block[2], "G90");
    assert_eq!(block[3], "G1 F1000");
    assert_eq!(block[4], "G0 X0 Y0");
}

#[test]
fn test_marker_line_replaced_by_wrapped_macro() {
    let writing = ["G1 F1000", "G1 Z8", "G1 X5", "G0 Z0", MARKER, "G1 Z8", "G0 Z0"];
    let cfg = config(
        job("writing", &writing, InkMode::marker("writing", MARKER).unwrap()),
        job("drawing", &["G1 F1200"], InkMode::Off),
    );

    let mut sink = MemorySink::new();
    let result = post_process(cfg, &mut sink).unwrap();
    let lines = sink.lines();

    assert_eq!(result.writing_ink(), 1);
    assert!(!lines.iter().any(|l| l == MARKER));

    let start = lines
        .iter()
        .position(|l| l == "; ---- writing manual ink #1 start ----")
        .unwrap();
    let end = lines
        .iter()
        .position(|l| l == "; ---- writing manual ink #1 end ----")
        .unwrap();
    assert_eq!(lines[start - 1], "G0 Z0");
    assert_eq!(end - start - 1, ink_macro().lines.len());
    assert_eq!(
        &lines[start + 1..end],
        &["G0 Z0", "G0 X10 Y-10", "G1 Z8", "G4 P0.5", "G0 Z0"]
    );
    assert_eq!(lines[end + 1], "G1 Z8");
}

#[test]
fn test_marker_substring_does_not_trigger() {
    let writing = ["G1 F1000", "; please ;#AUTO_INK# later", "G1 X1 ;#AUTO_INK#"];
    let cfg = config(
        job("writing", &writing, InkMode::marker("writing", MARKER).unwrap()),
        job("drawing", &["G1 F1200"], InkMode::Off),
    );
    let mut sink = MemorySink::new();
    let result = post_process(cfg, &mut sink).unwrap();
    assert_eq!(result.writing_ink(), 0);
}

#[test]
fn test_macro_leaving_pen_down_gets_lift() {
    let mut cfg = config(
        job("writing", &["G1 F1000", MARKER], InkMode::marker("writing", MARKER).unwrap()),
        job("drawing", &["G1 F1200"], InkMode::Off),
    );
    cfg.ink_macro = Macro::new("ink", vec!["G1 Z{pen_down_z}".to_string()]);

    let mut sink = MemorySink::new();
    post_process(cfg, &mut sink).unwrap();
    let lines = sink.lines();
    let end = lines
        .iter()
        .position(|l| l == "; ---- writing manual ink #1 end ----")
        .unwrap();
    assert_eq!(lines[end - 1], "G0 Z0");
    assert_eq!(lines[end - 2], "G1 Z8");
}

#[test]
fn test_writing_then_paper_then_drawing() {
    let cfg = config(
        job("writing", &["G1 F1000", "G1 X1"], InkMode::Off),
        job("drawing", &["G1 F1200", "G1 X2"], InkMode::Off),
    );
    let mut sink = MemorySink::new();
    let result = post_process(cfg, &mut sink).unwrap();
    let lines = sink.lines();

    let pos = |needle: &str| lines.iter().position(|l| l == needle).unwrap();
    assert!(pos("; === writing end ===") < pos("; === paper change ==="));
    assert!(pos("; === paper change ===") < pos("; === drawing start ==="));
    assert!(pos("G1 X1") < pos("G0 X0 Y0"));
    assert!(pos("G0 X0 Y0") < pos("G1 X2"));

    assert_eq!(result.layout.writing.start, 0);
    assert_eq!(result.layout.writing.end, result.layout.paper.start);
    assert_eq!(result.layout.paper.end, result.layout.drawing.start);
    assert_eq!(sink.contents().unwrap().chars().last(), Some('\n'));
}

#[test]
fn test_unknown_placeholder_is_reported_not_fatal() {
    let mut cfg = config(
        job("writing", &["G1 F1000"], InkMode::Off),
        job("drawing", &["G1 F1200"], InkMode::Off),
    );
    cfg.paper_macro = Macro::new("paper", vec!["G0 X{tray_x}".to_string()]);

    let mut sink = MemorySink::new();
    let result = post_process(cfg, &mut sink).unwrap();
    assert!(sink.lines().iter().any(|l| l == "G0 X{tray_x}"));
    assert_eq!(
        result.diagnostics,
        vec![Diagnostic::UnresolvedPlaceholder {
            macro_name: "paper".to_string(),
            placeholder: "tray_x".to_string(),
        }]
    );
}

#[test]
fn test_missing_drawing_source_fails_before_write() {
    let cfg = config(
        job("writing", &["G1 F1000"], InkMode::Off),
        Job::new(
            "drawing",
            Box::new(plotmerge_gcode::FileSource::new("/no/such/drawing.nc")),
            InkMode::Off,
        ),
    );
    let mut sink = MemorySink::new();
    let err = post_process(cfg, &mut sink).unwrap_err();
    assert!(err.is_input_error());
    assert!(err.to_string().contains("drawing"));
    assert!(err.to_string().contains("/no/such/drawing.nc"));
    assert!(!sink.is_written());
    assert_eq!(sink.describe(), "<memory>");
}
