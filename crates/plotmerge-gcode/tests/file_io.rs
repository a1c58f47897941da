use plotmerge_gcode::{
    post_process, FileSink, FileSource, InkMode, Job, LineSink, LineSource, Macro, MacroContext,
    PaperPolicy, PostConfig,
};
use std::fs;
use tempfile::tempdir;

fn config(writing: &std::path::Path, drawing: &std::path::Path, pen_down_z: f64) -> PostConfig {
    PostConfig {
        writing: Job::new("writing", Box::new(FileSource::new(writing)), InkMode::Off),
        drawing: Job::new(
            "drawing",
            Box::new(FileSource::new(drawing)),
            InkMode::stroke("drawing", 1).unwrap(),
        ),
        pen_up_z: 0.0,
        pen_down_z,
        default_feedrate: 1000.0,
        ink_macro: Macro::new("ink", vec!["G0 X{ink_x} Y{ink_y}".to_string()]),
        paper_macro: Macro::new("paper", vec!["G0 X{paper_x} Y{paper_y}".to_string()]),
        macro_context: MacroContext::plotter(0.0, 8.0, None, (10.0, -10.0), (0.0, 0.0)),
        paper_policy: PaperPolicy::Lenient,
    }
}

#[test]
fn test_merges_files_into_nested_output() {
    let dir = tempdir().unwrap();
    let writing = dir.path().join("writing.nc");
    let drawing = dir.path().join("drawing.nc");
    let output = dir.path().join("out").join("gcode").join("merged.nc");
    fs::write(&writing, "\u{feff}G90\r\nG1 F800\r\nG1 Z8\r\nG0 Z0\r\n").unwrap();
    fs::write(&drawing, "G1 F900\nG1 Z8\nG0 Z0\n").unwrap();

    let mut sink = FileSink::new(&output);
    let result = post_process(config(&writing, &drawing, 8.0), &mut sink).unwrap();

    let text = fs::read_to_string(&output).unwrap();
    assert!(text.ends_with('\n'));
    assert_eq!(text.lines().count(), result.total_lines);
    assert!(text.starts_with("; === writing start ===\nG90\nG1 F800\n"));
    assert_eq!(result.drawing_ink(), 1);
    assert_eq!(result.output, output.display().to_string());
    assert!(!dir.path().join("out/gcode/.merged.nc.tmp").exists());
}

#[test]
fn test_invalid_heights_create_no_output() {
    let dir = tempdir().unwrap();
    let writing = dir.path().join("writing.nc");
    let drawing = dir.path().join("drawing.nc");
    let output = dir.path().join("out").join("merged.nc");
    fs::write(&writing, "G1 F800\n").unwrap();
    fs::write(&drawing, "G1 F800\n").unwrap();

    let mut sink = FileSink::new(&output);
    let err = post_process(config(&writing, &drawing, 0.0), &mut sink).unwrap_err();

    assert!(err.is_config_error());
    assert!(!output.exists());
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_empty_file_is_input_error() {
    let dir = tempdir().unwrap();
    let writing = dir.path().join("writing.nc");
    let drawing = dir.path().join("drawing.nc");
    fs::write(&writing, "\n   \n").unwrap();
    fs::write(&drawing, "G1 F800\n").unwrap();

    let output = dir.path().join("merged.nc");
    let mut sink = FileSink::new(&output);
    let err = post_process(config(&writing, &drawing, 8.0), &mut sink).unwrap_err();

    assert!(err.is_input_error());
    assert!(err.to_string().contains("writing"));
    assert!(!output.exists());
}

#[test]
fn test_sink_rejects_directory_target() {
    let dir = tempdir().unwrap();
    let mut sink = FileSink::new(dir.path());
    assert!(sink.prepare().unwrap_err().is_config_error());
}

#[test]
fn test_file_source_reads_lines() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("a.nc");
    fs::write(&path, "G90\nG0 X1\n").unwrap();
    let source = FileSource::new(&path);
    assert_eq!(
        source.read_lines("writing").unwrap(),
        vec!["G90".to_string(), "G0 X1".to_string()]
    );
}

#[test]
fn test_failed_rename_leaves_no_temp_file() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("merged.nc");
    fs::create_dir(&target).unwrap();
    fs::write(target.join("keep.txt"), "x").unwrap();

    let mut sink = FileSink::new(&target);
    assert!(sink.write_lines(&["G90".to_string()]).is_err());
    assert!(!dir.path().join(".merged.nc.tmp").exists());
    assert!(target.join("keep.txt").exists());
}

#[test]
fn test_failed_write_is_reported() {
    let dir = tempdir().unwrap();
    let mut sink = FileSink::new(dir.path().join("missing").join("merged.nc"));
    assert!(sink.write_lines(&["G90".to_string()]).is_err());
    assert!(!dir.path().join("missing").exists());
}
