//! Line sources and sinks
//!
//! The post-processor never touches the filesystem directly. Jobs read from a
//! [`LineSource`] and the merged program goes to a [`LineSink`], so a whole
//! run can be exercised in memory.
//!
//! Files are read whole before processing and written whole after it. The
//! file sink writes through a sibling temporary file and renames it into
//! place, so a reader never sees a half-written program.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use plotmerge_core::{ConfigError, InputError, Result};
use tracing::debug;

const UTF8_BOM: char = '\u{feff}';

/// Supplies the raw lines of one job
pub trait LineSource: fmt::Debug {
    /// Human-readable origin, e.g. a path
    fn describe(&self) -> String;

    /// Read every line; `job` is used in error messages
    fn read_lines(&self, job: &str) -> Result<Vec<String>>;
}

/// Receives the merged program
pub trait LineSink: fmt::Debug {
    /// Human-readable destination
    fn describe(&self) -> String;

    /// Make sure the destination can be written; called during validation
    fn prepare(&mut self) -> Result<()>;

    /// Write the complete program, once
    fn write_lines(&mut self, lines: &[String]) -> Result<()>;
}

/// Split file text into lines, dropping a leading BOM
pub fn split_lines(text: &str) -> Vec<String> {
    text.strip_prefix(UTF8_BOM)
        .unwrap_or(text)
        .lines()
        .map(str::to_string)
        .collect()
}

/// Join lines into artifact text with a trailing newline
pub fn join_lines(lines: &[String]) -> String {
    let mut text = lines.join("\n");
    text.push('\n');
    text
}

/// G-code file on disk
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Create a source for `path`
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Source path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LineSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn read_lines(&self, job: &str) -> Result<Vec<String>> {
        if !self.path.is_file() {
            return Err(InputError::NotFound {
                job: job.to_string(),
                path: self.describe(),
            }
            .into());
        }

        let text = fs::read_to_string(&self.path).map_err(|e| InputError::Unreadable {
            job: job.to_string(),
            path: self.describe(),
            reason: e.to_string(),
        })?;
        let lines = split_lines(&text);
        debug!("Read {} lines for {} from {}", lines.len(), job, self.describe());
        Ok(lines)
    }
}

/// In-memory lines, for tests and front ends that already hold the text
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    label: String,
    lines: Vec<String>,
}

impl MemorySource {
    /// Create a source from lines
    pub fn new<I, S>(label: impl Into<String>, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            label: label.into(),
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a source from text
    pub fn from_text(label: impl Into<String>, text: &str) -> Self {
        Self {
            label: label.into(),
            lines: split_lines(text),
        }
    }
}

impl LineSource for MemorySource {
    fn describe(&self) -> String {
        self.label.clone()
    }

    fn read_lines(&self, _job: &str) -> Result<Vec<String>> {
        Ok(self.lines.clone())
    }
}

/// Output file on disk
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    /// Create a sink for `path`
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Destination path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        self.path.with_file_name(format!(".{}.tmp", name))
    }
}

impl LineSink for FileSink {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn prepare(&mut self) -> Result<()> {
        let not_creatable = |reason: String| ConfigError::OutputNotCreatable {
            path: self.path.clone(),
            reason,
        };

        if self.path.is_dir() {
            return Err(not_creatable("path is a directory".to_string()).into());
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| not_creatable(e.to_string()))?;
        }
        Ok(())
    }

    fn write_lines(&mut self, lines: &[String]) -> Result<()> {
        let temp = self.temp_path();
        let written =
            fs::write(&temp, join_lines(lines)).and_then(|()| fs::rename(&temp, &self.path));
        if let Err(e) = written {
            let _ = fs::remove_file(&temp);
            return Err(e.into());
        }
        Ok(())
    }
}

/// Collects the program in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    contents: Option<String>,
}

impl MemorySink {
    /// Empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Written text, `None` until a run finishes
    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }

    /// Written lines, empty until a run finishes
    pub fn lines(&self) -> Vec<String> {
        self.contents.as_deref().map(split_lines).unwrap_or_default()
    }

    /// True once a run has written output
    pub fn is_written(&self) -> bool {
        self.contents.is_some()
    }
}

impl LineSink for MemorySink {
    fn describe(&self) -> String {
        "<memory>".to_string()
    }

    fn prepare(&mut self) -> Result<()> {
        Ok(())
    }

    fn write_lines(&mut self, lines: &[String]) -> Result<()> {
        self.contents = Some(join_lines(lines));
        Ok(())
    }
}
