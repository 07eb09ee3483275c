//! Source location tracking for findings.
//!
//! # Design
//!
//! - `Span`: compact byte range with a cached start line, carried by every
//!   AST node
//! - `SourceMap`: owns all source files of an analysis run
//! - `SourceFile`: one file with a line index for `(line, column)` lookup
//! - `SourcePosition`: the resolved `file:line:column` a finding reports
//!
//! # Examples
//!
//! ```
//! # use nestml_ast::foundation::span::*;
//! # use std::path::PathBuf;
//! let mut map = SourceMap::new();
//! let file_id = map.add_file(PathBuf::from("iaf.nestml"), "neuron iaf:\nend".to_string());
//! let span = Span::new(file_id, 12, 15, 2);
//!
//! assert_eq!(map.snippet(&span), Some("end"));
//! assert_eq!(map.position(&span).to_string(), "iaf.nestml:2:1");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Compact source location reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// Index into SourceMap.files
    pub file_id: u16,
    /// Byte offset of start position
    pub start: u32,
    /// Byte offset of end position (exclusive)
    pub end: u32,
    /// Cached line number (1-based) for the start position
    pub start_line: u32,
}

/// Collection of all source files in an analysis run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceMap {
    files: Vec<SourceFile>,
}

/// A single source file with line indexing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: PathBuf,
    pub source: String,
    /// Byte offsets of each line start.
    ///
    /// line_starts[0] is always 0; the last element is the EOF sentinel.
    pub line_starts: Vec<u32>,
}

/// A resolved location, as printed in findings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourcePosition {
    pub file: String,
    /// 1-based
    pub line: u32,
    /// 1-based
    pub column: u32,
}

impl Span {
    pub fn new(file_id: u16, start: u32, end: u32, start_line: u32) -> Self {
        Self {
            file_id,
            start,
            end,
            start_line,
        }
    }

    /// Zero-length span at the start of a file.
    pub fn zero(file_id: u16) -> Self {
        Self::new(file_id, 0, 0, 1)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    /// Span covering both `self` and `other`.
    ///
    /// Spans from different files keep `self`.
    pub fn merge(&self, other: &Span) -> Span {
        if self.file_id != other.file_id {
            return *self;
        }
        Span {
            file_id: self.file_id,
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            start_line: self.start_line.min(other.start_line),
        }
    }
}

impl SourceMap {
    pub fn new() -> Self {
        Self { files: Vec::new() }
    }

    /// Add a source file and return its ID.
    ///
    /// # Panics
    /// Panics past `u16::MAX` files.
    pub fn add_file(&mut self, path: PathBuf, source: String) -> u16 {
        let file_id = self.files.len();
        assert!(file_id < u16::MAX as usize, "too many source files");
        self.files.push(SourceFile::new(path, source));
        file_id as u16
    }

    pub fn file(&self, span: &Span) -> Option<&SourceFile> {
        self.files.get(span.file_id as usize)
    }

    pub fn file_by_id(&self, file_id: u16) -> Option<&SourceFile> {
        self.files.get(file_id as usize)
    }

    pub fn file_path(&self, span: &Span) -> Option<&Path> {
        self.file(span).map(|f| f.path.as_path())
    }

    pub fn snippet(&self, span: &Span) -> Option<&str> {
        self.file(span)?
            .source
            .get(span.start as usize..span.end as usize)
    }

    /// Resolve a span's start into a printable position.
    ///
    /// Unknown files render as `<unknown>` with the cached line.
    pub fn position(&self, span: &Span) -> SourcePosition {
        match self.file(span) {
            Some(file) => {
                let (line, column) = file.line_col(span.start);
                SourcePosition {
                    file: file.path.display().to_string(),
                    line,
                    column,
                }
            }
            None => SourcePosition {
                file: "<unknown>".to_string(),
                line: span.start_line,
                column: 1,
            },
        }
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

impl SourceFile {
    pub fn new(path: PathBuf, source: String) -> Self {
        let line_starts = compute_line_starts(&source);
        Self {
            path,
            source,
            line_starts,
        }
    }

    /// Get (line, column) for a byte offset, both 1-based.
    ///
    /// Offsets past EOF clamp to EOF.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let offset = offset.min(self.source.len() as u32);
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx.max(1) - 1,
        };
        let line_start = self.line_starts.get(line_idx).copied().unwrap_or(0);
        ((line_idx + 1) as u32, offset - line_start + 1)
    }

    /// Text of a 1-based line, including its newline.
    pub fn line_text(&self, line: u32) -> Option<&str> {
        if line == 0 || line as usize >= self.line_starts.len() {
            return None;
        }
        let idx = (line - 1) as usize;
        let start = self.line_starts[idx] as usize;
        let end = self.line_starts[idx + 1] as usize;
        self.source.get(start..end)
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len().saturating_sub(1)
    }
}

impl SourcePosition {
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Byte offsets of line starts, with an EOF sentinel.
pub fn compute_line_starts(source: &str) -> Vec<u32> {
    let mut line_starts = vec![0];

    for (idx, ch) in source.char_indices() {
        if ch == '\n' {
            line_starts.push((idx + 1) as u32);
        }
    }

    if line_starts.last() != Some(&(source.len() as u32)) {
        line_starts.push(source.len() as u32);
    }

    line_starts
}
