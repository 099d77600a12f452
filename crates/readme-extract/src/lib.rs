//! Extraction of marker-prefixed documentation lines and rendering of the
//! README document built from them.
//!
//! The crate does no writing; it turns source text into [`DocLine`]s and
//! [`DocLine`]s into the document string.

mod line;
mod marker;

pub use line::{read_lines, split_lines, LineRecord};
pub use marker::{Marker, MarkerError, ParsePayloadModeError, PayloadMode, DEFAULT_MARKER};

use std::{
    fs::File,
    io::{self, BufReader, Read},
    path::Path,
};

/// Title line placed at the top of every generated document.
pub const DEFAULT_HEADER: &str = "# softbuffer-rgb";

/// One extracted documentation line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocLine {
    /// 1-based line number in the source document.
    pub line: usize,
    pub payload: String,
}

pub fn extract_from_str(text: &str, marker: &Marker, mode: PayloadMode) -> Vec<DocLine> {
    collect_doc_lines(&split_lines(text), marker, mode)
}

pub fn extract_from_reader<R: Read>(
    reader: &mut R,
    marker: &Marker,
    mode: PayloadMode,
) -> io::Result<Vec<DocLine>> {
    let lines = read_lines(reader)?;
    Ok(collect_doc_lines(&lines, marker, mode))
}

pub fn extract_from_path(
    path: &Path,
    marker: &Marker,
    mode: PayloadMode,
) -> io::Result<Vec<DocLine>> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    extract_from_reader(&mut reader, marker, mode)
}

/// Builds `header`, a blank line, then every payload joined by `\n`.
/// No newline follows the last payload.
pub fn render_document(header: &str, lines: &[DocLine]) -> String {
    let body_len: usize = lines.iter().map(|line| line.payload.len() + 1).sum();
    let mut document = String::with_capacity(header.len() + 2 + body_len);
    document.push_str(header);
    document.push_str("\n\n");

    for (idx, line) in lines.iter().enumerate() {
        if idx > 0 {
            document.push('\n');
        }
        document.push_str(&line.payload);
    }

    document
}

fn collect_doc_lines(lines: &[LineRecord], marker: &Marker, mode: PayloadMode) -> Vec<DocLine> {
    lines
        .iter()
        .filter_map(|record| {
            marker.payload(&record.text).map(|payload| DocLine {
                line: record.number,
                payload: mode.apply(payload).to_string(),
            })
        })
        .collect()
}
