use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use readme_extract::{extract_from_path, render_document, Marker, PayloadMode};
use readme_gen_config::ReadmeSettings;
use tracing::{debug, info, trace, warn};

use crate::diff::build_unified_diff;
use crate::error::{ExitCode, GenError, GenResult};
use crate::fs::write_atomic;

/// What a run does with the rendered document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Replace the output file.
    #[default]
    Write,
    /// Leave the output alone and report whether it is stale.
    Check,
    /// Leave the output alone and return the diff a write would apply.
    DryRun,
    /// Leave the output alone and hand the document back to the caller.
    Stdout,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Write => "write",
            Mode::Check => "check",
            Mode::DryRun => "dry-run",
            Mode::Stdout => "stdout",
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub source: PathBuf,
    pub output: PathBuf,
    pub header: String,
    pub marker: String,
    pub payload: PayloadMode,
    pub mode: Mode,
    pub backup: bool,
}

impl GenerateRequest {
    pub fn from_settings(settings: &ReadmeSettings, mode: Mode) -> Self {
        Self {
            source: settings.source.clone(),
            output: settings.output.clone(),
            header: settings.header.clone(),
            marker: settings.marker.clone(),
            payload: settings.payload,
            mode,
            backup: settings.backup,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerateOutcome {
    pub document: String,
    /// Number of doc lines pulled from the source.
    pub extracted: usize,
    /// 1-based source line of each extracted doc line, in output order.
    pub source_lines: Vec<usize>,
    /// Whether the rendered document differs from the output on disk.
    pub changed: bool,
    pub diff: Option<String>,
    pub exit_code: ExitCode,
}

pub fn generate(request: GenerateRequest) -> GenResult<GenerateOutcome> {
    validate_header(&request.header)?;
    let marker = Marker::new(&request.marker)?;

    debug!(
        source = %request.source.display(),
        output = %request.output.display(),
        marker = marker.as_str(),
        payload = %request.payload,
        mode = request.mode.as_str(),
        "generating readme"
    );

    let lines = extract_from_path(&request.source, &marker, request.payload).map_err(|source| {
        GenError::Source {
            path: request.source.clone(),
            source,
        }
    })?;

    if lines.is_empty() {
        warn!(
            source = %request.source.display(),
            marker = marker.as_str(),
            "no doc lines found; output will contain only the header"
        );
    }

    for line in &lines {
        trace!(line = line.line, payload = %line.payload, "doc line");
    }

    let document = render_document(&request.header, &lines);
    let extracted = lines.len();
    let source_lines: Vec<usize> = lines.iter().map(|line| line.line).collect();

    if request.mode == Mode::Stdout {
        return Ok(GenerateOutcome {
            document,
            extracted,
            source_lines,
            changed: false,
            diff: None,
            exit_code: ExitCode::Success,
        });
    }

    let existing = match read_existing(&request.output) {
        Ok(existing) => existing,
        Err(err) if request.mode == Mode::Write => {
            debug!(error = %err, "existing output unreadable; replacing it");
            None
        }
        Err(source) => {
            return Err(GenError::Output {
                path: request.output.clone(),
                source,
            })
        }
    };

    let changed = existing.as_deref() != Some(document.as_bytes());
    let diff = if changed {
        let original = existing
            .as_deref()
            .map(String::from_utf8_lossy)
            .unwrap_or_default();
        build_unified_diff(&original, &document, &display_name(&request.output))
    } else {
        None
    };

    let exit_code = match request.mode {
        Mode::Check if changed => ExitCode::OutOfDate,
        _ => ExitCode::Success,
    };

    if request.mode == Mode::Write {
        write_atomic(&request.output, &document, request.backup).map_err(|source| {
            GenError::Output {
                path: request.output.clone(),
                source,
            }
        })?;
        info!(
            output = %request.output.display(),
            lines = extracted,
            changed,
            "wrote readme"
        );
    }

    Ok(GenerateOutcome {
        document,
        extracted,
        source_lines,
        changed,
        diff,
        exit_code,
    })
}

fn validate_header(header: &str) -> GenResult<()> {
    if header.is_empty() {
        return Err(GenError::InvalidArguments(
            "header must not be empty".to_string(),
        ));
    }
    if header.contains(['\n', '\r']) {
        return Err(GenError::InvalidArguments(
            "header must be a single line".to_string(),
        ));
    }
    Ok(())
}

fn read_existing(path: &Path) -> io::Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
