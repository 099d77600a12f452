use regex::Regex;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_MARKER: &str = "//!";

#[derive(Debug, Error)]
pub enum MarkerError {
    #[error("marker must not be empty")]
    Empty,

    #[error("marker {marker:?} does not compile: {source}")]
    Regex {
        marker: String,
        source: regex::Error,
    },
}

/// Line prefix that flags a line for extraction.
///
/// The marker only matches at column 0, so `foo //! bar` is never a doc line.
#[derive(Debug, Clone)]
pub struct Marker {
    literal: String,
    pattern: Regex,
}

impl Marker {
    pub fn new(literal: &str) -> Result<Self, MarkerError> {
        if literal.is_empty() {
            return Err(MarkerError::Empty);
        }

        let pattern = Regex::new(&format!("^{}(.*)$", regex::escape(literal))).map_err(
            |source| MarkerError::Regex {
                marker: literal.to_string(),
                source,
            },
        )?;

        Ok(Self {
            literal: literal.to_string(),
            pattern,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.literal
    }

    /// Returns the text after the marker, or `None` when `line` is not a doc line.
    /// `line` must not contain its terminator.
    pub fn payload<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.pattern
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

impl Default for Marker {
    fn default() -> Self {
        Self::new(DEFAULT_MARKER).expect("default marker is a valid literal")
    }
}

/// How a captured payload is turned into an output line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PayloadMode {
    /// Strip leading and trailing whitespace, counting the ASCII
    /// separators `\x1c`..=`\x1f` as whitespace too.
    #[default]
    Trimmed,
    /// Keep the payload exactly as captured.
    Verbatim,
}

impl PayloadMode {
    pub fn apply(self, payload: &str) -> &str {
        match self {
            PayloadMode::Trimmed => payload.trim_matches(is_trimmable),
            PayloadMode::Verbatim => payload,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PayloadMode::Trimmed => "trimmed",
            PayloadMode::Verbatim => "verbatim",
        }
    }
}

impl fmt::Display for PayloadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_trimmable(c: char) -> bool {
    c.is_whitespace() || ('\x1c'..='\x1f').contains(&c)
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown payload mode '{0}' (expected 'trimmed' or 'verbatim')")]
pub struct ParsePayloadModeError(pub String);

impl FromStr for PayloadMode {
    type Err = ParsePayloadModeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "trimmed" => Ok(PayloadMode::Trimmed),
            "verbatim" => Ok(PayloadMode::Verbatim),
            other => Err(ParsePayloadModeError(other.to_string())),
        }
    }
}
