//! Configuration loader for readme-gen.
//!
//! Settings resolve through the precedence stack
//! override flag → working directory → git root → built-in defaults.
//! Relative paths are anchored to the directory of the file that declared
//! them; defaults are anchored to the working directory.

use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use readme_extract::{PayloadMode, DEFAULT_HEADER, DEFAULT_MARKER};
use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = ".readme-gen.toml";

const DEFAULT_SOURCE: &str = "src/lib.rs";
const DEFAULT_OUTPUT: &str = "README.md";

/// Complete configuration resolved from defaults and on-disk overrides.
#[derive(Clone, Debug)]
pub struct Config {
    pub readme: ReadmeSettings,
    pub sources: ConfigSources,
}

/// Settings that drive a single generation run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadmeSettings {
    pub source: PathBuf,
    pub output: PathBuf,
    pub header: String,
    pub marker: String,
    pub payload: PayloadMode,
    pub backup: bool,
}

/// Provenance information for resolved configuration.
#[derive(Clone, Debug)]
pub struct ConfigSources {
    pub working_directory: PathBuf,
    pub layers: Vec<ConfigSource>,
}

/// Specific layer of configuration (default/git/local/override).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConfigSource {
    pub kind: ConfigSourceKind,
    pub path: Option<PathBuf>,
    pub base_dir: PathBuf,
}

impl ConfigSource {
    fn default(base_dir: PathBuf) -> Self {
        ConfigSource {
            kind: ConfigSourceKind::Default,
            path: None,
            base_dir,
        }
    }

    fn for_file(kind: ConfigSourceKind, path: PathBuf) -> Self {
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        ConfigSource {
            kind,
            path: Some(path),
            base_dir,
        }
    }

    pub fn describe(&self) -> String {
        match (&self.kind, &self.path) {
            (ConfigSourceKind::Default, _) => "built-in defaults".to_owned(),
            (kind, Some(path)) => format!("{} at {}", kind, path.display()),
            (kind, None) => kind.to_string(),
        }
    }
}

/// Kinds of configuration sources, ordered from lowest to highest precedence.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigSourceKind {
    Default,
    GitRoot,
    Local,
    Override,
}

impl fmt::Display for ConfigSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConfigSourceKind::Default => "defaults",
            ConfigSourceKind::GitRoot => "git-root config",
            ConfigSourceKind::Local => "local config",
            ConfigSourceKind::Override => "override config",
        };
        f.write_str(label)
    }
}

/// Loader options, typically supplied by the CLI layer.
#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub override_path: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
}

impl LoadOptions {
    pub fn with_override_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_path = Some(path.into());
        self
    }

    pub fn with_working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(path.into());
        self
    }
}

/// Errors surfaced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to resolve working directory {attempted}: {source}")]
    WorkingDirectory {
        attempted: PathBuf,
        source: io::Error,
    },
    #[error("override config {path} not found")]
    OverrideNotFound { path: PathBuf },
    #[error("failed to read config {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("configuration validation failed:\n{0}")]
    Validation(ConfigValidationErrors),
}

impl Config {
    /// Loads configuration using the precedence rules and returns typed settings.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let working_dir = resolve_working_dir(options.working_dir)?;
        let override_path = options
            .override_path
            .map(|path| make_absolute(&path, &working_dir));

        if let Some(path) = &override_path {
            if !path.exists() {
                return Err(ConfigError::OverrideNotFound { path: path.clone() });
            }
        }

        let default_source = ConfigSource::default(working_dir.clone());
        let mut merged = defaults_layer(default_source.clone());
        let mut source_layers = vec![default_source];

        let git_root = find_git_root(&working_dir);
        let git_config_path = git_root.as_ref().map(|root| root.join(CONFIG_FILE_NAME));
        let local_config_path = working_dir.join(CONFIG_FILE_NAME);

        if let Some(path) = git_config_path.as_ref() {
            if path.exists() && Some(path) != override_path.as_ref() && path != &local_config_path {
                let source = ConfigSource::for_file(ConfigSourceKind::GitRoot, path.clone());
                merged.merge(load_layer(path, source.clone())?);
                source_layers.push(source);
            }
        }

        if local_config_path.exists() && Some(&local_config_path) != override_path.as_ref() {
            let source = ConfigSource::for_file(ConfigSourceKind::Local, local_config_path.clone());
            merged.merge(load_layer(&local_config_path, source.clone())?);
            source_layers.push(source);
        }

        if let Some(path) = override_path {
            let source = ConfigSource::for_file(ConfigSourceKind::Override, path.clone());
            merged.merge(load_layer(&path, source.clone())?);
            source_layers.push(source);
        }

        let readme = merged.finalize().map_err(ConfigError::Validation)?;
        Ok(Config {
            readme,
            sources: ConfigSources {
                working_directory: working_dir,
                layers: source_layers,
            },
        })
    }
}

fn resolve_working_dir(override_dir: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    match override_dir {
        Some(path) => fs::canonicalize(&path).map_err(|source| ConfigError::WorkingDirectory {
            attempted: path,
            source,
        }),
        None => env::current_dir().map_err(|source| ConfigError::WorkingDirectory {
            attempted: PathBuf::from("."),
            source,
        }),
    }
}

fn make_absolute(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn find_git_root(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        if dir.join(".git").exists() {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    None
}

fn load_layer(path: &Path, source: ConfigSource) -> Result<PartialSettings, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.into(),
        source,
    })?;
    let raw: RawConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.into(),
        source,
    })?;
    Ok(raw.into_partial(source))
}

fn defaults_layer(source: ConfigSource) -> PartialSettings {
    PartialSettings {
        source: Some(Located::new(PathBuf::from(DEFAULT_SOURCE), source.clone())),
        output: Some(Located::new(PathBuf::from(DEFAULT_OUTPUT), source.clone())),
        header: Some(Located::new(DEFAULT_HEADER.to_string(), source.clone())),
        marker: Some(Located::new(DEFAULT_MARKER.to_string(), source.clone())),
        payload: Some(Located::new(PayloadMode::default().to_string(), source.clone())),
        backup: Some(Located::new(false, source)),
    }
}

#[derive(Clone, Debug)]
struct Located<T> {
    value: T,
    source: ConfigSource,
}

impl<T> Located<T> {
    fn new(value: T, source: ConfigSource) -> Self {
        Located { value, source }
    }
}

fn resolve_path(located: &Located<PathBuf>) -> PathBuf {
    let path = &located.value;
    if path.is_absolute() {
        path.clone()
    } else {
        located.source.base_dir.join(path)
    }
}

#[derive(Clone, Debug, Default)]
struct PartialSettings {
    source: Option<Located<PathBuf>>,
    output: Option<Located<PathBuf>>,
    header: Option<Located<String>>,
    marker: Option<Located<String>>,
    payload: Option<Located<String>>,
    backup: Option<Located<bool>>,
}

impl PartialSettings {
    fn merge(&mut self, other: PartialSettings) {
        if other.source.is_some() {
            self.source = other.source;
        }
        if other.output.is_some() {
            self.output = other.output;
        }
        if other.header.is_some() {
            self.header = other.header;
        }
        if other.marker.is_some() {
            self.marker = other.marker;
        }
        if other.payload.is_some() {
            self.payload = other.payload;
        }
        if other.backup.is_some() {
            self.backup = other.backup;
        }
    }

    fn finalize(self) -> Result<ReadmeSettings, ConfigValidationErrors> {
        let fallback = || ConfigSource::default(PathBuf::from("."));
        let mut errors = Vec::new();

        let source = self
            .source
            .unwrap_or_else(|| Located::new(PathBuf::from(DEFAULT_SOURCE), fallback()));
        let output = self
            .output
            .unwrap_or_else(|| Located::new(PathBuf::from(DEFAULT_OUTPUT), fallback()));

        let header = self
            .header
            .unwrap_or_else(|| Located::new(DEFAULT_HEADER.to_string(), fallback()));
        if header.value.is_empty() {
            errors.push(ConfigValidationError::new(
                Some(header.source.clone()),
                "header must not be empty".to_string(),
            ));
        } else if header.value.contains(['\n', '\r']) {
            errors.push(ConfigValidationError::new(
                Some(header.source.clone()),
                "header must be a single line".to_string(),
            ));
        }

        let marker = self
            .marker
            .unwrap_or_else(|| Located::new(DEFAULT_MARKER.to_string(), fallback()));
        if marker.value.is_empty() {
            errors.push(ConfigValidationError::new(
                Some(marker.source.clone()),
                "marker must not be empty".to_string(),
            ));
        }

        let payload_loc = self
            .payload
            .unwrap_or_else(|| Located::new(PayloadMode::default().to_string(), fallback()));
        let payload = match payload_loc.value.parse::<PayloadMode>() {
            Ok(mode) => mode,
            Err(err) => {
                errors.push(ConfigValidationError::new(
                    Some(payload_loc.source.clone()),
                    err.to_string(),
                ));
                PayloadMode::default()
            }
        };

        let backup = self.backup.map(|located| located.value).unwrap_or(false);

        if !errors.is_empty() {
            return Err(ConfigValidationErrors(errors));
        }

        Ok(ReadmeSettings {
            source: resolve_path(&source),
            output: resolve_path(&output),
            header: header.value,
            marker: marker.value,
            payload,
            backup,
        })
    }
}

#[derive(Debug)]
pub struct ConfigValidationErrors(pub Vec<ConfigValidationError>);

impl fmt::Display for ConfigValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, err) in self.0.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "- {err}")?;
        }
        Ok(())
    }
}

impl ConfigValidationErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ConfigValidationError> {
        self.0.iter()
    }
}

#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub source: Option<ConfigSource>,
    pub message: String,
}

impl ConfigValidationError {
    fn new(source: Option<ConfigSource>, message: String) -> Self {
        ConfigValidationError { source, message }
    }
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(source) = &self.source {
            write!(f, " ({})", source.describe())?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    source: Option<PathBuf>,
    #[serde(default)]
    output: Option<PathBuf>,
    #[serde(default)]
    header: Option<String>,
    #[serde(default)]
    marker: Option<String>,
    #[serde(default)]
    payload: Option<String>,
    #[serde(default)]
    backup: Option<bool>,
}

impl RawConfig {
    fn into_partial(self, source: ConfigSource) -> PartialSettings {
        PartialSettings {
            source: self.source.map(|v| Located::new(v, source.clone())),
            output: self.output.map(|v| Located::new(v, source.clone())),
            header: self.header.map(|v| Located::new(v, source.clone())),
            marker: self.marker.map(|v| Located::new(v, source.clone())),
            payload: self.payload.map(|v| Located::new(v, source.clone())),
            backup: self.backup.map(|v| Located::new(v, source)),
        }
    }
}
