//! Flag defaults for the markdown-convert front end.
//!
//! Defaults are resolved from TOML files using this precedence:
//! override flag → working directory → git root.
//! The command line is layered on top by the CLI; anything still unset
//! falls back to the built-in defaults of the converter.

use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = ".markdown-convert.toml";

/// One layer of flag values. Unset fields defer to lower layers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FlagLayer {
    pub page: Option<bool>,
    pub toc: Option<bool>,
    pub toc_only: Option<bool>,
    pub xhtml: Option<bool>,
    pub latex: Option<bool>,
    pub smartypants: Option<bool>,
    pub latex_dashes: Option<bool>,
    pub fractions: Option<bool>,
    pub css: Option<String>,
    pub template: Option<PathBuf>,
    pub cpu_profile: Option<PathBuf>,
    pub repeat: Option<usize>,
}

impl FlagLayer {
    /// Fill every unset field of `self` from `lower`.
    pub fn or(self, lower: FlagLayer) -> FlagLayer {
        FlagLayer {
            page: self.page.or(lower.page),
            toc: self.toc.or(lower.toc),
            toc_only: self.toc_only.or(lower.toc_only),
            xhtml: self.xhtml.or(lower.xhtml),
            latex: self.latex.or(lower.latex),
            smartypants: self.smartypants.or(lower.smartypants),
            latex_dashes: self.latex_dashes.or(lower.latex_dashes),
            fractions: self.fractions.or(lower.fractions),
            css: self.css.or(lower.css),
            template: self.template.or(lower.template),
            cpu_profile: self.cpu_profile.or(lower.cpu_profile),
            repeat: self.repeat.or(lower.repeat),
        }
    }
}

/// Flag defaults plus the files they were read from.
#[derive(Clone, Debug, Default)]
pub struct Config {
    pub flags: FlagLayer,
    pub sources: Vec<ConfigSource>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigSource {
    pub kind: ConfigSourceKind,
    pub path: PathBuf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigSourceKind {
    GitRoot,
    Local,
    Override,
}

impl fmt::Display for ConfigSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConfigSourceKind::GitRoot => "git root config",
            ConfigSourceKind::Local => "working directory config",
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

/// Errors surfaced while loading flag defaults.
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
    #[error("invalid config {path}: {message}")]
    Validation { path: PathBuf, message: String },
}

impl Config {
    /// Loads every config file that applies, highest precedence winning.
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

        let local_path = working_dir.join(CONFIG_FILE_NAME);
        let git_path = find_git_root(&working_dir).map(|root| root.join(CONFIG_FILE_NAME));

        // Lowest precedence first; each later layer overrides the previous ones.
        let mut candidates = Vec::new();
        if let Some(path) = git_path {
            if path.exists() && path != local_path && Some(&path) != override_path.as_ref() {
                candidates.push(ConfigSource {
                    kind: ConfigSourceKind::GitRoot,
                    path,
                });
            }
        }
        if local_path.exists() && Some(&local_path) != override_path.as_ref() {
            candidates.push(ConfigSource {
                kind: ConfigSourceKind::Local,
                path: local_path,
            });
        }
        if let Some(path) = override_path {
            candidates.push(ConfigSource {
                kind: ConfigSourceKind::Override,
                path,
            });
        }

        let mut flags = FlagLayer::default();
        for source in &candidates {
            flags = load_layer(&source.path)?.or(flags);
        }

        Ok(Config {
            flags,
            sources: candidates,
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

fn load_layer(path: &Path) -> Result<FlagLayer, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.into(),
        source,
    })?;
    let raw: RawConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.into(),
        source,
    })?;
    let base_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    raw.into_layer(&base_dir)
        .map_err(|message| ConfigError::Validation {
            path: path.into(),
            message,
        })
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    output: Option<RawOutput>,
    #[serde(default)]
    smartypants: Option<RawSmartypants>,
    #[serde(default)]
    bench: Option<RawBench>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOutput {
    #[serde(default)]
    latex: Option<bool>,
    #[serde(default)]
    page: Option<bool>,
    #[serde(default)]
    toc: Option<bool>,
    #[serde(default)]
    toconly: Option<bool>,
    #[serde(default)]
    xhtml: Option<bool>,
    #[serde(default)]
    css: Option<String>,
    #[serde(default)]
    template: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSmartypants {
    #[serde(default)]
    enabled: Option<bool>,
    #[serde(default)]
    latexdashes: Option<bool>,
    #[serde(default)]
    fractions: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawBench {
    #[serde(default)]
    repeat: Option<usize>,
    #[serde(default)]
    cpuprofile: Option<PathBuf>,
}

impl RawConfig {
    /// Paths in a config file are relative to the file's directory.
    fn into_layer(self, base_dir: &Path) -> Result<FlagLayer, String> {
        let output = self.output.unwrap_or_default();
        let smartypants = self.smartypants.unwrap_or_default();
        let bench = self.bench.unwrap_or_default();

        if bench.repeat == Some(0) {
            return Err("bench.repeat must be at least 1".to_string());
        }

        Ok(FlagLayer {
            page: output.page,
            toc: output.toc,
            toc_only: output.toconly,
            xhtml: output.xhtml,
            latex: output.latex,
            smartypants: smartypants.enabled,
            latex_dashes: smartypants.latexdashes,
            fractions: smartypants.fractions,
            css: output.css,
            template: output.template.map(|path| make_absolute(&path, base_dir)),
            cpu_profile: bench.cpuprofile.map(|path| make_absolute(&path, base_dir)),
            repeat: bench.repeat,
        })
    }
}
