use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default attachment hint for embedded extraction.
pub const DEFAULT_ATTACHMENT_HINT: &str = ".bib";

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub extraction: Option<ExtractionConfig>,
    pub cleanup: Option<CleanupConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Strategy names in run order (`verbatim`, `embedded`).
    pub strategies: Option<Vec<String>>,
    pub attachment_hint: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleanupConfig {
    /// Job names in run order (`eprint`, `doi`).
    pub jobs: Option<Vec<String>>,
}

/// A PDF extraction strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorKind {
    /// BibTeX typed as literal text on the first page.
    Verbatim,
    /// A `.bib` file attached to the PDF container.
    Embedded,
}

impl ExtractorKind {
    pub const ALL: [ExtractorKind; 2] = [ExtractorKind::Verbatim, ExtractorKind::Embedded];

    pub fn name(self) -> &'static str {
        match self {
            ExtractorKind::Verbatim => "verbatim",
            ExtractorKind::Embedded => "embedded",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for ExtractorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A field cleanup job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CleanupJobKind {
    Eprint,
    Doi,
}

impl CleanupJobKind {
    pub const ALL: [CleanupJobKind; 2] = [CleanupJobKind::Eprint, CleanupJobKind::Doi];

    pub fn name(self) -> &'static str {
        match self {
            CleanupJobKind::Eprint => "eprint",
            CleanupJobKind::Doi => "doi",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for CleanupJobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Effective settings after applying defaults to a [`ConfigFile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub strategies: Vec<ExtractorKind>,
    pub attachment_hint: String,
    pub cleanup_jobs: Vec<CleanupJobKind>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            strategies: ExtractorKind::ALL.to_vec(),
            attachment_hint: DEFAULT_ATTACHMENT_HINT.to_string(),
            cleanup_jobs: CleanupJobKind::ALL.to_vec(),
        }
    }
}

impl Settings {
    /// Resolve a config file against the defaults. Unknown names are skipped.
    pub fn from_config(config: &ConfigFile) -> Self {
        let defaults = Settings::default();

        let strategies = match config.extraction.as_ref().and_then(|e| e.strategies.as_ref()) {
            Some(names) => resolve_names(names, "strategy", ExtractorKind::from_name),
            None => defaults.strategies,
        };

        let attachment_hint = config
            .extraction
            .as_ref()
            .and_then(|e| e.attachment_hint.clone())
            .filter(|h| !h.trim().is_empty())
            .unwrap_or(defaults.attachment_hint);

        let cleanup_jobs = match config.cleanup.as_ref().and_then(|c| c.jobs.as_ref()) {
            Some(names) => resolve_names(names, "cleanup job", CleanupJobKind::from_name),
            None => defaults.cleanup_jobs,
        };

        Self {
            strategies,
            attachment_hint,
            cleanup_jobs,
        }
    }
}

fn resolve_names<T: PartialEq>(
    names: &[String],
    what: &str,
    lookup: impl Fn(&str) -> Option<T>,
) -> Vec<T> {
    let mut resolved = Vec::new();
    for name in names {
        match lookup(name) {
            Some(kind) if !resolved.contains(&kind) => resolved.push(kind),
            Some(_) => {}
            None => tracing::warn!(name = %name, "ignoring unknown {what}"),
        }
    }
    resolved
}

/// Platform config directory path: `<config_dir>/bibsalvage/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("bibsalvage").join("config.toml"))
}

/// Load config by cascading CWD `.bibsalvage.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".bibsalvage.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config file");
            None
        }
    }
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        extraction: Some(ExtractionConfig {
            strategies: overlay
                .extraction
                .as_ref()
                .and_then(|e| e.strategies.clone())
                .or_else(|| base.extraction.as_ref().and_then(|e| e.strategies.clone())),
            attachment_hint: overlay
                .extraction
                .as_ref()
                .and_then(|e| e.attachment_hint.clone())
                .or_else(|| {
                    base.extraction
                        .as_ref()
                        .and_then(|e| e.attachment_hint.clone())
                }),
        }),
        cleanup: Some(CleanupConfig {
            jobs: overlay
                .cleanup
                .as_ref()
                .and_then(|c| c.jobs.clone())
                .or_else(|| base.cleanup.as_ref().and_then(|c| c.jobs.clone())),
        }),
    }
}
