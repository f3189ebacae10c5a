//! Organizer configuration.
//!
//! Settings are loaded once at startup from a TOML file (or built-in
//! defaults) and compiled into an immutable [`OrganizerConfig`] that is passed
//! by reference to the organizer and the watch loop. The file covers:
//! - the ordered category table (folder name and extensions)
//! - the destination collision policy and journal size
//! - file filtering rules (hidden files, exact names, extensions, globs, regex)
//!
//! # Configuration File Format
//!
//! ```toml
//! [organizer]
//! on_collision = "rename"   # rename | skip | overwrite
//! history_limit = 50        # 0 disables the move journal
//!
//! [[categories]]
//! name = "Videos"
//! extensions = [".mp4", ".avi", ".mov", ".mkv"]
//!
//! [filters]
//! enable_hidden_files = true
//!
//! [filters.exclude]
//! filenames = ["Thumbs.db"]
//! patterns = ["*.crdownload"]
//! extensions = ["part"]
//! regex = []
//!
//! [filters.include]
//! patterns = []
//! ```

use crate::file_category::{CategoryError, CategoryRule, CategoryTable, extension_of};
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Name of the per-directory configuration file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = ".tidywatch.toml";

/// Errors that can occur during configuration loading and compilation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    #[error("Invalid configuration in {}: {reason}", .path.display())]
    ConfigInvalid { path: PathBuf, reason: String },
    /// Invalid glob pattern provided.
    #[error("Invalid glob pattern '{0}': expected *.ext or dir/**")]
    InvalidGlobPattern(String),
    /// Invalid regex pattern provided with the actual error reason.
    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },
    /// The category table is unusable.
    #[error("Invalid category table: {0}")]
    Categories(#[from] CategoryError),
    /// IO error while reading configuration.
    #[error("IO error reading configuration {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What to do when a file with the same name already sits in the category folder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Move under the first free name of the form `stem (N).ext`.
    #[default]
    Rename,
    /// Leave the incoming file at the top level.
    Skip,
    /// Replace the existing file.
    Overwrite,
}

/// Raw settings as they appear in the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub organizer: OrganizerSettings,

    /// Ordered category table. `None` keeps the built-in table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<CategorySettings>>,

    #[serde(default)]
    pub filters: FilterRules,
}

/// The `[organizer]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizerSettings {
    #[serde(default)]
    pub on_collision: CollisionPolicy,

    /// Number of passes kept in the move journal.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

impl Default for OrganizerSettings {
    fn default() -> Self {
        Self {
            on_collision: CollisionPolicy::default(),
            history_limit: default_history_limit(),
        }
    }
}

fn default_history_limit() -> usize {
    50
}

/// One `[[categories]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySettings {
    pub name: String,
    #[serde(default)]
    pub extensions: Vec<String>,
}

/// Root-level filter rules configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRules {
    /// Whether to organize hidden files (starting with "."). Defaults to true.
    #[serde(default = "default_true")]
    pub enable_hidden_files: bool,

    /// Rules for excluding files.
    #[serde(default)]
    pub exclude: ExcludeRules,

    /// Rules for including files (whitelist, overrides exclude rules).
    #[serde(default)]
    pub include: IncludeRules,
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            enable_hidden_files: default_true(),
            exclude: ExcludeRules::default(),
            include: IncludeRules::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Rules for excluding files from organization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact filenames to exclude (e.g., "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns to exclude (e.g., "*.crdownload").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// File extensions to exclude, with or without the dot.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regex patterns matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

/// Rules for including files, overriding exclude rules (whitelist).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncludeRules {
    /// Glob patterns that override exclude rules.
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl Settings {
    /// Load settings from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.tidywatch.toml` in the current directory
    /// 3. Look for `~/.config/tidywatch/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but
    /// cannot be read, or if any discovered file is malformed.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("tidywatch")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Load settings from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let settings = Self::from_toml(&content).map_err(|e| match e {
            ConfigError::ConfigInvalid { reason, .. } => ConfigError::ConfigInvalid {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })?;
        debug!("Loaded configuration from {}", path.display());
        Ok(settings)
    }

    /// Parse settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid {
            path: PathBuf::new(),
            reason: e.to_string(),
        })
    }

    /// Compile settings into the immutable runtime configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the category table is invalid or any regex or glob
    /// pattern does not compile.
    pub fn compile(self) -> Result<OrganizerConfig, ConfigError> {
        let categories = match self.categories {
            Some(entries) => CategoryTable::new(
                entries
                    .into_iter()
                    .map(|entry| CategoryRule::new(entry.name, entry.extensions))
                    .collect(),
            )?,
            None => CategoryTable::default(),
        };

        Ok(OrganizerConfig {
            categories,
            filters: CompiledFilters::new(self.filters)?,
            on_collision: self.organizer.on_collision,
            history_limit: self.organizer.history_limit,
        })
    }
}

/// Immutable runtime configuration shared by the organizer and the watch loop.
#[derive(Debug)]
pub struct OrganizerConfig {
    categories: CategoryTable,
    filters: CompiledFilters,
    on_collision: CollisionPolicy,
    history_limit: usize,
}

impl OrganizerConfig {
    /// Loads and compiles configuration in one step.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        Settings::load(config_path)?.compile()
    }

    pub fn categories(&self) -> &CategoryTable {
        &self.categories
    }

    pub fn filters(&self) -> &CompiledFilters {
        &self.filters
    }

    pub fn on_collision(&self) -> CollisionPolicy {
        self.on_collision
    }

    /// Maximum number of passes kept in the move journal; 0 disables it.
    pub fn history_limit(&self) -> usize {
        self.history_limit
    }

    pub fn with_categories(mut self, categories: CategoryTable) -> Self {
        self.categories = categories;
        self
    }

    pub fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.on_collision = policy;
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }
}

impl Default for OrganizerConfig {
    fn default() -> Self {
        Self {
            categories: CategoryTable::default(),
            filters: CompiledFilters::default(),
            on_collision: CollisionPolicy::default(),
            history_limit: default_history_limit(),
        }
    }
}

/// Compiled filter structures for efficient file matching.
///
/// Glob and regex patterns are parsed once here rather than on every file.
#[derive(Debug)]
pub struct CompiledFilters {
    enable_hidden_files: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

impl CompiledFilters {
    fn new(rules: FilterRules) -> Result<Self, ConfigError> {
        let exclude_patterns = compile_globs(&rules.exclude.patterns)?;
        let include_patterns = compile_globs(&rules.include.patterns)?;

        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            enable_hidden_files: rules.enable_hidden_files,
            exclude_filenames: rules.exclude.filenames.into_iter().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| format!(".{}", ext.trim().trim_start_matches('.').to_lowercase()))
                .collect(),
            exclude_patterns,
            exclude_regexes,
            include_patterns,
        })
    }

    /// Check if a file should be considered for organization.
    ///
    /// Checks are performed in this order, with early termination:
    /// 1. Include patterns (whitelist) - if matched, always include
    /// 2. Hidden file filter - if hidden and disabled, exclude
    /// 3. Exact filename match - if matched, exclude
    /// 4. File extension match - if matched, exclude
    /// 5. Glob pattern match - if matched, exclude
    /// 6. Regex pattern match - if matched, exclude
    /// 7. Default: include
    pub fn should_include(&self, file_path: &Path) -> bool {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self.matches_any(&self.include_patterns, file_path) {
            return true;
        }

        if !self.enable_hidden_files && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        if let Some(ext) = extension_of(&file_name)
            && self.exclude_extensions.contains(&ext)
        {
            return false;
        }

        if self.matches_any(&self.exclude_patterns, file_path) {
            return false;
        }

        !self
            .exclude_regexes
            .iter()
            .any(|regex| regex.is_match(&file_name))
    }

    fn matches_any(&self, patterns: &[Pattern], file_path: &Path) -> bool {
        patterns.iter().any(|pattern| pattern.matches_path(file_path))
    }
}

impl Default for CompiledFilters {
    fn default() -> Self {
        Self {
            enable_hidden_files: default_true(),
            exclude_filenames: HashSet::new(),
            exclude_extensions: HashSet::new(),
            exclude_patterns: Vec::new(),
            exclude_regexes: Vec::new(),
            include_patterns: Vec::new(),
        }
    }
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_category::{Classification, classify};

    fn filters(rules: FilterRules) -> CompiledFilters {
        CompiledFilters::new(rules).unwrap()
    }

    #[test]
    fn test_default_settings_compile() {
        let config = Settings::default().compile().unwrap();
        assert_eq!(config.categories(), &CategoryTable::default());
        assert_eq!(config.on_collision(), CollisionPolicy::Rename);
        assert_eq!(config.history_limit(), 50);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Settings::from_toml("").unwrap().compile().unwrap();
        assert_eq!(config.categories(), &CategoryTable::default());
    }

    #[test]
    fn test_parse_categories_in_declared_order() {
        let settings = Settings::from_toml(
            r#"
[[categories]]
name = "Books"
extensions = ["epub", ".PDF"]

[[categories]]
name = "Docs"
extensions = [".pdf", ".txt"]
"#,
        )
        .unwrap();
        let config = settings.compile().unwrap();

        let names: Vec<_> = config.categories().folder_names().collect();
        assert_eq!(names, vec!["Books", "Docs"]);
        assert!(matches!(
            classify("novel.pdf", config.categories()),
            Classification::Category(rule) if rule.name() == "Books"
        ));
    }

    #[test]
    fn test_empty_category_list_is_rejected() {
        let settings = Settings::from_toml("categories = []").unwrap();
        assert!(matches!(
            settings.compile(),
            Err(ConfigError::Categories(CategoryError::Empty))
        ));
    }

    #[test]
    fn test_parse_organizer_section() {
        let settings = Settings::from_toml(
            r#"
[organizer]
on_collision = "skip"
history_limit = 0
"#,
        )
        .unwrap();
        assert_eq!(settings.organizer.on_collision, CollisionPolicy::Skip);
        assert_eq!(settings.organizer.history_limit, 0);
    }

    #[test]
    fn test_unknown_collision_policy_is_invalid() {
        let result = Settings::from_toml("[organizer]\non_collision = \"merge\"\n");
        assert!(matches!(result, Err(ConfigError::ConfigInvalid { .. })));
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let result = Settings::load(Some(Path::new("/non/existent/tidywatch.toml")));
        assert!(matches!(result, Err(ConfigError::ConfigNotFound(_))));
    }

    #[test]
    fn test_load_reports_file_path_on_parse_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "[organizer\n").unwrap();

        match Settings::load_from_file(&path) {
            Err(ConfigError::ConfigInvalid { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected ConfigInvalid, got {:?}", other),
        }
    }

    #[test]
    fn test_hidden_file_included_by_default() {
        let compiled = filters(FilterRules::default());

        assert!(compiled.should_include(Path::new(".movie.mp4")));
        assert!(compiled.should_include(Path::new("movie.mp4")));
        assert!(CompiledFilters::default().should_include(Path::new(".movie.mp4")));

        let parsed = Settings::from_toml("[filters.exclude]\nfilenames = []").unwrap();
        assert!(parsed.filters.enable_hidden_files);
    }

    #[test]
    fn test_hidden_file_excluded_when_disabled() {
        let compiled = filters(FilterRules {
            enable_hidden_files: false,
            ..Default::default()
        });

        assert!(!compiled.should_include(Path::new(".DS_Store")));
        assert!(!compiled.should_include(Path::new(".movie.mp4")));
        assert!(compiled.should_include(Path::new("movie.mp4")));
    }

    #[test]
    fn test_exclude_exact_filename() {
        let compiled = filters(FilterRules {
            exclude: ExcludeRules {
                filenames: vec!["Thumbs.db".to_string(), "desktop.ini".to_string()],
                ..Default::default()
            },
            ..Default::default()
        });

        assert!(!compiled.should_include(Path::new("Thumbs.db")));
        assert!(compiled.should_include(Path::new("image.jpg")));
    }

    #[test]
    fn test_exclude_extensions_with_or_without_dot() {
        let compiled = filters(FilterRules {
            exclude: ExcludeRules {
                extensions: vec!["part".to_string(), ".CRDOWNLOAD".to_string()],
                ..Default::default()
            },
            ..Default::default()
        });

        assert!(!compiled.should_include(Path::new("movie.mp4.part")));
        assert!(!compiled.should_include(Path::new("report.pdf.crdownload")));
        assert!(!compiled.should_include(Path::new("file.PART")));
        assert!(compiled.should_include(Path::new("file.txt")));
    }

    #[test]
    fn test_exclude_glob_patterns() {
        let compiled = filters(FilterRules {
            exclude: ExcludeRules {
                patterns: vec!["*.tmp".to_string(), "[0-9]*.log".to_string()],
                ..Default::default()
            },
            ..Default::default()
        });

        assert!(!compiled.should_include(Path::new("scratch.tmp")));
        assert!(!compiled.should_include(Path::new("2024.log")));
        assert!(compiled.should_include(Path::new("app.log")));
    }

    #[test]
    fn test_exclude_regex() {
        let compiled = filters(FilterRules {
            exclude: ExcludeRules {
                regex: vec![r"^draft_.*\.txt$".to_string()],
                ..Default::default()
            },
            ..Default::default()
        });

        assert!(!compiled.should_include(Path::new("draft_notes.txt")));
        assert!(compiled.should_include(Path::new("notes.txt")));
    }

    #[test]
    fn test_include_overrides_exclude() {
        let compiled = filters(FilterRules {
            exclude: ExcludeRules {
                extensions: vec!["pdf".to_string()],
                ..Default::default()
            },
            include: IncludeRules {
                patterns: vec!["invoice*.pdf".to_string(), ".keep.txt".to_string()],
            },
            enable_hidden_files: false,
        });

        assert!(compiled.should_include(Path::new("invoice-2024.pdf")));
        assert!(compiled.should_include(Path::new(".keep.txt")));
        assert!(!compiled.should_include(Path::new(".other.txt")));
        assert!(!compiled.should_include(Path::new("manual.pdf")));
    }

    #[test]
    fn test_invalid_regex_returns_error() {
        let result = CompiledFilters::new(FilterRules {
            exclude: ExcludeRules {
                regex: vec!["[invalid(".to_string()],
                ..Default::default()
            },
            ..Default::default()
        });
        assert!(matches!(result, Err(ConfigError::InvalidRegexPattern { .. })));
    }

    #[test]
    fn test_invalid_glob_pattern_returns_error() {
        let result = CompiledFilters::new(FilterRules {
            exclude: ExcludeRules {
                patterns: vec!["[invalid".to_string()],
                ..Default::default()
            },
            ..Default::default()
        });
        assert!(matches!(result, Err(ConfigError::InvalidGlobPattern(_))));
    }
}
