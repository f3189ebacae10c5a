//! Extension-based file categorization.
//!
//! This module maps a file name to one of an ordered list of category folders
//! (e.g. "Videos", "Images") by looking at its extension. The table is built
//! once from configuration and never mutated afterwards.
//!
//! # Examples
//!
//! ```
//! use tidywatch::file_category::{CategoryTable, Classification, classify};
//!
//! let table = CategoryTable::default();
//! assert!(matches!(classify("clip.MP4", &table), Classification::Category(rule) if rule.name() == "Videos"));
//! assert_eq!(classify("notes.xyz", &table), Classification::Unmatched);
//! assert_eq!(classify("README", &table), Classification::Unmatched);
//! ```

use std::collections::HashSet;
use std::path::{Component, Path};
use thiserror::Error;
use tracing::warn;

/// Errors raised while building a category table.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CategoryError {
    #[error("at least one category must be configured")]
    Empty,
    #[error("category name must not be empty")]
    EmptyName,
    #[error("category name '{0}' must be a single folder name")]
    InvalidName(String),
    #[error("category '{0}' is declared more than once")]
    DuplicateName(String),
    #[error("category '{category}' has an empty extension")]
    EmptyExtension { category: String },
}

/// A category folder and the extensions that belong in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRule {
    name: String,
    extensions: HashSet<String>,
}

impl CategoryRule {
    /// Creates a rule, normalizing every extension to lower case with a leading dot.
    ///
    /// Both `"mp4"` and `".MP4"` are stored as `".mp4"`.
    pub fn new<I, S>(name: impl Into<String>, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            name: name.into(),
            extensions: extensions
                .into_iter()
                .map(|ext| normalize_extension(ext.as_ref()))
                .collect(),
        }
    }

    /// The category name, which is also its folder name under the root.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if `ext` (lower case, leading dot) belongs to this category.
    pub fn contains(&self, ext: &str) -> bool {
        self.extensions.contains(ext)
    }

    /// Iterates over the normalized extensions of this rule.
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }
}

/// Ordered list of category rules. Declaration order is lookup order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTable {
    rules: Vec<CategoryRule>,
}

impl CategoryTable {
    /// Builds a table after validating category names and extensions.
    ///
    /// Overlapping extension sets are accepted; the earlier category wins and
    /// a warning is logged for each shared extension.
    pub fn new(rules: Vec<CategoryRule>) -> Result<Self, CategoryError> {
        if rules.is_empty() {
            return Err(CategoryError::Empty);
        }

        let mut seen_names = HashSet::new();
        for rule in &rules {
            validate_name(&rule.name)?;
            if !seen_names.insert(rule.name.to_lowercase()) {
                return Err(CategoryError::DuplicateName(rule.name.clone()));
            }
            if rule.extensions.iter().any(|ext| ext == ".") {
                return Err(CategoryError::EmptyExtension {
                    category: rule.name.clone(),
                });
            }
        }

        for (index, rule) in rules.iter().enumerate() {
            for earlier in &rules[..index] {
                for ext in rule.extensions.intersection(&earlier.extensions) {
                    warn!(
                        "Extension {} is listed under both {} and {}; {} wins",
                        ext, earlier.name, rule.name, earlier.name
                    );
                }
            }
        }

        Ok(Self { rules })
    }

    /// The rules in declaration order.
    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    /// Iterates over the category folder names in declaration order.
    pub fn folder_names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(CategoryRule::name)
    }

    /// Returns true if `name` is one of the category folder names.
    pub fn is_reserved(&self, name: &str) -> bool {
        self.rules.iter().any(|rule| rule.name == name)
    }

    /// Finds the first category, in declaration order, owning `ext`.
    pub fn lookup(&self, ext: &str) -> Option<&CategoryRule> {
        self.rules.iter().find(|rule| rule.contains(ext))
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self {
            rules: vec![
                CategoryRule::new("Videos", [".mp4", ".avi", ".mov", ".mkv"]),
                CategoryRule::new("Images", [".jpg", ".jpeg", ".png", ".gif", ".bmp"]),
                CategoryRule::new("Audio", [".mp3", ".wav", ".aac", ".flac"]),
                CategoryRule::new("Docs", [".pdf", ".docx", ".doc", ".txt", ".xlsx", ".pptx"]),
            ],
        }
    }
}

/// Outcome of classifying a single file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification<'a> {
    /// The file belongs in this category's folder.
    Category(&'a CategoryRule),
    /// No category claims the file's extension, or it has none.
    Unmatched,
}

/// Classifies a file name against the table.
///
/// Callers are expected to have filtered out directories and category folders.
pub fn classify<'a>(name: &str, table: &'a CategoryTable) -> Classification<'a> {
    extension_of(name)
        .and_then(|ext| table.lookup(&ext))
        .map_or(Classification::Unmatched, Classification::Category)
}

/// Returns the lower-cased extension of `name`, including the leading dot.
///
/// Leading dots of a dotfile do not start an extension, and a trailing dot
/// yields none.
///
/// ```
/// use tidywatch::file_category::extension_of;
///
/// assert_eq!(extension_of("Holiday.Photo.JPG").as_deref(), Some(".jpg"));
/// assert_eq!(extension_of(".bashrc"), None);
/// assert_eq!(extension_of("README"), None);
/// ```
pub fn extension_of(name: &str) -> Option<String> {
    split_extension(name).1.map(str::to_lowercase)
}

/// Splits `name` into its stem and its original-case extension (with the dot).
///
/// ```
/// use tidywatch::file_category::split_extension;
///
/// assert_eq!(split_extension("clip.final.MP4"), ("clip.final", Some(".MP4")));
/// assert_eq!(split_extension(".profile"), (".profile", None));
/// ```
pub fn split_extension(name: &str) -> (&str, Option<&str>) {
    let stem_start = name.len() - name.trim_start_matches('.').len();
    match name[stem_start..].rfind('.') {
        Some(offset) if stem_start + offset + 1 < name.len() => {
            let dot = stem_start + offset;
            (&name[..dot], Some(&name[dot..]))
        }
        _ => (name, None),
    }
}

fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}

fn validate_name(name: &str) -> Result<(), CategoryError> {
    if name.trim().is_empty() {
        return Err(CategoryError::EmptyName);
    }
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None) if part == name => Ok(()),
        _ => Err(CategoryError::InvalidName(name.to_string())),
    }
}
