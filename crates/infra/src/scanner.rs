//! Template scanner for feature audits.
//!
//! Walks a directory tree, lexes every template file with the same directive
//! grammar the renderer uses, and reports each referenced feature name with
//! its file and line. Comparing the report against the registry shows
//! templates that gate on features nobody has added.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};

use featuregate_core::template::scan_references;
use featuregate_domain::{Feature, FeatureGateError, Result};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::errors::InfraError;

/// File suffixes scanned when none are configured.
pub const DEFAULT_TEMPLATE_EXTENSIONS: [&str; 2] = ["blade.php", "html"];

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("`{0}` is not a directory")]
    NotADirectory(PathBuf),

    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl From<ScanError> for InfraError {
    fn from(value: ScanError) -> Self {
        let err = match &value {
            ScanError::NotADirectory(_) => FeatureGateError::Validation(value.to_string()),
            ScanError::Walk { .. } | ScanError::Read { .. } => {
                FeatureGateError::Storage(value.to_string())
            }
        };
        InfraError(err)
    }
}

/// Where a feature name appears.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub path: PathBuf,
    pub line: usize,
    /// Second directive argument as written (`user`, `$user`), `None` when
    /// the directive names only a feature.
    pub binding: Option<String>,
}

/// Result of a directory scan, keyed by feature name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    files_scanned: usize,
    references: BTreeMap<String, Vec<Occurrence>>,
}

impl ScanReport {
    pub fn files_scanned(&self) -> usize {
        self.files_scanned
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    /// Referenced feature names in sorted order.
    pub fn feature_names(&self) -> impl Iterator<Item = &str> {
        self.references.keys().map(String::as_str)
    }

    pub fn occurrences(&self, feature: &str) -> &[Occurrence] {
        self.references.get(feature).map_or(&[], Vec::as_slice)
    }

    /// Referenced names missing from `registered`.
    pub fn unregistered(&self, registered: &[Feature]) -> Vec<&str> {
        let known: BTreeSet<&str> = registered.iter().map(Feature::name).collect();
        self.feature_names().filter(|name| !known.contains(name)).collect()
    }

    fn record(&mut self, feature: String, occurrence: Occurrence) {
        self.references.entry(feature).or_default().push(occurrence);
    }
}

/// Scans template files below a directory.
#[derive(Debug, Clone)]
pub struct TemplateScanner {
    extensions: Vec<String>,
}

impl Default for TemplateScanner {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE_EXTENSIONS)
    }
}

impl TemplateScanner {
    /// Scanner for files ending in `.<ext>` for any of `extensions`.
    ///
    /// Leading dots are ignored, so `".html"` and `"html"` are equivalent.
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        Self { extensions }
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Whether `path` names a template file this scanner reads.
    pub fn matches(&self, path: &Path) -> bool {
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        let file_name = file_name.to_ascii_lowercase();
        self.extensions.iter().any(|ext| {
            file_name
                .strip_suffix(ext.as_str())
                .and_then(|stem| stem.strip_suffix('.'))
                .is_some_and(|base| !base.is_empty())
        })
    }

    /// Scan every matching file below `dir`.
    ///
    /// Files that are not valid UTF-8 are skipped with a warning.
    ///
    /// # Errors
    /// `Validation` when `dir` is not a directory, `Storage` when the walk or
    /// a read fails.
    pub fn scan(&self, dir: &Path) -> Result<ScanReport> {
        if !dir.is_dir() {
            return Err(InfraError::from(ScanError::NotADirectory(dir.to_path_buf())).into());
        }

        let mut report = ScanReport::default();

        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(|source| {
                InfraError::from(ScanError::Walk { path: dir.to_path_buf(), source })
            })?;
            if !entry.file_type().is_file() || !self.matches(entry.path()) {
                continue;
            }

            let path = entry.path();
            let source = match std::fs::read_to_string(path) {
                Ok(source) => source,
                Err(err) if err.kind() == io::ErrorKind::InvalidData => {
                    warn!(path = %path.display(), "skipping non UTF-8 template");
                    continue;
                }
                Err(source) => {
                    return Err(InfraError::from(ScanError::Read {
                        path: path.to_path_buf(),
                        source,
                    })
                    .into());
                }
            };

            report.files_scanned += 1;
            for reference in scan_references(&source) {
                report.record(
                    reference.feature,
                    Occurrence {
                        path: path.to_path_buf(),
                        line: reference.line,
                        binding: reference.binding,
                    },
                );
            }
        }

        debug!(
            dir = %dir.display(),
            files = report.files_scanned,
            features = report.references.len(),
            "template scan finished"
        );
        Ok(report)
    }
}

/// Scan `dir` for feature references in files with the given extensions.
///
/// An empty extension list falls back to [`DEFAULT_TEMPLATE_EXTENSIONS`].
pub fn scan_directory<S: AsRef<str>>(dir: &Path, extensions: &[S]) -> Result<ScanReport> {
    let scanner = if extensions.is_empty() {
        TemplateScanner::default()
    } else {
        TemplateScanner::new(extensions)
    };
    scanner.scan(dir)
}
