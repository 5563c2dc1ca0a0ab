//! Route tree discovery and file classification

use crate::error::{Error, Result};
use crate::path::{has_marker, is_module_file, normalize_path};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

// ============================================================================
// Walking
// ============================================================================

/// Lists every `.ts` / `.js` file below `root`, most specific first
///
/// Symlinks are followed. The result is ordered by descending segment
/// depth, then descending path length, then lexicographically, so a
/// declaration deeper in the tree is always registered before a shallower
/// one. Paths use `/` separators and appear once.
///
/// # Errors
///
/// `Error::Discovery` for unreadable entries and symlink loops.
pub fn read_paths_recursively(root: &Path) -> Result<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    let mut paths = Vec::new();

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(|err| Error::Discovery {
            path: err
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| root.to_path_buf()),
            message: err.to_string(),
        })?;

        if !entry.file_type().is_file() || !is_module_file(entry.path()) {
            continue;
        }

        let normalized = normalize_path(&entry.path().to_string_lossy()).into_owned();
        if seen.insert(normalized.clone()) {
            paths.push(normalized);
        }
    }

    paths.sort_by(|a, b| {
        depth(b)
            .cmp(&depth(a))
            .then_with(|| b.len().cmp(&a.len()))
            .then_with(|| a.cmp(b))
    });

    Ok(paths.into_iter().map(PathBuf::from).collect())
}

fn depth(path: &str) -> usize {
    path.split('/').filter(|segment| !segment.is_empty()).count()
}

// ============================================================================
// Classification
// ============================================================================

/// Role of a discovered file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// `*_config.ts`: discovered, never acted on
    Config,
    /// `*_middleware.ts`: scoped to its directory and below
    Middleware,
    /// `*_notFound.ts` / `*_not-found.ts`: scoped to its directory and below
    NotFound,
    Route,
}

impl FileKind {
    /// Classifies a file by its name
    ///
    /// ```
    /// use fsrouter::discover::FileKind;
    /// use std::path::Path;
    ///
    /// assert_eq!(FileKind::of(Path::new("src/_middleware.ts")), FileKind::Middleware);
    /// assert_eq!(FileKind::of(Path::new("src/a/_not-found.js")), FileKind::NotFound);
    /// assert_eq!(FileKind::of(Path::new("src/a/[id].ts")), FileKind::Route);
    /// ```
    pub fn of(path: &Path) -> Self {
        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default();

        if has_marker(stem, "_config") {
            FileKind::Config
        } else if has_marker(stem, "_middleware") {
            FileKind::Middleware
        } else if has_marker(stem, "_notFound") || has_marker(stem, "_not-found") {
            FileKind::NotFound
        } else {
            FileKind::Route
        }
    }
}

/// Discovered files split by role, each bucket in walker order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedFiles {
    pub config: Vec<PathBuf>,
    pub middleware: Vec<PathBuf>,
    pub not_found: Vec<PathBuf>,
    pub routes: Vec<PathBuf>,
}

impl ClassifiedFiles {
    pub fn is_empty(&self) -> bool {
        self.config.is_empty()
            && self.middleware.is_empty()
            && self.not_found.is_empty()
            && self.routes.is_empty()
    }
}

/// Splits walker output into config, middleware, notFound and route buckets
pub fn classify(paths: &[PathBuf]) -> ClassifiedFiles {
    paths.iter().fold(ClassifiedFiles::default(), |mut files, path| {
        let kind = FileKind::of(path);
        debug!(path = %path.display(), ?kind, "Classified file");

        let bucket = match kind {
            FileKind::Config => &mut files.config,
            FileKind::Middleware => &mut files.middleware,
            FileKind::NotFound => &mut files.not_found,
            FileKind::Route => &mut files.routes,
        };
        bucket.push(path.clone());
        files
    })
}
