//! Path utilities: separator normalization, squashing, route-path derivation
//!
//! All functions are **pure**: given same input, always produce same output with no side effects.

use std::borrow::Cow;
use std::path::Path;

/// File extensions recognized as route modules
pub const MODULE_EXTENSIONS: [&str; 2] = ["ts", "js"];

/// File-stem suffixes that mark a directory-scoped declaration instead of a route
pub const SPECIAL_MARKERS: [&str; 3] = ["_middleware", "_notFound", "_not-found"];

/// Whether a file stem (`_middleware`, `auth_middleware`, ...) ends with `marker`
pub fn has_marker(stem: &str, marker: &str) -> bool {
    stem.ends_with(marker)
}

/// Checks if a path is already in normalized form
///
/// # Rules
///
/// - Must not contain `\`
/// - Must not contain `//`
///
/// # Examples
///
/// ```
/// use fsrouter::path::is_normalized;
///
/// assert!(is_normalized("/a/b.ts"));
/// assert!(is_normalized("a/b"));
/// assert!(!is_normalized("/a//b.ts"));
/// assert!(!is_normalized("C:\\a\\b.ts"));
/// ```
pub fn is_normalized(path: &str) -> bool {
    !path.contains('\\') && !path.contains("//")
}

/// Normalize a file-system path to forward slashes
///
/// Returns `Cow::Borrowed` when the input is already normalized.
///
/// - Backslashes: `C:\a\b.ts` → `C:/a/b.ts`
/// - Slash runs: `/a//b` → `/a/b`
///
/// Leading and trailing slashes are kept; this is not a URL normalizer.
///
/// # Examples
///
/// ```
/// use fsrouter::path::normalize_path;
/// use std::borrow::Cow;
///
/// assert!(matches!(normalize_path("/a/b.ts"), Cow::Borrowed("/a/b.ts")));
/// assert_eq!(normalize_path("C:\\\\a\\\\b.ts"), "C:/a/b.ts");
/// assert_eq!(normalize_path("/a//b/"), "/a/b/");
/// ```
pub fn normalize_path(path: &str) -> Cow<'_, str> {
    if is_normalized(path) {
        return Cow::Borrowed(path);
    }

    Cow::Owned(collapse_slashes(&path.replace('\\', "/")))
}

fn collapse_slashes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for c in path.chars() {
        if c == '/' && out.ends_with('/') {
            continue;
        }
        out.push(c);
    }
    out
}

/// Whether `path` names a route module (`.ts` or `.js`)
pub fn is_module_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| MODULE_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

fn strip_module_extension(path: &str) -> Option<&str> {
    MODULE_EXTENSIONS.iter().find_map(|ext| {
        path.strip_suffix(ext)
            .and_then(|rest| rest.strip_suffix('.'))
    })
}

/// Squashes a module path into its route form
///
/// - Collapses repeated slashes
/// - Strips the `.ts` / `.js` extension
/// - A `*_middleware`, `*_notFound` or `*_not-found` module maps to its directory
/// - An `index` module maps to its directory
///
/// Only the module's own file segment is squashed, so a directory named
/// `index` keeps its segment and squashing is idempotent.
///
/// # Examples
///
/// ```
/// use fsrouter::path::squash_path;
///
/// assert_eq!(squash_path("a//b/index.ts"), "a/b");
/// assert_eq!(squash_path("a/b/index.js"), "a/b");
/// assert_eq!(squash_path("/nested/_middleware.ts"), "/nested");
/// assert_eq!(squash_path("/index/index.ts"), "/index");
/// assert_eq!(squash_path("/users/[id].ts"), "/users/[id]");
/// ```
pub fn squash_path(path: &str) -> String {
    let collapsed = collapse_slashes(path);

    let Some(mut stem_path) = strip_module_extension(&collapsed) else {
        return collapsed;
    };
    while let Some(shorter) = strip_module_extension(stem_path) {
        stem_path = shorter;
    }

    let (dir, stem) = stem_path.rsplit_once('/').unwrap_or(("", stem_path));
    let is_special = SPECIAL_MARKERS.iter().any(|marker| has_marker(stem, marker));
    if is_special || stem == "index" {
        dir.to_string()
    } else {
        stem_path.to_string()
    }
}

/// Derives the route path of a module from its position under `root_dir`
///
/// `base_path` is prepended as-is (it is expected to be empty or to start
/// with `/`). The root of the tree maps to `/`.
///
/// # Examples
///
/// ```
/// use fsrouter::path::route_path;
/// use std::path::Path;
///
/// assert_eq!(route_path(Path::new("/app/src/get.ts"), Path::new("/app/src"), ""), "/get");
/// assert_eq!(route_path(Path::new("/app/src/index.ts"), Path::new("/app/src"), ""), "/");
/// assert_eq!(
///     route_path(Path::new("/app/src/nested/_notFound.ts"), Path::new("/app/src"), "/api"),
///     "/api/nested"
/// );
/// ```
pub fn route_path(file: &Path, root_dir: &Path, base_path: &str) -> String {
    let relative = file.strip_prefix(root_dir).unwrap_or(file);
    let joined = format!("{}/{}", base_path, relative.to_string_lossy());
    let squashed = squash_path(&normalize_path(&joined));

    if squashed.is_empty() {
        "/".to_string()
    } else {
        squashed
    }
}
