// File: src/config.rs
// Purpose: Run configuration, fsrouter.toml parsing and validation

use crate::error::{Error, Result};
use crate::table::TableSettings;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

static OUTPUT_FILE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.[cm]?[jt]s$").expect("static regex"));

/// Deployment flavour of the generated worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    /// Cloudflare Workers, output `index.js`
    #[default]
    Workers,
    /// Cloudflare Pages, output `_worker.js` plus the public directory
    Pages,
}

impl Target {
    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Workers => "workers",
            Target::Pages => "pages",
        }
    }

    /// File name of the bundle inside the output directory
    pub fn output_file_name(&self) -> &'static str {
        match self {
            Target::Workers => "index.js",
            Target::Pages => "_worker.js",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Target {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "workers" => Ok(Target::Workers),
            "pages" => Ok(Target::Pages),
            other => Err(Error::config(format!(
                "Unknown target `{}` (expected `workers` or `pages`)",
                other
            ))),
        }
    }
}

/// Options of a compilation run, before validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Prefix for every route (e.g. "/api")
    #[serde(default)]
    pub base_path: String,

    /// Directory holding the route files (default: "src")
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,

    /// Output directory, or output file when it ends in `.js`/`.ts` (default: "dist")
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,

    #[serde(default = "default_false")]
    pub skip_minify: bool,

    #[serde(default)]
    pub target: Target,

    #[serde(default = "default_false")]
    pub silent: bool,
}

fn default_root_dir() -> PathBuf {
    PathBuf::from("src")
}

fn default_out_dir() -> PathBuf {
    PathBuf::from("dist")
}

fn default_false() -> bool {
    false
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_path: String::new(),
            root_dir: default_root_dir(),
            out_dir: default_out_dir(),
            skip_minify: false,
            target: Target::default(),
            silent: false,
        }
    }
}

impl Config {
    /// Name of the optional configuration file in the working directory
    pub const FILE_NAME: &'static str = "fsrouter.toml";

    /// Load configuration from a TOML file
    ///
    /// A missing or blank file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        Ok(toml::from_str(&content)?)
    }

    /// Validates the options against the working directory
    ///
    /// # Errors
    ///
    /// `Error::Config` when a directory is outside `cwd` (or is `cwd`
    /// itself), or when the root directory does not exist.
    ///
    /// # Examples
    ///
    /// ```
    /// use fsrouter::Config;
    ///
    /// let cwd = std::env::temp_dir();
    /// let config = Config { root_dir: "../elsewhere".into(), ..Config::default() };
    /// let err = config.resolve(&cwd).unwrap_err();
    /// assert_eq!(err.to_string(), "The root directory should be inside the current working directory");
    /// ```
    pub fn resolve(&self, cwd: &Path) -> Result<ResolvedConfig> {
        let cwd = lexical_absolute(Path::new("/"), cwd);

        let root_dir = lexical_absolute(&cwd, &self.root_dir);
        ensure_inside(&cwd, &root_dir, "root")?;
        if !root_dir.exists() {
            return Err(Error::config("The root directory should exist"));
        }

        let out_dir = lexical_absolute(&cwd, &self.out_dir);
        ensure_inside(&cwd, &out_dir, "output")?;

        Ok(ResolvedConfig {
            base_path: normalize_base_path(&self.base_path),
            root_dir,
            out_dir,
            skip_minify: self.skip_minify,
            target: self.target,
            silent: self.silent,
            cwd,
        })
    }
}

fn ensure_inside(cwd: &Path, dir: &Path, label: &str) -> Result<()> {
    if dir == cwd || !dir.starts_with(cwd) {
        return Err(Error::config(format!(
            "The {} directory should be inside the current working directory",
            label
        )));
    }
    Ok(())
}

/// Joins `path` onto `base` and folds `.` / `..` without touching the disk
fn lexical_absolute(base: &Path, path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in base.join(path).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Leading `/`, no trailing `/`; `""` and `"/"` both mean no base path
///
/// ```
/// use fsrouter::config::normalize_base_path;
///
/// assert_eq!(normalize_base_path("api"), "/api");
/// assert_eq!(normalize_base_path("/api/v1/"), "/api/v1");
/// assert_eq!(normalize_base_path("/"), "");
/// ```
pub fn normalize_base_path(base_path: &str) -> String {
    let trimmed = base_path.trim().trim_end_matches('/');
    if trimmed.is_empty() || trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

/// Validated, immutable configuration passed through the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub base_path: String,
    /// Absolute
    pub root_dir: PathBuf,
    /// Absolute
    pub out_dir: PathBuf,
    pub skip_minify: bool,
    pub target: Target,
    pub silent: bool,
    pub cwd: PathBuf,
}

impl ResolvedConfig {
    pub fn table_settings(&self) -> TableSettings {
        TableSettings {
            root_dir: self.root_dir.clone(),
            base_path: self.base_path.clone(),
        }
    }

    /// Whether `out_dir` names the bundle file itself (`.js`, `.mjs`, `.cts`, ...)
    pub fn out_dir_is_file(&self) -> bool {
        OUTPUT_FILE.is_match(&self.out_dir.to_string_lossy())
    }

    /// Directory the bundle and public files are written to
    pub fn output_dir(&self) -> &Path {
        if self.out_dir_is_file() {
            self.out_dir.parent().unwrap_or(&self.cwd)
        } else {
            &self.out_dir
        }
    }

    pub fn outfile(&self) -> PathBuf {
        if self.out_dir_is_file() {
            self.out_dir.clone()
        } else {
            self.out_dir.join(self.target.output_file_name())
        }
    }

    /// `public` next to the root directory, one level higher when the
    /// output is a single file
    pub fn public_dir(&self) -> PathBuf {
        let mut dir = self.root_dir.clone();
        dir.pop();
        if self.out_dir_is_file() {
            dir.pop();
        }
        dir.join("public")
    }
}
