//! Hand-off of the generated sources to a bundler
//!
//! Bundling and minification are not done here. [`EsbuildBundler`] shells
//! out to the `esbuild` executable; [`UnbundledWriter`] writes the sources
//! as one plain module.

use crate::emit::Defines;
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;
use uuid::Uuid;

/// Everything a bundler needs to produce the worker
#[derive(Debug, Clone)]
pub struct BundleJob {
    /// Worker entry template
    pub entry_source: String,
    /// `export const __ROUTES__ = [...]`, injected into the entry
    pub routes_source: String,
    pub defines: Defines,
    pub outfile: PathBuf,
    pub minify: bool,
    /// Directory module resolution starts from (the project root)
    pub work_dir: PathBuf,
}

pub trait Bundler {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// # Errors
    ///
    /// `Error::Bundle` when the bundler rejects the input, `Error::Io` for
    /// file-system failures.
    fn bundle(&self, job: &BundleJob) -> Result<()>;
}

// ============================================================================
// esbuild
// ============================================================================

/// Runs `esbuild` with the routes module injected into the entry
#[derive(Debug, Clone)]
pub struct EsbuildBundler {
    executable: PathBuf,
}

impl Default for EsbuildBundler {
    fn default() -> Self {
        Self::new()
    }
}

impl EsbuildBundler {
    pub fn new() -> Self {
        Self {
            executable: PathBuf::from("esbuild"),
        }
    }

    pub fn with_executable(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    /// Command line for a job whose sources live in `scratch`
    fn command(&self, job: &BundleJob, scratch: &Path) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.current_dir(&job.work_dir)
            .arg(scratch.join("entry.js"))
            .arg("--bundle")
            .arg(format!("--inject:{}", scratch.join("routes.js").display()))
            .arg("--target=es2022")
            .arg("--platform=neutral")
            .arg(format!("--outfile={}", job.outfile.display()));

        for (name, value) in job.defines.pairs() {
            cmd.arg(format!("--define:{}={}", name, value));
        }

        if job.minify {
            cmd.arg("--minify");
        }

        cmd
    }
}

/// Scratch directory removed on drop
struct Scratch(PathBuf);

impl Drop for Scratch {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

impl Bundler for EsbuildBundler {
    fn name(&self) -> &'static str {
        "esbuild"
    }

    fn bundle(&self, job: &BundleJob) -> Result<()> {
        // Inside the project so bare imports resolve against its node_modules
        let scratch = Scratch(job.work_dir.join(format!(".fsrouter-{}", Uuid::new_v4())));
        fs::create_dir_all(&scratch.0)?;
        fs::write(scratch.0.join("entry.js"), &job.entry_source)?;
        fs::write(scratch.0.join("routes.js"), &job.routes_source)?;

        let mut cmd = self.command(job, &scratch.0);
        debug!(command = ?cmd, "Running bundler");

        let output = cmd.output().map_err(|err| {
            Error::Bundle(format!(
                "failed to run {}: {}. Is esbuild installed?",
                self.executable.display(),
                err
            ))
        })?;

        if !output.status.success() {
            return Err(Error::Bundle(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Plain output
// ============================================================================

/// Writes defines, routes and entry into a single unbundled module
#[derive(Debug, Clone, Copy, Default)]
pub struct UnbundledWriter;

impl UnbundledWriter {
    /// The module text written to `job.outfile`
    ///
    /// ```
    /// use fsrouter::bundle::{BundleJob, UnbundledWriter};
    /// use fsrouter::emit::Defines;
    ///
    /// let job = BundleJob {
    ///     entry_source: "export default {};\n".into(),
    ///     routes_source: "export const __ROUTES__ = [];".into(),
    ///     defines: Defines { base_path: "/api".into(), assets: None },
    ///     outfile: "dist/index.js".into(),
    ///     minify: false,
    ///     work_dir: ".".into(),
    /// };
    /// assert_eq!(
    ///     UnbundledWriter.render(&job),
    ///     "const __BASE__ = \"/api\";\nconst __ROUTES__ = [];\n\nexport default {};\n"
    /// );
    /// ```
    pub fn render(&self, job: &BundleJob) -> String {
        let mut out = String::new();
        for (name, value) in job.defines.pairs() {
            out.push_str(&format!("const {} = {};\n", name, value));
        }

        let routes = job
            .routes_source
            .strip_prefix("export ")
            .unwrap_or(&job.routes_source);
        out.push_str(routes);
        out.push_str("\n\n");
        out.push_str(&job.entry_source);
        out
    }
}

impl Bundler for UnbundledWriter {
    fn name(&self) -> &'static str {
        "none"
    }

    fn bundle(&self, job: &BundleJob) -> Result<()> {
        if let Some(parent) = job.outfile.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&job.outfile, self.render(job))?;
        Ok(())
    }
}
