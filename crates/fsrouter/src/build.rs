//! Compilation pipeline: walk → classify → assemble → emit → bundle

use crate::bundle::{BundleJob, Bundler};
use crate::config::{ResolvedConfig, Target};
use crate::discover::{classify, read_paths_recursively};
use crate::emit::{routes_module, worker_template, AssetManifest, Defines};
use crate::error::{Error, Result};
use crate::inspect::SourceInspector;
use crate::table::{assemble, RouteTable};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Outcome of a successful build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub outfile: PathBuf,
    /// Table entries, the universal fallback included
    pub entries: usize,
    /// Public files copied (pages target)
    pub assets: usize,
}

/// Walks the root directory and assembles the dispatch table
pub fn compile_table(config: &ResolvedConfig, inspector: &dyn SourceInspector) -> Result<RouteTable> {
    let paths = read_paths_recursively(&config.root_dir)?;
    let files = classify(&paths);
    debug!(
        middleware = files.middleware.len(),
        not_found = files.not_found.len(),
        routes = files.routes.len(),
        config = files.config.len(),
        "Discovered files"
    );

    assemble(&files, inspector, config.table_settings())
}

/// Compiles the table and writes the bundled worker
///
/// The output directory is only touched once the table compiled. It is
/// emptied first, unless it names a file, in which case only that file is
/// replaced.
pub fn build(
    config: &ResolvedConfig,
    inspector: &dyn SourceInspector,
    bundler: &dyn Bundler,
) -> Result<BuildReport> {
    let table = compile_table(config, inspector)?;

    let output_dir = config.output_dir();
    if config.out_dir_is_file() {
        if config.out_dir.is_file() {
            fs::remove_file(&config.out_dir)?;
        }
    } else if output_dir.exists() {
        fs::remove_dir_all(output_dir)?;
    }
    fs::create_dir_all(output_dir)?;

    let assets = match config.target {
        Target::Pages => Some(copy_public_dir(&config.public_dir(), output_dir)?),
        Target::Workers => None,
    };
    let asset_count = assets.as_ref().map(AssetManifest::len).unwrap_or(0);

    let job = BundleJob {
        entry_source: worker_template(config.target).to_string(),
        routes_source: routes_module(&table),
        defines: Defines {
            base_path: config.base_path.clone(),
            assets,
        },
        outfile: config.outfile(),
        minify: !config.skip_minify,
        work_dir: config.cwd.clone(),
    };

    info!(bundler = bundler.name(), outfile = %job.outfile.display(), "Bundling worker");
    bundler.bundle(&job)?;

    let report = BuildReport {
        outfile: job.outfile,
        entries: table.len(),
        assets: asset_count,
    };
    info!(
        entries = report.entries,
        assets = report.assets,
        "Built {}",
        report.outfile.display()
    );
    Ok(report)
}

/// Copies `public_dir` into `output_dir` and lists what was copied
///
/// A missing public directory yields an empty manifest.
fn copy_public_dir(public_dir: &Path, output_dir: &Path) -> Result<AssetManifest> {
    if !public_dir.is_dir() {
        debug!(path = %public_dir.display(), "No public directory");
        return Ok(AssetManifest::default());
    }

    let manifest = AssetManifest::collect(public_dir)?;

    for entry in WalkDir::new(public_dir).follow_links(true) {
        let entry = entry.map_err(|err| Error::Discovery {
            path: public_dir.to_path_buf(),
            message: err.to_string(),
        })?;
        let path = entry.path();
        let relative = path.strip_prefix(public_dir).unwrap_or(path);
        let target = output_dir.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(path, &target)?;
        }
    }

    Ok(manifest)
}
