use crate::BundlerKind;
use anyhow::{Context, Result};
use colored::Colorize;
use fsrouter::bundle::{Bundler, EsbuildBundler, UnbundledWriter};
use fsrouter::inspect::StaticInspector;
use fsrouter::ResolvedConfig;

pub fn execute(config: &ResolvedConfig, bundler: BundlerKind) -> Result<()> {
    let bundler: Box<dyn Bundler> = match bundler {
        BundlerKind::Esbuild => Box::new(EsbuildBundler::new()),
        BundlerKind::Plain => Box::new(UnbundledWriter),
    };

    if !config.silent {
        println!("{}", "Building worker...".green().bold());
        println!("Target: {}", config.target.as_str().cyan());
        println!();
    }

    let report = fsrouter::build(config, &StaticInspector::new(), bundler.as_ref())
        .with_context(|| format!("Failed to build {}", config.root_dir.display()))?;

    if !config.silent {
        let mut summary = format!("{} routes", report.entries);
        if report.assets > 0 {
            summary.push_str(&format!(", {} public files", report.assets));
        }
        println!("{} {} ({})", "✓ Built".green().bold(), report.outfile.display(), summary);
    }

    Ok(())
}
