mod commands;

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use fsrouter::{Config, Target};
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;

#[derive(Parser, Debug)]
#[command(name = "fsrouter")]
#[command(version, about = "fsrouter - compile a directory of route files into a worker", long_about = None)]
struct Cli {
    /// Prefix for every route (e.g. /api)
    #[arg(long, value_name = "PATH")]
    base_path: Option<String>,

    /// Directory holding the route files [default: src]
    #[arg(long, value_name = "DIR")]
    root_dir: Option<PathBuf>,

    /// Output directory, or output file when it ends in .js [default: dist]
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Do not minify the bundle
    #[arg(long)]
    skip_minify: bool,

    /// Deployment target
    #[arg(long, value_enum)]
    target: Option<TargetArg>,

    /// Suppress all output except errors
    #[arg(long, conflicts_with = "verbose")]
    silent: bool,

    /// Log every classified file and table entry
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file [default: ./fsrouter.toml when present]
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Tool producing the final bundle
    #[arg(long, value_enum, default_value = "esbuild")]
    bundler: BundlerKind,

    /// Print the compiled table instead of building
    #[arg(long)]
    print_routes: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum TargetArg {
    /// Cloudflare Workers (dist/index.js)
    Workers,
    /// Cloudflare Pages (dist/_worker.js plus public files)
    Pages,
}

impl From<TargetArg> for Target {
    fn from(arg: TargetArg) -> Self {
        match arg {
            TargetArg::Workers => Target::Workers,
            TargetArg::Pages => Target::Pages,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum BundlerKind {
    /// Shell out to esbuild (must be on PATH)
    Esbuild,
    /// Write the generated module without bundling
    #[value(name = "none")]
    Plain,
}

impl Cli {
    /// Configuration file contents with the flags layered on top
    fn config(&self, cwd: &Path) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => {
                let path = cwd.join(path);
                if !path.is_file() {
                    bail!("Config file not found: {}", path.display());
                }
                Config::load(&path)
                    .with_context(|| format!("Failed to load {}", path.display()))?
            }
            None => Config::load(cwd.join(Config::FILE_NAME))
                .with_context(|| format!("Failed to load {}", Config::FILE_NAME))?,
        };

        self.apply(&mut config);
        Ok(config)
    }

    fn apply(&self, config: &mut Config) {
        if let Some(base_path) = &self.base_path {
            config.base_path = base_path.clone();
        }
        if let Some(root_dir) = &self.root_dir {
            config.root_dir = root_dir.clone();
        }
        if let Some(out_dir) = &self.out_dir {
            config.out_dir = out_dir.clone();
        }
        if let Some(target) = self.target {
            config.target = target.into();
        }
        config.skip_minify |= self.skip_minify;
        config.silent |= self.silent;
    }
}

fn init_logging(silent: bool, verbose: bool) {
    let level = if silent {
        LevelFilter::OFF
    } else if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to read the current directory")?;
    let config = cli.config(&cwd)?;

    init_logging(config.silent, cli.verbose);

    let resolved = config.resolve(&cwd)?;

    if cli.print_routes {
        commands::routes::execute(&resolved)
    } else {
        commands::build::execute(&resolved, cli.bundler)
    }
}

fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        std::process::exit(1);
    }
}
