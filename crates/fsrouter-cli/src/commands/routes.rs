use anyhow::{Context, Result};
use colored::Colorize;
use fsrouter::inspect::StaticInspector;
use fsrouter::ResolvedConfig;

/// Prints the dispatch table in precedence order
pub fn execute(config: &ResolvedConfig) -> Result<()> {
    let table = fsrouter::compile_table(config, &StaticInspector::new())
        .with_context(|| format!("Failed to compile {}", config.root_dir.display()))?;

    for (index, entry) in table.iter().enumerate() {
        let handlers: Vec<String> = entry.handlers.iter().map(|h| h.to_string()).collect();
        println!(
            "{:>3}  {:<8} {}",
            index,
            entry.method.as_str().cyan().bold(),
            entry.pattern.source().yellow()
        );
        for handler in handlers {
            println!("               {}", handler.dimmed());
        }
    }

    Ok(())
}
