//! Index command - expand glob patterns and build the symbol index.

use crate::config::Settings;
use crate::indexing::LanguageRegistry;
use indicatif::{ProgressBar, ProgressStyle};

pub fn run(patterns: Vec<String>) {
    let root = Settings::workspace_root();
    let cog_dir = root.join(crate::config::COG_DIR_NAME);
    if !cog_dir.is_dir() {
        eprintln!("Error: No .cog directory found. Run 'cog init' first.");
        std::process::exit(1);
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}").expect("static template is valid"));
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    spinner.set_message(format!("indexing {}", root.display()));

    let registry = LanguageRegistry::with_defaults();
    let result = crate::indexing::index(&root, &patterns, &registry);

    match result {
        Ok(count) => {
            spinner.finish_with_message(format!("indexed {count} file(s) under {}", root.display()));
        }
        Err(e) => {
            spinner.finish_and_clear();
            eprintln!("Error: {e}");
            for suggestion in e.recovery_suggestions() {
                eprintln!("  {suggestion}");
            }
            std::process::exit(1);
        }
    }
}
