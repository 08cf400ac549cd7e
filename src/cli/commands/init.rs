//! Init command.

use crate::config::Settings;
use console::style;

/// Run init command - create configuration file.
pub fn run_init(force: bool) {
    match Settings::init_config_file(force) {
        Ok(path) => {
            println!("{} {}", style("Created configuration file at:").green().bold(), path.display());
            println!("Edit this file to customize your settings.");
        }
        Err(e) => {
            eprintln!("{} {e}", style("Error:").red().bold());
            std::process::exit(1);
        }
    }
}
