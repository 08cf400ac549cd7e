use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Parser, Subcommand};

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

#[derive(Parser)]
#[command(name = "cog")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Local code-intelligence service exposing a symbol index to AI coding agents over MCP")]
#[command(styles = clap_cargo_style())]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default `.cog/settings.toml` in the current directory
    Init {
        /// Overwrite an existing configuration file
        #[arg(short, long)]
        force: bool,
    },

    /// Index files matching one or more glob patterns
    Index {
        /// Glob patterns to expand, relative to the project root
        #[arg(default_value = "**/*")]
        patterns: Vec<String>,
    },

    /// Report whether an index exists and summary counts
    Status,

    /// Start the MCP stdio server
    Mcp,
}
