//! Mcp command - start the stdio MCP server (§4.6).

use crate::config::Settings;
use crate::runtime::Runtime;
use std::sync::Arc;

pub async fn run(settings: &Settings) {
    let root = Settings::workspace_root();
    if !root.join(crate::config::COG_DIR_NAME).is_dir() {
        eprintln!("Error: No .cog directory found. Run 'cog init' first.");
        std::process::exit(1);
    }

    let runtime = Arc::new(Runtime::new(root, settings));
    if let Err(e) = runtime.run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
