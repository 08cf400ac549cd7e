//! Status command - report whether an index exists and summary counts.

use crate::config::Settings;
use crate::index::decoded::CodeIndex;
use comfy_table::Table;

pub fn run() {
    let cog_dir = Settings::cog_dir();
    if !cog_dir.join(crate::storage::INDEX_FILE_NAME).exists() {
        println!("No index found at {}", cog_dir.display());
        println!("Run 'cog index' to build one.");
        return;
    }

    match crate::storage::load(&cog_dir) {
        Ok(index) => {
            let decoded = CodeIndex::build(&index);
            let mut table = Table::new();
            table.set_header(vec!["field", "value"]);
            table.add_row(vec!["project root", &index.metadata.project_root]);
            table.add_row(vec!["documents", &index.documents.len().to_string()]);
            table.add_row(vec!["symbols", &decoded.symbol_to_def.len().to_string()]);
            table.add_row(vec!["external symbols", &index.external_symbols.len().to_string()]);
            println!("{table}");
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
