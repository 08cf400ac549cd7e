//! The backend dispatch surface (§4.2, §9): each registered language is a
//! tagged variant of `{TreeSitterConfig, ExternalBinaryConfig}`, not a
//! trait-object hierarchy — the pipeline dispatches by matching on the
//! variant, exactly as spec §9's "dynamic dispatch of backends" note
//! prescribes.

use crate::document::Document;
use crate::indexing::backends;
use std::collections::HashMap;
use std::process::Command;

/// A backend driven by an in-process tree-sitter grammar.
pub struct TreeSitterConfig {
    pub language: &'static str,
    pub extractor: Box<dyn backends::Extractor>,
}

/// A backend driven by an external indexer binary, invoked per file with
/// `{file}`/`{output}` substitutions, reading back the SCIP file it
/// produces (§4.2).
pub struct ExternalBinaryConfig {
    pub language: &'static str,
    pub command_template: String,
}

pub enum BackendConfig {
    TreeSitter(TreeSitterConfig),
    ExternalBinary(ExternalBinaryConfig),
}

impl BackendConfig {
    pub fn language(&self) -> &'static str {
        match self {
            BackendConfig::TreeSitter(c) => c.language,
            BackendConfig::ExternalBinary(c) => c.language,
        }
    }

    /// Run this backend against one file's source. `None` means the
    /// backend could not produce a document; the pipeline falls back to a
    /// stub (§4.2).
    pub fn run(&self, source: &str, relative_path: &str) -> Option<Document> {
        match self {
            BackendConfig::TreeSitter(c) => c.extractor.extract(source, relative_path),
            BackendConfig::ExternalBinary(c) => run_external(c, relative_path),
        }
    }
}

fn run_external(config: &ExternalBinaryConfig, relative_path: &str) -> Option<Document> {
    let output_path = std::env::temp_dir().join(format!(
        "cog-external-{}.scip",
        relative_path.replace(['/', '\\'], "_")
    ));
    let command = config
        .command_template
        .replace("{file}", relative_path)
        .replace("{output}", &output_path.display().to_string());

    let mut parts = command.split_whitespace();
    let program = parts.next()?;
    let status = Command::new(program).args(parts).status().ok()?;
    if !status.success() {
        return None;
    }

    let bytes = std::fs::read(&output_path).ok()?;
    let _ = std::fs::remove_file(&output_path);
    crate::storage::codec::decode_to_owned(&bytes)
        .ok()
        .and_then(|index| index.documents.into_iter().next())
}

/// Maps file extensions to backends. Only Rust, Python, and
/// JavaScript/TypeScript have real tree-sitter extractors wired up;
/// every other extension from the teacher's original language set still
/// resolves to a registered backend so the file is recognized and dispatched — its
/// extractor simply declines, and the pipeline's stub-document fallback
/// takes over (§4.2, §9 open question parity with the rest of the
/// registry's breadth).
pub struct LanguageRegistry {
    by_extension: HashMap<&'static str, BackendConfig>,
}

impl LanguageRegistry {
    pub fn with_defaults() -> Self {
        let mut by_extension = HashMap::new();

        by_extension.insert(
            "rs",
            BackendConfig::TreeSitter(TreeSitterConfig { language: "rust", extractor: Box::new(backends::rust::RustExtractor::new()) }),
        );
        for ext in ["py", "pyi"] {
            by_extension.insert(
                ext,
                BackendConfig::TreeSitter(TreeSitterConfig { language: "python", extractor: Box::new(backends::python::PythonExtractor::new()) }),
            );
        }
        for ext in ["js", "jsx", "mjs"] {
            by_extension.insert(
                ext,
                BackendConfig::TreeSitter(TreeSitterConfig {
                    language: "javascript",
                    extractor: Box::new(backends::javascript::JavaScriptExtractor::new_javascript()),
                }),
            );
        }
        for ext in ["ts", "tsx"] {
            by_extension.insert(
                ext,
                BackendConfig::TreeSitter(TreeSitterConfig {
                    language: "typescript",
                    extractor: Box::new(backends::javascript::JavaScriptExtractor::new_typescript()),
                }),
            );
        }

        for (ext, lang) in [
            ("go", "go"),
            ("java", "java"),
            ("c", "c"),
            ("h", "c"),
            ("cpp", "cpp"),
            ("cc", "cpp"),
            ("hpp", "cpp"),
            ("cs", "csharp"),
            ("php", "php"),
            ("kt", "kotlin"),
            ("kts", "kotlin"),
            ("swift", "swift"),
            ("lua", "lua"),
            ("clj", "clojure"),
            ("cljs", "clojure"),
            ("gd", "gdscript"),
        ] {
            by_extension.insert(
                ext,
                BackendConfig::TreeSitter(TreeSitterConfig { language: lang, extractor: Box::new(backends::StubExtractor) }),
            );
        }

        Self { by_extension }
    }

    pub fn for_path(&self, path: &std::path::Path) -> Option<&BackendConfig> {
        let ext = path.extension()?.to_str()?;
        self.by_extension.get(ext)
    }

    pub fn is_registered(&self, path: &std::path::Path) -> bool {
        self.for_path(path).is_some()
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
