use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Parser turning Rust source files into syntax trees tagged with their module path.
///
/// Every item documented by this crate is addressed by a qualified name such as
/// `models::item::Item`. The module part comes from the file's location below the
/// nearest `src` directory: `src/lib.rs` and `src/main.rs` are the crate root,
/// `src/models/mod.rs` is `models`, and `src/models/item.rs` is `models::item`.
///
/// # Example
///
/// ```no_run
/// use restdocs_from_source::parser::AstParser;
/// use std::path::Path;
///
/// let parsed = AstParser::parse_file(Path::new("src/models/item.rs")).unwrap();
/// println!("{} has {} items", parsed.module_path, parsed.syntax_tree.items.len());
/// ```
pub struct AstParser;

/// A successfully parsed Rust file with its abstract syntax tree.
#[derive(Debug)]
pub struct ParsedFile {
    /// Path to the source file
    pub path: PathBuf,
    /// Module path of the file, empty for the crate root
    pub module_path: String,
    /// The parsed abstract syntax tree
    pub syntax_tree: syn::File,
}

impl ParsedFile {
    /// Build a ParsedFile from source text, mostly useful for tests and in-memory projects
    pub fn from_source(module_path: &str, source: &str) -> Result<Self> {
        let syntax_tree = syn::parse_file(source)
            .with_context(|| format!("Failed to parse Rust syntax in module `{}`", module_path))?;

        Ok(Self {
            path: PathBuf::from(format!("{}.rs", module_path.replace("::", "/"))),
            module_path: module_path.to_string(),
            syntax_tree,
        })
    }
}

impl AstParser {
    /// Parses a single Rust source file into an AST.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The file contains invalid Rust syntax
    pub fn parse_file(path: &Path) -> Result<ParsedFile> {
        debug!("Parsing file: {}", path.display());

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        let syntax_tree = syn::parse_file(&content)
            .with_context(|| format!("Failed to parse Rust syntax in file: {}", path.display()))?;

        let module_path = Self::module_path_for(path);
        debug!("Parsed {} as module `{}`", path.display(), module_path);

        Ok(ParsedFile {
            path: path.to_path_buf(),
            module_path,
            syntax_tree,
        })
    }

    /// Parses multiple Rust source files, continuing even if some fail.
    ///
    /// Files that fail to parse are logged as warnings, so documentation can still be
    /// produced for the rest of the project.
    pub fn parse_files(paths: &[PathBuf]) -> Vec<Result<ParsedFile>> {
        debug!("Parsing {} files", paths.len());

        let results: Vec<Result<ParsedFile>> = paths
            .iter()
            .map(|path| {
                Self::parse_file(path).inspect_err(|e| {
                    warn!("Failed to parse {}: {}", path.display(), e);
                })
            })
            .collect();

        let success_count = results.iter().filter(|r| r.is_ok()).count();
        debug!(
            "Parsing complete: {} succeeded, {} failed",
            success_count,
            results.len() - success_count
        );

        results
    }

    /// Derive the module path of a source file from its location under `src/`.
    ///
    /// Files outside any `src` directory are addressed relative to their own directory.
    pub fn module_path_for(path: &Path) -> String {
        let components: Vec<String> = path
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().to_string()),
                _ => None,
            })
            .collect();

        let start = components
            .iter()
            .rposition(|c| c == "src")
            .map(|i| i + 1)
            .unwrap_or_else(|| components.len().saturating_sub(1));

        let mut segments: Vec<String> = components[start..].to_vec();
        if let Some(last) = segments.pop() {
            let stem = last.strip_suffix(".rs").unwrap_or(&last).to_string();
            if !matches!(stem.as_str(), "lib" | "main" | "mod") {
                segments.push(stem);
            }
        }

        segments.join("::")
    }
}
