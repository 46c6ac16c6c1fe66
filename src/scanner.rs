use anyhow::Result;
use log::{debug, warn};
use std::path::PathBuf;
use walkdir::WalkDir;

/// File scanner for traversing project and sidecar directories.
///
/// The `FileScanner` recursively walks a directory and collects every file with the
/// configured extension (`rs` by default, `json` for doc sidecars). It skips the `target`
/// directory and hidden directories, and yields files in file-name order so that every
/// later stage sees the project in the same order on every platform.
///
/// # Example
///
/// ```no_run
/// use restdocs_from_source::scanner::FileScanner;
/// use std::path::PathBuf;
///
/// let scanner = FileScanner::new(PathBuf::from("./my-project"));
/// let result = scanner.scan().unwrap();
/// println!("Found {} Rust files", result.files.len());
/// ```
pub struct FileScanner {
    root_path: PathBuf,
    extension: String,
}

/// Result of directory scanning operation.
pub struct ScanResult {
    /// Paths of all discovered files, sorted by file name within each directory
    pub files: Vec<PathBuf>,
    /// Warning messages for any issues encountered (e.g., inaccessible directories)
    pub warnings: Vec<String>,
}

impl FileScanner {
    /// Creates a scanner collecting `.rs` files under `root_path`.
    pub fn new(root_path: PathBuf) -> Self {
        Self {
            root_path,
            extension: "rs".to_string(),
        }
    }

    /// Collect files with another extension (without the leading dot).
    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    /// Scans the directory tree and collects all matching files.
    ///
    /// Inaccessible entries are reported as warnings; scanning continues past them.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory does not exist.
    pub fn scan(&self) -> Result<ScanResult> {
        if !self.root_path.exists() {
            anyhow::bail!("Directory does not exist: {}", self.root_path.display());
        }

        let mut files = Vec::new();
        let mut warnings = Vec::new();

        for entry in WalkDir::new(&self.root_path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                if e.path() == self.root_path {
                    return true;
                }

                let file_name = e.file_name().to_string_lossy();
                let is_hidden = file_name.starts_with('.');
                let is_target = file_name == "target";

                !is_hidden && !is_target
            })
        {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    let matches = path.extension().and_then(|s| s.to_str())
                        == Some(self.extension.as_str());

                    if path.is_file() && matches {
                        files.push(path.to_path_buf());
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        debug!(
            "Found {} .{} files under {}",
            files.len(),
            self.extension,
            self.root_path.display()
        );

        Ok(ScanResult { files, warnings })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn file_names(result: &ScanResult) -> Vec<String> {
        result
            .files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_scan_finds_sources_in_name_order() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join("b.rs"), "struct B;").unwrap();
        fs::write(root.join("a.rs"), "struct A;").unwrap();
        fs::write(root.join("readme.md"), "# README").unwrap();

        let result = FileScanner::new(root.to_path_buf()).scan().unwrap();

        assert_eq!(file_names(&result), vec!["a.rs", "b.rs"]);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_scan_nested_directories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("src/models")).unwrap();
        fs::write(root.join("src/lib.rs"), "pub mod models;").unwrap();
        fs::write(root.join("src/models/item.rs"), "pub struct Item;").unwrap();

        let result = FileScanner::new(root.to_path_buf()).scan().unwrap();

        assert_eq!(result.files.len(), 2);
    }

    #[test]
    fn test_scan_skips_target_and_hidden_directories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir(root.join("target")).unwrap();
        fs::write(root.join("target/build.rs"), "fn main() {}").unwrap();
        fs::create_dir(root.join(".git")).unwrap();
        fs::write(root.join(".git/hook.rs"), "fn main() {}").unwrap();
        fs::write(root.join("main.rs"), "fn main() {}").unwrap();

        let result = FileScanner::new(root.to_path_buf()).scan().unwrap();

        assert_eq!(file_names(&result), vec!["main.rs"]);
    }

    #[test]
    fn test_scan_sidecar_extension() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir(root.join("models")).unwrap();
        fs::write(root.join("models/Item.json"), "{}").unwrap();
        fs::write(root.join("models/item.rs"), "").unwrap();

        let result = FileScanner::new(root.to_path_buf())
            .with_extension(".json")
            .scan()
            .unwrap();

        assert_eq!(file_names(&result), vec!["Item.json"]);
    }

    #[test]
    fn test_scan_missing_root() {
        let result = FileScanner::new(PathBuf::from("/nonexistent/project")).scan();
        assert!(result.is_err());
    }
}
