//! Source file discovery with .gitignore integration
//!
//! Uses the `ignore` crate (from ripgrep) so `lantern lint <dir>` skips the
//! same files git does, plus anything listed in `.lanternignore`.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

/// Per-directory ignore file honoured alongside .gitignore
pub const IGNORE_FILE_NAME: &str = ".lanternignore";

/// Directory names never descended into
const SKIPPED_DIRS: &[&str] = &[".git", ".lantern", "node_modules", "target", "build", "dist"];

#[derive(Debug, Clone)]
pub struct SourceFileFilter {
    extensions: Vec<String>,
    max_file_size: u64,
    respect_gitignore: bool,
}

impl SourceFileFilter {
    pub fn new(extensions: &[String], max_file_size: u64) -> Self {
        Self {
            extensions: extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            max_file_size,
            respect_gitignore: true,
        }
    }

    pub fn respect_gitignore(mut self, yes: bool) -> Self {
        self.respect_gitignore = yes;
        self
    }

    pub fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }

    fn within_size_limit(&self, path: &Path) -> bool {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > self.max_file_size => {
                tracing::debug!("Skipping {:?}: {} bytes exceeds limit", path, meta.len());
                false
            }
            Ok(_) => true,
            Err(e) => {
                tracing::debug!("Skipping {:?}: {}", path, e);
                false
            }
        }
    }

    fn walk_builder(&self, root: &Path) -> WalkBuilder {
        let mut builder = WalkBuilder::new(root);
        builder
            .hidden(true)
            .git_ignore(self.respect_gitignore)
            .git_global(self.respect_gitignore)
            .git_exclude(self.respect_gitignore)
            .require_git(false)
            .add_custom_ignore_filename(IGNORE_FILE_NAME)
            .filter_entry(|entry| {
                let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                !(is_dir
                    && entry
                        .file_name()
                        .to_str()
                        .is_some_and(|name| SKIPPED_DIRS.contains(&name)))
            });
        builder
    }

    /// Collect source files under `root`, sorted by path
    ///
    /// A file path is returned as-is when it has a source extension, so an
    /// explicit file argument is never filtered by ignore rules.
    pub fn discover(&self, root: &Path) -> Vec<PathBuf> {
        if root.is_file() {
            return if self.matches_extension(root) && self.within_size_limit(root) {
                vec![root.to_path_buf()]
            } else {
                Vec::new()
            };
        }

        let mut files: Vec<PathBuf> = self
            .walk_builder(root)
            .build()
            .filter_map(|e| e.ok())
            .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
            .map(|entry| entry.into_path())
            .filter(|path| self.matches_extension(path) && self.within_size_limit(path))
            .collect();

        files.sort();
        tracing::debug!("Discovered {} source files under {:?}", files.len(), root);
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn filter() -> SourceFileFilter {
        SourceFileFilter::new(&["ln".to_string()], u64::MAX)
    }

    #[test]
    fn test_discover_by_extension() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir(root.join("lib")).unwrap();
        fs::write(root.join("main.ln"), "x;").unwrap();
        fs::write(root.join("lib/util.LN"), "y;").unwrap();
        fs::write(root.join("notes.txt"), "z").unwrap();

        let files = filter().discover(root);
        assert_eq!(files, vec![root.join("lib/util.LN"), root.join("main.ln")]);
    }

    #[test]
    fn test_gitignore_and_custom_ignore() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(root.join(".gitignore"), "gen/\n").unwrap();
        fs::write(root.join(IGNORE_FILE_NAME), "scratch.ln\n").unwrap();
        fs::create_dir(root.join("gen")).unwrap();
        fs::write(root.join("gen/out.ln"), "x;").unwrap();
        fs::write(root.join("scratch.ln"), "x;").unwrap();
        fs::write(root.join("main.ln"), "x;").unwrap();

        assert_eq!(filter().discover(root), vec![root.join("main.ln")]);
    }

    #[test]
    fn test_skipped_dirs_and_size_limit() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir(root.join("target")).unwrap();
        fs::write(root.join("target/a.ln"), "x;").unwrap();
        fs::write(root.join("big.ln"), "x".repeat(64)).unwrap();
        fs::write(root.join("small.ln"), "x;").unwrap();

        let files = SourceFileFilter::new(&["ln".to_string()], 16).discover(root);
        assert_eq!(files, vec![root.join("small.ln")]);
    }

    #[test]
    fn test_explicit_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("one.ln");
        fs::write(&file, "x;").unwrap();
        assert_eq!(filter().discover(&file), vec![file.clone()]);

        let other = temp.path().join("one.txt");
        fs::write(&other, "x").unwrap();
        assert!(filter().discover(&other).is_empty());
    }
}
