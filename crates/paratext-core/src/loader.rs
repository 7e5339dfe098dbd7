/*
 * loader.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Content loading.
//!
//! Bundling reaches other documents only through [`ContentLoader`], so the
//! same engine serves files on disk, in-memory template sets, and tests.
//! Import targets go through [`resolve_path`] before they reach a loader:
//! relative targets resolve against the importing file's directory, absolute
//! targets arrive exactly as the import spelled them.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;

/// Loads template source text by resolved path.
pub trait ContentLoader {
    fn load(&self, path: &str) -> io::Result<String>;
}

/// Loads files from the filesystem, optionally under a fixed root.
#[derive(Debug, Clone, Default)]
pub struct FileSystemLoader {
    root: Option<PathBuf>,
}

impl FileSystemLoader {
    pub fn new() -> Self {
        Self { root: None }
    }

    /// Serve resolved paths relative to a root directory.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }
}

impl ContentLoader for FileSystemLoader {
    fn load(&self, path: &str) -> io::Result<String> {
        let full = match &self.root {
            Some(root) => root.join(path.trim_start_matches('/')),
            None => PathBuf::from(path),
        };
        fs::read_to_string(full)
    }
}

/// Serves template sources from an in-memory map.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    files: HashMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self {
            files: HashMap::new(),
        }
    }

    pub fn with_files(files: HashMap<String, String>) -> Self {
        Self { files }
    }

    /// Add one file, replacing any previous content at that path.
    pub fn add(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }
}

impl ContentLoader for MemoryLoader {
    fn load(&self, path: &str) -> io::Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{path} not found")))
    }
}

/// A loader that has no content. Useful when imports must not occur.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLoader;

impl ContentLoader for NullLoader {
    fn load(&self, path: &str) -> io::Result<String> {
        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{path} not found"),
        ))
    }
}

/// Resolve an import target against a base directory. Absolute targets keep
/// the spelling the import wrote; relative targets apply `.` and `..`
/// segments against the base to form a rooted path.
pub fn resolve_path(base: &str, target: &str) -> String {
    if target.starts_with('/') {
        return target.to_string();
    }
    let mut segments: Vec<&str> = base.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/').filter(|s| !s.is_empty()) {
        match segment {
            "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    format!("/{}", segments.join("/"))
}

/// The directory part of a resolved path.
pub fn dirname(path: &str) -> String {
    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    segments.pop();
    format!("/{}", segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // ===== path resolution =====

    #[test]
    fn test_resolve_relative_targets() {
        assert_eq!(resolve_path("/docs", "./card.md"), "/docs/card.md");
        assert_eq!(resolve_path("/docs", "card.md"), "/docs/card.md");
        assert_eq!(resolve_path("/docs/sub", "../card.md"), "/docs/card.md");
        assert_eq!(resolve_path("/", "a/b/../c.md"), "/a/c.md");
    }

    #[test]
    fn test_resolve_absolute_targets_keep_their_spelling() {
        assert_eq!(resolve_path("/docs", "/shared/card.md"), "/shared/card.md");
        assert_eq!(
            resolve_path("/docs", "/lib/../lib/card.md"),
            "/lib/../lib/card.md"
        );
    }

    #[test]
    fn test_dirname() {
        assert_eq!(dirname("/docs/card.md"), "/docs");
        assert_eq!(dirname("/card.md"), "/");
        assert_eq!(dirname("/a/b/c.md"), "/a/b");
    }

    // ===== loaders =====

    #[test]
    fn test_memory_loader() {
        let mut loader = MemoryLoader::new();
        loader.add("/main.md", "# Main");
        assert_eq!(loader.load("/main.md").unwrap(), "# Main");
        let err = loader.load("/missing.md").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_memory_loader_with_files() {
        let mut files = HashMap::new();
        files.insert("/a.md".to_string(), "A".to_string());
        let loader = MemoryLoader::with_files(files);
        assert_eq!(loader.load("/a.md").unwrap(), "A");
    }

    #[test]
    fn test_null_loader_has_nothing() {
        let err = NullLoader.load("/anything.md").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_file_system_loader_with_root() {
        let dir = std::env::temp_dir().join("paratext-loader-test");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("doc.md"), "on disk").unwrap();

        let loader = FileSystemLoader::with_root(&dir);
        assert_eq!(loader.load("/doc.md").unwrap(), "on disk");
        assert!(loader.load("/absent.md").is_err());

        fs::remove_dir_all(&dir).ok();
    }
}
