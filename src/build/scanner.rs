//! Source tree scanning.
//!
//! Walks a directory recursively and classifies `.c` files as compilation
//! units and `.h` files as header units. Every other file is ignored.
//! Directories whose name is in the exclusion list are never entered.

use crate::config::{DEFAULT_OPTIONS, EXCLUDED_DIRS};
use crate::error::BuildError;
use colored::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const SOURCE_EXT: &str = "c";
pub const HEADER_EXT: &str = "h";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SourceKind {
    #[serde(rename = "c")]
    CompilationUnit,
    #[serde(rename = "h")]
    HeaderUnit,
}

/// One file found on disk. Serializes to the wire shape
/// `{ "type", "name", "options"?, "src" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFile {
    #[serde(rename = "type")]
    pub kind: SourceKind,
    /// File name without directories.
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,
    #[serde(rename = "src")]
    pub content: String,
    /// Location on disk, for diagnostics only.
    #[serde(skip)]
    pub path: PathBuf,
}

impl SourceFile {
    pub fn is_unit(&self) -> bool {
        self.kind == SourceKind::CompilationUnit
    }

    pub fn is_header(&self) -> bool {
        self.kind == SourceKind::HeaderUnit
    }
}

pub fn classify(path: &Path) -> Option<SourceKind> {
    match path.extension()?.to_str()? {
        SOURCE_EXT => Some(SourceKind::CompilationUnit),
        HEADER_EXT => Some(SourceKind::HeaderUnit),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct Scanner {
    excluded: Vec<String>,
    options: String,
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new(EXCLUDED_DIRS.iter().map(|s| s.to_string()).collect(), DEFAULT_OPTIONS)
    }
}

impl Scanner {
    pub fn new(excluded: Vec<String>, options: &str) -> Self {
        Self {
            excluded,
            options: options.to_string(),
        }
    }

    pub fn excluded(&self) -> &[String] {
        &self.excluded
    }

    pub fn options(&self) -> &str {
        &self.options
    }

    fn is_excluded(&self, name: &str) -> bool {
        self.excluded.iter().any(|e| e == name)
    }

    /// Every `.c` and `.h` file under `root`, in sorted walk order.
    pub fn scan(&self, root: &Path) -> Result<Vec<SourceFile>, BuildError> {
        let meta = fs::metadata(root).map_err(|e| BuildError::io(root, e))?;
        if !meta.is_dir() {
            return Err(BuildError::not_a_directory(root));
        }

        let walker = WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                // The root itself is never filtered, whatever its name.
                entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || !self.is_excluded(&entry.file_name().to_string_lossy())
            });

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(root).to_path_buf();
                BuildError::FileSystem {
                    path,
                    reason: e.to_string(),
                }
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(kind) = classify(entry.path()) {
                files.push(self.read_source(entry.path(), kind)?);
            }
        }
        Ok(files)
    }

    /// Header units under `root`, or an empty set when no root was given.
    pub fn scan_headers(&self, root: Option<&Path>) -> Result<Vec<SourceFile>, BuildError> {
        let Some(root) = root else {
            println!("{} No header path specified, using default headers...", "!".yellow());
            return Ok(Vec::new());
        };

        let headers: Vec<SourceFile> = self
            .scan(root)?
            .into_iter()
            .filter(SourceFile::is_header)
            .collect();

        if headers.is_empty() {
            println!("{} No header files detected, using default headers...", "!".yellow());
        }
        Ok(headers)
    }

    /// Load a single compilation unit for single-file mode.
    pub fn load_unit(&self, path: &Path) -> Result<SourceFile, BuildError> {
        if classify(path) != Some(SourceKind::CompilationUnit) {
            return Err(BuildError::InvalidInput(
                "Invalid file type. must be .c file".to_string(),
            ));
        }
        self.read_source(path, SourceKind::CompilationUnit)
    }

    fn read_source(&self, path: &Path, kind: SourceKind) -> Result<SourceFile, BuildError> {
        // Non-UTF-8 bytes are replaced, not fatal.
        let bytes = fs::read(path).map_err(|e| BuildError::io(path, e))?;
        let content = String::from_utf8_lossy(&bytes).into_owned();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let options = match kind {
            SourceKind::CompilationUnit => Some(self.options.clone()),
            SourceKind::HeaderUnit => None,
        };
        Ok(SourceFile {
            kind,
            name,
            options,
            content,
            path: path.to_path_buf(),
        })
    }
}
