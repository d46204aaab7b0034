//! Error kinds raised by the build pipeline.
//!
//! Every variant is terminal for the unit that raised it. Nothing in the
//! pipeline retries.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    /// Path missing, unreadable, or not the kind of entry expected.
    #[error("{}: {reason}", path.display())]
    FileSystem { path: PathBuf, reason: String },

    /// No compile service endpoint is configured.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Network failure, non-2xx status, or a response body that is not a build result.
    #[error("error sending API call: {0}")]
    Transport(String),

    /// The compile service reported `success = false`. The console output of
    /// the failed tasks was written to `log`; `console` is that output plus
    /// any hint, ready to print.
    #[error("{message} (see {})", log.display())]
    BuildFailed {
        message: String,
        log: PathBuf,
        console: String,
    },

    #[error("{0}")]
    InvalidInput(String),

    /// The artifact payload could not be decoded into bytes.
    #[error("failed to decode build output: {0}")]
    Decode(String),
}

impl BuildError {
    pub fn io(path: &Path, err: std::io::Error) -> Self {
        BuildError::FileSystem {
            path: path.to_path_buf(),
            reason: err.to_string(),
        }
    }

    pub fn not_a_directory(path: &Path) -> Self {
        BuildError::FileSystem {
            path: path.to_path_buf(),
            reason: "not a directory".to_string(),
        }
    }

    /// Short label used in batch summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            BuildError::FileSystem { .. } => "filesystem",
            BuildError::Configuration(_) => "configuration",
            BuildError::Transport(_) => "transport",
            BuildError::BuildFailed { .. } => "build failed",
            BuildError::InvalidInput(_) => "invalid input",
            BuildError::Decode(_) => "decode",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_failed_mentions_log() {
        let err = BuildError::BuildFailed {
            message: "compilation failed".to_string(),
            log: PathBuf::from("out/main.log"),
            console: "main.c:1:1: error: x".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("compilation failed"));
        assert!(msg.contains("main.log"));
        assert!(!msg.contains("error: x"));
        assert_eq!(err.kind(), "build failed");
    }

    #[test]
    fn test_io_error_keeps_path() {
        let err = BuildError::io(
            Path::new("missing/dir"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        );
        assert!(err.to_string().starts_with("missing/dir"));
        assert_eq!(err.kind(), "filesystem");
    }
}
