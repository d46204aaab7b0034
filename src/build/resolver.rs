//! Persisting a build result: the decoded artifact on success, a log of the
//! failed tasks' console output on failure. Exactly one file per call.

use super::client::{BuildResult, MISSING_OUTPUT};
use super::feedback::FeedbackAnalyzer;
use crate::error::BuildError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use colored::*;
use flate2::read::GzDecoder;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

pub const ARTIFACT_EXT: &str = "wasm";
pub const LOG_EXT: &str = "log";

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Turns the service's encoded `output` into artifact bytes.
pub trait Decoder: Sync {
    fn decode(&self, raw: &str) -> Result<Vec<u8>, BuildError>;
}

/// Base64 payload, optionally behind a `data:` URL prefix, optionally gzipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct WasmDecoder;

impl Decoder for WasmDecoder {
    fn decode(&self, raw: &str) -> Result<Vec<u8>, BuildError> {
        let payload = match raw.split_once(";base64,") {
            Some((prefix, rest)) if prefix.starts_with("data:") => rest,
            _ => raw,
        };
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| BuildError::Decode(e.to_string()))?;

        if !bytes.starts_with(&GZIP_MAGIC) {
            return Ok(bytes);
        }
        let mut inflated = Vec::new();
        GzDecoder::new(bytes.as_slice())
            .read_to_end(&mut inflated)
            .map_err(|e| BuildError::Decode(format!("failed to decompress gzip: {}", e)))?;
        Ok(inflated)
    }
}

/// Console text of every failed task, newline-joined.
pub fn failure_log(result: &BuildResult) -> String {
    result
        .tasks
        .iter()
        .filter(|t| !t.success)
        .map(|t| t.console.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Failure log followed by a hint, when one applies.
pub fn diagnostic(log: &str) -> String {
    match FeedbackAnalyzer::analyze(log) {
        Some(hint) => format!("{}\n\n{} {}", log, "Hint:".bold().cyan(), hint),
        None => log.to_string(),
    }
}

/// Write the outcome of one build into `out_dir` and return the written path.
/// A failed build still writes its log, then returns `BuildFailed`. Nothing
/// is printed here; callers own the terminal.
pub fn resolve(
    result: BuildResult,
    out_dir: &Path,
    base_name: &str,
    decoder: &dyn Decoder,
) -> Result<PathBuf, BuildError> {
    fs::create_dir_all(out_dir).map_err(|e| BuildError::io(out_dir, e))?;

    if !result.success {
        let log = failure_log(&result);
        let log_path = out_dir.join(format!("{}.{}", base_name, LOG_EXT));
        fs::write(&log_path, &log).map_err(|e| BuildError::io(&log_path, e))?;

        return Err(BuildError::BuildFailed {
            message: result.message,
            console: diagnostic(&log),
            log: log_path,
        });
    }
    if result.output.is_empty() {
        return Err(BuildError::Transport(MISSING_OUTPUT.to_string()));
    }

    let binary = decoder.decode(&result.output)?;
    let artifact = out_dir.join(format!("{}.{}", base_name, ARTIFACT_EXT));
    fs::write(&artifact, binary).map_err(|e| BuildError::io(&artifact, e))?;
    Ok(artifact)
}
