//! Build request assembly.
//!
//! A request always carries exactly one compilation unit plus the full header
//! set. Output format, compression and stripping are fixed policy.

use super::scanner::{SOURCE_EXT, SourceFile};
use crate::error::BuildError;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Wasm,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Wasm => "wasm",
        }
    }
}

/// Wire body for `POST /api/build`. Headers are borrowed so one header set is
/// shared by every concurrently dispatched unit.
#[derive(Debug, Clone, Serialize)]
pub struct BuildRequest<'a> {
    pub output: OutputFormat,
    pub compress: bool,
    pub strip: bool,
    #[serde(rename = "files")]
    pub units: [&'a SourceFile; 1],
    pub headers: &'a [SourceFile],
}

impl<'a> BuildRequest<'a> {
    pub fn unit(&self) -> &'a SourceFile {
        self.units[0]
    }

    /// Name of the artifact/log written for this request.
    pub fn base_name(&self) -> &str {
        artifact_base_name(&self.unit().name)
    }

    pub fn to_json(&self) -> Result<String, BuildError> {
        serde_json::to_string(self)
            .map_err(|e| BuildError::InvalidInput(format!("cannot serialize request: {}", e)))
    }
}

/// Everything before the first `.c` in `name`, so `main.c.c` yields `main`.
pub fn artifact_base_name(name: &str) -> &str {
    let marker = format!(".{}", SOURCE_EXT);
    name.split(marker.as_str()).next().unwrap_or(name)
}

pub fn assemble<'a>(unit: &'a SourceFile, headers: &'a [SourceFile]) -> BuildRequest<'a> {
    BuildRequest {
        output: OutputFormat::Wasm,
        compress: true,
        strip: true,
        units: [unit],
        headers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::scanner::SourceKind;
    use serde_json::{Value, json};
    use std::path::PathBuf;

    fn unit(name: &str) -> SourceFile {
        SourceFile {
            kind: SourceKind::CompilationUnit,
            name: name.to_string(),
            options: Some("-O3".to_string()),
            content: "int main() { return 0; }".to_string(),
            path: PathBuf::from(name),
        }
    }

    fn header(name: &str) -> SourceFile {
        SourceFile {
            kind: SourceKind::HeaderUnit,
            name: name.to_string(),
            options: None,
            content: "#pragma once".to_string(),
            path: PathBuf::from(name),
        }
    }

    #[test]
    fn test_base_name_splits_at_first_marker() {
        assert_eq!(artifact_base_name("main.c"), "main");
        assert_eq!(artifact_base_name("main.c.c"), "main");
        assert_eq!(artifact_base_name("hook"), "hook");
        assert_eq!(artifact_base_name("my.config.c"), "my");
    }

    #[test]
    fn test_assemble_single_unit_full_headers() {
        let source = unit("hook.c");
        let headers = vec![header("hookapi.h"), header("extern.h")];
        let request = assemble(&source, &headers);

        assert_eq!(request.units.len(), 1);
        assert_eq!(request.unit(), &source);
        assert_eq!(request.headers, headers.as_slice());
        assert_eq!(request.base_name(), "hook");
        assert!(request.compress && request.strip);
        assert_eq!(request.output.extension(), "wasm");
    }

    #[test]
    fn test_request_wire_shape() {
        let source = unit("hook.c");
        let headers = vec![header("hookapi.h")];
        let body: Value = serde_json::from_str(&assemble(&source, &headers).to_json().unwrap()).unwrap();

        assert_eq!(
            body,
            json!({
                "output": "wasm",
                "compress": true,
                "strip": true,
                "files": [{
                    "type": "c",
                    "name": "hook.c",
                    "options": "-O3",
                    "src": "int main() { return 0; }"
                }],
                "headers": [{ "type": "h", "name": "hookapi.h", "src": "#pragma once" }]
            })
        );
    }

    #[test]
    fn test_request_without_headers() {
        let source = unit("a.c");
        let body: Value = serde_json::from_str(&assemble(&source, &[]).to_json().unwrap()).unwrap();
        assert_eq!(body["headers"], json!([]));
        assert_eq!(body["files"].as_array().map(Vec::len), Some(1));
    }
}
