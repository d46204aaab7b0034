//! Remote build client.
//!
//! One blocking `POST {endpoint}/api/build` per request, no retries. The
//! client keeps no state between calls, so one instance is shared by every
//! unit of a batch.
//!
//! Response parsing is lenient in exactly these places:
//! - a missing or non-boolean `success` (overall or per task) counts as `false`;
//! - a missing `message`, task `name` or task `console` reads as empty;
//! - `output` is ignored unless `success` is `true`.
//!
//! A body that is not a JSON object, has no `tasks` array, or reports
//! `success` without a non-empty string `output` is rejected.

use super::assembler::BuildRequest;
use crate::error::BuildError;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

pub const BUILD_PATH: &str = "/api/build";

pub const MISSING_OUTPUT: &str = "response reported success without output";

/// Largest response body accepted (base64 artifacts can be large).
const MAX_RESPONSE_BYTES: u64 = 64 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub name: String,
    pub console: String,
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildResult {
    pub success: bool,
    pub message: String,
    /// Encoded artifact; empty unless `success`.
    pub output: String,
    pub tasks: Vec<Task>,
}

#[derive(Deserialize)]
struct RawResponse {
    #[serde(default)]
    success: Value,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    output: Value,
    tasks: Vec<RawTask>,
}

#[derive(Deserialize)]
struct RawTask {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    console: Option<String>,
    #[serde(default)]
    success: Value,
}

fn is_true(value: &Value) -> bool {
    *value == Value::Bool(true)
}

pub fn parse_response(body: &str) -> Result<BuildResult, BuildError> {
    let raw: RawResponse = serde_json::from_str(body)
        .map_err(|e| BuildError::Transport(format!("malformed response body: {}", e)))?;

    let success = is_true(&raw.success);
    let output = match (success, raw.output) {
        (true, Value::String(s)) if !s.is_empty() => s,
        (true, _) => return Err(BuildError::Transport(MISSING_OUTPUT.to_string())),
        (false, _) => String::new(),
    };
    let tasks = raw
        .tasks
        .into_iter()
        .map(|t| Task {
            name: t.name.unwrap_or_default(),
            console: t.console.unwrap_or_default(),
            success: is_true(&t.success),
        })
        .collect();

    Ok(BuildResult {
        success,
        message: raw.message.unwrap_or_default(),
        output,
        tasks,
    })
}

/// Seam between the coordinator and the compile service.
pub trait BuildService: Sync {
    fn submit(&self, request: &BuildRequest<'_>) -> Result<BuildResult, BuildError>;

    /// Endpoint requests go to, when one is configured.
    fn endpoint(&self) -> Option<&str> {
        None
    }
}

pub struct RemoteBuildClient {
    endpoint: Option<String>,
    agent: ureq::Agent,
}

impl RemoteBuildClient {
    /// `timeout` of `None` waits indefinitely.
    pub fn new(endpoint: Option<String>, timeout: Option<Duration>) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(timeout)
            .build()
            .into();
        Self { endpoint, agent }
    }

    pub fn build_url(endpoint: &str) -> String {
        format!("{}{}", endpoint.trim_end_matches('/'), BUILD_PATH)
    }
}

impl BuildService for RemoteBuildClient {
    fn submit(&self, request: &BuildRequest<'_>) -> Result<BuildResult, BuildError> {
        let endpoint = self.endpoint.as_deref().ok_or_else(|| {
            BuildError::Configuration(format!(
                "Environment variable {} is not set",
                crate::config::HOST_ENV
            ))
        })?;
        let body = request.to_json()?;

        let mut response = self
            .agent
            .post(&Self::build_url(endpoint))
            .header("Content-Type", "application/json")
            .send(body.as_str())
            .map_err(|e| match e {
                ureq::Error::StatusCode(code) => {
                    BuildError::Transport(format!("compile service returned HTTP {}", code))
                }
                other => BuildError::Transport(other.to_string()),
            })?;

        let text = response
            .body_mut()
            .with_config()
            .limit(MAX_RESPONSE_BYTES)
            .read_to_string()
            .map_err(|e| BuildError::Transport(format!("failed to read response: {}", e)))?;

        parse_response(&text)
    }

    fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }
}
