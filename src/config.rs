//! Configuration (`hooks.toml` + environment).
//!
//! The compile service base URL is resolved in this order:
//! `--host` flag, `HOOKS_COMPILE_HOST`, then `[compile] host` in `hooks.toml`.
//! A missing endpoint is not defaulted; the client reports it per unit.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILE: &str = "hooks.toml";
pub const HOST_ENV: &str = "HOOKS_COMPILE_HOST";

/// Directory names never descended into while scanning.
pub const EXCLUDED_DIRS: &[&str] = &["node_modules", ".git", ".vscode", ".idea", ".DS_Store"];

/// Compile options attached to every compilation unit.
pub const DEFAULT_OPTIONS: &str = "-O3";

#[derive(Deserialize, Debug, Default)]
pub struct HooksConfig {
    #[serde(default)]
    pub compile: CompileConfig,
}

#[derive(Deserialize, Debug)]
pub struct CompileConfig {
    pub host: Option<String>,
    /// Per-request timeout; `0` disables it.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_options")]
    pub options: String,
    /// Extra directory names to skip, on top of [`EXCLUDED_DIRS`].
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            host: None,
            timeout_secs: default_timeout_secs(),
            options: default_options(),
            exclude: Vec::new(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_options() -> String {
    DEFAULT_OPTIONS.to_string()
}

impl CompileConfig {
    pub fn timeout(&self) -> Option<Duration> {
        match self.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Full exclusion list: the fixed names first, then configured extras.
    pub fn excluded_dirs(&self) -> Vec<String> {
        let mut dirs: Vec<String> = EXCLUDED_DIRS.iter().map(|s| s.to_string()).collect();
        for extra in &self.exclude {
            if !dirs.contains(extra) {
                dirs.push(extra.clone());
            }
        }
        dirs
    }
}

/// Where the resolved endpoint came from, for `info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostSource {
    Flag,
    Env,
    File,
}

impl std::fmt::Display for HostSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostSource::Flag => write!(f, "--host"),
            HostSource::Env => write!(f, "{}", HOST_ENV),
            HostSource::File => write!(f, "{}", CONFIG_FILE),
        }
    }
}

/// Load `hooks.toml` from `dir`. A missing file yields the defaults.
pub fn load_config(dir: &Path) -> Result<HooksConfig> {
    let path = dir.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(HooksConfig::default());
    }
    let config_str = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {} - check file permissions", path.display()))?;
    parse_config(&config_str)
        .with_context(|| format!("Failed to parse {} - check for syntax errors", path.display()))
}

pub fn parse_config(content: &str) -> Result<HooksConfig> {
    Ok(toml::from_str(content)?)
}

/// Pick the first non-empty candidate, trimming a trailing `/`.
pub fn resolve_endpoint(
    flag: Option<&str>,
    env: Option<&str>,
    file: Option<&str>,
) -> Option<(String, HostSource)> {
    [
        (flag, HostSource::Flag),
        (env, HostSource::Env),
        (file, HostSource::File),
    ]
    .into_iter()
    .find_map(|(value, source)| {
        let value = value?.trim().trim_end_matches('/');
        (!value.is_empty()).then(|| (value.to_string(), source))
    })
}

/// Resolve the endpoint against the live environment.
pub fn endpoint_from_env(flag: Option<&str>, config: &HooksConfig) -> Option<(String, HostSource)> {
    let env = std::env::var(HOST_ENV).ok();
    resolve_endpoint(flag, env.as_deref(), config.compile.host.as_deref())
}
