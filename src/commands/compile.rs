//! Compile command handler
//!
//! Handles `hooks-build compile-c <in_path> [out_dir] [--headers DIR]`.
//! A directory input builds every `.c` file under it in parallel; a file
//! input builds that one unit.

use anyhow::{Context, Result};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};

use crate::build::{Coordinator, RemoteBuildClient, Scanner};
use crate::config;
use crate::error::BuildError;

pub struct CompileArgs<'a> {
    pub in_path: &'a str,
    pub out_dir: &'a str,
    pub headers: Option<&'a str>,
    pub host: Option<&'a str>,
    pub verbose: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub enum InputMode {
    Directory(PathBuf),
    File(PathBuf),
}

/// Validate paths and decide the build mode. Creates the output directory.
pub fn prepare(in_path: &str, out_dir: &str, headers: Option<&str>) -> Result<InputMode, BuildError> {
    if in_path.is_empty() {
        return Err(BuildError::InvalidInput("Input path is required.".to_string()));
    }
    if out_dir.is_empty() {
        return Err(BuildError::InvalidInput(
            "Output directory path is required.".to_string(),
        ));
    }

    let out = Path::new(out_dir);
    match fs::metadata(out) {
        Ok(meta) if !meta.is_dir() => {
            return Err(BuildError::InvalidInput(
                "Output path must be a directory.".to_string(),
            ));
        }
        Ok(_) => {}
        Err(_) => {
            fs::create_dir_all(out).map_err(|e| BuildError::io(out, e))?;
            println!("{} Created directory: {}", "✓".green(), out.display());
        }
    }

    if let Some(headers) = headers {
        let path = Path::new(headers);
        let meta = fs::metadata(path).map_err(|e| BuildError::io(path, e))?;
        if !meta.is_dir() {
            return Err(BuildError::InvalidInput(
                "headers path must be a directory.".to_string(),
            ));
        }
    }

    let input = PathBuf::from(in_path);
    let meta = fs::metadata(&input).map_err(|e| BuildError::io(&input, e))?;
    Ok(if meta.is_dir() {
        InputMode::Directory(input)
    } else {
        InputMode::File(input)
    })
}

pub fn compile_c(args: &CompileArgs<'_>, project_dir: &Path) -> Result<()> {
    let cfg = config::load_config(project_dir)?;
    let mode = prepare(args.in_path, args.out_dir, args.headers)?;

    let endpoint = config::endpoint_from_env(args.host, &cfg).map(|(host, _)| host);
    let client = RemoteBuildClient::new(endpoint, cfg.compile.timeout());
    let scanner = Scanner::new(cfg.compile.excluded_dirs(), &cfg.compile.options);
    let coordinator = Coordinator::new(scanner, client).verbose(args.verbose);

    let out_dir = Path::new(args.out_dir);
    let headers = args.headers.map(Path::new);

    match mode {
        InputMode::Directory(root) => coordinator
            .build(&root, out_dir, headers)
            .with_context(|| format!("Error building wasm in {}", root.display())),
        InputMode::File(file) => coordinator
            .build_one(&file, out_dir, headers)
            .map(|_| ())
            .with_context(|| format!("Error building wasm for {}", file.display())),
    }
}
