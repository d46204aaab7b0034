//! Info command handler
//!
//! Handles `hooks-build info`: shows the configuration a build would use.

use anyhow::Result;
use colored::*;
use std::path::Path;

use crate::config;

pub fn run_info(project_dir: &Path, host_flag: Option<&str>) -> Result<()> {
    let cfg = config::load_config(project_dir)?;

    println!("{} Build configuration", "ℹ".blue());
    println!("-------------------------------");

    print!("Compile host... ");
    match config::endpoint_from_env(host_flag, &cfg) {
        Some((host, source)) => println!("{} (from {})", host.green(), source.to_string().cyan()),
        None => println!(
            "{}",
            format!("Not set (export {} or add [compile] host to {})", config::HOST_ENV, config::CONFIG_FILE).red()
        ),
    }

    match cfg.compile.timeout() {
        Some(timeout) => println!("Timeout... {}s", timeout.as_secs()),
        None => println!("Timeout... {}", "none".yellow()),
    }
    println!("Default options... {}", cfg.compile.options.yellow());
    println!("Excluded dirs... {}", cfg.compile.excluded_dirs().join(", "));

    Ok(())
}
