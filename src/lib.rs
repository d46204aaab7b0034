//! # hooks-build - Remote C-to-WebAssembly Build Client
//!
//! Discovers `.c` and `.h` files in a project tree, sends each compilation
//! unit (with the shared header set) to a remote compile service, and writes
//! either `<name>.wasm` or `<name>.log` per unit.
//!
//! ## Quick Start
//!
//! ```bash
//! export HOOKS_COMPILE_HOST=https://compile.example
//! hooks-build compile-c contracts build --headers contracts/include
//! ```
//!
//! ## Module Organization
//!
//! - [`build`] - Scanner, request assembly, remote client, result resolution, coordinator
//! - [`config`] - `hooks.toml` and endpoint resolution
//! - [`commands`] - CLI command handlers
//! - [`error`] - Error kinds shared by the pipeline

/// Build pipeline with parallel per-unit dispatch.
pub mod build;

/// CLI command handlers.
pub mod commands;

/// Configuration file parsing (`hooks.toml`).
pub mod config;

/// Pipeline error kinds.
pub mod error;

pub use error::BuildError;
