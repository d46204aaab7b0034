pub mod assembler;
pub mod client;
mod core;
mod feedback;
pub mod resolver;
pub mod scanner;

pub use assembler::{BuildRequest, OutputFormat, artifact_base_name, assemble};
pub use client::{BuildResult, BuildService, RemoteBuildClient, Task};
pub use self::core::{BatchReport, Coordinator, UnitOutcome};
pub use feedback::FeedbackAnalyzer;
pub use resolver::{Decoder, WasmDecoder, diagnostic, failure_log, resolve};
pub use scanner::{Scanner, SourceFile, SourceKind};
