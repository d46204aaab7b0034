use super::assembler::{BuildRequest, assemble};
use super::client::BuildService;
use super::resolver::{Decoder, WasmDecoder, resolve};
use super::scanner::{Scanner, SourceFile};
use crate::error::BuildError;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Terminal state of one dispatched unit.
#[derive(Debug)]
pub enum UnitOutcome {
    Built(PathBuf),
    Failed(BuildError),
}

impl UnitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, UnitOutcome::Built(_))
    }
}

/// Outcome of every unit in a directory build, keyed by artifact base name.
#[derive(Debug, Default)]
pub struct BatchReport {
    outcomes: BTreeMap<String, UnitOutcome>,
    /// Base names in scan order.
    order: Vec<String>,
}

impl BatchReport {
    fn push(&mut self, base_name: String, outcome: UnitOutcome) {
        self.order.push(base_name.clone());
        self.outcomes.insert(base_name, outcome);
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn get(&self, base_name: &str) -> Option<&UnitOutcome> {
        self.outcomes.get(base_name)
    }

    pub fn outcomes(&self) -> &BTreeMap<String, UnitOutcome> {
        &self.outcomes
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.values().filter(|o| !o.is_success()).count()
    }

    /// First failing unit in scan order.
    pub fn first_failure(&self) -> Option<(&str, &BuildError)> {
        self.order.iter().find_map(|name| match self.outcomes.get(name) {
            Some(UnitOutcome::Failed(err)) => Some((name.as_str(), err)),
            _ => None,
        })
    }

    /// `Ok` when every unit built, otherwise the first failure.
    pub fn into_result(mut self) -> Result<(), BuildError> {
        let first = self.first_failure().map(|(name, _)| name.to_string());
        match first.and_then(|name| self.outcomes.remove(&name)) {
            Some(UnitOutcome::Failed(err)) => Err(err),
            _ => Ok(()),
        }
    }
}

/// Runs scan -> assemble -> submit -> resolve for a directory or a single file.
pub struct Coordinator<S, D = WasmDecoder> {
    scanner: Scanner,
    service: S,
    decoder: D,
    verbose: bool,
}

impl<S: BuildService> Coordinator<S> {
    pub fn new(scanner: Scanner, service: S) -> Self {
        Self::with_decoder(scanner, service, WasmDecoder)
    }
}

impl<S: BuildService, D: Decoder> Coordinator<S, D> {
    pub fn with_decoder(scanner: Scanner, service: S, decoder: D) -> Self {
        Self {
            scanner,
            service,
            decoder,
            verbose: false,
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Directory mode. Fails with the first unit failure once all units settle.
    pub fn build(&self, root: &Path, out_dir: &Path, headers: Option<&Path>) -> Result<(), BuildError> {
        self.dispatch(root, out_dir, headers)?.into_result()
    }

    /// Directory mode, returning every unit's outcome. Scan errors and base
    /// name collisions fail before anything is sent.
    pub fn dispatch(
        &self,
        root: &Path,
        out_dir: &Path,
        headers: Option<&Path>,
    ) -> Result<BatchReport, BuildError> {
        let start_time = Instant::now();

        let units: Vec<SourceFile> = self
            .scanner
            .scan(root)?
            .into_iter()
            .filter(SourceFile::is_unit)
            .collect();
        let header_set = self.scanner.scan_headers(headers)?;

        if units.is_empty() {
            println!("{} No source files found.", "!".yellow());
            return Ok(BatchReport::default());
        }
        check_unique_names(&units)?;

        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .progress_chars("#>-");
        let pb = ProgressBar::new(units.len() as u64);
        pb.set_style(style);
        pb.set_message("Building...");

        // Every unit runs to its own terminal state; nothing short-circuits.
        let results: Vec<(String, UnitOutcome)> = units
            .par_iter()
            .map(|unit| {
                let request = assemble(unit, &header_set);
                let base_name = request.base_name().to_string();
                pb.set_message(format!("Building {}", unit.name));

                let outcome = match self.run(&request, out_dir) {
                    Ok(artifact) => UnitOutcome::Built(artifact),
                    Err(e) => {
                        let line = failure_line(&unit.path, &e);
                        // A hidden bar swallows println.
                        if pb.is_hidden() {
                            eprintln!("{}", line);
                        } else {
                            pb.println(line);
                        }
                        UnitOutcome::Failed(e)
                    }
                };
                pb.inc(1);
                (base_name, outcome)
            })
            .collect();

        pb.finish_and_clear();

        let mut report = BatchReport::default();
        for (base_name, outcome) in results {
            report.push(base_name, outcome);
        }

        let failed = report.failed_count();
        if failed == 0 {
            println!(
                "{} Built {} unit(s) in {:.2?}",
                "✓".green(),
                report.len(),
                start_time.elapsed()
            );
        } else {
            println!(
                "{} {} of {} unit(s) failed ({:.2?})",
                "x".red(),
                failed,
                report.len(),
                start_time.elapsed()
            );
        }
        Ok(report)
    }

    /// Single-file mode.
    pub fn build_one(
        &self,
        file: &Path,
        out_dir: &Path,
        headers: Option<&Path>,
    ) -> Result<PathBuf, BuildError> {
        let unit = self.scanner.load_unit(file)?;
        require_base_name(&unit)?;
        let header_set = self.scanner.scan_headers(headers)?;
        let artifact = self
            .run(&assemble(&unit, &header_set), out_dir)
            .inspect_err(|e| {
                if let BuildError::BuildFailed { console, .. } = e {
                    eprintln!("{}", console);
                }
            })?;
        println!("{} Built {}", "✓".green(), artifact.display());
        Ok(artifact)
    }

    fn run(&self, request: &BuildRequest<'_>, out_dir: &Path) -> Result<PathBuf, BuildError> {
        if self.verbose {
            println!(
                "   {} {} ({} header(s)) -> {}",
                "→".cyan(),
                request.unit().name,
                request.headers.len(),
                self.service.endpoint().unwrap_or("<no endpoint>")
            );
        }
        let result = self.service.submit(request)?;
        resolve(result, out_dir, request.base_name(), &self.decoder)
    }
}

/// Error line for a failed unit, followed by the compiler output when there is any.
fn failure_line(path: &Path, err: &BuildError) -> String {
    let line = format!("{} Error building {}: {}", "x".red(), path.display(), err);
    match err {
        BuildError::BuildFailed { console, .. } if !console.is_empty() => {
            format!("{}\n{}", line, console)
        }
        _ => line,
    }
}

/// A name starting with `.c` (e.g. `.cfoo.c`) leaves nothing to name the outputs.
fn require_base_name(unit: &SourceFile) -> Result<&str, BuildError> {
    let base = super::assembler::artifact_base_name(&unit.name);
    if base.is_empty() {
        return Err(BuildError::InvalidInput(format!(
            "{} has an empty artifact name - rename it",
            unit.path.display()
        )));
    }
    Ok(base)
}

/// Two units with the same base name would write the same output file.
fn check_unique_names(units: &[SourceFile]) -> Result<(), BuildError> {
    let mut seen: HashMap<&str, &Path> = HashMap::new();
    for unit in units {
        let base = require_base_name(unit)?;
        if let Some(previous) = seen.insert(base, &unit.path) {
            return Err(BuildError::InvalidInput(format!(
                "{} and {} both produce '{}' - rename one of them",
                previous.display(),
                unit.path.display(),
                base
            )));
        }
    }
    Ok(())
}
