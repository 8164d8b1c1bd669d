//! End-to-end run: discover, parse, select, name, emit.

use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use rayon::prelude::*;
use serde::Serialize;

use crate::app::export::Exporter;
use crate::app::parse::{self, ParseOptions};
use crate::app::scan::{Scanner, ScannerConfig, SpecFile};
use crate::app::select;
use crate::domain::errors::PipelineError;
use crate::domain::model::FullyQualifiedName;
use crate::domain::naming::NameBuilder;
use crate::infra::config::Config;

/// Inputs for a single run.
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub root: PathBuf,
    pub step_text: String,
    pub destination: PathBuf,
}

/// Why a discovered file contributed nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "kind", content = "detail")]
pub enum SkipReason {
    NoDocument,
    ParseFailure(String),
    Unreadable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// A matched scenario whose name could not be built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OmittedScenario {
    pub path: PathBuf,
    pub scenario: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "status")]
pub enum EmitOutcome {
    Written { path: PathBuf },
    Failed { reason: String },
}

/// Summary of a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub root: PathBuf,
    pub step_text: String,
    pub files_discovered: usize,
    pub skipped: Vec<SkippedFile>,
    pub scenarios_matched: usize,
    pub omitted: Vec<OmittedScenario>,
    pub names: Vec<FullyQualifiedName>,
    pub outcome: EmitOutcome,
}

impl RunReport {
    fn new(request: &PipelineRequest, outcome: EmitOutcome) -> Self {
        Self {
            root: request.root.clone(),
            step_text: request.step_text.clone(),
            files_discovered: 0,
            skipped: Vec::new(),
            scenarios_matched: 0,
            omitted: Vec::new(),
            names: Vec::new(),
            outcome,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, EmitOutcome::Written { .. })
    }
}

/// What one file contributed.
#[derive(Debug)]
enum FileOutcome {
    Skipped(SkipReason),
    Processed {
        matched: usize,
        names: Vec<FullyQualifiedName>,
        omitted: Vec<OmittedScenario>,
    },
}

/// Drives the scanner, parser, selector, name builder and exporter.
pub struct Pipeline {
    config: Config,
    scanner: Scanner,
    exporter: Exporter,
}

impl Pipeline {
    pub fn new(config: Config) -> Result<Self> {
        Ok(Self {
            config,
            scanner: Scanner::new(),
            exporter: Exporter::new()?,
        })
    }

    /// Execute a run. Per-file and per-scenario problems are recorded in the report; only a
    /// missing root, a failed scan or a failed write mark the run as failed.
    pub fn run(&self, request: &PipelineRequest) -> RunReport {
        if !request.root.is_dir() {
            let err = PipelineError::RootNotFound {
                path: request.root.clone(),
            };
            tracing::error!(error = %err, "cannot scan feature folder");
            return RunReport::new(
                request,
                EmitOutcome::Failed {
                    reason: err.to_string(),
                },
            );
        }

        let scan_cfg = ScannerConfig::from_root(request.root.clone(), self.config.clone());
        let scanned = match self.scanner.scan(&scan_cfg) {
            Ok(scanned) => scanned,
            Err(err) => {
                tracing::error!(error = %format!("{err:#}"), "scan failed");
                return RunReport::new(
                    request,
                    EmitOutcome::Failed {
                        reason: format!("{err:#}"),
                    },
                );
            }
        };

        let namer = NameBuilder::new(&request.root)
            .with_namespace(self.config.naming.root_namespace.as_deref());
        let options = ParseOptions::from(&self.config.selection);
        let process = |file: &SpecFile| process_file(file, &request.step_text, options, &namer);

        // Indexed collect keeps discovery order whatever order the workers finish in.
        let outcomes: Vec<FileOutcome> = if self.config.scan.parallel() {
            scanned.files.par_iter().map(process).collect()
        } else {
            scanned.files.iter().map(process).collect()
        };

        let mut report = RunReport::new(
            request,
            EmitOutcome::Failed {
                reason: "playlist not written".into(),
            },
        );
        report.files_discovered = scanned.files.len();

        for (file, outcome) in scanned.files.iter().zip(outcomes) {
            match outcome {
                FileOutcome::Skipped(reason) => report.skipped.push(SkippedFile {
                    path: file.path.clone(),
                    reason,
                }),
                FileOutcome::Processed {
                    matched,
                    names,
                    omitted,
                } => {
                    report.scenarios_matched += matched;
                    report.names.extend(names);
                    report.omitted.extend(omitted);
                }
            }
        }

        report.outcome = match self.exporter.emit(&report.names, &request.destination) {
            Ok(()) => EmitOutcome::Written {
                path: request.destination.clone(),
            },
            Err(err) => {
                tracing::error!(error = %err, "failed to emit playlist");
                EmitOutcome::Failed {
                    reason: err.to_string(),
                }
            }
        };

        tracing::info!(
            files = report.files_discovered,
            skipped = report.skipped.len(),
            matched = report.scenarios_matched,
            written = report.names.len(),
            "run complete"
        );
        report
    }
}

fn process_file(
    file: &SpecFile,
    step_text: &str,
    options: ParseOptions,
    namer: &NameBuilder,
) -> FileOutcome {
    let contents = match fs::read_to_string(&file.path) {
        Ok(contents) => contents,
        Err(err) => {
            let err = PipelineError::ReadFailure {
                path: file.path.clone(),
                reason: err.to_string(),
            };
            tracing::warn!(error = %err, "skipping unreadable file");
            return FileOutcome::Skipped(SkipReason::Unreadable(err.to_string()));
        }
    };

    let document = match parse::parse(&file.path, &contents, options) {
        Ok(document) => document,
        Err(PipelineError::NoDocument) => {
            tracing::debug!(path = %file.display_path, "no feature declared, skipping");
            return FileOutcome::Skipped(SkipReason::NoDocument);
        }
        Err(err) => {
            tracing::warn!(error = %err, "skipping malformed file");
            return FileOutcome::Skipped(SkipReason::ParseFailure(err.to_string()));
        }
    };

    let selected = select::select(&document, step_text);
    tracing::debug!(
        path = %file.display_path,
        feature = %document.title,
        scenarios = document.scenarios.len(),
        matched = selected.len(),
        "processed feature"
    );

    let folder = file.folder();
    let mut built = Vec::with_capacity(selected.len());
    let mut omitted = Vec::new();
    for scenario in &selected {
        if let Some(step) = scenario.steps.iter().find(|step| step.text.contains(step_text)) {
            tracing::trace!(
                scenario = %scenario.title,
                keyword = %step.keyword,
                step = %step.text,
                "step matched"
            );
        }
        match namer.build(folder, &document.title, &scenario.title) {
            Ok(name) => built.push(name),
            Err(err) => {
                tracing::warn!(error = %err, scenario = %scenario.title, "omitting scenario");
                omitted.push(OmittedScenario {
                    path: file.path.clone(),
                    scenario: scenario.title.clone(),
                    reason: err.to_string(),
                });
            }
        }
    }

    FileOutcome::Processed {
        matched: selected.len(),
        names: built,
        omitted,
    }
}

/// Run with the given configuration, for callers that do not keep a [`Pipeline`] around.
pub fn run(config: Config, request: &PipelineRequest) -> Result<RunReport> {
    Ok(Pipeline::new(config)?.run(request))
}
