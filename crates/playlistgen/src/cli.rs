//! Command-line front end.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, CommandFactory, Parser, ValueEnum};
use clap_complete::Shell;

use crate::app::pipeline::{self, EmitOutcome, PipelineRequest, RunReport};
use crate::infra::config::Config;
use crate::infra::logging::LogLevel;

/// How the run report is printed on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum ReportFormat {
    /// One-line summary.
    Text,
    /// Full report as JSON.
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "playlistgen",
    author,
    version,
    about = "Write a test playlist of the Gherkin scenarios that use a given step",
    long_about = None
)]
pub struct Cli {
    /// Step text to look for; matched as a case-sensitive substring
    #[arg(
        short,
        long,
        value_name = "TEXT",
        allow_hyphen_values = true,
        required_unless_present = "completions"
    )]
    pub step: Option<String>,

    /// Folder scanned recursively for feature files
    #[arg(short, long, value_name = "DIR", required_unless_present = "completions")]
    pub features: Option<PathBuf>,

    /// Playlist file to write; its directory must exist
    #[arg(short, long, value_name = "FILE", required_unless_present = "completions")]
    pub output: Option<PathBuf>,

    /// Namespace prepended to every scenario name
    #[arg(long, value_name = "NS")]
    pub namespace: Option<String>,

    /// Feature file extension (default: feature)
    #[arg(long, value_name = "EXT")]
    pub extension: Option<String>,

    /// Extra configuration file layered over user and workspace config
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Treat background steps as part of every scenario
    #[arg(long)]
    pub include_background: bool,

    /// Parse files one at a time instead of in parallel
    #[arg(long)]
    pub sequential: bool,

    /// Report format printed on stdout
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub report: ReportFormat,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Print shell completions and exit
    #[arg(long, value_enum, value_name = "SHELL", exclusive = true)]
    pub completions: Option<Shell>,
}

impl Cli {
    pub fn log_level(&self) -> LogLevel {
        LogLevel::from_flags(self.quiet, self.verbose)
    }

    fn apply_overrides(&self, config: &mut Config) {
        if let Some(extension) = &self.extension {
            config.scan.set_extension(extension.clone());
        }
        if let Some(namespace) = &self.namespace {
            config.naming.root_namespace = Some(namespace.clone());
        }
        if self.include_background {
            config.selection.set_include_background(true);
        }
        if self.sequential {
            config.scan.set_parallel(false);
        }
    }
}

/// Run the parsed command line and map the outcome onto an exit code.
pub fn execute(cli: Cli) -> Result<ExitCode> {
    if let Some(shell) = cli.completions {
        let mut command = Cli::command();
        clap_complete::generate(shell, &mut command, "playlistgen", &mut io::stdout());
        return Ok(ExitCode::SUCCESS);
    }

    let mut config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    cli.apply_overrides(&mut config);

    let request = PipelineRequest {
        root: cli.features.clone().context("--features is required")?,
        step_text: cli.step.clone().context("--step is required")?,
        destination: cli.output.clone().context("--output is required")?,
    };

    let report = pipeline::run(config, &request)?;
    print_report(&report, cli.report)?;

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_report(report: &RunReport, format: ReportFormat) -> Result<()> {
    if format == ReportFormat::Json {
        let json =
            serde_json::to_string_pretty(report).context("failed to serialize run report")?;
        println!("{json}");
    }

    match &report.outcome {
        EmitOutcome::Written { path } => {
            if format == ReportFormat::Text {
                println!("Test playlist generated successfully at: {}", path.display());
                println!(
                    "{} scenario(s) matched in {} file(s), {} file(s) skipped",
                    report.scenarios_matched,
                    report.files_discovered,
                    report.skipped.len()
                );
            }
        }
        EmitOutcome::Failed { reason } => {
            eprintln!("Error generating test playlist: {reason}");
        }
    }
    Ok(())
}
