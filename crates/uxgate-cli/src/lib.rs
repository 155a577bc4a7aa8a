// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

mod commands;
mod config;
mod errors;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode as ProcessExitCode;

use clap::{error::ErrorKind, ArgAction, Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Generator, Shell};

pub use errors::{CliError, ExitCode, MachineError};
use errors::emit_error;
use logging::{init_tracing, LogFlags};

const UXGATE_HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{about-with-newline}
Usage: {usage}

Options:
{options}

Commands:
{subcommands}

{after-help}";

#[derive(Parser)]
#[command(name = "uxgate", version)]
#[command(about = "UX coverage gate: audits pages, buttons and workflows and decides GO or HOLD")]
#[command(help_template = UXGATE_HELP_TEMPLATE)]
#[command(
    after_help = "Environment:\n  UX_GATE_BASE_URL         Default target base URL\n  UX_GATE_WORKERS          Worker pool size\n  UX_GATE_PORTAL_SESSION   Portal SSO session fixture\n  UX_GATE_ADMIN_JWT        Admin bearer token fixture\n  UX_GATE_LOG_LEVEL        Log filter (falls back to RUST_LOG)\n  UX_GATE_LOG_JSON         1 for JSON log lines"
)]
struct Cli {
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    #[arg(long, global = true, default_value_t = false)]
    quiet: bool,
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[arg(long, global = true, default_value_t = false)]
    trace: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Clone)]
struct RegistryArgs {
    #[arg(long)]
    pages: PathBuf,
    #[arg(long)]
    buttons: PathBuf,
    #[arg(long)]
    workflows: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Audit every registry entry and write the coverage report.
    Run {
        #[command(flatten)]
        registry: RegistryArgs,
        #[arg(long)]
        base_url: Option<String>,
        #[arg(long)]
        policy: Option<PathBuf>,
        /// Replay script for the scripted driver instead of live HTTP.
        #[arg(long)]
        replay: Option<PathBuf>,
        #[arg(long, default_value = "artifacts/ux-gate")]
        out: PathBuf,
        #[arg(long)]
        workers: Option<u32>,
        #[arg(long)]
        run_id: Option<String>,
    },
    Registry {
        #[command(subcommand)]
        command: RegistryCommand,
    },
    /// Re-score a results or report JSON document.
    Score {
        #[arg(long)]
        results: PathBuf,
        #[arg(long)]
        policy: Option<PathBuf>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Redact PII from the arguments, or from stdin when none are given.
    Redact {
        #[arg(long)]
        policy: Option<PathBuf>,
        text: Vec<String>,
    },
    Policy {
        #[command(subcommand)]
        command: PolicyCommand,
    },
    Report {
        #[command(subcommand)]
        command: ReportCommand,
    },
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum RegistryCommand {
    Validate {
        #[command(flatten)]
        registry: RegistryArgs,
    },
    List {
        #[command(flatten)]
        registry: RegistryArgs,
    },
}

#[derive(Subcommand)]
enum PolicyCommand {
    /// Print the effective policy as canonical JSON.
    Print {
        #[arg(long)]
        policy: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ReportCommand {
    /// Print the JSON schema of the coverage report.
    Schema,
}

#[derive(Clone, Copy)]
pub(crate) struct OutputMode {
    pub json: bool,
}

pub fn main_entry() -> ProcessExitCode {
    let wants_json = std::env::args().any(|arg| arg == "--json");
    match run() {
        Ok(code) => ProcessExitCode::from(code as u8),
        Err(err) => {
            emit_error(&err, wants_json);
            ProcessExitCode::from(err.exit_code as u8)
        }
    }
}

fn run() -> Result<ExitCode, CliError> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{err}");
                return Ok(ExitCode::Success);
            }
            _ => {
                return Err(CliError {
                    exit_code: ExitCode::Usage,
                    machine: MachineError::new("usage_error", "invalid command line arguments")
                        .with_detail("error", &err.to_string()),
                });
            }
        },
    };
    let output_mode = OutputMode { json: cli.json };
    let command = cli
        .command
        .ok_or_else(|| CliError::usage("missing command; see --help"))?;
    init_tracing(LogFlags {
        quiet: cli.quiet,
        verbose: cli.verbose,
        trace: cli.trace,
    });

    match command {
        Commands::Run {
            registry,
            base_url,
            policy,
            replay,
            out,
            workers,
            run_id,
        } => commands::run_gate_command(
            commands::RunArgs {
                paths: registry.into_paths(),
                base_url,
                policy,
                replay,
                out,
                workers,
                run_id,
            },
            output_mode,
        ),
        Commands::Registry { command } => match command {
            RegistryCommand::Validate { registry } => {
                commands::validate_registry(&registry.into_paths(), output_mode)
            }
            RegistryCommand::List { registry } => {
                commands::list_registry(&registry.into_paths(), output_mode)
            }
        },
        Commands::Score {
            results,
            policy,
            out,
        } => commands::rescore(&results, policy.as_deref(), out.as_deref(), output_mode),
        Commands::Redact { policy, text } => {
            commands::redact_text(policy.as_deref(), &text, output_mode)
        }
        Commands::Policy { command } => match command {
            PolicyCommand::Print { policy } => commands::print_policy(policy.as_deref()),
        },
        Commands::Report { command } => match command {
            ReportCommand::Schema => commands::print_report_schema(),
        },
        Commands::Completion { shell } => {
            print_completion(shell);
            Ok(ExitCode::Success)
        }
    }
}

impl RegistryArgs {
    fn into_paths(self) -> uxgate_core::RegistryPaths {
        uxgate_core::RegistryPaths {
            pages: self.pages,
            buttons: self.buttons,
            workflows: self.workflows,
        }
    }
}

fn print_completion<G: Generator>(generator: G) {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    generate(generator, &mut command, name, &mut std::io::stdout());
}
