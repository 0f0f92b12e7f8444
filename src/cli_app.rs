//! Top-level CLI definition and dispatch.

use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use colored::{Colorize, control};
use thiserror::Error;

use monika_backup::backup::frequency::Frequency;
use monika_backup::backup::orchestrator::BackupOrchestrator;
use monika_backup::core::config::{Config, Locale};
use monika_backup::core::errors::MbkError;
use monika_backup::daemon::loop_main::{
    ScheduleArgs, Scheduler, StopReason, TerminalPrompt,
};
use monika_backup::daemon::signals::SignalHandler;
use monika_backup::platform::pal::detect_platform;

/// Monika backup — scheduled save-data backups for Monika After Story.
#[derive(Debug, Parser)]
#[command(
    name = "mbk",
    author,
    version,
    about = "Monika After Story save-data backup scheduler",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Run the backup schedule until stopped.
    Run(RunArgs),
    /// Take a single backup right now and exit.
    Once,
}

#[derive(Debug, Clone, Args)]
struct RunArgs {
    /// Backup interval: `<number>m` for minutes or `<number>h` for hours.
    #[arg(long, default_value = "30m", value_name = "INTERVAL")]
    freq: String,
    /// Stop after this many scheduled backups (unlimited when omitted).
    #[arg(long, value_name = "N")]
    max_backups: Option<u64>,
    /// Take one backup before the first wait. It does not count toward
    /// the `--max-backups` limit.
    #[arg(long)]
    immediate: bool,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input: bad frequency token, bad config, unusable host.
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) => 2,
        }
    }
}

impl From<MbkError> for CliError {
    fn from(err: MbkError) -> Self {
        if err.is_cycle_recoverable() {
            Self::Runtime(err.to_string())
        } else {
            Self::User(err.to_string())
        }
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color || !io::stdout().is_terminal() {
        control::set_override(false);
    }

    let config = Config::load(cli.config.as_deref())?;

    match &cli.command {
        Command::Run(args) => run_schedule(&config, args),
        Command::Once => run_once(&config),
    }
}

fn run_schedule(config: &Config, args: &RunArgs) -> Result<(), CliError> {
    let frequency = Frequency::parse(&args.freq)?;
    let platform = detect_platform()?;
    let orchestrator = BackupOrchestrator::new(platform, config)?;

    print_banner(config.locale, orchestrator.source_dir(), frequency);

    let signals = SignalHandler::new();
    let schedule = ScheduleArgs {
        frequency,
        max_backups: args.max_backups,
        immediate: args.immediate,
    };
    let mut scheduler = Scheduler::new(orchestrator, signals, schedule);
    let mut prompt = TerminalPrompt::new(config.locale);

    match scheduler.run(&mut prompt) {
        StopReason::LimitReached => {
            println!("{}", "backup limit reached, all done".green());
        }
        StopReason::Cancelled => {
            println!("{}", "backup schedule stopped".yellow());
        }
    }
    Ok(())
}

fn run_once(config: &Config) -> Result<(), CliError> {
    let platform = detect_platform()?;
    let orchestrator = BackupOrchestrator::new(platform, config)?;

    let outcome = orchestrator.run_cycle(0);
    match outcome.result {
        Ok(archive) => {
            println!("{} {}", "backup written:".green(), archive.display());
            Ok(())
        }
        Err(err) => Err(CliError::Runtime(err.to_string())),
    }
}

fn print_banner(locale: Locale, source: &Path, frequency: Frequency) {
    let title = format!("mbk v{}", env!("CARGO_PKG_VERSION"));
    println!("{}", title.bright_green().bold());
    match locale {
        Locale::En => {
            println!("{}", "unofficial fan tool, not affiliated with Team Salvato".dimmed());
            println!("watching over: {}", source.display());
        }
        Locale::Zh => {
            println!("{}", "非官方工具，与 Team Salvato 无关".dimmed());
            println!("正在守护: {}", source.display());
        }
    }
    println!("schedule: every {frequency}");
}
