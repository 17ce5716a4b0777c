//! todotracker CLI entry point

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tracing::{error, info, warn};

use todotracker::cli::{Cli, get_log_path};
use todotracker::config::Config;
use todotracker::display::{render_failure, render_plan, render_summary};
use todotracker::github::create_tracker;
use todotracker::llm::create_client;
use todotracker::orchestrator::{Orchestrator, RunSummary};
use todotracker::prompts::PromptLoader;

/// Exit status after Ctrl-C
const EXIT_INTERRUPTED: u8 = 130;

/// Pick the log level: --verbose, then --log-level, then config, then INFO
fn log_level(cli: &Cli, config: &Config) -> tracing::Level {
    if cli.verbose {
        return tracing::Level::DEBUG;
    }
    match cli.log_level.as_deref().or(config.log_level.as_deref()) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            eprintln!("{} unknown log level '{}', using info", "warning:".yellow(), raw);
            tracing::Level::INFO
        }),
        None => tracing::Level::INFO,
    }
}

fn setup_logging(level: tracing::Level) -> Result<()> {
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Setup tracing subscriber - write to log file, not stdout/stderr
    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {})", level);
    Ok(())
}

fn write_summary(path: &Path, summary: &RunSummary) -> Result<()> {
    let json = summary.to_json().context("Failed to serialize run summary")?;
    fs::write(path, json).context(format!("Failed to write run summary to {}", path.display()))?;
    info!(path = %path.display(), "Run summary written");
    Ok(())
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    setup_logging(log_level(&cli, &config)).context("Failed to setup logging")?;

    let description = cli.description()?;
    let resolved = config.resolve(&cli.overrides(), |var| std::env::var(var).ok())?;
    info!(repo = %cli.repo, model = %resolved.llm.model, dry_run = cli.dry_run, "todotracker starting");

    let llm = create_client(&resolved.llm).context("Failed to create AI client")?;
    let tracker = create_tracker(&resolved.github).context("Failed to create GitHub client")?;
    let prompts = PromptLoader::new(std::env::current_dir().context("Failed to read working directory")?);
    let mut orchestrator = Orchestrator::new(resolved, llm, tracker, prompts);

    println!("{} {}", "Analyzing project with".bold(), "AI...".bold());

    if cli.dry_run {
        return match orchestrator.plan(&description).await {
            Ok(planned) => {
                print!("{}", render_plan(&planned));
                println!("{}", "Dry run: nothing was created on GitHub.".dimmed());
                Ok(ExitCode::SUCCESS)
            }
            Err(failure) => {
                error!(%failure, "Dry run failed");
                eprint!("{}", render_failure(&failure));
                Ok(ExitCode::FAILURE)
            }
        };
    }

    match orchestrator.run(&cli.repo, &description).await {
        Ok(summary) => {
            print!("{}", render_summary(&summary, !cli.no_board));
            if let Some(path) = &cli.output {
                write_summary(path, &summary)?;
                println!("{} {}", "Results saved to".green(), path.display());
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(failure) => {
            error!(%failure, "Run failed");
            eprint!("{}", render_failure(&failure));
            Ok(ExitCode::FAILURE)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // .env values fill in anything the shell did not set
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    tokio::select! {
        result = run(cli) => match result {
            Ok(code) => code,
            Err(e) => {
                error!("{:#}", e);
                eprintln!("{} {:#}", "error:".red().bold(), e);
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted by user");
            eprintln!("\n{}", "Operation cancelled by user".yellow());
            ExitCode::from(EXIT_INTERRUPTED)
        }
    }
}
