//! Command-line host for the Updraft update checker.

mod app;
mod console;
mod error;
mod logging;
mod settings;
mod single_instance;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use updraft_core::{CheckOutcome, SchedulerKind};
use updraft_platform::AppPaths;

use crate::app::App;
use crate::error::AppError;
use crate::settings::AppSettings;

/// Checks an appcast feed for newer releases of the host application.
#[derive(Parser)]
#[command(name = "updraft", version)]
#[command(about = "Decide whether a newer, applicable release exists", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Keep settings, log and lock file under this directory
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    /// Build version of the host application to compare against
    #[arg(long, global = true, default_value = env!("CARGO_PKG_VERSION"))]
    build_version: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one silent background check
    Check,

    /// Run one user-initiated check that reports every outcome
    CheckUi,

    /// Check periodically until interrupted
    Watch,

    /// Stop offering a version in background checks
    Skip { version: String },

    /// Turn automatic checks on
    Enable,

    /// Turn automatic checks off
    Disable,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let interactive = matches!(cli.command, Commands::CheckUi);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            log::error!("{error}");
            if should_print(interactive, &error) {
                eprintln!("error: {error}");
            }
            ExitCode::FAILURE
        }
    }
}

fn logging_warning(installed: bool, log_file: &Path) -> Option<String> {
    (!installed).then(|| {
        format!(
            "warning: could not open log file {}, continuing without logs",
            log_file.display()
        )
    })
}

/// Interactive checks already show their failure through the error callback.
fn should_print(interactive: bool, error: &AppError) -> bool {
    !(interactive && matches!(error, AppError::UpdateCheckFailed { .. }))
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let paths = match cli.home {
        Some(root) => AppPaths::rooted(root),
        None => AppPaths::new()
            .map_err(|error| AppError::startup_failed("resolve application paths", error))?,
    };
    paths
        .ensure_dirs()
        .map_err(|error| AppError::startup_failed("create application directories", error))?;

    let settings = AppSettings::load(&paths.settings_file());
    let logging_ready = logging::init_logging(
        &paths.log_file(),
        cli.verbose || settings.debug_logging,
        settings.max_log_size_bytes,
    );
    if let Some(warning) = logging_warning(logging_ready, &paths.log_file()) {
        eprintln!("{warning}");
    }
    log::debug!("Using settings file {}", paths.settings_file().display());

    let app = App::new(paths, &cli.build_version);
    match cli.command {
        Commands::Check => report(app.check_once(SchedulerKind::OneShot).await?),
        Commands::CheckUi => report(app.check_once(SchedulerKind::Manual).await?),
        Commands::Watch => app.watch().await?,
        Commands::Skip { version } => app.skip(&version)?,
        Commands::Enable => app.set_enabled(true)?,
        Commands::Disable => app.set_enabled(false)?,
    }
    Ok(())
}

fn report(outcome: CheckOutcome) {
    match outcome {
        CheckOutcome::SkippedByUser(candidate) => {
            log::info!("Version {} is skipped by the user", candidate.version);
        }
        other => log::debug!("Check finished: {other:?}"),
    }
}
