mod calendar;
mod cli;
mod color;
mod commands;
mod config;
mod emoji;
mod model;
mod planner;
mod storage;
mod stores;
mod timer;
mod ui;

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "moodplanner=info";
const LOG_FILE: &str = "moodplanner.log";

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let command = args.command.unwrap_or(cli::Command::Tui);
    let config = config::Config::load(args.config.as_deref())?;

    match command {
        cli::Command::Focus(focus) => {
            init_stderr_logging();
            commands::focus(focus)
        }
        cli::Command::Tui => {
            let location = storage::locate_data(args.data_dir, config.data_dir.clone())?;
            let _guard = init_file_logging(&location.dir);
            let planner = planner::Planner::open_at(location, &config);
            commands::tui(planner)
        }
        command => {
            init_stderr_logging();
            let mut planner = planner::Planner::open(args.data_dir, &config)?;
            match command {
                cli::Command::Task(task) => commands::task(&mut planner, task),
                cli::Command::Event(event) => commands::event(&mut planner, event),
                cli::Command::Mood(mood) => commands::mood(&mut planner, mood),
                cli::Command::Calendar { month } => commands::calendar(&planner, month),
                cli::Command::Focus(_) | cli::Command::Tui => Ok(()),
            }
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn init_stderr_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// The terminal belongs to the TUI, so logs go to a file in the data dir.
/// Returns `None` when the directory cannot be created; logging is then off.
fn init_file_logging(dir: &Path) -> Option<WorkerGuard> {
    if let Err(err) = std::fs::create_dir_all(dir) {
        eprintln!("log directory {} unavailable: {}", dir.display(), err);
        return None;
    }
    let appender = tracing_appender::rolling::never(dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .with_ansi(false)
        .try_init();
    Some(guard)
}
