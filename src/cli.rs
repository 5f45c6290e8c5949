use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "moodplanner",
    version,
    about = "Tasks, events, a mood journal and a focus timer in the terminal"
)]
pub struct Cli {
    /// Directory holding the planner data (overrides the config file)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
    /// Path to a config.yml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage tasks
    #[command(subcommand)]
    Task(TaskCommand),
    /// Manage multi-day events
    #[command(subcommand)]
    Event(EventCommand),
    /// Record and review daily moods
    #[command(subcommand)]
    Mood(MoodCommand),
    /// Print a month calendar
    Calendar {
        /// Month to show (YYYY-MM, defaults to the current month)
        #[arg(long)]
        month: Option<String>,
    },
    /// Run a focus countdown in the foreground
    Focus(FocusArgs),
    /// Launch the interactive TUI
    Tui,
}

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// Add a task
    Add {
        /// Task title
        title: String,
        /// Day (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
        /// Time of day (HH:MM, defaults to now)
        #[arg(long)]
        time: Option<String>,
        /// Emoji shown instead of the inferred one
        #[arg(long)]
        emoji: Option<String>,
    },
    /// List tasks
    List {
        /// Only tasks on this day (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
    },
    /// Edit a task
    Edit {
        /// Task id
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New day (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
        /// New time of day (HH:MM)
        #[arg(long)]
        time: Option<String>,
        /// New custom emoji
        #[arg(long)]
        emoji: Option<String>,
        /// Drop the custom emoji
        #[arg(long)]
        clear_emoji: bool,
    },
    /// Toggle a task between open and completed
    Done {
        /// Task id
        id: String,
    },
    /// Delete a task
    Rm {
        /// Task id
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum EventCommand {
    /// Add an event spanning one or more days
    Add {
        /// Event name
        name: String,
        /// First day (YYYY-MM-DD)
        #[arg(long)]
        start: String,
        /// Last day (YYYY-MM-DD, defaults to the start day)
        #[arg(long)]
        end: Option<String>,
        /// Color as hex, e.g. ff8800
        #[arg(long)]
        color: Option<String>,
        /// Emoji for the event
        #[arg(long)]
        emoji: Option<String>,
    },
    /// List events starting in a month
    List {
        /// Month (YYYY-MM, defaults to the current month)
        #[arg(long)]
        month: Option<String>,
        /// List every event instead
        #[arg(long)]
        all: bool,
    },
    /// Edit an event
    Edit {
        /// Event id
        id: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New first day (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,
        /// New last day (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,
        /// New color (hex)
        #[arg(long)]
        color: Option<String>,
        /// New emoji
        #[arg(long)]
        emoji: Option<String>,
        /// Drop the emoji
        #[arg(long)]
        clear_emoji: bool,
    },
    /// Delete an event
    Rm {
        /// Event id
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum MoodCommand {
    /// Record the mood of a day
    Set {
        /// happy, sad, stressed, excited, tired, neutral or none
        mood: String,
        /// Day (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
        /// Journal note for the day
        #[arg(long)]
        note: Option<String>,
    },
    /// Write the journal note of a day, keeping its mood
    Note {
        /// Note text
        text: String,
        /// Day (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Show the mood and note of a day
    Show {
        /// Day (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Print the year in pixels
    Year {
        /// Year (defaults to the current year)
        #[arg(long)]
        year: Option<i32>,
    },
}

#[derive(Args, Debug)]
pub struct FocusArgs {
    #[arg(long, default_value_t = 0)]
    pub hours: u32,
    #[arg(long, default_value_t = 25)]
    pub minutes: u32,
    #[arg(long, default_value_t = 0)]
    pub seconds: u32,
}
