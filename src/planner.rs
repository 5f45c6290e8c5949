use crate::calendar::{CellLimits, MonthView};
use crate::config::Config;
use crate::storage::{locate_data, DataLocation, FileBlobStore};
use crate::stores::{EventStore, MoodJournal, TaskStore};
use anyhow::Result;
use chrono::{NaiveDate, Weekday};
use std::path::PathBuf;

/// The three stores opened against one data directory, plus the settings
/// that shape how they are shown.
pub struct Planner {
    pub location: DataLocation,
    pub tasks: TaskStore,
    pub events: EventStore,
    pub moods: MoodJournal,
    pub week_start: Weekday,
    pub limits: CellLimits,
    pub default_event_color: String,
}

impl Planner {
    pub fn open(data_dir: Option<PathBuf>, config: &Config) -> Result<Self> {
        let location = locate_data(data_dir, config.data_dir.clone())?;
        Ok(Self::open_at(location, config))
    }

    /// Opens the stores in an already resolved location.
    pub fn open_at(location: DataLocation, config: &Config) -> Self {
        tracing::debug!(dir = %location.dir.display(), source = location.source.label(), "opening planner");
        let store = FileBlobStore::new(&location.dir);
        Planner {
            tasks: TaskStore::load(store.clone()),
            events: EventStore::load(store.clone()),
            moods: MoodJournal::load(store),
            location,
            week_start: config.week_start,
            limits: config.cell_limits(),
            default_event_color: config.default_event_color.clone(),
        }
    }

    pub fn month_view(&self, reference: NaiveDate) -> MonthView<'_> {
        MonthView::build(
            reference,
            self.week_start,
            self.tasks.all(),
            self.events.all(),
            self.limits,
        )
    }
}
