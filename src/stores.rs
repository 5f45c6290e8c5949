use crate::model::{MonthlyEvent, MoodType, PixelDay, PlannerError, Task};
use crate::storage::{BlobStore, Collection, FileBlobStore};
use chrono::{Datelike, Local, NaiveDate};

pub const TASKS_KEY: &str = "SavedTasks";
pub const EVENTS_KEY: &str = "SavedMonthlyEvents";
pub const MOODS_KEY: &str = "pixel_days_storage";

pub struct TaskStore<S = FileBlobStore> {
    tasks: Collection<Task, S>,
}

impl<S: BlobStore> TaskStore<S> {
    pub fn load(store: S) -> Self {
        TaskStore {
            tasks: Collection::load(store, TASKS_KEY),
        }
    }

    pub fn all(&self) -> &[Task] {
        self.tasks.items()
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.all().iter().find(|t| t.id == id)
    }

    pub fn add(&mut self, task: Task) {
        tracing::info!(id = %task.id, "task added");
        self.tasks.mutate(|tasks| tasks.push(task));
    }

    /// Applies `edit` to a copy and stores it only if the title is still set.
    pub fn update<F>(&mut self, id: &str, edit: F) -> Result<(), PlannerError>
    where
        F: FnOnce(&mut Task),
    {
        let idx = self.index_of(id)?;
        let mut updated = self.all()[idx].clone();
        edit(&mut updated);
        if updated.title.trim().is_empty() {
            return Err(PlannerError::EmptyTitle);
        }
        self.tasks.mutate(|tasks| tasks[idx] = updated);
        Ok(())
    }

    /// Flips completion and returns the new state.
    pub fn toggle_completion(&mut self, id: &str) -> Result<bool, PlannerError> {
        let idx = self.index_of(id)?;
        Ok(self.tasks.mutate(|tasks| {
            tasks[idx].is_completed = !tasks[idx].is_completed;
            tasks[idx].is_completed
        }))
    }

    pub fn remove(&mut self, id: &str) -> Result<Task, PlannerError> {
        let idx = self.index_of(id)?;
        Ok(self.tasks.mutate(|tasks| tasks.remove(idx)))
    }

    /// Every task scheduled on `day`, completed ones included.
    pub fn on_day(&self, day: NaiveDate) -> Vec<&Task> {
        self.all().iter().filter(|t| t.day() == day).collect()
    }

    fn index_of(&self, id: &str) -> Result<usize, PlannerError> {
        self.all()
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| PlannerError::TaskNotFound(id.to_string()))
    }
}

pub struct EventStore<S = FileBlobStore> {
    events: Collection<MonthlyEvent, S>,
}

impl<S: BlobStore> EventStore<S> {
    pub fn load(store: S) -> Self {
        EventStore {
            events: Collection::load(store, EVENTS_KEY),
        }
    }

    pub fn all(&self) -> &[MonthlyEvent] {
        self.events.items()
    }

    pub fn get(&self, id: &str) -> Option<&MonthlyEvent> {
        self.all().iter().find(|e| e.id == id)
    }

    pub fn add(&mut self, event: MonthlyEvent) -> Result<(), PlannerError> {
        event.validate()?;
        tracing::info!(id = %event.id, "event added");
        self.events.mutate(|events| events.push(event));
        Ok(())
    }

    /// Edits are held to the same rules as creation.
    pub fn update<F>(&mut self, id: &str, edit: F) -> Result<(), PlannerError>
    where
        F: FnOnce(&mut MonthlyEvent),
    {
        let idx = self.index_of(id)?;
        let mut updated = self.all()[idx].clone();
        edit(&mut updated);
        updated.validate()?;
        self.events.mutate(|events| events[idx] = updated);
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Result<MonthlyEvent, PlannerError> {
        let idx = self.index_of(id)?;
        Ok(self.events.mutate(|events| events.remove(idx)))
    }

    /// Events starting in the month of `reference`, earliest first.
    pub fn starting_in_month(&self, reference: NaiveDate) -> Vec<&MonthlyEvent> {
        let mut events: Vec<&MonthlyEvent> = self
            .all()
            .iter()
            .filter(|e| {
                let start = e.start_day();
                start.year() == reference.year() && start.month() == reference.month()
            })
            .collect();
        events.sort_by_key(|e| e.start_date);
        events
    }

    fn index_of(&self, id: &str) -> Result<usize, PlannerError> {
        self.all()
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| PlannerError::EventNotFound(id.to_string()))
    }
}

pub struct MoodJournal<S = FileBlobStore> {
    days: Collection<PixelDay, S>,
}

impl<S: BlobStore> MoodJournal<S> {
    /// Loads stored days, seeding the current year when nothing usable is
    /// stored.
    pub fn load(store: S) -> Self {
        let year = Local::now().year();
        MoodJournal {
            days: Collection::load_or_else(store, MOODS_KEY, || seed_year(year)),
        }
    }

    pub fn all(&self) -> &[PixelDay] {
        self.days.items()
    }

    /// Stored entry for `day`, or an unrecorded one.
    pub fn entry_for(&self, day: NaiveDate) -> PixelDay {
        self.find(day)
            .cloned()
            .unwrap_or_else(|| PixelDay::blank(day))
    }

    pub fn mood_on(&self, day: NaiveDate) -> MoodType {
        self.find(day).map(|p| p.mood).unwrap_or_default()
    }

    /// Overwrites mood and note for `day`, appending an entry if the day was
    /// never stored.
    pub fn record(&mut self, day: NaiveDate, mood: MoodType, note: impl Into<String>) {
        let note = note.into();
        self.upsert(day, |entry| {
            entry.mood = mood;
            entry.note = note;
        });
    }

    pub fn set_mood(&mut self, day: NaiveDate, mood: MoodType) {
        self.upsert(day, |entry| entry.mood = mood);
    }

    pub fn set_note(&mut self, day: NaiveDate, note: impl Into<String>) {
        let note = note.into();
        self.upsert(day, |entry| entry.note = note);
    }

    /// Rows are days 1..=31, columns months 1..=12. Dates that do not exist
    /// (Feb 30, Apr 31, ...) are `None`.
    pub fn year_grid(&self, year: i32) -> Vec<[Option<MoodType>; 12]> {
        (1..=31)
            .map(|d| {
                let mut row = [None; 12];
                for (m, cell) in row.iter_mut().enumerate() {
                    *cell = NaiveDate::from_ymd_opt(year, m as u32 + 1, d)
                        .map(|date| self.mood_on(date));
                }
                row
            })
            .collect()
    }

    fn find(&self, day: NaiveDate) -> Option<&PixelDay> {
        self.all().iter().find(|p| p.day() == day)
    }

    fn upsert(&mut self, day: NaiveDate, edit: impl FnOnce(&mut PixelDay)) {
        let idx = self.all().iter().position(|p| p.day() == day);
        self.days.mutate(|days| match idx {
            Some(idx) => edit(&mut days[idx]),
            None => {
                let mut entry = PixelDay::blank(day);
                edit(&mut entry);
                days.push(entry);
            }
        });
        tracing::debug!(%day, "mood day updated");
    }
}

/// Every day of `year` with no mood and an empty note.
pub fn seed_year(year: i32) -> Vec<PixelDay> {
    let Some(first) = NaiveDate::from_ymd_opt(year, 1, 1) else {
        return Vec::new();
    };
    first
        .iter_days()
        .take_while(|d| d.year() == year)
        .map(PixelDay::blank)
        .collect()
}
