use crate::color::{Rgba, DEFAULT_EVENT_HEX};
use crate::emoji::{emoji_for_title, DEFAULT_EVENT_EMOJI};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type EntityId = String;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: EntityId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_emoji: Option<String>,
    #[serde(default)]
    pub is_completed: bool,
    pub date: DateTime<Utc>,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyEvent {
    pub id: EntityId,
    pub name: String,
    pub color_hex: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PixelDay {
    pub id: EntityId,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub mood: MoodType,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum MoodType {
    Happy,
    Sad,
    Stressed,
    Excited,
    Tired,
    Neutral,
    #[default]
    None,
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum PlannerError {
    #[error("task not found: {0}")]
    TaskNotFound(String),
    #[error("event not found: {0}")]
    EventNotFound(String),
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("event starts on {start} but ends on {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
    #[error("unknown mood: {0} (expected happy, sad, stressed, excited, tired, neutral or none)")]
    UnknownMood(String),
    #[error("invalid date (use YYYY-MM-DD): {0}")]
    InvalidDate(String),
    #[error("invalid time (use HH:MM): {0}")]
    InvalidTime(String),
    #[error("invalid month (use YYYY-MM): {0}")]
    InvalidMonth(String),
}

impl Task {
    pub fn new(
        title: impl Into<String>,
        date: DateTime<Utc>,
        custom_emoji: Option<String>,
    ) -> Result<Self, PlannerError> {
        let title = require_text(title.into())?;
        Ok(Task {
            id: generate_id(),
            title,
            custom_emoji,
            is_completed: false,
            date,
            time: Utc::now(),
        })
    }

    /// Custom emoji when one is set, otherwise inferred from the title.
    pub fn display_emoji(&self) -> &str {
        match self.custom_emoji.as_deref() {
            Some(emoji) if !emoji.is_empty() => emoji,
            _ => emoji_for_title(&self.title),
        }
    }

    pub fn day(&self) -> NaiveDate {
        local_day(&self.date)
    }
}

impl MonthlyEvent {
    pub fn new(
        name: impl Into<String>,
        color_hex: Option<String>,
        emoji: Option<String>,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Result<Self, PlannerError> {
        let name = require_text(name.into())?;
        check_range(&start_date, &end_date)?;
        Ok(MonthlyEvent {
            id: generate_id(),
            name,
            color_hex: color_hex.unwrap_or_else(|| DEFAULT_EVENT_HEX.to_string()),
            emoji,
            start_date,
            end_date,
        })
    }

    pub fn color(&self) -> Rgba {
        Rgba::from_hex(&self.color_hex)
    }

    pub fn display_emoji(&self) -> &str {
        self.emoji.as_deref().unwrap_or(DEFAULT_EVENT_EMOJI)
    }

    pub fn start_day(&self) -> NaiveDate {
        local_day(&self.start_date)
    }

    pub fn end_day(&self) -> NaiveDate {
        local_day(&self.end_date)
    }

    /// Inclusive at both ends; time of day is ignored.
    pub fn covers(&self, day: NaiveDate) -> bool {
        day >= self.start_day() && day <= self.end_day()
    }

    pub fn validate(&self) -> Result<(), PlannerError> {
        if self.name.trim().is_empty() {
            return Err(PlannerError::EmptyTitle);
        }
        check_range(&self.start_date, &self.end_date)
    }
}

impl PixelDay {
    pub fn blank(day: NaiveDate) -> Self {
        PixelDay {
            id: generate_id(),
            date: start_of_day(day),
            mood: MoodType::None,
            note: String::new(),
        }
    }

    pub fn day(&self) -> NaiveDate {
        local_day(&self.date)
    }
}

impl MoodType {
    pub const ALL: [MoodType; 7] = [
        MoodType::Happy,
        MoodType::Sad,
        MoodType::Stressed,
        MoodType::Excited,
        MoodType::Tired,
        MoodType::Neutral,
        MoodType::None,
    ];

    pub fn emoji(&self) -> &'static str {
        match self {
            MoodType::Happy => "😊",
            MoodType::Sad => "😢",
            MoodType::Stressed => "😣",
            MoodType::Excited => "😆",
            MoodType::Tired => "🥱",
            MoodType::Neutral => "🙂",
            MoodType::None => "?",
        }
    }

    pub fn color(&self) -> Rgba {
        match self {
            MoodType::Happy => Rgba::opaque(1.0, 0.8, 0.0),
            MoodType::Sad => Rgba::opaque(0.0, 0.478, 1.0),
            MoodType::Stressed => Rgba::opaque(1.0, 0.231, 0.188),
            MoodType::Excited => Rgba::opaque(1.0, 0.584, 0.0),
            MoodType::Tired => Rgba::opaque(0.557, 0.557, 0.576),
            MoodType::Neutral => Rgba::opaque(0.204, 0.78, 0.349),
            MoodType::None => Rgba::new(0.557, 0.557, 0.576, 0.1),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MoodType::Happy => "Happy",
            MoodType::Sad => "Sad",
            MoodType::Stressed => "Stressed",
            MoodType::Excited => "Excited",
            MoodType::Tired => "Tired",
            MoodType::Neutral => "Neutral",
            MoodType::None => "Not set",
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            MoodType::Happy => "happy",
            MoodType::Sad => "sad",
            MoodType::Stressed => "stressed",
            MoodType::Excited => "excited",
            MoodType::Tired => "tired",
            MoodType::Neutral => "neutral",
            MoodType::None => "none",
        }
    }

    /// Moods a user can pick; `None` only marks an unrecorded day.
    pub fn legend() -> impl Iterator<Item = MoodType> {
        MoodType::ALL.into_iter().filter(|m| *m != MoodType::None)
    }
}

impl fmt::Display for MoodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for MoodType {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        MoodType::ALL
            .into_iter()
            .find(|m| m.tag() == wanted)
            .ok_or_else(|| PlannerError::UnknownMood(s.to_string()))
    }
}

/// Calendar day of a stored instant in the local time zone.
pub fn local_day(instant: &DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&Local).date_naive()
}

/// Local midnight of `day` as a UTC instant.
pub fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    local_instant(day.and_time(NaiveTime::MIN))
}

/// Interprets a wall-clock time in the local zone. Times skipped by a DST
/// jump resolve to the same wall time read as UTC.
pub fn local_instant(naive: NaiveDateTime) -> DateTime<Utc> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

pub fn parse_day(input: &str) -> Result<NaiveDate, PlannerError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| PlannerError::InvalidDate(input.to_string()))
}

pub fn parse_time(input: &str) -> Result<NaiveTime, PlannerError> {
    NaiveTime::parse_from_str(input.trim(), "%H:%M")
        .map_err(|_| PlannerError::InvalidTime(input.to_string()))
}

/// Parses `YYYY-MM` into the first day of that month.
pub fn parse_month(input: &str) -> Result<NaiveDate, PlannerError> {
    NaiveDate::parse_from_str(&format!("{}-01", input.trim()), "%Y-%m-%d")
        .map_err(|_| PlannerError::InvalidMonth(input.to_string()))
}

pub fn generate_id() -> EntityId {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(10)
        .map(char::from)
        .collect()
}

fn require_text(value: String) -> Result<String, PlannerError> {
    if value.trim().is_empty() {
        return Err(PlannerError::EmptyTitle);
    }
    Ok(value)
}

fn check_range(start: &DateTime<Utc>, end: &DateTime<Utc>) -> Result<(), PlannerError> {
    let (start, end) = (local_day(start), local_day(end));
    if start > end {
        return Err(PlannerError::InvalidRange { start, end });
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn task_serializes_with_camel_case_fields() {
        let mut t = task("Gym", at(day(2026, 3, 2), 7));
        t.custom_emoji = Some("🔥".into());
        let json = serde_json::to_value(&t).unwrap();
        assert!(json.get("customEmoji").is_some());
        assert_eq!(json["isCompleted"], false);
        assert!(json.get("date").is_some());
        assert!(json.get("time").is_some());
    }

    #[test]
    fn task_without_emoji_omits_field_and_reads_back() {
        let t = task("Read", at(day(2026, 3, 2), 7));
        let json = serde_json::to_string(&t).unwrap();
        assert!(!json.contains("customEmoji"));
        let back: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn event_serializes_with_camel_case_fields() {
        let e = event("Trip", "ff0000", day(2026, 5, 1), day(2026, 5, 3));
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["colorHex"], "ff0000");
        assert!(json.get("startDate").is_some());
        assert!(json.get("endDate").is_some());
    }

    #[test]
    fn mood_serializes_as_lowercase_tag() {
        let mut p = PixelDay::blank(day(2026, 1, 1));
        p.mood = MoodType::Stressed;
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["mood"], "stressed");
        let none = PixelDay::blank(day(2026, 1, 2));
        assert_eq!(serde_json::to_value(&none).unwrap()["mood"], "none");
    }

    #[test]
    fn custom_emoji_overrides_inference_unless_empty() {
        let mut t = task("study maths", at(day(2026, 1, 5), 9));
        assert_eq!(t.display_emoji(), "📚");
        t.custom_emoji = Some("🧮".into());
        assert_eq!(t.display_emoji(), "🧮");
        t.custom_emoji = Some(String::new());
        assert_eq!(t.display_emoji(), "📚");
    }

    #[test]
    fn empty_titles_are_rejected() {
        let err = Task::new("   ", Utc::now(), None).unwrap_err();
        assert_eq!(err, PlannerError::EmptyTitle);
        let err = MonthlyEvent::new("", None, None, Utc::now(), Utc::now()).unwrap_err();
        assert_eq!(err, PlannerError::EmptyTitle);
    }

    #[test]
    fn reversed_event_range_is_rejected() {
        let err = MonthlyEvent::new(
            "Backwards",
            None,
            None,
            at(day(2026, 4, 10), 9),
            at(day(2026, 4, 9), 9),
        )
        .unwrap_err();
        assert!(matches!(err, PlannerError::InvalidRange { .. }));
    }

    #[test]
    fn same_day_range_with_earlier_end_time_is_allowed() {
        let e = MonthlyEvent::new(
            "Evening",
            None,
            None,
            at(day(2026, 4, 10), 20),
            at(day(2026, 4, 10), 8),
        );
        assert!(e.is_ok());
    }

    #[test]
    fn event_without_color_uses_grey() {
        let e = MonthlyEvent::new("x", None, None, Utc::now(), Utc::now()).unwrap();
        assert_eq!(e.color_hex, DEFAULT_EVENT_HEX);
        assert_eq!(e.display_emoji(), DEFAULT_EVENT_EMOJI);
    }

    #[test]
    fn coverage_includes_both_boundary_days() {
        let e = event("Conf", "00ff00", day(2026, 6, 10), day(2026, 6, 12));
        assert!(!e.covers(day(2026, 6, 9)));
        assert!(e.covers(day(2026, 6, 10)));
        assert!(e.covers(day(2026, 6, 11)));
        assert!(e.covers(day(2026, 6, 12)));
        assert!(!e.covers(day(2026, 6, 13)));
    }

    #[test]
    fn moods_parse_from_tags() {
        assert_eq!("Happy".parse::<MoodType>(), Ok(MoodType::Happy));
        assert_eq!(" none ".parse::<MoodType>(), Ok(MoodType::None));
        assert!(matches!(
            "grumpy".parse::<MoodType>(),
            Err(PlannerError::UnknownMood(_))
        ));
    }

    #[test]
    fn legend_skips_unset_mood() {
        let legend: Vec<_> = MoodType::legend().collect();
        assert_eq!(legend.len(), 6);
        assert!(!legend.contains(&MoodType::None));
        assert_eq!(MoodType::None.label(), "Not set");
        assert!(MoodType::None.color().alpha < 1.0);
    }

    #[test]
    fn blank_day_is_stored_at_local_midnight() {
        let d = day(2026, 7, 14);
        let p = PixelDay::blank(d);
        assert_eq!(p.day(), d);
        assert_eq!(p.mood, MoodType::None);
        assert!(p.note.is_empty());
    }

    #[test]
    fn month_input_parses_to_first_day() {
        assert_eq!(parse_month("2026-02").unwrap(), day(2026, 2, 1));
        assert!(parse_month("2026-13").is_err());
        assert!(parse_day("2026/02/01").is_err());
        assert!(parse_time("09:30").is_ok());
        assert!(parse_time("25:00").is_err());
    }
}
