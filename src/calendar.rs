use crate::color::Rgba;
use crate::model::{MonthlyEvent, Task};
use chrono::{Datelike, Months, NaiveDate, Weekday};

pub const DEFAULT_WEEK_START: Weekday = Weekday::Mon;

/// Display caps for a single calendar cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellLimits {
    pub tasks: usize,
    pub events: usize,
}

impl Default for CellLimits {
    fn default() -> Self {
        CellLimits {
            tasks: 5,
            events: 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CalendarCell<'a> {
    pub date: NaiveDate,
    /// False for the leading days borrowed from the previous month.
    pub in_month: bool,
    /// Open tasks of the day, capped for display.
    pub tasks: Vec<&'a Task>,
    pub open_task_count: usize,
    /// Events covering the day, capped for display.
    pub events: Vec<&'a MonthlyEvent>,
    pub event_count: usize,
    /// Color of the first covering event; `None` renders transparent.
    pub highlight: Option<Rgba>,
}

#[derive(Debug, Clone)]
pub struct MonthView<'a> {
    pub reference: NaiveDate,
    pub week_start: Weekday,
    pub cells: Vec<CalendarCell<'a>>,
}

/// Number of previous-month days needed so the first cell lands on
/// `week_start`. Always in `0..=6`.
pub fn leading_days(month_start: NaiveDate, week_start: Weekday) -> u32 {
    let weekday = month_start.weekday().num_days_from_sunday();
    let first = week_start.num_days_from_sunday();
    (weekday + 7 - first) % 7
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn last_of_month(date: NaiveDate) -> NaiveDate {
    first_of_month(date)
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

/// Dates shown for the month of `reference`: leading days from the previous
/// month, then every day of the month. No trailing padding.
pub fn month_grid(reference: NaiveDate, week_start: Weekday) -> Vec<NaiveDate> {
    let month_start = first_of_month(reference);
    let month_end = last_of_month(reference);
    let offset = leading_days(month_start, week_start) as u64;
    let grid_start = month_start
        .checked_sub_days(chrono::Days::new(offset))
        .unwrap_or(month_start);
    grid_start
        .iter_days()
        .take_while(|d| *d <= month_end)
        .collect()
}

/// Moves `date` by whole months, clamping the day to the target month's
/// length (Jan 31 + 1 month is the last day of February).
pub fn shift_month(date: NaiveDate, months: i32) -> NaiveDate {
    let shifted = if months >= 0 {
        date.checked_add_months(Months::new(months as u32))
    } else {
        date.checked_sub_months(Months::new(months.unsigned_abs()))
    };
    shifted.unwrap_or(date)
}

/// Weekday symbols starting at `week_start`.
pub fn weekday_symbols(week_start: Weekday) -> [&'static str; 7] {
    let mut symbols = [""; 7];
    let mut day = week_start;
    for slot in symbols.iter_mut() {
        *slot = short_symbol(day);
        day = day.succ();
    }
    symbols
}

pub fn month_title(date: NaiveDate) -> String {
    date.format("%B %Y").to_string()
}

pub fn open_tasks_on<'a>(tasks: &'a [Task], day: NaiveDate) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|t| !t.is_completed && t.day() == day)
        .collect()
}

pub fn events_on<'a>(events: &'a [MonthlyEvent], day: NaiveDate) -> Vec<&'a MonthlyEvent> {
    events.iter().filter(|e| e.covers(day)).collect()
}

impl<'a> CalendarCell<'a> {
    pub fn build(
        date: NaiveDate,
        in_month: bool,
        tasks: &'a [Task],
        events: &'a [MonthlyEvent],
        limits: CellLimits,
    ) -> Self {
        let mut day_tasks = open_tasks_on(tasks, date);
        let mut day_events = events_on(events, date);
        let open_task_count = day_tasks.len();
        let event_count = day_events.len();
        let highlight = day_events.first().map(|e| e.color());
        day_tasks.truncate(limits.tasks);
        day_events.truncate(limits.events);
        CalendarCell {
            date,
            in_month,
            tasks: day_tasks,
            open_task_count,
            events: day_events,
            event_count,
            highlight,
        }
    }

    /// Concatenated emojis of the displayed tasks.
    pub fn task_emojis(&self) -> String {
        self.tasks.iter().map(|t| t.display_emoji()).collect()
    }
}

impl<'a> MonthView<'a> {
    pub fn build(
        reference: NaiveDate,
        week_start: Weekday,
        tasks: &'a [Task],
        events: &'a [MonthlyEvent],
        limits: CellLimits,
    ) -> Self {
        let month = (reference.year(), reference.month());
        let cells = month_grid(reference, week_start)
            .into_iter()
            .map(|date| {
                let in_month = (date.year(), date.month()) == month;
                if in_month {
                    CalendarCell::build(date, true, tasks, events, limits)
                } else {
                    CalendarCell::build(date, false, &[], &[], limits)
                }
            })
            .collect();
        MonthView {
            reference,
            week_start,
            cells,
        }
    }

    pub fn title(&self) -> String {
        month_title(self.reference)
    }

    pub fn cell(&self, date: NaiveDate) -> Option<&CalendarCell<'a>> {
        self.cells.iter().find(|c| c.date == date)
    }

    /// Cells grouped into rows of seven; the last row may be short.
    pub fn weeks(&self) -> impl Iterator<Item = &[CalendarCell<'a>]> {
        self.cells.chunks(7)
    }
}

fn short_symbol(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::*;
    use proptest::prelude::*;

    #[test]
    fn month_starting_on_week_start_has_no_lead() {
        // June 2026 starts on a Monday
        let grid = month_grid(day(2026, 6, 17), Weekday::Mon);
        assert_eq!(grid[0], day(2026, 6, 1));
        assert_eq!(grid.len(), 30);
    }

    #[test]
    fn lead_days_come_from_previous_month_in_order() {
        // October 2026 starts on a Thursday: Mon 28, Tue 29, Wed 30 September
        let grid = month_grid(day(2026, 10, 19), Weekday::Mon);
        assert_eq!(
            &grid[..4],
            &[day(2026, 9, 28), day(2026, 9, 29), day(2026, 9, 30), day(2026, 10, 1)]
        );
        assert_eq!(grid.len(), 3 + 31);
        assert_eq!(*grid.last().unwrap(), day(2026, 10, 31));
    }

    #[test]
    fn sunday_start_month_needs_six_leading_days_for_monday_weeks() {
        // March 2026 starts on a Sunday
        assert_eq!(leading_days(day(2026, 3, 1), Weekday::Mon), 6);
        assert_eq!(leading_days(day(2026, 3, 1), Weekday::Sun), 0);
    }

    #[test]
    fn lead_crosses_year_boundary() {
        // January 2027 starts on a Friday
        let grid = month_grid(day(2027, 1, 1), Weekday::Mon);
        assert_eq!(grid[0], day(2026, 12, 28));
        assert_eq!(grid[4], day(2027, 1, 1));
    }

    #[test]
    fn month_shift_clamps_day_of_month() {
        assert_eq!(shift_month(day(2026, 1, 31), 1), day(2026, 2, 28));
        assert_eq!(shift_month(day(2028, 1, 31), 1), day(2028, 2, 29));
        assert_eq!(shift_month(day(2026, 3, 31), -1), day(2026, 2, 28));
        assert_eq!(shift_month(day(2026, 12, 15), 1), day(2027, 1, 15));
        assert_eq!(shift_month(day(2026, 1, 15), -1), day(2025, 12, 15));
    }

    #[test]
    fn symbols_rotate_to_week_start() {
        assert_eq!(weekday_symbols(Weekday::Mon)[0], "Mon");
        assert_eq!(weekday_symbols(Weekday::Mon)[6], "Sun");
        assert_eq!(weekday_symbols(Weekday::Sun)[0], "Sun");
        assert_eq!(weekday_symbols(Weekday::Sun)[1], "Mon");
    }

    #[test]
    fn month_title_is_long_form() {
        assert_eq!(month_title(day(2026, 10, 19)), "October 2026");
    }

    #[test]
    fn cell_counts_all_open_tasks_but_shows_five() {
        let d = day(2026, 4, 8);
        let mut tasks: Vec<Task> = (0..7).map(|i| task(&format!("t{}", i), at(d, 9))).collect();
        tasks[0].is_completed = true;
        tasks.push(task("other day", at(day(2026, 4, 9), 9)));
        let cell = CalendarCell::build(d, true, &tasks, &[], CellLimits::default());
        assert_eq!(cell.open_task_count, 6);
        assert_eq!(cell.tasks.len(), 5);
        assert!(cell.tasks.iter().all(|t| !t.is_completed));
        assert_eq!(cell.task_emojis(), "📝📝📝📝📝");
    }

    #[test]
    fn cell_shows_three_events_and_takes_first_color() {
        let d = day(2026, 4, 8);
        let events = vec![
            event("a", "ff0000", day(2026, 4, 1), day(2026, 4, 8)),
            event("b", "00ff00", day(2026, 4, 8), day(2026, 4, 20)),
            event("c", "0000ff", day(2026, 4, 5), day(2026, 4, 10)),
            event("d", "ffffff", day(2026, 4, 8), day(2026, 4, 8)),
            event("e", "000000", day(2026, 4, 9), day(2026, 4, 10)),
        ];
        let cell = CalendarCell::build(d, true, &[], &events, CellLimits::default());
        assert_eq!(cell.event_count, 4);
        assert_eq!(cell.events.len(), 3);
        assert_eq!(cell.highlight.map(|c| c.bytes()), Some((0xFF, 0, 0)));
    }

    #[test]
    fn cell_without_events_is_transparent() {
        let cell = CalendarCell::build(day(2026, 4, 8), true, &[], &[], CellLimits::default());
        assert!(cell.highlight.is_none());
        assert_eq!(cell.event_count, 0);
    }

    #[test]
    fn event_boundaries_are_inclusive_regardless_of_time() {
        let start = day(2026, 9, 10);
        let end = day(2026, 9, 12);
        let e = MonthlyEvent::new("x", None, None, at(start, 23), at(end, 0)).unwrap();
        let events = [e];
        assert_eq!(events_on(&events, start).len(), 1);
        assert_eq!(events_on(&events, end).len(), 1);
        assert!(events_on(&events, day(2026, 9, 9)).is_empty());
        assert!(events_on(&events, day(2026, 9, 13)).is_empty());
    }

    #[test]
    fn leading_cells_carry_no_annotations() {
        let lead_day = day(2026, 9, 29);
        let tasks = vec![task("gym", at(lead_day, 9))];
        let events = vec![event("x", "ff0000", lead_day, day(2026, 10, 2))];
        let view = MonthView::build(
            day(2026, 10, 1),
            Weekday::Mon,
            &tasks,
            &events,
            CellLimits::default(),
        );
        let lead = view.cell(lead_day).unwrap();
        assert!(!lead.in_month);
        assert_eq!(lead.open_task_count, 0);
        assert!(lead.highlight.is_none());
        let inside = view.cell(day(2026, 10, 2)).unwrap();
        assert!(inside.in_month);
        assert_eq!(inside.event_count, 1);
        assert_eq!(view.title(), "October 2026");
        assert_eq!(view.weeks().count(), 5);
    }

    proptest! {
        #[test]
        fn leading_count_matches_weekday_offset(
            year in 1970i32..2100,
            month in 1u32..=12,
            start in 0u32..7
        ) {
            let week_start = Weekday::try_from(start as u8).unwrap();
            let first = NaiveDate::from_ymd_opt(year, month, 1).unwrap();
            let lead = leading_days(first, week_start);
            prop_assert!(lead <= 6);
            if first.weekday() == week_start {
                prop_assert_eq!(lead, 0);
            }
            let expected = (first.weekday().num_days_from_sunday() + 7
                - week_start.num_days_from_sunday()) % 7;
            prop_assert_eq!(lead, expected);

            let grid = month_grid(first, week_start);
            prop_assert_eq!(grid[0].weekday(), week_start);
            prop_assert_eq!(grid.len() as u32, lead + last_of_month(first).day());
        }

        #[test]
        fn in_month_cells_stay_inside_month(
            year in 1970i32..2100,
            month in 1u32..=12,
            d in 1u32..=28
        ) {
            let reference = NaiveDate::from_ymd_opt(year, month, d).unwrap();
            let first = first_of_month(reference);
            let last = last_of_month(reference);
            let grid = month_grid(reference, Weekday::Mon);
            let lead = leading_days(first, Weekday::Mon) as usize;
            for date in &grid[lead..] {
                prop_assert!(*date >= first && *date <= last);
            }
            for date in &grid[..lead] {
                prop_assert!(*date < first);
            }
        }
    }
}
