use crate::calendar::{weekday_symbols, MonthView};
use crate::color::normalize_hex;
use crate::cli::{EventCommand, FocusArgs, MoodCommand, TaskCommand};
use crate::model::{
    local_instant, parse_day, parse_month, parse_time, start_of_day, MonthlyEvent, MoodType,
    Task,
};
use crate::planner::Planner;
use crate::timer::FocusTimer;
use crate::ui;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveTime, Timelike, Utc};
use std::fmt::Write as _;
use std::io::{stdout, Write};
use std::thread;
use std::time::{Duration, Instant};

pub fn task(planner: &mut Planner, command: TaskCommand) -> Result<()> {
    match command {
        TaskCommand::Add {
            title,
            date,
            time,
            emoji,
        } => {
            let when = parse_when(date.as_deref(), time.as_deref(), None)?;
            let task = Task::new(title, when, emoji)?;
            let id = task.id.clone();
            planner.tasks.add(task);
            println!("Added task {}", id);
        }
        TaskCommand::List { date } => {
            let filter = date.as_deref().map(parse_day).transpose()?;
            let mut tasks: Vec<&Task> = match filter {
                Some(day) => planner.tasks.on_day(day),
                None => planner.tasks.all().iter().collect(),
            };
            tasks.sort_by_key(|t| t.date);
            if tasks.is_empty() {
                println!("(no tasks)");
            }
            for task in tasks {
                print_task(task);
            }
        }
        TaskCommand::Edit {
            id,
            title,
            date,
            time,
            emoji,
            clear_emoji,
        } => {
            let current = planner
                .tasks
                .get(&id)
                .map(|t| t.date)
                .with_context(|| format!("task {} not found", id))?;
            let new_date = if date.is_some() || time.is_some() {
                Some(parse_when(date.as_deref(), time.as_deref(), Some(current))?)
            } else {
                None
            };
            planner.tasks.update(&id, |task| {
                if let Some(t) = title {
                    task.title = t;
                }
                if let Some(d) = new_date {
                    task.date = d;
                }
                if clear_emoji {
                    task.custom_emoji = None;
                }
                if let Some(e) = emoji {
                    task.custom_emoji = Some(e);
                }
            })?;
            println!("Updated task {}", id);
        }
        TaskCommand::Done { id } => {
            let completed = planner.tasks.toggle_completion(&id)?;
            println!(
                "Task {} marked {}",
                id,
                if completed { "completed" } else { "open" }
            );
        }
        TaskCommand::Rm { id } => {
            let removed = planner.tasks.remove(&id)?;
            println!("Deleted task {} ({})", id, removed.title);
        }
    }
    Ok(())
}

pub fn event(planner: &mut Planner, command: EventCommand) -> Result<()> {
    match command {
        EventCommand::Add {
            name,
            start,
            end,
            color,
            emoji,
        } => {
            let start_day = parse_day(&start)?;
            let end_day = end.as_deref().map(parse_day).transpose()?.unwrap_or(start_day);
            let color = color.unwrap_or_else(|| planner.default_event_color.clone());
            let event = MonthlyEvent::new(
                name,
                Some(normalize_hex(&color)),
                emoji,
                start_of_day(start_day),
                start_of_day(end_day),
            )?;
            let id = event.id.clone();
            planner.events.add(event)?;
            println!("Added event {}", id);
        }
        EventCommand::List { month, all } => {
            let events: Vec<&MonthlyEvent> = if all {
                let mut events: Vec<_> = planner.events.all().iter().collect();
                events.sort_by_key(|e| e.start_date);
                events
            } else {
                planner.events.starting_in_month(month_or_current(month.as_deref())?)
            };
            if events.is_empty() {
                println!("(no events)");
            }
            for event in events {
                print_event(event);
            }
        }
        EventCommand::Edit {
            id,
            name,
            start,
            end,
            color,
            emoji,
            clear_emoji,
        } => {
            let start = start.as_deref().map(parse_day).transpose()?;
            let end = end.as_deref().map(parse_day).transpose()?;
            planner.events.update(&id, |event| {
                if let Some(n) = name {
                    event.name = n;
                }
                if let Some(d) = start {
                    event.start_date = start_of_day(d);
                }
                if let Some(d) = end {
                    event.end_date = start_of_day(d);
                }
                if let Some(c) = color {
                    event.color_hex = normalize_hex(&c);
                }
                if clear_emoji {
                    event.emoji = None;
                }
                if let Some(e) = emoji {
                    event.emoji = Some(e);
                }
            })?;
            println!("Updated event {}", id);
        }
        EventCommand::Rm { id } => {
            let removed = planner.events.remove(&id)?;
            println!("Deleted event {} ({})", id, removed.name);
        }
    }
    Ok(())
}

pub fn mood(planner: &mut Planner, command: MoodCommand) -> Result<()> {
    match command {
        MoodCommand::Set { mood, date, note } => {
            let mood: MoodType = mood.parse()?;
            let day = day_or_today(date.as_deref())?;
            match note {
                Some(note) => planner.moods.record(day, mood, note),
                None => planner.moods.set_mood(day, mood),
            }
            println!("{} {} {}", day, mood.emoji(), mood.label());
        }
        MoodCommand::Note { text, date } => {
            let day = day_or_today(date.as_deref())?;
            planner.moods.set_note(day, text);
            println!("Saved note for {}", day);
        }
        MoodCommand::Show { date } => {
            let day = day_or_today(date.as_deref())?;
            let entry = planner.moods.entry_for(day);
            println!("{}  mood: {} {}", day, entry.mood.emoji(), entry.mood.label());
            if entry.note.is_empty() {
                println!("  (no note)");
            } else {
                println!("  {}", entry.note);
            }
        }
        MoodCommand::Year { year } => {
            let year = year.unwrap_or_else(|| Local::now().year());
            print!("{}", render_year(planner, year));
        }
    }
    Ok(())
}

pub fn calendar(planner: &Planner, month: Option<String>) -> Result<()> {
    let reference = month_or_current(month.as_deref())?;
    let view = planner.month_view(reference);
    print!("{}", render_month(&view));
    let upcoming = planner.events.starting_in_month(reference);
    if !upcoming.is_empty() {
        println!();
        println!("Upcoming events");
        for event in upcoming {
            print_event(event);
        }
    }
    Ok(())
}

pub fn focus(args: FocusArgs) -> Result<()> {
    let mut timer = FocusTimer::new();
    if !timer.start(args.hours, args.minutes, args.seconds) {
        bail!("focus duration must be longer than zero");
    }
    let mut out = stdout();
    loop {
        let outcome = timer.advance(Instant::now());
        write!(
            out,
            "\r{}  {} {:<9} {:>3}%",
            timer.clock(),
            timer.stage().glyph(),
            timer.stage().label(),
            (timer.progress() * 100.0).round() as u32
        )?;
        out.flush()?;
        if outcome.finished || !timer.is_running() {
            break;
        }
        let wait = timer
            .until_next_tick(Instant::now())
            .unwrap_or(Duration::from_millis(200));
        thread::sleep(wait);
    }
    writeln!(out)?;
    println!("Focus session complete");
    Ok(())
}

pub fn tui(planner: Planner) -> Result<()> {
    ui::run(planner)
}

/// Text rendering of a month: a weekday header, one row per week, then the
/// annotated days.
pub fn render_month(view: &MonthView<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:^42}", view.title());
    let header: Vec<String> = weekday_symbols(view.week_start)
        .iter()
        .map(|s| format!("{:^6}", s))
        .collect();
    let _ = writeln!(out, "{}", header.join(""));
    for week in view.weeks() {
        let row: String = week
            .iter()
            .map(|cell| {
                if !cell.in_month {
                    return "      ".to_string();
                }
                let marker = if cell.event_count > 0 { '*' } else { ' ' };
                let count = match cell.open_task_count {
                    0 => "  ".to_string(),
                    n if n > 9 => "+9".to_string(),
                    n => format!("{:>2}", n),
                };
                format!("{:>2}{}{} ", cell.date.day(), marker, count)
            })
            .collect();
        let _ = writeln!(out, "{}", row.trim_end());
    }
    let busy: Vec<_> = view
        .cells
        .iter()
        .filter(|c| c.in_month && (c.open_task_count > 0 || c.event_count > 0))
        .collect();
    if !busy.is_empty() {
        let _ = writeln!(out);
    }
    for cell in busy {
        let mut line = format!("{}", cell.date.format("%a %d"));
        if cell.open_task_count > 0 {
            let _ = write!(line, "  {}", cell.task_emojis());
            if cell.open_task_count > cell.tasks.len() {
                let _ = write!(line, " +{}", cell.open_task_count - cell.tasks.len());
            }
        }
        for event in &cell.events {
            let _ = write!(line, "  {} {}", event.display_emoji(), event.name);
        }
        if cell.event_count > cell.events.len() {
            let _ = write!(line, " +{}", cell.event_count - cell.events.len());
        }
        let _ = writeln!(out, "{}", line);
    }
    out
}

pub fn render_year(planner: &Planner, year: i32) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Year in pixels {}", year);
    let _ = writeln!(out, "    J  F  M  A  M  J  J  A  S  O  N  D");
    for (idx, row) in planner.moods.year_grid(year).iter().enumerate() {
        let cells: String = row
            .iter()
            .map(|cell| match cell {
                None => "   ".to_string(),
                Some(MoodType::None) => " · ".to_string(),
                Some(mood) => format!("{} ", mood.emoji()),
            })
            .collect();
        let _ = writeln!(out, "{:>2} {}", idx + 1, cells.trim_end());
    }
    let legend: Vec<String> = MoodType::legend()
        .map(|m| format!("{} {}", m.emoji(), m.label()))
        .collect();
    let _ = writeln!(out, "{}", legend.join("  "));
    out
}

fn print_task(task: &Task) {
    let local = task.date.with_timezone(&Local);
    println!(
        "  [{}] {} {} {}  {}",
        if task.is_completed { "x" } else { " " },
        task.id,
        task.display_emoji(),
        task.title,
        local.format("%Y-%m-%d %H:%M")
    );
}

fn print_event(event: &MonthlyEvent) {
    println!(
        "  {} {} {}  {} → {}  #{}",
        event.id,
        event.display_emoji(),
        event.name,
        event.start_day(),
        event.end_day(),
        event.color_hex
    );
}

/// Builds an instant from optional day and time input. Missing parts come
/// from `base`, or from now.
fn parse_when(
    date: Option<&str>,
    time: Option<&str>,
    base: Option<DateTime<Utc>>,
) -> Result<DateTime<Utc>> {
    let base = base.unwrap_or_else(Utc::now).with_timezone(&Local);
    let day = match date {
        Some(raw) => parse_day(raw)?,
        None => base.date_naive(),
    };
    let time = match time {
        Some(raw) => parse_time(raw)?,
        None => NaiveTime::from_hms_opt(base.hour(), base.minute(), 0).unwrap_or(NaiveTime::MIN),
    };
    Ok(local_instant(day.and_time(time)))
}

fn day_or_today(input: Option<&str>) -> Result<NaiveDate> {
    match input {
        Some(raw) => Ok(parse_day(raw)?),
        None => Ok(Local::now().date_naive()),
    }
}

fn month_or_current(input: Option<&str>) -> Result<NaiveDate> {
    match input {
        Some(raw) => Ok(parse_month(raw)?),
        None => Ok(Local::now().date_naive()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::CellLimits;
    use crate::model::fixtures::{self as fx, at, day};
    use chrono::Weekday;

    #[test]
    fn month_rendering_shows_blank_lead_and_markers() {
        let tasks = vec![
            fx::task("gym", at(day(2026, 10, 5), 9)),
            fx::task("study", at(day(2026, 10, 5), 14)),
        ];
        let events = vec![fx::event("Trip", "ff0000", day(2026, 10, 20), day(2026, 10, 21))];
        let view = MonthView::build(
            day(2026, 10, 1),
            Weekday::Mon,
            &tasks,
            &events,
            CellLimits::default(),
        );
        let text = render_month(&view);
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].contains("October 2026"));
        assert!(lines[1].starts_with(" Mon "));
        // Thursday the 1st after three blank cells
        assert!(lines[2].starts_with(&format!("{}{}", " ".repeat(18), " 1")));
        assert!(text.contains(" 5  2"));
        assert!(text.contains("20* "));
        assert!(text.contains("Mon 05  🏋️📚"));
        assert!(text.contains("📌 Trip"));
    }

    #[test]
    fn hex_input_is_normalized() {
        assert_eq!(normalize_hex("#FF8800"), "ff8800");
        assert_eq!(normalize_hex("nonsense"), "000000");
    }

    #[test]
    fn when_defaults_missing_parts_from_base() {
        let base = at(day(2026, 3, 4), 15);
        let moved = parse_when(Some("2026-03-09"), None, Some(base)).unwrap();
        assert_eq!(crate::model::local_day(&moved), day(2026, 3, 9));
        assert_eq!(moved.with_timezone(&Local).hour(), 15);

        let retimed = parse_when(None, Some("08:30"), Some(base)).unwrap();
        let local = retimed.with_timezone(&Local);
        assert_eq!(local.date_naive(), day(2026, 3, 4));
        assert_eq!((local.hour(), local.minute()), (8, 30));

        assert!(parse_when(Some("March 9"), None, Some(base)).is_err());
    }
}
