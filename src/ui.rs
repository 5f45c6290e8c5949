use crate::calendar::{shift_month, weekday_symbols, CalendarCell};
use crate::color::normalize_hex;
use crate::model::{
    local_day, local_instant, parse_day, parse_time, start_of_day, MonthlyEvent, MoodType,
    PlannerError, Task,
};
use crate::planner::Planner;
use crate::timer::{FocusTimer, GrowthStage, TimerPhase};
use anyhow::Result;
use chrono::{Datelike, Duration as ChronoDuration, Local, NaiveDate};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::{Alignment, Color, Modifier, Rect, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Terminal;
use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};

pub fn run(planner: Planner) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let mut app = App::new(planner);
    let result = app.event_loop(&mut terminal);
    teardown_terminal(&mut terminal)?;
    result
}

struct App {
    planner: Planner,
    cursor: NaiveDate,
    pane: Pane,
    task_idx: usize,
    event_idx: usize,
    pixel_cursor: NaiveDate,
    timer: FocusTimer,
    duration: DurationInput,
    status: String,
    mode: Mode,
    view: ViewMode,
}

enum Mode {
    Normal,
    Form(EntryForm),
    MoodEditor(MoodEditor),
    ConfirmDelete(DeleteTarget),
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum ViewMode {
    Calendar,
    Pixels,
    Focus,
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Pane {
    Days,
    Tasks,
    Events,
}

enum DeleteTarget {
    Task { id: String, title: String },
    Event { id: String, name: String },
}

#[derive(Clone, PartialEq, Eq)]
enum FormKind {
    NewTask,
    EditTask(String),
    NewEvent,
    EditEvent(String),
}

struct EntryForm {
    kind: FormKind,
    fields: Vec<(&'static str, FieldValue)>,
    field: usize,
}

struct MoodEditor {
    day: NaiveDate,
    moods: Vec<MoodType>,
    mood_idx: usize,
    note: FieldValue,
    editing_note: bool,
}

/// Hours, minutes and seconds picked before starting the timer.
struct DurationInput {
    parts: [u32; 3],
    field: usize,
}

#[derive(Clone)]
struct FieldValue {
    value: String,
    cursor: usize,
}

impl FieldValue {
    fn new(value: &str) -> Self {
        FieldValue {
            value: value.to_string(),
            cursor: value.len(),
        }
    }

    fn move_left(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor = prev_char_boundary(self.cursor, &self.value);
    }

    fn move_right(&mut self) {
        if self.cursor >= self.value.len() {
            return;
        }
        self.cursor = next_char_boundary(self.cursor, &self.value);
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let prev = prev_char_boundary(self.cursor, &self.value);
        self.value.drain(prev..self.cursor);
        self.cursor = prev;
    }

    fn insert_char(&mut self, ch: char) {
        self.value.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    fn with_caret(&self) -> String {
        let mut text = self.value.clone();
        text.insert_str(self.cursor, "▌");
        text
    }

    fn trimmed(&self) -> &str {
        self.value.trim()
    }

    fn optional(&self) -> Option<String> {
        let value = self.trimmed();
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    }
}

impl ViewMode {
    fn label(&self) -> &'static str {
        match self {
            ViewMode::Calendar => "Calendar",
            ViewMode::Pixels => "Year in Pixels",
            ViewMode::Focus => "Focus",
        }
    }
}

impl Pane {
    fn next(self) -> Self {
        match self {
            Pane::Days => Pane::Tasks,
            Pane::Tasks => Pane::Events,
            Pane::Events => Pane::Days,
        }
    }

    fn prev(self) -> Self {
        match self {
            Pane::Days => Pane::Events,
            Pane::Tasks => Pane::Days,
            Pane::Events => Pane::Tasks,
        }
    }
}

impl App {
    fn new(planner: Planner) -> Self {
        let status = format!("Loaded planner from {}", planner.location.dir.display());
        let today = Local::now().date_naive();
        App {
            planner,
            cursor: today,
            pane: Pane::Days,
            task_idx: 0,
            event_idx: 0,
            pixel_cursor: today,
            timer: FocusTimer::new(),
            duration: DurationInput {
                parts: [0, 25, 0],
                field: 1,
            },
            status,
            mode: Mode::Normal,
            view: ViewMode::Calendar,
        }
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            let outcome = self.timer.advance(Instant::now());
            if outcome.finished {
                self.status = "Focus session complete".into();
            }
            terminal.draw(|f| self.draw(f))?;
            if event::poll(Duration::from_millis(200))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key)? {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        match self.mode {
            Mode::Normal => self.handle_normal_key(key),
            Mode::Form(_) => self.handle_form_key(key),
            Mode::MoodEditor(_) => self.handle_mood_key(key),
            Mode::ConfirmDelete(_) => self.handle_confirm_key(key),
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Char('1') => {
                self.set_view(ViewMode::Calendar);
                return Ok(false);
            }
            KeyCode::Char('2') => {
                self.set_view(ViewMode::Pixels);
                return Ok(false);
            }
            KeyCode::Char('3') => {
                self.set_view(ViewMode::Focus);
                return Ok(false);
            }
            _ => {}
        }

        match self.view {
            ViewMode::Calendar => self.handle_calendar_key(key),
            ViewMode::Pixels => self.handle_pixels_key(key),
            ViewMode::Focus => self.handle_focus_key(key),
        }
    }

    fn handle_calendar_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Tab => self.pane = self.pane.next(),
            KeyCode::BackTab => self.pane = self.pane.prev(),
            KeyCode::Char('[') | KeyCode::Char('<') => self.change_month(-1),
            KeyCode::Char(']') | KeyCode::Char('>') => self.change_month(1),
            KeyCode::Char('t') => {
                self.cursor = Local::now().date_naive();
                self.task_idx = 0;
            }
            KeyCode::Char('n') => {
                self.mode = Mode::Form(EntryForm::new_task(self.cursor));
                self.status = "New task (Tab/Shift-Tab move, Enter save, Esc cancel)".into();
            }
            KeyCode::Char('E') => {
                self.mode = Mode::Form(EntryForm::new_event(
                    self.cursor,
                    &self.planner.default_event_color,
                ));
                self.status = "New event (Tab/Shift-Tab move, Enter save, Esc cancel)".into();
            }
            KeyCode::Char('e') => self.open_edit_form(),
            KeyCode::Char('d') => self.ask_delete(),
            KeyCode::Char(' ') | KeyCode::Char('x') if self.pane == Pane::Tasks => {
                self.toggle_selected_task();
            }
            KeyCode::Left | KeyCode::Char('h') if self.pane == Pane::Days => self.shift_day(-1),
            KeyCode::Right | KeyCode::Char('l') if self.pane == Pane::Days => self.shift_day(1),
            KeyCode::Up | KeyCode::Char('k') => match self.pane {
                Pane::Days => self.shift_day(-7),
                Pane::Tasks => self.task_idx = self.task_idx.saturating_sub(1),
                Pane::Events => self.event_idx = self.event_idx.saturating_sub(1),
            },
            KeyCode::Down | KeyCode::Char('j') => match self.pane {
                Pane::Days => self.shift_day(7),
                Pane::Tasks => self.task_idx += 1,
                Pane::Events => self.event_idx += 1,
            },
            KeyCode::Enter if self.pane == Pane::Days => {
                self.pane = Pane::Tasks;
                self.task_idx = 0;
            }
            _ => {}
        }
        self.ensure_bounds();
        Ok(false)
    }

    fn handle_pixels_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.shift_pixel_day(-1),
            KeyCode::Down | KeyCode::Char('j') => self.shift_pixel_day(1),
            KeyCode::Left | KeyCode::Char('h') => self.shift_pixel_month(-1),
            KeyCode::Right | KeyCode::Char('l') => self.shift_pixel_month(1),
            KeyCode::Char('t') => self.pixel_cursor = Local::now().date_naive(),
            KeyCode::Enter | KeyCode::Char('m') => {
                let entry = self.planner.moods.entry_for(self.pixel_cursor);
                self.mode = Mode::MoodEditor(MoodEditor::new(self.pixel_cursor, entry.mood, &entry.note));
                self.status = format!("Editing mood for {}", self.pixel_cursor);
            }
            _ => {}
        }
        Ok(false)
    }

    fn handle_focus_key(&mut self, key: KeyEvent) -> Result<bool> {
        match self.timer.phase() {
            TimerPhase::Idle => match key.code {
                KeyCode::Left | KeyCode::Char('h') | KeyCode::BackTab => {
                    self.duration.field = (self.duration.field + 2) % 3;
                }
                KeyCode::Right | KeyCode::Char('l') | KeyCode::Tab => {
                    self.duration.field = (self.duration.field + 1) % 3;
                }
                KeyCode::Up | KeyCode::Char('k') => self.duration.adjust(1),
                KeyCode::Down | KeyCode::Char('j') => self.duration.adjust(-1),
                KeyCode::Enter | KeyCode::Char('s') => {
                    let [h, m, s] = self.duration.parts;
                    if self.timer.start(h, m, s) {
                        self.status = format!("Focus started for {}", self.timer.clock());
                    } else {
                        self.status = "Pick a duration longer than zero".into();
                    }
                }
                _ => {}
            },
            TimerPhase::Running | TimerPhase::Paused => match key.code {
                KeyCode::Char(' ') | KeyCode::Char('p') => {
                    if self.timer.pause() {
                        self.status = "Paused".into();
                    } else if self.timer.resume() {
                        self.status = "Resumed".into();
                    }
                }
                KeyCode::Char('r') | KeyCode::Esc => {
                    self.timer.reset();
                    self.status = "Timer stopped".into();
                }
                _ => {}
            },
        }
        Ok(false)
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> Result<bool> {
        let mut mode = std::mem::replace(&mut self.mode, Mode::Normal);
        let mut close_form = false;
        if let Mode::Form(form) = &mut mode {
            match key.code {
                KeyCode::Esc => {
                    close_form = true;
                    self.status = "Canceled".into();
                }
                KeyCode::Tab | KeyCode::Down => form.next_field(),
                KeyCode::BackTab | KeyCode::Up => form.prev_field(),
                KeyCode::Left => form.active_field_mut().move_left(),
                KeyCode::Right => form.active_field_mut().move_right(),
                KeyCode::Backspace => form.active_field_mut().backspace(),
                KeyCode::Enter => match self.submit_form(form) {
                    Ok(message) => {
                        self.status = message;
                        close_form = true;
                    }
                    Err(err) => self.status = format!("Not saved: {}", err),
                },
                KeyCode::Char(c) => {
                    if !key
                        .modifiers
                        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
                    {
                        form.active_field_mut().insert_char(c);
                    }
                }
                _ => {}
            }
        }
        self.mode = if close_form { Mode::Normal } else { mode };
        self.ensure_bounds();
        Ok(false)
    }

    fn handle_mood_key(&mut self, key: KeyEvent) -> Result<bool> {
        let mut mode = std::mem::replace(&mut self.mode, Mode::Normal);
        let mut close = false;
        if let Mode::MoodEditor(editor) = &mut mode {
            match key.code {
                KeyCode::Esc => {
                    close = true;
                    self.status = "Canceled".into();
                }
                KeyCode::Tab | KeyCode::BackTab => editor.editing_note = !editor.editing_note,
                KeyCode::Enter => {
                    let mood = editor.selected();
                    self.planner
                        .moods
                        .record(editor.day, mood, editor.note.value.clone());
                    self.status = format!("{} {} {}", editor.day, mood.emoji(), mood.label());
                    close = true;
                }
                KeyCode::Left if !editor.editing_note => {
                    editor.mood_idx = editor.mood_idx.saturating_sub(1);
                }
                KeyCode::Right if !editor.editing_note => {
                    editor.mood_idx = (editor.mood_idx + 1).min(editor.moods.len() - 1);
                }
                KeyCode::Char(c) if !editor.editing_note => {
                    if let Some(idx) = c.to_digit(10).and_then(|d| d.checked_sub(1)) {
                        if (idx as usize) < editor.moods.len() {
                            editor.mood_idx = idx as usize;
                        }
                    }
                }
                KeyCode::Left => editor.note.move_left(),
                KeyCode::Right => editor.note.move_right(),
                KeyCode::Backspace if editor.editing_note => editor.note.backspace(),
                KeyCode::Char(c) => {
                    if !key
                        .modifiers
                        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
                    {
                        editor.note.insert_char(c);
                    }
                }
                _ => {}
            }
        }
        self.mode = if close { Mode::Normal } else { mode };
        Ok(false)
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) -> Result<bool> {
        let target = match std::mem::replace(&mut self.mode, Mode::Normal) {
            Mode::ConfirmDelete(target) => target,
            other => {
                self.mode = other;
                return Ok(false);
            }
        };
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                let result = match &target {
                    DeleteTarget::Task { id, title } => self
                        .planner
                        .tasks
                        .remove(id)
                        .map(|_| format!("Deleted task {}", title)),
                    DeleteTarget::Event { id, name } => self
                        .planner
                        .events
                        .remove(id)
                        .map(|_| format!("Deleted event {}", name)),
                };
                self.status = match result {
                    Ok(message) => message,
                    Err(err) => format!("Delete failed: {}", err),
                };
                self.ensure_bounds();
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                self.status = "Delete canceled".into();
            }
            _ => self.mode = Mode::ConfirmDelete(target),
        }
        Ok(false)
    }

    fn set_view(&mut self, view: ViewMode) {
        if self.view != view {
            self.view = view;
            self.status = format!("Switched to {} view", view.label());
        }
        self.ensure_bounds();
    }

    fn submit_form(&mut self, form: &EntryForm) -> Result<String, PlannerError> {
        match &form.kind {
            FormKind::NewTask => {
                let when = form_instant(form.value(1), form.value(2))?;
                let task = Task::new(form.value(0), when, form.optional(3))?;
                let title = task.title.clone();
                self.cursor = task.day();
                self.planner.tasks.add(task);
                Ok(format!("Added task {}", title))
            }
            FormKind::EditTask(id) => {
                let when = form_instant(form.value(1), form.value(2))?;
                let title = form.value(0).to_string();
                let emoji = form.optional(3);
                self.planner.tasks.update(id, |task| {
                    task.title = title;
                    task.date = when;
                    task.custom_emoji = emoji;
                })?;
                Ok(format!("Updated task {}", form.value(0)))
            }
            FormKind::NewEvent => {
                let start = parse_day(form.value(1))?;
                let end = parse_day(form.value(2))?;
                let event = MonthlyEvent::new(
                    form.value(0),
                    Some(picked_color(
                        form.value(3),
                        &self.planner.default_event_color,
                    )),
                    form.optional(4),
                    start_of_day(start),
                    start_of_day(end),
                )?;
                let name = event.name.clone();
                self.planner.events.add(event)?;
                Ok(format!("Added event {}", name))
            }
            FormKind::EditEvent(id) => {
                let start = parse_day(form.value(1))?;
                let end = parse_day(form.value(2))?;
                let name = form.value(0).to_string();
                let color = picked_color(form.value(3), &self.planner.default_event_color);
                let emoji = form.optional(4);
                self.planner.events.update(id, |event| {
                    event.name = name;
                    event.start_date = start_of_day(start);
                    event.end_date = start_of_day(end);
                    event.color_hex = color;
                    event.emoji = emoji;
                })?;
                Ok(format!("Updated event {}", form.value(0)))
            }
        }
    }

    fn open_edit_form(&mut self) {
        let picked = match self.pane {
            Pane::Tasks => self
                .selected_task()
                .map(|t| (t.title.clone(), EntryForm::edit_task(t))),
            Pane::Events => self
                .selected_event()
                .map(|e| (e.name.clone(), EntryForm::edit_event(e))),
            Pane::Days => {
                self.status = "Select a task or event first (Tab)".into();
                return;
            }
        };
        match picked {
            Some((label, form)) => {
                self.status = format!("Editing {}", label);
                self.mode = Mode::Form(form);
            }
            None => self.status = "Nothing selected to edit".into(),
        }
    }

    fn ask_delete(&mut self) {
        let target = match self.pane {
            Pane::Tasks => self.selected_task().map(|t| DeleteTarget::Task {
                id: t.id.clone(),
                title: t.title.clone(),
            }),
            Pane::Events => self.selected_event().map(|e| DeleteTarget::Event {
                id: e.id.clone(),
                name: e.name.clone(),
            }),
            Pane::Days => None,
        };
        match target {
            Some(target) => {
                self.status = "Delete? (y to confirm, n/Esc to cancel)".into();
                self.mode = Mode::ConfirmDelete(target);
            }
            None => self.status = "Nothing selected to delete".into(),
        }
    }

    fn toggle_selected_task(&mut self) {
        let Some(id) = self.selected_task().map(|t| t.id.clone()) else {
            self.status = "No task selected".into();
            return;
        };
        self.status = match self.planner.tasks.toggle_completion(&id) {
            Ok(true) => "Marked as completed".into(),
            Ok(false) => "Marked as incomplete".into(),
            Err(err) => format!("Toggle failed: {}", err),
        };
    }

    fn change_month(&mut self, delta: i32) {
        self.cursor = shift_month(self.cursor, delta);
        self.task_idx = 0;
        self.event_idx = 0;
    }

    fn shift_day(&mut self, days: i64) {
        if let Some(next) = self.cursor.checked_add_signed(ChronoDuration::days(days)) {
            self.cursor = next;
            self.task_idx = 0;
        }
    }

    fn shift_pixel_day(&mut self, days: i64) {
        let year = self.pixel_cursor.year();
        if let Some(next) = self
            .pixel_cursor
            .checked_add_signed(ChronoDuration::days(days))
        {
            if next.year() == year {
                self.pixel_cursor = next;
            }
        }
    }

    fn shift_pixel_month(&mut self, months: i32) {
        let next = shift_month(self.pixel_cursor, months);
        if next.year() == self.pixel_cursor.year() {
            self.pixel_cursor = next;
        }
    }

    fn day_tasks(&self) -> Vec<&Task> {
        let mut tasks = self.planner.tasks.on_day(self.cursor);
        tasks.sort_by_key(|t| t.date);
        tasks
    }

    fn month_events(&self) -> Vec<&MonthlyEvent> {
        self.planner.events.starting_in_month(self.cursor)
    }

    fn selected_task(&self) -> Option<&Task> {
        self.day_tasks().get(self.task_idx).copied()
    }

    fn selected_event(&self) -> Option<&MonthlyEvent> {
        self.month_events().get(self.event_idx).copied()
    }

    fn ensure_bounds(&mut self) {
        let tasks = self.day_tasks().len();
        self.task_idx = self.task_idx.min(tasks.saturating_sub(1));
        let events = self.month_events().len();
        self.event_idx = self.event_idx.min(events.saturating_sub(1));
    }

    fn draw(&mut self, f: &mut ratatui::Frame<'_>) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(4),
            ])
            .split(f.size());

        self.draw_header(f, layout[0]);
        match self.view {
            ViewMode::Calendar => self.draw_calendar(f, layout[1]),
            ViewMode::Pixels => self.draw_pixels(f, layout[1]),
            ViewMode::Focus => self.draw_focus(f, layout[1]),
        }
        self.draw_footer(f, layout[2]);

        match &self.mode {
            Mode::Form(form) => draw_form(f, form),
            Mode::MoodEditor(editor) => draw_mood_editor(f, editor),
            Mode::ConfirmDelete(target) => draw_confirm(f, target),
            Mode::Normal => {}
        }
    }

    fn draw_header(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let mut spans = vec![
            Span::styled(
                "moodplanner ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                self.view.label(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("  •  "),
            Span::styled(
                self.planner.location.source.label(),
                Style::default().fg(Color::Green),
            ),
            Span::raw("  •  "),
            Span::styled(
                format!("{}", self.planner.location.dir.display()),
                Style::default().fg(Color::DarkGray),
            ),
        ];
        if self.timer.phase() != TimerPhase::Idle {
            spans.push(Span::raw("  •  "));
            spans.push(Span::styled(
                format!("{} {}", self.timer.stage().glyph(), self.timer.clock()),
                Style::default().fg(if self.timer.is_paused() {
                    Color::Yellow
                } else {
                    Color::LightGreen
                }),
            ));
        }
        let block = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray));
        let paragraph = Paragraph::new(Line::from(spans))
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(paragraph, area);
    }

    fn draw_calendar(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(60), Constraint::Min(20)])
            .split(area);
        self.draw_month_grid(f, columns[0]);

        let side = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(columns[1]);
        self.draw_day_tasks(f, side[0]);
        self.draw_month_events(f, side[1]);
    }

    fn draw_month_grid(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let view = self.planner.month_view(self.cursor);
        let today = Local::now().date_naive();
        let focused = self.pane == Pane::Days;
        let mut lines = vec![Line::from(Span::styled(
            view.title(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ))];
        let header: Vec<Span<'static>> = weekday_symbols(view.week_start)
            .iter()
            .map(|s| Span::styled(format!("{:^8}", s), Style::default().fg(Color::Gray)))
            .collect();
        lines.push(Line::from(header));
        for week in view.weeks() {
            let mut spans = Vec::new();
            for cell in week {
                spans.extend(cell_spans(cell, cell.date == self.cursor, focused, cell.date == today));
            }
            lines.push(Line::from(spans));
            lines.push(Line::from(week_task_line(week)));
        }

        let block = pane_block("Month  [ / ] to change", focused);
        let paragraph = Paragraph::new(lines).block(block);
        f.render_widget(paragraph, area);
    }

    fn draw_day_tasks(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let focused = self.pane == Pane::Tasks;
        let tasks = self.day_tasks();
        let items: Vec<ListItem> = if tasks.is_empty() {
            vec![ListItem::new(Span::styled(
                "(no tasks, n to add)",
                Style::default().fg(Color::DarkGray),
            ))]
        } else {
            tasks.iter().map(|t| task_item(t)).collect()
        };
        let mut state = ListState::default();
        if focused && !tasks.is_empty() {
            state.select(Some(self.task_idx));
        }
        let title = format!("Tasks for {}", self.cursor.format("%A, %b %-d"));
        let list = List::new(items)
            .block(pane_block(&title, focused))
            .highlight_style(selected_style());
        f.render_stateful_widget(list, area, &mut state);
    }

    fn draw_month_events(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let focused = self.pane == Pane::Events;
        let events = self.month_events();
        let items: Vec<ListItem> = if events.is_empty() {
            vec![ListItem::new(Span::styled(
                "(no events, E to add)",
                Style::default().fg(Color::DarkGray),
            ))]
        } else {
            events.iter().map(|e| event_item(e)).collect()
        };
        let mut state = ListState::default();
        if focused && !events.is_empty() {
            state.select(Some(self.event_idx));
        }
        let list = List::new(items)
            .block(pane_block("Upcoming Events", focused))
            .highlight_style(selected_style());
        f.render_stateful_widget(list, area, &mut state);
    }

    fn draw_pixels(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(44), Constraint::Min(24)])
            .split(area);
        let year = self.pixel_cursor.year();
        let grid = self.planner.moods.year_grid(year);

        let mut lines = Vec::new();
        let mut header = vec![Span::raw("   ")];
        for month in ["J", "F", "M", "A", "M", "J", "J", "A", "S", "O", "N", "D"] {
            header.push(Span::styled(
                format!("{:^3}", month),
                Style::default().fg(Color::Gray),
            ));
        }
        lines.push(Line::from(header));
        for (row_idx, row) in grid.iter().enumerate() {
            let mut spans = vec![Span::styled(
                format!("{:>2} ", row_idx + 1),
                Style::default().fg(Color::DarkGray),
            )];
            for (col_idx, cell) in row.iter().enumerate() {
                let selected = self.pixel_cursor.day() as usize == row_idx + 1
                    && self.pixel_cursor.month() as usize == col_idx + 1;
                spans.push(pixel_span(*cell, selected));
            }
            lines.push(Line::from(spans));
        }
        let grid_widget = Paragraph::new(lines).block(pane_block(&format!("{}", year), true));
        f.render_widget(grid_widget, columns[0]);

        let entry = self.planner.moods.entry_for(self.pixel_cursor);
        let mut detail = vec![
            Line::from(Span::styled(
                self.pixel_cursor.format("%A %-d %B").to_string(),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(format!("Mood: {} {}", entry.mood.emoji(), entry.mood.label())),
            Line::from(""),
        ];
        if entry.note.is_empty() {
            detail.push(Line::from(Span::styled(
                "No note.",
                Style::default()
                    .fg(Color::Gray)
                    .add_modifier(Modifier::ITALIC),
            )));
        } else {
            detail.push(Line::from(entry.note.clone()));
        }
        detail.push(Line::from(""));
        detail.push(Line::from(Span::styled(
            "Key",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for mood in MoodType::legend() {
            detail.push(Line::from(vec![
                Span::styled("  ", Style::default().bg(mood.color().into())),
                Span::raw(format!(" {} {}", mood.emoji(), mood.label())),
            ]));
        }
        let panel = Paragraph::new(detail)
            .wrap(Wrap { trim: true })
            .block(pane_block("Mood Journal", false));
        f.render_widget(panel, columns[1]);
    }

    fn draw_focus(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let block = pane_block("Focus Timer", true);
        let inner = block.inner(area);
        f.render_widget(block, area);
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(0),
            ])
            .split(inner);

        if self.timer.phase() == TimerPhase::Idle {
            let mut spans = Vec::new();
            for (idx, (value, unit)) in self
                .duration
                .parts
                .iter()
                .zip(["h", "min", "sec"])
                .enumerate()
            {
                let style = if idx == self.duration.field {
                    selected_style()
                } else {
                    Style::default().fg(Color::White)
                };
                spans.push(Span::styled(format!(" {:>2} {} ", value, unit), style));
                spans.push(Span::raw("  "));
            }
            let picker = Paragraph::new(vec![
                Line::from(spans),
                Line::from(Span::styled(
                    "←/→ pick field • ↑/↓ adjust • Enter start",
                    Style::default().fg(Color::Gray),
                )),
            ])
            .alignment(Alignment::Center);
            f.render_widget(picker, rows[1]);
            return;
        }

        let clock = Paragraph::new(Line::from(Span::styled(
            self.timer.clock(),
            Style::default()
                .fg(if self.timer.is_paused() {
                    Color::Yellow
                } else {
                    Color::LightGreen
                })
                .add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center);
        f.render_widget(clock, rows[1]);

        let stage = self.timer.stage();
        let plant = Paragraph::new(Line::from(format!(
            "{}  {}",
            stage.glyph(),
            stage.label()
        )))
        .alignment(Alignment::Center);
        f.render_widget(plant, rows[2]);

        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL))
            .gauge_style(Style::default().fg(stage_color(stage)))
            .ratio(self.timer.progress().clamp(0.0, 1.0));
        f.render_widget(gauge, rows[3]);
    }

    fn draw_footer(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Length(2)])
            .split(area);

        let help_bar = Paragraph::new(self.footer_help_line())
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(help_bar, rows[0]);

        let status = Paragraph::new(self.status.clone())
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(status, rows[1]);
    }

    fn footer_help_line(&self) -> Line<'static> {
        let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::LightCyan));
        let mut spans = vec![
            key("1"),
            Span::raw(" calendar  "),
            key("2"),
            Span::raw(" pixels  "),
            key("3"),
            Span::raw(" focus  "),
        ];
        match self.view {
            ViewMode::Calendar => spans.extend([
                key("Tab"),
                Span::raw(" pane  "),
                key("←↑↓→"),
                Span::raw(" move  "),
                key("n"),
                Span::raw(" task  "),
                key("E"),
                Span::raw(" event  "),
                key("e"),
                Span::raw(" edit  "),
                key("x"),
                Span::raw(" done  "),
                key("d"),
                Span::raw(" delete  "),
            ]),
            ViewMode::Pixels => spans.extend([
                key("←↑↓→"),
                Span::raw(" move  "),
                key("Enter"),
                Span::raw(" record mood  "),
                key("t"),
                Span::raw(" today  "),
            ]),
            ViewMode::Focus => spans.extend([
                key("Enter"),
                Span::raw(" start  "),
                key("p"),
                Span::raw(" pause/resume  "),
                key("r"),
                Span::raw(" stop  "),
            ]),
        }
        spans.push(key("q"));
        spans.push(Span::raw(" quit"));
        Line::from(spans)
    }
}

impl EntryForm {
    fn new_task(day: NaiveDate) -> Self {
        let now = Local::now();
        EntryForm {
            kind: FormKind::NewTask,
            fields: vec![
                ("Title", FieldValue::new("")),
                ("Date (YYYY-MM-DD)", FieldValue::new(&day.to_string())),
                ("Time (HH:MM)", FieldValue::new(&now.format("%H:%M").to_string())),
                ("Emoji (blank to infer)", FieldValue::new("")),
            ],
            field: 0,
        }
    }

    fn edit_task(task: &Task) -> Self {
        let local = task.date.with_timezone(&Local);
        EntryForm {
            kind: FormKind::EditTask(task.id.clone()),
            fields: vec![
                ("Title", FieldValue::new(&task.title)),
                ("Date (YYYY-MM-DD)", FieldValue::new(&local.format("%Y-%m-%d").to_string())),
                ("Time (HH:MM)", FieldValue::new(&local.format("%H:%M").to_string())),
                (
                    "Emoji (blank to infer)",
                    FieldValue::new(task.custom_emoji.as_deref().unwrap_or_default()),
                ),
            ],
            field: 0,
        }
    }

    fn new_event(day: NaiveDate, color: &str) -> Self {
        EntryForm {
            kind: FormKind::NewEvent,
            fields: vec![
                ("Name", FieldValue::new("")),
                ("Start (YYYY-MM-DD)", FieldValue::new(&day.to_string())),
                ("End (YYYY-MM-DD)", FieldValue::new(&day.to_string())),
                ("Color (hex)", FieldValue::new(color)),
                ("Emoji", FieldValue::new("")),
            ],
            field: 0,
        }
    }

    fn edit_event(event: &MonthlyEvent) -> Self {
        EntryForm {
            kind: FormKind::EditEvent(event.id.clone()),
            fields: vec![
                ("Name", FieldValue::new(&event.name)),
                ("Start (YYYY-MM-DD)", FieldValue::new(&local_day(&event.start_date).to_string())),
                ("End (YYYY-MM-DD)", FieldValue::new(&local_day(&event.end_date).to_string())),
                ("Color (hex)", FieldValue::new(&event.color_hex)),
                ("Emoji", FieldValue::new(event.emoji.as_deref().unwrap_or_default())),
            ],
            field: 0,
        }
    }

    fn title(&self) -> &'static str {
        match self.kind {
            FormKind::NewTask => "New Task",
            FormKind::EditTask(_) => "Edit Task",
            FormKind::NewEvent => "New Event",
            FormKind::EditEvent(_) => "Edit Event",
        }
    }

    fn value(&self, idx: usize) -> &str {
        self.fields
            .get(idx)
            .map(|(_, field)| field.trimmed())
            .unwrap_or_default()
    }

    fn optional(&self, idx: usize) -> Option<String> {
        self.fields.get(idx).and_then(|(_, field)| field.optional())
    }

    fn next_field(&mut self) {
        self.field = (self.field + 1) % self.fields.len();
    }

    fn prev_field(&mut self) {
        self.field = (self.field + self.fields.len() - 1) % self.fields.len();
    }

    fn active_field_mut(&mut self) -> &mut FieldValue {
        &mut self.fields[self.field].1
    }
}

impl MoodEditor {
    fn new(day: NaiveDate, current: MoodType, note: &str) -> Self {
        let moods: Vec<MoodType> = MoodType::legend().collect();
        let mood_idx = moods.iter().position(|m| *m == current).unwrap_or(0);
        MoodEditor {
            day,
            moods,
            mood_idx,
            note: FieldValue::new(note),
            editing_note: false,
        }
    }

    fn selected(&self) -> MoodType {
        self.moods
            .get(self.mood_idx)
            .copied()
            .unwrap_or_default()
    }
}

impl DurationInput {
    fn adjust(&mut self, delta: i32) {
        let max = if self.field == 0 { 23 } else { 59 };
        let value = self.parts[self.field] as i32 + delta;
        self.parts[self.field] = value.rem_euclid(max + 1) as u32;
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn draw_form(f: &mut ratatui::Frame<'_>, form: &EntryForm) {
    let area = centered_rect(60, 50, f.size());
    let mut lines = Vec::new();
    for (idx, (label, field)) in form.fields.iter().enumerate() {
        lines.push(field_line(label, field, idx == form.field));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Enter to save • Esc to cancel • Tab/Shift-Tab to move",
        Style::default().fg(Color::Gray),
    )));
    let dialog = Paragraph::new(lines)
        .block(
            Block::default()
                .title(Span::styled(
                    form.title(),
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(Clear, area);
    f.render_widget(dialog, area);
}

fn draw_mood_editor(f: &mut ratatui::Frame<'_>, editor: &MoodEditor) {
    let area = centered_rect(60, 40, f.size());
    let mut mood_spans = Vec::new();
    for (idx, mood) in editor.moods.iter().enumerate() {
        let mut style = Style::default().fg(mood.color().into());
        if idx == editor.mood_idx {
            style = selected_style();
        }
        mood_spans.push(Span::styled(
            format!(" {} {} {} ", idx + 1, mood.emoji(), mood.label()),
            style,
        ));
    }
    let lines = vec![
        Line::from(Span::styled(
            "Mood",
            Style::default()
                .fg(if editor.editing_note {
                    Color::Gray
                } else {
                    Color::Cyan
                })
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(mood_spans),
        Line::from(""),
        field_line("Note", &editor.note, editor.editing_note),
        Line::from(""),
        Line::from(Span::styled(
            "←/→ or 1-6 pick mood • Tab switch to note • Enter save • Esc cancel",
            Style::default().fg(Color::Gray),
        )),
    ];
    let dialog = Paragraph::new(lines)
        .block(
            Block::default()
                .title(Span::styled(
                    format!("Mood for {}", editor.day.format("%-d %B %Y")),
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(Clear, area);
    f.render_widget(dialog, area);
}

fn draw_confirm(f: &mut ratatui::Frame<'_>, target: &DeleteTarget) {
    let area = centered_rect(50, 30, f.size());
    let label = match target {
        DeleteTarget::Task { title, .. } => format!("Delete task \"{}\"?", title),
        DeleteTarget::Event { name, .. } => format!("Delete event \"{}\"?", name),
    };
    let body = vec![
        Line::from(Span::styled(
            label,
            Style::default()
                .fg(Color::LightRed)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Press y to confirm, n or Esc to cancel"),
    ];
    let dialog = Paragraph::new(body).alignment(Alignment::Center).block(
        Block::default()
            .title(Span::styled(
                "Confirm Delete",
                Style::default()
                    .fg(Color::LightRed)
                    .add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::LightRed)),
    );
    f.render_widget(Clear, area);
    f.render_widget(dialog, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn pane_block(title: &str, focused: bool) -> Block<'static> {
    Block::default()
        .title(Span::styled(
            title.to_string(),
            Style::default()
                .fg(if focused { Color::Cyan } else { Color::Gray })
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if focused {
            Color::Cyan
        } else {
            Color::DarkGray
        }))
}

fn selected_style() -> Style {
    Style::default()
        .bg(Color::LightCyan)
        .fg(Color::Black)
        .add_modifier(Modifier::BOLD)
}

/// Day number plus one dot per displayed event, eight columns wide.
fn cell_spans(
    cell: &CalendarCell<'_>,
    selected: bool,
    focused: bool,
    today: bool,
) -> Vec<Span<'static>> {
    if !cell.in_month {
        return vec![Span::raw("        ")];
    }
    let mut style = Style::default().fg(Color::Gray);
    if let Some(color) = cell.highlight {
        style = style.bg(color.into()).fg(Color::Black);
    } else if today {
        style = style.fg(Color::LightBlue).add_modifier(Modifier::BOLD);
    }
    if selected {
        style = style
            .bg(if focused { Color::Cyan } else { Color::Blue })
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD);
    }
    let mut spans = vec![Span::styled(format!(" {:>2} ", cell.date.day()), style)];
    let mut width = 4;
    for event in &cell.events {
        spans.push(Span::styled("•", Style::default().fg(event.color().into())));
        width += 1;
    }
    spans.push(Span::raw(" ".repeat(8usize.saturating_sub(width))));
    spans
}

/// Open-task counts under each day of a week row.
fn week_task_line(week: &[CalendarCell<'_>]) -> Vec<Span<'static>> {
    week.iter()
        .map(|cell| {
            if cell.in_month && cell.open_task_count > 0 {
                Span::styled(
                    format!("{:^8}", format!("{} task{}", cell.open_task_count, if cell.open_task_count == 1 { "" } else { "s" })),
                    Style::default().fg(Color::LightYellow),
                )
            } else {
                Span::raw("        ")
            }
        })
        .collect()
}

fn task_item(task: &Task) -> ListItem<'static> {
    let local = task.date.with_timezone(&Local);
    let mut title_style = Style::default().fg(Color::White);
    if task.is_completed {
        title_style = title_style
            .fg(Color::DarkGray)
            .add_modifier(Modifier::CROSSED_OUT);
    }
    ListItem::new(Line::from(vec![
        Span::styled(
            local.format("%H:%M ").to_string(),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw(format!("{} ", task.display_emoji())),
        Span::styled(task.title.clone(), title_style),
    ]))
}

fn event_item(event: &MonthlyEvent) -> ListItem<'static> {
    ListItem::new(Line::from(vec![
        Span::styled("● ", Style::default().fg(event.color().into())),
        Span::raw(format!("{} ", event.display_emoji())),
        Span::styled(
            event.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  {}", event.start_day().format("%A, %b %-d")),
            Style::default().fg(Color::Gray),
        ),
    ]))
}

fn pixel_span(cell: Option<MoodType>, selected: bool) -> Span<'static> {
    let Some(mood) = cell else {
        return Span::raw("   ");
    };
    let text = if selected { "[]" } else { "  " };
    let style = match mood {
        MoodType::None => Style::default().bg(Color::DarkGray),
        mood => Style::default().bg(mood.color().into()),
    };
    let style = if selected {
        style.fg(Color::White).add_modifier(Modifier::BOLD)
    } else {
        style
    };
    Span::styled(format!("{} ", text), style)
}

fn stage_color(stage: GrowthStage) -> Color {
    match stage {
        GrowthStage::Seedling => Color::LightGreen,
        GrowthStage::Sprout => Color::Green,
        GrowthStage::Budding => Color::LightMagenta,
        GrowthStage::Bloom => Color::Magenta,
    }
}

fn field_line(label: &str, field: &FieldValue, active: bool) -> Line<'static> {
    let label_style = Style::default()
        .fg(Color::Gray)
        .add_modifier(Modifier::BOLD | Modifier::DIM);
    let value_style = Style::default().fg(if active { Color::Cyan } else { Color::White });
    let text = if active {
        field.with_caret()
    } else {
        field.value.clone()
    };
    Line::from(vec![
        Span::styled(format!("{}: ", label), label_style),
        Span::styled(text, value_style),
    ])
}

fn form_instant(date: &str, time: &str) -> Result<chrono::DateTime<chrono::Utc>, PlannerError> {
    let day = parse_day(date)?;
    let time = parse_time(time)?;
    Ok(local_instant(day.and_time(time)))
}

/// Blank input falls back to the configured default color.
fn picked_color(input: &str, fallback: &str) -> String {
    if input.trim().is_empty() {
        return normalize_hex(fallback);
    }
    normalize_hex(input)
}

fn prev_char_boundary(cursor: usize, text: &str) -> usize {
    if cursor == 0 {
        return 0;
    }
    let mut prev = 0;
    for (idx, _) in text.char_indices() {
        if idx >= cursor {
            break;
        }
        prev = idx;
    }
    prev
}

fn next_char_boundary(cursor: usize, text: &str) -> usize {
    for (idx, ch) in text.char_indices() {
        if idx > cursor {
            return idx;
        }
        if idx == cursor {
            return cursor + ch.len_utf8();
        }
    }
    text.len()
}
