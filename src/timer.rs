use std::time::{Duration, Instant};

pub const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
    Idle,
    Running,
    Paused,
}

/// Four-step growth visual driven by progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum GrowthStage {
    Seedling,
    Sprout,
    Budding,
    Bloom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickOutcome {
    pub ticks: u32,
    pub finished: bool,
}

/// Countdown with start, pause, resume and reset.
///
/// The timer owns no thread. Whoever drives it calls [`FocusTimer::advance`]
/// from its loop; each elapsed second since the last tick is applied in order.
#[derive(Debug, Clone)]
pub struct FocusTimer {
    total: u32,
    remaining: u32,
    phase: TimerPhase,
    next_tick: Option<Instant>,
}

impl Default for FocusTimer {
    fn default() -> Self {
        FocusTimer::new()
    }
}

impl FocusTimer {
    pub fn new() -> Self {
        FocusTimer {
            total: 0,
            remaining: 0,
            phase: TimerPhase::Idle,
            next_tick: None,
        }
    }

    /// Starts a fresh countdown, replacing any active one. A zero duration
    /// leaves the timer untouched and returns false.
    pub fn start(&mut self, hours: u32, minutes: u32, seconds: u32) -> bool {
        self.start_at(hours, minutes, seconds, Instant::now())
    }

    pub fn start_at(&mut self, hours: u32, minutes: u32, seconds: u32, now: Instant) -> bool {
        let total = hours
            .saturating_mul(3600)
            .saturating_add(minutes.saturating_mul(60))
            .saturating_add(seconds);
        if total == 0 {
            return false;
        }
        self.total = total;
        self.remaining = total;
        self.phase = TimerPhase::Running;
        self.next_tick = Some(now + TICK);
        tracing::debug!(total, "focus timer started");
        true
    }

    pub fn pause(&mut self) -> bool {
        if self.phase != TimerPhase::Running {
            return false;
        }
        self.phase = TimerPhase::Paused;
        self.next_tick = None;
        true
    }

    pub fn resume(&mut self) -> bool {
        self.resume_at(Instant::now())
    }

    pub fn resume_at(&mut self, now: Instant) -> bool {
        if self.phase != TimerPhase::Paused {
            return false;
        }
        self.phase = TimerPhase::Running;
        self.next_tick = Some(now + TICK);
        true
    }

    pub fn reset(&mut self) {
        self.remaining = 0;
        self.phase = TimerPhase::Idle;
        self.next_tick = None;
    }

    /// Applies one tick. Returns true if this tick finished the countdown.
    pub fn tick(&mut self) -> bool {
        if self.phase != TimerPhase::Running {
            return false;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.phase = TimerPhase::Idle;
            self.next_tick = None;
            tracing::info!(total = self.total, "focus timer finished");
            return true;
        }
        false
    }

    /// Applies every tick that fell due up to `now`.
    pub fn advance(&mut self, now: Instant) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        while let Some(due) = self.next_tick {
            if due > now {
                break;
            }
            outcome.ticks += 1;
            if self.tick() {
                outcome.finished = true;
                break;
            }
            self.next_tick = Some(due + TICK);
        }
        outcome
    }

    /// Time until the next tick is due, if one is scheduled.
    pub fn until_next_tick(&self, now: Instant) -> Option<Duration> {
        self.next_tick.map(|due| due.saturating_duration_since(now))
    }

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == TimerPhase::Running
    }

    pub fn is_paused(&self) -> bool {
        self.phase == TimerPhase::Paused
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn progress(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        1.0 - self.remaining as f64 / self.total as f64
    }

    pub fn stage(&self) -> GrowthStage {
        GrowthStage::for_progress(self.progress())
    }

    /// Remaining time as `HH:MM:SS`.
    pub fn clock(&self) -> String {
        format_clock(self.remaining)
    }
}

impl GrowthStage {
    pub fn for_progress(progress: f64) -> Self {
        if progress >= 1.0 {
            GrowthStage::Bloom
        } else if progress >= 0.7 {
            GrowthStage::Budding
        } else if progress >= 0.3 {
            GrowthStage::Sprout
        } else {
            GrowthStage::Seedling
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GrowthStage::Seedling => "seedling",
            GrowthStage::Sprout => "sprout",
            GrowthStage::Budding => "budding",
            GrowthStage::Bloom => "in bloom",
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            GrowthStage::Seedling => "🌱",
            GrowthStage::Sprout => "🌿",
            GrowthStage::Budding => "🪴",
            GrowthStage::Bloom => "🌸",
        }
    }
}

pub fn format_clock(seconds: u32) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticks(timer: &mut FocusTimer, n: u32) {
        for _ in 0..n {
            timer.tick();
        }
    }

    #[test]
    fn zero_duration_is_ignored() {
        let mut t = FocusTimer::new();
        assert!(!t.start(0, 0, 0));
        assert_eq!(t.phase(), TimerPhase::Idle);
        assert_eq!(t.remaining(), 0);
        assert_eq!(t.progress(), 0.0);
    }

    #[test]
    fn five_second_countdown_finishes_on_fifth_tick() {
        let mut t = FocusTimer::new();
        assert!(t.start(0, 0, 5));
        ticks(&mut t, 4);
        assert!(t.is_running());
        assert_eq!(t.remaining(), 1);
        assert!(t.tick());
        assert_eq!(t.remaining(), 0);
        assert!(!t.is_running());
        assert!(!t.is_paused());
        assert_eq!(t.stage(), GrowthStage::Bloom);
    }

    #[test]
    fn pause_preserves_remaining() {
        let mut t = FocusTimer::new();
        t.start(0, 1, 0);
        ticks(&mut t, 3);
        assert!(t.pause());
        assert_eq!(t.remaining(), 57);
        assert!(!t.is_running());
        assert!(t.is_paused());

        // ticks are ignored while paused
        ticks(&mut t, 10);
        assert_eq!(t.remaining(), 57);

        assert!(t.resume());
        assert!(t.is_running());
        assert!(!t.is_paused());
        assert_eq!(t.remaining(), 57);
    }

    #[test]
    fn transitions_outside_their_phase_are_rejected() {
        let mut t = FocusTimer::new();
        assert!(!t.pause());
        assert!(!t.resume());
        t.start(0, 0, 30);
        assert!(!t.resume());
        t.pause();
        assert!(!t.pause());
    }

    #[test]
    fn reset_returns_to_idle_from_any_phase() {
        let mut t = FocusTimer::new();
        t.reset();
        assert_eq!(t.phase(), TimerPhase::Idle);

        t.start(1, 0, 0);
        t.reset();
        assert_eq!((t.remaining(), t.phase()), (0, TimerPhase::Idle));

        t.start(0, 2, 0);
        t.pause();
        t.reset();
        assert_eq!((t.remaining(), t.phase()), (0, TimerPhase::Idle));
        assert!(!t.is_paused());
    }

    #[test]
    fn restart_replaces_active_countdown() {
        let base = Instant::now();
        let mut t = FocusTimer::new();
        t.start_at(0, 0, 10, base);
        t.advance(base + Duration::from_millis(2500));
        assert_eq!(t.remaining(), 8);

        let restart = base + Duration::from_millis(2600);
        t.start_at(0, 0, 3, restart);
        assert_eq!(t.total(), 3);
        assert_eq!(t.remaining(), 3);
        // the old schedule would have ticked at base+3s
        assert_eq!(t.advance(base + Duration::from_secs(3)).ticks, 0);
        assert_eq!(t.advance(restart + TICK).ticks, 1);
    }

    #[test]
    fn advance_catches_up_on_missed_seconds() {
        let base = Instant::now();
        let mut t = FocusTimer::new();
        t.start_at(0, 0, 10, base);
        assert_eq!(t.advance(base + Duration::from_millis(999)).ticks, 0);
        let outcome = t.advance(base + Duration::from_millis(4200));
        assert_eq!(outcome, TickOutcome { ticks: 4, finished: false });
        assert_eq!(t.remaining(), 6);
    }

    #[test]
    fn advance_stops_at_completion() {
        let base = Instant::now();
        let mut t = FocusTimer::new();
        t.start_at(0, 0, 2, base);
        let outcome = t.advance(base + Duration::from_secs(30));
        assert_eq!(outcome, TickOutcome { ticks: 2, finished: true });
        assert_eq!(t.phase(), TimerPhase::Idle);
        assert_eq!(t.until_next_tick(base), None);
    }

    #[test]
    fn resume_waits_a_full_second() {
        let base = Instant::now();
        let mut t = FocusTimer::new();
        t.start_at(0, 0, 10, base);
        t.advance(base + Duration::from_millis(1500));
        t.pause();
        assert_eq!(t.advance(base + Duration::from_secs(20)).ticks, 0);

        let resumed = base + Duration::from_secs(20);
        t.resume_at(resumed);
        assert_eq!(t.advance(resumed + Duration::from_millis(900)).ticks, 0);
        assert_eq!(t.advance(resumed + TICK).ticks, 1);
        assert_eq!(t.remaining(), 8);
    }

    #[test]
    fn progress_drives_growth_stages() {
        let mut t = FocusTimer::new();
        t.start(0, 0, 10);
        assert_eq!(t.stage(), GrowthStage::Seedling);
        ticks(&mut t, 3);
        assert_eq!(t.stage(), GrowthStage::Sprout);
        ticks(&mut t, 5);
        assert_eq!(t.stage(), GrowthStage::Budding);

        let mut last = t.progress();
        while t.is_running() {
            t.tick();
            assert!(t.progress() >= last);
            last = t.progress();
        }
        assert_eq!(t.progress(), 1.0);
    }

    #[test]
    fn stage_thresholds() {
        assert_eq!(GrowthStage::for_progress(0.0), GrowthStage::Seedling);
        assert_eq!(GrowthStage::for_progress(0.29), GrowthStage::Seedling);
        assert_eq!(GrowthStage::for_progress(0.3), GrowthStage::Sprout);
        assert_eq!(GrowthStage::for_progress(0.7), GrowthStage::Budding);
        assert_eq!(GrowthStage::for_progress(1.0), GrowthStage::Bloom);
    }

    #[test]
    fn clock_formats_hours_minutes_seconds() {
        assert_eq!(format_clock(0), "00:00:00");
        assert_eq!(format_clock(3725), "01:02:05");
        let mut t = FocusTimer::new();
        t.start(2, 0, 1);
        assert_eq!(t.clock(), "02:00:01");
    }
}
