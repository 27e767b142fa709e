use crate::error::AppError;

pub const DEFAULT_WORK_MINUTES: u32 = 25;
pub const DEFAULT_BREAK_MINUTES: u32 = 5;
/// Longest Work or Break phase, one day
pub const MAX_PHASE_MINUTES: u32 = 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Work,
    Break,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Work => "Work",
            Phase::Break => "Break",
        }
    }

    pub fn other(&self) -> Phase {
        match self {
            Phase::Work => Phase::Break,
            Phase::Break => Phase::Work,
        }
    }

    fn completed(&self) -> TimerEvent {
        match self {
            Phase::Work => TimerEvent::WorkComplete,
            Phase::Break => TimerEvent::BreakComplete,
        }
    }
}

/// Something the focus screen has to ask the user about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    WorkComplete,
    BreakComplete,
    DeviceMoved,
}

impl TimerEvent {
    pub fn title(&self) -> &'static str {
        match self {
            TimerEvent::WorkComplete => "Work Session Complete!",
            TimerEvent::BreakComplete => "Break Time Over!",
            TimerEvent::DeviceMoved => "Stay Focused!",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            TimerEvent::WorkComplete => "Ready to start your break?",
            TimerEvent::BreakComplete => "Ready to get back to work?",
            TimerEvent::DeviceMoved => "Device moved. Remember to stay focused on your task.",
        }
    }

    /// Labels for the (accept, decline) answers
    pub fn answers(&self) -> (&'static str, &'static str) {
        match self {
            TimerEvent::WorkComplete => ("Start Break", "Not yet"),
            TimerEvent::BreakComplete => ("Start Work", "Not yet"),
            TimerEvent::DeviceMoved => ("Resume", "Cancel Session"),
        }
    }
}

/// Work/Break countdown, one second per `tick`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusTimer {
    phase: Phase,
    remaining: u32,
    running: bool,
    work_secs: u32,
    break_secs: u32,
}

impl Default for FocusTimer {
    fn default() -> Self {
        Self {
            phase: Phase::Work,
            remaining: DEFAULT_WORK_MINUTES * 60,
            running: false,
            work_secs: DEFAULT_WORK_MINUTES * 60,
            break_secs: DEFAULT_BREAK_MINUTES * 60,
        }
    }
}

impl FocusTimer {
    pub fn new(work_minutes: u32, break_minutes: u32) -> Result<Self, AppError> {
        let mut timer = Self::default();
        timer.configure(work_minutes, break_minutes)?;
        Ok(timer)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn duration(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Work => self.work_secs,
            Phase::Break => self.break_secs,
        }
    }

    pub fn work_minutes(&self) -> u32 {
        self.work_secs / 60
    }

    pub fn break_minutes(&self) -> u32 {
        self.break_secs / 60
    }

    /// Fraction of the current phase already elapsed, 0.0..=1.0
    pub fn progress(&self) -> f64 {
        let total = self.duration(self.phase);
        if total == 0 {
            return 1.0;
        }
        (1.0 - self.remaining as f64 / total as f64).clamp(0.0, 1.0)
    }

    /// `MM:SS`
    pub fn clock(&self) -> String {
        format!("{:02}:{:02}", self.remaining / 60, self.remaining % 60)
    }

    /// Advance one second. Reaching zero stops the timer and reports the
    /// finished phase.
    pub fn tick(&mut self) -> Option<TimerEvent> {
        if !self.running || self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        if self.remaining == 0 {
            self.running = false;
            return Some(self.phase.completed());
        }
        None
    }

    /// Switch to the other phase with its full duration and start it
    pub fn start_next_phase(&mut self) {
        self.phase = self.phase.other();
        self.remaining = self.duration(self.phase);
        self.running = true;
    }

    /// Stay stopped at zero in the finished phase
    pub fn decline_next_phase(&mut self) {
        self.running = false;
    }

    /// Start or pause. Starting a finished phase offers the transition again.
    pub fn toggle(&mut self) -> Option<TimerEvent> {
        if self.running {
            self.running = false;
            return None;
        }
        if self.remaining == 0 {
            return Some(self.phase.completed());
        }
        self.running = true;
        None
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    pub fn resume(&mut self) {
        if self.remaining > 0 {
            self.running = true;
        }
    }

    pub fn reset(&mut self) {
        self.phase = Phase::Work;
        self.remaining = self.work_secs;
        self.running = false;
    }

    /// Set durations in minutes. A stopped timer reloads the active phase;
    /// a running one keeps its countdown and uses the new values from the
    /// next phase on.
    pub fn configure(&mut self, work_minutes: u32, break_minutes: u32) -> Result<(), AppError> {
        if work_minutes == 0 || break_minutes == 0 {
            return Err(AppError::validation("Work and break durations must be at least 1 minute"));
        }
        if work_minutes > MAX_PHASE_MINUTES || break_minutes > MAX_PHASE_MINUTES {
            return Err(AppError::validation(format!(
                "Work and break durations must be at most {MAX_PHASE_MINUTES} minutes"
            )));
        }
        self.work_secs = work_minutes * 60;
        self.break_secs = break_minutes * 60;
        if !self.running {
            self.remaining = self.duration(self.phase);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(timer: &mut FocusTimer, ticks: u32) -> Vec<TimerEvent> {
        (0..ticks).filter_map(|_| timer.tick()).collect()
    }

    #[test]
    fn test_defaults() {
        let timer = FocusTimer::default();
        assert_eq!(timer.phase(), Phase::Work);
        assert_eq!(timer.remaining(), 1500);
        assert!(!timer.is_running());
        assert_eq!(timer.clock(), "25:00");
    }

    #[test]
    fn test_stopped_timer_does_not_count() {
        let mut timer = FocusTimer::default();
        assert!(run(&mut timer, 10).is_empty());
        assert_eq!(timer.remaining(), 1500);
    }

    #[test]
    fn test_work_completes_after_full_duration() {
        let mut timer = FocusTimer::default();
        timer.toggle();

        assert!(run(&mut timer, 1499).is_empty());
        assert_eq!(timer.remaining(), 1);
        assert_eq!(timer.tick(), Some(TimerEvent::WorkComplete));
        assert_eq!(timer.remaining(), 0);
        assert!(!timer.is_running());
        assert_eq!(timer.tick(), None);
    }

    #[test]
    fn test_accepting_starts_break() {
        let mut timer = FocusTimer::default();
        timer.toggle();
        run(&mut timer, 1500);

        timer.start_next_phase();
        assert_eq!(timer.phase(), Phase::Break);
        assert_eq!(timer.remaining(), 300);
        assert!(timer.is_running());

        assert_eq!(run(&mut timer, 300), vec![TimerEvent::BreakComplete]);
        timer.start_next_phase();
        assert_eq!(timer.phase(), Phase::Work);
        assert_eq!(timer.remaining(), 1500);
    }

    #[test]
    fn test_declining_stays_at_zero() {
        let mut timer = FocusTimer::new(1, 1).unwrap();
        timer.toggle();
        run(&mut timer, 60);

        timer.decline_next_phase();
        assert_eq!(timer.phase(), Phase::Work);
        assert_eq!(timer.remaining(), 0);
        assert!(!timer.is_running());

        // starting again re-offers the break
        assert_eq!(timer.toggle(), Some(TimerEvent::WorkComplete));
        assert!(!timer.is_running());
    }

    #[test]
    fn test_reset_from_any_state() {
        let mut timer = FocusTimer::new(2, 1).unwrap();
        timer.toggle();
        run(&mut timer, 120);
        timer.start_next_phase();
        run(&mut timer, 10);

        timer.reset();
        assert_eq!(timer.phase(), Phase::Work);
        assert_eq!(timer.remaining(), 120);
        assert!(!timer.is_running());
    }

    #[test]
    fn test_configure_reloads_stopped_phase() {
        let mut timer = FocusTimer::default();
        timer.configure(50, 10).unwrap();
        assert_eq!(timer.remaining(), 3000);

        timer.toggle();
        run(&mut timer, 5);
        timer.configure(30, 10).unwrap();
        assert_eq!(timer.remaining(), 2995);

        timer.pause();
        timer.configure(30, 10).unwrap();
        assert_eq!(timer.remaining(), 1800);
        assert_eq!(timer.work_minutes(), 30);
    }

    #[test]
    fn test_configure_rejects_zero() {
        let mut timer = FocusTimer::default();
        assert!(timer.configure(0, 5).is_err());
        assert!(FocusTimer::new(25, 0).is_err());
        assert_eq!(timer.remaining(), 1500);
    }

    #[test]
    fn test_configure_rejects_more_than_a_day() {
        let mut timer = FocusTimer::default();
        assert!(timer.configure(99_999_999, 5).is_err());
        assert!(timer.configure(25, u32::MAX).is_err());
        assert!(FocusTimer::new(MAX_PHASE_MINUTES + 1, 5).is_err());
        assert_eq!(timer.work_minutes(), 25);

        timer.configure(MAX_PHASE_MINUTES, 5).unwrap();
        assert_eq!(timer.remaining(), MAX_PHASE_MINUTES * 60);
    }

    #[test]
    fn test_progress_and_clock() {
        let mut timer = FocusTimer::new(1, 1).unwrap();
        timer.toggle();
        run(&mut timer, 15);
        assert_eq!(timer.clock(), "00:45");
        assert!((timer.progress() - 0.25).abs() < 1e-9);
    }
}
