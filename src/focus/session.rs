use super::motion::{MotionSource, StabilityMonitor};
use super::timer::{FocusTimer, TimerEvent};
use crate::notifications::{SoundCue, SoundPlayer};
use crate::ticker::Ticker;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Question currently shown over the focus screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    /// A phase finished; offer the next one
    Transition(TimerEvent),
    /// The device moved during Work; resume or cancel
    Moved,
    /// "Are you sure you want to cancel this Pomodoro session?"
    ConfirmCancel,
}

impl Prompt {
    pub fn title(&self) -> &'static str {
        match self {
            Prompt::Transition(event) => event.title(),
            Prompt::Moved => TimerEvent::DeviceMoved.title(),
            Prompt::ConfirmCancel => "Cancel Pomodoro",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Prompt::Transition(event) => event.message(),
            Prompt::Moved => TimerEvent::DeviceMoved.message(),
            Prompt::ConfirmCancel => "Are you sure you want to cancel this Pomodoro session?",
        }
    }

    pub fn answers(&self) -> (&'static str, &'static str) {
        match self {
            Prompt::Transition(event) => event.answers(),
            Prompt::Moved => TimerEvent::DeviceMoved.answers(),
            Prompt::ConfirmCancel => ("Yes", "No"),
        }
    }
}

/// Result of answering a prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusExit {
    Stay,
    Cancelled,
}

/// Focus screen state for one task. Owns the countdown, the motion sensor
/// and both schedules; dropping it stops all of them.
pub struct FocusSession {
    task_id: String,
    task_title: String,
    timer: FocusTimer,
    monitor: StabilityMonitor,
    source: Box<dyn MotionSource>,
    clock: Ticker,
    motion_clock: Ticker,
    sounds: SoundPlayer,
    prompt: Option<Prompt>,
    /// The countdown was running when the cancel confirmation opened
    resume_on_decline: bool,
    sensor_failed: bool,
}

impl FocusSession {
    pub fn new(
        task_id: impl Into<String>,
        task_title: impl Into<String>,
        timer: FocusTimer,
        source: Box<dyn MotionSource>,
        motion_interval: Duration,
        sounds: SoundPlayer,
    ) -> Self {
        Self::starting_at(task_id, task_title, timer, source, motion_interval, sounds, Instant::now())
    }

    pub fn starting_at(
        task_id: impl Into<String>,
        task_title: impl Into<String>,
        timer: FocusTimer,
        source: Box<dyn MotionSource>,
        motion_interval: Duration,
        sounds: SoundPlayer,
        start: Instant,
    ) -> Self {
        let task_id = task_id.into();
        debug!(task_id = %task_id, sensor = %source.describe(), "focus session opened");
        Self {
            task_id,
            task_title: task_title.into(),
            timer,
            monitor: StabilityMonitor::default(),
            source,
            clock: Ticker::starting_at(Duration::from_secs(1), start),
            motion_clock: Ticker::starting_at(motion_interval, start),
            sounds,
            prompt: None,
            resume_on_decline: false,
            sensor_failed: false,
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn task_title(&self) -> &str {
        &self.task_title
    }

    pub fn timer(&self) -> &FocusTimer {
        &self.timer
    }

    pub fn prompt(&self) -> Option<Prompt> {
        self.prompt
    }

    pub fn device_stable(&self) -> bool {
        self.monitor.is_stable()
    }

    /// Run every countdown tick and motion sample due by `now`
    pub fn poll(&mut self, now: Instant) -> Vec<TimerEvent> {
        let mut events = Vec::new();

        for _ in 0..self.clock.due(now) {
            if let Some(event) = self.timer.tick() {
                events.push(event);
            }
        }

        for _ in 0..self.motion_clock.due(now) {
            match self.source.sample() {
                Ok(sample) => {
                    if let Some(event) = self.monitor.observe(sample, &self.timer) {
                        self.timer.pause();
                        events.push(event);
                    }
                }
                Err(error) => {
                    if !self.sensor_failed {
                        warn!(%error, "motion sensor read failed");
                        self.sensor_failed = true;
                    }
                }
            }
        }

        for event in &events {
            self.raise(*event);
        }
        events
    }

    fn raise(&mut self, event: TimerEvent) {
        match event {
            TimerEvent::WorkComplete | TimerEvent::BreakComplete => {
                self.sounds.play(SoundCue::Transition);
                self.prompt = Some(Prompt::Transition(event));
            }
            TimerEvent::DeviceMoved => {
                self.sounds.play(SoundCue::DeviceMoved);
                self.prompt = Some(Prompt::Moved);
            }
        }
        debug!(?event, task_id = %self.task_id, "focus event");
    }

    /// Start/pause. A finished phase re-offers its transition instead.
    pub fn toggle(&mut self, now: Instant) {
        if self.prompt.is_some() {
            return;
        }
        if let Some(event) = self.timer.toggle() {
            self.raise(event);
        } else if self.timer.is_running() {
            self.clock.restart(now);
        }
    }

    pub fn reset(&mut self) {
        self.timer.reset();
        self.prompt = None;
        self.resume_on_decline = false;
    }

    pub fn configure(&mut self, work_minutes: u32, break_minutes: u32) -> Result<(), crate::error::AppError> {
        self.timer.configure(work_minutes, break_minutes)
    }

    /// Ask for confirmation before leaving without completing the task
    pub fn request_cancel(&mut self) {
        self.resume_on_decline = self.timer.is_running();
        self.timer.pause();
        self.prompt = Some(Prompt::ConfirmCancel);
    }

    /// Answer the open prompt with its first (`true`) or second option
    pub fn answer(&mut self, accept: bool, now: Instant) -> FocusExit {
        let Some(prompt) = self.prompt.take() else {
            return FocusExit::Stay;
        };

        match (prompt, accept) {
            (Prompt::Transition(_), true) => {
                self.timer.start_next_phase();
                self.clock.restart(now);
            }
            (Prompt::Transition(_), false) => self.timer.decline_next_phase(),
            (Prompt::Moved, true) => {
                self.timer.resume();
                self.clock.restart(now);
            }
            (Prompt::Moved, false) => {
                self.resume_on_decline = false;
                self.prompt = Some(Prompt::ConfirmCancel);
            }
            (Prompt::ConfirmCancel, true) => return FocusExit::Cancelled,
            (Prompt::ConfirmCancel, false) => {
                if std::mem::take(&mut self.resume_on_decline) {
                    self.timer.resume();
                    self.clock.restart(now);
                }
            }
        }
        FocusExit::Stay
    }
}

impl Drop for FocusSession {
    fn drop(&mut self) {
        debug!(task_id = %self.task_id, "focus session closed");
    }
}
