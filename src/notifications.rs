//! Sound cues for the focus timer and desktop reminders for due tasks

use crate::domain::Task;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::io::Write;
use std::process::{Command, Stdio};
use std::thread;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    /// A Work or Break phase finished
    Transition,
    /// The device moved during a Work phase
    DeviceMoved,
}

impl SoundCue {
    #[cfg(target_os = "macos")]
    fn system_sound(&self) -> &'static str {
        match self {
            SoundCue::Transition => "/System/Library/Sounds/Glass.aiff",
            SoundCue::DeviceMoved => "/System/Library/Sounds/Basso.aiff",
        }
    }
}

/// Plays cues without blocking the board loop
#[derive(Debug, Clone, Copy)]
pub struct SoundPlayer {
    enabled: bool,
}

impl SoundPlayer {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    #[cfg(test)]
    pub fn silent() -> Self {
        Self { enabled: false }
    }

    pub fn play(&self, cue: SoundCue) {
        if !self.enabled {
            return;
        }
        debug!(?cue, "playing sound cue");

        #[cfg(target_os = "macos")]
        {
            let mut afplay = Command::new("afplay");
            afplay.arg(cue.system_sound());
            if spawn_reaped(afplay) {
                return;
            }
        }

        let bells: &[u8] = match cue {
            SoundCue::Transition => b"\x07",
            SoundCue::DeviceMoved => b"\x07\x07",
        };
        let mut stdout = std::io::stdout();
        let _ = stdout.write_all(bells);
        let _ = stdout.flush();
    }
}

/// Send a desktop notification that a task's reminder time has come
pub fn notify_reminder(task: &Task) {
    let body = format!("{} (due {})", task.title, task.due_formatted());

    #[cfg(target_os = "macos")]
    {
        let script = format!(
            r#"display notification "{}" with title "tend - Reminder""#,
            body.replace('"', "\\\"")
        );
        let mut osascript = Command::new("osascript");
        osascript.arg("-e").arg(&script);
        spawn_reaped(osascript);
    }

    #[cfg(target_os = "linux")]
    {
        let mut notify = Command::new("notify-send");
        notify.arg("tend - Reminder").arg(&body);
        spawn_reaped(notify);
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        let _ = body;
    }
}

/// Start a helper process without blocking; a thread waits on it so it
/// never lingers as a zombie. Returns whether it started.
#[cfg_attr(not(any(target_os = "macos", target_os = "linux")), allow(dead_code))]
fn spawn_reaped(mut command: Command) -> bool {
    command.stdout(Stdio::null()).stderr(Stdio::null());
    match command.spawn() {
        Ok(mut child) => {
            thread::spawn(move || {
                let _ = child.wait();
            });
            true
        }
        Err(error) => {
            debug!(%error, program = ?command.get_program(), "helper did not start");
            false
        }
    }
}

/// Decides which reminders fire. Each open task fires once, when its
/// reminder time falls after the moment the board opened.
#[derive(Debug, Clone)]
pub struct Reminders {
    since: DateTime<Utc>,
    fired: HashSet<String>,
}

impl Reminders {
    pub fn new(since: DateTime<Utc>) -> Self {
        Self {
            since,
            fired: HashSet::new(),
        }
    }

    /// Tasks whose reminder came due up to `now` and hasn't fired yet
    pub fn due<'a>(&mut self, tasks: &'a [Task], now: DateTime<Utc>) -> Vec<&'a Task> {
        let due: Vec<&Task> = tasks
            .iter()
            .filter(|t| !t.completed)
            .filter(|t| t.reminder > self.since && t.reminder <= now)
            .filter(|t| !self.fired.contains(&t.id))
            .collect();
        for task in &due {
            self.fired.insert(task.id.clone());
        }
        due
    }
}
