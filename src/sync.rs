//! Runs remote calls off the board loop and keeps only the freshest answers

use crate::domain::{NewTask, Task, TaskPatch};
use crate::error::AppError;
use crate::services::Services;
use crate::weather::Weather;
use std::future::Future;
use tokio::runtime::Runtime;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tracing::debug;

/// Identifies one request of a fetch kind; larger is newer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchToken(u64);

/// Hands out tokens for one kind of fetch and accepts only the latest
#[derive(Debug, Default)]
pub struct FetchGate {
    latest: u64,
    name: &'static str,
}

impl FetchGate {
    pub fn new(name: &'static str) -> Self {
        Self { latest: 0, name }
    }

    /// Token for a new request. Every earlier token becomes stale.
    pub fn issue(&mut self) -> FetchToken {
        self.latest += 1;
        FetchToken(self.latest)
    }

    pub fn is_current(&self, token: FetchToken) -> bool {
        token.0 == self.latest
    }

    /// Whether a response carrying `token` may be applied
    pub fn accept(&self, token: FetchToken) -> bool {
        let current = self.is_current(token);
        if !current {
            debug!(fetch = self.name, token = token.0, latest = self.latest, "dropping stale response");
        }
        current
    }
}

/// Kind of write, and what to say once it lands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveAction {
    Added,
    Edited,
    Completed,
    /// Completed from the focus screen, which closes on success
    CompletedInFocus,
    Reopened,
    Deleted,
}

impl SaveAction {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Added => "Task added successfully!",
            Self::Edited => "Task updated successfully",
            Self::Completed | Self::CompletedInFocus => "Task marked as completed",
            Self::Reopened => "Task moved back to pending",
            Self::Deleted => "Task deleted successfully",
        }
    }
}

/// Work the board asks for; run by [`Worker::run`]
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    LoadTasks(FetchToken),
    LoadWeather(FetchToken),
    Add(NewTask),
    Edit { id: String, patch: TaskPatch },
    Complete { id: String, in_focus: bool },
    Reopen(String),
    Delete(String),
}

/// What a finished background call produced
#[derive(Debug)]
pub enum Outcome {
    Tasks(FetchToken, Result<Vec<Task>, AppError>),
    Weather(FetchToken, Result<Weather, AppError>),
    /// A create, update or delete finished
    Saved {
        action: SaveAction,
        result: Result<(), AppError>,
    },
}

/// Owns the tokio runtime for the board and the channel its results come
/// back on
pub struct Worker {
    runtime: Runtime,
    sender: UnboundedSender<Outcome>,
    receiver: UnboundedReceiver<Outcome>,
}

impl Worker {
    pub fn new() -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("tend-worker")
            .enable_all()
            .build()?;
        let (sender, receiver) = mpsc::unbounded_channel();
        Ok(Self {
            runtime,
            sender,
            receiver,
        })
    }

    /// Run `job` in the background and post its outcome
    pub fn spawn<F>(&self, job: F)
    where
        F: Future<Output = Outcome> + Send + 'static,
    {
        let sender = self.sender.clone();
        self.runtime.spawn(async move {
            // the board may already be gone
            let _ = sender.send(job.await);
        });
    }

    /// Start `request` against `services` in the background
    pub fn run(&self, services: &Services, request: Request) {
        let services = services.clone();
        debug!(?request, "dispatching");
        self.spawn(async move {
            match request {
                Request::LoadTasks(token) => Outcome::Tasks(token, services.load_tasks().await),
                Request::LoadWeather(token) => Outcome::Weather(token, services.fetch_weather().await),
                Request::Add(task) => Outcome::Saved {
                    action: SaveAction::Added,
                    result: services.add_task(task).await.map(|_| ()),
                },
                Request::Edit { id, patch } => Outcome::Saved {
                    action: SaveAction::Edited,
                    result: services.edit_task(&id, patch).await,
                },
                Request::Complete { id, in_focus } => Outcome::Saved {
                    action: if in_focus {
                        SaveAction::CompletedInFocus
                    } else {
                        SaveAction::Completed
                    },
                    result: services.complete_task(&id).await,
                },
                Request::Reopen(id) => Outcome::Saved {
                    action: SaveAction::Reopened,
                    result: services.reopen_task(&id).await,
                },
                Request::Delete(id) => Outcome::Saved {
                    action: SaveAction::Deleted,
                    result: services.delete_task(&id).await,
                },
            }
        });
    }

    /// Outcomes that arrived since the last call, without blocking
    pub fn drain(&mut self) -> Vec<Outcome> {
        let mut outcomes = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(outcome) => outcomes.push(outcome),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        outcomes
    }

    /// Run a future to completion on the worker runtime
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}
