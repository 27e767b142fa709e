use crate::config::FocusConfig;
use crate::domain::{bucketize, title_matches, Bucket, Category, NewTask, Priority, Screen, Tag, TagSet, Task, TaskPatch, TodaySummary, UiMode};
use crate::error::AppError;
use crate::focus::{self, FocusExit, FocusSession, FocusTimer};
use crate::notifications::{self, Reminders, SoundPlayer};
use crate::store::StoreError;
use crate::sync::{FetchGate, Outcome, Request, SaveAction};
use crate::weather::Weather;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Format of the due date and reminder fields
pub const DATE_INPUT_FORMAT: &str = "%Y-%m-%d %H:%M";

/// How long a success message stays in the status line
const STATUS_TTL: Duration = Duration::from_secs(4);

/// Blocking prompt over the board
#[derive(Debug, Clone, PartialEq)]
pub enum ModalState {
    Error { title: &'static str, message: String },
    ConfirmDelete { task_id: String, title: String },
}

/// Weather panel on the home screen
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherState {
    Loading,
    Ready(Weather),
    Failed(String),
}

/// Fields of the add/edit form, in Tab order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Description,
    Subtask,
    Priority,
    Category,
    Due,
    Reminder,
}

impl FormField {
    pub const ALL: [FormField; 7] = [
        FormField::Title,
        FormField::Description,
        FormField::Subtask,
        FormField::Priority,
        FormField::Category,
        FormField::Due,
        FormField::Reminder,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::Description => "Description",
            Self::Subtask => "Subtask",
            Self::Priority => "Priority",
            Self::Category => "Category",
            Self::Due => "Due (YYYY-MM-DD HH:MM)",
            Self::Reminder => "Reminder (YYYY-MM-DD HH:MM)",
        }
    }

    /// Picked with ←/→ instead of typed
    pub fn is_choice(&self) -> bool {
        matches!(self, Self::Priority | Self::Category)
    }

    fn step(&self, forward: bool) -> Self {
        let index = Self::ALL.iter().position(|f| f == self).unwrap_or(0);
        let len = Self::ALL.len();
        let next = if forward { (index + 1) % len } else { (index + len - 1) % len };
        Self::ALL[next]
    }
}

/// Input form state for adding or editing a task
#[derive(Debug, Clone, PartialEq)]
pub struct InputFormState {
    /// Id of the task being edited, `None` when adding
    pub editing: Option<String>,
    pub title: String,
    pub description: String,
    pub subtask: String,
    pub priority: Priority,
    pub category: Category,
    pub due: String,
    pub reminder: String,
    pub field: FormField,
    pub error: Option<String>,
}

impl InputFormState {
    /// Empty form, due and reminded at `now`
    pub fn blank(now: DateTime<Local>) -> Self {
        let when = now.format(DATE_INPUT_FORMAT).to_string();
        Self {
            editing: None,
            title: String::new(),
            description: String::new(),
            subtask: String::new(),
            priority: Priority::default(),
            category: Category::default(),
            due: when.clone(),
            reminder: when,
            field: FormField::Title,
            error: None,
        }
    }

    pub fn from_task(task: &Task) -> Self {
        Self {
            editing: Some(task.id.clone()),
            title: task.title.clone(),
            description: task.description.clone(),
            subtask: task.subtask.clone(),
            priority: task.priority,
            category: task.category,
            due: task.due_date.with_timezone(&Local).format(DATE_INPUT_FORMAT).to_string(),
            reminder: task.reminder.with_timezone(&Local).format(DATE_INPUT_FORMAT).to_string(),
            field: FormField::Title,
            error: None,
        }
    }

    fn text_mut(&mut self) -> Option<&mut String> {
        match self.field {
            FormField::Title => Some(&mut self.title),
            FormField::Description => Some(&mut self.description),
            FormField::Subtask => Some(&mut self.subtask),
            FormField::Due => Some(&mut self.due),
            FormField::Reminder => Some(&mut self.reminder),
            FormField::Priority | FormField::Category => None,
        }
    }

    pub fn push_char(&mut self, c: char) {
        if let Some(text) = self.text_mut() {
            text.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(text) = self.text_mut() {
            text.pop();
        }
    }

    pub fn next_field(&mut self) {
        self.field = self.field.step(true);
    }

    pub fn previous_field(&mut self) {
        self.field = self.field.step(false);
    }

    /// Step the priority or category choice
    pub fn cycle_choice(&mut self, forward: bool) {
        match self.field {
            FormField::Priority => self.priority = cycle(Priority::all(), self.priority, forward),
            FormField::Category => self.category = cycle(Category::all(), self.category, forward),
            _ => {}
        }
    }

    /// Draft for a new task. The owner is assigned when it is stored.
    pub fn to_new_task(&self) -> Result<NewTask, AppError> {
        let due = parse_local(&self.due, "due date")?;
        let mut task = NewTask::new(String::new(), self.title.trim(), due);
        task.description = self.description.clone();
        task.subtask = self.subtask.clone();
        task.priority = self.priority;
        task.category = self.category;
        task.reminder = parse_local(&self.reminder, "reminder")?;
        Ok(task)
    }

    /// Every editable field, as saved by the task details screen
    pub fn to_patch(&self) -> Result<TaskPatch, AppError> {
        Ok(TaskPatch {
            title: Some(self.title.trim().to_string()),
            description: Some(self.description.clone()),
            subtask: Some(self.subtask.clone()),
            priority: Some(self.priority),
            category: Some(self.category),
            due_date: Some(parse_local(&self.due, "due date")?),
            reminder: Some(parse_local(&self.reminder, "reminder")?),
            ..TaskPatch::default()
        })
    }
}

/// Work and break minutes being edited on the focus screen
#[derive(Debug, Clone, PartialEq)]
pub struct FocusSettingsForm {
    pub work: String,
    pub rest: String,
    /// `false` edits work minutes, `true` break minutes
    pub on_break: bool,
    pub error: Option<String>,
}

fn cycle<T: Copy + PartialEq>(all: &[T], current: T, forward: bool) -> T {
    let index = all.iter().position(|v| *v == current).unwrap_or(0);
    let next = if forward {
        (index + 1) % all.len()
    } else {
        (index + all.len() - 1) % all.len()
    };
    all[next]
}

/// Parse `YYYY-MM-DD HH:MM` in local time
pub fn parse_local(text: &str, what: &str) -> Result<DateTime<Utc>, AppError> {
    let invalid = || AppError::validation(format!("Please enter the {what} as YYYY-MM-DD HH:MM"));
    let naive = NaiveDateTime::parse_from_str(text.trim(), DATE_INPUT_FORMAT).map_err(|_| invalid())?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(invalid)
}

/// Main application state
pub struct AppState {
    pub tasks: Vec<Task>,
    /// A task fetch is in flight and nothing has arrived yet
    pub loading: bool,
    pub screen: Screen,
    /// Screen to return to when the focus screen closes
    pub return_screen: Screen,
    pub bucket: Bucket,
    pub selected_index: usize,
    pub ui_mode: UiMode,
    pub modal: Option<ModalState>,
    pub input_form: Option<InputFormState>,
    pub focus_form: Option<FocusSettingsForm>,
    pub query: String,
    pub tags: TagSet,
    pub tag_cursor: usize,
    pub weather: WeatherState,
    pub focus: Option<FocusSession>,
    pub status: Option<(String, Instant)>,
    /// Email of the signed-in user, for the header
    pub account: String,
    pub use_emoji: bool,
    focus_config: FocusConfig,
    reminders: Option<Reminders>,
    task_gate: FetchGate,
    weather_gate: FetchGate,
    requests: Vec<Request>,
}

impl AppState {
    pub fn new(account: impl Into<String>, focus_config: FocusConfig, use_emoji: bool, reminders: bool) -> Self {
        Self {
            tasks: Vec::new(),
            loading: false,
            screen: Screen::Home,
            return_screen: Screen::Home,
            bucket: Bucket::Today,
            selected_index: 0,
            ui_mode: UiMode::Normal,
            modal: None,
            input_form: None,
            focus_form: None,
            query: String::new(),
            tags: TagSet::new(),
            tag_cursor: 0,
            weather: WeatherState::Loading,
            focus: None,
            status: None,
            account: account.into(),
            use_emoji,
            focus_config,
            reminders: reminders.then(|| Reminders::new(Utc::now())),
            task_gate: FetchGate::new("tasks"),
            weather_gate: FetchGate::new("weather"),
            requests: Vec::new(),
        }
    }

    /// Requests queued since the last call, for the worker
    pub fn take_requests(&mut self) -> Vec<Request> {
        std::mem::take(&mut self.requests)
    }

    // ---- views ----

    /// Rows of the current screen, in display order
    pub fn visible_tasks(&self) -> Vec<&Task> {
        let now = Local::now();
        match self.screen {
            Screen::Home => {
                let summary = TodaySummary::new(&self.tasks, &now);
                summary.pending.into_iter().chain(summary.completed).collect()
            }
            Screen::Tasks => bucketize(&self.tasks, &now).get(self.bucket).to_vec(),
            Screen::Search => self
                .tasks
                .iter()
                .filter(|task| title_matches(task, &self.query) && self.tags.matches(task))
                .collect(),
            Screen::Focus => Vec::new(),
        }
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.visible_tasks().get(self.selected_index).copied()
    }

    fn selected_id(&self) -> Option<String> {
        self.selected_task().map(|task| task.id.clone())
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    fn clamp_selection(&mut self) {
        let len = self.visible_tasks().len();
        if self.selected_index >= len {
            self.selected_index = len.saturating_sub(1);
        }
    }

    // ---- navigation ----

    pub fn move_selection_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    pub fn move_selection_down(&mut self) {
        let len = self.visible_tasks().len();
        if self.selected_index + 1 < len {
            self.selected_index += 1;
        }
    }

    /// Switch between Home, Tasks and Search. The focus screen is left
    /// through its own cancel flow.
    pub fn show_screen(&mut self, screen: Screen) {
        if self.screen == Screen::Focus || screen == Screen::Focus {
            return;
        }
        self.screen = screen;
        self.selected_index = 0;
    }

    pub fn next_screen(&mut self) {
        let next = match self.screen {
            Screen::Home => Screen::Tasks,
            Screen::Tasks => Screen::Search,
            Screen::Search | Screen::Focus => Screen::Home,
        };
        self.show_screen(next);
    }

    pub fn next_bucket(&mut self) {
        self.bucket = self.bucket.next();
        self.selected_index = 0;
    }

    // ---- search ----

    pub fn start_query(&mut self) {
        self.ui_mode = UiMode::EditingQuery;
    }

    pub fn query_push(&mut self, c: char) {
        self.query.push(c);
        self.selected_index = 0;
    }

    pub fn query_backspace(&mut self) {
        self.query.pop();
        self.selected_index = 0;
    }

    pub fn finish_query(&mut self) {
        self.ui_mode = UiMode::Normal;
    }

    pub fn move_tag_cursor(&mut self, forward: bool) {
        let len = Tag::all().len();
        self.tag_cursor = if forward {
            (self.tag_cursor + 1) % len
        } else {
            (self.tag_cursor + len - 1) % len
        };
    }

    pub fn toggle_tag_at_cursor(&mut self) {
        if let Some(tag) = Tag::all().get(self.tag_cursor) {
            self.tags.toggle(*tag);
            self.selected_index = 0;
        }
    }

    pub fn clear_filters(&mut self) {
        self.query.clear();
        self.tags.clear();
        self.selected_index = 0;
    }

    // ---- fetches ----

    pub fn refresh_tasks(&mut self) {
        let token = self.task_gate.issue();
        self.loading = self.tasks.is_empty();
        self.requests.push(Request::LoadTasks(token));
    }

    pub fn refresh_weather(&mut self) {
        let token = self.weather_gate.issue();
        self.weather = WeatherState::Loading;
        self.requests.push(Request::LoadWeather(token));
    }

    /// Apply a finished background call. Stale fetches are dropped.
    pub fn apply(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Tasks(token, result) => {
                if !self.task_gate.accept(token) {
                    return;
                }
                self.loading = false;
                match result {
                    Ok(tasks) => {
                        debug!(count = tasks.len(), "tasks loaded");
                        self.tasks = tasks;
                        self.clamp_selection();
                    }
                    Err(error) => {
                        warn!(%error, kind = error.kind().label(), "task fetch failed");
                        let message = match &error {
                            AppError::Store(StoreError::Unauthenticated) => error.user_message(),
                            _ => "Failed to fetch tasks. Please try again.".to_string(),
                        };
                        self.show_error("Error", message);
                    }
                }
            }
            Outcome::Weather(token, result) => {
                if !self.weather_gate.accept(token) {
                    return;
                }
                self.weather = match result {
                    Ok(weather) => WeatherState::Ready(weather),
                    Err(error) => {
                        warn!(%error, kind = error.kind().label(), "weather fetch failed");
                        WeatherState::Failed(error.user_message())
                    }
                };
            }
            Outcome::Saved { action, result } => match result {
                Ok(()) => {
                    info!(?action, "saved");
                    self.flash(action.message());
                    if action == SaveAction::CompletedInFocus {
                        self.close_focus();
                    }
                    self.refresh_tasks();
                }
                Err(error) => {
                    warn!(%error, ?action, kind = error.kind().label(), "save failed");
                    self.show_error("Error", error.user_message());
                }
            },
        }
    }

    // ---- messages ----

    pub fn flash(&mut self, message: impl Into<String>) {
        self.status = Some((message.into(), Instant::now()));
    }

    pub fn show_error(&mut self, title: &'static str, message: impl Into<String>) {
        self.modal = Some(ModalState::Error {
            title,
            message: message.into(),
        });
        self.ui_mode = UiMode::Modal;
    }

    /// Close the open modal. Accepting a delete confirmation deletes.
    pub fn answer_modal(&mut self, accept: bool) {
        if let Some(ModalState::ConfirmDelete { task_id, .. }) = self.modal.take() {
            if accept {
                self.requests.push(Request::Delete(task_id));
            }
        }
        self.ui_mode = UiMode::Normal;
    }

    // ---- task actions ----

    /// Complete the selected task, or move a completed one back to pending
    pub fn toggle_complete_selected(&mut self) {
        let Some(task) = self.selected_task() else {
            return;
        };
        let request = if task.completed {
            Request::Reopen(task.id.clone())
        } else {
            Request::Complete {
                id: task.id.clone(),
                in_focus: false,
            }
        };
        self.requests.push(request);
    }

    pub fn request_delete_selected(&mut self) {
        if let Some(task) = self.selected_task() {
            self.modal = Some(ModalState::ConfirmDelete {
                task_id: task.id.clone(),
                title: task.title.clone(),
            });
            self.ui_mode = UiMode::Modal;
        }
    }

    pub fn start_add_task(&mut self) {
        self.input_form = Some(InputFormState::blank(Local::now()));
        self.ui_mode = UiMode::AddingTask;
    }

    pub fn start_edit_task(&mut self) {
        if let Some(task) = self.selected_task() {
            self.input_form = Some(InputFormState::from_task(task));
            self.ui_mode = UiMode::EditingTask;
        }
    }

    /// Queue the form's task. Bad dates keep the form open with a message.
    pub fn submit_input_form(&mut self) {
        let Some(form) = self.input_form.as_mut() else {
            return;
        };
        let request = match &form.editing {
            Some(id) => form.to_patch().map(|patch| Request::Edit { id: id.clone(), patch }),
            None => form.to_new_task().map(Request::Add),
        };
        match request {
            Ok(request) => {
                self.requests.push(request);
                self.input_form = None;
                self.ui_mode = UiMode::Normal;
            }
            Err(error) => form.error = Some(error.user_message()),
        }
    }

    pub fn cancel_input_form(&mut self) {
        self.input_form = None;
        self.ui_mode = UiMode::Normal;
    }

    // ---- focus ----

    /// Open the focus screen for the selected task
    pub fn open_focus(&mut self) {
        if let Some(id) = self.selected_id() {
            self.open_focus_for(&id);
        }
    }

    pub fn open_focus_for(&mut self, task_id: &str) {
        let Some(task) = self.task(task_id) else {
            self.show_error("Error", "That task no longer exists.");
            return;
        };
        let (id, title) = (task.id.clone(), task.title.clone());

        let timer = match FocusTimer::new(self.focus_config.work_minutes, self.focus_config.break_minutes) {
            Ok(timer) => timer,
            Err(error) => {
                self.show_error("Error", error.user_message());
                return;
            }
        };
        let session = FocusSession::new(
            id,
            title,
            timer,
            focus::motion_source(&self.focus_config),
            Duration::from_millis(self.focus_config.motion_interval_ms),
            SoundPlayer::new(self.focus_config.sounds),
        );

        if self.screen != Screen::Focus {
            self.return_screen = self.screen;
        }
        self.focus = Some(session);
        self.screen = Screen::Focus;
        self.ui_mode = UiMode::Normal;
    }

    pub fn close_focus(&mut self) {
        self.focus = None;
        self.focus_form = None;
        self.screen = self.return_screen;
        self.ui_mode = UiMode::Normal;
        self.clamp_selection();
    }

    pub fn focus_toggle(&mut self) {
        if let Some(focus) = &mut self.focus {
            focus.toggle(Instant::now());
        }
    }

    pub fn focus_reset(&mut self) {
        if let Some(focus) = &mut self.focus {
            focus.reset();
        }
    }

    pub fn focus_request_cancel(&mut self) {
        if let Some(focus) = &mut self.focus {
            focus.request_cancel();
        }
    }

    /// Answer the focus prompt; a confirmed cancel leaves the screen
    pub fn focus_answer(&mut self, accept: bool) {
        let exit = match &mut self.focus {
            Some(focus) => focus.answer(accept, Instant::now()),
            None => return,
        };
        if exit == FocusExit::Cancelled {
            self.close_focus();
        }
    }

    /// Mark the focused task complete; the screen closes once it is saved
    pub fn focus_complete(&mut self) {
        if let Some(focus) = &self.focus {
            self.requests.push(Request::Complete {
                id: focus.task_id().to_string(),
                in_focus: true,
            });
        }
    }

    pub fn start_focus_settings(&mut self) {
        let Some(focus) = &self.focus else {
            return;
        };
        self.focus_form = Some(FocusSettingsForm {
            work: focus.timer().work_minutes().to_string(),
            rest: focus.timer().break_minutes().to_string(),
            on_break: false,
            error: None,
        });
        self.ui_mode = UiMode::FocusSettings;
    }

    pub fn focus_form_push(&mut self, c: char) {
        if let Some(form) = &mut self.focus_form {
            if c.is_ascii_digit() {
                let field = if form.on_break { &mut form.rest } else { &mut form.work };
                field.push(c);
            }
        }
    }

    pub fn focus_form_backspace(&mut self) {
        if let Some(form) = &mut self.focus_form {
            let field = if form.on_break { &mut form.rest } else { &mut form.work };
            field.pop();
        }
    }

    pub fn focus_form_switch(&mut self) {
        if let Some(form) = &mut self.focus_form {
            form.on_break = !form.on_break;
        }
    }

    pub fn submit_focus_settings(&mut self) {
        let (Some(form), Some(focus)) = (self.focus_form.as_mut(), self.focus.as_mut()) else {
            return;
        };
        let work = form.work.parse::<u32>().unwrap_or(0);
        let break_minutes = form.rest.parse::<u32>().unwrap_or(0);
        match focus.configure(work, break_minutes) {
            Ok(()) => {
                self.focus_form = None;
                self.ui_mode = UiMode::Normal;
            }
            Err(error) => form.error = Some(error.user_message()),
        }
    }

    pub fn cancel_focus_settings(&mut self) {
        self.focus_form = None;
        self.ui_mode = UiMode::Normal;
    }

    // ---- clock ----

    pub fn tick(&mut self) {
        self.tick_at(Instant::now(), Utc::now());
    }

    /// Advance the focus session, fire due reminders and expire the status line
    pub fn tick_at(&mut self, now: Instant, wall: DateTime<Utc>) {
        if let Some(focus) = &mut self.focus {
            focus.poll(now);
        }

        if let Some(reminders) = &mut self.reminders {
            for task in reminders.due(&self.tasks, wall) {
                info!(task_id = %task.id, "reminder due");
                notifications::notify_reminder(task);
            }
        }

        if let Some((_, shown)) = &self.status {
            if now.saturating_duration_since(*shown) >= STATUS_TTL {
                self.status = None;
            }
        }
    }
}
