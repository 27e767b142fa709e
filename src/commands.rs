//! One-shot command handlers: run a single action and print the result

use crate::app::parse_local;
use crate::auth::AuthSession;
use crate::domain::{bucketize, completion_rate, filter, Bucket, Category, NewTask, Priority, Tag, TagSet, Task, TaskPatch};
use crate::error::AppError;
use crate::services::Services;
use crate::sync::Worker;
use anyhow::{anyhow, bail, Result};
use chrono::{Local, Utc};
use clap::Args;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::future::Future;
use std::io::{self, BufRead, IsTerminal, Write};
use tracing::debug;

/// Optional task fields shared by `add` and `edit`
#[derive(Args, Debug, Default, Clone)]
pub struct TaskFields {
    #[arg(short, long)]
    pub description: Option<String>,
    #[arg(long)]
    pub subtask: Option<String>,
    /// Low, Medium or High
    #[arg(short, long)]
    pub priority: Option<String>,
    /// Personal, Work, Study, Health, Shopping or Other
    #[arg(short, long)]
    pub category: Option<String>,
    /// Local time, YYYY-MM-DD HH:MM
    #[arg(long)]
    pub due: Option<String>,
    /// Local time, YYYY-MM-DD HH:MM
    #[arg(long)]
    pub reminder: Option<String>,
}

impl TaskFields {
    /// Patch with the given fields; names and dates are validated
    pub fn to_patch(&self) -> Result<TaskPatch> {
        let priority = self
            .priority
            .as_deref()
            .map(|name| Priority::from_name(name).ok_or_else(|| anyhow!("Unknown priority: {name} (Low, Medium, High)")))
            .transpose()?;
        let category = self
            .category
            .as_deref()
            .map(|name| {
                let names: Vec<&str> = Category::all().iter().map(|c| c.name()).collect();
                Category::from_name(name).ok_or_else(|| anyhow!("Unknown category: {name} ({})", names.join(", ")))
            })
            .transpose()?;
        let due_date = self.due.as_deref().map(|text| parse_local(text, "due date")).transpose()?;
        let reminder = self.reminder.as_deref().map(|text| parse_local(text, "reminder")).transpose()?;

        Ok(TaskPatch {
            description: self.description.clone(),
            subtask: self.subtask.clone(),
            priority,
            category,
            due_date,
            reminder,
            ..TaskPatch::default()
        })
    }
}

/// Draft from a title and the optional fields. Due defaults to now and the
/// reminder to the due date.
pub fn new_task(title: String, fields: &TaskFields) -> Result<NewTask> {
    let patch = fields.to_patch()?;
    let due = patch.due_date.unwrap_or_else(Utc::now);
    let mut task = NewTask::new(String::new(), title, due);
    task.reminder = patch.reminder.unwrap_or(due);
    task.description = patch.description.unwrap_or_default();
    task.subtask = patch.subtask.unwrap_or_default();
    task.priority = patch.priority.unwrap_or_default();
    task.category = patch.category.unwrap_or_default();
    Ok(task)
}

/// User-facing message, with the detail kept in the log
fn present(error: AppError) -> anyhow::Error {
    debug!(%error, kind = error.kind().label(), "command failed");
    anyhow!(error.user_message())
}

/// `id  [✓] █ Title  (Wed 15 May 14:00)`
pub fn task_row(task: &Task) -> String {
    format!(
        "{}  {} {} {}  ({})",
        task.id,
        if task.completed { "[✓]" } else { "[ ]" },
        task.priority.badge(),
        task.title,
        task.due_formatted()
    )
}

fn section_title(bucket: Bucket) -> &'static str {
    match bucket {
        Bucket::Today => "Today's Tasks",
        Bucket::Overdue => "Overdue Tasks",
        Bucket::Completed => "Completed Tasks",
        Bucket::All => "All Tasks",
    }
}

pub struct CommandContext<'a> {
    worker: &'a Worker,
    services: &'a Services,
}

impl<'a> CommandContext<'a> {
    pub fn new(worker: &'a Worker, services: &'a Services) -> Self {
        Self { worker, services }
    }

    fn block<T>(&self, future: impl Future<Output = crate::error::Result<T>>) -> Result<T> {
        self.worker.block_on(future).map_err(present)
    }

    fn signed_in(&self) -> Result<AuthSession> {
        self.block(self.services.restore())?
            .ok_or_else(|| anyhow!("No user logged in. Run 'tend login' first."))
    }

    pub fn register(&self, email: &str) -> Result<()> {
        let accounts = self.services.accounts().map_err(present)?;
        let password = read_secret("Password: ")?;
        let confirm = read_secret("Confirm password: ")?;
        let session = self.block(accounts.register(email, &password, &confirm))?;
        println!("Registered and signed in as {}", session.email);
        Ok(())
    }

    pub fn login(&self, email: &str) -> Result<()> {
        let accounts = self.services.accounts().map_err(present)?;
        let password = read_secret("Password: ")?;
        let session = self.block(accounts.login(email, &password))?;
        println!("Signed in as {}", session.email);
        Ok(())
    }

    pub fn logout(&self) -> Result<()> {
        self.services.accounts().and_then(|accounts| accounts.logout()).map_err(present)?;
        println!("Signed out");
        Ok(())
    }

    pub fn change_password(&self) -> Result<()> {
        let accounts = self.services.accounts().map_err(present)?;
        self.signed_in()?;
        let current = read_secret("Current password: ")?;
        let new = read_secret("New password: ")?;
        let confirm = read_secret("Confirm new password: ")?;
        self.block(accounts.change_password(&current, &new, &confirm))?;
        println!("Password updated successfully");
        Ok(())
    }

    pub fn add(&self, title: String, fields: TaskFields) -> Result<()> {
        self.signed_in()?;
        let task = self.block(self.services.add_task(new_task(title, &fields)?))?;
        println!("Task added successfully!");
        println!("{}", task_row(&task));
        Ok(())
    }

    pub fn list(&self, bucket: Option<&str>) -> Result<()> {
        let shown = match bucket {
            Some(name) => vec![Bucket::from_name(name)
                .ok_or_else(|| anyhow!("Unknown bucket: {name} (today, overdue, completed, all)"))?],
            None => Bucket::all().to_vec(),
        };

        self.signed_in()?;
        let tasks = self.block(self.services.load_tasks())?;
        let now = Local::now();
        let buckets = bucketize(&tasks, &now);

        println!("Today's Task Completion: {}%", completion_rate(&tasks, &now).percent());
        for bucket in shown {
            let rows = buckets.get(bucket);
            println!();
            println!("{} ({})", section_title(bucket), rows.len());
            if rows.is_empty() {
                println!("  No tasks");
            }
            for task in rows {
                println!("  {}", task_row(task));
            }
        }
        Ok(())
    }

    pub fn search(&self, query: &str, tags: &[String]) -> Result<()> {
        if let Some(unknown) = tags.iter().find(|name| Tag::from_name(name).is_none()) {
            bail!("Unknown tag: {unknown}. Use a priority or a category name.");
        }

        self.signed_in()?;
        let tasks = self.block(self.services.load_tasks())?;
        let found = filter(&tasks, query, &TagSet::from_names(tags));
        if found.is_empty() {
            println!("No tasks found");
        }
        for task in &found {
            println!("{}", task_row(task));
        }
        Ok(())
    }

    pub fn show(&self, id: &str) -> Result<()> {
        self.signed_in()?;
        let task = self.block(self.services.get_task(id))?;

        println!("{}", task.title);
        println!("  Id:          {}", task.id);
        println!("  Priority:    {}", task.priority.name());
        println!("  Category:    {}", task.category.name());
        println!("  Due:         {}", task.due_formatted());
        println!("  Reminder:    {}", task.reminder.with_timezone(&Local).format("%a %d %b %H:%M"));
        match task.completed_at {
            Some(at) if task.completed => {
                println!("  Status:      Completed {}", at.with_timezone(&Local).format("%a %d %b %H:%M"))
            }
            _ => println!("  Status:      Pending"),
        }
        if !task.subtask.is_empty() {
            println!("  Subtask:     {}", task.subtask);
        }
        if !task.description.is_empty() {
            println!();
            for line in task.description.lines() {
                println!("  {line}");
            }
        }
        Ok(())
    }

    pub fn edit(&self, id: &str, title: Option<String>, fields: TaskFields) -> Result<()> {
        let mut patch = fields.to_patch()?;
        patch.title = title;
        if patch.is_empty() {
            bail!("Nothing to change. Pass at least one field, e.g. --title or --due.");
        }

        self.signed_in()?;
        self.block(self.services.edit_task(id, patch))?;
        println!("Task updated successfully");
        Ok(())
    }

    pub fn complete(&self, id: &str, undo: bool) -> Result<()> {
        self.signed_in()?;
        if undo {
            self.block(self.services.reopen_task(id))?;
            println!("Task moved back to pending");
        } else {
            self.block(self.services.complete_task(id))?;
            println!("Task marked as completed");
        }
        Ok(())
    }

    pub fn delete(&self, id: &str, yes: bool) -> Result<()> {
        self.signed_in()?;
        if !yes {
            let task = self.block(self.services.get_task(id))?;
            if !confirm(&format!("Delete \"{}\"? [y/N] ", task.title))? {
                println!("Cancelled");
                return Ok(());
            }
        }
        self.block(self.services.delete_task(id))?;
        println!("Task deleted successfully");
        Ok(())
    }

    pub fn weather(&self) -> Result<()> {
        let weather = self.block(self.services.fetch_weather())?;
        println!("{} {}  {}", weather.symbol(), weather.temperature_label(), weather.condition);
        println!("{}", weather.place());
        println!("Icon: {}", weather.icon_url());
        Ok(())
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    eprint!("{prompt}");
    io::stderr().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Read a password without echo. Piped input is read as a plain line.
fn read_secret(prompt: &str) -> Result<String> {
    eprint!("{prompt}");
    io::stderr().flush()?;

    if !io::stdin().is_terminal() {
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        return Ok(line.trim_end_matches(['\r', '\n']).to_string());
    }

    enable_raw_mode()?;
    let secret = read_hidden();
    disable_raw_mode()?;
    eprintln!();
    secret
}

fn read_hidden() -> Result<String> {
    let mut secret = String::new();
    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match key.code {
            KeyCode::Enter => return Ok(secret),
            KeyCode::Backspace => {
                secret.pop();
            }
            KeyCode::Esc => bail!("Cancelled"),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => bail!("Cancelled"),
            KeyCode::Char(c) => secret.push(c),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_task_defaults() {
        let task = new_task("Buy milk".to_string(), &TaskFields::default()).unwrap();
        assert_eq!(task.title, "Buy milk");
        assert_eq!(task.reminder, task.due_date);
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.category, Category::Personal);
    }

    #[test]
    fn test_fields_parse_names_and_dates() {
        let fields = TaskFields {
            priority: Some("high".to_string()),
            category: Some("Work".to_string()),
            due: Some("2030-03-01 08:00".to_string()),
            ..TaskFields::default()
        };
        let task = new_task("Ship release".to_string(), &fields).unwrap();
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.category, Category::Work);
        assert_eq!(task.due_date.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(), "2030-03-01 08:00");
        assert_eq!(task.reminder, task.due_date);
    }

    #[test]
    fn test_fields_reject_unknown_names() {
        let fields = TaskFields {
            priority: Some("urgent".to_string()),
            ..TaskFields::default()
        };
        let error = fields.to_patch().unwrap_err();
        assert_eq!(error.to_string(), "Unknown priority: urgent (Low, Medium, High)");

        let fields = TaskFields {
            due: Some("next week".to_string()),
            ..TaskFields::default()
        };
        assert_eq!(
            fields.to_patch().unwrap_err().to_string(),
            "Please enter the due date as YYYY-MM-DD HH:MM"
        );
    }

    #[test]
    fn test_empty_fields_make_empty_patch() {
        assert!(TaskFields::default().to_patch().unwrap().is_empty());
    }

    #[test]
    fn test_task_row() {
        let mut task = Task::from_new("abc".to_string(), NewTask::new("u1", "Pay rent", Utc::now()));
        assert!(task_row(&task).starts_with("abc  [ ] ▄ Pay rent  ("));
        task.complete(Utc::now());
        assert!(task_row(&task).contains("[✓]"));
    }
}
