mod app;
mod auth;
mod commands;
mod config;
mod domain;
mod error;
mod focus;
mod input;
mod logging;
mod notifications;
mod persistence;
mod services;
mod store;
mod sync;
mod ticker;
mod ui;
mod weather;

use anyhow::{Context, Result};
use app::AppState;
use clap::{Parser, Subcommand};
use config::AppConfig;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use persistence::{config_file, get_tend_dir, init_local_tend, log_file, session_file, tasks_file};
use ratatui::{backend::CrosstermBackend, Terminal};
use services::Services;
use std::io;
use sync::Worker;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "tend")]
#[command(about = "A calm, terminal-based to-do list with a focus timer", long_about = None)]
struct Cli {
    /// Keep tasks in a local file instead of the backend
    #[arg(long, global = true)]
    offline: bool,

    /// Log debug events (to tend.log for the board, stderr otherwise)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a local .tend directory in the current directory
    Init,
    /// Create an account and sign in
    Register { email: String },
    /// Sign in with email and password
    Login { email: String },
    /// Sign out and forget the saved session
    Logout,
    /// Change the password of the signed-in account
    Passwd,
    /// Add a task
    Add {
        title: String,
        #[command(flatten)]
        fields: commands::TaskFields,
    },
    /// List tasks, grouped into Today, Overdue, Completed and All
    List {
        /// Only this bucket (today, overdue, completed, all)
        #[arg(short, long)]
        bucket: Option<String>,
    },
    /// Search task titles, optionally filtered by priority/category tags
    Search {
        query: Option<String>,
        /// Priority or category name; repeatable
        #[arg(short, long)]
        tag: Vec<String>,
    },
    /// Show one task
    Show { id: String },
    /// Change fields of a task
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[command(flatten)]
        fields: commands::TaskFields,
    },
    /// Mark a task completed
    Complete {
        id: String,
        /// Move it back to pending instead
        #[arg(long)]
        undo: bool,
    },
    /// Delete a task
    Delete {
        id: String,
        /// Don't ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Current weather at the configured location
    Weather,
    /// Open the board straight into a focus session on a task
    Focus { id: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Init) => {
            let tend_dir = init_local_tend()?;
            let config_path = tend_dir.join("config.json");
            AppConfig::default()
                .save(&config_path)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
            println!("Initialized tend directory: {}", tend_dir.display());
            println!();
            println!("tend will now keep its config, session and offline tasks here.");
            println!("Set the backend and weather keys in {}.", config_path.display());
            println!("Run 'tend login' or 'tend register' to get started.");
            Ok(())
        }
        Some(Commands::Focus { id }) => run_board(cli.offline, cli.verbose, Some(id)),
        None => run_board(cli.offline, cli.verbose, None),
        Some(command) => {
            logging::init_stderr(cli.verbose)?;
            let config = load_config()?;
            let worker = Worker::new().context("Failed to start the async runtime")?;
            let services = open_services(&config, cli.offline)?;
            let ctx = commands::CommandContext::new(&worker, &services);

            match command {
                Commands::Register { email } => ctx.register(&email),
                Commands::Login { email } => ctx.login(&email),
                Commands::Logout => ctx.logout(),
                Commands::Passwd => ctx.change_password(),
                Commands::Add { title, fields } => ctx.add(title, fields),
                Commands::List { bucket } => ctx.list(bucket.as_deref()),
                Commands::Search { query, tag } => ctx.search(query.as_deref().unwrap_or(""), &tag),
                Commands::Show { id } => ctx.show(&id),
                Commands::Edit { id, title, fields } => ctx.edit(&id, title, fields),
                Commands::Complete { id, undo } => ctx.complete(&id, undo),
                Commands::Delete { id, yes } => ctx.delete(&id, yes),
                Commands::Weather => ctx.weather(),
                Commands::Init | Commands::Focus { .. } => Ok(()),
            }
        }
    }
}

/// config.json from the data directory, with `TEND_*` overrides
fn load_config() -> Result<AppConfig> {
    let path = config_file()?;
    let config = AppConfig::load(&path)
        .with_context(|| format!("Failed to load config: {}", path.display()))?
        .with_env();
    config.validate_focus()?;
    Ok(config)
}

fn open_services(config: &AppConfig, offline: bool) -> Result<Services> {
    if offline {
        let path = tasks_file()?;
        Services::offline(config, path.clone())
            .with_context(|| format!("Failed to open offline tasks: {}", path.display()))
    } else {
        Services::connect(config, session_file()?).context("Failed to set up the backend clients")
    }
}

fn run_board(offline: bool, verbose: bool, focus_task: Option<String>) -> Result<()> {
    logging::init_file(&log_file()?, verbose)?;
    let tend_dir = get_tend_dir()?;
    eprintln!("Using tend directory: {}", tend_dir.display());

    let config = load_config()?;
    let mut worker = Worker::new().context("Failed to start the async runtime")?;
    let services = open_services(&config, offline)?;

    let Some(session) = worker.block_on(services.restore())? else {
        anyhow::bail!("No user logged in. Run 'tend login' or 'tend register' first, or use --offline.");
    };
    info!(uid = %session.uid, offline = services.is_offline(), "board opened");

    let mut app = AppState::new(
        session.email.clone(),
        config.focus.clone(),
        config.board.use_emoji,
        config.board.reminders,
    );
    app.refresh_tasks();
    app.refresh_weather();

    if let Some(id) = focus_task {
        app.tasks = worker.block_on(services.load_tasks())?;
        app.open_focus_for(&id);
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, &mut worker, &services);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = &result {
        warn!(error = %err, "board stopped");
    }
    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
    worker: &mut Worker,
    services: &Services,
) -> Result<()> {
    let tick_rate = ticker::tick_duration();
    let mut sessions = services.watch.subscribe();

    loop {
        for request in app.take_requests() {
            worker.run(services, request);
        }
        for outcome in worker.drain() {
            app.apply(outcome);
        }

        // Signed out elsewhere (e.g. a refresh token was revoked)
        if sessions.has_changed().unwrap_or(false) {
            let current = sessions.borrow_and_update().clone();
            match current {
                Some(session) => app.account = session.email,
                None => anyhow::bail!("Signed out. Run 'tend login' to continue."),
            }
        }

        terminal.draw(|f| ui::render(f, app))?;

        // Handle events with timeout for ticking
        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                // Only process key press events (ignore key release)
                if key.kind == KeyEventKind::Press {
                    if input::wants_external_editor(app, &key) {
                        // The editor needs the terminal back
                        disable_raw_mode()?;
                        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

                        let edited = input::handle_key(app, key);

                        enable_raw_mode()?;
                        execute!(io::stdout(), EnterAlternateScreen)?;
                        terminal.clear()?;

                        if let Err(error) = edited {
                            app.show_error("Error", error.to_string());
                        }
                    } else if input::handle_key(app, key)? {
                        return Ok(());
                    }
                }
            }
        }

        app.tick();
    }
}
