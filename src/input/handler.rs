use crate::app::AppState;
use crate::domain::{Screen, UiMode};
use anyhow::{Context, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::env;
use std::fs;
use std::process::Command;
use tempfile::NamedTempFile;

/// Handle keyboard input events. Returns `true` when the board should quit.
pub fn handle_key(app: &mut AppState, key: KeyEvent) -> Result<bool> {
    match app.ui_mode {
        UiMode::Normal if app.screen == Screen::Focus => handle_focus_mode(app, key),
        UiMode::Normal => handle_normal_mode(app, key),
        UiMode::Modal => handle_modal_mode(app, key),
        UiMode::AddingTask | UiMode::EditingTask => handle_input_form_mode(app, key),
        UiMode::EditingQuery => handle_query_mode(app, key),
        UiMode::FocusSettings => handle_focus_settings_mode(app, key),
    }
}

/// Whether `key` opens $EDITOR, which needs the terminal back
pub fn wants_external_editor(app: &AppState, key: &KeyEvent) -> bool {
    matches!(app.ui_mode, UiMode::AddingTask | UiMode::EditingTask)
        && key.code == KeyCode::Char('e')
        && key.modifiers.contains(KeyModifiers::CONTROL)
}

/// Handle keys on the Home, Tasks and Search screens
fn handle_normal_mode(app: &mut AppState, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Ok(true),

        KeyCode::Up | KeyCode::Char('k') => {
            app.move_selection_up();
            Ok(false)
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.move_selection_down();
            Ok(false)
        }

        // Screens
        KeyCode::Char('1') => {
            app.show_screen(Screen::Home);
            Ok(false)
        }
        KeyCode::Char('2') => {
            app.show_screen(Screen::Tasks);
            Ok(false)
        }
        KeyCode::Char('3') => {
            app.show_screen(Screen::Search);
            Ok(false)
        }
        KeyCode::Tab => {
            app.next_screen();
            Ok(false)
        }

        // Bucket tabs and filter chips
        KeyCode::Char('b') if app.screen == Screen::Tasks => {
            app.next_bucket();
            Ok(false)
        }
        KeyCode::Right if app.screen == Screen::Tasks => {
            app.next_bucket();
            Ok(false)
        }
        KeyCode::Char('/') if app.screen == Screen::Search => {
            app.start_query();
            Ok(false)
        }
        KeyCode::Left if app.screen == Screen::Search => {
            app.move_tag_cursor(false);
            Ok(false)
        }
        KeyCode::Right if app.screen == Screen::Search => {
            app.move_tag_cursor(true);
            Ok(false)
        }
        KeyCode::Char(' ') if app.screen == Screen::Search => {
            app.toggle_tag_at_cursor();
            Ok(false)
        }
        KeyCode::Char('c') if app.screen == Screen::Search => {
            app.clear_filters();
            Ok(false)
        }

        // Task actions
        KeyCode::Char('a') => {
            app.start_add_task();
            Ok(false)
        }
        KeyCode::Char('e') => {
            app.start_edit_task();
            Ok(false)
        }
        KeyCode::Char('d') | KeyCode::Char(' ') => {
            app.toggle_complete_selected();
            Ok(false)
        }
        KeyCode::Char('x') | KeyCode::Delete => {
            app.request_delete_selected();
            Ok(false)
        }
        KeyCode::Char('f') | KeyCode::Enter => {
            app.open_focus();
            Ok(false)
        }
        KeyCode::Char('r') => {
            app.refresh_tasks();
            app.refresh_weather();
            Ok(false)
        }

        _ => Ok(false),
    }
}

/// Handle keys on the focus screen
fn handle_focus_mode(app: &mut AppState, key: KeyEvent) -> Result<bool> {
    let prompt_open = app.focus.as_ref().is_some_and(|focus| focus.prompt().is_some());
    if prompt_open {
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => app.focus_answer(true),
            KeyCode::Char('n') | KeyCode::Esc => app.focus_answer(false),
            _ => {}
        }
        return Ok(false);
    }

    match key.code {
        KeyCode::Char(' ') | KeyCode::Enter => app.focus_toggle(),
        KeyCode::Char('r') => app.focus_reset(),
        KeyCode::Char('c') => app.focus_complete(),
        KeyCode::Char('s') => app.start_focus_settings(),
        KeyCode::Esc | KeyCode::Char('x') | KeyCode::Char('q') => app.focus_request_cancel(),
        _ => {}
    }
    Ok(false)
}

/// Handle keys while a modal is open
fn handle_modal_mode(app: &mut AppState, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Char('y') | KeyCode::Enter => app.answer_modal(true),
        KeyCode::Char('n') | KeyCode::Esc => app.answer_modal(false),
        _ => {}
    }
    Ok(false)
}

/// Handle keys in the add/edit form
fn handle_input_form_mode(app: &mut AppState, key: KeyEvent) -> Result<bool> {
    if wants_external_editor(app, &key) {
        edit_description_external(app)?;
        return Ok(false);
    }

    match key.code {
        KeyCode::Enter => app.submit_input_form(),
        KeyCode::Esc => app.cancel_input_form(),
        _ => {
            if let Some(form) = &mut app.input_form {
                match key.code {
                    KeyCode::Tab | KeyCode::Down => form.next_field(),
                    KeyCode::BackTab | KeyCode::Up => form.previous_field(),
                    KeyCode::Left if form.field.is_choice() => form.cycle_choice(false),
                    KeyCode::Right | KeyCode::Char(' ') if form.field.is_choice() => form.cycle_choice(true),
                    KeyCode::Backspace => form.backspace(),
                    KeyCode::Char(c) => form.push_char(c),
                    _ => {}
                }
            }
        }
    }
    Ok(false)
}

/// Handle keys while typing the search query
fn handle_query_mode(app: &mut AppState, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Enter | KeyCode::Esc => app.finish_query(),
        KeyCode::Backspace => app.query_backspace(),
        KeyCode::Char(c) => app.query_push(c),
        _ => {}
    }
    Ok(false)
}

fn handle_focus_settings_mode(app: &mut AppState, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Enter => app.submit_focus_settings(),
        KeyCode::Esc => app.cancel_focus_settings(),
        KeyCode::Tab | KeyCode::BackTab => app.focus_form_switch(),
        KeyCode::Backspace => app.focus_form_backspace(),
        KeyCode::Char(c) => app.focus_form_push(c),
        _ => {}
    }
    Ok(false)
}

/// Edit the form's description in $EDITOR
fn edit_description_external(app: &mut AppState) -> Result<()> {
    let Some(form) = &mut app.input_form else {
        return Ok(());
    };

    let editor = env::var("EDITOR").unwrap_or_else(|_| {
        if cfg!(windows) {
            "notepad".to_string()
        } else {
            "vi".to_string()
        }
    });

    let mut temp_file = NamedTempFile::new()?;
    std::io::Write::write_all(&mut temp_file, form.description.as_bytes())?;
    let temp_path = temp_file.into_temp_path();

    let status = Command::new(&editor)
        .arg(&temp_path)
        .status()
        .with_context(|| format!("Failed to start editor: {editor}"))?;

    if status.success() {
        let edited = fs::read_to_string(&temp_path)?;
        form.description = edited.trim_end_matches('\n').to_string();
    }
    Ok(())
}
