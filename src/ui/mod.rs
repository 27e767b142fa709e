pub mod details_pane;
pub mod focus_pane;
pub mod home_pane;
pub mod input_form;
pub mod keybindings;
pub mod layout;
pub mod list_pane;
pub mod modal;
pub mod search_pane;
pub mod styles;

use crate::app::AppState;
use crate::domain::{Screen, UiMode};
use details_pane::render_details_pane;
use focus_pane::render_focus_screen;
use home_pane::render_home_screen;
use input_form::render_input_form;
use keybindings::{render_keybindings, render_status};
use layout::create_layout;
use list_pane::render_tasks_screen;
use modal::{render_focus_prompt, render_focus_settings, render_modal};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use search_pane::render_search_screen;
use styles::{hint_style, selected_style, title_style};

/// Main render function - draws the entire UI
pub fn render(f: &mut Frame, app: &AppState) {
    let size = f.size();
    let layout = create_layout(size, app.screen != Screen::Focus);

    render_header(f, app, layout.header_area);
    render_status(f, app, layout.status_area);
    render_keybindings(f, app, layout.keybindings_area);

    match app.screen {
        Screen::Home => render_home_screen(f, app, layout.main_area),
        Screen::Tasks => render_tasks_screen(f, app, layout.main_area),
        Screen::Search => render_search_screen(f, app, layout.main_area),
        Screen::Focus => render_focus_screen(f, app, layout.main_area),
    }

    if let Some(details_area) = layout.details_area {
        render_details_pane(f, app, details_area);
    }

    // Focus prompts sit above the focus screen
    render_focus_prompt(f, app, size);
    if app.ui_mode == UiMode::FocusSettings {
        render_focus_settings(f, app, size);
    }

    // Render input form if active
    if app.input_form.is_some() {
        render_input_form(f, app, size);
    }

    // Errors and confirmations go on top of everything
    if app.modal.is_some() {
        render_modal(f, app, size);
    }
}

/// `tend  Home | Tasks | Search            me@example.com`
fn render_header(f: &mut Frame, app: &AppState, area: Rect) {
    let mut spans = vec![Span::styled(" tend ", title_style())];
    for (index, (screen, name)) in [(Screen::Home, "1 Home"), (Screen::Tasks, "2 Tasks"), (Screen::Search, "3 Search")]
        .into_iter()
        .enumerate()
    {
        if index > 0 {
            spans.push(Span::styled(" | ", hint_style()));
        }
        let style = if app.screen == screen { selected_style() } else { hint_style() };
        spans.push(Span::styled(format!(" {name} "), style));
    }
    if app.screen == Screen::Focus {
        spans.push(Span::styled("  [Focus]", selected_style()));
    }
    spans.push(Span::styled(format!("   {}", app.account), hint_style()));

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}
