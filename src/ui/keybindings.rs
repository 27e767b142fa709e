use crate::app::AppState;
use crate::domain::{Screen, UiMode};
use crate::ui::styles::{hint_style, status_style};
use ratatui::{layout::Rect, text::{Line, Span}, widgets::Paragraph, Frame};

/// Hints for the current screen and mode
pub fn hints(app: &AppState) -> &'static str {
    match (app.ui_mode, app.screen) {
        (UiMode::Modal, _) => " y/Enter confirm   n/Esc dismiss",
        (UiMode::AddingTask | UiMode::EditingTask, _) => " Tab next field   Enter save   Esc cancel",
        (UiMode::EditingQuery, _) => " type to search   Enter/Esc done",
        (UiMode::FocusSettings, _) => " digits   Tab switch   Enter save   Esc cancel",
        (UiMode::Normal, Screen::Focus) => {
            if app.focus.as_ref().is_some_and(|focus| focus.prompt().is_some()) {
                " y answer first option   n answer second option"
            } else {
                " Space start/pause   r reset   c complete task   s durations   Esc cancel session"
            }
        }
        (UiMode::Normal, Screen::Tasks) => {
            " ↑/↓ select   b/→ bucket   a add   e edit   d done   x delete   f focus   r refresh   Tab screen   q quit"
        }
        (UiMode::Normal, Screen::Search) => {
            " / type   ←/→ chip   Space toggle chip   c clear   ↑/↓ select   f focus   Tab screen   q quit"
        }
        (UiMode::Normal, Screen::Home) => {
            " ↑/↓ select   a add   e edit   d done   x delete   f focus   r refresh   1/2/3 screens   q quit"
        }
    }
}

/// Render the keybindings hint bar
pub fn render_keybindings(f: &mut Frame, app: &AppState, area: Rect) {
    let paragraph = Paragraph::new(Line::raw(hints(app))).style(hint_style());
    f.render_widget(paragraph, area);
}

/// Render the flash message line
pub fn render_status(f: &mut Frame, app: &AppState, area: Rect) {
    if let Some((message, _)) = &app.status {
        let line = Line::from(Span::styled(format!(" {message}"), status_style()));
        f.render_widget(Paragraph::new(line), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FocusConfig;

    #[test]
    fn test_hints_follow_mode() {
        let mut app = AppState::new("me@example.com", FocusConfig::default(), false, false);
        assert!(hints(&app).contains("1/2/3 screens"));

        app.show_screen(Screen::Search);
        assert!(hints(&app).contains("Space toggle chip"));

        app.start_add_task();
        assert!(hints(&app).contains("Enter save"));
    }
}
