use crate::app::AppState;
use crate::focus::FocusTimer;
use crate::ui::styles::{border_style, default_style, error_style, gauge_style, hint_style, phase_style, title_style};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

/// Render the focus screen: task, phase, countdown and phase progress
pub fn render_focus_screen(f: &mut Frame, app: &AppState, area: Rect) {
    let Some(focus) = &app.focus else {
        return;
    };
    let timer = focus.timer();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style())
        .title(Span::styled(format!(" Focus: {} ", focus.task_title()), title_style()));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(30),
            Constraint::Length(2), // Phase
            Constraint::Length(2), // Clock
            Constraint::Length(3), // Gauge
            Constraint::Length(2), // State
            Constraint::Min(0),
        ])
        .split(inner);

    let phase = Paragraph::new(Line::from(Span::styled(
        format!("{} Session", timer.phase().name()),
        phase_style(timer.phase()),
    )))
    .alignment(Alignment::Center);
    f.render_widget(phase, rows[1]);

    let clock = Paragraph::new(Line::from(Span::styled(timer.clock(), phase_style(timer.phase()))))
        .alignment(Alignment::Center);
    f.render_widget(clock, rows[2]);

    let gauge_area = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(20),
            Constraint::Percentage(60),
            Constraint::Percentage(20),
        ])
        .split(rows[3])[1];
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).border_style(border_style()))
        .gauge_style(gauge_style())
        .ratio(timer.progress())
        .label(format!("{:.0}%", timer.progress() * 100.0));
    f.render_widget(gauge, gauge_area);

    let mut state = vec![Span::styled(state_label(timer), default_style())];
    state.push(Span::styled(
        format!("   Work {}m · Break {}m", timer.work_minutes(), timer.break_minutes()),
        hint_style(),
    ));
    if !focus.device_stable() {
        state.push(Span::styled("   Device moved", error_style()));
    }
    f.render_widget(Paragraph::new(Line::from(state)).alignment(Alignment::Center), rows[4]);
}

fn state_label(timer: &FocusTimer) -> &'static str {
    if timer.is_running() {
        "Running"
    } else if timer.remaining() == 0 {
        "Finished"
    } else if timer.remaining() == timer.duration(timer.phase()) {
        "Ready"
    } else {
        "Paused"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_label() {
        let mut timer = FocusTimer::new(1, 1).unwrap();
        assert_eq!(state_label(&timer), "Ready");

        timer.toggle();
        assert_eq!(state_label(&timer), "Running");

        timer.tick();
        timer.pause();
        assert_eq!(state_label(&timer), "Paused");

        timer.resume();
        for _ in 0..59 {
            timer.tick();
        }
        assert_eq!(state_label(&timer), "Finished");
    }
}
