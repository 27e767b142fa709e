use crate::app::{AppState, WeatherState};
use crate::domain::TodaySummary;
use crate::ui::layout::create_home_layout;
use crate::ui::list_pane::render_task_list;
use crate::ui::styles::{border_style, error_style, gauge_style, hint_style, title_style};
use chrono::Local;
use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

fn pane(title: &str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(border_style())
        .title(Span::styled(format!(" {title} "), title_style()))
}

/// Render the home screen: date, today's completion, weather and today's
/// pending and completed tasks
pub fn render_home_screen(f: &mut Frame, app: &AppState, area: Rect) {
    let layout = create_home_layout(area);
    let now = Local::now();
    let summary = TodaySummary::new(&app.tasks, &now);

    let date = Paragraph::new(vec![
        Line::from(Span::styled(now.format("%B %-d, %Y").to_string(), title_style())),
        Line::raw(now.format("%A").to_string()),
    ])
    .alignment(Alignment::Center)
    .block(pane("Today"));
    f.render_widget(date, layout.date_area);

    let rate = summary.rate();
    let gauge = Gauge::default()
        .block(pane("Today's Task Completion"))
        .gauge_style(gauge_style())
        .ratio(rate.ratio().clamp(0.0, 1.0))
        .label(format!("{}%", rate.percent()));
    f.render_widget(gauge, layout.completion_area);

    render_weather_panel(f, app, layout.weather_area);

    let pending_selected = (app.selected_index < summary.pending.len()).then_some(app.selected_index);
    let completed_selected = app.selected_index.checked_sub(summary.pending.len());

    render_task_list(
        f,
        app,
        &summary.pending,
        pending_selected,
        &format!(" Today's Tasks ({}) ", summary.pending.len()),
        layout.pending_area,
    );
    render_task_list(
        f,
        app,
        &summary.completed,
        completed_selected,
        &format!(" Today's Completed Tasks ({}) ", summary.completed.len()),
        layout.completed_area,
    );
}

/// Loading, the error string, or temperature, condition and place
fn weather_lines(state: &WeatherState) -> Vec<Line<'static>> {
    match state {
        WeatherState::Loading => vec![Line::from(Span::styled("Loading...", hint_style()))],
        WeatherState::Failed(message) if message.is_empty() => {
            vec![Line::from(Span::styled("No weather data available", error_style()))]
        }
        WeatherState::Failed(message) => vec![Line::from(Span::styled(message.clone(), error_style()))],
        WeatherState::Ready(weather) => vec![
            Line::from(vec![
                Span::raw(format!("{} ", weather.symbol())),
                Span::styled(weather.temperature_label(), title_style()),
                Span::raw(format!("  {}", weather.condition)),
            ]),
            Line::raw(weather.place()),
        ],
    }
}

fn render_weather_panel(f: &mut Frame, app: &AppState, area: Rect) {
    let paragraph = Paragraph::new(weather_lines(&app.weather))
        .alignment(Alignment::Center)
        .block(pane("Weather"));
    f.render_widget(paragraph, area);
}
