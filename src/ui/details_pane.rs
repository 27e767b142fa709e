use crate::app::AppState;
use crate::ui::styles::{border_style, default_style, done_style, hint_style, priority_style, title_style};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

/// Render the details pane for the selected task
pub fn render_details_pane(f: &mut Frame, app: &AppState, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style())
        .title(Span::styled(" Details ", title_style()));

    let Some(task) = app.selected_task() else {
        f.render_widget(Paragraph::new("No task selected").block(block), area);
        return;
    };

    let mut lines = Vec::new();

    lines.push(Line::from(vec![
        Span::styled("Title: ", title_style()),
        Span::raw(task.title.clone()),
    ]));
    lines.push(Line::raw(""));

    lines.push(Line::from(vec![
        Span::styled("Priority: ", title_style()),
        Span::styled(task.priority.name(), priority_style(task.priority)),
    ]));
    lines.push(Line::from(vec![
        Span::styled("Category: ", title_style()),
        Span::raw(task.category.name()),
    ]));
    lines.push(Line::from(vec![
        Span::styled("Due:      ", title_style()),
        Span::raw(task.due_formatted()),
    ]));
    lines.push(Line::from(vec![
        Span::styled("Reminder: ", title_style()),
        Span::raw(task.reminder.with_timezone(&chrono::Local).format("%a %d %b %H:%M").to_string()),
    ]));

    let status = match task.completed_at {
        Some(at) if task.completed => Span::styled(
            format!("Completed {}", at.with_timezone(&chrono::Local).format("%d %b %H:%M")),
            done_style(),
        ),
        _ => Span::styled("Pending", default_style()),
    };
    lines.push(Line::from(vec![Span::styled("Status:   ", title_style()), status]));
    lines.push(Line::raw(""));

    if !task.subtask.trim().is_empty() {
        lines.push(Line::from(vec![
            Span::styled("Subtask: ", title_style()),
            Span::raw(task.subtask.clone()),
        ]));
        lines.push(Line::raw(""));
    }

    if task.description.trim().is_empty() {
        lines.push(Line::from(Span::styled("Description: (empty)", hint_style())));
    } else {
        lines.push(Line::from(Span::styled("Description:", title_style())));
        for description_line in task.description.lines() {
            lines.push(Line::raw(format!("  {description_line}")));
        }
    }

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}
