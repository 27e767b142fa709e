use crate::app::{AppState, ModalState};
use crate::ui::{
    layout::create_modal_area,
    styles::{error_style, modal_bg_style, modal_title_style},
};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

/// Draw a bordered modal with `title` over the centre of `area`
fn render_box(f: &mut Frame, area: Rect, title: String, lines: Vec<Line<'static>>) {
    let modal_area = create_modal_area(area);

    // Clear the area behind the modal
    f.render_widget(Clear, modal_area);

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(title, modal_title_style()))
                .style(modal_bg_style()),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(paragraph, modal_area);
}

/// `[y] accept  [n] decline`
fn answer_line(accept: &str, decline: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled("  [y]", modal_title_style()),
        Span::raw(format!(" {accept}   ")),
        Span::styled("[n]", modal_title_style()),
        Span::raw(format!(" {decline}")),
    ])
}

/// Render the error or delete-confirmation modal
pub fn render_modal(f: &mut Frame, app: &AppState, area: Rect) {
    let Some(modal) = &app.modal else {
        return;
    };

    match modal {
        ModalState::Error { title, message } => {
            let lines = vec![
                Line::raw(""),
                Line::from(Span::styled(format!("  {message}"), error_style())),
                Line::raw(""),
                Line::from(vec![Span::styled("  [Enter]", modal_title_style()), Span::raw(" OK")]),
            ];
            render_box(f, area, format!(" {title} "), lines);
        }
        ModalState::ConfirmDelete { title, .. } => {
            let lines = vec![
                Line::raw(""),
                Line::raw("  Are you sure you want to delete this task?"),
                Line::raw(""),
                Line::from(Span::styled(format!("  {title}"), modal_title_style())),
                Line::raw(""),
                answer_line("Delete", "Cancel"),
            ];
            render_box(f, area, " Confirm Delete ".to_string(), lines);
        }
    }
}

/// Render the open focus prompt (phase finished, device moved, cancel)
pub fn render_focus_prompt(f: &mut Frame, app: &AppState, area: Rect) {
    let Some(prompt) = app.focus.as_ref().and_then(|focus| focus.prompt()) else {
        return;
    };
    let (accept, decline) = prompt.answers();

    let lines = vec![
        Line::raw(""),
        Line::raw(format!("  {}", prompt.message())),
        Line::raw(""),
        answer_line(accept, decline),
    ];
    render_box(f, area, format!(" {} ", prompt.title()), lines);
}

/// Render the work/break minutes editor
pub fn render_focus_settings(f: &mut Frame, app: &AppState, area: Rect) {
    let Some(form) = &app.focus_form else {
        return;
    };

    let field = |label: &str, value: &str, active: bool| {
        Line::from(vec![
            Span::raw(format!("  {label}: ")),
            Span::styled(value.to_string(), modal_title_style()),
            Span::styled(if active { "█" } else { "" }, modal_title_style()),
        ])
    };

    let mut lines = vec![
        Line::raw(""),
        field("Work minutes", &form.work, !form.on_break),
        field("Break minutes", &form.rest, form.on_break),
        Line::raw(""),
    ];
    if let Some(error) = &form.error {
        lines.push(Line::from(Span::styled(format!("  {error}"), error_style())));
        lines.push(Line::raw(""));
    }
    lines.push(Line::raw("  Tab to switch  ·  Enter to save  ·  Esc to cancel"));

    render_box(f, area, " Timer Settings ".to_string(), lines);
}
