use crate::app::{AppState, FormField, InputFormState};
use crate::ui::{
    layout::create_modal_area_with_height,
    styles::{error_style, hint_style, modal_bg_style, modal_title_style},
};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

fn field_value(form: &InputFormState, field: FormField) -> String {
    match field {
        FormField::Title => form.title.clone(),
        FormField::Description => form.description.replace('\n', " ⏎ "),
        FormField::Subtask => form.subtask.clone(),
        FormField::Priority => format!("◀ {} ▶", form.priority.name()),
        FormField::Category => format!("◀ {} ▶", form.category.name()),
        FormField::Due => form.due.clone(),
        FormField::Reminder => form.reminder.clone(),
    }
}

/// Render the form for adding or editing a task
pub fn render_input_form(f: &mut Frame, app: &AppState, area: Rect) {
    let Some(form) = &app.input_form else {
        return;
    };

    let modal_area = create_modal_area_with_height(area, 24);
    f.render_widget(Clear, modal_area);

    let title = if form.editing.is_some() { " Edit Task " } else { " Add Task " };

    let mut lines = Vec::new();
    lines.push(Line::raw(""));
    for field in FormField::ALL {
        let active = form.field == field;
        let label = if active {
            format!("{}: (editing)", field.label())
        } else {
            format!("{}:", field.label())
        };
        lines.push(Line::raw(label));
        lines.push(Line::from(vec![
            Span::raw("> "),
            Span::styled(field_value(form, field), modal_title_style()),
            if active && !field.is_choice() {
                Span::styled("█", modal_title_style()) // Cursor
            } else {
                Span::raw("")
            },
        ]));
    }
    lines.push(Line::raw(""));

    if let Some(error) = &form.error {
        lines.push(Line::from(Span::styled(error.clone(), error_style())));
    }
    lines.push(Line::from(Span::styled(
        "Tab/↑↓ fields  ·  ←/→ choose  ·  Ctrl+E description in $EDITOR  ·  Enter save  ·  Esc cancel",
        hint_style(),
    )));

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

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_field_values() {
        let now = Local.with_ymd_and_hms(2024, 5, 15, 9, 30, 0).unwrap();
        let mut form = InputFormState::blank(now);
        form.description = "line one\nline two".to_string();

        assert_eq!(field_value(&form, FormField::Due), "2024-05-15 09:30");
        assert_eq!(field_value(&form, FormField::Priority), "◀ Medium ▶");
        assert_eq!(field_value(&form, FormField::Description), "line one ⏎ line two");
    }
}
