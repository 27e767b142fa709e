use crate::app::AppState;
use crate::domain::{Tag, UiMode};
use crate::ui::layout::split_top;
use crate::ui::list_pane::render_task_list;
use crate::ui::styles::{active_tag_style, border_style, hint_style, modal_title_style, selected_style, tag_style, title_style};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Render the search screen: query line, filter chips and matching tasks
pub fn render_search_screen(f: &mut Frame, app: &AppState, area: Rect) {
    let (bar_area, list_area) = split_top(area, 4);

    let editing = app.ui_mode == UiMode::EditingQuery;
    let mut query = vec![Span::raw("Search: "), Span::styled(app.query.clone(), modal_title_style())];
    if editing {
        query.push(Span::styled("█", modal_title_style()));
    } else if app.query.is_empty() {
        query.push(Span::styled("(press / to type)", hint_style()));
    }

    let lines = vec![Line::from(query), chip_line(app)];
    let bar = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style())
            .title(Span::styled(" Search Tasks ", title_style())),
    );
    f.render_widget(bar, bar_area);

    let tasks = app.visible_tasks();
    let title = format!(" Results ({}) ", tasks.len());
    render_task_list(f, app, &tasks, Some(app.selected_index), &title, list_area);
}

/// `Filters: [High] [Medium] ...` with active chips filled and the cursor
/// chip highlighted
fn chip_line(app: &AppState) -> Line<'static> {
    let mut spans = vec![Span::raw("Filters: ")];
    for (index, tag) in Tag::all().into_iter().enumerate() {
        let style = if index == app.tag_cursor {
            selected_style()
        } else if app.tags.contains(tag) {
            active_tag_style()
        } else {
            tag_style()
        };
        spans.push(Span::styled(format!("[{}]", tag.name()), style));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}
