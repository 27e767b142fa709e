use crate::app::AppState;
use crate::domain::{Bucket, Task};
use crate::ui::layout::split_top;
use crate::ui::styles::{border_style, default_style, done_style, hint_style, priority_style, selected_style, title_style};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Tabs},
    Frame,
};

/// Render the task list screen: bucket tabs over the bucket's tasks
pub fn render_tasks_screen(f: &mut Frame, app: &AppState, area: Rect) {
    let (tabs_area, list_area) = split_top(area, 3);

    let selected_tab = Bucket::all().iter().position(|b| *b == app.bucket).unwrap_or(0);
    let tabs = Tabs::new(Bucket::all().iter().map(|b| b.name()).collect::<Vec<_>>())
        .select(selected_tab)
        .style(default_style())
        .highlight_style(selected_style())
        .divider("|")
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style())
                .title(Span::styled(" Tasks ", title_style())),
        );
    f.render_widget(tabs, tabs_area);

    let tasks = app.visible_tasks();
    let title = format!(" {} Tasks ({}) ", app.bucket.name(), tasks.len());
    render_task_list(f, app, &tasks, Some(app.selected_index), &title, list_area);
}

/// Render `tasks` as a bordered list; `selected` is highlighted
pub fn render_task_list(
    f: &mut Frame,
    app: &AppState,
    tasks: &[&Task],
    selected: Option<usize>,
    title: &str,
    area: Rect,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style())
        .title(Span::styled(title.to_string(), title_style()));

    if tasks.is_empty() {
        let empty = if app.loading { "  Loading..." } else { "  No tasks" };
        let list = List::new(vec![ListItem::new(Span::styled(empty, hint_style()))]).block(block);
        f.render_widget(list, area);
        return;
    }

    let items: Vec<ListItem> = tasks
        .iter()
        .enumerate()
        .map(|(idx, task)| {
            let style = if Some(idx) == selected {
                selected_style()
            } else {
                default_style()
            };
            ListItem::new(task_line(task, app.use_emoji)).style(style)
        })
        .collect();

    f.render_widget(List::new(items).block(block), area);
}

/// Single row for a task
/// Format: [✓] █ 💼 Write proposal   Wed 15 May 14:00
pub fn task_line(task: &Task, use_emoji: bool) -> Line<'static> {
    let mut spans = Vec::new();

    spans.push(Span::raw(if task.completed { "[✓] " } else { "[ ] " }));
    spans.push(Span::styled(
        format!("{} ", task.priority.badge()),
        priority_style(task.priority),
    ));
    if use_emoji {
        spans.push(Span::raw(format!("{} ", task.category.symbol())));
    }

    let title_style = if task.completed { done_style() } else { default_style() };
    spans.push(Span::styled(task.title.clone(), title_style));

    spans.push(Span::styled(format!("   {}", task.due_formatted()), hint_style()));

    Line::from(spans)
}
