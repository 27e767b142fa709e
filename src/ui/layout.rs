use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Main layout structure
pub struct MainLayout {
    pub header_area: Rect,
    pub main_area: Rect,
    pub details_area: Option<Rect>,
    pub status_area: Rect,
    pub keybindings_area: Rect,
}

/// Create the main layout
/// - Top bar: screen tabs and account (1 row)
/// - Main area: screen (70%) | details (30%) when details are shown
/// - Status line (1 row), then keybindings (1 row)
pub fn create_layout(area: Rect, show_details: bool) -> MainLayout {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(0),    // Screen
            Constraint::Length(1), // Status line
            Constraint::Length(1), // Keybindings
        ])
        .split(area);

    let (main_area, details_area) = if show_details {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
            .split(rows[1]);
        (columns[0], Some(columns[1]))
    } else {
        (rows[1], None)
    };

    MainLayout {
        header_area: rows[0],
        main_area,
        details_area,
        status_area: rows[2],
        keybindings_area: rows[3],
    }
}

/// Home screen regions
pub struct HomeLayout {
    pub date_area: Rect,
    pub completion_area: Rect,
    pub weather_area: Rect,
    pub pending_area: Rect,
    pub completed_area: Rect,
}

/// - Top: date | completion gauge | weather (5 rows)
/// - Below: today's tasks (60%) above today's completed tasks (40%)
pub fn create_home_layout(area: Rect) -> HomeLayout {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Percentage(60),
            Constraint::Min(3),
        ])
        .split(area);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(40),
            Constraint::Percentage(35),
        ])
        .split(rows[0]);

    HomeLayout {
        date_area: top[0],
        completion_area: top[1],
        weather_area: top[2],
        pending_area: rows[1],
        completed_area: rows[2],
    }
}

/// Split a pane into a fixed-height bar on top and the rest
pub fn split_top(area: Rect, height: u16) -> (Rect, Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(height), Constraint::Min(0)])
        .split(area);
    (rows[0], rows[1])
}

/// Create centered modal area
pub fn create_modal_area(area: Rect) -> Rect {
    create_modal_area_with_height(area, 16)
}

/// Centered modal area `height` rows tall
pub fn create_modal_area_with_height(area: Rect, height: u16) -> Rect {
    let vertical_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Length(height),
            Constraint::Percentage(25),
        ])
        .split(area);

    let horizontal_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(20),
            Constraint::Percentage(60),
            Constraint::Percentage(20),
        ])
        .split(vertical_chunks[1]);

    horizontal_chunks[1]
}
