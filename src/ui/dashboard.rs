use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

use crate::engine::{AppState, DashboardPhase};
use crate::models::{ProjectSummary, COUNT_PENDING};

pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
    let items: Vec<ListItem> = state
        .dashboard
        .projects
        .iter()
        .map(project_line)
        .map(ListItem::new)
        .collect();

    let title = match state.dashboard.phase {
        DashboardPhase::Idle => " Projects ".to_string(),
        _ => " Projects (loading…) ".to_string(),
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(Color::DarkGray)),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut list_state = ListState::default();
    if !state.dashboard.projects.is_empty() {
        list_state.select(Some(state.dashboard.selected));
    }
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn project_line(project: &ProjectSummary) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("{:<24}", super::truncate_display(&project.name, 24)),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!("{:>3} repos  ", project.repo_count),
            Style::default().fg(Color::Gray),
        ),
        Span::styled(
            format!("{:>4} PRs  ", count_cell(project.pr_count)),
            Style::default().fg(Color::Magenta),
        ),
        Span::styled(
            format!("{:>4} beads", count_cell(project.bead_count)),
            Style::default().fg(Color::Cyan),
        ),
    ])
}

/// Pending counts render as an ellipsis, never as a number.
fn count_cell(count: i64) -> String {
    if count == COUNT_PENDING {
        "…".to_string()
    } else {
        count.to_string()
    }
}
