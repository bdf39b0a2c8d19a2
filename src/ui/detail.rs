use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::engine::{AppState, DetailPhase, DetailState};
use crate::models::{Resource, ResourceKind};

pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(detail) = state.detail.as_ref() else {
        return;
    };

    let show_filter = detail.filtering || !detail.filter.is_empty();
    let chunks = if show_filter {
        Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(3)])
            .split(area)
    } else {
        Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3)])
            .split(area)
    };

    render_resources(frame, chunks[0], detail);
    if show_filter {
        render_filter(frame, chunks[1], detail);
    }
}

fn render_resources(frame: &mut Frame, area: Rect, detail: &DetailState) {
    let visible = detail.visible_indices();
    let items: Vec<ListItem> = visible
        .iter()
        .map(|&i| ListItem::new(resource_line(&detail.resources[i])))
        .collect();

    let title = match detail.phase {
        DetailPhase::Idle => " Resources ".to_string(),
        DetailPhase::LoadingRepos => " Resources (reading repos…) ".to_string(),
        DetailPhase::LoadingPrs => " Resources (fetching PRs…) ".to_string(),
        DetailPhase::LoadingBeads => " Resources (scanning beads…) ".to_string(),
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
    if !visible.is_empty() {
        list_state.select(Some(detail.selected.min(visible.len() - 1)));
    }
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn resource_line(resource: &Resource) -> Line<'static> {
    let mut spans = Vec::new();

    match resource.kind {
        ResourceKind::Repo => {
            spans.push(Span::styled(
                format!("{:<30}", super::truncate_display(&resource.title(), 30)),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ));
            if resource.loading_prs {
                spans.push(Span::styled(
                    "PRs… ",
                    Style::default().fg(Color::DarkGray),
                ));
            }
        }
        ResourceKind::Pr => {
            spans.push(Span::raw("  "));
            spans.push(Span::styled(
                format!("{:<28}", super::truncate_display(&resource.title(), 28)),
                Style::default().fg(Color::Magenta),
            ));
        }
    }

    if resource.has_worktree() {
        if resource.loading_beads {
            spans.push(Span::styled("beads… ", Style::default().fg(Color::DarkGray)));
        } else {
            spans.push(Span::styled(
                format!("{} open bead(s) ", resource.open_bead_count()),
                Style::default().fg(Color::Cyan),
            ));
        }
    } else {
        spans.push(Span::styled(
            "no worktree ",
            Style::default().fg(Color::DarkGray),
        ));
    }

    for pane in &resource.panes {
        spans.push(Span::styled(
            format!("[{}] ", pane.label()),
            Style::default().fg(Color::Green),
        ));
    }

    Line::from(spans)
}

fn render_filter(frame: &mut Frame, area: Rect, detail: &DetailState) {
    let cursor = if detail.filtering { "_" } else { "" };
    let filter = Paragraph::new(Line::from(vec![
        Span::styled("/", Style::default().fg(Color::Yellow)),
        Span::raw(format!("{}{}", detail.filter, cursor)),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Filter ")
            .border_style(Style::default().fg(Color::Yellow)),
    );
    frame.render_widget(filter, area);
}
