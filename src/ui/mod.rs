mod dashboard;
mod detail;
mod overlays;

use std::io::{self, Stdout};

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use unicode_width::UnicodeWidthStr;

use crate::engine::{AppState, Mode};

pub fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend)
}

pub fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()
}

pub fn draw(frame: &mut Frame, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(3),
        ])
        .split(frame.area());

    render_header(frame, chunks[0], state);

    match state.mode {
        Mode::Dashboard => dashboard::render(frame, chunks[1], state),
        Mode::ProjectDetail => detail::render(frame, chunks[1], state),
    }

    render_footer(frame, chunks[2], state);

    if let Some(overlay) = state.overlays.peek() {
        let area = centered_area(frame.area(), 60, 50);
        overlays::render(frame, area, overlay);
    }
}

fn centered_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn render_header(frame: &mut Frame, area: Rect, state: &AppState) {
    let mut title = vec![Span::styled(
        " DEVDECK ",
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )];

    match (&state.mode, &state.detail) {
        (Mode::ProjectDetail, Some(detail)) => {
            title.push(Span::raw("| "));
            title.push(Span::styled(
                format!("project: {} ", detail.project),
                Style::default().fg(Color::Yellow),
            ));
        }
        _ => {
            if area.width >= 70 {
                title.push(Span::raw("- projects, PRs, beads, panes "));
            }
            title.push(Span::raw("| "));
            title.push(Span::styled(
                format!("{} project(s) ", state.dashboard.projects.len()),
                Style::default().fg(Color::Yellow),
            ));
        }
    }

    let header = Paragraph::new(Line::from(title)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    frame.render_widget(header, area);
}

fn render_footer(frame: &mut Frame, area: Rect, state: &AppState) {
    let mut spans = Vec::new();

    if let Some(status) = &state.status {
        let style = if status.is_error {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::Green)
        };
        spans.push(Span::styled(format!("{} | ", status.text), style));
    }

    if state.leader.waiting() {
        for (key, label) in state.leader.hints(state.mode) {
            spans.push(Span::styled(key, Style::default().fg(Color::Yellow)));
            spans.push(Span::raw(format!(": {}  ", label)));
        }
    } else {
        let leader = if state.leader.leader_token() == " " {
            "Space".to_string()
        } else {
            state.leader.leader_token().to_string()
        };
        spans.push(Span::styled(leader, Style::default().fg(Color::Yellow)));
        spans.push(Span::raw(": commands "));
        spans.push(Span::styled("Enter", Style::default().fg(Color::Yellow)));
        match state.mode {
            Mode::Dashboard => spans.push(Span::raw(": open project ")),
            Mode::ProjectDetail => {
                spans.push(Span::raw(": shell "));
                spans.push(Span::styled("/", Style::default().fg(Color::Yellow)));
                spans.push(Span::raw(": filter "));
                spans.push(Span::styled("Esc", Style::default().fg(Color::Yellow)));
                spans.push(Span::raw(": back "));
            }
        }
        spans.push(Span::styled("Ctrl+C", Style::default().fg(Color::Yellow)));
        spans.push(Span::raw(": quit"));
    }

    let footer = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(footer, area);
}

/// Truncates to a display width, appending an ellipsis when cut.
fn truncate_display(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    let mut out = String::new();
    let mut width = 0;
    for c in s.chars() {
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if width + w > max_width.saturating_sub(1) {
            break;
        }
        width += w;
        out.push(c);
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_display_leaves_short_strings_alone() {
        assert_eq!(truncate_display("svc", 10), "svc");
    }

    #[test]
    fn truncate_display_cuts_to_width() {
        let cut = truncate_display("a-very-long-repository-name", 10);
        assert!(cut.width() <= 10);
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn centered_area_is_inside_parent() {
        let parent = Rect::new(0, 0, 100, 40);
        let inner = centered_area(parent, 60, 50);
        assert!(inner.x >= parent.x && inner.right() <= parent.right());
        assert!(inner.y >= parent.y && inner.bottom() <= parent.bottom());
    }
}
