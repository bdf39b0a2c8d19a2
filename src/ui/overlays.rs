use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::engine::{Overlay, OverlayView};

pub fn render(frame: &mut Frame, area: Rect, overlay: &Overlay) {
    frame.render_widget(Clear, area);
    match &overlay.view {
        OverlayView::Input { title, value, .. } => render_input(frame, area, title, value),
        OverlayView::Confirm { prompt, .. } => render_confirm(frame, area, prompt),
        OverlayView::Progress { title, lines, done } => {
            render_progress(frame, area, title, lines, *done)
        }
    }
}

fn render_input(frame: &mut Frame, area: Rect, title: &str, value: &str) {
    let body = Paragraph::new(Line::from(vec![
        Span::raw(value.to_string()),
        Span::styled("_", Style::default().fg(Color::Yellow)),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} (Enter to submit, Esc to cancel) ", title))
            .border_style(Style::default().fg(Color::Yellow)),
    );
    frame.render_widget(body, area);
}

fn render_confirm(frame: &mut Frame, area: Rect, prompt: &str) {
    let body = Paragraph::new(vec![
        Line::from(prompt.to_string()),
        Line::from(""),
        Line::from(vec![
            Span::styled("y", Style::default().fg(Color::Green)),
            Span::raw(": confirm  "),
            Span::styled("n", Style::default().fg(Color::Red)),
            Span::raw("/"),
            Span::styled("Esc", Style::default().fg(Color::Red)),
            Span::raw(": cancel"),
        ]),
    ])
    .wrap(Wrap { trim: false })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Confirm ")
            .border_style(Style::default().fg(Color::Red)),
    );
    frame.render_widget(body, area);
}

fn render_progress(frame: &mut Frame, area: Rect, title: &str, lines: &[String], done: bool) {
    // show the tail that fits inside the border
    let visible = area.height.saturating_sub(2) as usize;
    let start = lines.len().saturating_sub(visible.max(1));
    let mut body: Vec<Line> = lines[start..]
        .iter()
        .map(|l| Line::from(l.clone()))
        .collect();

    let hint = if done {
        Line::from(Span::styled(
            "finished, Esc to close",
            Style::default().fg(Color::Green),
        ))
    } else {
        Line::from(Span::styled(
            "Esc to stop watching, Esc again to close",
            Style::default().fg(Color::DarkGray),
        ))
    };
    body.push(hint);

    let widget = Paragraph::new(body).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", title))
            .border_style(Style::default().fg(Color::Cyan)),
    );
    frame.render_widget(widget, area);
}
