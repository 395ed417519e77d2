use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use super::theme::Theme;

pub fn render(
    frame: &mut Frame,
    area: Rect,
    status_message: Option<&str>,
    refresh_rate_ms: u64,
    theme: &Theme,
) {
    let bg_style = Style::default().bg(theme.statusbar_bg);

    if let Some(msg) = status_message {
        let line = Line::from(Span::styled(
            format!(" {msg}"),
            Style::default()
                .fg(theme.status_ok)
                .add_modifier(Modifier::BOLD),
        ));
        frame.render_widget(Paragraph::new(line).style(bg_style), area);
        return;
    }

    let mut spans = Vec::new();
    spans.extend(pill_spans("q", "Quit", theme));
    spans.extend(pill_spans("r", "Refresh", theme));
    spans.push(Span::styled(
        format!("  every {refresh_rate_ms} ms"),
        Style::default().fg(theme.text_secondary),
    ));
    frame.render_widget(Paragraph::new(Line::from(spans)).style(bg_style), area);
}

fn pill_spans<'a>(key: &'a str, desc: &'a str, theme: &Theme) -> Vec<Span<'a>> {
    vec![
        Span::raw(" "),
        Span::styled(
            format!(" {key} "),
            Style::default()
                .fg(theme.pill_key_fg)
                .bg(theme.pill_key_bg)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" {desc}"),
            Style::default().fg(theme.pill_desc_fg),
        ),
    ]
}
