use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Gauge, Paragraph};

use super::theme::Theme;
use crate::format::{format_kib, format_uptime};
use crate::system::snapshot::UtilizationSnapshot;

pub fn render(frame: &mut Frame, area: Rect, snapshot: &UtilizationSnapshot, theme: &Theme) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Percentage(30),
            Constraint::Percentage(30),
        ])
        .split(area);

    render_branding(frame, chunks[0], snapshot, theme);
    render_cpu_gauge(frame, chunks[1], snapshot, theme);
    render_ram_gauge(frame, chunks[2], snapshot, theme);
}

fn bordered(theme: &Theme) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.border))
}

fn titled(title: String, theme: &Theme) -> Block<'static> {
    bordered(theme).title(Span::styled(
        title,
        Style::default()
            .fg(theme.text_secondary)
            .add_modifier(Modifier::BOLD),
    ))
}

fn render_branding(frame: &mut Frame, area: Rect, snapshot: &UtilizationSnapshot, theme: &Theme) {
    let block = bordered(theme);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let host = snapshot.host();
    let mut spans = vec![Span::styled(
        " coremon ",
        Style::default()
            .fg(theme.header_accent_fg)
            .bg(theme.header_accent_bg)
            .add_modifier(Modifier::BOLD),
    )];
    if let Some(name) = &host.host_name {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            name.clone(),
            Style::default()
                .fg(theme.text_primary)
                .add_modifier(Modifier::BOLD),
        ));
    }
    spans.push(Span::styled(
        format!(
            "  up {}  load {:.2}",
            format_uptime(host.uptime_secs),
            host.load_average[0]
        ),
        Style::default().fg(theme.text_secondary),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), inner);
}

fn render_cpu_gauge(frame: &mut Frame, area: Rect, snapshot: &UtilizationSnapshot, theme: &Theme) {
    let average = snapshot.average();
    let gauge = Gauge::default()
        .block(titled(format!(" CPU ({} cores) ", snapshot.cores().len()), theme))
        .gauge_style(
            Style::default()
                .fg(theme.heat(average))
                .bg(theme.gauge_unfilled),
        )
        .ratio((average / 100.0).clamp(0.0, 1.0))
        .label(format!("{average:.1}%"));
    frame.render_widget(gauge, area);
}

fn render_ram_gauge(frame: &mut Frame, area: Rect, snapshot: &UtilizationSnapshot, theme: &Theme) {
    let mem = snapshot.memory();
    let gauge = Gauge::default()
        .block(titled(" RAM ".to_string(), theme))
        .gauge_style(
            Style::default()
                .fg(theme.heat(mem.mem_percentage))
                .bg(theme.gauge_unfilled),
        )
        .ratio((mem.mem_percentage / 100.0).clamp(0.0, 1.0))
        .label(format!(
            "{}/{} ({:.0}%)",
            format_kib(mem.mem_used),
            format_kib(mem.mem_total),
            mem.mem_percentage
        ));
    frame.render_widget(gauge, area);
}
