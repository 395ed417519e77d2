use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, LineGauge, Paragraph};
use unicode_width::UnicodeWidthStr;

use super::theme::Theme;
use crate::format::{format_mib, format_optional, truncate_unicode};
use crate::system::counters::{GpuCounterRecord, GpuEntry};

/// Rows each GPU occupies: a summary line and a utilization gauge.
const ROWS_PER_GPU: u16 = 2;

/// Height of the panel including borders, 0 when there is nothing to show.
pub fn panel_height(gpus: &GpuCounterRecord) -> u16 {
    if gpus.is_empty() {
        0
    } else {
        (gpus.gpus.len() as u16).saturating_mul(ROWS_PER_GPU) + 2
    }
}

pub fn render(frame: &mut Frame, area: Rect, gpus: &GpuCounterRecord, theme: &Theme) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.border))
        .title(Span::styled(
            " GPU ",
            Style::default()
                .fg(theme.text_secondary)
                .add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let visible = (inner.height / ROWS_PER_GPU) as usize;
    for (index, gpu) in gpus.gpus.iter().take(visible).enumerate() {
        let top = inner.y + index as u16 * ROWS_PER_GPU;
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Length(1)])
            .split(Rect::new(inner.x, top, inner.width, ROWS_PER_GPU));

        frame.render_widget(
            Paragraph::new(summary_line(index, gpu, inner.width as usize, theme)),
            rows[0],
        );

        let busy = gpu.sm_utilization.map_or(0.0, f64::from);
        let gauge = LineGauge::default()
            .filled_style(Style::default().fg(theme.heat(busy)))
            .unfilled_style(Style::default().fg(theme.gauge_unfilled))
            .ratio((busy / 100.0).clamp(0.0, 1.0))
            .label(format!(
                "busy {}  mem {:.0}%",
                format_optional(gpu.sm_utilization, "%"),
                gpu.mem_used_percentage()
            ));
        frame.render_widget(gauge, rows[1]);
    }
}

fn summary_line(index: usize, gpu: &GpuEntry, width: usize, theme: &Theme) -> Line<'static> {
    let details = format!(
        "  {} / {}  {}  {}",
        format_optional(gpu.mem_used.map(format_mib), ""),
        format_optional(gpu.mem_total.map(format_mib), ""),
        format_optional(gpu.temperature, "°C"),
        format_optional(gpu.power_draw.map(|w| format!("{w:.0}")), " W"),
    );
    let label = format!("GPU{index} ");
    let name_width = width.saturating_sub(label.width() + details.width());
    Line::from(vec![
        Span::styled(
            label,
            Style::default()
                .fg(theme.text_primary)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            truncate_unicode(&gpu.name, name_width),
            Style::default().fg(theme.text_primary),
        ),
        Span::styled(details, Style::default().fg(theme.text_secondary)),
    ])
}
