use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::Span;
use ratatui::widgets::{Block, BorderType, Borders, LineGauge, Sparkline};

use super::theme::Theme;
use crate::format::truncate_unicode;
use crate::system::history::UtilizationHistory;
use crate::system::snapshot::UtilizationSnapshot;

const LABEL_WIDTH: usize = 7;

fn panel(title: String, theme: &Theme) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.border))
        .title(Span::styled(
            title,
            Style::default()
                .fg(theme.text_secondary)
                .add_modifier(Modifier::BOLD),
        ))
}

/// One line gauge per core. Cores that do not fit are summarized in the title.
pub fn render_gauges(frame: &mut Frame, area: Rect, snapshot: &UtilizationSnapshot, theme: &Theme) {
    let total = snapshot.cores().len();
    let rows = row_areas(Block::bordered().inner(area), total);
    let block = panel(panel_title("Cores", rows.len(), total), theme);
    frame.render_widget(block, area);

    for (core, row) in snapshot.cores().iter().zip(rows) {
        let gauge = LineGauge::default()
            .filled_style(Style::default().fg(theme.heat(core.percent)))
            .unfilled_style(Style::default().fg(theme.gauge_unfilled))
            .ratio((core.percent / 100.0).clamp(0.0, 1.0))
            .label(format!(
                "{:<width$} {:>5.1}%",
                truncate_unicode(&core.id, LABEL_WIDTH),
                core.percent,
                width = LABEL_WIDTH
            ));
        frame.render_widget(gauge, row);
    }
}

/// Recent utilization per core, newest on the right.
pub fn render_history(frame: &mut Frame, area: Rect, history: &UtilizationHistory, theme: &Theme) {
    let total = history.core_count();
    let rows = row_areas(Block::bordered().inner(area), total);
    let block = panel(panel_title("History", rows.len(), total), theme);
    frame.render_widget(block, area);

    for (index, row) in rows.into_iter().enumerate() {
        let Some(samples) = history.core(index) else {
            break;
        };
        let data: Vec<u64> = tail(samples.iter().copied(), row.width as usize);
        let sparkline = Sparkline::default()
            .data(&data)
            .max(history.max_value())
            .style(Style::default().fg(theme.sparkline_color));
        frame.render_widget(sparkline, row);
    }
}

fn panel_title(name: &str, shown: usize, total: usize) -> String {
    if shown < total {
        format!(" {name} ({shown} of {total}) ")
    } else {
        format!(" {name} ")
    }
}

fn row_areas(inner: Rect, count: usize) -> Vec<Rect> {
    let visible = count.min(inner.height as usize);
    if visible == 0 {
        return Vec::new();
    }
    Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(1); visible])
        .split(inner)
        .to_vec()
}

fn tail<I: ExactSizeIterator<Item = u64>>(iter: I, width: usize) -> Vec<u64> {
    let skip = iter.len().saturating_sub(width);
    iter.skip(skip).collect()
}
