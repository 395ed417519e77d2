pub mod cores;
pub mod gpu;
pub mod header;
pub mod statusbar;
pub mod theme;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};

use crate::app::App;

pub fn draw(frame: &mut Frame, app: &App) {
    let snapshot = &app.snapshot;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(gpu::panel_height(snapshot.gpus())),
            Constraint::Length(1),
        ])
        .split(frame.area());

    header::render(frame, chunks[0], snapshot, &app.theme);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);
    cores::render_gauges(frame, body[0], snapshot, &app.theme);
    cores::render_history(frame, body[1], &app.history, &app.theme);

    if !snapshot.gpus().is_empty() {
        gpu::render(frame, chunks[2], snapshot.gpus(), &app.theme);
    }

    statusbar::render(
        frame,
        chunks[3],
        app.status_message(),
        app.refresh_rate_ms,
        &app.theme,
    );
}

#[cfg(test)]
mod tests;
