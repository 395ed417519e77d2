use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;

use super::theme::Theme;
use super::{cores, gpu, header, statusbar};
use crate::app::tests::fixture_app;
use crate::render::fixtures;
use crate::system::history::UtilizationHistory;

fn buffer_to_string(buf: &ratatui::buffer::Buffer) -> String {
    let area = buf.area;
    let mut out = String::new();
    for y in 0..area.height {
        for x in 0..area.width {
            let cell = buf.cell((x, y)).unwrap();
            out.push_str(cell.symbol());
        }
        if y + 1 < area.height {
            out.push('\n');
        }
    }
    out
}

fn render_to_string<F>(width: u16, height: u16, draw: F) -> String
where
    F: FnOnce(&mut ratatui::Frame),
{
    let backend = TestBackend::new(width, height);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal.draw(draw).unwrap();
    let buf = terminal.backend().buffer();
    buffer_to_string(buf)
}

#[test]
fn header_shows_average_and_ram() {
    let snapshot = fixtures::snapshot(Vec::new());
    let output = render_to_string(100, 3, |frame| {
        header::render(frame, Rect::new(0, 0, 100, 3), &snapshot, &Theme::dark());
    });

    assert!(output.contains("coremon"));
    assert!(output.contains("CPU (2 cores)"));
    assert!(output.contains("50.0%"));
    assert!(output.contains("RAM"));
    assert!(output.contains("12.0 GiB/16.0 GiB (75%)"));
}

#[test]
fn core_gauges_one_per_row() {
    let snapshot = fixtures::snapshot(Vec::new());
    let output = render_to_string(40, 4, |frame| {
        cores::render_gauges(frame, Rect::new(0, 0, 40, 4), &snapshot, &Theme::dark());
    });

    let lines: Vec<&str> = output.lines().collect();
    assert!(lines[0].contains("Cores"));
    assert!(lines[1].contains("cpu0"));
    assert!(lines[1].contains("25.0%"));
    assert!(lines[2].contains("cpu1"));
    assert!(lines[2].contains("75.0%"));
}

#[test]
fn history_panel_draws_sparklines() {
    let mut history = UtilizationHistory::new(10);
    history.record(&fixtures::snapshot(Vec::new()));
    let output = render_to_string(20, 4, |frame| {
        cores::render_history(frame, Rect::new(0, 0, 20, 4), &history, &Theme::dark());
    });
    assert!(output.contains("History"));
    // 75% on the second core renders a partial block
    assert!(output.lines().nth(2).unwrap().chars().any(|c| c != ' ' && c != '│'));
}

#[test]
fn gpu_panel_lists_each_gpu() {
    let snapshot = fixtures::snapshot(vec![fixtures::gpu()]);
    let height = gpu::panel_height(snapshot.gpus());
    let output = render_to_string(80, height, |frame| {
        gpu::render(frame, Rect::new(0, 0, 80, height), snapshot.gpus(), &Theme::dark());
    });
    assert!(output.contains("GPU0 NVIDIA GeForce RTX 3060"));
    assert!(output.contains("3.0 GiB / 12.0 GiB"));
    assert!(output.contains("busy 40%"));
}

#[test]
fn statusbar_pills_and_message() {
    let output = render_to_string(60, 1, |frame| {
        statusbar::render(frame, Rect::new(0, 0, 60, 1), None, 2000, &Theme::dark());
    });
    assert!(output.contains(" q  Quit"));
    assert!(output.contains(" r  Refresh"));
    assert!(output.contains("every 2000 ms"));

    let output = render_to_string(60, 1, |frame| {
        statusbar::render(
            frame,
            Rect::new(0, 0, 60, 1),
            Some("Refreshed"),
            2000,
            &Theme::dark(),
        );
    });
    assert!(output.starts_with(" Refreshed"));
}

#[test]
fn full_dashboard_without_gpus() {
    let (app, _dir) = fixture_app("draw", 4);
    let output = render_to_string(100, 12, |frame| super::draw(frame, &app));

    assert!(output.contains("coremon"));
    assert!(output.contains("Cores"));
    assert!(output.contains("cpu3"));
    assert!(output.contains("History"));
    assert!(!output.contains("GPU"));
    assert!(output.lines().last().unwrap().contains("Quit"));
}

#[test]
fn core_gauges_title_counts_cores_past_the_bottom() {
    use crate::system::counters::{GpuCounterRecord, MemoryCounterRecord};
    use crate::system::snapshot::{HostInfo, UtilizationSnapshot};
    use crate::system::utilization::Utilization;

    let snapshot = UtilizationSnapshot::assemble(
        (0..64).map(|i| format!("cpu{i}")),
        Utilization {
            per_core: vec![10.0; 64],
            average: 10.0,
        },
        MemoryCounterRecord::from_totals(1024, 512, 0, 0),
        GpuCounterRecord { gpus: Vec::new() },
        HostInfo::default(),
    );
    let output = render_to_string(40, 6, |frame| {
        cores::render_gauges(frame, Rect::new(0, 0, 40, 6), &snapshot, &Theme::dark());
    });

    let lines: Vec<&str> = output.lines().collect();
    assert!(lines[0].contains("Cores (4 of 64)"));
    assert!(lines[4].contains("cpu3"));
    assert!(!output.contains("cpu4 "));

    let mut history = UtilizationHistory::new(10);
    history.record(&snapshot);
    let output = render_to_string(40, 6, |frame| {
        cores::render_history(frame, Rect::new(0, 0, 40, 6), &history, &Theme::dark());
    });
    assert!(output.lines().next().unwrap().contains("History (4 of 64)"));
}
