use std::fmt::Write;

use super::Render;
use crate::config::SvgConfig;
use crate::error::{MonitorError, Result};
use crate::format::truncate_unicode;
use crate::system::snapshot::UtilizationSnapshot;

const LABEL_WIDTH: u32 = 64;
const VALUE_WIDTH: u32 = 48;
const ROW_GAP: u32 = 4;
const LABEL_CHARS: usize = 9;

/// Horizontal bar chart: one bar per core, then memory, swap and GPUs.
#[derive(Debug, Clone)]
pub struct SvgRenderer {
    width: u32,
    bar_height: u32,
}

impl SvgRenderer {
    pub fn new(width: u32, bar_height: u32) -> Self {
        Self { width, bar_height }
    }

    pub fn from_config(config: &SvgConfig) -> Self {
        Self::new(config.width, config.bar_height)
    }

    fn bar_width(&self) -> Result<u32> {
        self.width
            .checked_sub(LABEL_WIDTH + VALUE_WIDTH)
            .filter(|w| *w > 0)
            .ok_or_else(|| {
                MonitorError::Render(format!(
                    "svg width {} leaves no room for bars (minimum {})",
                    self.width,
                    LABEL_WIDTH + VALUE_WIDTH + 1
                ))
            })
    }
}

impl Render for SvgRenderer {
    fn render(&self, snapshot: &UtilizationSnapshot) -> Result<String> {
        if self.bar_height == 0 {
            return Err(MonitorError::Render("svg bar height must be positive".into()));
        }
        let bar_width = self.bar_width()?;

        let rows = bar_rows(snapshot);
        let row_height = self.bar_height + ROW_GAP;
        let height = rows.len() as u32 * row_height + ROW_GAP;

        let mut out = String::new();
        let _ = writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{height}" viewBox="0 0 {} {height}">"#,
            self.width, self.width
        );
        let _ = writeln!(
            out,
            r##"<rect width="100%" height="100%" fill="#1e1e2e"/>"##
        );

        for (i, (label, percent)) in rows.iter().enumerate() {
            let y = ROW_GAP + i as u32 * row_height;
            let text_y = y + self.bar_height - 2;
            let filled = (bar_width as f64 * percent.clamp(0.0, 100.0) / 100.0).round() as u32;
            let _ = writeln!(
                out,
                r##"<text x="2" y="{text_y}" font-family="monospace" font-size="{}" fill="#cdd6f4">{}</text>"##,
                self.bar_height.saturating_sub(2).max(1),
                escape(&truncate_unicode(label, LABEL_CHARS))
            );
            let _ = writeln!(
                out,
                r##"<rect x="{LABEL_WIDTH}" y="{y}" width="{bar_width}" height="{}" fill="#313244"/>"##,
                self.bar_height
            );
            let _ = writeln!(
                out,
                r#"<rect x="{LABEL_WIDTH}" y="{y}" width="{filled}" height="{}" fill="{}"/>"#,
                self.bar_height,
                heat_color(*percent)
            );
            let _ = writeln!(
                out,
                r##"<text x="{}" y="{text_y}" font-family="monospace" font-size="{}" fill="#cdd6f4">{percent:.1}%</text>"##,
                LABEL_WIDTH + bar_width + 4,
                self.bar_height.saturating_sub(2).max(1)
            );
        }
        out.push_str("</svg>\n");
        Ok(out)
    }
}

fn bar_rows(snapshot: &UtilizationSnapshot) -> Vec<(String, f64)> {
    let mut rows: Vec<(String, f64)> = snapshot
        .cores()
        .iter()
        .map(|core| (core.id.clone(), core.percent))
        .collect();
    rows.push(("avg".to_string(), snapshot.average()));
    rows.push(("mem".to_string(), snapshot.memory().mem_percentage));
    rows.push(("swap".to_string(), snapshot.memory().swap_percentage));
    for (index, gpu) in snapshot.gpus().gpus.iter().enumerate() {
        rows.push((
            format!("gpu{index}"),
            gpu.sm_utilization.map_or(0.0, f64::from),
        ));
        rows.push((format!("gpu{index}mem"), gpu.mem_used_percentage()));
    }
    rows
}

fn heat_color(percent: f64) -> &'static str {
    if percent >= 80.0 {
        "#f38ba8"
    } else if percent >= 50.0 {
        "#f9e2af"
    } else {
        "#a6e3a1"
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
