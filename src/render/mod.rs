pub mod dashboard;
pub mod json;
pub mod svg;
pub mod text;

use clap::ValueEnum;

use crate::config::SvgConfig;
use crate::error::Result;
use crate::system::snapshot::UtilizationSnapshot;

pub use json::JsonRenderer;
pub use svg::SvgRenderer;
pub use text::TextRenderer;

/// Turns one snapshot into a complete output document.
pub trait Render {
    fn render(&self, snapshot: &UtilizationSnapshot) -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Svg,
    Json,
}

impl OutputFormat {
    pub fn from_str_config(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "svg" => OutputFormat::Svg,
            "json" => OutputFormat::Json,
            _ => OutputFormat::Text,
        }
    }
}

pub fn renderer(format: OutputFormat, svg: &SvgConfig) -> Box<dyn Render> {
    match format {
        OutputFormat::Text => Box::new(TextRenderer),
        OutputFormat::Svg => Box::new(SvgRenderer::from_config(svg)),
        OutputFormat::Json => Box::new(JsonRenderer::default()),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::system::counters::{GpuCounterRecord, GpuEntry, MemoryCounterRecord};
    use crate::system::snapshot::{HostInfo, UtilizationSnapshot};
    use crate::system::utilization::Utilization;

    pub fn snapshot(gpus: Vec<GpuEntry>) -> UtilizationSnapshot {
        UtilizationSnapshot::assemble(
            vec!["cpu0".to_string(), "cpu1".to_string()],
            Utilization {
                per_core: vec![25.0, 75.0],
                average: 50.0,
            },
            MemoryCounterRecord::from_totals(16 * 1024 * 1024, 4 * 1024 * 1024, 2048, 1024),
            GpuCounterRecord { gpus },
            HostInfo::default(),
        )
    }

    pub fn gpu() -> GpuEntry {
        GpuEntry {
            name: "NVIDIA GeForce RTX 3060".to_string(),
            sm_utilization: Some(40),
            mem_bandwidth_utilization: Some(10),
            mem_total: Some(12288),
            mem_used: Some(3072),
            mem_free: Some(9216),
            graphics_clock: Some(1777),
            mem_clock: Some(7500),
            video_clock: Some(1560),
            power_draw: Some(42.5),
            temperature: None,
        }
    }
}
