use std::fmt::Write;

use super::Render;
use crate::error::Result;
use crate::format::{format_kib, format_mib, format_optional, format_uptime};
use crate::system::counters::{GpuEntry, MemoryCounterRecord};
use crate::system::snapshot::{HostInfo, UtilizationSnapshot};

/// Plain text report, one block per section separated by blank lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRenderer;

impl Render for TextRenderer {
    fn render(&self, snapshot: &UtilizationSnapshot) -> Result<String> {
        let mut out = String::new();
        write_host(&mut out, snapshot.host());

        let _ = writeln!(out, "CPU: {:.2}%", snapshot.average());
        for core in snapshot.cores() {
            let _ = writeln!(out, "  {}: {:.2}%", core.id, core.percent);
        }
        let _ = writeln!(out);

        write_memory(&mut out, snapshot.memory());

        for (index, gpu) in snapshot.gpus().gpus.iter().enumerate() {
            let _ = writeln!(out);
            write_gpu(&mut out, index, gpu);
        }
        Ok(out)
    }
}

fn write_host(out: &mut String, host: &HostInfo) {
    let Some(name) = &host.host_name else {
        return;
    };
    let [one, five, fifteen] = host.load_average;
    let _ = writeln!(
        out,
        "{name}  up {}  load {one:.2} {five:.2} {fifteen:.2}",
        format_uptime(host.uptime_secs)
    );
    let _ = writeln!(out);
}

fn write_memory(out: &mut String, mem: &MemoryCounterRecord) {
    let _ = writeln!(out, "MEMORY: {:.2}%", mem.mem_percentage);
    let _ = writeln!(out, "  Total: {}", format_kib(mem.mem_total));
    let _ = writeln!(out, "  Used: {}", format_kib(mem.mem_used));
    let _ = writeln!(out, "  Free: {}", format_kib(mem.mem_free));
    let _ = writeln!(out);
    let _ = writeln!(out, "SWAP: {:.2}%", mem.swap_percentage);
    let _ = writeln!(out, "  Total: {}", format_kib(mem.swap_total));
    let _ = writeln!(out, "  Used: {}", format_kib(mem.swap_used));
    let _ = writeln!(out, "  Free: {}", format_kib(mem.swap_free));
}

fn write_gpu(out: &mut String, index: usize, gpu: &GpuEntry) {
    let _ = writeln!(out, "GPU{index} {}:", gpu.name);
    let _ = writeln!(
        out,
        "  SM Utilization: {}",
        format_optional(gpu.sm_utilization, "%")
    );
    let _ = writeln!(
        out,
        "  Mem Bandwidth Utilization: {}",
        format_optional(gpu.mem_bandwidth_utilization, "%")
    );
    let _ = writeln!(out, "  Memory: {:.2}%", gpu.mem_used_percentage());
    let _ = writeln!(out, "    Total: {}", format_optional(gpu.mem_total.map(format_mib), ""));
    let _ = writeln!(out, "    Used: {}", format_optional(gpu.mem_used.map(format_mib), ""));
    let _ = writeln!(out, "    Free: {}", format_optional(gpu.mem_free.map(format_mib), ""));
    let _ = writeln!(
        out,
        "  Graphics Clock: {}",
        format_optional(gpu.graphics_clock, " MHz")
    );
    let _ = writeln!(out, "  Mem Clock: {}", format_optional(gpu.mem_clock, " MHz"));
    let _ = writeln!(out, "  Video Clock: {}", format_optional(gpu.video_clock, " MHz"));
    let _ = writeln!(
        out,
        "  Power Draw: {}",
        format_optional(gpu.power_draw.map(|w| format!("{w:.1}")), " W")
    );
    let _ = writeln!(out, "  Temperature: {}", format_optional(gpu.temperature, "°C"));
}
