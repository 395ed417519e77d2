use serde::Serialize;

/// Longest core identifier the sample region can hold.
pub const CORE_ID_MAX_LEN: usize = 16;

/// Cumulative time counters for one logical core, in clock ticks.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CoreCounters {
    pub id: String,
    pub user: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
    pub guest: u64,
}

impl CoreCounters {
    /// Ticks spent idle or waiting on I/O.
    pub fn idle_ticks(&self) -> u64 {
        self.idle.saturating_add(self.iowait)
    }

    pub fn busy_ticks(&self) -> u64 {
        self.user
            .saturating_add(self.system)
            .saturating_add(self.irq)
            .saturating_add(self.softirq)
            .saturating_add(self.steal)
            .saturating_add(self.guest)
    }

    pub fn total_ticks(&self) -> u64 {
        self.idle_ticks().saturating_add(self.busy_ticks())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CpuCounterRecord {
    pub cores: Vec<CoreCounters>,
}

impl CpuCounterRecord {
    pub fn new(cores: Vec<CoreCounters>) -> Self {
        Self { cores }
    }

    pub fn core_count(&self) -> usize {
        self.cores.len()
    }
}

/// Primary memory and swap figures in kB, as the kernel reports them.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MemoryCounterRecord {
    pub mem_total: u64,
    pub mem_free: u64,
    pub mem_used: u64,
    pub mem_percentage: f64,
    pub swap_total: u64,
    pub swap_free: u64,
    pub swap_used: u64,
    pub swap_percentage: f64,
}

impl MemoryCounterRecord {
    /// Derives used amounts and percentages. A zero total yields 0%.
    pub fn from_totals(mem_total: u64, mem_free: u64, swap_total: u64, swap_free: u64) -> Self {
        let mem_used = mem_total.saturating_sub(mem_free);
        let swap_used = swap_total.saturating_sub(swap_free);
        Self {
            mem_total,
            mem_free,
            mem_used,
            mem_percentage: percentage(mem_used, mem_total),
            swap_total,
            swap_free,
            swap_used,
            swap_percentage: percentage(swap_used, swap_total),
        }
    }
}

pub fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * part as f64 / total as f64
    }
}

/// One GPU as reported by the native source or the vendor query.
///
/// Numeric fields are `None` when the backend reports them as unavailable.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GpuEntry {
    pub name: String,
    pub sm_utilization: Option<u32>,
    pub mem_bandwidth_utilization: Option<u32>,
    /// MiB
    pub mem_total: Option<u64>,
    pub mem_used: Option<u64>,
    pub mem_free: Option<u64>,
    /// MHz
    pub graphics_clock: Option<u32>,
    pub mem_clock: Option<u32>,
    pub video_clock: Option<u32>,
    /// Watts
    pub power_draw: Option<f64>,
    /// Degrees Celsius
    pub temperature: Option<u32>,
}

impl GpuEntry {
    pub fn mem_used_percentage(&self) -> f64 {
        match (self.mem_used, self.mem_total) {
            (Some(used), Some(total)) => percentage(used, total),
            _ => 0.0,
        }
    }
}

/// Empty when no GPU backend is present.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GpuCounterRecord {
    pub gpus: Vec<GpuEntry>,
}

impl GpuCounterRecord {
    pub fn is_empty(&self) -> bool {
        self.gpus.is_empty()
    }
}
