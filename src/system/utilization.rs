use serde::Serialize;

use super::counters::{CoreCounters, CpuCounterRecord};
use crate::error::{MonitorError, Result};

/// Per-core busy percentages for one sampling window.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Utilization {
    pub per_core: Vec<f64>,
    pub average: f64,
}

/// Differences two cumulative samples into per-core utilization.
///
/// Fails when the core count differs between the samples or is zero.
/// Counters that moved backwards and windows with no elapsed ticks report 0%
/// for the affected core.
pub fn compute(prev: &CpuCounterRecord, curr: &CpuCounterRecord) -> Result<Utilization> {
    if prev.core_count() != curr.core_count() {
        return Err(MonitorError::TopologyChanged {
            previous: prev.core_count(),
            current: curr.core_count(),
        });
    }
    if curr.core_count() == 0 {
        return Err(MonitorError::NoCores);
    }

    let per_core: Vec<f64> = prev
        .cores
        .iter()
        .zip(&curr.cores)
        .map(|(p, c)| core_utilization(p, c))
        .collect();
    let average = per_core.iter().sum::<f64>() / per_core.len() as f64;

    Ok(Utilization { per_core, average })
}

pub fn core_utilization(prev: &CoreCounters, curr: &CoreCounters) -> f64 {
    let idle_prev = prev.idle_ticks();
    let idle_curr = curr.idle_ticks();
    let total_prev = prev.total_ticks();
    let total_curr = curr.total_ticks();

    // reset, wrap, or a different core behind the same slot
    if idle_curr < idle_prev || total_curr < total_prev {
        tracing::trace!(core = %curr.id, "counters moved backwards");
        return 0.0;
    }

    let idle_diff = idle_curr - idle_prev;
    let total_diff = total_curr - total_prev;
    if total_diff == 0 {
        return 0.0;
    }

    let busy = (1.0 - idle_diff as f64 / total_diff as f64) * 100.0;
    busy.clamp(0.0, 100.0)
}
