use std::collections::VecDeque;

use super::snapshot::UtilizationSnapshot;

const DEFAULT_CAPACITY: usize = 60;

/// Sparkline samples are stored as hundredths of a percent.
const SCALE: f64 = 100.0;

/// Display-only ring buffers of recent utilization, one per core plus the
/// average. Never persisted.
#[derive(Debug)]
pub struct UtilizationHistory {
    cores: Vec<VecDeque<u64>>,
    average: VecDeque<u64>,
    capacity: usize,
}

impl UtilizationHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            cores: Vec::new(),
            average: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record(&mut self, snapshot: &UtilizationSnapshot) {
        let cores = snapshot.cores();
        if self.cores.len() != cores.len() {
            self.cores = vec![VecDeque::with_capacity(self.capacity); cores.len()];
        }
        for (buffer, core) in self.cores.iter_mut().zip(cores) {
            push_capped(buffer, scaled(core.percent), self.capacity);
        }
        push_capped(&mut self.average, scaled(snapshot.average()), self.capacity);
    }

    pub fn core(&self, index: usize) -> Option<&VecDeque<u64>> {
        self.cores.get(index)
    }

    pub fn core_count(&self) -> usize {
        self.cores.len()
    }

    pub fn average(&self) -> &VecDeque<u64> {
        &self.average
    }

    /// Upper bound for sparkline rendering.
    pub fn max_value(&self) -> u64 {
        (100.0 * SCALE) as u64
    }
}

impl Default for UtilizationHistory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

fn scaled(percent: f64) -> u64 {
    (percent.clamp(0.0, 100.0) * SCALE).round() as u64
}

fn push_capped(buffer: &mut VecDeque<u64>, value: u64, capacity: usize) {
    if buffer.len() == capacity {
        buffer.pop_front();
    }
    buffer.push_back(value);
}
