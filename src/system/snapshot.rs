use std::time::SystemTime;

use serde::Serialize;
use sysinfo::System;

use super::counters::{GpuCounterRecord, MemoryCounterRecord};
use super::utilization::Utilization;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct HostInfo {
    pub host_name: Option<String>,
    pub load_average: [f64; 3],
    pub uptime_secs: u64,
}

impl HostInfo {
    pub fn current() -> Self {
        let load = System::load_average();
        HostInfo {
            host_name: System::host_name(),
            load_average: [load.one, load.five, load.fifteen],
            uptime_secs: System::uptime(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CoreUtilization {
    pub id: String,
    pub percent: f64,
}

/// One sampling cycle's result. Fields are read-only once assembled.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UtilizationSnapshot {
    cores: Vec<CoreUtilization>,
    average: f64,
    memory: MemoryCounterRecord,
    gpus: GpuCounterRecord,
    host: HostInfo,
    #[serde(with = "unix_seconds")]
    taken_at: SystemTime,
}

impl UtilizationSnapshot {
    /// Pairs each core id with its utilization.
    ///
    /// `core_ids` and `utilization.per_core` come from the same record, so
    /// their lengths match.
    pub fn assemble<I>(
        core_ids: I,
        utilization: Utilization,
        memory: MemoryCounterRecord,
        gpus: GpuCounterRecord,
        host: HostInfo,
    ) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let cores = core_ids
            .into_iter()
            .zip(utilization.per_core)
            .map(|(id, percent)| CoreUtilization { id, percent })
            .collect();

        UtilizationSnapshot {
            cores,
            average: utilization.average,
            memory,
            gpus,
            host,
            taken_at: SystemTime::now(),
        }
    }

    pub fn cores(&self) -> &[CoreUtilization] {
        &self.cores
    }

    pub fn average(&self) -> f64 {
        self.average
    }

    pub fn memory(&self) -> &MemoryCounterRecord {
        &self.memory
    }

    pub fn gpus(&self) -> &GpuCounterRecord {
        &self.gpus
    }

    pub fn host(&self) -> &HostInfo {
        &self.host
    }

    pub fn taken_at(&self) -> SystemTime {
        self.taken_at
    }
}

mod unix_seconds {
    use std::time::{SystemTime, UNIX_EPOCH};

    use serde::Serializer;

    pub fn serialize<S: Serializer>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error> {
        let secs = time
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        serializer.serialize_f64(secs)
    }
}
