use super::counters::CpuCounterRecord;
use super::snapshot::{HostInfo, UtilizationSnapshot};
use super::source::CounterSources;
use super::store::{Previous, SampleStore, load_or_init_previous};
use super::utilization;
use crate::error::Result;

/// Runs sampling cycles against a set of counter sources and a sample store.
pub struct Collector<S> {
    sources: CounterSources,
    store: S,
}

impl<S: SampleStore> Collector<S> {
    pub fn new(sources: CounterSources, store: S) -> Self {
        Collector { sources, store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Seeds an empty store so the next cycle has a real window behind it.
    pub fn prime(&mut self) -> Result<()> {
        self.previous().map(|_| ())
    }

    /// One read, diff, assemble pass.
    ///
    /// The current record is persisted only after the diff succeeds, so a
    /// topology change leaves the stored sample untouched.
    pub fn sample(&mut self) -> Result<UtilizationSnapshot> {
        let _span = tracing::debug_span!("collector.sample").entered();

        let previous = self.previous()?;
        // A fresh seed doubles as the current reading: first cycle is 0%.
        let current = if previous.seeded {
            previous.record.clone()
        } else {
            self.sources.read_cpu_counters()?
        };
        let memory = self.sources.read_memory_counters()?;
        let gpus = self.sources.read_gpu_counters()?;

        let utilization = utilization::compute(&previous.record, &current)?;
        tracing::debug!(
            cores = current.core_count(),
            average = utilization.average,
            gpus = gpus.gpus.len(),
            "sampled"
        );

        let snapshot = UtilizationSnapshot::assemble(
            core_ids(&current),
            utilization,
            memory,
            gpus,
            HostInfo::current(),
        );
        self.store.store(&current)?;
        Ok(snapshot)
    }

    fn previous(&mut self) -> Result<Previous> {
        let sources = &self.sources;
        load_or_init_previous(&mut self.store, || sources.read_cpu_counters())
    }
}

fn core_ids(record: &CpuCounterRecord) -> Vec<String> {
    record.cores.iter().map(|c| c.id.clone()).collect()
}
