pub mod collector;
pub mod counters;
pub mod gpu;
pub mod history;
pub mod meminfo;
pub mod platform;
pub mod snapshot;
pub mod source;
pub mod stat;
pub mod store;
pub mod utilization;
