pub mod action;
pub mod app;
pub mod config;
pub mod error;
pub mod event;
pub mod format;
pub mod logging;
pub mod render;
pub mod system;

pub use error::{MonitorError, Result};
