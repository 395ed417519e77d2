use std::fs::{File, Metadata, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use super::PlatformExtensions;
use crate::system::counters::GpuEntry;

pub struct Platform;

impl PlatformExtensions for Platform {
    fn user_id() -> u32 {
        // No numeric uid; the temp dir below is already per-user.
        0
    }

    fn shared_region_dir() -> PathBuf {
        std::env::temp_dir()
    }

    fn page_size() -> usize {
        4096
    }

    fn open_region_file(path: &Path) -> io::Result<File> {
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
    }

    fn region_owner(_metadata: &Metadata) -> Option<u32> {
        None
    }

    fn native_gpus() -> Option<Vec<GpuEntry>> {
        None
    }
}
