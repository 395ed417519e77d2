use std::fs::{File, Metadata, OpenOptions};
use std::io;
use std::os::unix::fs::{MetadataExt, OpenOptionsExt};
use std::path::{Path, PathBuf};

use super::PlatformExtensions;
use crate::system::counters::GpuEntry;

pub struct Platform;

impl PlatformExtensions for Platform {
    fn user_id() -> u32 {
        // SAFETY: getuid has no preconditions and cannot fail.
        unsafe { libc::getuid() }
    }

    fn shared_region_dir() -> PathBuf {
        // TMPDIR is already per-user on macOS
        std::env::temp_dir()
    }

    fn page_size() -> usize {
        // SAFETY: sysconf only reads a configuration value.
        let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        if size > 0 { size as usize } else { 16 * 1024 }
    }

    fn open_region_file(path: &Path) -> io::Result<File> {
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .mode(0o600)
            .custom_flags(libc::O_NOFOLLOW)
            .open(path)
    }

    fn region_owner(metadata: &Metadata) -> Option<u32> {
        Some(metadata.uid())
    }

    fn native_gpus() -> Option<Vec<GpuEntry>> {
        None
    }
}
