use std::fs::{File, Metadata};
use std::io;
use std::path::{Path, PathBuf};

use super::counters::GpuEntry;

/// OS-specific pieces of the sampler: who we are, where the sample region
/// lives, and whether the OS exposes GPU load without a vendor tool.
pub trait PlatformExtensions {
    fn user_id() -> u32;
    fn shared_region_dir() -> PathBuf;
    fn page_size() -> usize;
    /// Opens or creates a region file readable only by its owner. A
    /// symlink at `path` is refused, not followed.
    fn open_region_file(path: &Path) -> io::Result<File>;
    /// Owning uid of a region file, where the OS has one.
    fn region_owner(metadata: &Metadata) -> Option<u32>;
    fn native_gpus() -> Option<Vec<GpuEntry>>;
}

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "linux")]
use linux as platform_impl;
#[cfg(target_os = "macos")]
use macos as platform_impl;
#[cfg(target_os = "windows")]
use windows as platform_impl;

pub fn user_id() -> u32 {
    platform_impl::Platform::user_id()
}

pub fn shared_region_dir() -> PathBuf {
    platform_impl::Platform::shared_region_dir()
}

pub fn page_size() -> usize {
    platform_impl::Platform::page_size()
}

pub fn open_region_file(path: &Path) -> io::Result<File> {
    platform_impl::Platform::open_region_file(path)
}

pub fn region_owner(metadata: &Metadata) -> Option<u32> {
    platform_impl::Platform::region_owner(metadata)
}

pub fn native_gpus() -> Option<Vec<GpuEntry>> {
    platform_impl::Platform::native_gpus()
}
