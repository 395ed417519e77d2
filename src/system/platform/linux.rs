use std::fs::{self, File, Metadata, OpenOptions};
use std::io;
use std::os::unix::fs::{MetadataExt, OpenOptionsExt};
use std::path::{Path, PathBuf};

use super::PlatformExtensions;
use crate::system::counters::GpuEntry;

const DRM_ROOT: &str = "/sys/class/drm";
const FALLBACK_PAGE_SIZE: usize = 4096;

pub struct Platform;

impl PlatformExtensions for Platform {
    fn user_id() -> u32 {
        // SAFETY: getuid has no preconditions and cannot fail.
        unsafe { libc::getuid() }
    }

    fn shared_region_dir() -> PathBuf {
        // tmpfs backing POSIX shm_open
        let shm = Path::new("/dev/shm");
        if shm.is_dir() {
            shm.to_path_buf()
        } else {
            std::env::temp_dir()
        }
    }

    fn page_size() -> usize {
        // SAFETY: sysconf only reads a configuration value.
        let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        if size > 0 {
            size as usize
        } else {
            FALLBACK_PAGE_SIZE
        }
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
        // amdgpu exposes load and VRAM through sysfs; other drivers do not.
        let mut cards: Vec<PathBuf> = fs::read_dir(DRM_ROOT)
            .ok()?
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .and_then(|n| n.strip_prefix("card"))
                    .is_some_and(|idx| !idx.is_empty() && idx.bytes().all(|b| b.is_ascii_digit()))
            })
            .collect();
        cards.sort();

        let gpus: Vec<GpuEntry> = cards.iter().filter_map(|card| read_drm_card(card)).collect();
        if gpus.is_empty() { None } else { Some(gpus) }
    }
}

fn read_drm_card(card: &Path) -> Option<GpuEntry> {
    let device = card.join("device");
    let busy: u32 = read_number(&device.join("gpu_busy_percent"))?;

    let name = read_trimmed(&device.join("product_name"))
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| {
            let card_name = card
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            format!("amdgpu {card_name}")
        });

    const MIB: u64 = 1024 * 1024;
    let mem_total = read_number::<u64>(&device.join("mem_info_vram_total")).map(|b| b / MIB);
    let mem_used = read_number::<u64>(&device.join("mem_info_vram_used")).map(|b| b / MIB);
    let mem_free = match (mem_total, mem_used) {
        (Some(total), Some(used)) => Some(total.saturating_sub(used)),
        _ => None,
    };

    let hwmon = first_hwmon(&device);
    let temperature = hwmon
        .as_ref()
        .and_then(|h| read_number::<u32>(&h.join("temp1_input")))
        .map(|millidegrees| millidegrees / 1000);
    let power_draw = hwmon
        .as_ref()
        .and_then(|h| {
            read_number::<u64>(&h.join("power1_average"))
                .or_else(|| read_number::<u64>(&h.join("power1_input")))
        })
        .map(|microwatts| microwatts as f64 / 1_000_000.0);

    Some(GpuEntry {
        name,
        sm_utilization: Some(busy),
        mem_bandwidth_utilization: read_number(&device.join("mem_busy_percent")),
        mem_total,
        mem_used,
        mem_free,
        graphics_clock: read_trimmed(&device.join("pp_dpm_sclk"))
            .and_then(|s| active_dpm_clock(&s)),
        mem_clock: read_trimmed(&device.join("pp_dpm_mclk")).and_then(|s| active_dpm_clock(&s)),
        video_clock: None,
        power_draw,
        temperature,
    })
}

fn first_hwmon(device: &Path) -> Option<PathBuf> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(device.join("hwmon"))
        .ok()?
        .flatten()
        .map(|entry| entry.path())
        .collect();
    dirs.sort();
    dirs.into_iter().next()
}

fn read_trimmed(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok().map(|s| s.trim().to_string())
}

fn read_number<T: std::str::FromStr>(path: &Path) -> Option<T> {
    read_trimmed(path)?.parse().ok()
}

/// Picks the active level from a `pp_dpm_*` table such as
/// `0: 500Mhz\n1: 1800Mhz *`.
fn active_dpm_clock(table: &str) -> Option<u32> {
    table
        .lines()
        .find(|line| line.trim_end().ends_with('*'))
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|level| {
            let digits = level.trim_end_matches(|c: char| c.is_ascii_alphabetic());
            digits.parse().ok()
        })
}
