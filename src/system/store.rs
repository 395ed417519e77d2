//! Persistence of the previous CPU sample between process invocations.
//!
//! The region is a file in the platform's shared memory directory, named
//! after the user id and mapped with `memmap2`. Its layout is the encoded
//! [`CpuCounterRecord`] immediately followed by a one-byte initialized flag:
//!
//! ```text
//! u32 LE core count
//! per core: [u8; 16] NUL-padded id, 8 x u64 LE counters
//! u8 flag (0 = uninitialized, 1 = initialized)
//! ```
//!
//! The mapping length is rounded up to whole pages. No lock is taken: every
//! write is a single bulk copy of a whole record, and a stale record is always
//! a safe previous sample for the utilization engine.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use memmap2::MmapMut;

use super::counters::{CORE_ID_MAX_LEN, CoreCounters, CpuCounterRecord};
use super::platform;
use crate::error::{MonitorError, Result};

const COUNT_LEN: usize = 4;
const COUNTERS_PER_CORE: usize = 8;
const ENTRY_LEN: usize = CORE_ID_MAX_LEN + COUNTERS_PER_CORE * 8;
const FLAG_UNINITIALIZED: u8 = 0;
const FLAG_INITIALIZED: u8 = 1;

/// A cell holding the most recent CPU counter record.
pub trait SampleStore {
    /// Returns `None` until a record has been stored.
    fn load(&mut self) -> Result<Option<CpuCounterRecord>>;
    /// Overwrites the whole record.
    fn store(&mut self, record: &CpuCounterRecord) -> Result<()>;
}

impl<S: SampleStore + ?Sized> SampleStore for Box<S> {
    fn load(&mut self) -> Result<Option<CpuCounterRecord>> {
        (**self).load()
    }

    fn store(&mut self, record: &CpuCounterRecord) -> Result<()> {
        (**self).store(record)
    }
}

/// The previous sample handed to the utilization engine.
#[derive(Debug, Clone)]
pub struct Previous {
    pub record: CpuCounterRecord,
    /// The store was empty and `record` is a fresh read.
    pub seeded: bool,
}

/// Loads the stored record, or seeds an empty store with `seed` and returns
/// that reading.
pub fn load_or_init_previous<S, F>(store: &mut S, seed: F) -> Result<Previous>
where
    S: SampleStore + ?Sized,
    F: FnOnce() -> Result<CpuCounterRecord>,
{
    if let Some(record) = store.load()? {
        return Ok(Previous {
            record,
            seeded: false,
        });
    }

    let record = seed()?;
    store.store(&record)?;
    tracing::info!(cores = record.core_count(), "seeded empty sample store");
    Ok(Previous {
        record,
        seeded: true,
    })
}

/// In-process store for single-run sampling and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    record: Option<CpuCounterRecord>,
}

impl SampleStore for MemoryStore {
    fn load(&mut self) -> Result<Option<CpuCounterRecord>> {
        Ok(self.record.clone())
    }

    fn store(&mut self, record: &CpuCounterRecord) -> Result<()> {
        self.record = Some(record.clone());
        Ok(())
    }
}

/// Shared memory region keyed by user id.
pub struct SharedRegionStore {
    path: PathBuf,
    file: File,
    map: Option<MmapMut>,
    page_size: usize,
}

impl SharedRegionStore {
    pub fn region_path(dir: &Path, prefix: &str, user_id: u32) -> PathBuf {
        dir.join(format!("{prefix}_{user_id}"))
    }

    /// Attaches to the user's region, creating an empty one if needed.
    pub fn open_for_user(user_id: u32, dir: &Path, prefix: &str) -> Result<Self> {
        Self::open(Self::region_path(dir, prefix, user_id))
    }

    pub fn open(path: PathBuf) -> Result<Self> {
        Self::open_owned_by(path, platform::user_id())
    }

    /// Opens a region that must be a regular file owned by `owner`.
    fn open_owned_by(path: PathBuf, owner: u32) -> Result<Self> {
        let file = platform::open_region_file(&path).map_err(|e| store_error(&path, e))?;
        let metadata = file.metadata().map_err(|e| store_error(&path, e))?;
        if !metadata.is_file() {
            return Err(store_error(
                &path,
                io::Error::new(io::ErrorKind::InvalidInput, "region is not a regular file"),
            ));
        }
        if let Some(uid) = platform::region_owner(&metadata)
            && uid != owner
        {
            return Err(store_error(
                &path,
                io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    format!("region is owned by uid {uid}, expected {owner}"),
                ),
            ));
        }
        let len = metadata.len();
        let map = if len == 0 {
            None
        } else {
            Some(map_region(&file, &path)?)
        };
        tracing::debug!(path = %path.display(), len, "attached sample region");

        Ok(Self {
            path,
            file,
            map,
            page_size: platform::page_size(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current mapped length in bytes.
    pub fn region_len(&self) -> usize {
        self.map.as_ref().map_or(0, |m| m.len())
    }

    /// Removes the user's region. Returns whether one existed.
    pub fn clear(user_id: u32, dir: &Path, prefix: &str) -> Result<bool> {
        Self::remove(&Self::region_path(dir, prefix, user_id))
    }

    pub fn remove(path: &Path) -> Result<bool> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(store_error(path, e)),
        }
    }

    fn ensure_len(&mut self, needed: usize) -> Result<()> {
        if self.region_len() >= needed {
            return Ok(());
        }
        let len = needed.div_ceil(self.page_size) * self.page_size;
        // unmap before resizing
        self.map = None;
        self.file
            .set_len(len as u64)
            .map_err(|e| store_error(&self.path, e))?;
        self.map = Some(map_region(&self.file, &self.path)?);
        tracing::debug!(path = %self.path.display(), len, "resized sample region");
        Ok(())
    }
}

impl SampleStore for SharedRegionStore {
    fn load(&mut self) -> Result<Option<CpuCounterRecord>> {
        let Some(map) = self.map.as_ref() else {
            return Ok(None);
        };
        match decode_region(map) {
            Ok(record) => Ok(record),
            Err(reason) => {
                tracing::warn!(
                    path = %self.path.display(),
                    %reason,
                    "discarding unreadable sample region"
                );
                Ok(None)
            }
        }
    }

    fn store(&mut self, record: &CpuCounterRecord) -> Result<()> {
        let encoded = encode_region(record)?;
        self.ensure_len(encoded.len())?;
        if let Some(map) = self.map.as_mut() {
            map[..encoded.len()].copy_from_slice(&encoded);
            map.flush().map_err(|e| store_error(&self.path, e))?;
        }
        Ok(())
    }
}

fn map_region(file: &File, path: &Path) -> Result<MmapMut> {
    // SAFETY: the file is private to this user and only ever grown, so the
    // mapped range stays backed for the lifetime of the mapping.
    unsafe { MmapMut::map_mut(file) }.map_err(|e| store_error(path, e))
}

fn store_error(path: &Path, source: io::Error) -> MonitorError {
    MonitorError::Store {
        path: path.to_path_buf(),
        source,
    }
}

fn record_len(core_count: usize) -> Option<usize> {
    core_count.checked_mul(ENTRY_LEN)?.checked_add(COUNT_LEN)
}

/// Encodes `record` followed by the initialized flag.
pub fn encode_region(record: &CpuCounterRecord) -> Result<Vec<u8>> {
    let count = u32::try_from(record.core_count())
        .map_err(|_| MonitorError::malformed("sample record", "too many cores to persist"))?;
    let len = record_len(record.core_count())
        .ok_or_else(|| MonitorError::malformed("sample record", "too many cores to persist"))?;

    let mut out = Vec::with_capacity(len + 1);
    out.extend_from_slice(&count.to_le_bytes());
    for core in &record.cores {
        let id = core.id.as_bytes();
        if id.len() > CORE_ID_MAX_LEN {
            return Err(MonitorError::malformed(
                "sample record",
                format!("core id `{}` longer than {CORE_ID_MAX_LEN} bytes", core.id),
            ));
        }
        let mut id_field = [0u8; CORE_ID_MAX_LEN];
        id_field[..id.len()].copy_from_slice(id);
        out.extend_from_slice(&id_field);

        for value in [
            core.user,
            core.system,
            core.idle,
            core.iowait,
            core.irq,
            core.softirq,
            core.steal,
            core.guest,
        ] {
            out.extend_from_slice(&value.to_le_bytes());
        }
    }
    out.push(FLAG_INITIALIZED);
    Ok(out)
}

/// `Ok(None)` for an uninitialized region, `Err` with a reason for contents
/// that cannot be a stored record.
pub fn decode_region(bytes: &[u8]) -> std::result::Result<Option<CpuCounterRecord>, String> {
    let Some(count_bytes) = bytes.get(..COUNT_LEN) else {
        return Ok(None);
    };
    let mut count_buf = [0u8; COUNT_LEN];
    count_buf.copy_from_slice(count_bytes);
    let count = u32::from_le_bytes(count_buf) as usize;

    let len = record_len(count)
        .filter(|len| *len < bytes.len())
        .ok_or_else(|| format!("core count {count} does not fit in {} bytes", bytes.len()))?;

    match bytes[len] {
        FLAG_UNINITIALIZED => return Ok(None),
        FLAG_INITIALIZED => {}
        other => return Err(format!("unexpected flag byte {other}")),
    }
    if count == 0 {
        return Err("initialized region holds no cores".to_string());
    }

    let cores = bytes[COUNT_LEN..len]
        .chunks_exact(ENTRY_LEN)
        .map(decode_core)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(Some(CpuCounterRecord::new(cores)))
}

fn decode_core(entry: &[u8]) -> std::result::Result<CoreCounters, String> {
    let (id_field, counters) = entry.split_at(CORE_ID_MAX_LEN);
    let id_len = id_field
        .iter()
        .position(|&b| b == 0)
        .unwrap_or(CORE_ID_MAX_LEN);
    let id = std::str::from_utf8(&id_field[..id_len])
        .map_err(|_| "core id is not UTF-8".to_string())?;
    if id.is_empty() {
        return Err("empty core id".to_string());
    }

    let mut values = [0u64; COUNTERS_PER_CORE];
    for (slot, chunk) in values.iter_mut().zip(counters.chunks_exact(8)) {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(chunk);
        *slot = u64::from_le_bytes(buf);
    }
    let [user, system, idle, iowait, irq, softirq, steal, guest] = values;

    Ok(CoreCounters {
        id: id.to_string(),
        user,
        system,
        idle,
        iowait,
        irq,
        softirq,
        steal,
        guest,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(cores: usize, base: u64) -> CpuCounterRecord {
        CpuCounterRecord::new(
            (0..cores)
                .map(|i| CoreCounters {
                    id: format!("cpu{i}"),
                    user: base + i as u64,
                    system: base * 2,
                    idle: base * 10,
                    iowait: 3,
                    irq: 0,
                    softirq: 7,
                    steal: 0,
                    guest: 1,
                })
                .collect(),
        )
    }

    fn region_dir(test: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "coremon_store_{}_{test}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn flag_follows_the_record() {
        let record = sample(3, 100);
        let bytes = encode_region(&record).unwrap();
        assert_eq!(bytes.len(), COUNT_LEN + 3 * ENTRY_LEN + 1);
        assert_eq!(bytes[COUNT_LEN + 3 * ENTRY_LEN], FLAG_INITIALIZED);
        assert_eq!(decode_region(&bytes).unwrap(), Some(record));
    }

    #[test]
    fn zeroed_region_is_uninitialized() {
        assert_eq!(decode_region(&[0u8; 4096]).unwrap(), None);
        assert_eq!(decode_region(&[]).unwrap(), None);
    }

    #[test]
    fn oversized_core_count_is_rejected() {
        let mut bytes = vec![0u8; 64];
        bytes[..4].copy_from_slice(&1000u32.to_le_bytes());
        assert!(decode_region(&bytes).is_err());
    }

    #[test]
    fn unknown_flag_is_rejected() {
        let mut bytes = encode_region(&sample(1, 5)).unwrap();
        let last = bytes.len() - 1;
        bytes[last] = 7;
        assert!(decode_region(&bytes).is_err());
    }

    #[test]
    fn long_core_id_cannot_be_encoded() {
        let mut record = sample(1, 1);
        record.cores[0].id = "cpu12345678901234567".to_string();
        assert!(encode_region(&record).is_err());
    }

    #[test]
    fn memory_store_seeds_once() {
        let mut store = MemoryStore::default();
        let mut reads = 0;

        let first = load_or_init_previous(&mut store, || {
            reads += 1;
            Ok(sample(2, 10))
        })
        .unwrap();
        assert!(first.seeded);

        let second = load_or_init_previous(&mut store, || {
            reads += 1;
            Ok(sample(2, 20))
        })
        .unwrap();
        assert!(!second.seeded);
        assert_eq!(second.record, sample(2, 10));
        assert_eq!(reads, 1);
    }

    #[test]
    fn shared_region_survives_reopen() {
        let dir = region_dir("reopen");
        let path = SharedRegionStore::region_path(&dir, "coremon_test", 4242);
        let _ = SharedRegionStore::remove(&path);

        let mut store = SharedRegionStore::open(path.clone()).unwrap();
        assert_eq!(store.load().unwrap(), None);
        store.store(&sample(4, 1_000)).unwrap();
        drop(store);

        let mut reopened = SharedRegionStore::open(path.clone()).unwrap();
        assert_eq!(reopened.load().unwrap(), Some(sample(4, 1_000)));

        reopened.store(&sample(4, 2_000)).unwrap();
        assert_eq!(reopened.load().unwrap(), Some(sample(4, 2_000)));

        assert!(SharedRegionStore::remove(&path).unwrap());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn region_length_is_page_aligned() {
        let dir = region_dir("pages");
        let path = SharedRegionStore::region_path(&dir, "coremon_test", 7);
        let _ = SharedRegionStore::remove(&path);

        let mut store = SharedRegionStore::open(path.clone()).unwrap();
        store.store(&sample(200, 3)).unwrap();
        let page = platform::page_size();
        assert!(store.region_len() >= COUNT_LEN + 200 * ENTRY_LEN + 1);
        assert_eq!(store.region_len() % page, 0);

        let _ = SharedRegionStore::remove(&path);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = region_dir("clear");
        let mut store = SharedRegionStore::open_for_user(99, &dir, "coremon_test").unwrap();
        store.store(&sample(1, 1)).unwrap();
        drop(store);

        assert!(SharedRegionStore::clear(99, &dir, "coremon_test").unwrap());
        assert!(!SharedRegionStore::clear(99, &dir, "coremon_test").unwrap());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn corrupt_region_reads_as_empty() {
        let dir = region_dir("corrupt");
        let path = SharedRegionStore::region_path(&dir, "coremon_test", 1);
        std::fs::write(&path, [0xffu8; 128]).unwrap();

        let mut store = SharedRegionStore::open(path.clone()).unwrap();
        assert_eq!(store.load().unwrap(), None);

        let _ = SharedRegionStore::remove(&path);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn region_owned_by_another_user_is_refused() {
        let dir = region_dir("foreign");
        let path = SharedRegionStore::region_path(&dir, "coremon_test", 5);
        let mut store = SharedRegionStore::open(path.clone()).unwrap();
        store.store(&sample(2, 10)).unwrap();
        drop(store);

        let other = platform::user_id().wrapping_add(1);
        let err = SharedRegionStore::open_owned_by(path.clone(), other)
            .err()
            .unwrap();
        assert!(matches!(err, MonitorError::Store { .. }));

        let _ = SharedRegionStore::remove(&path);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn directory_at_region_path_is_refused() {
        let dir = region_dir("notfile");
        let path = SharedRegionStore::region_path(&dir, "coremon_test", 6);
        std::fs::create_dir_all(&path).unwrap();

        let err = SharedRegionStore::open(path.clone()).err().unwrap();
        assert!(matches!(err, MonitorError::Store { .. }));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_region_is_not_followed() {
        let dir = region_dir("symlink");
        let victim = dir.join("victim.txt");
        std::fs::write(&victim, "keep me\n").unwrap();
        let path = SharedRegionStore::region_path(&dir, "coremon_test", 8);
        let _ = std::fs::remove_file(&path);
        std::os::unix::fs::symlink(&victim, &path).unwrap();

        let err = SharedRegionStore::open(path.clone()).err().unwrap();
        assert!(matches!(err, MonitorError::Store { .. }));
        assert_eq!(std::fs::read_to_string(&victim).unwrap(), "keep me\n");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
