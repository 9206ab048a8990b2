//! Bounded-memory distinct-value tracking with on-disk overflow.
//!
//! Each category accumulates values in an in-memory set. When that set reaches
//! the configured limit it is written to a new immutable chunk file and
//! cleared, so peak memory is bounded by `limit` strings per category while
//! [`SpillStore::read_all`] still yields the exact distinct set by unioning
//! memory with every chunk.
//!
//! The backing directory lives for exactly one run. Cleanup happens through
//! [`SpillStore::cleanup`] or, failing that, on drop.

use std::{
    collections::{HashMap, HashSet},
    fs::{self, File},
    io::{self, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
    thread,
    time::Duration,
};

use anyhow::{Context, Result};
use log::{debug, warn};
use tempfile::TempDir;

use crate::category::Category;

pub const DEFAULT_SPILL_LIMIT: usize = 100_000;
const CLEANUP_ATTEMPTS: u32 = 3;
const CLEANUP_INITIAL_DELAY: Duration = Duration::from_millis(500);

/// Folder-wide distinct-value sink fed by the driver while sheets are scanned.
pub trait ValueStore {
    fn record(&mut self, category: &Category, values: Vec<String>) -> Result<()>;
    fn distinct_values(&self, category: &Category) -> Result<HashSet<String>>;
}

pub struct SpillStore {
    dir: Option<TempDir>,
    limit: usize,
    sets: HashMap<Category, HashSet<String>>,
    chunks: HashMap<Category, Vec<PathBuf>>,
    next_chunk: usize,
}

impl SpillStore {
    /// Creates the run's spill directory under `parent` (system temp if `None`).
    pub fn create(parent: Option<&Path>, limit: usize) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(".cell-census-spill-");
        let dir = match parent {
            Some(parent) => builder
                .tempdir_in(parent)
                .with_context(|| format!("Creating spill directory under {parent:?}"))?,
            None => builder.tempdir().context("Creating spill directory")?,
        };
        debug!("Spill directory {:?} (limit {limit})", dir.path());
        Ok(Self {
            dir: Some(dir),
            limit: limit.max(1),
            sets: HashMap::new(),
            chunks: HashMap::new(),
            next_chunk: 0,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.dir.as_ref().map(TempDir::path)
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Records `value` for `category`, spilling the in-memory set once it is full.
    pub fn add(&mut self, category: &Category, value: &str) -> Result<()> {
        let set = self.sets.entry(category.clone()).or_default();
        if set.contains(value) {
            return Ok(());
        }
        set.insert(value.to_string());
        if set.len() >= self.limit {
            self.flush(category)?;
        }
        Ok(())
    }

    pub fn extend<I, S>(&mut self, category: &Category, values: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for value in values {
            self.add(category, value.as_ref())?;
        }
        Ok(())
    }

    fn flush(&mut self, category: &Category) -> Result<()> {
        let Some(set) = self.sets.get_mut(category) else {
            return Ok(());
        };
        if set.is_empty() {
            return Ok(());
        }
        let dir = self
            .dir
            .as_ref()
            .context("Spill directory has already been cleaned up")?;
        let path = dir.path().join(format!("chunk_{:06}.bin", self.next_chunk));
        let file = File::create(&path).with_context(|| format!("Creating spill chunk {path:?}"))?;
        let mut writer = BufWriter::new(file);
        bincode::serde::encode_into_std_write(&*set, &mut writer, bincode::config::standard())
            .with_context(|| format!("Writing spill chunk {path:?}"))?;
        writer
            .flush()
            .with_context(|| format!("Flushing spill chunk {path:?}"))?;
        debug!(
            "Spilled {} value(s) for '{}' to {:?}",
            set.len(),
            category,
            path
        );
        set.clear();
        self.next_chunk += 1;
        self.chunks.entry(category.clone()).or_default().push(path);
        Ok(())
    }

    /// Union of the in-memory set and every chunk written for `category`.
    pub fn read_all(&self, category: &Category) -> Result<HashSet<String>> {
        let mut values = self.sets.get(category).cloned().unwrap_or_default();
        for path in self.chunks.get(category).into_iter().flatten() {
            let file =
                File::open(path).with_context(|| format!("Opening spill chunk {path:?}"))?;
            let chunk: Vec<String> = bincode::serde::decode_from_std_read(
                &mut BufReader::new(file),
                bincode::config::standard(),
            )
            .with_context(|| format!("Reading spill chunk {path:?}"))?;
            debug!("Loaded {} value(s) from {:?}", chunk.len(), path);
            values.extend(chunk);
        }
        Ok(values)
    }

    pub fn chunk_count(&self, category: &Category) -> usize {
        self.chunks.get(category).map_or(0, Vec::len)
    }

    pub fn in_memory_len(&self, category: &Category) -> usize {
        self.sets.get(category).map_or(0, HashSet::len)
    }

    /// Removes the spill directory. Failures are logged and reported through
    /// the return value; they never abort the caller.
    pub fn cleanup(&mut self) -> bool {
        self.sets.clear();
        self.chunks.clear();
        let Some(dir) = self.dir.take() else {
            return true;
        };
        let path = dir.path().to_path_buf();
        let outcome = remove_with_retry(
            &path,
            CLEANUP_ATTEMPTS,
            CLEANUP_INITIAL_DELAY,
            remove_dir_forcefully,
        );
        // A successful removal leaves nothing for TempDir's own drop to do;
        // after a failure its silent retry is the last attempt.
        drop(dir);
        match outcome {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    "Could not delete spill directory {path:?}: {err}. Please remove it manually."
                );
                false
            }
        }
    }
}

impl ValueStore for SpillStore {
    fn record(&mut self, category: &Category, values: Vec<String>) -> Result<()> {
        self.extend(category, values)
    }

    fn distinct_values(&self, category: &Category) -> Result<HashSet<String>> {
        self.read_all(category)
    }
}

impl Drop for SpillStore {
    fn drop(&mut self) {
        self.cleanup();
    }
}

fn remove_dir_forcefully(path: &Path) -> io::Result<()> {
    if !path.exists() {
        return Ok(());
    }
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::PermissionDenied => {
            clear_readonly(path);
            fs::remove_dir_all(path)
        }
        Err(err) => Err(err),
    }
}

fn clear_readonly(path: &Path) {
    for entry in walkdir::WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
        if let Ok(metadata) = entry.metadata() {
            let mut permissions = metadata.permissions();
            if permissions.readonly() {
                #[allow(clippy::permissions_set_readonly_false)]
                permissions.set_readonly(false);
                let _ = fs::set_permissions(entry.path(), permissions);
            }
        }
    }
}

/// Retries `remove` with exponential backoff, returning the last error.
pub(crate) fn remove_with_retry<F>(
    path: &Path,
    attempts: u32,
    initial_delay: Duration,
    mut remove: F,
) -> io::Result<()>
where
    F: FnMut(&Path) -> io::Result<()>,
{
    let mut delay = initial_delay;
    let mut attempt = 1;
    loop {
        match remove(path) {
            Ok(()) => return Ok(()),
            Err(err) if attempt >= attempts => return Err(err),
            Err(err) => {
                warn!(
                    "Attempt {attempt}/{attempts} to delete {path:?} failed: {err}; retrying in {delay:?}"
                );
                thread::sleep(delay);
                delay *= 2;
                attempt += 1;
            }
        }
    }
}
