use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::models::SeenSet;
use crate::utils::error::{AppError, Result};

/// Durable home of the [`SeenSet`]: a single JSON array of links.
///
/// Every new notification rewrites the whole file. Listing volume is low, so
/// paying O(n) per listing keeps a crash from ever costing more than the one
/// notification that was in flight.
#[derive(Debug, Clone)]
pub struct DedupStore {
    path: PathBuf,
}

impl DedupStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored set. Never fails: a missing, unreadable or malformed
    /// file yields an empty set.
    pub fn load(&self) -> SeenSet {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "No state file found, starting with an empty set");
                return SeenSet::new();
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Could not read state file, starting with an empty set");
                return SeenSet::new();
            }
        };

        match serde_json::from_str::<SeenSet>(&data) {
            Ok(seen) => {
                tracing::info!(path = %self.path.display(), entries = seen.len(), "Loaded notified listings");
                seen
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "State file is empty or corrupted, starting with an empty set");
                SeenSet::new()
            }
        }
    }

    /// Overwrite the file with the full set.
    pub fn save(&self, seen: &SeenSet) -> Result<()> {
        self.write_links(seen.sorted())
    }

    /// Persist `seen ∪ {link}` and only then add `link` to `seen`, so the
    /// in-memory set never runs ahead of what is on disk.
    ///
    /// Returns `Ok(false)` without writing when the link is already known.
    pub fn commit(&self, seen: &mut SeenSet, link: &str) -> Result<bool> {
        if seen.contains(link) {
            return Ok(false);
        }

        let mut links = seen.sorted();
        let at = links.binary_search(&link).unwrap_or_else(|i| i);
        links.insert(at, link);
        self.write_links(links)?;

        seen.insert(link);
        Ok(true)
    }

    fn write_links(&self, links: Vec<&str>) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let storage_err = |source: io::Error| AppError::Storage {
            path: self.path.clone(),
            source,
        };

        fs::create_dir_all(dir).map_err(storage_err)?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(storage_err)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer(&mut writer, &links)?;
            writer.flush().map_err(storage_err)?;
        }
        tmp.as_file().sync_all().map_err(storage_err)?;
        tmp.persist(&self.path).map_err(|e| storage_err(e.error))?;

        tracing::debug!(path = %self.path.display(), entries = links.len(), "Saved notified listings");
        Ok(())
    }
}
