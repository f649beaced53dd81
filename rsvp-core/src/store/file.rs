use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::{SnapshotRepository, StoreError};

const APP_NAME: &str = "rsvp";
const SNAPSHOT_EXT: &str = "json";

/// One `<store id>.json` file per store under a directory.
///
/// Writes go to a uniquely named temporary sibling first and are renamed into
/// place, so a crash mid-write leaves the previous snapshot intact and
/// concurrent writers never share a file. Snapshots hold credentials and are
/// readable by the owner only.
#[derive(Debug, Clone)]
pub struct FileSnapshotRepository {
    dir: PathBuf,
}

impl FileSnapshotRepository {
    /// Use `dir` for snapshots. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Snapshots under the platform data directory.
    pub fn open_default() -> Result<Self, StoreError> {
        Ok(Self::new(default_dir()?))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, store_id: &str) -> Result<PathBuf, StoreError> {
        let valid = !store_id.is_empty()
            && store_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidId(store_id.to_string()));
        }
        Ok(self.dir.join(format!("{store_id}.{SNAPSHOT_EXT}")))
    }
}

impl SnapshotRepository for FileSnapshotRepository {
    fn load(&self, store_id: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(store_id)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, store_id: &str, snapshot: &str) -> Result<(), StoreError> {
        let path = self.path_for(store_id)?;
        fs::create_dir_all(&self.dir)?;

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(snapshot.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Platform data directory for the application, e.g. `~/.local/share/rsvp`.
pub fn default_dir() -> Result<PathBuf, StoreError> {
    let dirs = directories::ProjectDirs::from("", "", APP_NAME).ok_or(StoreError::NoDataDir)?;
    Ok(dirs.data_dir().to_path_buf())
}
