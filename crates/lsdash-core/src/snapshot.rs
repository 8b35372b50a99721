// ── Snapshot store ──
//
// Single-use crash-recovery blob for the aggregated model. Written when the
// host signals memory pressure, read back at most once, and deleted on
// read. The marker is process-local: a snapshot left behind by an earlier
// process is never trusted.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::model::UserData;

pub struct SnapshotStore {
    path: PathBuf,
    marked: AtomicBool,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            marked: AtomicBool::new(false),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A snapshot was saved by this process and not yet consumed.
    pub fn is_marked(&self) -> bool {
        self.marked.load(Ordering::Acquire)
    }

    /// Serialize `data`. On failure any partial file is removed and the
    /// marker cleared before the error is returned.
    pub fn save(&self, data: &UserData) -> Result<(), CoreError> {
        match self.write(data) {
            Ok(bytes) => {
                self.marked.store(true, Ordering::Release);
                info!(path = %self.path.display(), bytes, "snapshot saved");
                Ok(())
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "snapshot save failed");
                self.clear();
                Err(e)
            }
        }
    }

    fn write(&self, data: &UserData) -> Result<usize, CoreError> {
        let json = serde_json::to_vec(data).map_err(snapshot_err)?;
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(snapshot_err)?;
        }

        let tmp = self.path.with_extension("tmp");
        let result = fs::File::create(&tmp)
            .and_then(|mut file| {
                file.write_all(&json)?;
                file.sync_all()
            })
            .and_then(|()| fs::rename(&tmp, &self.path));
        if let Err(e) = result {
            let _ = fs::remove_file(&tmp);
            return Err(snapshot_err(e));
        }
        Ok(json.len())
    }

    /// Read the snapshot back, if one is marked. The file is deleted and
    /// the marker cleared whether or not the read succeeds.
    pub fn load(&self) -> Option<UserData> {
        if !self.marked.swap(false, Ordering::AcqRel) {
            return None;
        }

        let result = fs::read(&self.path)
            .map_err(snapshot_err)
            .and_then(|bytes| serde_json::from_slice::<UserData>(&bytes).map_err(snapshot_err));
        self.remove_file();

        match result {
            Ok(data) => {
                info!(path = %self.path.display(), courses = data.courses.len(), "snapshot restored");
                Some(data)
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "snapshot unreadable, discarded");
                None
            }
        }
    }

    /// Remove any snapshot and clear the marker.
    pub fn clear(&self) {
        self.marked.store(false, Ordering::Release);
        self.remove_file();
    }

    fn remove_file(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "snapshot removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to remove snapshot"),
        }
    }
}

fn snapshot_err(err: impl std::fmt::Display) -> CoreError {
    CoreError::Snapshot {
        message: err.to_string(),
    }
}
