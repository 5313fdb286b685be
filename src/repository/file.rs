// File system repository: one JSON document per melding
//
// Every operation holds an exclusive fd-lock on `.lock` in the store directory, so
// the version check and the write are atomic across processes too.

use async_trait::async_trait;
use fd_lock::RwLock;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{check_version, MeldingFilter, MeldingRepository, RepositoryError};
use crate::melding::{Melding, MeldingId};

const LOCK_FILE: &str = ".lock";
const SEQUENCE_FILE: &str = "sequence";

#[derive(Debug, Clone)]
pub struct FileMeldingRepository {
    directory: PathBuf,
}

impl FileMeldingRepository {
    pub fn new<P: Into<PathBuf>>(directory: P) -> Result<Self, RepositoryError> {
        let directory = directory.into();
        fs::create_dir_all(&directory)?;
        info!(directory = %directory.display(), "Using file melding repository");
        Ok(Self { directory })
    }

    fn melding_path(directory: &Path, id: MeldingId) -> PathBuf {
        directory.join(format!("{id}.melding.json"))
    }

    /// Run `op` on a blocking thread while holding the directory lock.
    async fn locked<T, F>(&self, op: F) -> Result<T, RepositoryError>
    where
        T: Send + 'static,
        F: FnOnce(&Path) -> Result<T, RepositoryError> + Send + 'static,
    {
        let directory = self.directory.clone();
        tokio::task::spawn_blocking(move || {
            let lock_file = OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(directory.join(LOCK_FILE))?;
            let mut lock = RwLock::new(lock_file);
            let _guard = lock.write()?;
            op(&directory)
        })
        .await
        .map_err(|e| RepositoryError::Storage {
            reason: format!("blocking task failed: {e}"),
        })?
    }
}

fn read_melding(path: &Path, id: MeldingId) -> Result<Melding, RepositoryError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(RepositoryError::NotFound { id })
        }
        Err(e) => return Err(e.into()),
    };
    Ok(serde_json::from_reader(file)?)
}

fn write_melding(path: &Path, melding: &Melding) -> Result<(), RepositoryError> {
    // Write to a temporary file first, then rename
    let temp = path.with_extension("json.tmp");
    fs::write(&temp, serde_json::to_vec_pretty(melding)?)?;
    fs::rename(&temp, path)?;
    Ok(())
}

fn next_id(directory: &Path) -> Result<MeldingId, RepositoryError> {
    let path = directory.join(SEQUENCE_FILE);
    let last: MeldingId = match fs::read_to_string(&path) {
        Ok(raw) => raw.trim().parse().map_err(|_| RepositoryError::Storage {
            reason: format!("corrupt sequence file {}", path.display()),
        })?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
        Err(e) => return Err(e.into()),
    };
    let next = last + 1;
    fs::write(&path, next.to_string())?;
    Ok(next)
}

#[async_trait]
impl MeldingRepository for FileMeldingRepository {
    async fn insert(&self, mut melding: Melding) -> Result<Melding, RepositoryError> {
        self.locked(move |directory| {
            melding.id = next_id(directory)?;
            melding.version = 1;
            write_melding(&Self::melding_path(directory, melding.id), &melding)?;
            debug!(melding_id = %melding.id, "Melding written");
            Ok(melding)
        })
        .await
    }

    async fn get(&self, id: MeldingId) -> Result<Melding, RepositoryError> {
        self.locked(move |directory| read_melding(&Self::melding_path(directory, id), id))
            .await
    }

    async fn save(&self, melding: &Melding) -> Result<Melding, RepositoryError> {
        let snapshot = melding.clone();
        self.locked(move |directory| {
            let path = Self::melding_path(directory, snapshot.id);
            let stored = read_melding(&path, snapshot.id)?;
            check_version(&stored, &snapshot)?;

            let mut updated = snapshot;
            updated.version += 1;
            write_melding(&path, &updated)?;
            debug!(melding_id = %updated.id, version = updated.version, "Melding saved");
            Ok(updated)
        })
        .await
    }

    async fn list(&self, filter: &MeldingFilter) -> Result<Vec<Melding>, RepositoryError> {
        let filter = filter.clone();
        self.locked(move |directory| {
            let mut meldingen = Vec::new();
            for entry in fs::read_dir(directory)? {
                let path = entry?.path();
                let is_melding = path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.ends_with(".melding.json"));
                if is_melding {
                    meldingen.push(serde_json::from_reader::<_, Melding>(File::open(&path)?)?);
                }
            }
            meldingen.sort_by_key(|m| m.id);
            Ok(filter.apply(meldingen))
        })
        .await
    }
}
