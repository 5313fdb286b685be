// Persistence seam for meldingen
//
// Saves are optimistic: a snapshot may only be written back if nobody else saved
// the same melding since it was read. That is what makes guard-then-mutate atomic
// per melding.

pub mod file;
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::melding::{Melding, MeldingId};
use crate::statemachine::MeldingState;

pub use file::FileMeldingRepository;
pub use memory::InMemoryMeldingRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Melding {id} not found")]
    NotFound { id: MeldingId },

    #[error("Melding {id} was modified concurrently: expected version {expected}, found {found}")]
    Conflict {
        id: MeldingId,
        expected: u64,
        found: u64,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[cfg(feature = "database")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {reason}")]
    Storage { reason: String },
}

/// Back-office listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeldingFilter {
    pub state: Option<MeldingState>,
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
}

impl MeldingFilter {
    pub fn matches(&self, melding: &Melding) -> bool {
        self.state.map_or(true, |state| melding.state == state)
    }

    /// Apply state filter and pagination to meldingen already sorted by id.
    pub fn apply<I: IntoIterator<Item = Melding>>(&self, meldingen: I) -> Vec<Melding> {
        meldingen
            .into_iter()
            .filter(|m| self.matches(m))
            .skip(self.offset)
            .take(self.limit.unwrap_or(usize::MAX))
            .collect()
    }
}

#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait MeldingRepository: Send + Sync {
    /// Store a new melding, assigning its id. The stored copy is returned.
    async fn insert(&self, melding: Melding) -> Result<Melding, RepositoryError>;

    async fn get(&self, id: MeldingId) -> Result<Melding, RepositoryError>;

    /// Write back a snapshot read earlier. Fails with `Conflict` if the stored
    /// version moved on; on success the returned copy carries the bumped version.
    async fn save(&self, melding: &Melding) -> Result<Melding, RepositoryError>;

    /// Meldingen ordered by id.
    async fn list(&self, filter: &MeldingFilter) -> Result<Vec<Melding>, RepositoryError>;
}

/// Version check shared by every backend.
pub(crate) fn check_version(stored: &Melding, snapshot: &Melding) -> Result<(), RepositoryError> {
    if stored.version != snapshot.version {
        return Err(RepositoryError::Conflict {
            id: snapshot.id,
            expected: snapshot.version,
            found: stored.version,
        });
    }
    Ok(())
}
