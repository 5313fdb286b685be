use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::debug;

use super::{check_version, MeldingFilter, MeldingRepository, RepositoryError};
use crate::melding::{Melding, MeldingId};

#[derive(Debug, Default)]
struct Store {
    last_id: MeldingId,
    meldingen: BTreeMap<MeldingId, Melding>,
}

/// Process-local repository, used by tests and the default CLI configuration.
#[derive(Debug, Default)]
pub struct InMemoryMeldingRepository {
    store: RwLock<Store>,
}

impl InMemoryMeldingRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MeldingRepository for InMemoryMeldingRepository {
    async fn insert(&self, mut melding: Melding) -> Result<Melding, RepositoryError> {
        let mut store = self.store.write().await;
        store.last_id += 1;
        melding.id = store.last_id;
        melding.version = 1;
        store.meldingen.insert(melding.id, melding.clone());
        debug!(melding_id = %melding.id, "Melding inserted");
        Ok(melding)
    }

    async fn get(&self, id: MeldingId) -> Result<Melding, RepositoryError> {
        let store = self.store.read().await;
        store
            .meldingen
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::NotFound { id })
    }

    async fn save(&self, melding: &Melding) -> Result<Melding, RepositoryError> {
        // Check and write under one write lock
        let mut store = self.store.write().await;
        let stored = store
            .meldingen
            .get_mut(&melding.id)
            .ok_or(RepositoryError::NotFound { id: melding.id })?;
        check_version(stored, melding)?;

        let mut updated = melding.clone();
        updated.version += 1;
        *stored = updated.clone();
        debug!(melding_id = %updated.id, version = updated.version, "Melding saved");
        Ok(updated)
    }

    async fn list(&self, filter: &MeldingFilter) -> Result<Vec<Melding>, RepositoryError> {
        let store = self.store.read().await;
        Ok(filter.apply(store.meldingen.values().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let repository = InMemoryMeldingRepository::new();
        let first = repository.insert(Melding::test_instance()).await.unwrap();
        let second = repository.insert(Melding::test_instance()).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(repository.get(2).await.unwrap().version, 1);
    }

    #[tokio::test]
    async fn test_stale_snapshot_is_rejected() {
        let repository = InMemoryMeldingRepository::new();
        let stored = repository.insert(Melding::test_instance()).await.unwrap();

        let mut first = stored.clone();
        let mut second = stored.clone();
        first.text = "first writer".to_string();
        second.text = "second writer".to_string();

        let saved = repository.save(&first).await.unwrap();
        assert_eq!(saved.version, 2);

        let result = repository.save(&second).await;
        assert!(matches!(
            result,
            Err(RepositoryError::Conflict { expected: 1, found: 2, .. })
        ));
        assert_eq!(repository.get(stored.id).await.unwrap().text, "first writer");
    }

    #[tokio::test]
    async fn test_missing_melding() {
        let repository = InMemoryMeldingRepository::new();
        assert!(matches!(
            repository.get(42).await,
            Err(RepositoryError::NotFound { id: 42 })
        ));
    }
}
