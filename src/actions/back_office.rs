// Back-office actions: no token, the caller is assumed authenticated upstream

use super::{MeldingError, MeldingService, StepResult};
use crate::melding::{Melding, MeldingId};
use crate::repository::MeldingFilter;
use crate::statemachine::{Access, MeldingTransition};

impl MeldingService {
    pub async fn retrieve(&self, id: MeldingId) -> Result<Melding, MeldingError> {
        self.traced("retrieve", Some(id), async { Ok(self.repository.get(id).await?) })
            .await
    }

    pub async fn list(&self, filter: &MeldingFilter) -> Result<Vec<Melding>, MeldingError> {
        self.traced("list", None, async { Ok(self.repository.list(filter).await?) })
            .await
    }

    /// Transitions of either machine that the melding's current state allows.
    pub async fn possible_transitions(&self, id: MeldingId) -> Result<Vec<MeldingTransition>, MeldingError> {
        self.traced("possible_transitions", Some(id), async {
            let melding = self.repository.get(id).await?;
            Ok(self.machine.possible_transitions(melding.state))
        })
        .await
    }

    pub async fn process(&self, id: MeldingId, transition: &str) -> Result<StepResult, MeldingError> {
        self.traced("process", Some(id), async {
            let now = self.now();
            let mut melding = self.repository.get(id).await?;
            let outcome = self.transition(&mut melding, transition, Access::BackOffice, now)?;
            let melding = self.save(&melding).await?;
            Ok(StepResult { melding, outcome })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::melding::Catalog;
    use crate::repository::InMemoryMeldingRepository;
    use crate::statemachine::{MeldingState, TransitionError};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_back_office_cannot_process_unsubmitted_melding() {
        let service = MeldingService::new(
            Arc::new(InMemoryMeldingRepository::new()),
            Arc::new(Catalog::default()),
        );
        let created = service.create_melding("kapotte lantaarnpaal").await.unwrap();

        let result = service.process(created.melding.id, "PROCESS").await;
        assert!(matches!(
            result,
            Err(MeldingError::Transition(TransitionError::TransitionNotAllowed {
                state: MeldingState::New,
                ..
            }))
        ));
        assert_eq!(
            service.possible_transitions(created.melding.id).await.unwrap(),
            vec![MeldingTransition::Classify]
        );
    }

    #[tokio::test]
    async fn test_missing_melding_is_not_found() {
        let service = MeldingService::new(
            Arc::new(InMemoryMeldingRepository::new()),
            Arc::new(Catalog::default()),
        );
        let result = service.retrieve(99).await;
        assert!(matches!(result, Err(MeldingError::NotFound { entity: "melding", .. })));
        assert_eq!(result.unwrap_err().status_code(), 404);
    }
}
