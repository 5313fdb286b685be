// Service layer: melder and back-office actions on meldingen
//
// Every mutation loads the melding, changes a working copy and saves it back with
// the version it was read at. Anything that fails before the save leaves the stored
// melding untouched; a concurrent writer surfaces as `MeldingError::Conflict`.

pub mod back_office;
pub mod front_office;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tracing::{warn, Instrument};

use crate::melding::{
    AssetError, Catalog, CatalogError, Melding, MeldingId, PublicIdGenerator, TokenError,
    TokenGenerator, ValidationError,
};
use crate::observability::{lifecycle_metrics, OperationTimer};
use crate::repository::{MeldingRepository, RepositoryError};
use crate::statemachine::{Access, MeldingStateMachine, TransitionError, TransitionOutcome};
use crate::telemetry::{create_melding_span, generate_correlation_id};

#[derive(Debug, Error)]
pub enum MeldingError {
    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("The maximum number of assets ({max_assets}) has been reached")]
    MaxAssetsExceeded { max_assets: usize },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Melding {id} was changed by someone else, reload and try again")]
    Conflict { id: MeldingId },

    #[error("Repository error: {0}")]
    Repository(RepositoryError),

    #[error("Catalog error: {0}")]
    Catalog(CatalogError),
}

impl MeldingError {
    /// Suggested HTTP status for the web layer.
    pub fn status_code(&self) -> u16 {
        match self {
            MeldingError::Transition(e) => match e {
                TransitionError::UnknownTransition { .. } => 404,
                TransitionError::TransitionNotAllowed { .. } | TransitionError::GuardFailed { .. } => 400,
                TransitionError::TokenInvalidated | TransitionError::TokenExpired => 401,
            },
            MeldingError::MaxAssetsExceeded { .. } => 400,
            MeldingError::NotFound { .. } => 404,
            MeldingError::Validation(_) => 422,
            MeldingError::Conflict { .. } => 409,
            MeldingError::Catalog(CatalogError::Unclassified { .. }) => 400,
            MeldingError::Repository(_) | MeldingError::Catalog(_) => 500,
        }
    }

    /// Message fit for the melder.
    pub fn user_hint(&self) -> String {
        match self {
            MeldingError::Transition(TransitionError::GuardFailed { guard, .. }) => {
                guard.user_hint().to_string()
            }
            MeldingError::Transition(TransitionError::TokenInvalidated) => {
                "this melding can no longer be changed".to_string()
            }
            MeldingError::Transition(TransitionError::TokenExpired) => {
                "the time to complete this melding has passed".to_string()
            }
            MeldingError::Repository(_) | MeldingError::Catalog(_) => {
                "something went wrong, please try again later".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<RepositoryError> for MeldingError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound { id } => MeldingError::NotFound {
                entity: "melding",
                id: id.to_string(),
            },
            RepositoryError::Conflict { id, .. } => MeldingError::Conflict { id },
            other => MeldingError::Repository(other),
        }
    }
}

impl From<AssetError> for MeldingError {
    fn from(error: AssetError) -> Self {
        match error {
            AssetError::MaxAssetsExceeded { max_assets } => MeldingError::MaxAssetsExceeded { max_assets },
            AssetError::NotFound { external_id } => MeldingError::NotFound {
                entity: "asset",
                id: external_id,
            },
        }
    }
}

impl From<CatalogError> for MeldingError {
    fn from(error: CatalogError) -> Self {
        match error {
            CatalogError::NotFound { entity, id } => MeldingError::NotFound {
                entity,
                id: id.to_string(),
            },
            other => MeldingError::Catalog(other),
        }
    }
}

impl From<TokenError> for MeldingError {
    fn from(error: TokenError) -> Self {
        match error {
            TokenError::Expired => TransitionError::TokenExpired.into(),
            TokenError::Mismatch | TokenError::Invalidated => TransitionError::TokenInvalidated.into(),
        }
    }
}

/// A melding handed back to a melder right after creation, with the only copy of
/// the plaintext token they will ever see.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedMelding {
    pub melding: Melding,
    pub token: String,
}

/// Saved melding after a transition, plus what the transition did.
#[derive(Debug, Clone, Serialize)]
pub struct StepResult {
    pub melding: Melding,
    pub outcome: TransitionOutcome,
}

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub struct MeldingService {
    repository: Arc<dyn MeldingRepository>,
    catalog: Arc<Catalog>,
    machine: MeldingStateMachine,
    tokens: TokenGenerator,
    public_ids: PublicIdGenerator,
    clock: Clock,
}

impl MeldingService {
    pub fn new(repository: Arc<dyn MeldingRepository>, catalog: Arc<Catalog>) -> Self {
        Self {
            repository,
            catalog,
            machine: MeldingStateMachine::default(),
            tokens: TokenGenerator::default(),
            public_ids: PublicIdGenerator::default(),
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_state_machine(mut self, machine: MeldingStateMachine) -> Self {
        self.machine = machine;
        self
    }

    pub fn with_token_generator(mut self, tokens: TokenGenerator) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn with_public_id_generator(mut self, public_ids: PublicIdGenerator) -> Self {
        self.public_ids = public_ids;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn state_machine(&self) -> &MeldingStateMachine {
        &self.machine
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Run one action inside its own span, timing it and counting failures.
    async fn traced<T, F>(&self, operation: &str, melding_id: Option<MeldingId>, action: F) -> Result<T, MeldingError>
    where
        F: Future<Output = Result<T, MeldingError>>,
    {
        let correlation_id = generate_correlation_id();
        let span = create_melding_span(operation, melding_id, &correlation_id);
        let timer = OperationTimer::new(operation);

        let result = action.instrument(span).await;
        timer.finish();

        if let Err(error) = &result {
            let metrics = lifecycle_metrics();
            match error {
                MeldingError::Transition(e) => metrics.record_rejection(e),
                MeldingError::MaxAssetsExceeded { .. } => metrics.record_asset_rejected(),
                MeldingError::Conflict { .. } => metrics.record_conflict(),
                _ => {}
            }
            warn!(
                operation,
                correlation_id = %correlation_id,
                status = error.status_code(),
                error = %error,
                "Melding action failed"
            );
        }
        result
    }

    async fn save(&self, melding: &Melding) -> Result<Melding, MeldingError> {
        Ok(self.repository.save(melding).await?)
    }

    /// Apply a transition by name, resolving the form its guards need from the catalog.
    fn transition(
        &self,
        melding: &mut Melding,
        name: &str,
        access: Access<'_>,
        now: DateTime<Utc>,
    ) -> Result<TransitionOutcome, MeldingError> {
        let form = self.catalog.form_for_melding(melding);
        let outcome = self.machine.apply(melding, name, access, form, now)?;
        lifecycle_metrics().record_transition();
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statemachine::{Guard, MeldingTransition};

    #[test]
    fn test_status_codes() {
        let guard_failed: MeldingError = TransitionError::GuardFailed {
            transition: MeldingTransition::SubmitLocation,
            guard: Guard::HasLocation,
        }
        .into();
        assert_eq!(guard_failed.status_code(), 400);
        assert_eq!(guard_failed.user_hint(), "submit your location first");

        let invalidated: MeldingError = TokenError::Mismatch.into();
        assert_eq!(invalidated.status_code(), 401);

        let missing: MeldingError = RepositoryError::NotFound { id: 3 }.into();
        assert_eq!(missing.status_code(), 404);

        let conflict: MeldingError = RepositoryError::Conflict {
            id: 3,
            expected: 1,
            found: 2,
        }
        .into();
        assert_eq!(conflict.status_code(), 409);

        let too_many: MeldingError = AssetError::MaxAssetsExceeded { max_assets: 2 }.into();
        assert_eq!(too_many.status_code(), 400);
        assert!(too_many.user_hint().contains("maximum number of assets"));

        let invalid: MeldingError = ValidationError::EmptyText.into();
        assert_eq!(invalid.status_code(), 422);
    }
}
