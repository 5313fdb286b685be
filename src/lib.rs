// Meldingen Library - melding lifecycle for municipal issue reporting
// This exposes the core components for testing and integration

pub mod actions;
pub mod cli;
pub mod config;
pub mod database;
pub mod melding;
pub mod observability;
pub mod repository;
pub mod statemachine;
pub mod telemetry;

// Re-export key types for easy access
pub use actions::{CreatedMelding, MeldingError, MeldingService, StepResult};
pub use config::{config, init_config, MeldingenConfig};
pub use database::init_database;
pub use melding::{
    AssetLimiter, Catalog, Classifier, GeoJson, Melding, MeldingId, Reclassifier, SubmissionToken,
    TokenGenerator,
};
pub use observability::{lifecycle_metrics, LifecycleMetrics, OperationTimer};
pub use repository::{
    FileMeldingRepository, InMemoryMeldingRepository, MeldingFilter, MeldingRepository,
    RepositoryError,
};
pub use statemachine::{
    Access, Guard, MeldingState, MeldingStateMachine, MeldingTransition, TransitionError,
    TransitionOutcome, TransitionTable,
};
pub use telemetry::{create_melding_span, generate_correlation_id, init_telemetry, shutdown_telemetry};
