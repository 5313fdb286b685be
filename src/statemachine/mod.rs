// Melding lifecycle state machine
//
// Two guarded transition tables (melder-facing and back-office) driven by one
// engine. The tables are built once and injected; the engine never holds state
// of its own.

pub mod engine;
pub mod errors;
pub mod guards;
pub mod states;
pub mod transitions;

#[cfg(test)]
mod tests;

pub use engine::{Access, MeldingStateMachine, TransitionOutcome};
pub use errors::TransitionError;
pub use guards::{Guard, GuardContext};
pub use states::{MeldingState, MeldingTransition, Phase, UnknownState};
pub use transitions::{Transition, TransitionTable};
