use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::errors::TransitionError;
use super::guards::GuardContext;
use super::states::{MeldingState, MeldingTransition, Phase};
use super::transitions::{Transition, TransitionTable};
use crate::melding::token::TokenError;
use crate::melding::{Form, Melding};

/// Who is asking for the transition.
#[derive(Debug, Clone, Copy)]
pub enum Access<'a> {
    /// A melder presenting the token handed out at creation
    Melder { token: &'a str },
    /// An authenticated back-office user
    BackOffice,
}

impl Access<'_> {
    pub fn phase(&self) -> Phase {
        match self {
            Access::Melder { .. } => Phase::FrontOffice,
            Access::BackOffice => Phase::BackOffice,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionOutcome {
    pub transition: MeldingTransition,
    pub previous_state: MeldingState,
    pub new_state: MeldingState,
    pub token_invalidated: bool,
}

/// Guarded transition engine over the two melding machines.
///
/// Holds only the tables it was built with; all effects land on the melding passed in.
#[derive(Debug, Clone)]
pub struct MeldingStateMachine {
    front_office: TransitionTable,
    back_office: TransitionTable,
}

impl Default for MeldingStateMachine {
    fn default() -> Self {
        Self::new(TransitionTable::front_office(), TransitionTable::back_office())
    }
}

impl MeldingStateMachine {
    pub fn new(front_office: TransitionTable, back_office: TransitionTable) -> Self {
        Self {
            front_office,
            back_office,
        }
    }

    pub fn table(&self, phase: Phase) -> &TransitionTable {
        match phase {
            Phase::FrontOffice => &self.front_office,
            Phase::BackOffice => &self.back_office,
        }
    }

    /// Apply a transition by its wire name.
    pub fn apply(
        &self,
        melding: &mut Melding,
        name: &str,
        access: Access<'_>,
        form: Option<&Form>,
        now: DateTime<Utc>,
    ) -> Result<TransitionOutcome, TransitionError> {
        let transition = name.parse::<MeldingTransition>()?;
        self.apply_transition(melding, transition, access, form, now)
    }

    pub fn apply_transition(
        &self,
        melding: &mut Melding,
        name: MeldingTransition,
        access: Access<'_>,
        form: Option<&Form>,
        now: DateTime<Utc>,
    ) -> Result<TransitionOutcome, TransitionError> {
        let table = self.table(access.phase());
        let transition = table
            .get(name)
            .ok_or_else(|| TransitionError::UnknownTransition {
                name: name.to_string(),
            })?;

        if let Err(e) = self.authorize(melding, transition, access, form, now) {
            warn!(
                melding_id = %melding.id,
                transition = %name,
                state = %melding.state,
                error_kind = e.kind(),
                "Melding transition rejected"
            );
            return Err(e);
        }

        let previous_state = melding.state;
        melding.state = transition.to_state;
        melding.updated_at = now;

        let token_invalidated = table.terminal_state() == Some(transition.to_state);
        if token_invalidated {
            if let Some(token) = melding.token.as_mut() {
                token.invalidate(now);
            }
        }

        info!(
            melding_id = %melding.id,
            transition = %name,
            from_state = %previous_state,
            to_state = %melding.state,
            token_invalidated,
            "Melding state transition"
        );

        Ok(TransitionOutcome {
            transition: name,
            previous_state,
            new_state: melding.state,
            token_invalidated,
        })
    }

    fn authorize(
        &self,
        melding: &Melding,
        transition: &Transition,
        access: Access<'_>,
        form: Option<&Form>,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        // A spent token outranks the state check: after submission the melder has
        // no say over the melding at all.
        if let Access::Melder { .. } = access {
            match &melding.token {
                Some(token) if !token.is_invalidated() => {}
                _ => return Err(TransitionError::TokenInvalidated),
            }
        }

        if !transition.allows_from(melding.state) {
            return Err(TransitionError::TransitionNotAllowed {
                transition: transition.name,
                state: melding.state,
            });
        }

        if let Access::Melder { token: presented } = access {
            let token = melding.token.as_ref().ok_or(TransitionError::TokenInvalidated)?;
            token.verify(presented, now).map_err(|e| match e {
                TokenError::Expired => TransitionError::TokenExpired,
                TokenError::Invalidated | TokenError::Mismatch => TransitionError::TokenInvalidated,
            })?;
        }

        let ctx = GuardContext::new(melding, form);
        for guard in &transition.guards {
            if !guard.evaluate(&ctx) {
                debug!(melding_id = %melding.id, guard = %guard, "Guard denied transition");
                return Err(TransitionError::GuardFailed {
                    transition: transition.name,
                    guard: *guard,
                });
            }
        }

        Ok(())
    }

    /// Names of every transition, in either phase, that may start from `state`.
    pub fn possible_transitions(&self, state: MeldingState) -> Vec<MeldingTransition> {
        self.front_office
            .iter()
            .chain(self.back_office.iter())
            .filter(|transition| transition.allows_from(state))
            .map(|transition| transition.name)
            .collect()
    }
}
