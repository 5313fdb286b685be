// Transition tables for the front-office and back-office machines

use serde::Serialize;
use std::collections::HashMap;

use super::guards::Guard;
use super::states::{MeldingState, MeldingTransition, Phase};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub name: MeldingTransition,
    pub from_states: Vec<MeldingState>,
    pub to_state: MeldingState,
    pub guards: Vec<Guard>,
}

impl Transition {
    pub fn new(name: MeldingTransition, from_states: &[MeldingState], to_state: MeldingState) -> Self {
        Self {
            name,
            from_states: from_states.to_vec(),
            to_state,
            guards: Vec::new(),
        }
    }

    pub fn with_guard(mut self, guard: Guard) -> Self {
        self.guards.push(guard);
        self
    }

    pub fn allows_from(&self, state: MeldingState) -> bool {
        self.from_states.contains(&state)
    }
}

/// Immutable name -> transition mapping for one phase.
#[derive(Debug, Clone)]
pub struct TransitionTable {
    phase: Phase,
    transitions: HashMap<MeldingTransition, Transition>,
    /// Reaching this state invalidates the melder's token
    terminal_state: Option<MeldingState>,
}

impl TransitionTable {
    pub fn new(phase: Phase, transitions: Vec<Transition>, terminal_state: Option<MeldingState>) -> Self {
        Self {
            phase,
            transitions: transitions.into_iter().map(|t| (t.name, t)).collect(),
            terminal_state,
        }
    }

    /// Melder-facing steps. Attachments come before the location step.
    pub fn front_office() -> Self {
        use MeldingState::*;
        use MeldingTransition as T;

        Self::new(
            Phase::FrontOffice,
            vec![
                Transition::new(T::Classify, &[New, Classified], Classified)
                    .with_guard(Guard::HasClassification),
                Transition::new(T::AnswerQuestions, &[Classified, QuestionsAnswered], QuestionsAnswered)
                    .with_guard(Guard::HasAnsweredRequiredQuestions),
                Transition::new(T::AddAttachments, &[QuestionsAnswered, AttachmentsAdded], AttachmentsAdded),
                Transition::new(T::SubmitLocation, &[AttachmentsAdded, LocationSubmitted], LocationSubmitted)
                    .with_guard(Guard::HasLocation),
                Transition::new(T::AddContactInfo, &[LocationSubmitted, ContactInfoAdded], ContactInfoAdded),
                Transition::new(T::Submit, &[ContactInfoAdded], Submitted),
            ],
            Some(Submitted),
        )
    }

    pub fn back_office() -> Self {
        use MeldingState::*;
        use MeldingTransition as T;

        Self::new(
            Phase::BackOffice,
            vec![
                Transition::new(T::RequestProcessing, &[Submitted, Processing, Planned], ProcessingRequested),
                Transition::new(
                    T::Process,
                    &[Submitted, ProcessingRequested, Planned, ReopenRequested, Reopened],
                    Processing,
                ),
                Transition::new(T::Plan, &[Submitted, ProcessingRequested, Processing], Planned),
                Transition::new(
                    T::Requeue,
                    &[ProcessingRequested, Processing, Planned, ReopenRequested, Reopened],
                    Submitted,
                ),
                Transition::new(
                    T::Complete,
                    &[Submitted, ProcessingRequested, Processing, Planned, ReopenRequested, Reopened],
                    Completed,
                ),
                Transition::new(
                    T::Cancel,
                    &[Submitted, ProcessingRequested, Processing, Planned, ReopenRequested, Reopened],
                    Canceled,
                ),
                Transition::new(T::RequestReopen, &[Completed, Canceled], ReopenRequested),
                Transition::new(T::Reopen, &[Completed, Canceled, ReopenRequested], Reopened),
            ],
            None,
        )
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn terminal_state(&self) -> Option<MeldingState> {
        self.terminal_state
    }

    pub fn get(&self, name: MeldingTransition) -> Option<&Transition> {
        self.transitions.get(&name)
    }

    /// Transitions in declaration order of `MeldingTransition`.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        MeldingTransition::ALL
            .iter()
            .filter_map(|name| self.transitions.get(name))
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_front_office_table_shape() {
        let table = TransitionTable::front_office();
        assert_eq!(table.len(), 6);
        assert_eq!(table.terminal_state(), Some(MeldingState::Submitted));

        let guarded: Vec<_> = table.iter().filter(|t| !t.guards.is_empty()).map(|t| t.name).collect();
        assert_eq!(
            guarded,
            vec![
                MeldingTransition::Classify,
                MeldingTransition::AnswerQuestions,
                MeldingTransition::SubmitLocation,
            ]
        );
    }

    #[test]
    fn test_back_office_has_no_guards_and_no_terminal() {
        let table = TransitionTable::back_office();
        assert_eq!(table.len(), 8);
        assert!(table.terminal_state().is_none());
        assert!(table.iter().all(|t| t.guards.is_empty()));
    }

    #[test]
    fn test_completed_and_canceled_do_not_reach_each_other() {
        let table = TransitionTable::back_office();
        let complete = table.get(MeldingTransition::Complete).unwrap();
        let cancel = table.get(MeldingTransition::Cancel).unwrap();

        assert!(!complete.allows_from(MeldingState::Canceled));
        assert!(!cancel.allows_from(MeldingState::Completed));
    }

    #[test]
    fn test_tables_use_disjoint_states() {
        let front = TransitionTable::front_office();
        let back = TransitionTable::back_office();

        for transition in back.iter() {
            assert!(transition.from_states.iter().all(|s| !s.is_front_office()));
        }
        for transition in front.iter() {
            assert!(transition.from_states.iter().all(|s| s.is_front_office()));
        }
    }
}
