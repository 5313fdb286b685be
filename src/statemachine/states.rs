// Core types for the melding lifecycle state machines

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::TransitionError;

/// Every state a melding can be in, across both the melder-facing and the
/// back-office machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeldingState {
    // Front office
    New,
    Classified,
    QuestionsAnswered,
    AttachmentsAdded,
    LocationSubmitted,
    ContactInfoAdded,
    /// Hand-over point: terminal for the melder, initial for the back office
    Submitted,

    // Back office
    ProcessingRequested,
    Processing,
    Planned,
    Completed,
    Canceled,
    ReopenRequested,
    Reopened,
}

impl MeldingState {
    pub const ALL: [MeldingState; 14] = [
        MeldingState::New,
        MeldingState::Classified,
        MeldingState::QuestionsAnswered,
        MeldingState::AttachmentsAdded,
        MeldingState::LocationSubmitted,
        MeldingState::ContactInfoAdded,
        MeldingState::Submitted,
        MeldingState::ProcessingRequested,
        MeldingState::Processing,
        MeldingState::Planned,
        MeldingState::Completed,
        MeldingState::Canceled,
        MeldingState::ReopenRequested,
        MeldingState::Reopened,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MeldingState::New => "new",
            MeldingState::Classified => "classified",
            MeldingState::QuestionsAnswered => "questions_answered",
            MeldingState::AttachmentsAdded => "attachments_added",
            MeldingState::LocationSubmitted => "location_submitted",
            MeldingState::ContactInfoAdded => "contact_info_added",
            MeldingState::Submitted => "submitted",
            MeldingState::ProcessingRequested => "processing_requested",
            MeldingState::Processing => "processing",
            MeldingState::Planned => "planned",
            MeldingState::Completed => "completed",
            MeldingState::Canceled => "canceled",
            MeldingState::ReopenRequested => "reopen_requested",
            MeldingState::Reopened => "reopened",
        }
    }

    /// States the melder can still move the melding out of.
    pub fn is_front_office(&self) -> bool {
        matches!(
            self,
            MeldingState::New
                | MeldingState::Classified
                | MeldingState::QuestionsAnswered
                | MeldingState::AttachmentsAdded
                | MeldingState::LocationSubmitted
                | MeldingState::ContactInfoAdded
        )
    }

    /// No further automatic progression; staff may still reopen.
    pub fn is_terminal(&self) -> bool {
        matches!(self, MeldingState::Completed | MeldingState::Canceled)
    }
}

impl fmt::Display for MeldingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown melding state: {0}")]
pub struct UnknownState(pub String);

impl FromStr for MeldingState {
    type Err = UnknownState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MeldingState::ALL
            .iter()
            .copied()
            .find(|state| state.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownState(s.to_string()))
    }
}

/// Which of the two machines a transition belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    FrontOffice,
    BackOffice,
}

/// Registered transition names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MeldingTransition {
    Classify,
    AnswerQuestions,
    AddAttachments,
    SubmitLocation,
    AddContactInfo,
    Submit,

    RequestProcessing,
    Process,
    Plan,
    Requeue,
    Complete,
    Cancel,
    RequestReopen,
    Reopen,
}

impl MeldingTransition {
    pub const ALL: [MeldingTransition; 14] = [
        MeldingTransition::Classify,
        MeldingTransition::AnswerQuestions,
        MeldingTransition::AddAttachments,
        MeldingTransition::SubmitLocation,
        MeldingTransition::AddContactInfo,
        MeldingTransition::Submit,
        MeldingTransition::RequestProcessing,
        MeldingTransition::Process,
        MeldingTransition::Plan,
        MeldingTransition::Requeue,
        MeldingTransition::Complete,
        MeldingTransition::Cancel,
        MeldingTransition::RequestReopen,
        MeldingTransition::Reopen,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MeldingTransition::Classify => "CLASSIFY",
            MeldingTransition::AnswerQuestions => "ANSWER_QUESTIONS",
            MeldingTransition::AddAttachments => "ADD_ATTACHMENTS",
            MeldingTransition::SubmitLocation => "SUBMIT_LOCATION",
            MeldingTransition::AddContactInfo => "ADD_CONTACT_INFO",
            MeldingTransition::Submit => "SUBMIT",
            MeldingTransition::RequestProcessing => "REQUEST_PROCESSING",
            MeldingTransition::Process => "PROCESS",
            MeldingTransition::Plan => "PLAN",
            MeldingTransition::Requeue => "REQUEUE",
            MeldingTransition::Complete => "COMPLETE",
            MeldingTransition::Cancel => "CANCEL",
            MeldingTransition::RequestReopen => "REQUEST_REOPEN",
            MeldingTransition::Reopen => "REOPEN",
        }
    }
}

impl fmt::Display for MeldingTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeldingTransition {
    type Err = TransitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MeldingTransition::ALL
            .iter()
            .copied()
            .find(|transition| transition.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| TransitionError::UnknownTransition {
                name: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_round_trips_through_display() {
        for state in MeldingState::ALL {
            assert_eq!(state.to_string().parse::<MeldingState>().unwrap(), state);
        }
    }

    #[test]
    fn test_unknown_state_is_rejected() {
        assert!("archived".parse::<MeldingState>().is_err());
    }

    #[test]
    fn test_transition_names_parse_case_insensitively() {
        assert_eq!(
            "submit_location".parse::<MeldingTransition>().unwrap(),
            MeldingTransition::SubmitLocation
        );
        assert!(matches!(
            "TELEPORT".parse::<MeldingTransition>(),
            Err(TransitionError::UnknownTransition { .. })
        ));
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&MeldingState::ContactInfoAdded).unwrap();
        assert_eq!(json, "\"contact_info_added\"");
        let json = serde_json::to_string(&MeldingTransition::AddContactInfo).unwrap();
        assert_eq!(json, "\"ADD_CONTACT_INFO\"");
    }
}
