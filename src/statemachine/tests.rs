use chrono::Utc;

use super::*;
use crate::melding::{Answer, AnswerValue, Form, GeoJson, Melding, Question};

const TOKEN: &str = "supersecrettoken";

fn melder() -> Access<'static> {
    Access::Melder { token: TOKEN }
}

fn form_with_required_question() -> Form {
    Form {
        id: 1,
        classification_id: 2,
        title: "Straatverlichting".to_string(),
        questions: vec![
            Question {
                id: 10,
                text: "Brandt de lamp helemaal niet?".to_string(),
                required: true,
            },
            Question {
                id: 11,
                text: "Opmerkingen".to_string(),
                required: false,
            },
        ],
    }
}

fn melding_in(state: MeldingState) -> Melding {
    let mut melding = Melding::test_instance();
    melding.state = state;
    melding
}

fn apply(machine: &MeldingStateMachine, melding: &mut Melding, name: &str) -> Result<TransitionOutcome, TransitionError> {
    machine.apply(melding, name, melder(), None, Utc::now())
}

#[test]
fn test_unknown_transition_leaves_melding_untouched() {
    let machine = MeldingStateMachine::default();
    let mut melding = Melding::test_instance();
    let before = melding.clone();

    let result = apply(&machine, &mut melding, "TELEPORT");

    assert_eq!(
        result,
        Err(TransitionError::UnknownTransition {
            name: "TELEPORT".to_string()
        })
    );
    assert_eq!(melding, before);
}

#[test]
fn test_back_office_name_is_unknown_to_melder() {
    let machine = MeldingStateMachine::default();
    let mut melding = melding_in(MeldingState::Submitted);

    let result = apply(&machine, &mut melding, "PROCESS");
    assert!(matches!(result, Err(TransitionError::UnknownTransition { .. })));
    assert_eq!(melding.state, MeldingState::Submitted);
}

#[test]
fn test_steps_cannot_be_skipped_from_classified() {
    let machine = MeldingStateMachine::default();

    for name in ["ADD_ATTACHMENTS", "SUBMIT_LOCATION", "ADD_CONTACT_INFO", "SUBMIT"] {
        let mut melding = melding_in(MeldingState::Classified);
        melding.geo_location = Some(GeoJson::point(52.3680605, 4.897092));

        let result = apply(&machine, &mut melding, name);

        assert!(
            matches!(result, Err(TransitionError::TransitionNotAllowed { state: MeldingState::Classified, .. })),
            "{name} should not be allowed from classified, got {result:?}"
        );
        assert_eq!(melding.state, MeldingState::Classified);
    }
}

#[test]
fn test_answer_questions_requires_required_answers() {
    let machine = MeldingStateMachine::default();
    let form = form_with_required_question();
    let mut melding = melding_in(MeldingState::Classified);

    let result = machine.apply(&mut melding, "ANSWER_QUESTIONS", melder(), Some(&form), Utc::now());
    assert_eq!(
        result,
        Err(TransitionError::GuardFailed {
            transition: MeldingTransition::AnswerQuestions,
            guard: Guard::HasAnsweredRequiredQuestions,
        })
    );
    assert_eq!(melding.state, MeldingState::Classified);

    // Optional questions may stay open
    melding.set_answer(Answer {
        question_id: 10,
        value: AnswerValue::Text("ja".to_string()),
    });
    let outcome = machine
        .apply(&mut melding, "ANSWER_QUESTIONS", melder(), Some(&form), Utc::now())
        .unwrap();
    assert_eq!(outcome.new_state, MeldingState::QuestionsAnswered);
}

#[test]
fn test_answer_questions_without_form_passes() {
    let machine = MeldingStateMachine::default();
    let mut melding = melding_in(MeldingState::Classified);

    let outcome = apply(&machine, &mut melding, "ANSWER_QUESTIONS").unwrap();
    assert_eq!(outcome.new_state, MeldingState::QuestionsAnswered);
}

#[test]
fn test_submit_location_guard() {
    let machine = MeldingStateMachine::default();

    let mut without = melding_in(MeldingState::AttachmentsAdded);
    assert_eq!(
        apply(&machine, &mut without, "SUBMIT_LOCATION"),
        Err(TransitionError::GuardFailed {
            transition: MeldingTransition::SubmitLocation,
            guard: Guard::HasLocation,
        })
    );

    let mut with = melding_in(MeldingState::AttachmentsAdded);
    with.geo_location = Some(GeoJson::point(52.3680605, 4.897092));
    let outcome = apply(&machine, &mut with, "SUBMIT_LOCATION").unwrap();
    assert_eq!(outcome.previous_state, MeldingState::AttachmentsAdded);
    assert_eq!(with.state, MeldingState::LocationSubmitted);
}

#[test]
fn test_reclassify_is_a_self_loop() {
    let machine = MeldingStateMachine::default();
    let mut melding = Melding::test_instance();
    melding.classification_id = Some(1);

    apply(&machine, &mut melding, "CLASSIFY").unwrap();
    let outcome = apply(&machine, &mut melding, "CLASSIFY").unwrap();

    assert_eq!(outcome.previous_state, MeldingState::Classified);
    assert_eq!(outcome.new_state, MeldingState::Classified);
    assert!(!outcome.token_invalidated);
}

#[test]
fn test_classify_needs_a_classification() {
    let machine = MeldingStateMachine::default();
    let mut melding = Melding::test_instance();

    assert_eq!(
        apply(&machine, &mut melding, "classify"),
        Err(TransitionError::GuardFailed {
            transition: MeldingTransition::Classify,
            guard: Guard::HasClassification,
        })
    );
    assert_eq!(melding.state, MeldingState::New);
}

#[test]
fn test_full_front_office_flow_invalidates_token() {
    let machine = MeldingStateMachine::default();
    let mut melding = Melding::test_instance();
    melding.classification_id = Some(1);
    melding.geo_location = Some(GeoJson::point(52.3680605, 4.897092));

    for name in [
        "CLASSIFY",
        "ANSWER_QUESTIONS",
        "ADD_ATTACHMENTS",
        "SUBMIT_LOCATION",
        "ADD_CONTACT_INFO",
    ] {
        let outcome = apply(&machine, &mut melding, name).unwrap();
        assert!(!outcome.token_invalidated);
        assert!(MeldingState::ALL.contains(&melding.state));
    }

    let outcome = apply(&machine, &mut melding, "SUBMIT").unwrap();
    assert_eq!(outcome.new_state, MeldingState::Submitted);
    assert!(outcome.token_invalidated);
    assert!(melding.token.as_ref().unwrap().is_invalidated());

    // Every front-office name now reports the spent token
    for name in TransitionTable::front_office().iter().map(|t| t.name.as_str()) {
        assert_eq!(
            apply(&machine, &mut melding, name),
            Err(TransitionError::TokenInvalidated),
            "{name} after submission"
        );
    }
    assert_eq!(melding.state, MeldingState::Submitted);
}

#[test]
fn test_wrong_token_is_rejected() {
    let machine = MeldingStateMachine::default();
    let mut melding = Melding::test_instance();

    let result = machine.apply(
        &mut melding,
        "CLASSIFY",
        Access::Melder { token: "guessed" },
        None,
        Utc::now(),
    );
    assert_eq!(result, Err(TransitionError::TokenInvalidated));
    assert_eq!(melding.state, MeldingState::New);
}

#[test]
fn test_expired_token_is_rejected() {
    let machine = MeldingStateMachine::default();
    let mut melding = Melding::test_instance();
    let later = Utc::now() + chrono::Duration::hours(4);

    let result = machine.apply(&mut melding, "CLASSIFY", melder(), None, later);
    assert_eq!(result, Err(TransitionError::TokenExpired));
}

#[test]
fn test_back_office_flow() {
    let machine = MeldingStateMachine::default();
    let mut melding = melding_in(MeldingState::Submitted);
    let now = Utc::now();

    for (name, expected) in [
        ("PROCESS", MeldingState::Processing),
        ("PLAN", MeldingState::Planned),
        ("COMPLETE", MeldingState::Completed),
        ("REQUEST_REOPEN", MeldingState::ReopenRequested),
        ("REOPEN", MeldingState::Reopened),
        ("CANCEL", MeldingState::Canceled),
    ] {
        let outcome = machine.apply(&mut melding, name, Access::BackOffice, None, now).unwrap();
        assert_eq!(outcome.new_state, expected, "{name}");
        assert!(!outcome.token_invalidated);
    }

    let result = machine.apply(&mut melding, "COMPLETE", Access::BackOffice, None, now);
    assert!(matches!(result, Err(TransitionError::TransitionNotAllowed { .. })));
    assert_eq!(melding.state, MeldingState::Canceled);
}

#[test]
fn test_back_office_cannot_drive_front_office_steps() {
    let machine = MeldingStateMachine::default();
    let mut melding = Melding::test_instance();

    let result = machine.apply(&mut melding, "CLASSIFY", Access::BackOffice, None, Utc::now());
    assert!(matches!(result, Err(TransitionError::UnknownTransition { .. })));
}

#[test]
fn test_possible_transitions() {
    let machine = MeldingStateMachine::default();

    assert_eq!(
        machine.possible_transitions(MeldingState::New),
        vec![MeldingTransition::Classify]
    );
    assert_eq!(
        machine.possible_transitions(MeldingState::Completed),
        vec![MeldingTransition::RequestReopen, MeldingTransition::Reopen]
    );
    assert!(machine
        .possible_transitions(MeldingState::Submitted)
        .contains(&MeldingTransition::Process));
}
