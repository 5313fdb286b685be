// Guard predicates attached to transitions

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::melding::{Form, Melding};

/// Everything a guard may look at. Guards only read.
#[derive(Debug, Clone, Copy)]
pub struct GuardContext<'a> {
    pub melding: &'a Melding,
    /// Form belonging to the melding's classification, if it has one
    pub form: Option<&'a Form>,
}

impl<'a> GuardContext<'a> {
    pub fn new(melding: &'a Melding, form: Option<&'a Form>) -> Self {
        Self { melding, form }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Guard {
    HasClassification,
    HasAnsweredRequiredQuestions,
    HasLocation,
}

impl Guard {
    pub fn evaluate(&self, ctx: &GuardContext<'_>) -> bool {
        match self {
            Guard::HasClassification => ctx.melding.classification_id.is_some(),
            Guard::HasAnsweredRequiredQuestions => has_answered_required_questions(ctx),
            Guard::HasLocation => has_location(ctx),
        }
    }

    /// Message shown to the melder when this guard blocks a step.
    pub fn user_hint(&self) -> &'static str {
        match self {
            Guard::HasClassification => "describe the problem so it can be classified first",
            Guard::HasAnsweredRequiredQuestions => "answer the additional questions first",
            Guard::HasLocation => "submit your location first",
        }
    }
}

impl fmt::Display for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Guard::HasClassification => f.write_str("HasClassification"),
            Guard::HasAnsweredRequiredQuestions => f.write_str("HasAnsweredRequiredQuestions"),
            Guard::HasLocation => f.write_str("HasLocation"),
        }
    }
}

fn has_answered_required_questions(ctx: &GuardContext<'_>) -> bool {
    // No form means no required questions
    let Some(form) = ctx.form else {
        return true;
    };

    let answered: HashSet<u64> = ctx
        .melding
        .answers
        .iter()
        .map(|answer| answer.question_id)
        .collect();

    form.questions
        .iter()
        .filter(|question| question.required)
        .all(|question| answered.contains(&question.id))
}

fn has_location(ctx: &GuardContext<'_>) -> bool {
    ctx.melding
        .geo_location
        .as_ref()
        .is_some_and(|geojson| geojson.validate().is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::melding::{Answer, AnswerValue, GeoJson, Question};

    fn form_with(questions: Vec<(u64, bool)>) -> Form {
        Form {
            id: 1,
            classification_id: 1,
            title: "Afval".to_string(),
            questions: questions
                .into_iter()
                .map(|(id, required)| Question {
                    id,
                    text: format!("Question {id}"),
                    required,
                })
                .collect(),
        }
    }

    fn answer(question_id: u64) -> Answer {
        Answer {
            question_id,
            value: AnswerValue::Text("ja".to_string()),
        }
    }

    #[test]
    fn test_zero_answers_fail_required_questions() {
        let melding = Melding::test_instance();
        let form = form_with(vec![(1, true), (2, false)]);
        let ctx = GuardContext::new(&melding, Some(&form));

        assert!(!Guard::HasAnsweredRequiredQuestions.evaluate(&ctx));
    }

    #[test]
    fn test_optional_questions_may_stay_unanswered() {
        let mut melding = Melding::test_instance();
        melding.answers.push(answer(1));
        let form = form_with(vec![(1, true), (2, false)]);
        let ctx = GuardContext::new(&melding, Some(&form));

        assert!(Guard::HasAnsweredRequiredQuestions.evaluate(&ctx));
    }

    #[test]
    fn test_missing_form_has_no_required_questions() {
        let melding = Melding::test_instance();
        let ctx = GuardContext::new(&melding, None);

        assert!(Guard::HasAnsweredRequiredQuestions.evaluate(&ctx));
    }

    #[test]
    fn test_has_classification() {
        let mut melding = Melding::test_instance();
        assert!(!Guard::HasClassification.evaluate(&GuardContext::new(&melding, None)));

        melding.classification_id = Some(1);
        assert!(Guard::HasClassification.evaluate(&GuardContext::new(&melding, None)));
    }

    #[test]
    fn test_has_location_requires_valid_geometry() {
        let mut melding = Melding::test_instance();
        assert!(!Guard::HasLocation.evaluate(&GuardContext::new(&melding, None)));

        melding.geo_location = Some(GeoJson::point(52.3680605, 4.897092));
        assert!(Guard::HasLocation.evaluate(&GuardContext::new(&melding, None)));

        melding.geo_location = Some(GeoJson::point(152.0, 4.897092));
        assert!(!Guard::HasLocation.evaluate(&GuardContext::new(&melding, None)));
    }
}
