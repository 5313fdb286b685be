// Melding data model

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use super::location::GeoJson;
use super::token::SubmissionToken;
use super::ValidationError;
use crate::statemachine::MeldingState;

pub type MeldingId = u64;

/// A report submitted by a melder and processed by the back office.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Melding {
    pub id: MeldingId,
    /// Short reference the melder can quote when calling in
    pub public_id: String,
    pub text: String,
    pub state: MeldingState,
    pub classification_id: Option<u64>,
    pub token: Option<SubmissionToken>,
    pub geo_location: Option<GeoJson>,
    pub phone: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub answers: Vec<Answer>,
    #[serde(default)]
    pub assets: Vec<Asset>,
    /// Optimistic concurrency counter, bumped by every successful save
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Melding {
    pub fn new(
        id: MeldingId,
        public_id: String,
        text: String,
        token: SubmissionToken,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyText);
        }

        Ok(Self {
            id,
            public_id,
            text,
            state: MeldingState::New,
            classification_id: None,
            token: Some(token),
            geo_location: None,
            phone: None,
            email: None,
            attachments: Vec::new(),
            answers: Vec::new(),
            assets: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Record an answer, replacing an earlier answer to the same question.
    pub fn set_answer(&mut self, answer: Answer) {
        match self
            .answers
            .iter_mut()
            .find(|existing| existing.question_id == answer.question_id)
        {
            Some(existing) => existing.value = answer.value,
            None => self.answers.push(answer),
        }
    }

    pub fn set_contact_info(&mut self, contact: ContactInfo) {
        self.phone = contact.phone;
        self.email = contact.email;
    }

    /// Copy without the token secret, safe to print or hand to the back office.
    pub fn redacted(&self) -> Self {
        Self {
            token: self.token.as_ref().map(SubmissionToken::redacted),
            ..self.clone()
        }
    }

    pub fn next_attachment_id(&self) -> u64 {
        self.attachments.iter().map(|a| a.id).max().unwrap_or(0) + 1
    }

    #[cfg(test)]
    pub fn test_instance() -> Self {
        let now = Utc::now();
        let token = SubmissionToken::new("supersecrettoken".to_string(), now + chrono::Duration::hours(3));
        Self::new(1, "ABC123".to_string(), "De restafvalcontainer is vol.".to_string(), token, now)
            .expect("test melding text is not empty")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub asset_type_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetType {
    pub id: u64,
    pub name: String,
    pub max_assets: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Form {
    pub id: u64,
    pub classification_id: u64,
    pub title: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl Form {
    pub fn question(&self, question_id: u64) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: u64,
    pub text: String,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: u64,
    pub value: AnswerValue,
}

/// Typed answer store. Only the presence of an answer matters to the lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AnswerValue {
    Text(String),
    Date(NaiveDate),
    Time(NaiveTime),
    ValueLabel { value: String, label: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: u64,
    pub original_filename: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub external_id: String,
    pub asset_type_id: u64,
}

static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+\d{6,14}$").expect("phone pattern is valid"));

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[A-Za-z]{2,}$").expect("email pattern is valid")
});

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl ContactInfo {
    pub fn new(phone: Option<String>, email: Option<String>) -> Result<Self, ValidationError> {
        let phone = phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty());
        let email = email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty());

        if let Some(phone) = &phone {
            if !PHONE_PATTERN.is_match(phone) {
                return Err(ValidationError::InvalidPhone(phone.clone()));
            }
        }
        if let Some(email) = &email {
            if !EMAIL_PATTERN.is_match(email) {
                return Err(ValidationError::InvalidEmail(email.clone()));
            }
        }

        Ok(Self { phone, email })
    }
}
