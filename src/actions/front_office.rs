// Melder-facing actions
//
// Every action except creation presents the melding's token, which is verified
// before anything else is looked at.

use chrono::{DateTime, Utc};
use tracing::info;

use super::{CreatedMelding, MeldingError, MeldingService, StepResult};
use crate::melding::{
    Answer, AnswerValue, AssetLimiter, Attachment, Classifier, ContactInfo, GeoJson, Melding,
    MeldingId, Reclassifier, ValidationError,
};
use crate::observability::lifecycle_metrics;
use crate::statemachine::{Access, MeldingTransition, TransitionError};

impl MeldingService {
    /// Load a melding on behalf of a melder, rejecting spent, expired or wrong tokens.
    async fn load_for_melder(
        &self,
        id: MeldingId,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Melding, MeldingError> {
        let melding = self.repository.get(id).await?;
        let stored = melding.token.as_ref().ok_or(TransitionError::TokenInvalidated)?;
        stored.verify(token, now)?;
        Ok(melding)
    }

    /// Load, change and save a melding as its melder.
    async fn mutate_as_melder<T, F>(
        &self,
        id: MeldingId,
        token: &str,
        change: F,
    ) -> Result<(Melding, T), MeldingError>
    where
        F: FnOnce(&mut Melding, DateTime<Utc>) -> Result<T, MeldingError>,
    {
        let now = self.now();
        let mut melding = self.load_for_melder(id, token, now).await?;
        let value = change(&mut melding, now)?;
        melding.updated_at = now;
        let saved = self.save(&melding).await?;
        Ok((saved, value))
    }

    pub async fn create_melding(&self, text: &str) -> Result<CreatedMelding, MeldingError> {
        self.traced("create_melding", None, async {
            let now = self.now();
            let token = self.tokens.generate(now);
            let plaintext = token.expose().to_string();

            let mut melding = Melding::new(0, self.public_ids.generate(), text.to_string(), token, now)?;

            if let Some(classification) = Classifier.classify(&self.catalog, &melding.text) {
                Reclassifier.reclassify(&mut melding, None, Some(classification));
                self.transition(
                    &mut melding,
                    MeldingTransition::Classify.as_str(),
                    Access::Melder { token: &plaintext },
                    now,
                )?;
            }

            let melding = self.repository.insert(melding).await?;
            lifecycle_metrics().record_created();
            info!(
                melding_id = %melding.id,
                public_id = %melding.public_id,
                state = %melding.state,
                "Melding created"
            );

            Ok(CreatedMelding {
                melding,
                token: plaintext,
            })
        })
        .await
    }

    /// Replace the text and classify again.
    ///
    /// Text that matches no classification keeps the current one. A melding that
    /// never matched stays `New`.
    pub async fn update_text(&self, id: MeldingId, token: &str, text: &str) -> Result<Melding, MeldingError> {
        self.traced("update_text", Some(id), async {
            let (melding, _) = self
                .mutate_as_melder(id, token, |melding, now| {
                    if text.trim().is_empty() {
                        return Err(ValidationError::EmptyText.into());
                    }
                    melding.text = text.to_string();

                    let current = match melding.classification_id {
                        Some(classification_id) => Some(self.catalog.classification(classification_id)?),
                        None => None,
                    };
                    if let Some(new) = Classifier.classify(&self.catalog, text) {
                        Reclassifier.reclassify(melding, current, Some(new));
                    }

                    if melding.classification_id.is_some() {
                        self.transition(
                            melding,
                            MeldingTransition::Classify.as_str(),
                            Access::Melder { token },
                            now,
                        )?;
                    }
                    Ok(())
                })
                .await?;
            Ok(melding)
        })
        .await
    }

    pub async fn answer_question(
        &self,
        id: MeldingId,
        token: &str,
        question_id: u64,
        value: AnswerValue,
    ) -> Result<Melding, MeldingError> {
        self.traced("answer_question", Some(id), async {
            let (melding, _) = self
                .mutate_as_melder(id, token, |melding, _| {
                    let form = self.catalog.form_for_melding(melding).ok_or_else(|| MeldingError::NotFound {
                        entity: "form for melding",
                        id: melding.id.to_string(),
                    })?;
                    form.question(question_id).ok_or_else(|| MeldingError::NotFound {
                        entity: "question",
                        id: question_id.to_string(),
                    })?;

                    melding.set_answer(Answer { question_id, value });
                    Ok(())
                })
                .await?;
            Ok(melding)
        })
        .await
    }

    /// Register an uploaded file. Only the metadata is kept here.
    pub async fn add_attachment(
        &self,
        id: MeldingId,
        token: &str,
        original_filename: &str,
    ) -> Result<(Melding, Attachment), MeldingError> {
        self.traced("add_attachment", Some(id), async {
            self.mutate_as_melder(id, token, |melding, now| {
                let filename = original_filename.trim();
                if filename.is_empty() || filename.contains(['/', '\\']) {
                    return Err(ValidationError::InvalidAttachment(original_filename.to_string()).into());
                }

                let attachment = Attachment {
                    id: melding.next_attachment_id(),
                    original_filename: filename.to_string(),
                    created_at: now,
                };
                melding.attachments.push(attachment.clone());
                Ok(attachment)
            })
            .await
        })
        .await
    }

    pub async fn delete_attachment(
        &self,
        id: MeldingId,
        token: &str,
        attachment_id: u64,
    ) -> Result<Melding, MeldingError> {
        self.traced("delete_attachment", Some(id), async {
            let (melding, _) = self
                .mutate_as_melder(id, token, |melding, _| {
                    let position = melding
                        .attachments
                        .iter()
                        .position(|a| a.id == attachment_id)
                        .ok_or_else(|| MeldingError::NotFound {
                            entity: "attachment",
                            id: attachment_id.to_string(),
                        })?;
                    melding.attachments.remove(position);
                    Ok(())
                })
                .await?;
            Ok(melding)
        })
        .await
    }

    pub async fn add_location(&self, id: MeldingId, token: &str, location: GeoJson) -> Result<Melding, MeldingError> {
        self.traced("add_location", Some(id), async {
            let (melding, _) = self
                .mutate_as_melder(id, token, |melding, _| {
                    location.validate()?;
                    melding.geo_location = Some(location);
                    Ok(())
                })
                .await?;
            Ok(melding)
        })
        .await
    }

    pub async fn add_contact_info(
        &self,
        id: MeldingId,
        token: &str,
        phone: Option<String>,
        email: Option<String>,
    ) -> Result<Melding, MeldingError> {
        self.traced("add_contact_info", Some(id), async {
            let contact = ContactInfo::new(phone, email)?;
            let (melding, _) = self
                .mutate_as_melder(id, token, |melding, _| {
                    melding.set_contact_info(contact);
                    Ok(())
                })
                .await?;
            Ok(melding)
        })
        .await
    }

    pub async fn add_asset(&self, id: MeldingId, token: &str, external_id: &str) -> Result<Melding, MeldingError> {
        self.traced("add_asset", Some(id), async {
            let (melding, _) = self
                .mutate_as_melder(id, token, |melding, _| {
                    let asset_type = self.catalog.asset_type_for_melding(melding)?;
                    AssetLimiter.add_asset(melding, asset_type, external_id)?;
                    Ok(())
                })
                .await?;
            Ok(melding)
        })
        .await
    }

    pub async fn remove_asset(&self, id: MeldingId, token: &str, external_id: &str) -> Result<Melding, MeldingError> {
        self.traced("remove_asset", Some(id), async {
            let (melding, _) = self
                .mutate_as_melder(id, token, |melding, _| {
                    AssetLimiter.remove_asset(melding, external_id)?;
                    Ok(())
                })
                .await?;
            Ok(melding)
        })
        .await
    }

    /// Complete a form step by applying its front-office transition.
    ///
    /// `CLASSIFY` is driven by the text and cannot be requested directly.
    pub async fn finish_step(&self, id: MeldingId, token: &str, transition: &str) -> Result<StepResult, MeldingError> {
        self.traced("finish_step", Some(id), async {
            let (melding, outcome) = self
                .mutate_as_melder(id, token, |melding, now| {
                    let name: MeldingTransition = transition.parse()?;
                    if name == MeldingTransition::Classify {
                        return Err(TransitionError::TransitionNotAllowed {
                            transition: name,
                            state: melding.state,
                        }
                        .into());
                    }
                    self.transition(melding, name.as_str(), Access::Melder { token }, now)
                })
                .await?;
            Ok(StepResult { melding, outcome })
        })
        .await
    }

    pub async fn retrieve_for_melder(&self, id: MeldingId, token: &str) -> Result<Melding, MeldingError> {
        self.traced("retrieve_for_melder", Some(id), async {
            self.load_for_melder(id, token, self.now()).await
        })
        .await
    }
}
