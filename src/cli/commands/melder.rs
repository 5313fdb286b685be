// Commands a melder runs with the token from 'meldingen create'

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveTime};

use super::{print_json, print_result, with_service, Command};
use crate::actions::MeldingError;
use crate::melding::{AnswerValue, GeoJson, MeldingId};

/// Explain a refused action to the melder before handing the error up.
fn refused(error: MeldingError) -> anyhow::Error {
    println!("❌ {} (status {})", error.user_hint(), error.status_code());
    error.into()
}

pub struct UpdateCommand {
    pub id: MeldingId,
    pub token: String,
    pub text: String,
    pub json: bool,
}

impl Command for UpdateCommand {
    async fn execute(&self) -> Result<()> {
        with_service(|service| async move {
            let melding = service
                .update_text(self.id, &self.token, &self.text)
                .await
                .map_err(refused)?;
            print_result(&melding, self.json)
        })
        .await
    }
}

pub struct AnswerCommand {
    pub id: MeldingId,
    pub token: String,
    pub question_id: u64,
    pub value: String,
    pub kind: String,
    pub label: Option<String>,
    pub json: bool,
}

impl AnswerCommand {
    pub fn answer_value(&self) -> Result<AnswerValue> {
        let value = match self.kind.as_str() {
            "text" => AnswerValue::Text(self.value.clone()),
            "date" => AnswerValue::Date(
                NaiveDate::parse_from_str(&self.value, "%Y-%m-%d")
                    .with_context(|| format!("'{}' is not a YYYY-MM-DD date", self.value))?,
            ),
            "time" => AnswerValue::Time(
                NaiveTime::parse_from_str(&self.value, "%H:%M:%S")
                    .or_else(|_| NaiveTime::parse_from_str(&self.value, "%H:%M"))
                    .with_context(|| format!("'{}' is not a HH:MM time", self.value))?,
            ),
            "value-label" => AnswerValue::ValueLabel {
                value: self.value.clone(),
                label: self.label.clone().unwrap_or_else(|| self.value.clone()),
            },
            other => bail!("unknown answer kind '{other}', expected text, date, time or value-label"),
        };
        Ok(value)
    }
}

impl Command for AnswerCommand {
    async fn execute(&self) -> Result<()> {
        let value = self.answer_value()?;
        with_service(|service| async move {
            let melding = service
                .answer_question(self.id, &self.token, self.question_id, value)
                .await
                .map_err(refused)?;
            print_result(&melding, self.json)
        })
        .await
    }
}

pub struct AttachCommand {
    pub id: MeldingId,
    pub token: String,
    pub filename: String,
    pub json: bool,
}

impl Command for AttachCommand {
    async fn execute(&self) -> Result<()> {
        with_service(|service| async move {
            let (melding, attachment) = service
                .add_attachment(self.id, &self.token, &self.filename)
                .await
                .map_err(refused)?;
            if self.json {
                return print_json(&attachment);
            }
            println!("📎 Attachment #{} added", attachment.id);
            print_result(&melding, false)
        })
        .await
    }
}

pub struct DetachCommand {
    pub id: MeldingId,
    pub token: String,
    pub attachment_id: u64,
    pub json: bool,
}

impl Command for DetachCommand {
    async fn execute(&self) -> Result<()> {
        with_service(|service| async move {
            let melding = service
                .delete_attachment(self.id, &self.token, self.attachment_id)
                .await
                .map_err(refused)?;
            print_result(&melding, self.json)
        })
        .await
    }
}

pub struct LocateCommand {
    pub id: MeldingId,
    pub token: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub geojson: Option<String>,
    pub json: bool,
}

impl LocateCommand {
    fn location(&self) -> Result<GeoJson> {
        match (&self.geojson, self.lat, self.lon) {
            (Some(raw), _, _) => Ok(GeoJson::from_json(raw)?),
            (None, Some(lat), Some(lon)) => Ok(GeoJson::point(lat, lon)),
            _ => bail!("give either --lat and --lon, or --geojson"),
        }
    }
}

impl Command for LocateCommand {
    async fn execute(&self) -> Result<()> {
        let location = self.location()?;
        with_service(|service| async move {
            let melding = service
                .add_location(self.id, &self.token, location)
                .await
                .map_err(refused)?;
            print_result(&melding, self.json)
        })
        .await
    }
}

pub struct ContactCommand {
    pub id: MeldingId,
    pub token: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub json: bool,
}

impl Command for ContactCommand {
    async fn execute(&self) -> Result<()> {
        with_service(|service| async move {
            let melding = service
                .add_contact_info(self.id, &self.token, self.phone.clone(), self.email.clone())
                .await
                .map_err(refused)?;
            print_result(&melding, self.json)
        })
        .await
    }
}

pub struct AssetCommand {
    pub id: MeldingId,
    pub token: String,
    pub external_id: String,
    pub remove: bool,
    pub json: bool,
}

impl Command for AssetCommand {
    async fn execute(&self) -> Result<()> {
        with_service(|service| async move {
            let result = if self.remove {
                service.remove_asset(self.id, &self.token, &self.external_id).await
            } else {
                service.add_asset(self.id, &self.token, &self.external_id).await
            };
            let melding = result.map_err(refused)?;
            print_result(&melding, self.json)
        })
        .await
    }
}

pub struct FinishCommand {
    pub id: MeldingId,
    pub token: String,
    pub step: String,
    pub json: bool,
}

impl Command for FinishCommand {
    async fn execute(&self) -> Result<()> {
        with_service(|service| async move {
            let mut step = service
                .finish_step(self.id, &self.token, &self.step.to_uppercase())
                .await
                .map_err(refused)?;
            if self.json {
                step.melding = step.melding.redacted();
                return print_json(&step);
            }
            println!(
                "✅ {}: {} -> {}",
                step.outcome.transition, step.outcome.previous_state, step.outcome.new_state
            );
            if step.outcome.token_invalidated {
                println!("📨 Melding submitted. The token can no longer be used to change it.");
            }
            print_result(&step.melding, false)
        })
        .await
    }
}
