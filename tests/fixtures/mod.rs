//! Shared catalog and service setup for the integration tests
#![allow(dead_code)]

use meldingen::melding::{AnswerValue, Catalog, GeoJson};
use meldingen::repository::{InMemoryMeldingRepository, MeldingRepository};
use meldingen::{CreatedMelding, MeldingService};
use std::sync::Arc;

pub const CATALOG: &str = r#"
[[asset_types]]
id = 1
name = "container"
max_assets = 2

[[classifications]]
id = 1
name = "afval"
asset_type_id = 1

[[classifications]]
id = 2
name = "straatverlichting"

[[forms]]
id = 1
classification_id = 2
title = "Straatverlichting"

[[forms.questions]]
id = 10
text = "Brandt de lamp helemaal niet?"
required = true

[[forms.questions]]
id = 11
text = "Heeft u nog opmerkingen?"
required = false
"#;

/// Dam Square, Amsterdam
pub const DAM_SQUARE: (f64, f64) = (52.3680605, 4.897092);

pub fn catalog() -> Arc<Catalog> {
    Arc::new(Catalog::from_toml_str(CATALOG).expect("fixture catalog is valid"))
}

pub fn service() -> MeldingService {
    service_with(Arc::new(InMemoryMeldingRepository::new()))
}

pub fn service_with(repository: Arc<dyn MeldingRepository>) -> MeldingService {
    MeldingService::new(repository, catalog())
}

pub fn dam_square() -> GeoJson {
    GeoJson::point(DAM_SQUARE.0, DAM_SQUARE.1)
}

/// A street lighting melding taken all the way to `Submitted`.
pub async fn submitted_melding(service: &MeldingService) -> CreatedMelding {
    let created = service
        .create_melding("straatverlichting")
        .await
        .expect("create melding");
    let id = created.melding.id;
    let token = created.token.as_str();

    service
        .answer_question(id, token, 10, AnswerValue::Text("ja".to_string()))
        .await
        .expect("answer required question");
    service.finish_step(id, token, "ANSWER_QUESTIONS").await.expect("answer questions");
    service.add_attachment(id, token, "lantaarnpaal.jpg").await.expect("attach");
    service.finish_step(id, token, "ADD_ATTACHMENTS").await.expect("add attachments");
    service.add_location(id, token, dam_square()).await.expect("locate");
    service.finish_step(id, token, "SUBMIT_LOCATION").await.expect("submit location");
    service
        .add_contact_info(id, token, Some("+31612345678".to_string()), None)
        .await
        .expect("contact info");
    service.finish_step(id, token, "ADD_CONTACT_INFO").await.expect("add contact info");
    let step = service.finish_step(id, token, "SUBMIT").await.expect("submit");

    CreatedMelding {
        melding: step.melding,
        token: created.token,
    }
}
