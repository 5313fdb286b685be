use anyhow::Result;

use super::{print_json, print_melding, with_service, Command};

pub struct CreateCommand {
    pub text: String,
    pub json: bool,
}

impl CreateCommand {
    pub fn new(text: String) -> Self {
        Self { text, json: false }
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

impl Command for CreateCommand {
    async fn execute(&self) -> Result<()> {
        with_service(|service| async move {
            let created = service.create_melding(&self.text).await?;

            if self.json {
                return print_json(&created);
            }

            println!("✅ Melding created");
            print_melding(&created.melding);
            println!();
            println!("🔑 Token: {}", created.token);
            println!("   Keep it: every next step needs it, and it is shown only once.");
            if created.melding.classification_id.is_none() {
                println!("   💡 No classification matched; use 'meldingen update' to describe it differently.");
            }
            Ok(())
        })
        .await
    }
}
