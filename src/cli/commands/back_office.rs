use anyhow::Result;

use super::{print_json, print_result, with_service, Command};
use crate::melding::MeldingId;
use crate::repository::MeldingFilter;
use crate::statemachine::MeldingState;

pub struct ShowCommand {
    pub id: MeldingId,
    pub token: Option<String>,
    pub json: bool,
}

impl Command for ShowCommand {
    async fn execute(&self) -> Result<()> {
        with_service(|service| async move {
            let melding = match &self.token {
                Some(token) => service.retrieve_for_melder(self.id, token).await?,
                None => service.retrieve(self.id).await?,
            };
            print_result(&melding, self.json)
        })
        .await
    }
}

pub struct ListCommand {
    pub state: Option<MeldingState>,
    pub limit: Option<usize>,
    pub offset: usize,
    pub json: bool,
}

impl Command for ListCommand {
    async fn execute(&self) -> Result<()> {
        let filter = MeldingFilter {
            state: self.state,
            limit: self.limit,
            offset: self.offset,
        };

        with_service(|service| async move {
            let meldingen = service.list(&filter).await?;
            if self.json {
                let redacted: Vec<_> = meldingen.iter().map(|m| m.redacted()).collect();
                return print_json(&redacted);
            }

            if meldingen.is_empty() {
                println!("📋 No meldingen found");
                return Ok(());
            }
            println!("📋 {} melding(en):", meldingen.len());
            for melding in &meldingen {
                println!(
                    "   #{:<5} {:<7} {:<22} {}",
                    melding.id, melding.public_id, melding.state.as_str(), melding.text
                );
            }
            Ok(())
        })
        .await
    }
}

pub struct TransitionsCommand {
    pub id: MeldingId,
    pub json: bool,
}

impl Command for TransitionsCommand {
    async fn execute(&self) -> Result<()> {
        with_service(|service| async move {
            let transitions = service.possible_transitions(self.id).await?;
            if self.json {
                return print_json(&transitions);
            }
            if transitions.is_empty() {
                println!("🛑 No transitions possible from here");
            }
            for transition in transitions {
                println!("   ➡️  {transition}");
            }
            Ok(())
        })
        .await
    }
}

pub struct ProcessCommand {
    pub id: MeldingId,
    pub transition: String,
    pub json: bool,
}

impl Command for ProcessCommand {
    async fn execute(&self) -> Result<()> {
        with_service(|service| async move {
            let mut step = service.process(self.id, &self.transition.to_uppercase()).await?;
            if self.json {
                step.melding = step.melding.redacted();
                return print_json(&step);
            }
            println!(
                "✅ {}: {} -> {}",
                step.outcome.transition, step.outcome.previous_state, step.outcome.new_state
            );
            print_result(&step.melding, false)
        })
        .await
    }
}
