use anyhow::Result;

use super::{print_json, Command};
use crate::statemachine::{Phase, TransitionTable};

pub struct TableCommand {
    pub json: bool,
}

impl Command for TableCommand {
    async fn execute(&self) -> Result<()> {
        let tables = [TransitionTable::front_office(), TransitionTable::back_office()];

        if self.json {
            let transitions: Vec<_> = tables.iter().flat_map(|t| t.iter()).collect();
            return print_json(&transitions);
        }

        for table in &tables {
            let title = match table.phase() {
                Phase::FrontOffice => "Melder steps",
                Phase::BackOffice => "Back office",
            };
            println!("🔀 {title}");
            for transition in table.iter() {
                let from: Vec<_> = transition.from_states.iter().map(|s| s.as_str()).collect();
                let guards: Vec<_> = transition.guards.iter().map(|g| g.to_string()).collect();
                println!(
                    "   {:<20} {} -> {}{}",
                    transition.name.as_str(),
                    from.join(", "),
                    transition.to_state,
                    if guards.is_empty() {
                        String::new()
                    } else {
                        format!("  [{}]", guards.join(", "))
                    }
                );
            }
            if let Some(terminal) = table.terminal_state() {
                println!("   Reaching {terminal} invalidates the melder's token.");
            }
            println!();
        }
        Ok(())
    }
}
