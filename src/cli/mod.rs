use clap::{Parser, Subcommand};

use crate::melding::MeldingId;
use crate::statemachine::MeldingState;

pub mod commands;

#[derive(Parser)]
#[command(name = "meldingen")]
#[command(about = "Municipal issue reporting: file meldingen and move them through their lifecycle")]
#[command(long_about = "Meldingen lets a melder file a report step by step (classification, questions, \
                       attachments, location, contact info) and lets the back office process it to \
                       completion. Start with 'meldingen create \"<what is wrong>\"'.")]
pub struct Cli {
    /// Print results as JSON instead of a summary
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// File a new melding and print its submission token
    Create {
        /// What is wrong, in the melder's own words
        text: String,
    },
    /// Change the text of a melding, classifying it again
    Update {
        id: MeldingId,
        #[arg(long, help = "Submission token handed out at creation")]
        token: String,
        text: String,
    },
    /// Answer one of the questions of the melding's form
    Answer {
        id: MeldingId,
        #[arg(long, help = "Submission token handed out at creation")]
        token: String,
        question_id: u64,
        value: String,
        /// How to read VALUE: text, date (YYYY-MM-DD), time (HH:MM[:SS]) or value-label
        #[arg(long, default_value = "text")]
        kind: String,
        /// Label shown for a value-label answer
        #[arg(long)]
        label: Option<String>,
    },
    /// Register an uploaded file with a melding
    Attach {
        id: MeldingId,
        #[arg(long, help = "Submission token handed out at creation")]
        token: String,
        filename: String,
    },
    /// Remove an attachment from a melding
    Detach {
        id: MeldingId,
        #[arg(long, help = "Submission token handed out at creation")]
        token: String,
        attachment_id: u64,
    },
    /// Set the location of a melding
    Locate {
        id: MeldingId,
        #[arg(long, help = "Submission token handed out at creation")]
        token: String,
        #[arg(long, requires = "lon", conflicts_with = "geojson")]
        lat: Option<f64>,
        #[arg(long, requires = "lat")]
        lon: Option<f64>,
        /// Full GeoJSON feature, for polygons
        #[arg(long)]
        geojson: Option<String>,
    },
    /// Set the melder's phone number and/or email address
    Contact {
        id: MeldingId,
        #[arg(long, help = "Submission token handed out at creation")]
        token: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Attach or detach assets (containers, lamp posts, ...)
    Asset {
        #[command(subcommand)]
        command: AssetCommands,
    },
    /// Complete a form step (ANSWER_QUESTIONS, ADD_ATTACHMENTS, SUBMIT_LOCATION, ADD_CONTACT_INFO, SUBMIT)
    Finish {
        id: MeldingId,
        #[arg(long, help = "Submission token handed out at creation")]
        token: String,
        step: String,
    },
    /// Show a melding; with --token as its melder, otherwise as the back office
    Show {
        id: MeldingId,
        #[arg(long)]
        token: Option<String>,
    },
    /// List meldingen (back office)
    List {
        #[arg(long, help = "Only meldingen in this state, e.g. submitted")]
        state: Option<MeldingState>,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long, default_value = "0")]
        offset: usize,
    },
    /// Show which transitions a melding's current state allows (back office)
    Transitions { id: MeldingId },
    /// Apply a back-office transition (PROCESS, PLAN, COMPLETE, ...)
    Process { id: MeldingId, transition: String },
    /// Print both transition tables
    Table,
}

#[derive(Subcommand)]
pub enum AssetCommands {
    /// Attach an asset by its external id
    Add {
        id: MeldingId,
        #[arg(long, help = "Submission token handed out at creation")]
        token: String,
        external_id: String,
    },
    /// Detach an asset by its external id
    Remove {
        id: MeldingId,
        #[arg(long, help = "Submission token handed out at creation")]
        token: String,
        external_id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_state_filter() {
        let cli = Cli::try_parse_from(["meldingen", "list", "--state", "submitted", "--limit", "5"]).unwrap();
        match cli.command {
            Some(Commands::List { state, limit, offset }) => {
                assert_eq!(state, Some(MeldingState::Submitted));
                assert_eq!(limit, Some(5));
                assert_eq!(offset, 0);
            }
            _ => panic!("expected list command"),
        }
    }
}
