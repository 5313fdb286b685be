use anyhow::Result;
use clap::Parser;

use meldingen::cli::commands::back_office::{ListCommand, ProcessCommand, ShowCommand, TransitionsCommand};
use meldingen::cli::commands::create::CreateCommand;
use meldingen::cli::commands::melder::{
    AnswerCommand, AssetCommand, AttachCommand, ContactCommand, DetachCommand, FinishCommand,
    LocateCommand, UpdateCommand,
};
use meldingen::cli::commands::table::TableCommand;
use meldingen::cli::commands::{show_how_to_report, Command};
use meldingen::cli::{AssetCommands, Cli, Commands};
use meldingen::{config, init_telemetry, lifecycle_metrics, shutdown_telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = config()?;
    init_telemetry(&config.observability)?;

    let result = run(cli).await;

    lifecycle_metrics().log_stats();
    shutdown_telemetry();
    result
}

async fn run(cli: Cli) -> Result<()> {
    let json = cli.json;

    match cli.command {
        // Default behavior: no subcommand - explain how to file a melding
        None => show_how_to_report().await,
        Some(Commands::Create { text }) => CreateCommand::new(text).with_json(json).execute().await,
        Some(Commands::Update { id, token, text }) => {
            UpdateCommand { id, token, text, json }.execute().await
        }
        Some(Commands::Answer {
            id,
            token,
            question_id,
            value,
            kind,
            label,
        }) => {
            AnswerCommand {
                id,
                token,
                question_id,
                value,
                kind,
                label,
                json,
            }
            .execute()
            .await
        }
        Some(Commands::Attach { id, token, filename }) => {
            AttachCommand { id, token, filename, json }.execute().await
        }
        Some(Commands::Detach {
            id,
            token,
            attachment_id,
        }) => {
            DetachCommand {
                id,
                token,
                attachment_id,
                json,
            }
            .execute()
            .await
        }
        Some(Commands::Locate {
            id,
            token,
            lat,
            lon,
            geojson,
        }) => {
            LocateCommand {
                id,
                token,
                lat,
                lon,
                geojson,
                json,
            }
            .execute()
            .await
        }
        Some(Commands::Contact {
            id,
            token,
            phone,
            email,
        }) => {
            ContactCommand {
                id,
                token,
                phone,
                email,
                json,
            }
            .execute()
            .await
        }
        Some(Commands::Asset { command }) => {
            let (id, token, external_id, remove) = match command {
                AssetCommands::Add { id, token, external_id } => (id, token, external_id, false),
                AssetCommands::Remove { id, token, external_id } => (id, token, external_id, true),
            };
            AssetCommand {
                id,
                token,
                external_id,
                remove,
                json,
            }
            .execute()
            .await
        }
        Some(Commands::Finish { id, token, step }) => {
            FinishCommand { id, token, step, json }.execute().await
        }
        Some(Commands::Show { id, token }) => ShowCommand { id, token, json }.execute().await,
        Some(Commands::List { state, limit, offset }) => {
            ListCommand {
                state,
                limit,
                offset,
                json,
            }
            .execute()
            .await
        }
        Some(Commands::Transitions { id }) => TransitionsCommand { id, json }.execute().await,
        Some(Commands::Process { id, transition }) => {
            ProcessCommand { id, transition, json }.execute().await
        }
        Some(Commands::Table) => TableCommand { json }.execute().await,
    }
}
