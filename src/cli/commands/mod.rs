use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::actions::MeldingService;
use crate::config::{config, StoreBackend};
use crate::database::init_database;
use crate::melding::{Catalog, Melding, PublicIdGenerator, TokenGenerator};
use crate::repository::{FileMeldingRepository, InMemoryMeldingRepository, MeldingRepository};

pub mod back_office;
pub mod create;
pub mod melder;
pub mod table;

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}

/// Build the melding service from the global configuration.
pub async fn build_service() -> Result<MeldingService> {
    let config = config()?;

    let catalog = if config.catalog_path.exists() {
        Catalog::load(&config.catalog_path).await?
    } else {
        warn!(
            path = %config.catalog_path.display(),
            "Catalog not found, no melding will be classified"
        );
        Catalog::default()
    };

    let repository: Arc<dyn MeldingRepository> = match config.store.backend {
        StoreBackend::Memory => Arc::new(InMemoryMeldingRepository::new()),
        StoreBackend::File => Arc::new(FileMeldingRepository::new(&config.store.path)?),
        StoreBackend::Sqlite => init_database().await?.ok_or_else(|| {
            anyhow::anyhow!(
                "sqlite store selected but no database is available; configure [database] \
                 and build with --features database"
            )
        })?,
    };

    Ok(MeldingService::new(repository, Arc::new(catalog))
        .with_token_generator(TokenGenerator::new(config.token.length, config.token_duration()))
        .with_public_id_generator(PublicIdGenerator::new(config.token.public_id_length)))
}

pub async fn with_service<F, Fut, R>(f: F) -> Result<R>
where
    F: FnOnce(MeldingService) -> Fut,
    Fut: std::future::Future<Output = Result<R>>,
{
    let service = build_service().await?;
    f(service).await
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Human-readable melding summary.
pub fn print_melding(melding: &Melding) {
    println!("📋 Melding #{} ({})", melding.id, melding.public_id);
    println!("   State: {}", melding.state);
    println!("   Text: {}", melding.text);
    if let Some(classification_id) = melding.classification_id {
        println!("   Classification: {classification_id}");
    }
    if !melding.answers.is_empty() {
        println!("   Answers: {}", melding.answers.len());
    }
    if !melding.attachments.is_empty() {
        let names: Vec<_> = melding
            .attachments
            .iter()
            .map(|a| format!("{} (#{})", a.original_filename, a.id))
            .collect();
        println!("   Attachments: {}", names.join(", "));
    }
    if !melding.assets.is_empty() {
        let ids: Vec<_> = melding.assets.iter().map(|a| a.external_id.as_str()).collect();
        println!("   Assets: {}", ids.join(", "));
    }
    if let Some((lat, lon)) = melding.geo_location.as_ref().and_then(|g| g.anchor()) {
        println!("   Location: {lat}, {lon}");
    }
    if let Some(phone) = &melding.phone {
        println!("   Phone: {phone}");
    }
    if let Some(email) = &melding.email {
        println!("   Email: {email}");
    }
    println!("   Updated: {}", melding.updated_at.to_rfc3339());
}

pub fn print_result(melding: &Melding, json: bool) -> Result<()> {
    if json {
        print_json(&melding.redacted())
    } else {
        print_melding(melding);
        Ok(())
    }
}

pub async fn show_how_to_report() -> Result<()> {
    println!("🏙️  Meldingen - municipal issue reporting");
    println!();
    println!("As a melder:");
    println!("  📝 meldingen create \"<what is wrong>\"        # File a melding, note the token");
    println!("  ❓ meldingen answer <id> --token T <q> <value>");
    println!("  📎 meldingen attach <id> --token T <file>");
    println!("  📍 meldingen locate <id> --token T --lat .. --lon ..");
    println!("  ☎️  meldingen contact <id> --token T --email ..");
    println!("  ✅ meldingen finish <id> --token T <STEP>");
    println!();
    println!("Back office:");
    println!("  📊 meldingen list --state submitted");
    println!("  🔀 meldingen transitions <id>");
    println!("  ⚙️  meldingen process <id> PROCESS");
    println!();
    println!("💡 'meldingen table' prints every step and where it may start from.");
    Ok(())
}
