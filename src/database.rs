#[cfg(feature = "database")]
use async_trait::async_trait;
#[cfg(feature = "database")]
use sqlx::{migrate::MigrateDatabase, Row, SqlitePool};
#[cfg(feature = "database")]
use tracing::{debug, info};

#[cfg(feature = "database")]
use crate::melding::{Melding, MeldingId};
#[cfg(feature = "database")]
use crate::repository::{MeldingFilter, MeldingRepository, RepositoryError};

#[cfg(feature = "database")]
/// SQLite-backed melding repository. The melding itself is stored as a JSON
/// payload; id, state and version are columns so saves and filters stay in SQL.
pub struct SqliteMeldingRepository {
    pool: SqlitePool,
}

#[cfg(feature = "database")]
impl SqliteMeldingRepository {
    /// Open the database, creating it and running migrations when asked to
    pub async fn new(database_url: &str, auto_migrate: bool) -> Result<Self, RepositoryError> {
        if !sqlx::Sqlite::database_exists(database_url).await? {
            info!("Creating database at {}", database_url);
            sqlx::Sqlite::create_database(database_url).await?;
        }

        let pool = SqlitePool::connect(database_url).await?;

        if auto_migrate {
            info!("Running database migrations...");
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .map_err(|e| RepositoryError::Storage {
                    reason: format!("migration failed: {e}"),
                })?;
            info!("Database migrations completed");
        }

        Ok(Self { pool })
    }

    fn decode(payload: &str, version: i64) -> Result<Melding, RepositoryError> {
        let mut melding: Melding = serde_json::from_str(payload)?;
        melding.version = version as u64;
        Ok(melding)
    }
}

#[cfg(feature = "database")]
#[async_trait]
impl MeldingRepository for SqliteMeldingRepository {
    async fn insert(&self, mut melding: Melding) -> Result<Melding, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            INSERT INTO meldingen (state, version, payload, created_at, updated_at)
            VALUES (?1, 1, '{}', ?2, ?3)
            RETURNING id
            "#,
        )
        .bind(melding.state.as_str())
        .bind(melding.created_at.to_rfc3339())
        .bind(melding.updated_at.to_rfc3339())
        .fetch_one(&mut *tx)
        .await?;

        let id: i64 = row.get("id");
        melding.id = id as MeldingId;
        melding.version = 1;

        sqlx::query("UPDATE meldingen SET payload = ?1 WHERE id = ?2")
            .bind(serde_json::to_string(&melding)?)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        debug!(melding_id = %melding.id, "Melding inserted");
        Ok(melding)
    }

    async fn get(&self, id: MeldingId) -> Result<Melding, RepositoryError> {
        let row = sqlx::query("SELECT payload, version FROM meldingen WHERE id = ?1")
            .bind(id as i64)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepositoryError::NotFound { id })?;

        Self::decode(row.get("payload"), row.get("version"))
    }

    async fn save(&self, melding: &Melding) -> Result<Melding, RepositoryError> {
        let mut updated = melding.clone();
        updated.version += 1;

        // The version predicate makes check-and-write a single statement
        let result = sqlx::query(
            r#"
            UPDATE meldingen
            SET state = ?1, version = ?2, payload = ?3, updated_at = ?4
            WHERE id = ?5 AND version = ?6
            "#,
        )
        .bind(updated.state.as_str())
        .bind(updated.version as i64)
        .bind(serde_json::to_string(&updated)?)
        .bind(updated.updated_at.to_rfc3339())
        .bind(melding.id as i64)
        .bind(melding.version as i64)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let stored = self.get(melding.id).await?;
            return Err(RepositoryError::Conflict {
                id: melding.id,
                expected: melding.version,
                found: stored.version,
            });
        }

        debug!(melding_id = %updated.id, version = updated.version, "Melding saved");
        Ok(updated)
    }

    async fn list(&self, filter: &MeldingFilter) -> Result<Vec<Melding>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT payload, version
            FROM meldingen
            WHERE ?1 IS NULL OR state = ?1
            ORDER BY id ASC
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(filter.state.map(|s| s.as_str()))
        .bind(filter.limit.map(|l| l as i64).unwrap_or(-1))
        .bind(filter.offset as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| Self::decode(row.get("payload"), row.get("version")))
            .collect()
    }
}

#[cfg(feature = "database")]
/// Open the configured database, if any
pub async fn init_database() -> anyhow::Result<Option<std::sync::Arc<dyn MeldingRepository>>> {
    let config = crate::config::config()?;

    match &config.database {
        Some(db_config) => {
            info!("Initializing database at {}", db_config.url);
            let repository =
                SqliteMeldingRepository::new(&db_config.url, db_config.auto_migrate).await?;
            info!("Database initialized successfully");
            Ok(Some(std::sync::Arc::new(repository)))
        }
        None => {
            info!("Database not configured, skipping initialization");
            Ok(None)
        }
    }
}

// Stub implementation for when database feature is not enabled
#[cfg(not(feature = "database"))]
pub async fn init_database(
) -> anyhow::Result<Option<std::sync::Arc<dyn crate::repository::MeldingRepository>>> {
    tracing::info!("Database feature not enabled, skipping database initialization");
    Ok(None)
}
