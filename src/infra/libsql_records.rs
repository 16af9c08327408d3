//! Turso/libSQL-backed record store.

use crate::app::ports::{RecordStore, RecordTransaction};
use crate::error::{AssetError, Result};
use async_trait::async_trait;
use libsql::{Builder, Connection, Database};
use std::env;
use tracing::info;

pub struct LibsqlRecordStore {
    db: Database,
}

impl LibsqlRecordStore {
    /// Create a new record store with connection to Turso
    pub async fn new() -> Result<Self> {
        let url = env::var("LIBSQL_URL").map_err(|_| AssetError::Persistence {
            message: "LIBSQL_URL environment variable not set".to_string(),
        })?;

        let auth_token = env::var("LIBSQL_AUTH_TOKEN").map_err(|_| AssetError::Persistence {
            message: "LIBSQL_AUTH_TOKEN environment variable not set".to_string(),
        })?;

        info!("Connecting to Turso database at {}", url);

        let db = Builder::new_remote(url, auth_token)
            .build()
            .await
            .map_err(|e| AssetError::Persistence {
                message: format!("Failed to connect to database: {e}"),
            })?;

        Ok(Self { db })
    }

    fn connection(&self) -> Result<Connection> {
        self.db.connect().map_err(|e| AssetError::Persistence {
            message: format!("Failed to get database connection: {e}"),
        })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations...");

        let conn = self.connection()?;
        let migration_sql = include_str!("../../migrations/001_create_records.sql");

        conn.execute_batch(migration_sql)
            .await
            .map_err(|e| AssetError::Persistence {
                message: format!("Failed to run migrations: {e}"),
            })?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Create or reset a record outside the lifecycle operations
    /// (record CRUD lives elsewhere; this exists for seeding).
    pub async fn upsert_record(&self, identifier: &str, references: &[String]) -> Result<()> {
        let conn = self.connection()?;
        let assets = serde_json::to_string(references)?;
        conn.execute(
            "INSERT INTO records (identifier, assets) VALUES (?1, ?2) \
             ON CONFLICT(identifier) DO UPDATE SET assets = ?2, updated_at = datetime('now')",
            libsql::params![identifier, assets],
        )
        .await
        .map_err(|e| AssetError::Persistence {
            message: format!("Failed to upsert record: {e}"),
        })?;
        Ok(())
    }
}

pub struct LibsqlRecordTransaction {
    conn: Connection,
}

#[async_trait]
impl RecordStore for LibsqlRecordStore {
    async fn begin(&self) -> Result<Box<dyn RecordTransaction>> {
        let conn = self.connection()?;
        conn.execute("BEGIN IMMEDIATE", ())
            .await
            .map_err(|e| AssetError::Persistence {
                message: format!("Failed to begin transaction: {e}"),
            })?;
        Ok(Box::new(LibsqlRecordTransaction { conn }))
    }
}

#[async_trait]
impl RecordTransaction for LibsqlRecordTransaction {
    async fn fetch_references(&mut self, identifier: &str) -> Result<Option<Vec<String>>> {
        let mut rows = self
            .conn
            .query(
                "SELECT assets FROM records WHERE identifier = ?1",
                libsql::params![identifier],
            )
            .await
            .map_err(|e| AssetError::Persistence {
                message: format!("Failed to query record: {e}"),
            })?;

        let Some(row) = rows.next().await.map_err(|e| AssetError::Persistence {
            message: format!("Failed to read row: {e}"),
        })?
        else {
            return Ok(None);
        };

        let assets: String = row.get(0).map_err(|e| AssetError::Persistence {
            message: format!("Failed to get assets column: {e}"),
        })?;
        let references: Vec<String> = serde_json::from_str(&assets)?;
        Ok(Some(references))
    }

    async fn store_references(&mut self, identifier: &str, references: &[String]) -> Result<()> {
        let assets = serde_json::to_string(references)?;
        self.conn
            .execute(
                "UPDATE records SET assets = ?1, updated_at = datetime('now') WHERE identifier = ?2",
                libsql::params![assets, identifier],
            )
            .await
            .map_err(|e| AssetError::Persistence {
                message: format!("Failed to update record: {e}"),
            })?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.conn
            .execute("COMMIT", ())
            .await
            .map_err(|e| AssetError::Persistence {
                message: format!("Failed to commit transaction: {e}"),
            })?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.conn
            .execute("ROLLBACK", ())
            .await
            .map_err(|e| AssetError::Persistence {
                message: format!("Failed to roll back transaction: {e}"),
            })?;
        Ok(())
    }
}
