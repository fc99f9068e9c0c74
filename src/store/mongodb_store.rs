use std::time::Duration;

use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::{ClientOptions, FindOptions};
use mongodb::{Client, Database};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::models::{AgentEntry, BackupEntry, PitrStatus, StatusSnapshot};
use crate::store::{ScrapeError, StatusSource};

/// Connect timeout for the per-scrape MongoDB client. Also used as the
/// server selection timeout so an unreachable store fails the scrape
/// quickly instead of hanging until the HTTP deadline.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Backoff before the single connectivity retry. Covers the common
/// docker-compose case of the exporter starting at the same time as the
/// database.
const CONNECT_RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// Upper bound on backup and agent reads.
const READ_LIMIT: i64 = 10000;

/// Document shape of the single `pbmConfig` document, reduced to the one
/// flag we consume.
#[derive(Deserialize, Debug, Default)]
struct ConfigDocument {
    #[serde(default)]
    pitr: PitrFlag,
}

#[derive(Deserialize, Debug, Default)]
struct PitrFlag {
    #[serde(default)]
    enabled: bool,
}

/// Document shape of `pbmLock` / `pbmLockOp` entries.
#[derive(Deserialize, Debug)]
struct LockDocument {
    hb: EpochSeconds,
}

/// Document shape of `pbmPITRChunks` entries. Only the end timestamp is
/// materialized; the start timestamp is used server-side for sorting.
#[derive(Deserialize, Debug)]
struct ChunkDocument {
    end_ts: EpochSeconds,
}

#[derive(Deserialize, Debug, Default)]
struct EpochSeconds {
    high: i64,
}

/// A concrete `StatusSource` that reads the PBM status collections from
/// the `admin` database of a MongoDB deployment.
///
/// Each `snapshot` call opens its own single-connection client and drops
/// it when the call returns, on every exit path. There is no pooling
/// across scrapes.
pub struct MongoStatusSource {
    uri: String,
}

impl MongoStatusSource {
    pub fn new(uri: impl Into<String>) -> Self {
        MongoStatusSource { uri: uri.into() }
    }

    /// Opens a bounded client and verifies connectivity with a ping,
    /// retrying the ping once after a fixed backoff. Query failures later
    /// on are never retried.
    async fn connect(&self) -> Result<Database, ScrapeError> {
        let mut client_options = ClientOptions::parse(&self.uri)
            .await
            .map_err(|e| ScrapeError::Connect(format!("invalid MongoDB URI: {}", e)))?;

        client_options.app_name = Some("pbm-exporter".to_string());
        client_options.max_pool_size = Some(1);
        client_options.connect_timeout = Some(CONNECT_TIMEOUT);
        client_options.server_selection_timeout = Some(CONNECT_TIMEOUT);

        let client = Client::with_options(client_options)
            .map_err(|e| ScrapeError::Connect(e.to_string()))?;
        let database = client.database("admin");

        // The driver connects lazily, so ping to surface connectivity
        // problems here rather than on the first query.
        if let Err(first) = database.run_command(doc! { "ping": 1 }, None).await {
            debug!("Initial ping failed ({}), retrying once", first);
            tokio::time::sleep(CONNECT_RETRY_BACKOFF).await;
            database
                .run_command(doc! { "ping": 1 }, None)
                .await
                .map_err(|e| ScrapeError::Connect(e.to_string()))?;
        }

        Ok(database)
    }

    /// Reads the PITR-enabled flag. A missing config document means PITR
    /// is disabled; any other failure is degraded, not fatal.
    async fn read_pitr_enabled(database: &Database) -> bool {
        match database
            .collection::<ConfigDocument>("pbmConfig")
            .find_one(doc! {}, None)
            .await
        {
            Ok(Some(config)) => config.pitr.enabled,
            Ok(None) => false,
            Err(e) => {
                warn!("Failed to read pbm config, assuming PITR disabled: {}", e);
                false
            }
        }
    }

    /// Reads backup entries, most recent name first. Fatal on failure:
    /// without backup data there are no meaningful metrics to publish.
    async fn read_backups(database: &Database) -> Result<Vec<BackupEntry>, ScrapeError> {
        let options = FindOptions::builder()
            .limit(READ_LIMIT)
            .sort(doc! { "name": -1 })
            .build();

        let mut cursor = database
            .collection::<BackupEntry>("pbmBackups")
            .find(doc! {}, options)
            .await
            .map_err(|e| ScrapeError::Query {
                operation: "find backups",
                cause: e.to_string(),
            })?;

        let mut backups = Vec::new();
        while let Some(backup) = cursor.try_next().await.map_err(|e| ScrapeError::Query {
            operation: "decode backups",
            cause: e.to_string(),
        })? {
            backups.push(backup);
        }

        Ok(backups)
    }

    /// Reads agent entries, sorted by node name. Fatal on failure.
    async fn read_agents(database: &Database) -> Result<Vec<AgentEntry>, ScrapeError> {
        let options = FindOptions::builder()
            .limit(READ_LIMIT)
            .sort(doc! { "n": 1 })
            .build();

        let mut cursor = database
            .collection::<AgentEntry>("pbmAgents")
            .find(doc! {}, options)
            .await
            .map_err(|e| ScrapeError::Query {
                operation: "find agents",
                cause: e.to_string(),
            })?;

        let mut agents = Vec::new();
        while let Some(agent) = cursor.try_next().await.map_err(|e| ScrapeError::Query {
            operation: "decode agents",
            cause: e.to_string(),
        })? {
            agents.push(agent);
        }

        Ok(agents)
    }

    /// Reads PITR lock and chunk state. All reads here are degraded on
    /// failure: a missing lock is a staleness condition, a failed chunk
    /// read just omits the affected fields.
    async fn read_pitr_status(database: &Database) -> PitrStatus {
        // Active PITR lock lives in pbmLock; a pending operation holds it
        // in pbmLockOp instead, so fall back there when the primary
        // registry has no record.
        let lock = match database
            .collection::<LockDocument>("pbmLock")
            .find_one(doc! { "type": "pitr" }, None)
            .await
        {
            Ok(Some(lock)) => Some(lock),
            Ok(None) => match database
                .collection::<LockDocument>("pbmLockOp")
                .find_one(doc! { "type": "pitr" }, None)
                .await
            {
                Ok(lock) => lock,
                Err(e) => {
                    warn!("Failed to read pbmLockOp: {}", e);
                    None
                }
            },
            Err(e) => {
                warn!("Failed to read pbmLock: {}", e);
                None
            }
        };
        let heartbeat = lock.map(|lock| lock.hb.high);

        let chunks = database.collection::<ChunkDocument>("pbmPITRChunks");

        // An estimate is fine here; chunk counts are only trended.
        let chunk_count = match chunks.estimated_document_count(None).await {
            Ok(count) => Some(count),
            Err(e) => {
                warn!("Failed to count PITR chunks: {}", e);
                None
            }
        };

        // Newest chunk = greatest start_ts. The secondary sort on end_ts
        // makes ties deterministic.
        let options = FindOptions::builder()
            .sort(doc! { "start_ts": -1, "end_ts": -1 })
            .limit(1)
            .build();
        let last_chunk_end = match chunks.find(doc! {}, options).await {
            Ok(mut cursor) => match cursor.try_next().await {
                Ok(chunk) => chunk.map(|chunk| chunk.end_ts.high),
                Err(e) => {
                    warn!("Failed to decode last PITR chunk: {}", e);
                    None
                }
            },
            Err(e) => {
                warn!("Failed to read last PITR chunk: {}", e);
                None
            }
        };

        PitrStatus {
            heartbeat,
            chunk_count,
            last_chunk_end,
        }
    }
}

#[async_trait]
impl StatusSource for MongoStatusSource {
    /// Performs the four status reads against a fresh connection and
    /// returns them as one snapshot. The PITR read only runs when the
    /// config flag says PITR is enabled.
    async fn snapshot(&self) -> Result<StatusSnapshot, ScrapeError> {
        let database = self.connect().await?;

        let pitr_enabled = Self::read_pitr_enabled(&database).await;
        let backups = Self::read_backups(&database).await?;
        let agents = Self::read_agents(&database).await?;
        let pitr = if pitr_enabled {
            Some(Self::read_pitr_status(&database).await)
        } else {
            None
        };

        Ok(StatusSnapshot {
            backups,
            agents,
            pitr,
        })
    }
}
