use bytes::Bytes;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::backend::QueryService;
use crate::builder::{self, Literal};
use crate::error::HrError;
use crate::executor::StatementExecutor;
use crate::schema::Table;
use crate::snapshot;
use crate::storage::BlobStore;
use crate::verbose::Timer;

pub const BACKUP_PREFIX: &str = "backups";
pub const KEY_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
pub const SNAPSHOT_EXTENSION: &str = "parquet";

// Upper bound on how far a key may be pushed past the current second.
const MAX_KEY_ATTEMPTS: i64 = 3600;

/// Key for a snapshot of `table` taken at `at`.
pub fn backup_key(table: Table, at: DateTime<Utc>) -> String {
    format!(
        "{}/{}/{}.{}",
        BACKUP_PREFIX,
        table,
        at.format(KEY_TIMESTAMP_FORMAT),
        SNAPSHOT_EXTENSION
    )
}

/// Prefix shared by every backup key of `table`.
pub fn backup_prefix(table: Table) -> String {
    format!("{BACKUP_PREFIX}/{table}/")
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackupReceipt {
    pub table: String,
    pub backup_key: String,
    pub rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestoreSummary {
    pub table: String,
    pub backup_key: String,
    pub rows: usize,
    pub chunks: usize,
}

/// Backs tables up to blob storage and restores them.
///
/// Restore empties the table with an unconditional `DELETE`, then re-inserts the
/// snapshot in fixed-size chunks. Each statement commits on its own, so a failed
/// chunk leaves the table partially repopulated and returns
/// [`HrError::PartialRestore`].
pub struct BackupOrchestrator<'a, S> {
    executor: &'a StatementExecutor<S>,
    blobs: &'a BlobStore,
    db_schema: &'a str,
    chunk_size: usize,
    clock: fn() -> DateTime<Utc>,
}

impl<'a, S: QueryService + Sync> BackupOrchestrator<'a, S> {
    pub fn new(executor: &'a StatementExecutor<S>, blobs: &'a BlobStore, db_schema: &'a str) -> Self {
        Self {
            executor,
            blobs,
            db_schema,
            chunk_size: builder::DEFAULT_CHUNK_SIZE,
            clock: Utc::now,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Snapshot the whole table and store it under a fresh key.
    pub async fn backup(&self, table: Table) -> Result<BackupReceipt, HrError> {
        let timer = Timer::start();
        let target = table.qualified(self.db_schema);

        let result = self
            .executor
            .execute(&format!("SELECT * FROM {target}"))
            .await?;
        let data = snapshot::encode(table.name(), &result)?;

        let size = data.len();
        let key = self.store_new(table, Bytes::from(data)).await?;

        info!(
            table = %table,
            key = %key,
            rows = result.count,
            bytes = size,
            elapsed_ms = timer.elapsed_ms() as u64,
            "backup written"
        );
        Ok(BackupReceipt {
            table: table.to_string(),
            backup_key: key,
            rows: result.count,
        })
    }

    /// Replace the table's contents with the snapshot stored under `key`.
    pub async fn restore(&self, table: Table, key: &str) -> Result<RestoreSummary, HrError> {
        let timer = Timer::start();
        let prefix = backup_prefix(table);
        if !key.starts_with(&prefix) {
            return Err(HrError::invalid(format!(
                "backup key {key} does not belong to table {table}"
            )));
        }

        let data = self.blobs.get(key).await?;
        let snap = snapshot::decode(data)?;
        if snap.table != table.name() {
            return Err(HrError::invalid(format!(
                "backup {key} holds table {}, not {table}",
                snap.table
            )));
        }

        let known = table.schema().column_names();
        let columns = snap
            .columns()
            .into_iter()
            .map(|c| {
                known
                    .iter()
                    .copied()
                    .find(|k| *k == c)
                    .ok_or_else(|| {
                        HrError::invalid(format!("backup column {c} is not a column of {table}"))
                    })
            })
            .collect::<Result<Vec<&'static str>, _>>()?;

        if snap.is_empty() {
            warn!(table = %table, key = %key, "backup holds no records, table left untouched");
            return Ok(RestoreSummary {
                table: table.to_string(),
                backup_key: key.to_string(),
                rows: 0,
                chunks: 0,
            });
        }

        let rows = snap
            .records
            .into_iter()
            .map(|record| record.into_iter().map(Literal::from).collect::<Vec<_>>())
            .collect::<Vec<_>>();
        let target = table.qualified(self.db_schema);
        let statements =
            builder::build_chunked_inserts(&target, &columns, &rows, self.chunk_size);
        let chunk_lens = rows.chunks(self.chunk_size).map(<[_]>::len);

        self.executor
            .execute(&format!("DELETE FROM {target}"))
            .await?;
        debug!(table = %table, "table emptied for restore");

        let chunks_total = statements.len();
        let mut rows_applied = 0;
        for (i, (sql, len)) in statements.iter().zip(chunk_lens).enumerate() {
            if let Err(e) = self.executor.execute(sql).await {
                warn!(
                    table = %table,
                    chunk = i,
                    rows_applied,
                    error = %e,
                    "restore chunk failed, table left partially restored"
                );
                return Err(HrError::PartialRestore {
                    table: table.to_string(),
                    chunks_applied: i,
                    chunks_total,
                    rows_applied,
                    cause: e.to_string(),
                });
            }
            rows_applied += len;
            debug!(table = %table, chunk = i + 1, of = chunks_total, "chunk inserted");
        }

        info!(
            table = %table,
            key = %key,
            rows = rows_applied,
            chunks = chunks_total,
            elapsed_ms = timer.elapsed_ms() as u64,
            "restore complete"
        );
        Ok(RestoreSummary {
            table: table.to_string(),
            backup_key: key.to_string(),
            rows: rows_applied,
            chunks: chunks_total,
        })
    }

    /// Backup keys for `table`, oldest first.
    pub async fn list(&self, table: Table) -> Result<Vec<String>, HrError> {
        self.blobs.list(&backup_prefix(table)).await
    }

    // Claims the first free key at or after the current second. The claim and
    // the write are one create-only put, so concurrent backups never share a key.
    async fn store_new(&self, table: Table, data: Bytes) -> Result<String, HrError> {
        let now = (self.clock)();
        for offset in 0..MAX_KEY_ATTEMPTS {
            let key = backup_key(table, now + TimeDelta::seconds(offset));
            if self.blobs.put_new(&key, data.clone()).await? {
                return Ok(key);
            }
            debug!(table = %table, key = %key, "backup key taken, trying next second");
        }
        Err(HrError::Storage {
            message: format!("no free backup key for {table} within {MAX_KEY_ATTEMPTS}s"),
        })
    }
}
