//! Local streak ledger. Used when no activity calendar is available: the streak is advanced one
//! run at a time from the persisted `{current_streak, last_active_date}` pair and today's count.
//!
//! The ledger only knows about days on which the program actually ran. If runs are skipped while
//! the user keeps contributing, it will disagree with the calendar. That's accepted.

use std::{
    future::Future,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::Result;
use chrono::NaiveDate;
use fs4::tokio::AsyncFileExt;
use serde::{Deserialize, Serialize};
use tokio::fs::File;
use tracing::{debug, info, warn};

use crate::{
    errors::LedgerCorruptionError,
    fs::operations::{sibling_with_suffix, write_atomically},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreakLedgerRecord {
    #[serde(alias = "streak")]
    pub current_streak: u32,
    pub last_active_date: Option<NaiveDate>,
}

impl StreakLedgerRecord {
    fn started(today: NaiveDate) -> Self {
        Self {
            current_streak: 1,
            last_active_date: Some(today),
        }
    }

    /// Applies one run's observation to the record.
    ///
    /// | today_count | last_active_date        | result              |
    /// |-------------|-------------------------|---------------------|
    /// | > 0         | absent or before today-1| streak 1, last today|
    /// | > 0         | today - 1               | streak + 1          |
    /// | > 0         | today (or later)        | unchanged           |
    /// | 0           | before today - 1        | streak 0            |
    /// | 0           | otherwise               | unchanged           |
    pub fn advance(self, today: NaiveDate, today_count: u32) -> Self {
        match (today_count > 0, self.last_active_date) {
            (true, None) => Self::started(today),
            (true, Some(last)) => match (today - last).num_days() {
                1 => Self {
                    current_streak: self.current_streak.saturating_add(1),
                    last_active_date: Some(today),
                },
                gap if gap <= 0 => self,
                _ => Self::started(today),
            },
            (false, Some(last)) if (today - last).num_days() > 1 => Self {
                current_streak: 0,
                ..self
            },
            (false, _) => self,
        }
    }
}

/// Interface for abstracting where the ledger lives.
pub trait LedgerStore {
    /// Reads the current record. Missing or broken storage gives the default record.
    fn load(&self) -> impl Future<Output = StreakLedgerRecord>;

    /// Reads, transforms and writes back the record as one critical section. Returns the record
    /// that is stored after the call.
    fn update<F>(&self, transition: F) -> impl Future<Output = Result<StreakLedgerRecord>>
    where
        F: FnOnce(StreakLedgerRecord) -> StreakLedgerRecord;
}

/// Keeps the ledger as a small JSON file. Writers serialize on an exclusive lock of a sibling
/// `.lock` file, the record itself is replaced atomically.
pub struct FileLedgerStore {
    path: PathBuf,
}

impl FileLedgerStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn open_lock(&self) -> Result<File, std::io::Error> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        File::options()
            .write(true)
            .create(true)
            .read(true)
            .truncate(false)
            .open(sibling_with_suffix(&self.path, ".lock"))
            .await
    }

    async fn read_record(&self) -> Result<Option<StreakLedgerRecord>, LedgerCorruptionError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Reads the record, falling back to the default. The flag is `true` when what is on disk
    /// can be kept as is, a missing or broken file has to be written out again.
    async fn read_or_default(&self) -> (StreakLedgerRecord, bool) {
        match self.read_record().await {
            Ok(Some(record)) => (record, true),
            Ok(None) => {
                debug!("No ledger at {:?}, starting fresh", self.path);
                (StreakLedgerRecord::default(), false)
            }
            Err(e) => {
                warn!("Ledger at {:?} can't be used, resetting it: {e}", self.path);
                (StreakLedgerRecord::default(), false)
            }
        }
    }

    async fn update_locked<F>(&self, transition: F) -> Result<StreakLedgerRecord>
    where
        F: FnOnce(StreakLedgerRecord) -> StreakLedgerRecord,
    {
        let (current, usable) = self.read_or_default().await;
        let next = transition(current);
        if next != current || !usable {
            write_atomically(&self.path, &serde_json::to_vec_pretty(&next)?).await?;
            info!("Ledger updated from {current:?} to {next:?}");
        }
        Ok(next)
    }
}

impl LedgerStore for FileLedgerStore {
    async fn load(&self) -> StreakLedgerRecord {
        // Reading never creates anything on disk
        if !self.path.exists() {
            debug!("No ledger at {:?}, using the default record", self.path);
            return StreakLedgerRecord::default();
        }
        let lock = match self.open_lock().await {
            Ok(lock) => lock,
            Err(e) => {
                warn!("Reading ledger without a lock: {e}");
                return self.read_or_default().await.0;
            }
        };
        if let Err(e) = lock.lock_shared() {
            warn!("Reading ledger without a lock: {e}");
            return self.read_or_default().await.0;
        }
        let (record, _) = self.read_or_default().await;
        if let Err(e) = lock.unlock_async().await {
            warn!("Failed to release ledger lock: {e}");
        }
        record
    }

    async fn update<F>(&self, transition: F) -> Result<StreakLedgerRecord>
    where
        F: FnOnce(StreakLedgerRecord) -> StreakLedgerRecord,
    {
        let lock = self.open_lock().await?;
        // Held until the new record is in place
        lock.lock_exclusive()?;
        let result = self.update_locked(transition).await;
        lock.unlock_async().await?;
        result
    }
}
