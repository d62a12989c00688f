//! Sequence numbering, the current quote and the bounded history, on top of
//! any [`KeyValueStore`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use orcamento_core::amount::coerce_count;
use orcamento_core::clock::{Clock, SystemClock};
use orcamento_core::domain::history::{HistoryEntry, HistorySummary, SequenceState, HISTORY_LIMIT};
use orcamento_core::domain::quote::Quote;
use orcamento_core::format::format_bytes;

use crate::repositories::{KeyValueStore, StorageError};

pub const CURRENT_QUOTE_KEY: &str = "current-quote";
pub const LAST_NUMBER_KEY: &str = "last-number";
pub const HISTORY_KEY: &str = "history";
const AVAILABILITY_CHECK_KEY: &str = "__orcamento_check__";

/// Whole-store backup. On import only the parts present are written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreBackup {
    #[serde(default)]
    pub current: Option<Quote>,
    #[serde(default)]
    pub last_number: Option<u64>,
    #[serde(default)]
    pub history: Option<Vec<HistoryEntry>>,
    pub exported_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub total_entries: usize,
    pub latest: Option<HistorySummary>,
    pub has_current: bool,
    pub storage_bytes: u64,
    pub storage_size: String,
    pub last_update: Option<DateTime<Utc>>,
}

pub struct QuoteStore<S, C = SystemClock> {
    store: S,
    clock: C,
}

impl<S: KeyValueStore> QuoteStore<S> {
    pub fn new(store: S) -> Self {
        Self { store, clock: SystemClock }
    }
}

impl<S: KeyValueStore, C: Clock> QuoteStore<S, C> {
    pub fn with_clock(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn backend(&self) -> &S {
        &self.store
    }

    /// Last committed number. Missing, unreadable or non-numeric state is 0.
    pub fn sequence(&self) -> SequenceState {
        let last_number = match self.store.get(LAST_NUMBER_KEY) {
            Ok(Some(raw)) => coerce_count(&raw),
            Ok(None) => 0,
            Err(error) => {
                warn!(
                    event_name = "storage.sequence.read_failed",
                    error = %error,
                    "could not read last number, numbering restarts at 1"
                );
                0
            }
        };
        SequenceState { last_number }
    }

    /// Read-only: previewing a quote never consumes a number.
    pub fn next_number(&self) -> u64 {
        self.sequence().next_number()
    }

    pub fn commit(&self, quote: &Quote) -> Result<HistoryEntry, StorageError> {
        let now = self.clock.now();

        let previous_current = self.store.get(CURRENT_QUOTE_KEY)?;
        let previous_number = self.store.get(LAST_NUMBER_KEY)?;
        let mut history = match self.read_history() {
            Ok(history) => history,
            Err(StorageError::Corrupt { detail, .. }) => {
                warn!(
                    event_name = "storage.history.discarded",
                    detail = %detail,
                    "stored history is unreadable, starting a new one"
                );
                Vec::new()
            }
            Err(error) => return Err(error),
        };

        let id = next_history_id(now, history.first());
        let entry = HistoryEntry::from_quote(id, quote, now);
        history.insert(0, entry.clone());
        history.truncate(HISTORY_LIMIT);

        let current_json = serde_json::to_string(quote)?;
        let history_json = serde_json::to_string(&history)?;
        let number = quote.metadata.number.to_string();

        self.store.set(CURRENT_QUOTE_KEY, &current_json)?;

        if let Err(error) = self.store.set(LAST_NUMBER_KEY, &number) {
            self.restore(CURRENT_QUOTE_KEY, previous_current);
            return Err(self.commit_failed(error));
        }

        if let Err(error) = self.store.set(HISTORY_KEY, &history_json) {
            self.restore(LAST_NUMBER_KEY, previous_number);
            self.restore(CURRENT_QUOTE_KEY, previous_current);
            return Err(self.commit_failed(error));
        }

        info!(
            event_name = "storage.commit.completed",
            history_id = id,
            quote_number = quote.metadata.number,
            history_len = history.len(),
            "quote committed"
        );
        Ok(entry)
    }

    fn commit_failed(&self, error: StorageError) -> StorageError {
        warn!(
            event_name = "storage.commit.failed",
            error = %error,
            "quote commit failed, previous values restored where possible"
        );
        error
    }

    fn restore(&self, key: &str, previous: Option<String>) {
        let result = match previous {
            Some(value) => self.store.set(key, &value),
            None => self.store.remove(key),
        };
        if let Err(error) = result {
            warn!(
                event_name = "storage.commit.restore_failed",
                key,
                error = %error,
                "could not restore previous value"
            );
        }
    }

    pub fn load_current(&self) -> Result<Option<Quote>, StorageError> {
        let Some(raw) = self.store.get(CURRENT_QUOTE_KEY)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw).map(Some).map_err(|error| StorageError::Corrupt {
            key: CURRENT_QUOTE_KEY.to_string(),
            detail: error.to_string(),
        })
    }

    /// Most recent first.
    pub fn history(&self) -> Result<Vec<HistoryEntry>, StorageError> {
        self.read_history()
    }

    fn read_history(&self) -> Result<Vec<HistoryEntry>, StorageError> {
        let Some(raw) = self.store.get(HISTORY_KEY)? else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&raw).map_err(|error| StorageError::Corrupt {
            key: HISTORY_KEY.to_string(),
            detail: error.to_string(),
        })
    }

    pub fn load_history_entry(&self, id: i64) -> Result<Option<HistoryEntry>, StorageError> {
        Ok(self.read_history()?.into_iter().find(|entry| entry.id == id))
    }

    /// `Ok(None)` when no entry has `id`; the stored history is then left as is.
    pub fn remove_history_entry(&self, id: i64) -> Result<Option<HistoryEntry>, StorageError> {
        let mut history = self.read_history()?;
        let Some(position) = history.iter().position(|entry| entry.id == id) else {
            return Ok(None);
        };

        let removed = history.remove(position);
        self.store.set(HISTORY_KEY, &serde_json::to_string(&history)?)?;
        info!(
            event_name = "storage.history.entry_removed",
            history_id = id,
            history_len = history.len(),
            "history entry removed"
        );
        Ok(Some(removed))
    }

    /// Erases the current quote, the sequence and the history. Every key is
    /// attempted; the first failure is returned.
    pub fn clear_all(&self) -> Result<(), StorageError> {
        let mut first_error = None;
        for key in [CURRENT_QUOTE_KEY, LAST_NUMBER_KEY, HISTORY_KEY] {
            if let Err(error) = self.store.remove(key) {
                first_error.get_or_insert(error);
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => {
                info!(event_name = "storage.cleared", "all stored quote data removed");
                Ok(())
            }
        }
    }

    pub fn export_backup(&self) -> Result<StoreBackup, StorageError> {
        let last_number = self.store.get(LAST_NUMBER_KEY)?.map(|raw| coerce_count(&raw));
        Ok(StoreBackup {
            current: self.load_current()?,
            last_number,
            history: Some(self.read_history()?),
            exported_at: self.clock.now(),
        })
    }

    pub fn import_backup(&self, backup: &StoreBackup) -> Result<(), StorageError> {
        if let Some(current) = &backup.current {
            self.store.set(CURRENT_QUOTE_KEY, &serde_json::to_string(current)?)?;
        }
        if let Some(last_number) = backup.last_number {
            self.store.set(LAST_NUMBER_KEY, &last_number.to_string())?;
        }
        if let Some(history) = &backup.history {
            let bounded = &history[..history.len().min(HISTORY_LIMIT)];
            self.store.set(HISTORY_KEY, &serde_json::to_string(bounded)?)?;
        }

        info!(
            event_name = "storage.backup.imported",
            has_current = backup.current.is_some(),
            has_last_number = backup.last_number.is_some(),
            history_len = backup.history.as_ref().map(Vec::len).unwrap_or(0),
            "backup imported"
        );
        Ok(())
    }

    /// Writes and removes a marker key.
    pub fn is_available(&self) -> bool {
        let written = self
            .store
            .set(AVAILABILITY_CHECK_KEY, AVAILABILITY_CHECK_KEY)
            .and_then(|()| self.store.remove(AVAILABILITY_CHECK_KEY));
        if let Err(error) = &written {
            warn!(event_name = "storage.check.failed", error = %error, "storage is not writable");
        }
        written.is_ok()
    }

    pub fn stats(&self) -> Result<StoreStats, StorageError> {
        let history = self.read_history()?;
        let storage_bytes: u64 = self
            .store
            .entries()?
            .iter()
            .map(|(key, value)| (key.len() + value.len()) as u64)
            .sum();
        let latest = history.first().map(HistorySummary::from);

        Ok(StoreStats {
            total_entries: history.len(),
            last_update: latest.as_ref().map(|summary| summary.created_at),
            latest,
            has_current: self.store.get(CURRENT_QUOTE_KEY)?.is_some(),
            storage_bytes,
            storage_size: format_bytes(storage_bytes),
        })
    }
}

/// Millisecond timestamp, bumped past the newest entry so ids stay unique
/// even for commits within the same millisecond.
fn next_history_id(now: DateTime<Utc>, newest: Option<&HistoryEntry>) -> i64 {
    let candidate = now.timestamp_millis();
    match newest {
        Some(entry) if entry.id >= candidate => entry.id + 1,
        _ => candidate,
    }
}
