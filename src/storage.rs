/// Key/value storage for tracked threads and settings
///
/// Mirrors chrome.storage: a flat map of keys to JSON values, where every
/// value carries a `type` tag (`COMMENT` or `SETTING`) for filtering.
use std::cell::RefCell;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::{StoreError, StoreResult};
use crate::settings::{SETTING_KEYS, Settings, StorageType};
use crate::tracked::TrackedThread;

pub type Entries = Map<String, Value>;

/// Data access interface into the browser's key/value storage
///
/// Every operation fails with the host's error reason. Nothing is retried.
#[async_trait(?Send)]
pub trait Repository {
    /// Values for whichever of `keys` exist. Absent keys are left out.
    async fn get(&self, keys: &[&str]) -> StoreResult<Entries>;

    /// All entries whose key and record type satisfy `predicate`
    async fn get_all_by(
        &self,
        predicate: &(dyn for<'k> Fn(&'k str, Option<StorageType>) -> bool),
    ) -> StoreResult<Entries>;

    async fn get_all(&self) -> StoreResult<Entries> {
        self.get_all_by(&|_, _| true).await
    }

    /// Overwrite each key with its value and hand back what was saved
    async fn save(&self, entries: Entries) -> StoreResult<Entries>;

    /// True when the store is empty afterwards
    async fn delete_all(&self) -> StoreResult<bool>;

    /// True when none of `keys` remain afterwards
    async fn delete_keys(&self, keys: &[String]) -> StoreResult<bool>;
}

/// In-memory repository, used by tests and as a stand-in outside the browser
#[derive(Debug, Default)]
pub struct MemoryRepository {
    data: RefCell<Entries>,
    next_error: RefCell<Option<String>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Entries) -> Self {
        MemoryRepository {
            data: RefCell::new(entries),
            next_error: RefCell::new(None),
        }
    }

    /// Make the next operation fail with `reason`, like a set last-error
    pub fn fail_next(&self, reason: &str) {
        *self.next_error.borrow_mut() = Some(reason.to_string());
    }

    pub fn len(&self) -> usize {
        self.data.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.borrow().is_empty()
    }

    fn check_error(&self) -> StoreResult<()> {
        match self.next_error.borrow_mut().take() {
            Some(reason) => Err(StoreError::Host(reason)),
            None => Ok(()),
        }
    }
}

#[async_trait(?Send)]
impl Repository for MemoryRepository {
    async fn get(&self, keys: &[&str]) -> StoreResult<Entries> {
        self.check_error()?;
        let data = self.data.borrow();
        Ok(keys
            .iter()
            .filter_map(|key| data.get(*key).map(|value| (key.to_string(), value.clone())))
            .collect())
    }

    async fn get_all_by(
        &self,
        predicate: &(dyn for<'k> Fn(&'k str, Option<StorageType>) -> bool),
    ) -> StoreResult<Entries> {
        self.check_error()?;
        Ok(self
            .data
            .borrow()
            .iter()
            .filter(|(key, value)| predicate(key.as_str(), StorageType::of(value)))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }

    async fn save(&self, entries: Entries) -> StoreResult<Entries> {
        self.check_error()?;
        let mut data = self.data.borrow_mut();
        for (key, value) in &entries {
            data.insert(key.clone(), value.clone());
        }
        Ok(entries)
    }

    async fn delete_all(&self) -> StoreResult<bool> {
        self.check_error()?;
        self.data.borrow_mut().clear();
        Ok(self.data.borrow().is_empty())
    }

    async fn delete_keys(&self, keys: &[String]) -> StoreResult<bool> {
        self.check_error()?;
        let mut data = self.data.borrow_mut();
        for key in keys {
            data.remove(key);
        }
        Ok(keys.iter().all(|key| !data.contains_key(key)))
    }
}

// Typed helpers over any repository

/// Stored thread records, split by whether they still decode
#[derive(Debug, Default, PartialEq)]
pub struct TrackedRecords {
    pub threads: Vec<TrackedThread>,
    /// Keys of COMMENT records that are not a valid `TrackedThread`
    pub unreadable: Vec<String>,
}

pub async fn save_thread<R: Repository + ?Sized>(
    repo: &R,
    thread: &TrackedThread,
) -> StoreResult<TrackedThread> {
    let value = serde_json::to_value(thread).map_err(|e| StoreError::Encode(e.to_string()))?;
    let mut entries = Entries::new();
    entries.insert(thread.thread_id.clone(), value);
    repo.save(entries).await?;
    Ok(thread.clone())
}

pub async fn load_thread<R: Repository + ?Sized>(
    repo: &R,
    thread_id: &str,
) -> StoreResult<Option<TrackedThread>> {
    let mut entries = repo.get(&[thread_id]).await?;
    match entries.remove(thread_id) {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

pub async fn load_tracked_records<R: Repository + ?Sized>(repo: &R) -> StoreResult<TrackedRecords> {
    let entries = repo
        .get_all_by(&|_, kind| kind == Some(StorageType::Comment))
        .await?;

    let mut records = TrackedRecords::default();
    for (key, value) in entries {
        match serde_json::from_value::<TrackedThread>(value) {
            Ok(thread) => records.threads.push(thread),
            Err(e) => {
                log::warn!("Unreadable thread record {}: {}", key, e);
                records.unreadable.push(key);
            }
        }
    }
    Ok(records)
}

/// Every stored thread. Records that no longer decode are left out.
pub async fn load_tracked_threads<R: Repository + ?Sized>(
    repo: &R,
) -> StoreResult<Vec<TrackedThread>> {
    Ok(load_tracked_records(repo).await?.threads)
}

pub async fn delete_threads<R: Repository + ?Sized>(
    repo: &R,
    thread_ids: &[String],
) -> StoreResult<bool> {
    if thread_ids.is_empty() {
        return Ok(true);
    }
    repo.delete_keys(thread_ids).await
}

pub async fn load_settings<R: Repository + ?Sized>(repo: &R) -> StoreResult<Settings> {
    let entries = repo.get(&SETTING_KEYS).await?;
    Ok(Settings::from_entries(&entries))
}

pub async fn save_settings<R: Repository + ?Sized>(
    repo: &R,
    settings: &Settings,
) -> StoreResult<Settings> {
    repo.save(settings.to_entries()).await?;
    Ok(settings.clone())
}
