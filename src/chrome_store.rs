/// chrome.storage.sync backed repository

use async_trait::async_trait;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::error::{StoreError, StoreResult};
use crate::settings::StorageType;
use crate::storage::{Entries, Repository};

// Import JS bridge functions
#[wasm_bindgen(module = "/storage.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn storageGet(keys: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn storageSet(items: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn storageRemove(keys: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn storageClear() -> Result<(), JsValue>;
}

/// Repository over the browser's synced extension storage
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeRepository;

impl ChromeRepository {
    pub fn new() -> Self {
        ChromeRepository
    }

    async fn fetch(&self, keys: JsValue) -> StoreResult<Entries> {
        let result = storageGet(keys).await.map_err(host_error)?;
        if result.is_null() || result.is_undefined() {
            return Ok(Entries::new());
        }
        serde_wasm_bindgen::from_value(result).map_err(|e| StoreError::Decode(format!("{:?}", e)))
    }
}

#[async_trait(?Send)]
impl Repository for ChromeRepository {
    async fn get(&self, keys: &[&str]) -> StoreResult<Entries> {
        self.fetch(to_js(&keys)?).await
    }

    async fn get_all_by(
        &self,
        predicate: &(dyn for<'k> Fn(&'k str, Option<StorageType>) -> bool),
    ) -> StoreResult<Entries> {
        let all = self.fetch(JsValue::NULL).await?;
        Ok(all
            .into_iter()
            .filter(|(key, value)| predicate(key.as_str(), StorageType::of(value)))
            .collect())
    }

    async fn save(&self, entries: Entries) -> StoreResult<Entries> {
        storageSet(to_js(&entries)?).await.map_err(host_error)?;
        Ok(entries)
    }

    async fn delete_all(&self) -> StoreResult<bool> {
        storageClear().await.map_err(host_error)?;
        Ok(self.get_all().await?.is_empty())
    }

    async fn delete_keys(&self, keys: &[String]) -> StoreResult<bool> {
        storageRemove(to_js(&keys)?).await.map_err(host_error)?;
        let remaining = self.get_all().await?;
        Ok(keys.iter().all(|key| !remaining.contains_key(key)))
    }
}

// Helper functions

/// Plain JS objects rather than `Map`s, which chrome.storage cannot store
fn to_js<T: Serialize + ?Sized>(value: &T) -> StoreResult<JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| StoreError::Encode(format!("{:?}", e)))
}

fn host_error(err: JsValue) -> StoreError {
    StoreError::Host(
        err.as_string()
            .unwrap_or_else(|| "Error accessing storage".to_string()),
    )
}
