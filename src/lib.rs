/// rereaddit - Chrome extension that tracks unread reddit comments
/// Built with Rust + WASM + Yew

pub mod chrome_store;
pub mod error;
pub mod fetch;
pub mod history;
pub mod retention;
pub mod settings;
pub mod storage;
pub mod thread_id;
pub mod tracked;
pub mod tracker;
pub mod unread;
pub mod ui;

use chrono::Utc;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::chrome_store::ChromeRepository;
use crate::error::StoreError;
use crate::settings::RetentionFrequency;
use crate::storage::load_settings;
use crate::tracked::TrackedThread;
use crate::tracker::{ThreadVisit, VisitOutcome};

// Set up panic hook and console logging.
// Debug builds log everything, release builds from info up.
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    let level = if cfg!(debug_assertions) {
        log::Level::Debug
    } else {
        log::Level::Info
    };
    wasm_logger::init(wasm_logger::Config::new(level));
}

// Re-export core functions for JavaScript access
#[wasm_bindgen]
pub fn extract_thread_id(url: &str) -> String {
    thread_id::extract_thread_id(url)
}

/// Unread comments in a fetched `/comments/<id>.json` payload.
/// Payloads that cannot be read count as zero.
#[wasm_bindgen]
pub fn count_unread_since(payload: JsValue, since_millis: f64) -> u32 {
    let Some(since) = unread::from_epoch_millis(since_millis) else {
        return 0;
    };
    match serde_wasm_bindgen::from_value::<serde_json::Value>(payload) {
        Ok(payload) => {
            u32::try_from(unread::count_unread_in_payload(&payload, since)).unwrap_or(u32::MAX)
        }
        Err(e) => {
            log::debug!("Unreadable comment payload: {:?}", e);
            0
        }
    }
}

#[wasm_bindgen]
pub fn select_stale_thread_ids(
    threads: JsValue,
    frequency: &str,
    now_millis: f64,
) -> Result<JsValue, JsValue> {
    let threads: Vec<TrackedThread> = serde_wasm_bindgen::from_value(threads)
        .map_err(|e| JsValue::from_str(&format!("Invalid threads: {:?}", e)))?;
    let frequency = RetentionFrequency::from_key(frequency)
        .ok_or_else(|| JsValue::from_str(&format!("Unknown frequency: {}", frequency)))?;
    let now = unread::from_epoch_millis(now_millis)
        .ok_or_else(|| JsValue::from_str("Invalid timestamp"))?;

    let stale: Vec<String> = retention::select_stale_thread_ids(&threads, frequency, now)
        .into_iter()
        .collect();
    to_js(&stale)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PageLoadResponse {
    #[serde(flatten)]
    outcome: VisitOutcome,
    unread_comment_color: String,
}

/// Content script entry point, called once a thread page has loaded with
/// `{ url, title, tagline }`. Replies with the visit outcome and the color
/// to highlight comments newer than `previousLastViewed` with.
#[wasm_bindgen]
pub async fn on_thread_page_load(visit: JsValue) -> Result<JsValue, JsValue> {
    let visit: ThreadVisit = serde_wasm_bindgen::from_value(visit)
        .map_err(|e| JsValue::from_str(&format!("Invalid visit: {:?}", e)))?;
    let repo = ChromeRepository::new();

    let outcome = tracker::record_visit(&repo, visit, Utc::now())
        .await
        .map_err(store_error)?;
    let settings = load_settings(&repo).await.map_err(store_error)?;

    to_js(&PageLoadResponse {
        outcome,
        unread_comment_color: settings.unread_comment_color,
    })
}

/// Background entry point: save default settings and prune stale history.
/// Resolves to the deleted thread ids.
#[wasm_bindgen]
pub async fn on_startup() -> Result<JsValue, JsValue> {
    let repo = ChromeRepository::new();

    tracker::init_settings(&repo).await.map_err(store_error)?;
    let deleted = tracker::prune_stale_threads(&repo, Utc::now())
        .await
        .map_err(store_error)?;

    to_js(&deleted)
}

// Start the Yew app for the popup
#[wasm_bindgen]
pub fn start_popup() {
    yew::Renderer::<ui::popup::App>::new().render();
}

// Start the Yew app for the options page
#[wasm_bindgen]
pub fn start_options() {
    yew::Renderer::<ui::options::OptionsHome>::new().render();
}

fn store_error(err: StoreError) -> JsValue {
    log::warn!("Storage error: {}", err);
    JsValue::from_str(&err.to_string())
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&format!("Failed to serialize: {:?}", e)))
}
