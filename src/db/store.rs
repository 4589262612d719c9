use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::db::database::KeyValueStore;
use crate::models::{GenerationResult, PromptHistoryEntry, PromptPreset};
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    Generations,
    Presets,
    PromptHistory,
}

impl StoreKey {
    pub fn as_str(self) -> &'static str {
        match self {
            StoreKey::Generations => "generations",
            StoreKey::Presets => "presets",
            StoreKey::PromptHistory => "promptHistory",
        }
    }
}

/// Collections read at startup.
#[derive(Debug, Default)]
pub struct Snapshot {
    pub generations: Vec<Arc<GenerationResult>>,
    pub presets: Vec<PromptPreset>,
    pub prompt_history: Vec<PromptHistoryEntry>,
}

/// Reads every collection; unreadable or corrupt data comes back empty.
pub async fn load_snapshot(store: &dyn KeyValueStore) -> Snapshot {
    Snapshot {
        generations: load_collection(store, StoreKey::Generations).await,
        presets: load_collection(store, StoreKey::Presets).await,
        prompt_history: load_collection(store, StoreKey::PromptHistory).await,
    }
}

async fn load_collection<T: DeserializeOwned>(store: &dyn KeyValueStore, key: StoreKey) -> Vec<T> {
    let raw = match store.get(key.as_str()).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(err) => {
            warn!("Could not load {} from store: {}", key.as_str(), err);
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<T>>(&raw) {
        Ok(items) => {
            debug!("Loaded {} {} record(s)", items.len(), key.as_str());
            items
        }
        Err(err) => {
            warn!(
                "Stored {} is not valid; starting with an empty collection: {}",
                key.as_str(),
                err
            );
            Vec::new()
        }
    }
}

pub fn serialize_collection(state: &AppState, key: StoreKey) -> Result<String, serde_json::Error> {
    match key {
        StoreKey::Generations => serde_json::to_string(&state.generations),
        StoreKey::Presets => serde_json::to_string(&state.presets),
        StoreKey::PromptHistory => serde_json::to_string(&state.prompt_history),
    }
}

#[derive(Debug)]
struct PersistJob {
    key: StoreKey,
    blob: String,
}

/// Hands serialized collections to a background writer. Write failures are
/// logged by the writer and never reach the caller.
#[derive(Clone)]
pub struct PersistQueue {
    sender: mpsc::Sender<PersistJob>,
}

impl PersistQueue {
    pub fn spawn(store: Arc<dyn KeyValueStore>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(async move {
            persist_writer(store, receiver).await;
        });
        info!("Persistence writer task started");
        (PersistQueue { sender }, handle)
    }

    pub async fn enqueue(&self, state: &AppState, key: StoreKey) {
        let blob = match serialize_collection(state, key) {
            Ok(blob) => blob,
            Err(err) => {
                warn!("Could not serialize {}: {}", key.as_str(), err);
                return;
            }
        };
        if let Err(err) = self.sender.send(PersistJob { key, blob }).await {
            warn!("Failed to queue {} write: {}", key.as_str(), err);
        }
    }
}

async fn persist_writer(store: Arc<dyn KeyValueStore>, mut receiver: mpsc::Receiver<PersistJob>) {
    while let Some(job) = receiver.recv().await {
        if let Err(err) = store.put(job.key.as_str(), &job.blob).await {
            warn!("Error in persist_writer for {}: {}", job.key.as_str(), err);
        }
    }
    info!("Persistence writer task stopped");
}
