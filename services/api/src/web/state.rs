//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the per-session document index cache.

use crate::config::Config;
use medminder_core::index::DocumentIndex;
use medminder_core::ports::{
    DatabaseService, EmbeddingService, GuidanceService, SpeechToTextService, TextToSpeechService,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    pub embedding_adapter: Arc<dyn EmbeddingService>,
    pub guidance_adapter: Arc<dyn GuidanceService>,
    pub sst_adapter: Arc<dyn SpeechToTextService>,
    pub tts_adapter: Arc<dyn TextToSpeechService>,
    /// Session-scoped document indexes, keyed by user. An index is replaced
    /// wholesale on re-upload and dropped on logout; it is never persisted.
    indexes: RwLock<HashMap<Uuid, Arc<DocumentIndex>>>,
}

impl AppState {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        config: Arc<Config>,
        embedding_adapter: Arc<dyn EmbeddingService>,
        guidance_adapter: Arc<dyn GuidanceService>,
        sst_adapter: Arc<dyn SpeechToTextService>,
        tts_adapter: Arc<dyn TextToSpeechService>,
    ) -> Self {
        Self {
            db,
            config,
            embedding_adapter,
            guidance_adapter,
            sst_adapter,
            tts_adapter,
            indexes: RwLock::new(HashMap::new()),
        }
    }

    /// Replaces the user's document index with a freshly built one.
    pub async fn store_index(&self, user_id: Uuid, index: DocumentIndex) {
        self.indexes.write().await.insert(user_id, Arc::new(index));
    }

    /// Returns the user's current document index, if one has been uploaded.
    pub async fn get_index(&self, user_id: Uuid) -> Option<Arc<DocumentIndex>> {
        self.indexes.read().await.get(&user_id).cloned()
    }

    /// Drops the user's document index, ending the indexing session.
    pub async fn drop_index(&self, user_id: Uuid) {
        self.indexes.write().await.remove(&user_id);
    }
}
