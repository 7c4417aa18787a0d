//! services/api/src/adapters/embeddings.rs
//!
//! This module contains the adapter for the OpenAI embeddings endpoint.
//! It implements the `EmbeddingService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig, error::OpenAIError, types::embeddings::CreateEmbeddingRequestArgs, Client,
};
use async_trait::async_trait;
use medminder_core::ports::{EmbeddingService, PortError, PortResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `EmbeddingService` port using a fixed
/// pretrained OpenAI embedding model.
#[derive(Clone)]
pub struct OpenAiEmbeddingAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiEmbeddingAdapter {
    /// Creates a new `OpenAiEmbeddingAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

//=========================================================================================
// `EmbeddingService` Trait Implementation
//=========================================================================================

#[async_trait]
impl EmbeddingService for OpenAiEmbeddingAdapter {
    /// Embeds a batch of text chunks, preserving input order.
    async fn embed(&self, texts: &[String]) -> PortResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(texts.to_vec())
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Call the API and manually map the error, which respects the orphan rule.
        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        if response.data.len() != texts.len() {
            return Err(PortError::Unexpected(format!(
                "Embedding count mismatch: sent {} chunks, received {} vectors",
                texts.len(),
                response.data.len()
            )));
        }

        // The API reports each vector's position explicitly; sort to be safe.
        let mut data = response.data;
        data.sort_by_key(|e| e.index);
        Ok(data.into_iter().map(|e| e.embedding).collect())
    }
}
