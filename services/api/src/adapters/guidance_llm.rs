//! services/api/src/adapters/guidance_llm.rs
//!
//! This module contains the adapter for the medicine-guidance LLM.
//! It implements the `GuidanceService` port from the `core` crate.

const SYSTEM_INSTRUCTIONS: &str = "You are a medication reminder assistant. You receive the \
current time and excerpts retrieved from the user's uploaded prescription. Answer only from \
the provided context; do not invent medicines or dosages.";

const USER_INPUT_TEMPLATE: &str = r#"Check if any medicine needs to be taken at {current_time}.
If yes, create a reminder message. If no, respond with "No medicines scheduled for now."

Context: {context}"#;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use medminder_core::ports::{GuidanceService, PortError, PortResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `GuidanceService` using an OpenAI-compatible LLM.
///
/// Decoding is deterministic (temperature 0) with a bounded output length, so
/// the same schedule and time produce the same guidance.
#[derive(Clone)]
pub struct OpenAiGuidanceAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiGuidanceAdapter {
    /// Creates a new `OpenAiGuidanceAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

//=========================================================================================
// `GuidanceService` Trait Implementation
//=========================================================================================

#[async_trait]
impl GuidanceService for OpenAiGuidanceAdapter {
    /// Asks the model whether any medicine is due at `current_time`, given the
    /// retrieved prescription context.
    async fn check_medicine_time(&self, current_time: &str, context: &str) -> PortResult<String> {
        let user_input = USER_INPUT_TEMPLATE
            .replace("{current_time}", current_time)
            .replace("{context}", context);

        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_INSTRUCTIONS)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_input)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.0)
            .max_tokens(2048u32)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        // Extract the text content from the first choice in the response.
        if let Some(choice) = response.choices.into_iter().next() {
            if let Some(content) = choice.message.content {
                Ok(content)
            } else {
                Err(PortError::Unexpected(
                    "Guidance LLM response contained no text content.".to_string(),
                ))
            }
        } else {
            Err(PortError::Unexpected(
                "Guidance LLM returned no choices in its response.".to_string(),
            ))
        }
    }
}
