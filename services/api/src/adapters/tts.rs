//! services/api/src/adapters/tts.rs
//!
//! This module contains the adapter for OpenAI's Text-to-Speech (TTS) service.
//! It implements the `VoiceSynthesisService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::audio::{CreateSpeechRequest, SpeechModel, Voice},
    Client,
};
use async_trait::async_trait;
use somnova_core::ports::{PortError, PortResult, VoiceSynthesisService};
use std::time::Duration;
use tokio::time::timeout;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `VoiceSynthesisService` port using the OpenAI TTS API.
#[derive(Clone)]
pub struct OpenAiTtsAdapter {
    client: Client<OpenAIConfig>,
    model: SpeechModel,
    voice: Voice,
    call_timeout: Duration,
}

impl OpenAiTtsAdapter {
    /// Creates a new `OpenAiTtsAdapter`.
    pub fn new(
        client: Client<OpenAIConfig>,
        model: SpeechModel,
        voice: Voice,
        call_timeout: Duration,
    ) -> Self {
        Self {
            client,
            model,
            voice,
            call_timeout,
        }
    }
}

//=========================================================================================
// `VoiceSynthesisService` Trait Implementation
//=========================================================================================

#[async_trait]
impl VoiceSynthesisService for OpenAiTtsAdapter {
    /// Narrates the completed dream text. Yields `None` when the service
    /// returned an empty body; callers treat the narration as best-effort.
    async fn synthesize_voice(&self, completed_text: &str) -> PortResult<Option<Vec<u8>>> {
        let request = CreateSpeechRequest {
            model: self.model.clone(),
            input: format!(
                "Narrate this dream completion with a soft, ethereal, and mysterious tone: {}",
                completed_text
            ),
            voice: self.voice.clone(),
            ..Default::default()
        };

        // Call the API and manually map the error, which respects the orphan rule.
        let response = timeout(self.call_timeout, self.client.audio().speech().create(request))
            .await
            .map_err(|_| PortError::Upstream("voice synthesis timed out".to_string()))?
            .map_err(|e: OpenAIError| PortError::Upstream(e.to_string()))?;

        // The response contains a `bytes` field. We call `.to_vec()` on that field.
        let audio = response.bytes.to_vec();
        Ok((!audio.is_empty()).then_some(audio))
    }
}
