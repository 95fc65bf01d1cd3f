//! services/api/src/adapters/completion_llm.rs
//!
//! This module contains the adapter for the dream-completion LLM.
//! It implements the `DreamCompletionService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::audio::{AudioInput, CreateTranscriptionRequest},
    types::chat::{
        ChatCompletionRequestMessageContentPartImageArgs,
        ChatCompletionRequestMessageContentPartTextArgs, ChatCompletionRequestUserMessageArgs,
        ChatCompletionRequestUserMessageContentPart, CreateChatCompletionRequestArgs,
        ImageUrlArgs,
    },
    Client,
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use somnova_core::domain::DreamFragment;
use somnova_core::ports::{DreamCompletionService, PortError, PortResult};
use std::time::Duration;
use tokio::time::timeout;

const COMPLETION_INSTRUCTIONS: &str = "Please complete this dream for me. Make it immersive, \
surreal, and emotionally resonant. Return only the completed story text.";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `DreamCompletionService` using an OpenAI-compatible LLM.
/// Voice clips are transcribed through the audio endpoint first and forwarded to the
/// completion model as a transcript.
#[derive(Clone)]
pub struct OpenAiCompletionAdapter {
    client: Client<OpenAIConfig>,
    completion_model: String,
    transcription_model: String,
    call_timeout: Duration,
}

impl OpenAiCompletionAdapter {
    /// Creates a new `OpenAiCompletionAdapter`.
    pub fn new(
        client: Client<OpenAIConfig>,
        completion_model: String,
        transcription_model: String,
        call_timeout: Duration,
    ) -> Self {
        Self {
            client,
            completion_model,
            transcription_model,
            call_timeout,
        }
    }

    async fn transcribe_voice_clip(&self, clip: &[u8]) -> PortResult<String> {
        let input = AudioInput::from_vec_u8("dream_voice.webm".into(), clip.to_vec());

        let request = CreateTranscriptionRequest {
            file: input,
            model: self.transcription_model.clone(),
            ..Default::default()
        };

        // Call the API and manually map the error, which respects the orphan rule.
        let response = timeout(
            self.call_timeout,
            self.client.audio().transcription().create(request),
        )
        .await
        .map_err(|_| PortError::Upstream("voice transcription timed out".to_string()))?
        .map_err(|e: OpenAIError| PortError::Upstream(e.to_string()))?;

        Ok(response.text)
    }
}

fn text_part(text: String) -> PortResult<ChatCompletionRequestUserMessageContentPart> {
    Ok(ChatCompletionRequestMessageContentPartTextArgs::default()
        .text(text)
        .build()
        .map_err(|e| PortError::Unexpected(e.to_string()))?
        .into())
}

//=========================================================================================
// `DreamCompletionService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DreamCompletionService for OpenAiCompletionAdapter {
    /// Completes a dream fragment into narrative text.
    async fn complete_dream(&self, fragment: &DreamFragment) -> PortResult<String> {
        let mut parts: Vec<ChatCompletionRequestUserMessageContentPart> = Vec::new();

        if let Some(text) = fragment.text.as_deref().filter(|t| !t.trim().is_empty()) {
            parts.push(text_part(format!(
                "Here is a description of a dream I had: {}",
                text
            ))?);
        }

        for image in &fragment.images {
            let data_url = format!("data:image/jpeg;base64,{}", STANDARD.encode(image));
            parts.push(
                ChatCompletionRequestMessageContentPartImageArgs::default()
                    .image_url(
                        ImageUrlArgs::default()
                            .url(data_url)
                            .build()
                            .map_err(|e| PortError::Unexpected(e.to_string()))?,
                    )
                    .build()
                    .map_err(|e| PortError::Unexpected(e.to_string()))?
                    .into(),
            );
        }
        if !fragment.images.is_empty() {
            parts.push(text_part(
                "I've also provided some images from my dream.".to_string(),
            )?);
        }

        if let Some(clip) = fragment.voice_clip.as_deref() {
            let transcript = self.transcribe_voice_clip(clip).await?;
            parts.push(text_part(format!(
                "I've also provided a voice recording describing my dream. \
                 A transcript of the recording: {}",
                transcript
            ))?);
        }

        parts.push(text_part(COMPLETION_INSTRUCTIONS.to_string())?);

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.completion_model)
            .messages(vec![ChatCompletionRequestUserMessageArgs::default()
                .content(parts)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into()])
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Single attempt, bounded by the configured timeout; a stalled
        // generation service must not hang the request.
        let response = timeout(self.call_timeout, self.client.chat().create(request))
            .await
            .map_err(|_| PortError::Upstream("dream completion timed out".to_string()))?
            .map_err(|e: OpenAIError| PortError::Upstream(e.to_string()))?;

        // Extract the text content from the first choice in the response.
        if let Some(choice) = response.choices.into_iter().next() {
            if let Some(content) = choice.message.content {
                Ok(content)
            } else {
                Err(PortError::Upstream(
                    "Completion response contained no text content.".to_string(),
                ))
            }
        } else {
            Err(PortError::Upstream(
                "Completion service returned no choices in its response.".to_string(),
            ))
        }
    }
}
