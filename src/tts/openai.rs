//! Модуль для интеграции с HTTP API синтеза речи
//!
//! Запрос отправляется на эндпоинт, совместимый с OpenAI `/v1/audio/speech`.
//! Ответ читается потоком, по кускам, до конца.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use log::{debug, error, info, warn};
use reqwest::Client;

use crate::config::SynthesizerConfig;
use crate::error::{ProsodyError, Result};
use crate::tts::{transport_guidance, RateSpec, SpeechSynthesizer};

/// Голоса, которые принимает `/v1/audio/speech`
pub const OPENAI_VOICES: &[&str] = &[
    "alloy", "ash", "coral", "echo", "fable", "nova", "onyx", "sage", "shimmer",
];

/// Синтезатор речи поверх HTTP API
pub struct OpenAiSynthesizer {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl OpenAiSynthesizer {
    /// Создать синтезатор из конфигурации
    ///
    /// API ключ читается из переменной окружения, указанной в конфигурации.
    pub fn from_config(config: &SynthesizerConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).unwrap_or_default();
        Self::new(config, api_key)
    }

    /// Создать синтезатор с явно заданным API ключом
    pub fn new(config: &SynthesizerConfig, api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            error!("API key for speech synthesis is empty");
            return Err(ProsodyError::Configuration(format!(
                "API key is required for speech synthesis (set {})",
                config.api_key_env
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSynthesizer {
    async fn synthesize(&self, text: &str, voice: &str, rate: &RateSpec) -> Result<Vec<u8>> {
        info!("Sending TTS request: voice {}, rate {}", voice, rate);
        if !OPENAI_VOICES.contains(&voice) {
            // Совместимые сервисы могут иметь свои голоса, поэтому запрос все равно отправляется
            warn!("Voice '{}' is not a known speech API voice", voice);
        }

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&serde_json::json!({
                "model": self.model,
                "voice": voice,
                "input": text,
                "response_format": "mp3",
                "speed": rate.speed_factor(),
            }))
            .send()
            .await
            .map_err(|e| {
                error!("Failed to send TTS request: {}", e);
                ProsodyError::Transport(format!("{}. {}", e, transport_guidance()))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = match response.text().await {
                Ok(text) => text,
                Err(e) => format!("Failed to read error response: {}", e),
            };
            error!("TTS API error (status {}): {}", status, error_text);
            return Err(ProsodyError::Transport(format!(
                "Speech service returned status {}: {}",
                status, error_text
            )));
        }

        let mut audio = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                ProsodyError::Transport(format!(
                    "Audio stream interrupted: {}. {}",
                    e,
                    transport_guidance()
                ))
            })?;
            debug!("Received audio chunk of {} bytes", chunk.len());
            audio.extend_from_slice(&chunk);
        }

        if audio.is_empty() {
            return Err(ProsodyError::Transport(format!(
                "No audio was received. {}",
                transport_guidance()
            )));
        }

        info!("Received {} bytes of audio", audio.len());
        Ok(audio)
    }
}
