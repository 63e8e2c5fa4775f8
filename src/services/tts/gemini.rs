//! # Gemini TTS Integration
//!
//! Удалённый движок: генеративная модель получает инструкцию на естественном
//! языке с текстом внутри и возвращает аудио в base64 (сырой PCM 16 бит).

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use log::{error, info, warn};
use reqwest::{Client, header};
use serde::Deserialize;
use serde_json::{Value, json};

use super::{AudioClip, SpeechAudio, SpeechCapability, Speed};
use crate::config::GeminiConfig;
use crate::errors::{SpeechError, SpeechResult};

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    data: String,
    #[serde(default)]
    mime_type: Option<String>,
}

/// Аудио из ответа модели до декодирования
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioPayload {
    pub data: String,
    pub mime_type: Option<String>,
}

/// Клиент для работы с Gemini TTS
pub struct GeminiTts {
    client: Client,
    api_key: String,
    config: GeminiConfig,
}

impl GeminiTts {
    pub fn new(api_key: &str, config: GeminiConfig) -> SpeechResult<Self> {
        if api_key.trim().is_empty() {
            return Err(SpeechError::Unavailable("Gemini API key is required".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            config,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    /// Инструкция для модели: медленное чтение просит чётко произносить каждый слог
    pub fn build_prompt(text: &str, speed: Speed) -> String {
        match speed {
            Speed::Slow => format!(
                "Read this Russian text very slowly, pronouncing every syllable with exaggerated clarity: {}",
                text
            ),
            Speed::Normal => format!(
                "Read this Russian word or letter clearly at a standard pace: {}",
                text
            ),
        }
    }

    pub fn request_body(&self, text: &str, speed: Speed) -> Value {
        json!({
            "contents": [{ "parts": [{ "text": Self::build_prompt(text, speed) }] }],
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": {
                        "prebuiltVoiceConfig": { "voiceName": self.config.voice }
                    }
                }
            }
        })
    }

    /// Достаёт аудио из первой части первого кандидата
    pub fn extract_audio_payload(body: &Value) -> SpeechResult<AudioPayload> {
        let response = GenerateContentResponse::deserialize(body)
            .map_err(|e| SpeechError::InvalidAudio(format!("unexpected response shape: {}", e)))?;

        response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts.into_iter().next())
            .and_then(|part| part.inline_data)
            .filter(|inline| !inline.data.is_empty())
            .map(|inline| AudioPayload {
                data: inline.data,
                mime_type: inline.mime_type,
            })
            .ok_or(SpeechError::EmptyResponse)
    }

    /// Превращает base64 PCM в аудиоклип; частота берётся из mime-типа, если она там есть
    pub fn decode_payload(payload: &AudioPayload, default_rate: u32) -> SpeechResult<AudioClip> {
        let bytes = BASE64_STANDARD.decode(payload.data.trim())?;
        let sample_rate = payload
            .mime_type
            .as_deref()
            .and_then(sample_rate_from_mime)
            .unwrap_or(default_rate);
        AudioClip::from_pcm16_le(&bytes, sample_rate, 1)
    }

    async fn request_with_retries(&self, body: &Value) -> SpeechResult<Value> {
        let mut attempts = 0;
        let max_attempts = self.config.max_attempts.max(1);

        loop {
            attempts += 1;
            info!(
                "Sending Gemini TTS request (attempt {}/{})",
                attempts, max_attempts
            );

            let response = self
                .client
                .post(self.endpoint())
                .header(API_KEY_HEADER, &self.api_key)
                .header(header::CONTENT_TYPE, "application/json")
                .json(body)
                .send()
                .await;

            let error = match response {
                Ok(resp) if resp.status().is_success() => return Ok(resp.json::<Value>().await?),
                Ok(resp) => {
                    let status = resp.status();
                    let error_text = resp
                        .text()
                        .await
                        .unwrap_or_else(|_| "failed to read error body".to_string());
                    let message = api_error_message(&error_text);
                    error!("Gemini TTS API error (status {}): {}", status, message);

                    let api_error = SpeechError::Api {
                        status: status.as_u16(),
                        message,
                    };
                    // повторяем только при перегрузке и ошибках сервера
                    if status.as_u16() != 429 && !status.is_server_error() {
                        return Err(api_error);
                    }
                    api_error
                }
                Err(e) => {
                    error!("HTTP error while calling Gemini TTS: {}", e);
                    SpeechError::Http(e)
                }
            };

            if attempts >= max_attempts {
                return Err(error);
            }
            let wait_time = Duration::from_secs(2u64.pow(attempts));
            warn!("Retrying Gemini TTS request in {} seconds...", wait_time.as_secs());
            tokio::time::sleep(wait_time).await;
        }
    }
}

#[async_trait::async_trait]
impl SpeechCapability for GeminiTts {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn try_speak(&self, text: &str, speed: Speed) -> SpeechResult<SpeechAudio> {
        if text.trim().is_empty() {
            return Err(SpeechError::EmptyText);
        }

        let body = self.request_body(text, speed);
        let response = self.request_with_retries(&body).await?;
        let payload = Self::extract_audio_payload(&response).inspect_err(|_| {
            warn!("Gemini TTS returned no audio for '{}'", text);
        })?;
        let clip = Self::decode_payload(&payload, self.config.sample_rate)?;

        info!(
            "Received {:.2}s of audio from Gemini TTS for '{}'",
            clip.duration().as_secs_f32(),
            text
        );
        Ok(SpeechAudio::new(self.name(), clip))
    }
}

/// "audio/L16;codec=pcm;rate=24000" -> 24000
fn sample_rate_from_mime(mime: &str) -> Option<u32> {
    mime.split(';')
        .filter_map(|param| param.trim().strip_prefix("rate="))
        .find_map(|rate| rate.parse().ok())
}

fn api_error_message(error_text: &str) -> String {
    serde_json::from_str::<Value>(error_text)
        .ok()
        .and_then(|json| json["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| error_text.to_string())
}
