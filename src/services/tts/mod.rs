// TTS services module
// Contains implementations of different TTS engines

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::{AppConfig, TtsEngine};
use crate::errors::{SpeechError, SpeechResult};

pub mod cache;
pub mod gemini;
pub mod native;

pub use cache::SpeechCache;
pub use gemini::GeminiTts;
pub use native::{NativeSynthesizer, Utterance};

/// Темп озвучки
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Speed {
    #[default]
    Normal,
    Slow,
}

impl Speed {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Slow => "slow",
        }
    }
}

/// Декодированный моно/стерео PCM 16 бит
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioClip {
    pub fn new(samples: Vec<i16>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    /// Разбирает сырой little-endian PCM 16 бит
    pub fn from_pcm16_le(bytes: &[u8], sample_rate: u32, channels: u16) -> SpeechResult<Self> {
        if bytes.is_empty() {
            return Err(SpeechError::InvalidAudio("empty PCM payload".to_string()));
        }
        if bytes.len() % 2 != 0 {
            return Err(SpeechError::InvalidAudio(format!(
                "PCM payload has odd length {}",
                bytes.len()
            )));
        }
        if channels == 0 || sample_rate == 0 {
            return Err(SpeechError::InvalidAudio(format!(
                "invalid PCM format: {} Hz, {} channels",
                sample_rate, channels
            )));
        }

        let samples = bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Ok(Self::new(samples, sample_rate, channels))
    }

    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frame_count() as f64 / self.sample_rate.max(1) as f64)
    }
}

/// Готовое к воспроизведению аудио и имя движка, который его получил
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechAudio {
    pub engine: String,
    pub clip: AudioClip,
}

impl SpeechAudio {
    pub fn new(engine: impl Into<String>, clip: AudioClip) -> Self {
        Self {
            engine: engine.into(),
            clip,
        }
    }
}

/// Trait that all TTS services must implement
#[async_trait::async_trait]
pub trait SpeechCapability: Send + Sync {
    /// Имя движка для логов
    fn name(&self) -> &str;

    /// Пытается получить озвучку текста в заданном темпе
    async fn try_speak(&self, text: &str, speed: Speed) -> SpeechResult<SpeechAudio>;
}

/// Упорядоченный список движков с общим кэшем.
///
/// Движки опрашиваются по очереди, первый успешный результат попадает в кэш.
pub struct SpeechService {
    providers: Vec<Arc<dyn SpeechCapability>>,
    cache: SpeechCache,
}

impl SpeechService {
    pub fn new(providers: Vec<Arc<dyn SpeechCapability>>) -> Self {
        Self {
            providers,
            cache: SpeechCache::new(),
        }
    }

    pub fn has_providers(&self) -> bool {
        !self.providers.is_empty()
    }

    pub fn cache(&self) -> &SpeechCache {
        &self.cache
    }

    pub async fn acquire(&self, text: &str, speed: Speed) -> SpeechResult<Arc<SpeechAudio>> {
        if text.trim().is_empty() {
            return Err(SpeechError::EmptyText);
        }

        if let Some(cached) = self.cache.get(text, speed) {
            debug!("Using cached speech for '{}' ({})", text, speed.as_str());
            return Ok(cached);
        }

        if self.providers.is_empty() {
            return Err(SpeechError::NoBackend);
        }

        let mut failures = Vec::new();
        for provider in &self.providers {
            match provider.try_speak(text, speed).await {
                Ok(audio) => {
                    info!("Speech for '{}' ({}) produced by {}", text, speed.as_str(), provider.name());
                    return Ok(self.cache.put(text, speed, audio));
                }
                Err(e) => {
                    warn!("Speech backend {} failed for '{}': {}", provider.name(), text, e);
                    failures.push(format!("{}: {}", provider.name(), e));
                }
            }
        }

        Err(SpeechError::AllBackendsFailed(failures))
    }
}

/// Собирает движки в порядке из конфигурации, пропуская недоступные
pub fn build_providers(config: &AppConfig) -> Vec<Arc<dyn SpeechCapability>> {
    let mut providers: Vec<Arc<dyn SpeechCapability>> = Vec::new();

    for engine in &config.tts.engines {
        match engine {
            TtsEngine::Native => match NativeSynthesizer::detect(&config.tts) {
                Some(synth) => providers.push(Arc::new(synth)),
                None => warn!("No on-device speech synthesizer found, native engine skipped"),
            },
            TtsEngine::Gemini => {
                let Some(key) = config.gemini_api_key.as_deref() else {
                    warn!("Gemini engine skipped: API key is not configured");
                    continue;
                };
                match GeminiTts::new(key, config.tts.gemini.clone()) {
                    Ok(client) => providers.push(Arc::new(client)),
                    Err(e) => warn!("Gemini engine skipped: {}", e),
                }
            }
        }
    }

    if providers.is_empty() {
        warn!("No speech backends available, audio playback is disabled");
    } else {
        let names: Vec<&str> = providers.iter().map(|p| p.name()).collect();
        info!("Speech backends in order: {}", names.join(", "));
    }

    providers
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeProvider {
        name: &'static str,
        fail: bool,
        calls: AtomicUsize,
    }

    impl FakeProvider {
        fn new(name: &'static str, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                name,
                fail,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait::async_trait]
    impl SpeechCapability for FakeProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn try_speak(&self, text: &str, _speed: Speed) -> SpeechResult<SpeechAudio> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SpeechError::Unavailable(format!("{} is down", self.name)));
            }
            Ok(SpeechAudio::new(
                self.name,
                AudioClip::new(vec![text.chars().count() as i16], 24_000, 1),
            ))
        }
    }

    #[test]
    fn test_pcm_decoding() {
        let clip = AudioClip::from_pcm16_le(&[0x01, 0x00, 0xff, 0xff, 0x00, 0x80], 24_000, 1).unwrap();
        assert_eq!(clip.samples, vec![1, -1, i16::MIN]);
        assert_eq!(clip.frame_count(), 3);

        assert!(matches!(
            AudioClip::from_pcm16_le(&[0x01, 0x00, 0x02], 24_000, 1),
            Err(SpeechError::InvalidAudio(_))
        ));
        assert!(AudioClip::from_pcm16_le(&[], 24_000, 1).is_err());
    }

    #[test]
    fn test_clip_duration() {
        let clip = AudioClip::new(vec![0; 48_000], 24_000, 1);
        assert_eq!(clip.duration(), Duration::from_secs(2));
        let stereo = AudioClip::new(vec![0; 48_000], 24_000, 2);
        assert_eq!(stereo.duration(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_cache_hit_skips_providers() {
        let provider = FakeProvider::new("fake", false);
        let service = SpeechService::new(vec![provider.clone() as Arc<dyn SpeechCapability>]);

        let first = service.acquire("кот", Speed::Normal).await.unwrap();
        let second = service.acquire("кот", Speed::Normal).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        service.acquire("кот", Speed::Slow).await.unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_falls_through_to_next_provider() {
        let broken = FakeProvider::new("broken", true);
        let working = FakeProvider::new("working", false);
        let service = SpeechService::new(vec![
            broken.clone() as Arc<dyn SpeechCapability>,
            working.clone(),
        ]);

        service.acquire("дом", Speed::Normal).await.unwrap();
        assert_eq!(broken.calls.load(Ordering::SeqCst), 1);
        assert_eq!(working.calls.load(Ordering::SeqCst), 1);
        assert_eq!(service.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_all_failed_is_not_cached() {
        let service = SpeechService::new(vec![
            FakeProvider::new("a", true) as Arc<dyn SpeechCapability>,
            FakeProvider::new("b", true),
        ]);
        match service.acquire("дом", Speed::Normal).await {
            Err(SpeechError::AllBackendsFailed(reasons)) => assert_eq!(reasons.len(), 2),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(service.cache().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_acquire_of_distinct_texts() {
        let provider = FakeProvider::new("fake", false);
        let service = SpeechService::new(vec![provider.clone() as Arc<dyn SpeechCapability>]);

        let texts = ["один", "два", "три"];
        let results = futures::future::join_all(
            texts.iter().map(|text| service.acquire(text, Speed::Normal)),
        )
        .await;

        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(service.cache().len(), 3);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_empty_text_and_no_backend() {
        let service = SpeechService::new(Vec::new());
        assert!(matches!(service.acquire("  ", Speed::Normal).await, Err(SpeechError::EmptyText)));
        assert!(matches!(service.acquire("да", Speed::Normal).await, Err(SpeechError::NoBackend)));
    }

    #[test]
    fn test_missing_key_skips_gemini() {
        let mut config = AppConfig::default();
        config.tts.engines = vec![TtsEngine::Gemini];
        assert!(build_providers(&config).is_empty());

        config.gemini_api_key = Some("test-key".to_string());
        let providers = build_providers(&config);
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].name(), "gemini");
    }
}
