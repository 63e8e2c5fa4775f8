use serde::{Deserialize, Serialize};

use crate::services::tts::Speed;

// Доступные движки TTS
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TtsEngine {
    /// Локальный синтезатор речи (espeak-ng, say и т.п.)
    Native,
    /// Генеративная модель Gemini с аудио-ответом
    Gemini,
}

/// Настройки удалённого движка Gemini
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub base_url: String,
    pub model: String,
    /// Голос (персона) предустановленного синтезатора
    pub voice: String,
    /// Частота дискретизации PCM в ответе модели
    pub sample_rate: u32,
    pub request_timeout_secs: u64,
    pub max_attempts: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.5-flash-preview-tts".to_string(),
            voice: "Kore".to_string(),
            sample_rate: 24_000,
            request_timeout_secs: 30,
            max_attempts: 3,
        }
    }
}

/// Настройки локального синтезатора
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NativeConfig {
    /// Программы синтеза в порядке предпочтения
    pub programs: Vec<String>,
    /// Языковой тег, всегда русский
    pub locale: String,
    /// Базовая скорость речи в словах в минуту
    pub words_per_minute: u32,
    /// Русский голос для macOS `say`
    pub say_voice: String,
}

impl Default for NativeConfig {
    fn default() -> Self {
        Self {
            programs: vec!["espeak-ng".to_string(), "espeak".to_string(), "say".to_string()],
            locale: "ru-RU".to_string(),
            words_per_minute: 160,
            say_voice: "Milena".to_string(),
        }
    }
}

// Конфигурация TTS
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    /// Порядок опроса движков: первый успешный побеждает
    pub engines: Vec<TtsEngine>,
    pub gemini: GeminiConfig,
    pub native: NativeConfig,
    /// Множитель скорости для медленного чтения
    pub slow_rate: f32,
    /// Проигрыватели PCM в порядке предпочтения
    pub players: Vec<String>,
}

impl Default for TtsConfig {
    fn default() -> Self {
        TtsConfig {
            engines: vec![TtsEngine::Native, TtsEngine::Gemini],
            gemini: GeminiConfig::default(),
            native: NativeConfig::default(),
            slow_rate: 0.75,
            players: vec![
                "aplay".to_string(),
                "paplay".to_string(),
                "afplay".to_string(),
                "ffplay".to_string(),
            ],
        }
    }
}

impl TtsConfig {
    /// Множитель скорости для выбранного темпа
    pub fn rate_for(&self, speed: Speed) -> f32 {
        match speed {
            Speed::Normal => 1.0,
            Speed::Slow => self.slow_rate,
        }
    }
}
