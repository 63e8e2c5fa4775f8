// Configuration module
// Centralized management of application configuration

use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};

pub mod tts; // TTS configuration

pub use tts::{GeminiConfig, NativeConfig, TtsConfig, TtsEngine};

/// Переменная окружения с ключом удалённого движка
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
/// Запасное имя переменной с ключом
pub const API_KEY_FALLBACK_ENV: &str = "API_KEY";
/// Путь к необязательному JSON-файлу конфигурации
pub const CONFIG_PATH_ENV: &str = "AZBUKA_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Ключ API для Gemini; без него удалённый движок отключён
    #[serde(skip_serializing)]
    pub gemini_api_key: Option<String>,
    pub tts: TtsConfig,
}

impl AppConfig {
    /// Загружает конфигурацию: файл из `AZBUKA_CONFIG` (если задан), затем ключ из окружения
    pub fn load() -> AppResult<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };

        if let Some(key) = api_key_from_env() {
            config.gemini_api_key = Some(key);
        }

        if config.has_api_key() {
            info!("Gemini API key found, remote speech backend enabled");
        } else {
            warn!("{} is not set, remote speech backend disabled", API_KEY_ENV);
        }

        Ok(config)
    }

    /// Настройки по умолчанию, только ключ берётся из окружения
    pub fn from_env() -> Self {
        Self {
            gemini_api_key: api_key_from_env(),
            ..Self::default()
        }
    }

    pub fn from_file(path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::ConfigurationError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> AppResult<Self> {
        let config: AppConfig = serde_json::from_str(contents)
            .map_err(|e| AppError::ConfigurationError(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn has_api_key(&self) -> bool {
        self.gemini_api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }

    fn validate(&self) -> AppResult<()> {
        if !(0.1..=4.0).contains(&self.tts.slow_rate) {
            return Err(AppError::ConfigurationError(format!(
                "slow_rate must be within 0.1..=4.0, got {}",
                self.tts.slow_rate
            )));
        }
        if self.tts.gemini.max_attempts == 0 {
            return Err(AppError::ConfigurationError(
                "gemini.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn api_key_from_env() -> Option<String> {
    [API_KEY_ENV, API_KEY_FALLBACK_ENV]
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|key| !key.trim().is_empty())
}
