// Error handling module
// Contains custom error types and error handling utilities

use serde::Serialize;
use thiserror::Error;

/// Ошибки разбиения текста читалки на сегменты.
///
/// Обе блокируют переход к экрану прослушивания, пользователь остаётся в редакторе.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum SegmentError {
    #[error("Текст не содержит ни одной русской буквы")]
    EmptyInput,

    #[error("Слишком много сегментов: {count} (максимум {limit})")]
    TooManySegments { count: usize, limit: usize },
}

/// Ошибки получения озвучки от движков TTS
#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("Пустой текст для озвучки")]
    EmptyText,

    #[error("Нет ни одного доступного движка TTS")]
    NoBackend,

    #[error("Движок недоступен: {0}")]
    Unavailable(String),

    #[error("Ошибка API (статус {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Модель не вернула аудио")]
    EmptyResponse,

    #[error("Ошибка HTTP: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Ошибка base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Некорректные аудиоданные: {0}")]
    InvalidAudio(String),

    #[error("Все движки TTS завершились ошибкой: {}", .0.join("; "))]
    AllBackendsFailed(Vec<String>),
}

pub type SpeechResult<T> = Result<T, SpeechError>;

// Application error type
#[derive(Debug, Error, Serialize)]
pub enum AppError {
    #[error("Ошибка конфигурации: {0}")]
    ConfigurationError(String),

    #[error("Ошибка обработки аудио: {0}")]
    AudioProcessingError(String),

    #[error("Ошибка ввода/вывода: {0}")]
    #[serde(serialize_with = "serialize_io_error")]
    IoError(#[from] std::io::Error),

    #[error("Ошибка сериализации: {0}")]
    SerializationError(String),

    #[error("Ошибка озвучки: {0}")]
    #[serde(serialize_with = "serialize_display")]
    Speech(#[from] SpeechError),

    #[error(transparent)]
    Segment(#[from] SegmentError),
}

// Функция для сериализации std::io::Error, которая не реализует serde::Serialize
fn serialize_io_error<S>(err: &std::io::Error, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&err.to_string())
}

fn serialize_display<S>(err: &SpeechError, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&err.to_string())
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::SerializationError(err.to_string())
    }
}

impl From<hound::Error> for AppError {
    fn from(err: hound::Error) -> Self {
        AppError::AudioProcessingError(err.to_string())
    }
}

// Result type alias for application
pub type AppResult<T> = Result<T, AppError>;
