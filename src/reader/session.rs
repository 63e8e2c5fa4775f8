use serde::Serialize;

use super::sanitizer::{MAX_INPUT_CHARS, Sanitized, bound_raw_text, sanitize};
use super::segments::{Segments, extract_segments};
use crate::errors::SegmentError;

/// Состояние редактора читалки.
///
/// Очищенный текст и сегменты всегда пересчитываются из исходного текста целиком.
#[derive(Debug, Clone, Serialize)]
pub struct ReaderSession {
    raw_text: String,
    sanitized: Sanitized,
    segments: Result<Segments, SegmentError>,
}

impl Default for ReaderSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ReaderSession {
    pub fn new() -> Self {
        Self::from_text("")
    }

    pub fn from_text(raw: &str) -> Self {
        // лимит считается по очищенному тексту, мусор в начале не съедает его
        let sanitized = sanitize(raw);
        let raw_text = bound_raw_text(raw, MAX_INPUT_CHARS).to_string();
        let segments = extract_segments(&sanitized.cleaned);
        Self {
            raw_text,
            sanitized,
            segments,
        }
    }

    /// Заменяет текст целиком; возвращает `true`, если были удалены недопустимые символы
    pub fn set_raw_text(&mut self, raw: &str) -> bool {
        *self = Self::from_text(raw);
        self.sanitized.was_filtered
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn cleaned(&self) -> &str {
        &self.sanitized.cleaned
    }

    pub fn was_filtered(&self) -> bool {
        self.sanitized.was_filtered
    }

    pub fn segments(&self) -> Result<&Segments, &SegmentError> {
        self.segments.as_ref()
    }

    /// Длина очищенного текста в символах, для счётчика "N / 5000"
    pub fn char_count(&self) -> usize {
        self.sanitized.cleaned.chars().count()
    }

    /// Кнопку подтверждения можно нажать, только если после очистки что-то осталось
    pub fn can_confirm(&self) -> bool {
        !self.sanitized.cleaned.trim().is_empty()
    }
}
