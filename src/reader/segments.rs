use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::errors::SegmentError;

/// Максимальное количество сегментов в одном тексте
pub const MAX_SEGMENTS: usize = 100;
/// Сегменты длиннее этого требуют подтверждения пользователя
pub const LONG_SEGMENT_CHARS: usize = 200;

static CYRILLIC_LETTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[а-яА-ЯёЁ]").expect("valid segment regex"));

/// Строки текста, пригодные для озвучки
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segments {
    pub items: Vec<String>,
    /// Есть хотя бы один сегмент длиннее `LONG_SEGMENT_CHARS`
    pub has_long_segment: bool,
}

impl Segments {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn long_segment_indices(&self) -> Vec<usize> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, segment)| is_long(segment))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Склеивает сегменты обратно в текст, по строке на сегмент
    pub fn joined(&self) -> String {
        self.items.join("\n")
    }
}

/// Содержит ли строка хотя бы одну русскую букву
pub fn has_target_letter(text: &str) -> bool {
    CYRILLIC_LETTER.is_match(text)
}

fn is_long(segment: &str) -> bool {
    segment.chars().count() > LONG_SEGMENT_CHARS
}

/// Делит очищенный текст на строки, отбрасывая строки без русских букв.
///
/// Порядок строк сохраняется, повторы не удаляются.
pub fn extract_segments(cleaned: &str) -> Result<Segments, SegmentError> {
    let items: Vec<String> = cleaned
        .split('\n')
        .map(str::trim)
        .filter(|line| has_target_letter(line))
        .map(str::to_string)
        .collect();

    if items.is_empty() {
        return Err(SegmentError::EmptyInput);
    }

    if items.len() > MAX_SEGMENTS {
        return Err(SegmentError::TooManySegments {
            count: items.len(),
            limit: MAX_SEGMENTS,
        });
    }

    let has_long_segment = items.iter().any(|segment| is_long(segment));

    Ok(Segments {
        items,
        has_long_segment,
    })
}
