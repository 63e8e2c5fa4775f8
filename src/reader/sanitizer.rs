//! Очистка пользовательского текста перед озвучкой

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Максимальная длина очищенного текста в символах
pub const MAX_INPUT_CHARS: usize = 5000;

// Разрешены: русские буквы (включая Ё), цифры, пробельные символы и . , ! ? ; : ( ) - —
static DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^а-яА-ЯёЁ0-9\s.,!?;:()\-—]").expect("valid sanitizer regex"));

/// Результат очистки текста
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sanitized {
    pub cleaned: String,
    /// Были ли удалены недопустимые символы
    pub was_filtered: bool,
}

/// Удаляет недопустимые символы, обрезает пробелы по краям и ограничивает длину.
///
/// Недопустимые символы не заменяются, а просто выбрасываются.
pub fn sanitize(input: &str) -> Sanitized {
    let was_filtered = DISALLOWED.is_match(input);
    let filtered = if was_filtered {
        DISALLOWED.replace_all(input, "")
    } else {
        input.into()
    };

    let cleaned = truncate_chars(filtered.trim(), MAX_INPUT_CHARS);

    Sanitized {
        cleaned,
        was_filtered,
    }
}

/// Обрезает исходный текст сразу после `max`-го символа, который переживёт очистку.
///
/// Ведущие пробелы не считаются: `sanitize` их всё равно срежет.
pub(crate) fn bound_raw_text(raw: &str, max: usize) -> &str {
    let mut kept = 0;
    let mut buf = [0u8; 4];
    for (idx, ch) in raw.char_indices() {
        if DISALLOWED.is_match(ch.encode_utf8(&mut buf)) || (kept == 0 && ch.is_whitespace()) {
            continue;
        }
        kept += 1;
        if kept == max {
            return &raw[..idx + ch.len_utf8()];
        }
    }
    raw
}

/// Обрезает строку до `max` символов (кодовых точек)
fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}
