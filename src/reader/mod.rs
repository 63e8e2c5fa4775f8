//! # Читалка
//!
//! Очистка вставленного пользователем текста и разбиение его на строки-сегменты,
//! каждый из которых затем озвучивается отдельно.

pub mod sanitizer;
pub mod segments;
pub mod session;

pub use sanitizer::{MAX_INPUT_CHARS, Sanitized, sanitize};
pub use segments::{
    LONG_SEGMENT_CHARS, MAX_SEGMENTS, Segments, extract_segments, has_target_letter,
};
pub use session::ReaderSession;

#[cfg(test)]
mod tests {
    mod test_sanitizer;
    mod test_segments;
    mod test_session;
}
