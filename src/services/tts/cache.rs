//! Кэш результатов озвучки
//!
//! Ключ кэша: текст и темп. Кэш живёт всё время работы процесса и не вытесняет записи,
//! так как тексты короткие и их количество ограничено сессией.

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use parking_lot::Mutex;

use super::{SpeechAudio, Speed};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    text: String,
    speed: Speed,
}

impl CacheKey {
    fn new(text: &str, speed: Speed) -> Self {
        Self {
            text: text.to_string(),
            speed,
        }
    }
}

/// Структура для управления кэшем
#[derive(Debug, Default)]
pub struct SpeechCache {
    entries: Mutex<HashMap<CacheKey, Arc<SpeechAudio>>>,
}

impl SpeechCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, text: &str, speed: Speed) -> Option<Arc<SpeechAudio>> {
        self.entries.lock().get(&CacheKey::new(text, speed)).cloned()
    }

    /// Добавляет результат в кэш и возвращает разделяемую ссылку на него
    pub fn put(&self, text: &str, speed: Speed, audio: SpeechAudio) -> Arc<SpeechAudio> {
        let audio = Arc::new(audio);
        let mut entries = self.entries.lock();
        entries.insert(CacheKey::new(text, speed), audio.clone());
        debug!("Speech cache now holds {} entries", entries.len());
        audio
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}
