// Events module
// Contains event handling and emitting logic

use log::{debug, error};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::errors::AppError;
use crate::playback::PlaybackState;
use crate::router::Screen;
use crate::services::tts::Speed;

const EVENT_CAPACITY: usize = 64;

/// События приложения для интерфейса
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppEvent {
    PlaybackStateChanged {
        unit_id: Uuid,
        text: String,
        speed: Speed,
        state: PlaybackState,
    },
    ScreenChanged {
        from: Screen,
        to: Screen,
    },
    NoticeShown {
        message: String,
    },
    Error {
        kind: String,
        message: String,
    },
}

impl AppEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::PlaybackStateChanged { .. } => "playback-state-changed",
            Self::ScreenChanged { .. } => "screen-changed",
            Self::NoticeShown { .. } => "notice-shown",
            Self::Error { .. } => "error",
        }
    }
}

/// Шина событий поверх broadcast-канала; клонируется дёшево
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<AppEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }

    /// Emit an event to all listeners
    pub fn emit(&self, event: AppEvent) {
        let name = event.name();
        match self.sender.send(event) {
            Ok(listeners) => debug!("Emitted event: {} ({} listeners)", name, listeners),
            Err(_) => debug!("Event {} dropped: no listeners", name),
        }
    }

    pub fn emit_error(&self, err: &AppError) {
        error!("{}", err);
        self.emit(AppEvent::Error {
            kind: error_kind(err).to_string(),
            message: err.to_string(),
        });
    }
}

fn error_kind(err: &AppError) -> &'static str {
    match err {
        AppError::ConfigurationError(_) => "configuration",
        AppError::AudioProcessingError(_) => "audio",
        AppError::IoError(_) => "io",
        AppError::SerializationError(_) => "serialization",
        AppError::Speech(_) => "speech",
        AppError::Segment(_) => "segment",
    }
}
