//! # Playback
//!
//! Каждая кнопка озвучки на экране соответствует одному [`PlaybackUnit`] со своим
//! состоянием `Idle -> Loading -> Playing -> Idle`. Ошибки на любом шаге
//! возвращают юнит в `Idle`, отдельного состояния ошибки нет.
//!
//! Состояние юнита публикуется через `tokio::sync::watch`, так что интерфейс
//! может подписаться на изменения. Переход в `Loading` делается атомарно, поэтому
//! повторное нажатие во время загрузки или воспроизведения игнорируется.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, warn};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::errors::AppError;
use crate::events::{AppEvent, EventBus};
use crate::services::audio::{AudioOutput, PlaybackEnd};
use crate::services::tts::{SpeechService, Speed};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    #[default]
    Idle,
    Loading,
    Playing,
}

impl PlaybackState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Playing => "playing",
        }
    }
}

/// Одна кнопка озвучки: текст, темп и текущее состояние
#[derive(Debug)]
pub struct PlaybackUnit {
    id: Uuid,
    text: String,
    speed: Speed,
    state: watch::Sender<PlaybackState>,
    mounted: AtomicBool,
}

impl PlaybackUnit {
    pub fn new(text: impl Into<String>, speed: Speed) -> Self {
        let (state, _) = watch::channel(PlaybackState::Idle);
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            speed,
            state,
            mounted: AtomicBool::new(true),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn speed(&self) -> Speed {
        self.speed
    }

    pub fn state(&self) -> PlaybackState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.state.subscribe()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    /// Кнопка пропала с экрана; начатая загрузка уже не приведёт к звуку
    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }

    fn transition(&self, from: PlaybackState, to: PlaybackState) -> bool {
        self.state.send_if_modified(|state| {
            if *state == from {
                *state = to;
                true
            } else {
                false
            }
        })
    }

    fn reset(&self) {
        self.state.send_replace(PlaybackState::Idle);
    }
}

/// Итог одного нажатия
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Юнит был занят или уже снят с экрана
    Ignored,
    Completed,
    Interrupted,
    /// Озвучка получена, но кнопки на экране уже нет
    Suppressed,
    Failed(String),
}

pub struct PlaybackController {
    speech: Arc<SpeechService>,
    output: Arc<dyn AudioOutput>,
    events: EventBus,
}

impl PlaybackController {
    pub fn new(speech: Arc<SpeechService>, output: Arc<dyn AudioOutput>, events: EventBus) -> Self {
        Self {
            speech,
            output,
            events,
        }
    }

    pub fn unit(&self, text: impl Into<String>, speed: Speed) -> Arc<PlaybackUnit> {
        Arc::new(PlaybackUnit::new(text, speed))
    }

    pub fn speech(&self) -> &SpeechService {
        &self.speech
    }

    pub fn stop_all(&self) {
        self.output.stop_current();
    }

    /// Полный цикл воспроизведения юнита
    pub async fn trigger(&self, unit: &Arc<PlaybackUnit>) -> TriggerOutcome {
        if !unit.is_mounted() {
            debug!("Ignoring trigger for unmounted unit {}", unit.id());
            return TriggerOutcome::Ignored;
        }
        if !unit.transition(PlaybackState::Idle, PlaybackState::Loading) {
            debug!(
                "Ignoring trigger for '{}': unit is {}",
                unit.text(),
                unit.state().as_str()
            );
            return TriggerOutcome::Ignored;
        }
        self.publish(unit);

        let outcome = self.run(unit).await;

        unit.reset();
        self.publish(unit);
        outcome
    }

    /// То же, что `trigger`, но в отдельной задаче, чтобы не блокировать интерфейс
    pub fn spawn_trigger(self: &Arc<Self>, unit: &Arc<PlaybackUnit>) -> JoinHandle<TriggerOutcome> {
        let controller = Arc::clone(self);
        let unit = Arc::clone(unit);
        tokio::spawn(async move { controller.trigger(&unit).await })
    }

    async fn run(&self, unit: &PlaybackUnit) -> TriggerOutcome {
        let audio = match self.speech.acquire(unit.text(), unit.speed()).await {
            Ok(audio) => audio,
            Err(e) => {
                warn!("Speech acquisition failed for '{}'", unit.text());
                return self.fail(e.into());
            }
        };

        if !unit.is_mounted() {
            info!("Unit for '{}' left the screen while loading, not playing", unit.text());
            return TriggerOutcome::Suppressed;
        }

        let session = match self.output.start(unit.id(), &audio).await {
            Ok(session) => session,
            Err(e) => {
                warn!("Failed to start playback for '{}'", unit.text());
                return self.fail(e);
            }
        };

        if unit.transition(PlaybackState::Loading, PlaybackState::Playing) {
            self.publish(unit);
        }

        match session.finished().await {
            PlaybackEnd::Completed => TriggerOutcome::Completed,
            PlaybackEnd::Interrupted => {
                debug!("Playback of '{}' was interrupted", unit.text());
                TriggerOutcome::Interrupted
            }
            PlaybackEnd::Failed(reason) => {
                warn!("Playback of '{}' failed", unit.text());
                self.fail(AppError::AudioProcessingError(reason))
            }
        }
    }

    /// Сообщает об ошибке на шину событий; юнит вернётся в `Idle` в `trigger`
    fn fail(&self, err: AppError) -> TriggerOutcome {
        let reason = err.to_string();
        self.events.emit_error(&err);
        TriggerOutcome::Failed(reason)
    }

    fn publish(&self, unit: &PlaybackUnit) {
        self.events.emit(AppEvent::PlaybackStateChanged {
            unit_id: unit.id(),
            text: unit.text().to_string(),
            speed: unit.speed(),
            state: unit.state(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{AppError, AppResult, SpeechError, SpeechResult};
    use crate::services::audio::PlaybackSession;
    use crate::services::tts::{AudioClip, SpeechAudio, SpeechCapability};
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::sync::{Notify, oneshot};

    /// Движок, который отвечает только после `release`
    struct GatedProvider {
        calls: AtomicUsize,
        gate: Notify,
        fail: bool,
    }

    impl GatedProvider {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                gate: Notify::new(),
                fail,
            })
        }

        fn release(&self) {
            self.gate.notify_one();
        }
    }

    #[async_trait::async_trait]
    impl SpeechCapability for GatedProvider {
        fn name(&self) -> &str {
            "gated"
        }

        async fn try_speak(&self, _text: &str, _speed: Speed) -> SpeechResult<SpeechAudio> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            if self.fail {
                return Err(SpeechError::Unavailable("offline".to_string()));
            }
            Ok(SpeechAudio::new("gated", AudioClip::new(vec![0; 4], 24_000, 1)))
        }
    }

    /// Аудиовыход, который отдаёт управление завершением тесту
    #[derive(Default)]
    struct ManualOutput {
        started: Mutex<Vec<Uuid>>,
        pending: Mutex<Vec<(Uuid, oneshot::Sender<PlaybackEnd>)>>,
        fail_start: bool,
    }

    impl ManualOutput {
        fn finish_all(&self, end: PlaybackEnd) {
            for (_, tx) in self.pending.lock().drain(..) {
                let _ = tx.send(end.clone());
            }
        }
    }

    #[async_trait::async_trait]
    impl AudioOutput for ManualOutput {
        async fn start(&self, owner: Uuid, _audio: &SpeechAudio) -> AppResult<PlaybackSession> {
            if self.fail_start {
                return Err(AppError::AudioProcessingError("device busy".to_string()));
            }
            self.started.lock().push(owner);
            let (tx, session) = PlaybackSession::channel();
            let mut pending = self.pending.lock();
            for (_, previous) in pending.drain(..) {
                let _ = previous.send(PlaybackEnd::Interrupted);
            }
            pending.push((owner, tx));
            Ok(session)
        }

        fn stop_current(&self) {
            self.finish_all(PlaybackEnd::Interrupted);
        }
    }

    fn controller(
        provider: Arc<GatedProvider>,
        output: Arc<ManualOutput>,
    ) -> Arc<PlaybackController> {
        let speech = SpeechService::new(vec![provider as Arc<dyn SpeechCapability>]);
        Arc::new(PlaybackController::new(
            Arc::new(speech),
            output,
            EventBus::new(),
        ))
    }

    async fn wait_for(unit: &PlaybackUnit, state: PlaybackState) {
        let mut rx = unit.subscribe();
        tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| *s == state))
            .await
            .expect("state not reached in time")
            .unwrap();
    }

    #[tokio::test]
    async fn test_double_trigger_acquires_once() {
        let provider = GatedProvider::new(false);
        let output = Arc::new(ManualOutput::default());
        let controller = controller(provider.clone(), output.clone());
        let unit = controller.unit("Привет", Speed::Normal);

        let first = controller.spawn_trigger(&unit);
        wait_for(&unit, PlaybackState::Loading).await;

        // занятый юнит отвечает сразу, без ожидания
        let mut second = tokio_test::task::spawn(controller.trigger(&unit));
        tokio_test::assert_ready_eq!(second.poll(), TriggerOutcome::Ignored);

        provider.release();
        wait_for(&unit, PlaybackState::Playing).await;
        assert_eq!(controller.trigger(&unit).await, TriggerOutcome::Ignored);

        output.finish_all(PlaybackEnd::Completed);
        assert_eq!(first.await.unwrap(), TriggerOutcome::Completed);
        assert_eq!(unit.state(), PlaybackState::Idle);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_state_sequence_is_published() {
        let provider = GatedProvider::new(false);
        let output = Arc::new(ManualOutput::default());
        let controller = controller(provider.clone(), output.clone());
        let unit = controller.unit("дом", Speed::Slow);
        let mut events = controller.events.subscribe();

        let handle = controller.spawn_trigger(&unit);
        wait_for(&unit, PlaybackState::Loading).await;
        provider.release();
        wait_for(&unit, PlaybackState::Playing).await;
        output.finish_all(PlaybackEnd::Completed);
        handle.await.unwrap();

        let mut states = Vec::new();
        while let Ok(AppEvent::PlaybackStateChanged { state, unit_id, .. }) = events.try_recv() {
            assert_eq!(unit_id, unit.id());
            states.push(state);
        }
        assert_eq!(
            states,
            vec![
                PlaybackState::Loading,
                PlaybackState::Playing,
                PlaybackState::Idle
            ]
        );
    }

    #[tokio::test]
    async fn test_acquisition_failure_returns_to_idle() {
        let provider = GatedProvider::new(true);
        let output = Arc::new(ManualOutput::default());
        let controller = controller(provider.clone(), output.clone());
        let unit = controller.unit("мир", Speed::Normal);

        let handle = controller.spawn_trigger(&unit);
        wait_for(&unit, PlaybackState::Loading).await;
        provider.release();

        assert!(matches!(handle.await.unwrap(), TriggerOutcome::Failed(_)));
        assert_eq!(unit.state(), PlaybackState::Idle);
        assert!(output.started.lock().is_empty());

        // после ошибки можно попробовать снова
        let retry = controller.spawn_trigger(&unit);
        wait_for(&unit, PlaybackState::Loading).await;
        provider.release();
        assert!(matches!(retry.await.unwrap(), TriggerOutcome::Failed(_)));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failures_are_reported_as_error_events() {
        let provider = GatedProvider::new(true);
        let output = Arc::new(ManualOutput::default());
        let controller = controller(provider.clone(), output.clone());
        let unit = controller.unit("мир", Speed::Normal);
        let mut events = controller.events.subscribe();

        let handle = controller.spawn_trigger(&unit);
        wait_for(&unit, PlaybackState::Loading).await;
        provider.release();
        handle.await.unwrap();

        let kinds: Vec<String> = std::iter::from_fn(|| events.try_recv().ok())
            .filter_map(|event| match event {
                AppEvent::Error { kind, .. } => Some(kind),
                _ => None,
            })
            .collect();
        assert_eq!(kinds, vec!["speech".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_playback_is_reported() {
        let provider = GatedProvider::new(false);
        let output = Arc::new(ManualOutput::default());
        let controller = controller(provider.clone(), output.clone());
        let unit = controller.unit("дом", Speed::Normal);
        let mut events = controller.events.subscribe();

        let handle = controller.spawn_trigger(&unit);
        wait_for(&unit, PlaybackState::Loading).await;
        provider.release();
        wait_for(&unit, PlaybackState::Playing).await;
        output.finish_all(PlaybackEnd::Failed("player exited with 1".to_string()));

        match handle.await.unwrap() {
            TriggerOutcome::Failed(reason) => assert!(reason.contains("player exited with 1")),
            other => panic!("unexpected outcome: {:?}", other),
        }
        let reported = std::iter::from_fn(|| events.try_recv().ok())
            .any(|event| matches!(event, AppEvent::Error { kind, .. } if kind == "audio"));
        assert!(reported);
        assert_eq!(unit.state(), PlaybackState::Idle);
    }

    #[tokio::test]
    async fn test_output_failure_returns_to_idle() {
        let provider = GatedProvider::new(false);
        let output = Arc::new(ManualOutput {
            fail_start: true,
            ..Default::default()
        });
        let controller = controller(provider.clone(), output);
        let unit = controller.unit("мир", Speed::Normal);

        let handle = controller.spawn_trigger(&unit);
        wait_for(&unit, PlaybackState::Loading).await;
        provider.release();

        assert!(matches!(handle.await.unwrap(), TriggerOutcome::Failed(_)));
        assert_eq!(unit.state(), PlaybackState::Idle);
    }

    #[tokio::test]
    async fn test_unmounted_unit_does_not_play() {
        let provider = GatedProvider::new(false);
        let output = Arc::new(ManualOutput::default());
        let controller = controller(provider.clone(), output.clone());
        let unit = controller.unit("кот", Speed::Normal);

        let handle = controller.spawn_trigger(&unit);
        wait_for(&unit, PlaybackState::Loading).await;
        unit.unmount();
        provider.release();

        assert_eq!(handle.await.unwrap(), TriggerOutcome::Suppressed);
        assert_eq!(unit.state(), PlaybackState::Idle);
        assert!(output.started.lock().is_empty());
        // озвучка всё равно закэширована
        assert_eq!(controller.speech().cache().len(), 1);
        assert_eq!(controller.trigger(&unit).await, TriggerOutcome::Ignored);
    }

    #[tokio::test]
    async fn test_cached_speech_skips_provider() {
        let provider = GatedProvider::new(false);
        let output = Arc::new(ManualOutput::default());
        let controller = controller(provider.clone(), output.clone());
        let first = controller.unit("дом", Speed::Normal);
        let second = controller.unit("дом", Speed::Normal);

        let handle = controller.spawn_trigger(&first);
        wait_for(&first, PlaybackState::Loading).await;
        provider.release();
        wait_for(&first, PlaybackState::Playing).await;
        output.finish_all(PlaybackEnd::Completed);
        handle.await.unwrap();

        let handle = controller.spawn_trigger(&second);
        wait_for(&second, PlaybackState::Playing).await;
        output.finish_all(PlaybackEnd::Completed);
        assert_eq!(handle.await.unwrap(), TriggerOutcome::Completed);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_second_unit_interrupts_first() {
        let provider = GatedProvider::new(false);
        let output = Arc::new(ManualOutput::default());
        let controller = controller(provider.clone(), output.clone());
        let first = controller.unit("один", Speed::Normal);
        let second = controller.unit("два", Speed::Normal);

        let first_handle = controller.spawn_trigger(&first);
        wait_for(&first, PlaybackState::Loading).await;
        provider.release();
        wait_for(&first, PlaybackState::Playing).await;

        let second_handle = controller.spawn_trigger(&second);
        wait_for(&second, PlaybackState::Loading).await;
        provider.release();

        assert_eq!(first_handle.await.unwrap(), TriggerOutcome::Interrupted);
        assert_eq!(first.state(), PlaybackState::Idle);

        wait_for(&second, PlaybackState::Playing).await;
        controller.stop_all();
        assert_eq!(second_handle.await.unwrap(), TriggerOutcome::Interrupted);
        assert_eq!(*output.started.lock(), vec![first.id(), second.id()]);
    }
}
