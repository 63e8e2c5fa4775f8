// Audio services module
// Shared output context and playback through external player programs

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use hound::{SampleFormat, WavSpec, WavWriter};
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use tempfile::TempDir;
use tokio::process::Command;
use tokio::sync::{OnceCell, oneshot};
use uuid::Uuid;

use crate::config::TtsConfig;
use crate::errors::{AppError, AppResult};
use crate::services::tts::{AudioClip, SpeechAudio};
use crate::utils::tools::{ExternalTool, find_first_tool};

/// Чем закончилось воспроизведение
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEnd {
    Completed,
    Interrupted,
    Failed(String),
}

/// Запущенное воспроизведение; завершение приходит через oneshot-канал
pub struct PlaybackSession {
    done: oneshot::Receiver<PlaybackEnd>,
}

impl PlaybackSession {
    pub fn channel() -> (oneshot::Sender<PlaybackEnd>, Self) {
        let (tx, done) = oneshot::channel();
        (tx, Self { done })
    }

    /// Ждёт окончания звука. Оборванный канал считается прерыванием.
    pub async fn finished(self) -> PlaybackEnd {
        self.done.await.unwrap_or(PlaybackEnd::Interrupted)
    }
}

/// Trait for audio sinks used by the playback controller
#[async_trait::async_trait]
pub trait AudioOutput: Send + Sync {
    /// Начинает воспроизведение от имени `owner`; звук другого владельца прерывается
    async fn start(&self, owner: Uuid, audio: &SpeechAudio) -> AppResult<PlaybackSession>;

    /// Останавливает текущий звук, если он есть
    fn stop_current(&self);
}

/// Общий для всего процесса аудиоконтекст.
///
/// Создаётся один раз при первом воспроизведении и стартует приостановленным.
/// `start` возобновляет его перед каждым воспроизведением, после последнего
/// звука он снова засыпает. Флаг только отражает это состояние для наблюдателей,
/// на запуск процессов он не влияет.
pub struct AudioContext {
    work_dir: TempDir,
    player: Option<ExternalTool>,
    suspended: AtomicBool,
}

impl AudioContext {
    fn create(players: &[String]) -> AppResult<Self> {
        let work_dir = tempfile::Builder::new().prefix("azbuka-audio-").tempdir()?;
        let player = find_first_tool(players);
        match &player {
            Some(tool) => info!("Audio context created, player: {}", tool.name),
            None => warn!("Audio context created without a player, remote audio cannot be played"),
        }
        Ok(Self {
            work_dir,
            player,
            suspended: AtomicBool::new(true),
        })
    }

    pub fn work_dir(&self) -> &Path {
        self.work_dir.path()
    }

    pub fn player(&self) -> Option<&ExternalTool> {
        self.player.as_ref()
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::SeqCst)
    }

    pub fn resume(&self) {
        if self.suspended.swap(false, Ordering::SeqCst) {
            debug!("Audio context resumed");
        }
    }

    pub fn suspend(&self) {
        if !self.suspended.swap(true, Ordering::SeqCst) {
            debug!("Audio context suspended");
        }
    }
}

struct ActivePlayback {
    id: Uuid,
    owner: Uuid,
    kill: oneshot::Sender<()>,
}

/// Воспроизведение PCM через системный плеер
pub struct SystemAudioOutput {
    players: Vec<String>,
    context: OnceCell<Arc<AudioContext>>,
    current: Arc<Mutex<Option<ActivePlayback>>>,
}

impl SystemAudioOutput {
    pub fn new(players: Vec<String>) -> Self {
        Self {
            players,
            context: OnceCell::new(),
            current: Arc::new(Mutex::new(None)),
        }
    }

    pub fn from_config(config: &TtsConfig) -> Self {
        Self::new(config.players.clone())
    }

    /// Ленивая инициализация общего контекста
    pub async fn context(&self) -> AppResult<&Arc<AudioContext>> {
        self.context
            .get_or_try_init(|| async { AudioContext::create(&self.players).map(Arc::new) })
            .await
    }

    /// Владелец звука, который играет прямо сейчас
    pub fn current_owner(&self) -> Option<Uuid> {
        self.current.lock().as_ref().map(|active| active.owner)
    }

    fn build_command(context: &AudioContext, audio: &SpeechAudio) -> AppResult<Command> {
        let player = context.player().ok_or_else(|| {
            AppError::AudioProcessingError("No audio player found in PATH".to_string())
        })?;
        let path = write_wav(&audio.clip, context.work_dir())?;
        Ok(player_command(player, &path))
    }

    /// Запускает процесс воспроизведения и делает его текущим, прерывая предыдущий
    async fn start_process(&self, owner: Uuid, mut command: Command) -> AppResult<PlaybackSession> {
        let context = self.context().await?.clone();
        context.resume();

        let mut child = command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        let id = Uuid::new_v4();
        let (kill_tx, kill_rx) = oneshot::channel();
        let previous = self.current.lock().replace(ActivePlayback {
            id,
            owner,
            kill: kill_tx,
        });
        if let Some(previous) = previous {
            if previous.owner != owner {
                debug!("Interrupting playback owned by {}", previous.owner);
            }
            let _ = previous.kill.send(());
        }

        let (done_tx, session) = PlaybackSession::channel();
        let current = Arc::clone(&self.current);

        tokio::spawn(async move {
            let end = tokio::select! {
                status = child.wait() => match status {
                    Ok(status) if status.success() => PlaybackEnd::Completed,
                    Ok(status) => PlaybackEnd::Failed(format!("player exited with {}", status)),
                    Err(e) => PlaybackEnd::Failed(e.to_string()),
                },
                _ = kill_rx => {
                    if let Err(e) = child.kill().await {
                        error!("Failed to stop playback process: {}", e);
                    }
                    PlaybackEnd::Interrupted
                }
            };

            {
                let mut current = current.lock();
                if current.as_ref().is_some_and(|active| active.id == id) {
                    *current = None;
                }
                if current.is_none() {
                    context.suspend();
                }
            }

            debug!("Playback {} for {} finished: {:?}", id, owner, end);
            let _ = done_tx.send(end);
        });

        Ok(session)
    }
}

#[async_trait::async_trait]
impl AudioOutput for SystemAudioOutput {
    async fn start(&self, owner: Uuid, audio: &SpeechAudio) -> AppResult<PlaybackSession> {
        let context = self.context().await?.clone();
        let command = Self::build_command(&context, audio)?;
        debug!(
            "Playing {:.2}s from {} for {}",
            audio.clip.duration().as_secs_f32(),
            audio.engine,
            owner
        );
        self.start_process(owner, command).await
    }

    fn stop_current(&self) {
        if let Some(active) = self.current.lock().take() {
            info!("Stopping playback owned by {}", active.owner);
            let _ = active.kill.send(());
        }
    }
}

fn player_command(player: &ExternalTool, path: &Path) -> Command {
    let mut command = Command::new(&player.path);
    if player.program_name() == "ffplay" {
        command.args(["-nodisp", "-autoexit", "-loglevel", "quiet"]);
    }
    command.arg(path);
    command
}

/// Сохраняет клип как WAV; имя файла строится из md5 содержимого, повторная запись не нужна
pub fn write_wav(clip: &AudioClip, dir: &Path) -> AppResult<PathBuf> {
    let mut hasher = md5::Context::new();
    hasher.consume(clip.sample_rate.to_le_bytes());
    hasher.consume(clip.channels.to_le_bytes());
    for sample in &clip.samples {
        hasher.consume(sample.to_le_bytes());
    }
    let path = dir.join(format!("{:x}.wav", hasher.compute()));
    if path.exists() {
        return Ok(path);
    }

    let spec = WavSpec {
        channels: clip.channels,
        sample_rate: clip.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(&path, spec)?;
    for &sample in &clip.samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    debug!("Wrote {} samples to {}", clip.samples.len(), path.display());
    Ok(path)
}
