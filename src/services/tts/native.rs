//! Локальный синтезатор речи.
//!
//! Программа синтеза (espeak-ng, espeak, say) пишет фразу во временный WAV,
//! который сразу читается в [`AudioClip`]. Так ошибка синтеза видна ещё до
//! кэширования, и сервис может перейти к следующему движку.

use std::path::Path;
use std::process::Stdio;

use hound::{SampleFormat, WavReader};
use log::debug;
use tokio::process::Command;

use super::{AudioClip, SpeechAudio, SpeechCapability, Speed};
use crate::config::TtsConfig;
use crate::errors::{SpeechError, SpeechResult};
use crate::utils::tools::{ExternalTool, find_first_tool};

/// Фраза для локального синтезатора
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    /// Языковой тег, например "ru-RU"
    pub locale: String,
    /// Множитель скорости (1.0 обычная, 0.75 медленная)
    pub rate: f32,
    pub words_per_minute: u32,
    /// Голос для `say`, у которого нет выбора по языку
    pub voice: String,
}

impl Utterance {
    /// Основной язык из тега: "ru-RU" -> "ru"
    pub fn language(&self) -> String {
        self.locale
            .split(['-', '_'])
            .next()
            .unwrap_or("ru")
            .to_lowercase()
    }

    /// Аргументы командной строки, с которыми программа пишет фразу в `output`
    pub fn command_args(&self, program: &str, output: &Path) -> Vec<String> {
        let wpm = self.words_per_minute.to_string();
        let output = output.display().to_string();
        match program {
            "say" => vec![
                "-v".to_string(),
                self.voice.clone(),
                "-r".to_string(),
                wpm,
                "-o".to_string(),
                output,
                "--data-format=LEI16@22050".to_string(),
                "--".to_string(),
                self.text.clone(),
            ],
            // espeak-ng, espeak и совместимые
            _ => vec![
                "-v".to_string(),
                self.language(),
                "-s".to_string(),
                wpm,
                "-w".to_string(),
                output,
                "--".to_string(),
                self.text.clone(),
            ],
        }
    }
}

pub struct NativeSynthesizer {
    tool: ExternalTool,
    config: TtsConfig,
}

impl NativeSynthesizer {
    pub fn new(tool: ExternalTool, config: &TtsConfig) -> Self {
        Self {
            tool,
            config: config.clone(),
        }
    }

    /// Ищет программу синтеза из списка в конфигурации
    pub fn detect(config: &TtsConfig) -> Option<Self> {
        find_first_tool(&config.native.programs).map(|tool| Self::new(tool, config))
    }

    pub fn utterance(&self, text: &str, speed: Speed) -> Utterance {
        let rate = self.config.rate_for(speed);
        let base = self.config.native.words_per_minute as f32;
        Utterance {
            text: text.to_string(),
            locale: self.config.native.locale.clone(),
            rate,
            words_per_minute: (base * rate).round().max(1.0) as u32,
            voice: self.config.native.say_voice.clone(),
        }
    }

    async fn render(&self, utterance: &Utterance) -> SpeechResult<AudioClip> {
        let output = tempfile::Builder::new()
            .prefix("azbuka-tts-")
            .suffix(".wav")
            .tempfile()
            .map_err(|e| SpeechError::Unavailable(format!("cannot create temp file: {}", e)))?;

        let result = Command::new(&self.tool.path)
            .args(utterance.command_args(self.tool.program_name(), output.path()))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| SpeechError::Unavailable(format!("{} failed to start: {}", self.tool.name, e)))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(SpeechError::Unavailable(format!(
                "{} exited with {}: {}",
                self.tool.name,
                result.status,
                stderr.trim()
            )));
        }

        read_wav(output.path())
    }
}

/// Читает 16-битный WAV, записанный синтезатором
pub fn read_wav(path: &Path) -> SpeechResult<AudioClip> {
    let reader = WavReader::open(path).map_err(|e| SpeechError::InvalidAudio(e.to_string()))?;
    let spec = reader.spec();
    if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(SpeechError::InvalidAudio(format!(
            "unsupported WAV format: {:?} {} bit",
            spec.sample_format, spec.bits_per_sample
        )));
    }

    let samples = reader
        .into_samples::<i16>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| SpeechError::InvalidAudio(e.to_string()))?;
    if samples.is_empty() {
        return Err(SpeechError::EmptyResponse);
    }
    Ok(AudioClip::new(samples, spec.sample_rate, spec.channels))
}

#[async_trait::async_trait]
impl SpeechCapability for NativeSynthesizer {
    fn name(&self) -> &str {
        "native"
    }

    async fn try_speak(&self, text: &str, speed: Speed) -> SpeechResult<SpeechAudio> {
        if text.trim().is_empty() {
            return Err(SpeechError::EmptyText);
        }
        if !self.tool.path.exists() {
            return Err(SpeechError::Unavailable(format!(
                "{} disappeared from {}",
                self.tool.name,
                self.tool.path.display()
            )));
        }

        let utterance = self.utterance(text, speed);
        debug!(
            "Synthesizing with {} at {} wpm: '{}'",
            self.tool.name, utterance.words_per_minute, text
        );
        let clip = self.render(&utterance).await?;
        Ok(SpeechAudio::new(self.name(), clip))
    }
}
