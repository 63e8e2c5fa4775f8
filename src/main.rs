use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use log::{error, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};

use azbuka::catalog::Catalog;
use azbuka::commands::{Shell, ShellResponse};
use azbuka::config::AppConfig;
use azbuka::events::{AppEvent, EventBus};
use azbuka::playback::PlaybackController;
use azbuka::router::ViewRouter;
use azbuka::services::audio::SystemAudioOutput;
use azbuka::services::tts::{SpeechService, build_providers};
use azbuka::utils;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Инициализируем логгер с тонкой настройкой
    utils::logger::init_logger();

    // Ошибка в конфигурации не должна мешать запуску
    let config = AppConfig::load().unwrap_or_else(|e| {
        error!("Failed to load configuration, using defaults: {}", e);
        AppConfig::from_env()
    });

    let catalog = Catalog::load_embedded().context("embedded catalog is invalid")?;
    info!(
        "Loaded {} letters and {} rules",
        catalog.letters().len(),
        catalog.rules().len()
    );

    let speech = Arc::new(SpeechService::new(build_providers(&config)));
    if !speech.has_providers() {
        warn!("Audio buttons will stay silent: no speech backend available");
    }

    let events = EventBus::new();
    let output = Arc::new(SystemAudioOutput::from_config(&config.tts));
    let controller = Arc::new(PlaybackController::new(speech, output, events.clone()));
    let mut shell = Shell::new(ViewRouter::new(Arc::new(catalog)), controller, events.clone());

    // Состояния кнопок озвучки печатаются по мере изменения
    let mut listener = events.subscribe();
    tokio::spawn(async move {
        loop {
            match listener.recv().await {
                Ok(AppEvent::PlaybackStateChanged { text, speed, state, .. }) => {
                    println!("  [{}] {} ({})", state.as_str(), text, speed.as_str());
                }
                Ok(AppEvent::Error { message, .. }) => println!("  (!) {}", message),
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Event listener lagged, {} events skipped", skipped);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    println!("{}", shell.render(Instant::now()));
    prompt()?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        match shell.handle_line(&line, Instant::now()) {
            ShellResponse::Output(text) => {
                if !text.is_empty() {
                    println!("{}", text);
                }
            }
            ShellResponse::Quit => break,
        }
        prompt()?;
    }

    info!("Bye");
    Ok(())
}

fn prompt() -> anyhow::Result<()> {
    print!("> ");
    std::io::stdout().flush().context("failed to flush stdout")?;
    Ok(())
}
