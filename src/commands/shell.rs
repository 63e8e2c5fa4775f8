use std::sync::Arc;
use std::time::Instant;

use log::{debug, warn};

use super::parser::{Command, parse_command};
use super::render::{HELP, long_segments_prompt, render_screen, segment_error_message, ui};
use crate::events::{AppEvent, EventBus};
use crate::playback::{PlaybackController, PlaybackState};
use crate::router::{Action, Transition, ViewRouter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellResponse {
    Output(String),
    Quit,
}

/// Интерактивная оболочка: строка ввода -> действие роутера или запуск озвучки
pub struct Shell {
    router: ViewRouter,
    controller: Arc<PlaybackController>,
    events: EventBus,
}

impl Shell {
    pub fn new(router: ViewRouter, controller: Arc<PlaybackController>, events: EventBus) -> Self {
        Self {
            router,
            controller,
            events,
        }
    }

    pub fn router(&self) -> &ViewRouter {
        &self.router
    }

    pub fn render(&self, now: Instant) -> String {
        render_screen(&self.router, now)
    }

    /// Должна вызываться внутри рантайма tokio: озвучка запускается отдельной задачей
    pub fn handle_line(&mut self, line: &str, now: Instant) -> ShellResponse {
        let command = match parse_command(line, &self.router) {
            Ok(command) => command,
            Err(e) => {
                debug!("Rejected input '{}': {}", line, e);
                return ShellResponse::Output(format!("{}\nType 'help' for the list of commands.", e));
            }
        };

        match command {
            Command::Navigate(action) => self.apply(action, now),
            Command::AppendText(line) => {
                let text = match self.router.reader().map(|session| session.raw_text()) {
                    Some(existing) if !existing.is_empty() => format!("{}\n{}", existing, line),
                    _ => line,
                };
                self.apply(Action::EditReader(text), now)
            }
            Command::ClearText => self.apply(Action::EditReader(String::new()), now),
            Command::Play(number) => ShellResponse::Output(self.play(number)),
            Command::Stop => {
                self.controller.stop_all();
                ShellResponse::Output(String::new())
            }
            Command::Show => ShellResponse::Output(self.render(now)),
            Command::Help => ShellResponse::Output(HELP.to_string()),
            Command::Quit => {
                self.controller.stop_all();
                ShellResponse::Quit
            }
        }
    }

    fn apply(&mut self, action: Action, now: Instant) -> ShellResponse {
        let lang = self.router.language();
        let output = match self.router.dispatch(action, now) {
            Transition::Navigated { from, to } => {
                self.events.emit(AppEvent::ScreenChanged { from, to });
                self.render(now)
            }
            Transition::Edited { notice_shown, .. } => {
                if notice_shown {
                    self.events.emit(AppEvent::NoticeShown {
                        message: ui(lang).reader_warning_special.to_string(),
                    });
                }
                self.render(now)
            }
            Transition::Updated | Transition::Unchanged => self.render(now),
            Transition::Blocked(err) => segment_error_message(&err, lang),
            Transition::NeedsConfirmation { long_segments } => {
                long_segments_prompt(&long_segments, lang)
            }
            Transition::NotFound(id) => format!("{}: {}", ui(lang).not_found, id),
        };
        ShellResponse::Output(output)
    }

    fn play(&self, number: usize) -> String {
        let lang = self.router.language();
        let Some(control) = number.checked_sub(1).and_then(|idx| self.router.control(idx)) else {
            return format!("{} {}", ui(lang).no_control, number);
        };

        let unit = &control.unit;
        if unit.state() != PlaybackState::Idle {
            debug!("Unit {} is {}, trigger ignored", number, unit.state().as_str());
            return String::new();
        }
        if !self.controller.speech().has_providers() {
            warn!("Playback requested but no speech backend is available");
        }

        self.controller.spawn_trigger(unit);
        format!("{}. {}", number, unit.text())
    }
}
