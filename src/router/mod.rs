//! # View Router
//!
//! Текущий экран, выбранные буква и правило, фильтр алфавита, сессия читалки и
//! набор кнопок озвучки, видимых на экране. Все переходы синхронные: роутер лишь
//! создаёт и снимает с экрана [`PlaybackUnit`], а само воспроизведение запускает
//! вызывающий код.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use serde::Serialize;

use crate::catalog::{Catalog, CategoryFilter};
use crate::errors::SegmentError;
use crate::models::{Language, LetterEntry, PhonicsRuleEntry};
use crate::playback::PlaybackUnit;
use crate::reader::ReaderSession;
use crate::services::tts::Speed;

/// Сколько висит предупреждение об удалённых символах
pub const NOTICE_DURATION: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    Home,
    Alphabet,
    Rules,
    LetterDetail,
    RuleDetail,
    Reader,
    ReaderOutput,
}

impl Screen {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Alphabet => "alphabet",
            Self::Rules => "rules",
            Self::LetterDetail => "letter_detail",
            Self::RuleDetail => "rule_detail",
            Self::Reader => "reader",
            Self::ReaderOutput => "reader_output",
        }
    }

    /// Куда ведёт кнопка "назад"
    pub fn back_target(&self) -> Screen {
        match self {
            Self::LetterDetail => Self::Alphabet,
            Self::RuleDetail => Self::Rules,
            Self::ReaderOutput => Self::Reader,
            _ => Self::Home,
        }
    }

    fn keeps_reader(&self) -> bool {
        matches!(self, Self::Reader | Self::ReaderOutput)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    GoHome,
    OpenAlphabet,
    OpenRules,
    OpenReader,
    SetCategory(CategoryFilter),
    SelectLetter(String),
    SelectRule(String),
    EditReader(String),
    ConfirmReader,
    AnswerLongSegments(bool),
    Back,
    ToggleLanguage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Navigated { from: Screen, to: Screen },
    Updated,
    Unchanged,
    /// Текст читалки изменён
    Edited { filtered: bool, notice_shown: bool },
    /// Переход к прослушиванию заблокирован
    Blocked(SegmentError),
    /// Есть слишком длинные сегменты, нужен ответ пользователя
    NeedsConfirmation { long_segments: Vec<usize> },
    NotFound(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notice {
    shown_at: Instant,
}

impl Notice {
    pub fn expires_at(&self) -> Instant {
        self.shown_at + NOTICE_DURATION
    }

    pub fn is_active(&self, now: Instant) -> bool {
        now < self.expires_at()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlRole {
    LetterName,
    Pronunciation,
    Example,
    Segment,
}

/// Кнопка озвучки на текущем экране
#[derive(Debug, Clone)]
pub struct AudioControl {
    pub role: ControlRole,
    pub unit: Arc<PlaybackUnit>,
}

pub struct ViewRouter {
    catalog: Arc<Catalog>,
    screen: Screen,
    language: Language,
    selected_letter: Option<String>,
    selected_rule: Option<String>,
    filter: CategoryFilter,
    reader: Option<ReaderSession>,
    pending_confirmation: Option<Vec<usize>>,
    output_segments: Vec<String>,
    notice: Option<Notice>,
    controls: Vec<AudioControl>,
}

impl ViewRouter {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            screen: Screen::Home,
            language: Language::default(),
            selected_letter: None,
            selected_rule: None,
            filter: CategoryFilter::All,
            reader: None,
            pending_confirmation: None,
            output_segments: Vec::new(),
            notice: None,
            controls: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn filter(&self) -> CategoryFilter {
        self.filter
    }

    pub fn filtered_letters(&self) -> Vec<&LetterEntry> {
        self.catalog.filtered_letters(self.filter)
    }

    pub fn quick_start(&self) -> &[LetterEntry] {
        self.catalog.quick_start()
    }

    pub fn selected_letter(&self) -> Option<&LetterEntry> {
        self.selected_letter
            .as_deref()
            .and_then(|id| self.catalog.letter(id))
    }

    pub fn selected_rule(&self) -> Option<&PhonicsRuleEntry> {
        self.selected_rule
            .as_deref()
            .and_then(|id| self.catalog.rule(id))
    }

    pub fn reader(&self) -> Option<&ReaderSession> {
        self.reader.as_ref()
    }

    pub fn pending_confirmation(&self) -> Option<&[usize]> {
        self.pending_confirmation.as_deref()
    }

    pub fn output_segments(&self) -> &[String] {
        &self.output_segments
    }

    pub fn controls(&self) -> &[AudioControl] {
        &self.controls
    }

    pub fn control(&self, index: usize) -> Option<&AudioControl> {
        self.controls.get(index)
    }

    /// Активное предупреждение, если оно ещё не истекло
    pub fn notice(&self, now: Instant) -> Option<Notice> {
        self.notice.filter(|notice| notice.is_active(now))
    }

    pub fn dispatch(&mut self, action: Action, now: Instant) -> Transition {
        if self.notice.is_some_and(|notice| !notice.is_active(now)) {
            self.notice = None;
        }
        debug!("Dispatching {:?} on {}", action, self.screen.as_str());

        match action {
            Action::GoHome => self.navigate(Screen::Home),
            Action::OpenAlphabet => self.navigate(Screen::Alphabet),
            Action::OpenRules => self.navigate(Screen::Rules),
            Action::OpenReader => self.navigate(Screen::Reader),
            Action::Back => self.navigate(self.screen.back_target()),
            Action::SetCategory(filter) => {
                if self.filter == filter {
                    return Transition::Unchanged;
                }
                self.filter = filter;
                Transition::Updated
            }
            Action::SelectLetter(id) => {
                if self.catalog.letter(&id).is_none() {
                    warn!("Unknown letter id: {}", id);
                    return Transition::NotFound(id);
                }
                self.selected_letter = Some(id);
                self.enter(Screen::LetterDetail)
            }
            Action::SelectRule(id) => {
                if self.catalog.rule(&id).is_none() {
                    warn!("Unknown rule id: {}", id);
                    return Transition::NotFound(id);
                }
                self.selected_rule = Some(id);
                self.enter(Screen::RuleDetail)
            }
            Action::EditReader(text) => self.edit_reader(&text, now),
            Action::ConfirmReader => self.confirm_reader(),
            Action::AnswerLongSegments(accepted) => self.answer_long_segments(accepted),
            Action::ToggleLanguage => {
                self.language = self.language.toggle();
                Transition::Updated
            }
        }
    }

    fn navigate(&mut self, to: Screen) -> Transition {
        if self.screen == to {
            return Transition::Unchanged;
        }
        self.enter(to)
    }

    /// Переход на экран с пересозданием кнопок, даже если экран тот же
    fn enter(&mut self, to: Screen) -> Transition {
        let from = self.screen;
        self.unmount_controls();
        self.screen = to;
        self.pending_confirmation = None;

        if !to.keeps_reader() {
            if self.reader.take().is_some() {
                debug!("Reader session discarded");
            }
            self.output_segments.clear();
        } else if self.reader.is_none() {
            self.reader = Some(ReaderSession::new());
        }

        self.controls = self.build_controls();
        info!("Screen: {} -> {}", from.as_str(), to.as_str());
        Transition::Navigated { from, to }
    }

    fn edit_reader(&mut self, text: &str, now: Instant) -> Transition {
        let Some(session) = self.reader.as_mut() else {
            warn!("Reader text edited outside of the reader screen");
            return Transition::Unchanged;
        };
        if self.screen != Screen::Reader {
            return Transition::Unchanged;
        }

        let filtered = session.set_raw_text(text);
        self.pending_confirmation = None;

        // уже показанное предупреждение не продлевается
        let notice_shown = filtered && self.notice.is_none();
        if notice_shown {
            self.notice = Some(Notice { shown_at: now });
        }
        Transition::Edited {
            filtered,
            notice_shown,
        }
    }

    fn confirm_reader(&mut self) -> Transition {
        if self.screen != Screen::Reader {
            return Transition::Unchanged;
        }
        let Some(session) = self.reader.as_ref() else {
            return Transition::Unchanged;
        };

        match session.segments() {
            Err(e) => {
                info!("Reader input blocked: {}", e);
                Transition::Blocked(e.clone())
            }
            Ok(segments) if segments.has_long_segment => {
                let long_segments = segments.long_segment_indices();
                self.pending_confirmation = Some(long_segments.clone());
                Transition::NeedsConfirmation { long_segments }
            }
            Ok(segments) => {
                self.output_segments = segments.items.clone();
                self.enter(Screen::ReaderOutput)
            }
        }
    }

    fn answer_long_segments(&mut self, accepted: bool) -> Transition {
        if self.pending_confirmation.take().is_none() {
            return Transition::Unchanged;
        }
        if !accepted {
            debug!("Long segments declined, staying in the editor");
            return Transition::Updated;
        }

        let items = self
            .reader
            .as_ref()
            .and_then(|session| session.segments().ok())
            .map(|segments| segments.items.clone());
        match items {
            Some(items) => {
                self.output_segments = items;
                self.enter(Screen::ReaderOutput)
            }
            None => Transition::Unchanged,
        }
    }

    fn unmount_controls(&mut self) {
        for control in self.controls.drain(..) {
            control.unit.unmount();
        }
    }

    fn build_controls(&self) -> Vec<AudioControl> {
        let mut controls = Vec::new();
        let mut push = |role: ControlRole, text: &str, speed: Speed| {
            controls.push(AudioControl {
                role,
                unit: Arc::new(PlaybackUnit::new(text, speed)),
            });
        };

        match self.screen {
            Screen::LetterDetail => {
                if let Some(letter) = self.selected_letter() {
                    push(ControlRole::LetterName, &letter.name, Speed::Normal);
                    for pronunciation in &letter.pronunciations {
                        push(ControlRole::Pronunciation, &pronunciation.audio_prompt, Speed::Normal);
                    }
                    for example in &letter.examples {
                        push(ControlRole::Example, &example.word, Speed::Normal);
                        push(ControlRole::Example, &example.word, Speed::Slow);
                    }
                }
            }
            Screen::RuleDetail => {
                if let Some(rule) = self.selected_rule() {
                    for example in &rule.examples {
                        push(ControlRole::Example, &example.word, Speed::Normal);
                        push(ControlRole::Example, &example.word, Speed::Slow);
                    }
                }
            }
            Screen::ReaderOutput => {
                for segment in &self.output_segments {
                    push(ControlRole::Segment, segment, Speed::Normal);
                    push(ControlRole::Segment, segment, Speed::Slow);
                }
            }
            _ => {}
        }
        controls
    }
}
