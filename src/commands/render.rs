use std::fmt::Write;
use std::time::Instant;

use crate::catalog::CategoryFilter;
use crate::errors::SegmentError;
use crate::models::{Category, Language};
use crate::reader::MAX_INPUT_CHARS;
use crate::router::{AudioControl, ControlRole, Screen, ViewRouter};
use crate::services::tts::Speed;

/// Подписи интерфейса на одном языке
pub struct UiText {
    pub app_title: &'static str,
    pub subtitle: &'static str,
    pub alphabet: &'static str,
    pub browse_letters: &'static str,
    pub rules: &'static str,
    pub sound_encyclopedia: &'static str,
    pub reader: &'static str,
    pub listen_custom_text: &'static str,
    pub quick_start: &'static str,
    pub all: &'static str,
    pub pronunciation: &'static str,
    pub examples: &'static str,
    pub reader_placeholder: &'static str,
    pub reader_warning_special: &'static str,
    pub reader_empty: &'static str,
    pub reader_warning_limit: &'static str,
    pub reader_warning_long: &'static str,
    pub not_found: &'static str,
    pub no_control: &'static str,
    pub slow: &'static str,
}

const EN: UiText = UiText {
    app_title: "Azbuka",
    subtitle: "Russian alphabet and phonics",
    alphabet: "Alphabet",
    browse_letters: "Browse all 33 letters",
    rules: "Rules",
    sound_encyclopedia: "Reading rules and sound changes",
    reader: "Reader",
    listen_custom_text: "Listen to your own Russian text",
    quick_start: "Quick start",
    all: "All",
    pronunciation: "Pronunciation",
    examples: "Examples",
    reader_placeholder: "Type or paste Russian text, one segment per line. 'confirm' when done.",
    reader_warning_special: "Special characters were removed",
    reader_empty: "Please enter some Russian text first",
    reader_warning_limit: "Too many lines: at most 100 segments are supported",
    reader_warning_long: "Some lines are longer than 200 characters. Continue anyway? (yes/no)",
    not_found: "Not found",
    no_control: "No audio control with number",
    slow: "slow",
};

const ZH: UiText = UiText {
    app_title: "Azbuka 俄语字母",
    subtitle: "俄语字母与发音规则",
    alphabet: "字母表",
    browse_letters: "浏览全部 33 个字母",
    rules: "发音规则",
    sound_encyclopedia: "读音规则与音变",
    reader: "朗读器",
    listen_custom_text: "朗读你自己的俄语文本",
    quick_start: "快速开始",
    all: "全部",
    pronunciation: "发音",
    examples: "例词",
    reader_placeholder: "输入或粘贴俄语文本，每行一段。完成后输入 'confirm'。",
    reader_warning_special: "已移除特殊字符",
    reader_empty: "请先输入俄语文本",
    reader_warning_limit: "行数过多：最多支持 100 段",
    reader_warning_long: "部分行超过 200 个字符，仍要继续吗？(yes/no)",
    not_found: "未找到",
    no_control: "没有该编号的播放按钮",
    slow: "慢速",
};

pub fn ui(lang: Language) -> &'static UiText {
    match lang {
        Language::En => &EN,
        Language::Zh => &ZH,
    }
}

pub const HELP: &str = "\
Commands:
  home | alphabet | rules | reader     open a screen
  filter all|vowels|consonants|signs   filter the alphabet
  letter <id or glyph>                 open a letter, e.g. 'letter ж'
  rule <number or id>                  open a phonics rule
  play <n> | <n>                       play audio control number n
  stop                                 stop the current audio
  back | lang | show | help | quit
Reader screen:
  any other line is appended to the text
  confirm | clear                      split into segments / start over";

/// Сообщение о блокирующей ошибке читалки
pub fn segment_error_message(err: &SegmentError, lang: Language) -> String {
    let text = ui(lang);
    match err {
        SegmentError::EmptyInput => text.reader_empty.to_string(),
        SegmentError::TooManySegments { count, .. } => {
            format!("{} ({})", text.reader_warning_limit, count)
        }
    }
}

pub fn long_segments_prompt(indices: &[usize], lang: Language) -> String {
    let lines: Vec<String> = indices.iter().map(|idx| (idx + 1).to_string()).collect();
    format!("{} [{}]", ui(lang).reader_warning_long, lines.join(", "))
}

/// Текстовое представление текущего экрана
pub fn render_screen(router: &ViewRouter, now: Instant) -> String {
    let lang = router.language();
    let text = ui(lang);
    let mut out = String::new();

    match router.screen() {
        Screen::Home => {
            let _ = writeln!(out, "== {} ==  [{}]", text.app_title, lang.badge());
            let _ = writeln!(out, "{}\n", text.subtitle);
            let _ = writeln!(out, "  alphabet  {} - {}", text.alphabet, text.browse_letters);
            let _ = writeln!(out, "  rules     {} - {}", text.rules, text.sound_encyclopedia);
            let _ = writeln!(out, "  reader    {} - {}", text.reader, text.listen_custom_text);
            let _ = writeln!(out, "\n{}:", text.quick_start);
            let glyphs: Vec<String> = router
                .quick_start()
                .iter()
                .map(|letter| format!("{} ({})", letter.glyphs(), letter.id))
                .collect();
            let _ = writeln!(out, "  {}", glyphs.join("  "));
        }
        Screen::Alphabet => {
            let _ = writeln!(out, "== {} ==", text.alphabet);
            let _ = writeln!(out, "{}", render_filter(router.filter(), lang));
            for letter in router.filtered_letters() {
                let _ = writeln!(
                    out,
                    "  {:<4} {:<10} {} [{}]",
                    letter.glyphs(),
                    letter.id,
                    letter.name,
                    letter.name_transcription
                );
            }
        }
        Screen::Rules => {
            let _ = writeln!(out, "== {} ==", text.rules);
            for (idx, rule) in router.catalog().rules().iter().enumerate() {
                let _ = writeln!(out, "  {}. {}", idx + 1, rule.title(lang));
            }
        }
        Screen::LetterDetail => {
            if let Some(letter) = router.selected_letter() {
                let _ = writeln!(
                    out,
                    "== {} ==  {} [{}]  {}",
                    letter.glyphs(),
                    letter.name,
                    letter.name_transcription,
                    letter.category.label(lang)
                );
                let _ = writeln!(out, "{}\n", letter.description(lang));
                let _ = writeln!(out, "{}:", text.pronunciation);
                for pronunciation in &letter.pronunciations {
                    match &pronunciation.label {
                        Some(label) => {
                            let _ = writeln!(out, "  {} ({})", pronunciation.transcription, label);
                        }
                        None => {
                            let _ = writeln!(out, "  {}", pronunciation.transcription);
                        }
                    }
                }
                let _ = writeln!(out, "{}:", text.examples);
                for example in &letter.examples {
                    let _ = writeln!(
                        out,
                        "  {} {} - {}",
                        example.word,
                        example.transcription,
                        example.translation(lang)
                    );
                }
            }
        }
        Screen::RuleDetail => {
            if let Some(rule) = router.selected_rule() {
                let _ = writeln!(out, "== {} ==", rule.title(lang));
                let _ = writeln!(out, "{}\n", rule.description(lang));
                let _ = writeln!(out, "{}:", text.examples);
                for example in &rule.examples {
                    let _ = writeln!(
                        out,
                        "  {} {} - {}",
                        example.word,
                        example.transcription,
                        example.translation(lang)
                    );
                }
            }
        }
        Screen::Reader => {
            let _ = writeln!(out, "== {} ==", text.reader);
            if router.notice(now).is_some() {
                let _ = writeln!(out, "(!) {}", text.reader_warning_special);
            }
            match router.reader() {
                Some(session) if !session.raw_text().is_empty() => {
                    for line in session.cleaned().lines() {
                        let _ = writeln!(out, "  | {}", line);
                    }
                    let _ = writeln!(out, "{} / {}", session.char_count(), MAX_INPUT_CHARS);
                }
                _ => {
                    let _ = writeln!(out, "{}", text.reader_placeholder);
                }
            }
        }
        Screen::ReaderOutput => {
            let _ = writeln!(out, "== {} ==", text.reader);
        }
    }

    if !router.controls().is_empty() {
        out.push('\n');
        for (idx, control) in router.controls().iter().enumerate() {
            let _ = writeln!(out, "{}", render_control(idx + 1, control, lang));
        }
    }
    out
}

fn render_filter(filter: CategoryFilter, lang: Language) -> String {
    let text = ui(lang);
    let mut options = vec![(filter == CategoryFilter::All, text.all.to_string())];
    for category in Category::ALL {
        options.push((
            filter == CategoryFilter::Only(category),
            category.label(lang).to_string(),
        ));
    }
    options
        .into_iter()
        .map(|(active, label)| if active { format!("[{}]", label) } else { label })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Строка кнопки озвучки: номер, текст, темп, состояние
pub fn render_control(number: usize, control: &AudioControl, lang: Language) -> String {
    let marker = match control.role {
        ControlRole::LetterName => "*",
        ControlRole::Pronunciation => "~",
        ControlRole::Example | ControlRole::Segment => ">",
    };
    let speed = match control.unit.speed() {
        Speed::Normal => String::new(),
        Speed::Slow => format!(" ({})", ui(lang).slow),
    };
    format!(
        "{:>3}. {} {}{}  [{}]",
        number,
        marker,
        control.unit.text(),
        speed,
        control.unit.state().as_str()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::router::Action;
    use std::sync::Arc;

    fn router() -> ViewRouter {
        ViewRouter::new(Arc::new(Catalog::load_embedded().unwrap()))
    }

    #[test]
    fn test_home_lists_quick_start() {
        let router = router();
        let screen = render_screen(&router, Instant::now());
        assert!(screen.contains("Quick start"));
        assert!(screen.contains("Аа (a)"));
    }

    #[test]
    fn test_language_switch_changes_labels() {
        let mut router = router();
        let now = Instant::now();
        router.dispatch(Action::OpenAlphabet, now);
        router.dispatch(Action::ToggleLanguage, now);
        let screen = render_screen(&router, now);
        assert!(screen.contains("字母表"));
        assert!(screen.contains("[全部]"));
    }

    #[test]
    fn test_reader_output_numbers_controls() {
        let mut router = router();
        let now = Instant::now();
        router.dispatch(Action::OpenReader, now);
        router.dispatch(Action::EditReader("Привет\nПока".to_string()), now);
        router.dispatch(Action::ConfirmReader, now);

        let screen = render_screen(&router, now);
        assert!(screen.contains("  1. > Привет  [idle]"));
        assert!(screen.contains("  2. > Привет (slow)  [idle]"));
        assert!(screen.contains("  4. > Пока (slow)  [idle]"));
    }

    #[test]
    fn test_reader_shows_notice_while_active() {
        let mut router = router();
        let now = Instant::now();
        router.dispatch(Action::OpenReader, now);
        router.dispatch(Action::EditReader("Привет, world".to_string()), now);

        assert!(render_screen(&router, now).contains(EN.reader_warning_special));
        let later = now + crate::router::NOTICE_DURATION;
        assert!(!render_screen(&router, later).contains(EN.reader_warning_special));
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            segment_error_message(&SegmentError::EmptyInput, Language::En),
            EN.reader_empty
        );
        assert!(long_segments_prompt(&[0, 2], Language::En).ends_with("[1, 3]"));
    }
}
