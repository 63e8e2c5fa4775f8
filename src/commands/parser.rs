use thiserror::Error;

use crate::catalog::{Catalog, CategoryFilter};
use crate::models::Category;
use crate::router::{Action, Screen, ViewRouter};

/// Команда оболочки, разобранная из одной строки ввода
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Navigate(Action),
    /// Строка текста для читалки, добавляется к уже введённому
    AppendText(String),
    ClearText,
    /// Номер кнопки озвучки, начиная с 1
    Play(usize),
    Stop,
    Show,
    Help,
    Quit,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("Missing argument for '{0}'")]
    MissingArgument(&'static str),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Разбирает строку с учётом текущего экрана.
///
/// На экране читалки всё, что не является командой, считается текстом.
/// Ответы да/нет распознаются только пока есть вопрос о длинных сегментах.
pub fn parse_command(line: &str, router: &ViewRouter) -> Result<Command, CommandError> {
    let trimmed = line.trim();
    let (keyword, argument) = match trimmed.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword, rest.trim()),
        None => (trimmed, ""),
    };
    let keyword_lower = keyword.to_lowercase();

    if router.pending_confirmation().is_some() {
        match keyword_lower.as_str() {
            "y" | "yes" | "да" => return Ok(Command::Navigate(Action::AnswerLongSegments(true))),
            "n" | "no" | "нет" => return Ok(Command::Navigate(Action::AnswerLongSegments(false))),
            _ => {}
        }
    }

    let command = match keyword_lower.as_str() {
        "home" => Command::Navigate(Action::GoHome),
        "alphabet" | "abc" => Command::Navigate(Action::OpenAlphabet),
        "rules" => Command::Navigate(Action::OpenRules),
        "reader" => Command::Navigate(Action::OpenReader),
        "back" => Command::Navigate(Action::Back),
        "lang" => Command::Navigate(Action::ToggleLanguage),
        "filter" => Command::Navigate(Action::SetCategory(parse_filter(argument)?)),
        "letter" => Command::Navigate(Action::SelectLetter(resolve_letter(
            router.catalog(),
            required(argument, "letter")?,
        )?)),
        "rule" => Command::Navigate(Action::SelectRule(resolve_rule(
            router.catalog(),
            required(argument, "rule")?,
        )?)),
        "play" => Command::Play(parse_index(required(argument, "play")?)?),
        "stop" => Command::Stop,
        "show" | "ls" => Command::Show,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        "confirm" if router.screen() == Screen::Reader => Command::Navigate(Action::ConfirmReader),
        "clear" if router.screen() == Screen::Reader => Command::ClearText,
        _ if router.screen() == Screen::Reader => Command::AppendText(line.trim_end().to_string()),
        "" => Command::Show,
        _ => match trimmed.parse::<usize>() {
            Ok(index) if index > 0 => Command::Play(index),
            _ => return Err(CommandError::Unknown(keyword.to_string())),
        },
    };
    Ok(command)
}

fn required<'a>(argument: &'a str, command: &'static str) -> Result<&'a str, CommandError> {
    if argument.is_empty() {
        Err(CommandError::MissingArgument(command))
    } else {
        Ok(argument)
    }
}

fn parse_index(argument: &str) -> Result<usize, CommandError> {
    match argument.parse::<usize>() {
        Ok(index) if index > 0 => Ok(index),
        _ => Err(CommandError::InvalidArgument(argument.to_string())),
    }
}

fn parse_filter(argument: &str) -> Result<CategoryFilter, CommandError> {
    if argument.is_empty() || argument.eq_ignore_ascii_case("all") {
        return Ok(CategoryFilter::All);
    }
    Category::parse(argument)
        .map(CategoryFilter::Only)
        .ok_or_else(|| CommandError::InvalidArgument(argument.to_string()))
}

/// Буква по идентификатору ("zh") или по написанию ("Ж", "ж")
fn resolve_letter(catalog: &Catalog, argument: &str) -> Result<String, CommandError> {
    catalog
        .letters()
        .iter()
        .find(|letter| {
            letter.id.eq_ignore_ascii_case(argument)
                || letter.uppercase == argument
                || letter.lowercase == argument
        })
        .map(|letter| letter.id.clone())
        .ok_or_else(|| CommandError::InvalidArgument(argument.to_string()))
}

/// Правило по идентификатору или по номеру в списке
fn resolve_rule(catalog: &Catalog, argument: &str) -> Result<String, CommandError> {
    let rules = catalog.rules();
    let by_number = argument
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|idx| rules.get(idx));
    by_number
        .or_else(|| rules.iter().find(|rule| rule.id == argument))
        .map(|rule| rule.id.clone())
        .ok_or_else(|| CommandError::InvalidArgument(argument.to_string()))
}
