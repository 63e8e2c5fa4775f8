//! Тесты очистки текста читалки

use crate::reader::{MAX_INPUT_CHARS, sanitize};

#[test]
fn test_allowed_text_is_unchanged() {
    let input = "Привет, мир!\n\n   \nКак дела?";
    let result = sanitize(input);
    assert_eq!(result.cleaned, input);
    assert!(!result.was_filtered);
}

#[test]
fn test_latin_letters_are_stripped() {
    let result = sanitize("Hello world 123");
    assert!(result.was_filtered);
    assert_eq!(result.cleaned, "123");
}

#[test]
fn test_all_punctuation_and_yo_pass() {
    let input = "Ёлка ёж: (да) - нет — может; так. Так, так! Так?";
    let result = sanitize(input);
    assert!(!result.was_filtered);
    assert_eq!(result.cleaned, input);
}

#[test]
fn test_disallowed_characters_removed_not_replaced() {
    let input = "Мир\"й'@#$%^&*_+=[]{}<>/\\|`~ — дом 😀 中文";
    let result = sanitize(input);
    assert!(result.was_filtered);
    for ch in ['"', '\'', '@', '#', '$', '%', '^', '&', '*', '_', '+', '=', '[', ']', '{', '}', '<', '>', '/', '\\', '|', '`', '~', '😀', '中', '文'] {
        assert!(!result.cleaned.contains(ch), "{ch} survived sanitizing");
    }
    assert!(result.cleaned.starts_with("Мирй"));
    assert!(result.cleaned.contains("— дом"));
}

#[test]
fn test_output_never_exceeds_limit() {
    let long = "я".repeat(MAX_INPUT_CHARS + 321);
    let result = sanitize(&long);
    assert_eq!(result.cleaned.chars().count(), MAX_INPUT_CHARS);
    assert!(!result.was_filtered);

    // лимит считается в символах, а не в байтах
    let mixed = "аb".repeat(MAX_INPUT_CHARS);
    let result = sanitize(&mixed);
    assert!(result.was_filtered);
    assert_eq!(result.cleaned.chars().count(), MAX_INPUT_CHARS);
    assert!(result.cleaned.chars().all(|c| c == 'а'));
}

#[test]
fn test_empty_and_blank_input() {
    assert_eq!(sanitize("").cleaned, "");
    let result = sanitize(" \t\n ");
    assert_eq!(result.cleaned, "");
    assert!(!result.was_filtered);
}
