// Domain models module
// Contains core data structures used throughout the application

pub mod catalog;

// Экспортируем основные типы для удобства использования
pub use catalog::{
    Category, ExampleWord, Language, LetterEntry, PhonicsRuleEntry, Pronunciation,
};
