//! Статический справочник: буквы алфавита и правила чтения.
//!
//! Данные встраиваются в бинарник на этапе сборки и загружаются один раз при старте.

use std::collections::HashSet;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};
use crate::models::{Category, LetterEntry, PhonicsRuleEntry};

const EMBEDDED_CATALOG: &str = include_str!("../../data/catalog.json");

/// Сколько букв показывается на главном экране для быстрого старта
pub const QUICK_START_LETTERS: usize = 10;

/// Фильтр алфавита по категории
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn matches(&self, category: Category) -> bool {
        match self {
            Self::All => true,
            Self::Only(only) => *only == category,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    letters: Vec<LetterEntry>,
    rules: Vec<PhonicsRuleEntry>,
}

impl Catalog {
    /// Загружает встроенный справочник
    pub fn load_embedded() -> AppResult<Self> {
        Self::from_json(EMBEDDED_CATALOG)
    }

    pub fn from_json(contents: &str) -> AppResult<Self> {
        let catalog: Catalog = serde_json::from_str(contents)?;
        catalog.validate()?;
        debug!(
            "Catalog loaded: {} letters, {} rules",
            catalog.letters.len(),
            catalog.rules.len()
        );
        Ok(catalog)
    }

    fn validate(&self) -> AppResult<()> {
        let mut seen = HashSet::new();
        for letter in &self.letters {
            if !seen.insert(letter.id.as_str()) {
                return Err(AppError::ConfigurationError(format!(
                    "Duplicate letter id in catalog: {}",
                    letter.id
                )));
            }
            if letter.pronunciations.is_empty() {
                return Err(AppError::ConfigurationError(format!(
                    "Letter {} has no pronunciations",
                    letter.id
                )));
            }
        }

        let mut seen = HashSet::new();
        for rule in &self.rules {
            if !seen.insert(rule.id.as_str()) {
                return Err(AppError::ConfigurationError(format!(
                    "Duplicate rule id in catalog: {}",
                    rule.id
                )));
            }
        }
        Ok(())
    }

    pub fn letters(&self) -> &[LetterEntry] {
        &self.letters
    }

    pub fn rules(&self) -> &[PhonicsRuleEntry] {
        &self.rules
    }

    pub fn letter(&self, id: &str) -> Option<&LetterEntry> {
        self.letters.iter().find(|letter| letter.id == id)
    }

    pub fn rule(&self, id: &str) -> Option<&PhonicsRuleEntry> {
        self.rules.iter().find(|rule| rule.id == id)
    }

    /// Буквы, прошедшие фильтр, в порядке алфавита
    pub fn filtered_letters(&self, filter: CategoryFilter) -> Vec<&LetterEntry> {
        self.letters
            .iter()
            .filter(|letter| filter.matches(letter.category))
            .collect()
    }

    pub fn quick_start(&self) -> &[LetterEntry] {
        &self.letters[..self.letters.len().min(QUICK_START_LETTERS)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_catalog_is_complete() {
        let catalog = Catalog::load_embedded().unwrap();
        assert_eq!(catalog.letters().len(), 33);
        assert_eq!(catalog.rules().len(), 2);
        assert_eq!(catalog.letters()[0].uppercase, "А");
        assert_eq!(catalog.letters()[32].uppercase, "Я");
    }

    #[test]
    fn test_category_filter() {
        let catalog = Catalog::load_embedded().unwrap();
        let vowels = catalog.filtered_letters(CategoryFilter::Only(Category::Vowel));
        assert_eq!(vowels.len(), 10);
        assert!(vowels.iter().all(|l| l.category == Category::Vowel));

        let signs = catalog.filtered_letters(CategoryFilter::Only(Category::Sign));
        let ids: Vec<&str> = signs.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["hard_sign", "soft_sign"]);

        assert_eq!(catalog.filtered_letters(CategoryFilter::All).len(), 33);
    }

    #[test]
    fn test_lookup_and_quick_start() {
        let catalog = Catalog::load_embedded().unwrap();
        let o = catalog.letter("o").unwrap();
        assert_eq!(o.pronunciations.len(), 2);
        assert_eq!(o.pronunciations[1].label.as_deref(), Some("Unstressed"));
        assert!(catalog.letter("missing").is_none());
        assert_eq!(catalog.rule("devoicing").unwrap().examples[0].word, "Друг");
        assert_eq!(catalog.quick_start().len(), QUICK_START_LETTERS);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let json = r#"{
            "letters": [],
            "rules": [
                { "id": "x", "title": "", "title_zh": "", "category": "", "description": "", "description_zh": "", "examples": [] },
                { "id": "x", "title": "", "title_zh": "", "category": "", "description": "", "description_zh": "", "examples": [] }
            ]
        }"#;
        assert!(matches!(
            Catalog::from_json(json),
            Err(AppError::ConfigurationError(_))
        ));
    }
}
