use serde::{Deserialize, Serialize};

/// Категория буквы алфавита
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Category {
    #[serde(rename = "Vowels")]
    Vowel,
    #[serde(rename = "Consonants")]
    Consonant,
    #[serde(rename = "Signs")]
    Sign,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Vowel, Category::Consonant, Category::Sign];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vowel => "Vowels",
            Self::Consonant => "Consonants",
            Self::Sign => "Signs",
        }
    }

    pub fn label(&self, lang: Language) -> &'static str {
        match (self, lang) {
            (Self::Vowel, Language::En) => "Vowels",
            (Self::Consonant, Language::En) => "Consonants",
            (Self::Sign, Language::En) => "Signs",
            (Self::Vowel, Language::Zh) => "元音",
            (Self::Consonant, Language::Zh) => "辅音",
            (Self::Sign, Language::Zh) => "符号",
        }
    }

    /// Разбирает имя категории без учёта регистра ("vowels", "vowel", ...)
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "vowel" | "vowels" => Some(Self::Vowel),
            "consonant" | "consonants" => Some(Self::Consonant),
            "sign" | "signs" => Some(Self::Sign),
            _ => None,
        }
    }
}

/// Язык пояснений
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Zh,
}

impl Language {
    pub fn toggle(self) -> Self {
        match self {
            Self::En => Self::Zh,
            Self::Zh => Self::En,
        }
    }

    pub fn badge(&self) -> &'static str {
        match self {
            Self::En => "EN",
            Self::Zh => "中文",
        }
    }
}

/// Слово-пример с переводом и транскрипцией
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExampleWord {
    pub word: String,
    pub translation: String,
    pub translation_zh: String,
    pub transcription: String,
}

impl ExampleWord {
    pub fn translation(&self, lang: Language) -> &str {
        match lang {
            Language::En => &self.translation,
            Language::Zh => &self.translation_zh,
        }
    }
}

/// Вариант произношения буквы
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pronunciation {
    pub transcription: String,
    /// Текст, который отправляется в TTS
    pub audio_prompt: String,
    /// Подпись варианта: Standard, Hard, Soft, Stressed...
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LetterEntry {
    pub id: String,
    pub uppercase: String,
    pub lowercase: String,
    pub name: String,
    pub name_transcription: String,
    pub category: Category,
    pub pronunciations: Vec<Pronunciation>,
    pub description: String,
    pub description_zh: String,
    pub examples: Vec<ExampleWord>,
}

impl LetterEntry {
    pub fn description(&self, lang: Language) -> &str {
        match lang {
            Language::En => &self.description,
            Language::Zh => &self.description_zh,
        }
    }

    /// Заглавная и строчная формы вместе, например "Аа"
    pub fn glyphs(&self) -> String {
        format!("{}{}", self.uppercase, self.lowercase)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhonicsRuleEntry {
    pub id: String,
    pub title: String,
    pub title_zh: String,
    pub category: String,
    pub description: String,
    pub description_zh: String,
    pub examples: Vec<ExampleWord>,
}

impl PhonicsRuleEntry {
    pub fn title(&self, lang: Language) -> &str {
        match lang {
            Language::En => &self.title,
            Language::Zh => &self.title_zh,
        }
    }

    pub fn description(&self, lang: Language) -> &str {
        match lang {
            Language::En => &self.description,
            Language::Zh => &self.description_zh,
        }
    }
}
