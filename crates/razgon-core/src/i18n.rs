use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Языки интерфейса (подсказки ошибок локализуются по этому значению)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Английский
    #[serde(rename = "en")]
    #[default]
    English,
    /// Русский
    #[serde(rename = "ru")]
    Russian,
}

impl Language {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "en" | "english" => Some(Language::English),
            "ru" | "russian" | "русский" => Some(Language::Russian),
            _ => None,
        }
    }

    /// Код языка для файла настроек
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Russian => "ru",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Russian => "Русский",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::parse(s).ok_or_else(|| format!("Unknown language: {}", s))
    }
}
