//! Настройки приложения (config.json)
//!
//! Маленький файл верхнего уровня: ключ API, провайдер ИИ, тема, язык.
//! Отсутствующий или битый файл — это пустые настройки, не ошибка старта.

use razgon_core::{Language, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::agent::AiProvider;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Preferences {
    /// Ключ API провайдера ИИ
    pub api_key: Option<String>,
    pub provider: AiProvider,
    /// Идентификатор модели у выбранного провайдера
    pub model: String,
    /// Визуальная тема интерфейса
    pub theme: String,
    pub language: Language,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: AiProvider::Groq,
            model: "llama-3.3-70b-versatile".to_string(),
            theme: "arctic".to_string(),
            language: Language::English,
        }
    }
}

impl Preferences {
    /// Прочитать настройки. Любая проблема с файлом деградирует в дефолты.
    pub async fn load(path: &Path) -> Self {
        match tokio::fs::read_to_string(path).await {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(prefs) => prefs,
                Err(e) => {
                    log::warn!("Preferences: malformed {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                log::warn!("Preferences: cannot read {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let text = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, text).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("razgon-prefs-{}-{}", std::process::id(), name))
    }

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let prefs = Preferences::load(Path::new("/no/such/razgon/config.json")).await;
        assert_eq!(prefs, Preferences::default());
        assert!(prefs.api_key.is_none());
    }

    #[tokio::test]
    async fn malformed_file_yields_defaults() {
        let path = temp_path("broken.json");
        tokio::fs::write(&path, "{not json").await.unwrap();
        let prefs = Preferences::load(&path).await;
        assert_eq!(prefs, Preferences::default());
        tokio::fs::remove_file(&path).await.ok();
    }

    #[tokio::test]
    async fn save_then_load_round_trip() {
        let path = temp_path("roundtrip.json");
        let mut prefs = Preferences::default();
        prefs.api_key = Some("gsk_test".to_string());
        prefs.language = Language::Russian;

        prefs.save(&path).await.unwrap();
        let loaded = Preferences::load(&path).await;
        assert_eq!(loaded, prefs);
        tokio::fs::remove_file(&path).await.ok();
    }
}
