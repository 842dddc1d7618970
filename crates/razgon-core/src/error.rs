use serde::Serialize;
use thiserror::Error;

use crate::i18n::Language;

/// Информация об ошибке с подсказкой для восстановления
#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    /// Код ошибки для идентификации
    pub code: String,
    /// Человекочитаемое сообщение
    pub message: String,
    /// Подсказка для исправления
    pub recovery_hint: Option<String>,
    /// Технические детали (для логов)
    pub details: Option<String>,
}

impl ErrorInfo {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            recovery_hint: None,
            details: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.recovery_hint = Some(hint.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[derive(Error, Debug)]
pub enum RazgonError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Manifest download failed: {0}")]
    ManifestDownload(String),

    #[error("Manifest conversion failed: {0}")]
    ManifestConversion(String),

    #[error("Unsupported config format: {0}")]
    InvalidFormat(String),

    #[error("AI provider is not configured")]
    AiUnavailable,

    #[error("AI returned an unusable response: {0}")]
    AiResponse(String),

    #[error("Operation cancelled")]
    OperationCancelled,

    #[error("Join error: {0}")]
    Join(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl RazgonError {
    /// Возвращает информацию об ошибке с подсказкой (английский язык по умолчанию)
    pub fn to_error_info(&self) -> ErrorInfo {
        self.localized_error_info(Language::English)
    }

    /// Возвращает локализованную информацию об ошибке
    pub fn localized_error_info(&self, lang: Language) -> ErrorInfo {
        match self {
            RazgonError::Database(e) => match lang {
                Language::Russian => ErrorInfo::new("DATABASE_ERROR", "Ошибка базы данных")
                    .with_hint("Перезапустите приложение. Если ошибка повторяется, удалите файл razgon.db — индекс манифеста будет построен заново")
                    .with_details(e.to_string()),
                Language::English => ErrorInfo::new("DATABASE_ERROR", "Database error")
                    .with_hint("Restart the application. If the error persists, delete razgon.db — the manifest index will be rebuilt")
                    .with_details(e.to_string()),
            }
            RazgonError::Io(e) => match lang {
                Language::Russian => {
                    let hint = if e.kind() == std::io::ErrorKind::PermissionDenied {
                        "Проверьте права доступа к папке данных приложения"
                    } else if e.kind() == std::io::ErrorKind::NotFound {
                        "Файл не найден. Конфиг игры мог быть перемещён или удалён"
                    } else {
                        "Проверьте, что папка данных доступна и не занята другим процессом"
                    };
                    ErrorInfo::new("IO_ERROR", format!("Ошибка файловой системы: {}", e.kind()))
                        .with_hint(hint)
                        .with_details(e.to_string())
                }
                Language::English => {
                    let hint = if e.kind() == std::io::ErrorKind::PermissionDenied {
                        "Check access permissions to the application data folder"
                    } else if e.kind() == std::io::ErrorKind::NotFound {
                        "File not found. The game config may have been moved or deleted"
                    } else {
                        "Ensure the data folder is accessible and not locked by another process"
                    };
                    ErrorInfo::new("IO_ERROR", format!("Filesystem error: {}", e.kind()))
                        .with_hint(hint)
                        .with_details(e.to_string())
                }
            }
            RazgonError::Http(e) => match lang {
                Language::Russian => {
                    let (message, hint) = if e.is_timeout() {
                        ("Превышено время ожидания сервера", "Проверьте подключение к интернету. Приложение продолжит работу в офлайн-режиме")
                    } else if e.is_connect() {
                        ("Не удалось подключиться к серверу", "Проверьте подключение к интернету. Возможно, сервер временно недоступен")
                    } else if e.status().map(|s| s.as_u16()) == Some(429) {
                        ("Превышен лимит запросов", "Подождите минуту и попробуйте снова")
                    } else {
                        ("Ошибка сети", "Проверьте подключение к интернету")
                    };
                    ErrorInfo::new("HTTP_ERROR", message)
                        .with_hint(hint)
                        .with_details(e.to_string())
                }
                Language::English => {
                    let (message, hint) = if e.is_timeout() {
                        ("Server timeout", "Check your internet connection. The application keeps working offline")
                    } else if e.is_connect() {
                        ("Failed to connect to server", "Check your internet connection. The server might be temporarily unavailable")
                    } else if e.status().map(|s| s.as_u16()) == Some(429) {
                        ("Rate limit exceeded", "Wait a minute and try again")
                    } else {
                        ("Network error", "Check your internet connection")
                    };
                    ErrorInfo::new("HTTP_ERROR", message)
                        .with_hint(hint)
                        .with_details(e.to_string())
                }
            }
            RazgonError::Json(e) => match lang {
                Language::Russian => ErrorInfo::new("JSON_ERROR", "Ошибка обработки данных")
                    .with_hint("Возможно, формат каталога профилей изменился. Проверьте обновления приложения")
                    .with_details(e.to_string()),
                Language::English => ErrorInfo::new("JSON_ERROR", "Data processing error")
                    .with_hint("The profile catalog format may have changed. Check for application updates")
                    .with_details(e.to_string()),
            }
            RazgonError::ManifestDownload(msg) => match lang {
                Language::Russian => ErrorInfo::new("MANIFEST_DOWNLOAD", "Не удалось загрузить манифест")
                    .with_hint("Глубокий поиск конфигов недоступен без манифеста. Профили и эвристики продолжают работать")
                    .with_details(msg.clone()),
                Language::English => ErrorInfo::new("MANIFEST_DOWNLOAD", "Failed to download the manifest")
                    .with_hint("Deep config search is unavailable without the manifest. Profiles and heuristics keep working")
                    .with_details(msg.clone()),
            }
            RazgonError::ManifestConversion(msg) => match lang {
                Language::Russian => ErrorInfo::new("MANIFEST_CONVERT", "Не удалось построить индекс манифеста")
                    .with_hint("Удалите файл манифеста в папке данных, чтобы скачать его заново")
                    .with_details(msg.clone()),
                Language::English => ErrorInfo::new("MANIFEST_CONVERT", "Failed to build the manifest index")
                    .with_hint("Delete the manifest file in the data folder to re-download it")
                    .with_details(msg.clone()),
            }
            RazgonError::InvalidFormat(msg) => match lang {
                Language::Russian => ErrorInfo::new("INVALID_FORMAT", "Формат конфига не поддерживается")
                    .with_details(msg.clone()),
                Language::English => ErrorInfo::new("INVALID_FORMAT", "Unsupported config format")
                    .with_details(msg.clone()),
            }
            RazgonError::AiUnavailable => match lang {
                Language::Russian => ErrorInfo::new("AI_UNAVAILABLE", "ИИ не настроен")
                    .with_hint("Укажите API-ключ провайдера в настройках"),
                Language::English => ErrorInfo::new("AI_UNAVAILABLE", "AI is not configured")
                    .with_hint("Set the provider API key in settings"),
            }
            RazgonError::AiResponse(msg) => match lang {
                Language::Russian => ErrorInfo::new("AI_RESPONSE", "ИИ вернул некорректный ответ")
                    .with_hint("Попробуйте ещё раз. Текущие настройки игры не изменены")
                    .with_details(msg.clone()),
                Language::English => ErrorInfo::new("AI_RESPONSE", "AI returned an unusable response")
                    .with_hint("Try again. The current game settings are untouched")
                    .with_details(msg.clone()),
            }
            RazgonError::OperationCancelled => match lang {
                Language::Russian => ErrorInfo::new("CANCELLED", "Операция отменена"),
                Language::English => ErrorInfo::new("CANCELLED", "Operation cancelled"),
            }
            RazgonError::Join(msg) => match lang {
                Language::Russian => ErrorInfo::new("TASK_ERROR", "Ошибка выполнения задачи")
                    .with_details(msg.clone()),
                Language::English => ErrorInfo::new("TASK_ERROR", "Task execution error")
                    .with_details(msg.clone()),
            }
            RazgonError::NotFound(msg) => match lang {
                Language::Russian => ErrorInfo::new("NOT_FOUND", "Ресурс не найден")
                    .with_details(msg.clone()),
                Language::English => ErrorInfo::new("NOT_FOUND", "Resource not found")
                    .with_details(msg.clone()),
            }
        }
    }
}

impl From<tokio::task::JoinError> for RazgonError {
    fn from(err: tokio::task::JoinError) -> Self {
        RazgonError::Join(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RazgonError>;

impl serde::Serialize for RazgonError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        // Сериализуем как ErrorInfo для более полной информации
        self.to_error_info().serialize(serializer)
    }
}
