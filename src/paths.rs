use razgon_core::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub static BASE_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Стандартная директория данных текущего пользователя
pub fn default_base_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "razgon").map(|dirs| dirs.data_dir().to_path_buf())
}

pub fn init_paths(base: PathBuf) -> Result<()> {
    BASE_DIR.set(base.clone()).map_err(|_| {
        std::io::Error::new(std::io::ErrorKind::AlreadyExists, "BASE_DIR already set")
    })?;

    // Создаём основные директории
    fs::create_dir_all(base.join("data"))?;
    fs::create_dir_all(base.join("logs"))?;

    Ok(())
}

pub fn get_base_dir() -> &'static Path {
    BASE_DIR.get().expect("BASE_DIR not initialized")
}

pub fn data_dir() -> PathBuf {
    get_base_dir().join("data")
}

pub fn logs_dir() -> PathBuf {
    get_base_dir().join("logs")
}

/// Локальный кеш кураторских профилей
pub fn profiles_file() -> PathBuf {
    data_dir().join("game_profiles.json")
}

/// Сырой community-манифест (скачивается один раз)
pub fn manifest_file() -> PathBuf {
    data_dir().join("manifest.yaml")
}

/// SQLite-индекс манифеста
pub fn index_db_file() -> PathBuf {
    data_dir().join("razgon.db")
}

/// Файл настроек приложения (api key, провайдер, тема, язык)
pub fn preferences_file() -> PathBuf {
    data_dir().join("config.json")
}

pub fn text_log_file() -> PathBuf {
    logs_dir().join("razgon.log")
}

pub fn jsonl_log_file() -> PathBuf {
    logs_dir().join("razgon_events.jsonl")
}
