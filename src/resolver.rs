//! Path Resolver - три уровня поиска конфига в строгом порядке
//!
//! 1. Кураторский профиль (Profile Store)
//! 2. Структурные эвристики известных движков (только при известной
//!    папке установки)
//! 3. Глубокий поиск по индексу community-манифеста
//!
//! Уровни не смешиваются: побеждает первый успешный. Промах всех трёх —
//! штатный исход `None`, а не ошибка.

use razgon_core::{
    ConfigFormat, GameProfile, ResolutionTier, ResolvedTarget, SearchRoot, SettingsMapping,
};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::codec;
use crate::manifest::ManifestPipeline;
use crate::profiles::ProfileStore;

pub struct ConfigResolver {
    profiles: ProfileStore,
    manifest: ManifestPipeline,
}

impl ConfigResolver {
    pub fn new(profiles: ProfileStore, manifest: ManifestPipeline) -> Self {
        Self { profiles, manifest }
    }

    pub fn profiles(&self) -> &ProfileStore {
        &self.profiles
    }

    pub fn profiles_mut(&mut self) -> &mut ProfileStore {
        &mut self.profiles
    }

    /// Найти файл настроек для игры. `None` — "не нашли", ожидаемый
    /// не-исключительный исход.
    pub async fn resolve(&self, title: &str, install_dir: Option<&Path>) -> Option<ResolvedTarget> {
        log::info!("Resolver: searching config for -> {}", title.to_lowercase());

        // 1. Кураторский профиль. Протухший путь — промах уровня,
        // а не ошибка: проваливаемся дальше.
        if let Some(profile) = self.profiles.lookup(title) {
            if let Some(path) = resolve_profile_path(profile, install_dir) {
                if path.exists() {
                    log::info!("Resolver: profile tier hit -> {}", path.display());
                    return Some(ResolvedTarget {
                        path,
                        format: profile.format,
                        tier: ResolutionTier::Profile,
                    });
                }
                log::debug!("Resolver: stale profile path {}", path.display());
            }
        }

        // 2. Эвристики движков
        if let Some(dir) = install_dir {
            if let Some(target) = resolve_heuristically(title, dir) {
                log::info!("Resolver: heuristic tier hit -> {}", target.path.display());
                return Some(target);
            }
        }

        // 3. Манифест
        self.manifest.deep_search(title).await
    }

    /// Резолв + парсинг одним вызовом. `None` и при промахе всех
    /// уровней, и если найденный файл не читается.
    pub async fn resolve_and_read(
        &self,
        title: &str,
        install_dir: Option<&Path>,
    ) -> Option<(ResolvedTarget, SettingsMapping)> {
        let target = self.resolve(title, install_dir).await?;
        match codec::read_settings(&target.path, target.format).await {
            Ok(settings) => Some((target, settings)),
            Err(e) => {
                log::error!(
                    "Resolver: cannot read {}: {}",
                    target.path.display(),
                    e
                );
                None
            }
        }
    }
}

/// Профильный поиск: enum корня -> конкретная базовая директория
fn resolve_profile_path(profile: &GameProfile, install_dir: Option<&Path>) -> Option<PathBuf> {
    let base: PathBuf = match profile.search_in {
        SearchRoot::InstallDir => install_dir?.to_path_buf(),
        SearchRoot::LocalAppdata => PathBuf::from(std::env::var("LOCALAPPDATA").ok()?),
        SearchRoot::Appdata => PathBuf::from(std::env::var("APPDATA").ok()?),
        SearchRoot::Documents => user_home()?.join("Documents"),
        SearchRoot::SavedGames => user_home()?.join("Saved Games"),
    };

    let mut path = base;
    if !profile.relative_path.is_empty() {
        path = path.join(&profile.relative_path);
    }
    Some(path.join(&profile.config_file))
}

fn user_home() -> Option<PathBuf> {
    std::env::var("USERPROFILE")
        .or_else(|_| std::env::var("HOME"))
        .ok()
        .map(PathBuf::from)
}

/// Название в виде имени папки: lowercase, без пробелов
fn normalize_title(title: &str) -> String {
    title.replace(' ', "").to_lowercase()
}

fn resolve_heuristically(title: &str, install_dir: &Path) -> Option<ResolvedTarget> {
    if !install_dir.exists() {
        return None;
    }

    // Unreal: подпапка Engine рядом с игрой
    if install_dir.join("Engine").exists() {
        if let Some(target) = probe_unreal_user_settings(title) {
            return Some(target);
        }
    }

    // Unity: сосед вида *_Data
    if has_unity_data_dir(install_dir) {
        if let Some(target) = probe_unity_locallow(title) {
            return Some(target);
        }
    }

    None
}

fn has_unity_data_dir(install_dir: &Path) -> bool {
    std::fs::read_dir(install_dir)
        .map(|entries| {
            entries
                .flatten()
                .any(|e| e.file_name().to_string_lossy().ends_with("_Data"))
        })
        .unwrap_or(false)
}

/// Unreal хранит пользовательский конфиг в LocalAppData под папкой,
/// производной от названия игры
fn probe_unreal_user_settings(title: &str) -> Option<ResolvedTarget> {
    let local_appdata = PathBuf::from(std::env::var("LOCALAPPDATA").ok()?);
    let needle = normalize_title(title);
    if needle.is_empty() {
        return None;
    }

    for entry in std::fs::read_dir(&local_appdata).ok()?.flatten() {
        let name = entry.file_name().to_string_lossy().to_lowercase();
        if !name.contains(&needle) {
            continue;
        }
        let path = entry
            .path()
            .join("Saved")
            .join("Config")
            .join("WindowsNoEditor")
            .join("GameUserSettings.ini");
        if path.exists() {
            return Some(ResolvedTarget {
                path,
                format: ConfigFormat::Ini,
                tier: ResolutionTier::Heuristic,
            });
        }
    }
    None
}

/// Unity кладёт пользовательские настройки в LocalLow/<Компания>/<Игра>
fn probe_unity_locallow(title: &str) -> Option<ResolvedTarget> {
    let local_low = user_home()?.join("AppData").join("LocalLow");
    if !local_low.exists() {
        return None;
    }
    let needle = normalize_title(title);
    if needle.is_empty() {
        return None;
    }

    // Ровно два уровня: компания / игра
    for entry in WalkDir::new(&local_low)
        .min_depth(2)
        .max_depth(2)
        .into_iter()
        .flatten()
    {
        if !entry.file_type().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_lowercase();
        if !name.contains(&needle) {
            continue;
        }

        let Ok(files) = std::fs::read_dir(entry.path()) else {
            continue;
        };
        for file in files.flatten() {
            let file_name = file.file_name().to_string_lossy().to_lowercase();
            if file.path().is_file() && file_name.contains("settings") {
                return Some(ResolvedTarget {
                    path: file.path(),
                    format: ConfigFormat::Xml,
                    tier: ResolutionTier::Heuristic,
                });
            }
        }
    }
    None
}
