//! Profile Store - кураторские профили расположения конфигов
//!
//! Объединение локального кеша и облачного каталога. Ключ профиля —
//! lowercase-подстрока названия игры. Облако при коллизии ключей
//! побеждает, слитый результат пишется обратно в локальный кеш.
//! Сетевые сбои никогда не блокируют резолв: стор просто остаётся
//! на локальных данных.

use razgon_core::{GameProfile, Result};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Облачный каталог профилей
pub const CLOUD_PROFILES_URL: &str =
    "https://raw.githubusercontent.com/razgon-app/catalog/main/game_profiles.json";

/// Короткий таймаут: каталог — ускоритель, не зависимость
pub const CLOUD_SYNC_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone)]
pub struct ProfileStore {
    /// Слитый набор. BTreeMap даёт стабильный порядок перебора, поэтому
    /// победитель среди нескольких подходящих ключей детерминирован:
    /// лексикографически первый.
    profiles: BTreeMap<String, GameProfile>,
    path: PathBuf,
}

impl ProfileStore {
    /// Прочитать локальный кеш. Это best-effort: ошибки чтения и парсинга
    /// дают пустой стор, а не сбой старта.
    pub fn load(path: PathBuf) -> Self {
        let profiles = match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<BTreeMap<String, GameProfile>>(&text) {
                Ok(raw) => normalize_keys(raw),
                Err(e) => {
                    log::warn!("Profiles: malformed cache {}: {}", path.display(), e);
                    BTreeMap::new()
                }
            },
            Err(_) => BTreeMap::new(),
        };

        log::info!("Profiles: {} entries loaded", profiles.len());
        Self { profiles, path }
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Подтянуть облачный каталог и слить его поверх локального набора.
    /// Возвращает true, если слияние и сохранение прошли успешно.
    /// Любой сбой (таймаут, не-200, битое тело) оставляет стор как был.
    pub async fn sync(&mut self, url: &str, timeout: Duration) -> bool {
        let client = match reqwest::Client::builder().timeout(timeout).build() {
            Ok(c) => c,
            Err(e) => {
                log::error!("Profiles: http client build failed: {}", e);
                return false;
            }
        };

        let response = match client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                log::warn!("Profiles: cloud sync failed: {}", e);
                return false;
            }
        };

        if !response.status().is_success() {
            log::warn!("Profiles: cloud sync got HTTP {}", response.status());
            return false;
        }

        let remote: BTreeMap<String, GameProfile> = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                log::warn!("Profiles: cloud catalog is malformed: {}", e);
                return false;
            }
        };

        self.merge_remote(remote);

        if let Err(e) = self.persist() {
            log::warn!("Profiles: cannot persist merged set: {}", e);
        }
        true
    }

    /// Слить облачные записи поверх локальных (облако побеждает по ключу)
    fn merge_remote(&mut self, remote: BTreeMap<String, GameProfile>) {
        let remote = normalize_keys(remote);
        let count = remote.len();
        self.profiles.extend(remote);
        log::info!(
            "Profiles: merged {} cloud entries, {} total",
            count,
            self.profiles.len()
        );
    }

    /// Первый профиль, чей ключ является подстрокой названия (в lowercase).
    /// Перебор в отсортированном порядке ключей.
    pub fn lookup(&self, title: &str) -> Option<&GameProfile> {
        let needle = title.to_lowercase();
        self.profiles
            .iter()
            .find(|(key, _)| needle.contains(key.as_str()))
            .map(|(_, profile)| profile)
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(&self.profiles)?;
        std::fs::write(&self.path, text)?;
        Ok(())
    }
}

/// Ключи профилей — lowercase без внешних пробелов
fn normalize_keys(raw: BTreeMap<String, GameProfile>) -> BTreeMap<String, GameProfile> {
    raw.into_iter()
        .map(|(key, value)| (key.trim().to_lowercase(), value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use razgon_core::{ConfigFormat, SearchRoot};

    fn profile(file: &str) -> GameProfile {
        GameProfile {
            search_in: SearchRoot::InstallDir,
            relative_path: String::new(),
            config_file: file.to_string(),
            format: ConfigFormat::Ini,
        }
    }

    fn store_with(entries: &[(&str, &str)]) -> ProfileStore {
        let mut store = ProfileStore {
            profiles: BTreeMap::new(),
            path: std::env::temp_dir().join("razgon-profiles-test.json"),
        };
        for (key, file) in entries {
            store.profiles.insert(key.to_string(), profile(file));
        }
        store
    }

    #[test]
    fn lookup_matches_substring_of_title() {
        let store = store_with(&[("witcher", "user.settings")]);
        let hit = store.lookup("The Witcher 3: Wild Hunt");
        assert_eq!(hit.unwrap().config_file, "user.settings");
        assert!(store.lookup("Cyberpunk 2077").is_none());
    }

    #[test]
    fn lookup_is_idempotent() {
        let store = store_with(&[("stalker", "user.ltx"), ("doom", "doomconfig.cfg")]);
        let first = store.lookup("S.T.A.L.K.E.R. 2").cloned();
        let second = store.lookup("S.T.A.L.K.E.R. 2").cloned();
        assert_eq!(first, second);
    }

    #[test]
    fn multi_match_winner_is_lexicographically_first() {
        // Оба ключа подходят к названию; побеждает меньший по сортировке
        let store = store_with(&[("half-life 2", "config2.cfg"), ("half-life", "config.cfg")]);
        let hit = store.lookup("Half-Life 2: Episode One").unwrap();
        assert_eq!(hit.config_file, "config.cfg");
    }

    #[test]
    fn merge_remote_overwrites_local_on_collision() {
        let mut store = store_with(&[("witcher", "old.settings"), ("quake", "q3config.cfg")]);

        let mut remote = BTreeMap::new();
        remote.insert("  Witcher ".to_string(), profile("new.settings"));
        remote.insert("factorio".to_string(), profile("config.ini"));
        store.merge_remote(remote);

        assert_eq!(store.len(), 3);
        assert_eq!(store.lookup("witcher 3").unwrap().config_file, "new.settings");
        assert_eq!(store.lookup("factorio").unwrap().config_file, "config.ini");
        // Нетронутая локальная запись живёт дальше
        assert_eq!(store.lookup("quake live").unwrap().config_file, "q3config.cfg");
    }

    #[test]
    fn load_missing_file_gives_empty_store() {
        let store = ProfileStore::load(PathBuf::from("/no/such/razgon/profiles.json"));
        assert!(store.is_empty());
        assert!(store.lookup("anything").is_none());
    }
}
