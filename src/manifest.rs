//! Manifest Ingestion Pipeline
//!
//! Большой community-манифест скачивается не чаще одного раза на
//! установку и конвертируется в SQLite-индекс (см. razgon-db). После
//! конвертации сырой YAML больше никогда не парсится. Отсутствие сети —
//! восстановимый сбой: глубокий поиск просто недоступен, остальные
//! уровни резолвера работают дальше.

use razgon_core::{ConfigFormat, ManifestProgress, RazgonError, ResolutionTier, ResolvedTarget, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Манифест сообщества живёт в репозитории ludusavi
pub const MANIFEST_URL: &str =
    "https://raw.githubusercontent.com/mtkennerly/ludusavi-manifest/master/data/manifest.yaml";

pub const MANIFEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Маркеры кандидатов, похожих на файл настроек
const CANDIDATE_MARKERS: [&str; 6] = [".ini", ".cfg", ".json", ".xml", "settings", "prefs"];

/// Колбек грубых вех прогресса ("downloading", "indexing")
pub type ProgressSink = dyn Fn(ManifestProgress) + Send + Sync;

pub struct ManifestPipeline {
    manifest_path: PathBuf,
}

impl ManifestPipeline {
    pub fn new(manifest_path: PathBuf) -> Self {
        Self { manifest_path }
    }

    /// Скачать сырой манифест, если его ещё нет на диске.
    /// false — восстановимый сбой (таймаут, не-200, ошибка записи).
    pub async fn ensure_manifest(&self, progress: Option<&ProgressSink>) -> bool {
        if tokio::fs::try_exists(&self.manifest_path).await.unwrap_or(false) {
            return true;
        }

        report(progress, ManifestProgress::Downloading);
        log::info!("Manifest: downloading from {}", MANIFEST_URL);

        match self.download_manifest().await {
            Ok(bytes) => {
                log::info!("Manifest: downloaded {} bytes", bytes);
                true
            }
            Err(e) => {
                log::error!("Manifest: {}", e);
                false
            }
        }
    }

    async fn download_manifest(&self) -> Result<u64> {
        let client = reqwest::Client::builder().timeout(MANIFEST_TIMEOUT).build()?;
        let response = client.get(MANIFEST_URL).send().await?;
        if !response.status().is_success() {
            return Err(RazgonError::ManifestDownload(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let body = response.bytes().await?;
        if let Some(parent) = self.manifest_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.manifest_path, &body).await?;
        Ok(body.len() as u64)
    }

    /// Построить индекс, если он отсутствует. Существующий индекс не
    /// перестраивается, даже если сырой манифест скачан заново.
    pub async fn ensure_index(&self, progress: Option<&ProgressSink>) -> bool {
        let mut conn = match razgon_db::get_db_conn() {
            Ok(conn) => conn,
            Err(e) => {
                log::error!("Manifest: db connection failed: {}", e);
                return false;
            }
        };

        if razgon_db::is_built(&conn).unwrap_or(false) {
            return true;
        }

        report(progress, ManifestProgress::Indexing);
        match razgon_db::rebuild_from_yaml(&mut conn, &self.manifest_path) {
            Ok(rows) => {
                log::info!("Manifest: index built, {} titles", rows);
                true
            }
            Err(e) => {
                log::error!("Manifest: index build failed: {}", e);
                false
            }
        }
    }

    /// Глубокий поиск: substring-запрос к индексу, фильтр кандидатов,
    /// экспансия плейсхолдеров, первый существующий путь.
    pub async fn deep_search(&self, title: &str) -> Option<ResolvedTarget> {
        let ready = razgon_db::get_db_conn()
            .ok()
            .map(|conn| razgon_db::is_built(&conn).unwrap_or(false))
            .unwrap_or(false);

        // Ленивая постройка при первом обращении
        if !ready {
            if !self.ensure_manifest(None).await {
                return None;
            }
            if !self.ensure_index(None).await {
                return None;
            }
        }

        let conn = razgon_db::get_db_conn().ok()?;
        let hit = match razgon_db::search_title(&conn, title) {
            Ok(Some(hit)) => hit,
            Ok(None) => return None,
            Err(e) => {
                log::error!("Manifest: index search failed: {}", e);
                return None;
            }
        };
        log::debug!("Manifest: '{}' matched '{}'", title, hit.title);

        let files: BTreeMap<String, serde_json::Value> = serde_json::from_str(&hit.files).ok()?;
        for candidate in files.keys() {
            if !looks_like_settings(candidate) {
                continue;
            }
            let path = expand_path_template(candidate);
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                let format = ConfigFormat::guess_from_path(&path);
                log::info!("Manifest: resolved {} as {}", path.display(), format.as_str());
                return Some(ResolvedTarget {
                    path,
                    format,
                    tier: ResolutionTier::Manifest,
                });
            }
        }
        None
    }
}

fn report(progress: Option<&ProgressSink>, milestone: ManifestProgress) {
    if let Some(sink) = progress {
        sink(milestone);
    }
}

/// Кандидат похож на файл настроек?
fn looks_like_settings(candidate: &str) -> bool {
    let lower = candidate.to_lowercase();
    CANDIDATE_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Развернуть плейсхолдеры манифеста против окружения текущего
/// пользователя. Неизвестные токены остаются как есть и отсеются
/// проверкой существования.
pub fn expand_path_template(template: &str) -> PathBuf {
    let home = std::env::var("USERPROFILE")
        .or_else(|_| std::env::var("HOME"))
        .unwrap_or_default();
    let appdata = std::env::var("APPDATA").unwrap_or_default();
    let local_appdata = std::env::var("LOCALAPPDATA").unwrap_or_default();
    let documents = if home.is_empty() {
        String::new()
    } else {
        Path::new(&home).join("Documents").to_string_lossy().into_owned()
    };

    let expanded = template
        .replace("<home>", &home)
        .replace("<winAppData>", &appdata)
        .replace("<winLocalAppData>", &local_appdata)
        .replace("<winDocuments>", &documents)
        .replace("<xdgConfig>", &appdata);

    PathBuf::from(expanded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn home_template_expands_to_concrete_path() {
        // USERPROFILE либо HOME есть в любом пользовательском окружении
        let home = std::env::var("USERPROFILE")
            .or_else(|_| std::env::var("HOME"))
            .expect("user home not set");

        let path = expand_path_template("<home>/Documents/save.ini");
        let rendered = path.to_string_lossy();

        assert!(!rendered.contains('<'), "literal token left in {}", rendered);
        assert!(path.starts_with(&home));
        assert!(rendered.ends_with("save.ini"));
    }

    #[test]
    fn unknown_token_is_left_untouched() {
        let path = expand_path_template("<storeUserId>/remote/config.ini");
        assert!(path.to_string_lossy().contains("<storeUserId>"));
    }

    #[test]
    fn candidate_filter_accepts_settings_like_paths() {
        assert!(looks_like_settings("<winAppData>/Game/settings_backup.dat"));
        assert!(looks_like_settings("<home>/.config/game/config.INI"));
        assert!(looks_like_settings("<winDocuments>/Game/prefs"));
        assert!(!looks_like_settings("<home>/.local/share/game/save01.dat"));
    }
}
