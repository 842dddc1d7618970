use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Sentinel rendered for a key present on only one side of a delta
pub const NOT_APPLICABLE: &str = "N/A";

/// Normalized settings view: setting key -> setting value.
///
/// Values are kept as strings on purpose. The codec layer does not model
/// numeric/boolean distinctions, so every format lands in the same shape.
pub type SettingsMapping = BTreeMap<String, String>;

/// Flat utilization/thermal metrics supplied by an external snapshot reader.
/// Consumed opaquely; individual fields are never interpreted here.
pub type HardwareSnapshot = BTreeMap<String, String>;

/// Источник текущих метрик железа (реализуется снаружи ядра)
pub trait SnapshotReader: Send + Sync {
    fn snapshot(&self) -> HardwareSnapshot;
}

/// Base directory a curated profile is anchored to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchRoot {
    /// Game install directory supplied by the caller
    InstallDir,
    LocalAppdata,
    /// Roaming AppData; the catalog wire format calls this plain "appdata"
    #[serde(rename = "appdata")]
    Appdata,
    Documents,
    SavedGames,
}

impl SearchRoot {
    pub fn as_str(&self) -> &str {
        match self {
            Self::InstallDir => "install_dir",
            Self::LocalAppdata => "local_appdata",
            Self::Appdata => "appdata",
            Self::Documents => "documents",
            Self::SavedGames => "saved_games",
        }
    }
}

/// Declared or guessed on-disk format of a settings file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConfigFormat {
    #[default]
    Ini,
    Json,
    Xml,
    /// Parsed with the ini codec; plenty of games ship yaml-ish key=value files
    Yaml,
    /// Same treatment as ini
    Cfg,
    KeyValueSpace,
    /// No parser; raw text preview only
    Raw,
}

impl ConfigFormat {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Ini => "ini",
            Self::Json => "json",
            Self::Xml => "xml",
            Self::Yaml => "yaml",
            Self::Cfg => "cfg",
            Self::KeyValueSpace => "key_value_space",
            Self::Raw => "raw",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ini" => Some(Self::Ini),
            "json" => Some(Self::Json),
            "xml" => Some(Self::Xml),
            "yaml" | "yml" => Some(Self::Yaml),
            "cfg" => Some(Self::Cfg),
            "key_value_space" => Some(Self::KeyValueSpace),
            "raw" => Some(Self::Raw),
            _ => None,
        }
    }

    /// Formats handled by the section/key=value parser
    pub fn is_ini_like(&self) -> bool {
        matches!(self, Self::Ini | Self::Yaml | Self::Cfg)
    }

    /// Guess a format from a candidate path. Substring check on the whole
    /// lowercased path, ini when nothing matches — mirrors how manifest
    /// candidates are classified.
    pub fn guess_from_path(path: &Path) -> Self {
        let lower = path.to_string_lossy().to_lowercase();
        if lower.contains(".json") {
            Self::Json
        } else if lower.contains(".xml") {
            Self::Xml
        } else {
            Self::Ini
        }
    }
}

/// Curated per-title profile: where one specific game keeps its settings file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameProfile {
    /// Корневая директория поиска
    pub search_in: SearchRoot,
    /// Путь от корня до папки с конфигом (может быть пустым)
    #[serde(default)]
    pub relative_path: String,
    /// Имя файла конфига
    pub config_file: String,
    #[serde(default)]
    pub format: ConfigFormat,
}

/// Which of the three strategies produced a resolved path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionTier {
    Profile,
    Heuristic,
    Manifest,
}

impl ResolutionTier {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Profile => "profile",
            Self::Heuristic => "heuristic",
            Self::Manifest => "manifest",
        }
    }
}

/// A located settings file. Transient, produced per resolution call.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResolvedTarget {
    pub path: PathBuf,
    pub format: ConfigFormat,
    pub tier: ResolutionTier,
}

/// One row of an optimization diff
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeltaRow {
    pub key: String,
    pub current: String,
    pub proposed: String,
    pub changed: bool,
}

/// Display-ready diff between a current and a proposed settings mapping
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct OptimizationDelta {
    pub rows: Vec<DeltaRow>,
}

impl OptimizationDelta {
    /// Full outer join over both key sets, sorted by key. A key missing on
    /// one side renders the sentinel value instead of being dropped.
    pub fn compute(current: &SettingsMapping, proposed: &SettingsMapping) -> Self {
        let mut keys: Vec<&String> = current.keys().chain(proposed.keys()).collect();
        keys.sort();
        keys.dedup();

        let rows = keys
            .into_iter()
            .map(|key| {
                let cur = current.get(key).map(String::as_str).unwrap_or(NOT_APPLICABLE);
                let opt = proposed.get(key).map(String::as_str).unwrap_or(NOT_APPLICABLE);
                DeltaRow {
                    key: key.clone(),
                    current: cur.to_string(),
                    proposed: opt.to_string(),
                    changed: cur != opt,
                }
            })
            .collect();

        Self { rows }
    }

    pub fn changed_count(&self) -> usize {
        self.rows.iter().filter(|r| r.changed).count()
    }
}

/// Tuple supplied by the external process/install discoverer.
/// Install directory is optional context, never required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameCandidate {
    pub title: String,
    pub exe_path: Option<String>,
    pub install_dir: Option<String>,
}

/// Coarse milestones of the manifest pipeline, reported through an
/// optional progress sink while the UI shows a splash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestProgress {
    Downloading,
    Indexing,
}

impl std::fmt::Display for ManifestProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Downloading => write!(f, "DOWNLOADING GLOBAL MANIFEST..."),
            Self::Indexing => write!(f, "OPTIMIZING DATABASE..."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_outer_join_with_sentinel() {
        let mut current = SettingsMapping::new();
        current.insert("VSync".into(), "On".into());
        current.insert("Shadows".into(), "High".into());

        let mut proposed = SettingsMapping::new();
        proposed.insert("VSync".into(), "Off".into());
        proposed.insert("Shadows".into(), "High".into());
        proposed.insert("FOV".into(), "90".into());

        let delta = OptimizationDelta::compute(&current, &proposed);
        assert_eq!(delta.rows.len(), 3);

        let by_key = |k: &str| delta.rows.iter().find(|r| r.key == k).unwrap();
        assert!(by_key("VSync").changed);
        assert!(!by_key("Shadows").changed);
        let fov = by_key("FOV");
        assert!(fov.changed);
        assert_eq!(fov.current, NOT_APPLICABLE);
        assert_eq!(fov.proposed, "90");
        assert_eq!(delta.changed_count(), 2);
    }

    #[test]
    fn delta_rows_sorted_by_key() {
        let mut current = SettingsMapping::new();
        current.insert("b".into(), "1".into());
        current.insert("a".into(), "1".into());
        let delta = OptimizationDelta::compute(&current, &SettingsMapping::new());
        let keys: Vec<&str> = delta.rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn format_guess_defaults_to_ini() {
        assert_eq!(
            ConfigFormat::guess_from_path(Path::new("C:/cfg/client.cfg")),
            ConfigFormat::Ini
        );
        assert_eq!(
            ConfigFormat::guess_from_path(Path::new("/tmp/prefs.json")),
            ConfigFormat::Json
        );
        assert_eq!(
            ConfigFormat::guess_from_path(Path::new("settings.XML")),
            ConfigFormat::Xml
        );
    }

    #[test]
    fn search_root_wire_name_for_roaming() {
        let json = serde_json::to_string(&SearchRoot::Appdata).unwrap();
        assert_eq!(json, "\"appdata\"");
        let parsed: SearchRoot = serde_json::from_str("\"saved_games\"").unwrap();
        assert_eq!(parsed, SearchRoot::SavedGames);
    }
}
