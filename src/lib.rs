//! Razgon - резолвер игровых конфигов с ИИ-оптимизацией
//!
//! Ядро делает три вещи:
//! - находит файл настроек игры среди разнородных расположений
//!   (кураторские профили -> эвристики движков -> индекс манифеста);
//! - парсит пять несовместимых текстовых форматов в нормализованное
//!   отображение ключ -> значение, не падая на битом вводе;
//! - гоняет раунд-трип оптимизации через внешний ИИ-сервис и строит
//!   диф текущих и предложенных значений.
//!
//! UI, сенсоры железа, сканеры процессов и сам ИИ — внешние
//! коллабораторы за границами этого crate.

pub mod agent;
pub mod cancellation;
pub mod codec;
pub mod logging;
pub mod manifest;
pub mod optimizer;
pub mod paths;
pub mod preferences;
pub mod profiles;
pub mod resolver;

// Re-export commonly used items
pub use razgon_core::{
    ConfigFormat, DeltaRow, ErrorInfo, GameCandidate, GameProfile, HardwareSnapshot, Language,
    ManifestProgress, OptimizationDelta, RazgonError, ResolutionTier, ResolvedTarget, Result,
    SearchRoot, SettingsMapping, SnapshotReader, NOT_APPLICABLE,
};

pub use agent::{AiProvider, ChatCompletionsAgent};
pub use optimizer::{OptimizationOutcome, OptimizationRequest, ProposalService};
pub use preferences::Preferences;
pub use profiles::ProfileStore;
pub use resolver::ConfigResolver;

use std::path::PathBuf;

/// Инициализация ядра: директории, логирование, база индекса.
/// Отсутствие любого локального файла — не повод падать: всё
/// недостающее создаётся или трактуется как пустое.
pub fn init(base_dir: Option<PathBuf>) -> Result<()> {
    let base = match base_dir.or_else(paths::default_base_dir) {
        Some(base) => base,
        None => return Err(RazgonError::NotFound("user data directory".into())),
    };
    paths::init_paths(base)?;

    if let Err(e) = logging::setup_logging() {
        eprintln!("razgon: logging setup failed: {}", e);
    }

    let db_path = paths::index_db_file();
    razgon_db::DB_PATH
        .set(db_path.to_string_lossy().into_owned())
        .ok();
    razgon_db::init_db(&db_path.to_string_lossy())?;

    log::info!("Razgon core initialized at {}", paths::get_base_dir().display());
    Ok(())
}

/// Собрать резолвер на стандартных путях. Облачная синхронизация
/// профилей выполняется по дороге и не обязана удаться.
pub async fn build_resolver() -> ConfigResolver {
    let mut store = ProfileStore::load(paths::profiles_file());
    store
        .sync(profiles::CLOUD_PROFILES_URL, profiles::CLOUD_SYNC_TIMEOUT)
        .await;

    ConfigResolver::new(
        store,
        manifest::ManifestPipeline::new(paths::manifest_file()),
    )
}
