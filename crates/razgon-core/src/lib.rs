pub mod error;
pub mod i18n;
pub mod types;

// Re-export commonly used items
pub use error::{ErrorInfo, RazgonError, Result};
pub use i18n::Language;
pub use types::{
    ConfigFormat,
    DeltaRow,
    GameCandidate,
    GameProfile,
    HardwareSnapshot,
    ManifestProgress,
    OptimizationDelta,
    ResolutionTier,
    ResolvedTarget,
    SearchRoot,
    SettingsMapping,
    SnapshotReader,
    NOT_APPLICABLE,
};
