//! Optimization Round-Trip
//!
//! Связывает текущие настройки игры со снапшотом железа, отдаёт их
//! внешнему ИИ-сервису и строит диф для отображения. Сбой сервиса —
//! видимый исход `Unavailable`: текущие настройки остаются как есть,
//! пользовательский контекст не выбрасывается молча.

use razgon_core::{HardwareSnapshot, OptimizationDelta, Result, SettingsMapping};
use serde::Serialize;
use std::future::Future;

/// Конверт запроса к ИИ-сервису
#[derive(Debug, Clone, Serialize)]
pub struct OptimizationRequest {
    pub title: String,
    /// Непрозрачные метрики железа
    pub hardware: HardwareSnapshot,
    pub current: SettingsMapping,
}

/// Внешний сервис предложений. Ожидается плоское отображение с тем же
/// набором ключей; лишние и пропавшие ключи диф переживает сам.
pub trait ProposalService: Send + Sync {
    fn propose(
        &self,
        request: &OptimizationRequest,
    ) -> impl Future<Output = Result<SettingsMapping>> + Send;
}

/// Исход раунд-трипа
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum OptimizationOutcome {
    Proposed {
        proposed: SettingsMapping,
        delta: OptimizationDelta,
    },
    /// "Не удалось сгенерировать" — маркер для вызывающей стороны
    Unavailable { reason: String },
}

impl OptimizationOutcome {
    pub fn is_proposed(&self) -> bool {
        matches!(self, Self::Proposed { .. })
    }
}

pub async fn optimize<S: ProposalService>(
    service: &S,
    title: &str,
    current: &SettingsMapping,
    hardware: &HardwareSnapshot,
) -> OptimizationOutcome {
    let request = OptimizationRequest {
        title: title.to_string(),
        hardware: hardware.clone(),
        current: current.clone(),
    };

    log::info!(
        "Optimizer: requesting proposal for '{}' ({} keys)",
        title,
        current.len()
    );

    match service.propose(&request).await {
        Ok(proposed) => {
            let delta = OptimizationDelta::compute(current, &proposed);
            log::info!(
                "Optimizer: {} of {} rows changed",
                delta.changed_count(),
                delta.rows.len()
            );
            OptimizationOutcome::Proposed { proposed, delta }
        }
        Err(e) => {
            log::error!("Optimizer: proposal failed: {}", e);
            OptimizationOutcome::Unavailable {
                reason: e.to_error_info().message,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use razgon_core::{RazgonError, NOT_APPLICABLE};

    struct FixedService(SettingsMapping);

    impl ProposalService for FixedService {
        fn propose(
            &self,
            _request: &OptimizationRequest,
        ) -> impl Future<Output = Result<SettingsMapping>> + Send {
            let proposed = self.0.clone();
            async move { Ok(proposed) }
        }
    }

    struct FailingService;

    impl ProposalService for FailingService {
        fn propose(
            &self,
            _request: &OptimizationRequest,
        ) -> impl Future<Output = Result<SettingsMapping>> + Send {
            async { Err(RazgonError::AiUnavailable) }
        }
    }

    fn mapping(pairs: &[(&str, &str)]) -> SettingsMapping {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn proposal_produces_outer_join_delta() {
        let current = mapping(&[("VSync", "On"), ("Shadows", "High")]);
        let proposed = mapping(&[("VSync", "Off"), ("Shadows", "High"), ("FOV", "90")]);
        let hardware = mapping(&[("cpu", "41.5"), ("ram", "62.0")]);

        let outcome = optimize(&FixedService(proposed), "Witch Hollow", &current, &hardware).await;
        let OptimizationOutcome::Proposed { delta, .. } = outcome else {
            panic!("expected a proposal");
        };

        assert_eq!(delta.rows.len(), 3);
        let row = |k: &str| delta.rows.iter().find(|r| r.key == k).unwrap();
        assert!(row("VSync").changed);
        assert!(!row("Shadows").changed);
        assert_eq!(row("FOV").current, NOT_APPLICABLE);
    }

    #[tokio::test]
    async fn service_failure_is_a_visible_unavailable_outcome() {
        let current = mapping(&[("VSync", "On")]);
        let outcome = optimize(
            &FailingService,
            "Witch Hollow",
            &current,
            &HardwareSnapshot::new(),
        )
        .await;

        let OptimizationOutcome::Unavailable { reason } = outcome else {
            panic!("expected unavailable");
        };
        assert!(!reason.is_empty());
        // Текущие настройки не тронуты
        assert_eq!(current["VSync"], "On");
    }
}
