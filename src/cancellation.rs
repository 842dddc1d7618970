//! Реестр токенов отмены для фоновых операций
//!
//! Резолв, конвертация манифеста и запрос к ИИ живут вне интерактивного
//! пути. Если контекст, запустивший операцию, закрыт до её завершения,
//! результат отбрасывается, а не применяется к несуществующему контексту.

use lazy_static::lazy_static;
use razgon_core::{RazgonError, Result};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

lazy_static! {
    /// Глобальный реестр токенов отмены для активных операций
    static ref CANCELLATION_TOKENS: Mutex<HashMap<String, CancellationToken>> = Mutex::new(HashMap::new());
}

/// Сгенерировать ID для новой операции
pub fn new_operation_id() -> String {
    format!("op-{}", Uuid::new_v4())
}

/// Создать новый токен отмены для операции
pub fn create_token(operation_id: &str) -> CancellationToken {
    let token = CancellationToken::new();
    let mut tokens = CANCELLATION_TOKENS
        .lock()
        .unwrap_or_else(|e| e.into_inner());
    tokens.insert(operation_id.to_string(), token.clone());
    log::debug!("Created cancellation token for: {}", operation_id);
    token
}

/// Отменить операцию по ID
pub fn cancel(operation_id: &str) -> bool {
    let tokens = CANCELLATION_TOKENS
        .lock()
        .unwrap_or_else(|e| e.into_inner());
    if let Some(token) = tokens.get(operation_id) {
        token.cancel();
        log::info!("Cancelled operation: {}", operation_id);
        true
    } else {
        log::warn!("No token found for operation: {}", operation_id);
        false
    }
}

/// Удалить токен после завершения операции
pub fn remove_token(operation_id: &str) {
    let mut tokens = CANCELLATION_TOKENS
        .lock()
        .unwrap_or_else(|e| e.into_inner());
    tokens.remove(operation_id);
    log::debug!("Removed cancellation token for: {}", operation_id);
}

/// Проверить, отменена ли операция
pub fn is_cancelled(operation_id: &str) -> bool {
    let tokens = CANCELLATION_TOKENS
        .lock()
        .unwrap_or_else(|e| e.into_inner());
    tokens
        .get(operation_id)
        .map(|t| t.is_cancelled())
        .unwrap_or(false)
}

/// Выполнить операцию под токеном отмены.
///
/// Отменённая операция возвращает `OperationCancelled`; уже готовый
/// результат при гонке с отменой тоже отбрасывается.
pub async fn run_guarded<F, T>(operation_id: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let token = create_token(operation_id);

    let result = tokio::select! {
        _ = token.cancelled() => Err(RazgonError::OperationCancelled),
        res = fut => {
            if token.is_cancelled() {
                Err(RazgonError::OperationCancelled)
            } else {
                res
            }
        }
    };

    remove_token(operation_id);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn guarded_operation_returns_result() {
        let id = new_operation_id();
        let out = run_guarded(&id, async { Ok::<_, RazgonError>(42) }).await;
        assert_eq!(out.unwrap(), 42);
        assert!(!is_cancelled(&id));
    }

    #[tokio::test]
    async fn cancelled_operation_discards_result() {
        let id = new_operation_id();
        let id_clone = id.clone();

        let handle = tokio::spawn(async move {
            run_guarded(&id_clone, async {
                tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                Ok::<_, RazgonError>("late result")
            })
            .await
        });

        // Ждём, пока операция зарегистрирует токен
        let mut cancelled = false;
        for _ in 0..100 {
            if cancel(&id) {
                cancelled = true;
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(cancelled);

        let out = handle.await.unwrap();
        assert!(matches!(out, Err(RazgonError::OperationCancelled)));
    }
}
