//! Optimistic updates with rollback.

use std::future::Future;

use crate::error::{ApiError, Operation, ResourceError};
use crate::resources::{Cache, Entity};

/// Apply `intent` to the cached entity right away, then reconcile with the
/// server.
///
/// 1. snapshot the entity as it is now
/// 2. apply `intent` locally so the view updates immediately
/// 3. await `confirm`; on success store the server's version
/// 4. on failure put the snapshot back and record the error
///
/// If the entity is not cached, `confirm` still runs but nothing is applied
/// ahead of it.
///
/// # Errors
///
/// Returns the failure of `confirm`, described by `op`.
pub async fn optimistic_update<T, Fut>(
    cache: &Cache<T>,
    id: &T::Id,
    op: Operation,
    intent: impl FnOnce(&mut T),
    confirm: Fut,
) -> Result<T, ResourceError>
where
    T: Entity,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let _busy = cache.begin();

    let snapshot = cache.get(id);
    if snapshot.is_some() {
        cache.mutate(|items| {
            if let Some(item) = items.iter_mut().find(|item| item.id() == id) {
                intent(item);
            }
        });
    }

    let result = confirm.await;
    if result.is_err()
        && let Some(before) = snapshot
    {
        tracing::debug!(subject = op.subject, id = %id, "Rolling back optimistic update");
        cache.replace(before);
    }

    cache.settle(op, result, |cache, confirmed| cache.replace(confirmed.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::ViewScope;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Ticket {
        id: u32,
        state: &'static str,
    }

    impl Entity for Ticket {
        type Id = u32;

        fn id(&self) -> &u32 {
            &self.id
        }
    }

    const OP: Operation = Operation::new("close", "ticket");

    fn cache() -> Cache<Ticket> {
        let cache = Cache::new(ViewScope::new());
        cache.replace_all(vec![
            Ticket { id: 1, state: "open" },
            Ticket { id: 2, state: "open" },
        ]);
        cache
    }

    #[tokio::test]
    async fn test_intent_is_visible_before_confirmation() {
        let cache = cache();
        let (tx, rx) = tokio::sync::oneshot::channel::<Result<Ticket, ApiError>>();
        let pending = {
            let cache = cache.clone();
            tokio::spawn(async move {
                optimistic_update(&cache, &1, OP, |t| t.state = "closed", async move {
                    rx.await.unwrap_or(Err(ApiError::Parse("dropped".to_string())))
                })
                .await
            })
        };

        tokio::task::yield_now().await;
        while !cache.is_loading() {
            tokio::task::yield_now().await;
        }
        assert_eq!(cache.get(&1).map(|t| t.state), Some("closed"));

        let _ = tx.send(Ok(Ticket { id: 1, state: "archived" }));
        let confirmed = pending.await.ok().and_then(Result::ok);
        assert_eq!(confirmed.map(|t| t.state), Some("archived"));
        assert_eq!(cache.get(&1).map(|t| t.state), Some("archived"));
    }

    #[tokio::test]
    async fn test_failure_restores_snapshot_and_sets_error() {
        let cache = cache();
        let result = optimistic_update(&cache, &2, OP, |t| t.state = "closed", async {
            Err(ApiError::Api {
                status: 400,
                message: Some("Ticket is locked".to_string()),
            })
        })
        .await;

        assert!(result.is_err());
        assert_eq!(cache.get(&2).map(|t| t.state), Some("open"));
        assert_eq!(cache.error().as_deref(), Some("Ticket is locked"));
        assert!(!cache.is_loading());
    }
}
