//! Request-scoped tenant binding.
//!
//! The current tenant lives in a tokio task-local slot. A slot only exists
//! inside [`TenantContext::scope`], which the HTTP gate opens once per
//! request. Concurrent requests run in separate scopes and can never see each
//! other's binding, even when they are polled on the same worker thread.
//!
//! A binding is acquired with [`TenantContext::bind`] and released when the
//! returned [`TenantBinding`] is dropped. Dropping happens on normal return,
//! on `?` early return, while unwinding from a panic and when the request
//! future is cancelled, so the slot is always emptied.

use std::cell::RefCell;
use std::future::Future;

use tracing::debug;

use super::id::TenantId;
use crate::error::RoutingError;

tokio::task_local! {
    static CURRENT_TENANT: RefCell<Option<TenantId>>;
}

/// Accessor for the tenant bound to the currently executing request.
///
/// # Examples
///
/// ```
/// use tenantry_persistence::tenant::{TenantContext, TenantId};
///
/// # tokio_test::block_on(async {
/// assert_eq!(TenantContext::current(), None);
///
/// TenantContext::scope(async {
///     {
///         let _binding = TenantContext::bind(TenantId::new("company-x")).unwrap();
///         assert_eq!(TenantContext::current(), Some(TenantId::new("company-x")));
///     }
///     assert_eq!(TenantContext::current(), None);
/// })
/// .await;
/// # });
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TenantContext;

impl TenantContext {
    /// Runs `fut` with a fresh, empty tenant slot.
    ///
    /// Every inbound request must be driven inside its own scope. Nested
    /// scopes shadow the outer slot for their duration.
    pub fn scope<F>(fut: F) -> impl Future<Output = F::Output>
    where
        F: Future,
    {
        CURRENT_TENANT.scope(RefCell::new(None), fut)
    }

    /// Runs `fut` with `tenant_id` already bound.
    ///
    /// Intended for work that does not originate from a gated request, such
    /// as startup jobs and tests. The tenant must already be known to be
    /// registered.
    pub fn with_tenant<F>(tenant_id: TenantId, fut: F) -> impl Future<Output = F::Output>
    where
        F: Future,
    {
        CURRENT_TENANT.scope(RefCell::new(Some(tenant_id)), fut)
    }

    /// Runs `fut` in a new scope carrying the caller's current binding.
    ///
    /// Spawned tasks do not inherit task-locals; wrap the spawned future with
    /// this to keep routing it to the same tenant.
    pub fn inherit<F>(fut: F) -> impl Future<Output = F::Output>
    where
        F: Future,
    {
        CURRENT_TENANT.scope(RefCell::new(Self::current()), fut)
    }

    /// Binds `tenant_id` to the current request.
    ///
    /// Overwrites any existing binding. Only the request gate should call
    /// this; business code reads the binding, it never sets it.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::ContextUnavailable`] when called outside of a
    /// [`scope`](Self::scope).
    pub fn bind(tenant_id: TenantId) -> Result<TenantBinding, RoutingError> {
        CURRENT_TENANT
            .try_with(|slot| {
                *slot.borrow_mut() = Some(tenant_id.clone());
            })
            .map_err(|_| RoutingError::ContextUnavailable)?;

        debug!(tenant = %tenant_id, "Handling request for tenant");
        Ok(TenantBinding { tenant_id })
    }

    /// Returns the bound tenant, or `None` when nothing is bound or when
    /// called outside of a scope.
    pub fn current() -> Option<TenantId> {
        CURRENT_TENANT
            .try_with(|slot| slot.borrow().clone())
            .ok()
            .flatten()
    }

    /// Unconditionally empties the slot. Does nothing outside of a scope.
    pub fn clear() {
        let _ = CURRENT_TENANT.try_with(|slot| {
            if let Ok(mut value) = slot.try_borrow_mut() {
                value.take();
            }
        });
    }

    /// Returns `true` when called inside a [`scope`](Self::scope).
    pub fn in_scope() -> bool {
        CURRENT_TENANT.try_with(|_| ()).is_ok()
    }
}

/// Guard for an active tenant binding. Clears the slot when dropped.
#[must_use = "the binding is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct TenantBinding {
    tenant_id: TenantId,
}

impl TenantBinding {
    /// The tenant this guard holds bound.
    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }
}

impl Drop for TenantBinding {
    fn drop(&mut self) {
        TenantContext::clear();
        debug!(tenant = %self.tenant_id, "Removed tenant binding before sending response");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::Barrier;

    use super::*;

    #[tokio::test]
    async fn test_nothing_bound_outside_scope() {
        assert_eq!(TenantContext::current(), None);
        assert!(!TenantContext::in_scope());
        TenantContext::clear();
    }

    #[tokio::test]
    async fn test_bind_outside_scope_fails() {
        let result = TenantContext::bind(TenantId::new("company-x"));
        assert!(matches!(result, Err(RoutingError::ContextUnavailable)));
    }

    #[tokio::test]
    async fn test_bind_then_drop_clears() {
        TenantContext::scope(async {
            assert!(TenantContext::in_scope());
            assert_eq!(TenantContext::current(), None);

            let binding = TenantContext::bind(TenantId::new("company-x")).unwrap();
            assert_eq!(binding.tenant_id().as_str(), "company-x");
            assert_eq!(TenantContext::current(), Some(TenantId::new("company-x")));

            drop(binding);
            assert_eq!(TenantContext::current(), None);
        })
        .await;
    }

    #[tokio::test]
    async fn test_rebind_overwrites() {
        TenantContext::scope(async {
            let _first = TenantContext::bind(TenantId::new("company-x")).unwrap();
            let _second = TenantContext::bind(TenantId::new("company-y")).unwrap();
            assert_eq!(TenantContext::current(), Some(TenantId::new("company-y")));
        })
        .await;
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        TenantContext::scope(async {
            let _binding = TenantContext::bind(TenantId::new("company-x")).unwrap();
            TenantContext::clear();
            TenantContext::clear();
            assert_eq!(TenantContext::current(), None);
        })
        .await;
    }

    #[tokio::test]
    async fn test_binding_survives_await_points() {
        TenantContext::scope(async {
            let _binding = TenantContext::bind(TenantId::new("company-x")).unwrap();
            tokio::task::yield_now().await;
            tokio::time::sleep(Duration::from_millis(1)).await;
            assert_eq!(TenantContext::current(), Some(TenantId::new("company-x")));
        })
        .await;
    }

    #[tokio::test]
    async fn test_early_return_clears() {
        async fn failing() -> Result<(), &'static str> {
            let _binding = TenantContext::bind(TenantId::new("company-x")).unwrap();
            Err::<(), _>("business failure")?;
            Ok(())
        }

        TenantContext::scope(async {
            assert!(failing().await.is_err());
            assert_eq!(TenantContext::current(), None);
        })
        .await;
    }

    #[tokio::test]
    async fn test_panic_clears() {
        TenantContext::scope(async {
            let outcome = futures::FutureExt::catch_unwind(std::panic::AssertUnwindSafe(async {
                let _binding = TenantContext::bind(TenantId::new("company-x")).unwrap();
                panic!("handler blew up");
            }))
            .await;
            assert!(outcome.is_err());
            assert_eq!(TenantContext::current(), None);
        })
        .await;
    }

    #[tokio::test]
    async fn test_cancellation_clears() {
        TenantContext::scope(async {
            let slow = async {
                let _binding = TenantContext::bind(TenantId::new("company-x")).unwrap();
                tokio::time::sleep(Duration::from_secs(60)).await;
            };
            let timed_out = tokio::time::timeout(Duration::from_millis(10), slow).await;
            assert!(timed_out.is_err());
            assert_eq!(TenantContext::current(), None);
        })
        .await;
    }

    #[tokio::test]
    async fn test_spawned_task_does_not_inherit_implicitly() {
        TenantContext::scope(async {
            let _binding = TenantContext::bind(TenantId::new("company-x")).unwrap();

            let implicit = tokio::spawn(async { TenantContext::current() })
                .await
                .unwrap();
            assert_eq!(implicit, None);

            let inherited = tokio::spawn(TenantContext::inherit(async {
                TenantContext::current()
            }))
            .await
            .unwrap();
            assert_eq!(inherited, Some(TenantId::new("company-x")));
        })
        .await;
    }

    #[tokio::test]
    async fn test_with_tenant() {
        let seen = TenantContext::with_tenant(TenantId::new("company-y"), async {
            TenantContext::current()
        })
        .await;
        assert_eq!(seen, Some(TenantId::new("company-y")));
        assert_eq!(TenantContext::current(), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_scopes_are_isolated() {
        let barrier = Arc::new(Barrier::new(16));
        let mut handles = Vec::new();

        for i in 0..16 {
            let barrier = Arc::clone(&barrier);
            handles.push(tokio::spawn(TenantContext::scope(async move {
                let tenant = TenantId::new(format!("tenant-{}", i));
                let _binding = TenantContext::bind(tenant.clone()).unwrap();
                // All tasks hold a binding at the same time here.
                barrier.wait().await;
                for _ in 0..10 {
                    tokio::task::yield_now().await;
                    assert_eq!(TenantContext::current(), Some(tenant.clone()));
                }
            })));
        }

        for handle in handles {
            handle.await.unwrap();
        }
    }

    #[test]
    fn test_interleaved_scopes_on_one_thread() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();

        runtime.block_on(async {
            let a = TenantContext::scope(async {
                let _binding = TenantContext::bind(TenantId::new("company-x")).unwrap();
                for _ in 0..5 {
                    tokio::task::yield_now().await;
                    assert_eq!(TenantContext::current(), Some(TenantId::new("company-x")));
                }
            });
            let b = TenantContext::scope(async {
                let _binding = TenantContext::bind(TenantId::new("company-y")).unwrap();
                for _ in 0..5 {
                    tokio::task::yield_now().await;
                    assert_eq!(TenantContext::current(), Some(TenantId::new("company-y")));
                }
            });
            tokio::join!(a, b);
        });
    }
}
