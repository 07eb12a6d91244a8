//! Session binding between authentication state and the order feed.
//!
//! The [`SessionBinder`] watches the application's authentication state
//! (token + role). While a privileged user is signed in it keeps the feed
//! open and maps every broadcast event to query-cache invalidations through
//! the static refresh mapping; on logout or credential change it tears the
//! previous session down completely (no dangling subscriptions, no
//! duplicate connections) before deciding whether to reconnect.
//!
//! UI components that want to react to feed events directly (e.g. a toast
//! on every new order) use [`SessionBinder::on_event`], which is independent
//! of the cache-refresh subscriptions.

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::client::OrderFeedClient;
use crate::event_bus::Subscription;
use crate::models::{AuthState, CacheDomain, EventKind, FeedEvent};

/// Roles allowed to open the staff order feed.
pub const DEFAULT_PRIVILEGED_ROLES: &[&str] = &["staff", "admin"];

/// Query cache the binder invalidates when broadcast events arrive.
///
/// Implementations must tolerate repeated invalidation of an already-stale
/// domain: rapid event bursts produce back-to-back calls for the same
/// domain, and those must be harmless no-ops.
pub trait QueryCache: Send + Sync {
    /// Mark every cached query in the domain as stale.
    fn invalidate(&self, domain: CacheDomain);
}

/// Cache domains a broadcast event invalidates.
///
/// Item-level and flag toggles only touch cached order queries; events that
/// can change table occupancy also invalidate the table queries. Lifecycle
/// kinds invalidate nothing. Consulted once per inbound event.
pub fn refresh_domains(kind: EventKind) -> &'static [CacheDomain] {
    match kind {
        EventKind::NewOrder | EventKind::DeleteOrder | EventKind::OrderCompleted => {
            &[CacheDomain::Orders, CacheDomain::Tables]
        },
        EventKind::NewItem
        | EventKind::OrderUpdated
        | EventKind::DeleteOrderItem
        | EventKind::ItemServed
        | EventKind::OrderPaid => &[CacheDomain::Orders],
        EventKind::Connected | EventKind::Disconnected | EventKind::Error => &[],
    }
}

struct BoundSession {
    token: String,
    role: String,
    /// One refresh subscription per broadcast kind; dropping them
    /// unsubscribes the whole set.
    _refresh_subs: Vec<Subscription>,
}

/// Connects the feed client to authentication state and the query cache.
pub struct SessionBinder {
    client: Arc<OrderFeedClient>,
    cache: Arc<dyn QueryCache>,
    privileged_roles: Vec<String>,
    session: Mutex<Option<BoundSession>>,
}

impl SessionBinder {
    /// Create a binder over a shared client and cache, with the default
    /// privileged role set.
    pub fn new(client: Arc<OrderFeedClient>, cache: Arc<dyn QueryCache>) -> Self {
        Self {
            client,
            cache,
            privileged_roles: DEFAULT_PRIVILEGED_ROLES
                .iter()
                .map(|r| r.to_string())
                .collect(),
            session: Mutex::new(None),
        }
    }

    /// Replace the set of roles allowed to open the feed.
    pub fn with_privileged_roles(mut self, roles: Vec<String>) -> Self {
        self.privileged_roles = roles;
        self
    }

    /// React to a change in authentication state.
    ///
    /// A present token with a privileged role opens the feed and registers
    /// the refresh subscriptions (exactly once per broadcast kind per
    /// session); anything else (logout, token change, demotion) first
    /// unsubscribes everything from the previous session and disconnects.
    /// Passing the same state twice is a no-op.
    pub async fn apply_auth_state(&self, state: Option<&AuthState>) {
        let desired = state.filter(|s| {
            !s.token.is_empty() && self.privileged_roles.iter().any(|r| r == &s.role)
        });

        let mut session = self.session.lock().await;

        if let (Some(bound), Some(next)) = (session.as_ref(), desired) {
            if bound.token == next.token && bound.role == next.role {
                return;
            }
        }

        // Tear down the previous session before re-evaluating: credentials
        // changed, so none of its subscriptions may survive.
        if let Some(bound) = session.take() {
            log::info!(
                "[comanda-link] Unbinding feed session for role '{}'",
                bound.role
            );
            drop(bound._refresh_subs);
            self.client.disconnect().await;
        }

        if let Some(next) = desired {
            log::info!(
                "[comanda-link] Binding feed session for role '{}'",
                next.role
            );
            let refresh_subs = EventKind::BROADCAST
                .iter()
                .map(|kind| {
                    let cache = Arc::clone(&self.cache);
                    self.client.subscribe(*kind, move |event: &FeedEvent| {
                        for domain in refresh_domains(event.kind()) {
                            cache.invalidate(*domain);
                        }
                    })
                })
                .collect();

            if let Err(e) = self.client.connect(next.token.clone()).await {
                log::warn!("[comanda-link] Failed to open feed session: {}", e);
            }

            *session = Some(BoundSession {
                token: next.token.clone(),
                role: next.role.clone(),
                _refresh_subs: refresh_subs,
            });
        }
    }

    /// Subscribe a UI-level callback to one event kind.
    ///
    /// Independent of the cache-refresh subscriptions: registering,
    /// unsubscribing, or panicking here never interferes with cache
    /// invalidation. The subscription outlives credential changes; drop the
    /// returned guard to remove it.
    pub fn on_event(
        &self,
        kind: EventKind,
        handler: impl Fn(&FeedEvent) + Send + Sync + 'static,
    ) -> Subscription {
        self.client.subscribe(kind, handler)
    }

    /// Whether a feed session is currently bound.
    pub async fn is_bound(&self) -> bool {
        self.session.lock().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_served_invalidates_orders_only() {
        assert_eq!(
            refresh_domains(EventKind::ItemServed),
            &[CacheDomain::Orders]
        );
    }

    #[test]
    fn test_delete_order_invalidates_orders_and_tables() {
        assert_eq!(
            refresh_domains(EventKind::DeleteOrder),
            &[CacheDomain::Orders, CacheDomain::Tables]
        );
    }

    #[test]
    fn test_every_broadcast_kind_invalidates_something() {
        for kind in EventKind::BROADCAST {
            assert!(
                !refresh_domains(kind).is_empty(),
                "{} must map to at least one domain",
                kind
            );
        }
    }

    #[test]
    fn test_lifecycle_kinds_invalidate_nothing() {
        assert!(refresh_domains(EventKind::Connected).is_empty());
        assert!(refresh_domains(EventKind::Disconnected).is_empty());
        assert!(refresh_domains(EventKind::Error).is_empty());
    }
}
