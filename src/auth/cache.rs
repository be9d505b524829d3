//! Two-tier authorization with write-through promotion
//!
//! Cache-aside over the membership store: check the local confirmed set,
//! on a miss consult the store (and optionally the external authorization
//! service), and promote confirmed identities into the set. Negative
//! results are never cached, since authorization can be granted later.
//! The set is additive and lives for the process lifetime; no eviction.

use std::sync::Arc;

use dashmap::DashSet;
use tracing::{debug, info};

use crate::auth::remote::RemoteAuthClient;
use crate::db::MembershipStore;
use crate::types::Result;

/// Authorization checks for inbound identities
pub struct Authorizer {
    confirmed: DashSet<i64>,
    store: Arc<dyn MembershipStore>,
    remote: Option<RemoteAuthClient>,
}

impl Authorizer {
    pub fn new(store: Arc<dyn MembershipStore>, remote: Option<RemoteAuthClient>) -> Self {
        Self {
            confirmed: DashSet::new(),
            store,
            remote,
        }
    }

    /// Is this identity allowed to use the bot?
    ///
    /// A cache hit answers without any external call. Confirmations from
    /// either backing source are promoted into the cache; concurrent
    /// re-confirmation of the same identity is harmless.
    pub async fn is_authorized(&self, identity: i64) -> Result<bool> {
        if self.confirmed.contains(&identity) {
            debug!(identity = identity, "Authorization cache hit");
            return Ok(true);
        }

        if self.store.contains(identity).await? {
            self.confirmed.insert(identity);
            debug!(identity = identity, "Authorization confirmed by membership store");
            return Ok(true);
        }

        if let Some(ref remote) = self.remote {
            if remote.is_authorized(identity).await? {
                self.confirmed.insert(identity);
                debug!(identity = identity, "Authorization confirmed by remote service");
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Bind a contact's phone number to an identity.
    ///
    /// The sole path by which a previously-unknown identity becomes
    /// authorized at runtime: on a suffix match the store is updated, so
    /// the next `is_authorized` succeeds via the primary lookup.
    pub async fn link_phone_to_identity(&self, phone_suffix: &str, identity: i64) -> Result<bool> {
        let bound = self.store.bind_phone(phone_suffix, identity).await?;
        if bound {
            info!(identity = identity, "Phone contact linked to identity");
        }
        Ok(bound)
    }

    /// Number of identities confirmed so far
    pub fn confirmed_count(&self) -> usize {
        self.confirmed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemberRecord, MemoryMembershipStore};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Store wrapper that counts external queries
    struct CountingStore {
        inner: MemoryMembershipStore,
        lookups: AtomicUsize,
    }

    impl CountingStore {
        fn with_member(identity: i64) -> Self {
            Self {
                inner: MemoryMembershipStore::new(vec![MemberRecord {
                    member_id: Some(identity),
                    phone: "+15550001111".into(),
                    name: None,
                }]),
                lookups: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl MembershipStore for CountingStore {
        async fn contains(&self, identity: i64) -> Result<bool> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.inner.contains(identity).await
        }

        async fn bind_phone(&self, phone_suffix: &str, identity: i64) -> Result<bool> {
            self.inner.bind_phone(phone_suffix, identity).await
        }
    }

    #[tokio::test]
    async fn second_call_is_a_cache_hit() {
        let store = Arc::new(CountingStore::with_member(42));
        let auth = Authorizer::new(Arc::clone(&store) as Arc<dyn MembershipStore>, None);

        assert!(auth.is_authorized(42).await.unwrap());
        assert!(auth.is_authorized(42).await.unwrap());

        // Confirmed on the first call; the second never reached the store
        assert_eq!(store.lookups.load(Ordering::SeqCst), 1);
        assert_eq!(auth.confirmed_count(), 1);
    }

    #[tokio::test]
    async fn negative_results_are_not_cached() {
        let store = Arc::new(CountingStore::with_member(42));
        let auth = Authorizer::new(Arc::clone(&store) as Arc<dyn MembershipStore>, None);

        assert!(!auth.is_authorized(7).await.unwrap());
        assert!(!auth.is_authorized(7).await.unwrap());

        // Both misses consulted the store; a later grant must be visible
        assert_eq!(store.lookups.load(Ordering::SeqCst), 2);
        assert_eq!(auth.confirmed_count(), 0);
    }

    #[tokio::test]
    async fn linked_phone_authorizes_the_identity() {
        let store = Arc::new(MemoryMembershipStore::new(vec![MemberRecord {
            member_id: None,
            phone: "+17012345678".into(),
            name: None,
        }]));
        let auth = Authorizer::new(store as Arc<dyn MembershipStore>, None);

        assert!(!auth.is_authorized(999).await.unwrap());
        assert!(auth.link_phone_to_identity("7012345678", 999).await.unwrap());
        assert!(auth.is_authorized(999).await.unwrap());
    }

    #[tokio::test]
    async fn unmatched_phone_does_not_authorize() {
        let store = Arc::new(MemoryMembershipStore::default());
        let auth = Authorizer::new(store as Arc<dyn MembershipStore>, None);

        assert!(!auth.link_phone_to_identity("7012345678", 999).await.unwrap());
        assert!(!auth.is_authorized(999).await.unwrap());
    }
}
