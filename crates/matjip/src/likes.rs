//! Per-user like sets.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::Result;
use crate::model::{RestaurantId, UserId};
use crate::store::RestaurantStore;

/// Resolves which restaurants a user has liked.
///
/// Anonymous callers (`None`) have liked nothing and never reach the store.
#[derive(Clone)]
pub struct LikeSetResolver {
    store: Arc<dyn RestaurantStore>,
}

impl LikeSetResolver {
    /// Creates a resolver reading from `store`.
    #[must_use]
    pub fn new(store: Arc<dyn RestaurantStore>) -> Self {
        Self { store }
    }

    /// Every restaurant the user has liked.
    ///
    /// # Errors
    ///
    /// Returns a store failure.
    pub async fn liked_ids(&self, user: Option<UserId>) -> Result<HashSet<RestaurantId>> {
        match user {
            Some(user) => self.store.liked_restaurant_ids(user, None).await,
            None => Ok(HashSet::new()),
        }
    }

    /// The subset of `ids` the user has liked.
    ///
    /// # Errors
    ///
    /// Returns a store failure.
    pub async fn membership(
        &self,
        user: Option<UserId>,
        ids: &[RestaurantId],
    ) -> Result<HashSet<RestaurantId>> {
        match user {
            Some(user) if !ids.is_empty() => self.store.liked_restaurant_ids(user, Some(ids)).await,
            _ => Ok(HashSet::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn resolver() -> LikeSetResolver {
        let store = MemoryStore::new();
        store.put_like(1, 10);
        store.put_like(1, 11);
        store.put_like(2, 12);
        LikeSetResolver::new(Arc::new(store))
    }

    #[tokio::test]
    async fn test_liked_ids_for_user() {
        let liked = resolver().liked_ids(Some(1)).await.unwrap();
        assert_eq!(liked, HashSet::from([10, 11]));
    }

    #[tokio::test]
    async fn test_anonymous_has_no_likes() {
        let resolver = resolver();
        assert!(resolver.liked_ids(None).await.unwrap().is_empty());
        assert!(resolver.membership(None, &[10, 11]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_membership_restricted_to_ids() {
        let liked = resolver().membership(Some(1), &[11, 12]).await.unwrap();
        assert_eq!(liked, HashSet::from([11]));
    }
}
