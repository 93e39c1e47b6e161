//! Application-level duplicate detection.
//!
//! The check is advisory. Between a negative answer and the following insert
//! another transaction may register the same value, so the store's unique
//! constraint stays the only authority. A positive answer only lets callers
//! reject early with a friendlier error.

use crate::domain_model::{UniquenessKey, User};
use crate::domain_port::{StorageTx, StoreError, UserRepo};
use std::sync::Arc;

#[async_trait::async_trait]
pub trait DuplicateChecker: Send + Sync {
    async fn exists(&self, user: &User) -> Result<bool, StoreError>;

    async fn exists_in_tx(&self, tx: &mut dyn StorageTx, user: &User) -> Result<bool, StoreError>;
}

/// Looks up the configured [`UniquenessKey`] through a [`UserRepo`].
///
/// The key is independent of the constraints the store enforces. Checking a
/// different attribute than the constrained one yields false negatives.
pub struct RepoDuplicateChecker {
    user_repo: Arc<dyn UserRepo>,
    key: UniquenessKey,
}

impl RepoDuplicateChecker {
    pub fn new(user_repo: Arc<dyn UserRepo>, key: UniquenessKey) -> RepoDuplicateChecker {
        RepoDuplicateChecker { user_repo, key }
    }

    pub fn key(&self) -> UniquenessKey {
        self.key
    }
}

#[async_trait::async_trait]
impl DuplicateChecker for RepoDuplicateChecker {
    async fn exists(&self, user: &User) -> Result<bool, StoreError> {
        let Some(lookup) = self.key.lookup_for(user) else {
            return Ok(false);
        };
        let found = self.user_repo.find(&lookup).await?;
        Ok(found.is_some_and(|other| other.id() != user.id()))
    }

    async fn exists_in_tx(&self, tx: &mut dyn StorageTx, user: &User) -> Result<bool, StoreError> {
        let Some(lookup) = self.key.lookup_for(user) else {
            return Ok(false);
        };
        let found = self.user_repo.find_in_tx(tx, &lookup).await?;
        Ok(found.is_some_and(|other| other.id() != user.id()))
    }
}
