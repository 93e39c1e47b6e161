use crate::domain_model::*;
use crate::domain_port::repo_tx::{StorageTx, StoreError};

/// Persistence port for users.
///
/// `save` is an upsert keyed by [`UserId`]. Uniqueness of the human-facing
/// attributes is not decided here but by the store's unique constraints, which
/// surface as [`StoreError::ConstraintViolation`].
#[async_trait::async_trait]
pub trait UserRepo: Send + Sync {
    /// Look up a committed user.
    async fn find(&self, lookup: &UserLookup) -> Result<Option<User>, StoreError>;

    /// Look up a user as seen from inside `tx`, including its own pending writes.
    async fn find_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        lookup: &UserLookup,
    ) -> Result<Option<User>, StoreError>;

    /// Upsert in a transaction of the repo's own, committed before returning.
    async fn save(&self, user: &User) -> Result<(), StoreError>;

    /// Upsert as part of the caller's transaction.
    async fn save_in_tx(&self, tx: &mut dyn StorageTx, user: &User) -> Result<(), StoreError>;
}
