use std::any::Any;

/// Failures raised by storage adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A write collided with a unique constraint. Raised atomically by the
    /// store, so it holds even when concurrent writers raced past any
    /// application-level check.
    #[error("unique constraint `{constraint}` violated")]
    ConstraintViolation { constraint: String },
    #[error("store error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend<E: std::fmt::Display>(error: E) -> StoreError {
        StoreError::Backend(error.to_string())
    }
}

#[async_trait::async_trait]
pub trait TxManager: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn StorageTx>, StoreError>;
}

/// An open unit of work. Dropping it without calling `commit` rolls it back.
#[async_trait::async_trait]
pub trait StorageTx: Send {
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;

    /// Lets an adapter recover its own transaction type.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
