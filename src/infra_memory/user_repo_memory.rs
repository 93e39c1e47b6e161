use super::memory_db::MemoryDb;
use super::repo_tx_memory::MemoryTx;
use super::util::downcast;
use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Arc;

#[derive(Clone)]
pub struct MemoryUserRepo {
    db: Arc<MemoryDb>,
}

impl MemoryUserRepo {
    pub fn new(db: Arc<MemoryDb>) -> Self {
        MemoryUserRepo { db }
    }

    pub fn db(&self) -> &Arc<MemoryDb> {
        &self.db
    }
}

#[async_trait::async_trait]
impl UserRepo for MemoryUserRepo {
    async fn find(&self, lookup: &UserLookup) -> Result<Option<User>, StoreError> {
        Ok(self.db.find_committed(lookup))
    }

    async fn find_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        lookup: &UserLookup,
    ) -> Result<Option<User>, StoreError> {
        let tx = downcast(tx, &self.db)?;
        Ok(tx.find(lookup))
    }

    async fn save(&self, user: &User) -> Result<(), StoreError> {
        let mut tx: Box<dyn StorageTx> = Box::new(MemoryTx::new(self.db.clone()));
        if let Err(e) = self.save_in_tx(&mut *tx, user).await {
            tx.rollback().await?;
            return Err(e);
        }
        tx.commit().await
    }

    async fn save_in_tx(&self, tx: &mut dyn StorageTx, user: &User) -> Result<(), StoreError> {
        let tx = downcast(tx, &self.db)?;
        tx.stage(user)
    }
}
