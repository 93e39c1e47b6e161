use super::memory_db::{MemoryDb, TxId};
use crate::domain_model::*;
use crate::domain_port::{StorageTx, StoreError, TxManager};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

pub struct MemoryTxManager {
    db: Arc<MemoryDb>,
}

impl MemoryTxManager {
    pub fn new(db: Arc<MemoryDb>) -> Self {
        MemoryTxManager { db }
    }
}

#[async_trait::async_trait]
impl TxManager for MemoryTxManager {
    async fn begin(&self) -> Result<Box<dyn StorageTx>, StoreError> {
        Ok(Box::new(MemoryTx::new(self.db.clone())))
    }
}

pub struct MemoryTx {
    id: TxId,
    db: Arc<MemoryDb>,
    staged: HashMap<UserId, User>,
    finished: bool,
}

impl MemoryTx {
    pub fn new(db: Arc<MemoryDb>) -> Self {
        MemoryTx {
            id: db.allocate_tx(),
            db,
            staged: HashMap::new(),
            finished: false,
        }
    }

    pub(crate) fn db(&self) -> &Arc<MemoryDb> {
        &self.db
    }

    pub(crate) fn stage(&mut self, user: &User) -> Result<(), StoreError> {
        self.db.claim(self.id, user)?;
        self.staged.insert(user.id(), user.clone());
        Ok(())
    }

    pub(crate) fn find(&self, lookup: &UserLookup) -> Option<User> {
        let key = lookup.key();
        if let Some(user) = self
            .staged
            .values()
            .find(|user| key.lookup_for(user).as_ref() == Some(lookup))
        {
            return Some(user.clone());
        }
        // a committed row rewritten in this tx no longer matches
        self.db
            .find_committed(lookup)
            .filter(|user| !self.staged.contains_key(&user.id()))
    }
}

impl Drop for MemoryTx {
    fn drop(&mut self) {
        if !self.finished {
            self.db.release(self.id);
        }
    }
}

#[async_trait::async_trait]
impl StorageTx for MemoryTx {
    async fn commit(mut self: Box<Self>) -> Result<(), StoreError> {
        self.finished = true;
        self.db.commit(self.id, &self.staged)
    }

    async fn rollback(mut self: Box<Self>) -> Result<(), StoreError> {
        self.finished = true;
        self.db.release(self.id);
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
