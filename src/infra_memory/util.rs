use super::memory_db::MemoryDb;
use super::repo_tx_memory::MemoryTx;
use crate::domain_port::*;
use std::sync::Arc;

pub fn downcast<'a>(
    tx: &'a mut dyn StorageTx,
    db: &Arc<MemoryDb>,
) -> Result<&'a mut MemoryTx, StoreError> {
    let tx = tx
        .as_any_mut()
        .downcast_mut::<MemoryTx>()
        .ok_or_else(|| StoreError::backend("transaction was not opened by the in-memory store"))?;
    if !Arc::ptr_eq(tx.db(), db) {
        return Err(StoreError::backend(
            "transaction belongs to a different in-memory store",
        ));
    }
    Ok(tx)
}
