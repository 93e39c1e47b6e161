//! In-process user table with transactional unique constraints.
//!
//! Pending writes claim their unique values at write time, so a second
//! transaction writing the same value fails immediately with
//! [`StoreError::ConstraintViolation`] instead of waiting for the first one to
//! finish. Claims are released on commit, rollback or drop.

use crate::domain_model::*;
use crate::domain_port::StoreError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub(crate) type TxId = u64;

#[derive(Debug, Clone, Copy)]
struct Claim {
    tx: TxId,
    user_id: UserId,
}

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, User>,
    unique_index: HashMap<UserLookup, UserId>,
    claims: HashMap<UserLookup, Claim>,
}

#[derive(Debug)]
pub struct MemoryDb {
    tables: Mutex<Tables>,
    constraints: Vec<UniquenessKey>,
    next_tx: AtomicU64,
}

pub fn constraint_name(key: UniquenessKey) -> String {
    format!("uq_user_{key}")
}

impl MemoryDb {
    /// A store with unique constraints on both name and mail.
    pub fn new() -> Arc<MemoryDb> {
        MemoryDb::with_constraints(&[UniquenessKey::Name, UniquenessKey::Mail])
    }

    pub fn with_constraints(constraints: &[UniquenessKey]) -> Arc<MemoryDb> {
        let mut keys: Vec<UniquenessKey> = Vec::with_capacity(constraints.len());
        for key in constraints {
            if !keys.contains(key) {
                keys.push(*key);
            }
        }
        Arc::new(MemoryDb {
            tables: Mutex::new(Tables::default()),
            constraints: keys,
            next_tx: AtomicU64::new(1),
        })
    }

    pub fn constraints(&self) -> &[UniquenessKey] {
        &self.constraints
    }

    /// Committed rows, in no particular order.
    pub fn snapshot(&self) -> Vec<User> {
        self.tables().users.values().cloned().collect()
    }

    pub fn count_where(&self, lookup: &UserLookup) -> usize {
        self.tables()
            .users
            .values()
            .filter(|user| lookup.key().lookup_for(user).as_ref() == Some(lookup))
            .count()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn unique_values(&self, user: &User) -> Vec<UserLookup> {
        self.constraints
            .iter()
            .filter_map(|key| key.lookup_for(user))
            .collect()
    }

    pub(crate) fn allocate_tx(&self) -> TxId {
        self.next_tx.fetch_add(1, Ordering::Relaxed)
    }

    pub(crate) fn find_committed(&self, lookup: &UserLookup) -> Option<User> {
        let tables = self.tables();
        match lookup.key() {
            key if self.constraints.contains(&key) => tables
                .unique_index
                .get(lookup)
                .and_then(|id| tables.users.get(id))
                .cloned(),
            key => tables
                .users
                .values()
                .find(|user| key.lookup_for(user).as_ref() == Some(lookup))
                .cloned(),
        }
    }

    /// Checks `user` against committed rows and other pending writes, then
    /// claims its unique values for `tx`.
    pub(crate) fn claim(&self, tx: TxId, user: &User) -> Result<(), StoreError> {
        let values = self.unique_values(user);
        let mut tables = self.tables();

        for value in &values {
            if let Some(owner) = tables.unique_index.get(value) {
                if *owner != user.id() {
                    return Err(violation(value));
                }
            }
            if let Some(claim) = tables.claims.get(value) {
                if claim.tx != tx || claim.user_id != user.id() {
                    return Err(violation(value));
                }
            }
        }

        // an earlier write of the same row in this tx may hold stale values
        tables.claims.retain(|value, claim| {
            !(claim.tx == tx && claim.user_id == user.id()) || values.contains(value)
        });
        for value in values {
            tables.claims.insert(
                value,
                Claim {
                    tx,
                    user_id: user.id(),
                },
            );
        }
        Ok(())
    }

    /// Applies `staged` atomically and releases the claims of `tx`.
    pub(crate) fn commit(&self, tx: TxId, staged: &HashMap<UserId, User>) -> Result<(), StoreError> {
        let mut tables = self.tables();
        tables.claims.retain(|_, claim| claim.tx != tx);

        for user in staged.values() {
            for value in self.unique_values(user) {
                match tables.unique_index.get(&value) {
                    Some(owner) if *owner != user.id() => return Err(violation(&value)),
                    _ => {}
                }
            }
        }

        for user in staged.values() {
            if let Some(previous) = tables.users.remove(&user.id()) {
                for value in self.unique_values(&previous) {
                    if tables.unique_index.get(&value) == Some(&user.id()) {
                        tables.unique_index.remove(&value);
                    }
                }
            }
            for value in self.unique_values(user) {
                tables.unique_index.insert(value, user.id());
            }
            tables.users.insert(user.id(), user.clone());
        }
        Ok(())
    }

    pub(crate) fn release(&self, tx: TxId) {
        self.tables().claims.retain(|_, claim| claim.tx != tx);
    }
}

fn violation(value: &UserLookup) -> StoreError {
    StoreError::ConstraintViolation {
        constraint: constraint_name(value.key()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(&[UniquenessKey::Name, UniquenessKey::Mail, UniquenessKey::Name], &[UniquenessKey::Name, UniquenessKey::Mail])]
    #[case(&[UniquenessKey::Mail, UniquenessKey::Mail], &[UniquenessKey::Mail])]
    #[case(&[], &[])]
    fn repeated_constraints_collapse(#[case] given: &[UniquenessKey], #[case] expected: &[UniquenessKey]) {
        assert_eq!(MemoryDb::with_constraints(given).constraints(), expected);
    }
}
