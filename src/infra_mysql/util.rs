use super::repo_tx_mysql::MySqlTx;
use crate::domain_port::*;
use sqlx::mysql::MySqlDatabaseError;

const ER_DUP_ENTRY: u16 = 1062;
const PRIMARY_KEY: &str = "PRIMARY";

pub fn downcast(tx: &mut dyn StorageTx) -> Result<&mut MySqlTx, StoreError> {
    tx.as_any_mut()
        .downcast_mut::<MySqlTx>()
        .ok_or_else(|| StoreError::backend("transaction was not opened by the MySQL store"))
}

pub fn is_dup_key(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db) = err {
        if let Some(mysql_err) = db.try_downcast_ref::<MySqlDatabaseError>() {
            return mysql_err.number() == ER_DUP_ENTRY;
        }
    }

    false
}

/// Name of the index in a "Duplicate entry 'x' for key 'user.uq_user_name'"
/// message, without the table prefix.
pub fn dup_key_name(message: &str) -> Option<&str> {
    let (_, key) = message.rsplit_once(" for key ")?;
    let key = key.trim().trim_matches(|c| c == '\'' || c == '`');
    let key = key.rsplit_once('.').map_or(key, |(_, index)| index);
    (!key.is_empty()).then_some(key)
}

/// Turns duplicate-key failures into [`StoreError::ConstraintViolation`].
pub fn store_error(err: sqlx::Error) -> StoreError {
    if is_dup_key(&err) {
        let constraint = match &err {
            sqlx::Error::Database(db) => dup_key_name(db.message()).unwrap_or("unknown"),
            _ => "unknown",
        };
        return StoreError::ConstraintViolation {
            constraint: constraint.to_string(),
        };
    }
    StoreError::backend(err)
}

/// True when a duplicate hit the primary key, i.e. the row already exists.
pub fn is_primary_key_violation(err: &StoreError) -> bool {
    matches!(err, StoreError::ConstraintViolation { constraint } if constraint == PRIMARY_KEY)
}
