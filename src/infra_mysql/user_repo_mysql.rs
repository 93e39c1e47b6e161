use super::util::{downcast, is_primary_key_violation, store_error};
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlConnection, MySqlPool, Row};
use uuid::Uuid;

/// Users in the `user` table (see `sql/mysql.sql`). Name and mail carry the
/// `uq_user_name` and `uq_user_mail` unique indexes.
pub struct MySqlUserRepo {
    pool: MySqlPool,
}

impl MySqlUserRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlUserRepo { pool }
    }

    #[inline]
    fn uid_as_bytes(id: &UserId) -> &[u8] {
        id.0.as_bytes()
    }

    #[inline]
    fn uid_from_bytes(id: &[u8]) -> Result<UserId, StoreError> {
        Ok(UserId(Uuid::from_slice(id).map_err(StoreError::backend)?))
    }

    fn select_by(key: UniquenessKey) -> &'static str {
        match key {
            UniquenessKey::Name => {
                r#"
SELECT user_id, name, mail, registered_at
FROM user
WHERE name = ?
"#
            }
            UniquenessKey::Mail => {
                r#"
SELECT user_id, name, mail, registered_at
FROM user
WHERE mail = ?
"#
            }
        }
    }

    fn row_to_user(row: MySqlRow) -> Result<User, StoreError> {
        let user_id_bytes: Vec<u8> = row.try_get("user_id").map_err(StoreError::backend)?;
        let user_id = Self::uid_from_bytes(&user_id_bytes)?;

        let name: String = row.try_get("name").map_err(StoreError::backend)?;
        let name = UserName::try_new(name).map_err(StoreError::backend)?;

        let mail: Option<String> = row.try_get("mail").map_err(StoreError::backend)?;
        let mail = mail
            .map(MailAddress::try_new)
            .transpose()
            .map_err(StoreError::backend)?;

        let registered_at: DateTime<Utc> =
            row.try_get("registered_at").map_err(StoreError::backend)?;

        Ok(User::new(user_id, name, mail, registered_at))
    }

    async fn fetch_by(
        conn: &mut MySqlConnection,
        lookup: &UserLookup,
    ) -> Result<Option<User>, StoreError> {
        let row_opt = sqlx::query(Self::select_by(lookup.key()))
            .bind(lookup.value())
            .fetch_optional(conn)
            .await
            .map_err(store_error)?;

        row_opt.map(Self::row_to_user).transpose()
    }

    /// Insert-or-update keyed by `user_id`. Duplicate names or mails are left
    /// to the unique indexes, which reject the statement atomically.
    ///
    /// The insert goes first: probing a fresh id with a locking read only takes
    /// a gap lock, and two registrations holding the same gap deadlock on
    /// their inserts.
    async fn upsert(conn: &mut MySqlConnection, user: &User) -> Result<(), StoreError> {
        let mail = user.mail().map(MailAddress::as_str);
        let inserted = sqlx::query(
            r#"
INSERT INTO user (user_id, name, mail, registered_at)
VALUES (?, ?, ?, ?)
"#,
        )
        .bind(Self::uid_as_bytes(&user.id()))
        .bind(user.name().as_str())
        .bind(mail)
        .bind(user.registered_at())
        .execute(&mut *conn)
        .await
        .map_err(store_error);

        match inserted {
            Ok(_) => Ok(()),
            Err(err) if is_primary_key_violation(&err) => {
                sqlx::query(
                    r#"
UPDATE user
SET name = ?, mail = ?
WHERE user_id = ?
"#,
                )
                .bind(user.name().as_str())
                .bind(mail)
                .bind(Self::uid_as_bytes(&user.id()))
                .execute(&mut *conn)
                .await
                .map_err(store_error)?;
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}

#[async_trait::async_trait]
impl UserRepo for MySqlUserRepo {
    async fn find(&self, lookup: &UserLookup) -> Result<Option<User>, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(StoreError::backend)?;
        Self::fetch_by(&mut *conn, lookup).await
    }

    async fn find_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        lookup: &UserLookup,
    ) -> Result<Option<User>, StoreError> {
        let tx = downcast(tx)?;
        Self::fetch_by(tx.conn(), lookup).await
    }

    async fn save(&self, user: &User) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(StoreError::backend)?;
        Self::upsert(&mut *tx, user).await?;
        tx.commit().await.map_err(StoreError::backend)?;
        Ok(())
    }

    async fn save_in_tx(&self, tx: &mut dyn StorageTx, user: &User) -> Result<(), StoreError> {
        let tx = downcast(tx)?;
        Self::upsert(tx.conn(), user).await
    }
}
