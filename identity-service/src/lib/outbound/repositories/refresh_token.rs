use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::FromRow;
use sqlx::PgPool;
use uuid::Uuid;

use crate::identity::errors::RefreshTokenStoreError;
use crate::identity::models::IdentityId;
use crate::identity::models::RefreshTokenId;
use crate::identity::models::RefreshTokenRecord;
use crate::identity::ports::RefreshTokenStore;

/// Refresh token digests in PostgreSQL.
///
/// Every read filters on `expires_at > now()`, so expired rows behave as absent
/// even before the sweep removes them.
pub struct PostgresRefreshTokenStore {
    pool: PgPool,
}

impl PostgresRefreshTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct RefreshTokenRow {
    id: Uuid,
    identity_id: Uuid,
    token_hash: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl From<RefreshTokenRow> for RefreshTokenRecord {
    fn from(row: RefreshTokenRow) -> Self {
        RefreshTokenRecord {
            id: RefreshTokenId(row.id),
            identity_id: IdentityId(row.identity_id),
            token_hash: row.token_hash,
            expires_at: row.expires_at,
            created_at: row.created_at,
        }
    }
}

fn unavailable(e: sqlx::Error) -> RefreshTokenStoreError {
    RefreshTokenStoreError::Unavailable(e.to_string())
}

#[async_trait]
impl RefreshTokenStore for PostgresRefreshTokenStore {
    async fn create(
        &self,
        identity_id: &IdentityId,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshTokenRecord, RefreshTokenStoreError> {
        let row = sqlx::query_as::<_, RefreshTokenRow>(
            r#"
            INSERT INTO refresh_tokens (id, identity_id, token_hash, expires_at, created_at)
            VALUES ($1, $2, $3, $4, now())
            RETURNING id, identity_id, token_hash, expires_at, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(identity_id.0)
        .bind(token_hash)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(row.into())
    }

    async fn get_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<RefreshTokenRecord, RefreshTokenStoreError> {
        let row = sqlx::query_as::<_, RefreshTokenRow>(
            r#"
            SELECT id, identity_id, token_hash, expires_at, created_at
            FROM refresh_tokens
            WHERE token_hash = $1 AND expires_at > now()
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        row.map(Into::into).ok_or(RefreshTokenStoreError::NotFound)
    }

    async fn delete_by_id(&self, id: &RefreshTokenId) -> Result<(), RefreshTokenStoreError> {
        sqlx::query(
            r#"
            DELETE FROM refresh_tokens
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(())
    }

    async fn delete_expired(&self) -> Result<u64, RefreshTokenStoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM refresh_tokens
            WHERE expires_at <= now()
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(result.rows_affected())
    }

    async fn consume(
        &self,
        token_hash: &str,
    ) -> Result<RefreshTokenRecord, RefreshTokenStoreError> {
        // Single statement: the row lock decides which concurrent caller wins
        let row = sqlx::query_as::<_, RefreshTokenRow>(
            r#"
            DELETE FROM refresh_tokens
            WHERE token_hash = $1 AND expires_at > now()
            RETURNING id, identity_id, token_hash, expires_at, created_at
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        row.map(Into::into).ok_or(RefreshTokenStoreError::NotFound)
    }
}
