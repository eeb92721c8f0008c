use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::FromRow;
use sqlx::PgPool;
use uuid::Uuid;

use crate::identity::errors::CredentialStoreError;
use crate::identity::models::EmailAddress;
use crate::identity::models::Identity;
use crate::identity::models::IdentityId;
use crate::identity::ports::CredentialStore;

const IDENTITIES_EMAIL_KEY: &str = "identities_email_key";

pub struct PostgresCredentialStore {
    pool: PgPool,
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct IdentityRow {
    id: Uuid,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<IdentityRow> for Identity {
    type Error = CredentialStoreError;

    fn try_from(row: IdentityRow) -> Result<Self, Self::Error> {
        let email = EmailAddress::new(&row.email).map_err(|e| {
            CredentialStoreError::InvalidRecord(format!("email of {}: {}", row.id, e))
        })?;

        Ok(Identity {
            id: IdentityId(row.id),
            email,
            password_hash: row.password_hash,
            created_at: row.created_at,
        })
    }
}

fn unavailable(e: sqlx::Error) -> CredentialStoreError {
    CredentialStoreError::Unavailable(e.to_string())
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    async fn create(&self, identity: Identity) -> Result<Identity, CredentialStoreError> {
        sqlx::query(
            r#"
            INSERT INTO identities (id, email, password_hash, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(identity.id.0)
        .bind(identity.email.as_str())
        .bind(&identity.password_hash)
        .bind(identity.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation()
                    && db_err.constraint() == Some(IDENTITIES_EMAIL_KEY)
                {
                    return CredentialStoreError::EmailTaken;
                }
            }
            unavailable(e)
        })?;

        Ok(identity)
    }

    async fn get_by_email(&self, email: &EmailAddress) -> Result<Identity, CredentialStoreError> {
        let row = sqlx::query_as::<_, IdentityRow>(
            r#"
            SELECT id, email, password_hash, created_at
            FROM identities
            WHERE email = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        row.ok_or(CredentialStoreError::NotFound)?.try_into()
    }

    async fn get_by_id(&self, id: &IdentityId) -> Result<Identity, CredentialStoreError> {
        let row = sqlx::query_as::<_, IdentityRow>(
            r#"
            SELECT id, email, password_hash, created_at
            FROM identities
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        row.ok_or(CredentialStoreError::NotFound)?.try_into()
    }

    async fn ping(&self) -> Result<(), CredentialStoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(email: &str) -> IdentityRow {
        IdentityRow {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_converts_to_identity() {
        let identity = Identity::try_from(row("alice@example.com")).unwrap();
        assert_eq!(identity.email.as_str(), "alice@example.com");
    }

    #[test]
    fn test_corrupt_email_is_invalid_record() {
        let result = Identity::try_from(row("alice <alice@example.com>"));
        assert!(matches!(result, Err(CredentialStoreError::InvalidRecord(_))));
    }
}
