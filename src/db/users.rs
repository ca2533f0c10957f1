use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{StoreError, UserStore};
use crate::models::{NewUser, User};

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    user: &NewUser,
) -> Result<User, sqlx::Error> {
    let (otp_code, otp_expires_at) = match &user.email_challenge {
        Some(c) => (Some(c.code.as_str()), Some(c.expires_at)),
        None => (None, None),
    };

    sqlx::query_as::<_, User>(
        "INSERT INTO users (external_id, email, phone_number, password_hash, auth_provider,
                            is_phone_verified, is_email_verified, role,
                            email_otp_code, email_otp_expires_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING *",
    )
    .bind(user.external_id)
    .bind(user.email.as_deref())
    .bind(user.phone_number.as_deref())
    .bind(user.password_hash.as_deref())
    .bind(user.auth_provider)
    .bind(user.is_phone_verified)
    .bind(user.is_email_verified)
    .bind(user.role)
    .bind(otp_code)
    .bind(otp_expires_at)
    .fetch_one(executor)
    .await
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_phone(pool: &PgPool, phone_number: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE phone_number = $1")
        .bind(phone_number)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_external_id(
    pool: &PgPool,
    external_id: Uuid,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE external_id = $1")
        .bind(external_id)
        .fetch_optional(pool)
        .await
}

pub async fn update<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    user: &User,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "UPDATE users
         SET email = $2, phone_number = $3, password_hash = $4, auth_provider = $5,
             is_active = $6, is_phone_verified = $7, is_email_verified = $8, role = $9,
             email_otp_code = $10, email_otp_expires_at = $11, updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(user.id)
    .bind(user.email.as_deref())
    .bind(user.phone_number.as_deref())
    .bind(user.password_hash.as_deref())
    .bind(user.auth_provider)
    .bind(user.is_active)
    .bind(user.is_phone_verified)
    .bind(user.is_email_verified)
    .bind(user.role)
    .bind(user.email_otp_code.as_deref())
    .bind(user.email_otp_expires_at)
    .fetch_optional(executor)
    .await
}

/// `UserStore` over the `users` table. Each call runs as its own implicit transaction.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StoreError::AlreadyExists
            }
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(find_by_email(&self.pool, email).await?)
    }

    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<User>, StoreError> {
        Ok(find_by_phone(&self.pool, phone_number).await?)
    }

    async fn find_by_external_id(&self, external_id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(find_by_external_id(&self.pool, external_id).await?)
    }

    async fn insert(&self, user: &NewUser) -> Result<User, StoreError> {
        Ok(create(&self.pool, user).await?)
    }

    async fn update(&self, user: &User) -> Result<User, StoreError> {
        update(&self.pool, user)
            .await?
            .ok_or_else(|| StoreError::Backend(format!("no user with id {}", user.id)))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
