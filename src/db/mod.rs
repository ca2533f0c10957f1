pub mod memory;
pub mod users;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{NewUser, User};

pub use memory::MemoryUserStore;
pub use users::PgUserStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique column (email, phone number, external id) already holds the value.
    #[error("already exists")]
    AlreadyExists,
    #[error("inconsistent state: {0}")]
    Inconsistent(String),
    #[error("backend error: {0}")]
    Backend(String),
}

/// Persistence for the `User` entity. Every call commits on its own.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_external_id(&self, external_id: Uuid) -> Result<Option<User>, StoreError>;

    /// Fails with `AlreadyExists` when a unique column collides with another row.
    async fn insert(&self, user: &NewUser) -> Result<User, StoreError>;

    /// Writes every mutable column of `user` and returns the stored row.
    /// Fails with `AlreadyExists` when the new email or phone belongs to another row.
    async fn update(&self, user: &User) -> Result<User, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// Returns the user owning `phone_number` with the phone marked verified,
/// creating the row if nobody owns the number yet.
///
/// Two requests may both miss on the lookup and race to insert. The loser
/// sees `AlreadyExists` and re-reads the winner's row; if that re-read comes
/// back empty the store broke its own uniqueness promise and the call fails
/// with `Inconsistent`.
pub async fn create_or_get_by_phone(
    store: &dyn UserStore,
    phone_number: &str,
) -> Result<User, StoreError> {
    if let Some(user) = store.find_by_phone(phone_number).await? {
        return mark_phone_verified(store, user).await;
    }

    match store.insert(&NewUser::verified_phone(phone_number)).await {
        Ok(user) => {
            tracing::info!(user = %user.external_id, "Created user from verified phone");
            Ok(user)
        }
        Err(StoreError::AlreadyExists) => {
            tracing::warn!("Concurrent registration for the same phone number, re-reading");
            let user = store.find_by_phone(phone_number).await?.ok_or_else(|| {
                StoreError::Inconsistent(
                    "phone number conflicted on insert but no row exists".to_string(),
                )
            })?;
            mark_phone_verified(store, user).await
        }
        Err(e) => Err(e),
    }
}

async fn mark_phone_verified(store: &dyn UserStore, mut user: User) -> Result<User, StoreError> {
    if user.is_phone_verified {
        return Ok(user);
    }
    user.is_phone_verified = true;
    store.update(&user).await
}
