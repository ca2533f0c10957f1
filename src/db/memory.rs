//! In-process `UserStore` used by the test suite and local development.
//!
//! Enforces the same uniqueness rules as the Postgres schema so callers see
//! identical `AlreadyExists` behaviour.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{StoreError, UserStore};
use crate::models::{NewUser, User};

#[derive(Default)]
struct Rows {
    users: Vec<User>,
    next_id: i64,
}

#[derive(Default)]
pub struct MemoryUserStore {
    rows: Mutex<Rows>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().map(|rows| rows.users.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops a row outright. There is no deletion path in the service; tests use
    /// this to strand tokens whose subject no longer exists.
    pub fn remove(&self, external_id: Uuid) -> bool {
        let Ok(mut rows) = self.lock() else {
            return false;
        };
        let before = rows.users.len();
        rows.users.retain(|u| u.external_id != external_id);
        rows.users.len() != before
    }

    fn lock(&self) -> Result<MutexGuard<'_, Rows>, StoreError> {
        self.rows
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }
}

fn collides(existing: &User, id: Option<i64>, email: Option<&str>, phone: Option<&str>) -> bool {
    if Some(existing.id) == id {
        return false;
    }
    let email_taken = email.is_some() && existing.email.as_deref() == email;
    let phone_taken = phone.is_some() && existing.phone_number.as_deref() == phone;
    email_taken || phone_taken
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let rows = self.lock()?;
        Ok(rows
            .users
            .iter()
            .find(|u| u.email.as_deref() == Some(email))
            .cloned())
    }

    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<User>, StoreError> {
        let rows = self.lock()?;
        Ok(rows
            .users
            .iter()
            .find(|u| u.phone_number.as_deref() == Some(phone_number))
            .cloned())
    }

    async fn find_by_external_id(&self, external_id: Uuid) -> Result<Option<User>, StoreError> {
        let rows = self.lock()?;
        Ok(rows
            .users
            .iter()
            .find(|u| u.external_id == external_id)
            .cloned())
    }

    async fn insert(&self, new: &NewUser) -> Result<User, StoreError> {
        let mut rows = self.lock()?;

        let conflict = rows.users.iter().any(|u| {
            u.external_id == new.external_id
                || collides(u, None, new.email.as_deref(), new.phone_number.as_deref())
        });
        if conflict {
            return Err(StoreError::AlreadyExists);
        }

        rows.next_id += 1;
        let now = Utc::now();
        let (email_otp_code, email_otp_expires_at) = match &new.email_challenge {
            Some(c) => (Some(c.code.clone()), Some(c.expires_at)),
            None => (None, None),
        };

        let user = User {
            id: rows.next_id,
            external_id: new.external_id,
            email: new.email.clone(),
            phone_number: new.phone_number.clone(),
            password_hash: new.password_hash.clone(),
            auth_provider: new.auth_provider,
            is_active: true,
            is_phone_verified: new.is_phone_verified,
            is_email_verified: new.is_email_verified,
            role: new.role,
            email_otp_code,
            email_otp_expires_at,
            created_at: now,
            updated_at: now,
        };
        rows.users.push(user.clone());
        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<User, StoreError> {
        if user.email_otp_code.is_some() != user.email_otp_expires_at.is_some() {
            return Err(StoreError::Backend(
                "email OTP code and expiry must be set together".to_string(),
            ));
        }

        let mut rows = self.lock()?;

        let conflict = rows.users.iter().any(|u| {
            collides(
                u,
                Some(user.id),
                user.email.as_deref(),
                user.phone_number.as_deref(),
            )
        });
        if conflict {
            return Err(StoreError::AlreadyExists);
        }

        let stored = rows
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or_else(|| StoreError::Backend(format!("no user with id {}", user.id)))?;

        let mut updated = user.clone();
        updated.external_id = stored.external_id;
        updated.created_at = stored.created_at;
        updated.updated_at = Utc::now();
        *stored = updated.clone();
        Ok(updated)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.lock().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::models::OtpChallenge;

    fn challenge() -> OtpChallenge {
        OtpChallenge {
            code: "123456".to_string(),
            expires_at: Utc::now() + Duration::minutes(10),
        }
    }

    #[tokio::test]
    async fn insert_assigns_increasing_ids() {
        let store = MemoryUserStore::new();
        let a = store.insert(&NewUser::verified_phone("+1001")).await.unwrap();
        let b = store.insert(&NewUser::verified_phone("+1002")).await.unwrap();
        assert!(b.id > a.id);
        assert!(a.is_active);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = MemoryUserStore::new();
        store
            .insert(&NewUser::pending_email("a@x.com", "h".into(), challenge()))
            .await
            .unwrap();

        let err = store
            .insert(&NewUser::pending_email("a@x.com", "h".into(), challenge()))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::AlreadyExists));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn absent_identifiers_never_collide() {
        let store = MemoryUserStore::new();
        store.insert(&NewUser::verified_phone("+1003")).await.unwrap();
        store.insert(&NewUser::verified_phone("+1004")).await.unwrap();
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn update_rejects_phone_owned_by_another_row() {
        let store = MemoryUserStore::new();
        store.insert(&NewUser::verified_phone("+1005")).await.unwrap();
        let mut other = store
            .insert(&NewUser::pending_email("b@x.com", "h".into(), challenge()))
            .await
            .unwrap();

        other.phone_number = Some("+1005".to_string());
        let err = store.update(&other).await.unwrap_err();

        assert!(matches!(err, StoreError::AlreadyExists));
        let unchanged = store.find_by_email("b@x.com").await.unwrap().unwrap();
        assert_eq!(unchanged.phone_number, None);
    }

    #[tokio::test]
    async fn update_refuses_half_set_challenge() {
        let store = MemoryUserStore::new();
        let mut user = store
            .insert(&NewUser::pending_email("c@x.com", "h".into(), challenge()))
            .await
            .unwrap();

        user.email_otp_expires_at = None;

        assert!(store.update(&user).await.is_err());
    }
}
