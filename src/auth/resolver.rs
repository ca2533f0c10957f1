use thiserror::Error;

use crate::auth::jwt::{TokenError, TokenService};
use crate::db::{StoreError, UserStore};
use crate::models::User;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("user lookup failed: {0}")]
    Store(#[from] StoreError),
}

/// Map a bearer token to the user it was issued for.
pub async fn resolve(
    store: &dyn UserStore,
    tokens: &TokenService,
    token: &str,
) -> Result<User, ResolveError> {
    let external_id = tokens.verify(token)?;

    store
        .find_by_external_id(external_id)
        .await?
        .ok_or(ResolveError::Token(TokenError::UnknownSubject))
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use jsonwebtoken::Algorithm;
    use uuid::Uuid;

    use super::*;
    use crate::config::JwtConfig;
    use crate::db::MemoryUserStore;
    use crate::models::NewUser;

    fn tokens() -> TokenService {
        TokenService::new(&JwtConfig {
            secret: "resolver-secret".to_string(),
            algorithm: Algorithm::HS256,
            ttl_minutes: 30,
        })
    }

    #[tokio::test]
    async fn resolves_existing_user() {
        let store = MemoryUserStore::new();
        let tokens = tokens();
        let user = store.insert(&NewUser::verified_phone("+4470001")).await.unwrap();
        let token = tokens.issue(user.external_id, None).unwrap();

        let resolved = resolve(&store, &tokens, &token).await.unwrap();

        assert_eq!(resolved.id, user.id);
    }

    #[tokio::test]
    async fn unknown_subject_is_refused() {
        let store = MemoryUserStore::new();
        let tokens = tokens();
        let token = tokens.issue(Uuid::new_v4(), None).unwrap();

        let err = resolve(&store, &tokens, &token).await.unwrap_err();

        assert!(matches!(err, ResolveError::Token(TokenError::UnknownSubject)));
    }

    #[tokio::test]
    async fn removed_user_is_refused() {
        let store = MemoryUserStore::new();
        let tokens = tokens();
        let user = store.insert(&NewUser::verified_phone("+4470002")).await.unwrap();
        let token = tokens.issue(user.external_id, None).unwrap();
        assert!(store.remove(user.external_id));

        let err = resolve(&store, &tokens, &token).await.unwrap_err();

        assert!(matches!(err, ResolveError::Token(TokenError::UnknownSubject)));
    }

    #[tokio::test]
    async fn expired_token_is_refused_before_lookup() {
        let store = MemoryUserStore::new();
        let tokens = tokens();
        let user = store.insert(&NewUser::verified_phone("+4470003")).await.unwrap();
        let token = tokens
            .issue(user.external_id, Some(Duration::seconds(-1)))
            .unwrap();

        let err = resolve(&store, &tokens, &token).await.unwrap_err();

        assert!(matches!(err, ResolveError::Token(TokenError::Expired)));
    }
}
