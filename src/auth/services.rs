use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, warn};

use crate::{
    auth::{
        dto::{LoginRequest, RegisterRequest},
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo::CredentialStore,
        repo_types::User,
    },
    db::StoreError,
    error::AppError,
};

const MAX_USERNAME_LEN: usize = 50;
const MAX_EMAIL_LEN: usize = 100;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    // Verified against when the username is unknown, so both login failures cost the same.
    static ref DUMMY_HASH: Option<String> = hash_password("dummy-password").ok();
}

/// Computes the dummy hash up front so the first unknown-user login does
/// not pay for an extra Argon2 run.
pub fn init_login_timing_guard() {
    lazy_static::initialize(&DUMMY_HASH);
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

fn validate_registration(req: &RegisterRequest) -> Result<(), AppError> {
    if req.username.is_empty() || req.username.chars().count() > MAX_USERNAME_LEN {
        return Err(AppError::Validation(format!(
            "username must be 1-{MAX_USERNAME_LEN} characters"
        )));
    }
    if req.email.chars().count() > MAX_EMAIL_LEN || !is_valid_email(&req.email) {
        return Err(AppError::Validation("Invalid email".into()));
    }
    if req.password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }
    Ok(())
}

/// Creates a user. The pre-insert lookup only gives a fast answer; the
/// store's uniqueness constraint is what actually rejects a duplicate.
pub async fn register(
    store: &dyn CredentialStore,
    mut req: RegisterRequest,
) -> Result<User, AppError> {
    req.username = req.username.trim().to_owned();
    req.email = req.email.trim().to_lowercase();
    validate_registration(&req)?;

    if store
        .find_by_username_or_email(&req.username, &req.email)
        .await?
        .is_some()
    {
        warn!(username = %req.username, "username or email already registered");
        return Err(AppError::DuplicateIdentity);
    }

    let hash = hash_password(&req.password)?;

    let user = match store.create(&req.username, &req.email, &hash).await {
        Ok(u) => u,
        Err(StoreError::Duplicate) => {
            warn!(username = %req.username, "concurrent registration lost the race");
            return Err(AppError::DuplicateIdentity);
        }
        Err(StoreError::Other(e)) => {
            error!(error = %e, "create user failed");
            return Err(AppError::Internal(e));
        }
    };

    info!(user_id = user.id, username = %user.username, "user registered");
    Ok(user)
}

/// Checks credentials and issues an access token.
pub async fn login(
    store: &dyn CredentialStore,
    keys: &JwtKeys,
    req: LoginRequest,
) -> Result<String, AppError> {
    let username = req.username.trim();
    let user = store.find_by_username(username).await?;

    let ok = match &user {
        Some(u) => verify_password(&req.password, &u.password_hash),
        None => {
            if let Some(dummy) = DUMMY_HASH.as_deref() {
                let _ = verify_password(&req.password, dummy);
            }
            false
        }
    };

    let user = match user {
        Some(u) if ok => u,
        _ => {
            warn!(username = %username, "login failed");
            return Err(AppError::InvalidCredentials);
        }
    };

    let token = keys.sign_access(&user.username)?;
    info!(user_id = user.id, username = %user.username, "user logged in");
    Ok(token)
}

/// Resolves a raw bearer token to the user it names. Every failure,
/// including a subject with no matching user, is `Unauthenticated`.
pub async fn resolve_identity(
    store: &dyn CredentialStore,
    keys: &JwtKeys,
    raw_token: &str,
) -> Result<User, AppError> {
    let subject = keys.verify(raw_token).map_err(|e| {
        warn!(reason = %e, "token rejected");
        AppError::Unauthenticated
    })?;

    match store.find_by_username(&subject).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => {
            warn!(subject = %subject, "token subject has no user");
            Err(AppError::Unauthenticated)
        }
        Err(e) => {
            error!(error = %e, "user lookup failed");
            Err(AppError::Internal(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use time::{macros::datetime, Duration};

    use super::*;
    use crate::{
        clock::{FixedClock, SystemClock},
        config::JwtConfig,
        memory::MemoryStore,
    };

    fn jwt_config(secret: &str) -> JwtConfig {
        JwtConfig {
            secret: secret.into(),
            issuer: "test-issuer".into(),
            audience: "test-aud".into(),
            ttl_minutes: 30,
        }
    }

    fn keys() -> JwtKeys {
        JwtKeys::new(&jwt_config("test-secret"), Arc::new(SystemClock))
    }

    fn reg(username: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    fn creds(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: username.into(),
            password: password.into(),
        }
    }

    #[test]
    fn timing_guard_hash_is_ready_after_init() {
        init_login_timing_guard();
        let dummy = DUMMY_HASH.as_deref().expect("dummy hash computed");
        assert!(!verify_password("pw123", dummy));
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email("a@x.com"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("not an email"));
    }

    #[tokio::test]
    async fn register_login_resolve() {
        let store = MemoryStore::new();
        let keys = keys();

        let user = register(&store, reg("alice", "a@x.com", "pw123")).await.unwrap();
        assert_eq!(user.id, 1);
        assert_ne!(user.password_hash, "pw123");
        assert!(!user.password_hash.is_empty());

        let token = login(&store, &keys, creds("alice", "pw123")).await.unwrap();
        let resolved = resolve_identity(&store, &keys, &token).await.unwrap();
        assert_eq!(resolved.username, "alice");
        assert_eq!(resolved.id, user.id);
    }

    #[tokio::test]
    async fn duplicate_username_or_email_is_rejected() {
        let store = MemoryStore::new();
        register(&store, reg("alice", "a@x.com", "pw123")).await.unwrap();

        let err = register(&store, reg("alice", "other@x.com", "pw")).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateIdentity));
        let err = register(&store, reg("bob", "A@X.com", "pw")).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateIdentity));

        assert_eq!(store.user_count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_registrations_admit_exactly_one() {
        let store = Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                register(store.as_ref(), reg("carol", &format!("c{i}@x.com"), "pw")).await
            }));
        }
        let mut ok = 0;
        for h in handles {
            match h.await.unwrap() {
                Ok(_) => ok += 1,
                Err(e) => assert!(matches!(e, AppError::DuplicateIdentity)),
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(store.user_count(), 1);
    }

    #[tokio::test]
    async fn registration_input_is_validated() {
        let store = MemoryStore::new();
        for req in [
            reg("", "a@x.com", "pw"),
            reg("alice", "nope", "pw"),
            reg("alice", "a@x.com", ""),
            reg(&"u".repeat(51), "a@x.com", "pw"),
        ] {
            let err = register(&store, req).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
        assert_eq!(store.user_count(), 0);
    }

    #[tokio::test]
    async fn bad_credentials_are_indistinguishable() {
        let store = MemoryStore::new();
        let keys = keys();
        register(&store, reg("alice", "a@x.com", "pw123")).await.unwrap();

        let wrong_pw = login(&store, &keys, creds("alice", "wrongpw")).await.unwrap_err();
        let no_user = login(&store, &keys, creds("mallory", "pw123")).await.unwrap_err();
        assert!(matches!(wrong_pw, AppError::InvalidCredentials));
        assert!(matches!(no_user, AppError::InvalidCredentials));
        assert_eq!(wrong_pw.to_string(), no_user.to_string());
    }

    #[tokio::test]
    async fn token_expiry_follows_ttl() {
        let store = MemoryStore::new();
        let clock = Arc::new(FixedClock::new(datetime!(2024-03-01 12:00 UTC)));
        let keys = JwtKeys::new(&jwt_config("test-secret"), clock.clone());
        register(&store, reg("alice", "a@x.com", "pw123")).await.unwrap();
        let token = login(&store, &keys, creds("alice", "pw123")).await.unwrap();

        clock.advance(Duration::minutes(29));
        assert!(resolve_identity(&store, &keys, &token).await.is_ok());

        clock.advance(Duration::minutes(2));
        let err = resolve_identity(&store, &keys, &token).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated));
    }

    #[tokio::test]
    async fn foreign_secret_never_resolves() {
        let store = MemoryStore::new();
        register(&store, reg("alice", "a@x.com", "pw123")).await.unwrap();
        let forged = JwtKeys::new(&jwt_config("other-secret"), Arc::new(SystemClock))
            .sign_access("alice")
            .unwrap();
        let err = resolve_identity(&store, &keys(), &forged).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated));
    }

    #[tokio::test]
    async fn subjectless_token_is_unauthenticated() {
        let store = MemoryStore::new();
        let keys = keys();
        register(&store, reg("alice", "a@x.com", "pw123")).await.unwrap();
        let err = resolve_identity(&store, &keys, &keys.sign_without_subject())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated));
    }

    #[tokio::test]
    async fn orphaned_subject_is_unauthenticated() {
        let store = MemoryStore::new();
        let keys = keys();
        let token = keys.sign_access("ghost").unwrap();
        let err = resolve_identity(&store, &keys, &token).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated));
    }
}
