//! Session store against the fake catalog API.
//!
//! Run with: cargo test -p cafe-catalog-integration-tests

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use cafe_catalog_client::session::{SIGN_IN_FALLBACK_ERROR, SIGN_UP_FALLBACK_ERROR};
use cafe_catalog_client::{
    CafeApi, ClientConfig, Credentials, FileStore, KeyValueStore, MemoryStore, Registration,
    SessionStore, StorageError, TOKEN_KEY,
};
use cafe_catalog_core::SessionStatus;
use cafe_catalog_integration_tests::{FakeCafeApi, unreachable_base_url};
use secrecy::ExposeSecret;

async fn stored_token(storage: &dyn KeyValueStore) -> Option<String> {
    storage.get_item(TOKEN_KEY).await.expect("read token")
}

/// Store whose writes and removals fail once it is made read-only.
struct ReadOnlyStore {
    inner: MemoryStore,
    read_only: AtomicBool,
}

impl ReadOnlyStore {
    fn new(inner: MemoryStore, read_only: bool) -> Self {
        Self {
            inner,
            read_only: AtomicBool::new(read_only),
        }
    }

    fn with_token(token: &str) -> Self {
        Self::new(MemoryStore::with_token(token), true)
    }

    fn empty() -> Self {
        Self::new(MemoryStore::new(), true)
    }

    fn make_read_only(&self) {
        self.read_only.store(true, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), StorageError> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only store").into(),
            );
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for ReadOnlyStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get_item(key).await
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_writable()?;
        self.inner.set_item(key, value).await
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.check_writable()?;
        self.inner.remove_item(key).await
    }
}

async fn unreachable_client(storage: Arc<dyn KeyValueStore>) -> CafeApi {
    let url = unreachable_base_url().await;
    CafeApi::new(&ClientConfig::new(url.parse().expect("url")), storage).expect("client")
}

// ============================================================================
// on_start
// ============================================================================

#[tokio::test]
async fn test_start_without_token_is_not_authenticated() {
    let fake = FakeCafeApi::spawn().await;
    let storage = Arc::new(MemoryStore::new());
    let mut session = SessionStore::new(fake.client(storage.clone()));

    assert_eq!(session.status(), SessionStatus::Checking);
    assert_eq!(session.on_start().await, SessionStatus::NotAuthenticated);

    let state = session.state();
    assert!(state.token.is_none());
    assert!(state.user.is_none());
    // No request is made without a token.
    assert!(fake.state().await.authorization_headers.is_empty());
}

#[tokio::test]
async fn test_start_with_valid_token_persists_rotated_token() {
    let fake = FakeCafeApi::spawn().await;
    let user = fake.seed_user("Ana", "ana@cafe.com", "secreto1").await;
    let t1 = fake.issue_token(&user.id).await;
    assert_eq!(t1, "t1");

    let storage = Arc::new(MemoryStore::with_token(&t1));
    let mut session = SessionStore::new(fake.client(storage.clone()));

    assert_eq!(session.on_start().await, SessionStatus::Authenticated);
    assert_eq!(fake.last_authorization().await.as_deref(), Some("Bearer t1"));

    let state = session.state();
    assert_eq!(state.user.as_ref().map(|u| u.email.as_str()), Some("ana@cafe.com"));
    assert_eq!(stored_token(storage.as_ref()).await.as_deref(), Some("t2"));
}

#[tokio::test]
async fn test_start_with_rejected_token_keeps_persisted_token() {
    let fake = FakeCafeApi::spawn().await;
    let user = fake.seed_user("Ana", "ana@cafe.com", "secreto1").await;
    let token = fake.issue_token(&user.id).await;
    fake.state().await.reject_token_validation = true;

    let storage = Arc::new(MemoryStore::with_token(&token));
    let mut session = SessionStore::new(fake.client(storage.clone()));

    assert_eq!(session.on_start().await, SessionStatus::NotAuthenticated);
    assert!(session.state().token.is_none());
    assert_eq!(stored_token(storage.as_ref()).await, Some(token));
}

#[tokio::test]
async fn test_start_with_unreachable_server_is_not_authenticated() {
    let storage = Arc::new(MemoryStore::with_token("t1"));
    let mut session = SessionStore::new(unreachable_client(storage.clone()).await);

    assert_eq!(session.on_start().await, SessionStatus::NotAuthenticated);
    assert!(session.error_message().is_empty());
}

// ============================================================================
// sign_in / sign_up
// ============================================================================

#[tokio::test]
async fn test_sign_in_valid_credentials() {
    let fake = FakeCafeApi::spawn().await;
    fake.seed_user("Test", "test1@test.com", "123456").await;

    let storage = Arc::new(MemoryStore::new());
    let mut session = SessionStore::new(fake.client(storage.clone()));
    session.on_start().await;
    let mut watcher = session.subscribe();
    watcher.mark_unchanged();

    session
        .sign_in(&Credentials::new("test1@test.com", "123456"))
        .await;

    assert!(watcher.has_changed().expect("store alive"));
    let state = watcher.borrow_and_update().clone();
    assert_eq!(state.status, SessionStatus::Authenticated);
    assert!(state.error_message.is_empty());
    assert_eq!(state.user.as_ref().map(|u| u.name.as_str()), Some("Test"));

    // Persisted before observers saw the new status.
    let stored = stored_token(storage.as_ref()).await.expect("token persisted");
    assert!(!stored.is_empty());
}

#[tokio::test]
async fn test_sign_in_wrong_password_keeps_status() {
    let fake = FakeCafeApi::spawn().await;
    fake.seed_user("Test", "test1@test.com", "123456").await;

    let storage = Arc::new(MemoryStore::new());
    let mut session = SessionStore::new(fake.client(storage.clone()));
    session.on_start().await;

    session
        .sign_in(&Credentials::new("test1@test.com", "wrong"))
        .await;

    assert_eq!(session.status(), SessionStatus::NotAuthenticated);
    assert_eq!(
        session.error_message(),
        "Usuario / Password no son correctos - correo"
    );
    assert!(stored_token(storage.as_ref()).await.is_none());
}

#[tokio::test]
async fn test_sign_in_validation_error_uses_first_field_error() {
    let fake = FakeCafeApi::spawn().await;
    let mut session = SessionStore::new(fake.client(Arc::new(MemoryStore::new())));
    session.on_start().await;

    session.sign_in(&Credentials::new("no-at-sign", "123456")).await;

    assert_eq!(session.error_message(), "El correo no es válido");
}

#[tokio::test]
async fn test_sign_in_failure_while_checking_stays_checking() {
    let fake = FakeCafeApi::spawn().await;
    let mut session = SessionStore::new(fake.client(Arc::new(MemoryStore::new())));

    session
        .sign_in(&Credentials::new("nobody@test.com", "123456"))
        .await;

    assert_eq!(session.status(), SessionStatus::Checking);
    assert!(session.state().has_error());
}

#[tokio::test]
async fn test_sign_in_transport_failure_uses_fallback_message() {
    let mut session = SessionStore::new(unreachable_client(Arc::new(MemoryStore::new())).await);

    session
        .sign_in(&Credentials::new("test1@test.com", "123456"))
        .await;

    assert_eq!(session.error_message(), SIGN_IN_FALLBACK_ERROR);
}

#[tokio::test]
async fn test_sign_up_creates_account_and_authenticates() {
    let fake = FakeCafeApi::spawn().await;
    let storage = Arc::new(MemoryStore::new());
    let mut session = SessionStore::new(fake.client(storage.clone()));
    session.on_start().await;

    session
        .sign_up(&Registration::new("Luz", "luz@cafe.com", "secreto1"))
        .await;

    assert_eq!(session.status(), SessionStatus::Authenticated);
    let token = session
        .state()
        .token
        .map(|t| t.expose_secret().to_string());
    assert!(token.is_some());
    assert_eq!(token, stored_token(storage.as_ref()).await);
}

#[tokio::test]
async fn test_sign_up_duplicate_email_reports_field_error() {
    let fake = FakeCafeApi::spawn().await;
    fake.seed_user("Luz", "luz@cafe.com", "secreto1").await;
    let mut session = SessionStore::new(fake.client(Arc::new(MemoryStore::new())));
    session.on_start().await;

    session
        .sign_up(&Registration::new("Luz", "luz@cafe.com", "secreto1"))
        .await;

    assert_eq!(session.status(), SessionStatus::NotAuthenticated);
    assert_eq!(
        session.error_message(),
        "El correo luz@cafe.com ya está registrado"
    );
}

#[tokio::test]
async fn test_sign_up_transport_failure_uses_fallback_message() {
    let mut session = SessionStore::new(unreachable_client(Arc::new(MemoryStore::new())).await);

    session
        .sign_up(&Registration::new("Luz", "luz@cafe.com", "secreto1"))
        .await;

    assert_eq!(session.error_message(), SIGN_UP_FALLBACK_ERROR);
}

#[tokio::test]
async fn test_authenticated_requests_carry_bearer_token() {
    let fake = FakeCafeApi::spawn().await;
    fake.seed_user("Test", "test1@test.com", "123456").await;
    let mut session = SessionStore::new(fake.client(Arc::new(MemoryStore::new())));

    session
        .sign_in(&Credentials::new("test1@test.com", "123456"))
        .await;
    let token = session.state().token.expect("token");
    let token = token.expose_secret();

    session.api().list_categories().await.expect("categories");
    assert_eq!(
        fake.last_authorization().await,
        Some(format!("Bearer {token}"))
    );
}

// ============================================================================
// log_out / remove_error
// ============================================================================

#[tokio::test]
async fn test_log_out_is_idempotent() {
    let fake = FakeCafeApi::spawn().await;
    fake.seed_user("Test", "test1@test.com", "123456").await;
    let dir = tempfile::tempdir().expect("tempdir");
    let storage = Arc::new(FileStore::new(dir.path()));
    let mut session = SessionStore::new(fake.client(storage.clone()));

    session
        .sign_in(&Credentials::new("test1@test.com", "123456"))
        .await;
    assert!(stored_token(storage.as_ref()).await.is_some());

    for _ in 0..2 {
        session.log_out().await.expect("log out");
        let state = session.state();
        assert_eq!(state.status, SessionStatus::NotAuthenticated);
        assert!(state.token.is_none());
        assert!(state.user.is_none());
        assert!(stored_token(storage.as_ref()).await.is_none());
    }
}

#[tokio::test]
async fn test_log_out_then_start_is_not_authenticated() {
    let fake = FakeCafeApi::spawn().await;
    fake.seed_user("Test", "test1@test.com", "123456").await;
    let dir = tempfile::tempdir().expect("tempdir");

    let mut session = SessionStore::new(fake.client(Arc::new(FileStore::new(dir.path()))));
    session
        .sign_in(&Credentials::new("test1@test.com", "123456"))
        .await;
    session.log_out().await.expect("log out");
    drop(session);

    let mut restarted = SessionStore::new(fake.client(Arc::new(FileStore::new(dir.path()))));
    assert_eq!(restarted.on_start().await, SessionStatus::NotAuthenticated);
}

#[tokio::test]
async fn test_remove_error_is_idempotent() {
    let fake = FakeCafeApi::spawn().await;
    let mut session = SessionStore::new(fake.client(Arc::new(MemoryStore::new())));
    session.on_start().await;
    session
        .sign_in(&Credentials::new("nobody@test.com", "123456"))
        .await;
    assert!(!session.error_message().is_empty());

    let mut watcher = session.subscribe();
    watcher.mark_unchanged();

    session.remove_error();
    assert!(session.error_message().is_empty());
    assert!(watcher.has_changed().expect("store alive"));
    watcher.mark_unchanged();

    session.remove_error();
    assert!(session.error_message().is_empty());
    assert_eq!(session.status(), SessionStatus::NotAuthenticated);
    assert!(!watcher.has_changed().expect("store alive"));
}

// ============================================================================
// storage failures
// ============================================================================

#[tokio::test]
async fn test_start_with_unwritable_storage_is_not_authenticated() {
    let fake = FakeCafeApi::spawn().await;
    let user = fake.seed_user("Ana", "ana@cafe.com", "secreto1").await;
    let token = fake.issue_token(&user.id).await;
    let storage = Arc::new(ReadOnlyStore::with_token(&token));
    let mut session = SessionStore::new(fake.client(storage.clone()));

    // The server accepted the token, but the rotated one cannot be kept.
    assert_eq!(session.on_start().await, SessionStatus::NotAuthenticated);
    assert_eq!(fake.last_authorization().await, Some(format!("Bearer {token}")));
    assert!(session.state().token.is_none());
    assert_eq!(stored_token(storage.as_ref()).await, Some(token));
}

#[tokio::test]
async fn test_sign_in_with_unwritable_storage_keeps_status() {
    let fake = FakeCafeApi::spawn().await;
    fake.seed_user("Test", "test1@test.com", "123456").await;
    let storage = Arc::new(ReadOnlyStore::empty());
    let mut session = SessionStore::new(fake.client(storage.clone()));
    session.on_start().await;

    session
        .sign_in(&Credentials::new("test1@test.com", "123456"))
        .await;

    let state = session.state();
    assert_eq!(state.status, SessionStatus::NotAuthenticated);
    assert!(state.token.is_none());
    assert!(state.user.is_none());
    assert_eq!(state.error_message, SIGN_IN_FALLBACK_ERROR);
}

#[tokio::test]
async fn test_sign_up_with_unwritable_storage_keeps_status() {
    let fake = FakeCafeApi::spawn().await;
    let mut session = SessionStore::new(fake.client(Arc::new(ReadOnlyStore::empty())));
    session.on_start().await;

    session
        .sign_up(&Registration::new("Luz", "luz@cafe.com", "secreto1"))
        .await;

    assert_eq!(session.status(), SessionStatus::NotAuthenticated);
    assert_eq!(session.error_message(), SIGN_UP_FALLBACK_ERROR);
}

#[tokio::test]
async fn test_log_out_with_unwritable_storage_still_signs_out() {
    let fake = FakeCafeApi::spawn().await;
    fake.seed_user("Test", "test1@test.com", "123456").await;
    let storage = Arc::new(ReadOnlyStore::new(MemoryStore::new(), false));
    let mut session = SessionStore::new(fake.client(storage.clone()));
    session
        .sign_in(&Credentials::new("test1@test.com", "123456"))
        .await;
    assert_eq!(session.status(), SessionStatus::Authenticated);

    storage.make_read_only();
    let result = session.log_out().await;

    assert!(matches!(result, Err(StorageError::Io(_))));
    let state = session.state();
    assert_eq!(state.status, SessionStatus::NotAuthenticated);
    assert!(state.token.is_none());
    assert!(state.user.is_none());
    // The token could not be removed and is still stored.
    assert!(stored_token(storage.as_ref()).await.is_some());
}
