//! Navigation gate following a live session.
//!
//! Run with: cargo test -p cafe-catalog-integration-tests

use std::sync::Arc;

use cafe_catalog_client::{
    Credentials, MemoryStore, NavigationGate, Screen, ScreenGroup, SessionStore,
};
use cafe_catalog_integration_tests::FakeCafeApi;

#[tokio::test]
async fn test_gate_follows_session_through_sign_in_and_log_out() {
    let fake = FakeCafeApi::spawn().await;
    fake.seed_user("Test", "test1@test.com", "123456").await;

    let mut session = SessionStore::new(fake.client(Arc::new(MemoryStore::new())));
    let mut watcher = session.subscribe();
    let mut gate = NavigationGate::new(session.status());
    assert_eq!(gate.current(), Screen::Loading);

    session.on_start().await;
    assert_eq!(gate.follow(&mut watcher).await, Some(true));
    assert_eq!(gate.group(), ScreenGroup::Unauthenticated);
    assert!(gate.push(Screen::Products).is_err());
    gate.push(Screen::Register).expect("register reachable");

    session
        .sign_in(&Credentials::new("test1@test.com", "123456"))
        .await;
    assert_eq!(gate.follow(&mut watcher).await, Some(true));
    assert_eq!(gate.stack(), &[Screen::Products]);
    gate.push(Screen::Product).expect("product reachable");
    gate.push(Screen::Protected).expect("protected reachable");

    session.log_out().await.expect("log out");
    assert_eq!(gate.follow(&mut watcher).await, Some(true));
    assert_eq!(gate.stack(), &[Screen::Login]);
    assert_eq!(gate.pop(), None);
    assert!(gate.push(Screen::Protected).is_err());
}

#[tokio::test]
async fn test_failed_sign_in_keeps_mounted_group() {
    let fake = FakeCafeApi::spawn().await;
    let mut session = SessionStore::new(fake.client(Arc::new(MemoryStore::new())));
    let mut watcher = session.subscribe();
    let mut gate = NavigationGate::default();

    session.on_start().await;
    gate.follow(&mut watcher).await;
    gate.push(Screen::Register).expect("register reachable");

    session
        .sign_in(&Credentials::new("nobody@test.com", "123456"))
        .await;
    assert_eq!(gate.follow(&mut watcher).await, Some(false));
    assert_eq!(gate.stack(), &[Screen::Login, Screen::Register]);
    assert!(watcher.borrow().has_error());
}

#[tokio::test]
async fn test_restored_session_mounts_authenticated_group() {
    let fake = FakeCafeApi::spawn().await;
    let user = fake.seed_user("Ana", "ana@cafe.com", "secreto1").await;
    let token = fake.issue_token(&user.id).await;

    let mut session = SessionStore::new(fake.client(Arc::new(MemoryStore::with_token(&token))));
    let status = session.on_start().await;

    let gate = NavigationGate::new(status);
    assert_eq!(gate.group(), ScreenGroup::Authenticated);
    assert_eq!(gate.current(), Screen::Products);
}

#[tokio::test]
async fn test_follow_ends_when_session_dropped() {
    let fake = FakeCafeApi::spawn().await;
    let session = SessionStore::new(fake.client(Arc::new(MemoryStore::new())));
    let mut watcher = session.subscribe();
    let mut gate = NavigationGate::default();

    drop(session);
    assert_eq!(gate.follow(&mut watcher).await, None);
}
