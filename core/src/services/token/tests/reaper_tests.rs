//! Tests for stale refresh token purging

use chrono::Duration;
use std::sync::Arc;
use uuid::Uuid;

use super::fixed_now;
use crate::domain::entities::{RefreshTokenRecord, Revocation, RevocationReason};
use crate::domain::value_objects::AuditInfo;
use crate::repositories::{InMemoryTokenStore, RefreshTokenStore};
use crate::services::token::{hash_token, StaleTokenReaper};

async fn seed(
    store: &InMemoryTokenStore,
    user_id: Uuid,
    label: &str,
    issued_days_ago: i64,
    ttl_days: i64,
    revoked: bool,
) -> RefreshTokenRecord {
    let mut record = RefreshTokenRecord::new(
        user_id,
        hash_token(label),
        fixed_now() - Duration::days(issued_days_ago),
        Duration::days(ttl_days),
        AuditInfo::default(),
    )
    .unwrap();
    if revoked {
        record
            .revoke(Revocation::new(RevocationReason::Revoked, fixed_now() - Duration::days(issued_days_ago), None))
            .unwrap();
    }
    store.add(record).await.unwrap()
}

#[tokio::test]
async fn test_purge_removes_only_inactive() {
    let store = Arc::new(InMemoryTokenStore::new());
    let user_id = Uuid::new_v4();
    let active = seed(&store, user_id, "active", 1, 7, false).await;
    seed(&store, user_id, "expired", 10, 7, false).await;
    seed(&store, user_id, "revoked", 1, 7, true).await;

    let reaper = StaleTokenReaper::new(store.clone(), Duration::zero());
    let removed = reaper.purge(user_id, fixed_now()).await.unwrap();

    assert_eq!(removed, 2);
    let remaining = store.find_by_user_id(user_id).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id(), active.id());
}

#[tokio::test]
async fn test_purge_is_scoped_to_user() {
    let store = Arc::new(InMemoryTokenStore::new());
    let user_id = Uuid::new_v4();
    let other_user = Uuid::new_v4();
    seed(&store, user_id, "mine", 10, 7, false).await;
    seed(&store, other_user, "theirs", 10, 7, false).await;

    let reaper = StaleTokenReaper::new(store.clone(), Duration::zero());
    assert_eq!(reaper.purge(user_id, fixed_now()).await.unwrap(), 1);
    assert_eq!(store.find_by_user_id(other_user).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_retention_keeps_recent_inactive() {
    let store = Arc::new(InMemoryTokenStore::new());
    let user_id = Uuid::new_v4();
    seed(&store, user_id, "recently-revoked", 2, 7, true).await;
    seed(&store, user_id, "long-expired", 40, 7, false).await;

    let reaper = StaleTokenReaper::new(store.clone(), Duration::days(30));
    assert_eq!(reaper.purge(user_id, fixed_now()).await.unwrap(), 1);

    let remaining = store.find_by_user_id(user_id).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].token_hash(), hash_token("recently-revoked"));
}

#[tokio::test]
async fn test_purge_operation_in_batch() {
    let store = Arc::new(InMemoryTokenStore::new());
    let user_id = Uuid::new_v4();
    seed(&store, user_id, "expired", 10, 7, false).await;

    let reaper = StaleTokenReaper::new(store.clone(), Duration::zero());
    let report = store
        .commit_atomic(vec![reaper.purge_operation(user_id, fixed_now())])
        .await
        .unwrap();

    assert_eq!(report.removed, 1);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_purge_with_nothing_to_do() {
    let store = Arc::new(InMemoryTokenStore::new());
    let reaper = StaleTokenReaper::new(store, Duration::zero());
    assert_eq!(reaper.purge(Uuid::new_v4(), fixed_now()).await.unwrap(), 0);
}
