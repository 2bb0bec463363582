//! Cached per-user and per-participation problem aggregates
//!
//! "Completed" problems have an accepted submission at full points.
//! "Attempted" problems have a best score strictly below full points.
//! Entries live for the configured TTL unless evicted after a rescore.

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;

use serde::{Serialize, de::DeserializeOwned};

use crate::{
    constants::cache_keys,
    error::AppResult,
    models::AttemptedProblem,
    state::AppState,
};

pub type CompletedIds = BTreeSet<i64>;
pub type AttemptedMap = BTreeMap<i64, AttemptedProblem>;

/// Read `key` from the cache, falling back to `load` and storing its result.
///
/// Cache failures never fail the request; the store is the source of truth.
async fn cached<T, F, Fut>(state: &AppState, key: String, load: F) -> AppResult<T>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    match state.cache().get_raw(&key).await {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(value) => return Ok(value),
            Err(e) => tracing::warn!(key = %key, error = %e, "Discarding undecodable cache entry"),
        },
        Ok(None) => {}
        Err(e) => tracing::warn!(key = %key, error = %e, "Cache read failed"),
    }

    let value = load().await?;

    match serde_json::to_string(&value) {
        Ok(raw) => {
            let ttl = state.config().cache.ttl_secs;
            if let Err(e) = state.cache().set_raw(&key, &raw, ttl).await {
                tracing::warn!(key = %key, error = %e, "Cache write failed");
            }
        }
        Err(e) => tracing::warn!(key = %key, error = %e, "Failed to encode cache entry"),
    }

    Ok(value)
}

async fn evict(state: &AppState, key: String) {
    if let Err(e) = state.cache().delete(&key).await {
        tracing::warn!(key = %key, error = %e, "Cache eviction failed");
    }
}

pub async fn user_completed_ids(state: &AppState, profile_id: i64) -> AppResult<CompletedIds> {
    let key = format!("{}:{}", cache_keys::USER_COMPLETE, profile_id);
    cached(state, key, || state.store().user_completed_ids(profile_id)).await
}

pub async fn user_attempted_ids(state: &AppState, profile_id: i64) -> AppResult<AttemptedMap> {
    let key = format!("{}:{}", cache_keys::USER_ATTEMPTED, profile_id);
    cached(state, key, || state.store().user_attempted(profile_id)).await
}

pub async fn contest_completed_ids(state: &AppState, participation_id: i64) -> AppResult<CompletedIds> {
    let key = format!("{}:{}", cache_keys::CONTEST_COMPLETE, participation_id);
    cached(state, key, || {
        state.store().participation_completed_ids(participation_id)
    })
    .await
}

pub async fn contest_attempted_ids(state: &AppState, participation_id: i64) -> AppResult<AttemptedMap> {
    let key = format!("{}:{}", cache_keys::CONTEST_ATTEMPTED, participation_id);
    cached(state, key, || state.store().participation_attempted(participation_id)).await
}

/// Drop the cached aggregates of a profile
pub async fn evict_user(state: &AppState, profile_id: i64) {
    evict(state, format!("{}:{}", cache_keys::USER_COMPLETE, profile_id)).await;
    evict(state, format!("{}:{}", cache_keys::USER_ATTEMPTED, profile_id)).await;
}

/// Drop the cached aggregates of a participation
pub async fn evict_participation(state: &AppState, participation_id: i64) {
    evict(state, format!("{}:{}", cache_keys::CONTEST_COMPLETE, participation_id)).await;
    evict(state, format!("{}:{}", cache_keys::CONTEST_ATTEMPTED, participation_id)).await;
}
