//! Security tests for cookie replay, tampering and fixation.
//!
//! The user-agent prefix is a lightweight deterrent: these tests pin down
//! what it guarantees (a cookie never validates under another user agent)
//! and how foreign or forged cookies collapse to an anonymous session.

use http::HeaderMap;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;

use super::key::state_prefix;
use super::session::*;
use crate::storage::{SessionData, SessionStore};
use crate::test_utils::{SpyStore, request_headers, set_cookie_value, test_manager};

const VICTIM_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) Chrome/126.0 Safari/537.36";
const ATTACKER_UA: &str = "curl/8.5.0";

async fn victim_cookie(store: &Arc<SpyStore>) -> String {
    let manager = test_manager(store.clone(), 3600, 300);
    let request = request_headers(VICTIM_UA, None);
    let mut session = Session::load(manager, &request.context()).await;
    let mut payload = SessionData::new();
    payload.insert("name".to_string(), json!("victim"));
    session.login(payload).await.unwrap();
    session.key().to_string()
}

#[tokio::test]
async fn test_cookie_replayed_from_other_user_agent_is_rejected() {
    // Given a cookie issued to the victim's browser
    let store = Arc::new(SpyStore::new());
    let cookie = victim_cookie(&store).await;

    // When an attacker presents it with a different user agent
    let request = request_headers(ATTACKER_UA, Some(&cookie));
    let session = Session::load(test_manager(store.clone(), 3600, 300), &request.context()).await;

    // Then the attacker gets an anonymous session
    assert_eq!(session.key(), "");
    assert!(session.payload().is_empty());
    assert!(session.is_changed());
}

#[tokio::test]
async fn test_rejected_replay_leaves_victim_session_intact() {
    // Given a replay attempt with a foreign user agent
    let store = Arc::new(SpyStore::new());
    let cookie = victim_cookie(&store).await;
    let request = request_headers(ATTACKER_UA, Some(&cookie));
    let _ = Session::load(test_manager(store.clone(), 3600, 300), &request.context()).await;

    // Then nothing was deleted and the victim can still load their session
    assert_eq!(store.del_calls(), 0);
    let request = request_headers(VICTIM_UA, Some(&cookie));
    let session = Session::load(test_manager(store.clone(), 3600, 300), &request.context()).await;
    assert_eq!(session.get("name"), Some(&json!("victim")));
}

#[tokio::test]
async fn test_rejected_replay_clears_attacker_cookie_on_save() {
    let store = Arc::new(SpyStore::new());
    let cookie = victim_cookie(&store).await;
    let request = request_headers(ATTACKER_UA, Some(&cookie));
    let session = Session::load(test_manager(store, 3600, 300), &request.context()).await;

    let mut headers = HeaderMap::new();
    session.save(&mut headers).await.unwrap();

    assert_eq!(set_cookie_value(&headers).as_deref(), Some(""));
}

#[tokio::test]
async fn test_arbitrary_cookie_values_are_rejected() {
    let store = Arc::new(SpyStore::new());
    let prefix = state_prefix(VICTIM_UA);
    let tampered = [
        "garbage".to_string(),
        "|abcdefgh".to_string(),
        prefix.trim_end_matches('|').to_string(),
        format!("x{prefix}abcdefgh"),
        state_prefix(ATTACKER_UA) + "abcdefgh",
    ];

    for cookie in tampered {
        let request = request_headers(VICTIM_UA, Some(&cookie));
        let session = Session::load(test_manager(store.clone(), 3600, 300), &request.context()).await;
        assert_eq!(session.key(), "", "cookie {cookie:?} should be rejected");
        assert!(!session.is_logged_in());
    }
}

#[tokio::test]
async fn test_forged_key_with_valid_prefix_is_not_fixated() {
    // Given an attacker-chosen key that carries the right prefix but was never issued
    let store = Arc::new(SpyStore::new());
    let forged = format!("{}AAAAAAAA", state_prefix(VICTIM_UA));
    let request = request_headers(VICTIM_UA, Some(&forged));

    // When the victim loads with it and then logs in
    let mut session = Session::load(test_manager(store.clone(), 3600, 300), &request.context()).await;
    assert_eq!(session.key(), "");
    session.login(SessionData::new()).await.unwrap();

    // Then the login runs under a freshly generated key
    assert_ne!(session.key(), forged);
    assert!(store.stored(&forged).await.is_empty());
}

#[tokio::test]
async fn test_store_entry_without_prefix_match_is_never_read() {
    // Given a store entry planted under a key for another user agent
    let store = Arc::new(SpyStore::new());
    let planted = format!("{}plant000", state_prefix(ATTACKER_UA));
    let mut payload = SessionData::new();
    payload.insert("role".to_string(), json!("admin"));
    store.fade_msx(&planted, &payload, 3600).await.unwrap();

    // When the victim's browser presents it
    let request = request_headers(VICTIM_UA, Some(&planted));
    let session = Session::load(test_manager(store.clone(), 3600, 300), &request.context()).await;

    // Then the planted payload is not adopted
    assert!(session.get("role").is_none());
}

#[tokio::test]
async fn test_concurrent_logins_get_distinct_keys() {
    // Given many sessions for the same user agent logging in at once
    let store = Arc::new(SpyStore::new());
    let manager = test_manager(store.clone(), 3600, 300);

    let mut handles = vec![];
    for i in 0..32 {
        let manager = manager.clone();
        handles.push(tokio::spawn(async move {
            let request = request_headers(VICTIM_UA, None);
            let mut session = Session::load(manager, &request.context()).await;
            let mut payload = SessionData::new();
            payload.insert("n".to_string(), json!(i));
            session.login(payload).await.unwrap();
            (session.key().to_string(), i)
        }));
    }

    // Then every login owns its own store entry
    let mut keys = HashSet::new();
    for handle in handles {
        let (key, i) = handle.await.unwrap();
        assert_eq!(store.stored(&key).await.get("n"), Some(&json!(i)));
        keys.insert(key);
    }
    assert_eq!(keys.len(), 32);
}
