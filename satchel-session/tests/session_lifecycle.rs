//! Integration tests for satchel-session

use satchel_session::*;
use serde_json::json;
use std::collections::HashSet;
use std::path::Path;

const SECRET: &str = "integration-secret";

fn memory_manager() -> SessionManager {
    SessionManager::new(SessionConfig::new(SECRET).unwrap()).unwrap()
}

fn file_manager(dir: &Path) -> SessionManager {
    let config = SessionConfig::new(SECRET)
        .unwrap()
        .with_backend("file")
        .unwrap()
        .with_storage_directory(dir);
    SessionManager::new(config).unwrap()
}

/// Run one request that stores `{"user": "joe"}` and return the cookies the
/// browser would send next time.
async fn login_as_joe(manager: &SessionManager) -> (RequestCookies, SessionKey) {
    let request = RequestCookies::new();
    let mut response = manager.response_cookies();

    let mut session = manager.session();
    session.load(&request, &mut response).await.unwrap();
    session.set("user", "joe").unwrap();
    session.save(&request, &mut response).await;

    let key = session.key().unwrap().clone();
    (RequestCookies::from_response(&response), key)
}

#[test]
fn test_minted_keys_do_not_collide() {
    let keys: HashSet<SessionKey> = (0..10_000).map(|_| SessionKey::generate()).collect();
    assert_eq!(keys.len(), 10_000);
}

#[tokio::test]
async fn test_file_roundtrip_across_managers() {
    let temp_dir = tempfile::tempdir().unwrap();
    let (cookies, key) = login_as_joe(&file_manager(temp_dir.path())).await;

    // A new manager stands in for a process restart
    let manager = file_manager(temp_dir.path());
    let mut session = manager.session();
    session
        .load(&cookies, &mut manager.response_cookies())
        .await
        .unwrap();

    assert_eq!(session.key(), Some(&key));
    let mut expected = SessionData::new();
    expected.insert("user".to_string(), json!("joe"));
    assert_eq!(session.data(), &expected);
}

#[tokio::test]
async fn test_memory_roundtrip_with_unrelated_session_in_between() {
    let manager = memory_manager();
    let (cookies, key) = login_as_joe(&manager).await;

    // Unrelated visitor: load and save without changes
    let stranger = RequestCookies::new();
    let mut stranger_response = manager.response_cookies();
    let mut other = manager.session();
    other.load(&stranger, &mut stranger_response).await.unwrap();
    other.save(&stranger, &mut stranger_response).await;
    assert_ne!(other.key(), Some(&key));

    let mut session = manager.session();
    session
        .load(&cookies, &mut manager.response_cookies())
        .await
        .unwrap();
    assert_eq!(session.get::<String>("user"), Some("joe".to_string()));
    assert_eq!(session.data().len(), 1);
}

#[tokio::test]
async fn test_absent_session_is_empty_and_file_is_created() {
    let temp_dir = tempfile::tempdir().unwrap();
    let manager = file_manager(temp_dir.path());
    let request = RequestCookies::new();
    let mut response = manager.response_cookies();

    let mut session = manager.session();
    session.load(&request, &mut response).await.unwrap();
    assert!(session.data().is_empty());

    let path = temp_dir.path().join(session.key().unwrap().as_str());
    let contents = std::fs::read_to_string(path).unwrap();
    assert_eq!(contents.trim(), "{}");
}

#[tokio::test]
async fn test_absent_session_is_empty_in_memory() {
    let manager = memory_manager();
    let mut session = manager.session();
    session
        .load(&RequestCookies::new(), &mut manager.response_cookies())
        .await
        .unwrap();
    assert!(session.data().is_empty());
}

#[tokio::test]
async fn test_purge_is_idempotent_and_next_load_mints() {
    for backend in ["memory", "file"] {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = SessionConfig::new(SECRET)
            .unwrap()
            .with_backend(backend)
            .unwrap()
            .with_storage_directory(temp_dir.path());
        let manager = SessionManager::new(config).unwrap();
        let (cookies, key) = login_as_joe(&manager).await;

        let mut response = manager.response_cookies();
        let mut session = manager.session();
        session.load(&cookies, &mut response).await.unwrap();
        assert_eq!(session.key(), Some(&key));

        session.purge(&cookies).await.unwrap();
        session.purge(&cookies).await.unwrap();
        assert!(!manager.store().exists(&key).await.unwrap());

        session.load(&cookies, &mut response).await.unwrap();
        assert!(session.data().is_empty(), "backend {}", backend);
        assert_ne!(session.key(), Some(&key), "backend {}", backend);
        assert!(session.is_new());
    }
}

#[tokio::test]
async fn test_tampered_cookie_behaves_like_no_cookie() {
    let manager = memory_manager();
    let (cookies, key) = login_as_joe(&manager).await;

    let name = &manager.config().cookie_name;
    let signed = cookies.get(name).unwrap();
    let (value, signature) = signed.rsplit_once('.').unwrap();
    let last = if signature.ends_with('A') { 'E' } else { 'A' };
    let forged = format!("{}.{}{}", value, &signature[..signature.len() - 1], last);

    let mut tampered = RequestCookies::new();
    tampered.insert(name.clone(), forged);
    let mut response = manager.response_cookies();

    let mut session = manager.session();
    session.load(&tampered, &mut response).await.unwrap();

    assert_ne!(session.key(), Some(&key));
    assert!(session.is_new());
    assert!(session.data().is_empty());
    assert!(response.get(name).is_some());
}

#[tokio::test]
async fn test_cookie_signed_with_other_secret_is_rejected() {
    let manager = memory_manager();
    let (cookies, key) = login_as_joe(&manager).await;

    let other = SessionManager::with_store(
        SessionConfig::new("another-secret").unwrap(),
        MemorySessionStore::new(),
    );
    let mut session = other.session();
    session
        .load(&cookies, &mut other.response_cookies())
        .await
        .unwrap();
    assert_ne!(session.key(), Some(&key));
}

#[test]
fn test_bogus_backend_rejected_before_io() {
    let temp_dir = tempfile::tempdir().unwrap();
    let dir = temp_dir.path().join("sessions");

    let result = SessionConfig::new(SECRET)
        .unwrap()
        .with_storage_directory(&dir)
        .with_backend("bogus");

    assert!(matches!(result, Err(SessionError::Config(_))));
    assert!(!dir.exists());
}

#[tokio::test]
async fn test_file_manager_construction_touches_nothing() {
    let temp_dir = tempfile::tempdir().unwrap();
    let dir = temp_dir.path().join("sessions");

    let _manager = file_manager(&dir);
    assert!(!dir.exists());
}

#[tokio::test]
async fn test_save_failure_keeps_buffer_and_does_not_propagate() {
    let temp_dir = tempfile::tempdir().unwrap();
    let dir = temp_dir.path().join("sessions");
    let manager = file_manager(&dir);
    let request = RequestCookies::new();
    let mut response = manager.response_cookies();

    let mut session = manager.session();
    session.load(&request, &mut response).await.unwrap();
    session.set("user", "joe").unwrap();
    session.set("cart", vec![1, 2, 3]).unwrap();
    let before = session.data().clone();

    // Replace the storage directory with a plain file so every write fails
    std::fs::remove_dir_all(&dir).unwrap();
    std::fs::write(&dir, "not a directory").unwrap();

    session.save(&request, &mut response).await;
    session.commit(&request, &mut response).await;
    assert_eq!(session.data(), &before);

    let err = session.try_save(&request, &mut response).await.unwrap_err();
    assert!(err.is_persistence_failure());
    assert_eq!(session.data(), &before);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_visitors_get_isolated_sessions() {
    let temp_dir = tempfile::tempdir().unwrap();
    let manager = file_manager(temp_dir.path());

    let mut handles = Vec::new();
    for i in 0..32 {
        let manager = manager.clone();
        handles.push(tokio::spawn(async move {
            let request = RequestCookies::new();
            let mut response = manager.response_cookies();
            let mut session = manager.session();
            session.load(&request, &mut response).await.unwrap();
            session.set("visitor", i).unwrap();
            session.try_save(&request, &mut response).await.unwrap();
            (RequestCookies::from_response(&response), i)
        }));
    }

    for handle in handles {
        let (cookies, i) = handle.await.unwrap();
        let mut session = manager.session();
        session
            .load(&cookies, &mut manager.response_cookies())
            .await
            .unwrap();
        assert_eq!(session.get::<i32>("visitor"), Some(i));
    }

    assert_eq!(manager.store().count().await.unwrap(), 32);
}
