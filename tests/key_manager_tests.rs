use coursegen::services::youtube::{ApiKeyManager, ApiKeyStatus};

fn three_key_pool() -> ApiKeyManager {
    ApiKeyManager::new(vec![
        ("KEY_1".to_string(), "secret-1".to_string()),
        ("KEY_2".to_string(), "secret-2".to_string()),
        ("KEY_3".to_string(), "secret-3".to_string()),
    ])
}

#[test]
fn test_current_key_returns_first_active() {
    let pool = three_key_pool();
    assert_eq!(pool.current_key().as_deref(), Some("secret-1"));
    assert!(pool.has_active_keys());
}

#[test]
fn test_quota_exceeded_moves_to_next_key() {
    let pool = three_key_pool();
    assert_eq!(pool.current_key().as_deref(), Some("secret-1"));

    pool.mark_quota_exceeded(Some("Daily Limit Exceeded"));

    // The next call adopts key 2 without any operator intervention
    assert_eq!(pool.current_key().as_deref(), Some("secret-2"));

    let statuses = pool.key_statuses();
    assert_eq!(statuses[0].status, ApiKeyStatus::QuotaExceeded);
    assert_eq!(statuses[0].last_error.as_deref(), Some("Daily Limit Exceeded"));
    assert_eq!(statuses[1].status, ApiKeyStatus::Active);
}

#[test]
fn test_rotation_wraps_past_unhealthy_keys() {
    let pool = three_key_pool();
    pool.current_key();
    pool.mark_quota_exceeded(None);

    assert_eq!(pool.rotate_to_next_key().as_deref(), Some("secret-2"));
    pool.mark_quota_exceeded(None);
    assert_eq!(pool.rotate_to_next_key().as_deref(), Some("secret-3"));
    pool.mark_quota_exceeded(None);

    // Full cycle with nothing active left
    assert_eq!(pool.rotate_to_next_key(), None);
    assert!(!pool.has_active_keys());
    assert_eq!(pool.current_key(), None);
}

#[test]
fn test_error_threshold_demotes_key() {
    let pool = ApiKeyManager::new(vec![("KEY_1".to_string(), "secret-1".to_string())]);

    pool.mark_error(Some("boom"));
    pool.mark_error(Some("boom"));
    assert_eq!(pool.key_statuses()[0].status, ApiKeyStatus::Active);
    assert_eq!(pool.key_statuses()[0].error_count, 2);

    pool.mark_error(Some("boom"));
    assert_eq!(pool.key_statuses()[0].status, ApiKeyStatus::Error);
    assert!(!pool.has_active_keys());
    assert_eq!(pool.current_key(), None);
}

#[test]
fn test_reset_key_restores_active() {
    let pool = three_key_pool();
    pool.mark_quota_exceeded(None);
    assert_eq!(pool.key_statuses()[0].status, ApiKeyStatus::QuotaExceeded);

    pool.reset_key(0);

    let statuses = pool.key_statuses();
    assert_eq!(statuses[0].status, ApiKeyStatus::Active);
    assert_eq!(statuses[0].error_count, 0);
    assert!(statuses[0].last_error.is_none());
}

#[test]
fn test_reset_all_restores_every_key() {
    let pool = three_key_pool();
    pool.mark_quota_exceeded(None);
    pool.rotate_to_next_key();
    pool.mark_error(Some("a"));
    pool.mark_error(Some("b"));
    pool.mark_error(Some("c"));

    pool.reset_all();

    for status in pool.key_statuses() {
        assert_eq!(status.status, ApiKeyStatus::Active);
        assert_eq!(status.error_count, 0);
    }
    assert!(pool.has_active_keys());
}

#[test]
fn test_statuses_are_redacted() {
    let pool = three_key_pool();
    pool.current_key();

    let statuses = pool.key_statuses();
    assert_eq!(statuses.len(), 3);
    assert_eq!(statuses[0].label, "KEY_1");
    assert!(statuses[0].last_used.is_some());

    // The view serializes without the raw key value anywhere
    let json = serde_json::to_string(&statuses).unwrap();
    assert!(!json.contains("secret-1"));
    assert!(!json.contains("secret-2"));
}

#[test]
fn test_empty_pool() {
    let pool = ApiKeyManager::new(vec![]);
    assert_eq!(pool.current_key(), None);
    assert_eq!(pool.rotate_to_next_key(), None);
    assert!(!pool.has_active_keys());
    assert!(pool.key_statuses().is_empty());
}
