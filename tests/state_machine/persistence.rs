//! State Machine Persistence Tests
//!
//! Tests for the state machine persistence component using SQLx native testing
//! for automatic database isolation.

#[test]
fn test_metadata_creation() {
    let metadata = serde_json::json!({
        "event": "start",
        "timestamp": "2024-01-01T00:00:00Z",
    });

    assert_eq!(metadata["event"], "start");
    assert!(metadata["timestamp"].is_string());
}

#[test]
fn test_idempotent_logic() {
    // Test the logical behavior of idempotent operations
    // This tests the concept without requiring database setup

    // Mock behavior: if current state equals target state, no transition needed
    let current_state = Some("in_progress".to_string());
    let target_state = "in_progress".to_string();

    let should_transition = current_state.as_ref() != Some(&target_state);
    assert!(
        !should_transition,
        "Should not transition when already in target state"
    );

    // Test different states - should transition
    let current_state = Some("pending".to_string());
    let target_state = "in_progress".to_string();

    let should_transition = current_state.as_ref() != Some(&target_state);
    assert!(should_transition, "Should transition when states differ");

    // Test no current state - should transition
    let current_state: Option<String> = None;
    let target_state = "in_progress".to_string();

    let should_transition = current_state.as_ref() != Some(&target_state);
    assert!(should_transition, "Should transition when no current state");
}
