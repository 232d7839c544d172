//! Session token lifecycle through a running server state.

mod support;

use std::time::Duration;

use fieldstore_server::*;
use fieldstore_test_utils::*;

#[tokio::test(start_paused = true)]
async fn token_lives_while_used_and_is_swept_when_idle() {
    let base = fixtures::shard_root();
    let harness = support::start(base.path(), 10, 1, 1);
    let sessions = &harness.state.sessions;

    let token = sessions.issue_token(fixtures::analyst()).unwrap();
    assert_eq!(sessions.remaining_lifetime(&token), Duration::from_secs(15 * 60));

    // Regular use keeps the token alive past the lifetime.
    for _ in 0..4 {
        harness.clock.advance(Duration::from_secs(10 * 60));
        let user = sessions.get_user(&token).unwrap();
        assert_eq!(user.username, "analyst1");
        assert!(user.has_role("analyst"));
    }

    harness.clock.advance(Duration::from_secs(5 * 60));
    assert_eq!(sessions.remaining_lifetime(&token), Duration::from_secs(10 * 60));

    harness.clock.advance(Duration::from_secs(11 * 60));
    tokio::time::sleep(Duration::from_secs(61)).await;

    assert_eq!(sessions.active_sessions(), 0);
    assert!(sessions.get_user(&token).is_none());
    assert_eq!(sessions.remaining_lifetime(&token), Duration::ZERO);

    let (_, sweep) = harness
        .state
        .sweep_metrics()
        .into_iter()
        .find(|(name, _)| *name == "session_sweep")
        .unwrap();
    assert_eq!(sweep.runs, 1);
    assert_eq!(sweep.items, 1);

    harness.state.shutdown().await;
}

#[tokio::test]
async fn user_may_hold_several_tokens() {
    let base = fixtures::shard_root();
    let harness = support::start(base.path(), 10, 1, 1);
    let sessions = &harness.state.sessions;

    let phone = sessions.issue_token(fixtures::participant()).unwrap();
    let laptop = sessions.issue_token(fixtures::participant()).unwrap();
    let other = sessions.issue_token(fixtures::analyst()).unwrap();
    assert_ne!(phone, laptop);

    assert!(sessions.revoke_token(&phone));
    assert!(!sessions.revoke_token(&phone));
    assert!(sessions.get_user(&laptop).is_some());

    assert_eq!(sessions.revoke_all_tokens_for("participant1"), 1);
    assert!(sessions.get_user(&laptop).is_none());
    assert!(sessions.get_user(&other).is_some());

    harness.state.shutdown().await;
}

#[tokio::test]
async fn returned_snapshot_is_detached_from_the_store() {
    let base = fixtures::shard_root();
    let harness = support::start(base.path(), 10, 1, 1);
    let sessions = &harness.state.sessions;

    let token = sessions.issue_token(fixtures::participant()).unwrap();
    let mut copy = sessions.get_user(&token).unwrap();
    copy.roles.insert("admin".to_string());

    assert!(!sessions.get_user(&token).unwrap().has_role("admin"));

    harness.state.shutdown().await;
}
