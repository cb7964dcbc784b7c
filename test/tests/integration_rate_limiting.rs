use std::time::Duration;

use serde_json::json;

use replica_server::{DispatchOutcome, DropReason, HostConfig, RateLimitConfig};
use replica_shared::{DescriptorRegistry, ObjectId, PeerId};
use replica_test::{
    assert_converged,
    test_models::{self, CHAT, POSITIONS},
    TestLobby,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn joined(lobby: &mut TestLobby, actor: &str) -> PeerId {
    let peer = lobby.join(actor);
    lobby.exchange();
    lobby.send_command(&peer, "party:join:request", json!({ "actor": actor, "name": actor }));
    assert_eq!(lobby.exchange()[0], DispatchOutcome::Handled);
    peer
}

fn send_moves(lobby: &mut TestLobby, peer: &PeerId, actor: &str, count: i64) -> Vec<DispatchOutcome> {
    for x in 0..count {
        lobby.send_command(peer, "world:move:request", json!({ "actor": actor, "x": x, "y": 0 }));
    }
    lobby.peer_to_host(peer)
}

#[test]
fn moves_beyond_quota_are_dropped_until_window_slides() {
    init_logger();
    let mut lobby = TestLobby::new();
    let peer = joined(&mut lobby, "a");

    let outcomes = send_moves(&mut lobby, &peer, "a", 4);
    assert_eq!(
        outcomes,
        vec![
            DispatchOutcome::Handled,
            DispatchOutcome::Handled,
            DispatchOutcome::Handled,
            DispatchOutcome::Dropped(DropReason::RateLimited),
        ]
    );
    let positions = ObjectId::from(POSITIONS);
    let rev_after_burst = lobby.host.engine().revision(&positions).unwrap();

    lobby.advance(Duration::from_millis(500));
    assert_eq!(
        send_moves(&mut lobby, &peer, "a", 1),
        vec![DispatchOutcome::Dropped(DropReason::RateLimited)]
    );

    lobby.advance(Duration::from_millis(500));
    assert_eq!(send_moves(&mut lobby, &peer, "a", 1), vec![DispatchOutcome::Handled]);
    assert_eq!(
        lobby.host.engine().revision(&positions).unwrap(),
        rev_after_burst + 1
    );

    lobby.exchange();
    assert_converged!(lobby, "a", POSITIONS);
}

#[test]
fn quotas_are_kept_per_actor() {
    init_logger();
    let mut lobby = TestLobby::new();
    let a = joined(&mut lobby, "a");
    let b = joined(&mut lobby, "b");

    assert!(send_moves(&mut lobby, &a, "a", 3).iter().all(DispatchOutcome::is_handled));
    assert!(send_moves(&mut lobby, &b, "b", 3).iter().all(DispatchOutcome::is_handled));
    assert_eq!(
        send_moves(&mut lobby, &a, "a", 1),
        vec![DispatchOutcome::Dropped(DropReason::RateLimited)]
    );
}

#[test]
fn refused_chat_does_not_consume_quota() {
    init_logger();
    let mut lobby = TestLobby::new();
    let peer = joined(&mut lobby, "a");

    // empty text fails parsing before the limiter is consulted
    for _ in 0..10 {
        lobby.send_command(&peer, "chat:send:request", json!({ "actor": "a", "text": "  " }));
    }
    assert!(lobby
        .peer_to_host(&peer)
        .iter()
        .all(|outcome| *outcome == DispatchOutcome::Dropped(DropReason::Malformed)));

    for n in 0..6 {
        lobby.send_command(
            &peer,
            "chat:send:request",
            json!({ "actor": "a", "text": format!("hello {}", n) }),
        );
    }
    let outcomes = lobby.peer_to_host(&peer);
    assert_eq!(outcomes.iter().filter(|outcome| outcome.is_handled()).count(), 5);
    assert_eq!(
        outcomes.last(),
        Some(&DispatchOutcome::Dropped(DropReason::RateLimited))
    );

    lobby.exchange();
    assert_converged!(lobby, "a", CHAT);
}

#[test]
fn object_requests_are_limited_per_peer() {
    init_logger();
    let registry = DescriptorRegistry::new();
    test_models::register_descriptors(&registry).unwrap();
    let config = HostConfig {
        request_limit: RateLimitConfig::new(2, Duration::from_secs(1)),
        ..HostConfig::default()
    };
    let mut lobby = TestLobby::with_config(config, registry);
    let peer = lobby.join("a");
    let chat = ObjectId::from(CHAT);

    // chat and positions are requested on start
    assert_eq!(
        lobby.peer_to_host(&peer),
        vec![DispatchOutcome::Handled, DispatchOutcome::Handled]
    );

    let now = lobby.now();
    lobby.peer_mut(&peer).request(&chat, now);
    assert_eq!(
        lobby.peer_to_host(&peer),
        vec![DispatchOutcome::Dropped(DropReason::RateLimited)]
    );

    lobby.advance(Duration::from_secs(1));
    let now = lobby.now();
    lobby.peer_mut(&peer).request(&chat, now);
    assert_eq!(lobby.peer_to_host(&peer), vec![DispatchOutcome::Handled]);

    lobby.exchange();
    assert_converged!(lobby, "a", CHAT);
}

#[test]
fn limiter_state_is_released_after_peers_churn() {
    init_logger();
    let mut lobby = TestLobby::new();

    for n in 0..50 {
        let actor = format!("p{}", n);
        let peer = joined(&mut lobby, &actor);
        assert_eq!(send_moves(&mut lobby, &peer, &actor, 1), vec![DispatchOutcome::Handled]);
        lobby.disconnect(&peer);
        lobby.advance(Duration::from_secs(10));
    }
    assert_eq!(lobby.host.engine().peers().count(), 0);

    // the request key goes on disconnect; command keys age out on the next inbound message
    let peer = lobby.join("last");
    assert!(lobby.peer_to_host(&peer).iter().all(DispatchOutcome::is_handled));
    assert_eq!(lobby.host.rate_limiters().tracked_keys(), 1);
}
