use serde_json::json;

use replica_server::{HostConfig, HostValue};
use replica_shared::{
    AckPolicy, DescriptorRegistry, FallbackStrategy, ObjectDescriptor, ObjectId, ObjectMessage,
    PatchOp, PeerId, Revision,
};
use replica_test::{assert_converged, TestLobby};

const INCREMENTAL_MAX: Revision = 4;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn counter_lobby(fallback: FallbackStrategy) -> (TestLobby, PeerId) {
    let registry = DescriptorRegistry::new();
    registry
        .register(
            ObjectDescriptor::new("counter", |context| {
                Ok(HostValue::seed(context, json!({"n": 0})))
            })
            .with_ack_policy(AckPolicy::new(INCREMENTAL_MAX, fallback)),
        )
        .unwrap();
    let mut lobby = TestLobby::with_config(HostConfig::default(), registry);
    let peer = lobby.join("p1");
    lobby.exchange();
    (lobby, peer)
}

fn bump(lobby: &mut TestLobby, times: u64) {
    let counter = ObjectId::from("counter");
    for n in 1..=times {
        lobby
            .host
            .apply_patch(&counter, vec![PatchOp::merge(json!({"n": n}))])
            .unwrap();
    }
}

fn in_flight(lobby: &TestLobby, peer: &PeerId) -> Vec<ObjectMessage> {
    lobby
        .transport()
        .deliver(peer)
        .iter()
        .map(|message| ObjectMessage::from_lobby(message).unwrap())
        .collect()
}

#[test]
fn lagging_peer_is_pushed_a_snapshot() {
    init_logger();
    let (mut lobby, peer) = counter_lobby(FallbackStrategy::Snapshot);

    // acked at 1; host moves to 1 + INCREMENTAL_MAX + 1 without hearing back
    bump(&mut lobby, INCREMENTAL_MAX + 1);

    let pushed = in_flight(&lobby, &peer);
    let kinds: Vec<(&str, Revision)> = pushed
        .iter()
        .map(|message| match message {
            ObjectMessage::Patch { rev, .. } => ("patch", *rev),
            ObjectMessage::Replace { rev, .. } => ("replace", *rev),
            other => panic!("unexpected {:?}", other),
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("patch", 2),
            ("patch", 3),
            ("patch", 4),
            ("patch", 5),
            ("replace", 6)
        ]
    );
}

#[test]
fn request_past_threshold_is_served_a_snapshot() {
    init_logger();
    let (mut lobby, peer) = counter_lobby(FallbackStrategy::Snapshot);
    let counter = ObjectId::from("counter");
    bump(&mut lobby, INCREMENTAL_MAX + 1);
    lobby.transport().drop_in_flight(&peer);

    let now = lobby.now();
    lobby.peer_mut(&peer).request(&counter, now);
    lobby.peer_to_host(&peer);
    assert!(matches!(
        in_flight(&lobby, &peer).as_slice(),
        [ObjectMessage::Replace { rev: 6, .. }]
    ));
}

#[test]
fn request_within_threshold_is_served_patches() {
    init_logger();
    let (mut lobby, peer) = counter_lobby(FallbackStrategy::Snapshot);
    let counter = ObjectId::from("counter");
    bump(&mut lobby, INCREMENTAL_MAX);
    lobby.transport().drop_in_flight(&peer);

    let now = lobby.now();
    lobby.peer_mut(&peer).request(&counter, now);
    lobby.peer_to_host(&peer);
    let served = in_flight(&lobby, &peer);
    assert_eq!(served.len(), INCREMENTAL_MAX as usize);
    assert!(served
        .iter()
        .all(|message| matches!(message, ObjectMessage::Patch { .. })));
}

#[test]
fn on_request_fallback_waits_for_the_peer() {
    init_logger();
    let (mut lobby, peer) = counter_lobby(FallbackStrategy::OnRequest);
    let counter = ObjectId::from("counter");
    bump(&mut lobby, INCREMENTAL_MAX + 1);

    // revision 6 is not pushed at all
    assert_eq!(in_flight(&lobby, &peer).len(), INCREMENTAL_MAX as usize);

    let now = lobby.now();
    lobby.peer_mut(&peer).request(&counter, now);
    lobby.exchange();
    assert_converged!(lobby, "p1", "counter");
}

#[test]
fn snapshot_push_converges() {
    init_logger();
    let (mut lobby, _peer) = counter_lobby(FallbackStrategy::Snapshot);
    bump(&mut lobby, 3 * INCREMENTAL_MAX);
    lobby.exchange();
    assert_converged!(lobby, "p1", "counter");
}
