//! The reference scenario: a peer that last acked revision 1 catches up on
//! revision 2 through a single patch, not a snapshot.

use serde_json::json;

use replica_server::{HostConfig, HostValue};
use replica_shared::{DescriptorRegistry, ObjectDescriptor, ObjectId, ObjectMessage, PatchOp};
use replica_test::{assert_converged, TestLobby};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn roster_lobby() -> TestLobby {
    let registry = DescriptorRegistry::new();
    registry
        .register(ObjectDescriptor::new("roster", |context| {
            Ok(HostValue::seed(context, json!({"members": ["a"]})))
        }))
        .unwrap();
    TestLobby::with_config(HostConfig::default(), registry)
}

#[test]
fn acked_peer_catches_up_with_one_patch() {
    init_logger();
    let mut lobby = roster_lobby();
    let roster = ObjectId::from("roster");
    assert_eq!(lobby.host.engine().revision(&roster), Some(1));

    let peer = lobby.join("p1");
    lobby.exchange();
    assert_converged!(lobby, "p1", "roster");
    assert_eq!(lobby.host.engine().acked(&peer, &roster), Some(1));

    let rev = lobby
        .host
        .apply_patch(
            &roster,
            vec![PatchOp::merge(json!({"members": ["a", "b"]}))],
        )
        .unwrap();
    assert_eq!(rev, 2);
    assert_eq!(
        lobby.host_value(&roster),
        Some(json!({"members": ["a", "b"]}))
    );

    // the push is lost; the peer asks for what it is missing
    assert_eq!(lobby.transport().drop_in_flight(&peer), 1);
    let now = lobby.now();
    lobby.peer_mut(&peer).request(&roster, now);
    lobby.peer_to_host(&peer);

    let in_flight = lobby.transport().deliver(&peer);
    assert_eq!(in_flight.len(), 1);
    match ObjectMessage::from_lobby(&in_flight[0]).unwrap() {
        ObjectMessage::Patch { rev, ops, .. } => {
            assert_eq!(rev, 2);
            assert_eq!(ops, vec![PatchOp::merge(json!({"members": ["a", "b"]}))]);
        }
        other => panic!("expected a patch, got {:?}", other),
    }

    for message in in_flight {
        lobby.peer_mut(&peer).receive(message, now);
    }
    assert_converged!(lobby, "p1", "roster");

    lobby.exchange();
    assert_eq!(lobby.host.engine().acked(&peer, &roster), Some(2));
}

#[test]
fn up_to_date_request_gets_nothing() {
    init_logger();
    let mut lobby = roster_lobby();
    let roster = ObjectId::from("roster");
    let peer = lobby.join("p1");
    lobby.exchange();

    let now = lobby.now();
    lobby.peer_mut(&peer).request(&roster, now);
    lobby.peer_to_host(&peer);
    assert_eq!(lobby.transport().in_flight(&peer), 0);
}
