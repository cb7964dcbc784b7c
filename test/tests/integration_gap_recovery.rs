use std::time::Duration;

use serde_json::json;

use replica_client::ClientEvent;
use replica_server::HostList;
use replica_shared::{ObjectId, ObjectMessage, PeerId, DEFAULT_STALL_TIMEOUT};
use replica_test::{assert_converged, test_models::CHAT, TestLobby};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn say(lobby: &mut TestLobby, lines: std::ops::RangeInclusive<u64>) {
    let chat = ObjectId::from(CHAT);
    for n in lines {
        lobby
            .host
            .mutate::<HostList, _>(&chat, |list| Ok(list.push_ops(json!({ "n": n }))))
            .unwrap();
    }
}

fn synced_at_five() -> (TestLobby, PeerId) {
    let mut lobby = TestLobby::new();
    let peer = lobby.join("a");
    lobby.exchange();
    say(&mut lobby, 2..=5);
    lobby.exchange();
    assert_eq!(lobby.peer(&peer).revision(&CHAT.into()), 5);
    lobby.take_events(&peer);
    (lobby, peer)
}

#[test]
fn stalled_gap_is_recovered_through_request() {
    init_logger();
    let (mut lobby, peer) = synced_at_five();
    let chat = ObjectId::from(CHAT);

    say(&mut lobby, 6..=9);
    assert_eq!(lobby.transport().in_flight(&peer), 4);
    // only revision 9 survives the trip
    lobby.transport().shuffle(&peer, &[3]);
    lobby.host_to_peer(&peer);

    assert_eq!(lobby.peer(&peer).revision(&chat), 5);
    assert!(lobby.peer_mut(&peer).take_outgoing().is_empty());

    lobby.advance(DEFAULT_STALL_TIMEOUT);
    lobby.update();
    let outgoing = lobby.peer_mut(&peer).take_outgoing();
    let requests: Vec<ObjectMessage> = outgoing
        .iter()
        .map(|message| ObjectMessage::from_lobby(message).unwrap())
        .collect();
    assert_eq!(
        requests,
        vec![ObjectMessage::Request {
            id: chat.clone(),
            since_rev: Some(5)
        }]
    );

    let now = lobby.now();
    for message in outgoing {
        assert!(lobby.host.receive(&peer, message, now).is_handled());
    }
    lobby.exchange();

    assert_eq!(lobby.peer(&peer).revision(&chat), 9);
    assert_converged!(lobby, "a", CHAT);
    let updates: Vec<u64> = lobby
        .take_events(&peer)
        .into_iter()
        .filter_map(|event| match event {
            ClientEvent::Updated { id, rev } if id == chat => Some(rev),
            _ => None,
        })
        .collect();
    assert_eq!(updates, vec![6, 7, 8, 9]);
}

#[test]
fn reordered_patches_apply_in_revision_order() {
    init_logger();
    let (mut lobby, peer) = synced_at_five();

    say(&mut lobby, 6..=8);
    lobby.transport().shuffle(&peer, &[1, 0, 2]);
    lobby.exchange();

    assert_converged!(lobby, "a", CHAT);
    let lines = lobby.host_value(&CHAT.into()).unwrap();
    let order: Vec<u64> = lines["lines"]
        .as_array()
        .unwrap()
        .iter()
        .map(|line| line["n"].as_u64().unwrap())
        .collect();
    assert_eq!(order, (2..=8).collect::<Vec<_>>());
}

#[test]
fn closed_link_queues_until_reopened() {
    init_logger();
    let (mut lobby, peer) = synced_at_five();

    lobby.transport().close(&peer);
    say(&mut lobby, 6..=7);
    assert_eq!(lobby.transport().in_flight(&peer), 0);
    assert_eq!(lobby.host.pending_messages(&peer), 2);

    lobby.transport().open(&peer);
    lobby.exchange();
    assert_eq!(lobby.host.pending_messages(&peer), 0);
    assert_converged!(lobby, "a", CHAT);
}

#[test]
fn silent_host_times_the_session_out() {
    init_logger();
    let (mut lobby, peer) = synced_at_five();

    lobby.advance(Duration::from_secs(11));
    lobby.update();
    assert!(!lobby.peer(&peer).is_active());
    assert!(lobby
        .take_events(&peer)
        .contains(&ClientEvent::SessionTimedOut));
}
