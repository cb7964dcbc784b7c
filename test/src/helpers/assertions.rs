/// Assert that a peer's mirror of an object equals the host's value, at the
/// host's revision
#[macro_export]
macro_rules! assert_converged {
    ($lobby:expr, $peer:expr, $id:expr) => {{
        let id = replica_shared::ObjectId::from($id);
        let peer = replica_shared::PeerId::from($peer);
        assert_eq!(
            $lobby.peer_value(&peer, &id),
            $lobby.host_value(&id),
            "peer {} diverged from host on {}",
            peer,
            id
        );
        assert_eq!(
            Some($lobby.peer(&peer).revision(&id)),
            $lobby.host.engine().revision(&id),
            "peer {} holds a different revision of {}",
            peer,
            id
        );
    }};
}
