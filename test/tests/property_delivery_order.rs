use proptest::prelude::*;
use serde_json::json;

use replica_client::{PatchOutcome, ReadyStep, Reconciler};
use replica_server::HostList;
use replica_shared::{apply_ops, Instant, ObjectId, PatchOp, Revision, Value};
use replica_test::{assert_converged, test_models::CHAT, TestLobby};

fn line(n: Revision) -> Vec<PatchOp> {
    vec![PatchOp::insert("lines", json!([{ "n": n }]))]
}

fn permutation() -> impl Strategy<Value = Vec<usize>> {
    (2usize..12).prop_flat_map(|n| Just((0..n).collect::<Vec<_>>()).prop_shuffle())
}

/// Replays ready steps the way a mirror would
fn fold(steps: Vec<ReadyStep>, mut value: Value) -> Value {
    for step in steps {
        value = match step {
            ReadyStep::Replace { value, .. } => value,
            ReadyStep::Patch { ops, .. } => apply_ops(&value, &ops).unwrap(),
        };
    }
    value
}

proptest! {
    #[test]
    fn any_arrival_order_surfaces_revisions_in_order(order in permutation()) {
        let id = ObjectId::from(CHAT);
        let now = Instant::now();
        let mut reconciler = Reconciler::default();
        let accepted = reconciler.apply_replace(&id, 1, json!({ "lines": [] }));
        prop_assert!(accepted);

        for position in &order {
            let rev = *position as Revision + 2;
            let outcome = reconciler.apply_patch(&id, rev, line(rev), now);
            prop_assert_ne!(outcome, PatchOutcome::Rejected);
        }

        let steps = reconciler.take_ready();
        let revs: Vec<Revision> = steps.iter().map(ReadyStep::rev).collect();
        let expected: Vec<Revision> = (1..=order.len() as Revision + 1).collect();
        prop_assert_eq!(revs, expected);
        prop_assert!(!reconciler.is_gapped(&id));

        let lines: Vec<Value> = (2..=order.len() as Revision + 1)
            .map(|n| json!({ "n": n }))
            .collect();
        prop_assert_eq!(fold(steps, Value::Null), json!({ "lines": lines }));
    }

    #[test]
    fn duplicates_mixed_into_any_order_change_nothing(order in permutation(), repeat in 0usize..11) {
        let id = ObjectId::from(CHAT);
        let now = Instant::now();
        let mut reconciler = Reconciler::default();
        reconciler.apply_replace(&id, 1, json!({ "lines": [] }));

        let mut arrivals = order.clone();
        arrivals.push(order[repeat % order.len()]);
        for position in &arrivals {
            let rev = *position as Revision + 2;
            reconciler.apply_patch(&id, rev, line(rev), now);
        }

        let revs: Vec<Revision> = reconciler.take_ready().iter().map(ReadyStep::rev).collect();
        prop_assert_eq!(revs.len(), order.len() + 1);
        prop_assert_eq!(reconciler.revision(&id), order.len() as Revision + 1);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn lobby_converges_whatever_the_link_does(order in permutation()) {
        let mut lobby = TestLobby::new();
        let peer = lobby.join("a");
        lobby.exchange();

        let chat = ObjectId::from(CHAT);
        for n in 0..order.len() {
            lobby
                .host
                .mutate::<HostList, _>(&chat, |list| Ok(list.push_ops(json!({ "n": n }))))
                .unwrap();
        }
        lobby.transport().shuffle(&peer, &order);
        lobby.exchange();

        assert_converged!(lobby, "a", CHAT);
        prop_assert_eq!(
            lobby.host.engine().acked(&peer, &chat),
            lobby.host.engine().revision(&chat)
        );
    }
}
