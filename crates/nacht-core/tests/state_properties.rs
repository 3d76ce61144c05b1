//! Property tests for cumulative state tracking.

mod support;

use indexmap::IndexMap;
use nacht_core::{DetachedManager, ObjectController, Params, Patch, State, StateManager};
use proptest::prelude::*;
use serde_json::Value;
use support::WidgetController;

fn key() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["a", "b", "c", "counter", "label"]).prop_map(|s| s.to_string())
}

fn literal() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
        "[a-z]{0,6}".prop_map(Value::from),
    ]
}

fn patch() -> impl Strategy<Value = Vec<(String, Value)>> {
    prop::collection::vec((key(), literal()), 0..5)
}

fn to_params(entries: &[(String, Value)]) -> Params {
    entries
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

proptest! {
    #[test]
    fn state_is_left_fold_of_patches(patches in prop::collection::vec(patch(), 0..8)) {
        let manager = DetachedManager::detached();
        let entity = manager.create(Params::new()).unwrap();

        let mut expected: IndexMap<String, Value> = IndexMap::new();
        for entries in &patches {
            manager.update(&entity, to_params(entries)).unwrap();
            for (k, v) in entries {
                expected.insert(k.clone(), v.clone());
            }
        }

        let actual: IndexMap<String, Value> = entity
            .state()
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn empty_request_is_identity(initial in patch()) {
        let manager = DetachedManager::detached();
        let entity = manager.create(to_params(&initial)).unwrap();
        let before = entity.state();
        let applied = entity.patches_applied();

        manager.update(&entity, Params::new()).unwrap();

        prop_assert_eq!(entity.state(), before);
        prop_assert_eq!(entity.patches_applied(), applied);
    }

    #[test]
    fn reapplying_a_patch_is_idempotent(initial in patch(), again in patch()) {
        let manager = DetachedManager::detached();
        let entity = manager.create(to_params(&initial)).unwrap();

        manager.update(&entity, to_params(&again)).unwrap();
        let once = entity.state();
        manager.update(&entity, to_params(&again)).unwrap();

        prop_assert_eq!(entity.state(), once);
    }

    #[test]
    fn object_params_track_state(counters in prop::collection::vec(any::<i64>(), 1..6)) {
        let manager = StateManager::new(WidgetController::new());
        let controller = manager.controller().unwrap().clone();
        let entity = manager.create(Params::new().set("kind", "x")).unwrap();

        for counter in counters {
            manager.update(&entity, Params::new().set("counter", counter)).unwrap();
            let params = entity.with_object(|o| controller.get_params(o.unwrap()));
            prop_assert_eq!(params, entity.state());
        }
        prop_assert_eq!(entity.generation(), 1);
    }
}

#[test]
fn merge_keeps_first_insertion_order() {
    let mut state = State::new();
    state.merge(&Patch::new().with("b", 1).with("a", 2));
    state.merge(&Patch::new().with("b", 3));
    assert_eq!(state.keys().collect::<Vec<_>>(), vec!["b", "a"]);
}
