//! Object controller interface
//!
//! The controller is the boundary to whatever library owns the concrete
//! objects. It builds objects from fully resolved params, mutates them in
//! place through a table of per-key updaters, and decides for every patch
//! whether an in-place update is possible or the object must be rebuilt.

use std::fmt;

use indexmap::IndexMap;
use serde_json::Value;

use crate::errors::{NachtError, Result};
use crate::params::{Patch, State};

/// In-place mutation for one key.
pub type Updater<O> = Box<dyn Fn(&mut O, &Value) -> Result<()> + Send + Sync>;

/// Table of in-place updaters keyed by param name.
///
/// A patch is eligible for in-place update exactly when every one of its
/// keys is registered here.
pub struct UpdaterTable<O> {
    updaters: IndexMap<String, Updater<O>>,
}

impl<O> UpdaterTable<O> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            updaters: IndexMap::new(),
        }
    }

    /// Register an updater (builder pattern).
    pub fn with<F>(mut self, key: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut O, &Value) -> Result<()> + Send + Sync + 'static,
    {
        self.register(key, f);
        self
    }

    /// Register an updater, replacing any previous one for the key.
    pub fn register<F>(&mut self, key: impl Into<String>, f: F)
    where
        F: Fn(&mut O, &Value) -> Result<()> + Send + Sync + 'static,
    {
        self.updaters.insert(key.into(), Box::new(f));
    }

    /// Check whether a key can be updated in place.
    pub fn contains(&self, key: &str) -> bool {
        self.updaters.contains_key(key)
    }

    /// Check whether every key of a patch can be updated in place.
    pub fn covers(&self, patch: &Patch) -> bool {
        patch.keys().all(|key| self.contains(key))
    }

    /// Run the updater registered for `key`.
    pub fn apply(&self, key: &str, object: &mut O, value: &Value) -> Result<()> {
        let updater = self
            .updaters
            .get(key)
            .ok_or_else(|| NachtError::internal(format!("no updater registered for '{key}'")))?;
        updater(object, value)
    }

    /// Registered keys in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.updaters.keys().map(String::as_str)
    }
}

impl<O> Default for UpdaterTable<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O> fmt::Debug for UpdaterTable<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.keys()).finish()
    }
}

/// How a patch reached the concrete object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// A first object was built where none existed.
    Created,
    /// Every key was applied through an updater; the object was kept.
    InPlace,
    /// The object was rebuilt from the full state.
    Recreated,
}

/// Builds and mutates concrete objects from resolved params.
///
/// Implementations are shared across entities and must not hold per-entity
/// state.
pub trait ObjectController: Send + Sync + 'static {
    /// The concrete object type.
    type Object: Send + 'static;

    /// Build an object from resolved params.
    ///
    /// When `previous` is given, its recorded params are merged underneath
    /// `params` before building.
    fn create(&self, params: &State, previous: Option<&Self::Object>) -> Result<Self::Object>;

    /// The params last used to build or update `object`.
    fn get_params(&self, object: &Self::Object) -> State;

    /// Keys that can be updated in place.
    fn updaters(&self) -> &UpdaterTable<Self::Object>;

    /// Record an applied patch on the object.
    fn after_update(&self, _object: &mut Self::Object, _patch: &Patch) {}

    /// Apply one patch to `object`.
    ///
    /// Updates in place when every key has an updater, otherwise rebuilds
    /// the object from `state` (the full params the object should reflect).
    /// A patch mixing updatable and structural keys is always rebuilt.
    fn apply(&self, object: &mut Self::Object, patch: &Patch, state: &State) -> Result<Applied> {
        let updaters = self.updaters();
        if updaters.covers(patch) {
            for (key, value) in patch.iter() {
                updaters.apply(key, object, value)?;
            }
            self.after_update(object, patch);
            Ok(Applied::InPlace)
        } else {
            let rebuilt = self.create(state, Some(object))?;
            *object = rebuilt;
            Ok(Applied::Recreated)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq)]
    struct Counter {
        built: u32,
        value: i64,
        params: State,
    }

    struct CounterController {
        updaters: UpdaterTable<Counter>,
    }

    impl CounterController {
        fn new() -> Self {
            Self {
                updaters: UpdaterTable::new().with("counter", |c: &mut Counter, v: &Value| {
                    c.value = v
                        .as_i64()
                        .ok_or_else(|| NachtError::invalid("counter must be an integer"))?;
                    Ok(())
                }),
            }
        }
    }

    impl ObjectController for CounterController {
        type Object = Counter;

        fn create(&self, params: &State, previous: Option<&Counter>) -> Result<Counter> {
            let mut merged = previous.map(|p| p.params.clone()).unwrap_or_default();
            merged.merge_state(params);
            Ok(Counter {
                built: previous.map_or(1, |p| p.built + 1),
                value: merged.get("counter").and_then(Value::as_i64).unwrap_or(0),
                params: merged,
            })
        }

        fn get_params(&self, object: &Counter) -> State {
            object.params.clone()
        }

        fn updaters(&self) -> &UpdaterTable<Counter> {
            &self.updaters
        }

        fn after_update(&self, object: &mut Counter, patch: &Patch) {
            object.params.merge(patch);
        }
    }

    #[test]
    fn test_updatable_patch_applies_in_place() {
        let controller = CounterController::new();
        let state = State::new().with("counter", 1).with("kind", "x");
        let mut object = controller.create(&state, None).unwrap();

        let patch = Patch::single("counter", json!(5));
        let applied = controller.apply(&mut object, &patch, &state).unwrap();

        assert_eq!(applied, Applied::InPlace);
        assert_eq!(object.built, 1);
        assert_eq!(object.value, 5);
        assert_eq!(controller.get_params(&object).get("counter"), Some(&json!(5)));
    }

    #[test]
    fn test_mixed_patch_recreates() {
        let controller = CounterController::new();
        let mut state = State::new().with("counter", 1).with("kind", "x");
        let mut object = controller.create(&state, None).unwrap();

        let patch = Patch::new().with("counter", 7).with("kind", "y");
        state.merge(&patch);
        let applied = controller.apply(&mut object, &patch, &state).unwrap();

        assert_eq!(applied, Applied::Recreated);
        assert_eq!(object.built, 2);
        assert_eq!(object.value, 7);
        assert_eq!(controller.get_params(&object), state);
    }

    #[test]
    fn test_updater_failure_surfaces() {
        let controller = CounterController::new();
        let state = State::new().with("counter", 1);
        let mut object = controller.create(&state, None).unwrap();
        let patch = Patch::single("counter", json!("nope"));
        assert!(controller.apply(&mut object, &patch, &state).is_err());
    }

    #[test]
    fn test_table_covers() {
        let table = UpdaterTable::<Counter>::new().with("a", |_, _| Ok(()));
        assert!(table.covers(&Patch::new()));
        assert!(table.covers(&Patch::single("a", json!(1))));
        assert!(!table.covers(&Patch::new().with("a", 1).with("b", 2)));
    }
}
