//! Shared controller for integration tests.
//!
//! `Widget` objects get a fresh id on every build, so tests can tell an
//! in-place update from a rebuild by comparing ids.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};

use nacht_core::{NachtError, ObjectController, Patch, Result, SceneNode, State, UpdaterTable, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct Widget {
    pub id: u64,
    pub kind: String,
    pub counter: i64,
    /// Counter values applied in place since this object was built.
    pub history: Vec<i64>,
    pub params: State,
    pub children: Vec<Widget>,
}

impl SceneNode for Widget {
    fn children(&self) -> Option<&[Self]> {
        (self.kind == "group").then_some(self.children.as_slice())
    }

    fn children_mut(&mut self) -> Option<&mut [Self]> {
        (self.kind == "group").then_some(self.children.as_mut_slice())
    }
}

pub struct WidgetController {
    next_id: AtomicU64,
    updaters: UpdaterTable<Widget>,
}

impl WidgetController {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            updaters: UpdaterTable::new().with("counter", |w: &mut Widget, v: &Value| {
                w.counter = v
                    .as_i64()
                    .ok_or_else(|| NachtError::invalid_params(&w.kind, "counter must be an integer"))?;
                w.history.push(w.counter);
                Ok(())
            }),
        }
    }

    fn build(&self, params: State) -> Result<Widget> {
        let kind = params.get_str("kind").unwrap_or_default().to_string();
        let children = match kind.as_str() {
            "x" | "y" => Vec::new(),
            "group" => match params.get("children") {
                Some(Value::Array(items)) => items
                    .iter()
                    .map(|item| self.build(State::from_value(item.clone())?))
                    .collect::<Result<Vec<_>>>()?,
                _ => Vec::new(),
            },
            _ => return Err(NachtError::unsupported_kind(kind)),
        };
        Ok(Widget {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            counter: params.get("counter").and_then(Value::as_i64).unwrap_or(0),
            history: Vec::new(),
            kind,
            params,
            children,
        })
    }
}

impl ObjectController for WidgetController {
    type Object = Widget;

    fn create(&self, params: &State, previous: Option<&Widget>) -> Result<Widget> {
        let mut merged = previous.map(|p| p.params.clone()).unwrap_or_default();
        merged.merge_state(params);
        self.build(merged)
    }

    fn get_params(&self, object: &Widget) -> State {
        object.params.clone()
    }

    fn updaters(&self) -> &UpdaterTable<Widget> {
        &self.updaters
    }

    fn after_update(&self, object: &mut Widget, patch: &Patch) {
        object.params.merge(patch);
    }
}

/// Id of the entity's current object.
pub fn object_id(entity: &nacht_core::Entity<WidgetController>) -> u64 {
    entity.with_object(|o| o.map(|w| w.id).unwrap_or(0))
}

/// Poll `cond` while letting background tasks run.
pub async fn eventually(cond: impl Fn() -> bool) -> bool {
    for _ in 0..200 {
        if cond() {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(1)).await;
    }
    cond()
}
