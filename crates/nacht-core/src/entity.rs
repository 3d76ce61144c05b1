//! Entities
//!
//! An [`Entity`] is the unit of reconciliation: it owns the cumulative logical
//! [`State`] and the one concrete object built from it. Every patch is applied
//! under the entity's lock as a single step (merge into state, then hand the
//! patch to the controller), so synchronous updates and background producer
//! patches never observe each other half-applied.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::stream::{BoxStream, StreamExt};
use parking_lot::Mutex;
use serde_json::Value;

use crate::config::ManagerConfig;
use crate::controller::{Applied, ObjectController};
use crate::errors::{NachtError, Result};
use crate::params::{Params, Patch, State};
use crate::resolver::resolve;
use crate::tasks::TaskRegistry;

/// Identifier assigned to an entity by its manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

impl EntityId {
    pub(crate) fn next(counter: &AtomicU64) -> Self {
        Self(counter.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity-{}", self.0)
    }
}

/// Callback invoked for every background failure.
pub type ErrorHook = Arc<dyn Fn(EntityId, &NachtError) + Send + Sync>;

struct EntityCore<O> {
    state: State,
    object: Option<O>,
    generation: u64,
    patches_applied: u64,
}

/// Bounded buffer of background failures.
struct ErrorSink {
    buffer: Mutex<VecDeque<NachtError>>,
    capacity: usize,
    hook: Option<ErrorHook>,
}

impl ErrorSink {
    fn report(&self, id: EntityId, err: NachtError) {
        tracing::warn!(entity = %id, error = %err, "background patch failed");
        if let Some(hook) = &self.hook {
            hook(id, &err);
        }
        let mut buffer = self.buffer.lock();
        if buffer.len() == self.capacity {
            buffer.pop_front();
        }
        buffer.push_back(err);
    }

    fn take(&self) -> Vec<NachtError> {
        self.buffer.lock().drain(..).collect()
    }
}

/// State shared between an entity's handles and its background tasks.
pub(crate) struct Shared<C: ObjectController> {
    id: EntityId,
    core: Mutex<EntityCore<C::Object>>,
    errors: ErrorSink,
    controller: Option<Arc<C>>,
    trace_patches: bool,
}

/// Producer patches left over after the immediate part of a request.
type PatchStream = BoxStream<'static, Result<Patch>>;

impl<C: ObjectController> Shared<C> {
    /// Merge a patch into state and push it to the object, atomically.
    fn apply_patch(&self, patch: &Patch) -> Result<Option<Applied>> {
        self.apply_locked(&mut self.core.lock(), patch)
    }

    /// Resolve `params` against the live state and apply the immediate patch
    /// without releasing the lock in between.
    ///
    /// Derivations run under the entity lock and must not call back into it.
    fn resolve_and_apply(
        &self,
        params: Params,
    ) -> Result<(Option<Applied>, Option<PatchStream>)> {
        let mut core = self.core.lock();
        let resolution = resolve(params, &core.state)?;
        let has_producers = resolution.has_producers();
        let (initial, rest) = resolution.split();

        let applied = match initial {
            Some(patch) => self.apply_locked(&mut core, &patch)?,
            None => None,
        };
        Ok((applied, has_producers.then_some(rest)))
    }

    /// State stays merged even when the controller fails.
    fn apply_locked(
        &self,
        core: &mut EntityCore<C::Object>,
        patch: &Patch,
    ) -> Result<Option<Applied>> {
        if patch.is_empty() {
            return Ok(None);
        }
        core.state.merge(patch);
        core.patches_applied += 1;

        let Some(controller) = &self.controller else {
            return Ok(None);
        };

        let applied = match core.object.as_mut() {
            Some(object) => controller.apply(object, patch, &core.state)?,
            None => {
                core.object = Some(controller.create(&core.state, None)?);
                Applied::Created
            }
        };
        if applied != Applied::InPlace {
            core.generation += 1;
        }

        if self.trace_patches {
            tracing::trace!(
                entity = %self.id,
                keys = ?patch.keys().collect::<Vec<_>>(),
                ?applied,
                generation = core.generation,
                "applied patch"
            );
        }
        Ok(Some(applied))
    }

    async fn consume(self: Arc<Self>, mut patches: PatchStream) {
        while let Some(item) = patches.next().await {
            if let Err(err) = item.and_then(|patch| self.apply_patch(&patch)) {
                self.errors.report(self.id, err);
            }
        }
        tracing::debug!(entity = %self.id, "producer stream finished");
    }
}

/// A reconciled object and its cumulative state.
///
/// Handles are cheap to clone and share the same entity. Dropping the last
/// handle cancels outstanding producer consumption unless the manager was
/// configured otherwise.
pub struct Entity<C: ObjectController> {
    shared: Arc<Shared<C>>,
    tasks: Arc<TaskRegistry>,
    cancel_on_drop: bool,
}

impl<C: ObjectController> Entity<C> {
    pub(crate) fn new(
        id: EntityId,
        controller: Option<Arc<C>>,
        config: &ManagerConfig,
        hook: Option<ErrorHook>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                id,
                core: Mutex::new(EntityCore {
                    state: State::new(),
                    object: None,
                    generation: 0,
                    patches_applied: 0,
                }),
                errors: ErrorSink {
                    buffer: Mutex::new(VecDeque::new()),
                    capacity: config.error_buffer.max(1),
                    hook,
                },
                controller,
                trace_patches: config.trace_patches,
            }),
            tasks: Arc::new(TaskRegistry::new()),
            cancel_on_drop: config.cancel_on_drop,
        }
    }

    /// Resolve `params` against the current state and apply the result.
    ///
    /// Literal and derived values are applied before this returns. Producer
    /// values are applied in the background as they arrive.
    pub fn update(&self, params: Params) -> Result<&Self> {
        self.apply(params)?;
        Ok(self)
    }

    /// Like [`update`](Self::update), reporting what the immediate patch did
    /// to the object. `None` when nothing was applied synchronously or the
    /// entity has no controller.
    pub(crate) fn apply(&self, params: Params) -> Result<Option<Applied>> {
        let (applied, rest) = self.shared.resolve_and_apply(params)?;
        if let Some(rest) = rest {
            self.tasks
                .spawn_cancellable(self.shared.clone().consume(rest))?;
        }
        Ok(applied)
    }

    /// Identifier assigned by the manager.
    pub fn id(&self) -> EntityId {
        self.shared.id
    }

    /// Snapshot of the cumulative state.
    pub fn state(&self) -> State {
        self.shared.core.lock().state.clone()
    }

    /// Current value of one key.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.shared.core.lock().state.get(key).cloned()
    }

    /// Run `f` against the current object, if one has been built.
    pub fn with_object<R>(&self, f: impl FnOnce(Option<&C::Object>) -> R) -> R {
        f(self.shared.core.lock().object.as_ref())
    }

    /// Run `f` against the current object with the entity locked for the
    /// whole call.
    pub(crate) fn with_object_mut<R>(&self, f: impl FnOnce(Option<&mut C::Object>) -> R) -> R {
        f(self.shared.core.lock().object.as_mut())
    }

    /// Whether a concrete object currently exists.
    pub fn has_object(&self) -> bool {
        self.shared.core.lock().object.is_some()
    }

    /// Number of times an object has been built for this entity.
    ///
    /// Unchanged by in-place updates; incremented by creation and
    /// recreation.
    pub fn generation(&self) -> u64 {
        self.shared.core.lock().generation
    }

    /// Number of non-empty patches applied so far.
    pub fn patches_applied(&self) -> u64 {
        self.shared.core.lock().patches_applied
    }

    /// The controller, if this entity has one.
    pub fn controller(&self) -> Option<&Arc<C>> {
        self.shared.controller.as_ref()
    }

    /// Number of producer streams still being consumed.
    pub fn pending_tasks(&self) -> usize {
        self.tasks.pending()
    }

    /// Wait until every scheduled producer stream has finished.
    ///
    /// Never returns while an unbounded producer is running; cancel first.
    pub async fn settle(&self) {
        self.tasks.settle().await;
    }

    /// Stop consuming every producer stream. Later updates with producers
    /// fail with [`NachtError::Runtime`].
    pub fn cancel(&self) {
        tracing::debug!(entity = %self.id(), "cancelling producer streams");
        self.tasks.shutdown();
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.tasks.is_shut_down()
    }

    /// Drain background failures recorded since the last call.
    pub fn take_errors(&self) -> Vec<NachtError> {
        self.shared.errors.take()
    }
}

impl<C: ObjectController> Clone for Entity<C> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            tasks: self.tasks.clone(),
            cancel_on_drop: self.cancel_on_drop,
        }
    }
}

impl<C: ObjectController> Drop for Entity<C> {
    fn drop(&mut self) {
        if self.cancel_on_drop && Arc::strong_count(&self.tasks) == 1 {
            self.tasks.shutdown();
        }
    }
}

impl<C: ObjectController> fmt::Debug for Entity<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.shared.core.lock();
        f.debug_struct("Entity")
            .field("id", &self.shared.id)
            .field("state", &core.state)
            .field("has_object", &core.object.is_some())
            .field("generation", &core.generation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::UpdaterTable;
    use serde_json::json;

    struct Tally {
        updaters: UpdaterTable<Vec<String>>,
    }

    impl ObjectController for Tally {
        type Object = Vec<String>;

        fn create(&self, params: &State, _previous: Option<&Vec<String>>) -> Result<Vec<String>> {
            Ok(params.keys().map(str::to_string).collect())
        }

        fn get_params(&self, _object: &Vec<String>) -> State {
            State::new()
        }

        fn updaters(&self) -> &UpdaterTable<Vec<String>> {
            &self.updaters
        }
    }

    fn entity() -> Entity<Tally> {
        let controller = Tally {
            updaters: UpdaterTable::new().with("n", |o: &mut Vec<String>, v: &Value| {
                o.push(v.to_string());
                Ok(())
            }),
        };
        Entity::new(
            EntityId(7),
            Some(Arc::new(controller)),
            &ManagerConfig::default(),
            None,
        )
    }

    #[test]
    fn test_first_patch_creates_object() {
        let e = entity();
        assert!(!e.has_object());
        e.update(Params::new().set("n", 1)).unwrap();
        assert_eq!(e.generation(), 1);
        e.with_object(|o| assert_eq!(o.unwrap(), &vec!["n".to_string()]));
    }

    #[test]
    fn test_in_place_keeps_generation() {
        let e = entity();
        e.update(Params::new().set("n", 1)).unwrap();
        e.update(Params::new().set("n", 2)).unwrap();
        assert_eq!(e.generation(), 1);
        assert_eq!(e.patches_applied(), 2);
        e.with_object(|o| assert_eq!(o.unwrap().last().unwrap(), "2"));
    }

    #[test]
    fn test_empty_update_is_noop() {
        let e = entity();
        e.update(Params::new().set("n", 1)).unwrap();
        e.update(Params::new()).unwrap();
        assert_eq!(e.patches_applied(), 1);
        assert_eq!(e.state(), State::new().with("n", 1));
    }

    #[test]
    fn test_error_buffer_is_bounded() {
        let config = ManagerConfig {
            error_buffer: 2,
            ..ManagerConfig::default()
        };
        let e: Entity<Tally> = Entity::new(EntityId(1), None, &config, None);
        for i in 0..3 {
            e.shared.errors.report(e.id(), NachtError::producer("k", format!("{i}")));
        }
        let errors = e.take_errors();
        assert_eq!(
            errors,
            vec![NachtError::producer("k", "1"), NachtError::producer("k", "2")]
        );
        assert!(e.take_errors().is_empty());
    }

    #[test]
    fn test_display_id() {
        assert_eq!(EntityId(3).to_string(), "entity-3");
        assert_eq!(entity().get("missing"), None);
    }

    #[test]
    fn test_get_reads_current_value() {
        let e = entity();
        e.update(Params::new().set("n", json!([1, 2]))).unwrap();
        assert_eq!(e.get("n"), Some(json!([1, 2])));
    }

    fn increment(prev: Option<&Value>) -> Value {
        json!(prev.and_then(Value::as_i64).unwrap_or(0) + 1)
    }

    #[test]
    fn test_concurrent_derivations_are_not_lost() {
        let e = entity();
        e.update(Params::new().set("n", 0)).unwrap();

        std::thread::scope(|scope| {
            for _ in 0..8 {
                let e = e.clone();
                scope.spawn(move || {
                    for _ in 0..500 {
                        e.update(Params::new().derive("n", increment)).unwrap();
                    }
                });
            }
        });

        assert_eq!(e.get("n"), Some(json!(4000)));
        assert_eq!(e.patches_applied(), 4001);
        e.with_object(|o| assert_eq!(o.unwrap().len(), 4001));
    }

    #[test]
    fn test_apply_reports_immediate_outcome() {
        let e = entity();
        assert_eq!(e.apply(Params::new()).unwrap(), None);
        assert_eq!(
            e.apply(Params::new().set("n", 1)).unwrap(),
            Some(Applied::Created)
        );
        assert_eq!(
            e.apply(Params::new().derive("n", increment)).unwrap(),
            Some(Applied::InPlace)
        );
        assert_eq!(e.get("n"), Some(json!(2)));

        let detached: Entity<Tally> =
            Entity::new(EntityId(2), None, &ManagerConfig::default(), None);
        assert_eq!(detached.apply(Params::new().set("n", 1)).unwrap(), None);
    }
}
