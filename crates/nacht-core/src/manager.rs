//! State manager
//!
//! [`StateManager`] is the entry point: it creates entities from initial
//! params and routes later updates through the resolver. It can run without
//! a controller, in which case entities only track state.

use std::fmt;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use crate::config::ManagerConfig;
use crate::controller::{ObjectController, UpdaterTable};
use crate::entity::{Entity, EntityId, ErrorHook};
use crate::errors::{NachtError, Result};
use crate::locator::{SceneNode, Selector};
use crate::params::{Params, State};

/// Creates entities and routes updates to them.
///
/// # Example
///
/// ```rust,ignore
/// use nacht_core::{Params, StateManager};
///
/// let manager = StateManager::new(controller);
/// let entity = manager.create(Params::new().set("kind", "mesh"))?;
/// manager.update(&entity, Params::new().set("position", [1.0, 0.0, 0.0]))?;
/// ```
pub struct StateManager<C: ObjectController> {
    controller: Option<Arc<C>>,
    config: ManagerConfig,
    next_id: AtomicU64,
    error_hook: Option<ErrorHook>,
}

impl<C: ObjectController> StateManager<C> {
    /// Create a manager owning `controller`.
    pub fn new(controller: C) -> Self {
        Self::with_shared(Arc::new(controller))
    }

    /// Create a manager around a controller shared with other managers.
    pub fn with_shared(controller: Arc<C>) -> Self {
        Self {
            controller: Some(controller),
            config: ManagerConfig::default(),
            next_id: AtomicU64::new(0),
            error_hook: None,
        }
    }

    /// Create a manager with no controller. Entities track state only and
    /// never hold an object.
    pub fn detached() -> Self {
        Self {
            controller: None,
            config: ManagerConfig::default(),
            next_id: AtomicU64::new(0),
            error_hook: None,
        }
    }

    /// Replace the configuration after validating it.
    pub fn with_config(mut self, config: ManagerConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Install a callback for background failures of every entity created
    /// afterwards.
    pub fn with_error_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(EntityId, &NachtError) + Send + Sync + 'static,
    {
        self.error_hook = Some(Arc::new(hook));
        self
    }

    /// Current configuration.
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// The controller, if any.
    pub fn controller(&self) -> Option<&Arc<C>> {
        self.controller.as_ref()
    }

    /// Create an entity from initial params.
    ///
    /// The immediately resolvable values build the first object before this
    /// returns; producers are consumed in the background.
    pub fn create(&self, params: Params) -> Result<Entity<C>> {
        let entity = Entity::new(
            EntityId::next(&self.next_id),
            self.controller.clone(),
            &self.config,
            self.error_hook.clone(),
        );
        tracing::debug!(entity = %entity.id(), keys = params.len(), "creating entity");
        entity.update(params)?;
        Ok(entity)
    }

    /// Apply `params` to `entity`.
    pub fn update<'e>(&self, entity: &'e Entity<C>, params: Params) -> Result<&'e Entity<C>> {
        entity.update(params)
    }

    /// Address the object at `path` below `entity`'s object.
    pub fn find(&self, entity: &Entity<C>, path: impl Into<Vec<usize>>) -> Selector<C>
    where
        C::Object: SceneNode,
    {
        Selector::new(entity, path)
    }
}

impl<C: ObjectController> fmt::Debug for StateManager<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateManager")
            .field("detached", &self.controller.is_none())
            .field("config", &self.config)
            .finish()
    }
}

/// Placeholder controller for managers that only track state.
#[derive(Debug, Default)]
pub struct NoController {
    updaters: UpdaterTable<()>,
}

impl ObjectController for NoController {
    type Object = ();

    fn create(&self, _params: &State, _previous: Option<&()>) -> Result<()> {
        Ok(())
    }

    fn get_params(&self, _object: &()) -> State {
        State::new()
    }

    fn updaters(&self) -> &UpdaterTable<()> {
        &self.updaters
    }
}

/// A manager that only tracks state.
pub type DetachedManager = StateManager<NoController>;
