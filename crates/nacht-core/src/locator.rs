//! Selectors
//!
//! A [`Selector`] addresses an object nested inside an entity's object graph
//! by a path of child indices. It never caches the object it found: every call
//! walks the path again against the entity's current object, so it keeps
//! working after ancestors are rebuilt and fails loudly when the path no
//! longer exists.

use std::fmt;

use crate::controller::{Applied, ObjectController};
use crate::entity::Entity;
use crate::errors::{NachtError, Result};
use crate::params::{Params, State};
use crate::resolver::resolve;

/// An object with an indexable collection of children.
pub trait SceneNode: Sized {
    /// Children of this node, or `None` for leaf kinds without a children
    /// collection.
    fn children(&self) -> Option<&[Self]>;

    /// Mutable children of this node.
    fn children_mut(&mut self) -> Option<&mut [Self]>;
}

/// Walk `path` from `root`.
pub fn locate<'a, N: SceneNode>(root: &'a N, path: &[usize]) -> Result<&'a N> {
    let mut current = root;
    for (depth, &index) in path.iter().enumerate() {
        let children = current
            .children()
            .ok_or_else(|| NachtError::lookup(path, depth, "node has no children"))?;
        current = children.get(index).ok_or_else(|| {
            NachtError::lookup(
                path,
                depth,
                format!("index {index} out of range for {} children", children.len()),
            )
        })?;
    }
    Ok(current)
}

/// Walk `path` from `root`, mutably.
pub fn locate_mut<'a, N: SceneNode>(root: &'a mut N, path: &[usize]) -> Result<&'a mut N> {
    let mut current = root;
    for (depth, &index) in path.iter().enumerate() {
        let children = current
            .children_mut()
            .ok_or_else(|| NachtError::lookup(path, depth, "node has no children"))?;
        let len = children.len();
        current = children.get_mut(index).ok_or_else(|| {
            NachtError::lookup(
                path,
                depth,
                format!("index {index} out of range for {len} children"),
            )
        })?;
    }
    Ok(current)
}

/// Handle to the object at `path` below an entity's object.
///
/// Holding a selector keeps its entity alive.
pub struct Selector<C: ObjectController> {
    entity: Entity<C>,
    path: Vec<usize>,
}

impl<C> Selector<C>
where
    C: ObjectController,
    C::Object: SceneNode,
{
    /// Bind a selector to `entity` and `path`. An empty path addresses the
    /// entity's own object.
    pub fn new(entity: &Entity<C>, path: impl Into<Vec<usize>>) -> Self {
        Self {
            entity: entity.clone(),
            path: path.into(),
        }
    }

    /// Child indices below the root.
    pub fn path(&self) -> &[usize] {
        &self.path
    }

    /// The root entity.
    pub fn entity(&self) -> &Entity<C> {
        &self.entity
    }

    /// A selector for a child of the addressed object.
    pub fn child(&self, index: usize) -> Self {
        let mut path = self.path.clone();
        path.push(index);
        Self {
            entity: self.entity.clone(),
            path,
        }
    }

    /// Run `f` against the addressed object.
    pub fn read<R>(&self, f: impl FnOnce(&C::Object) -> R) -> Result<R> {
        self.entity.with_object(|root| {
            let root = root.ok_or_else(|| NachtError::lookup(&self.path, 0, "entity has no object"))?;
            Ok(f(locate(root, &self.path)?))
        })
    }

    /// Apply `params` to the addressed object.
    ///
    /// With an empty path this is a plain entity update. Otherwise the
    /// params are resolved against the located object's recorded params and
    /// applied through the controller, in place or by rebuilding just that
    /// object, all under the entity lock. Producers are rejected: the
    /// location may not outlive them.
    ///
    /// Returns `None` when the request resolved to nothing to apply.
    pub fn update(&self, params: Params) -> Result<Option<Applied>> {
        if self.path.is_empty() {
            return self.entity.apply(params);
        }

        let controller = self
            .entity
            .controller()
            .ok_or_else(|| NachtError::invalid("selector on an entity without a controller"))?
            .clone();

        self.entity.with_object_mut(|root| {
            let root =
                root.ok_or_else(|| NachtError::lookup(&self.path, 0, "entity has no object"))?;
            let target = locate_mut(root, &self.path)?;
            let mut state: State = controller.get_params(target);

            let resolution = resolve(params, &state)?;
            if resolution.has_producers() {
                return Err(NachtError::invalid(format!(
                    "selectors do not accept producers (keys: {})",
                    resolution.producer_keys().collect::<Vec<_>>().join(", ")
                )));
            }
            let Some(patch) = resolution.split().0.filter(|p| !p.is_empty()) else {
                return Ok(None);
            };

            state.merge(&patch);
            let applied = controller.apply(target, &patch, &state)?;
            tracing::debug!(
                entity = %self.entity.id(),
                path = ?self.path,
                ?applied,
                "selector update"
            );
            Ok(Some(applied))
        })
    }
}

impl<C: ObjectController> Clone for Selector<C> {
    fn clone(&self) -> Self {
        Self {
            entity: self.entity.clone(),
            path: self.path.clone(),
        }
    }
}

impl<C: ObjectController> fmt::Debug for Selector<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selector")
            .field("entity", &self.entity.id())
            .field("path", &self.path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Node {
        name: &'static str,
        children: Option<Vec<Node>>,
    }

    fn leaf(name: &'static str) -> Node {
        Node {
            name,
            children: None,
        }
    }

    impl SceneNode for Node {
        fn children(&self) -> Option<&[Self]> {
            self.children.as_deref()
        }

        fn children_mut(&mut self) -> Option<&mut [Self]> {
            self.children.as_deref_mut()
        }
    }

    fn tree() -> Node {
        Node {
            name: "root",
            children: Some(vec![
                leaf("a"),
                Node {
                    name: "b",
                    children: Some(vec![leaf("b0"), leaf("b1")]),
                },
            ]),
        }
    }

    #[test]
    fn test_empty_path_is_root() {
        let root = tree();
        assert_eq!(locate(&root, &[]).unwrap().name, "root");
    }

    #[test]
    fn test_nested_lookup() {
        let root = tree();
        assert_eq!(locate(&root, &[1, 1]).unwrap().name, "b1");
    }

    #[test]
    fn test_out_of_range_reports_depth() {
        let root = tree();
        let err = locate(&root, &[1, 5]).unwrap_err();
        assert!(matches!(err, NachtError::Lookup { depth: 1, .. }));
    }

    #[test]
    fn test_leaf_has_no_children() {
        let root = tree();
        let err = locate(&root, &[0, 0]).unwrap_err();
        assert_eq!(
            err,
            NachtError::lookup(&[0, 0], 1, "node has no children")
        );
    }

    #[test]
    fn test_locate_mut_edits_target() {
        let mut root = tree();
        locate_mut(&mut root, &[1, 0]).unwrap().name = "renamed";
        assert_eq!(locate(&root, &[1, 0]).unwrap().name, "renamed");
    }
}
