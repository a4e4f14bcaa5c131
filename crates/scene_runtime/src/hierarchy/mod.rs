//! Transform hierarchy
//!
//! Arena of entities linked into a forest. Each entity owns a local
//! transform and memoizes its world matrix, computed as
//! `parent_world * local` the first time it is read after invalidation.
//!
//! Invalidation is eager and cheap, recomputation is lazy: a local change
//! marks the entity and every descendant stale (O(1) each) and raises
//! `TransformChanged` for each of them, but no matrix is rebuilt until a
//! consumer reads it.
//!
//! Structural edits (parenting, liveness, component lists) are crate
//! private; the [`Scene`](crate::scene::Scene) is the public entry point for
//! them so that collection membership stays consistent.

mod node;

use log::debug;

use crate::events::{ChangeEvent, ChangeHandler, ChangeKind, Subscriptions};
use crate::foundation::collections::{ComponentId, EntityId, SlotMap, SubscriptionId};
use crate::foundation::math::{transform_point, Mat3, Transform2D, Vec2};

pub(crate) use node::EntityNode;

/// Forest of spatial entities with lazily cached world transforms
#[derive(Debug, Default)]
pub struct TransformHierarchy {
    nodes: SlotMap<EntityId, EntityNode>,
    subscriptions: Subscriptions,
}

impl TransformHierarchy {
    /// Create an empty hierarchy
    pub fn new() -> Self {
        Self::default()
    }

    //--- Queries ----------------------------------------------------------

    /// Whether the entity exists
    pub fn contains(&self, entity: EntityId) -> bool {
        self.nodes.contains_key(entity)
    }

    /// Number of entities, live or detached
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the hierarchy holds no entities
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Name given at creation
    pub fn name(&self, entity: EntityId) -> Option<&str> {
        self.nodes.get(entity).map(|node| node.name.as_str())
    }

    /// Parent entity, if attached
    pub fn parent(&self, entity: EntityId) -> Option<EntityId> {
        self.nodes.get(entity).and_then(|node| node.parent)
    }

    /// Direct children in attachment order (empty for unknown entities)
    pub fn children(&self, entity: EntityId) -> &[EntityId] {
        self.nodes.get(entity).map_or(&[], |node| node.children.as_slice())
    }

    /// Components attached to the entity in attachment order
    pub fn components(&self, entity: EntityId) -> &[ComponentId] {
        self.nodes.get(entity).map_or(&[], |node| node.components.as_slice())
    }

    /// Whether the entity is part of a live scene tree
    pub fn is_live(&self, entity: EntityId) -> bool {
        self.nodes.get(entity).is_some_and(|node| node.live)
    }

    /// Whether `ancestor` appears on the parent chain of `entity`
    pub fn is_ancestor_of(&self, ancestor: EntityId, entity: EntityId) -> bool {
        let mut current = self.parent(entity);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.parent(parent);
        }
        false
    }

    /// Whether `entity` is below `ancestor`
    pub fn is_descendant_of(&self, entity: EntityId, ancestor: EntityId) -> bool {
        self.is_ancestor_of(ancestor, entity)
    }

    /// The entity followed by all of its descendants, depth-first pre-order
    pub fn subtree(&self, entity: EntityId) -> Vec<EntityId> {
        if !self.contains(entity) {
            return Vec::new();
        }

        let mut order = Vec::new();
        let mut stack = vec![entity];
        while let Some(current) = stack.pop() {
            order.push(current);
            // Reverse so the first child is visited first
            stack.extend(self.children(current).iter().rev().copied());
        }
        order
    }

    /// All descendants, depth-first pre-order
    pub fn descendants(&self, entity: EntityId) -> Vec<EntityId> {
        let mut subtree = self.subtree(entity);
        if !subtree.is_empty() {
            subtree.remove(0);
        }
        subtree
    }

    /// Direct child with the given name
    pub fn find_child(&self, entity: EntityId, name: &str) -> Option<EntityId> {
        self.children(entity)
            .iter()
            .copied()
            .find(|child| self.name(*child) == Some(name))
    }

    /// First descendant with the given name, depth-first
    pub fn find_descendant(&self, entity: EntityId, name: &str) -> Option<EntityId> {
        self.descendants(entity)
            .into_iter()
            .find(|descendant| self.name(*descendant) == Some(name))
    }

    /// The entity's own enabled flag
    pub fn is_enabled(&self, entity: EntityId) -> bool {
        self.nodes.get(entity).is_some_and(|node| node.enabled)
    }

    /// Own flag AND every ancestor's flag
    pub fn is_effectively_enabled(&self, entity: EntityId) -> bool {
        let mut current = Some(entity);
        while let Some(id) = current {
            match self.nodes.get(id) {
                Some(node) if node.enabled => current = node.parent,
                _ => return false,
            }
        }
        true
    }

    /// Visibility flag gated by the effective enabled state
    pub fn is_visible(&self, entity: EntityId) -> bool {
        self.nodes.get(entity).is_some_and(|node| node.visible) && self.is_effectively_enabled(entity)
    }

    //--- Transforms -------------------------------------------------------

    /// Local transform relative to the parent
    pub fn local_transform(&self, entity: EntityId) -> Option<Transform2D> {
        self.nodes.get(entity).map(|node| node.local)
    }

    /// Replace the local transform
    pub fn set_local_transform(&mut self, entity: EntityId, transform: Transform2D) -> bool {
        let Some(node) = self.nodes.get_mut(entity) else {
            return false;
        };
        if node.local == transform {
            return true;
        }

        node.local = transform;
        self.invalidate(entity);
        true
    }

    /// Set the local position, keeping scale and rotation
    pub fn set_local_position(&mut self, entity: EntityId, position: Vec2) -> bool {
        self.update_local(entity, |local| local.with_position(position))
    }

    /// Set the local scale, keeping position and rotation
    pub fn set_local_scale(&mut self, entity: EntityId, scale: Vec2) -> bool {
        self.update_local(entity, |local| local.with_scale(scale))
    }

    /// Set the local rotation in radians, keeping position and scale
    pub fn set_local_rotation(&mut self, entity: EntityId, rotation: f32) -> bool {
        self.update_local(entity, |local| local.with_rotation(rotation))
    }

    /// Composed matrix of the entity and all of its ancestors
    ///
    /// Recomputed on the first read after invalidation, then cached.
    pub fn world_matrix(&self, entity: EntityId) -> Option<Mat3> {
        let node = self.nodes.get(entity)?;
        if let Some(matrix) = node.world_matrix.get() {
            return Some(matrix);
        }

        let parent_matrix = node
            .parent
            .and_then(|parent| self.world_matrix(parent))
            .unwrap_or_else(Mat3::identity);
        let matrix = parent_matrix * node.local.to_matrix();

        node.world_matrix.set(Some(matrix));
        node.matrix_recomputes.set(node.matrix_recomputes.get() + 1);
        Some(matrix)
    }

    /// World matrix decomposed into position, scale and rotation
    pub fn world_transform(&self, entity: EntityId) -> Option<Transform2D> {
        let node = self.nodes.get(entity)?;
        if let Some(transform) = node.world_transform.get() {
            return Some(transform);
        }

        let transform = Transform2D::from_matrix(&self.world_matrix(entity)?);
        node.world_transform.set(Some(transform));
        Some(transform)
    }

    /// Place the entity at a world-space transform
    ///
    /// Converted to local space through the inverse of the parent's world
    /// matrix. Fails if the parent matrix is singular.
    pub fn set_world_transform(&mut self, entity: EntityId, transform: Transform2D) -> bool {
        let Some(parent_inverse) = self.parent_inverse(entity) else {
            return false;
        };

        let local = Transform2D::from_matrix(&(parent_inverse * transform.to_matrix()));
        self.set_local_transform(entity, local)
    }

    /// Move the entity to a world-space position
    pub fn set_world_position(&mut self, entity: EntityId, position: Vec2) -> bool {
        let Some(parent_inverse) = self.parent_inverse(entity) else {
            return false;
        };

        let local_position = transform_point(&parent_inverse, position);
        self.set_local_position(entity, local_position)
    }

    /// Set the world-space scale, keeping world position and rotation
    pub fn set_world_scale(&mut self, entity: EntityId, scale: Vec2) -> bool {
        match self.world_transform(entity) {
            Some(world) => self.set_world_transform(entity, world.with_scale(scale)),
            None => false,
        }
    }

    /// How many times the entity's world matrix has been rebuilt
    pub fn matrix_recompute_count(&self, entity: EntityId) -> u64 {
        self.nodes.get(entity).map_or(0, |node| node.matrix_recomputes.get())
    }

    /// Whether the entity's cached world matrix is stale
    pub fn is_world_matrix_stale(&self, entity: EntityId) -> bool {
        self.nodes.get(entity).is_some_and(EntityNode::is_stale)
    }

    //--- Subscriptions ----------------------------------------------------

    /// Register a change handler on an entity
    pub fn subscribe(
        &mut self,
        entity: EntityId,
        kind: ChangeKind,
        handler: impl ChangeHandler + 'static,
    ) -> Option<SubscriptionId> {
        if !self.contains(entity) {
            return None;
        }
        Some(self.subscriptions.subscribe(entity, kind, handler))
    }

    /// Remove a change handler
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscriptions.unsubscribe(id)
    }

    /// Number of change handlers registered on an entity
    pub fn subscription_count(&self, entity: EntityId) -> usize {
        self.subscriptions.count_for(entity)
    }

    //--- Structure (crate private) ----------------------------------------

    pub(crate) fn create(&mut self, name: impl Into<String>) -> EntityId {
        self.nodes.insert(EntityNode::new(name))
    }

    /// Re-link `entity` under `new_parent` (or detach it with `None`)
    ///
    /// Rejected when either entity is unknown, when it would create a cycle,
    /// or when nothing would change.
    pub(crate) fn set_parent(&mut self, entity: EntityId, new_parent: Option<EntityId>) -> bool {
        let Some(old_parent) = self.nodes.get(entity).map(|node| node.parent) else {
            return false;
        };
        if old_parent == new_parent {
            return false;
        }

        if let Some(parent) = new_parent {
            if !self.contains(parent) {
                return false;
            }
            if parent == entity || self.is_ancestor_of(entity, parent) {
                debug!("Rejected reparent of {entity:?} under {parent:?}: would create a cycle");
                return false;
            }
        }

        let enabled_before = self.effective_states(entity);

        if let Some(old) = old_parent.and_then(|old| self.nodes.get_mut(old)) {
            old.children.retain(|child| *child != entity);
        }
        if let Some(parent) = new_parent.and_then(|parent| self.nodes.get_mut(parent)) {
            parent.children.push(entity);
        }
        if let Some(node) = self.nodes.get_mut(entity) {
            node.parent = new_parent;
        }

        self.invalidate(entity);
        self.subscriptions.notify(ChangeEvent::new(entity, ChangeKind::ParentChanged));
        self.notify_enabled_changes(enabled_before);
        true
    }

    /// Set the entity's own enabled flag
    ///
    /// Returns the entities (the entity and/or descendants) whose effective
    /// enabled state flipped.
    pub(crate) fn set_enabled(&mut self, entity: EntityId, enabled: bool) -> Vec<EntityId> {
        match self.nodes.get(entity) {
            Some(node) if node.enabled != enabled => {}
            _ => return Vec::new(),
        }

        let before = self.effective_states(entity);
        if let Some(node) = self.nodes.get_mut(entity) {
            node.enabled = enabled;
        }
        self.notify_enabled_changes(before)
    }

    /// Set the entity's visibility flag; returns whether it changed
    pub(crate) fn set_visible(&mut self, entity: EntityId, visible: bool) -> bool {
        let Some(node) = self.nodes.get_mut(entity) else {
            return false;
        };
        if node.visible == visible {
            return false;
        }

        node.visible = visible;
        self.subscriptions.notify(ChangeEvent::new(entity, ChangeKind::VisibilityChanged));
        true
    }

    pub(crate) fn set_live(&mut self, entity: EntityId, live: bool) {
        if let Some(node) = self.nodes.get_mut(entity) {
            node.live = live;
        }
    }

    pub(crate) fn attach_component(&mut self, entity: EntityId, component: ComponentId) -> bool {
        match self.nodes.get_mut(entity) {
            Some(node) => {
                node.components.push(component);
                true
            }
            None => false,
        }
    }

    pub(crate) fn detach_component(&mut self, entity: EntityId, component: ComponentId) {
        if let Some(node) = self.nodes.get_mut(entity) {
            node.components.retain(|other| *other != component);
        }
    }

    /// Drop every change handler registered on the entity
    pub(crate) fn release_subscriptions(&mut self, entity: EntityId) -> usize {
        self.subscriptions.unsubscribe_entity(entity)
    }

    /// Free a detached, childless entity from the arena
    pub(crate) fn destroy(&mut self, entity: EntityId) -> bool {
        match self.nodes.get(entity) {
            Some(node) if node.parent.is_none() && node.children.is_empty() => {}
            _ => return false,
        }

        self.subscriptions.unsubscribe_entity(entity);
        self.nodes.remove(entity).is_some()
    }

    //--- Internals --------------------------------------------------------

    fn update_local(&mut self, entity: EntityId, change: impl FnOnce(Transform2D) -> Transform2D) -> bool {
        match self.local_transform(entity) {
            Some(local) => self.set_local_transform(entity, change(local)),
            None => false,
        }
    }

    fn parent_inverse(&self, entity: EntityId) -> Option<Mat3> {
        let node = self.nodes.get(entity)?;
        match node.parent {
            Some(parent) => self.world_matrix(parent)?.try_inverse(),
            None => Some(Mat3::identity()),
        }
    }

    /// Mark the entity and every descendant stale and tell their observers
    fn invalidate(&mut self, entity: EntityId) {
        let mut stack = vec![entity];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(current) else {
                continue;
            };

            node.invalidate();
            stack.extend_from_slice(&node.children);
            self.subscriptions.notify(ChangeEvent::new(current, ChangeKind::TransformChanged));
        }
    }

    /// Effective enabled state of every entity in a subtree, computed top-down
    fn effective_states(&self, entity: EntityId) -> Vec<(EntityId, bool)> {
        let parent_enabled = self
            .parent(entity)
            .map_or(true, |parent| self.is_effectively_enabled(parent));

        let mut states = Vec::new();
        let mut stack = vec![(entity, parent_enabled)];
        while let Some((current, inherited)) = stack.pop() {
            let Some(node) = self.nodes.get(current) else {
                continue;
            };

            let effective = inherited && node.enabled;
            states.push((current, effective));
            stack.extend(node.children.iter().map(|child| (*child, effective)));
        }
        states
    }

    fn notify_enabled_changes(&mut self, before: Vec<(EntityId, bool)>) -> Vec<EntityId> {
        let changed: Vec<EntityId> = before
            .into_iter()
            .filter(|(entity, was_enabled)| self.is_effectively_enabled(*entity) != *was_enabled)
            .map(|(entity, _)| entity)
            .collect();

        for entity in &changed {
            self.subscriptions.notify(ChangeEvent::new(*entity, ChangeKind::EnabledChanged));
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;
    use std::sync::{Arc, Mutex};

    fn chain(hierarchy: &mut TransformHierarchy, length: usize) -> Vec<EntityId> {
        let entities: Vec<EntityId> = (0..length).map(|i| hierarchy.create(format!("e{i}"))).collect();
        for pair in entities.windows(2) {
            assert!(hierarchy.set_parent(pair[1], Some(pair[0])));
        }
        entities
    }

    #[test]
    fn test_child_world_position_follows_parent() {
        let mut hierarchy = TransformHierarchy::new();
        let a = hierarchy.create("A");
        let b = hierarchy.create("B");
        assert!(hierarchy.set_parent(b, Some(a)));

        hierarchy.set_local_position(b, Vec2::new(1.0, 0.0));
        hierarchy.set_local_position(a, Vec2::new(5.0, 5.0));
        assert_relative_eq!(hierarchy.world_transform(b).unwrap().position(), Vec2::new(6.0, 5.0), epsilon = 1e-5);

        hierarchy.set_local_position(a, Vec2::new(0.0, 0.0));
        assert_relative_eq!(hierarchy.world_transform(b).unwrap().position(), Vec2::new(1.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_invalidation_is_lazy() {
        let mut hierarchy = TransformHierarchy::new();
        let entities = chain(&mut hierarchy, 4);
        let (root, leaf) = (entities[0], entities[3]);

        hierarchy.world_matrix(leaf);
        let computed = hierarchy.matrix_recompute_count(leaf);

        hierarchy.set_local_position(root, Vec2::new(3.0, 4.0));
        assert!(hierarchy.is_world_matrix_stale(leaf));
        assert_eq!(hierarchy.matrix_recompute_count(leaf), computed);

        let matrix = hierarchy.world_matrix(leaf).unwrap();
        assert_eq!(hierarchy.matrix_recompute_count(leaf), computed + 1);
        assert_relative_eq!(transform_point(&matrix, Vec2::zeros()), Vec2::new(3.0, 4.0), epsilon = 1e-5);

        // Cached until the next change
        hierarchy.world_matrix(leaf);
        assert_eq!(hierarchy.matrix_recompute_count(leaf), computed + 1);
    }

    #[test]
    fn test_rotation_and_scale_compose_through_parent() {
        let mut hierarchy = TransformHierarchy::new();
        let parent = hierarchy.create("parent");
        let child = hierarchy.create("child");
        hierarchy.set_parent(child, Some(parent));

        hierarchy.set_local_transform(parent, Transform2D::new(Vec2::new(10.0, 0.0), Vec2::new(2.0, 2.0), FRAC_PI_2));
        hierarchy.set_local_position(child, Vec2::new(1.0, 0.0));

        let world = hierarchy.world_transform(child).unwrap();
        assert_relative_eq!(world.position(), Vec2::new(10.0, 2.0), epsilon = 1e-5);
        assert_relative_eq!(world.scale(), Vec2::new(2.0, 2.0), epsilon = 1e-5);
        assert_relative_eq!(world.rotation(), FRAC_PI_2, epsilon = 1e-5);
    }

    #[test]
    fn test_cycles_are_rejected() {
        let mut hierarchy = TransformHierarchy::new();
        let entities = chain(&mut hierarchy, 3);
        let (a, b, c) = (entities[0], entities[1], entities[2]);

        assert!(!hierarchy.set_parent(a, Some(c)));
        assert!(!hierarchy.set_parent(a, Some(b)));
        assert!(!hierarchy.set_parent(a, Some(a)));
        // Already the parent: no-op
        assert!(!hierarchy.set_parent(c, Some(b)));

        assert_eq!(hierarchy.parent(a), None);
        assert_eq!(hierarchy.parent(b), Some(a));
        assert_eq!(hierarchy.parent(c), Some(b));
        assert_eq!(hierarchy.children(a), &[b]);
        assert_eq!(hierarchy.children(b), &[c]);
    }

    #[test]
    fn test_detach_removes_from_former_parent() {
        let mut hierarchy = TransformHierarchy::new();
        let entities = chain(&mut hierarchy, 2);
        hierarchy.set_local_position(entities[0], Vec2::new(5.0, 0.0));
        hierarchy.set_local_position(entities[1], Vec2::new(1.0, 0.0));

        assert!(hierarchy.set_parent(entities[1], None));
        assert!(hierarchy.children(entities[0]).is_empty());
        assert_relative_eq!(
            hierarchy.world_transform(entities[1]).unwrap().position(),
            Vec2::new(1.0, 0.0),
            epsilon = 1e-5
        );
    }

    #[test]
    fn test_set_world_position_under_transformed_parent() {
        let mut hierarchy = TransformHierarchy::new();
        let parent = hierarchy.create("parent");
        let child = hierarchy.create("child");
        hierarchy.set_parent(child, Some(parent));
        hierarchy.set_local_transform(parent, Transform2D::new(Vec2::new(4.0, -2.0), Vec2::new(0.5, 0.5), 1.0));

        assert!(hierarchy.set_world_position(child, Vec2::new(7.0, 7.0)));
        assert_relative_eq!(hierarchy.world_transform(child).unwrap().position(), Vec2::new(7.0, 7.0), epsilon = 1e-4);

        let target = Transform2D::new(Vec2::new(-3.0, 2.0), Vec2::new(3.0, 3.0), 2.5);
        assert!(hierarchy.set_world_transform(child, target));
        let world = hierarchy.world_transform(child).unwrap();
        assert_relative_eq!(world.position(), target.position(), epsilon = 1e-4);
        assert_relative_eq!(world.scale(), target.scale(), epsilon = 1e-4);
        assert_relative_eq!(world.rotation(), target.rotation(), epsilon = 1e-4);
    }

    #[test]
    fn test_set_world_scale_keeps_position_and_rotation() {
        let mut hierarchy = TransformHierarchy::new();
        let parent = hierarchy.create("parent");
        let child = hierarchy.create("child");
        hierarchy.set_parent(child, Some(parent));
        hierarchy.set_local_transform(parent, Transform2D::new(Vec2::new(-1.0, 3.0), Vec2::new(2.0, 2.0), 0.7));
        hierarchy.set_local_transform(child, Transform2D::new(Vec2::new(1.0, 2.0), Vec2::new(1.0, 1.0), 0.4));
        let before = hierarchy.world_transform(child).unwrap();

        assert!(hierarchy.set_world_scale(child, Vec2::new(3.0, 1.5)));
        let after = hierarchy.world_transform(child).unwrap();
        assert_relative_eq!(after.scale(), Vec2::new(3.0, 1.5), epsilon = 1e-4);
        assert_relative_eq!(after.position(), before.position(), epsilon = 1e-4);
        assert_relative_eq!(after.rotation(), before.rotation(), epsilon = 1e-4);

        // Local scale absorbs the parent's scale
        let local = hierarchy.local_transform(child).unwrap();
        assert_relative_eq!(local.scale(), Vec2::new(1.5, 0.75), epsilon = 1e-4);
    }

    #[test]
    fn test_set_world_fails_under_singular_parent() {
        let mut hierarchy = TransformHierarchy::new();
        let parent = hierarchy.create("parent");
        let child = hierarchy.create("child");
        hierarchy.set_parent(child, Some(parent));
        hierarchy.set_local_scale(parent, Vec2::new(0.0, 1.0));

        assert!(!hierarchy.set_world_position(child, Vec2::new(1.0, 1.0)));
    }

    #[test]
    fn test_effective_enabled_follows_ancestors() {
        let mut hierarchy = TransformHierarchy::new();
        let entities = chain(&mut hierarchy, 3);

        let changed = hierarchy.set_enabled(entities[0], false);
        assert_eq!(changed.len(), 3);
        assert!(!hierarchy.is_effectively_enabled(entities[2]));
        assert!(hierarchy.is_enabled(entities[2]));
        assert!(!hierarchy.is_visible(entities[2]));

        // Disabling an already disabled subtree flips nothing
        assert!(hierarchy.set_enabled(entities[1], false).is_empty());
        let changed = hierarchy.set_enabled(entities[0], true);
        assert_eq!(changed, vec![entities[0]]);
        assert!(!hierarchy.is_effectively_enabled(entities[2]));
    }

    #[test]
    fn test_transform_change_notifies_descendants() {
        let mut hierarchy = TransformHierarchy::new();
        let entities = chain(&mut hierarchy, 3);
        let received = Arc::new(Mutex::new(Vec::new()));

        for entity in &entities {
            let sink = Arc::clone(&received);
            hierarchy.subscribe(*entity, ChangeKind::TransformChanged, move |event: &ChangeEvent| {
                sink.lock().unwrap().push(event.entity);
            });
        }

        hierarchy.set_local_rotation(entities[1], 0.5);
        let notified = received.lock().unwrap().clone();
        assert_eq!(notified, vec![entities[1], entities[2]]);
    }

    #[test]
    fn test_reparent_raises_parent_changed_and_invalidates() {
        let mut hierarchy = TransformHierarchy::new();
        let a = hierarchy.create("a");
        let b = hierarchy.create("b");
        let child = hierarchy.create("child");
        hierarchy.set_local_position(a, Vec2::new(1.0, 0.0));
        hierarchy.set_local_position(b, Vec2::new(0.0, 1.0));
        hierarchy.set_parent(child, Some(a));
        hierarchy.world_matrix(child);

        let count = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&count);
        hierarchy.subscribe(child, ChangeKind::ParentChanged, move |_: &ChangeEvent| {
            *sink.lock().unwrap() += 1;
        });

        assert!(hierarchy.set_parent(child, Some(b)));
        assert_eq!(*count.lock().unwrap(), 1);
        assert!(hierarchy.is_world_matrix_stale(child));
        assert_relative_eq!(hierarchy.world_transform(child).unwrap().position(), Vec2::new(0.0, 1.0), epsilon = 1e-5);
    }

    #[test]
    fn test_find_and_traversal_order() {
        let mut hierarchy = TransformHierarchy::new();
        let root = hierarchy.create("root");
        let left = hierarchy.create("left");
        let right = hierarchy.create("right");
        let leaf = hierarchy.create("leaf");
        hierarchy.set_parent(left, Some(root));
        hierarchy.set_parent(right, Some(root));
        hierarchy.set_parent(leaf, Some(left));

        assert_eq!(hierarchy.subtree(root), vec![root, left, leaf, right]);
        assert_eq!(hierarchy.find_child(root, "right"), Some(right));
        assert_eq!(hierarchy.find_child(root, "leaf"), None);
        assert_eq!(hierarchy.find_descendant(root, "leaf"), Some(leaf));
        assert!(hierarchy.is_descendant_of(leaf, root));
        assert!(!hierarchy.is_ancestor_of(right, leaf));
    }
}
