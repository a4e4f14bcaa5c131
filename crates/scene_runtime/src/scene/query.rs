//! Component lookup across the entity tree
//!
//! Lookups never fail loudly: unknown ids and missing matches give `None`
//! or an empty list.

use crate::foundation::collections::{ComponentId, EntityId};
use crate::scene::{Component, Scene};

impl Scene {
    /// Typed access to a component
    pub fn component<T: Component>(&self, id: ComponentId) -> Option<&T> {
        self.behavior(id)?.as_any().downcast_ref::<T>()
    }

    /// Typed mutable access to a component
    pub fn component_mut<T: Component>(&mut self, id: ComponentId) -> Option<&mut T> {
        let behavior: &mut dyn Component = &mut **self.state.behaviors.get_mut(id)?;
        behavior.as_any_mut().downcast_mut::<T>()
    }

    /// Components attached to an entity, in attachment order
    pub fn components_of(&self, entity: EntityId) -> &[ComponentId] {
        self.state.hierarchy.components(entity)
    }

    /// Entity a component is attached to
    pub fn entity_of(&self, component: ComponentId) -> Option<EntityId> {
        self.state.records.get(component).map(|record| record.entity)
    }

    /// First component of type `T` on the entity itself
    pub fn find_component<T: Component>(&self, entity: EntityId) -> Option<ComponentId> {
        self.components_of(entity)
            .iter()
            .copied()
            .find(|id| self.is_component::<T>(*id))
    }

    /// First component with the given name on the entity or its
    /// descendants, depth-first
    pub fn find_component_in_children(&self, entity: EntityId, name: &str) -> Option<ComponentId> {
        self.state.hierarchy.subtree(entity).into_iter().find_map(|id| {
            self.components_of(id)
                .iter()
                .copied()
                .find(|component| self.descriptor(*component).is_some_and(|d| d.name == name))
        })
    }

    /// Every component of type `T` on the entity and its descendants,
    /// depth-first
    pub fn get_components_in_children<T: Component>(&self, entity: EntityId) -> Vec<ComponentId> {
        self.state
            .hierarchy
            .subtree(entity)
            .into_iter()
            .flat_map(|id| self.components_of(id).iter().copied())
            .filter(|component| self.is_component::<T>(*component))
            .collect()
    }

    /// Component of type `T` on the nearest ancestor that has one
    ///
    /// The entity itself is not searched.
    pub fn get_component_from_parent<T: Component>(&self, entity: EntityId) -> Option<ComponentId> {
        let mut current = self.state.hierarchy.parent(entity);
        while let Some(ancestor) = current {
            if let Some(found) = self.find_component::<T>(ancestor) {
                return Some(found);
            }
            current = self.state.hierarchy.parent(ancestor);
        }
        None
    }

    fn behavior(&self, id: ComponentId) -> Option<&dyn Component> {
        self.state.behaviors.get(id).map(|behavior| &**behavior)
    }

    fn is_component<T: Component>(&self, id: ComponentId) -> bool {
        self.behavior(id).is_some_and(|behavior| behavior.as_any().is::<T>())
    }
}
