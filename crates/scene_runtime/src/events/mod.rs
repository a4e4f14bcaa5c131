//! Entity change notifications
//!
//! Key principles:
//! - Registration system (only notify handlers interested in an entity and kind)
//! - Subscribe returns a handle; unsubscribing by handle never touches others
//! - Everything an entity registered can be released in one call when it
//!   leaves the scene, so no handler outlives its subject

use std::collections::HashMap;

use crate::foundation::collections::{EntityId, SlotMap, SubscriptionId};

/// Kind of change raised by an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// Local or inherited world transform changed
    TransformChanged,
    /// Entity was attached to or detached from a parent
    ParentChanged,
    /// Effective enabled state changed
    EnabledChanged,
    /// Visibility flag changed
    VisibilityChanged,
}

/// A change raised by an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Entity the change happened on
    pub entity: EntityId,
    /// What changed
    pub kind: ChangeKind,
}

impl ChangeEvent {
    /// Create a new change event
    pub fn new(entity: EntityId, kind: ChangeKind) -> Self {
        Self { entity, kind }
    }
}

/// Change handler trait
pub trait ChangeHandler: Send {
    /// Handle a change event
    fn on_change(&mut self, event: &ChangeEvent);
}

impl<F> ChangeHandler for F
where
    F: FnMut(&ChangeEvent) + Send,
{
    fn on_change(&mut self, event: &ChangeEvent) {
        self(event);
    }
}

struct Subscription {
    entity: EntityId,
    kind: ChangeKind,
    handler: Box<dyn ChangeHandler>,
}

/// Registry of change handlers keyed by entity
#[derive(Default)]
pub struct Subscriptions {
    handlers: SlotMap<SubscriptionId, Subscription>,
    by_entity: HashMap<EntityId, Vec<SubscriptionId>>,
}

impl Subscriptions {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one kind of change on one entity
    pub fn subscribe(
        &mut self,
        entity: EntityId,
        kind: ChangeKind,
        handler: impl ChangeHandler + 'static,
    ) -> SubscriptionId {
        let id = self.handlers.insert(Subscription {
            entity,
            kind,
            handler: Box::new(handler),
        });
        self.by_entity.entry(entity).or_default().push(id);
        id
    }

    /// Remove a handler; returns false if the handle is unknown
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let Some(subscription) = self.handlers.remove(id) else {
            return false;
        };

        if let Some(ids) = self.by_entity.get_mut(&subscription.entity) {
            ids.retain(|other| *other != id);
            if ids.is_empty() {
                self.by_entity.remove(&subscription.entity);
            }
        }
        true
    }

    /// Remove every handler registered on an entity, returning how many
    pub fn unsubscribe_entity(&mut self, entity: EntityId) -> usize {
        let Some(ids) = self.by_entity.remove(&entity) else {
            return 0;
        };

        ids.into_iter()
            .filter(|id| self.handlers.remove(*id).is_some())
            .count()
    }

    /// Number of handlers registered on an entity
    pub fn count_for(&self, entity: EntityId) -> usize {
        self.by_entity.get(&entity).map_or(0, Vec::len)
    }

    /// Total number of registered handlers
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no handler is registered
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Deliver an event to the handlers registered for its entity and kind
    ///
    /// Returns the number of handlers invoked.
    pub fn notify(&mut self, event: ChangeEvent) -> usize {
        let Some(ids) = self.by_entity.get(&event.entity) else {
            return 0;
        };

        let mut delivered = 0;
        for id in ids {
            if let Some(subscription) = self.handlers.get_mut(*id) {
                if subscription.kind == event.kind {
                    subscription.handler.on_change(&event);
                    delivered += 1;
                }
            }
        }
        delivered
    }
}

impl std::fmt::Debug for Subscriptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscriptions")
            .field("handlers", &self.handlers.len())
            .field("entities", &self.by_entity.len())
            .finish()
    }
}
