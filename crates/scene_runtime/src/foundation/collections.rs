//! Handle types for the scene arenas

pub use slotmap::{SecondaryMap, SlotMap};

slotmap::new_key_type! {
    /// Handle to an entity in a scene's transform hierarchy
    pub struct EntityId;

    /// Handle to a component attached to an entity
    pub struct ComponentId;

    /// Handle to a scene-level module
    pub struct ModuleId;

    /// Handle returned by a change subscription, used to unsubscribe
    pub struct SubscriptionId;
}
