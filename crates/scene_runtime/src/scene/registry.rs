//! Per-scene dependency registry
//!
//! Lazily constructed singletons keyed by type, scoped to one scene. Modules
//! and components share scene-wide state through it instead of globals.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use log::debug;

/// Type-keyed singleton store
#[derive(Default)]
pub struct DependencyRegistry {
    entries: HashMap<TypeId, Box<dyn Any + Send>>,
}

impl DependencyRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The singleton of type `T`, created with `Default` on first use
    pub fn resolve<T: Default + Send + 'static>(&mut self) -> Option<&mut T> {
        self.resolve_with(T::default)
    }

    /// The singleton of type `T`, created by `factory` on first use
    ///
    /// The factory is not called when the singleton already exists. Values
    /// are only ever stored under their own `TypeId`, so this is `Some`
    /// for every `T`.
    pub fn resolve_with<T: Send + 'static>(&mut self, factory: impl FnOnce() -> T) -> Option<&mut T> {
        self.entries
            .entry(TypeId::of::<T>())
            .or_insert_with(|| {
                debug!("Created scene dependency {}", type_name::<T>());
                Box::new(factory())
            })
            .downcast_mut::<T>()
    }

    /// Mutable access to the singleton of type `T`, if it was created
    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.entries
            .get_mut(&TypeId::of::<T>())
            .and_then(|entry| entry.downcast_mut::<T>())
    }

    /// The singleton of type `T`, if it was created
    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|entry| (**entry).downcast_ref::<T>())
    }

    /// Whether a singleton of type `T` exists
    pub fn contains<T: 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    /// Number of singletons
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no singleton was created yet
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for DependencyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyRegistry")
            .field("entries", &self.entries.len())
            .finish()
    }
}
