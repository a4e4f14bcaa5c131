//! Component and module traits
//!
//! A component is user behavior attached to one entity. What the scene does
//! with it is decided by the [`Capabilities`] it reports when added:
//!
//! - `UPDATE`: run every frame on the scheduling thread, in update order
//! - `ASYNC_UPDATE`: run every frame on a worker, concurrently with the
//!   synchronous pass (takes precedence over `UPDATE`)
//! - `DRAW`: indexed by its bounding area and drawn by every camera that
//!   sees it, in draw order
//! - `CAMERA`: queries the index with its view area, in render order
//!
//! Ordering and filtering metadata lives in a [`ComponentDescriptor`] owned
//! by the scene, so changing it goes through the scene and keeps the frame
//! collections current.

use std::any::Any;

use bitflags::bitflags;

use crate::foundation::collections::EntityId;
use crate::scene::context::{AsyncUpdateContext, DrawContext, ModuleContext, UpdateContext};
use crate::scene::error::ComponentResult;
use crate::scene::layers::Layers;
use crate::spatial::BoundingArea;

/// Dynamic downcasting support for trait objects
pub trait AsAny: Any {
    /// Borrow as `&dyn Any`
    fn as_any(&self) -> &dyn Any;
    /// Borrow as `&mut dyn Any`
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

bitflags! {
    /// Frame passes a component takes part in
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        /// Synchronous update
        const UPDATE = 1 << 0;
        /// Concurrent update
        const ASYNC_UPDATE = 1 << 1;
        /// Draw call
        const DRAW = 1 << 2;
        /// Renders drawables
        const CAMERA = 1 << 3;
    }
}

/// Behavior attached to an entity
pub trait Component: AsAny + Send {
    /// Frame passes this component takes part in, read once when added
    fn capabilities(&self) -> Capabilities {
        Capabilities::empty()
    }

    /// Called when the component joins a live scene tree
    fn on_attached(&mut self, _entity: EntityId) {}

    /// Called when the component leaves the live scene tree
    fn on_detached(&mut self) {}

    /// Synchronous per-frame update
    fn update(&mut self, _ctx: &mut UpdateContext<'_>) -> ComponentResult {
        Ok(())
    }

    /// Per-frame update run on a worker thread
    ///
    /// Has no access to the hierarchy; structural or transform changes go
    /// through [`AsyncUpdateContext::queue_end_of_frame_action`].
    fn update_async(&mut self, _ctx: &AsyncUpdateContext<'_>) -> ComponentResult {
        Ok(())
    }

    /// Drawable bounds in the entity's local space
    fn local_bounds(&self) -> BoundingArea {
        BoundingArea::EMPTY
    }

    /// Issue the draw call for one camera
    fn draw(&mut self, _ctx: &DrawContext<'_>) -> ComponentResult {
        Ok(())
    }

    /// Camera view in the entity's local space
    fn view_bounds(&self) -> BoundingArea {
        BoundingArea::EMPTY
    }
}

/// Scene-owned metadata of a component
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentDescriptor {
    /// Name used by [`Scene::find_component_in_children`](crate::scene::Scene::find_component_in_children)
    pub name: String,
    /// Own enabled flag, combined with the entity's effective enabled state
    pub enabled: bool,
    /// Position in the update pass
    pub update_order: i32,
    /// Position among drawables seen by one camera
    pub draw_order: i32,
    /// Position among cameras
    pub render_order: i32,
    /// Layers a drawable lives on
    pub layers: Layers,
    /// Layers a camera renders
    pub render_layers: Layers,
}

impl Default for ComponentDescriptor {
    fn default() -> Self {
        Self {
            name: String::new(),
            enabled: true,
            update_order: 0,
            draw_order: 0,
            render_order: 0,
            layers: Layers::DEFAULT,
            render_layers: Layers::ALL,
        }
    }
}

impl ComponentDescriptor {
    /// Descriptor with a name and default values
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Descriptor named after a component type
    pub fn for_type<T: ?Sized>() -> Self {
        Self::named(short_type_name::<T>())
    }

    /// Builder pattern: set update order
    #[must_use]
    pub fn with_update_order(mut self, order: i32) -> Self {
        self.update_order = order;
        self
    }

    /// Builder pattern: set draw order
    #[must_use]
    pub fn with_draw_order(mut self, order: i32) -> Self {
        self.draw_order = order;
        self
    }

    /// Builder pattern: set render order
    #[must_use]
    pub fn with_render_order(mut self, order: i32) -> Self {
        self.render_order = order;
        self
    }

    /// Builder pattern: set drawable layers
    #[must_use]
    pub fn with_layers(mut self, layers: Layers) -> Self {
        self.layers = layers;
        self
    }

    /// Builder pattern: set the layers a camera renders
    #[must_use]
    pub fn with_render_layers(mut self, layers: Layers) -> Self {
        self.render_layers = layers;
        self
    }

    /// Builder pattern: start disabled
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Scene-level system run before and after the component update pass
pub trait SceneModule: AsAny + Send {
    /// Runs before any component updates
    fn pre_update(&mut self, _ctx: &mut ModuleContext<'_>) -> ComponentResult {
        Ok(())
    }

    /// Runs after end-of-frame actions are flushed
    fn post_update(&mut self, _ctx: &mut ModuleContext<'_>) -> ComponentResult {
        Ok(())
    }
}

/// Scene-owned metadata of a module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    /// Module name, used in errors and logs
    pub name: String,
    /// Whether the module runs
    pub enabled: bool,
    /// Position among modules
    pub update_order: i32,
}

impl ModuleDescriptor {
    /// Enabled descriptor with a name and order
    pub fn new(name: impl Into<String>, update_order: i32) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            update_order,
        }
    }

    /// Descriptor named after a module type
    pub fn for_type<T: ?Sized>() -> Self {
        Self::new(short_type_name::<T>(), 0)
    }
}

/// Type name without its module path
fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe;

    impl Component for Probe {}

    #[test]
    fn test_default_capabilities_are_empty() {
        assert!(Probe.capabilities().is_empty());
        assert!(Probe.local_bounds().is_empty());
    }

    #[test]
    fn test_descriptor_named_after_type() {
        assert_eq!(ComponentDescriptor::for_type::<Probe>().name, "Probe");
        assert_eq!(ModuleDescriptor::for_type::<Vec<u8>>().name, "Vec");
    }

    #[test]
    fn test_downcast_through_trait_object() {
        let boxed: Box<dyn Component> = Box::new(Probe);
        let component: &dyn Component = boxed.as_ref();
        assert!(component.as_any().is::<Probe>());
    }
}
