//! Contexts handed to components and modules during a frame

use crossbeam_channel::Sender;
use log::warn;

use crate::core::SceneSettings;
use crate::foundation::collections::{ComponentId, EntityId, ModuleId};
use crate::foundation::math::{Mat3, Transform2D};
use crate::foundation::time::FrameTime;
use crate::hierarchy::TransformHierarchy;
use crate::scene::registry::DependencyRegistry;
use crate::scene::Scene;
use crate::spatial::BoundingArea;

/// Deferred scene mutation run at the end of the update pass
pub type EndOfFrameAction = Box<dyn FnOnce(&mut Scene) + Send>;

pub(crate) fn send_action(queue: &Sender<EndOfFrameAction>, action: EndOfFrameAction) {
    // The receiving end lives in the scene, which outlives every context
    if queue.send(action).is_err() {
        warn!("End-of-frame queue closed, action dropped");
    }
}

/// Context of a synchronous component update
pub struct UpdateContext<'a> {
    pub(crate) frame: &'a FrameTime,
    pub(crate) component: ComponentId,
    pub(crate) entity: EntityId,
    pub(crate) hierarchy: &'a mut TransformHierarchy,
    pub(crate) dependencies: &'a mut DependencyRegistry,
    pub(crate) settings: &'a SceneSettings,
    pub(crate) queue: &'a Sender<EndOfFrameAction>,
}

impl UpdateContext<'_> {
    /// Timing of the current frame
    pub fn frame(&self) -> &FrameTime {
        self.frame
    }

    /// Component being updated
    pub fn component(&self) -> ComponentId {
        self.component
    }

    /// Entity the component is attached to
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// Scene settings
    pub fn settings(&self) -> &SceneSettings {
        self.settings
    }

    /// Read access to the transform hierarchy
    pub fn hierarchy(&self) -> &TransformHierarchy {
        self.hierarchy
    }

    /// Transform access to the hierarchy
    ///
    /// Structural changes (parenting, enabling, removal) are not available
    /// here; queue them as end-of-frame actions.
    pub fn hierarchy_mut(&mut self) -> &mut TransformHierarchy {
        self.hierarchy
    }

    /// World transform of the component's entity
    pub fn world_transform(&self) -> Option<Transform2D> {
        self.hierarchy.world_transform(self.entity)
    }

    /// Scene-scoped singleton, created with `Default` on first use
    pub fn resolve_dependency<T: Default + Send + 'static>(&mut self) -> Option<&mut T> {
        self.dependencies.resolve::<T>()
    }

    /// Defer a scene mutation to the end of the update pass
    pub fn queue_end_of_frame_action(&self, action: impl FnOnce(&mut Scene) + Send + 'static) {
        send_action(self.queue, Box::new(action));
    }
}

/// Context of a concurrent component update
///
/// Carries a snapshot of the entity's world transform taken before the
/// update pass started.
pub struct AsyncUpdateContext<'a> {
    pub(crate) frame: &'a FrameTime,
    pub(crate) component: ComponentId,
    pub(crate) entity: EntityId,
    pub(crate) world_transform: Transform2D,
    pub(crate) settings: &'a SceneSettings,
    pub(crate) queue: Sender<EndOfFrameAction>,
}

impl AsyncUpdateContext<'_> {
    /// Timing of the current frame
    pub fn frame(&self) -> &FrameTime {
        self.frame
    }

    /// Component being updated
    pub fn component(&self) -> ComponentId {
        self.component
    }

    /// Entity the component is attached to
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// Entity world transform at the start of the update pass
    pub fn world_transform(&self) -> Transform2D {
        self.world_transform
    }

    /// Scene settings
    pub fn settings(&self) -> &SceneSettings {
        self.settings
    }

    /// Defer a scene mutation to the end of the update pass
    ///
    /// Runs after every concurrent update has finished.
    pub fn queue_end_of_frame_action(&self, action: impl FnOnce(&mut Scene) + Send + 'static) {
        send_action(&self.queue, Box::new(action));
    }
}

/// Context of one draw call
pub struct DrawContext<'a> {
    pub(crate) frame: &'a FrameTime,
    pub(crate) component: ComponentId,
    pub(crate) entity: EntityId,
    pub(crate) camera: ComponentId,
    pub(crate) view_area: BoundingArea,
    pub(crate) bounds: BoundingArea,
    pub(crate) hierarchy: &'a TransformHierarchy,
    pub(crate) settings: &'a SceneSettings,
    pub(crate) queue: &'a Sender<EndOfFrameAction>,
}

impl DrawContext<'_> {
    /// Timing of the current frame
    pub fn frame(&self) -> &FrameTime {
        self.frame
    }

    /// Drawable being drawn
    pub fn component(&self) -> ComponentId {
        self.component
    }

    /// Entity the drawable is attached to
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// Camera issuing the draw call
    pub fn camera(&self) -> ComponentId {
        self.camera
    }

    /// Camera view in world space
    pub fn view_area(&self) -> BoundingArea {
        self.view_area
    }

    /// Drawable bounds in world space
    pub fn bounds(&self) -> BoundingArea {
        self.bounds
    }

    /// World matrix of the drawable's entity
    pub fn world_matrix(&self) -> Mat3 {
        self.hierarchy.world_matrix(self.entity).unwrap_or_else(Mat3::identity)
    }

    /// Read access to the transform hierarchy
    pub fn hierarchy(&self) -> &TransformHierarchy {
        self.hierarchy
    }

    /// Scene settings
    pub fn settings(&self) -> &SceneSettings {
        self.settings
    }

    /// Defer a scene mutation to the end of the next update pass
    pub fn queue_end_of_frame_action(&self, action: impl FnOnce(&mut Scene) + Send + 'static) {
        send_action(self.queue, Box::new(action));
    }
}

/// Context of a module's pre or post update
pub struct ModuleContext<'a> {
    pub(crate) frame: &'a FrameTime,
    pub(crate) module: ModuleId,
    pub(crate) hierarchy: &'a mut TransformHierarchy,
    pub(crate) dependencies: &'a mut DependencyRegistry,
    pub(crate) settings: &'a SceneSettings,
    pub(crate) queue: &'a Sender<EndOfFrameAction>,
}

impl ModuleContext<'_> {
    /// Timing of the current frame
    pub fn frame(&self) -> &FrameTime {
        self.frame
    }

    /// Module being run
    pub fn module(&self) -> ModuleId {
        self.module
    }

    /// Scene settings
    pub fn settings(&self) -> &SceneSettings {
        self.settings
    }

    /// Read access to the transform hierarchy
    pub fn hierarchy(&self) -> &TransformHierarchy {
        self.hierarchy
    }

    /// Transform access to the hierarchy
    pub fn hierarchy_mut(&mut self) -> &mut TransformHierarchy {
        self.hierarchy
    }

    /// Scene-scoped singleton, created with `Default` on first use
    pub fn resolve_dependency<T: Default + Send + 'static>(&mut self) -> Option<&mut T> {
        self.dependencies.resolve::<T>()
    }

    /// Defer a scene mutation to the end of the update pass
    pub fn queue_end_of_frame_action(&self, action: impl FnOnce(&mut Scene) + Send + 'static) {
        send_action(self.queue, Box::new(action));
    }
}
