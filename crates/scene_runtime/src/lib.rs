//! # Scene Runtime
//!
//! The scene layer of a 2D game engine: entities, components and the frame
//! loop that drives them.
//!
//! ## Features
//!
//! - **Transform Hierarchy**: parent/child entities with lazily cached world matrices
//! - **Filtered Collections**: update, draw and camera lists kept sorted and filtered incrementally
//! - **Quad Tree Culling**: per-frame spatial index of visible drawables
//! - **Frame Scheduling**: concurrent updates, deferred end-of-frame actions, ordered cameras
//! - **Configuration**: runtime and scene settings from TOML or RON
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_runtime::prelude::*;
//!
//! struct Spinner;
//!
//! impl Component for Spinner {
//!     fn capabilities(&self) -> Capabilities {
//!         Capabilities::UPDATE
//!     }
//!
//!     fn update(&mut self, ctx: &mut UpdateContext<'_>) -> ComponentResult {
//!         let entity = ctx.entity();
//!         let step = ctx.frame().delta_seconds();
//!         let rotation = ctx.hierarchy().local_transform(entity).map_or(0.0, |t| t.rotation());
//!         ctx.hierarchy_mut().set_local_rotation(entity, rotation + step);
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> Result<(), SceneError> {
//!     let mut scene = Scene::new(SceneSettings::default());
//!     let entity = scene.create_entity("spinner");
//!     scene.add_root(entity);
//!     scene.add_component(entity, Spinner)?;
//!
//!     for index in 0..60 {
//!         let frame = FrameTime::fixed(1.0 / 60.0, index);
//!         scene.update(&frame)?;
//!         scene.draw(&frame)?;
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod collections;
pub mod config;
pub mod core;
pub mod events;
pub mod foundation;
pub mod hierarchy;
pub mod scene;
pub mod spatial;

/// Common imports for runtime users
pub mod prelude {
    pub use crate::{
        core::{Config, ConfigError, RuntimeConfig, SceneSettings},
        events::{ChangeEvent, ChangeKind},
        foundation::{
            collections::{ComponentId, EntityId, ModuleId, SubscriptionId},
            math::{Mat3, Transform2D, Vec2},
            time::{FrameTime, Timer},
        },
        hierarchy::TransformHierarchy,
        scene::{
            AsyncUpdateContext, BoxedError, Capabilities, Component, ComponentDescriptor, ComponentResult,
            DrawContext, DrawStats, FramePhase, Layers, ModuleContext, ModuleDescriptor, Scene, SceneError,
            SceneModule, SceneResult, UpdateContext, UpdateStats,
        },
        spatial::{BoundingArea, QuadTreeConfig},
    };
}
