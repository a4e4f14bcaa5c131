//! Frame scheduling
//!
//! Update: module pre-update → concurrent and synchronous component updates
//! (joined) → end-of-frame actions → module post-update.
//!
//! Draw: clear the index → insert every visible drawable → per camera, query
//! the index and draw the candidates that pass the layer and overlap tests.
//!
//! Every pass walks a snapshot of its collection taken when the pass starts.
//! Enable and order changes made by user code during a pass apply from the
//! next pass.

use crossbeam_channel::unbounded;
use log::{trace, warn};

use crate::foundation::collections::{ComponentId, EntityId};
use crate::foundation::math::Transform2D;
use crate::foundation::time::FrameTime;
use crate::scene::{
    AsyncUpdateContext, BoxedError, Component, DrawContext, FramePhase, Layers, ModuleContext, Scene,
    SceneError, SceneResult, SceneState, UpdateContext,
};
use crate::spatial::BoundingArea;

/// What an update pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateStats {
    /// Modules whose pre-update ran
    pub modules_run: usize,
    /// Synchronous component updates
    pub components_updated: usize,
    /// Concurrent component updates
    pub async_components_updated: usize,
    /// End-of-frame actions flushed
    pub end_of_frame_actions: usize,
}

/// What a draw pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    /// Cameras that queried the index
    pub cameras: usize,
    /// Drawables inserted into the index
    pub drawables_indexed: usize,
    /// Candidates returned by index queries, summed over cameras
    pub candidates: usize,
    /// Draw calls issued
    pub draw_calls: usize,
}

/// Drawable inserted into the index this frame
#[derive(Debug, Clone, Copy)]
pub(super) struct DrawEntry {
    component: ComponentId,
    entity: EntityId,
    bounds: BoundingArea,
}

/// Concurrent update taken out of the scene for the duration of the pass
struct AsyncJob {
    component: ComponentId,
    entity: EntityId,
    world_transform: Transform2D,
    behavior: Box<dyn Component>,
}

impl Scene {
    /// Run one update pass
    ///
    /// Concurrent updates always finish before this returns, even when a
    /// synchronous update failed. On failure, end-of-frame actions stay
    /// queued for the next successful pass and post-update does not run.
    pub fn update(&mut self, frame: &FrameTime) -> SceneResult<UpdateStats> {
        let modules_run = self.run_modules(frame, FramePhase::PreUpdate)?;
        let (components_updated, async_components_updated) = self.run_components(frame)?;
        let end_of_frame_actions = self.flush_end_of_frame_actions();
        self.run_modules(frame, FramePhase::PostUpdate)?;

        let stats = UpdateStats {
            modules_run,
            components_updated,
            async_components_updated,
            end_of_frame_actions,
        };
        trace!("Frame {} update: {stats:?}", frame.frame_index());
        Ok(stats)
    }

    /// Run one draw pass with every enabled camera, in render order
    pub fn draw(&mut self, frame: &FrameTime) -> SceneResult<DrawStats> {
        let cameras = self.cameras.snapshot();
        self.draw_cameras(frame, &cameras)
    }

    /// Run one draw pass with an explicit camera list, in the given order
    ///
    /// Listed components that are not enabled cameras of the live scene
    /// are skipped; unknown ids are an error.
    pub fn draw_with_cameras(&mut self, frame: &FrameTime, cameras: &[ComponentId]) -> SceneResult<DrawStats> {
        if let Some(unknown) = cameras.iter().find(|camera| !self.state.records.contains_key(**camera)) {
            return Err(SceneError::UnknownComponent(*unknown));
        }

        let cameras: Vec<ComponentId> = cameras
            .iter()
            .copied()
            .filter(|camera| self.cameras.is_visible(*camera))
            .collect();
        self.draw_cameras(frame, &cameras)
    }

    fn run_modules(&mut self, frame: &FrameTime, phase: FramePhase) -> SceneResult<usize> {
        let modules = self.modules.snapshot();

        for &id in &modules {
            let Some(module) = self.module_behaviors.get_mut(id) else {
                continue;
            };

            let mut ctx = ModuleContext {
                frame,
                module: id,
                hierarchy: &mut self.state.hierarchy,
                dependencies: &mut self.dependencies,
                settings: &self.settings,
                queue: &self.action_sender,
            };
            let result = match phase {
                FramePhase::PreUpdate => module.pre_update(&mut ctx),
                _ => module.post_update(&mut ctx),
            };

            if let Err(source) = result {
                let name = self
                    .module_records
                    .get(id)
                    .map(|record| record.descriptor.name.clone())
                    .unwrap_or_default();
                warn!("Module '{name}' failed during {phase}: {source}");
                return Err(SceneError::ModuleFailed { name, phase, source });
            }
        }

        Ok(modules.len())
    }

    /// Concurrent and synchronous component updates, joined before returning
    fn run_components(&mut self, frame: &FrameTime) -> SceneResult<(usize, usize)> {
        let sync_ids = self.updateables.snapshot();
        let mut jobs = self.take_async_jobs();

        let Scene {
            state,
            dependencies,
            settings,
            action_sender,
            ..
        } = &mut *self;
        let SceneState {
            hierarchy,
            records,
            behaviors,
        } = state;
        let settings = &*settings;
        let queue = &*action_sender;

        let (error_sender, error_receiver) = unbounded::<(usize, BoxedError)>();
        let mut sync_failure = None;
        let mut updated = 0;

        rayon::in_place_scope(|scope| {
            for (index, job) in jobs.iter_mut().enumerate() {
                let errors = error_sender.clone();
                let ctx = AsyncUpdateContext {
                    frame,
                    component: job.component,
                    entity: job.entity,
                    world_transform: job.world_transform,
                    settings,
                    queue: queue.clone(),
                };

                scope.spawn(move |_| {
                    if let Err(source) = job.behavior.update_async(&ctx) {
                        let _ = errors.send((index, source));
                    }
                });
            }

            for id in sync_ids {
                let (Some(record), Some(behavior)) = (records.get(id), behaviors.get_mut(id)) else {
                    continue;
                };

                let mut ctx = UpdateContext {
                    frame,
                    component: id,
                    entity: record.entity,
                    hierarchy: &mut *hierarchy,
                    dependencies: &mut *dependencies,
                    settings,
                    queue,
                };
                if let Err(source) = behavior.update(&mut ctx) {
                    sync_failure = Some((id, source));
                    break;
                }
                updated += 1;
            }
        });
        drop(error_sender);

        // Report the earliest failing job in update order
        let async_failure = error_receiver
            .try_iter()
            .min_by_key(|(index, _)| *index)
            .map(|(index, source)| (jobs[index].component, source));

        let async_updated = jobs.len();
        for job in jobs {
            self.state.behaviors.insert(job.component, job.behavior);
        }

        if let Some((id, source)) = sync_failure {
            return Err(self.component_failure(id, FramePhase::Update, source));
        }
        if let Some((id, source)) = async_failure {
            return Err(self.component_failure(id, FramePhase::AsyncUpdate, source));
        }

        Ok((updated, async_updated))
    }

    /// Move concurrent updateables out of the behavior map so each worker
    /// owns its component exclusively
    fn take_async_jobs(&mut self) -> Vec<AsyncJob> {
        let ids = self.async_updateables.snapshot();
        let mut jobs = Vec::with_capacity(ids.len());

        for component in ids {
            let Some(entity) = self.state.records.get(component).map(|record| record.entity) else {
                continue;
            };
            let world_transform = self.state.hierarchy.world_transform(entity).unwrap_or_default();
            let Some(behavior) = self.state.behaviors.remove(component) else {
                continue;
            };

            jobs.push(AsyncJob {
                component,
                entity,
                world_transform,
                behavior,
            });
        }
        jobs
    }

    /// Run the actions queued so far, in enqueue order
    ///
    /// Actions queued while flushing wait for the next flush.
    fn flush_end_of_frame_actions(&mut self) -> usize {
        let pending: Vec<_> = self.action_receiver.try_iter().collect();
        let count = pending.len();

        for action in pending {
            action(self);
        }
        count
    }

    fn draw_cameras(&mut self, frame: &FrameTime, cameras: &[ComponentId]) -> SceneResult<DrawStats> {
        self.rebuild_index();

        let mut stats = DrawStats {
            drawables_indexed: self.draw_list.len(),
            ..DrawStats::default()
        };
        let mut candidates = Vec::new();

        for &camera in cameras {
            let Some((render_layers, view_area)) = self.camera_view(camera) else {
                continue;
            };

            candidates.clear();
            self.index.retrieve_into(&view_area, &mut candidates);
            // Slots follow the drawable order
            candidates.sort_unstable();

            stats.cameras += 1;
            stats.candidates += candidates.len();

            for &slot in &candidates {
                let entry = self.draw_list[slot];
                let Some(record) = self.state.records.get(entry.component) else {
                    continue;
                };
                if !render_layers.renders(record.descriptor.layers) || !entry.bounds.overlaps(&view_area) {
                    continue;
                }
                let Some(behavior) = self.state.behaviors.get_mut(entry.component) else {
                    continue;
                };

                let ctx = DrawContext {
                    frame,
                    component: entry.component,
                    entity: entry.entity,
                    camera,
                    view_area,
                    bounds: entry.bounds,
                    hierarchy: &self.state.hierarchy,
                    settings: &self.settings,
                    queue: &self.action_sender,
                };
                if let Err(source) = behavior.draw(&ctx) {
                    return Err(self.component_failure(entry.component, FramePhase::Draw, source));
                }
                stats.draw_calls += 1;
            }
        }

        trace!("Frame {} draw: {stats:?}", frame.frame_index());
        Ok(stats)
    }

    /// Clear the index and insert every visible drawable by its world bounds
    fn rebuild_index(&mut self) {
        self.index.clear();
        self.draw_list.clear();

        for component in self.drawables.iter() {
            let Some(record) = self.state.records.get(component) else {
                continue;
            };
            let Some(behavior) = self.state.behaviors.get(component) else {
                continue;
            };
            let Some(world) = self.state.hierarchy.world_matrix(record.entity) else {
                continue;
            };

            let bounds = behavior.local_bounds().transform(&world);
            if bounds.is_empty() {
                continue;
            }

            self.index.insert(self.draw_list.len(), bounds);
            self.draw_list.push(DrawEntry {
                component,
                entity: record.entity,
                bounds,
            });
        }
    }

    /// Render layers and world-space view of a camera
    fn camera_view(&self, camera: ComponentId) -> Option<(Layers, BoundingArea)> {
        let record = self.state.records.get(camera)?;
        let world = self.state.hierarchy.world_matrix(record.entity)?;
        let view_area = self.state.behaviors.get(camera)?.view_bounds().transform(&world);

        (!view_area.is_empty()).then_some((record.descriptor.render_layers, view_area))
    }

    fn component_failure(&self, id: ComponentId, phase: FramePhase, source: BoxedError) -> SceneError {
        let name = self
            .state
            .records
            .get(id)
            .map(|record| record.descriptor.name.clone())
            .unwrap_or_default();

        warn!("Component '{name}' failed during {phase}: {source}");
        SceneError::ComponentFailed { name, phase, source }
    }
}
