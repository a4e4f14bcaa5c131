//! # Scene Runtime
//!
//! Owns the entity forest, the components attached to it, the live
//! collections that decide who takes part in each frame pass, and the
//! spatial index used to cull drawables per camera.
//!
//! ## Lifecycle
//!
//! Entities are created detached. They become live when added as a root or
//! under a live parent; at that point every component of the subtree is
//! registered into the collections its [`Capabilities`] ask for and given a
//! session id (the tie-breaker for equal orders). Removing an entity reverses
//! this for the whole subtree and releases its change subscriptions.
//!
//! Structural changes requested during a frame pass are queued with
//! [`Scene::queue_end_of_frame_action`] and applied after the update pass.
//!
//! ## Frame passes
//!
//! See [`Scene::update`] and [`Scene::draw`].

mod component;
mod context;
mod error;
mod frame;
mod layers;
mod query;
mod registry;

pub use component::{AsAny, Capabilities, Component, ComponentDescriptor, ModuleDescriptor, SceneModule};
pub use context::{AsyncUpdateContext, DrawContext, EndOfFrameAction, ModuleContext, UpdateContext};
pub use error::{BoxedError, ComponentResult, FramePhase, SceneError, SceneResult};
pub use frame::{DrawStats, UpdateStats};
pub use layers::Layers;
pub use registry::DependencyRegistry;

use std::fmt;

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, info};

use crate::collections::FilterSortCollection;
use crate::core::SceneSettings;
use crate::events::{ChangeEvent, ChangeHandler, ChangeKind};
use crate::foundation::collections::{ComponentId, EntityId, ModuleId, SecondaryMap, SlotMap, SubscriptionId};
use crate::hierarchy::TransformHierarchy;
use crate::spatial::QuadTree;

use context::send_action;
use frame::DrawEntry;

/// (order, session) pair frame collections sort by
type SortKey = (i32, u64);

type ComponentCollection = FilterSortCollection<ComponentId, SceneState, SortKey>;
type ModuleCollection = FilterSortCollection<ModuleId, SlotMap<ModuleId, ModuleRecord>, SortKey>;

#[derive(Debug)]
struct ComponentRecord {
    entity: EntityId,
    descriptor: ComponentDescriptor,
    capabilities: Capabilities,
    session: u64,
    registered: bool,
}

#[derive(Debug)]
struct ModuleRecord {
    descriptor: ModuleDescriptor,
    session: u64,
}

/// State the frame collections filter and sort by
struct SceneState {
    hierarchy: TransformHierarchy,
    records: SlotMap<ComponentId, ComponentRecord>,
    behaviors: SecondaryMap<ComponentId, Box<dyn Component>>,
}

impl SceneState {
    fn updates(&self, id: ComponentId) -> bool {
        self.records.get(id).is_some_and(|record| {
            record.descriptor.enabled && self.hierarchy.is_effectively_enabled(record.entity)
        })
    }

    fn draws(&self, id: ComponentId) -> bool {
        self.records
            .get(id)
            .is_some_and(|record| record.descriptor.enabled && self.hierarchy.is_visible(record.entity))
    }

    fn key(&self, id: ComponentId, order: impl Fn(&ComponentDescriptor) -> i32) -> SortKey {
        self.records
            .get(id)
            .map_or((0, 0), |record| (order(&record.descriptor), record.session))
    }
}

/// 2D scene: entity forest, frame collections and culling index
pub struct Scene {
    state: SceneState,

    updateables: ComponentCollection,
    async_updateables: ComponentCollection,
    drawables: ComponentCollection,
    cameras: ComponentCollection,

    module_records: SlotMap<ModuleId, ModuleRecord>,
    module_behaviors: SecondaryMap<ModuleId, Box<dyn SceneModule>>,
    modules: ModuleCollection,

    roots: Vec<EntityId>,
    index: QuadTree<usize>,
    draw_list: Vec<DrawEntry>,

    dependencies: DependencyRegistry,
    settings: SceneSettings,
    action_sender: Sender<EndOfFrameAction>,
    action_receiver: Receiver<EndOfFrameAction>,
    next_session: u64,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(SceneSettings::default())
    }
}

impl Scene {
    /// Create an empty scene
    pub fn new(settings: SceneSettings) -> Self {
        let (action_sender, action_receiver) = unbounded();
        info!(
            "Creating scene ({} pixels per unit, index bounds {:?}..{:?})",
            settings.pixels_per_unit, settings.spatial.bounds.min, settings.spatial.bounds.max
        );

        Self {
            state: SceneState {
                hierarchy: TransformHierarchy::new(),
                records: SlotMap::with_key(),
                behaviors: SecondaryMap::new(),
            },
            updateables: FilterSortCollection::new(SceneState::updates, |state: &SceneState, id| {
                state.key(id, |descriptor| descriptor.update_order)
            }),
            async_updateables: FilterSortCollection::new(SceneState::updates, |state: &SceneState, id| {
                state.key(id, |descriptor| descriptor.update_order)
            }),
            drawables: FilterSortCollection::new(SceneState::draws, |state: &SceneState, id| {
                state.key(id, |descriptor| descriptor.draw_order)
            }),
            cameras: FilterSortCollection::new(SceneState::updates, |state: &SceneState, id| {
                state.key(id, |descriptor| descriptor.render_order)
            }),
            module_records: SlotMap::with_key(),
            module_behaviors: SecondaryMap::new(),
            modules: FilterSortCollection::new(
                |records: &SlotMap<ModuleId, ModuleRecord>, id| {
                    records.get(id).is_some_and(|record| record.descriptor.enabled)
                },
                |records: &SlotMap<ModuleId, ModuleRecord>, id| {
                    records
                        .get(id)
                        .map_or((0, 0), |record| (record.descriptor.update_order, record.session))
                },
            ),
            roots: Vec::new(),
            index: QuadTree::new(settings.spatial.clone()),
            draw_list: Vec::new(),
            dependencies: DependencyRegistry::new(),
            settings,
            action_sender,
            action_receiver,
            next_session: 0,
        }
    }

    /// Scene settings
    pub fn settings(&self) -> &SceneSettings {
        &self.settings
    }

    /// Read access to the transform hierarchy
    pub fn hierarchy(&self) -> &TransformHierarchy {
        &self.state.hierarchy
    }

    /// Transform and subscription access to the hierarchy
    ///
    /// Structural changes go through the scene.
    pub fn hierarchy_mut(&mut self) -> &mut TransformHierarchy {
        &mut self.state.hierarchy
    }

    //--- Entities ---------------------------------------------------------

    /// Create a detached entity
    pub fn create_entity(&mut self, name: impl Into<String>) -> EntityId {
        self.state.hierarchy.create(name)
    }

    /// Live entities without a parent, in the order they were added
    pub fn roots(&self) -> &[EntityId] {
        &self.roots
    }

    /// Whether the entity is part of this scene's live tree
    pub fn is_live(&self, entity: EntityId) -> bool {
        self.state.hierarchy.is_live(entity)
    }

    /// Add an entity (and its subtree) to the scene as a root
    ///
    /// Detaches it from a non-live parent first. Rejected for unknown or
    /// already live entities.
    pub fn add_root(&mut self, entity: EntityId) -> bool {
        if !self.state.hierarchy.contains(entity) {
            return false;
        }
        if self.state.hierarchy.is_live(entity) {
            debug!("Rejected add_root: entity {entity:?} is already in the scene");
            return false;
        }

        if self.state.hierarchy.parent(entity).is_some() {
            self.state.hierarchy.set_parent(entity, None);
        }
        self.roots.push(entity);
        self.register_subtree(entity);
        true
    }

    /// Attach `child` under `parent`
    ///
    /// The child's subtree joins the scene if the parent is live.
    pub fn add_child(&mut self, parent: EntityId, child: EntityId) -> bool {
        self.set_parent(child, Some(parent))
    }

    /// Detach `child` from `parent` and take it out of the scene
    pub fn remove_child(&mut self, parent: EntityId, child: EntityId) -> bool {
        if self.state.hierarchy.parent(child) != Some(parent) {
            return false;
        }

        if self.state.hierarchy.is_live(child) {
            self.remove_entity(child)
        } else {
            self.state.hierarchy.set_parent(child, None)
        }
    }

    /// Re-link an entity under a new parent, or make it a root with `None`
    ///
    /// Rejected (returning false, nothing changed) for unknown entities,
    /// cycles, self-parenting and no-op changes. Liveness follows the new
    /// parent; a live entity detached with `None` stays live as a root.
    pub fn set_parent(&mut self, child: EntityId, parent: Option<EntityId>) -> bool {
        let was_live = self.state.hierarchy.is_live(child);
        let will_be_live = match parent {
            Some(parent) => self.state.hierarchy.is_live(parent),
            None => was_live,
        };

        if !self.state.hierarchy.set_parent(child, parent) {
            return false;
        }

        match parent {
            Some(_) => self.roots.retain(|root| *root != child),
            None if will_be_live => self.roots.push(child),
            None => {}
        }

        match (was_live, will_be_live) {
            (false, true) => self.register_subtree(child),
            (true, false) => self.unregister_subtree(child),
            _ => self.refresh_subtree(child),
        }
        true
    }

    /// Take an entity and its subtree out of the scene
    ///
    /// Components are unregistered and every change subscription of the
    /// subtree is released. The entities still exist and may be added again.
    pub fn remove_entity(&mut self, entity: EntityId) -> bool {
        if !self.state.hierarchy.is_live(entity) {
            return false;
        }

        if self.state.hierarchy.parent(entity).is_some() {
            self.state.hierarchy.set_parent(entity, None);
        } else {
            self.roots.retain(|root| *root != entity);
        }

        self.unregister_subtree(entity);
        true
    }

    /// Remove an entity from the scene and free it, its subtree and their
    /// components
    pub fn destroy_entity(&mut self, entity: EntityId) -> bool {
        if !self.state.hierarchy.contains(entity) {
            return false;
        }

        if self.state.hierarchy.is_live(entity) {
            self.remove_entity(entity);
        } else if self.state.hierarchy.parent(entity).is_some() {
            self.state.hierarchy.set_parent(entity, None);
        }

        // Children come after their parent in pre-order, so reversed order
        // frees leaves first
        for id in self.state.hierarchy.subtree(entity).into_iter().rev() {
            self.state.hierarchy.release_subscriptions(id);
            self.state.hierarchy.set_parent(id, None);

            for component in self.state.hierarchy.components(id).to_vec() {
                self.remove_component(component);
            }
            self.state.hierarchy.destroy(id);
        }

        debug!("Destroyed entity {entity:?}");
        true
    }

    /// Set an entity's own enabled flag
    ///
    /// Components of every entity whose effective state flipped enter or
    /// leave the frame collections.
    pub fn set_entity_enabled(&mut self, entity: EntityId, enabled: bool) -> SceneResult<()> {
        if !self.state.hierarchy.contains(entity) {
            return Err(SceneError::UnknownEntity(entity));
        }

        for changed in self.state.hierarchy.set_enabled(entity, enabled) {
            self.refresh_entity(changed);
        }
        Ok(())
    }

    /// Set an entity's visibility flag
    pub fn set_entity_visible(&mut self, entity: EntityId, visible: bool) -> SceneResult<()> {
        if !self.state.hierarchy.contains(entity) {
            return Err(SceneError::UnknownEntity(entity));
        }

        if self.state.hierarchy.set_visible(entity, visible) {
            self.refresh_entity(entity);
        }
        Ok(())
    }

    /// Register a change handler on an entity
    pub fn subscribe(
        &mut self,
        entity: EntityId,
        kind: ChangeKind,
        handler: impl FnMut(&ChangeEvent) + Send + 'static,
    ) -> SceneResult<SubscriptionId> {
        self.subscribe_handler(entity, kind, handler)
    }

    /// Register a [`ChangeHandler`] implementation on an entity
    pub fn subscribe_handler(
        &mut self,
        entity: EntityId,
        kind: ChangeKind,
        handler: impl ChangeHandler + 'static,
    ) -> SceneResult<SubscriptionId> {
        self.state
            .hierarchy
            .subscribe(entity, kind, handler)
            .ok_or(SceneError::UnknownEntity(entity))
    }

    /// Remove a change handler
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.state.hierarchy.unsubscribe(id)
    }

    //--- Components -------------------------------------------------------

    /// Attach a component with a descriptor named after its type
    pub fn add_component<C: Component>(&mut self, entity: EntityId, component: C) -> SceneResult<ComponentId> {
        self.add_component_with(entity, component, ComponentDescriptor::for_type::<C>())
    }

    /// Attach a component with explicit metadata
    ///
    /// Registered at once if the entity is live.
    pub fn add_component_with<C: Component>(
        &mut self,
        entity: EntityId,
        component: C,
        descriptor: ComponentDescriptor,
    ) -> SceneResult<ComponentId> {
        self.add_boxed_component(entity, Box::new(component), descriptor)
    }

    /// Attach an already boxed component
    pub fn add_boxed_component(
        &mut self,
        entity: EntityId,
        component: Box<dyn Component>,
        descriptor: ComponentDescriptor,
    ) -> SceneResult<ComponentId> {
        if !self.state.hierarchy.contains(entity) {
            return Err(SceneError::UnknownEntity(entity));
        }

        let id = self.state.records.insert(ComponentRecord {
            entity,
            descriptor,
            capabilities: component.capabilities(),
            session: 0,
            registered: false,
        });
        self.state.behaviors.insert(id, component);
        self.state.hierarchy.attach_component(entity, id);

        if self.state.hierarchy.is_live(entity) {
            self.register_component(id);
        }
        Ok(id)
    }

    /// Detach a component, handing it back; `None` for unknown ids
    pub fn remove_component(&mut self, id: ComponentId) -> Option<Box<dyn Component>> {
        let entity = self.state.records.get(id)?.entity;

        self.unregister_component(id);
        self.state.hierarchy.detach_component(entity, id);
        self.state.records.remove(id);
        self.state.behaviors.remove(id)
    }

    /// Metadata of a component
    pub fn descriptor(&self, id: ComponentId) -> Option<&ComponentDescriptor> {
        self.state.records.get(id).map(|record| &record.descriptor)
    }

    /// Capabilities a component reported when added
    pub fn capabilities(&self, id: ComponentId) -> Option<Capabilities> {
        self.state.records.get(id).map(|record| record.capabilities)
    }

    /// Whether the component is registered in the live scene
    pub fn is_registered(&self, id: ComponentId) -> bool {
        self.state.records.get(id).is_some_and(|record| record.registered)
    }

    /// Set a component's own enabled flag
    pub fn set_component_enabled(&mut self, id: ComponentId, enabled: bool) -> SceneResult<()> {
        let descriptor = self.descriptor_mut(id)?;
        if descriptor.enabled != enabled {
            descriptor.enabled = enabled;
            self.refresh_component(id);
        }
        Ok(())
    }

    /// Move a component within the update pass, effective next pass
    pub fn set_update_order(&mut self, id: ComponentId, order: i32) -> SceneResult<()> {
        self.descriptor_mut(id)?.update_order = order;
        self.updateables.on_sort_key_changed(&self.state, id);
        self.async_updateables.on_sort_key_changed(&self.state, id);
        Ok(())
    }

    /// Move a drawable within each camera's draw calls
    pub fn set_draw_order(&mut self, id: ComponentId, order: i32) -> SceneResult<()> {
        self.descriptor_mut(id)?.draw_order = order;
        self.drawables.on_sort_key_changed(&self.state, id);
        Ok(())
    }

    /// Move a camera among cameras
    pub fn set_render_order(&mut self, id: ComponentId, order: i32) -> SceneResult<()> {
        self.descriptor_mut(id)?.render_order = order;
        self.cameras.on_sort_key_changed(&self.state, id);
        Ok(())
    }

    /// Set the layers a drawable lives on
    pub fn set_layers(&mut self, id: ComponentId, layers: Layers) -> SceneResult<()> {
        self.descriptor_mut(id)?.layers = layers;
        Ok(())
    }

    /// Set the layers a camera renders
    pub fn set_render_layers(&mut self, id: ComponentId, layers: Layers) -> SceneResult<()> {
        self.descriptor_mut(id)?.render_layers = layers;
        Ok(())
    }

    /// Synchronous updateables in update order
    pub fn updateables(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.updateables.iter()
    }

    /// Concurrent updateables in update order
    pub fn async_updateables(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.async_updateables.iter()
    }

    /// Visible drawables in draw order
    pub fn drawables(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.drawables.iter()
    }

    /// Enabled cameras in render order
    pub fn cameras(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.cameras.iter()
    }

    //--- Modules ----------------------------------------------------------

    /// Add a scene module named after its type
    pub fn add_module<M: SceneModule>(&mut self, module: M) -> ModuleId {
        self.add_module_with(module, ModuleDescriptor::for_type::<M>())
    }

    /// Add a scene module with explicit metadata
    pub fn add_module_with<M: SceneModule>(&mut self, module: M, descriptor: ModuleDescriptor) -> ModuleId {
        debug!("Adding module '{}'", descriptor.name);

        let session = self.next_session();
        let id = self.module_records.insert(ModuleRecord { descriptor, session });
        self.module_behaviors.insert(id, Box::new(module));
        self.modules.add(&self.module_records, id);
        id
    }

    /// Remove a module, handing it back
    pub fn remove_module(&mut self, id: ModuleId) -> Option<Box<dyn SceneModule>> {
        let record = self.module_records.remove(id)?;
        debug!("Removed module '{}'", record.descriptor.name);

        self.modules.remove(id);
        self.module_behaviors.remove(id)
    }

    /// Metadata of a module
    pub fn module_descriptor(&self, id: ModuleId) -> Option<&ModuleDescriptor> {
        self.module_records.get(id).map(|record| &record.descriptor)
    }

    /// Enable or disable a module
    pub fn set_module_enabled(&mut self, id: ModuleId, enabled: bool) -> SceneResult<()> {
        let record = self.module_records.get_mut(id).ok_or(SceneError::UnknownModule(id))?;
        record.descriptor.enabled = enabled;
        self.modules.on_filter_changed(&self.module_records, id);
        Ok(())
    }

    /// Move a module among modules
    pub fn set_module_update_order(&mut self, id: ModuleId, order: i32) -> SceneResult<()> {
        let record = self.module_records.get_mut(id).ok_or(SceneError::UnknownModule(id))?;
        record.descriptor.update_order = order;
        self.modules.on_sort_key_changed(&self.module_records, id);
        Ok(())
    }

    /// Typed access to a module
    pub fn module<T: SceneModule>(&self, id: ModuleId) -> Option<&T> {
        let module: &dyn SceneModule = &**self.module_behaviors.get(id)?;
        module.as_any().downcast_ref::<T>()
    }

    /// Typed mutable access to a module
    pub fn module_mut<T: SceneModule>(&mut self, id: ModuleId) -> Option<&mut T> {
        let module: &mut dyn SceneModule = &mut **self.module_behaviors.get_mut(id)?;
        module.as_any_mut().downcast_mut::<T>()
    }

    //--- Scene services ---------------------------------------------------

    /// Scene-scoped singleton, created with `Default` on first use
    pub fn resolve_dependency<T: Default + Send + 'static>(&mut self) -> Option<&mut T> {
        self.dependencies.resolve::<T>()
    }

    /// Scene-scoped singleton, created by `factory` on first use
    pub fn resolve_dependency_with<T: Send + 'static>(
        &mut self,
        factory: impl FnOnce() -> T,
    ) -> Option<&mut T> {
        self.dependencies.resolve_with(factory)
    }

    /// Defer a scene mutation to the end of the next update pass
    ///
    /// Actions run in the order they were queued.
    pub fn queue_end_of_frame_action(&self, action: impl FnOnce(&mut Scene) + Send + 'static) {
        send_action(&self.action_sender, Box::new(action));
    }

    /// Number of queued end-of-frame actions
    pub fn pending_end_of_frame_actions(&self) -> usize {
        self.action_receiver.len()
    }

    //--- Registration -----------------------------------------------------

    fn next_session(&mut self) -> u64 {
        let session = self.next_session;
        self.next_session += 1;
        session
    }

    fn register_subtree(&mut self, entity: EntityId) {
        for id in self.state.hierarchy.subtree(entity) {
            self.state.hierarchy.set_live(id, true);
            for component in self.state.hierarchy.components(id).to_vec() {
                self.register_component(component);
            }
            debug!("Entity '{}' joined the scene", self.state.hierarchy.name(id).unwrap_or_default());
        }
    }

    fn unregister_subtree(&mut self, entity: EntityId) {
        for id in self.state.hierarchy.subtree(entity) {
            for component in self.state.hierarchy.components(id).to_vec() {
                self.unregister_component(component);
            }
            self.state.hierarchy.set_live(id, false);
            let released = self.state.hierarchy.release_subscriptions(id);
            debug!(
                "Entity '{}' left the scene ({released} subscriptions released)",
                self.state.hierarchy.name(id).unwrap_or_default()
            );
        }
    }

    fn register_component(&mut self, id: ComponentId) {
        let session = self.next_session;
        let Some(record) = self.state.records.get_mut(id) else {
            return;
        };
        if record.registered {
            debug!("Rejected registration: component '{}' is already registered", record.descriptor.name);
            return;
        }

        record.registered = true;
        record.session = session;
        self.next_session += 1;

        let (entity, capabilities) = (record.entity, record.capabilities);
        if capabilities.contains(Capabilities::ASYNC_UPDATE) {
            self.async_updateables.add(&self.state, id);
        } else if capabilities.contains(Capabilities::UPDATE) {
            self.updateables.add(&self.state, id);
        }
        if capabilities.contains(Capabilities::DRAW) {
            self.drawables.add(&self.state, id);
        }
        if capabilities.contains(Capabilities::CAMERA) {
            self.cameras.add(&self.state, id);
        }

        if let Some(behavior) = self.state.behaviors.get_mut(id) {
            behavior.on_attached(entity);
        }
    }

    fn unregister_component(&mut self, id: ComponentId) {
        let Some(record) = self.state.records.get_mut(id) else {
            return;
        };
        if !record.registered {
            return;
        }
        record.registered = false;

        self.updateables.remove(id);
        self.async_updateables.remove(id);
        self.drawables.remove(id);
        self.cameras.remove(id);

        if let Some(behavior) = self.state.behaviors.get_mut(id) {
            behavior.on_detached();
        }
    }

    fn refresh_component(&mut self, id: ComponentId) {
        self.updateables.on_filter_changed(&self.state, id);
        self.async_updateables.on_filter_changed(&self.state, id);
        self.drawables.on_filter_changed(&self.state, id);
        self.cameras.on_filter_changed(&self.state, id);
    }

    fn refresh_entity(&mut self, entity: EntityId) {
        for component in self.state.hierarchy.components(entity).to_vec() {
            self.refresh_component(component);
        }
    }

    fn refresh_subtree(&mut self, entity: EntityId) {
        for id in self.state.hierarchy.subtree(entity) {
            self.refresh_entity(id);
        }
    }

    fn descriptor_mut(&mut self, id: ComponentId) -> SceneResult<&mut ComponentDescriptor> {
        self.state
            .records
            .get_mut(id)
            .map(|record| &mut record.descriptor)
            .ok_or(SceneError::UnknownComponent(id))
    }
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("entities", &self.state.hierarchy.len())
            .field("components", &self.state.records.len())
            .field("roots", &self.roots.len())
            .field("updateables", &self.updateables)
            .field("async_updateables", &self.async_updateables)
            .field("drawables", &self.drawables)
            .field("cameras", &self.cameras)
            .field("modules", &self.modules)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec2;
    use std::sync::{Arc, Mutex};

    struct Updater;

    impl Component for Updater {
        fn capabilities(&self) -> Capabilities {
            Capabilities::UPDATE
        }
    }

    #[derive(Default)]
    struct Lifecycle {
        events: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Component for Lifecycle {
        fn capabilities(&self) -> Capabilities {
            Capabilities::UPDATE | Capabilities::DRAW
        }

        fn on_attached(&mut self, _entity: EntityId) {
            self.events.lock().unwrap().push("attached");
        }

        fn on_detached(&mut self) {
            self.events.lock().unwrap().push("detached");
        }
    }

    fn live_entity(scene: &mut Scene, name: &str) -> EntityId {
        let entity = scene.create_entity(name);
        assert!(scene.add_root(entity));
        entity
    }

    #[test]
    fn test_components_register_when_entity_becomes_live() {
        let mut scene = Scene::default();
        let parent = scene.create_entity("parent");
        let child = scene.create_entity("child");
        let component = scene.add_component(child, Updater).unwrap();

        assert!(scene.add_child(parent, child));
        assert!(!scene.is_registered(component));
        assert_eq!(scene.updateables().count(), 0);

        assert!(scene.add_root(parent));
        assert!(scene.is_live(child));
        assert!(scene.is_registered(component));
        assert_eq!(scene.updateables().collect::<Vec<_>>(), vec![component]);
    }

    #[test]
    fn test_add_root_twice_is_rejected() {
        let mut scene = Scene::default();
        let entity = live_entity(&mut scene, "root");

        assert!(!scene.add_root(entity));
        assert_eq!(scene.roots(), &[entity]);
    }

    #[test]
    fn test_add_component_to_unknown_entity_fails() {
        let mut scene = Scene::default();
        let entity = scene.create_entity("doomed");
        scene.destroy_entity(entity);

        let result = scene.add_component(entity, Updater);
        assert!(matches!(result, Err(SceneError::UnknownEntity(id)) if id == entity));
    }

    #[test]
    fn test_remove_entity_unregisters_and_releases_subscriptions() {
        let mut scene = Scene::default();
        let root = live_entity(&mut scene, "root");
        let child = scene.create_entity("child");
        scene.add_child(root, child);

        let events = Arc::new(Mutex::new(Vec::new()));
        let component = scene
            .add_component(child, Lifecycle { events: Arc::clone(&events) })
            .unwrap();
        scene.subscribe(child, ChangeKind::TransformChanged, |_: &ChangeEvent| {}).unwrap();
        scene.subscribe(root, ChangeKind::ParentChanged, |_: &ChangeEvent| {}).unwrap();

        assert!(scene.remove_entity(root));
        assert!(!scene.is_live(child));
        assert!(scene.roots().is_empty());
        assert_eq!(scene.hierarchy().subscription_count(child), 0);
        assert_eq!(scene.hierarchy().subscription_count(root), 0);
        assert_eq!(scene.updateables().count(), 0);
        assert_eq!(scene.drawables().count(), 0);
        assert_eq!(*events.lock().unwrap(), vec!["attached", "detached"]);

        // Still attached to its entity and registered again on re-add
        assert!(scene.add_root(root));
        assert!(scene.is_registered(component));
        assert_eq!(*events.lock().unwrap(), vec!["attached", "detached", "attached"]);
    }

    #[test]
    fn test_remove_child_takes_subtree_out_of_scene() {
        let mut scene = Scene::default();
        let root = live_entity(&mut scene, "root");
        let child = scene.create_entity("child");
        scene.add_child(root, child);
        let component = scene.add_component(child, Updater).unwrap();

        assert!(!scene.remove_child(child, root));
        assert!(scene.remove_child(root, child));
        assert!(!scene.is_live(child));
        assert!(!scene.is_registered(component));
        assert!(scene.hierarchy().children(root).is_empty());
    }

    #[test]
    fn test_set_parent_none_keeps_live_entity_as_root() {
        let mut scene = Scene::default();
        let root = live_entity(&mut scene, "root");
        let child = scene.create_entity("child");
        scene.add_child(root, child);

        assert!(scene.set_parent(child, None));
        assert!(scene.is_live(child));
        assert_eq!(scene.roots(), &[root, child]);

        assert!(scene.set_parent(child, Some(root)));
        assert_eq!(scene.roots(), &[root]);
    }

    #[test]
    fn test_cycle_is_rejected_through_scene() {
        let mut scene = Scene::default();
        let root = live_entity(&mut scene, "root");
        let child = scene.create_entity("child");
        scene.add_child(root, child);

        assert!(!scene.add_child(child, root));
        assert_eq!(scene.roots(), &[root]);
        assert_eq!(scene.hierarchy().parent(child), Some(root));
    }

    #[test]
    fn test_disabling_parent_hides_child_components() {
        let mut scene = Scene::default();
        let root = live_entity(&mut scene, "root");
        let child = scene.create_entity("child");
        scene.add_child(root, child);
        let component = scene.add_component(child, Updater).unwrap();

        scene.set_entity_enabled(root, false).unwrap();
        assert_eq!(scene.updateables().count(), 0);
        assert!(scene.is_registered(component));

        scene.set_entity_enabled(root, true).unwrap();
        assert_eq!(scene.updateables().collect::<Vec<_>>(), vec![component]);

        scene.set_component_enabled(component, false).unwrap();
        assert_eq!(scene.updateables().count(), 0);
    }

    #[test]
    fn test_reparent_under_disabled_parent_refreshes_membership() {
        let mut scene = Scene::default();
        let enabled = live_entity(&mut scene, "enabled");
        let disabled = live_entity(&mut scene, "disabled");
        scene.set_entity_enabled(disabled, false).unwrap();

        let child = scene.create_entity("child");
        scene.add_child(enabled, child);
        scene.add_component(child, Updater).unwrap();
        assert_eq!(scene.updateables().count(), 1);

        scene.add_child(disabled, child);
        assert_eq!(scene.updateables().count(), 0);
    }

    #[test]
    fn test_destroy_entity_frees_subtree() {
        let mut scene = Scene::default();
        let root = live_entity(&mut scene, "root");
        let child = scene.create_entity("child");
        scene.add_child(root, child);
        let component = scene.add_component(child, Updater).unwrap();

        assert!(scene.destroy_entity(root));
        assert!(!scene.hierarchy().contains(root));
        assert!(!scene.hierarchy().contains(child));
        assert!(scene.descriptor(component).is_none());
        assert!(scene.hierarchy().is_empty());
        assert!(!scene.destroy_entity(root));
    }

    #[test]
    fn test_visibility_only_affects_drawables() {
        let mut scene = Scene::default();
        let entity = live_entity(&mut scene, "entity");
        let component = scene.add_component(entity, Lifecycle::default()).unwrap();

        scene.set_entity_visible(entity, false).unwrap();
        assert_eq!(scene.drawables().count(), 0);
        assert_eq!(scene.updateables().collect::<Vec<_>>(), vec![component]);
    }

    #[test]
    fn test_unknown_ids_are_errors_for_setters() {
        let mut scene = Scene::default();
        let entity = live_entity(&mut scene, "entity");
        let component = scene.add_component(entity, Updater).unwrap();
        scene.remove_component(component);

        assert!(matches!(scene.set_update_order(component, 1), Err(SceneError::UnknownComponent(_))));
        assert!(scene.remove_component(component).is_none());
        assert!(scene.hierarchy().components(entity).is_empty());
    }

    #[test]
    fn test_transform_changes_through_hierarchy_mut() {
        let mut scene = Scene::default();
        let entity = live_entity(&mut scene, "entity");

        scene.hierarchy_mut().set_local_position(entity, Vec2::new(2.0, 3.0));
        assert_eq!(scene.hierarchy().world_transform(entity).unwrap().position(), Vec2::new(2.0, 3.0));
    }
}
