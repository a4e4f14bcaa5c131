//! Headless scene demo
//!
//! Drives a small asteroid field for a fixed number of frames: a ship with a
//! turret child, drifting rocks simulated concurrently, and a camera that
//! follows the ship. Pass a `.toml` or `.ron` runtime config path as the
//! first argument to override the defaults.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use scene_runtime::foundation::logging;
use scene_runtime::foundation::math::TAU;
use scene_runtime::prelude::*;

/// Demo errors
#[derive(thiserror::Error, Debug)]
enum DemoError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),
}

/// Draw calls issued during the run, shared through the scene registry
#[derive(Default)]
struct DrawCounter(Arc<AtomicU64>);

/// Flies the ship in a slow circle
struct Pilot {
    radius: f32,
    angular_speed: f32,
    angle: f32,
}

impl Component for Pilot {
    fn capabilities(&self) -> Capabilities {
        Capabilities::UPDATE
    }

    fn update(&mut self, ctx: &mut UpdateContext<'_>) -> ComponentResult {
        self.angle += self.angular_speed * ctx.frame().delta_seconds();
        let position = Vec2::new(self.angle.cos(), self.angle.sin()) * self.radius;

        let entity = ctx.entity();
        let hierarchy = ctx.hierarchy_mut();
        hierarchy.set_local_position(entity, position);
        hierarchy.set_local_rotation(entity, self.angle);
        Ok(())
    }
}

/// Drifts a rock; runs on a worker thread and applies its step at the end
/// of the frame
struct Drift {
    velocity: Vec2,
}

impl Component for Drift {
    fn capabilities(&self) -> Capabilities {
        Capabilities::ASYNC_UPDATE
    }

    fn update_async(&mut self, ctx: &AsyncUpdateContext<'_>) -> ComponentResult {
        let entity = ctx.entity();
        let target = ctx.world_transform().position() + self.velocity * ctx.frame().delta_seconds();
        ctx.queue_end_of_frame_action(move |scene| {
            scene.hierarchy_mut().set_world_position(entity, target);
        });
        Ok(())
    }
}

/// Square sprite that only counts its draw calls
struct Sprite {
    half_size: f32,
    draws: Arc<AtomicU64>,
}

impl Component for Sprite {
    fn capabilities(&self) -> Capabilities {
        Capabilities::DRAW
    }

    fn local_bounds(&self) -> BoundingArea {
        BoundingArea::from_center_extents(Vec2::zeros(), Vec2::new(self.half_size, self.half_size))
    }

    fn draw(&mut self, _ctx: &DrawContext<'_>) -> ComponentResult {
        self.draws.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Camera with a fixed view size in world units
struct FollowCamera {
    extents: Vec2,
}

impl Component for FollowCamera {
    fn capabilities(&self) -> Capabilities {
        Capabilities::CAMERA
    }

    fn view_bounds(&self) -> BoundingArea {
        BoundingArea::from_center_extents(Vec2::zeros(), self.extents)
    }
}

/// Keeps the camera entity on top of the ship after components ran
struct CameraRig {
    camera: EntityId,
    target: EntityId,
}

impl SceneModule for CameraRig {
    fn post_update(&mut self, ctx: &mut ModuleContext<'_>) -> ComponentResult {
        let hierarchy = ctx.hierarchy_mut();
        if let Some(target) = hierarchy.world_transform(self.target) {
            hierarchy.set_world_position(self.camera, target.position());
        }
        Ok(())
    }
}

struct DemoApp {
    config: RuntimeConfig,
    scene: Scene,
    draws: Arc<AtomicU64>,
}

impl DemoApp {
    fn new(config: RuntimeConfig) -> Self {
        let scene = Scene::new(config.scene.clone());
        Self {
            config,
            scene,
            draws: Arc::default(),
        }
    }

    fn initialize(&mut self) -> Result<(), DemoError> {
        log::info!("Building demo scene...");
        let draws = Arc::clone(&self.draws);
        self.scene.resolve_dependency_with(|| DrawCounter(Arc::clone(&draws)));

        let ship = self.scene.create_entity("ship");
        let turret = self.scene.create_entity("turret");
        self.scene.add_root(ship);
        self.scene.add_child(ship, turret);
        self.scene
            .hierarchy_mut()
            .set_local_position(turret, Vec2::new(0.0, 0.75));

        self.scene.add_component(
            ship,
            Pilot {
                radius: 20.0,
                angular_speed: 0.5,
                angle: 0.0,
            },
        )?;
        self.add_sprite(ship, "hull", 1.0, 0)?;
        self.add_sprite(turret, "turret", 0.25, 1)?;

        let field = self.scene.create_entity("field");
        self.scene.add_root(field);
        for index in 0..16u8 {
            let rock = self.scene.create_entity(format!("rock{index}"));
            self.scene.add_child(field, rock);

            let angle = f32::from(index) * TAU / 16.0;
            let direction = Vec2::new(angle.cos(), angle.sin());
            self.scene
                .hierarchy_mut()
                .set_local_position(rock, direction * 30.0);

            self.scene.add_component(rock, Drift { velocity: direction * -2.0 })?;
            self.add_sprite(rock, "rock", 1.5, -1)?;
        }

        let camera = self.scene.create_entity("camera");
        self.scene.add_root(camera);
        self.scene.add_component(
            camera,
            FollowCamera {
                extents: Vec2::new(16.0, 9.0),
            },
        )?;
        self.scene.add_module(CameraRig { camera, target: ship });

        log::info!(
            "Scene ready: {} entities, {} drawables",
            self.scene.hierarchy().len(),
            self.scene.drawables().count()
        );
        Ok(())
    }

    fn add_sprite(&mut self, entity: EntityId, name: &str, half_size: f32, draw_order: i32) -> Result<(), DemoError> {
        let sprite = Sprite {
            half_size,
            draws: Arc::clone(&self.draws),
        };
        self.scene
            .add_component_with(entity, sprite, ComponentDescriptor::named(name).with_draw_order(draw_order))?;
        Ok(())
    }

    fn run(&mut self) -> Result<(), DemoError> {
        let frames = u64::from(self.config.frames);
        log::info!("Running {frames} frames at {:.4}s per frame", self.config.fixed_timestep);

        for index in 0..frames {
            let frame = FrameTime::fixed(self.config.fixed_timestep, index);
            let update = self.scene.update(&frame)?;
            let draw = self.scene.draw(&frame)?;

            if index % 30 == 0 {
                log::debug!("Frame {index}: {update:?} {draw:?}");
            }
        }

        let total = self
            .scene
            .resolve_dependency::<DrawCounter>()
            .map_or(0, |counter| counter.0.load(Ordering::Relaxed));
        log::info!("Finished {frames} frames, {total} draw calls");
        Ok(())
    }
}

fn load_config_from(path: Option<String>) -> Result<RuntimeConfig, DemoError> {
    let config = match path {
        Some(path) => RuntimeConfig::load_from_file(path)?,
        None => RuntimeConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

/// Log a failure before handing it back to the caller
fn logged<T>(result: Result<T, DemoError>, what: &str) -> Result<T, DemoError> {
    if let Err(error) = &result {
        log::error!("{what} failed: {error}");
    }
    result
}

fn main() -> Result<(), DemoError> {
    let config = match load_config_from(std::env::args().nth(1)) {
        Ok(config) => config,
        Err(error) => {
            // The configured filter is unknown, fall back to the default one
            logging::init_with_filter(&RuntimeConfig::default().log_level);
            return logged(Err(error), "Loading configuration");
        }
    };
    logging::init_with_filter(&config.log_level);

    let mut app = DemoApp::new(config);
    logged(app.initialize(), "Scene setup")?;
    logged(app.run(), "Frame loop")
}
