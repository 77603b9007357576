use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::assets::AssetStore;

use super::camera::{Camera, Viewport, DEFAULT_CAMERA_MARGIN};
use super::clock::{Clock, FrameTime, DEFAULT_MAX_FRAME_DELTA};
use super::input::{InputEvent, InputQueue};
use super::rendering::{draw_entity, Canvas, RenderError, TextureLoader};
use super::scene::{
    ActivationContext, Scene, SceneCommand, SceneError, SceneKey, SceneMachine, SceneWorld,
};

const DEFAULT_CLEAR_COLOR: [u8; 4] = [20, 22, 28, 255];

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub camera_margin: f32,
    pub max_frame_delta: Duration,
    pub clear_color: [u8; 4],
    /// Fixed seed for camera shake; `None` seeds from entropy.
    pub camera_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            camera_margin: DEFAULT_CAMERA_MARGIN,
            max_frame_delta: DEFAULT_MAX_FRAME_DELTA,
            clear_color: DEFAULT_CLEAR_COLOR,
            camera_seed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Continue,
    Quit,
}

/// Drives one scene machine frame by frame: time, input, scene update,
/// entity update and expiry sweep, then rendering.
pub struct Engine {
    config: EngineConfig,
    clock: Clock,
    now: Duration,
    camera: Camera,
    input: InputQueue,
    assets: AssetStore,
    scenes: SceneMachine,
}

impl Engine {
    pub fn new(config: EngineConfig, assets: AssetStore, viewport: Viewport) -> Self {
        Self::starting_at(config, assets, viewport, Instant::now())
    }

    pub fn starting_at(
        config: EngineConfig,
        assets: AssetStore,
        viewport: Viewport,
        origin: Instant,
    ) -> Self {
        let camera = match config.camera_seed {
            Some(seed) => Camera::with_seed(viewport, seed),
            None => Camera::new(viewport),
        }
        .with_fallback_margin(config.camera_margin);
        Self {
            clock: Clock::starting_at(origin, config.max_frame_delta),
            now: Duration::ZERO,
            camera,
            input: InputQueue::default(),
            assets,
            scenes: SceneMachine::default(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn register_scene(&mut self, key: SceneKey, scene: Box<dyn Scene>) -> Result<(), SceneError> {
        self.scenes.register(key, scene)
    }

    pub fn active_scene(&self) -> Option<SceneKey> {
        self.scenes.active_key()
    }

    pub fn active_world(&self) -> Option<&SceneWorld> {
        self.scenes.active_world()
    }

    pub fn scenes(&self) -> &SceneMachine {
        &self.scenes
    }

    pub fn entity_count(&self) -> usize {
        self.active_world()
            .map(|world| world.entities().len())
            .unwrap_or(0)
    }

    /// Activates `key`, then fits the camera to its level and player.
    pub fn activate_scene(
        &mut self,
        key: SceneKey,
        textures: &mut dyn TextureLoader,
    ) -> Result<(), SceneError> {
        let mut ctx = ActivationContext {
            assets: &mut self.assets,
            textures,
        };
        self.scenes.activate(key, &mut ctx)?;
        self.fit_camera_to_active_world();
        Ok(())
    }

    fn fit_camera_to_active_world(&mut self) {
        let Some(world) = self.scenes.active_world() else {
            return;
        };
        self.camera.stop_shake();
        match world.level() {
            Some(level) => self.camera.set_world_bounds(level.bounds()),
            None => self.camera.clear_world_bounds(),
        }
        if let Some(center) = world.player_center() {
            self.camera.center_on(center);
        }
    }

    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.camera.set_viewport(viewport);
    }

    pub fn process_frame(&mut self, textures: &mut dyn TextureLoader) -> FrameOutcome {
        self.process_frame_at(Instant::now(), textures)
    }

    /// Runs one frame for a clock sample. Entity updates and the expiry sweep
    /// always finish before the frame is rendered.
    pub fn process_frame_at(
        &mut self,
        sample: Instant,
        textures: &mut dyn TextureLoader,
    ) -> FrameOutcome {
        let time = self.clock.tick_at(sample);
        self.now = time.now;
        let input = self.input.drain_snapshot();
        if input.quit_requested() {
            info!(scene = ?self.active_scene().map(|key| key.0), "quit_requested");
            return FrameOutcome::Quit;
        }

        let command = self.scenes.process_active(time, &input, &mut self.camera);
        let outcome = match command {
            SceneCommand::None => FrameOutcome::Continue,
            SceneCommand::Quit => {
                info!(scene = ?self.active_scene().map(|key| key.0), "scene_requested_quit");
                FrameOutcome::Quit
            }
            SceneCommand::SwitchTo(next) => {
                if let Err(error) = self.activate_scene(next, textures) {
                    warn!(
                        target_scene = %next,
                        error = %error,
                        "scene_switch_failed"
                    );
                }
                FrameOutcome::Continue
            }
        };

        self.advance_world(&time);
        outcome
    }

    fn advance_world(&mut self, time: &FrameTime) {
        let Some(world) = self.scenes.active_world_mut() else {
            self.camera.update(time.delta);
            return;
        };
        if let Some(center) = world.player_center() {
            self.camera.look_at(center);
        }
        self.camera.update(time.delta);

        world.entities_mut().update_all(time);
        let expired = world.entities_mut().sweep_expired(time.now);
        if !expired.is_empty() {
            debug!(
                count = expired.len(),
                remaining = world.entities().len(),
                "entities_expired"
            );
        }
    }

    /// Clears, lets the active scene draw terrain and player, draws the
    /// remaining entities in id order, then presents.
    pub fn render_frame(&mut self, canvas: &mut dyn Canvas) -> Result<(), RenderError> {
        canvas.clear(self.config.clear_color);
        self.scenes.render_active(canvas, &mut self.camera);
        if let Some(world) = self.scenes.active_world() {
            let player = world.player_id();
            for entity in world.entities().iter() {
                if Some(entity.id) == player {
                    continue;
                }
                draw_entity(canvas, &self.camera, entity);
            }
        }
        canvas.present()
    }

    pub fn shutdown(&mut self, textures: &mut dyn TextureLoader) {
        self.scenes.shutdown(&mut self.assets, textures);
        self.input.clear();
        info!("engine_shutdown");
    }
}
