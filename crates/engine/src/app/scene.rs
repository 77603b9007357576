use std::fmt;

use thiserror::Error;
use tracing::{info, warn};

use crate::assets::{AssetError, AssetStore};

use super::camera::Camera;
use super::clock::FrameTime;
use super::entity::{EntityId, EntityKind, EntitySpawn, EntityTable, Entity};
use super::geometry::{Rect, Vec2};
use super::input::InputSnapshot;
use super::level::Level;
use super::rendering::{draw_entity, paint_level, Canvas, TextureLoader};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SceneKey(pub &'static str);

impl fmt::Display for SceneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneState {
    Inactive,
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    SwitchTo(SceneKey),
    Quit,
}

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("no scene registered as '{key}'")]
    UnknownScene { key: SceneKey },
    #[error("scene '{key}' is already registered")]
    DuplicateScene { key: SceneKey },
    #[error("scene '{key}' failed to activate: {source}")]
    Activation {
        key: SceneKey,
        #[source]
        source: AssetError,
    },
}

/// State owned by one scene: its entities, its level and which entity is the player.
#[derive(Debug, Default)]
pub struct SceneWorld {
    entities: EntityTable,
    level: Option<Level>,
    player: Option<EntityId>,
}

impl SceneWorld {
    pub fn entities(&self) -> &EntityTable {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut EntityTable {
        &mut self.entities
    }

    pub fn spawn(&mut self, spawn: EntitySpawn) -> EntityId {
        self.entities.spawn(spawn)
    }

    pub fn level(&self) -> Option<&Level> {
        self.level.as_ref()
    }

    pub fn set_level(&mut self, level: Level) {
        self.level = Some(level);
    }

    /// Spawns the player, replacing any previous one.
    pub fn spawn_player(&mut self, spawn: EntitySpawn) -> EntityId {
        if let Some(previous) = self.player.take() {
            self.entities.remove(previous);
        }
        let id = self.entities.spawn(EntitySpawn {
            kind: EntityKind::Player,
            ..spawn
        });
        self.player = Some(id);
        id
    }

    pub fn player_id(&self) -> Option<EntityId> {
        self.player
    }

    pub fn player(&self) -> Option<&Entity> {
        self.player.and_then(|id| self.entities.get(id))
    }

    pub fn player_mut(&mut self) -> Option<&mut Entity> {
        self.player.and_then(|id| self.entities.get_mut(id))
    }

    pub fn player_bounds(&self) -> Option<Rect> {
        self.player().and_then(Entity::bounds)
    }

    pub fn player_center(&self) -> Option<Vec2> {
        self.player_bounds().map(|bounds| bounds.center())
    }

    /// Moves the player by `delta`, keeping its rectangle inside the level.
    pub fn move_player(&mut self, delta: Vec2) -> Option<Vec2> {
        let bounds = self.level.as_ref().map(Level::bounds);
        let render = self.player_mut()?.render.as_mut()?;
        let mut next = render.destination.origin() + delta;
        if let Some(bounds) = bounds {
            let max_x = (bounds.right() - render.destination.width).max(bounds.x);
            let max_y = (bounds.bottom() - render.destination.height).max(bounds.y);
            next = Vec2::new(next.x.clamp(bounds.x, max_x), next.y.clamp(bounds.y, max_y));
        }
        render.destination = render.destination.with_origin(next);
        Some(next)
    }

    /// True when the player's center lies inside the level object named `zone`.
    pub fn player_in_zone(&self, zone: &str) -> bool {
        let (Some(level), Some(center)) = (self.level.as_ref(), self.player_center()) else {
            return false;
        };
        level
            .find_object(zone)
            .is_some_and(|object| object.bounds.contains_point(center))
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.level = None;
        self.player = None;
    }
}

/// Services a scene may use while activating.
pub struct ActivationContext<'a> {
    pub assets: &'a mut AssetStore,
    pub textures: &'a mut dyn TextureLoader,
}

/// Everything a scene sees during one frame.
pub struct SceneFrame<'a> {
    pub time: FrameTime,
    pub input: &'a InputSnapshot,
    pub world: &'a mut SceneWorld,
    pub camera: &'a mut Camera,
}

pub trait Scene {
    /// Loads the level and spawns the player into an empty `world`. An error
    /// leaves the scene inactive; whatever was put into `world` is discarded.
    fn activate(
        &mut self,
        ctx: &mut ActivationContext<'_>,
        world: &mut SceneWorld,
    ) -> Result<(), AssetError>;

    fn process_frame(&mut self, frame: &mut SceneFrame<'_>) -> SceneCommand;

    /// Called before the world is cleared.
    fn deactivate(&mut self, _world: &mut SceneWorld) {}

    /// Terrain, then the camera is centred on the player, then the player.
    fn render_frame(&self, world: &SceneWorld, canvas: &mut dyn Canvas, camera: &mut Camera) {
        if let Some(level) = world.level() {
            paint_level(canvas, camera, level);
        }
        if let Some(center) = world.player_center() {
            camera.look_at(center);
        }
        if let Some(player) = world.player() {
            draw_entity(canvas, camera, player);
        }
    }
}

struct SceneSlot {
    key: SceneKey,
    scene: Box<dyn Scene>,
    world: SceneWorld,
    state: SceneState,
}

/// Registered scenes, of which at most one is active.
#[derive(Default)]
pub struct SceneMachine {
    slots: Vec<SceneSlot>,
    active: Option<usize>,
}

impl SceneMachine {
    pub fn register(&mut self, key: SceneKey, scene: Box<dyn Scene>) -> Result<(), SceneError> {
        if self.index_of(key).is_some() {
            return Err(SceneError::DuplicateScene { key });
        }
        self.slots.push(SceneSlot {
            key,
            scene,
            world: SceneWorld::default(),
            state: SceneState::Inactive,
        });
        Ok(())
    }

    fn index_of(&self, key: SceneKey) -> Option<usize> {
        self.slots.iter().position(|slot| slot.key == key)
    }

    pub fn contains(&self, key: SceneKey) -> bool {
        self.index_of(key).is_some()
    }

    pub fn state(&self, key: SceneKey) -> Option<SceneState> {
        self.index_of(key).map(|index| self.slots[index].state)
    }

    pub fn active_key(&self) -> Option<SceneKey> {
        self.active.map(|index| self.slots[index].key)
    }

    pub fn active_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.state == SceneState::Active)
            .count()
    }

    pub fn active_world(&self) -> Option<&SceneWorld> {
        self.active.map(|index| &self.slots[index].world)
    }

    pub fn active_world_mut(&mut self) -> Option<&mut SceneWorld> {
        self.active.map(|index| &mut self.slots[index].world)
    }

    /// Activates `key`. The previous scene is deactivated only after the new one
    /// activated successfully, so a failed activation keeps it live. Assets no
    /// longer referenced by any world are released afterwards.
    pub fn activate(
        &mut self,
        key: SceneKey,
        ctx: &mut ActivationContext<'_>,
    ) -> Result<(), SceneError> {
        let index = self.index_of(key).ok_or(SceneError::UnknownScene { key })?;
        if self.active == Some(index) {
            return Ok(());
        }

        let slot = &mut self.slots[index];
        slot.world.clear();
        if let Err(source) = slot.scene.activate(ctx, &mut slot.world) {
            slot.world.clear();
            ctx.assets.release_unused(ctx.textures);
            warn!(
                scene = %key,
                active = ?self.active_key().map(|active| active.0),
                error = %source,
                "scene_activation_failed"
            );
            return Err(SceneError::Activation { key, source });
        }
        slot.state = SceneState::Active;
        let entities = slot.world.entities().len();

        if let Some(previous) = self.active.replace(index) {
            self.deactivate_slot(previous);
        }
        let released = ctx.assets.release_unused(ctx.textures);
        info!(scene = %key, entities, released, "scene_activated");
        Ok(())
    }

    fn deactivate_slot(&mut self, index: usize) {
        let slot = &mut self.slots[index];
        if slot.state == SceneState::Inactive {
            return;
        }
        slot.scene.deactivate(&mut slot.world);
        slot.world.clear();
        slot.state = SceneState::Inactive;
        info!(scene = %slot.key, "scene_deactivated");
    }

    /// Deactivates the active scene, if any, and releases its assets.
    pub fn deactivate_active(&mut self, assets: &mut AssetStore, textures: &mut dyn TextureLoader) {
        if let Some(index) = self.active.take() {
            self.deactivate_slot(index);
            assets.release_unused(textures);
        }
    }

    pub fn process_active(
        &mut self,
        time: FrameTime,
        input: &InputSnapshot,
        camera: &mut Camera,
    ) -> SceneCommand {
        let Some(index) = self.active else {
            return SceneCommand::None;
        };
        let slot = &mut self.slots[index];
        let mut frame = SceneFrame {
            time,
            input,
            world: &mut slot.world,
            camera,
        };
        slot.scene.process_frame(&mut frame)
    }

    pub fn render_active(&self, canvas: &mut dyn Canvas, camera: &mut Camera) {
        if let Some(index) = self.active {
            let slot = &self.slots[index];
            slot.scene.render_frame(&slot.world, canvas, camera);
        }
    }

    pub fn shutdown(&mut self, assets: &mut AssetStore, textures: &mut dyn TextureLoader) {
        self.deactivate_active(assets, textures);
        assets.release_all(textures);
    }
}
