use std::collections::BTreeMap;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use super::animation::SpriteAnimator;
use super::clock::FrameTime;
use super::geometry::{PixelRect, Rect, Vec2};
use super::rendering::{DrawParams, Flip, Rotation, TextureInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Player,
    Effect,
    Prop,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntityError {
    #[error("source rect {rect:?} exceeds texture bounds {texture_width}x{texture_height}")]
    SourceOutOfBounds {
        rect: PixelRect,
        texture_width: u32,
        texture_height: u32,
    },
}

/// Texture placement for a drawable entity. `destination` is in world space.
#[derive(Debug, Clone, PartialEq)]
pub struct Renderable {
    texture: TextureInfo,
    source: PixelRect,
    pub destination: Rect,
    pub rotation: Option<Rotation>,
    pub flip: Flip,
}

impl Renderable {
    pub fn new(
        texture: TextureInfo,
        source: PixelRect,
        destination: Rect,
    ) -> Result<Self, EntityError> {
        check_source(texture, source)?;
        Ok(Self {
            texture,
            source,
            destination,
            rotation: None,
            flip: Flip::default(),
        })
    }

    pub fn texture(&self) -> TextureInfo {
        self.texture
    }

    pub fn source(&self) -> PixelRect {
        self.source
    }

    pub fn set_source(&mut self, source: PixelRect) -> Result<(), EntityError> {
        check_source(self.texture, source)?;
        self.source = source;
        Ok(())
    }

    pub fn draw_params(&self) -> DrawParams {
        DrawParams {
            flip: self.flip,
            rotation: self.rotation,
        }
    }
}

fn check_source(texture: TextureInfo, source: PixelRect) -> Result<(), EntityError> {
    if source.fits_within(texture.width, texture.height) {
        Ok(())
    } else {
        Err(EntityError::SourceOutOfBounds {
            rect: source,
            texture_width: texture.width,
            texture_height: texture.height,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expiry {
    pub spawned_at: Duration,
    pub ttl: Duration,
}

impl Expiry {
    pub fn new(spawned_at: Duration, ttl: Duration) -> Self {
        Self { spawned_at, ttl }
    }

    pub fn is_expired(&self, now: Duration) -> bool {
        now.saturating_sub(self.spawned_at) >= self.ttl
    }

    pub fn remaining(&self, now: Duration) -> Duration {
        self.ttl.saturating_sub(now.saturating_sub(self.spawned_at))
    }
}

/// One entity record. Behaviour is selected by which capabilities are present,
/// not by the kind tag.
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub render: Option<Renderable>,
    pub animation: Option<SpriteAnimator>,
    pub expiry: Option<Expiry>,
}

impl Entity {
    pub fn is_expired(&self, now: Duration) -> bool {
        self.expiry.is_some_and(|expiry| expiry.is_expired(now))
    }

    pub fn position(&self) -> Option<Vec2> {
        self.render.as_ref().map(|render| render.destination.origin())
    }

    pub fn bounds(&self) -> Option<Rect> {
        self.render.as_ref().map(|render| render.destination)
    }

    /// Plays `name`, or logs and keeps the current animation if the sheet lacks it.
    pub fn play_animation(&mut self, name: &str, now: Duration) {
        let Some(animator) = self.animation.as_mut() else {
            return;
        };
        if let Err(error) = animator.activate(name, now) {
            warn!(entity = self.id.0, error = %error, "unknown_animation");
        }
    }

    pub fn stop_animation(&mut self) {
        if let Some(animator) = self.animation.as_mut() {
            animator.stop();
        }
    }

    /// Per-frame hook. Animated renderables pick their frame; expiry is derived
    /// from time and needs no per-frame state.
    pub fn update(&mut self, time: &FrameTime) {
        let (Some(animator), Some(render)) = (self.animation.as_ref(), self.render.as_mut()) else {
            return;
        };
        let frame = animator.current_frame(time.now);
        if let Err(error) = render.set_source(frame.source) {
            warn!(entity = self.id.0, error = %error, "animation_frame_rejected");
            return;
        }
        render.flip = frame.flip;
    }
}

/// Components for a new entity; the table assigns the id.
#[derive(Debug, Clone)]
pub struct EntitySpawn {
    pub kind: EntityKind,
    pub render: Option<Renderable>,
    pub animation: Option<SpriteAnimator>,
    pub expiry: Option<Expiry>,
}

impl EntitySpawn {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            render: None,
            animation: None,
            expiry: None,
        }
    }

    pub fn with_render(mut self, render: Renderable) -> Self {
        self.render = Some(render);
        self
    }

    pub fn with_animation(mut self, animation: SpriteAnimator) -> Self {
        self.animation = Some(animation);
        self
    }

    pub fn with_expiry(mut self, expiry: Expiry) -> Self {
        self.expiry = Some(expiry);
        self
    }
}

/// Arena of live entities keyed by id. Iteration is in id (spawn) order.
#[derive(Debug, Default)]
pub struct EntityTable {
    allocator: EntityIdAllocator,
    entities: BTreeMap<EntityId, Entity>,
}

impl EntityTable {
    pub fn spawn(&mut self, spawn: EntitySpawn) -> EntityId {
        let id = self.allocator.allocate();
        self.entities.insert(
            id,
            Entity {
                id,
                kind: spawn.kind,
                render: spawn.render,
                animation: spawn.animation,
                expiry: spawn.expiry,
            },
        );
        id
    }

    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.values_mut()
    }

    /// Runs every live entity's update hook; entities already past their ttl are skipped.
    pub fn update_all(&mut self, time: &FrameTime) {
        for entity in self.entities.values_mut() {
            if entity.is_expired(time.now) {
                continue;
            }
            entity.update(time);
        }
    }

    pub fn expired_ids(&self, now: Duration) -> Vec<EntityId> {
        self.entities
            .values()
            .filter(|entity| entity.is_expired(now))
            .map(|entity| entity.id)
            .collect()
    }

    /// Removes every expired entity. The id list is collected before any removal.
    pub fn sweep_expired(&mut self, now: Duration) -> Vec<EntityId> {
        let expired = self.expired_ids(now);
        for id in &expired {
            self.entities.remove(id);
        }
        expired
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }
}
