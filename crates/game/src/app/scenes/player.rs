use engine::{
    ActivationContext, AssetError, EntityId, EntityKind, EntitySpawn, InputAction, InputSnapshot,
    SceneFrame, SceneWorld, SpriteAnimator, Vec2,
};
use tracing::debug;

use super::sheet_renderable;

pub(crate) const HERO_SHEET: &str = "sprites/hero.json";
pub(crate) const SPAWN_OBJECT: &str = "spawn";
/// World pixels per second.
pub(crate) const WALK_SPEED: f32 = 96.0;

pub(crate) const WALK_UP: &str = "walk_up";
pub(crate) const WALK_DOWN: &str = "walk_down";
pub(crate) const WALK_LEFT: &str = "walk_left";
pub(crate) const WALK_RIGHT: &str = "walk_right";

/// Spawns the hero with its pivot on the level's `spawn` object, or at the
/// level center when the level has none.
pub(crate) fn spawn_hero(
    ctx: &mut ActivationContext<'_>,
    world: &mut SceneWorld,
) -> Result<EntityId, AssetError> {
    let sheet = ctx.assets.load_sprite_sheet(HERO_SHEET, ctx.textures)?;
    let anchor = world
        .level()
        .map(|level| {
            level
                .find_object(SPAWN_OBJECT)
                .map(|object| object.bounds.center())
                .unwrap_or_else(|| level.bounds().center())
        })
        .unwrap_or(Vec2::ZERO);
    let render = sheet_renderable(&sheet, anchor)?;
    let id = world.spawn_player(
        EntitySpawn::new(EntityKind::Player)
            .with_render(render)
            .with_animation(SpriteAnimator::new(sheet)),
    );
    debug!(entity = id.0, x = anchor.x, y = anchor.y, "hero_spawned");
    Ok(id)
}

/// Held movement keys scaled by speed and frame time. Diagonals are
/// normalized so they are no faster than straight moves.
pub(crate) fn movement_delta(input: &InputSnapshot, delta_seconds: f32, speed: f32) -> Vec2 {
    let axis = |negative: InputAction, positive: InputAction| -> f32 {
        match (input.is_down(negative), input.is_down(positive)) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    };
    let direction = Vec2::new(
        axis(InputAction::MoveLeft, InputAction::MoveRight),
        axis(InputAction::MoveUp, InputAction::MoveDown),
    );
    if direction.is_zero() {
        return Vec2::ZERO;
    }
    direction * (speed * delta_seconds / direction.length())
}

/// Horizontal motion picks the side-facing walk.
pub(crate) fn walk_animation(delta: Vec2) -> Option<&'static str> {
    if delta.x < 0.0 {
        Some(WALK_LEFT)
    } else if delta.x > 0.0 {
        Some(WALK_RIGHT)
    } else if delta.y < 0.0 {
        Some(WALK_UP)
    } else if delta.y > 0.0 {
        Some(WALK_DOWN)
    } else {
        None
    }
}

/// Moves the hero from held input and keeps its walk animation in step.
/// Standing still stops the animation so the base frame shows.
pub(crate) fn drive_hero(frame: &mut SceneFrame<'_>) {
    let delta = movement_delta(frame.input, frame.time.delta_seconds(), WALK_SPEED);
    let now = frame.time.now;
    match walk_animation(delta) {
        Some(animation) => {
            frame.world.move_player(delta);
            if let Some(player) = frame.world.player_mut() {
                player.play_animation(animation, now);
            }
        }
        None => {
            if let Some(player) = frame.world.player_mut() {
                player.stop_animation();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use engine::{Camera, FrameTime, Viewport};

    use super::*;
    use crate::app::scenes::test_support::{activation, shipped_assets, FakeTextures};

    #[test]
    fn straight_move_covers_speed_times_delta() {
        let input = InputSnapshot::empty().with_action_down(InputAction::MoveRight, true);
        let delta = movement_delta(&input, 0.5, 100.0);
        assert_eq!(delta, Vec2::new(50.0, 0.0));
    }

    #[test]
    fn diagonal_move_is_normalized() {
        let input = InputSnapshot::empty()
            .with_action_down(InputAction::MoveUp, true)
            .with_action_down(InputAction::MoveLeft, true);
        let delta = movement_delta(&input, 1.0, 100.0);
        assert!((delta.length() - 100.0).abs() < 1e-3);
        assert!(delta.x < 0.0 && delta.y < 0.0);
    }

    #[test]
    fn opposing_keys_cancel() {
        let input = InputSnapshot::empty()
            .with_action_down(InputAction::MoveLeft, true)
            .with_action_down(InputAction::MoveRight, true);
        assert!(movement_delta(&input, 1.0, 100.0).is_zero());
    }

    #[test]
    fn walk_animation_follows_direction() {
        assert_eq!(walk_animation(Vec2::new(-1.0, 0.0)), Some(WALK_LEFT));
        assert_eq!(walk_animation(Vec2::new(1.0, 1.0)), Some(WALK_RIGHT));
        assert_eq!(walk_animation(Vec2::new(0.0, -1.0)), Some(WALK_UP));
        assert_eq!(walk_animation(Vec2::new(0.0, 1.0)), Some(WALK_DOWN));
        assert_eq!(walk_animation(Vec2::ZERO), None);
    }

    #[test]
    fn hero_walks_then_returns_to_base_frame_when_idle() {
        let (mut assets, _root) = shipped_assets();
        let mut textures = FakeTextures::default();
        let mut world = SceneWorld::default();
        world.set_level(
            assets
                .load_level("levels/field.json", &mut textures)
                .expect("field level"),
        );
        spawn_hero(&mut activation(&mut assets, &mut textures), &mut world).expect("hero");
        let start = world.player_center().expect("center");
        let mut camera = Camera::new(Viewport {
            width: 640,
            height: 480,
        });

        let walking = InputSnapshot::empty().with_action_down(InputAction::MoveRight, true);
        let mut frame = SceneFrame {
            time: FrameTime {
                now: Duration::from_millis(500),
                delta: Duration::from_millis(500),
            },
            input: &walking,
            world: &mut world,
            camera: &mut camera,
        };
        drive_hero(&mut frame);

        let player = world.player().expect("player");
        assert_eq!(
            player.animation.as_ref().and_then(|animator| animator.active_name()),
            Some(WALK_RIGHT)
        );
        let moved = world.player_center().expect("center");
        assert!((moved.x - start.x - WALK_SPEED * 0.5).abs() < 1e-3);

        let idle = InputSnapshot::empty();
        let mut frame = SceneFrame {
            time: FrameTime {
                now: Duration::from_millis(516),
                delta: Duration::from_millis(16),
            },
            input: &idle,
            world: &mut world,
            camera: &mut camera,
        };
        drive_hero(&mut frame);
        let player = world.player().expect("player");
        assert_eq!(
            player.animation.as_ref().and_then(|animator| animator.active_name()),
            None
        );
    }
}
