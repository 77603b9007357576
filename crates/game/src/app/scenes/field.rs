use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use engine::{
    ActivationContext, AssetError, EntityId, EntityKind, EntitySpawn, Expiry, MouseButton, Scene,
    SceneCommand, SceneFrame, SceneWorld, SpriteAnimator, SpriteSheet, Vec2,
};
use tracing::{info, warn};

use super::player::{drive_hero, spawn_hero};
use super::{sheet_renderable, MENU};

const FIELD_LEVEL: &str = "levels/field.json";
pub(crate) const BOMB_SHEET: &str = "sprites/bomb.json";
pub(crate) const BOMB_ANIMATION: &str = "explode";
const EXIT_ZONE: &str = "exit";
const SHAKE_INTENSITY: f32 = 4.0;
const SHAKE_DURATION: Duration = Duration::from_millis(250);

/// Playable map. Clicking or confirming drops a bomb that explodes once and
/// disappears; confirming on the exit pad returns to the menu.
#[derive(Debug, Default)]
pub(crate) struct FieldScene {
    bomb_sheet: Option<Rc<SpriteSheet>>,
}

impl FieldScene {
    fn place_bomb(&self, frame: &mut SceneFrame<'_>, at: Vec2) -> Option<EntityId> {
        let sheet = self.bomb_sheet.as_ref()?;
        let ttl = sheet.animation(BOMB_ANIMATION)?.duration;
        let now = frame.time.now;

        let render = match sheet_renderable(sheet, at) {
            Ok(render) => render,
            Err(error) => {
                warn!(error = %error, "bomb_spawn_failed");
                return None;
            }
        };
        let mut animator = SpriteAnimator::new(Rc::clone(sheet));
        if let Err(error) = animator.activate(BOMB_ANIMATION, now) {
            warn!(error = %error, "bomb_spawn_failed");
            return None;
        }

        let id = frame.world.spawn(
            EntitySpawn::new(EntityKind::Effect)
                .with_render(render)
                .with_animation(animator)
                .with_expiry(Expiry::new(now, ttl)),
        );
        frame.camera.shake(SHAKE_INTENSITY, SHAKE_DURATION);
        info!(
            entity = id.0,
            x = at.x,
            y = at.y,
            ttl_ms = ttl.as_millis() as u64,
            "bomb_placed"
        );
        Some(id)
    }
}

impl Scene for FieldScene {
    fn activate(
        &mut self,
        ctx: &mut ActivationContext<'_>,
        world: &mut SceneWorld,
    ) -> Result<(), AssetError> {
        let level = ctx.assets.load_level(FIELD_LEVEL, ctx.textures)?;
        world.set_level(level);
        spawn_hero(ctx, world)?;

        let sheet = ctx.assets.load_sprite_sheet(BOMB_SHEET, ctx.textures)?;
        if sheet.animation(BOMB_ANIMATION).is_none() {
            return Err(AssetError::MalformedDescription {
                path: PathBuf::from(BOMB_SHEET),
                field: format!("animations.{BOMB_ANIMATION}"),
                reason: "bomb sheet has no explode animation".to_string(),
            });
        }
        self.bomb_sheet = Some(sheet);
        Ok(())
    }

    fn process_frame(&mut self, frame: &mut SceneFrame<'_>) -> SceneCommand {
        drive_hero(frame);

        if frame.input.confirm_pressed() {
            if frame.world.player_in_zone(EXIT_ZONE) {
                info!(zone = EXIT_ZONE, "field_exit_selected");
                return SceneCommand::SwitchTo(MENU);
            }
            if let Some(center) = frame.world.player_center() {
                self.place_bomb(frame, center);
            }
        }

        let input = frame.input;
        for click in input.clicks() {
            if click.button != MouseButton::Left {
                continue;
            }
            let target = frame.camera.translate_from_screen(click.screen);
            self.place_bomb(frame, target);
        }
        SceneCommand::None
    }

    fn deactivate(&mut self, _world: &mut SceneWorld) {
        self.bomb_sheet = None;
    }
}
