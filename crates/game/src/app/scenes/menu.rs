use engine::{ActivationContext, AssetError, Scene, SceneCommand, SceneFrame, SceneWorld};
use tracing::info;

use super::player::{drive_hero, spawn_hero};
use super::FIELD;

const MENU_LEVEL: &str = "levels/menu.json";
const START_ZONE: &str = "start";

/// Title room. Walking onto the start pad and confirming enters the field.
#[derive(Debug, Default)]
pub(crate) struct MenuScene;

impl Scene for MenuScene {
    fn activate(
        &mut self,
        ctx: &mut ActivationContext<'_>,
        world: &mut SceneWorld,
    ) -> Result<(), AssetError> {
        let level = ctx.assets.load_level(MENU_LEVEL, ctx.textures)?;
        world.set_level(level);
        spawn_hero(ctx, world)?;
        Ok(())
    }

    fn process_frame(&mut self, frame: &mut SceneFrame<'_>) -> SceneCommand {
        drive_hero(frame);
        if frame.input.confirm_pressed() && frame.world.player_in_zone(START_ZONE) {
            info!(zone = START_ZONE, "menu_start_selected");
            return SceneCommand::SwitchTo(FIELD);
        }
        SceneCommand::None
    }
}
