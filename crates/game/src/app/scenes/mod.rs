use std::path::PathBuf;

use engine::{AssetError, Rect, Renderable, Scene, SceneKey, SpriteSheet, Vec2};

mod field;
mod menu;
mod player;
#[cfg(test)]
mod test_support;

pub(crate) use field::FieldScene;
pub(crate) use menu::MenuScene;

pub(crate) const MENU: SceneKey = SceneKey("menu");
pub(crate) const FIELD: SceneKey = SceneKey("field");

pub(crate) fn build_scenes() -> Vec<(SceneKey, Box<dyn Scene>)> {
    vec![
        (MENU, Box::new(MenuScene::default()) as Box<dyn Scene>),
        (FIELD, Box::new(FieldScene::default())),
    ]
}

/// Renderable showing the sheet's base frame with its pivot placed at `anchor`.
fn sheet_renderable(sheet: &SpriteSheet, anchor: Vec2) -> Result<Renderable, AssetError> {
    let frame = sheet.base_frame();
    let origin = anchor - sheet.pivot;
    let destination = Rect::new(origin.x, origin.y, frame.width as f32, frame.height as f32);
    Renderable::new(sheet.texture, frame, destination).map_err(|error| {
        AssetError::MalformedDescription {
            path: PathBuf::from(&sheet.source),
            field: "image".to_string(),
            reason: error.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use engine::resolve_tile_id;

    use super::*;
    use crate::app::scenes::test_support::{shipped_assets, FakeTextures};

    #[test]
    fn shipped_levels_reference_only_known_tiles() {
        let (mut assets, _root) = shipped_assets();
        let mut textures = FakeTextures::default();
        for path in ["levels/menu.json", "levels/field.json"] {
            let level = assets.load_level(path, &mut textures).expect(path);
            for layer in level.layers() {
                for (col, row, stored) in layer.cells() {
                    if let Some(id) = resolve_tile_id(stored) {
                        assert!(
                            level.tile(id).is_some(),
                            "{path} layer {} cell ({col}, {row}) uses unknown tile {id}",
                            layer.name()
                        );
                    }
                }
            }
        }
        assert_eq!(assets.cached_tileset_count(), 1);
    }

    #[test]
    fn build_scenes_registers_menu_then_field() {
        let scenes = build_scenes();
        let keys: Vec<SceneKey> = scenes.iter().map(|(key, _)| *key).collect();
        assert_eq!(keys, vec![MENU, FIELD]);
    }
}
