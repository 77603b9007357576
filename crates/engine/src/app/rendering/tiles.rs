use crate::app::camera::Camera;
use crate::app::entity::Entity;
use crate::app::geometry::Rect;
use crate::app::level::{resolve_tile_id, Level};

use super::canvas::{Canvas, DrawParams};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TilePaintStats {
    pub drawn: usize,
    pub culled: usize,
    pub unknown: usize,
}

fn screen_rect(canvas: &dyn Canvas) -> Rect {
    let viewport = canvas.viewport();
    Rect::new(0.0, 0.0, viewport.width as f32, viewport.height as f32)
}

/// Paints every layer bottom to top, cells in row-major order. Empty cells and
/// cells naming a tile no tileset defines draw nothing; tiles entirely off
/// screen are culled.
pub fn paint_level(canvas: &mut dyn Canvas, camera: &Camera, level: &Level) -> TilePaintStats {
    let screen = screen_rect(canvas);
    let mut stats = TilePaintStats::default();
    for layer in level.layers() {
        for (col, row, stored) in layer.cells() {
            let Some(tile_id) = resolve_tile_id(stored) else {
                continue;
            };
            let Some(tile) = level.tile(tile_id) else {
                stats.unknown += 1;
                continue;
            };
            let destination = camera.translate_to_screen(level.cell_rect(col, row));
            if !destination.intersects(&screen) {
                stats.culled += 1;
                continue;
            }
            canvas.draw_texture(
                tile.texture.handle,
                tile.texture.full_rect(),
                destination,
                DrawParams::default(),
            );
            stats.drawn += 1;
        }
    }
    stats
}

/// Draws a renderable entity through the camera. Returns false when the
/// entity has nothing to draw or lies off screen.
pub fn draw_entity(canvas: &mut dyn Canvas, camera: &Camera, entity: &Entity) -> bool {
    let Some(render) = entity.render.as_ref() else {
        return false;
    };
    let destination = camera.translate_to_screen(render.destination);
    if !destination.intersects(&screen_rect(canvas)) {
        return false;
    }
    canvas.draw_texture(
        render.texture().handle,
        render.source(),
        destination,
        render.draw_params(),
    );
    true
}
