mod canvas;
mod raster;
mod renderer;
mod tiles;

pub use canvas::{
    Canvas, DrawParams, Flip, RenderError, Rotation, TextureError, TextureHandle, TextureInfo,
    TextureLoader,
};
pub use renderer::SoftwareRenderer;
pub use tiles::{draw_entity, paint_level, TilePaintStats};
