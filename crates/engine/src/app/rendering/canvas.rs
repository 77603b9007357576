use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::app::geometry::{PixelRect, Rect, Vec2};
use crate::app::Viewport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u32);

/// A loaded texture as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureInfo {
    pub handle: TextureHandle,
    pub width: u32,
    pub height: u32,
}

impl TextureInfo {
    pub fn full_rect(&self) -> PixelRect {
        PixelRect::new(0, 0, self.width, self.height)
    }
}

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("texture not found at {path}")]
    NotFound { path: PathBuf },
    #[error("failed to decode texture {path}: {reason}")]
    Decode { path: PathBuf, reason: String },
}

/// Loads textures by path. Failing loads must leave earlier textures untouched.
pub trait TextureLoader {
    fn load_texture(&mut self, path: &Path) -> Result<TextureInfo, TextureError>;
    fn release_texture(&mut self, handle: TextureHandle);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Flip {
    pub horizontal: bool,
    pub vertical: bool,
}

/// Rotation in degrees around `pivot`, given relative to the destination origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation {
    pub degrees: f32,
    pub pivot: Vec2,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DrawParams {
    pub flip: Flip,
    pub rotation: Option<Rotation>,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to present frame: {0}")]
    Present(#[from] pixels::Error),
}

/// Screen-space draw target.
pub trait Canvas {
    fn viewport(&self) -> Viewport;
    fn clear(&mut self, color: [u8; 4]);
    fn draw_texture(
        &mut self,
        texture: TextureHandle,
        source: PixelRect,
        destination: Rect,
        params: DrawParams,
    );
    fn present(&mut self) -> Result<(), RenderError>;
}
