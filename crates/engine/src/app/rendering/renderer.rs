use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use image::ImageReader;
use pixels::{Error, Pixels, SurfaceTexture};
use tracing::{debug, warn};
use winit::window::Window;

use crate::app::geometry::{PixelRect, Rect};
use crate::app::Viewport;

use super::canvas::{
    Canvas, DrawParams, RenderError, TextureError, TextureHandle, TextureInfo, TextureLoader,
};
use super::raster::{blit, fill, RgbaImage};

/// CPU renderer drawing into a `pixels` frame buffer owned by one window.
pub struct SoftwareRenderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
    textures: HashMap<TextureHandle, RgbaImage>,
    next_handle: u32,
}

impl SoftwareRenderer {
    pub fn new(window: Arc<Window>) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
            textures: HashMap::new(),
            next_handle: 1,
        })
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }
}

fn decode_rgba(path: &Path) -> Result<RgbaImage, TextureError> {
    if !path.is_file() {
        return Err(TextureError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let decode_error = |reason: String| TextureError::Decode {
        path: path.to_path_buf(),
        reason,
    };
    let reader = ImageReader::open(path).map_err(|error| decode_error(error.to_string()))?;
    let decoded = reader
        .with_guessed_format()
        .map_err(|error| decode_error(error.to_string()))?
        .decode()
        .map_err(|error| decode_error(error.to_string()))?;
    let image = decoded.to_rgba8();
    Ok(RgbaImage {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}

impl TextureLoader for SoftwareRenderer {
    fn load_texture(&mut self, path: &Path) -> Result<TextureInfo, TextureError> {
        let image = decode_rgba(path)?;
        let handle = TextureHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1).max(1);
        let info = TextureInfo {
            handle,
            width: image.width,
            height: image.height,
        };
        debug!(
            path = %path.display(),
            handle = handle.0,
            width = info.width,
            height = info.height,
            "texture_loaded"
        );
        self.textures.insert(handle, image);
        Ok(info)
    }

    fn release_texture(&mut self, handle: TextureHandle) {
        if self.textures.remove(&handle).is_none() {
            warn!(handle = handle.0, "texture_release_unknown_handle");
        }
    }
}

impl Canvas for SoftwareRenderer {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn clear(&mut self, color: [u8; 4]) {
        fill(self.pixels.frame_mut(), color);
    }

    fn draw_texture(
        &mut self,
        texture: TextureHandle,
        source: PixelRect,
        destination: Rect,
        params: DrawParams,
    ) {
        let Some(image) = self.textures.get(&texture) else {
            return;
        };
        blit(
            self.pixels.frame_mut(),
            self.viewport.width,
            self.viewport.height,
            image,
            source,
            destination,
            params,
        );
    }

    fn present(&mut self) -> Result<(), RenderError> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Ok(());
        }
        self.pixels.render()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renderer_type_is_non_generic() {
        let _renderer: Option<SoftwareRenderer> = None;
    }

    #[test]
    fn missing_file_is_not_found() {
        let temp = tempfile::tempdir().expect("tempdir");
        let error = decode_rgba(&temp.path().join("absent.png")).expect_err("missing");
        assert!(matches!(error, TextureError::NotFound { .. }));
    }

    #[test]
    fn garbage_file_is_decode_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("broken.png");
        std::fs::write(&path, b"not an image").expect("write");
        let error = decode_rgba(&path).expect_err("garbage");
        assert!(matches!(error, TextureError::Decode { .. }));
    }

    #[test]
    fn png_decodes_to_rgba() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("pixel.png");
        let mut image = image::RgbaImage::new(2, 3);
        image.put_pixel(1, 2, image::Rgba([10, 20, 30, 255]));
        image.save(&path).expect("save png");

        let decoded = decode_rgba(&path).expect("decode");
        assert_eq!((decoded.width, decoded.height), (2, 3));
        assert_eq!(decoded.rgba.len(), 2 * 3 * 4);
        assert_eq!(&decoded.rgba[(2 * 2 + 1) * 4..(2 * 2 + 1) * 4 + 4], &[10, 20, 30, 255]);
    }
}
