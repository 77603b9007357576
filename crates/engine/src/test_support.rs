use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use crate::app::geometry::{PixelRect, Rect};
use crate::app::rendering::{
    Canvas, DrawParams, RenderError, TextureError, TextureHandle, TextureInfo, TextureLoader,
};
use crate::app::Viewport;

/// Hands out handles for any path that exists on disk. Size defaults to
/// 64x64 and can be overridden per file name.
#[derive(Debug)]
pub(crate) struct FakeTextureLoader {
    next_handle: u32,
    default_size: (u32, u32),
    sizes: HashMap<String, (u32, u32)>,
    live: BTreeSet<TextureHandle>,
    loaded: Vec<PathBuf>,
    released: Vec<TextureHandle>,
}

impl Default for FakeTextureLoader {
    fn default() -> Self {
        Self {
            next_handle: 1,
            default_size: (64, 64),
            sizes: HashMap::new(),
            live: BTreeSet::new(),
            loaded: Vec::new(),
            released: Vec::new(),
        }
    }
}

impl FakeTextureLoader {
    pub(crate) fn with_size(mut self, file_name: &str, width: u32, height: u32) -> Self {
        self.sizes.insert(file_name.to_string(), (width, height));
        self
    }

    pub(crate) fn load_calls(&self) -> usize {
        self.loaded.len()
    }

    pub(crate) fn live_count(&self) -> usize {
        self.live.len()
    }

    pub(crate) fn is_live(&self, handle: TextureHandle) -> bool {
        self.live.contains(&handle)
    }

    pub(crate) fn released(&self) -> &[TextureHandle] {
        &self.released
    }
}

impl TextureLoader for FakeTextureLoader {
    fn load_texture(&mut self, path: &Path) -> Result<TextureInfo, TextureError> {
        if !path.is_file() {
            return Err(TextureError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (width, height) = self
            .sizes
            .get(&file_name)
            .copied()
            .unwrap_or(self.default_size);
        let handle = TextureHandle(self.next_handle);
        self.next_handle += 1;
        self.live.insert(handle);
        self.loaded.push(path.to_path_buf());
        Ok(TextureInfo {
            handle,
            width,
            height,
        })
    }

    fn release_texture(&mut self, handle: TextureHandle) {
        if self.live.remove(&handle) {
            self.released.push(handle);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DrawCommand {
    Clear([u8; 4]),
    Texture {
        texture: TextureHandle,
        source: PixelRect,
        destination: Rect,
        params: DrawParams,
    },
    Present,
}

/// Canvas that records every call instead of drawing.
#[derive(Debug)]
pub(crate) struct RecordingCanvas {
    viewport: Viewport,
    pub(crate) commands: Vec<DrawCommand>,
}

impl RecordingCanvas {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        Self {
            viewport: Viewport { width, height },
            commands: Vec::new(),
        }
    }

    pub(crate) fn draws(&self) -> Vec<(TextureHandle, Rect)> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                DrawCommand::Texture {
                    texture,
                    destination,
                    ..
                } => Some((*texture, *destination)),
                _ => None,
            })
            .collect()
    }
}

impl Canvas for RecordingCanvas {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn clear(&mut self, color: [u8; 4]) {
        self.commands.push(DrawCommand::Clear(color));
    }

    fn draw_texture(
        &mut self,
        texture: TextureHandle,
        source: PixelRect,
        destination: Rect,
        params: DrawParams,
    ) {
        self.commands.push(DrawCommand::Texture {
            texture,
            source,
            destination,
            params,
        });
    }

    fn present(&mut self) -> Result<(), RenderError> {
        self.commands.push(DrawCommand::Present);
        Ok(())
    }
}

pub(crate) fn write_asset(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent");
    }
    std::fs::write(path, content).expect("write asset");
}

/// Tileset whose tile ids follow the order of `images`.
pub(crate) fn seed_tileset(root: &Path, relative: &str, images: &[&str]) {
    let tiles: Vec<String> = images
        .iter()
        .enumerate()
        .map(|(id, image)| {
            write_asset(root, image, "png");
            format!(r#"{{"id": {id}, "image": "{image}", "image_width": 16, "image_height": 16}}"#)
        })
        .collect();
    write_asset(
        root,
        relative,
        &format!(
            r#"{{"name": "terrain", "tile_width": 16, "tile_height": 16, "tile_count": {}, "tiles": [{}]}}"#,
            tiles.len(),
            tiles.join(",")
        ),
    );
}

/// 4x1 level with one `[1, 0, 2, 1]` layer and a 16x16 `start` object at the origin.
pub(crate) fn seed_level(root: &Path, relative: &str, tilesets: &[&str]) {
    let refs: Vec<String> = tilesets
        .iter()
        .map(|source| format!(r#"{{"source": "{source}"}}"#))
        .collect();
    write_asset(
        root,
        relative,
        &format!(
            r#"{{
                "width": 4, "height": 1, "tile_width": 16, "tile_height": 16,
                "layers": [{{
                    "name": "ground", "width": 4, "height": 1, "data": [1, 0, 2, 1],
                    "objects": [{{"name": "start", "x": 0, "y": 0, "width": 16, "height": 16}}]
                }}],
                "tilesets": [{}]
            }}"#,
            refs.join(",")
        ),
    );
}

/// 2x4 sheet of 16px frames with a looping four-frame `walk` row.
pub(crate) fn seed_sprite_sheet(root: &Path, relative: &str, image: &str) {
    write_asset(root, image, "png");
    write_asset(
        root,
        relative,
        &format!(
            r#"{{
                "rows": 2, "columns": 4, "frame_width": 16, "frame_height": 16,
                "pivot": {{"x": 8, "y": 12}},
                "image": "{image}",
                "animations": {{
                    "walk": {{"start": {{"row": 0, "col": 0}}, "end": {{"row": 0, "col": 3}},
                             "duration_ms": 1000, "loop": true}},
                    "walk_left": {{"start": {{"row": 1, "col": 0}}, "end": {{"row": 1, "col": 3}},
                                  "duration_ms": 400, "loop": true, "flip": {{"horizontal": true}}}}
                }}
            }}"#
        ),
    );
}
