use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::app::animation::{AnimationDesc, FrameCoord, SheetGrid, SpriteSheet};
use crate::app::geometry::{Rect, Vec2};
use crate::app::level::{Layer, Level, LevelObject, Tile, TileSet, TileSetRef};
use crate::app::rendering::{Flip, TextureError, TextureInfo, TextureLoader};

use super::desc::{LevelDesc, SpriteSheetDesc, TileSetDesc};
use super::paths::{join_asset_path, AssetPathError};

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset {path} is missing or unreadable: {source}")]
    ResourceMissing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed description {path} at '{field}': {reason}")]
    MalformedDescription {
        path: PathBuf,
        field: String,
        reason: String,
    },
    #[error("invalid asset path '{path}': {source}")]
    InvalidPath {
        path: String,
        #[source]
        source: AssetPathError,
    },
    #[error("texture load failed for {path}: {source}")]
    Texture {
        path: PathBuf,
        #[source]
        source: TextureError,
    },
}

impl AssetError {
    fn malformed(path: &Path, field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedDescription {
            path: path.to_path_buf(),
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Loads asset descriptions relative to one root and caches tilesets and
/// sprite sheets by their asset path.
#[derive(Debug)]
pub struct AssetStore {
    root: PathBuf,
    tilesets: HashMap<String, TileSetRef>,
    sprite_sheets: HashMap<String, Rc<SpriteSheet>>,
}

impl AssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            tilesets: HashMap::new(),
            sprite_sheets: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, relative: &str) -> Result<PathBuf, AssetError> {
        join_asset_path(&self.root, relative).map_err(|source| AssetError::InvalidPath {
            path: relative.to_string(),
            source,
        })
    }

    pub fn is_tileset_cached(&self, relative: &str) -> bool {
        self.tilesets.contains_key(relative)
    }

    pub fn is_sprite_sheet_cached(&self, relative: &str) -> bool {
        self.sprite_sheets.contains_key(relative)
    }

    pub fn cached_tileset_count(&self) -> usize {
        self.tilesets.len()
    }

    pub fn cached_sprite_sheet_count(&self) -> usize {
        self.sprite_sheets.len()
    }

    /// A previously loaded sheet, without touching the disk.
    pub fn cached_sprite_sheet(&self, relative: &str) -> Option<&SpriteSheet> {
        self.sprite_sheets.get(relative).map(Rc::as_ref)
    }

    fn read_description<T: DeserializeOwned>(&self, relative: &str) -> Result<(PathBuf, T), AssetError> {
        let path = self.resolve(relative)?;
        let raw = std::fs::read_to_string(&path).map_err(|source| AssetError::ResourceMissing {
            path: path.clone(),
            source,
        })?;
        let mut deserializer = serde_json::Deserializer::from_str(&raw);
        let parsed = serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
            AssetError::malformed(&path, error.path().to_string(), error.inner().to_string())
        })?;
        Ok((path, parsed))
    }

    /// Loads a level and every tileset it references. On failure, tilesets
    /// first loaded by this call are dropped from the cache again and their
    /// textures released; entries cached before the call are untouched.
    pub fn load_level(
        &mut self,
        relative: &str,
        textures: &mut dyn TextureLoader,
    ) -> Result<Level, AssetError> {
        let (path, desc) = self.read_description::<LevelDesc>(relative)?;
        let layers = build_layers(&path, &desc)?;

        let mut fresh = Vec::new();
        let mut tilesets = Vec::with_capacity(desc.tilesets.len());
        for reference in &desc.tilesets {
            let was_cached = self.is_tileset_cached(&reference.source);
            match self.load_tileset(&reference.source, textures) {
                Ok(tileset) => {
                    if !was_cached {
                        fresh.push(reference.source.clone());
                    }
                    tilesets.push(tileset);
                }
                Err(error) => {
                    drop(tilesets);
                    for source in fresh {
                        self.evict_tileset(&source, textures);
                    }
                    return Err(error);
                }
            }
        }

        info!(
            level = relative,
            layers = layers.len(),
            tilesets = tilesets.len(),
            "level_loaded"
        );
        Ok(Level::new(
            relative,
            (desc.width, desc.height),
            (desc.tile_width, desc.tile_height),
            layers,
            tilesets,
        ))
    }

    /// Returns the cached tileset for `relative`, loading it and its tile
    /// textures on first use.
    pub fn load_tileset(
        &mut self,
        relative: &str,
        textures: &mut dyn TextureLoader,
    ) -> Result<TileSetRef, AssetError> {
        if let Some(cached) = self.tilesets.get(relative) {
            debug!(tileset = relative, "tileset_cache_hit");
            return Ok(Rc::clone(cached));
        }

        let (path, desc) = self.read_description::<TileSetDesc>(relative)?;
        validate_tileset(&path, &desc)?;

        let mut tiles = Vec::with_capacity(desc.tiles.len());
        for tile in &desc.tiles {
            let texture = match self.load_texture(&tile.image, textures) {
                Ok(texture) => texture,
                Err(error) => {
                    release_tiles(&tiles, textures);
                    return Err(error);
                }
            };
            if texture.width != tile.image_width || texture.height != tile.image_height {
                warn!(
                    tileset = relative,
                    tile = tile.id,
                    declared_width = tile.image_width,
                    declared_height = tile.image_height,
                    actual_width = texture.width,
                    actual_height = texture.height,
                    "tile_image_size_mismatch"
                );
            }
            tiles.push(Tile {
                id: tile.id,
                image: tile.image.clone(),
                width: tile.image_width,
                height: tile.image_height,
                texture,
            });
        }

        let tileset = Rc::new(TileSet::new(
            desc.name,
            relative,
            desc.tile_width,
            desc.tile_height,
            tiles,
        ));
        info!(tileset = relative, tiles = tileset.len(), "tileset_loaded");
        self.tilesets.insert(relative.to_string(), Rc::clone(&tileset));
        Ok(tileset)
    }

    pub fn load_sprite_sheet(
        &mut self,
        relative: &str,
        textures: &mut dyn TextureLoader,
    ) -> Result<Rc<SpriteSheet>, AssetError> {
        if let Some(cached) = self.sprite_sheets.get(relative) {
            return Ok(Rc::clone(cached));
        }

        let (path, desc) = self.read_description::<SpriteSheetDesc>(relative)?;
        let grid = SheetGrid {
            rows: desc.rows,
            columns: desc.columns,
            frame_width: desc.frame_width,
            frame_height: desc.frame_height,
        };
        if grid.rows == 0 || grid.columns == 0 {
            return Err(AssetError::malformed(&path, "rows", "sheet grid must not be empty"));
        }
        if grid.frame_width == 0 || grid.frame_height == 0 {
            return Err(AssetError::malformed(&path, "frame_width", "frame size must be non-zero"));
        }
        let animations = build_animations(&path, &desc, grid)?;

        let texture = self.load_texture(&desc.image, textures)?;
        let grid_width = u64::from(grid.columns) * u64::from(grid.frame_width);
        let grid_height = u64::from(grid.rows) * u64::from(grid.frame_height);
        if grid_width > u64::from(texture.width) || grid_height > u64::from(texture.height) {
            textures.release_texture(texture.handle);
            return Err(AssetError::malformed(
                &path,
                "image",
                format!(
                    "grid {grid_width}x{grid_height} exceeds texture {}x{}",
                    texture.width, texture.height
                ),
            ));
        }

        let sheet = Rc::new(SpriteSheet::new(
            relative,
            texture,
            grid,
            Vec2::new(desc.pivot.x, desc.pivot.y),
            animations,
        ));
        info!(
            sprite_sheet = relative,
            animations = desc.animations.len(),
            "sprite_sheet_loaded"
        );
        self.sprite_sheets.insert(relative.to_string(), Rc::clone(&sheet));
        Ok(sheet)
    }

    fn load_texture(
        &self,
        relative: &str,
        textures: &mut dyn TextureLoader,
    ) -> Result<TextureInfo, AssetError> {
        let path = self.resolve(relative)?;
        textures
            .load_texture(&path)
            .map_err(|source| AssetError::Texture { path, source })
    }

    /// Drops cache entries nothing else holds and releases their textures.
    /// Returns how many entries were released.
    pub fn release_unused(&mut self, textures: &mut dyn TextureLoader) -> usize {
        let unused_tilesets: BTreeSet<String> = self
            .tilesets
            .iter()
            .filter(|(_, tileset)| Rc::strong_count(tileset) == 1)
            .map(|(source, _)| source.clone())
            .collect();
        for source in &unused_tilesets {
            self.evict_tileset(source, textures);
        }

        let unused_sheets: BTreeSet<String> = self
            .sprite_sheets
            .iter()
            .filter(|(_, sheet)| Rc::strong_count(sheet) == 1)
            .map(|(source, _)| source.clone())
            .collect();
        for source in &unused_sheets {
            if let Some(sheet) = self.sprite_sheets.remove(source) {
                textures.release_texture(sheet.texture.handle);
                debug!(sprite_sheet = %source, "sprite_sheet_released");
            }
        }

        unused_tilesets.len() + unused_sheets.len()
    }

    /// Releases every cached texture regardless of outstanding references.
    pub fn release_all(&mut self, textures: &mut dyn TextureLoader) {
        for (_, tileset) in self.tilesets.drain() {
            release_tiles_of(&tileset, textures);
        }
        for (_, sheet) in self.sprite_sheets.drain() {
            textures.release_texture(sheet.texture.handle);
        }
    }

    fn evict_tileset(&mut self, source: &str, textures: &mut dyn TextureLoader) {
        if let Some(tileset) = self.tilesets.remove(source) {
            release_tiles_of(&tileset, textures);
            debug!(tileset = source, "tileset_released");
        }
    }
}

fn release_tiles(tiles: &[Tile], textures: &mut dyn TextureLoader) {
    for tile in tiles {
        textures.release_texture(tile.texture.handle);
    }
}

fn release_tiles_of(tileset: &TileSet, textures: &mut dyn TextureLoader) {
    for tile in tileset.tiles() {
        textures.release_texture(tile.texture.handle);
    }
}

fn build_layers(path: &Path, desc: &LevelDesc) -> Result<Vec<Layer>, AssetError> {
    if desc.tile_width == 0 || desc.tile_height == 0 {
        return Err(AssetError::malformed(path, "tile_width", "tile size must be non-zero"));
    }
    desc.layers
        .iter()
        .enumerate()
        .map(|(index, layer)| {
            if layer.width != desc.width || layer.height != desc.height {
                return Err(AssetError::malformed(
                    path,
                    format!("layers[{index}].width"),
                    format!(
                        "layer is {}x{} but the level is {}x{}",
                        layer.width, layer.height, desc.width, desc.height
                    ),
                ));
            }
            let objects = layer
                .objects
                .iter()
                .map(|object| LevelObject {
                    name: object.name.clone(),
                    bounds: Rect::new(object.x, object.y, object.width, object.height),
                })
                .collect();
            Layer::new(
                layer.name.clone(),
                layer.width,
                layer.height,
                layer.data.clone(),
                objects,
            )
            .map_err(|error| {
                AssetError::malformed(path, format!("layers[{index}].data"), error.to_string())
            })
        })
        .collect()
}

fn validate_tileset(path: &Path, desc: &TileSetDesc) -> Result<(), AssetError> {
    if desc.tile_width == 0 || desc.tile_height == 0 {
        return Err(AssetError::malformed(path, "tile_width", "tile size must be non-zero"));
    }
    if desc.tiles.len() != desc.tile_count as usize {
        return Err(AssetError::malformed(
            path,
            "tile_count",
            format!("declares {} tiles, lists {}", desc.tile_count, desc.tiles.len()),
        ));
    }
    let mut seen = BTreeSet::new();
    for (index, tile) in desc.tiles.iter().enumerate() {
        if !seen.insert(tile.id) {
            return Err(AssetError::malformed(
                path,
                format!("tiles[{index}].id"),
                format!("duplicate tile id {}", tile.id),
            ));
        }
    }
    Ok(())
}

fn build_animations(
    path: &Path,
    desc: &SpriteSheetDesc,
    grid: SheetGrid,
) -> Result<HashMap<String, AnimationDesc>, AssetError> {
    let mut animations = HashMap::with_capacity(desc.animations.len());
    for (name, entry) in &desc.animations {
        let field = |suffix: &str| format!("animations.{name}.{suffix}");
        let start = FrameCoord::new(entry.start.row, entry.start.col);
        let end = FrameCoord::new(entry.end.row, entry.end.col);
        if !grid.contains(start) {
            return Err(AssetError::malformed(path, field("start"), "frame outside sheet grid"));
        }
        if !grid.contains(end) {
            return Err(AssetError::malformed(path, field("end"), "frame outside sheet grid"));
        }
        if entry.duration_ms == 0 {
            return Err(AssetError::malformed(path, field("duration_ms"), "duration must be positive"));
        }
        let flip = entry.flip.unwrap_or_default();
        let animation = AnimationDesc {
            start,
            end,
            duration: Duration::from_millis(entry.duration_ms),
            looping: entry.looping,
            flip: Flip {
                horizontal: flip.horizontal,
                vertical: flip.vertical,
            },
        };
        if animation.frame_count(grid.columns).is_none() {
            return Err(AssetError::malformed(path, field("end"), "end frame precedes start frame"));
        }
        animations.insert(name.clone(), animation);
    }
    Ok(animations)
}
