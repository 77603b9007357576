use std::collections::BTreeMap;
use std::rc::Rc;

use thiserror::Error;

use super::geometry::Rect;
use super::rendering::TextureInfo;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub id: u32,
    pub image: String,
    pub width: u32,
    pub height: u32,
    pub texture: TextureInfo,
}

/// Named set of tiles whose textures were resolved once at load.
#[derive(Debug)]
pub struct TileSet {
    pub name: String,
    pub source: String,
    pub tile_width: u32,
    pub tile_height: u32,
    tiles: BTreeMap<u32, Tile>,
}

impl TileSet {
    pub fn new(
        name: impl Into<String>,
        source: impl Into<String>,
        tile_width: u32,
        tile_height: u32,
        tiles: impl IntoIterator<Item = Tile>,
    ) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            tile_width,
            tile_height,
            tiles: tiles.into_iter().map(|tile| (tile.id, tile)).collect(),
        }
    }

    pub fn tile(&self, id: u32) -> Option<&Tile> {
        self.tiles.get(&id)
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

/// Shared handle so several levels can reference one loaded tileset.
pub type TileSetRef = Rc<TileSet>;

#[derive(Debug, Clone, PartialEq)]
pub struct LevelObject {
    pub name: String,
    pub bounds: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LayerError {
    #[error("tile count mismatch: expected {expected}, got {actual}")]
    TileCountMismatch { expected: usize, actual: usize },
}

/// Row-major grid of stored tile values. A stored value `v` refers to tile id
/// `v - 1`; zero is an empty cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    name: String,
    width: u32,
    height: u32,
    cells: Vec<u32>,
    objects: Vec<LevelObject>,
}

impl Layer {
    pub fn new(
        name: impl Into<String>,
        width: u32,
        height: u32,
        cells: Vec<u32>,
        objects: Vec<LevelObject>,
    ) -> Result<Self, LayerError> {
        let expected = width as usize * height as usize;
        let actual = cells.len();
        if expected != actual {
            return Err(LayerError::TileCountMismatch { expected, actual });
        }
        Ok(Self {
            name: name.into(),
            width,
            height,
            cells,
            objects,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn objects(&self) -> &[LevelObject] {
        &self.objects
    }

    pub fn index_of(&self, col: u32, row: u32) -> Option<usize> {
        if col >= self.width || row >= self.height {
            return None;
        }
        Some(row as usize * self.width as usize + col as usize)
    }

    pub fn stored_at(&self, col: u32, row: u32) -> Option<u32> {
        self.index_of(col, row)
            .and_then(|index| self.cells.get(index).copied())
    }

    pub fn tile_id_at(&self, col: u32, row: u32) -> Option<u32> {
        self.stored_at(col, row).and_then(resolve_tile_id)
    }

    /// `(col, row, stored)` for every cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32, u32)> + '_ {
        let width = self.width.max(1);
        self.cells.iter().enumerate().map(move |(index, stored)| {
            let index = index as u32;
            (index % width, index / width, *stored)
        })
    }
}

pub fn resolve_tile_id(stored: u32) -> Option<u32> {
    stored.checked_sub(1)
}

#[derive(Debug)]
pub struct Level {
    pub source: String,
    pub width: u32,
    pub height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    layers: Vec<Layer>,
    tilesets: Vec<TileSetRef>,
}

impl Level {
    pub fn new(
        source: impl Into<String>,
        (width, height): (u32, u32),
        (tile_width, tile_height): (u32, u32),
        layers: Vec<Layer>,
        tilesets: Vec<TileSetRef>,
    ) -> Self {
        Self {
            source: source.into(),
            width,
            height,
            tile_width,
            tile_height,
            layers,
            tilesets,
        }
    }

    /// Layers in paint order, bottom first.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn tilesets(&self) -> &[TileSetRef] {
        &self.tilesets
    }

    /// World-space extent of the level.
    pub fn bounds(&self) -> Rect {
        Rect::new(
            0.0,
            0.0,
            self.width as f32 * self.tile_width as f32,
            self.height as f32 * self.tile_height as f32,
        )
    }

    /// First tileset (in reference order) that defines `id`.
    pub fn tile(&self, id: u32) -> Option<&Tile> {
        self.tilesets.iter().find_map(|tileset| tileset.tile(id))
    }

    pub fn cell_rect(&self, col: u32, row: u32) -> Rect {
        Rect::new(
            col as f32 * self.tile_width as f32,
            row as f32 * self.tile_height as f32,
            self.tile_width as f32,
            self.tile_height as f32,
        )
    }

    pub fn find_object(&self, name: &str) -> Option<&LevelObject> {
        self.layers
            .iter()
            .flat_map(|layer| layer.objects.iter())
            .find(|object| object.name == name)
    }
}
