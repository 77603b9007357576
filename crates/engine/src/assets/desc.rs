//! On-disk JSON shapes for levels, tilesets and sprite sheets.

use std::collections::BTreeMap;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LevelDesc {
    pub width: u32,
    pub height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub layers: Vec<LayerDesc>,
    #[serde(default)]
    pub tilesets: Vec<TileSetRefDesc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerDesc {
    #[serde(default)]
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u32>,
    #[serde(default)]
    pub objects: Vec<ObjectDesc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectDesc {
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TileSetRefDesc {
    pub source: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TileSetDesc {
    pub name: String,
    pub tile_width: u32,
    pub tile_height: u32,
    pub tile_count: u32,
    pub tiles: Vec<TileDesc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TileDesc {
    pub id: u32,
    pub image: String,
    pub image_width: u32,
    pub image_height: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpriteSheetDesc {
    pub rows: u32,
    pub columns: u32,
    pub frame_width: u32,
    pub frame_height: u32,
    #[serde(default)]
    pub pivot: PivotDesc,
    pub image: String,
    #[serde(default)]
    pub animations: BTreeMap<String, AnimationEntryDesc>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PivotDesc {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FrameDesc {
    pub row: u32,
    pub col: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnimationEntryDesc {
    pub start: FrameDesc,
    pub end: FrameDesc,
    pub duration_ms: u64,
    #[serde(rename = "loop", default)]
    pub looping: bool,
    #[serde(default)]
    pub flip: Option<FlipDesc>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FlipDesc {
    #[serde(default)]
    pub horizontal: bool,
    #[serde(default)]
    pub vertical: bool,
}
