mod desc;
mod paths;
mod store;

pub use desc::{
    AnimationEntryDesc, FlipDesc, FrameDesc, LayerDesc, LevelDesc, ObjectDesc, PivotDesc,
    SpriteSheetDesc, TileDesc, TileSetDesc, TileSetRefDesc,
};
pub use paths::AssetPathError;
pub use store::{AssetError, AssetStore};
