pub(crate) mod animation;
pub(crate) mod camera;
pub(crate) mod clock;
mod engine;
pub(crate) mod entity;
pub(crate) mod geometry;
pub(crate) mod input;
pub(crate) mod level;
mod loop_runner;
mod metrics;
pub(crate) mod rendering;
pub(crate) mod scene;

pub use animation::{
    AnimationDesc, AnimationError, AnimationFrame, FrameCoord, SheetGrid, SpriteAnimator,
    SpriteSheet,
};
pub use camera::{Camera, Viewport, DEFAULT_CAMERA_MARGIN};
pub use clock::{Clock, FrameTime, DEFAULT_MAX_FRAME_DELTA};
pub use engine::{Engine, EngineConfig, FrameOutcome};
pub use entity::{
    Entity, EntityError, EntityId, EntityIdAllocator, EntityKind, EntitySpawn, EntityTable, Expiry,
    Renderable,
};
pub use geometry::{PixelRect, Rect, Vec2};
pub use input::{Click, InputAction, InputEvent, InputQueue, InputSnapshot, MouseButton};
pub use level::{
    resolve_tile_id, Layer, LayerError, Level, LevelObject, Tile, TileSet, TileSetRef,
};
pub use loop_runner::{run_app, run_app_with_metrics, AppError, LoopConfig};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle};
pub use rendering::{
    draw_entity, paint_level, Canvas, DrawParams, Flip, RenderError, Rotation, SoftwareRenderer,
    TextureError, TextureHandle, TextureInfo, TextureLoader, TilePaintStats,
};
pub use scene::{
    ActivationContext, Scene, SceneCommand, SceneError, SceneFrame, SceneKey, SceneMachine,
    SceneState, SceneWorld,
};
