use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
pub mod assets;
#[cfg(test)]
mod test_support;

pub use app::{
    draw_entity, paint_level, resolve_tile_id, run_app, run_app_with_metrics, ActivationContext,
    AnimationDesc, AnimationError, AnimationFrame, AppError, Camera, Canvas, Click, Clock,
    DrawParams, Engine, EngineConfig, Entity, EntityError, EntityId, EntityIdAllocator,
    EntityKind, EntitySpawn, EntityTable, Expiry, Flip, FrameCoord, FrameOutcome, FrameTime,
    InputAction, InputEvent, InputQueue, InputSnapshot, Layer, LayerError, Level, LevelObject,
    LoopConfig, LoopMetricsSnapshot, MetricsHandle, MouseButton, PixelRect, Rect, RenderError,
    Renderable, Rotation, Scene, SceneCommand, SceneError, SceneFrame, SceneKey, SceneMachine,
    SceneState, SceneWorld, SheetGrid, SoftwareRenderer, SpriteAnimator, SpriteSheet,
    TextureError, TextureHandle, TextureInfo, TextureLoader, Tile, TilePaintStats, TileSet,
    TileSetRef, Vec2, Viewport, DEFAULT_CAMERA_MARGIN, DEFAULT_MAX_FRAME_DELTA,
};
pub use assets::{AssetError, AssetPathError, AssetStore};

pub const ROOT_ENV_VAR: &str = "TILEGAME_ROOT";
const ASSETS_DIR: &str = "assets";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub assets_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error(
        "TILEGAME_ROOT is set but has no assets/ directory: {path}\n\
Point it at the directory that contains assets/."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not find the game root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and assets/.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/tilegame\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = resolve_root()?;
    let assets_dir = root.join(ASSETS_DIR);
    Ok(AppPaths { root, assets_dir })
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let normalized = normalize_path(Path::new(&value));
            if normalized.join(ASSETS_DIR).is_dir() {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;

            exe_dir
                .ancestors()
                .find(|candidate| is_game_root(candidate))
                .map(normalize_path)
                .ok_or_else(|| StartupError::RootNotFound {
                    start_dir: normalize_path(&exe_dir),
                    env_var: ROOT_ENV_VAR,
                })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn is_game_root(path: &Path) -> bool {
    path.join("Cargo.toml").is_file() && path.join(ASSETS_DIR).is_dir()
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
