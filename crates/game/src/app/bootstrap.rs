use std::path::PathBuf;

use engine::{resolve_app_paths, LoopConfig, Scene, SceneKey, StartupError};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::scenes;

const MAX_FPS_ENV_VAR: &str = "TILEGAME_MAX_FPS";
const CAMERA_SEED_ENV_VAR: &str = "TILEGAME_CAMERA_SEED";
const WINDOW_SIZE_ENV_VAR: &str = "TILEGAME_WINDOW_SIZE";

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) asset_root: PathBuf,
    pub(crate) scenes: Vec<(SceneKey, Box<dyn Scene>)>,
    pub(crate) initial: SceneKey,
}

pub(crate) fn build_app() -> Result<AppWiring, StartupError> {
    init_tracing();
    info!("=== Tilegame Startup ===");

    let paths = resolve_app_paths()?;
    info!(root = %paths.root.display(), "app_paths_resolved");

    let config = apply_env_overrides(LoopConfig::default(), |name| std::env::var(name).ok());
    Ok(AppWiring {
        config,
        asset_root: paths.assets_dir,
        scenes: scenes::build_scenes(),
        initial: scenes::MENU,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

/// Layers environment overrides on top of `config`. Unparseable values are
/// logged and ignored.
fn apply_env_overrides(
    mut config: LoopConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> LoopConfig {
    if let Some(raw) = lookup(MAX_FPS_ENV_VAR) {
        match raw.trim().parse::<u32>() {
            Ok(0) => config.max_render_fps = None,
            Ok(fps) => config.max_render_fps = Some(fps),
            Err(_) => warn!(var = MAX_FPS_ENV_VAR, value = %raw, "env_override_ignored"),
        }
    }
    if let Some(raw) = lookup(CAMERA_SEED_ENV_VAR) {
        match raw.trim().parse::<u64>() {
            Ok(seed) => config.engine.camera_seed = Some(seed),
            Err(_) => warn!(var = CAMERA_SEED_ENV_VAR, value = %raw, "env_override_ignored"),
        }
    }
    if let Some(raw) = lookup(WINDOW_SIZE_ENV_VAR) {
        match parse_window_size(&raw) {
            Some((width, height)) => {
                config.window_width = width;
                config.window_height = height;
            }
            None => warn!(var = WINDOW_SIZE_ENV_VAR, value = %raw, "env_override_ignored"),
        }
    }
    config
}

/// Parses `WIDTHxHEIGHT`, both non-zero.
fn parse_window_size(raw: &str) -> Option<(u32, u32)> {
    let (width, height) = raw.trim().split_once(['x', 'X'])?;
    let width = width.trim().parse::<u32>().ok().filter(|value| *value > 0)?;
    let height = height.trim().parse::<u32>().ok().filter(|value| *value > 0)?;
    Some((width, height))
}
