use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{error, info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use crate::assets::AssetStore;
use crate::StartupError;

use super::camera::Viewport;
use super::engine::{Engine, EngineConfig, FrameOutcome};
use super::geometry::Vec2;
use super::input::{Click, InputAction, InputEvent, MouseButton};
use super::metrics::{MetricsAccumulator, MetricsHandle};
use super::rendering::SoftwareRenderer;
use super::scene::{Scene, SceneError, SceneKey};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    /// Render pacing cap; `None` or zero disables it.
    pub max_render_fps: Option<u32>,
    pub metrics_log_interval: Duration,
    pub engine: EngineConfig,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Tilegame".to_string(),
            window_width: 640,
            window_height: 480,
            max_render_fps: Some(60),
            metrics_log_interval: Duration::from_secs(5),
            engine: EngineConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub fn run_app(
    config: LoopConfig,
    asset_root: PathBuf,
    scenes: Vec<(SceneKey, Box<dyn Scene>)>,
    initial: SceneKey,
) -> Result<(), AppError> {
    run_app_with_metrics(config, asset_root, scenes, initial, MetricsHandle::default())
}

/// Opens the window, activates `initial` and drives the engine until quit.
/// Failing to activate the initial scene is fatal.
pub fn run_app_with_metrics(
    config: LoopConfig,
    asset_root: PathBuf,
    scenes: Vec<(SceneKey, Box<dyn Scene>)>,
    initial: SceneKey,
    metrics_handle: MetricsHandle,
) -> Result<(), AppError> {
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut renderer =
        SoftwareRenderer::new(Arc::clone(&window)).map_err(AppError::CreateRenderer)?;

    let size = window.inner_size();
    let mut engine = Engine::new(
        config.engine.clone(),
        AssetStore::new(asset_root.clone()),
        Viewport {
            width: size.width,
            height: size.height,
        },
    );
    for (key, scene) in scenes {
        engine.register_scene(key, scene)?;
    }
    engine.activate_scene(initial, &mut renderer)?;

    let render_cap = normalize_render_fps_cap(config.max_render_fps);
    let render_frame_target = target_frame_duration(render_cap);
    let metrics_log_interval = if config.metrics_log_interval.is_zero() {
        Duration::from_secs(1)
    } else {
        config.metrics_log_interval
    };
    info!(
        asset_root = %asset_root.display(),
        initial_scene = %initial,
        width = size.width,
        height = size.height,
        render_fps_cap = %format_render_cap(render_cap),
        max_frame_delta_ms = config.engine.max_frame_delta.as_millis() as u64,
        "loop_config"
    );

    event_loop.set_control_flow(ControlFlow::Poll);
    let mut pointer = PointerState::default();
    let mut last_frame_instant = Instant::now();
    let mut last_present_instant = Instant::now();
    let mut metrics = MetricsAccumulator::starting_at(Instant::now(), metrics_log_interval);

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    info!(reason = "window_close", "shutdown_requested");
                    engine.push_input(InputEvent::QuitRequested);
                }
                WindowEvent::Resized(new_size) => {
                    if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                        error!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                        return;
                    }
                    if new_size.width > 0 && new_size.height > 0 {
                        engine.resize(Viewport {
                            width: new_size.width,
                            height: new_size.height,
                        });
                    }
                }
                WindowEvent::CursorMoved { position, .. } => {
                    pointer.cursor = Some(Vec2::new(position.x as f32, position.y as f32));
                }
                WindowEvent::CursorLeft { .. } => pointer.cursor = None,
                WindowEvent::MouseInput { state, button, .. } => {
                    if let Some(event) = pointer.click_event(button, state) {
                        engine.push_input(event);
                    }
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    if event.repeat {
                        return;
                    }
                    if let Some(input) = key_event(event.physical_key, event.state) {
                        engine.push_input(input);
                    }
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    let frame_dt = now.saturating_duration_since(last_frame_instant);
                    last_frame_instant = now;

                    if engine.process_frame(&mut renderer) == FrameOutcome::Quit {
                        window_target.exit();
                        return;
                    }

                    let cap_sleep = compute_cap_sleep(
                        Instant::now().saturating_duration_since(last_present_instant),
                        render_frame_target,
                    );
                    if cap_sleep > Duration::ZERO {
                        thread::sleep(cap_sleep);
                    }

                    if let Err(error) = engine.render_frame(&mut renderer) {
                        error!(error = %error, "renderer_draw_failed");
                        window_target.exit();
                        return;
                    }
                    last_present_instant = Instant::now();

                    metrics.record_frame(frame_dt);
                    if let Some(snapshot) = metrics.maybe_snapshot(now, engine.entity_count()) {
                        metrics_handle.publish(snapshot);
                        info!(
                            fps = snapshot.fps,
                            frame_time_ms = snapshot.frame_time_ms,
                            worst_frame_ms = snapshot.worst_frame_ms,
                            entity_count = snapshot.entity_count,
                            textures = renderer.texture_count(),
                            scene = ?engine.active_scene().map(|key| key.0),
                            "loop_metrics"
                        );
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                window.request_redraw();
            }
            Event::LoopExiting => {
                engine.shutdown(&mut renderer);
                if renderer.texture_count() > 0 {
                    warn!(textures = renderer.texture_count(), "textures_leaked_at_shutdown");
                }
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

/// Tracks the cursor so button presses become clicks at a screen position.
#[derive(Debug, Default)]
struct PointerState {
    cursor: Option<Vec2>,
}

impl PointerState {
    fn click_event(
        &self,
        button: winit::event::MouseButton,
        state: ElementState,
    ) -> Option<InputEvent> {
        if state != ElementState::Pressed {
            return None;
        }
        let button = match button {
            winit::event::MouseButton::Left => MouseButton::Left,
            winit::event::MouseButton::Right => MouseButton::Right,
            _ => return None,
        };
        let screen = self.cursor?;
        Some(InputEvent::Click(Click { button, screen }))
    }
}

fn action_for_key(key: PhysicalKey) -> Option<InputAction> {
    let PhysicalKey::Code(code) = key else {
        return None;
    };
    match code {
        KeyCode::KeyW | KeyCode::ArrowUp => Some(InputAction::MoveUp),
        KeyCode::KeyS | KeyCode::ArrowDown => Some(InputAction::MoveDown),
        KeyCode::KeyA | KeyCode::ArrowLeft => Some(InputAction::MoveLeft),
        KeyCode::KeyD | KeyCode::ArrowRight => Some(InputAction::MoveRight),
        KeyCode::Enter | KeyCode::Space | KeyCode::KeyE => Some(InputAction::Confirm),
        KeyCode::Escape => Some(InputAction::Quit),
        _ => None,
    }
}

fn key_event(key: PhysicalKey, state: ElementState) -> Option<InputEvent> {
    action_for_key(key).map(|action| InputEvent::Action {
        action,
        pressed: state == ElementState::Pressed,
    })
}

fn normalize_render_fps_cap(cap: Option<u32>) -> Option<u32> {
    cap.filter(|value| *value > 0)
}

fn target_frame_duration(max_render_fps: Option<u32>) -> Option<Duration> {
    max_render_fps.map(|fps| Duration::from_secs_f64(1.0 / fps as f64))
}

fn compute_cap_sleep(elapsed: Duration, target: Option<Duration>) -> Duration {
    match target {
        Some(frame_target) if elapsed < frame_target => frame_target - elapsed,
        _ => Duration::ZERO,
    }
}

fn format_render_cap(cap: Option<u32>) -> String {
    match cap {
        Some(value) => value.to_string(),
        None => "off".to_string(),
    }
}
