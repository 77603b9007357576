use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::geometry::{Rect, Vec2};

/// Upper bound for the per-axis camera margin, in world units.
pub const DEFAULT_CAMERA_MARGIN: f32 = 48.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    pub fn half_size(&self) -> Vec2 {
        self.size() * 0.5
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Shake {
    intensity: f32,
    duration: Duration,
    remaining: Duration,
}

/// 2D camera. `position` is the world point shown at the viewport center.
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec2,
    viewport: Viewport,
    world_bounds: Option<Rect>,
    fallback_margin: f32,
    margin: Vec2,
    shake: Option<Shake>,
    shake_offset: Vec2,
    rng: StdRng,
}

impl Camera {
    pub fn new(viewport: Viewport) -> Self {
        Self::with_rng(viewport, StdRng::from_entropy())
    }

    pub fn with_seed(viewport: Viewport, seed: u64) -> Self {
        Self::with_rng(viewport, StdRng::seed_from_u64(seed))
    }

    fn with_rng(viewport: Viewport, rng: StdRng) -> Self {
        Self {
            position: viewport.half_size(),
            viewport,
            world_bounds: None,
            fallback_margin: DEFAULT_CAMERA_MARGIN,
            margin: Vec2::ZERO,
            shake: None,
            shake_offset: Vec2::ZERO,
            rng,
        }
    }

    pub fn with_fallback_margin(mut self, fallback_margin: f32) -> Self {
        self.fallback_margin = fallback_margin.max(0.0);
        self.recompute_margin();
        self
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn world_bounds(&self) -> Option<Rect> {
        self.world_bounds
    }

    pub fn margin(&self) -> Vec2 {
        self.margin
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.recompute_margin();
        self.center_on(self.position);
    }

    pub fn set_world_bounds(&mut self, bounds: Rect) {
        self.world_bounds = Some(bounds);
        self.recompute_margin();
        self.center_on(self.position);
    }

    pub fn clear_world_bounds(&mut self) {
        self.world_bounds = None;
        self.margin = Vec2::ZERO;
    }

    fn recompute_margin(&mut self) {
        if self.world_bounds.is_none() {
            return;
        }
        let half = self.viewport.half_size();
        self.margin = Vec2::new(
            half.x.min(self.fallback_margin),
            half.y.min(self.fallback_margin),
        );
    }

    /// Follows `target` one axis at a time.
    ///
    /// On an axis where the world is at least as large as the viewport, the
    /// target value is taken only if the view at that value, with the other
    /// axis held, stays inside the world; otherwise that axis keeps its
    /// current value. On a smaller axis the center is clamped to the world
    /// extent widened by the margin.
    pub fn look_at(&mut self, target: Vec2) {
        let Some(bounds) = self.world_bounds else {
            self.position = target;
            return;
        };
        let view = self.viewport.size();
        if let Some(x) = accept_axis(target.x, bounds.x, bounds.width, view.x, self.margin.x) {
            self.position.x = x;
        }
        if let Some(y) = accept_axis(target.y, bounds.y, bounds.height, view.y, self.margin.y) {
            self.position.y = y;
        }
    }

    /// Places the camera as close to `target` as the world bounds allow,
    /// clamping each axis. Used when the bounds or viewport change so the
    /// view starts out inside the world.
    pub fn center_on(&mut self, target: Vec2) {
        let Some(bounds) = self.world_bounds else {
            self.position = target;
            return;
        };
        let view = self.viewport.size();
        self.position = Vec2::new(
            clamp_axis(target.x, bounds.x, bounds.width, view.x, self.margin.x),
            clamp_axis(target.y, bounds.y, bounds.height, view.y, self.margin.y),
        );
    }

    /// Camera position including any active shake offset.
    pub fn effective_position(&self) -> Vec2 {
        self.position + self.shake_offset
    }

    fn screen_offset(&self) -> Vec2 {
        self.viewport.half_size() - self.effective_position()
    }

    pub fn translate_to_screen(&self, world: Rect) -> Rect {
        world.translated(self.screen_offset())
    }

    pub fn translate_point_to_screen(&self, world: Vec2) -> Vec2 {
        world + self.screen_offset()
    }

    pub fn translate_from_screen(&self, screen: Vec2) -> Vec2 {
        screen - self.screen_offset()
    }

    /// World-space rectangle currently covered by the viewport.
    pub fn visible_world_rect(&self) -> Rect {
        let size = self.viewport.size();
        Rect::new(
            self.effective_position().x - size.x * 0.5,
            self.effective_position().y - size.y * 0.5,
            size.x,
            size.y,
        )
    }

    pub fn shake(&mut self, intensity: f32, duration: Duration) {
        if duration.is_zero() || intensity.is_nan() || intensity <= 0.0 {
            self.stop_shake();
            return;
        }
        self.shake = Some(Shake {
            intensity,
            duration,
            remaining: duration,
        });
    }

    pub fn stop_shake(&mut self) {
        self.shake = None;
        self.shake_offset = Vec2::ZERO;
    }

    pub fn is_shaking(&self) -> bool {
        self.shake.is_some()
    }

    pub fn shake_offset(&self) -> Vec2 {
        self.shake_offset
    }

    /// Advances the shake by `delta`; the offset amplitude decays linearly to zero.
    pub fn update(&mut self, delta: Duration) {
        let Some(mut shake) = self.shake else {
            return;
        };
        shake.remaining = shake.remaining.saturating_sub(delta);
        if shake.remaining.is_zero() {
            self.stop_shake();
            return;
        }
        let fraction = shake.remaining.as_secs_f32() / shake.duration.as_secs_f32();
        let amplitude = shake.intensity * fraction;
        self.shake_offset = Vec2::new(
            self.rng.gen_range(-amplitude..=amplitude),
            self.rng.gen_range(-amplitude..=amplitude),
        );
        self.shake = Some(shake);
    }
}

fn accept_axis(target: f32, min: f32, extent: f32, view_extent: f32, margin: f32) -> Option<f32> {
    if extent >= view_extent {
        let half = view_extent * 0.5;
        (target >= min + half && target <= min + extent - half).then_some(target)
    } else {
        Some(target.clamp(min - margin, min + extent + margin))
    }
}

fn clamp_axis(target: f32, min: f32, extent: f32, view_extent: f32, margin: f32) -> f32 {
    if extent >= view_extent {
        let half = view_extent * 0.5;
        target.clamp(min + half, min + extent - half)
    } else {
        target.clamp(min - margin, min + extent + margin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Viewport = Viewport {
        width: 320,
        height: 240,
    };

    fn bounded_camera(bounds: Rect) -> Camera {
        let mut camera = Camera::with_seed(VIEWPORT, 7);
        camera.set_world_bounds(bounds);
        camera
    }

    fn view_inside(camera: &Camera, bounds: Rect) -> bool {
        let view = camera.visible_world_rect();
        view.x >= bounds.x - 1e-3
            && view.y >= bounds.y - 1e-3
            && view.right() <= bounds.right() + 1e-3
            && view.bottom() <= bounds.bottom() + 1e-3
    }

    #[test]
    fn margin_is_half_viewport_capped_by_fallback() {
        let camera = bounded_camera(Rect::new(0.0, 0.0, 1000.0, 1000.0));
        assert_eq!(camera.margin(), Vec2::new(48.0, 48.0));

        let mut small = Camera::with_seed(
            Viewport {
                width: 60,
                height: 40,
            },
            1,
        );
        small.set_world_bounds(Rect::new(0.0, 0.0, 1000.0, 1000.0));
        assert_eq!(small.margin(), Vec2::new(30.0, 20.0));
    }

    #[test]
    fn look_at_never_shows_outside_large_world() {
        let bounds = Rect::new(0.0, 0.0, 800.0, 600.0);
        let mut camera = bounded_camera(bounds);
        let targets = [
            Vec2::new(-500.0, -500.0),
            Vec2::new(0.0, 300.0),
            Vec2::new(400.0, 300.0),
            Vec2::new(799.0, 1.0),
            Vec2::new(5000.0, 5000.0),
        ];
        for target in targets {
            camera.look_at(target);
            assert!(view_inside(&camera, bounds), "target={target:?}");
        }
    }

    #[test]
    fn out_of_range_axis_keeps_its_current_value() {
        let mut camera = bounded_camera(Rect::new(0.0, 0.0, 800.0, 600.0));
        camera.look_at(Vec2::new(400.0, 300.0));
        assert_eq!(camera.position(), Vec2::new(400.0, 300.0));

        camera.look_at(Vec2::new(-100.0, 250.0));
        assert_eq!(camera.position(), Vec2::new(400.0, 250.0));

        camera.look_at(Vec2::new(500.0, 900.0));
        assert_eq!(camera.position(), Vec2::new(500.0, 250.0));

        camera.look_at(Vec2::new(640.0, 480.0));
        assert_eq!(camera.position(), Vec2::new(640.0, 480.0));
    }

    #[test]
    fn center_on_clamps_each_axis_to_world() {
        let mut camera = bounded_camera(Rect::new(0.0, 0.0, 800.0, 600.0));
        camera.center_on(Vec2::new(-100.0, 300.0));
        assert_eq!(camera.position(), Vec2::new(160.0, 300.0));

        camera.center_on(Vec2::new(400.0, 900.0));
        assert_eq!(camera.position(), Vec2::new(400.0, 480.0));
    }

    #[test]
    fn new_bounds_pull_camera_back_inside_world() {
        let mut camera = bounded_camera(Rect::new(0.0, 0.0, 2000.0, 2000.0));
        camera.look_at(Vec2::new(1500.0, 1500.0));

        let smaller = Rect::new(0.0, 0.0, 800.0, 600.0);
        camera.set_world_bounds(smaller);

        assert_eq!(camera.position(), Vec2::new(640.0, 480.0));
        assert!(view_inside(&camera, smaller));
    }

    #[test]
    fn small_world_axis_allows_movement_within_margin() {
        let mut camera = bounded_camera(Rect::new(0.0, 0.0, 200.0, 600.0));
        camera.look_at(Vec2::new(100.0, 300.0));
        assert_eq!(camera.position().x, 100.0);

        camera.look_at(Vec2::new(-400.0, 300.0));
        assert_eq!(camera.position().x, -48.0);
        camera.look_at(Vec2::new(400.0, 300.0));
        assert_eq!(camera.position().x, 248.0);
    }

    #[test]
    fn screen_translation_round_trips() {
        let mut camera = bounded_camera(Rect::new(0.0, 0.0, 2000.0, 2000.0));
        camera.look_at(Vec2::new(523.5, 911.25));
        for point in [
            Vec2::new(0.0, 0.0),
            Vec2::new(523.5, 911.25),
            Vec2::new(-37.0, 12.5),
            Vec2::new(1999.0, 3.0),
        ] {
            let screen = camera.translate_point_to_screen(point);
            let back = camera.translate_from_screen(screen);
            assert!((back.x - point.x).abs() < 1e-3, "point={point:?}");
            assert!((back.y - point.y).abs() < 1e-3, "point={point:?}");
        }
    }

    #[test]
    fn translate_to_screen_offsets_origin_by_half_viewport_minus_position() {
        let mut camera = Camera::with_seed(VIEWPORT, 3);
        camera.look_at(Vec2::new(200.0, 150.0));
        let screen = camera.translate_to_screen(Rect::new(200.0, 150.0, 16.0, 16.0));
        assert_eq!(screen, Rect::new(160.0, 120.0, 16.0, 16.0));
    }

    #[test]
    fn shake_offsets_stay_bounded_and_expire() {
        let mut camera = bounded_camera(Rect::new(0.0, 0.0, 2000.0, 2000.0));
        camera.look_at(Vec2::new(1000.0, 1000.0));
        camera.shake(4.0, Duration::from_millis(100));

        for _ in 0..9 {
            camera.update(Duration::from_millis(10));
            let offset = camera.shake_offset();
            assert!(offset.x.abs() <= 4.0 && offset.y.abs() <= 4.0);
            assert!(camera.is_shaking());
        }

        camera.update(Duration::from_millis(10));
        assert!(!camera.is_shaking());
        assert_eq!(camera.shake_offset(), Vec2::ZERO);
        assert_eq!(camera.effective_position(), camera.position());
    }

    #[test]
    fn zero_length_shake_is_ignored() {
        let mut camera = Camera::with_seed(VIEWPORT, 9);
        camera.shake(3.0, Duration::ZERO);
        assert!(!camera.is_shaking());
    }
}
