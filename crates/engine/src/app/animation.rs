use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use thiserror::Error;

use super::geometry::{PixelRect, Vec2};
use super::rendering::{Flip, TextureInfo};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FrameCoord {
    pub row: u32,
    pub col: u32,
}

impl FrameCoord {
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationDesc {
    pub start: FrameCoord,
    pub end: FrameCoord,
    pub duration: Duration,
    pub looping: bool,
    pub flip: Flip,
}

impl AnimationDesc {
    /// `(end.row - start.row) * columns + (end.col - start.col) + 1`, or `None`
    /// when the range is empty.
    pub fn frame_count(&self, columns: u32) -> Option<u32> {
        let rows = i64::from(self.end.row) - i64::from(self.start.row);
        let cols = i64::from(self.end.col) - i64::from(self.start.col);
        let count = rows * i64::from(columns) + cols + 1;
        if count < 1 {
            return None;
        }
        u32::try_from(count).ok()
    }

    /// `floor(elapsed / (duration / frames)) mod frames`.
    pub fn frame_index(&self, columns: u32, elapsed: Duration) -> u32 {
        let Some(frames) = self.frame_count(columns) else {
            return 0;
        };
        let duration_nanos = self.duration.as_nanos();
        if duration_nanos == 0 {
            return 0;
        }
        let frames = u128::from(frames);
        let index = elapsed.as_nanos().saturating_mul(frames) / duration_nanos % frames;
        index as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetGrid {
    pub rows: u32,
    pub columns: u32,
    pub frame_width: u32,
    pub frame_height: u32,
}

impl SheetGrid {
    pub fn frame_rect(&self, coord: FrameCoord) -> PixelRect {
        PixelRect::new(
            coord.col * self.frame_width,
            coord.row * self.frame_height,
            self.frame_width,
            self.frame_height,
        )
    }

    pub fn contains(&self, coord: FrameCoord) -> bool {
        coord.row < self.rows && coord.col < self.columns
    }
}

#[derive(Debug)]
pub struct SpriteSheet {
    pub source: String,
    pub texture: TextureInfo,
    pub grid: SheetGrid,
    pub pivot: Vec2,
    animations: HashMap<String, AnimationDesc>,
}

impl SpriteSheet {
    pub fn new(
        source: impl Into<String>,
        texture: TextureInfo,
        grid: SheetGrid,
        pivot: Vec2,
        animations: HashMap<String, AnimationDesc>,
    ) -> Self {
        Self {
            source: source.into(),
            texture,
            grid,
            pivot,
            animations,
        }
    }

    pub fn animation(&self, name: &str) -> Option<&AnimationDesc> {
        self.animations.get(name)
    }

    pub fn animation_names(&self) -> impl Iterator<Item = &str> {
        self.animations.keys().map(String::as_str)
    }

    pub fn base_frame(&self) -> PixelRect {
        self.grid.frame_rect(FrameCoord::default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnimationError {
    #[error("sprite sheet {sheet} has no animation named '{name}'")]
    UnknownAnimation { sheet: String, name: String },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationFrame {
    pub source: PixelRect,
    pub flip: Flip,
}

#[derive(Debug, Clone, PartialEq)]
struct ActiveAnimation {
    name: String,
    started_at: Duration,
}

/// Selects sprite-sheet frames from elapsed wall time. Looping and
/// non-looping animations cycle the same way; callers stop non-looping
/// animations themselves once [`SpriteAnimator::is_finished`] reports true.
#[derive(Debug, Clone)]
pub struct SpriteAnimator {
    sheet: Rc<SpriteSheet>,
    active: Option<ActiveAnimation>,
}

impl SpriteAnimator {
    pub fn new(sheet: Rc<SpriteSheet>) -> Self {
        Self {
            sheet,
            active: None,
        }
    }

    pub fn sheet(&self) -> &Rc<SpriteSheet> {
        &self.sheet
    }

    /// Starts `name` at `now`. Re-activating the running animation keeps its
    /// start time; an unknown name leaves the current animation untouched.
    pub fn activate(&mut self, name: &str, now: Duration) -> Result<(), AnimationError> {
        if self.active_name() == Some(name) {
            return Ok(());
        }
        if self.sheet.animation(name).is_none() {
            return Err(AnimationError::UnknownAnimation {
                sheet: self.sheet.source.clone(),
                name: name.to_string(),
            });
        }
        self.active = Some(ActiveAnimation {
            name: name.to_string(),
            started_at: now,
        });
        Ok(())
    }

    pub fn stop(&mut self) {
        self.active = None;
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active.as_ref().map(|active| active.name.as_str())
    }

    fn active_desc(&self) -> Option<(&ActiveAnimation, &AnimationDesc)> {
        let active = self.active.as_ref()?;
        let desc = self.sheet.animation(&active.name)?;
        Some((active, desc))
    }

    pub fn elapsed(&self, now: Duration) -> Option<Duration> {
        self.active
            .as_ref()
            .map(|active| now.saturating_sub(active.started_at))
    }

    pub fn active_duration(&self) -> Option<Duration> {
        self.active_desc().map(|(_, desc)| desc.duration)
    }

    /// True once a non-looping animation has run for its full duration.
    pub fn is_finished(&self, now: Duration) -> bool {
        match self.active_desc() {
            Some((active, desc)) => {
                !desc.looping && now.saturating_sub(active.started_at) >= desc.duration
            }
            None => false,
        }
    }

    pub fn frame_index(&self, now: Duration) -> Option<u32> {
        let (active, desc) = self.active_desc()?;
        let elapsed = now.saturating_sub(active.started_at);
        Some(desc.frame_index(self.sheet.grid.columns, elapsed))
    }

    pub fn current_frame(&self, now: Duration) -> AnimationFrame {
        let Some((active, desc)) = self.active_desc() else {
            return AnimationFrame {
                source: self.sheet.base_frame(),
                flip: Flip::default(),
            };
        };
        let grid = self.sheet.grid;
        let elapsed = now.saturating_sub(active.started_at);
        let index = desc.frame_index(grid.columns, elapsed);
        let linear = desc.start.row * grid.columns + desc.start.col + index;
        let coord = FrameCoord::new(linear / grid.columns, linear % grid.columns);
        AnimationFrame {
            source: grid.frame_rect(coord),
            flip: desc.flip,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::rendering::TextureHandle;

    fn walk_desc(looping: bool) -> AnimationDesc {
        AnimationDesc {
            start: FrameCoord::new(0, 0),
            end: FrameCoord::new(0, 3),
            duration: Duration::from_millis(1000),
            looping,
            flip: Flip::default(),
        }
    }

    fn sheet() -> Rc<SpriteSheet> {
        let mut animations = HashMap::new();
        animations.insert("walk".to_string(), walk_desc(true));
        animations.insert("once".to_string(), walk_desc(false));
        animations.insert(
            "wrap".to_string(),
            AnimationDesc {
                start: FrameCoord::new(0, 2),
                end: FrameCoord::new(1, 1),
                duration: Duration::from_millis(400),
                looping: true,
                flip: Flip {
                    horizontal: true,
                    vertical: false,
                },
            },
        );
        Rc::new(SpriteSheet::new(
            "sprites/test.json",
            TextureInfo {
                handle: TextureHandle(1),
                width: 64,
                height: 32,
            },
            SheetGrid {
                rows: 2,
                columns: 4,
                frame_width: 16,
                frame_height: 16,
            },
            Vec2::ZERO,
            animations,
        ))
    }

    #[test]
    fn frame_count_follows_row_major_range() {
        assert_eq!(walk_desc(true).frame_count(4), Some(4));
        let two_rows = AnimationDesc {
            start: FrameCoord::new(0, 2),
            end: FrameCoord::new(1, 1),
            ..walk_desc(true)
        };
        assert_eq!(two_rows.frame_count(4), Some(4));
        let backwards = AnimationDesc {
            start: FrameCoord::new(1, 0),
            end: FrameCoord::new(0, 0),
            ..walk_desc(true)
        };
        assert_eq!(backwards.frame_count(4), None);
    }

    #[test]
    fn looping_animation_wraps_by_elapsed_time() {
        let desc = walk_desc(true);
        assert_eq!(desc.frame_index(4, Duration::from_millis(0)), 0);
        assert_eq!(desc.frame_index(4, Duration::from_millis(250)), 1);
        assert_eq!(desc.frame_index(4, Duration::from_millis(999)), 3);
        assert_eq!(desc.frame_index(4, Duration::from_millis(1250)), 1);
    }

    #[test]
    fn frame_index_is_in_range_and_periodic() {
        let desc = walk_desc(true);
        for ms in (0..5000).step_by(37) {
            let elapsed = Duration::from_millis(ms);
            let index = desc.frame_index(4, elapsed);
            assert!(index < 4, "ms={ms}");
            assert_eq!(
                index,
                desc.frame_index(4, elapsed + desc.duration),
                "ms={ms}"
            );
        }
    }

    #[test]
    fn without_active_animation_base_frame_is_used() {
        let animator = SpriteAnimator::new(sheet());
        let frame = animator.current_frame(Duration::from_secs(3));
        assert_eq!(frame.source, PixelRect::new(0, 0, 16, 16));
        assert_eq!(animator.frame_index(Duration::from_secs(3)), None);
    }

    #[test]
    fn activation_records_start_time_and_is_idempotent() {
        let mut animator = SpriteAnimator::new(sheet());
        animator
            .activate("walk", Duration::from_millis(500))
            .expect("walk");
        animator
            .activate("walk", Duration::from_millis(900))
            .expect("walk again");

        assert_eq!(
            animator.elapsed(Duration::from_millis(750)),
            Some(Duration::from_millis(250))
        );
        assert_eq!(animator.frame_index(Duration::from_millis(750)), Some(1));
        let frame = animator.current_frame(Duration::from_millis(750));
        assert_eq!(frame.source, PixelRect::new(16, 0, 16, 16));
    }

    #[test]
    fn switching_animation_resets_start_time() {
        let mut animator = SpriteAnimator::new(sheet());
        animator.activate("walk", Duration::ZERO).expect("walk");
        animator
            .activate("once", Duration::from_millis(600))
            .expect("once");
        assert_eq!(animator.frame_index(Duration::from_millis(600)), Some(0));
    }

    #[test]
    fn unknown_animation_keeps_current_one() {
        let mut animator = SpriteAnimator::new(sheet());
        animator.activate("walk", Duration::ZERO).expect("walk");

        let error = animator
            .activate("fly", Duration::from_millis(10))
            .expect_err("unknown");

        assert!(matches!(error, AnimationError::UnknownAnimation { ref name, .. } if name == "fly"));
        assert_eq!(animator.active_name(), Some("walk"));
        assert_eq!(animator.elapsed(Duration::from_millis(10)), Some(Duration::from_millis(10)));
    }

    #[test]
    fn frames_continue_across_sheet_rows() {
        let mut animator = SpriteAnimator::new(sheet());
        animator.activate("wrap", Duration::ZERO).expect("wrap");

        let sources: Vec<PixelRect> = [0u64, 100, 200, 300]
            .into_iter()
            .map(|ms| animator.current_frame(Duration::from_millis(ms)).source)
            .collect();

        assert_eq!(
            sources,
            vec![
                PixelRect::new(32, 0, 16, 16),
                PixelRect::new(48, 0, 16, 16),
                PixelRect::new(0, 16, 16, 16),
                PixelRect::new(16, 16, 16, 16),
            ]
        );
        assert!(animator.current_frame(Duration::ZERO).flip.horizontal);
    }

    #[test]
    fn non_looping_animation_reports_finished_but_keeps_cycling() {
        let mut animator = SpriteAnimator::new(sheet());
        animator.activate("once", Duration::ZERO).expect("once");

        assert!(!animator.is_finished(Duration::from_millis(999)));
        assert!(animator.is_finished(Duration::from_millis(1000)));
        assert_eq!(animator.active_name(), Some("once"));
        assert_eq!(animator.frame_index(Duration::from_millis(1250)), Some(1));

        animator.stop();
        assert_eq!(animator.active_name(), None);
        assert!(!animator.is_finished(Duration::from_millis(1250)));
    }
}
