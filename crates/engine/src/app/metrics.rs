use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tracing::warn;

static METRICS_LOCK_POISON_WARNED: AtomicBool = AtomicBool::new(false);

fn warn_poisoned_once(operation: &'static str) {
    if !METRICS_LOCK_POISON_WARNED.swap(true, Ordering::Relaxed) {
        warn!(operation, "metrics_lock_poisoned");
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub fps: f32,
    pub frame_time_ms: f32,
    pub worst_frame_ms: f32,
    pub entity_count: usize,
}

/// Latest loop metrics, readable from outside the window loop.
#[derive(Clone, Debug, Default)]
pub struct MetricsHandle {
    latest: Arc<RwLock<LoopMetricsSnapshot>>,
}

impl MetricsHandle {
    pub fn snapshot(&self) -> LoopMetricsSnapshot {
        match self.latest.read() {
            Ok(guard) => *guard,
            Err(poisoned) => {
                warn_poisoned_once("read");
                *poisoned.into_inner()
            }
        }
    }

    pub(crate) fn publish(&self, snapshot: LoopMetricsSnapshot) {
        match self.latest.write() {
            Ok(mut guard) => *guard = snapshot,
            Err(poisoned) => {
                warn_poisoned_once("write");
                *poisoned.into_inner() = snapshot;
            }
        }
    }
}

#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    interval_start: Instant,
    interval: Duration,
    frames: u32,
    frame_time_sum: Duration,
    worst_frame: Duration,
}

impl MetricsAccumulator {
    pub(crate) fn starting_at(start: Instant, interval: Duration) -> Self {
        Self {
            interval_start: start,
            interval,
            frames: 0,
            frame_time_sum: Duration::ZERO,
            worst_frame: Duration::ZERO,
        }
    }

    pub(crate) fn record_frame(&mut self, frame_dt: Duration) {
        self.frames = self.frames.saturating_add(1);
        self.frame_time_sum = self.frame_time_sum.saturating_add(frame_dt);
        self.worst_frame = self.worst_frame.max(frame_dt);
    }

    /// Emits and resets once `interval` has passed since the last snapshot.
    pub(crate) fn maybe_snapshot(
        &mut self,
        now: Instant,
        entity_count: usize,
    ) -> Option<LoopMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.interval_start);
        if elapsed < self.interval {
            return None;
        }

        let frame_time_ms = if self.frames == 0 {
            0.0
        } else {
            self.frame_time_sum.as_secs_f32() * 1000.0 / self.frames as f32
        };
        let snapshot = LoopMetricsSnapshot {
            fps: self.frames as f32 / elapsed.as_secs_f32().max(f32::EPSILON),
            frame_time_ms,
            worst_frame_ms: self.worst_frame.as_secs_f32() * 1000.0,
            entity_count,
        };

        *self = Self::starting_at(now, self.interval);
        Some(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn snapshot_averages_frames_over_interval() {
        let base = Instant::now();
        let mut accumulator = MetricsAccumulator::starting_at(base, Duration::from_secs(1));
        accumulator.record_frame(Duration::from_millis(10));
        accumulator.record_frame(Duration::from_millis(30));

        let snapshot = accumulator
            .maybe_snapshot(base + Duration::from_secs(2), 7)
            .expect("snapshot");

        assert!((snapshot.fps - 1.0).abs() < 0.01);
        assert!((snapshot.frame_time_ms - 20.0).abs() < 0.01);
        assert!((snapshot.worst_frame_ms - 30.0).abs() < 0.01);
        assert_eq!(snapshot.entity_count, 7);
    }

    #[test]
    fn nothing_is_emitted_before_interval_and_counters_reset_after() {
        let base = Instant::now();
        let mut accumulator = MetricsAccumulator::starting_at(base, Duration::from_secs(1));
        accumulator.record_frame(Duration::from_millis(16));
        assert!(accumulator
            .maybe_snapshot(base + Duration::from_millis(500), 0)
            .is_none());

        assert!(accumulator
            .maybe_snapshot(base + Duration::from_secs(1), 0)
            .is_some());
        let empty = accumulator
            .maybe_snapshot(base + Duration::from_secs(2), 0)
            .expect("second snapshot");
        assert_eq!(empty.fps, 0.0);
        assert_eq!(empty.worst_frame_ms, 0.0);
    }

    #[test]
    fn handle_survives_poisoned_lock() {
        let handle = MetricsHandle::default();
        let lock = Arc::clone(&handle.latest);
        let _ = thread::spawn(move || {
            let _guard = lock.write().expect("write guard");
            panic!("poison metrics lock");
        })
        .join();

        let expected = LoopMetricsSnapshot {
            fps: 30.0,
            frame_time_ms: 33.0,
            worst_frame_ms: 40.0,
            entity_count: 3,
        };
        handle.publish(expected);
        assert_eq!(handle.snapshot(), expected);
    }
}
