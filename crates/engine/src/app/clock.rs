use std::time::{Duration, Instant};

pub const DEFAULT_MAX_FRAME_DELTA: Duration = Duration::from_millis(250);

/// Timing for one frame. `now` is measured from clock start and is never clamped;
/// `delta` is clamped to the clock's maximum frame delta.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameTime {
    pub now: Duration,
    pub delta: Duration,
}

impl FrameTime {
    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }
}

#[derive(Debug, Clone)]
pub struct Clock {
    origin: Instant,
    last_sample: Instant,
    max_frame_delta: Duration,
}

impl Clock {
    pub fn new(max_frame_delta: Duration) -> Self {
        Self::starting_at(Instant::now(), max_frame_delta)
    }

    pub fn starting_at(origin: Instant, max_frame_delta: Duration) -> Self {
        Self {
            origin,
            last_sample: origin,
            max_frame_delta: normalize_non_zero_duration(max_frame_delta, DEFAULT_MAX_FRAME_DELTA),
        }
    }

    pub fn origin(&self) -> Instant {
        self.origin
    }

    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, sample: Instant) -> FrameTime {
        let raw_delta = sample.saturating_duration_since(self.last_sample);
        if sample > self.last_sample {
            self.last_sample = sample;
        }
        FrameTime {
            now: self.last_sample.saturating_duration_since(self.origin),
            delta: clamp_frame_delta(raw_delta, self.max_frame_delta),
        }
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}
