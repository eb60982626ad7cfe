use std::time::{Duration, Instant};

/// Sine-eased transition of the panel chrome between its idle look (`0.0`)
/// and its maximized look (`1.0`).
#[derive(Debug, Clone, Copy)]
pub struct Fade {
    from:     f32,
    to:       f32,
    started:  Instant,
    duration: Duration,
}

impl Fade {
    /// A fade that has already settled at `level`.
    pub fn settled(level: f32) -> Self {
        Self {
            from: level,
            to: level,
            started: Instant::now(),
            duration: Duration::ZERO,
        }
    }

    /// Level at `now`, in `[0, 1]`.
    pub fn level_at(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return self.to;
        }
        let t = now.saturating_duration_since(self.started).as_secs_f32()
            / self.duration.as_secs_f32();
        let eased = (t.clamp(0.0, 1.0) * std::f32::consts::FRAC_PI_2).sin();
        self.from + (self.to - self.from) * eased
    }

    /// Where the fade is heading.
    pub fn target(&self) -> f32 {
        self.to
    }

    pub fn is_running(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.started) < self.duration
    }

    /// Start heading towards `target` from wherever the fade is right now.
    /// Returns `false` (and does nothing) if already heading there.
    pub fn retarget(&mut self, target: f32, duration: Duration, now: Instant) -> bool {
        if (self.to - target).abs() < f32::EPSILON {
            return false;
        }
        *self = Self {
            from: self.level_at(now),
            to: target,
            started: now,
            duration,
        };
        true
    }
}

impl Default for Fade {
    fn default() -> Self {
        Self::settled(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eases_from_start_to_target() {
        let start = Instant::now();
        let mut fade = Fade::settled(0.0);
        assert!(fade.retarget(1.0, Duration::from_millis(500), start));

        assert_eq!(fade.level_at(start), 0.0);
        let mid = fade.level_at(start + Duration::from_millis(250));
        assert!((mid - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-3);
        assert_eq!(fade.level_at(start + Duration::from_secs(2)), 1.0);
        assert!(!fade.is_running(start + Duration::from_secs(2)));
    }

    #[test]
    fn retarget_to_same_target_is_a_noop() {
        let now = Instant::now();
        let mut fade = Fade::settled(1.0);
        assert!(!fade.retarget(1.0, Duration::from_millis(500), now));
    }

    #[test]
    fn reversing_midway_starts_from_current_level() {
        let start = Instant::now();
        let mut fade = Fade::settled(0.0);
        fade.retarget(1.0, Duration::from_millis(500), start);

        let mid = start + Duration::from_millis(250);
        let level = fade.level_at(mid);
        fade.retarget(0.0, Duration::from_millis(500), mid);
        assert!((fade.level_at(mid) - level).abs() < 1e-6);
    }
}
