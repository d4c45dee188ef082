use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Loop health over one log window. `worst_frame_ms` catches single-frame
/// spikes that the average hides; `dropped_backlog_ms` sums sim time the
/// tick cap threw away.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub fps: f32,
    pub tps: f32,
    pub frame_time_ms: f32,
    pub worst_frame_ms: f32,
    pub dropped_backlog_ms: u64,
    pub entity_count: usize,
}

/// Shared handle onto the most recent window. A reader panicking while
/// holding the lock must not take the render loop down, so both sides
/// recover the inner value instead of propagating the poison.
#[derive(Clone, Debug, Default)]
pub struct MetricsHandle {
    latest: Arc<Mutex<LoopMetricsSnapshot>>,
}

impl MetricsHandle {
    pub fn latest(&self) -> LoopMetricsSnapshot {
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn publish(&self, snapshot: LoopMetricsSnapshot) {
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = snapshot;
    }
}

#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    log_interval: Duration,
    window_start: Instant,
    frames: u32,
    ticks: u32,
    frame_time_total: Duration,
    worst_frame: Duration,
    dropped_backlog: Duration,
}

impl MetricsAccumulator {
    pub(crate) fn new(log_interval: Duration) -> Self {
        Self {
            log_interval,
            window_start: Instant::now(),
            frames: 0,
            ticks: 0,
            frame_time_total: Duration::ZERO,
            worst_frame: Duration::ZERO,
            dropped_backlog: Duration::ZERO,
        }
    }

    pub(crate) fn record_frame(&mut self, frame_dt: Duration) {
        self.frames = self.frames.saturating_add(1);
        self.frame_time_total = self.frame_time_total.saturating_add(frame_dt);
        self.worst_frame = self.worst_frame.max(frame_dt);
    }

    pub(crate) fn record_tick(&mut self) {
        self.ticks = self.ticks.saturating_add(1);
    }

    pub(crate) fn record_backlog_drop(&mut self, dropped: Duration) {
        self.dropped_backlog = self.dropped_backlog.saturating_add(dropped);
    }

    /// Closes the window and starts the next one once `log_interval` has
    /// elapsed; `entity_count` is sampled at close time, not accumulated.
    pub(crate) fn maybe_snapshot(
        &mut self,
        now: Instant,
        entity_count: usize,
    ) -> Option<LoopMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.log_interval {
            return None;
        }

        let elapsed_seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let frame_time_ms = if self.frames == 0 {
            0.0
        } else {
            self.frame_time_total.as_secs_f32() * 1000.0 / self.frames as f32
        };

        let snapshot = LoopMetricsSnapshot {
            fps: self.frames as f32 / elapsed_seconds,
            tps: self.ticks as f32 / elapsed_seconds,
            frame_time_ms,
            worst_frame_ms: self.worst_frame.as_secs_f32() * 1000.0,
            dropped_backlog_ms: self.dropped_backlog.as_millis() as u64,
            entity_count,
        };

        self.window_start = now;
        self.frames = 0;
        self.ticks = 0;
        self.frame_time_total = Duration::ZERO;
        self.worst_frame = Duration::ZERO;
        self.dropped_backlog = Duration::ZERO;

        Some(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn window_reports_rates_spike_and_backlog() {
        let mut accumulator = MetricsAccumulator::new(Duration::from_secs(1));
        let base = accumulator.window_start;

        accumulator.record_frame(Duration::from_millis(10));
        accumulator.record_frame(Duration::from_millis(30));
        for _ in 0..4 {
            accumulator.record_tick();
        }
        accumulator.record_backlog_drop(Duration::from_millis(48));
        accumulator.record_backlog_drop(Duration::from_millis(16));

        let snapshot = accumulator
            .maybe_snapshot(base + Duration::from_secs(2), 7)
            .expect("window should close");

        assert!((snapshot.fps - 1.0).abs() < 0.001);
        assert!((snapshot.tps - 2.0).abs() < 0.001);
        assert!((snapshot.frame_time_ms - 20.0).abs() < 0.001);
        assert!((snapshot.worst_frame_ms - 30.0).abs() < 0.001);
        assert_eq!(snapshot.dropped_backlog_ms, 64);
        assert_eq!(snapshot.entity_count, 7);
    }

    #[test]
    fn window_does_not_close_before_interval() {
        let mut accumulator = MetricsAccumulator::new(Duration::from_secs(1));
        let base = accumulator.window_start;
        accumulator.record_frame(Duration::from_millis(16));

        assert!(accumulator
            .maybe_snapshot(base + Duration::from_millis(500), 0)
            .is_none());
    }

    #[test]
    fn closing_a_window_resets_every_gauge() {
        let mut accumulator = MetricsAccumulator::new(Duration::from_secs(1));
        let base = accumulator.window_start;

        accumulator.record_frame(Duration::from_millis(40));
        accumulator.record_tick();
        accumulator.record_backlog_drop(Duration::from_millis(32));
        accumulator
            .maybe_snapshot(base + Duration::from_secs(1), 3)
            .expect("first window");

        let second = accumulator
            .maybe_snapshot(base + Duration::from_secs(2), 3)
            .expect("second window");
        assert_eq!(second.fps, 0.0);
        assert_eq!(second.frame_time_ms, 0.0);
        assert_eq!(second.worst_frame_ms, 0.0);
        assert_eq!(second.dropped_backlog_ms, 0);
    }

    #[test]
    fn handle_round_trips_latest_snapshot() {
        let handle = MetricsHandle::default();
        let published = LoopMetricsSnapshot {
            fps: 59.5,
            tps: 60.0,
            frame_time_ms: 16.4,
            worst_frame_ms: 21.0,
            dropped_backlog_ms: 0,
            entity_count: 240,
        };

        handle.publish(published);
        assert_eq!(handle.latest(), published);
    }

    #[test]
    fn handle_survives_a_poisoned_lock() {
        let handle = MetricsHandle::default();
        let poisoner = handle.clone();
        let _ = thread::spawn(move || {
            let _guard = poisoner.latest.lock().expect("lock");
            panic!("poison metrics lock");
        })
        .join();

        let published = LoopMetricsSnapshot {
            tps: 60.0,
            ..LoopMetricsSnapshot::default()
        };
        handle.publish(published);
        assert_eq!(handle.latest(), published);
    }
}
