//! Synthetic telemetry for the dashboard. Decorative only: a random walk kept inside fixed
//! ranges, with a battery that only drains.

use std::collections::VecDeque;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

pub const DEFAULT_WINDOW_LEN: usize = 20;

pub const TORQUE_MIN: f64 = 20.0;
pub const TORQUE_MAX: f64 = 90.0;
pub const TEMP_MIN: f64 = 30.0;
pub const TEMP_MAX: f64 = 60.0;

/// Shortest tick period; `tokio::time::interval` rejects zero.
pub const MIN_TICK_PERIOD: Duration = Duration::from_millis(1);

const TORQUE_STEP: f64 = 15.0;
const TEMP_STEP: f64 = 2.0;
const BATTERY_DRAIN_PER_TICK: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    pub time: u64,
    /// Percent of rated torque.
    pub torque: f64,
    /// Degrees Celsius.
    pub temp: f64,
    /// Percent remaining.
    pub battery: f64,
}

/// Fixed-length sliding window; each tick drops the oldest sample and appends one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryWindow {
    samples: VecDeque<TelemetrySample>,
}

impl TelemetryWindow {
    pub fn new(len: usize) -> Self {
        Self::seeded(len, &mut rand::thread_rng())
    }

    /// Initial window: torque around 40-60, temp around 38-43, battery draining 0.5 per sample.
    pub fn seeded<R: Rng>(len: usize, rng: &mut R) -> Self {
        let samples = (0..len.max(1))
            .map(|i| TelemetrySample {
                time: i as u64,
                torque: 40.0 + rng.gen::<f64>() * 20.0,
                temp: 38.0 + rng.gen::<f64>() * 5.0,
                battery: (100.0 - i as f64 * 0.5).max(0.0),
            })
            .collect();
        Self { samples }
    }

    /// Advance one step and return the new sample.
    pub fn tick<R: Rng>(&mut self, rng: &mut R) -> TelemetrySample {
        let last = self.latest();
        let next = TelemetrySample {
            time: last.time + 1,
            torque: (last.torque + (rng.gen::<f64>() - 0.5) * TORQUE_STEP).clamp(TORQUE_MIN, TORQUE_MAX),
            temp: (last.temp + (rng.gen::<f64>() - 0.5) * TEMP_STEP).clamp(TEMP_MIN, TEMP_MAX),
            battery: (last.battery - BATTERY_DRAIN_PER_TICK).max(0.0),
        };
        self.samples.pop_front();
        self.samples.push_back(next);
        next
    }

    pub fn latest(&self) -> TelemetrySample {
        // Never empty: seeded with at least one sample and every tick pushes after popping.
        self.samples[self.samples.len() - 1]
    }

    pub fn samples(&self) -> impl Iterator<Item = &TelemetrySample> {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl Default for TelemetryWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_LEN)
    }
}

/// Periodic task handle. The timer is released when the ticker is stopped or dropped.
pub struct TelemetryTicker {
    handle: JoinHandle<()>,
}

impl TelemetryTicker {
    /// Run `on_tick` every `period` (at least [`MIN_TICK_PERIOD`]), starting one period from
    /// now. Needs a tokio runtime.
    pub fn spawn<F, Fut>(period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let period = period.max(MIN_TICK_PERIOD);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                interval.tick().await;
                on_tick().await;
            }
        });
        Self { handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Cancel the task now. Dropping the ticker does the same.
    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for TelemetryTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    #[test]
    fn seeded_window_is_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let window = TelemetryWindow::seeded(DEFAULT_WINDOW_LEN, &mut rng);
        assert_eq!(window.len(), DEFAULT_WINDOW_LEN);
        for (i, s) in window.samples().enumerate() {
            assert_eq!(s.time, i as u64);
            assert!((40.0..60.0).contains(&s.torque));
            assert!((38.0..43.0).contains(&s.temp));
        }
        assert_eq!(window.latest().battery, 90.5);
    }

    #[test]
    fn ticks_respect_bounds_and_drain_battery() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut window = TelemetryWindow::seeded(DEFAULT_WINDOW_LEN, &mut rng);
        let mut prev = window.latest();
        for _ in 0..5_000 {
            let next = window.tick(&mut rng);
            assert_eq!(window.len(), DEFAULT_WINDOW_LEN);
            assert_eq!(next.time, prev.time + 1);
            assert!(next.battery <= prev.battery);
            assert!(next.battery >= 0.0);
            assert!((TORQUE_MIN..=TORQUE_MAX).contains(&next.torque));
            assert!((TEMP_MIN..=TEMP_MAX).contains(&next.temp));
            prev = next;
        }
        assert_eq!(prev.battery, 0.0);
    }

    #[test]
    fn oldest_sample_is_dropped() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut window = TelemetryWindow::seeded(3, &mut rng);
        window.tick(&mut rng);
        let times: Vec<u64> = window.samples().map(|s| s.time).collect();
        assert_eq!(times, vec![1, 2, 3]);
    }

    #[test]
    fn zero_length_window_keeps_one_sample() {
        let window = TelemetryWindow::new(0);
        assert_eq!(window.len(), 1);
    }

    #[tokio::test]
    async fn ticker_stops_on_drop() {
        let count = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&count);
        let ticker = TelemetryTicker::spawn(Duration::from_millis(10), move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(ticker.is_running());
        assert!(count.load(Ordering::SeqCst) >= 2);

        drop(ticker);
        tokio::time::sleep(Duration::from_millis(30)).await;
        let frozen = count.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(count.load(Ordering::SeqCst), frozen);
    }

    fn counting_ticker(period: Duration) -> (TelemetryTicker, Arc<AtomicU64>) {
        let count = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&count);
        let ticker = TelemetryTicker::spawn(period, move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        (ticker, count)
    }

    #[tokio::test]
    async fn zero_period_is_clamped_instead_of_panicking() {
        let (ticker, count) = counting_ticker(Duration::ZERO);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(ticker.is_running());
        assert!(count.load(Ordering::SeqCst) >= 1);
        ticker.stop();
    }

    #[tokio::test]
    async fn stop_halts_ticking() {
        let (ticker, count) = counting_ticker(Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(40)).await;
        ticker.stop();
        tokio::time::sleep(Duration::from_millis(20)).await;
        let frozen = count.load(Ordering::SeqCst);
        assert!(frozen >= 1);
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(count.load(Ordering::SeqCst), frozen);
    }
}
