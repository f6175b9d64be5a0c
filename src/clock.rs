//! Clock and sleep primitives.
//!
//! Both sides of "time" are behind traits so the orchestration loops can be
//! driven deterministically in tests: [`Clock`] answers "what time is it",
//! [`Sleeper`] performs the actual suspension. Production code pairs
//! [`SystemClock`] with [`TokioSleeper`]; tests pair [`ManualClock`] with
//! [`InstantSleeper`], [`TrackingSleeper`], or [`SimulatedSleeper`].
//!
//! All waits are cooperative suspension points; nothing here blocks a thread.

use futures::future::BoxFuture;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

/// Wall-clock abstraction so deadlines can be faked in tests.
pub trait Clock: Send + Sync + std::fmt::Debug {
    fn now(&self) -> SystemTime;
}

/// Production clock backed by `SystemTime::now()`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Test clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<SystemTime>>,
}

impl ManualClock {
    pub fn starting_at(now: SystemTime) -> Self {
        Self { now: Arc::new(Mutex::new(now)) }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }

    pub fn set(&self, to: SystemTime) {
        *self.now.lock().unwrap() = to;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::starting_at(SystemTime::UNIX_EPOCH)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        *self.now.lock().unwrap()
    }
}

/// Abstraction for suspending the current task.
pub trait Sleeper: Send + Sync + std::fmt::Debug {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()>;
}

/// Production sleeper using the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Test sleeper that returns immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct InstantSleeper;

impl Sleeper for InstantSleeper {
    fn sleep(&self, _duration: Duration) -> BoxFuture<'static, ()> {
        Box::pin(async {})
    }
}

/// Test sleeper that records every requested duration without sleeping.
#[derive(Debug, Default, Clone)]
pub struct TrackingSleeper {
    calls: Arc<Mutex<Vec<Duration>>>,
}

impl TrackingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Duration> {
        self.calls.lock().unwrap().clone()
    }

    pub fn total_slept(&self) -> Duration {
        self.calls.lock().unwrap().iter().sum()
    }
}

impl Sleeper for TrackingSleeper {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        self.calls.lock().unwrap().push(duration);
        Box::pin(async {})
    }
}

/// Test sleeper that advances a [`ManualClock`] by the slept duration,
/// so deadline arithmetic runs in simulated time instead of real time.
#[derive(Debug, Clone)]
pub struct SimulatedSleeper {
    clock: ManualClock,
    calls: Arc<Mutex<Vec<Duration>>>,
}

impl SimulatedSleeper {
    pub fn new(clock: ManualClock) -> Self {
        Self { clock, calls: Arc::new(Mutex::new(Vec::new())) }
    }

    pub fn calls(&self) -> Vec<Duration> {
        self.calls.lock().unwrap().clone()
    }
}

impl Sleeper for SimulatedSleeper {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        self.clock.advance(duration);
        self.calls.lock().unwrap().push(duration);
        Box::pin(async {})
    }
}

/// Suspend until `target`. A target at or before now returns immediately;
/// negative deltas are clamped, never an error.
pub async fn wait_until(clock: &dyn Clock, sleeper: &dyn Sleeper, target: SystemTime) {
    if let Ok(remaining) = target.duration_since(clock.now()) {
        if remaining > Duration::ZERO {
            sleeper.sleep(remaining).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::default();
        let before = clock.now();
        clock.advance(Duration::from_secs(90));
        assert_eq!(clock.now(), before + Duration::from_secs(90));
    }

    #[tokio::test]
    async fn wait_until_past_instant_does_not_sleep() {
        let clock = ManualClock::default();
        clock.advance(Duration::from_secs(100));
        let sleeper = TrackingSleeper::new();

        wait_until(&clock, &sleeper, SystemTime::UNIX_EPOCH).await;

        assert!(sleeper.calls().is_empty(), "no suspension for a past target");
    }

    #[tokio::test]
    async fn wait_until_now_does_not_sleep() {
        let clock = ManualClock::default();
        let sleeper = TrackingSleeper::new();

        wait_until(&clock, &sleeper, clock.now()).await;

        assert!(sleeper.calls().is_empty());
    }

    #[tokio::test]
    async fn wait_until_sleeps_the_remaining_delta() {
        let clock = ManualClock::default();
        let sleeper = TrackingSleeper::new();
        let target = clock.now() + Duration::from_millis(750);

        wait_until(&clock, &sleeper, target).await;

        assert_eq!(sleeper.calls(), vec![Duration::from_millis(750)]);
    }

    #[tokio::test]
    async fn simulated_sleeper_moves_the_clock() {
        let clock = ManualClock::default();
        let sleeper = SimulatedSleeper::new(clock.clone());
        let start = clock.now();

        sleeper.sleep(Duration::from_millis(500)).await;
        sleeper.sleep(Duration::from_millis(100)).await;

        assert_eq!(clock.now(), start + Duration::from_millis(600));
        assert_eq!(sleeper.calls().len(), 2);
    }

    #[tokio::test]
    async fn instant_sleeper_returns_immediately() {
        let start = std::time::Instant::now();
        InstantSleeper.sleep(Duration::from_secs(10)).await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }
}
