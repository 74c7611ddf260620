use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use embassy_time::{Duration, Timer};
use embedded_hal::i2c::{I2c, SevenBitAddress};

use crate::veml6075::{Error, NumberSelector, Veml6075};

/// How a polled value is compared against the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    /// value > threshold
    Exceeds,
    /// value < threshold
    DropsBelow,
    /// value <= threshold
    FallsTo,
    /// value == threshold
    Equals,
    /// value >= threshold
    RisesTo,
}

impl Comparator {
    pub fn holds(&self, value: f32, threshold: f32) -> bool {
        match self {
            Comparator::Exceeds => value > threshold,
            Comparator::DropsBelow => value < threshold,
            Comparator::FallsTo => value <= threshold,
            Comparator::Equals => value == threshold,
            Comparator::RisesTo => value >= threshold,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Trigger {
    /// Fire on every tick while the condition holds
    #[default]
    Level,
    /// Fire once each time the condition starts to hold
    Edge,
}

/// A threshold condition on one of the sensor values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventWatch {
    pub selector: NumberSelector,
    pub comparator: Comparator,
    pub threshold: f32,
    pub interval: Duration,
    pub trigger: Trigger,
}

impl EventWatch {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(200);

    pub fn new(selector: NumberSelector, comparator: Comparator, threshold: f32) -> Self {
        Self {
            selector,
            comparator,
            threshold,
            interval: Self::DEFAULT_INTERVAL,
            trigger: Trigger::Level,
        }
    }

    pub fn with_interval(self, interval: Duration) -> Self {
        Self { interval, ..self }
    }

    pub fn with_trigger(self, trigger: Trigger) -> Self {
        Self { trigger, ..self }
    }

    pub fn should_fire(&self, was_met: bool, is_met: bool) -> bool {
        match self.trigger {
            Trigger::Level => is_met,
            Trigger::Edge => is_met && !was_met,
        }
    }
}

/// Cancellation handle shared between a running [`poll_event`] and its owner.
#[derive(Debug, Clone, Default)]
pub struct PollHandle {
    cancelled: Arc<AtomicBool>,
}

impl PollHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Evaluate `watch` every `watch.interval` and call `handler` with the value whenever it fires.
///
/// The sensor is locked only for the duration of a single read. A failed read
/// is logged and skips the tick. Runs until `handle` is cancelled and returns
/// how often the handler ran.
pub async fn poll_event<I2C, F>(
    sensor: Arc<Mutex<Veml6075<I2C>>>,
    watch: EventWatch,
    handle: PollHandle,
    mut handler: F,
) -> usize
where
    I2C: I2c<SevenBitAddress>,
    I2C::Error: Into<Error<I2C::Error>>,
    F: FnMut(f32),
{
    let mut was_met = false;
    let mut fired = 0;
    log::debug!("Watching {:?} {:?} {}", watch.selector, watch.comparator, watch.threshold);

    while !handle.is_cancelled() {
        let value = {
            let Ok(mut locked) = sensor.lock() else {
                log::error!("Sensor mutex poisoned, stopping watch on {:?}", watch.selector);
                break;
            };
            locked.get_number(watch.selector)
        };
        match value {
            Ok(value) => {
                let is_met = watch.comparator.holds(value, watch.threshold);
                if watch.should_fire(was_met, is_met) {
                    handler(value);
                    fired += 1;
                }
                was_met = is_met;
            }
            Err(e) => log::error!("Failed to read {:?}: {:?}", watch.selector, e),
        }

        if handle.is_cancelled() {
            break;
        }
        Timer::after(watch.interval).await;
    }
    log::debug!("Watch on {:?} stopped after {fired} events", watch.selector);
    fired
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, thread, time::Duration as StdDuration};

    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction};
    use futures_lite::future::block_on;

    use super::*;
    use crate::veml6075::DEFAULT_ADDRESS;

    fn sample(uva: u16, uvb: u16, comp1: u16, comp2: u16) -> Vec<Transaction> {
        [(0x07, uva), (0x09, uvb), (0x0A, comp1), (0x0B, comp2)]
            .into_iter()
            .map(|(reg, value)| {
                Transaction::write_read(DEFAULT_ADDRESS, vec![reg], value.to_le_bytes().to_vec())
            })
            .collect()
    }

    fn cancel_after(handle: &PollHandle, ms: u64) -> thread::JoinHandle<()> {
        let handle = handle.clone();
        thread::spawn(move || {
            thread::sleep(StdDuration::from_millis(ms));
            handle.cancel();
        })
    }

    #[test]
    fn comparators_at_the_boundary() {
        assert!(!Comparator::Exceeds.holds(5.0, 5.0));
        assert!(Comparator::Exceeds.holds(5.1, 5.0));
        assert!(!Comparator::DropsBelow.holds(5.0, 5.0));
        assert!(Comparator::DropsBelow.holds(4.9, 5.0));
        assert!(Comparator::FallsTo.holds(5.0, 5.0));
        assert!(!Comparator::FallsTo.holds(5.1, 5.0));
        assert!(Comparator::Equals.holds(5.0, 5.0));
        assert!(!Comparator::Equals.holds(5.1, 5.0));
        assert!(Comparator::RisesTo.holds(5.0, 5.0));
        assert!(!Comparator::RisesTo.holds(4.9, 5.0));
    }

    #[test]
    fn edge_trigger_fires_on_transitions_only() {
        let level = EventWatch::new(NumberSelector::Uva, Comparator::Exceeds, 1.0);
        let edge = level.with_trigger(Trigger::Edge);
        assert_eq!(level.interval, EventWatch::DEFAULT_INTERVAL);

        assert!(level.should_fire(true, true));
        assert!(level.should_fire(false, true));
        assert!(!level.should_fire(true, false));
        assert!(edge.should_fire(false, true));
        assert!(!edge.should_fire(true, true));
        assert!(!edge.should_fire(false, false));
    }

    #[test]
    fn level_watch_fires_every_tick_until_cancelled() {
        let mut expectations = sample(1000, 800, 50, 30);
        expectations.extend(sample(1000, 800, 50, 30));
        expectations.extend(sample(1000, 800, 50, 30));
        let mut i2c = I2cMock::new(&expectations);
        let sensor = Arc::new(Mutex::new(Veml6075::new(i2c.clone())));
        let handle = PollHandle::new();
        let watch = EventWatch::new(NumberSelector::Uva, Comparator::Exceeds, 849.0)
            .with_interval(Duration::from_millis(1));

        let seen = Cell::new(Vec::new());
        let fired = block_on(poll_event(sensor, watch, handle.clone(), |value| {
            let mut values = seen.take();
            values.push(value);
            if values.len() == 3 {
                handle.cancel();
            }
            seen.set(values);
        }));

        assert_eq!(fired, 3);
        let values = seen.take();
        assert_eq!(values.len(), 3);
        assert!(values.iter().all(|v| (v - 849.1).abs() < 1e-3));
        i2c.done();
    }

    #[test]
    fn failed_read_skips_the_tick() {
        let mut expectations = vec![Transaction::write_read(DEFAULT_ADDRESS, vec![0x07], vec![0, 0])
            .with_error(ErrorKind::Other)];
        expectations.extend(sample(0, 2000, 0, 0));
        let mut i2c = I2cMock::new(&expectations);
        let sensor = Arc::new(Mutex::new(Veml6075::new(i2c.clone())));
        let handle = PollHandle::new();
        let watch = EventWatch::new(NumberSelector::Uvb, Comparator::RisesTo, 2000.0)
            .with_interval(Duration::from_millis(1));

        let fired = block_on(poll_event(sensor, watch, handle.clone(), |value| {
            assert_eq!(value, 2000.0);
            handle.cancel();
        }));

        assert_eq!(fired, 1);
        i2c.done();
    }

    #[test]
    fn value_at_threshold_never_exceeds() {
        let mut i2c = I2cMock::new(&[]);
        let sensor = Arc::new(Mutex::new(Veml6075::new(i2c.clone())));
        let handle = PollHandle::new();
        let watch = EventWatch::new(NumberSelector::UvaACoefficient, Comparator::Exceeds, 2.22)
            .with_interval(Duration::from_millis(2));

        let canceller = cancel_after(&handle, 40);
        let fired = block_on(poll_event(sensor, watch, handle, |_| {}));
        canceller.join().unwrap();

        assert_eq!(fired, 0);
        i2c.done();
    }

    #[test]
    fn edge_watch_fires_once_while_condition_holds() {
        let mut i2c = I2cMock::new(&[]);
        let sensor = Arc::new(Mutex::new(Veml6075::new(i2c.clone())));
        let handle = PollHandle::new();
        let watch = EventWatch::new(NumberSelector::IntegrationTime, Comparator::Equals, 50.0)
            .with_interval(Duration::from_millis(2))
            .with_trigger(Trigger::Edge);

        let canceller = cancel_after(&handle, 40);
        let fired = block_on(poll_event(sensor.clone(), watch, handle.clone(), |_| {}));
        canceller.join().unwrap();
        assert_eq!(fired, 1);

        let handle = PollHandle::new();
        let canceller = cancel_after(&handle, 40);
        let level = watch.with_trigger(Trigger::Level);
        let fired = block_on(poll_event(sensor, level, handle, |_| {}));
        canceller.join().unwrap();
        assert!(fired >= 2);

        i2c.done();
    }

    #[test]
    fn cancelled_handle_stops_before_reading() {
        let mut i2c = I2cMock::new(&[]);
        let sensor = Arc::new(Mutex::new(Veml6075::new(i2c.clone())));
        let handle = PollHandle::new();
        handle.cancel();

        let watch = EventWatch::new(NumberSelector::UvIndex, Comparator::Exceeds, 0.0);
        assert_eq!(block_on(poll_event(sensor, watch, handle, |_| {})), 0);
        i2c.done();
    }
}
