// src/aggregator/mod.rs
//! Aggregation bank: one running-average accumulator per measured quantity
//! plus one for the sample timestamp.

mod stats;

pub use stats::Accumulator;

use chrono::DateTime;
use chrono_tz::Tz;

use crate::sampler::Reading;

/// One averaged window, ready to format for submission. Power and level are
/// rounded to two decimals; `at` is the unrounded mean sample time in the
/// device's zone.
#[derive(Clone, Debug, PartialEq)]
pub struct AveragedRecord {
    pub at: DateTime<Tz>,
    pub grid: f64,
    pub solar: f64,
    pub battery: f64,
    pub load: f64,
    pub level: f64,
}

/// Six accumulators fed in lockstep, one per reading field. Owned by the
/// driver; nothing else touches them.
#[derive(Debug, Default)]
pub struct ReadingAverager {
    time: Accumulator,
    grid: Accumulator,
    solar: Accumulator,
    battery: Accumulator,
    load: Accumulator,
    level: Accumulator,
}

impl ReadingAverager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one reading to all six accumulators.
    pub fn add(&mut self, reading: &Reading) {
        self.time.push(reading.timestamp);
        self.grid.push(reading.grid);
        self.solar.push(reading.solar);
        self.battery.push(reading.battery);
        self.load.push(reading.load);
        self.level.push(reading.level);
    }

    /// Drain all six accumulators into one averaged record. Each drain
    /// carries its most recent sample forward into the next window (see
    /// [`Accumulator::mean_and_carry`]). `None` before the first `add`.
    pub fn drain(&mut self, tz: Tz) -> Option<AveragedRecord> {
        let at = epoch_to_civil(self.time.mean_and_carry()?, tz)?;
        Some(AveragedRecord {
            at,
            grid: round2(self.grid.mean_and_carry()?),
            solar: round2(self.solar.mean_and_carry()?),
            battery: round2(self.battery.mean_and_carry()?),
            load: round2(self.load.mean_and_carry()?),
            level: round2(self.level.mean_and_carry()?),
        })
    }
}

/// Round half away from zero at two decimals.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn epoch_to_civil(epoch: f64, tz: Tz) -> Option<DateTime<Tz>> {
    let secs = epoch.floor();
    let nanos = (((epoch - secs) * 1e9).round() as u32).min(999_999_999);
    Some(DateTime::from_timestamp(secs as i64, nanos)?.with_timezone(&tz))
}
