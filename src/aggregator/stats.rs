// src/aggregator/stats.rs
//! Running-average accumulator with carry-forward drain semantics.

/// Running average over the samples pushed since the last drain.
///
/// Draining computes the mean over all held samples and then re-seeds the
/// storage with only the most recent sample (not the mean): the value
/// observed at a window boundary also opens the next window, so the carried
/// sample counts toward the next mean as well.
#[derive(Debug, Default)]
pub struct Accumulator {
    samples: Vec<f64>,
}

impl Accumulator {
    pub fn push(&mut self, value: f64) {
        self.samples.push(value);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Mean of all held samples, collapsing the storage to the most recent
    /// sample. `None` only when nothing has been pushed yet.
    pub fn mean_and_carry(&mut self) -> Option<f64> {
        let last = *self.samples.last()?;
        let mean = self.samples.iter().sum::<f64>() / self.samples.len() as f64;
        self.samples.clear();
        self.samples.push(last);
        Some(mean)
    }
}
