// src/driver.rs
//! The poll → aggregate → emit loop.

use std::time::Duration;

use chrono_tz::Tz;
use tracing::info;

use crate::aggregator::ReadingAverager;
use crate::chords::{build_uri, ChordsRecord, SubmissionSink};
use crate::config::{ChordsConfig, Config};
use crate::powerwall::TelemetrySource;
use crate::sampler::Sampler;

pub struct Driver<S> {
    sampler: Sampler<S>,
    averager: ReadingAverager,
    chords: ChordsConfig,
    tz: Tz,
    avg_count: u32,
    poll_interval: Duration,
    poll_count: u32,
}

impl<S: TelemetrySource> Driver<S> {
    pub fn new(source: S, config: &Config, tz: Tz) -> Self {
        Self {
            sampler: Sampler::new(source),
            averager: ReadingAverager::new(),
            chords: config.chords.clone(),
            tz,
            avg_count: config.tesla.avg_count,
            poll_interval: Duration::from_secs(config.tesla.poll_secs),
            poll_count: 0,
        }
    }

    /// Polls completed since the last emission.
    pub fn poll_count(&self) -> u32 {
        self.poll_count
    }

    /// One loop iteration without the inter-poll sleep: poll, accumulate,
    /// and emit an averaged record when the window fills.
    pub async fn tick<K: SubmissionSink>(&mut self, sink: &K) {
        let reading = self.sampler.poll().await;
        self.averager.add(&reading);
        self.poll_count += 1;

        if self.poll_count == self.avg_count {
            if let Some(average) = self.averager.drain(self.tz) {
                let record = ChordsRecord::from_average(&self.chords, &average);
                let uri = build_uri(&self.chords.chords_host, &record);
                info!(uri = %uri, "submitting averaged record");
                sink.submit(uri, self.chords.max_queue_length);
            }
            self.poll_count = 0;
        }
    }

    /// Run forever: tick, then sleep the poll interval. Only process
    /// termination stops the loop.
    pub async fn run<K: SubmissionSink>(&mut self, sink: &K) {
        info!(
            poll_secs = self.poll_interval.as_secs(),
            avg_count = self.avg_count,
            "entering polling loop"
        );
        loop {
            self.tick(sink).await;
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
