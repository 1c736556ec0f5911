// src/chords/mod.rs
//! CHORDS portal submission: `url_create` URI building and the background
//! delivery queue.

mod sender;

pub use sender::{ChordsSender, SendError};

use crate::aggregator::AveragedRecord;
use crate::config::ChordsConfig;

/// One `url_create` submission: instrument identity plus the averaged vars.
#[derive(Clone, Debug)]
pub struct ChordsRecord {
    pub instrument_id: u32,
    pub api_email: String,
    pub api_key: String,
    /// Ordered so the built URI is deterministic; `at` comes first.
    pub vars: Vec<(String, String)>,
}

impl ChordsRecord {
    pub fn from_average(config: &ChordsConfig, average: &AveragedRecord) -> Self {
        let vars = vec![
            ("at".to_string(), average.at.to_rfc3339()),
            ("grid".to_string(), format!("{:.2}", average.grid)),
            ("solar".to_string(), format!("{:.2}", average.solar)),
            ("battery".to_string(), format!("{:.2}", average.battery)),
            ("load".to_string(), format!("{:.2}", average.load)),
            ("level".to_string(), format!("{:.2}", average.level)),
        ];
        Self {
            instrument_id: config.instrument_id,
            api_email: config.api_email.clone(),
            api_key: config.api_key.clone(),
            vars,
        }
    }
}

/// Hand-off point for built URIs. Delivery happens in the background; the
/// polling loop never waits on it.
pub trait SubmissionSink {
    fn submit(&self, uri: String, max_queue_length: usize);
}

/// Build the `url_create` GET URI for one record.
pub fn build_uri(host: &str, record: &ChordsRecord) -> String {
    let base = if host.starts_with("http://") || host.starts_with("https://") {
        host.trim_end_matches('/').to_string()
    } else {
        format!("http://{}", host.trim_end_matches('/'))
    };

    let mut uri = format!(
        "{}/measurements/url_create?instrument_id={}",
        base, record.instrument_id
    );
    push_param(&mut uri, "email", &record.api_email);
    push_param(&mut uri, "api_key", &record.api_key);
    for (name, value) in &record.vars {
        push_param(&mut uri, name, value);
    }
    uri
}

fn push_param(uri: &mut String, name: &str, value: &str) {
    uri.push('&');
    uri.push_str(name);
    uri.push('=');
    uri.push_str(&urlencoding::encode(value));
}
