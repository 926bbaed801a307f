use std::collections::HashMap;
use std::time::Instant;

use serde::Serialize;

/// Fetch statistics for one run
#[derive(Debug, Clone, Default, Serialize)]
pub struct FetchStats {
    /// Total requests made
    pub total_requests: usize,

    /// Requests that answered 200
    pub successful_requests: usize,

    /// Requests that failed or answered anything else
    pub failed_requests: usize,

    /// Bytes of page bodies downloaded
    pub bytes_downloaded: usize,

    /// Request durations (URL -> duration in milliseconds)
    pub request_durations: HashMap<String, u64>,

    /// HTTP status code counts
    pub status_codes: HashMap<u16, usize>,
}

impl FetchStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request
    pub fn record_request(
        &mut self,
        url: &str,
        success: bool,
        duration_ms: u64,
        status_code: Option<u16>,
        bytes: usize,
    ) {
        self.total_requests += 1;

        if success {
            self.successful_requests += 1;
        } else {
            self.failed_requests += 1;
        }

        self.bytes_downloaded += bytes;
        self.request_durations.insert(url.to_string(), duration_ms);

        if let Some(code) = status_code {
            *self.status_codes.entry(code).or_default() += 1;
        }
    }

    /// Mean request duration in milliseconds
    pub fn average_duration_ms(&self) -> Option<u64> {
        if self.request_durations.is_empty() {
            return None;
        }
        let total: u64 = self.request_durations.values().sum();
        Some(total / self.request_durations.len() as u64)
    }
}

/// Request timer for measuring request durations
pub struct RequestTimer {
    /// Start time of the request
    start: Instant,
}

impl RequestTimer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// End timing and get the duration in milliseconds
    pub fn end(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}
