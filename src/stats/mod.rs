use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FailureRecord {
    /// Zero-based position in the consumed batch.
    pub index: usize,
    pub total: usize,
    pub url: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DownloadStats {
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub batches: usize,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub bytes_written: u64,
    pub failures: Vec<FailureRecord>,
}

/// Running counters for one downloader, shared with whoever holds a clone.
#[derive(Debug, Clone)]
pub struct StatsTracker {
    stats: Arc<RwLock<DownloadStats>>,
}

impl StatsTracker {
    pub fn new() -> Self {
        Self {
            stats: Arc::new(RwLock::new(DownloadStats {
                start_time: Utc::now(),
                end_time: None,
                batches: 0,
                attempted: 0,
                succeeded: 0,
                failed: 0,
                bytes_written: 0,
                failures: Vec::new(),
            })),
        }
    }

    pub fn record_batch(&self, size: usize) {
        let mut stats = self.stats.write();
        stats.batches += 1;
        stats.attempted += size;
    }

    pub fn record_success(&self, bytes: u64) {
        let mut stats = self.stats.write();
        stats.succeeded += 1;
        stats.bytes_written += bytes;
    }

    pub fn record_failure(&self, failure: FailureRecord) {
        let mut stats = self.stats.write();
        stats.failed += 1;
        stats.failures.push(failure);
    }

    pub fn finish(&self) {
        self.stats.write().end_time = Some(Utc::now());
    }

    pub fn get_stats(&self) -> DownloadStats {
        self.stats.read().clone()
    }

    pub fn print_summary(&self, name: &str) {
        let stats = self.stats.read();
        let duration = stats
            .end_time
            .unwrap_or_else(Utc::now)
            .signed_duration_since(stats.start_time);

        println!("\n{} Download Statistics:", name);
        println!("===================");
        println!("Duration: {} seconds", duration.num_seconds());
        println!("Batches: {}", stats.batches);
        println!("Attempted: {}", stats.attempted);
        println!("Succeeded: {}", stats.succeeded);
        println!("Failed: {}", stats.failed);
        println!(
            "Data Written: {:.2} MB",
            stats.bytes_written as f64 / 1_000_000.0
        );

        if !stats.failures.is_empty() {
            println!("\nFailures:");
            for failure in &stats.failures {
                println!(
                    "  [{}/{}] {}: {}",
                    failure.index + 1,
                    failure.total,
                    failure.url,
                    failure.message
                );
            }
        }
    }
}

impl Default for StatsTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let tracker = StatsTracker::new();
        let shared = tracker.clone();

        tracker.record_batch(3);
        tracker.record_success(10);
        tracker.record_success(5);
        tracker.record_failure(FailureRecord {
            index: 2,
            total: 3,
            url: "http://example.com/c.txt".to_string(),
            message: "boom".to_string(),
        });
        tracker.finish();

        let stats = shared.get_stats();
        assert_eq!(stats.batches, 1);
        assert_eq!(stats.attempted, 3);
        assert_eq!(stats.succeeded, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.bytes_written, 15);
        assert_eq!(stats.failures[0].index, 2);
        assert!(stats.end_time.is_some());
    }
}
