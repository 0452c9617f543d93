//! Feature vector logger.
//!
//! Records a flattened snapshot (metrics + risk triple) for every scored
//! sample into a bounded, thread-safe history buffer for offline export.
//!
//! Export format: one record per logged sample, oldest first. Each record
//! carries an RFC 3339 `timestamp`, every metric field, and
//! `risk_score` / `risk_level` / `risk_confidence`. Absent values are
//! written as `null`, never omitted, so offline tooling sees a fixed
//! field set.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{ConfigError, GaitResult};
use crate::types::{GaitMetrics, GaitRiskAssessment, RiskLevel};

/// Default number of retained feature vectors.
pub const DEFAULT_FEATURE_CAPACITY: usize = 250;

/// A single logged sample. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaitFeatureVector {
    /// Wall-clock time the sample was logged.
    pub timestamp: DateTime<Utc>,
    /// Metric fields, flattened into the record.
    #[serde(flatten)]
    pub metrics: GaitMetrics,
    /// Risk score, `null` when no assessment was available.
    pub risk_score: Option<f64>,
    /// Lowercase risk level name.
    pub risk_level: Option<RiskLevel>,
    /// Risk confidence.
    pub risk_confidence: Option<f64>,
}

impl GaitFeatureVector {
    pub fn new(
        timestamp: DateTime<Utc>,
        metrics: &GaitMetrics,
        risk: Option<&GaitRiskAssessment>,
    ) -> Self {
        Self {
            timestamp,
            metrics: metrics.clone(),
            risk_score: risk.map(|r| r.score),
            risk_level: risk.map(|r| r.level),
            risk_confidence: risk.map(|r| r.confidence),
        }
    }
}

/// Logger configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Maximum retained entries; the oldest are evicted beyond this.
    pub capacity: usize,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_FEATURE_CAPACITY,
        }
    }
}

impl LoggerConfig {
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when `capacity` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::invalid_value("capacity", "must be >= 1"));
        }
        Ok(())
    }
}

/// Bounded FIFO of feature vectors guarded by a single mutex.
///
/// Every operation holds the lock only for a constant or linear-copy
/// critical section; serialization runs on a snapshot outside the lock.
#[derive(Debug)]
pub struct FeatureVectorLogger {
    buffer: Mutex<VecDeque<GaitFeatureVector>>,
    capacity: usize,
}

impl FeatureVectorLogger {
    /// Create a logger retaining at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn from_config(config: &LoggerConfig) -> Self {
        Self::new(config.capacity)
    }

    /// Append a snapshot stamped with the current time.
    ///
    /// Returns `false` (and logs nothing) when `metrics` is absent.
    pub fn log(&self, metrics: Option<&GaitMetrics>, risk: Option<&GaitRiskAssessment>) -> bool {
        self.log_at(Utc::now(), metrics, risk)
    }

    /// Append a snapshot with an explicit timestamp.
    pub fn log_at(
        &self,
        timestamp: DateTime<Utc>,
        metrics: Option<&GaitMetrics>,
        risk: Option<&GaitRiskAssessment>,
    ) -> bool {
        let Some(metrics) = metrics else {
            trace!("feature vector skipped: no metrics");
            return false;
        };
        let entry = GaitFeatureVector::new(timestamp, metrics, risk);

        let mut buffer = self.buffer.lock();
        buffer.push_back(entry);
        let mut evicted = 0usize;
        while buffer.len() > self.capacity {
            buffer.pop_front();
            evicted += 1;
        }
        drop(buffer);

        if evicted > 0 {
            trace!(evicted, "feature buffer full, evicted oldest");
        }
        true
    }

    /// Copy of the buffer, oldest first.
    pub fn snapshot(&self) -> Vec<GaitFeatureVector> {
        self.buffer.lock().iter().cloned().collect()
    }

    /// Serialize the buffer as a single JSON array.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::GaitError::Json`] if serialization fails.
    pub fn export_json(&self) -> GaitResult<Vec<u8>> {
        let entries = self.snapshot();
        let bytes = serde_json::to_vec(&entries)?;
        debug!(entries = entries.len(), bytes = bytes.len(), "exported feature vectors");
        Ok(bytes)
    }

    /// Serialize the buffer as line-delimited JSON, one record per line.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::GaitError::Json`] if serialization fails.
    pub fn export_json_lines(&self) -> GaitResult<Vec<u8>> {
        let entries = self.snapshot();
        let mut out = Vec::with_capacity(entries.len() * 256);
        for entry in &entries {
            serde_json::to_writer(&mut out, entry)?;
            out.push(b'\n');
        }
        Ok(out)
    }

    pub fn len(&self) -> usize {
        self.buffer.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every logged entry.
    pub fn reset(&self) {
        self.buffer.lock().clear();
    }
}

impl Default for FeatureVectorLogger {
    fn default() -> Self {
        Self::new(DEFAULT_FEATURE_CAPACITY)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::Value;

    fn marked(i: usize) -> GaitMetrics {
        GaitMetrics::new().with_cadence(i as f64)
    }

    #[test]
    fn test_empty_logger() {
        let logger = FeatureVectorLogger::default();
        assert!(logger.is_empty());
        assert_eq!(logger.len(), 0);
        assert_eq!(logger.capacity(), 250);
        assert_eq!(logger.export_json().unwrap(), b"[]".to_vec());
    }

    #[test]
    fn test_absent_metrics_is_noop() {
        let logger = FeatureVectorLogger::default();
        let risk = GaitRiskAssessment::new(30.0, 0.7);
        assert!(!logger.log(None, Some(&risk)));
        assert!(logger.is_empty());
    }

    #[test]
    fn test_eviction_keeps_most_recent_in_order() {
        let logger = FeatureVectorLogger::default();
        for i in 0..260 {
            assert!(logger.log(Some(&marked(i)), None));
        }
        assert_eq!(logger.len(), 250);

        let entries = logger.snapshot();
        for (offset, entry) in entries.iter().enumerate() {
            assert_eq!(entry.metrics.step_frequency, Some((offset + 10) as f64));
        }
    }

    #[test]
    fn test_zero_capacity_clamped_to_one() {
        let logger = FeatureVectorLogger::new(0);
        logger.log(Some(&marked(1)), None);
        logger.log(Some(&marked(2)), None);
        assert_eq!(logger.len(), 1);
        assert_eq!(logger.snapshot()[0].metrics.step_frequency, Some(2.0));
    }

    #[test]
    fn test_export_null_semantics() {
        let logger = FeatureVectorLogger::default();
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let metrics = GaitMetrics::new().with_speed(1.1).with_near_trips(2);
        let risk = GaitRiskAssessment::new(62.5, 0.8);

        logger.log_at(ts, Some(&metrics), Some(&risk));
        logger.log_at(ts, Some(&metrics), None);

        let parsed: Value = serde_json::from_slice(&logger.export_json().unwrap()).unwrap();
        let records = parsed.as_array().unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first["timestamp"], "2024-03-01T12:00:00Z");
        assert_eq!(first["average_walking_speed"], 1.1);
        assert_eq!(first["near_trip_events"], 2);
        assert!(first["stride_length"].is_null());
        assert_eq!(first["risk_score"], 62.5);
        assert_eq!(first["risk_level"], "high");
        assert_eq!(first["risk_confidence"], 0.8);

        let second = &records[1];
        assert!(second["risk_score"].is_null());
        assert!(second["risk_level"].is_null());
        assert!(second["risk_confidence"].is_null());
        assert!(second.as_object().unwrap().contains_key("walking_asymmetry"));
    }

    #[test]
    fn test_export_json_lines() {
        let logger = FeatureVectorLogger::default();
        for i in 0..3 {
            logger.log(Some(&marked(i)), None);
        }
        let bytes = logger.export_json_lines().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        let last: GaitFeatureVector = serde_json::from_str(lines[2]).unwrap();
        assert_eq!(last.metrics.step_frequency, Some(2.0));
    }

    #[test]
    fn test_reset_clears_buffer() {
        let logger = FeatureVectorLogger::default();
        logger.log(Some(&marked(1)), None);
        logger.reset();
        assert!(logger.is_empty());
    }

    #[test]
    fn test_concurrent_logging() {
        use std::sync::Arc;
        use std::thread;

        let logger = Arc::new(FeatureVectorLogger::new(100));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let logger = Arc::clone(&logger);
                thread::spawn(move || {
                    for i in 0..50 {
                        logger.log(Some(&marked(t * 1000 + i)), None);
                        if i % 10 == 0 {
                            let _ = logger.export_json().unwrap();
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(logger.len(), 100);
    }
}
