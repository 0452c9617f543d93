//! Adaptive emission controller.
//!
//! Proposes the next sampling interval from the latest gait metrics, the
//! freshly scored risk and the alert state. The response is asymmetric:
//!
//! - Tightening (faster sampling) is immediate: the interval is halved and
//!   clamped into `[min, baseline]`.
//! - Loosening (slower sampling) needs `stability_threshold` consecutive
//!   stable samples and then grows by a small fixed step, capped at `max`.
//!
//! The only state is the stability counter. It is owned by one controller
//! per session; use [`SharedEmissionController`] when several producers
//! drive the same session.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ConfigError;
use crate::types::{GaitMetrics, GaitRiskAssessment};

/// Per-signal coefficient-of-variation limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VariabilityThresholds {
    /// Stride-time CV limit.
    pub stride_time: f64,
    /// Step-length CV limit.
    pub step_length: f64,
    /// Walking-speed CV limit.
    pub walking_speed: f64,
}

/// Emission controller configuration. All intervals are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmissionConfig {
    /// Fastest allowed sampling interval.
    pub min_interval_secs: f64,
    /// Interval a tightening step never exceeds.
    pub baseline_interval_secs: f64,
    /// Slowest allowed sampling interval.
    pub max_interval_secs: f64,
    /// All three CVs below these limits counts as stable.
    pub stable_limits: VariabilityThresholds,
    /// Any CV above these limits counts as high variability.
    pub high_limits: VariabilityThresholds,
    /// Consecutive stable samples required before loosening.
    pub stability_threshold: u32,
    /// Interval increase applied when loosening.
    pub loosen_step_secs: f64,
    /// Multiplier applied to the interval when tightening.
    pub tighten_factor: f64,
}

impl Default for EmissionConfig {
    fn default() -> Self {
        Self {
            min_interval_secs: 0.5,
            baseline_interval_secs: 1.0,
            max_interval_secs: 3.0,
            stable_limits: VariabilityThresholds {
                stride_time: 0.02,
                step_length: 0.03,
                walking_speed: 0.04,
            },
            high_limits: VariabilityThresholds {
                stride_time: 0.05,
                step_length: 0.07,
                walking_speed: 0.08,
            },
            stability_threshold: 5,
            loosen_step_secs: 0.1,
            tighten_factor: 0.5,
        }
    }
}

impl EmissionConfig {
    /// Check interval ordering and step sizes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let intervals = [
            ("min_interval_secs", self.min_interval_secs),
            ("baseline_interval_secs", self.baseline_interval_secs),
            ("max_interval_secs", self.max_interval_secs),
        ];
        for (field, value) in intervals {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::invalid_value(field, "must be a finite value > 0"));
            }
        }
        if self.min_interval_secs > self.baseline_interval_secs {
            return Err(ConfigError::invalid_value(
                "min_interval_secs",
                format!(
                    "must be <= baseline_interval_secs ({})",
                    self.baseline_interval_secs
                ),
            ));
        }
        if self.baseline_interval_secs > self.max_interval_secs {
            return Err(ConfigError::invalid_value(
                "baseline_interval_secs",
                format!("must be <= max_interval_secs ({})", self.max_interval_secs),
            ));
        }
        if self.stability_threshold == 0 {
            return Err(ConfigError::invalid_value("stability_threshold", "must be >= 1"));
        }
        if !self.loosen_step_secs.is_finite() || self.loosen_step_secs <= 0.0 {
            return Err(ConfigError::invalid_value("loosen_step_secs", "must be a finite value > 0"));
        }
        if !(self.tighten_factor > 0.0 && self.tighten_factor < 1.0) {
            return Err(ConfigError::invalid_value("tighten_factor", "must be in (0, 1)"));
        }
        Ok(())
    }
}

/// Why the controller tightened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TightenCause {
    pub high_variability: bool,
    pub high_risk: bool,
    pub alerts_active: bool,
    pub drift: bool,
}

/// Outcome of one `suggest` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EmissionDecision {
    /// Interval halved (clamped into `[min, baseline]`).
    Tightened(TightenCause),
    /// Stability threshold reached, interval grown by one step.
    Loosened,
    /// Interval kept (only the minimum clamp applied).
    Held,
}

/// Decision counters for observability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EmissionStats {
    pub tightened: u64,
    pub loosened: u64,
    pub held: u64,
    pub last_decision: Option<EmissionDecision>,
    pub last_interval_secs: Option<f64>,
}

impl EmissionStats {
    /// Total number of `suggest` calls.
    pub fn total(&self) -> u64 {
        self.tightened + self.loosened + self.held
    }
}

/// Adaptive sampling-interval controller.
#[derive(Debug, Clone)]
pub struct AdaptiveEmissionController {
    config: EmissionConfig,
    stability_counter: u32,
    stats: EmissionStats,
}

impl AdaptiveEmissionController {
    /// Create a controller. The configuration is assumed validated.
    pub fn new(config: EmissionConfig) -> Self {
        Self {
            config,
            stability_counter: 0,
            stats: EmissionStats::default(),
        }
    }

    /// Propose the next sampling interval.
    ///
    /// `current` is the interval used for the sample that was just scored.
    pub fn suggest(
        &mut self,
        current: f64,
        metrics: &GaitMetrics,
        risk: Option<&GaitRiskAssessment>,
        alerts_active: bool,
        drift_flags: &[String],
    ) -> f64 {
        let current = self.sanitize_interval(current);

        let stride_cv = metrics.stride_time_variability.unwrap_or(0.0);
        let step_cv = metrics.step_length_variability.unwrap_or(0.0);
        let speed_cv = metrics.walking_speed_variability.unwrap_or(0.0);

        let stable = stride_cv < self.config.stable_limits.stride_time
            && step_cv < self.config.stable_limits.step_length
            && speed_cv < self.config.stable_limits.walking_speed;
        let high_variability = stride_cv > self.config.high_limits.stride_time
            || step_cv > self.config.high_limits.step_length
            || speed_cv > self.config.high_limits.walking_speed;
        let high_risk = risk.map_or(false, |r| r.level.is_elevated());

        let cause = TightenCause {
            high_variability,
            high_risk,
            alerts_active,
            drift: !drift_flags.is_empty(),
        };

        if high_variability || high_risk || alerts_active || cause.drift {
            self.stability_counter = 0;
            let next = (current * self.config.tighten_factor)
                .max(self.config.min_interval_secs)
                .min(self.config.baseline_interval_secs);
            debug!(current, next, ?cause, "emission interval tightened");
            return self.record(EmissionDecision::Tightened(cause), next);
        }

        if stable {
            self.stability_counter += 1;
        } else {
            self.stability_counter = 0;
        }

        let mut next = current;
        let mut decision = EmissionDecision::Held;
        if self.stability_counter >= self.config.stability_threshold {
            self.stability_counter = 0;
            next = (current + self.config.loosen_step_secs).min(self.config.max_interval_secs);
            decision = EmissionDecision::Loosened;
            debug!(current, next, "emission interval loosened");
        }

        next = next.max(self.config.min_interval_secs);
        self.record(decision, next)
    }

    /// Clear the stability counter for an explicit session restart.
    pub fn reset(&mut self) {
        self.stability_counter = 0;
        self.stats = EmissionStats::default();
    }

    pub fn stability_counter(&self) -> u32 {
        self.stability_counter
    }

    pub fn stats(&self) -> EmissionStats {
        self.stats
    }

    pub fn config(&self) -> &EmissionConfig {
        &self.config
    }

    fn sanitize_interval(&self, current: f64) -> f64 {
        if current.is_finite() && current > 0.0 {
            current
        } else {
            warn!(current, "invalid interval, falling back to baseline");
            self.config.baseline_interval_secs
        }
    }

    fn record(&mut self, decision: EmissionDecision, next: f64) -> f64 {
        match decision {
            EmissionDecision::Tightened(_) => self.stats.tightened += 1,
            EmissionDecision::Loosened => self.stats.loosened += 1,
            EmissionDecision::Held => self.stats.held += 1,
        }
        self.stats.last_decision = Some(decision);
        self.stats.last_interval_secs = Some(next);
        next
    }
}

impl Default for AdaptiveEmissionController {
    fn default() -> Self {
        Self::new(EmissionConfig::default())
    }
}

/// Controller shared by several producers; every call is serialized.
#[derive(Debug, Default)]
pub struct SharedEmissionController {
    inner: Mutex<AdaptiveEmissionController>,
}

impl SharedEmissionController {
    pub fn new(config: EmissionConfig) -> Self {
        Self {
            inner: Mutex::new(AdaptiveEmissionController::new(config)),
        }
    }

    pub fn suggest(
        &self,
        current: f64,
        metrics: &GaitMetrics,
        risk: Option<&GaitRiskAssessment>,
        alerts_active: bool,
        drift_flags: &[String],
    ) -> f64 {
        self.inner
            .lock()
            .suggest(current, metrics, risk, alerts_active, drift_flags)
    }

    pub fn reset(&self) {
        self.inner.lock().reset();
    }

    pub fn stability_counter(&self) -> u32 {
        self.inner.lock().stability_counter()
    }

    pub fn stats(&self) -> EmissionStats {
        self.inner.lock().stats()
    }
}

// ============================================================================
// TESTS
// ============================================================================
