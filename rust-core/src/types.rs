//! Core data types for the gait telemetry engine.
//!
//! This module defines the value types that flow between the risk scorer,
//! the emission controller, the feature logger and post-session fusion.
//! Inputs are produced by an external sensor-fusion layer and are never
//! mutated here.
//!
//! Design principle: every measurement the sensor layer may fail to compute
//! is an explicit `Option`. Defaults are substituted at the point of use,
//! never baked into the snapshot.

use serde::{Deserialize, Serialize};

// ============================================================================
// INPUT SNAPSHOTS
// ============================================================================

/// A snapshot of scalar gait measurements.
///
/// Every field is optional: the sensor layer leaves a field empty when it
/// could not compute it for the current window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GaitMetrics {
    /// Average walking speed (m/s).
    pub average_walking_speed: Option<f64>,
    /// Average step length (m).
    pub average_step_length: Option<f64>,
    /// Stride length (m).
    pub stride_length: Option<f64>,
    /// Cadence (steps/min).
    pub step_frequency: Option<f64>,
    /// Stance phase as percentage of the gait cycle.
    pub stance_time: Option<f64>,
    /// Swing phase as percentage of the gait cycle.
    pub swing_time: Option<f64>,
    /// Double-support phase as percentage of the gait cycle.
    pub double_support_time: Option<f64>,
    /// Coefficient of variation of walking speed.
    pub walking_speed_variability: Option<f64>,
    /// Coefficient of variation of step length.
    pub step_length_variability: Option<f64>,
    /// Coefficient of variation of stride time.
    pub stride_time_variability: Option<f64>,
    /// Harmonic ratio (opaque smoothness measure).
    pub harmonic_ratio: Option<f64>,
    /// Mediolateral sway proxy.
    pub mediolateral_sway: Option<f64>,
    /// Average minimum toe clearance (m).
    pub average_toe_clearance: Option<f64>,
    /// Number of near-trip events in the window.
    pub near_trip_events: Option<u32>,
    /// Walking asymmetry (%).
    pub walking_asymmetry: Option<f64>,
}

impl GaitMetrics {
    /// Create an empty snapshot with every field absent.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_speed(mut self, mps: f64) -> Self {
        self.average_walking_speed = Some(mps);
        self
    }

    pub fn with_step_length(mut self, m: f64) -> Self {
        self.average_step_length = Some(m);
        self
    }

    pub fn with_stride_length(mut self, m: f64) -> Self {
        self.stride_length = Some(m);
        self
    }

    pub fn with_cadence(mut self, steps_per_min: f64) -> Self {
        self.step_frequency = Some(steps_per_min);
        self
    }

    pub fn with_phases(mut self, stance_pct: f64, double_support_pct: f64) -> Self {
        self.stance_time = Some(stance_pct);
        self.double_support_time = Some(double_support_pct);
        self
    }

    pub fn with_double_support(mut self, pct: f64) -> Self {
        self.double_support_time = Some(pct);
        self
    }

    /// Set the three coefficient-of-variation signals (stride time, step
    /// length, walking speed).
    pub fn with_variability(mut self, stride_time: f64, step_length: f64, speed: f64) -> Self {
        self.stride_time_variability = Some(stride_time);
        self.step_length_variability = Some(step_length);
        self.walking_speed_variability = Some(speed);
        self
    }

    pub fn with_toe_clearance(mut self, m: f64) -> Self {
        self.average_toe_clearance = Some(m);
        self
    }

    pub fn with_asymmetry(mut self, pct: f64) -> Self {
        self.walking_asymmetry = Some(pct);
        self
    }

    pub fn with_near_trips(mut self, count: u32) -> Self {
        self.near_trip_events = Some(count);
        self
    }

    pub fn with_harmonic_ratio(mut self, ratio: f64) -> Self {
        self.harmonic_ratio = Some(ratio);
        self
    }

    pub fn with_mediolateral_sway(mut self, sway: f64) -> Self {
        self.mediolateral_sway = Some(sway);
        self
    }

    /// Number of populated fields.
    pub fn present_field_count(&self) -> usize {
        let scalars = [
            self.average_walking_speed,
            self.average_step_length,
            self.stride_length,
            self.step_frequency,
            self.stance_time,
            self.swing_time,
            self.double_support_time,
            self.walking_speed_variability,
            self.step_length_variability,
            self.stride_time_variability,
            self.harmonic_ratio,
            self.mediolateral_sway,
            self.average_toe_clearance,
            self.walking_asymmetry,
        ];
        scalars.iter().filter(|v| v.is_some()).count() + usize::from(self.near_trip_events.is_some())
    }
}

/// Postural sway analysis supplied by the external posture subsystem.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostureAnalysisResult {
    /// Mediolateral sway amplitude.
    pub mediolateral_sway: f64,
    /// Anteroposterior sway amplitude.
    pub anteroposterior_sway: f64,
    /// Combined sway amplitude.
    pub total_sway: f64,
    /// Stability index reported by the posture model.
    pub stability_index: f64,
}

/// An obstacle reported by the environment subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedObstacle {
    /// Free-form obstacle label (e.g. "step", "cable").
    pub kind: String,
    /// Distance from the user (m).
    pub distance_m: f64,
    /// Obstacle height above the floor (m).
    pub height_m: f64,
}

/// Environment analysis supplied by the external scene subsystem.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentAnalysisResult {
    /// Free-form surface label (e.g. "Carpet", "wet tile").
    pub surface_type: String,
    /// Free-form lighting label (e.g. "dim").
    pub lighting_condition: String,
    /// Aggregate hazard score, 0-100.
    pub hazard_score: f64,
    /// Obstacles in the walking path.
    pub obstacles: Vec<DetectedObstacle>,
}

// ============================================================================
// RISK ASSESSMENT
// ============================================================================

/// Ordered fall-risk level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Score in [0, 25).
    Low,
    /// Score in [25, 50).
    Moderate,
    /// Score in [50, 75).
    High,
    /// Score in [75, 100].
    Critical,
}

impl RiskLevel {
    /// Map a score onto the fixed 25/50/75 breakpoints.
    ///
    /// NaN maps to `Low`; values outside [0, 100] map to the nearest end.
    pub fn from_score(score: f64) -> Self {
        let score = clamp_score(score);
        if score < 25.0 {
            RiskLevel::Low
        } else if score < 50.0 {
            RiskLevel::Moderate
        } else if score < 75.0 {
            RiskLevel::High
        } else {
            RiskLevel::Critical
        }
    }

    /// Lowercase name used in exports.
    pub fn name(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }

    /// High or critical.
    pub fn is_elevated(&self) -> bool {
        matches!(self, RiskLevel::High | RiskLevel::Critical)
    }
}

/// Per-sample fall-risk triple.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaitRiskAssessment {
    /// Risk score in [0, 100].
    pub score: f64,
    /// Level derived from `score`.
    pub level: RiskLevel,
    /// Confidence in [0, 1].
    pub confidence: f64,
}

impl GaitRiskAssessment {
    /// Build an assessment, clamping both values and deriving the level.
    pub fn new(score: f64, confidence: f64) -> Self {
        let score = clamp_score(score);
        Self {
            score,
            level: RiskLevel::from_score(score),
            confidence: clamp_unit(confidence),
        }
    }
}

// ============================================================================
// NUMERIC HELPERS
// ============================================================================

/// Clamp into [0, 1]. NaN becomes 0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Clamp into [0, 100]. NaN becomes 0.
pub fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Linear ramp from `threshold` (0.0) to `cap` (1.0), clamped to [0, 1].
///
/// Works in either direction: when `cap < threshold` the ramp rises as the
/// value falls (e.g. low walking speed).
pub fn linear_ramp(value: f64, threshold: f64, cap: f64) -> f64 {
    let span = cap - threshold;
    if span == 0.0 {
        return if value == threshold { 0.0 } else { 1.0 };
    }
    clamp_unit((value - threshold) / span)
}

// ============================================================================
// TESTS
// ============================================================================
