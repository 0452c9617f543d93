//! Per-sample fall-risk scoring.
//!
//! Two interchangeable strategies share the [`GaitRiskScorer`] capability:
//!
//! - [`HeuristicScorer`]: clinical-threshold baseline.
//! - [`AugmentedScorer`]: wraps the heuristic and applies a deterministic
//!   arithmetic adjustment when the enhanced model resource is present.
//!   Without it, every call passes through to the heuristic unchanged.
//!
//! Scoring is total. Missing inputs contribute nothing to the score and
//! lower the confidence instead.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::types::{clamp_unit, linear_ramp, GaitMetrics, GaitRiskAssessment};

/// Flattened feature snapshot consumed by the scorers.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RiskInputs {
    /// Walking speed (m/s).
    pub walking_speed: Option<f64>,
    /// Minimum toe clearance (m).
    pub toe_clearance: Option<f64>,
    /// Step-length asymmetry (%).
    pub step_length_asymmetry: Option<f64>,
    /// Double-support time (% of gait cycle).
    pub double_support: Option<f64>,
    /// Stride-time coefficient of variation.
    pub stride_time_variability: Option<f64>,
    /// Step-length coefficient of variation.
    pub step_length_variability: Option<f64>,
    /// Near-trip events in the window.
    pub near_trip_events: Option<u32>,
}

impl From<&GaitMetrics> for RiskInputs {
    fn from(m: &GaitMetrics) -> Self {
        Self {
            walking_speed: m.average_walking_speed,
            toe_clearance: m.average_toe_clearance,
            step_length_asymmetry: m.walking_asymmetry,
            double_support: m.double_support_time,
            stride_time_variability: m.stride_time_variability,
            step_length_variability: m.step_length_variability,
            near_trip_events: m.near_trip_events,
        }
    }
}

impl RiskInputs {
    const FIELD_COUNT: usize = 7;

    fn present_count(&self) -> usize {
        [
            self.walking_speed,
            self.toe_clearance,
            self.step_length_asymmetry,
            self.double_support,
            self.stride_time_variability,
            self.step_length_variability,
        ]
        .iter()
        .filter(|v| v.map_or(false, f64::is_finite))
        .count()
            + usize::from(self.near_trip_events.is_some())
    }
}

/// Capability shared by both scoring strategies.
pub trait GaitRiskScorer {
    /// Score one feature snapshot. Never fails.
    fn score(&self, inputs: &RiskInputs) -> GaitRiskAssessment;

    /// Short strategy name for logs.
    fn name(&self) -> &'static str;
}

// ============================================================================
// HEURISTIC BASELINE
// ============================================================================

/// Clinical-threshold baseline.
///
/// Each input contributes a fixed maximum number of points through a linear
/// ramp from its "normal" threshold to its cap; the caps sum to 100.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicScorer;

impl HeuristicScorer {
    pub fn new() -> Self {
        Self
    }

    fn points(inputs: &RiskInputs) -> f64 {
        let ramp = |value: Option<f64>, threshold: f64, cap: f64, weight: f64| -> f64 {
            match value {
                Some(v) if v.is_finite() => linear_ramp(v, threshold, cap) * weight,
                _ => 0.0,
            }
        };

        let mut total = 0.0;
        total += ramp(inputs.toe_clearance, 0.02, 0.005, 20.0);
        total += ramp(inputs.step_length_asymmetry, 3.0, 15.0, 15.0);
        total += ramp(inputs.double_support, 20.0, 35.0, 20.0);
        total += ramp(inputs.walking_speed, 1.0, 0.4, 20.0);
        total += ramp(inputs.stride_time_variability, 0.03, 0.10, 10.0);
        total += ramp(inputs.step_length_variability, 0.04, 0.12, 5.0);
        if let Some(trips) = inputs.near_trip_events {
            total += f64::from(trips.min(4)) * 2.5;
        }
        total
    }
}

impl GaitRiskScorer for HeuristicScorer {
    fn score(&self, inputs: &RiskInputs) -> GaitRiskAssessment {
        let coverage = inputs.present_count() as f64 / RiskInputs::FIELD_COUNT as f64;
        let confidence = clamp_unit(0.4 + 0.6 * coverage);
        GaitRiskAssessment::new(Self::points(inputs), confidence)
    }

    fn name(&self) -> &'static str {
        "heuristic"
    }
}

// ============================================================================
// AUGMENTED VARIANT
// ============================================================================

/// Heuristic score adjusted by a fixed arithmetic model.
#[derive(Debug, Clone)]
pub struct AugmentedScorer {
    baseline: HeuristicScorer,
    model_available: bool,
}

impl AugmentedScorer {
    const BASE_WEIGHT: f64 = 0.92;
    const CONFIDENCE_GAIN: f64 = 1.05;

    /// Create with an explicitly resolved model availability.
    pub fn new(model_available: bool) -> Self {
        Self {
            baseline: HeuristicScorer::new(),
            model_available,
        }
    }

    /// Resolve availability from configuration.
    ///
    /// An explicit override wins; otherwise the model is available when the
    /// configured resource path points at an existing file. Absence is a
    /// supported degraded mode.
    pub fn from_config(config: &ScorerConfig) -> Self {
        let model_available = match config.enhanced_model_available {
            Some(flag) => flag,
            None => config
                .enhanced_model_path
                .as_ref()
                .map_or(false, |path| path.is_file()),
        };
        info!(model_available, "augmented scorer resolved enhanced model");
        Self::new(model_available)
    }

    pub fn model_available(&self) -> bool {
        self.model_available
    }

    fn boost(inputs: &RiskInputs) -> f64 {
        let mut boost = 0.0;
        if inputs.toe_clearance.map_or(false, |v| v < 0.015) {
            boost += 3.0;
        }
        if inputs.step_length_asymmetry.map_or(false, |v| v > 6.0) {
            boost += 2.0;
        }
        if inputs.double_support.map_or(false, |v| v > 22.0) {
            boost += 4.0;
        }
        boost
    }
}

impl GaitRiskScorer for AugmentedScorer {
    fn score(&self, inputs: &RiskInputs) -> GaitRiskAssessment {
        let base = self.baseline.score(inputs);
        if !self.model_available {
            return base;
        }

        // Only the baseline's score and confidence feed the adjustment.
        let boost = Self::boost(inputs);
        let adjusted_score = base.score * Self::BASE_WEIGHT + boost;
        let adjusted_confidence = (base.confidence * Self::CONFIDENCE_GAIN).min(1.0);
        debug!(base = base.score, boost, adjusted = adjusted_score, "augmented score");
        GaitRiskAssessment::new(adjusted_score, adjusted_confidence)
    }

    fn name(&self) -> &'static str {
        "augmented"
    }
}

// ============================================================================
// STRATEGY SELECTION
// ============================================================================

/// Which strategy a session should use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScorerStrategy {
    Heuristic,
    #[default]
    Augmented,
}

/// Scorer configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorerConfig {
    /// Strategy constructed for each session.
    pub strategy: ScorerStrategy,
    /// Location of the enhanced model resource.
    pub enhanced_model_path: Option<PathBuf>,
    /// Overrides the resource lookup when set.
    pub enhanced_model_available: Option<bool>,
}

/// Session-scoped scorer; one of exactly two strategies.
#[derive(Debug, Clone)]
pub enum RiskScorer {
    Heuristic(HeuristicScorer),
    Augmented(AugmentedScorer),
}

impl RiskScorer {
    pub fn from_config(config: &ScorerConfig) -> Self {
        match config.strategy {
            ScorerStrategy::Heuristic => RiskScorer::Heuristic(HeuristicScorer::new()),
            ScorerStrategy::Augmented => RiskScorer::Augmented(AugmentedScorer::from_config(config)),
        }
    }

    /// Score a raw metrics snapshot.
    pub fn score_metrics(&self, metrics: &GaitMetrics) -> GaitRiskAssessment {
        self.score(&RiskInputs::from(metrics))
    }
}

impl Default for RiskScorer {
    fn default() -> Self {
        RiskScorer::Heuristic(HeuristicScorer::new())
    }
}

impl GaitRiskScorer for RiskScorer {
    fn score(&self, inputs: &RiskInputs) -> GaitRiskAssessment {
        match self {
            RiskScorer::Heuristic(s) => s.score(inputs),
            RiskScorer::Augmented(s) => s.score(inputs),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            RiskScorer::Heuristic(s) => s.name(),
            RiskScorer::Augmented(s) => s.name(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RiskLevel;
    use approx::assert_abs_diff_eq;

    fn healthy() -> RiskInputs {
        RiskInputs {
            walking_speed: Some(1.3),
            toe_clearance: Some(0.025),
            step_length_asymmetry: Some(2.0),
            double_support: Some(15.0),
            stride_time_variability: Some(0.02),
            step_length_variability: Some(0.03),
            near_trip_events: Some(0),
        }
    }

    fn impaired() -> RiskInputs {
        RiskInputs {
            walking_speed: Some(0.6),
            toe_clearance: Some(0.010),
            step_length_asymmetry: Some(9.0),
            double_support: Some(27.5),
            stride_time_variability: Some(0.065),
            step_length_variability: Some(0.08),
            near_trip_events: Some(1),
        }
    }

    #[test]
    fn test_heuristic_healthy_is_low() {
        let a = HeuristicScorer::new().score(&healthy());
        assert_abs_diff_eq!(a.score, 0.0);
        assert_eq!(a.level, RiskLevel::Low);
        assert_abs_diff_eq!(a.confidence, 1.0);
    }

    #[test]
    fn test_heuristic_impaired_score() {
        let a = HeuristicScorer::new().score(&impaired());
        // 20*(2/3) + 15*0.5 + 20*0.5 + 20*(2/3) + 10*0.5 + 5*0.5 + 2.5
        let expected = 40.0 / 3.0 + 7.5 + 10.0 + 40.0 / 3.0 + 5.0 + 2.5 + 2.5;
        assert_abs_diff_eq!(a.score, expected, epsilon = 1e-9);
        assert_eq!(a.level, RiskLevel::High);
    }

    #[test]
    fn test_heuristic_is_monotonic_in_double_support() {
        let scorer = HeuristicScorer::new();
        let mut previous = -1.0;
        for ds in [10.0, 20.0, 22.0, 25.0, 30.0, 35.0, 50.0] {
            let inputs = RiskInputs { double_support: Some(ds), ..healthy() };
            let score = scorer.score(&inputs).score;
            assert!(score >= previous, "score fell at double support {}", ds);
            previous = score;
        }
    }

    #[test]
    fn test_heuristic_saturates_at_100() {
        let worst = RiskInputs {
            walking_speed: Some(0.0),
            toe_clearance: Some(0.0),
            step_length_asymmetry: Some(90.0),
            double_support: Some(90.0),
            stride_time_variability: Some(1.0),
            step_length_variability: Some(1.0),
            near_trip_events: Some(50),
        };
        let a = HeuristicScorer::new().score(&worst);
        assert_abs_diff_eq!(a.score, 100.0);
        assert_eq!(a.level, RiskLevel::Critical);
    }

    #[test]
    fn test_heuristic_empty_inputs() {
        let a = HeuristicScorer::new().score(&RiskInputs::default());
        assert_eq!(a.score, 0.0);
        assert_abs_diff_eq!(a.confidence, 0.4);
    }

    #[test]
    fn test_heuristic_ignores_nan_inputs() {
        let inputs = RiskInputs { walking_speed: Some(f64::NAN), ..RiskInputs::default() };
        let a = HeuristicScorer::new().score(&inputs);
        assert_eq!(a.score, 0.0);
        assert_abs_diff_eq!(a.confidence, 0.4);
    }

    #[test]
    fn test_augmented_without_model_passes_through() {
        let heuristic = HeuristicScorer::new();
        let augmented = AugmentedScorer::new(false);
        for inputs in [healthy(), impaired(), RiskInputs::default()] {
            assert_eq!(augmented.score(&inputs), heuristic.score(&inputs));
        }
    }

    #[test]
    fn test_augmented_with_model_applies_boost() {
        let inputs = impaired();
        let base = HeuristicScorer::new().score(&inputs);
        let a = AugmentedScorer::new(true).score(&inputs);
        // toe clearance 0.010 (+3), asymmetry 9 (+2), double support 27.5 (+4)
        assert_abs_diff_eq!(a.score, base.score * 0.92 + 9.0, epsilon = 1e-9);
        assert_abs_diff_eq!(a.confidence, (base.confidence * 1.05).min(1.0));
        assert_eq!(a.level, RiskLevel::from_score(a.score));
    }

    #[test]
    fn test_augmented_boost_thresholds_are_strict() {
        let inputs = RiskInputs {
            toe_clearance: Some(0.015),
            step_length_asymmetry: Some(6.0),
            double_support: Some(22.0),
            ..RiskInputs::default()
        };
        assert_eq!(AugmentedScorer::boost(&inputs), 0.0);
    }

    #[test]
    fn test_augmented_level_recomputed_from_adjusted_score() {
        // Toe clearance 0.016 ramps the baseline but misses the +3 boost.
        let inputs = RiskInputs {
            toe_clearance: Some(0.016),
            double_support: Some(22.5),
            ..RiskInputs::default()
        };
        let base = HeuristicScorer::new().score(&inputs);
        let a = AugmentedScorer::new(true).score(&inputs);
        assert_abs_diff_eq!(a.score, base.score * 0.92 + 4.0, epsilon = 1e-9);
        assert_eq!(a.level, RiskLevel::from_score(a.score));
    }

    #[test]
    fn test_augmented_is_deterministic() {
        let scorer = AugmentedScorer::new(true);
        let first = scorer.score(&impaired());
        for _ in 0..100 {
            assert_eq!(scorer.score(&impaired()), first);
        }
    }

    #[test]
    fn test_augmented_confidence_capped() {
        let a = AugmentedScorer::new(true).score(&healthy());
        assert_abs_diff_eq!(a.confidence, 1.0);
    }

    #[test]
    fn test_model_resolution_override_and_missing_path() {
        let config = ScorerConfig {
            strategy: ScorerStrategy::Augmented,
            enhanced_model_path: Some(PathBuf::from("/nonexistent/gait-model.bin")),
            enhanced_model_available: None,
        };
        assert!(!AugmentedScorer::from_config(&config).model_available());

        let forced = ScorerConfig { enhanced_model_available: Some(true), ..config };
        assert!(AugmentedScorer::from_config(&forced).model_available());
    }

    #[test]
    fn test_strategy_dispatch() {
        let heuristic = RiskScorer::from_config(&ScorerConfig {
            strategy: ScorerStrategy::Heuristic,
            ..ScorerConfig::default()
        });
        assert_eq!(heuristic.name(), "heuristic");

        let augmented = RiskScorer::from_config(&ScorerConfig {
            enhanced_model_available: Some(true),
            ..ScorerConfig::default()
        });
        assert_eq!(augmented.name(), "augmented");
        assert_eq!(
            augmented.score(&impaired()),
            AugmentedScorer::new(true).score(&impaired())
        );
    }

    #[test]
    fn test_inputs_from_metrics() {
        let m = GaitMetrics::new()
            .with_speed(0.9)
            .with_toe_clearance(0.012)
            .with_asymmetry(7.0)
            .with_double_support(24.0);
        let inputs = RiskInputs::from(&m);
        assert_eq!(inputs.walking_speed, Some(0.9));
        assert_eq!(inputs.toe_clearance, Some(0.012));
        assert_eq!(inputs.step_length_asymmetry, Some(7.0));
        assert_eq!(inputs.double_support, Some(24.0));
        assert_eq!(inputs.near_trip_events, None);
    }
}
