//! Post-session fusion.
//!
//! Turns the final metrics snapshot, the last per-sample risk assessment and
//! the optional posture/environment analyses into a complete
//! [`GaitAssessment`]. The derivation is pure and total: every optional input
//! has a fixed default, so the function always returns a consistent report.
//!
//! Derivation chain:
//! 1. Gait-cycle phases (stance/swing/double/single support)
//! 2. Timing (stride time, step time, cadence)
//! 3. Balance metrics (posture pass-through, sway velocity)
//! 4. Temporal-spatial parameters
//! 5. Rule-based risk factors with linear-ramp severities
//! 6. Confidence blending
//! 7. Level-keyed and factor-triggered recommendations
//! 8. Environment mapping

use std::collections::HashSet;

use tracing::{info, warn};

use crate::assessment::*;
use crate::types::{
    clamp_score, clamp_unit, linear_ramp, EnvironmentAnalysisResult, GaitMetrics,
    GaitRiskAssessment, PostureAnalysisResult, RiskLevel,
};

/// Everything fusion consumes at session end.
#[derive(Debug, Clone, Copy)]
pub struct SessionInputs<'a> {
    pub metrics: &'a GaitMetrics,
    pub risk: &'a GaitRiskAssessment,
    pub posture: Option<&'a PostureAnalysisResult>,
    pub environment: Option<&'a EnvironmentAnalysisResult>,
    /// Session length (s).
    pub session_duration_secs: Option<f64>,
    /// Data-quality confidence in [0, 1].
    pub quality_confidence: Option<f64>,
    /// Standard deviation of the floor-plane estimate (m).
    pub floor_std: Option<f64>,
}

impl<'a> SessionInputs<'a> {
    /// Inputs with only the required metrics and risk.
    pub fn new(metrics: &'a GaitMetrics, risk: &'a GaitRiskAssessment) -> Self {
        Self {
            metrics,
            risk,
            posture: None,
            environment: None,
            session_duration_secs: None,
            quality_confidence: None,
            floor_std: None,
        }
    }
}

// ============================================================================
// RISK RULES
// ============================================================================

/// One rule of the risk-factor table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RiskRule {
    LowSpeed,
    HighDoubleSupport,
    StepLengthAsymmetry,
    LowToeClearance,
    HighStepVariability,
    ExcessivePosturalSway,
    EnvironmentalHazard,
}

impl RiskRule {
    fn name(self) -> &'static str {
        match self {
            RiskRule::LowSpeed => "Low Speed",
            RiskRule::HighDoubleSupport => "High Double Support",
            RiskRule::StepLengthAsymmetry => "Step Length Asymmetry",
            RiskRule::LowToeClearance => "Low Toe Clearance",
            RiskRule::HighStepVariability => "High Step Variability",
            RiskRule::ExcessivePosturalSway => "Excessive Postural Sway",
            RiskRule::EnvironmentalHazard => "Environmental Hazard",
        }
    }

    fn category(self) -> RiskCategory {
        match self {
            RiskRule::LowSpeed
            | RiskRule::StepLengthAsymmetry
            | RiskRule::LowToeClearance => RiskCategory::GaitPattern,
            RiskRule::HighDoubleSupport | RiskRule::ExcessivePosturalSway => RiskCategory::Balance,
            RiskRule::HighStepVariability => RiskCategory::Variability,
            RiskRule::EnvironmentalHazard => RiskCategory::Environmental,
        }
    }

    /// (threshold, cap) of the severity ramp.
    fn ramp(self) -> (f64, f64) {
        match self {
            RiskRule::LowSpeed => (0.8, 0.4),
            RiskRule::HighDoubleSupport => (20.0, 35.0),
            RiskRule::StepLengthAsymmetry => (5.0, 15.0),
            RiskRule::LowToeClearance => (0.015, 0.005),
            RiskRule::HighStepVariability => (0.08, 0.20),
            RiskRule::ExcessivePosturalSway => (30.0, 60.0),
            RiskRule::EnvironmentalHazard => (25.0, 75.0),
        }
    }

    fn recommendation(self) -> &'static str {
        match self {
            RiskRule::LowSpeed => "Progressive walking program to build gait speed",
            RiskRule::HighDoubleSupport => {
                "Dynamic balance exercises to reduce double-support time"
            }
            RiskRule::StepLengthAsymmetry => {
                "Gait symmetry retraining with rhythmic auditory cueing"
            }
            RiskRule::LowToeClearance => {
                "Ankle dorsiflexion strengthening to improve toe clearance"
            }
            RiskRule::HighStepVariability => {
                "Dual-task gait training to improve step consistency"
            }
            RiskRule::ExcessivePosturalSway => {
                "Static balance training such as tandem and single-leg stance"
            }
            RiskRule::EnvironmentalHazard => {
                "Address environmental hazards: lighting, obstacles and floor surfaces"
            }
        }
    }

    /// Evaluate the rule; `None` when the input is absent or within limits.
    fn evaluate(self, value: Option<f64>) -> Option<RiskFactor> {
        let value = value.filter(|v| v.is_finite())?;
        let (threshold, cap) = self.ramp();
        let triggered = if cap < threshold { value < threshold } else { value > threshold };
        if !triggered {
            return None;
        }
        Some(RiskFactor {
            name: self.name().to_string(),
            severity: linear_ramp(value, threshold, cap),
            description: self.describe(value, threshold),
            category: self.category(),
        })
    }

    fn describe(self, value: f64, threshold: f64) -> String {
        match self {
            RiskRule::LowSpeed => format!(
                "Walking speed of {:.2} m/s is below the {:.1} m/s fall-risk threshold",
                value, threshold
            ),
            RiskRule::HighDoubleSupport => format!(
                "Double-support time of {:.1}% exceeds {:.0}% of the gait cycle",
                value, threshold
            ),
            RiskRule::StepLengthAsymmetry => format!(
                "Step-length asymmetry of {:.1}% exceeds {:.0}%",
                value, threshold
            ),
            RiskRule::LowToeClearance => format!(
                "Toe clearance of {:.1} mm is below {:.0} mm, raising trip risk",
                value * 1000.0,
                threshold * 1000.0
            ),
            RiskRule::HighStepVariability => format!(
                "Step-length variability (CV {:.3}) exceeds {:.2}",
                value, threshold
            ),
            RiskRule::ExcessivePosturalSway => format!(
                "Postural sway of {:.1} exceeds {:.0}",
                value, threshold
            ),
            RiskRule::EnvironmentalHazard => format!(
                "Environment hazard score of {:.0} exceeds {:.0}",
                value, threshold
            ),
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        ALL_RULES.iter().copied().find(|rule| rule.name() == name)
    }
}

const ALL_RULES: [RiskRule; 7] = [
    RiskRule::LowSpeed,
    RiskRule::HighDoubleSupport,
    RiskRule::StepLengthAsymmetry,
    RiskRule::LowToeClearance,
    RiskRule::HighStepVariability,
    RiskRule::ExcessivePosturalSway,
    RiskRule::EnvironmentalHazard,
];

/// Baseline recommendations for each risk level.
fn level_recommendations(level: RiskLevel) -> &'static [&'static str] {
    match level {
        RiskLevel::Low => &[
            "Maintain current activity level with regular walking",
            "Repeat gait screening in 12 months",
        ],
        RiskLevel::Moderate => &[
            "Begin a structured balance and strength program",
            "Review the home for trip hazards",
            "Repeat gait screening in 3 months",
        ],
        RiskLevel::High => &[
            "Schedule a clinical gait and balance evaluation",
            "Start supervised balance training",
            "Review medications that affect balance",
            "Review the home for trip hazards",
        ],
        RiskLevel::Critical => &[
            "Arrange an urgent comprehensive fall-risk assessment",
            "Evaluate the need for an assistive walking device",
            "Ensure supervision or a fall alert system while walking",
            "Review medications that affect balance",
        ],
    }
}

// ============================================================================
// FUSION
// ============================================================================

/// End-of-session assessment builder.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostSessionFusion;

impl PostSessionFusion {
    pub const DEFAULT_STANCE_PCT: f64 = 60.0;
    pub const DEFAULT_DOUBLE_SUPPORT_PCT: f64 = 12.0;
    pub const DEFAULT_STRIDE_TIME_SECS: f64 = 1.2;
    pub const DEFAULT_CADENCE: f64 = 100.0;
    /// Session length at which the duration factor reaches 1.0.
    pub const ADEQUATE_SESSION_SECS: f64 = 20.0;
    pub const ASYMMETRY_THRESHOLD_PCT: f64 = 5.0;

    pub fn new() -> Self {
        Self
    }

    /// Build the complete session assessment.
    pub fn build_assessment(&self, inputs: &SessionInputs<'_>) -> GaitAssessment {
        let metrics = inputs.metrics;

        let gait_cycle = Self::gait_cycle(metrics);
        let balance = Self::balance(inputs.posture, gait_cycle.stride_time);
        let temporal_spatial = Self::temporal_spatial(metrics, &gait_cycle);
        let asymmetry = Self::asymmetry(metrics);
        let variability = Self::variability(metrics);

        let risk_factors = Self::risk_factors(inputs);
        let level = RiskLevel::from_score(inputs.risk.score);
        let confidence = Self::blend_confidence(inputs);
        let recommendations = Self::recommendations(level, &risk_factors);
        let environment = inputs.environment.map(Self::map_environment);

        info!(
            level = level.name(),
            factors = risk_factors.len(),
            confidence,
            "gait assessment built"
        );

        GaitAssessment {
            metrics: metrics.clone(),
            fall_risk: FallRiskScore {
                score: clamp_score(inputs.risk.score),
                level,
                confidence,
                risk_factors,
            },
            recommendations,
            detailed_analysis: DetailedGaitAnalysis {
                gait_cycle,
                balance,
                temporal_spatial,
                asymmetry,
                variability,
            },
            environment,
        }
    }

    // ------------------------------------------------------------------------
    // Derivations
    // ------------------------------------------------------------------------

    fn gait_cycle(metrics: &GaitMetrics) -> GaitCycleBreakdown {
        let stance = percentage_or(metrics.stance_time, Self::DEFAULT_STANCE_PCT);
        let double_support =
            percentage_or(metrics.double_support_time, Self::DEFAULT_DOUBLE_SUPPORT_PCT);
        let single_support = (stance - double_support).max(0.0);
        let swing = (100.0 - stance).max(0.0);

        let stride_time = match (metrics.stride_length, metrics.average_walking_speed) {
            (Some(length), Some(speed)) if speed > 0.0 => {
                let t = length / speed;
                if t.is_finite() && t > 0.0 {
                    t
                } else {
                    Self::DEFAULT_STRIDE_TIME_SECS
                }
            }
            _ => Self::DEFAULT_STRIDE_TIME_SECS,
        };
        let step_time = stride_time / 2.0;
        let cadence = match metrics.step_frequency {
            Some(f) if f.is_finite() && f > 0.0 => f,
            _ if step_time > 0.0 => 60.0 / step_time,
            _ => Self::DEFAULT_CADENCE,
        };

        GaitCycleBreakdown {
            stance_phase_percentage: stance,
            swing_phase_percentage: swing,
            double_support_percentage: double_support,
            single_support_percentage: single_support,
            stride_time,
            step_time,
            cadence,
        }
    }

    fn balance(posture: Option<&PostureAnalysisResult>, stride_time: f64) -> BalanceMetrics {
        let Some(posture) = posture else {
            return BalanceMetrics::default();
        };
        let sway_velocity = if stride_time > 0.0 {
            posture.total_sway / stride_time
        } else {
            0.0
        };
        BalanceMetrics {
            mediolateral_sway: posture.mediolateral_sway,
            anteroposterior_sway: posture.anteroposterior_sway,
            total_sway: posture.total_sway,
            sway_velocity,
            stability_index: posture.stability_index,
        }
    }

    fn temporal_spatial(
        metrics: &GaitMetrics,
        cycle: &GaitCycleBreakdown,
    ) -> TemporalSpatialParameters {
        let step_length_m = metrics.average_step_length.unwrap_or(0.0);
        let stride_length_m = metrics
            .stride_length
            .unwrap_or(step_length_m * 2.0);
        let step_length_cm = step_length_m * 100.0;

        // Single sensor: both sides carry the average.
        TemporalSpatialParameters {
            step_length_cm,
            stride_length_cm: stride_length_m * 100.0,
            left_step_length_cm: step_length_cm,
            right_step_length_cm: step_length_cm,
            step_time: cycle.step_time,
            stride_time: cycle.stride_time,
            left_step_time: cycle.step_time,
            right_step_time: cycle.step_time,
            walking_speed: metrics.average_walking_speed.unwrap_or(0.0),
            cadence: cycle.cadence,
        }
    }

    fn asymmetry(metrics: &GaitMetrics) -> AsymmetryAnalysis {
        let asymmetry = metrics
            .walking_asymmetry
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
            .max(0.0);
        AsymmetryAnalysis {
            step_length_asymmetry: asymmetry,
            symmetry_index: clamp_score(100.0 - asymmetry),
            clinically_significant: asymmetry > Self::ASYMMETRY_THRESHOLD_PCT,
        }
    }

    fn variability(metrics: &GaitMetrics) -> VariabilityAnalysis {
        let measured: Vec<f64> = [
            metrics.stride_time_variability,
            metrics.step_length_variability,
            metrics.walking_speed_variability,
        ]
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .collect();
        let overall = if measured.is_empty() {
            0.0
        } else {
            measured.iter().sum::<f64>() / measured.len() as f64
        };

        VariabilityAnalysis {
            stride_time_variability: metrics.stride_time_variability.unwrap_or(0.0),
            step_length_variability: metrics.step_length_variability.unwrap_or(0.0),
            walking_speed_variability: metrics.walking_speed_variability.unwrap_or(0.0),
            overall_variability: overall,
            gait_regularity: metrics.harmonic_ratio,
        }
    }

    fn risk_factors(inputs: &SessionInputs<'_>) -> Vec<RiskFactor> {
        let metrics = inputs.metrics;
        let evaluations = [
            (RiskRule::LowSpeed, metrics.average_walking_speed),
            (RiskRule::HighDoubleSupport, metrics.double_support_time),
            (RiskRule::StepLengthAsymmetry, metrics.walking_asymmetry),
            (RiskRule::LowToeClearance, metrics.average_toe_clearance),
            (RiskRule::HighStepVariability, metrics.step_length_variability),
            (
                RiskRule::ExcessivePosturalSway,
                inputs.posture.map(|p| p.total_sway),
            ),
            (
                RiskRule::EnvironmentalHazard,
                inputs.environment.map(|e| e.hazard_score),
            ),
        ];

        let mut factors: Vec<RiskFactor> = evaluations
            .into_iter()
            .filter_map(|(rule, value)| rule.evaluate(value))
            .collect();
        factors.sort_by(|a, b| b.severity.total_cmp(&a.severity));
        factors
    }

    fn blend_confidence(inputs: &SessionInputs<'_>) -> f64 {
        let mut confidence = clamp_unit(inputs.risk.confidence);

        if let Some(duration) = inputs.session_duration_secs {
            let duration = if duration.is_nan() { 0.0 } else { duration.max(0.0) };
            let adequacy = (duration / Self::ADEQUATE_SESSION_SECS).min(1.0);
            confidence *= 0.6 + 0.4 * adequacy;
        }

        if let Some(quality) = inputs.quality_confidence {
            confidence *= 0.8 + 0.2 * clamp_unit(quality);
        }

        if let Some(floor_std) = inputs.floor_std {
            let penalty = if floor_std.is_nan() {
                warn!("floor variance is NaN, skipping floor-stability penalty");
                1.0
            } else if floor_std <= 0.0 {
                1.0
            } else {
                (0.02 / floor_std).min(1.0).max(0.6)
            };
            confidence *= penalty;
        }

        if inputs.posture.is_some() {
            confidence = (confidence * 1.05).min(1.0);
        }

        clamp_unit(confidence)
    }

    /// Level-keyed base set followed by factor-triggered entries,
    /// de-duplicated keeping the first occurrence.
    fn recommendations(level: RiskLevel, factors: &[RiskFactor]) -> Vec<String> {
        let triggered = factors
            .iter()
            .filter_map(|f| RiskRule::from_name(&f.name))
            .map(RiskRule::recommendation);

        let mut seen = HashSet::new();
        level_recommendations(level)
            .iter()
            .copied()
            .chain(triggered)
            .filter(|r| seen.insert(*r))
            .map(str::to_string)
            .collect()
    }

    fn map_environment(environment: &EnvironmentAnalysisResult) -> EnvironmentalFactors {
        EnvironmentalFactors {
            surface_type: SurfaceType::classify(&environment.surface_type),
            lighting: LightingCondition::classify(&environment.lighting_condition),
            hazard_score: clamp_score(environment.hazard_score),
            obstacles: environment
                .obstacles
                .iter()
                .map(|o| ObstacleRecord {
                    kind: o.kind.clone(),
                    distance_m: o.distance_m,
                    height_m: o.height_m,
                })
                .collect(),
        }
    }
}

/// Percentage input clamped to [0, 100], or `default` when absent/NaN.
fn percentage_or(value: Option<f64>, default: f64) -> f64 {
    match value {
        Some(v) if !v.is_nan() => v.clamp(0.0, 100.0),
        _ => default,
    }
}

// ============================================================================
// TESTS
// ============================================================================
