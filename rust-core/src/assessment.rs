//! Session-level assessment types.
//!
//! A [`GaitAssessment`] is built once, at session end, by
//! [`crate::fusion::PostSessionFusion`] and is immutable afterwards. All
//! types serialize to JSON for the reporting and persistence layers.

use serde::{Deserialize, Serialize};

use crate::error::GaitResult;
use crate::types::{GaitMetrics, RiskLevel};

// ============================================================================
// RISK FACTORS
// ============================================================================

/// Clinical grouping of a risk factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RiskCategory {
    GaitPattern,
    Balance,
    Environmental,
    Variability,
}

/// An explainable contributor to fall risk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub name: String,
    /// Severity in [0, 1].
    pub severity: f64,
    pub description: String,
    pub category: RiskCategory,
}

/// Session-level fall-risk summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallRiskScore {
    /// Score in [0, 100], carried from the last per-sample assessment.
    pub score: f64,
    pub level: RiskLevel,
    /// Blended confidence in [0, 1].
    pub confidence: f64,
    /// Factors ordered by severity, highest first.
    pub risk_factors: Vec<RiskFactor>,
}

// ============================================================================
// DETAILED ANALYSIS
// ============================================================================

/// Gait-cycle phase breakdown. Percentages of one gait cycle.
///
/// `single_support_percentage = max(0, stance - double_support)` holds by
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaitCycleBreakdown {
    pub stance_phase_percentage: f64,
    pub swing_phase_percentage: f64,
    pub double_support_percentage: f64,
    pub single_support_percentage: f64,
    /// Stride duration (s).
    pub stride_time: f64,
    /// Step duration (s).
    pub step_time: f64,
    /// Cadence (steps/min).
    pub cadence: f64,
}

/// Postural balance measures. Zero-filled without posture data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceMetrics {
    pub mediolateral_sway: f64,
    pub anteroposterior_sway: f64,
    pub total_sway: f64,
    /// Total sway per second of stride time.
    pub sway_velocity: f64,
    pub stability_index: f64,
}

/// Temporal-spatial parameters. Lengths in centimetres, times in seconds.
///
/// Left and right values are not measured independently by a single sensor;
/// both sides carry the session average.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemporalSpatialParameters {
    pub step_length_cm: f64,
    pub stride_length_cm: f64,
    pub left_step_length_cm: f64,
    pub right_step_length_cm: f64,
    pub step_time: f64,
    pub stride_time: f64,
    pub left_step_time: f64,
    pub right_step_time: f64,
    /// Walking speed (m/s), 0 when unmeasured.
    pub walking_speed: f64,
    pub cadence: f64,
}

/// Left/right asymmetry summary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AsymmetryAnalysis {
    /// Reported walking asymmetry (%), 0 when unmeasured.
    pub step_length_asymmetry: f64,
    /// `100 - asymmetry`, clamped to [0, 100].
    pub symmetry_index: f64,
    /// Asymmetry above the clinical threshold.
    pub clinically_significant: bool,
}

/// Stride-to-stride variability summary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VariabilityAnalysis {
    pub stride_time_variability: f64,
    pub step_length_variability: f64,
    pub walking_speed_variability: f64,
    /// Mean of the measured CVs, 0 when none were measured.
    pub overall_variability: f64,
    /// Harmonic ratio when reported.
    pub gait_regularity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedGaitAnalysis {
    pub gait_cycle: GaitCycleBreakdown,
    pub balance: BalanceMetrics,
    pub temporal_spatial: TemporalSpatialParameters,
    pub asymmetry: AsymmetryAnalysis,
    pub variability: VariabilityAnalysis,
}

// ============================================================================
// ENVIRONMENT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SurfaceType {
    Carpet,
    Hardwood,
    Tile,
    Concrete,
    Grass,
    Gravel,
    Uneven,
    Unknown,
}

impl SurfaceType {
    /// Case-insensitive keyword classification; `Unknown` when nothing matches.
    pub fn classify(label: &str) -> Self {
        let label = label.to_lowercase();
        const KEYWORDS: [(&str, SurfaceType); 8] = [
            ("carpet", SurfaceType::Carpet),
            ("rug", SurfaceType::Carpet),
            ("wood", SurfaceType::Hardwood),
            ("tile", SurfaceType::Tile),
            ("concrete", SurfaceType::Concrete),
            ("grass", SurfaceType::Grass),
            ("gravel", SurfaceType::Gravel),
            ("uneven", SurfaceType::Uneven),
        ];
        KEYWORDS
            .iter()
            .find(|(keyword, _)| label.contains(keyword))
            .map_or(SurfaceType::Unknown, |(_, surface)| *surface)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LightingCondition {
    Bright,
    Normal,
    Dim,
    Dark,
    Unknown,
}

impl LightingCondition {
    /// Case-insensitive keyword classification; `Unknown` when nothing matches.
    pub fn classify(label: &str) -> Self {
        let label = label.to_lowercase();
        if label.contains("dark") {
            LightingCondition::Dark
        } else if label.contains("dim") || label.contains("low") {
            LightingCondition::Dim
        } else if label.contains("bright") {
            LightingCondition::Bright
        } else if label.contains("normal") || label.contains("adequate") || label.contains("moderate") {
            LightingCondition::Normal
        } else {
            LightingCondition::Unknown
        }
    }
}

/// Simplified obstacle record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleRecord {
    pub kind: String,
    pub distance_m: f64,
    pub height_m: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalFactors {
    pub surface_type: SurfaceType,
    pub lighting: LightingCondition,
    pub hazard_score: f64,
    pub obstacles: Vec<ObstacleRecord>,
}

// ============================================================================
// ASSESSMENT
// ============================================================================

/// Complete end-of-session clinical assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaitAssessment {
    pub metrics: GaitMetrics,
    pub fall_risk: FallRiskScore,
    /// De-duplicated recommendations. Order is not part of the contract.
    pub recommendations: Vec<String>,
    pub detailed_analysis: DetailedGaitAnalysis,
    pub environment: Option<EnvironmentalFactors>,
}

impl GaitAssessment {
    /// Serialize the full report.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::GaitError::Json`] if serialization fails.
    pub fn to_json(&self) -> GaitResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Look up a risk factor by name.
    pub fn factor(&self, name: &str) -> Option<&RiskFactor> {
        self.fall_risk.risk_factors.iter().find(|f| f.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_classification() {
        assert_eq!(SurfaceType::classify("CARPET"), SurfaceType::Carpet);
        assert_eq!(SurfaceType::classify("Polished Hardwood"), SurfaceType::Hardwood);
        assert_eq!(SurfaceType::classify("wet tile"), SurfaceType::Tile);
        assert_eq!(SurfaceType::classify("Gravel path"), SurfaceType::Gravel);
        assert_eq!(SurfaceType::classify("linoleum"), SurfaceType::Unknown);
        assert_eq!(SurfaceType::classify(""), SurfaceType::Unknown);
    }

    #[test]
    fn test_lighting_classification() {
        assert_eq!(LightingCondition::classify("Bright"), LightingCondition::Bright);
        assert_eq!(LightingCondition::classify("DIM"), LightingCondition::Dim);
        assert_eq!(LightingCondition::classify("low light"), LightingCondition::Dim);
        assert_eq!(LightingCondition::classify("dark"), LightingCondition::Dark);
        assert_eq!(LightingCondition::classify("Normal"), LightingCondition::Normal);
        assert_eq!(LightingCondition::classify("strobe"), LightingCondition::Unknown);
    }

    #[test]
    fn test_category_serializes_camel_case() {
        let json = serde_json::to_string(&RiskCategory::GaitPattern).unwrap();
        assert_eq!(json, "\"gaitPattern\"");
    }
}
