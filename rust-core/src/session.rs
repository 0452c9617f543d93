//! Gait monitoring session.
//!
//! Ties the continuous path together for one walking session:
//!
//! ```text
//! metrics ──► RiskScorer ──► AdaptiveEmissionController ──► next interval
//!                  │
//!                  └────────► FeatureVectorLogger (shared)
//! ```
//!
//! and runs [`PostSessionFusion`] once when the session finishes. The
//! session is driven by a single producer; the feature logger may be shared
//! with other sessions or with an exporter through an [`Arc`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::assessment::GaitAssessment;
use crate::config::EngineConfig;
use crate::emission::{AdaptiveEmissionController, EmissionStats};
use crate::feature_log::FeatureVectorLogger;
use crate::fusion::{PostSessionFusion, SessionInputs};
use crate::risk_scorer::{GaitRiskScorer, RiskScorer};
use crate::types::{
    EnvironmentAnalysisResult, GaitMetrics, GaitRiskAssessment, PostureAnalysisResult,
};

/// Result of processing one metrics sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleOutcome {
    /// Freshly scored risk.
    pub risk: GaitRiskAssessment,
    /// Interval (s) to wait before the next sample.
    pub next_interval_secs: f64,
}

/// Optional end-of-session inputs for fusion.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub posture: Option<PostureAnalysisResult>,
    pub environment: Option<EnvironmentAnalysisResult>,
    /// Data-quality confidence in [0, 1].
    pub quality_confidence: Option<f64>,
    /// Floor-plane standard deviation (m).
    pub floor_std: Option<f64>,
    /// Use this duration instead of the measured wall-clock time.
    pub duration_override_secs: Option<f64>,
}

/// One monitoring session: scorer, emission controller and logger.
#[derive(Debug)]
pub struct GaitMonitoringSession {
    scorer: RiskScorer,
    controller: AdaptiveEmissionController,
    logger: Arc<FeatureVectorLogger>,
    fusion: PostSessionFusion,

    current_interval_secs: f64,
    last_metrics: Option<GaitMetrics>,
    last_risk: Option<GaitRiskAssessment>,
    samples_processed: u64,
    started_at: DateTime<Utc>,
}

impl GaitMonitoringSession {
    /// Create a session with its own feature logger.
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_logger(config, Arc::new(FeatureVectorLogger::from_config(&config.logger)))
    }

    /// Create a session that logs into an existing, possibly shared, logger.
    pub fn with_logger(config: &EngineConfig, logger: Arc<FeatureVectorLogger>) -> Self {
        let scorer = RiskScorer::from_config(&config.scorer);
        info!(scorer = scorer.name(), "gait session started");
        Self {
            scorer,
            controller: AdaptiveEmissionController::new(config.emission.clone()),
            logger,
            fusion: PostSessionFusion::new(),
            current_interval_secs: config.emission.baseline_interval_secs,
            last_metrics: None,
            last_risk: None,
            samples_processed: 0,
            started_at: Utc::now(),
        }
    }

    /// Score a metrics sample, adapt the interval and log the feature vector.
    pub fn process_sample(
        &mut self,
        metrics: &GaitMetrics,
        alerts_active: bool,
        drift_flags: &[String],
    ) -> SampleOutcome {
        let risk = self.scorer.score_metrics(metrics);
        let next_interval_secs = self.controller.suggest(
            self.current_interval_secs,
            metrics,
            Some(&risk),
            alerts_active,
            drift_flags,
        );
        self.logger.log(Some(metrics), Some(&risk));

        self.current_interval_secs = next_interval_secs;
        self.last_metrics = Some(metrics.clone());
        self.last_risk = Some(risk);
        self.samples_processed += 1;

        debug!(
            sample = self.samples_processed,
            score = risk.score,
            level = risk.level.name(),
            next_interval_secs,
            "sample processed"
        );

        SampleOutcome {
            risk,
            next_interval_secs,
        }
    }

    /// Build the end-of-session assessment from the last sample.
    ///
    /// Without any processed sample the assessment is built from empty
    /// metrics scored on the spot.
    pub fn finish(&self, context: &SessionContext) -> GaitAssessment {
        let empty = GaitMetrics::default();
        let metrics = self.last_metrics.as_ref().unwrap_or(&empty);
        let risk = match self.last_risk {
            Some(risk) => risk,
            None => {
                warn!("finishing a session with no processed samples");
                self.scorer.score_metrics(metrics)
            }
        };

        let session_duration_secs = context
            .duration_override_secs
            .unwrap_or_else(|| self.elapsed_secs());

        let inputs = SessionInputs {
            metrics,
            risk: &risk,
            posture: context.posture.as_ref(),
            environment: context.environment.as_ref(),
            session_duration_secs: Some(session_duration_secs),
            quality_confidence: context.quality_confidence,
            floor_std: context.floor_std,
        };
        let assessment = self.fusion.build_assessment(&inputs);

        info!(
            samples = self.samples_processed,
            duration_secs = session_duration_secs,
            "gait session finished"
        );
        assessment
    }

    /// Start over: reset the controller, the interval and the last state.
    ///
    /// The feature buffer is kept unless `clear_log` is set.
    pub fn restart(&mut self, clear_log: bool) {
        self.controller.reset();
        self.current_interval_secs = self.controller.config().baseline_interval_secs;
        self.last_metrics = None;
        self.last_risk = None;
        self.samples_processed = 0;
        self.started_at = Utc::now();
        if clear_log {
            self.logger.reset();
        }
        info!(clear_log, "gait session restarted");
    }

    pub fn current_interval_secs(&self) -> f64 {
        self.current_interval_secs
    }

    pub fn last_risk(&self) -> Option<&GaitRiskAssessment> {
        self.last_risk.as_ref()
    }

    pub fn last_metrics(&self) -> Option<&GaitMetrics> {
        self.last_metrics.as_ref()
    }

    pub fn samples_processed(&self) -> u64 {
        self.samples_processed
    }

    pub fn scorer_name(&self) -> &'static str {
        self.scorer.name()
    }

    pub fn emission_stats(&self) -> EmissionStats {
        self.controller.stats()
    }

    pub fn stability_counter(&self) -> u32 {
        self.controller.stability_counter()
    }

    pub fn logger(&self) -> &Arc<FeatureVectorLogger> {
        &self.logger
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    fn elapsed_secs(&self) -> f64 {
        let elapsed = Utc::now().signed_duration_since(self.started_at);
        (elapsed.num_milliseconds() as f64 / 1000.0).max(0.0)
    }
}

// ============================================================================
// TESTS
// ============================================================================
