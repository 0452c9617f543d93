//! Gait Telemetry Engine Library
//!
//! Turns a stream of per-sample gait metrics into a running fall-risk score,
//! an adaptive sampling interval and a bounded feature history, and fuses the
//! final snapshot into an explainable clinical assessment at session end.
//!
//! # Design Philosophy
//!
//! - **Total scoring paths**: scoring, emission and fusion never fail.
//!   Missing inputs fall back to fixed defaults; out-of-range values are
//!   clamped.
//! - **Explainability**: every session assessment lists the risk factors
//!   behind it, each with a severity and a human-readable description.
//! - **Asymmetric sampling**: react to risk immediately, relax only after
//!   sustained stability.
//! - **Bounded memory**: the feature history is a fixed-capacity FIFO.
//!
//! # Example
//!
//! ```
//! use gait_telemetry::{EngineConfig, GaitMetrics, GaitMonitoringSession, SessionContext};
//!
//! let mut session = GaitMonitoringSession::new(&EngineConfig::default());
//! let metrics = GaitMetrics::new().with_speed(0.7).with_double_support(26.0);
//!
//! let outcome = session.process_sample(&metrics, false, &[]);
//! assert!(outcome.next_interval_secs >= 0.5);
//!
//! let assessment = session.finish(&SessionContext::default());
//! assert!(assessment.factor("Low Speed").is_some());
//! ```

pub mod assessment;
pub mod config;
pub mod emission;
pub mod error;
pub mod feature_log;
pub mod fusion;
pub mod risk_scorer;
pub mod session;
pub mod types;


// Re-export commonly used types
pub use assessment::{GaitAssessment, RiskCategory, RiskFactor};
pub use config::EngineConfig;
pub use emission::{AdaptiveEmissionController, EmissionConfig, SharedEmissionController};
pub use error::{ConfigError, GaitError, GaitResult};
pub use feature_log::{FeatureVectorLogger, GaitFeatureVector};
pub use fusion::{PostSessionFusion, SessionInputs};
pub use risk_scorer::{AugmentedScorer, GaitRiskScorer, HeuristicScorer, RiskScorer};
pub use session::{GaitMonitoringSession, SampleOutcome, SessionContext};
pub use types::{
    EnvironmentAnalysisResult, GaitMetrics, GaitRiskAssessment, PostureAnalysisResult, RiskLevel,
};
