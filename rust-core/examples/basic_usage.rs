/// Basic usage example: feed gait metrics, adapt sampling, get an assessment
use gait_telemetry::{
    EngineConfig, EnvironmentAnalysisResult, GaitAssessment, GaitMetrics, GaitMonitoringSession,
    PostureAnalysisResult, SessionContext,
};
use tracing_subscriber::EnvFilter;

fn main() {
    // RUST_LOG=debug shows every emission decision.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    println!("=== Gait Telemetry Engine: Basic Example ===\n");

    let config = EngineConfig::default();
    let mut session = GaitMonitoringSession::new(&config);

    // Simulated walk: steady start, then fatigue sets in
    let steady = GaitMetrics::new()
        .with_speed(1.2)
        .with_step_length(0.68)
        .with_stride_length(1.36)
        .with_cadence(106.0)
        .with_phases(61.0, 12.0)
        .with_variability(0.015, 0.02, 0.03)
        .with_toe_clearance(0.022)
        .with_asymmetry(2.0)
        .with_near_trips(0);
    let fatigued = GaitMetrics::new()
        .with_speed(0.65)
        .with_step_length(0.45)
        .with_stride_length(0.9)
        .with_cadence(88.0)
        .with_phases(66.0, 26.0)
        .with_variability(0.07, 0.09, 0.06)
        .with_toe_clearance(0.009)
        .with_asymmetry(8.0)
        .with_near_trips(2);

    let mut elapsed = 0.0;
    for i in 0..20 {
        let metrics = if i < 12 { &steady } else { &fatigued };
        let outcome = session.process_sample(metrics, false, &[]);
        elapsed += outcome.next_interval_secs;
        println!(
            "t={:5.1}s  risk={:5.1} ({:<8})  next interval={:.2}s",
            elapsed,
            outcome.risk.score,
            outcome.risk.level.name(),
            outcome.next_interval_secs
        );
    }

    let context = SessionContext {
        posture: Some(PostureAnalysisResult {
            mediolateral_sway: 28.0,
            anteroposterior_sway: 31.0,
            total_sway: 38.0,
            stability_index: 62.0,
        }),
        environment: Some(EnvironmentAnalysisResult {
            surface_type: "rug over hardwood".to_string(),
            lighting_condition: "dim".to_string(),
            hazard_score: 40.0,
            obstacles: Vec::new(),
        }),
        quality_confidence: Some(0.9),
        floor_std: Some(0.01),
        duration_override_secs: Some(elapsed),
    };
    let assessment = session.finish(&context);
    print_assessment(&assessment);

    match session.logger().export_json() {
        Ok(bytes) => println!("\nFeature history: {} records, {} bytes", session.logger().len(), bytes.len()),
        Err(e) => eprintln!("\nFeature export failed: {e}"),
    }
}

fn print_assessment(assessment: &GaitAssessment) {
    let risk = &assessment.fall_risk;
    println!("\n--- Session Assessment ---");
    println!("Score: {:.1}  Level: {}  Confidence: {:.2}", risk.score, risk.level.name(), risk.confidence);

    println!("\nRisk factors:");
    for factor in &risk.risk_factors {
        println!("  [{:.2}] {}: {}", factor.severity, factor.name, factor.description);
    }

    let cycle = &assessment.detailed_analysis.gait_cycle;
    println!(
        "\nGait cycle: stance {:.0}%  swing {:.0}%  double support {:.0}%  cadence {:.0}/min",
        cycle.stance_phase_percentage,
        cycle.swing_phase_percentage,
        cycle.double_support_percentage,
        cycle.cadence
    );

    println!("\nRecommendations:");
    for rec in &assessment.recommendations {
        println!("  - {}", rec);
    }
}
