use anyhow::{Context, Result};
use chrono::Utc;
use std::path::Path;

use stormwatch::analysis::AnalysisPipeline;
use stormwatch::config::Config;
use stormwatch::models::MeasurementInput;
use stormwatch::notifications::AlertRouter;

/// Run a JSON array of measurements through a local, inline pipeline
pub async fn analyze(config: Config, input: &Path, json: bool) -> Result<()> {
    let content = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("Failed to read input file: {}", input.display()))?;

    let inputs: Vec<MeasurementInput> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse measurements: {}", input.display()))?;

    let router = AlertRouter::from_config(&config.notifications)
        .context("Failed to configure notification channels")?;
    let pipeline = AnalysisPipeline::builder()
        .analysis_config(&config.analysis)
        .router(router)
        .build();

    let total = inputs.len();
    let mut rejected = 0usize;
    let mut alerts = Vec::new();

    for (idx, input) in inputs.into_iter().enumerate() {
        let generated = match input.into_measurement(Utc::now()) {
            Ok(measurement) => pipeline.on_measurement(measurement).await,
            Err(e) => Err(e),
        };

        match generated {
            Ok(generated) => alerts.extend(generated),
            Err(e) => {
                rejected += 1;
                tracing::warn!(index = idx, error = %e, "Skipping invalid measurement");
            }
        }
    }

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&alerts).context("Failed to serialize alerts")?
        );
    } else {
        println!("Analysis Results");
        println!("================");
        println!("  Measurements: {total}");
        println!("  Rejected: {rejected}");
        println!("  Alerts: {}", alerts.len());
        println!();
        for alert in &alerts {
            println!("  {alert}");
        }
    }

    Ok(())
}
