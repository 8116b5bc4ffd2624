use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::{oneshot, watch};

use stormwatch::analysis::AnalysisPipeline;
use stormwatch::bus::{self, AlertBus};
use stormwatch::config::Config;
use stormwatch::ingest::{OpenWeatherMapClient, WeatherClientConfig, WeatherPoller};
use stormwatch::metrics;
use stormwatch::notifications::AlertRouter;
use stormwatch::server::WeatherServer;

/// Resolves once the shutdown flag flips or the sender is gone
async fn wait_for_shutdown(mut rx: watch::Receiver<bool>) {
    while !*rx.borrow() {
        if rx.changed().await.is_err() {
            break;
        }
    }
}

/// Start the weather server
pub async fn serve(mut config: Config, bind: Option<String>, poll: bool) -> Result<()> {
    if let Some(bind) = bind {
        config.server.bind_address = bind;
    }
    if poll {
        config.ingest.enabled = true;
    }
    config.validate().context("Invalid configuration")?;

    if let Err(e) = metrics::init_metrics() {
        tracing::warn!("Metrics initialization failed, continuing without metrics: {}", e);
    }

    // Notification side
    let router = AlertRouter::from_config(&config.notifications)
        .context("Failed to configure notification channels")?;

    // Analysis side publishes to the bus; the consumer feeds on_alert
    let (publisher, receiver) = AlertBus::channel(config.analysis.bus_buffer);
    let pipeline = Arc::new(
        AnalysisPipeline::builder()
            .analysis_config(&config.analysis)
            .router(router)
            .publisher(Arc::new(publisher))
            .build(),
    );
    // Drained only after the server and poller stop producing alerts
    let (drain_tx, drain_rx) = oneshot::channel::<()>();
    let consumer = bus::spawn_consumer(receiver, Arc::clone(&pipeline), async move {
        let _ = drain_rx.await;
    });

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let poller = if config.ingest.enabled {
        let client_config = WeatherClientConfig::from_ingest(&config.ingest)?;
        let client = OpenWeatherMapClient::new(client_config)?;
        let poller = WeatherPoller::new(Arc::new(client), Arc::clone(&pipeline), &config.ingest);
        let shutdown = wait_for_shutdown(shutdown_rx);
        Some(tokio::spawn(async move { poller.run_until(shutdown).await }))
    } else {
        None
    };

    let server = WeatherServer::new(&config, Arc::clone(&pipeline))
        .context("Failed to create weather server")?;

    println!("{}", server.info().display());
    println!();
    println!("API Endpoints:");
    println!("  POST /api/weather                  - Submit a measurement");
    println!("  GET  /api/alerts                   - Recent alerts (newest first)");
    println!("  GET  /api/alerts/location/{{id}}     - Alerts for a location");
    println!("  GET  /api/alerts/type/{{type}}       - Alerts of a type");
    println!("  GET  /api/health                   - Health check");
    println!("  GET  /metrics                      - Prometheus metrics endpoint");
    println!();
    println!("Press Ctrl+C to stop.\n");

    // Start with graceful shutdown
    server
        .start_with_shutdown(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Shutdown signal received");
                }
                Err(e) => {
                    tracing::error!("Failed to wait for Ctrl+C: {}", e);
                }
            }
            let _ = shutdown_tx.send(true);
        })
        .await?;

    if let Some(handle) = poller {
        let _ = handle.await;
    }

    let _ = drain_tx.send(());
    match consumer.await {
        Ok(handled) => tracing::info!(handled, "Alert bus drained"),
        Err(e) => tracing::error!("Alert bus consumer failed: {}", e),
    }

    println!("Weather server stopped.");
    Ok(())
}
