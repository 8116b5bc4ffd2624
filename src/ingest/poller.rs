//! Timer-driven weather poller
//!
//! Picks a random configured city on every tick, fetches its current
//! conditions and feeds the measurement to the analysis pipeline. Fetch
//! errors are logged and the tick is skipped.

use rand::seq::SliceRandom;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use super::client::{IngestError, OpenWeatherMapClient};
use crate::analysis::AnalysisPipeline;
use crate::config::IngestConfig;
use crate::error::{Error, StormwatchErrorTrait};
use crate::models::Alert;

/// Polls the weather API and drives the pipeline
pub struct WeatherPoller {
    client: Arc<OpenWeatherMapClient>,
    pipeline: Arc<AnalysisPipeline>,
    cities: Vec<String>,
    interval: Duration,
    initial_fetch_count: usize,
}

impl WeatherPoller {
    pub fn new(
        client: Arc<OpenWeatherMapClient>,
        pipeline: Arc<AnalysisPipeline>,
        config: &IngestConfig,
    ) -> Self {
        Self {
            client,
            pipeline,
            cities: config.cities.clone(),
            interval: config.poll_interval(),
            initial_fetch_count: config.initial_fetch_count,
        }
    }

    pub fn cities(&self) -> &[String] {
        &self.cities
    }

    /// A uniformly random configured city
    pub fn pick_city(&self) -> Option<String> {
        self.cities.choose(&mut rand::thread_rng()).cloned()
    }

    /// Fetch one city and run it through the pipeline
    pub async fn poll_city(&self, city: &str) -> Result<Vec<Alert>, IngestError> {
        let measurement = self.client.fetch_city(city).await?;
        let location_id = measurement.location_id.clone();
        let alerts = self.pipeline.on_measurement(measurement).await?;

        tracing::info!(city, %location_id, alerts = alerts.len(), "Weather data processed");
        Ok(alerts)
    }

    /// One tick: a random city, errors logged and swallowed
    pub async fn poll_once(&self) -> Option<Vec<Alert>> {
        let city = self.pick_city()?;
        match self.poll_city(&city).await {
            Ok(alerts) => Some(alerts),
            Err(e) => {
                let err = Error::from(e);
                tracing::error!(
                    city = %city,
                    category = %err.category(),
                    recoverable = err.is_recoverable(),
                    error = %err,
                    "Error fetching weather data"
                );
                None
            }
        }
    }

    /// Startup burst of `initial_fetch_count` random cities
    pub async fn initial_fetch(&self) -> usize {
        let never = std::future::pending::<()>();
        tokio::pin!(never);
        self.startup_burst(never.as_mut()).await.unwrap_or(0)
    }

    /// `None` when shutdown arrived before the burst finished
    async fn startup_burst<F: Future<Output = ()>>(&self, mut shutdown: Pin<&mut F>) -> Option<usize> {
        let mut processed = 0;
        for _ in 0..self.initial_fetch_count {
            // Checked between cities; a city in progress always completes
            if futures::poll!(shutdown.as_mut()).is_ready() {
                return None;
            }
            if self.poll_once().await.is_some() {
                processed += 1;
            }
        }
        Some(processed)
    }

    /// Poll until `shutdown` resolves
    pub async fn run_until(&self, shutdown: impl Future<Output = ()>) {
        tracing::info!(
            cities = self.cities.len(),
            interval_secs = self.interval.as_secs(),
            "Starting weather poller"
        );

        tokio::pin!(shutdown);

        match self.startup_burst(shutdown.as_mut()).await {
            Some(processed) => tracing::info!(processed, "Initial weather fetch complete"),
            None => {
                tracing::info!("Weather poller stopped during initial fetch");
                return;
            }
        }

        let mut interval = tokio::time::interval(self.interval);
        // The first tick completes immediately; the startup burst covers it
        interval.tick().await;

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = interval.tick() => {
                    self.poll_once().await;
                }
            }
        }

        tracing::info!("Weather poller stopped");
    }
}
