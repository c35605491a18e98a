use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::config::StatsConfig;
use crate::stats::{Point, StatsError};

/// Destination for stats points. Writes never fail the caller.
pub trait PointWriter: Send + Sync {
    fn write_points(&self, points: Vec<Point>);
}

/// Posts points to an InfluxDB `/write` endpoint in line protocol
#[derive(Clone)]
pub struct InfluxWriter {
    client: reqwest::Client,
    write_url: String,
}

impl InfluxWriter {
    pub fn new(base_url: &str, database: &str) -> Result<Self, StatsError> {
        let mut url = url::Url::parse(base_url).map_err(|e| StatsError::InvalidUrl(e.to_string()))?;
        url.set_path("/write");
        url.query_pairs_mut().clear().append_pair("db", database);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self { client, write_url: url.into() })
    }

    pub fn write_url(&self) -> &str {
        &self.write_url
    }

    /// Send points and wait for the response
    pub async fn send(&self, points: &[Point]) -> Result<(), StatsError> {
        if points.is_empty() {
            return Ok(());
        }

        let body = points
            .iter()
            .map(Point::to_line_protocol)
            .collect::<Vec<_>>()
            .join("\n");

        let response = self.client.post(&self.write_url).body(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StatsError::Rejected { status: status.as_u16(), message });
        }

        debug!("Wrote {} stats points", points.len());
        Ok(())
    }
}

impl PointWriter for InfluxWriter {
    fn write_points(&self, points: Vec<Point>) {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!("No runtime available, dropping {} stats points", points.len());
                return;
            }
        };

        let writer = self.clone();
        handle.spawn(async move {
            if let Err(e) = writer.send(&points).await {
                error!("Failed to write stats points: {}", e);
            }
        });
    }
}

/// Logs points when no time-series sink is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct LogWriter;

impl PointWriter for LogWriter {
    fn write_points(&self, points: Vec<Point>) {
        for point in &points {
            info!(target: "stats", "{}", point.to_line_protocol());
        }
    }
}

/// Keeps every written batch in memory
#[derive(Debug, Default)]
pub struct RecordingWriter {
    batches: Mutex<Vec<Vec<Point>>>,
}

impl RecordingWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batches(&self) -> Vec<Vec<Point>> {
        self.batches.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// The most recent batch, like a mock's last call
    pub fn last_batch(&self) -> Option<Vec<Point>> {
        self.batches.lock().unwrap_or_else(|e| e.into_inner()).last().cloned()
    }

    pub fn points(&self) -> Vec<Point> {
        self.batches().into_iter().flatten().collect()
    }

    pub fn clear(&self) {
        self.batches.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl PointWriter for RecordingWriter {
    fn write_points(&self, points: Vec<Point>) {
        self.batches.lock().unwrap_or_else(|e| e.into_inner()).push(points);
    }
}

/// Writer for the configured sink
pub fn writer_from_config(config: &StatsConfig) -> Result<Arc<dyn PointWriter>, StatsError> {
    match (&config.influx_url, config.enabled) {
        (Some(url), true) => {
            let writer = InfluxWriter::new(url, &config.influx_database)?;
            info!("Writing stats to {}", writer.write_url());
            Ok(Arc::new(writer))
        }
        _ => {
            info!("No stats sink configured, logging points");
            Ok(Arc::new(LogWriter))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_write_url_with_database() {
        let writer = InfluxWriter::new("http://localhost:8086", "karrot").unwrap();
        assert_eq!(writer.write_url(), "http://localhost:8086/write?db=karrot");
    }

    #[test]
    fn rejects_invalid_url() {
        assert!(matches!(InfluxWriter::new("not a url", "karrot"), Err(StatsError::InvalidUrl(_))));
    }

    #[test]
    fn recording_writer_keeps_batches() {
        let writer = RecordingWriter::new();
        writer.write_points(vec![Point::new("a").field("x", 1)]);
        writer.write_points(vec![Point::new("b").field("y", 2), Point::new("c").field("z", 3)]);

        assert_eq!(writer.batches().len(), 2);
        assert_eq!(writer.points().len(), 3);
        assert_eq!(writer.last_batch().unwrap()[0].measurement, "b");
    }

    #[test]
    fn disabled_stats_fall_back_to_logging() {
        let config = StatsConfig {
            enabled: false,
            influx_url: Some("http://localhost:8086".to_string()),
            influx_database: "karrot".to_string(),
            group_stats_interval_secs: 60,
        };
        assert!(writer_from_config(&config).is_ok());
    }
}
