pub mod utils;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::token_for_user;
use crate::config::{config, StatsConfig};
use crate::database::DatabaseManager;
use crate::server;
use crate::stats::{collect_group_stats, InfluxWriter};

use utils::output_success;

#[derive(Parser)]
#[command(name = "foodsaving-cli")]
#[command(about = "Foodsaving backend - server and maintenance commands")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP API")]
    Serve {
        #[arg(long, help = "Port to listen on (defaults to PORT / config)")]
        port: Option<u16>,
    },

    #[command(about = "Apply the database schema to DATABASE_URL")]
    InitDb,

    #[command(about = "Write group application stats once")]
    RecordStats,

    #[command(about = "Issue a development JWT for a user")]
    Token {
        #[arg(help = "User id")]
        user: i64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Serve { port } => server::serve(port).await,
        Commands::InitDb => init_db(&output_format).await,
        Commands::RecordStats => record_stats(&output_format).await,
        Commands::Token { user } => {
            let token = token_for_user(user).context("issuing token")?;
            match output_format {
                OutputFormat::Text => println!("{}", token),
                OutputFormat::Json => output_success(&output_format, "Token issued", Some(json!({"token": token})))?,
            }
            Ok(())
        }
    }
}

async fn init_db(output_format: &OutputFormat) -> anyhow::Result<()> {
    let pool = DatabaseManager::pool().await.context("connecting to Postgres")?;
    DatabaseManager::init_schema(&pool).await?;
    DatabaseManager::close().await;
    output_success(output_format, "Database schema applied", None)
}

/// Influx URL to post to; `None` prints points instead
fn influx_target(stats: &StatsConfig) -> Option<&str> {
    stats.influx_url.as_deref().filter(|_| stats.enabled)
}

async fn record_stats(output_format: &OutputFormat) -> anyhow::Result<()> {
    let config = config();
    let datastore = server::datastore_from_config(config).await?;
    let points = collect_group_stats(datastore.as_ref()).await?;

    match influx_target(&config.stats) {
        Some(url) => {
            // Wait for the write; a background write would not outlive the process
            let writer = InfluxWriter::new(url, &config.stats.influx_database)?;
            writer.send(&points).await?;
        }
        None => {
            for point in &points {
                println!("{}", point.to_line_protocol());
            }
        }
    }

    output_success(
        output_format,
        &format!("Recorded application stats for {} groups", points.len()),
        Some(json!({"points": points.len()})),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_stats_are_never_posted() {
        let mut stats = StatsConfig {
            enabled: false,
            influx_url: Some("http://localhost:8086".to_string()),
            influx_database: "karrot".to_string(),
            group_stats_interval_secs: 3600,
        };
        assert_eq!(influx_target(&stats), None);

        stats.enabled = true;
        assert_eq!(influx_target(&stats), Some("http://localhost:8086"));

        stats.influx_url = None;
        assert_eq!(influx_target(&stats), None);
    }
}
