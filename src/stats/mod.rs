//! Time-series stats: points built from model events and aggregate counts

pub mod applications;
pub mod conversations;
pub mod point;
pub mod writer;

pub use applications::{collect_group_stats, get_group_application_stats, record_group_stats};
pub use point::{Point, MEASUREMENT_EVENTS, MEASUREMENT_GROUP_APPLICATIONS};
pub use writer::{writer_from_config, InfluxWriter, LogWriter, PointWriter, RecordingWriter};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("Invalid stats URL: {0}")]
    InvalidUrl(String),

    #[error("Stats request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Stats sink rejected points ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error(transparent)]
    Database(#[from] crate::database::DatabaseError),
}
