pub mod datastore;
pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod service;

pub use datastore::{Datastore, StoreUpdateBatch};
pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryDatastore;
pub use postgres::PgDatastore;
pub use service::ModelService;
