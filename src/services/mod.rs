pub mod applications;
pub mod stores;

pub use applications::{ApplicationDecision, ApplicationError, ApplicationService};
pub use stores::{plan_pickup_overrides, StoreError, StoreInput, StoreService};
