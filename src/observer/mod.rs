// Model signals: the model service fires them around every write and
// registered observers react with secondary writes, jobs and stats

pub mod context;
pub mod error;
pub mod implementations;
pub mod pipeline;
pub mod traits;

pub use context::*;
pub use error::*;
pub use pipeline::*;
pub use traits::*;
