pub mod config;
pub mod error;
pub mod estimator;
pub mod history;
pub mod logger;
pub mod measure;
pub mod resolver;
pub mod server;
pub mod stats;
pub mod transport;

// Re-export commonly used types
pub use error::{CarbonpostError, Result};
