pub mod orchestrator;
pub mod types;

pub use orchestrator::{DEFAULT_ATTEMPT_TIMEOUT, Orchestrator};
pub use types::{MeasurementRequest, MeasurementResult, ResponseSnapshot};
