pub mod model;
pub mod store;

pub use model::HistoryEntry;
pub use store::HistoryStore;
