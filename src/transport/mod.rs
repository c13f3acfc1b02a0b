//! Interchangeable strategies for issuing one HTTP request and measuring
//! its byte footprint.

pub mod client;
pub mod fetch;
pub mod socket;
pub mod types;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::{CarbonpostError, Result};

pub use client::ClientBackend;
pub use fetch::FetchBackend;
pub use socket::SocketBackend;
pub use types::{Method, TransportRequest, TransportResponse};

/// One concrete way of executing an HTTP request.
///
/// Implementations differ only in mechanism; from the orchestrator's point
/// of view they are equivalent. Each must account bytes with the shared
/// rules in [`types`].
#[async_trait]
pub trait TransportBackend: Send + Sync + std::fmt::Debug {
    /// Key this backend is registered and recorded in history under.
    fn label(&self) -> &'static str;

    async fn execute(&self, request: &TransportRequest) -> Result<TransportResponse>;
}

/// Maps string keys to transport backends.
///
/// Lookup happens before any network activity, so a bad key never costs a
/// request.
pub struct BackendRegistry {
    backends: BTreeMap<&'static str, Arc<dyn TransportBackend>>,
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BackendRegistry {
    /// Registry with the three built-in backends.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(ClientBackend::new()));
        registry.register(Arc::new(FetchBackend::new()));
        registry.register(Arc::new(SocketBackend::new()));
        registry
    }

    /// Registry with no backends; tests register stubs into it.
    pub fn empty() -> Self {
        Self {
            backends: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, backend: Arc<dyn TransportBackend>) {
        self.backends.insert(backend.label(), backend);
    }

    pub fn get(&self, key: &str) -> Result<Arc<dyn TransportBackend>> {
        self.backends.get(key).cloned().ok_or_else(|| {
            CarbonpostError::UnsupportedBackend(format!(
                "{}. Use one of: {}",
                key,
                self.labels().join(", ")
            ))
        })
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.backends.keys().copied().collect()
    }
}
