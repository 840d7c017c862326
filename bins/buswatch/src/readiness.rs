//! Bridges the observation store into the server's readiness probe.

use async_trait::async_trait;
use observations::ObservationStore;
use server::ReadinessCheck;
use std::sync::Arc;

pub struct StoreReadiness {
    store: Arc<dyn ObservationStore>,
}

impl StoreReadiness {
    pub fn new(store: Arc<dyn ObservationStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ReadinessCheck for StoreReadiness {
    fn name(&self) -> &str {
        "database"
    }

    async fn check(&self) -> Result<(), String> {
        self.store.health_check().await.map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use observations::InMemoryObservationStore;

    #[tokio::test]
    async fn test_in_memory_store_is_ready() {
        let check = StoreReadiness::new(Arc::new(InMemoryObservationStore::new()));
        assert_eq!(check.name(), "database");
        assert!(check.check().await.is_ok());
    }
}
