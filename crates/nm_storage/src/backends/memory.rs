use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use nm_core::{Artifacts, PersistedState, Result, StateStore};
use tokio::sync::RwLock;

/// Keeps the last published artifact set in memory. Used by tests and dry runs.
#[derive(Default)]
pub struct MemoryStore {
    current: RwLock<Option<Artifacts>>,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_artifacts(artifacts: Artifacts) -> Self {
        Self {
            current: RwLock::new(Some(artifacts)),
            saves: AtomicUsize::new(0),
        }
    }

    pub async fn current(&self) -> Option<Artifacts> {
        self.current.read().await.clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn load(&self) -> Result<PersistedState> {
        Ok(self
            .current
            .read()
            .await
            .as_ref()
            .map(Artifacts::to_state)
            .unwrap_or_default())
    }

    async fn load_artifacts(&self) -> Result<Option<Artifacts>> {
        Ok(self.current().await)
    }

    async fn save(&self, artifacts: &Artifacts) -> Result<()> {
        artifacts.verify()?;
        *self.current.write().await = Some(artifacts.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
