use std::path::Path;
use std::sync::Arc;

use nm_core::{Error, Result, StateStore};

pub mod backends;

pub use backends::*;

/// Opens a state store by kind: `json` (artifact directory) or `memory`.
pub fn create_store(kind: &str, root: &Path) -> Result<Arc<dyn StateStore>> {
    match kind.trim().to_lowercase().as_str() {
        "json" => Ok(Arc::new(JsonDirStore::new(root))),
        "memory" => Ok(Arc::new(MemoryStore::new())),
        other => Err(Error::Config(format!(
            "Unknown store: {}. Available: json, memory",
            other
        ))),
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::create_store;
    pub use nm_core::{Artifacts, PersistedState, StateStore};
}
