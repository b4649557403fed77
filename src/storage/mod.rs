//! Persistence of the `paths` and `progress` records

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::PersistedState;

/// Load/save collaborator for engine state.
///
/// Called only at startup (`load`) and after each mutation (`save`).
#[async_trait]
pub trait Store: Send + Sync {
    /// Saved state, or `None` if nothing has been saved yet
    async fn load(&self) -> Result<Option<PersistedState>>;

    /// Replace the saved state
    async fn save(&self, state: &PersistedState) -> Result<()>;
}
