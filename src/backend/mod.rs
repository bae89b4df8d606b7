mod interface;
mod memory_store;
mod json_store;
mod context;
pub mod persisted;

pub use interface::{Storage, Result, BackendError};
pub use memory_store::MemoryStore;
pub use json_store::JsonStore;
pub use context::{ContextId, SharedStorage, StorageContext, StorageEvent};
pub use persisted::Persisted;
