use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast;

use crate::backend::interface::{BackendError, Result, Storage};

const EVENT_CAPACITY: usize = 64;

static NEXT_CONTEXT: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

/// Change notification delivered to every context sharing a storage area.
/// `new_value` is `None` when the key was removed or the area cleared,
/// in which case `key` is `None` too for a clear.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageEvent {
    pub key: Option<String>,
    pub new_value: Option<String>,
    pub origin: ContextId
}

/// One storage area shared by any number of contexts (tabs, windows, handlers).
#[derive(Clone)]
pub struct SharedStorage {
    storage: Arc<dyn Storage>,
    events: broadcast::Sender<StorageEvent>
}

impl SharedStorage {
    pub fn new(storage: impl Storage + 'static) -> SharedStorage {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        SharedStorage { storage: Arc::new(storage), events }
    }

    pub fn context(&self) -> StorageContext {
        StorageContext {
            id: ContextId(NEXT_CONTEXT.fetch_add(1, Ordering::Relaxed)),
            shared: Some(self.clone())
        }
    }
}

/// A single execution context's view of a storage area.
#[derive(Clone)]
pub struct StorageContext {
    id: ContextId,
    shared: Option<SharedStorage>
}

impl StorageContext {
    /// A context running where no storage exists: reads miss, writes fail.
    pub fn unavailable() -> StorageContext {
        StorageContext {
            id: ContextId(NEXT_CONTEXT.fetch_add(1, Ordering::Relaxed)),
            shared: None
        }
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn is_available(&self) -> bool {
        self.shared.is_some()
    }

    fn shared(&self) -> Result<&SharedStorage> {
        self.shared.as_ref().ok_or(BackendError::Unavailable)
    }

    fn notify(&self, key: Option<&str>, new_value: Option<&str>) {
        if let Some(shared) = &self.shared {
            // no receivers is not an error
            let _ = shared.events.send(StorageEvent {
                key: key.map(str::to_owned),
                new_value: new_value.map(str::to_owned),
                origin: self.id
            });
        }
    }

    pub fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.shared()?.storage.get_item(key)
    }

    pub fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.shared()?.storage.set_item(key, value)?;
        self.notify(Some(key), Some(value));
        Ok(())
    }

    pub fn remove_item(&self, key: &str) -> Result<()> {
        self.shared()?.storage.remove_item(key)?;
        self.notify(Some(key), None);
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        self.shared()?.storage.clear()?;
        self.notify(None, None);
        Ok(())
    }

    pub fn keys(&self) -> Result<Vec<String>> {
        self.shared()?.storage.keys()
    }

    /// Subscribes to changes made through any context of the same area,
    /// this one included. Receivers filter by origin themselves.
    pub fn subscribe(&self) -> Option<broadcast::Receiver<StorageEvent>> {
        self.shared.as_ref().map(|shared| shared.events.subscribe())
    }
}
