use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::broadcast::{self, error::TryRecvError};

use crate::backend::context::{StorageContext, StorageEvent};

/// Reads and decodes `key`, falling back on absence, decode failure,
/// or missing storage. Failures are logged, never returned.
pub fn read<T: DeserializeOwned>(ctx: &StorageContext, key: &str, fallback: T) -> T {
    if !ctx.is_available() {
        return fallback;
    }
    match ctx.get_item(key) {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                log::warn!("error reading storage key {:?}: {}", key, err);
                fallback
            }
        },
        Ok(None) => fallback,
        Err(err) => {
            log::warn!("error reading storage key {:?}: {}", key, err);
            fallback
        }
    }
}

/// Encodes and stores `value` under `key`. Returns whether it was persisted.
pub fn write<T: Serialize>(ctx: &StorageContext, key: &str, value: &T) -> bool {
    let raw = match serde_json::to_string(value) {
        Ok(raw) => raw,
        Err(err) => {
            log::warn!("error encoding storage key {:?}: {}", key, err);
            return false;
        }
    };
    match ctx.set_item(key, &raw) {
        Ok(()) => true,
        Err(err) => {
            log::warn!("error setting storage key {:?}: {}", key, err);
            false
        }
    }
}

/// An in-memory value mirrored to one storage key.
///
/// Every change is written through. Changes made to the same key by other
/// contexts are picked up by [`Persisted::sync`]; the latest write wins.
pub struct Persisted<T> {
    ctx: StorageContext,
    key: String,
    value: T,
    events: Option<broadcast::Receiver<StorageEvent>>,
    saved: bool
}

impl<T: Serialize + DeserializeOwned + Clone> Persisted<T> {
    pub fn open(ctx: &StorageContext, key: &str, fallback: T) -> Persisted<T> {
        // subscribe first so nothing written after the read is missed
        let events = ctx.subscribe();
        let value = read(ctx, key, fallback);
        Persisted { ctx: ctx.clone(), key: key.to_owned(), value, events, saved: true }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    /// Whether the latest change reached storage. A value that was never
    /// changed counts as saved.
    pub fn is_saved(&self) -> bool {
        self.saved
    }

    /// Replaces the value and writes it through. The in-memory value changes
    /// even when the write fails; the return value says whether it landed.
    pub fn set(&mut self, value: T) -> bool {
        self.value = value;
        self.saved = write(&self.ctx, &self.key, &self.value);
        self.saved
    }

    /// Read-modify-write against the current in-memory value.
    pub fn update(&mut self, f: impl FnOnce(&T) -> T) -> bool {
        let next = f(&self.value);
        self.set(next)
    }

    /// Applies `f` to a copy of the current value and keeps the result only
    /// when `f` succeeds. On error nothing changes, in memory or in storage.
    pub fn try_update<R, E>(&mut self, f: impl FnOnce(&mut T) -> Result<R, E>) -> Result<R, E> {
        let mut next = self.value.clone();
        let result = f(&mut next)?;
        self.set(next);
        Ok(result)
    }

    /// Applies pending changes made to this key by other contexts.
    /// Returns whether the in-memory value changed.
    pub fn sync(&mut self) -> bool {
        let mut changed = false;
        loop {
            let received = match self.events.as_mut() {
                Some(events) => events.try_recv(),
                None => return false
            };
            match received {
                Ok(event) => changed |= self.apply(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    log::debug!("storage key {:?} missed {} event(s), re-reading", self.key, skipped);
                    let current = self.value.clone();
                    self.value = read(&self.ctx, &self.key, current);
                    changed = true;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return changed
            }
        }
    }

    fn apply(&mut self, event: StorageEvent) -> bool {
        if event.origin == self.ctx.id() || event.key.as_deref() != Some(self.key.as_str()) {
            return false;
        }
        let Some(raw) = event.new_value else {
            return false;
        };
        match serde_json::from_str(&raw) {
            Ok(value) => {
                self.value = value;
                true
            }
            Err(err) => {
                log::warn!("ignoring undecodable update of storage key {:?}: {}", self.key, err);
                false
            }
        }
    }
}
