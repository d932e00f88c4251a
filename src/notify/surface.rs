// src/notify/surface.rs
//! Common display logic on top of a [`NotifyDriver`].
//!
//! The [`Surface`] owns the driver, the per-producer handle table and the
//! dismissal listener registry. It implements the display choreography:
//! update-in-place versus fresh creation, the append hint, the timeout, and
//! attaching the dismissal listener *before* showing so no dismissal event
//! can be missed.

use crate::message::{ClientId, CloseReason, CloseState, QueueItem};
use crate::notify::driver::{NotifyDriver, NotifyHandle};
use anyhow::Result;
use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Maps live handles to the close states listening for their dismissal.
///
/// Writers are the surface (attach/detach, under the scheduler's display
/// lock) and the dismissal dispatcher (resolve, from its own thread); the
/// registry's own mutex is the only synchronization between them. Listeners
/// are pulled out of the map before any close state is resolved, so user
/// callbacks never run under this lock.
pub struct DismissRegistry {
    listeners: Mutex<HashMap<NotifyHandle, Vec<Arc<CloseState>>>>,
}

impl DismissRegistry {
    pub fn new() -> Self {
        DismissRegistry {
            listeners: Mutex::new(HashMap::new()),
        }
    }

    pub fn attach(&self, handle: NotifyHandle, state: Arc<CloseState>) {
        let mut listeners = self.listeners.lock().unwrap();
        listeners.entry(handle).or_default().push(state);
    }

    /// Drops the listeners of a discarded handle. The affected messages stay
    /// `Pending` and resolve through their own wait timeout.
    pub fn detach(&self, handle: NotifyHandle) {
        let dropped = self.listeners.lock().unwrap().remove(&handle);
        if let Some(dropped) = dropped {
            debug!("discarded {} with {} pending listener(s)", handle, dropped.len());
        }
    }

    /// Resolves every close state listening on `handle` with `reason`.
    pub fn resolve(&self, handle: NotifyHandle, reason: CloseReason) {
        let states = self
            .listeners
            .lock()
            .unwrap()
            .remove(&handle)
            .unwrap_or_default();
        for state in states {
            state.resolve(reason);
        }
    }
}

impl Default for DismissRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Surface<D: NotifyDriver> {
    driver: D,
    handles: HashMap<ClientId, NotifyHandle>,
    registry: Arc<DismissRegistry>,
}

impl<D: NotifyDriver> Surface<D> {
    pub fn new(driver: D, registry: Arc<DismissRegistry>) -> Self {
        Surface {
            driver,
            handles: HashMap::new(),
            registry,
        }
    }

    /// Puts one item on screen. Returns whether the display service agreed
    /// to show it; driver failures bubble up for the caller to report.
    pub fn display(&mut self, item: &QueueItem) -> Result<bool> {
        let message = &item.message;
        let existing = self.handles.get(&item.client).copied();

        let handle = match existing {
            Some(handle) if message.is_update() => {
                debug!("updating {} in place for {}", handle, item.client);
                self.driver
                    .update(handle, message.subject(), message.body(), message.icon())?;
                handle
            }
            _ => {
                let handle = self
                    .driver
                    .create(message.subject(), message.body(), message.icon())?;
                if message.is_append() {
                    self.driver.set_append_hint(handle)?;
                }
                if let Some(old) = existing {
                    // fresh creation discards the producer's previous handle
                    self.registry.detach(old);
                }
                self.handles.insert(item.client, handle);
                handle
            }
        };

        self.driver.set_timeout(handle, message.timeout())?;
        // listener first, then show: a dismissal racing the show call is
        // queued behind the registration, never lost
        self.registry.attach(handle, message.close_state());
        self.driver.show(handle)
    }
}
