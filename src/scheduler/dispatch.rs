// src/scheduler/dispatch.rs
//! Dismissal dispatcher - routes display-service events into close states.
//!
//! The display service delivers dismissal callbacks on whatever thread its
//! own event loop runs. Instead of letting that foreign context mutate
//! shared state directly, drivers send a
//! [`DismissEvent`](crate::notify::DismissEvent) and this actor,
//! running in its own background thread, maps the reason code and resolves
//! the listening close states. No scheduler lock is ever held here, so a
//! dismissal callback is free to call back into the scheduler.

use crate::message::CloseReason;
use crate::notify::event::DismissReceiver;
use crate::notify::surface::DismissRegistry;
use anyhow::{Context, Result};
use log::{debug, error};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::RecvTimeoutError;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// How often the dispatcher re-checks the shutdown flag while idle.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct DismissDispatcher {
    thread_handle: Option<JoinHandle<()>>,
}

impl DismissDispatcher {
    /// Spawns the dispatcher thread. It exits when the event channel
    /// disconnects (all driver senders dropped) or `shutdown` is set.
    pub fn spawn(
        events: DismissReceiver,
        registry: Arc<DismissRegistry>,
        shutdown: Arc<AtomicBool>,
    ) -> Result<Self> {
        let thread_handle = thread::Builder::new()
            .name("dismiss-dispatch".to_string())
            .spawn(move || {
                debug!("DismissDispatcher: started");
                loop {
                    match events.recv_timeout(POLL_INTERVAL) {
                        Ok(event) => {
                            let reason = CloseReason::from_code(event.reason_code);
                            debug!(
                                "DismissDispatcher: {} closed with code {} ({:?})",
                                event.handle, event.reason_code, reason
                            );
                            registry.resolve(event.handle, reason);
                        }
                        Err(RecvTimeoutError::Timeout) => {
                            if shutdown.load(Ordering::SeqCst) {
                                break;
                            }
                        }
                        Err(RecvTimeoutError::Disconnected) => {
                            debug!("DismissDispatcher: event channel closed");
                            break;
                        }
                    }
                }
                debug!("DismissDispatcher: exiting");
            })
            .context("failed to spawn dismissal dispatcher thread")?;

        Ok(DismissDispatcher {
            thread_handle: Some(thread_handle),
        })
    }
}

impl Drop for DismissDispatcher {
    fn drop(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            if let Err(e) = handle.join() {
                error!("dismissal dispatcher thread panicked: {:?}", e);
            }
        }
    }
}
