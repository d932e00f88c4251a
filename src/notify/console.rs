// src/notify/console.rs
//! Console driver - renders notifications as log lines.
//!
//! A debugging stand-in for a real display service binding, in the same
//! spirit as a terminal fallback backend: `show` logs the notification and
//! arms an expiry timer that synthesizes a normal-dismissal event once the
//! timeout lapses. Re-showing a handle (updates) re-arms the timer; a stale
//! timer recognizes that its generation has passed and stays silent.

use crate::notify::driver::{NotifyDriver, NotifyHandle};
use crate::notify::event::{DismissEvent, DismissSender};
use anyhow::{bail, Result};
use log::{debug, info};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Reason code a notification daemon reports for a normal expiry.
const REASON_EXPIRED: i32 = 1;

struct Entry {
    subject: String,
    body: String,
    append: bool,
    timeout: Duration,
    /// Bumped on every show; expiry timers from older shows are stale.
    generation: u64,
}

pub struct ConsoleDriver {
    events: DismissSender,
    next_handle: u64,
    live: Arc<Mutex<HashMap<NotifyHandle, Entry>>>,
}

impl ConsoleDriver {
    pub fn new(events: DismissSender) -> Self {
        ConsoleDriver {
            events,
            next_handle: 1,
            live: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl NotifyDriver for ConsoleDriver {
    fn create(&mut self, subject: &str, body: &str, _icon: &str) -> Result<NotifyHandle> {
        let handle = NotifyHandle(self.next_handle);
        self.next_handle += 1;
        self.live.lock().unwrap().insert(
            handle,
            Entry {
                subject: subject.to_string(),
                body: body.to_string(),
                append: false,
                timeout: Duration::ZERO,
                generation: 0,
            },
        );
        debug!("ConsoleDriver: created {}", handle);
        Ok(handle)
    }

    fn update(&mut self, handle: NotifyHandle, subject: &str, body: &str, _icon: &str) -> Result<()> {
        let mut live = self.live.lock().unwrap();
        let Some(entry) = live.get_mut(&handle) else {
            bail!("unknown notification handle {}", handle);
        };
        entry.subject = subject.to_string();
        entry.body = body.to_string();
        Ok(())
    }

    fn set_append_hint(&mut self, handle: NotifyHandle) -> Result<()> {
        let mut live = self.live.lock().unwrap();
        let Some(entry) = live.get_mut(&handle) else {
            bail!("unknown notification handle {}", handle);
        };
        entry.append = true;
        Ok(())
    }

    fn set_timeout(&mut self, handle: NotifyHandle, timeout: Duration) -> Result<()> {
        let mut live = self.live.lock().unwrap();
        let Some(entry) = live.get_mut(&handle) else {
            bail!("unknown notification handle {}", handle);
        };
        entry.timeout = timeout;
        Ok(())
    }

    fn show(&mut self, handle: NotifyHandle) -> Result<bool> {
        let (timeout, generation) = {
            let mut live = self.live.lock().unwrap();
            let Some(entry) = live.get_mut(&handle) else {
                bail!("unknown notification handle {}", handle);
            };
            entry.generation += 1;
            let marker = if entry.append { " (+)" } else { "" };
            info!("[notify {}]{} {}: {}", handle, marker, entry.subject, entry.body);
            (entry.timeout, entry.generation)
        };

        let events = self.events.clone();
        let live = Arc::clone(&self.live);
        thread::Builder::new()
            .name("console-expiry".to_string())
            .spawn(move || {
                thread::sleep(timeout);
                let mut map = live.lock().unwrap();
                let current = match map.get(&handle) {
                    Some(entry) if entry.generation == generation => true,
                    _ => false,
                };
                if current {
                    map.remove(&handle);
                    drop(map);
                    debug!("ConsoleDriver: {} expired", handle);
                    let _ = events.send(DismissEvent {
                        handle,
                        reason_code: REASON_EXPIRED,
                    });
                }
            })?;
        Ok(true)
    }
}
