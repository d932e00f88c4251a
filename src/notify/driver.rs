// src/notify/driver.rs
//! Minimal driver interface for a notification display service.
//!
//! Implementations own the actual on-screen resources and mint an opaque
//! [`NotifyHandle`] per visual notification. Dismissal is *not* part of this
//! trait: drivers report it asynchronously by sending a
//! [`DismissEvent`](super::event::DismissEvent) on the channel they were
//! constructed with, from whatever thread their own event loop runs on.

use anyhow::Result;
use std::fmt;
use std::time::Duration;

/// Opaque id of one visual notification, minted by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NotifyHandle(pub u64);

impl fmt::Display for NotifyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "h{}", self.0)
    }
}

pub trait NotifyDriver: Send {
    /// Creates a fresh notification with the given content.
    fn create(&mut self, subject: &str, body: &str, icon: &str) -> Result<NotifyHandle>;

    /// Replaces the content of an existing notification in place.
    fn update(&mut self, handle: NotifyHandle, subject: &str, body: &str, icon: &str)
        -> Result<()>;

    /// Asks the display service to visually concatenate this notification
    /// with a prior, still-visible one from the same producer.
    fn set_append_hint(&mut self, handle: NotifyHandle) -> Result<()>;

    /// Sets the requested on-screen duration.
    fn set_timeout(&mut self, handle: NotifyHandle, timeout: Duration) -> Result<()>;

    /// Puts the notification on screen. `Ok(false)` means the display
    /// service refused to show it; `Err` means the request never reached it.
    fn show(&mut self, handle: NotifyHandle) -> Result<bool>;
}
