// src/notify/event.rs
//! Dismissal events, delivered from the driver's event loop.

use crate::notify::driver::NotifyHandle;
use std::sync::mpsc::{self, Receiver, Sender};

/// Notice that a shown notification is no longer visible.
///
/// `reason_code` is the display service's raw code; the scheduler maps it
/// via [`CloseReason::from_code`](crate::message::CloseReason::from_code).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DismissEvent {
    pub handle: NotifyHandle,
    pub reason_code: i32,
}

pub type DismissSender = Sender<DismissEvent>;
pub type DismissReceiver = Receiver<DismissEvent>;

/// The channel a driver reports dismissals on. The sender side goes to the
/// driver at construction; the receiver side goes to the scheduler's
/// dismissal dispatcher.
pub fn dismiss_channel() -> (DismissSender, DismissReceiver) {
    mpsc::channel()
}
