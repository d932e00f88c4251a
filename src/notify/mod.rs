// src/notify/mod.rs
//! The boundary to the external notification display service.
//!
//! - [`NotifyDriver`]: the primitives a concrete display service binding
//!   must provide (create, update, hint, timeout, show).
//! - [`Surface`]: the common display choreography on top of a driver - the
//!   per-producer handle table and the dismissal listener registry.
//! - Dismissal events travel over a channel ([`DismissEvent`]), never as
//!   raw cross-thread callbacks into shared state.

pub mod console;
pub mod driver;
pub mod event;
pub mod surface;

#[cfg(test)]
pub mod mock;

pub use console::ConsoleDriver;
pub use driver::{NotifyDriver, NotifyHandle};
pub use event::{dismiss_channel, DismissEvent, DismissReceiver, DismissSender};
pub use surface::{DismissRegistry, Surface};
