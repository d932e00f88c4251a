// src/lib.rs
//! notemux - multiplexes notification requests from many independent
//! producers onto a display surface that shows one notification at a time.
//!
//! Producers submit [`Message`]s to a [`Scheduler`]; the scheduler preserves
//! per-producer ordering, lets later messages amend earlier ones (append or
//! update), and guarantees that callers can learn when a displayed
//! notification disappears - blocking via [`Message::wait_for_closed`] or
//! via [`Message::notify_if_closed`] callbacks.
//!
//! The concrete rendering lives behind the [`notify::NotifyDriver`] trait;
//! registration and transport of producer requests are out of scope and sit
//! in front of [`Scheduler::submit`].

pub mod config;
pub mod message;
pub mod notify;
pub mod queue;
pub mod scheduler;

pub use config::{Config, SchedulerConfig};
pub use message::{ClientId, CloseReason, Message, MsgId, RevisionFlags};
pub use notify::{dismiss_channel, ConsoleDriver, DismissEvent, NotifyDriver, NotifyHandle};
pub use scheduler::Scheduler;
