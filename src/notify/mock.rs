// src/notify/mock.rs
//! Recording driver for tests.

use crate::notify::driver::{NotifyDriver, NotifyHandle};
use anyhow::Result;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverOp {
    Create {
        handle: NotifyHandle,
        subject: String,
        body: String,
        icon: String,
    },
    Update {
        handle: NotifyHandle,
        subject: String,
    },
    AppendHint(NotifyHandle),
    SetTimeout(NotifyHandle, Duration),
    Show(NotifyHandle),
}

#[derive(Default)]
pub struct MockState {
    ops: Mutex<Vec<DriverOp>>,
    refuse_shows: AtomicBool,
}

impl MockState {
    pub fn ops(&self) -> Vec<DriverOp> {
        self.ops.lock().unwrap().clone()
    }

    pub fn refuse_shows(&self, refuse: bool) {
        self.refuse_shows.store(refuse, Ordering::SeqCst);
    }

    /// The subjects shown so far, in display order.
    pub fn shown_subjects(&self) -> Vec<String> {
        let ops = self.ops.lock().unwrap();
        let mut latest: HashMap<NotifyHandle, String> = HashMap::new();
        let mut subjects = Vec::new();
        for op in ops.iter() {
            match op {
                DriverOp::Create { handle, subject, .. }
                | DriverOp::Update { handle, subject } => {
                    latest.insert(*handle, subject.clone());
                }
                DriverOp::Show(handle) => {
                    if let Some(subject) = latest.get(handle) {
                        subjects.push(subject.clone());
                    }
                }
                _ => {}
            }
        }
        subjects
    }

    pub fn show_count(&self) -> usize {
        self.ops
            .lock()
            .unwrap()
            .iter()
            .filter(|op| matches!(op, DriverOp::Show(_)))
            .count()
    }

    fn record(&self, op: DriverOp) {
        self.ops.lock().unwrap().push(op);
    }
}

pub struct MockDriver {
    state: Arc<MockState>,
    next_handle: u64,
}

impl MockDriver {
    pub fn new() -> (Self, Arc<MockState>) {
        let state = Arc::new(MockState::default());
        (
            MockDriver {
                state: Arc::clone(&state),
                next_handle: 1,
            },
            state,
        )
    }
}

impl NotifyDriver for MockDriver {
    fn create(&mut self, subject: &str, body: &str, icon: &str) -> Result<NotifyHandle> {
        let handle = NotifyHandle(self.next_handle);
        self.next_handle += 1;
        self.state.record(DriverOp::Create {
            handle,
            subject: subject.to_string(),
            body: body.to_string(),
            icon: icon.to_string(),
        });
        Ok(handle)
    }

    fn update(&mut self, handle: NotifyHandle, subject: &str, _body: &str, _icon: &str) -> Result<()> {
        self.state.record(DriverOp::Update {
            handle,
            subject: subject.to_string(),
        });
        Ok(())
    }

    fn set_append_hint(&mut self, handle: NotifyHandle) -> Result<()> {
        self.state.record(DriverOp::AppendHint(handle));
        Ok(())
    }

    fn set_timeout(&mut self, handle: NotifyHandle, timeout: Duration) -> Result<()> {
        self.state.record(DriverOp::SetTimeout(handle, timeout));
        Ok(())
    }

    fn show(&mut self, handle: NotifyHandle) -> Result<bool> {
        self.state.record(DriverOp::Show(handle));
        Ok(!self.state.refuse_shows.load(Ordering::SeqCst))
    }
}
