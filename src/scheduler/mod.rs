// src/scheduler/mod.rs
//! The scheduling core: one worker thread multiplexing all producers onto a
//! display surface that shows a single notification at a time.
//!
//! Producers hand a [`Message`] to [`Scheduler::submit`]. A message that
//! revises what is currently on screen is displayed immediately (fast path,
//! bypassing the queue); everything else is enqueued. The worker drains the
//! queue in FIFO order, groups each dequeued item with every queued item
//! that transitively revises it, displays the group as one paced sequence,
//! and then waits out the display interval before touching the next item.
//!
//! `current`, `wait_until` and the surface live under one mutex: displaying
//! and pacing are coupled, and both the fast path and the worker loop go
//! through the same [`DisplayState`], which is what makes "at most one item
//! on screen" hold system-wide. All of this state is owned by one
//! `Scheduler` instance - nothing is process-global, so independent
//! schedulers can coexist.

pub mod closure;
pub mod dispatch;


use crate::config::SchedulerConfig;
use crate::message::{ClientId, ItemId, Message, QueueItem};
use crate::notify::driver::NotifyDriver;
use crate::notify::event::DismissReceiver;
use crate::notify::surface::{DismissRegistry, Surface};
use crate::queue::Queue;
use anyhow::{bail, Context, Result};
use dispatch::DismissDispatcher;
use log::{debug, error, info, trace, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// What travels through the queue: a notification, or the stop sentinel.
///
/// Stop is a queue item rather than an interrupt so that it is ordered
/// relative to already-queued work: the worker drains everything submitted
/// before the stop request, then exits.
#[derive(Debug)]
pub enum WorkItem {
    Notify(QueueItem),
    Stop,
}

/// Resolved pacing intervals, from [`SchedulerConfig`].
#[derive(Debug, Clone)]
struct Timing {
    settle_delay: Duration,
    wait_epsilon: Duration,
}

/// The single-writer-at-a-time shared state: what is on screen and until
/// when it stays there.
struct DisplayState<D: NotifyDriver> {
    surface: Surface<D>,
    current: Option<ItemId>,
    wait_until: Option<Instant>,
}

pub struct Scheduler<D: NotifyDriver + 'static> {
    timing: Timing,
    stopping: AtomicBool,
    shutdown: Arc<AtomicBool>,
    queue: Arc<Queue<WorkItem>>,
    display: Arc<Mutex<DisplayState<D>>>,
    worker: Option<JoinHandle<()>>,
    // declared last: joins after `display` (and with it the driver's event
    // sender) has been dropped
    dispatcher: Option<DismissDispatcher>,
}

impl<D: NotifyDriver + 'static> Scheduler<D> {
    /// Spawns the worker and dismissal dispatcher threads around `driver`.
    /// `events` is the receiver half of the channel the driver reports
    /// dismissals on.
    pub fn spawn(driver: D, events: DismissReceiver, config: &SchedulerConfig) -> Result<Self> {
        let timing = Timing {
            settle_delay: Duration::from_millis(config.settle_delay_ms),
            wait_epsilon: Duration::from_millis(config.wait_epsilon_ms),
        };
        let registry = Arc::new(DismissRegistry::new());
        let queue = Arc::new(Queue::new());
        let display = Arc::new(Mutex::new(DisplayState {
            surface: Surface::new(driver, Arc::clone(&registry)),
            current: None,
            wait_until: None,
        }));
        let shutdown = Arc::new(AtomicBool::new(false));

        let dispatcher = DismissDispatcher::spawn(events, registry, Arc::clone(&shutdown))?;

        let worker_queue = Arc::clone(&queue);
        let worker_display = Arc::clone(&display);
        let worker_timing = timing.clone();
        let worker = thread::Builder::new()
            .name("notemux-worker".to_string())
            .spawn(move || worker_main(worker_queue, worker_display, worker_timing))
            .context("failed to spawn scheduler worker thread")?;

        info!("scheduler started");
        Ok(Scheduler {
            timing,
            stopping: AtomicBool::new(false),
            shutdown,
            queue,
            display,
            worker: Some(worker),
            dispatcher: Some(dispatcher),
        })
    }

    /// Accepts a message from a producer: displays it immediately if it
    /// revises the item currently on screen, otherwise enqueues it.
    pub fn submit(&self, client: ClientId, message: Message) -> Result<()> {
        if self.stopping.load(Ordering::SeqCst) {
            bail!("scheduler is stopping, rejecting message {}", message.id());
        }
        let item = QueueItem { client, message };

        {
            let mut state = self.display.lock().unwrap();
            if let Some(current) = state.current {
                if item.revises(current) {
                    debug!(
                        "fast path: {} revises current {}, displaying immediately",
                        item.item_id(),
                        current
                    );
                    show_item(&mut state, &item, &self.timing);
                    return Ok(());
                }
            }
        }

        trace!("enqueueing {}", item.item_id());
        self.queue.push(WorkItem::Notify(item));
        Ok(())
    }

    /// Requests shutdown: everything already queued is still displayed, then
    /// the worker exits. Idempotent; does not abort an in-progress display.
    pub fn stop(&self) {
        if !self.stopping.swap(true, Ordering::SeqCst) {
            info!("stop requested, queueing stop sentinel");
            self.queue.push(WorkItem::Stop);
        }
    }
}

impl<D: NotifyDriver + 'static> Drop for Scheduler<D> {
    fn drop(&mut self) {
        self.stop();
        if let Some(handle) = self.worker.take() {
            if let Err(e) = handle.join() {
                error!("scheduler worker thread panicked: {:?}", e);
            }
        }
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

/// Displays one item and advances the pacing deadline. Failures are
/// reported, never fatal: the deadline advances regardless, so a burst of
/// failing messages cannot hammer the display service.
fn show_item<D: NotifyDriver>(state: &mut DisplayState<D>, item: &QueueItem, timing: &Timing) {
    match state.surface.display(item) {
        Ok(true) => debug!("displayed {}", item.item_id()),
        Ok(false) => error!("display service refused to show {}", item.item_id()),
        Err(e) => error!("failed to display {}: {:#}", item.item_id(), e),
    }
    state.current = Some(item.item_id());
    state.wait_until = Some(Instant::now() + item.message.timeout() + timing.wait_epsilon);
}

fn worker_main<D: NotifyDriver>(
    queue: Arc<Queue<WorkItem>>,
    display: Arc<Mutex<DisplayState<D>>>,
    timing: Timing,
) {
    debug!("scheduler worker: started");
    loop {
        let item = match queue.pop_blocking() {
            WorkItem::Stop => break,
            WorkItem::Notify(item) => item,
        };
        let seed = item.item_id();

        {
            let mut state = display.lock().unwrap();
            show_item(&mut state, &item, &timing);
        }

        // everything already queued that amends the seed joins the same
        // on-screen sequence, paced so the surface renders smoothly
        for revision in closure::collect_revisions(&queue, seed) {
            thread::sleep(timing.settle_delay);
            let mut state = display.lock().unwrap();
            show_item(&mut state, &revision, &timing);
        }

        // wait out the display interval; fast-path displays can push the
        // deadline further while we sleep, so the check and the clear happen
        // under the same lock
        loop {
            let mut state = display.lock().unwrap();
            match state.wait_until {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        state.current = None;
                        state.wait_until = None;
                        break;
                    }
                    let remaining = deadline - now;
                    drop(state);
                    thread::sleep(remaining);
                }
                None => break,
            }
        }
    }
    let leftover = queue.len();
    if leftover > 0 {
        // a submit racing the stop request can land behind the sentinel
        warn!("scheduler worker: dropping {} message(s) submitted after stop", leftover);
    }
    debug!("scheduler worker: queue drained, exiting");
}
