// src/main.rs
//! notemuxd - the scheduler behind a console driver, driven from stdin.
//!
//! A debugging harness, not a transport: each input line is one JSON
//! submission, displayed through the [`ConsoleDriver`]. The registration
//! layer that would normally resolve producers to client ids and amendment
//! targets is out of scope, so the harness takes both verbatim.
//!
//! ```text
//! {"client":1,"subject":"Mail","body":"3 new messages","timeout_ms":4000}
//! {"client":1,"subject":"Mail","body":"1 more","append":true,"reference":17}
//! ```
//!
//! Accepted message ids are logged so follow-up lines can reference them.
//! EOF stops the scheduler after the queue drains.

use anyhow::{Context, Result};
use log::{info, warn};
use serde::Deserialize;
use std::io::{self, BufRead};
use std::path::Path;

use notemux::config::{Config, CONFIG};
use notemux::message::{ClientId, Message, MsgId, RevisionFlags};
use notemux::notify::{dismiss_channel, ConsoleDriver};
use notemux::scheduler::Scheduler;

#[derive(Debug, Deserialize)]
struct Submission {
    client: u64,
    subject: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    icon: String,
    #[serde(default)]
    timeout_ms: Option<u64>,
    #[serde(default)]
    append: bool,
    #[serde(default)]
    update: bool,
    #[serde(default)]
    reference: Option<u64>,
}

impl Submission {
    fn into_message(self, default_timeout_ms: u64) -> (ClientId, Message) {
        let mut flags = RevisionFlags::empty();
        if self.append {
            flags |= RevisionFlags::APPEND;
        }
        if self.update {
            flags |= RevisionFlags::UPDATE;
        }
        let message = Message::new(self.subject)
            .with_body(self.body)
            .with_icon(self.icon)
            .with_timeout_ms(self.timeout_ms.unwrap_or(default_timeout_ms))
            .with_revision(flags, self.reference.map(MsgId));
        (ClientId(self.client), message)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    let config = match std::env::var_os("NOTEMUX_CONFIG") {
        Some(path) => {
            let path = Path::new(&path);
            info!("loading configuration from {}", path.display());
            Config::load(path)?
        }
        None => CONFIG.clone(),
    };

    info!("starting notemuxd");
    let (events_tx, events_rx) = dismiss_channel();
    let driver = ConsoleDriver::new(events_tx);
    let scheduler = Scheduler::spawn(driver, events_rx, &config.scheduler)
        .context("failed to start scheduler")?;

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("failed to read from stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        let submission: Submission = match serde_json::from_str(&line) {
            Ok(submission) => submission,
            Err(e) => {
                warn!("ignoring malformed submission: {}", e);
                continue;
            }
        };
        let (client, message) = submission.into_message(config.scheduler.default_timeout_ms);
        let id = message.id();
        match scheduler.submit(client, message) {
            Ok(()) => info!("accepted {} from {}", id, client),
            Err(e) => warn!("rejected submission: {:#}", e),
        }
    }

    info!("stdin closed, draining queue and stopping");
    scheduler.stop();
    drop(scheduler);
    info!("notemuxd exited");
    Ok(())
}
