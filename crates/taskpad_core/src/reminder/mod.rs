use crate::error::AppError;
use crate::model::Task;
use crate::notify::Notifier;
use crate::storage::{self, StorageGateway};
use log::{info, warn};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Scheduling knobs, fixed at start. `stagger` spaces out the individual
/// notifications within one pass; `dedup` suppresses repeat reminders for
/// task ids already notified by this scheduler instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderConfig {
    pub interval: Duration,
    pub stagger: Duration,
    pub dedup: bool,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
            stagger: Duration::from_millis(500),
            dedup: true,
        }
    }
}

#[derive(Debug)]
pub struct ReminderOutcome {
    pub notified: Vec<Task>,
    pub failures: Vec<ReminderFailure>,
}

#[derive(Debug)]
pub struct ReminderFailure {
    pub task_id: String,
    pub error: AppError,
}

/// One reminder pass: re-read the persisted collection (not any live store)
/// and notify each incomplete task. Reads a possibly-stale snapshot on
/// purpose; an unreadable snapshot means nothing to remind about.
pub fn run_reminder_pass(
    gateway: &dyn StorageGateway,
    notifier: &dyn Notifier,
    config: &ReminderConfig,
    seen: &mut HashSet<String>,
) -> ReminderOutcome {
    let tasks = storage::load_or_empty(gateway);
    let mut notified = Vec::new();
    let mut failures = Vec::new();

    for task in tasks.into_iter().filter(|task| !task.completed) {
        if config.dedup && seen.contains(&task.id) {
            continue;
        }

        if !(notified.is_empty() && failures.is_empty()) {
            thread::sleep(config.stagger);
        }

        match notifier.notify(&task) {
            Ok(()) => {
                if config.dedup {
                    seen.insert(task.id.clone());
                }
                notified.push(task);
            }
            Err(error) => {
                warn!("reminder for {} failed: {error}", task.id);
                failures.push(ReminderFailure {
                    task_id: task.id.clone(),
                    error,
                });
            }
        }
    }

    ReminderOutcome { notified, failures }
}

/// Periodic reminder loop on its own thread. Reads only; it races harmlessly
/// with task store writes.
pub struct ReminderScheduler {
    stop: Sender<()>,
    worker: Option<JoinHandle<()>>,
}

impl ReminderScheduler {
    pub fn start(
        config: ReminderConfig,
        gateway: Arc<dyn StorageGateway>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        let (stop, stop_receiver) = mpsc::channel();
        let worker = thread::spawn(move || {
            let mut seen = HashSet::new();
            loop {
                match stop_receiver.recv_timeout(config.interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        let outcome =
                            run_reminder_pass(gateway.as_ref(), notifier.as_ref(), &config, &mut seen);
                        if !outcome.notified.is_empty() {
                            info!("scheduled {} reminder(s)", outcome.notified.len());
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        });

        Self {
            stop,
            worker: Some(worker),
        }
    }

    pub fn stop(mut self) {
        let _ = self.stop.send(());
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for ReminderScheduler {
    fn drop(&mut self) {
        let _ = self.stop.send(());
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
