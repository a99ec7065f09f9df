use crate::storage::{StorageGateway, TASKS_KEY};
use log::error;
use std::sync::Arc;
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

enum Job {
    Persist(String),
    Flush(Sender<()>),
}

/// Single writer thread fed by a channel. Snapshots are written in the order
/// they were enqueued, so the last mutation always wins durably.
pub struct WriteQueue {
    sender: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
}

impl WriteQueue {
    pub fn start(gateway: Arc<dyn StorageGateway>) -> Self {
        let (sender, receiver) = mpsc::channel::<Job>();
        let worker = thread::spawn(move || {
            for job in receiver {
                match job {
                    Job::Persist(payload) => {
                        if let Err(err) = gateway.write_blob(TASKS_KEY, &payload) {
                            error!("task persistence failed: {err}");
                        }
                    }
                    Job::Flush(ack) => {
                        let _ = ack.send(());
                    }
                }
            }
        });

        Self {
            sender: Some(sender),
            worker: Some(worker),
        }
    }

    pub fn enqueue(&self, payload: String) {
        if let Some(sender) = self.sender.as_ref() {
            let _ = sender.send(Job::Persist(payload));
        }
    }

    /// Blocks until every previously enqueued snapshot has been written.
    pub fn flush(&self) {
        let Some(sender) = self.sender.as_ref() else {
            return;
        };

        let (ack_sender, ack_receiver) = mpsc::channel();
        if sender.send(Job::Flush(ack_sender)).is_ok() {
            let _ = ack_receiver.recv();
        }
    }
}

impl Drop for WriteQueue {
    fn drop(&mut self) {
        drop(self.sender.take());
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
