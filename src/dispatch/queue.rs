//! Background command queue
//!
//! Bounded mpsc channel drained by a fixed pool of workers. Enqueueing never
//! waits: a full or closed queue is reported to the dispatching caller at once.
//! Workers stop on the shutdown signal, cancelling any command they are running.

use std::sync::Arc;

use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::commands::{Command, InboundEvent};
use crate::dispatch::Dispatcher;
use crate::state::State;
use crate::utils::errors::{ReportBuddyError, Result};

/// A command handed off for background execution
#[derive(Debug, Clone)]
pub struct BackgroundJob {
    pub id: Uuid,
    pub event: InboundEvent,
    pub command: Command,
    /// State the user was in when the command was resolved
    pub expected_state: Option<State>,
}

impl BackgroundJob {
    pub fn new(event: InboundEvent, command: Command, expected_state: Option<State>) -> Self {
        Self {
            id: Uuid::new_v4(),
            event,
            command,
            expected_state,
        }
    }
}

#[derive(Clone)]
pub struct BackgroundQueue {
    sender: mpsc::Sender<BackgroundJob>,
}

pub type JobReceiver = mpsc::Receiver<BackgroundJob>;

impl BackgroundQueue {
    pub fn channel(capacity: usize) -> (Self, JobReceiver) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    pub fn enqueue(&self, job: BackgroundJob) -> Result<()> {
        self.sender.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(job) => {
                warn!(job_id = %job.id, command = job.command.name(), "Background queue full");
                ReportBuddyError::QueueUnavailable("queue is full".to_string())
            }
            mpsc::error::TrySendError::Closed(job) => {
                warn!(job_id = %job.id, command = job.command.name(), "Background queue closed");
                ReportBuddyError::QueueUnavailable("queue is closed".to_string())
            }
        })
    }
}

/// Start `count` workers draining `receiver` until `shutdown` flips to true
pub fn spawn_workers(
    dispatcher: Arc<Dispatcher>,
    receiver: JobReceiver,
    count: usize,
    shutdown: watch::Receiver<bool>,
) -> Vec<JoinHandle<()>> {
    let receiver = Arc::new(Mutex::new(receiver));
    (0..count.max(1))
        .map(|worker| {
            let dispatcher = dispatcher.clone();
            let receiver = receiver.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(run_worker(worker, dispatcher, receiver, shutdown))
        })
        .collect()
}

async fn run_worker(
    worker: usize,
    dispatcher: Arc<Dispatcher>,
    receiver: Arc<Mutex<JobReceiver>>,
    mut shutdown: watch::Receiver<bool>,
) {
    debug!(worker = worker, "Background worker started");

    loop {
        let job = tokio::select! {
            _ = shutdown_requested(&mut shutdown) => break,
            job = async { receiver.lock().await.recv().await } => job,
        };

        let Some(job) = job else {
            info!(worker = worker, "Background queue closed, worker exiting");
            break;
        };

        let job_id = job.id;
        let command = job.command.name();
        tokio::select! {
            _ = shutdown_requested(&mut shutdown) => {
                warn!(
                    worker = worker,
                    job_id = %job_id,
                    command = command,
                    "Background command cancelled by shutdown"
                );
            }
            result = dispatcher.run_background_command(job) => {
                if let Err(e) = result {
                    error!(
                        worker = worker,
                        job_id = %job_id,
                        command = command,
                        error = %e,
                        "Background command failed"
                    );
                }
            }
        }
    }

    debug!(worker = worker, "Background worker stopped");
}

/// Resolves once shutdown is signalled; a dropped sender never signals
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
