//! Fixed worker pool feeding messages to `MessageHandler`.
//!
//! Each submitted message is handled by exactly one worker; callers get a
//! `JobHandle` that yields the message's `Outcome`. There is no ordering
//! across workers. A message whose handling panics still gets one reply:
//! the generic failure notice sent by `MessageHandler::recover`.

use crate::model::message::RawMessage;
use crate::service::handler::{MessageHandler, Outcome};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::JoinHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The pool has been shut down.
    Closed,
    /// The worker died before producing an outcome.
    WorkerLost,
    Spawn(String),
}

impl Display for DispatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "dispatcher is closed"),
            Self::WorkerLost => write!(f, "worker stopped before replying"),
            Self::Spawn(details) => write!(f, "failed to spawn worker: {details}"),
        }
    }
}

impl Error for DispatchError {}

struct Job {
    message: RawMessage,
    reply: Sender<Outcome>,
}

/// Pending result of one submitted message.
pub struct JobHandle {
    receiver: Receiver<Outcome>,
}

impl JobHandle {
    /// Blocks until the worker finished this message.
    pub fn wait(self) -> Result<Outcome, DispatchError> {
        self.receiver.recv().map_err(|_| DispatchError::WorkerLost)
    }
}

pub struct Dispatcher {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl Dispatcher {
    /// Spawns `workers` threads (at least one).
    pub fn start(handler: Arc<MessageHandler>, workers: usize) -> Result<Self, DispatchError> {
        let (sender, receiver) = unbounded::<Job>();
        let count = workers.max(1);

        let mut handles = Vec::with_capacity(count);
        for index in 0..count {
            let handler = handler.clone();
            let receiver = receiver.clone();
            let handle = std::thread::Builder::new()
                .name(format!("tally-worker-{index}"))
                .spawn(move || worker_loop(index, &handler, receiver))
                .map_err(|err| DispatchError::Spawn(err.to_string()))?;
            handles.push(handle);
        }
        info!("event=dispatcher_start module=dispatch status=ok workers={count}");

        Ok(Self {
            sender: Some(sender),
            workers: handles,
        })
    }

    /// Queues one message for processing.
    pub fn submit(&self, message: RawMessage) -> Result<JobHandle, DispatchError> {
        let sender = self.sender.as_ref().ok_or(DispatchError::Closed)?;
        let (reply, receiver) = bounded(1);
        sender
            .send(Job { message, reply })
            .map_err(|_| DispatchError::Closed)?;
        Ok(JobHandle { receiver })
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Stops accepting work, drains queued jobs and joins every worker.
    pub fn shutdown(mut self) {
        self.close();
    }

    fn close(&mut self) {
        self.sender.take();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                error!("event=dispatcher_stop module=dispatch status=error reason=worker_panicked");
            }
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.close();
    }
}

fn worker_loop(index: usize, handler: &MessageHandler, receiver: Receiver<Job>) {
    for job in receiver.iter() {
        let outcome = match catch_unwind(AssertUnwindSafe(|| handler.handle(&job.message))) {
            Ok(outcome) => outcome,
            Err(_) => {
                error!("event=worker_job module=dispatch status=error worker={index} reason=panic");
                match catch_unwind(AssertUnwindSafe(|| handler.recover(&job.message))) {
                    Ok(outcome) => outcome,
                    Err(_) => continue,
                }
            }
        };
        // The submitter may have dropped its handle; the reply was sent anyway.
        let _ = job.reply.send(outcome);
    }
    info!("event=worker_stop module=dispatch status=ok worker={index}");
}
