//! Background execution of conversion jobs.
//!
//! A job runs on its own worker thread and reports through a channel. The GUI
//! thread drains the channel on its own turn with [`JobHandle::dispatch`], so
//! callbacks never run on the worker. Events arrive in the order they were
//! produced, and the terminal event is always the last one of a job.

use crate::batch::{run_batch, BatchRequest};
use crate::codec::ImageCodec;
use crate::conversion::{run_single, ConversionRequest};
use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use shared_utils::logging::log_operation_end;
use shared_utils::BatchTally;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use thiserror::Error;

/// Events from the worker thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEvent {
    /// One human-readable log line
    Log(String),
    /// Terminal event of a folder job
    BatchDone(BatchTally),
    /// Terminal event of a single-file job
    SingleDone(bool),
}

impl JobEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobEvent::Log(_))
    }
}

/// Receiver side of a job, implemented by the presentation layer.
pub trait JobCallbacks {
    fn append_log(&mut self, line: String);
    fn on_batch_done(&mut self, tally: BatchTally);
    fn on_single_done(&mut self, success: bool);
}

/// Called by the worker after each event so the GUI wakes up and drains.
pub type Waker = Arc<dyn Fn() + Send + Sync>;

#[cfg(test)]
pub(crate) fn noop_waker() -> Waker {
    Arc::new(|| {})
}

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("failed to spawn conversion worker: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Handle to one running job.
pub struct JobHandle {
    events: Receiver<JobEvent>,
    worker: Option<JoinHandle<()>>,
    finished: bool,
}

impl JobHandle {
    /// Deliver every event that has arrived so far. Returns `true` once the
    /// terminal event has been delivered; later calls deliver nothing.
    pub fn dispatch(&mut self, callbacks: &mut dyn JobCallbacks) -> bool {
        while !self.finished {
            match self.events.try_recv() {
                Ok(event) => self.deliver(event, callbacks),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    tracing::error!("Conversion worker disconnected without a terminal event");
                    self.finished = true;
                }
            }
        }
        self.finished
    }

    /// Block until the terminal event has been delivered.
    pub fn dispatch_blocking(&mut self, callbacks: &mut dyn JobCallbacks) {
        while !self.finished {
            match self.events.recv() {
                Ok(event) => self.deliver(event, callbacks),
                Err(_) => {
                    tracing::error!("Conversion worker disconnected without a terminal event");
                    self.finished = true;
                }
            }
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("Conversion worker thread panicked after finishing");
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn deliver(&mut self, event: JobEvent, callbacks: &mut dyn JobCallbacks) {
        if event.is_terminal() {
            self.finished = true;
        }
        match event {
            JobEvent::Log(line) => callbacks.append_log(line),
            JobEvent::BatchDone(tally) => callbacks.on_batch_done(tally),
            JobEvent::SingleDone(success) => callbacks.on_single_done(success),
        }
    }
}

/// Run a folder conversion on a worker thread.
pub fn start_batch(
    request: BatchRequest,
    codec: Arc<dyn ImageCodec>,
    waker: Waker,
) -> Result<JobHandle, RunnerError> {
    spawn_job(
        "batch",
        waker,
        move |log| JobEvent::BatchDone(run_batch(&request, codec.as_ref(), log)),
        JobEvent::BatchDone(BatchTally::fatal()),
    )
}

/// Run a single-file conversion on a worker thread.
pub fn start_single(
    request: ConversionRequest,
    codec: Arc<dyn ImageCodec>,
    waker: Waker,
) -> Result<JobHandle, RunnerError> {
    spawn_job(
        "single",
        waker,
        move |log| JobEvent::SingleDone(run_single(&request, codec.as_ref(), log)),
        JobEvent::SingleDone(false),
    )
}

/// `job` produces the terminal event; `on_panic` replaces it if `job` panics.
fn spawn_job<F>(kind: &'static str, waker: Waker, job: F, on_panic: JobEvent) -> Result<JobHandle, RunnerError>
where
    F: FnOnce(&mut dyn FnMut(String)) -> JobEvent + Send + 'static,
{
    let (event_tx, event_rx) = unbounded::<JobEvent>();

    let worker = thread::Builder::new()
        .name(format!("heic-jpeg-{}", kind))
        .spawn(move || worker_main(kind, &event_tx, &waker, job, on_panic))?;

    tracing::debug!(job = kind, "Conversion worker started");

    Ok(JobHandle {
        events: event_rx,
        worker: Some(worker),
        finished: false,
    })
}

fn worker_main<F>(kind: &'static str, event_tx: &Sender<JobEvent>, waker: &Waker, job: F, on_panic: JobEvent)
where
    F: FnOnce(&mut dyn FnMut(String)) -> JobEvent,
{
    let started = Instant::now();
    let send = |event: JobEvent| {
        // Receiver gone means the GUI has shut down; nothing left to notify.
        if event_tx.send(event).is_ok() {
            waker();
        }
    };

    let mut log = |line: String| {
        tracing::debug!(job = kind, "{}", line);
        send(JobEvent::Log(line));
    };

    let terminal = match catch_unwind(AssertUnwindSafe(|| job(&mut log))) {
        Ok(event) => event,
        Err(_) => {
            tracing::error!(job = kind, "Conversion worker panicked");
            send(JobEvent::Log(
                "Error: conversion worker stopped unexpectedly.".to_string(),
            ));
            on_panic
        }
    };

    let success = match &terminal {
        JobEvent::BatchDone(tally) => !tally.fatal && !tally.has_errors(),
        JobEvent::SingleDone(ok) => *ok,
        JobEvent::Log(_) => false,
    };
    log_operation_end(kind, started.elapsed(), success);

    send(terminal);
}
