//! # Background Execution
//!
//! Two ways to run work detached from the submitting request. In both, `submit` returns
//! as soon as the task is accepted, and neither the task's outcome nor its latency
//! reaches the caller.
//!
//! - [`BackgroundExecutor`]: a named queue drained by a fixed set of workers. Tasks run
//!   in submission order when there is one worker.
//! - [`TaskGroup`]: every task gets its own Tokio task right away. Nothing queues, so a
//!   slow task never delays the next one.
//!
//! ## Shutdown
//!
//! [`BackgroundExecutor::shutdown`] and [`TaskGroup::shutdown`] run in three steps:
//!
//! 1. **Stop accepting** – later `submit`s fail with [`TaskError::ShutDown`].
//! 2. **Drain** – accepted work keeps running, for at most the drain timeout.
//! 3. **Release** – whatever is still running after the timeout is aborted.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use crate::error::TaskError;

/// A unit of background work.
pub type Job = Pin<Box<dyn Future<Output = Result<(), TaskError>> + Send + 'static>>;

pub struct BackgroundExecutor {
    name: Arc<str>,
    sender: Mutex<Option<mpsc::Sender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    completed: Arc<AtomicUsize>,
}

impl BackgroundExecutor {
    /// Spawns `workers` worker tasks sharing a queue of `capacity` jobs.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(name: impl Into<String>, workers: usize, capacity: usize) -> Self {
        let name: Arc<str> = Arc::from(name.into());
        let (sender, receiver) = mpsc::channel::<Job>(capacity.max(1));
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));
        let completed = Arc::new(AtomicUsize::new(0));

        let handles = (0..workers.max(1))
            .map(|worker| {
                tokio::spawn(work(
                    name.clone(),
                    worker,
                    receiver.clone(),
                    completed.clone(),
                ))
            })
            .collect();
        info!(executor = %name, workers = workers.max(1), capacity, "Executor started");

        Self {
            name,
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(handles),
            completed,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_shutdown(&self) -> bool {
        lock(&self.sender).is_none()
    }

    /// Tasks that ran to completion successfully.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Queue `task` without waiting for it to start.
    pub fn submit<F>(&self, task: F) -> Result<(), TaskError>
    where
        F: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        let guard = lock(&self.sender);
        let Some(sender) = guard.as_ref() else {
            return Err(TaskError::ShutDown(self.name.to_string()));
        };
        sender.try_send(Box::pin(task)).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => TaskError::QueueFull(self.name.to_string()),
            mpsc::error::TrySendError::Closed(_) => TaskError::ShutDown(self.name.to_string()),
        })
    }

    /// Stop accepting work, let queued work drain for up to `drain`, then abort the rest.
    ///
    /// Calling this more than once is harmless.
    pub async fn shutdown(&self, drain: Duration) {
        let closed = lock(&self.sender).take().is_some();
        let workers: Vec<_> = lock(&self.workers).drain(..).collect();
        if !closed && workers.is_empty() {
            return;
        }
        info!(executor = %self.name, drain_ms = drain.as_millis() as u64, "Shutting down executor");

        let aborts: Vec<_> = workers.iter().map(JoinHandle::abort_handle).collect();
        let drained = tokio::time::timeout(drain, async {
            for worker in workers {
                if let Err(e) = worker.await {
                    warn!(executor = %self.name, error = %e, "Worker ended abnormally");
                }
            }
        })
        .await;

        if drained.is_err() {
            warn!(executor = %self.name, "Drain timed out, aborting in-flight work");
            for abort in aborts {
                abort.abort();
            }
        }
        info!(executor = %self.name, "Executor shutdown complete");
    }
}

async fn work(
    name: Arc<str>,
    worker: usize,
    receiver: Arc<tokio::sync::Mutex<mpsc::Receiver<Job>>>,
    completed: Arc<AtomicUsize>,
) {
    loop {
        let job = receiver.lock().await.recv().await;
        let Some(job) = job else { break };
        debug!(executor = %name, worker, "Running job");
        match job.await {
            Ok(()) => {
                completed.fetch_add(1, Ordering::SeqCst);
            }
            Err(e) => warn!(executor = %name, worker, error = %e, "Background task failed"),
        }
    }
    debug!(executor = %name, worker, "Worker stopped");
}

/// Runs every submitted task on its own Tokio task.
///
/// Finished tasks are reaped on the next `submit`, so the set only holds work that
/// may still be running.
pub struct TaskGroup {
    name: Arc<str>,
    tasks: Mutex<Option<JoinSet<()>>>,
    completed: Arc<AtomicUsize>,
}

impl TaskGroup {
    pub fn new(name: impl Into<String>) -> Self {
        let name: Arc<str> = Arc::from(name.into());
        info!(executor = %name, "Task group started");
        Self {
            name,
            tasks: Mutex::new(Some(JoinSet::new())),
            completed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_shutdown(&self) -> bool {
        lock(&self.tasks).is_none()
    }

    /// Tasks that ran to completion successfully.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Start `task` now. Must be called from within a Tokio runtime.
    pub fn submit<F>(&self, task: F) -> Result<(), TaskError>
    where
        F: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        let mut guard = lock(&self.tasks);
        let Some(tasks) = guard.as_mut() else {
            return Err(TaskError::ShutDown(self.name.to_string()));
        };
        while tasks.try_join_next().is_some() {}

        let name = self.name.clone();
        let completed = self.completed.clone();
        tasks.spawn(async move {
            match task.await {
                Ok(()) => {
                    completed.fetch_add(1, Ordering::SeqCst);
                }
                Err(e) => warn!(executor = %name, error = %e, "Background task failed"),
            }
        });
        Ok(())
    }

    /// Stop accepting tasks, wait up to `drain` for running ones, then abort the rest.
    ///
    /// Calling this more than once is harmless.
    pub async fn shutdown(&self, drain: Duration) {
        let Some(mut tasks) = lock(&self.tasks).take() else {
            return;
        };
        info!(executor = %self.name, running = tasks.len(), drain_ms = drain.as_millis() as u64, "Shutting down task group");

        let drained = tokio::time::timeout(drain, async {
            while let Some(result) = tasks.join_next().await {
                if let Err(e) = result {
                    warn!(executor = %self.name, error = %e, "Task ended abnormally");
                }
            }
        })
        .await;

        if drained.is_err() {
            warn!(executor = %self.name, remaining = tasks.len(), "Drain timed out, aborting in-flight work");
            tasks.abort_all();
        }
        info!(executor = %self.name, "Task group shutdown complete");
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
