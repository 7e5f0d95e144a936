//! A thin wrapper around a `tokio::runtime::Handle` that ties every spawned
//! task to a shared shutdown signal.
//!
//! Orchestrators never call `tokio::spawn` directly; they go through a
//! `TaskExecutor` so that a single shutdown broadcast (triggered once, on
//! unrecoverable DB loss or SIGTERM) reaches every in-flight state machine,
//! per the cancellation contract in the ingestion engine design.

use exit_future::Exit;
use futures::channel::mpsc;
use futures::future::Future;
use futures::StreamExt;
use slog::{crit, debug, Logger};
use std::sync::Arc;
use tokio::runtime::Handle;

/// Cooperative shutdown signal. Cloning is cheap; every clone observes the
/// same exit.
#[derive(Clone)]
pub struct ShutdownSignal {
    exit: Exit,
}

impl ShutdownSignal {
    /// Resolves once shutdown has been triggered. Callers `select!` against
    /// this alongside their regular work so retries and `after(duration)`
    /// waits are interruptible.
    pub async fn wait(&self) {
        self.exit.clone().await;
    }

    pub fn is_triggered(&self) -> bool {
        self.exit.clone().now_or_never().is_some()
    }
}

use futures::FutureExt;

/// Handed to `main` to fire the shutdown signal exactly once.
pub struct ShutdownHandle {
    _signal: exit_future::Signal,
    sender: mpsc::UnboundedSender<ShutdownReason>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    Requested,
    Failure,
}

impl ShutdownHandle {
    pub fn fire(self, reason: ShutdownReason) {
        let _ = self.sender.unbounded_send(reason);
        // Dropping `_signal` resolves every clone of the paired `Exit`.
    }
}

pub fn shutdown_channel() -> (ShutdownHandle, ShutdownSignal, mpsc::UnboundedReceiver<ShutdownReason>)
{
    let (signal, exit) = exit_future::signal();
    let (sender, receiver) = mpsc::unbounded();
    (ShutdownHandle { _signal: signal, sender }, ShutdownSignal { exit }, receiver)
}

/// Spawns futures on a tokio runtime, logging panics instead of silently
/// dropping them, and carrying the process-wide shutdown signal and logger
/// to anything that needs them.
#[derive(Clone)]
pub struct TaskExecutor {
    handle: Handle,
    exit: ShutdownSignal,
    log: Logger,
}

impl TaskExecutor {
    pub fn new(handle: Handle, exit: ShutdownSignal, log: Logger) -> Self {
        Self { handle, exit, log }
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    pub fn exit(&self) -> ShutdownSignal {
        self.exit.clone()
    }

    pub fn log(&self) -> &Logger {
        &self.log
    }

    /// Spawns a task that keeps running until it completes or shutdown fires,
    /// whichever comes first. This is the primary way orchestrators spawn
    /// child state machines.
    pub fn spawn<F>(&self, task: F, name: &'static str)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let log = self.log.clone();
        let exit = self.exit.clone();
        self.handle.spawn(async move {
            debug!(log, "spawning task"; "name" => name);
            futures::select! {
                () = task.fuse() => {}
                () = exit.wait().fuse() => {
                    debug!(log, "task cancelled by shutdown"; "name" => name);
                }
            }
        });
    }

    /// Spawns a task and reports (but does not propagate) a panic.
    pub fn spawn_handle<F, R>(&self, task: F, name: &'static str) -> tokio::task::JoinHandle<Option<R>>
    where
        F: Future<Output = R> + Send + 'static,
        R: Send + 'static,
    {
        let log = self.log.clone();
        self.handle.spawn(async move {
            match std::panic::AssertUnwindSafe(task).catch_unwind().await {
                Ok(value) => Some(value),
                Err(_) => {
                    crit!(log, "task panicked"; "name" => name);
                    None
                }
            }
        })
    }
}

pub fn test_runtime() -> (Arc<tokio::runtime::Runtime>, TaskExecutor) {
    let rt = Arc::new(tokio::runtime::Runtime::new().expect("runtime"));
    let (handle, exit, _recv) = shutdown_channel();
    std::mem::forget(handle);
    let executor = TaskExecutor::new(rt.handle().clone(), exit, Logger::root(slog::Discard, slog::o!()));
    (rt, executor)
}
