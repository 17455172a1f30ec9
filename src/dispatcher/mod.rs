// vcal: Version Control Abstraction Layer
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Moves blocking backend calls onto worker threads and drives the
//! authentication retry loop.
//!
//! ```text
//! owner thread                         worker threads (vcal-worker-N)
//! ------------                         ------------------------------
//! invoke(op, ok, err) ──► queue ──────► cancelled?  ──► Dropped
//!                                       op()        ──► Finished(result)
//!                                       panic       ──► Finished(error)
//!                                       AuthError   ──► AuthRequired
//!                                                         │
//! process_pending() ◄──────── inbox ◄─────────────────────┘
//!   Finished      deliver ok/err once
//!   AuthRequired  prompt ─► set_credentials ─► queue again
//!                 cancelled / retries spent ─► AuthenticationFailed
//! ```
//!
//! Callbacks and the credential prompt run on the owner thread, inside
//! [`Dispatcher::process_pending`], [`Dispatcher::wait_next`] or
//! [`Dispatcher::run_until_idle`].

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use bon::Builder;
use flume::{Receiver, RecvTimeoutError, Sender};
use tracing::{debug, info, warn};

use crate::credentials::{CredentialKey, Credentials};
use crate::error::{AuthError, DispatchError, VcsError, VcsResult};

pub const DEFAULT_WORKERS: usize = 10;
pub const DEFAULT_MAX_AUTH_RETRIES: usize = 3;

/// What the user is asked for when an operation needs credentials.
#[derive(Debug, Clone)]
pub struct CredentialRequest {
    pub message: String,
    pub raw: Option<String>,
    /// Keys to ask for, in declaration order.
    pub required: Vec<CredentialKey>,
    /// Known values, used to pre-fill the prompt.
    pub credentials: Credentials,
}

impl CredentialRequest {
    /// Builds a request from the error snapshot, filling gaps from the
    /// backend's current credentials.
    #[must_use]
    pub fn from_error(error: &AuthError) -> Self {
        let mut credentials = error.credentials.clone();
        if let Some(handle) = error.handle() {
            credentials.merge_missing(&handle.current());
        }
        Self {
            message: error.message.clone(),
            raw: error.raw.clone(),
            required: error.required.clone(),
            credentials,
        }
    }
}

/// Asks the user for credentials.
pub trait CredentialPrompt {
    /// Returns the entered credentials, or `None` when cancelled.
    fn prompt(&self, request: &CredentialRequest) -> Option<Credentials>;
}

/// Prompt that always cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPrompt;

impl CredentialPrompt for NoPrompt {
    fn prompt(&self, _request: &CredentialRequest) -> Option<Credentials> {
        None
    }
}

/// Worker pool sizing and retry policy.
#[derive(Debug, Clone, Copy, Builder)]
pub struct DispatcherSettings {
    #[builder(default = DEFAULT_WORKERS)]
    workers: usize,
    #[builder(default = DEFAULT_MAX_AUTH_RETRIES)]
    max_auth_retries: usize,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl DispatcherSettings {
    #[must_use]
    pub const fn workers(&self) -> usize {
        self.workers
    }

    #[must_use]
    pub const fn max_auth_retries(&self) -> usize {
        self.max_auth_retries
    }
}

#[derive(Debug, Default)]
struct InvocationState {
    cancelled: AtomicBool,
    finished: AtomicBool,
}

/// Handle to a scheduled operation.
#[derive(Debug, Clone)]
pub struct Invocation {
    state: Arc<InvocationState>,
}

impl Invocation {
    /// Suppresses delivery. A running subprocess is left to finish.
    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }

    /// Whether the invocation has been resolved, delivered or dropped.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state.finished.load(Ordering::SeqCst)
    }
}

/// A type-erased invocation travelling between owner and workers.
trait Job: Send {
    fn state(&self) -> &Arc<InvocationState>;

    /// Runs the operation; an authentication failure is handed back instead
    /// of being stored.
    fn run(&mut self) -> Option<Box<AuthError>>;

    /// Stores `error` as the result.
    fn store_error(&mut self, error: VcsError);

    fn attempts(&self) -> usize;

    fn record_attempt(&mut self);

    /// Hands the stored result to `on_success` or `on_error`.
    fn deliver(self: Box<Self>);

    fn fail(self: Box<Self>, error: DispatchError);
}

type Operation<T> = Box<dyn Fn() -> VcsResult<T> + Send + Sync>;

struct Call<T> {
    operation: Operation<T>,
    on_success: Box<dyn FnOnce(T) + Send>,
    on_error: Box<dyn FnOnce(DispatchError) + Send>,
    result: Option<VcsResult<T>>,
    attempts: usize,
    state: Arc<InvocationState>,
}

impl<T: Send + 'static> Job for Call<T> {
    fn state(&self) -> &Arc<InvocationState> {
        &self.state
    }

    fn run(&mut self) -> Option<Box<AuthError>> {
        match (self.operation)() {
            Err(VcsError::Auth(error)) => Some(error),
            other => {
                self.result = Some(other);
                None
            }
        }
    }

    fn store_error(&mut self, error: VcsError) {
        self.result = Some(Err(error));
    }

    fn attempts(&self) -> usize {
        self.attempts
    }

    fn record_attempt(&mut self) {
        self.attempts += 1;
    }

    fn deliver(self: Box<Self>) {
        let call = *self;
        match call.result {
            Some(Ok(value)) => (call.on_success)(value),
            Some(Err(error)) => (call.on_error)(DispatchError::Operation(error)),
            None => (call.on_error)(DispatchError::Operation(VcsError::other(
                "operation produced no result",
            ))),
        }
    }

    fn fail(self: Box<Self>, error: DispatchError) {
        let call = *self;
        (call.on_error)(error);
    }
}

enum Message {
    Finished(Box<dyn Job>),
    AuthRequired(Box<dyn Job>, Box<AuthError>),
    Dropped(Arc<InvocationState>),
}

fn worker_loop(queue: &Receiver<Box<dyn Job>>, inbox: &Sender<Message>) {
    for mut job in queue.iter() {
        let message = if job.state().cancelled.load(Ordering::SeqCst) {
            debug!("skipping cancelled invocation");
            Message::Dropped(Arc::clone(job.state()))
        } else {
            match panic::catch_unwind(AssertUnwindSafe(|| job.run())) {
                Ok(Some(error)) => Message::AuthRequired(job, error),
                Ok(None) => Message::Finished(job),
                Err(_) => {
                    warn!("operation panicked");
                    job.store_error(VcsError::other("operation panicked"));
                    Message::Finished(job)
                }
            }
        };
        if inbox.send(message).is_err() {
            break;
        }
    }
}

/// Worker pool with an owner-side completion inbox.
pub struct Dispatcher {
    queue: Option<Sender<Box<dyn Job>>>,
    inbox: Receiver<Message>,
    workers: Vec<JoinHandle<()>>,
    prompt: Box<dyn CredentialPrompt>,
    max_auth_retries: usize,
    outstanding: usize,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("workers", &self.workers.len())
            .field("max_auth_retries", &self.max_auth_retries)
            .field("outstanding", &self.outstanding)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Starts `settings.workers()` threads (at least one).
    ///
    /// # Errors
    ///
    /// `Io` if a worker thread cannot be spawned.
    pub fn new(settings: DispatcherSettings, prompt: Box<dyn CredentialPrompt>) -> VcsResult<Self> {
        let (queue_tx, queue_rx) = flume::unbounded::<Box<dyn Job>>();
        let (inbox_tx, inbox_rx) = flume::unbounded();
        let count = settings.workers().max(1);
        let mut workers = Vec::with_capacity(count);
        for i in 0..count {
            let queue = queue_rx.clone();
            let inbox = inbox_tx.clone();
            let handle = thread::Builder::new()
                .name(format!("vcal-worker-{i}"))
                .spawn(move || worker_loop(&queue, &inbox))?;
            workers.push(handle);
        }
        debug!(workers = count, "dispatcher started");
        Ok(Self {
            queue: Some(queue_tx),
            inbox: inbox_rx,
            workers,
            prompt,
            max_auth_retries: settings.max_auth_retries(),
            outstanding: 0,
        })
    }

    /// Invocations not yet resolved.
    #[must_use]
    pub const fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Schedules `operation` on a worker.
    ///
    /// Exactly one of `on_success` / `on_error` runs on the owner thread
    /// unless the invocation is cancelled first.
    pub fn invoke<T, F, S, E>(&mut self, operation: F, on_success: S, on_error: E) -> Invocation
    where
        T: Send + 'static,
        F: Fn() -> VcsResult<T> + Send + Sync + 'static,
        S: FnOnce(T) + Send + 'static,
        E: FnOnce(DispatchError) + Send + 'static,
    {
        let state = Arc::new(InvocationState::default());
        let call = Call {
            operation: Box::new(operation),
            on_success: Box::new(on_success),
            on_error: Box::new(on_error),
            result: None,
            attempts: 0,
            state: Arc::clone(&state),
        };
        self.outstanding += 1;
        self.submit(Box::new(call));
        Invocation { state }
    }

    fn submit(&mut self, job: Box<dyn Job>) {
        let rejected = match &self.queue {
            Some(queue) => queue.send(job).err().map(|flume::SendError(job)| job),
            None => Some(job),
        };
        if let Some(job) = rejected {
            let state = Arc::clone(job.state());
            job.fail(DispatchError::Operation(VcsError::other(
                "dispatcher is shut down",
            )));
            self.resolve(&state);
        }
    }

    fn resolve(&mut self, state: &InvocationState) {
        state.finished.store(true, Ordering::SeqCst);
        self.outstanding = self.outstanding.saturating_sub(1);
    }

    fn handle(&mut self, message: Message) {
        match message {
            Message::Dropped(state) => self.resolve(&state),
            Message::Finished(job) => {
                let state = Arc::clone(job.state());
                if state.cancelled.load(Ordering::SeqCst) {
                    debug!("discarding result of cancelled invocation");
                } else {
                    job.deliver();
                }
                self.resolve(&state);
            }
            Message::AuthRequired(job, error) => self.authenticate(job, error),
        }
    }

    fn authenticate(&mut self, mut job: Box<dyn Job>, mut error: Box<AuthError>) {
        let state = Arc::clone(job.state());
        loop {
            if state.cancelled.load(Ordering::SeqCst) {
                debug!("discarding authentication failure of cancelled invocation");
                break;
            }
            if job.attempts() >= self.max_auth_retries {
                warn!(attempts = job.attempts(), "authentication retries exhausted");
                job.fail(DispatchError::AuthenticationFailed(error));
                break;
            }
            let request = CredentialRequest::from_error(&error);
            let Some(credentials) = self.prompt.prompt(&request) else {
                info!("credential prompt cancelled");
                job.fail(DispatchError::AuthenticationFailed(error));
                break;
            };
            job.record_attempt();
            match error.set_credentials(credentials) {
                Ok(()) => {
                    debug!(attempt = job.attempts(), "retrying with new credentials");
                    self.submit(job);
                    return;
                }
                Err(VcsError::Auth(next)) => error = next,
                Err(other) => {
                    job.fail(DispatchError::Operation(other));
                    break;
                }
            }
        }
        self.resolve(&state);
    }

    /// Handles every completion already in the inbox; returns how many.
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(message) = self.inbox.try_recv() {
            self.handle(message);
            handled += 1;
        }
        handled
    }

    /// Waits up to `timeout` for one completion and handles it.
    pub fn wait_next(&mut self, timeout: Duration) -> bool {
        if self.outstanding == 0 {
            return false;
        }
        match self.inbox.recv_timeout(timeout) {
            Ok(message) => {
                self.handle(message);
                true
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => false,
        }
    }

    /// Blocks until every invocation is resolved.
    pub fn run_until_idle(&mut self) {
        while self.outstanding > 0 {
            match self.inbox.recv() {
                Ok(message) => self.handle(message),
                Err(_) => {
                    warn!(outstanding = self.outstanding, "all workers exited");
                    break;
                }
            }
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.queue.take();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                warn!("dispatcher worker panicked");
            }
        }
    }
}
