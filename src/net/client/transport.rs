//! Many concurrent queries over a single connection.
//!
//! A [`MessageTransport`] owns one [`Channel`] and lets any number of
//! callers ask questions over it at the same time. Each query gets a random
//! message ID that is unique among the queries currently in flight. A
//! single receive task reads responses and hands each of them to the
//! caller whose ID and question it matches. Everything else that arrives
//! is dropped.
//!
//! Every query ends in exactly one of these ways: a matching response
//! arrives, its timeout expires, the caller’s cancellation token fires, or
//! the channel fails. A failed channel fails all queries in flight and
//! all callers still waiting for admission. The transport can’t be used
//! afterwards.
//!
//! The number of queries in flight is limited. Once the limit is reached,
//! further callers wait in line and are let in one by one, in the order
//! they arrived, whenever a query ends.
//!
//! Cancelling a query only ends the wait of its caller. The query itself
//! stays in flight until its response arrives or it times out. Its slot
//! is handed to the next waiting caller right away, so the number of
//! queries in flight can briefly exceed the limit.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use super::admission::{AdmissionQueue, Ticket};
use super::channel::{AsyncConnect, Channel};
use super::error::{Error, TransportError};
use super::pending::{PendingQueries, QueryResult};
use crate::base::{encode_query, Message, Question};
use crate::utils::config::DefMinMax;
use core::future::Future;
use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

//------------ Configuration Constants ----------------------------------------

/// Configuration limits for the maximum number of queries in flight.
const MAX_OUTSTANDING: DefMinMax<usize> = DefMinMax::new(500, 1, 0xA000);

//------------ Config ---------------------------------------------------------

/// Configuration for a message transport.
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum number of queries in flight.
    max_outstanding: usize,

    /// Whether to set the RD bit in queries.
    recursion_desired: bool,
}

impl Config {
    /// Creates a new, default config.
    pub fn new() -> Self {
        Default::default()
    }

    /// Returns the maximum number of queries in flight.
    pub fn max_outstanding(&self) -> usize {
        self.max_outstanding
    }

    /// Sets the maximum number of queries in flight.
    ///
    /// Callers that would exceed this number have to wait. The value is
    /// clamped to the range 1 to 40960.
    pub fn set_max_outstanding(&mut self, value: usize) {
        self.max_outstanding = MAX_OUTSTANDING.limit(value)
    }

    /// Returns whether queries ask for recursion.
    pub fn recursion_desired(&self) -> bool {
        self.recursion_desired
    }

    /// Sets whether queries ask for recursion.
    pub fn set_recursion_desired(&mut self, value: bool) {
        self.recursion_desired = value
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_outstanding: MAX_OUTSTANDING.default(),
            recursion_desired: true,
        }
    }
}

//------------ MessageTransport -----------------------------------------------

/// A transport multiplexing queries over a single channel.
///
/// Values of this type are handles to shared state and can be cloned
/// cheaply. All clones use the same channel.
pub struct MessageTransport<C> {
    /// The shared state.
    inner: Arc<Inner<C>>,
}

/// The state shared by all handles of a transport.
struct Inner<C> {
    /// The underlying channel.
    ///
    /// The receive task holds its own reference so it doesn’t keep the
    /// rest of the transport alive.
    channel: Arc<C>,

    /// The configuration.
    config: Config,

    /// The mutable bookkeeping.
    state: Mutex<State>,
}

/// The mutable bookkeeping of a transport.
struct State {
    /// The queries in flight.
    pending: PendingQueries,

    /// The callers waiting for admission.
    admission: AdmissionQueue,

    /// Whether a receive task is running.
    receiving: bool,

    /// The handle of the receive task, if it is running.
    receiver: Option<AbortHandle>,

    /// Whether there are queries in flight.
    ///
    /// A transport that isn’t referenced is idle and can be disposed of.
    referenced: bool,

    /// The time of the last send or receive.
    last_activity: Instant,

    /// The error the transport failed with, if it failed.
    closed: Option<Error>,
}

impl<C: Channel> MessageTransport<C> {
    /// Creates a new transport atop a channel with default config.
    pub fn new(channel: C) -> Self {
        Self::with_config(channel, Default::default())
    }

    /// Creates a new transport atop a channel with the given config.
    pub fn with_config(channel: C, config: Config) -> Self {
        MessageTransport {
            inner: Arc::new(Inner {
                channel: Arc::new(channel),
                config,
                state: Mutex::new(State {
                    pending: PendingQueries::new(),
                    admission: AdmissionQueue::new(),
                    receiving: false,
                    receiver: None,
                    referenced: false,
                    last_activity: Instant::now(),
                    closed: None,
                }),
            }),
        }
    }

    /// Establishes a new channel and creates a transport for it.
    pub async fn connect<A>(connect: &A, config: Config) -> Result<Self, Error>
    where
        A: AsyncConnect<Connection = C>,
    {
        let channel = connect
            .connect()
            .await
            .map_err(|err| TransportError::Connect(Arc::new(err)))?;
        Ok(Self::with_config(channel, config))
    }

    /// Asks a question and waits for the response.
    ///
    /// If no matching response arrives within `timeout`, the query fails
    /// with [`Error::Timeout`]. If `cancel` is given and fires first, the
    /// call returns [`Error::Cancelled`].
    ///
    /// If the transport has reached its limit of queries in flight, the
    /// call waits for its turn first. The timeout starts once the caller
    /// is admitted and the query is registered, right before it is sent.
    pub async fn ask(
        &self,
        question: &Question,
        timeout: Duration,
        cancel: Option<&CancellationToken>,
    ) -> Result<Message, Error> {
        self.admit(cancel).await?;
        let _guard = ExitGuard(&self.inner.state);
        let (id, rx) = self.register(question, timeout)?;

        trace!(id, %question, "sending query");
        let query =
            encode_query(question, id, self.inner.config.recursion_desired);
        if let Err(err) = self.inner.channel.send(&query).await {
            let err = Error::from(err);
            self.inner.fail(&err);
            return Err(err);
        }
        self.inner.start_receiving();

        match cancellable(rx, cancel).await {
            Ok(Ok(res)) => res,
            Ok(Err(_)) => Err(Error::ConnectionClosed),
            Err(err) => {
                trace!(id, "query cancelled");
                Err(err)
            }
        }
    }

    /// Waits until the caller may add a query.
    ///
    /// On success, the caller holds a reservation that must be claimed by
    /// [`register`][Self::register] without awaiting anything in between.
    async fn admit(
        &self,
        cancel: Option<&CancellationToken>,
    ) -> Result<(), Error> {
        let ticket = {
            let mut state = self.inner.state.lock();
            state.last_activity = Instant::now();
            if let Some(err) = state.closed.as_ref() {
                return Err(err.clone());
            }
            let limit = self.inner.config.max_outstanding;
            if !state.admission.must_wait(state.pending.len(), limit) {
                state.admission.reserve();
                return Ok(());
            }
            trace!(
                pending = state.pending.len(),
                queued = state.admission.len(),
                "waiting for admission"
            );
            state.admission.enqueue()
        };
        let mut queued = Queued {
            state: &self.inner.state,
            ticket,
            admitted: false,
        };
        match cancellable(&mut queued.ticket, cancel).await? {
            Ok(Ok(())) => {
                queued.admitted = true;
                Ok(())
            }
            Ok(Err(err)) => Err(err),
            Err(_) => Err(Error::ConnectionClosed),
        }
    }

    /// Adds a new pending query and starts its timer.
    fn register(
        &self,
        question: &Question,
        timeout: Duration,
    ) -> Result<(u16, oneshot::Receiver<QueryResult>), Error> {
        let mut state = self.inner.state.lock();
        state.admission.claim();
        if let Some(err) = state.closed.as_ref() {
            return Err(err.clone());
        }
        let (id, serial, rx) = state.pending.insert(question.clone());
        let timer = tokio::spawn(Inner::expire(
            Arc::downgrade(&self.inner),
            id,
            serial,
            timeout,
        ));
        state.pending.set_timer(id, serial, timer.abort_handle());
        Ok((id, rx))
    }

    /// Closes the transport.
    ///
    /// All queries in flight and all waiting callers fail with
    /// [`Error::ConnectionClosed`]. Closing an already closed transport
    /// does nothing.
    pub fn close(&self) {
        self.inner.fail(&Error::ConnectionClosed)
    }

    /// Returns whether the transport can still be used.
    pub fn is_alive(&self) -> bool {
        self.inner.state.lock().closed.is_none()
            && self.inner.channel.is_alive()
    }

    /// Returns the time of the last send or receive.
    pub fn last_activity(&self) -> Instant {
        self.inner.state.lock().last_activity
    }

    /// Returns whether the transport has no queries in flight.
    pub fn is_idle(&self) -> bool {
        !self.inner.state.lock().referenced
    }

    /// Returns the number of queries in flight.
    pub fn pending_count(&self) -> usize {
        self.inner.state.lock().pending.len()
    }

    /// Returns the number of callers waiting for admission.
    pub fn queued_count(&self) -> usize {
        self.inner.state.lock().admission.len()
    }

    /// Returns the configuration of the transport.
    pub fn config(&self) -> &Config {
        &self.inner.config
    }
}

impl<C> Clone for MessageTransport<C> {
    fn clone(&self) -> Self {
        MessageTransport {
            inner: self.inner.clone(),
        }
    }
}

impl<C> fmt::Debug for MessageTransport<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("MessageTransport")
            .field("pending", &state.pending.len())
            .field("queued", &state.admission.len())
            .field("closed", &state.closed)
            .finish()
    }
}

//------------ Inner ---------------------------------------------------------

impl<C: Channel> Inner<C> {
    /// Starts the receive task unless it is running already.
    fn start_receiving(self: &Arc<Self>) {
        let mut state = self.state.lock();
        state.last_activity = Instant::now();
        state.referenced = !state.pending.is_empty();
        if state.receiving
            || state.closed.is_some()
            || state.pending.is_empty()
        {
            return;
        }
        state.receiving = true;
        let task = tokio::spawn(Self::receive_loop(
            Arc::downgrade(self),
            self.channel.clone(),
        ));
        state.receiver = Some(task.abort_handle());
    }

    /// Receives messages for as long as there are queries in flight.
    ///
    /// The loop ends early if all handles of the transport are gone.
    async fn receive_loop(this: Weak<Self>, channel: Arc<C>) {
        loop {
            let res = channel.receive().await;
            let Some(this) = this.upgrade() else {
                return;
            };
            if !this.process(res) {
                break;
            }
        }
    }

    /// Processes the outcome of one receive operation.
    ///
    /// Returns whether the receive loop should continue.
    fn process(&self, res: Result<Message, TransportError>) -> bool {
        let mut state = self.state.lock();
        state.last_activity = Instant::now();
        state.receiving = false;
        let msg = match res {
            Ok(msg) => msg,
            Err(err) => {
                drop(state);
                self.fail(&Error::Transport(err));
                return false;
            }
        };
        match state.pending.take_answered(&msg) {
            Some(query) => {
                trace!(id = msg.header().id(), "response matched");
                query.complete(Ok(msg));
            }
            None => {
                debug!(id = msg.header().id(), "discarding unmatched message");
            }
        }
        if state.pending.is_empty() {
            state.referenced = false;
            state.receiver = None;
            return false;
        }
        state.receiving = true;
        true
    }

    /// Times out a query.
    async fn expire(this: Weak<Self>, id: u16, serial: u64, timeout: Duration) {
        tokio::time::sleep(timeout).await;
        let Some(this) = this.upgrade() else {
            return;
        };
        let mut state = this.state.lock();
        if let Some(query) = state.pending.take_expired(id, serial) {
            debug!(id, "query timed out");
            query.complete(Err(Error::Timeout));
        }
        if state.pending.is_empty() {
            state.referenced = false;
        }
    }

    /// Fails the transport.
    ///
    /// Closes the channel and fails all queries in flight and all waiting
    /// callers with `err`.
    fn fail(&self, err: &Error) {
        self.channel.close();
        let mut state = self.state.lock();
        if state.closed.is_none() {
            state.closed = Some(err.clone());
        }
        if let Some(receiver) = state.receiver.take() {
            receiver.abort();
        }
        state.receiving = false;
        state.referenced = false;
        if !state.pending.is_empty() || state.admission.len() > 0 {
            warn!(
                pending = state.pending.len(),
                queued = state.admission.len(),
                "transport failed: {}",
                err
            );
        }
        state.pending.fail_all(err);
        state.admission.fail_all(err);
    }
}

impl<C> Drop for Inner<C> {
    fn drop(&mut self) {
        // A receive task may still wait for a late response.
        if let Some(receiver) = self.state.get_mut().receiver.take() {
            receiver.abort();
        }
    }
}

//------------ ExitGuard -----------------------------------------------------

/// Bookkeeping for whenever a query that was admitted ends.
///
/// Marks the transport idle if no queries are left and lets in the next
/// waiting caller.
struct ExitGuard<'a>(&'a Mutex<State>);

impl<'a> Drop for ExitGuard<'a> {
    fn drop(&mut self) {
        let mut state = self.0.lock();
        if state.pending.is_empty() {
            state.referenced = false;
        }
        state.admission.release_one();
    }
}

//------------ Queued --------------------------------------------------------

/// A caller waiting in the admission queue.
///
/// If the caller gives up after it was let in, the reservation is handed
/// on to the next caller in line.
struct Queued<'a> {
    /// The state of the transport.
    state: &'a Mutex<State>,

    /// The signal to wait on.
    ticket: Ticket,

    /// Whether the caller made use of being let in.
    admitted: bool,
}

impl<'a> Drop for Queued<'a> {
    fn drop(&mut self) {
        if self.admitted {
            return;
        }
        self.ticket.close();
        if let Ok(Ok(())) = self.ticket.try_recv() {
            let mut state = self.state.lock();
            state.admission.claim();
            state.admission.release_one();
        }
    }
}

//------------ cancellable ---------------------------------------------------

/// Runs a future unless the token fires first.
async fn cancellable<F: Future>(
    fut: F,
    cancel: Option<&CancellationToken>,
) -> Result<F::Output, Error> {
    match cancel {
        Some(token) => tokio::select! {
            biased;
            res = fut => Ok(res),
            _ = token.cancelled() => Err(Error::Cancelled),
        },
        None => Ok(fut.await),
    }
}

//============ Tests =========================================================
