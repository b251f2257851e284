//! The queue of callers waiting for room on a transport.
//!
//! When a transport has as many pending queries as its configuration
//! allows, further callers line up in an [`AdmissionQueue`]. Each time a
//! query finishes, the first caller in line is let in. A caller that has
//! been let in holds a reservation until it has added its query to the
//! pending queries so nobody can overtake it in between.

use super::error::Error;
use std::collections::VecDeque;
use tokio::sync::oneshot;

/// The signal a queued caller waits on.
pub(super) type Ticket = oneshot::Receiver<Result<(), Error>>;

//------------ AdmissionQueue ------------------------------------------------

/// A first-in first-out queue of callers waiting to be admitted.
pub(super) struct AdmissionQueue {
    /// The waiting callers in order of arrival.
    waiters: VecDeque<oneshot::Sender<Result<(), Error>>>,

    /// Number of callers admitted but not yet arrived in the query table.
    reserved: usize,
}

impl AdmissionQueue {
    /// Creates a new, empty queue.
    pub fn new() -> Self {
        AdmissionQueue {
            waiters: VecDeque::new(),
            reserved: 0,
        }
    }

    /// Returns the number of waiting callers.
    pub fn len(&self) -> usize {
        self.waiters.len()
    }

    /// Returns whether a new caller has to line up.
    ///
    /// This is the case if the number of pending queries together with
    /// callers already let in has reached `limit` or if others are waiting
    /// already.
    pub fn must_wait(&self, pending: usize, limit: usize) -> bool {
        pending + self.reserved >= limit || !self.waiters.is_empty()
    }

    /// Appends a new caller to the end of the queue.
    pub fn enqueue(&mut self) -> Ticket {
        let (tx, rx) = oneshot::channel();
        self.waiters.push_back(tx);
        rx
    }

    /// Admits a caller right away.
    pub fn reserve(&mut self) {
        self.reserved += 1;
    }

    /// Lets in the first caller that is still waiting.
    ///
    /// Callers that have given up are skipped. Returns whether someone was
    /// let in.
    pub fn release_one(&mut self) -> bool {
        while let Some(waiter) = self.waiters.pop_front() {
            if waiter.send(Ok(())).is_ok() {
                self.reserved += 1;
                return true;
            }
        }
        false
    }

    /// Gives back the reservation of a caller that was admitted.
    pub fn claim(&mut self) {
        self.reserved = self.reserved.saturating_sub(1);
    }

    /// Fails all waiting callers with the given error.
    pub fn fail_all(&mut self, err: &Error) {
        for waiter in self.waiters.drain(..) {
            let _ = waiter.send(Err(err.clone()));
        }
        self.reserved = 0;
    }
}

//============ Tests =========================================================
