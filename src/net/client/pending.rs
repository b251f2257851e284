//! `PendingQueries`, the collection of in-flight queries of a transport.
//!
//! Each entry is keyed by the message ID used for the query. It keeps the
//! question so a response can be checked against it, the sending half of
//! the channel the asking caller waits on, and a handle to the task that
//! times the query out.

use super::error::Error;
use crate::base::{Message, Question};
use rand::random;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;

/// The result delivered to the caller of a query.
pub(super) type QueryResult = Result<Message, Error>;

//------------ PendingQuery --------------------------------------------------

/// A query waiting for its response.
pub(super) struct PendingQuery {
    /// The question the query was sent for.
    question: Question,

    /// A number distinguishing this query from earlier ones with the same ID.
    serial: u64,

    /// The completion signal.
    ///
    /// This is taken when the query completes.
    completion: Option<oneshot::Sender<QueryResult>>,

    /// The handle of the timeout task.
    timer: Option<AbortHandle>,
}

impl PendingQuery {
    /// Completes the query with the given result.
    ///
    /// This stops the timer. If the caller went away, the result is
    /// dropped.
    pub fn complete(mut self, result: QueryResult) {
        if let Some(timer) = self.timer.take() {
            timer.abort()
        }
        if let Some(completion) = self.completion.take() {
            let _ = completion.send(result);
        }
    }
}

//------------ PendingQueries ------------------------------------------------

/// A collection of pending queries.
pub(super) struct PendingQueries {
    /// A map from DNS message IDs to queries.
    queries: HashMap<u16, PendingQuery>,

    /// The serial number for the next query.
    next_serial: u64,
}

impl PendingQueries {
    /// Creates a new, empty collection.
    pub fn new() -> Self {
        PendingQueries {
            queries: HashMap::new(),
            next_serial: 0,
        }
    }

    /// Returns the number of pending queries.
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    /// Returns whether there are no more pending queries.
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Adds a query for `question` under a random, unused ID.
    ///
    /// Returns the ID, the serial number of the query, and the receiving
    /// half of its completion signal.
    ///
    /// The collection must hold fewer than 65536 queries or this will
    /// loop forever.
    pub fn insert(
        &mut self,
        question: Question,
    ) -> (u16, u64, oneshot::Receiver<QueryResult>) {
        let serial = self.next_serial;
        self.next_serial += 1;
        let (tx, rx) = oneshot::channel();
        loop {
            let id = random();
            if let Entry::Vacant(entry) = self.queries.entry(id) {
                entry.insert(PendingQuery {
                    question,
                    serial,
                    completion: Some(tx),
                    timer: None,
                });
                return (id, serial, rx);
            }
        }
    }

    /// Attaches the timer handle to the query with the given ID.
    ///
    /// If the query is already gone, the timer is stopped right away.
    pub fn set_timer(&mut self, id: u16, serial: u64, timer: AbortHandle) {
        match self.queries.get_mut(&id) {
            Some(query) if query.serial == serial => query.timer = Some(timer),
            _ => timer.abort(),
        }
    }

    /// Removes and returns the query answered by `msg`.
    ///
    /// Returns `None` and leaves the collection untouched if there is no
    /// query with the message’s ID or if the message doesn’t answer its
    /// question.
    pub fn take_answered(&mut self, msg: &Message) -> Option<PendingQuery> {
        let id = msg.header().id();
        if !msg.is_answer_to(&self.queries.get(&id)?.question) {
            return None;
        }
        self.queries.remove(&id)
    }

    /// Removes and returns the query with `id` if it has `serial`.
    pub fn take_expired(
        &mut self,
        id: u16,
        serial: u64,
    ) -> Option<PendingQuery> {
        match self.queries.entry(id) {
            Entry::Occupied(entry) if entry.get().serial == serial => {
                Some(entry.remove())
            }
            _ => None,
        }
    }

    /// Fails all pending queries with the given error.
    pub fn fail_all(&mut self, err: &Error) {
        for (_, query) in self.queries.drain() {
            query.complete(Err(err.clone()))
        }
    }
}

//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;
    use crate::base::{Dname, MessageBuilder, Rtype};
    use std::collections::HashSet;
    use std::str::FromStr;

    fn question(name: &str) -> Question {
        Question::new_in(Dname::from_str(name).unwrap(), Rtype::A)
    }

    fn answer(id: u16, question: &Question) -> Message {
        let mut builder = MessageBuilder::new();
        builder.header_mut().set_id(id);
        builder.header_mut().set_qr(true);
        builder.push_question(question).unwrap();
        builder.into_message().unwrap()
    }

    #[test]
    fn unique_ids() {
        let mut pending = PendingQueries::new();
        let mut ids = HashSet::new();
        let mut receivers = Vec::new();
        for _ in 0..5000 {
            let (id, _, rx) = pending.insert(question("example.com"));
            assert!(ids.insert(id));
            receivers.push(rx);
        }
        assert_eq!(pending.len(), 5000);
    }

    #[test]
    fn answered_once() {
        let mut pending = PendingQueries::new();
        let q = question("example.com");
        let (id, _, mut rx) = pending.insert(q.clone());

        // Wrong question leaves the entry in place.
        assert!(pending
            .take_answered(&answer(id, &question("example.org")))
            .is_none());
        assert_eq!(pending.len(), 1);

        let msg = answer(id, &q);
        pending.take_answered(&msg).unwrap().complete(Ok(msg.clone()));
        assert!(pending.is_empty());
        assert!(pending.take_answered(&msg).is_none());
        assert_eq!(rx.try_recv().unwrap().unwrap().header().id(), id);
    }

    #[test]
    fn stale_serial() {
        let mut pending = PendingQueries::new();
        let (id, serial, _rx) = pending.insert(question("example.com"));
        assert!(pending.take_expired(id, serial + 1).is_none());
        assert!(pending.take_expired(id, serial).is_some());
        assert!(pending.take_expired(id, serial).is_none());
    }

    #[tokio::test]
    async fn complete_stops_timer() {
        let mut pending = PendingQueries::new();
        let (id, serial, mut rx) = pending.insert(question("example.com"));
        let timer = tokio::spawn(std::future::pending::<()>());
        pending.set_timer(id, serial, timer.abort_handle());
        pending.fail_all(&Error::ConnectionClosed);
        assert!(timer.await.unwrap_err().is_cancelled());
        assert!(matches!(
            rx.try_recv().unwrap(),
            Err(Error::ConnectionClosed)
        ));
    }
}
