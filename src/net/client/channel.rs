//! The connection underneath a message transport.
//!
//! A [`MessageTransport`][super::transport::MessageTransport] does not talk
//! to sockets directly. Instead it uses a [`Channel`] which sends the wire
//! format of one query and receives one complete response at a time. The
//! modules [`udp`][super::udp] and [`tcp`][super::tcp] provide channels
//! for the two classic DNS transports. New channels are created through
//! the [`AsyncConnect`] trait.

#![warn(missing_docs)]

use super::error::TransportError;
use crate::base::Message;
use core::future::Future;
use core::pin::Pin;
use std::boxed::Box;
use std::io;

/// The future returned by the methods of a [`Channel`].
pub type ChannelFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, TransportError>> + Send + 'a>>;

//------------ Channel -------------------------------------------------------

/// A connection able to exchange DNS messages.
///
/// Sending and receiving are independent. A transport has at most one
/// receive operation running at any time, while sends may happen
/// concurrently with it and with each other.
pub trait Channel: Send + Sync + 'static {
    /// Sends one message given in wire format.
    fn send<'a>(&'a self, msg: &'a [u8]) -> ChannelFuture<'a, ()>;

    /// Receives the next message.
    ///
    /// Returning an error is fatal for the channel. Channels that can
    /// recover from malformed input should skip it instead.
    fn receive(&self) -> ChannelFuture<'_, Message>;

    /// Closes the channel.
    ///
    /// This must be idempotent.
    fn close(&self);

    /// Returns whether the channel can still be used.
    fn is_alive(&self) -> bool;
}

//------------ AsyncConnect --------------------------------------------------

/// Establish a connection asynchronously.
pub trait AsyncConnect {
    /// The type of an established connection.
    type Connection: Channel;

    /// The future establishing the connection.
    type Fut: Future<Output = Result<Self::Connection, io::Error>> + Send;

    /// Returns a future that establishing a connection.
    fn connect(&self) -> Self::Fut;
}
