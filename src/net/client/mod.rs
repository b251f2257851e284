//! Sending queries and receiving responses.
//!
//! The central type of this module is the
//! [`MessageTransport`][transport::MessageTransport]. It runs any number of
//! concurrent queries over a single [`Channel`][channel::Channel], matching
//! each response to the query it answers by message ID and question. The
//! number of queries in flight is limited, with callers beyond the limit
//! waiting in line.
//!
//! Channels for DNS over UDP and TCP are provided by the [udp] and [tcp]
//! modules. They are created through the
//! [`AsyncConnect`][channel::AsyncConnect] trait, for instance via
//! [`MessageTransport::connect`][transport::MessageTransport::connect]:
//!
//! ```no_run
//! # use domain_stub::base::{Dname, Question, Rtype};
//! # use domain_stub::net::client::transport::{Config, MessageTransport};
//! # use domain_stub::net::client::udp::UdpConnect;
//! # use std::str::FromStr;
//! # use std::time::Duration;
//! # async fn _test() {
//! let connect = UdpConnect::new("192.0.2.53:53".parse().unwrap());
//! let transport =
//!     MessageTransport::connect(&connect, Config::new()).await.unwrap();
//! let question =
//!     Question::new_in(Dname::from_str("example.com").unwrap(), Rtype::A);
//! let response = transport
//!     .ask(&question, Duration::from_secs(5), None)
//!     .await
//!     .unwrap();
//! for record in response.answer() {
//!     println!("{}", record);
//! }
//! # }
//! ```
//!
//! A [`TransportPool`][pool::TransportPool] keeps transports to a set of
//! servers around for reuse and closes those that have been idle for too
//! long.

#![warn(missing_docs)]

mod admission;
pub mod channel;
pub mod error;
mod pending;
pub mod pool;
pub mod tcp;
pub mod transport;
pub mod udp;

pub use self::error::{Error, TransportError};
