//! An asynchronous stub resolver.
//!
//! A resolver is the component in the DNS that answers queries. A stub
//! resolver does so by simply relaying queries to a different resolver
//! chosen from a predefined set. This is how pretty much all user
//! applications use the DNS.
//!
//! This module implements a modern, asynchronous stub resolver built on
//! top of [Tokio](https://tokio.rs/) and the message transports of
//! [`net::client`][crate::net::client].
//!
//! The main type is [`StubResolver`]. It is configured through a
//! [`ResolvConf`] that is normally read from the system’s
//! `/etc/resolv.conf`, and a [`Hosts`] table read from `/etc/hosts`.
//! Besides asking arbitrary questions, the resolver provides lookups of
//! host names and addresses via [`lookup_host`][StubResolver::lookup_host]
//! and [`lookup_addr`][StubResolver::lookup_addr].
//!
//! If passing a resolver around is inconvenient, the functions in
//! [`registry`] give access to a process-wide default resolver.
//!
//! # Example
//!
//! ```no_run
//! use domain_stub::resolv::StubResolver;
//!
//! # async fn example() {
//! let resolver = StubResolver::new();
//! let found = resolver.lookup_host("www.example.com").await.unwrap();
//! for addr in found.iter() {
//!     println!("{}", addr);
//! }
//! # }
//! ```

pub use self::conf::{ResolvConf, ResolvOptions};
pub use self::error::Error;
pub use self::hosts::Hosts;
pub use self::lookup::{FoundAddrs, FoundHosts};
pub use self::name::{is_valid_name, normalize_name, NameError};
pub use self::registry::{default_resolver, reset_default, set_default};
pub use self::stub::StubResolver;

pub mod conf;
pub mod error;
pub mod hosts;
pub mod lookup;
pub mod name;
pub mod registry;
pub mod stub;
