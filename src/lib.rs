//! An asynchronous DNS stub resolver for Rust.
//!
//! This crate provides the client side of the DNS: the types necessary to
//! build queries and read responses, message transports that run many
//! queries concurrently over UDP and TCP connections, and a stub resolver
//! atop those transports that is configured like the resolver of the C
//! library.
//!
//! # Modules
//!
//! * [base] contains the fundamental types for dealing with DNS data:
//!   domain names, questions, resource records, and messages.
//! * [net] contains the message transports. Its
//!   [client][net::client] module matches responses to queries, applies
//!   timeouts, and limits the number of queries in flight per connection.
#![cfg_attr(feature = "resolv", doc = "* [resolv]:")]
#![cfg_attr(not(feature = "resolv"), doc = "* resolv:")]
//!   A stub resolver based on the [Tokio](https://tokio.rs/) async runtime
//!   with host name and address lookups.
//!
//! # Reference of Feature Flags
//!
//! * `resolv`: Enables the stub resolver via the
#![cfg_attr(feature = "resolv", doc = "  [resolv]")]
#![cfg_attr(not(feature = "resolv"), doc = "  resolv")]
//!   module. This feature is enabled by default.

#![allow(renamed_and_removed_lints)]
#![allow(clippy::unknown_clippy_lints)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod base;
pub mod net;
#[cfg(feature = "resolv")]
#[cfg_attr(docsrs, doc(cfg(feature = "resolv")))]
pub mod resolv;

mod utils;
