//! Sending and receiving DNS messages.
//!
//! Currently, only the client side is implemented in the [client] module.

pub mod client;
