//! IANA Definitions for DNS.
//!
//! This module contains types for the parameters defined in IANA registries
//! that a stub resolver needs to deal with.
//!
//! All types follow the same structure: they are newtypes around the raw
//! integer with associated constants for the well-defined values. Since
//! any integer can appear on the wire, unknown values are kept as they are
//! and compare as their integer value.

#[macro_use]
mod macros;

pub use self::class::Class;
pub use self::opcode::Opcode;
pub use self::rcode::Rcode;
pub use self::rtype::Rtype;

pub mod class;
pub mod opcode;
pub mod rcode;
pub mod rtype;
