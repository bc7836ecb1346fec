//! # wind-core
//!
//! Core types for the wind actor runtime.
//!
//! This crate provides the foundational types shared by every wind crate:
//!
//! - [`ProcessId`] - Identifier of an OS thread participating in the runtime
//! - [`Role`] - Main, root or worker, derived from a [`ProcessId`]
//! - [`StateId`] - 1-based handle of a logical actor in the state registry
//! - [`Payload`] - Move-only message body carried between mailboxes
//! - [`Term`] - Serialization of typed values into payloads

#![deny(warnings)]
#![deny(missing_docs)]

mod payload;
mod pid;
mod state;
mod term;

pub use payload::Payload;
pub use pid::{ProcessId, Role};
pub use state::StateId;
pub use term::{DecodeError, EncodeError, Term};
