//! # vndb-protocol
//!
//! Session engine for the VNDB TCP API: one persistent TLS connection
//! speaking a line-oriented `keyword [json]` protocol with a fixed
//! end-of-transmission terminator byte.
//!
//! This crate provides the pieces the higher-level client crates build on:
//!
//! - **Codec**: [`codec::encode`] / [`codec::decode`] for the wire framing
//! - **Session**: [`Session`] owns the connection, runs the login handshake,
//!   and correlates concurrent commands with their responses
//! - **Registry**: [`registry::Registry`] holds the ambient ("global")
//!   session slot; local sessions stay independent of it
//! - **Errors**: [`CodecError`] and [`SessionError`] via `thiserror`
//!
//! Responses carry no correlation identifier, so the server is trusted to
//! answer in request order and the session resolves waiters strictly FIFO.
//! Everything that touches the connection or the waiter queue runs on a
//! single task per session; callers only ever suspend on their own waiter.

#![deny(unsafe_code)]

pub mod codec;
pub mod config;
pub mod error;
pub mod registry;
pub mod session;

pub use codec::Message;
pub use config::{Credentials, SessionConfig};
pub use error::{CodecError, SessionError};
pub use session::Session;
