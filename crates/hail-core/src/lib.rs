//! Core types and trait definitions for Hail ride dispatch.
//!
//! This crate has no HTTP, transport, or database dependencies. It holds the
//! ride lifecycle state machine plus the two seams the dispatcher talks
//! through: [`matching::MatchProvider`] and [`store::RideStore`].

pub mod error;
pub mod event;
pub mod matching;
pub mod quote;
pub mod ride;
pub mod store;

pub use error::{Error, Result};
