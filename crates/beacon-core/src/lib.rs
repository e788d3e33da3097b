//! Core types and trait definitions for the Beacon location service.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it.

// Native `async fn` in traits; the `Send` bounds are spelled out on the
// returned futures where they matter.
#![allow(async_fn_in_trait)]

pub mod coordinate;
pub mod device;
pub mod error;
pub mod event;
pub mod location;
pub mod store;

pub use coordinate::Coordinate;
pub use error::{Error, Result};
