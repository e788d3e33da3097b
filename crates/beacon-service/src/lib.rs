//! Location service, admin authentication, and push fan-out for Beacon.
//!
//! Transport-free: the HTTP gateway (`beacon-api`) drives these types, but
//! nothing here knows about requests or sockets.

pub mod auth;
pub mod error;
pub mod hub;
pub mod service;

pub use auth::{AdminAuthenticator, AdminGrant};
pub use error::{Error, Result};
pub use hub::{BroadcastHub, ConnectionId, PublishReport, Subscription};
pub use service::LocationService;
