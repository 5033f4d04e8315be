//! panel
//!
//! Client for the hosting control panel ("bt") HTTP API.
//!
//! # Modules
//!
//! - [`params`] - Ordered form parameters
//! - [`signer`] - `request_time` / `request_token` signing
//! - [`client`] - Form POST dispatcher with a fixed timeout
//! - [`response`] - Best-effort decoding of panel bodies
//! - [`actions`] - Endpoint paths and parameter builders
//!
//! # Flow
//!
//! Each operation builds a fresh [`FormParams`], signs it with the shared
//! key and posts it. The parameters are owned by the call and dropped once
//! the POST completes.

pub mod actions;
pub mod client;
pub mod params;
pub mod response;
pub mod signer;

pub use client::{PanelClient, PanelError, REQUEST_TIMEOUT};
pub use params::FormParams;
pub use response::{decode_items, find_id, Envelope, PanelItem};
pub use signer::{sign, Clock, FixedClock, SystemClock};

/// Host used when neither a flag nor the config names one.
pub const DEFAULT_HOST: &str = "http://127.0.0.1:8888";
