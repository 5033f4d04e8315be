//! panel::signer
//!
//! Request signing for the hosting panel API.
//!
//! # Algorithm
//!
//! ```text
//! timestamp  = unix seconds, base 10
//! key_digest = hex(md5(key))
//! token      = hex(md5(timestamp ++ key_digest))
//! ```
//!
//! The panel verifies `request_token` against `request_time` and its own copy
//! of the key, so the key itself never travels over the wire. MD5 is what the
//! panel expects; it is not a choice made here.
//!
//! # Example
//!
//! ```
//! use jarvis::panel::{sign, FixedClock, FormParams};
//!
//! let params = FormParams::new().with("table", "sites");
//! let signed = sign("secret", params, &FixedClock(1_700_000_000));
//! assert_eq!(signed.get("request_time"), Some("1700000000"));
//! assert_eq!(signed.get("table"), Some("sites"));
//! ```

use md5::{Digest, Md5};

use super::params::FormParams;

/// Name of the timestamp parameter.
pub const REQUEST_TIME: &str = "request_time";

/// Name of the token parameter.
pub const REQUEST_TOKEN: &str = "request_token";

/// Source of the current Unix time in whole seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// A clock frozen at a fixed timestamp.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.0
    }
}

/// Lowercase hex MD5 of `input`.
pub fn md5_hex(input: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compute the request token for a key at a timestamp.
pub fn token(key: &str, timestamp: i64) -> String {
    md5_hex(&format!("{}{}", timestamp, md5_hex(key)))
}

/// Sign `params` with `key` at the clock's current time.
///
/// Sets `request_time` and `request_token`, overwriting them if present.
/// Every other parameter keeps its value and position. An empty key is
/// accepted and still yields a token.
pub fn sign(key: &str, mut params: FormParams, clock: &dyn Clock) -> FormParams {
    let timestamp = clock.now();
    params.set(REQUEST_TIME, timestamp.to_string());
    params.set(REQUEST_TOKEN, token(key, timestamp));
    params
}
