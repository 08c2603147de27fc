//! Anonymous per-browser tracking identifiers.

use std::fmt;

use rand::{Rng, rngs::OsRng};

/// Name of the cookie carrying the tracking id.
pub const TRACKING_COOKIE_NAME: &str = "tracking_id";

/// Largest integer a double can represent exactly (`2^53 - 1`).
pub const MAX_TRACKING_ID: u64 = (1 << 53) - 1;

/// Opaque tracking value as carried by the client. Values issued by this
/// service are decimal integers, but whatever the browser sends back is kept
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingId(String);

impl TrackingId {
    /// Draws a fresh id uniformly over `[0, MAX_TRACKING_ID]` from the OS
    /// generator. Uniqueness across visitors is not checked.
    pub fn generate() -> Self {
        let value: u64 = OsRng.gen_range(0..=MAX_TRACKING_ID);
        Self(value.to_string())
    }

    /// Wraps a client-supplied value; empty values count as absent.
    pub fn from_cookie(value: &str) -> Option<Self> {
        (!value.is_empty()).then(|| Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
