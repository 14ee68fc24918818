//! Connection identities.

use serde::Serialize;

/// Opaque handle for one transport connection.
///
/// Unique for the lifetime of the process; never reused after the
/// connection closes.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    derive_more::Display,
    derive_more::From,
)]
#[display("conn-{}", _0)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Returns the raw identifier.
    pub fn get(self) -> u64 {
        self.0
    }
}
