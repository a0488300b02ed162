//! Errors surfaced to the transport layer. None of these are retried here.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CryptoError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// The OS random source could not produce bytes. Abort the handshake.
    #[error("secure random source unavailable")]
    Randomness,

    /// Handshake buffer has the wrong size.
    #[error("malformed handshake: expected {expected} bytes, got {actual}")]
    MalformedHandshake { expected: usize, actual: usize },

    /// Remote public key is not usable for a contributory exchange.
    #[error("key exchange failed: {0}")]
    KeyExchange(&'static str),

    #[error("unsupported encryption protocol {0}")]
    UnsupportedProtocol(u16),

    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// Every counter value of a direction has been used; re-handshake.
    #[error("counter exhausted, new handshake required")]
    CounterExhausted,
}

impl From<rand_core::Error> for CryptoError {
    fn from(_: rand_core::Error) -> Self {
        CryptoError::Randomness
    }
}
