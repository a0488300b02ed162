//! Per-connection encryption for the client link.
//!
//! Each peer generates an X25519 key pair and a random salt, sends them in a
//! fixed 50-byte handshake message, and derives a shared AES-128 session key
//! from the peer's reply. Payloads are then XORed in place with an AES-CTR
//! keystream selected by a per-packet counter.
//!
//! ```text
//! KeyPair + SessionSalt -> HandshakeMessage -> [wire] -> derive -> CipherPair
//! ```
//!
//! Framing, connection management and retry policy belong to the transport.
#![forbid(unsafe_code)]

/// Keystream cipher; the raw explicit-counter form and the counter-tracking pair.
pub mod cipher_state;
pub mod config;
pub mod error;
/// Fixed-width handshake encoding.
pub mod handshake;
/// Connection-owned state: pending until the remote handshake is applied.
pub mod hs_state;
pub mod keys;
pub mod nonce;
/// Session key derivation from the exchanged handshake material.
pub mod symm_state;

pub use cipher_state::{CipherPair, StreamCipher};
pub use config::{ChannelConfig, Protocol};
pub use error::{CryptoError, Result};
pub use handshake::{HandshakeMessage, HANDSHAKE_LEN};
pub use hs_state::{HsState, PeerKeyset};
pub use keys::{KeyPair, SessionSalt};
pub use symm_state::{derive, SessionKey};
pub use x25519_dalek::PublicKey;
