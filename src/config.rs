use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CryptoError;

/// Encryption protocol carried in the handshake `version` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    /// Payloads pass through untouched. Never negotiated over the wire.
    Disabled,
    /// X25519 key agreement, BLAKE2s key derivation, AES-128-CTR payloads.
    #[default]
    EcdhAes128V1,
}

impl Protocol {
    pub const fn version(self) -> u16 {
        match self {
            Protocol::Disabled => 0,
            Protocol::EcdhAes128V1 => 1,
        }
    }
}

impl TryFrom<u16> for Protocol {
    type Error = CryptoError;

    fn try_from(version: u16) -> Result<Self, Self::Error> {
        match version {
            0 => Ok(Protocol::Disabled),
            1 => Ok(Protocol::EcdhAes128V1),
            other => Err(CryptoError::UnsupportedProtocol(other)),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Protocol::Disabled => "ENC_PROTO_DISABLED",
            Protocol::EcdhAes128V1 => "ENC_PROTO_ECDH_AES_128_V1",
        })
    }
}

/// Per-connection settings. Missing fields fall back to [`ChannelConfig::default`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub protocol: Protocol,
    /// First counter value used in each direction.
    pub initial_counter: u32,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            protocol: Protocol::EcdhAes128V1,
            initial_counter: 1,
        }
    }
}
