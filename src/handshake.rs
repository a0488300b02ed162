//! Handshake wire message.
//!
//! Layout, fixed width, no padding:
//!
//! | field      | bytes | encoding                 |
//! |------------|-------|--------------------------|
//! | version    | 2     | little-endian `u16`      |
//! | public key | 32    | raw X25519 point         |
//! | salt       | 16    | raw random bytes         |

use bytes::{Buf, BufMut, Bytes, BytesMut};
use x25519_dalek::PublicKey;

use crate::{
    error::{CryptoError, Result},
    keys::{SessionSalt, PUBLIC_KEY_LEN, SALT_LEN},
};

const VERSION_LEN: usize = 2;
pub const HANDSHAKE_LEN: usize = VERSION_LEN + PUBLIC_KEY_LEN + SALT_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandshakeMessage {
    pub version: u16,
    pub public_key: PublicKey,
    pub salt: SessionSalt,
}

impl HandshakeMessage {
    pub fn new(version: u16, public_key: PublicKey, salt: SessionSalt) -> Self {
        Self {
            version,
            public_key,
            salt,
        }
    }

    pub fn write(&self, buf: &mut impl BufMut) {
        buf.put_u16_le(self.version);
        buf.put_slice(self.public_key.as_bytes());
        buf.put_slice(self.salt.as_bytes());
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(HANDSHAKE_LEN);
        self.write(&mut buf);
        buf.freeze()
    }

    /// Only the length is checked. Whether the point is usable is decided
    /// during key derivation.
    pub fn decode(mut data: &[u8]) -> Result<Self> {
        if data.len() != HANDSHAKE_LEN {
            return Err(CryptoError::MalformedHandshake {
                expected: HANDSHAKE_LEN,
                actual: data.len(),
            });
        }
        let version = data.get_u16_le();
        let mut point = [0u8; PUBLIC_KEY_LEN];
        data.copy_to_slice(&mut point);
        let mut salt = [0u8; SALT_LEN];
        data.copy_to_slice(&mut salt);

        Ok(Self {
            version,
            public_key: PublicKey::from(point),
            salt: SessionSalt::from_bytes(salt),
        })
    }
}
