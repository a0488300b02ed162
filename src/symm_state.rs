//! Session key derivation.
//!
//! The X25519 shared secret is fed through an HKDF-shaped extract/expand over
//! keyed BLAKE2s. Both session salts go into the extract step in ascending byte
//! order, so either peer computes the same key from its own view of the
//! handshake.

use std::fmt;

use blake2::{
    digest::{generic_array::GenericArray, FixedOutput, Mac, Update},
    Blake2sMac256,
};
use x25519_dalek::PublicKey;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{
    error::{CryptoError, Result},
    keys::{KeyPair, SessionSalt, SALT_LEN},
};

/// AES-128 key width.
pub const SESSION_KEY_LEN: usize = 16;

const EXPAND_LABEL: &[u8] = b"tinycrypt ecdh-aes128 v1 session key";

#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SessionKey([u8; SESSION_KEY_LEN]);

impl SessionKey {
    pub const fn from_bytes(bytes: [u8; SESSION_KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SESSION_KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionKey(..)")
    }
}

/// Combine the local private key with the remote public key and both salts.
///
/// Fails when the remote key is a low-order point: such a key forces the
/// shared secret to a value known to anyone, so it is rejected rather than
/// used.
pub fn derive(
    own: &KeyPair,
    own_salt: &SessionSalt,
    remote_public: &PublicKey,
    remote_salt: &SessionSalt,
) -> Result<SessionKey> {
    let shared = own.diffie_hellman(remote_public);
    if !shared.was_contributory() {
        return Err(CryptoError::KeyExchange(
            "remote public key is a low-order point",
        ));
    }

    let (low, high) = if own_salt <= remote_salt {
        (own_salt, remote_salt)
    } else {
        (remote_salt, own_salt)
    };
    let mut salt = [0u8; 2 * SALT_LEN];
    salt[..SALT_LEN].copy_from_slice(low.as_bytes());
    salt[SALT_LEN..].copy_from_slice(high.as_bytes());

    let mut prk = extract(&salt, shared.as_bytes());
    let mut okm = expand(&prk);
    let mut key = [0u8; SESSION_KEY_LEN];
    key.copy_from_slice(&okm[..SESSION_KEY_LEN]);
    prk.zeroize();
    okm.zeroize();

    Ok(SessionKey(key))
}

fn extract(salt: &[u8; 32], ikm: &[u8; 32]) -> [u8; 32] {
    <Blake2sMac256 as Mac>::new(&GenericArray::from(*salt))
        .chain(ikm)
        .finalize_fixed()
        .into()
}

fn expand(prk: &[u8; 32]) -> [u8; 32] {
    <Blake2sMac256 as Mac>::new(&GenericArray::from(*prk))
        .chain(EXPAND_LABEL)
        .chain([1])
        .finalize_fixed()
        .into()
}
