//! Local key material: an X25519 key pair and the per-connection session salt.
//!
//! Both are created once per connection and must not be reused across
//! connections. The private scalar never leaves [`KeyPair`].

use std::fmt;

use rand_core::{CryptoRng, OsRng, RngCore};
use x25519_dalek::{PublicKey, SharedSecret, StaticSecret};
use zeroize::Zeroize;

use crate::error::Result;

/// Width of the raw X25519 point encoding.
pub const PUBLIC_KEY_LEN: usize = 32;
pub const SALT_LEN: usize = 16;

/// The secret half is zeroized on drop.
pub struct KeyPair {
    secret: StaticSecret,
    public: PublicKey,
}

impl KeyPair {
    /// Fresh key pair from the OS random source.
    pub fn generate() -> Result<Self> {
        Self::generate_with(&mut OsRng)
    }

    pub fn generate_with<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self> {
        let mut scalar = [0u8; 32];
        rng.try_fill_bytes(&mut scalar)?;
        // clamped by x25519-dalek, so every 32-byte string is a usable scalar
        let secret = StaticSecret::from(scalar);
        scalar.zeroize();
        let public = PublicKey::from(&secret);
        Ok(Self { secret, public })
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    pub(crate) fn diffie_hellman(&self, remote: &PublicKey) -> SharedSecret {
        self.secret.diffie_hellman(remote)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

/// Random block sent in the clear next to the public key. Acts as a nonce for
/// key derivation, so a fresh one is drawn for every connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionSalt([u8; SALT_LEN]);

impl SessionSalt {
    pub fn generate() -> Result<Self> {
        Self::generate_with(&mut OsRng)
    }

    pub fn generate_with<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self> {
        let mut salt = [0u8; SALT_LEN];
        rng.try_fill_bytes(&mut salt)?;
        Ok(Self(salt))
    }

    pub const fn from_bytes(bytes: [u8; SALT_LEN]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; SALT_LEN] {
        &self.0
    }
}

#[cfg(test)]
pub(crate) mod test {
    use std::num::NonZeroU32;

    use super::*;
    use crate::error::CryptoError;

    /// RNG whose every request fails, standing in for a dead entropy source.
    pub(crate) struct BrokenRng;

    impl RngCore for BrokenRng {
        fn next_u32(&mut self) -> u32 {
            unimplemented!()
        }
        fn next_u64(&mut self) -> u64 {
            unimplemented!()
        }
        fn fill_bytes(&mut self, _dest: &mut [u8]) {
            unimplemented!()
        }
        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> std::result::Result<(), rand_core::Error> {
            Err(NonZeroU32::new(rand_core::Error::CUSTOM_START).unwrap().into())
        }
    }

    impl CryptoRng for BrokenRng {}

    #[test]
    fn fresh_pairs_differ() {
        let a = KeyPair::generate().unwrap();
        let b = KeyPair::generate().unwrap();
        assert_ne!(a.public_key(), b.public_key());
        assert_ne!(a.public_key().as_bytes(), &[0; PUBLIC_KEY_LEN]);
    }

    #[test]
    fn fresh_salts_differ() {
        assert_ne!(SessionSalt::generate().unwrap(), SessionSalt::generate().unwrap());
    }

    #[test]
    fn broken_rng_is_reported() {
        assert_eq!(
            KeyPair::generate_with(&mut BrokenRng).unwrap_err(),
            CryptoError::Randomness
        );
        assert_eq!(
            SessionSalt::generate_with(&mut BrokenRng).unwrap_err(),
            CryptoError::Randomness
        );
    }

    #[test]
    fn debug_hides_secret() {
        let pair = KeyPair::generate().unwrap();
        let shown = format!("{pair:?}");
        assert!(shown.contains("public"));
        assert!(!shown.contains("secret"));
    }
}
