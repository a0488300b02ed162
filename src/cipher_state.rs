//! AES-128-CTR payload cipher.
//!
//! The keystream for a packet starts at a fixed IV with the packet counter
//! XORed into its last four bytes (little-endian), then counts up big-endian
//! block by block. Encrypting and decrypting are the same operation.

use aes::Aes128;
use ctr::cipher::{generic_array::GenericArray, KeyIvInit, StreamCipher as _};
use tracing::trace;

use crate::{
    error::{CryptoError, Result},
    nonce::Counter,
    symm_state::SessionKey,
};

type Aes128Ctr = ctr::Ctr128BE<Aes128>;

const BASE_IV: [u8; 16] = [
    0xae, 0x2d, 0x8a, 0x57, 0x1e, 0x03, 0xac, 0x9c, 0x9e, 0xb7, 0x6f, 0xac, 0x45, 0xaf, 0x8e, 0x51,
];

/// XOR `buf` with the keystream for (`key`, `counter`), in place.
///
/// No counter tracking happens here. Calling this twice with the same key and
/// counter on different plaintexts leaks their XOR; use [`CipherPair`] unless
/// the caller manages counters itself.
pub fn apply(key: &SessionKey, counter: u32, buf: &mut [u8]) {
    if buf.is_empty() {
        return;
    }
    let mut iv = BASE_IV;
    iv[12..]
        .iter_mut()
        .zip(counter.to_le_bytes())
        .for_each(|(b, c)| *b ^= c);

    let mut cipher = Aes128Ctr::new(
        GenericArray::from_slice(key.as_bytes()),
        &GenericArray::from(iv),
    );
    cipher.apply_keystream(buf);
}

/// Session key bound to the raw, explicit-counter cipher.
#[derive(Debug)]
pub struct StreamCipher {
    key: SessionKey,
}

impl StreamCipher {
    pub fn new(key: SessionKey) -> Self {
        Self { key }
    }

    pub fn apply(&self, counter: u32, buf: &mut [u8]) {
        apply(&self.key, counter, buf)
    }

    /// Copying variant of [`StreamCipher::apply`].
    pub fn crypt(&self, counter: u32, data: &[u8]) -> Vec<u8> {
        let mut out = data.to_vec();
        self.apply(counter, &mut out);
        out
    }
}

/// Established session: one cipher, one counter per direction.
#[derive(Debug)]
pub struct CipherPair {
    cipher: StreamCipher,
    writer: Option<Counter>,
    reader: Option<Counter>,
}

impl CipherPair {
    pub fn new(key: SessionKey, initial_counter: u32) -> Self {
        Self {
            cipher: StreamCipher::new(key),
            writer: Some(Counter::starting_at(initial_counter)),
            reader: Some(Counter::starting_at(initial_counter)),
        }
    }

    /// Encrypts an outgoing payload in place and returns the counter it used.
    /// Empty payloads are left alone and do not consume a counter.
    pub fn seal(&mut self, buf: &mut [u8]) -> Result<Option<u32>> {
        Self::step(&self.cipher, &mut self.writer, buf, "sealed")
    }

    /// Decrypts an incoming payload in place with the next inbound counter.
    pub fn open(&mut self, buf: &mut [u8]) -> Result<Option<u32>> {
        Self::step(&self.cipher, &mut self.reader, buf, "opened")
    }

    fn step(
        cipher: &StreamCipher,
        slot: &mut Option<Counter>,
        buf: &mut [u8],
        what: &'static str,
    ) -> Result<Option<u32>> {
        if buf.is_empty() {
            trace!("skip {what}: no payload");
            return Ok(None);
        }
        let (n, next) = slot.take().ok_or(CryptoError::CounterExhausted)?.harvest();
        cipher.apply(n, buf);
        *slot = next;
        trace!(counter = n, len = buf.len(), "{what} payload");
        Ok(Some(n))
    }
}
