//! Per-connection handshake state.
//!
//! A [`PeerKeyset`] is created when a connection starts, sends its own
//! [`HandshakeMessage`], and moves from pending to established exactly once,
//! when the remote message arrives. It is owned by a single connection and
//! dropped with it.

use std::fmt;

use bytes::Bytes;
use rand_core::{CryptoRng, OsRng, RngCore};
use tracing::{debug, trace, warn};
use x25519_dalek::PublicKey;

use crate::{
    cipher_state::CipherPair,
    config::{ChannelConfig, Protocol},
    error::{CryptoError, Result},
    handshake::HandshakeMessage,
    keys::{KeyPair, SessionSalt},
    symm_state,
};

pub enum HsState {
    /// Keys sent from our side, waiting for the reply.
    Pending,
    Established(CipherPair),
    /// Remote handshake rejected. The key material is spent.
    Failed,
}

impl fmt::Display for HsState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HsState::Pending => "SESCRYPT_PENDING",
            HsState::Established(_) => "SESCRYPT_ESTABLISHED",
            HsState::Failed => "SESCRYPT_FAILED",
        })
    }
}

pub struct PeerKeyset {
    config: ChannelConfig,
    key_pair: KeyPair,
    salt: SessionSalt,
    state: HsState,
}

impl PeerKeyset {
    pub fn start(config: ChannelConfig) -> Result<Self> {
        Self::start_with(config, &mut OsRng)
    }

    pub fn start_with<R: RngCore + CryptoRng>(config: ChannelConfig, rng: &mut R) -> Result<Self> {
        if config.protocol == Protocol::Disabled {
            return Err(CryptoError::UnsupportedProtocol(config.protocol.version()));
        }
        let key_pair = KeyPair::generate_with(rng)?;
        let salt = SessionSalt::generate_with(rng)?;
        debug!(protocol = %config.protocol, "handshake started");
        Ok(Self {
            config,
            key_pair,
            salt,
            state: HsState::Pending,
        })
    }

    pub fn public_key(&self) -> &PublicKey {
        self.key_pair.public_key()
    }

    pub fn salt(&self) -> &SessionSalt {
        &self.salt
    }

    pub fn state(&self) -> &HsState {
        &self.state
    }

    pub fn is_established(&self) -> bool {
        matches!(self.state, HsState::Established(_))
    }

    pub fn handshake_message(&self) -> HandshakeMessage {
        HandshakeMessage::new(
            self.config.protocol.version(),
            *self.key_pair.public_key(),
            self.salt,
        )
    }

    /// The local handshake buffer, ready to hand to the transport.
    pub fn handshake_bytes(&self) -> Bytes {
        self.handshake_message().encode()
    }

    /// Apply the remote handshake buffer and derive the session key.
    ///
    /// Any error moves the keyset to [`HsState::Failed`]; a new attempt needs
    /// a new keyset with fresh key material.
    pub fn complete(&mut self, remote: &[u8]) -> Result<()> {
        match self.state {
            HsState::Pending => {}
            HsState::Established(_) => {
                return Err(CryptoError::InvalidState("session already established"))
            }
            HsState::Failed => return Err(CryptoError::InvalidState("handshake already failed")),
        }
        let result = HandshakeMessage::decode(remote).and_then(|msg| self.establish(&msg));
        if let Err(e) = &result {
            warn!(error = %e, "handshake rejected");
            self.state = HsState::Failed;
        }
        result
    }

    fn establish(&mut self, remote: &HandshakeMessage) -> Result<()> {
        if remote.version != self.config.protocol.version() {
            return Err(CryptoError::UnsupportedProtocol(remote.version));
        }
        let key = symm_state::derive(&self.key_pair, &self.salt, &remote.public_key, &remote.salt)?;
        self.state = HsState::Established(CipherPair::new(key, self.config.initial_counter));
        debug!(state = %self.state, "handshake complete");
        Ok(())
    }

    /// Encrypt an outgoing payload in place. Returns the counter used, or
    /// `None` for an empty payload.
    pub fn encrypt(&mut self, payload: &mut [u8]) -> Result<Option<u32>> {
        self.established()?.seal(payload)
    }

    /// Decrypt an incoming payload in place with the next inbound counter.
    pub fn decrypt(&mut self, payload: &mut [u8]) -> Result<Option<u32>> {
        self.established()?.open(payload)
    }

    fn established(&mut self) -> Result<&mut CipherPair> {
        match &mut self.state {
            HsState::Established(pair) => Ok(pair),
            state => {
                trace!("payload refused: {state}");
                Err(CryptoError::InvalidState("session not established"))
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{handshake::HANDSHAKE_LEN, keys::test::BrokenRng};

    fn pair() -> (PeerKeyset, PeerKeyset) {
        let a = PeerKeyset::start(ChannelConfig::default()).unwrap();
        let b = PeerKeyset::start(ChannelConfig::default()).unwrap();
        (a, b)
    }

    #[test]
    fn start_pending() {
        let (a, _) = pair();
        assert!(!a.is_established());
        assert_eq!(a.state().to_string(), "SESCRYPT_PENDING");
        assert_eq!(a.handshake_bytes().len(), HANDSHAKE_LEN);
        assert_eq!(a.handshake_message().version, 1);
    }

    #[test]
    fn both_sides_establish() {
        let (mut a, mut b) = pair();
        let (ma, mb) = (a.handshake_bytes(), b.handshake_bytes());
        a.complete(&mb).unwrap();
        b.complete(&ma).unwrap();
        assert_eq!(a.state().to_string(), "SESCRYPT_ESTABLISHED");

        let mut msg = b"ping".to_vec();
        assert_eq!(a.encrypt(&mut msg).unwrap(), Some(1));
        assert_eq!(b.decrypt(&mut msg).unwrap(), Some(1));
        assert_eq!(&msg[..], b"ping");
    }

    #[test]
    fn no_payload_before_established() {
        let (mut a, _) = pair();
        assert!(matches!(
            a.encrypt(&mut [1, 2, 3]),
            Err(CryptoError::InvalidState(_))
        ));
        assert!(matches!(
            a.decrypt(&mut [1, 2, 3]),
            Err(CryptoError::InvalidState(_))
        ));
    }

    #[test]
    fn second_complete_refused() {
        let (mut a, b) = pair();
        a.complete(&b.handshake_bytes()).unwrap();
        assert!(matches!(
            a.complete(&b.handshake_bytes()),
            Err(CryptoError::InvalidState(_))
        ));
    }

    #[test]
    fn short_buffer_fails_keyset() {
        let (mut a, b) = pair();
        let bytes = b.handshake_bytes();
        assert_eq!(
            a.complete(&bytes[1..]),
            Err(CryptoError::MalformedHandshake {
                expected: HANDSHAKE_LEN,
                actual: HANDSHAKE_LEN - 1,
            })
        );
        assert_eq!(a.state().to_string(), "SESCRYPT_FAILED");
        // no second try with the same keys
        assert!(matches!(
            a.complete(&bytes),
            Err(CryptoError::InvalidState(_))
        ));
    }

    #[test]
    fn unknown_version_refused() {
        let (mut a, b) = pair();
        let mut msg = b.handshake_message();
        msg.version = 2;
        assert_eq!(
            a.complete(&msg.encode()),
            Err(CryptoError::UnsupportedProtocol(2))
        );
    }

    #[test]
    fn low_order_remote_refused() {
        let (mut a, b) = pair();
        let mut msg = b.handshake_message();
        msg.public_key = PublicKey::from([0u8; 32]);
        assert!(matches!(
            a.complete(&msg.encode()),
            Err(CryptoError::KeyExchange(_))
        ));
        assert!(!a.is_established());
    }

    #[test]
    fn disabled_protocol_has_no_handshake() {
        let config = ChannelConfig {
            protocol: Protocol::Disabled,
            ..ChannelConfig::default()
        };
        assert_eq!(
            PeerKeyset::start(config).err(),
            Some(CryptoError::UnsupportedProtocol(0))
        );
    }

    #[test]
    fn initial_counter_from_config() {
        let config = ChannelConfig {
            initial_counter: 100,
            ..ChannelConfig::default()
        };
        let mut a = PeerKeyset::start(config).unwrap();
        let mut b = PeerKeyset::start(config).unwrap();
        let (ma, mb) = (a.handshake_bytes(), b.handshake_bytes());
        a.complete(&mb).unwrap();
        b.complete(&ma).unwrap();
        assert_eq!(a.encrypt(&mut [0u8; 8]).unwrap(), Some(100));
    }

    #[test]
    fn broken_rng_aborts_start() {
        assert_eq!(
            PeerKeyset::start_with(ChannelConfig::default(), &mut BrokenRng).err(),
            Some(CryptoError::Randomness)
        );
    }
}
