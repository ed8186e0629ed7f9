//! Noise `HandshakeState` for the NNpsk0 pattern.
//!
//! ```text
//! Noise_NNpsk0(psk):
//!   -> psk, e
//!   <- e, ee
//! ```
//!
//! No static keys on either side; the pre-shared key is mixed before the
//! first ephemeral. The client is always the initiator; the responder role
//! exists so both halves of the exchange can be driven in tests.

use rand::RngCore;
use rand::rngs::OsRng;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::{Zeroize, Zeroizing};

use crate::core::{
    HASH_SIZE, MAX_NOISE_MESSAGE_SIZE, NOISE_PROLOGUE, NoiseError, PSK_SIZE, PUBLIC_KEY_SIZE,
};

use super::cipher::CipherState;
use super::symmetric::SymmetricState;

/// Role in the handshake.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// Sends the first pattern message. Always the client.
    Initiator,
    /// Answers the first pattern message. The device.
    Responder,
}

#[derive(Clone, Copy, Debug)]
enum Token {
    Psk,
    E,
    Ee,
}

/// NNpsk0 message patterns, in exchange order.
const MESSAGE_PATTERNS: [&[Token]; 2] = [&[Token::Psk, Token::E], &[Token::E, Token::Ee]];

/// Transport cipher pair produced by a completed handshake.
pub struct TransportCiphers {
    /// Cipher for frames we send.
    pub send: CipherState,
    /// Cipher for frames we receive.
    pub recv: CipherState,
    /// Final transcript hash.
    pub handshake_hash: [u8; HASH_SIZE],
}

/// Driver for one NNpsk0 handshake.
pub struct HandshakeState {
    symmetric: SymmetricState,
    role: Role,
    psk: Zeroizing<[u8; PSK_SIZE]>,
    local_ephemeral: Option<StaticSecret>,
    remote_ephemeral: Option<PublicKey>,
    pattern_index: usize,
}

impl HandshakeState {
    /// Start a handshake.
    ///
    /// `psk` must be exactly 32 bytes. `extra_prologue` is appended to the
    /// fixed `NoiseAPIInit` prologue; pass an empty slice for the standard
    /// device handshake.
    pub fn new(role: Role, psk: &[u8], extra_prologue: &[u8]) -> Result<Self, NoiseError> {
        if psk.len() != PSK_SIZE {
            return Err(NoiseError::InvalidPskLength(psk.len()));
        }
        let mut psk_owned = Zeroizing::new([0u8; PSK_SIZE]);
        psk_owned.copy_from_slice(psk);

        let mut prologue = Vec::with_capacity(NOISE_PROLOGUE.len() + extra_prologue.len());
        prologue.extend_from_slice(NOISE_PROLOGUE);
        prologue.extend_from_slice(extra_prologue);

        Ok(Self {
            symmetric: SymmetricState::new(&prologue),
            role,
            psk: psk_owned,
            local_ephemeral: None,
            remote_ephemeral: None,
            pattern_index: 0,
        })
    }

    /// Whether both pattern messages have been processed.
    pub fn is_complete(&self) -> bool {
        self.pattern_index >= MESSAGE_PATTERNS.len()
    }

    /// Current transcript hash.
    pub fn handshake_hash(&self) -> [u8; HASH_SIZE] {
        self.symmetric.handshake_hash()
    }

    fn writes_at(&self, index: usize) -> bool {
        match self.role {
            Role::Initiator => index % 2 == 0,
            Role::Responder => index % 2 == 1,
        }
    }

    fn fresh_ephemeral() -> StaticSecret {
        let mut seed = [0u8; PSK_SIZE];
        OsRng.fill_bytes(&mut seed);
        let secret = StaticSecret::from(seed);
        seed.zeroize();
        secret
    }

    /// Produce the next pattern message, encrypting `payload` at the end.
    pub fn write_message(&mut self, payload: &[u8]) -> Result<Vec<u8>, NoiseError> {
        if self.is_complete() {
            return Err(NoiseError::HandshakeComplete);
        }
        if !self.writes_at(self.pattern_index) {
            return Err(NoiseError::OutOfTurn);
        }

        let mut message = Vec::with_capacity(PUBLIC_KEY_SIZE + payload.len() + 16);
        for token in MESSAGE_PATTERNS[self.pattern_index] {
            match token {
                Token::Psk => self.symmetric.mix_key_and_hash(self.psk.as_ref()),
                Token::E => {
                    let secret = Self::fresh_ephemeral();
                    let public = PublicKey::from(&secret);
                    message.extend_from_slice(public.as_bytes());
                    self.symmetric.mix_hash(public.as_bytes());
                    // psk modifier: ephemerals are also mixed into the key.
                    self.symmetric.mix_key(public.as_bytes());
                    self.local_ephemeral = Some(secret);
                }
                Token::Ee => {
                    let shared = self.diffie_hellman()?;
                    self.symmetric.mix_key(shared.as_ref());
                }
            }
        }
        let ciphertext = self.symmetric.encrypt_and_hash(payload)?;
        message.extend_from_slice(&ciphertext);
        if message.len() > MAX_NOISE_MESSAGE_SIZE {
            return Err(NoiseError::MessageTooLong(message.len()));
        }
        self.pattern_index += 1;
        Ok(message)
    }

    /// Consume the peer's pattern message, returning its decrypted payload.
    pub fn read_message(&mut self, message: &[u8]) -> Result<Vec<u8>, NoiseError> {
        if self.is_complete() {
            return Err(NoiseError::HandshakeComplete);
        }
        if self.writes_at(self.pattern_index) {
            return Err(NoiseError::OutOfTurn);
        }
        if message.len() > MAX_NOISE_MESSAGE_SIZE {
            return Err(NoiseError::MessageTooLong(message.len()));
        }

        let mut rest = message;
        for token in MESSAGE_PATTERNS[self.pattern_index] {
            match token {
                Token::Psk => self.symmetric.mix_key_and_hash(self.psk.as_ref()),
                Token::E => {
                    if rest.len() < PUBLIC_KEY_SIZE {
                        return Err(NoiseError::TruncatedMessage {
                            needed: PUBLIC_KEY_SIZE,
                            got: rest.len(),
                        });
                    }
                    let mut raw = [0u8; PUBLIC_KEY_SIZE];
                    raw.copy_from_slice(&rest[..PUBLIC_KEY_SIZE]);
                    rest = &rest[PUBLIC_KEY_SIZE..];
                    self.symmetric.mix_hash(&raw);
                    self.symmetric.mix_key(&raw);
                    self.remote_ephemeral = Some(PublicKey::from(raw));
                }
                Token::Ee => {
                    let shared = self.diffie_hellman()?;
                    self.symmetric.mix_key(shared.as_ref());
                }
            }
        }
        let payload = self.symmetric.decrypt_and_hash(rest)?;
        self.pattern_index += 1;
        Ok(payload)
    }

    fn diffie_hellman(&self) -> Result<Zeroizing<[u8; PSK_SIZE]>, NoiseError> {
        let secret = self
            .local_ephemeral
            .as_ref()
            .ok_or(NoiseError::MissingKeyMaterial)?;
        let remote = self
            .remote_ephemeral
            .as_ref()
            .ok_or(NoiseError::MissingKeyMaterial)?;
        Ok(Zeroizing::new(secret.diffie_hellman(remote).to_bytes()))
    }

    /// Split into transport ciphers, consuming and dropping the handshake
    /// state (ephemeral secret and PSK are zeroized on drop).
    ///
    /// The initiator sends under the first derived key; the responder
    /// receives under it.
    pub fn split(self) -> Result<TransportCiphers, NoiseError> {
        if !self.is_complete() {
            return Err(NoiseError::HandshakeIncomplete);
        }
        let handshake_hash = self.symmetric.handshake_hash();
        let (first, second) = self.symmetric.split();
        let (send, recv) = match self.role {
            Role::Initiator => (first, second),
            Role::Responder => (second, first),
        };
        Ok(TransportCiphers {
            send,
            recv,
            handshake_hash,
        })
    }
}
