//! Noise `CipherState`: one AEAD key and its nonce counter.

use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use zeroize::Zeroizing;

use crate::core::{AEAD_NONCE_SIZE, AEAD_TAG_SIZE, MAX_NOISE_MESSAGE_SIZE, NoiseError, PSK_SIZE};

/// One direction of ChaCha20-Poly1305 with a 64-bit nonce counter.
///
/// Before `initialize_key` the state is a pass-through: encrypt and decrypt
/// are the identity, which is what the handshake prefix needs. The key is
/// zeroized when the state is dropped or re-keyed.
pub struct CipherState {
    key: Option<Zeroizing<[u8; PSK_SIZE]>>,
    nonce: u64,
}

impl CipherState {
    /// Create a keyless state.
    pub fn new() -> Self {
        Self {
            key: None,
            nonce: 0,
        }
    }

    /// Install a key and reset the nonce counter to zero.
    pub fn initialize_key(&mut self, key: [u8; PSK_SIZE]) {
        self.key = Some(Zeroizing::new(key));
        self.nonce = 0;
    }

    /// Whether a key has been established.
    pub fn has_key(&self) -> bool {
        self.key.is_some()
    }

    /// Current nonce counter value.
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Raw key bytes, for handshake agreement checks in tests.
    #[cfg(test)]
    pub(crate) fn key_bytes(&self) -> Option<[u8; PSK_SIZE]> {
        self.key.as_deref().copied()
    }

    /// Noise nonce layout: four zero bytes then the counter little-endian.
    fn nonce_bytes(n: u64) -> [u8; AEAD_NONCE_SIZE] {
        let mut bytes = [0u8; AEAD_NONCE_SIZE];
        bytes[4..].copy_from_slice(&n.to_le_bytes());
        bytes
    }

    /// Encrypt `plaintext` with `ad` as associated data, appending the
    /// 16-byte tag. Identity when no key is set.
    ///
    /// The nonce increments only on success and never wraps; `u64::MAX` is
    /// reserved for [`CipherState::rekey`].
    pub fn encrypt_with_ad(&mut self, ad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, NoiseError> {
        let Some(key) = &self.key else {
            return Ok(plaintext.to_vec());
        };
        if plaintext.len() + AEAD_TAG_SIZE > MAX_NOISE_MESSAGE_SIZE {
            return Err(NoiseError::MessageTooLong(plaintext.len()));
        }
        if self.nonce == u64::MAX {
            return Err(NoiseError::NonceExhausted);
        }
        let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_ref()));
        let nonce = Self::nonce_bytes(self.nonce);
        let ciphertext = cipher
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: plaintext,
                    aad: ad,
                },
            )
            .map_err(|_| NoiseError::EncryptionFailed)?;
        self.nonce += 1;
        Ok(ciphertext)
    }

    /// Decrypt `ciphertext` with `ad` as associated data, verifying the
    /// trailing tag. Identity when no key is set.
    ///
    /// The nonce is not consumed by a failed decryption.
    pub fn decrypt_with_ad(&mut self, ad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, NoiseError> {
        let Some(key) = &self.key else {
            return Ok(ciphertext.to_vec());
        };
        if ciphertext.len() > MAX_NOISE_MESSAGE_SIZE {
            return Err(NoiseError::MessageTooLong(ciphertext.len()));
        }
        if self.nonce == u64::MAX {
            return Err(NoiseError::NonceExhausted);
        }
        let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_ref()));
        let nonce = Self::nonce_bytes(self.nonce);
        let plaintext = cipher
            .decrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: ciphertext,
                    aad: ad,
                },
            )
            .map_err(|_| NoiseError::AuthFailed)?;
        self.nonce += 1;
        Ok(plaintext)
    }

    /// Derive a fresh key from the current one.
    ///
    /// Encrypts 32 zero bytes under the reserved nonce `u64::MAX`; the first
    /// 32 bytes of the result replace the key and the counter restarts at
    /// zero. Unused on the client's normal path.
    pub fn rekey(&mut self) -> Result<(), NoiseError> {
        let Some(key) = &self.key else {
            return Err(NoiseError::Closed);
        };
        let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_ref()));
        let nonce = Self::nonce_bytes(u64::MAX);
        let output = cipher
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: &[0u8; PSK_SIZE],
                    aad: &[],
                },
            )
            .map_err(|_| NoiseError::EncryptionFailed)?;
        let mut new_key = [0u8; PSK_SIZE];
        new_key.copy_from_slice(&output[..PSK_SIZE]);
        self.initialize_key(new_key);
        Ok(())
    }
}

impl Default for CipherState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyed(byte: u8) -> CipherState {
        let mut state = CipherState::new();
        state.initialize_key([byte; 32]);
        state
    }

    #[test]
    fn test_identity_without_key() {
        let mut state = CipherState::new();
        assert!(!state.has_key());
        let out = state.encrypt_with_ad(b"ad", b"data").unwrap();
        assert_eq!(out, b"data");
        let back = state.decrypt_with_ad(b"ad", &out).unwrap();
        assert_eq!(back, b"data");
        // The pass-through does not consume nonces.
        assert_eq!(state.nonce(), 0);
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let mut tx = keyed(1);
        let mut rx = keyed(1);

        for i in 0..4u64 {
            let msg = format!("message {i}");
            let ct = tx.encrypt_with_ad(b"aad", msg.as_bytes()).unwrap();
            assert_eq!(ct.len(), msg.len() + AEAD_TAG_SIZE);
            let pt = rx.decrypt_with_ad(b"aad", &ct).unwrap();
            assert_eq!(pt, msg.as_bytes());
        }
        assert_eq!(tx.nonce(), 4);
        assert_eq!(rx.nonce(), 4);
    }

    #[test]
    fn test_decrypt_at_wrong_nonce_fails() {
        let mut tx = keyed(2);
        let mut rx = keyed(2);

        let ct0 = tx.encrypt_with_ad(&[], b"first").unwrap();
        let ct1 = tx.encrypt_with_ad(&[], b"second").unwrap();

        // Delivering the second ciphertext first puts the receiver at the
        // wrong counter.
        assert_eq!(rx.decrypt_with_ad(&[], &ct1), Err(NoiseError::AuthFailed));
        // The failure did not consume a nonce, in-order delivery recovers.
        assert_eq!(rx.decrypt_with_ad(&[], &ct0).unwrap(), b"first");
        assert_eq!(rx.decrypt_with_ad(&[], &ct1).unwrap(), b"second");
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let mut tx = keyed(3);
        let mut rx = keyed(3);
        let mut ct = tx.encrypt_with_ad(b"ad", b"payload").unwrap();
        ct[0] ^= 0x01;
        assert_eq!(rx.decrypt_with_ad(b"ad", &ct), Err(NoiseError::AuthFailed));
    }

    #[test]
    fn test_ad_mismatch_fails() {
        let mut tx = keyed(4);
        let mut rx = keyed(4);
        let ct = tx.encrypt_with_ad(b"right", b"payload").unwrap();
        assert_eq!(
            rx.decrypt_with_ad(b"wrong", &ct),
            Err(NoiseError::AuthFailed)
        );
    }

    #[test]
    fn test_rekey_changes_key_and_resets_nonce() {
        let mut state = keyed(5);
        state.encrypt_with_ad(&[], b"spin the counter").unwrap();
        assert_eq!(state.nonce(), 1);

        let before = state.key_bytes().unwrap();
        state.rekey().unwrap();
        assert_ne!(state.key_bytes().unwrap(), before);
        assert_eq!(state.nonce(), 0);

        // Both sides rekeying stay in sync.
        let mut peer = keyed(5);
        peer.rekey().unwrap();
        let mut fresh = keyed(5);
        fresh.encrypt_with_ad(&[], b"x").unwrap();
        fresh.rekey().unwrap();
        assert_eq!(peer.key_bytes(), fresh.key_bytes());
    }

    #[test]
    fn test_oversize_plaintext_rejected() {
        let mut state = keyed(6);
        let big = vec![0u8; MAX_NOISE_MESSAGE_SIZE];
        assert!(matches!(
            state.encrypt_with_ad(&[], &big),
            Err(NoiseError::MessageTooLong(_))
        ));
    }
}
