//! Noise `SymmetricState`: chaining key, handshake hash and handshake
//! cipher.

use std::sync::OnceLock;

use hkdf::Hkdf;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::core::{HASH_SIZE, NOISE_PROTOCOL_NAME, NoiseError};

use super::cipher::CipherState;

static PROTOCOL_NAME_HASH: OnceLock<[u8; HASH_SIZE]> = OnceLock::new();

/// SHA-256 of the protocol name, computed once.
///
/// The name is longer than 32 bytes, so per the Noise spec it is hashed
/// rather than zero-padded.
fn protocol_name_hash() -> [u8; HASH_SIZE] {
    *PROTOCOL_NAME_HASH.get_or_init(|| sha256(&[NOISE_PROTOCOL_NAME.as_bytes()]))
}

fn sha256(parts: &[&[u8]]) -> [u8; HASH_SIZE] {
    let mut digest = Sha256::new();
    for part in parts {
        digest.update(part);
    }
    digest.finalize().into()
}

/// HKDF-SHA-256 with the chaining key as salt, expanded with empty info.
fn hkdf(ck: &[u8; HASH_SIZE], ikm: &[u8], okm: &mut [u8]) {
    let hk = Hkdf::<Sha256>::new(Some(ck), ikm);
    // Expand cannot fail for outputs up to 255 hash lengths.
    let _ = hk.expand(&[], okm);
}

/// The hash/key mixing state shared by every handshake token.
pub struct SymmetricState {
    ck: Zeroizing<[u8; HASH_SIZE]>,
    h: [u8; HASH_SIZE],
    cipher: CipherState,
}

impl SymmetricState {
    /// Initialize `h = ck = SHA-256(protocol_name)` and mix the prologue.
    pub fn new(prologue: &[u8]) -> Self {
        let seed = protocol_name_hash();
        let mut state = Self {
            ck: Zeroizing::new(seed),
            h: seed,
            cipher: CipherState::new(),
        };
        state.mix_hash(prologue);
        state
    }

    /// `h = SHA-256(h || data)`.
    pub fn mix_hash(&mut self, data: &[u8]) {
        self.h = sha256(&[&self.h, data]);
    }

    /// Derive `(ck, k)` from the chaining key and `ikm`; installs `k` with a
    /// zeroed nonce.
    pub fn mix_key(&mut self, ikm: &[u8]) {
        let mut okm = Zeroizing::new([0u8; 2 * HASH_SIZE]);
        hkdf(&self.ck, ikm, okm.as_mut());
        self.ck.copy_from_slice(&okm[..HASH_SIZE]);
        let mut key = [0u8; HASH_SIZE];
        key.copy_from_slice(&okm[HASH_SIZE..]);
        self.cipher.initialize_key(key);
    }

    /// Derive `(ck, temp_h, k)`; mixes `temp_h` into the transcript before
    /// installing `k`. Used by the `psk` token.
    pub fn mix_key_and_hash(&mut self, ikm: &[u8]) {
        let mut okm = Zeroizing::new([0u8; 3 * HASH_SIZE]);
        hkdf(&self.ck, ikm, okm.as_mut());
        self.ck.copy_from_slice(&okm[..HASH_SIZE]);
        let temp_h = &okm[HASH_SIZE..2 * HASH_SIZE];
        self.mix_hash(temp_h);
        let mut key = [0u8; HASH_SIZE];
        key.copy_from_slice(&okm[2 * HASH_SIZE..]);
        self.cipher.initialize_key(key);
    }

    /// Encrypt with the transcript hash as associated data, then mix the
    /// ciphertext into the transcript.
    pub fn encrypt_and_hash(&mut self, plaintext: &[u8]) -> Result<Vec<u8>, NoiseError> {
        let ad = self.h;
        let ciphertext = self.cipher.encrypt_with_ad(&ad, plaintext)?;
        self.mix_hash(&ciphertext);
        Ok(ciphertext)
    }

    /// Decrypt with the transcript hash as associated data, then mix the
    /// pre-decryption ciphertext into the transcript.
    pub fn decrypt_and_hash(&mut self, ciphertext: &[u8]) -> Result<Vec<u8>, NoiseError> {
        let ad = self.h;
        let plaintext = self.cipher.decrypt_with_ad(&ad, ciphertext)?;
        self.mix_hash(ciphertext);
        Ok(plaintext)
    }

    /// Whether the handshake cipher has a key yet.
    pub fn has_key(&self) -> bool {
        self.cipher.has_key()
    }

    /// Current transcript hash.
    pub fn handshake_hash(&self) -> [u8; HASH_SIZE] {
        self.h
    }

    /// Final key derivation: two transport keys from the chaining key.
    ///
    /// The first derived key belongs to the initiator's sending direction.
    pub fn split(self) -> (CipherState, CipherState) {
        let mut okm = Zeroizing::new([0u8; 2 * HASH_SIZE]);
        hkdf(&self.ck, &[], okm.as_mut());
        let mut k1 = [0u8; HASH_SIZE];
        let mut k2 = [0u8; HASH_SIZE];
        k1.copy_from_slice(&okm[..HASH_SIZE]);
        k2.copy_from_slice(&okm[HASH_SIZE..]);
        let mut first = CipherState::new();
        first.initialize_key(k1);
        let mut second = CipherState::new();
        second.initialize_key(k2);
        (first, second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::NOISE_PROLOGUE;

    #[test]
    fn test_protocol_name_hash_is_cached_and_stable() {
        let a = protocol_name_hash();
        let b = protocol_name_hash();
        assert_eq!(a, b);
        assert_eq!(a, sha256(&[NOISE_PROTOCOL_NAME.as_bytes()]));
    }

    #[test]
    fn test_mix_hash_is_deterministic() {
        let mut a = SymmetricState::new(NOISE_PROLOGUE);
        let mut b = SymmetricState::new(NOISE_PROLOGUE);
        a.mix_hash(b"data");
        b.mix_hash(b"data");
        assert_eq!(a.handshake_hash(), b.handshake_hash());

        let mut c = SymmetricState::new(NOISE_PROLOGUE);
        c.mix_hash(b"other");
        assert_ne!(a.handshake_hash(), c.handshake_hash());
    }

    #[test]
    fn test_prologue_changes_transcript() {
        let a = SymmetricState::new(NOISE_PROLOGUE);
        let b = SymmetricState::new(b"something else");
        assert_ne!(a.handshake_hash(), b.handshake_hash());
    }

    #[test]
    fn test_encrypt_decrypt_and_hash_track_transcripts() {
        let mut tx = SymmetricState::new(NOISE_PROLOGUE);
        let mut rx = SymmetricState::new(NOISE_PROLOGUE);
        tx.mix_key(&[7u8; 32]);
        rx.mix_key(&[7u8; 32]);

        let ct = tx.encrypt_and_hash(b"payload").unwrap();
        let pt = rx.decrypt_and_hash(&ct).unwrap();
        assert_eq!(pt, b"payload");
        assert_eq!(tx.handshake_hash(), rx.handshake_hash());
    }

    #[test]
    fn test_split_keys_match_across_peers() {
        let mut a = SymmetricState::new(NOISE_PROLOGUE);
        let mut b = SymmetricState::new(NOISE_PROLOGUE);
        a.mix_key_and_hash(&[1u8; 32]);
        b.mix_key_and_hash(&[1u8; 32]);

        let (a1, a2) = a.split();
        let (b1, b2) = b.split();
        assert_eq!(a1.key_bytes(), b1.key_bytes());
        assert_eq!(a2.key_bytes(), b2.key_bytes());
        assert_ne!(a1.key_bytes(), a2.key_bytes());
        assert_eq!(a1.nonce(), 0);
        assert_eq!(a2.nonce(), 0);
    }
}
