//! Protocol constants for the ESPHome native API.
//!
//! These values are fixed by the protocol and MUST NOT be changed.

use std::time::Duration;

// =============================================================================
// API VERSION
// =============================================================================

/// Major API version advertised in HelloRequest. A device answering with a
/// different major version is incompatible.
pub const API_VERSION_MAJOR: u32 = 1;

/// Minor API version advertised in HelloRequest.
pub const API_VERSION_MINOR: u32 = 12;

// =============================================================================
// TRANSPORT
// =============================================================================

/// Default TCP port of the native API server.
pub const DEFAULT_PORT: u16 = 6053;

/// Default `client_info` string sent in HelloRequest.
pub const DEFAULT_CLIENT_INFO: &str = "esphome-client";

/// First byte of a plaintext frame.
pub const INDICATOR_PLAINTEXT: u8 = 0x00;

/// First byte of an encrypted frame.
pub const INDICATOR_ENCRYPTED: u8 = 0x01;

/// Minimum bytes before a plaintext frame header can be parsed
/// (indicator + length varint + type varint).
pub const PLAINTEXT_MIN_HEADER: usize = 3;

/// Header size of an encrypted frame (indicator + u16 BE length).
pub const ENCRYPTED_HEADER_SIZE: usize = 3;

/// Header inside a decrypted payload (u16 BE type + u16 BE length).
pub const ENCRYPTED_INNER_HEADER_SIZE: usize = 4;

// =============================================================================
// CRYPTOGRAPHIC CONSTANTS
// =============================================================================

/// Full Noise protocol name for the handshake.
pub const NOISE_PROTOCOL_NAME: &str = "Noise_NNpsk0_25519_ChaChaPoly_SHA256";

/// Prologue bytes mixed into the handshake hash. ESPHome fixes this to
/// `"NoiseAPIInit"` followed by two NUL bytes (14 bytes total).
pub const NOISE_PROLOGUE: &[u8] = b"NoiseAPIInit\x00\x00";

/// Pre-shared key size. Keys of any other length are rejected.
pub const PSK_SIZE: usize = 32;

/// SHA-256 output size; also the chaining key and symmetric key size.
pub const HASH_SIZE: usize = 32;

/// X25519 public key size.
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Poly1305 authentication tag size.
pub const AEAD_TAG_SIZE: usize = 16;

/// ChaCha20-Poly1305 nonce size.
pub const AEAD_NONCE_SIZE: usize = 12;

/// Maximum Noise message length, which also bounds encrypted frame payloads.
pub const MAX_NOISE_MESSAGE_SIZE: usize = 65535;

// =============================================================================
// TIMING
// =============================================================================

/// Timer covering each handshake phase and the plaintext HELLO round-trip.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for the NoiseEncryptionSetKey round-trip.
pub const NOISE_KEY_SET_TIMEOUT: Duration = Duration::from_secs(5);

// =============================================================================
// RESOURCE CAPS
// =============================================================================

/// Cap on a single camera image reassembly buffer.
pub const MAX_CAMERA_IMAGE_SIZE: usize = 4 * 1024 * 1024;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prologue_shape() {
        assert_eq!(NOISE_PROLOGUE.len(), 14);
        assert!(NOISE_PROLOGUE.starts_with(b"NoiseAPIInit"));
        assert_eq!(&NOISE_PROLOGUE[12..], &[0, 0]);
    }

    #[test]
    fn test_protocol_name_exceeds_hash_size() {
        // The symmetric state hashes the name instead of padding it.
        assert!(NOISE_PROTOCOL_NAME.len() > HASH_SIZE);
    }
}
