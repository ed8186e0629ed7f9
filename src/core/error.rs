//! Error types for the ESPHome native API client.

use thiserror::Error;

/// Errors from the low-level protobuf-compatible codec.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WireError {
    /// Varint continuation bit set past the last available byte.
    #[error("truncated varint")]
    TruncatedVarint,

    /// Varint longer than the 10 bytes a 64-bit value can need.
    #[error("varint exceeds 10 bytes")]
    VarintTooLong,

    /// Field data extends past the end of the message.
    #[error("unexpected end of message: need {needed} bytes, {available} available")]
    UnexpectedEof {
        /// Bytes required to finish the current field.
        needed: usize,
        /// Bytes remaining in the input.
        available: usize,
    },

    /// A length-delimited field expected to hold UTF-8 did not.
    #[error("field {field} is not valid UTF-8")]
    InvalidUtf8 {
        /// Field number of the offending value.
        field: u32,
    },
}

/// Errors from the frame codec.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// First byte of a frame was neither 0x00 nor 0x01. The receive buffer
    /// is dropped to resynchronize.
    #[error("unknown frame indicator 0x{0:02x}")]
    BadIndicator(u8),

    /// Plaintext frame header carried a malformed varint.
    #[error("malformed plaintext frame header: {0}")]
    BadHeader(#[from] WireError),

    /// Frame payload exceeds the Noise maximum message length.
    #[error("frame payload of {len} bytes exceeds maximum of {max}")]
    Oversize {
        /// Declared payload length.
        len: usize,
        /// Largest permitted payload.
        max: usize,
    },

    /// Decrypted payload too short for the inner type/length header.
    #[error("decrypted payload of {0} bytes is shorter than its header")]
    TruncatedInner(usize),
}

/// Errors from the Noise handshake and transport ciphers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NoiseError {
    /// The configured pre-shared key does not decode to exactly 32 bytes.
    #[error("pre-shared key must be 32 bytes, got {0}")]
    InvalidPskLength(usize),

    /// AEAD authentication failed on decryption.
    #[error("AEAD authentication failed")]
    AuthFailed,

    /// AEAD encryption failed.
    #[error("AEAD encryption failed")]
    EncryptionFailed,

    /// `write_message`/`read_message` called after the pattern finished.
    #[error("handshake already complete")]
    HandshakeComplete,

    /// `write_message`/`read_message` called when it is the peer's turn.
    #[error("handshake message out of turn")]
    OutOfTurn,

    /// Split requested before the pattern finished.
    #[error("handshake not complete")]
    HandshakeIncomplete,

    /// Handshake message ended before the expected ephemeral key.
    #[error("handshake message truncated: need {needed} bytes, got {got}")]
    TruncatedMessage {
        /// Bytes the current token requires.
        needed: usize,
        /// Bytes left in the message.
        got: usize,
    },

    /// A DH token was reached without both keys present.
    #[error("missing key material for DH")]
    MissingKeyMaterial,

    /// Message exceeds the Noise maximum message length.
    #[error("noise message of {0} bytes exceeds 65535")]
    MessageTooLong(usize),

    /// The 64-bit nonce counter ran out; the session must end.
    #[error("nonce counter exhausted")]
    NonceExhausted,

    /// Encrypt or decrypt attempted after the cipher was torn down.
    #[error("cipher state is closed")]
    Closed,

    /// Device selected a protocol version other than 1 in its hello.
    #[error("server selected unsupported protocol {0}")]
    UnsupportedProtocol(u8),

    /// Device's announced name differs from the configured expectation.
    #[error("server name mismatch: expected {expected:?}, got {actual:?}")]
    ServerNameMismatch {
        /// Name the caller configured.
        expected: String,
        /// Name the device announced.
        actual: String,
    },

    /// Device rejected the handshake with an explanatory message.
    #[error("handshake rejected by server: {0}")]
    ServerRejected(String),

    /// Server handshake frame was empty or otherwise unusable.
    #[error("malformed handshake frame")]
    MalformedFrame,
}

/// Errors terminating a connection attempt or an established session.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Socket-level failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Noise handshake or transport cipher failure.
    #[error("noise error: {0}")]
    Noise(#[from] NoiseError),

    /// Frame-level failure that could not be resynchronized away.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// No response within the connection timer.
    #[error("connection timeout")]
    Timeout,

    /// Peer closed the TCP stream.
    #[error("connection closed by peer")]
    UnexpectedClose,

    /// Device speaks encryption but no pre-shared key is configured.
    #[error("encryption key missing: device expects an encrypted connection")]
    EncryptionKeyMissing,

    /// Device rejected our key material during the handshake.
    #[error("encryption key invalid")]
    EncryptionKeyInvalid,

    /// AEAD failure after the handshake completed.
    #[error("encryption failure")]
    EncryptionFailure,

    /// Device answered HELLO with an incompatible major version.
    #[error("unsupported API version {major}.{minor}")]
    UnsupportedApiVersion {
        /// Major version the device reported.
        major: u32,
        /// Minor version the device reported.
        minor: u32,
    },
}

/// Top-level client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection establishment or session failure.
    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// I/O error.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// `connect` called while a session is already running.
    #[error("already connected")]
    AlreadyConnected,

    /// Operation requires an established session.
    #[error("not connected")]
    NotConnected,
}

impl ConnectionError {
    /// Classify a socket error into the log category and disconnect reason
    /// used by the connection actor.
    pub fn classify_io(err: &std::io::Error) -> &'static str {
        use std::io::ErrorKind;
        match err.kind() {
            ErrorKind::ConnectionRefused => "connection refused",
            ErrorKind::ConnectionReset => "connection reset by peer",
            ErrorKind::HostUnreachable | ErrorKind::NetworkUnreachable => "host unreachable",
            ErrorKind::TimedOut => "connection timed out",
            ErrorKind::UnexpectedEof => "connection closed unexpectedly",
            _ => "socket error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_classify_io() {
        let refused = io::Error::new(io::ErrorKind::ConnectionRefused, "nope");
        assert_eq!(ConnectionError::classify_io(&refused), "connection refused");

        let reset = io::Error::new(io::ErrorKind::ConnectionReset, "rst");
        assert_eq!(
            ConnectionError::classify_io(&reset),
            "connection reset by peer"
        );

        let other = io::Error::other("???");
        assert_eq!(ConnectionError::classify_io(&other), "socket error");
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            NoiseError::InvalidPskLength(31).to_string(),
            "pre-shared key must be 32 bytes, got 31"
        );
        assert_eq!(
            FrameError::BadIndicator(0x7f).to_string(),
            "unknown frame indicator 0x7f"
        );
        assert_eq!(
            ConnectionError::EncryptionKeyInvalid.to_string(),
            "encryption key invalid"
        );
    }
}
