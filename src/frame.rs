//! Frame codec for the native API byte stream.
//!
//! Two framings share one TCP stream, told apart by the first byte of each
//! frame:
//!
//! ```text
//! plaintext:  [0x00] [varint payload_len] [varint msg_type] [payload]
//! encrypted:  [0x01] [u16 BE payload_len] [payload]
//! ```
//!
//! [`FrameDecoder`] accumulates received bytes and yields complete frames;
//! partial frames stay buffered until more bytes arrive. Any other leading
//! byte is a framing error and drops the whole buffer to resynchronize.
//!
//! Inside an encrypted frame (after decryption) sits a second header of
//! `u16 BE type` and `u16 BE length` before the message payload.

use crate::core::{
    ENCRYPTED_HEADER_SIZE, ENCRYPTED_INNER_HEADER_SIZE, FrameError, INDICATOR_ENCRYPTED,
    INDICATOR_PLAINTEXT, MAX_NOISE_MESSAGE_SIZE, WireError,
};
use crate::wire::{decode_varint, encode_varint};

/// One complete frame taken off the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// `0x00`-framed message, already carrying its type.
    Plaintext {
        /// Message type from the frame header.
        msg_type: u64,
        /// Message payload.
        payload: Vec<u8>,
    },
    /// `0x01`-framed blob; handshake bytes or AEAD ciphertext depending on
    /// the connection phase.
    Encrypted {
        /// Frame payload, still opaque at this layer.
        payload: Vec<u8>,
    },
}

/// Streaming frame decoder over an append-only receive buffer.
///
/// At rest the buffer is either empty or a proper prefix of one or more
/// frames.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
}

impl FrameDecoder {
    /// Create an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append received bytes.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Bytes currently buffered.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Peek at the first unconsumed byte, if any.
    pub fn peek(&self) -> Option<u8> {
        self.buf.first().copied()
    }

    /// Drop all buffered bytes.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Try to take the next complete frame.
    ///
    /// `Ok(None)` means more bytes are needed. A framing error clears the
    /// buffer before returning so the stream can resynchronize on the next
    /// frame boundary the peer writes.
    pub fn next_frame(&mut self) -> Result<Option<Frame>, FrameError> {
        let Some(&indicator) = self.buf.first() else {
            return Ok(None);
        };
        match indicator {
            INDICATOR_PLAINTEXT => self.next_plaintext(),
            INDICATOR_ENCRYPTED => self.next_encrypted(),
            other => {
                self.buf.clear();
                Err(FrameError::BadIndicator(other))
            }
        }
    }

    fn next_plaintext(&mut self) -> Result<Option<Frame>, FrameError> {
        let mut pos = 1;
        let (payload_len, used) = match decode_varint(&self.buf[pos..]) {
            Ok(v) => v,
            Err(WireError::TruncatedVarint) => return Ok(None),
            Err(err) => {
                self.buf.clear();
                return Err(FrameError::BadHeader(err));
            }
        };
        pos += used;
        let payload_len = payload_len as usize;
        if payload_len > MAX_NOISE_MESSAGE_SIZE {
            self.buf.clear();
            return Err(FrameError::Oversize {
                len: payload_len,
                max: MAX_NOISE_MESSAGE_SIZE,
            });
        }
        let (msg_type, used) = match decode_varint(&self.buf[pos..]) {
            Ok(v) => v,
            Err(WireError::TruncatedVarint) => return Ok(None),
            Err(err) => {
                self.buf.clear();
                return Err(FrameError::BadHeader(err));
            }
        };
        pos += used;
        if self.buf.len() < pos + payload_len {
            return Ok(None);
        }
        let payload = self.buf[pos..pos + payload_len].to_vec();
        self.buf.drain(..pos + payload_len);
        Ok(Some(Frame::Plaintext { msg_type, payload }))
    }

    fn next_encrypted(&mut self) -> Result<Option<Frame>, FrameError> {
        if self.buf.len() < ENCRYPTED_HEADER_SIZE {
            return Ok(None);
        }
        let payload_len = usize::from(u16::from_be_bytes([self.buf[1], self.buf[2]]));
        if self.buf.len() < ENCRYPTED_HEADER_SIZE + payload_len {
            return Ok(None);
        }
        let payload = self.buf[ENCRYPTED_HEADER_SIZE..ENCRYPTED_HEADER_SIZE + payload_len].to_vec();
        self.buf.drain(..ENCRYPTED_HEADER_SIZE + payload_len);
        Ok(Some(Frame::Encrypted { payload }))
    }
}

/// Encode a plaintext frame.
pub fn encode_plaintext_frame(msg_type: u64, payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(1 + 2 * 5 + payload.len());
    frame.push(INDICATOR_PLAINTEXT);
    encode_varint(payload.len() as u64, &mut frame);
    encode_varint(msg_type, &mut frame);
    frame.extend_from_slice(payload);
    frame
}

/// Encode an encrypted frame around an opaque payload.
pub fn encode_encrypted_frame(payload: &[u8]) -> Result<Vec<u8>, FrameError> {
    if payload.len() > MAX_NOISE_MESSAGE_SIZE {
        return Err(FrameError::Oversize {
            len: payload.len(),
            max: MAX_NOISE_MESSAGE_SIZE,
        });
    }
    let mut frame = Vec::with_capacity(ENCRYPTED_HEADER_SIZE + payload.len());
    frame.push(INDICATOR_ENCRYPTED);
    frame.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Build the plaintext that goes inside an encrypted frame:
/// `[u16 BE type] [u16 BE length] [payload]`.
pub fn encode_inner_message(msg_type: u16, payload: &[u8]) -> Vec<u8> {
    let mut inner = Vec::with_capacity(ENCRYPTED_INNER_HEADER_SIZE + payload.len());
    inner.extend_from_slice(&msg_type.to_be_bytes());
    inner.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    inner.extend_from_slice(payload);
    inner
}

/// Parse the inner header of a decrypted payload.
pub fn decode_inner_message(plaintext: &[u8]) -> Result<(u16, Vec<u8>), FrameError> {
    if plaintext.len() < ENCRYPTED_INNER_HEADER_SIZE {
        return Err(FrameError::TruncatedInner(plaintext.len()));
    }
    let msg_type = u16::from_be_bytes([plaintext[0], plaintext[1]]);
    let declared = usize::from(u16::from_be_bytes([plaintext[2], plaintext[3]]));
    let body = &plaintext[ENCRYPTED_INNER_HEADER_SIZE..];
    if declared > body.len() {
        return Err(FrameError::TruncatedInner(plaintext.len()));
    }
    Ok((msg_type, body[..declared].to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plaintext_roundtrip() {
        let frame = encode_plaintext_frame(1, b"hello");
        assert_eq!(frame[0], INDICATOR_PLAINTEXT);

        let mut decoder = FrameDecoder::new();
        decoder.extend(&frame);
        let decoded = decoder.next_frame().unwrap().unwrap();
        assert_eq!(
            decoded,
            Frame::Plaintext {
                msg_type: 1,
                payload: b"hello".to_vec()
            }
        );
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn test_plaintext_multibyte_varints() {
        // Payload over 127 bytes and a type over 127 both need two-byte
        // varints in the header.
        let payload = vec![0xabu8; 300];
        let frame = encode_plaintext_frame(300, &payload);

        let mut decoder = FrameDecoder::new();
        decoder.extend(&frame);
        match decoder.next_frame().unwrap().unwrap() {
            Frame::Plaintext { msg_type, payload: p } => {
                assert_eq!(msg_type, 300);
                assert_eq!(p, payload);
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn test_encrypted_roundtrip() {
        let frame = encode_encrypted_frame(&[1, 2, 3, 4]).unwrap();
        assert_eq!(&frame[..3], &[0x01, 0x00, 0x04]);

        let mut decoder = FrameDecoder::new();
        decoder.extend(&frame);
        assert_eq!(
            decoder.next_frame().unwrap().unwrap(),
            Frame::Encrypted {
                payload: vec![1, 2, 3, 4]
            }
        );
    }

    #[test]
    fn test_empty_encrypted_frame() {
        // The client's first Noise frame is exactly this envelope.
        let frame = encode_encrypted_frame(&[]).unwrap();
        assert_eq!(frame, [0x01, 0x00, 0x00]);

        let mut decoder = FrameDecoder::new();
        decoder.extend(&frame);
        assert_eq!(
            decoder.next_frame().unwrap().unwrap(),
            Frame::Encrypted { payload: vec![] }
        );
    }

    #[test]
    fn test_partial_frames_wait() {
        let frame = encode_plaintext_frame(7, b"payload");
        let mut decoder = FrameDecoder::new();
        for &byte in &frame[..frame.len() - 1] {
            decoder.extend(&[byte]);
            assert_eq!(decoder.next_frame().unwrap(), None);
        }
        decoder.extend(&frame[frame.len() - 1..]);
        assert!(decoder.next_frame().unwrap().is_some());
    }

    #[test]
    fn test_byte_at_a_time_equals_bulk() {
        let mut stream = Vec::new();
        stream.extend_from_slice(&encode_plaintext_frame(4, &[]));
        stream.extend_from_slice(&encode_encrypted_frame(&[9; 20]).unwrap());
        stream.extend_from_slice(&encode_plaintext_frame(25, &[1, 2, 3]));

        let mut bulk = FrameDecoder::new();
        bulk.extend(&stream);
        let mut bulk_frames = Vec::new();
        while let Some(frame) = bulk.next_frame().unwrap() {
            bulk_frames.push(frame);
        }

        let mut trickle = FrameDecoder::new();
        let mut trickle_frames = Vec::new();
        for &byte in &stream {
            trickle.extend(&[byte]);
            while let Some(frame) = trickle.next_frame().unwrap() {
                trickle_frames.push(frame);
            }
        }

        assert_eq!(bulk_frames.len(), 3);
        assert_eq!(bulk_frames, trickle_frames);
    }

    #[test]
    fn test_bad_indicator_drops_buffer() {
        let mut decoder = FrameDecoder::new();
        decoder.extend(&[0x42, 0x00, 0x01, 0x02]);
        assert_eq!(decoder.next_frame(), Err(FrameError::BadIndicator(0x42)));
        assert_eq!(decoder.buffered(), 0);
        assert_eq!(decoder.next_frame(), Ok(None));
    }

    #[test]
    fn test_oversize_plaintext_rejected() {
        let mut decoder = FrameDecoder::new();
        let mut header = vec![INDICATOR_PLAINTEXT];
        encode_varint((MAX_NOISE_MESSAGE_SIZE + 1) as u64, &mut header);
        decoder.extend(&header);
        assert!(matches!(
            decoder.next_frame(),
            Err(FrameError::Oversize { .. })
        ));
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn test_oversize_encrypted_encode_rejected() {
        let payload = vec![0u8; MAX_NOISE_MESSAGE_SIZE + 1];
        assert!(matches!(
            encode_encrypted_frame(&payload),
            Err(FrameError::Oversize { .. })
        ));
    }

    #[test]
    fn test_inner_message_roundtrip() {
        let inner = encode_inner_message(33, &[0x0d, 0x15]);
        let (msg_type, payload) = decode_inner_message(&inner).unwrap();
        assert_eq!(msg_type, 33);
        assert_eq!(payload, [0x0d, 0x15]);
    }

    #[test]
    fn test_inner_message_truncated() {
        assert!(matches!(
            decode_inner_message(&[0x00]),
            Err(FrameError::TruncatedInner(1))
        ));
        // Declared length longer than the body.
        let bad = [0x00, 0x01, 0x00, 0x05, 0xaa];
        assert!(matches!(
            decode_inner_message(&bad),
            Err(FrameError::TruncatedInner(_))
        ));
    }
}
