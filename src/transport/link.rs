//! Framed TCP link, optionally running through the Noise transport
//! ciphers.
//!
//! A [`Link`] starts plaintext; once the handshake splits, the transport
//! ciphers are installed and every message rides inside an encrypted frame
//! with the inner `(type, length)` header. Framing errors drop the receive
//! buffer and reading continues; decryption failures are fatal.

use log::error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::core::ConnectionError;
use crate::frame::{
    Frame, FrameDecoder, decode_inner_message, encode_encrypted_frame, encode_inner_message,
    encode_plaintext_frame,
};
use crate::noise::TransportCiphers;
use crate::protocol::MessageType;

const READ_CHUNK: usize = 4096;

/// One framed connection to a device.
pub struct Link {
    stream: TcpStream,
    decoder: FrameDecoder,
    ciphers: Option<TransportCiphers>,
}

impl Link {
    /// Wrap a connected TCP stream; plaintext until ciphers are installed.
    pub fn new(stream: TcpStream) -> Self {
        Self {
            stream,
            decoder: FrameDecoder::new(),
            ciphers: None,
        }
    }

    /// Whether the Noise transport is active.
    pub fn is_encrypted(&self) -> bool {
        self.ciphers.is_some()
    }

    /// Install the transport ciphers produced by a completed handshake.
    pub fn install_ciphers(&mut self, ciphers: TransportCiphers) {
        self.ciphers = Some(ciphers);
    }

    /// Send one protocol message in whichever framing is active.
    pub async fn send_message(
        &mut self,
        msg_type: MessageType,
        payload: &[u8],
    ) -> Result<(), ConnectionError> {
        let frame = match &mut self.ciphers {
            Some(ciphers) => {
                let inner = encode_inner_message(msg_type.wire_id(), payload);
                let ciphertext = ciphers.send.encrypt_with_ad(&[], &inner)?;
                encode_encrypted_frame(&ciphertext)?
            }
            None => encode_plaintext_frame(u64::from(msg_type.wire_id()), payload),
        };
        self.stream.write_all(&frame).await?;
        Ok(())
    }

    /// Send a raw handshake envelope (encrypted framing, no cipher).
    pub async fn send_handshake_frame(&mut self, payload: &[u8]) -> Result<(), ConnectionError> {
        let frame = encode_encrypted_frame(payload)?;
        self.stream.write_all(&frame).await?;
        Ok(())
    }

    /// Read the next complete frame, before ciphers are installed.
    ///
    /// Used by the handshake driver, which needs to see envelopes rather
    /// than decoded messages.
    pub async fn next_frame(&mut self) -> Result<Frame, ConnectionError> {
        loop {
            match self.decoder.next_frame() {
                Ok(Some(frame)) => return Ok(frame),
                Ok(None) => self.fill().await?,
                Err(err) => {
                    error!("framing error: {err}, dropping receive buffer");
                }
            }
        }
    }

    /// Read the next complete protocol message as `(wire type, payload)`.
    pub async fn next_message(&mut self) -> Result<(u64, Vec<u8>), ConnectionError> {
        loop {
            match self.decoder.next_frame() {
                Ok(Some(Frame::Plaintext { msg_type, payload })) => {
                    return Ok((msg_type, payload));
                }
                Ok(Some(Frame::Encrypted { payload })) => match &mut self.ciphers {
                    Some(ciphers) => {
                        let plaintext = ciphers
                            .recv
                            .decrypt_with_ad(&[], &payload)
                            .map_err(|_| ConnectionError::EncryptionFailure)?;
                        let (msg_type, body) = decode_inner_message(&plaintext)?;
                        return Ok((u64::from(msg_type), body));
                    }
                    None => return Err(ConnectionError::EncryptionKeyMissing),
                },
                Ok(None) => self.fill().await?,
                Err(err) => {
                    // Resynchronize without disconnecting; the decoder has
                    // already dropped its buffer.
                    error!("framing error: {err}, dropping receive buffer");
                }
            }
        }
    }

    async fn fill(&mut self) -> Result<(), ConnectionError> {
        let mut chunk = [0u8; READ_CHUNK];
        let n = self.stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(ConnectionError::UnexpectedClose);
        }
        self.decoder.extend(&chunk[..n]);
        Ok(())
    }

    /// Shut down the TCP stream. Errors are ignored, the session is over
    /// either way.
    pub async fn shutdown(&mut self) {
        let _ = self.stream.shutdown().await;
    }
}
