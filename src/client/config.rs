//! Client configuration and builder.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use log::warn;

use crate::core::{DEFAULT_CLIENT_INFO, DEFAULT_CONNECT_TIMEOUT, DEFAULT_PORT, PSK_SIZE};

/// Resolved client configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Device hostname or address.
    pub host: String,
    /// Native API port.
    pub port: u16,
    /// `client_info` string advertised in HelloRequest.
    pub client_info: String,
    /// Decoded 32-byte pre-shared key; `None` runs plaintext-only.
    pub psk: Option<Vec<u8>>,
    /// When set, the name the device announces in its Noise hello must
    /// match exactly.
    pub expected_server_name: Option<String>,
    /// Timer covering each handshake phase and the HELLO round-trip.
    pub connect_timeout: Duration,
}

/// Builder for [`Config`].
#[derive(Clone, Debug)]
pub struct ClientBuilder {
    host: String,
    port: u16,
    client_info: String,
    psk: Option<String>,
    expected_server_name: Option<String>,
    connect_timeout: Duration,
}

impl ClientBuilder {
    /// Start a builder for the given device host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            client_info: DEFAULT_CLIENT_INFO.to_string(),
            psk: None,
            expected_server_name: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Override the native API port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Override the advertised `client_info` string.
    pub fn client_info(mut self, client_info: impl Into<String>) -> Self {
        self.client_info = client_info.into();
        self
    }

    /// Supply the base64-encoded encryption key.
    pub fn psk(mut self, psk_base64: impl Into<String>) -> Self {
        self.psk = Some(psk_base64.into());
        self
    }

    /// Require the device to announce this name during the handshake.
    pub fn expected_server_name(mut self, name: impl Into<String>) -> Self {
        self.expected_server_name = Some(name.into());
        self
    }

    /// Override the connection timer.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Resolve the configuration.
    ///
    /// A key that is not valid base64 or does not decode to exactly 32
    /// bytes is logged and dropped; the client then behaves as if no key
    /// were supplied.
    pub fn build(self) -> Config {
        let psk = self.psk.and_then(|encoded| decode_psk(&encoded));
        Config {
            host: self.host,
            port: self.port,
            client_info: self.client_info,
            psk,
            expected_server_name: self.expected_server_name,
            connect_timeout: self.connect_timeout,
        }
    }
}

fn decode_psk(encoded: &str) -> Option<Vec<u8>> {
    match BASE64.decode(encoded) {
        Ok(raw) if raw.len() == PSK_SIZE => Some(raw),
        Ok(raw) => {
            warn!(
                "encryption key must decode to {PSK_SIZE} bytes, got {}; continuing without encryption",
                raw.len()
            );
            None
        }
        Err(err) => {
            warn!("encryption key is not valid base64 ({err}); continuing without encryption");
            None
        }
    }
}
