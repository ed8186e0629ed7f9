//! Adaptive transport negotiation.
//!
//! With a pre-shared key configured the client first attempts the Noise
//! handshake; a closed socket, a plaintext answer or an expired phase timer
//! falls back to a fresh plaintext connection within the same connect
//! cycle. Authentication failures and expectation mismatches are fatal
//! instead, they mean the key or the device identity is wrong.

use log::{debug, error, info};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::client::Config;
use crate::core::{ConnectionError, NoiseError};
use crate::frame::Frame;
use crate::noise::{HandshakeState, Role};

use super::link::Link;

enum Attempt {
    /// Retry with plaintext framing.
    Fallback(String),
    /// Give up and surface the error.
    Fatal(ConnectionError),
}

/// Establish a framed link, negotiating encryption when a key is present.
pub async fn establish(config: &Config) -> Result<Link, ConnectionError> {
    if let Some(psk) = &config.psk {
        match try_noise(config, psk).await {
            Ok(link) => return Ok(link),
            Err(Attempt::Fallback(reason)) => {
                info!("noise attempt failed ({reason}), retrying with plaintext framing");
            }
            Err(Attempt::Fatal(err)) => return Err(err),
        }
    }
    let stream = connect_tcp(config).await?;
    Ok(Link::new(stream))
}

async fn connect_tcp(config: &Config) -> Result<TcpStream, ConnectionError> {
    match TcpStream::connect((config.host.as_str(), config.port)).await {
        Ok(stream) => {
            let _ = stream.set_nodelay(true);
            Ok(stream)
        }
        Err(err) => {
            error!(
                "{} connecting to {}:{}: {err}",
                ConnectionError::classify_io(&err),
                config.host,
                config.port
            );
            Err(ConnectionError::Io(err))
        }
    }
}

async fn try_noise(config: &Config, psk: &[u8]) -> Result<Link, Attempt> {
    let stream = connect_tcp(config).await.map_err(Attempt::Fatal)?;
    let mut link = Link::new(stream);
    match timeout(config.connect_timeout, handshake(&mut link, config, psk)).await {
        Ok(Ok(())) => Ok(link),
        Ok(Err(attempt)) => {
            link.shutdown().await;
            Err(attempt)
        }
        Err(_) => {
            link.shutdown().await;
            Err(Attempt::Fallback("handshake timer elapsed".into()))
        }
    }
}

async fn handshake(link: &mut Link, config: &Config, psk: &[u8]) -> Result<(), Attempt> {
    let mut state = HandshakeState::new(Role::Initiator, psk, &[])
        .map_err(|err| Attempt::Fatal(err.into()))?;

    // Empty envelope: "I want Noise".
    link.send_handshake_frame(&[]).await.map_err(send_failure)?;

    let hello = read_envelope(link).await?;
    let Some((&version, rest)) = hello.split_first() else {
        return Err(Attempt::Fatal(NoiseError::MalformedFrame.into()));
    };
    if version != 1 {
        return Err(Attempt::Fatal(NoiseError::UnsupportedProtocol(version).into()));
    }
    let mut fields = rest.split(|&b| b == 0);
    let server_name = String::from_utf8_lossy(fields.next().unwrap_or_default()).into_owned();
    let server_mac = String::from_utf8_lossy(fields.next().unwrap_or_default()).into_owned();
    debug!("noise hello from {server_name:?} ({server_mac}), protocol {version}");
    if let Some(expected) = &config.expected_server_name {
        if *expected != server_name {
            return Err(Attempt::Fatal(
                NoiseError::ServerNameMismatch {
                    expected: expected.clone(),
                    actual: server_name,
                }
                .into(),
            ));
        }
    }

    let message = state
        .write_message(&[])
        .map_err(|err| Attempt::Fatal(err.into()))?;
    let mut framed = Vec::with_capacity(1 + message.len());
    framed.push(0x00);
    framed.extend_from_slice(&message);
    link.send_handshake_frame(&framed).await.map_err(send_failure)?;

    let reply = read_envelope(link).await?;
    match reply.split_first() {
        Some((0x00, message)) => {
            state.read_message(message).map_err(|err| match err {
                NoiseError::AuthFailed => Attempt::Fatal(ConnectionError::EncryptionKeyInvalid),
                other => Attempt::Fatal(other.into()),
            })?;
            let ciphers = state.split().map_err(|err| Attempt::Fatal(err.into()))?;
            link.install_ciphers(ciphers);
            Ok(())
        }
        Some((0x01, text)) => Err(Attempt::Fatal(
            NoiseError::ServerRejected(String::from_utf8_lossy(text).into_owned()).into(),
        )),
        _ => Err(Attempt::Fatal(NoiseError::MalformedFrame.into())),
    }
}

async fn read_envelope(link: &mut Link) -> Result<Vec<u8>, Attempt> {
    match link.next_frame().await {
        Ok(Frame::Encrypted { payload }) => Ok(payload),
        Ok(Frame::Plaintext { .. }) => {
            Err(Attempt::Fallback("device answered in plaintext".into()))
        }
        Err(ConnectionError::UnexpectedClose) => {
            Err(Attempt::Fallback("connection closed during handshake".into()))
        }
        Err(ConnectionError::Io(err)) => {
            let category = ConnectionError::classify_io(&err);
            Err(Attempt::Fallback(format!("{category}: {err}")))
        }
        Err(other) => Err(Attempt::Fatal(other)),
    }
}

fn send_failure(err: ConnectionError) -> Attempt {
    match err {
        ConnectionError::Io(err) => {
            let category = ConnectionError::classify_io(&err);
            Attempt::Fallback(format!("{category}: {err}"))
        }
        other => Attempt::Fatal(other),
    }
}
