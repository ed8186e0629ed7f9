//! # esphome-client
//!
//! Client for the ESPHome native API: the binary, length-framed control
//! protocol ESPHome devices speak on TCP port 6053. It provides:
//!
//! - **Security**: an optional `Noise_NNpsk0_25519_ChaChaPoly_SHA256`
//!   channel, implemented from scratch, with plaintext fallback when the
//!   device does not speak it
//! - **Discovery**: entity and service enumeration into a queryable
//!   registry with stable string ids
//! - **Telemetry**: typed state updates for every entity family, plus the
//!   log, camera and voice assistant side-channels
//! - **Control**: typed command encoders for every controllable family
//!
//! ## Modules
//!
//! - [`core`]: Protocol constants and error types
//! - [`wire`]: Protobuf-compatible varint/TLV primitives
//! - [`frame`]: Plaintext and encrypted framing over one TCP stream
//! - [`noise`]: `CipherState`/`SymmetricState`/`HandshakeState` for NNpsk0
//! - [`model`]: Entities, services, device metadata, registry
//! - [`protocol`]: Message registry, telemetry decoders, command encoders
//! - [`transport`]: Framed link, adaptive negotiation, connection actor
//! - [`client`]: The host-facing [`Client`] handle and event stream
//!
//! ## Example Usage
//!
//! ```no_run
//! use esphome_client::prelude::*;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ClientBuilder::new("garage.local")
//!         .psk("bHVtaW5vdXMtYmVpbmdzLWFyZS13ZS1ub3QtdGhpcw==")
//!         .build();
//!     let (client, mut events) = Client::new(config);
//!     client.connect().await.expect("session already running");
//!
//!     while let Some(event) = events.recv().await {
//!         match event {
//!             Event::Connected { encrypted } => {
//!                 println!("connected (encrypted: {encrypted})");
//!             }
//!             Event::Telemetry(telemetry) => {
//!                 println!("{:?} -> {:?}", telemetry.entity_id, telemetry.state);
//!             }
//!             Event::Disconnected { reason } => {
//!                 println!("disconnected: {reason:?}");
//!                 break;
//!             }
//!             _ => {}
//!         }
//!     }
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod client;
pub mod core;
pub mod frame;
pub mod model;
pub mod noise;
pub mod protocol;
pub mod transport;
pub mod wire;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::client::{Client, ClientBuilder, Config, Event, EventStream};
    pub use crate::core::{ClientError, ConnectionError, FrameError, NoiseError, WireError};
    pub use crate::model::{
        DeviceInfo, EntityInfo, EntityKind, LogLevel, ServiceArg, ServiceArgType, ServiceInfo,
    };
    pub use crate::protocol::{
        ClimateCommand, CoverCommand, FanCommand, LightCommand, MediaPlayerCommand,
        ServiceArgValue, SirenCommand, StateUpdate, Telemetry, ValveCommand,
    };
}

// Re-export commonly used items at crate root
pub use client::{Client, ClientBuilder, Config, Event, EventStream};
pub use core::{ClientError, ConnectionError};
pub use model::{DeviceInfo, EntityInfo, EntityKind, LogLevel, ServiceInfo};
pub use protocol::{StateUpdate, Telemetry};
