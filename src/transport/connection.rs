//! Connection actor.
//!
//! One task owns every piece of mutable protocol state: the socket, the
//! receive buffer, the transport ciphers, discovery accumulation, camera
//! reassembly and the connection timers. The host half talks to it over an
//! unbounded op channel and hears back on the event stream.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info, warn};
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;

use crate::client::{Config, Event, SharedState};
use crate::core::{
    API_VERSION_MAJOR, API_VERSION_MINOR, ConnectionError, MAX_CAMERA_IMAGE_SIZE,
};
use crate::model::EntityInfo;
use crate::protocol::{self, MessageType, voice};
use crate::wire::FieldMap;

use super::link::Link;
use super::negotiate;

/// Host-side requests serviced by the connection task.
#[derive(Debug)]
pub enum Op {
    /// Send one already-encoded message.
    Send {
        /// Message type for the frame header.
        msg_type: MessageType,
        /// Encoded payload.
        payload: Vec<u8>,
    },
    /// Rotate the device's encryption key and report the outcome.
    SetNoiseKey {
        /// New raw 32-byte key.
        key: Vec<u8>,
        /// Resolved when the device answers or the session ends.
        reply: oneshot::Sender<bool>,
    },
    /// Tear the session down without a device round-trip.
    Disconnect,
}

pub(crate) struct Connection {
    config: Arc<Config>,
    shared: Arc<SharedState>,
    events: mpsc::UnboundedSender<Event>,
    ops: mpsc::UnboundedReceiver<Op>,
    discovered: Vec<EntityInfo>,
    camera_frames: HashMap<u32, Vec<u8>>,
    pending_key_set: Option<oneshot::Sender<bool>>,
    close_reason: Option<String>,
}

impl Connection {
    pub(crate) fn new(
        config: Arc<Config>,
        shared: Arc<SharedState>,
        events: mpsc::UnboundedSender<Event>,
        ops: mpsc::UnboundedReceiver<Op>,
    ) -> Self {
        Self {
            config,
            shared,
            events,
            ops,
            discovered: Vec::new(),
            camera_frames: HashMap::new(),
            pending_key_set: None,
            close_reason: None,
        }
    }

    /// Drive one full session: negotiate, log in, dispatch until the end.
    ///
    /// Exactly one `Disconnected` event terminates the stream, whatever the
    /// cause.
    pub(crate) async fn run(mut self) {
        self.shared.reset().await;
        let reason = match self.session().await {
            Ok(()) => self.close_reason.take(),
            Err(err) => Some(err.to_string()),
        };
        if let Some(tx) = self.pending_key_set.take() {
            let _ = tx.send(false);
        }
        self.camera_frames.clear();
        self.shared.set_connected(false);
        if let Some(reason) = &reason {
            warn!("disconnected: {reason}");
        }
        self.emit(Event::Disconnected { reason });
    }

    async fn session(&mut self) -> Result<(), ConnectionError> {
        let mut link = negotiate::establish(&self.config).await?;
        let encrypted = link.is_encrypted();

        timeout(self.config.connect_timeout, self.login(&mut link))
            .await
            .map_err(|_| ConnectionError::Timeout)??;

        self.shared.set_connected(true);
        self.emit(Event::Connected { encrypted });
        link.send_message(MessageType::ListEntitiesRequest, &[])
            .await?;
        link.send_message(MessageType::DeviceInfoRequest, &[]).await?;

        loop {
            tokio::select! {
                message = link.next_message() => {
                    let (msg_type, payload) = message?;
                    if !self.dispatch(&mut link, msg_type, payload).await? {
                        break;
                    }
                }
                op = self.ops.recv() => {
                    let Some(op) = op else {
                        link.shutdown().await;
                        return Ok(());
                    };
                    if matches!(op, Op::Disconnect) {
                        link.shutdown().await;
                        return Ok(());
                    }
                    self.handle_op(&mut link, op).await?;
                }
            }
        }
        link.shutdown().await;
        Ok(())
    }

    /// HELLO then CONNECT, in protocol order.
    async fn login(&mut self, link: &mut Link) -> Result<(), ConnectionError> {
        let hello = protocol::encode_hello_request(&self.config.client_info);
        link.send_message(MessageType::HelloRequest, &hello).await?;
        loop {
            let (raw, payload) = link.next_message().await?;
            if raw != u64::from(MessageType::HelloResponse.wire_id()) {
                debug!("ignoring message type {raw} before hello response");
                continue;
            }
            let map = FieldMap::decode(&payload).unwrap_or_default();
            let hello = protocol::decode_hello_response(&map);
            if hello.api_version_major != API_VERSION_MAJOR {
                return Err(ConnectionError::UnsupportedApiVersion {
                    major: hello.api_version_major,
                    minor: hello.api_version_minor,
                });
            }
            if hello.api_version_minor > API_VERSION_MINOR {
                warn!(
                    "device speaks API 1.{} which is newer than 1.{API_VERSION_MINOR}",
                    hello.api_version_minor
                );
            } else if hello.api_version_minor < API_VERSION_MINOR {
                warn!(
                    "device speaks API 1.{}, running in compatibility mode",
                    hello.api_version_minor
                );
            }
            info!(
                "hello from {:?} ({})",
                hello.name, hello.server_info
            );
            break;
        }

        link.send_message(
            MessageType::ConnectRequest,
            &protocol::encode_connect_request(),
        )
        .await?;
        loop {
            let (raw, payload) = link.next_message().await?;
            if raw != u64::from(MessageType::ConnectResponse.wire_id()) {
                debug!("ignoring message type {raw} before connect response");
                continue;
            }
            let map = FieldMap::decode(&payload).unwrap_or_default();
            if map.bool(1).unwrap_or_default() {
                // Password authentication is out of scope; the flag is only
                // reported.
                warn!("device reports an invalid password");
            }
            return Ok(());
        }
    }

    /// Route one message. Returns `false` when the session should end.
    async fn dispatch(
        &mut self,
        link: &mut Link,
        raw: u64,
        payload: Vec<u8>,
    ) -> Result<bool, ConnectionError> {
        self.emit(Event::Message {
            msg_type: raw,
            payload: payload.clone(),
        });
        let Some(msg_type) = MessageType::from_wire(raw) else {
            debug!("ignoring unknown message type {raw}");
            return Ok(true);
        };
        let map = match FieldMap::decode(&payload) {
            Ok(map) => map,
            Err(err) => {
                warn!("malformed {msg_type:?} payload: {err}");
                return Ok(true);
            }
        };

        use MessageType as M;
        match msg_type {
            M::PingRequest => {
                link.send_message(M::PingResponse, &[]).await?;
                self.emit(Event::Heartbeat);
            }
            M::PingResponse => self.emit(Event::Heartbeat),
            M::DisconnectRequest => {
                let _ = link.send_message(M::DisconnectResponse, &[]).await;
                self.close_reason = Some("device requested disconnect".to_string());
                return Ok(false);
            }
            M::DisconnectResponse => {}
            M::GetTimeRequest => {
                let epoch = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_secs() as u32;
                link.send_message(
                    M::GetTimeResponse,
                    &protocol::encode_get_time_response(epoch),
                )
                .await?;
            }
            M::GetTimeResponse => {
                if let Some(epoch_seconds) = protocol::decode_get_time_response(&map) {
                    self.emit(Event::TimeSync { epoch_seconds });
                }
            }
            M::DeviceInfoResponse => {
                let info = protocol::decode_device_info(&map);
                self.shared.set_device_info(info.clone()).await;
                self.emit(Event::DeviceInfo(info));
            }
            M::ListEntitiesServicesResponse => match protocol::decode_service(&map) {
                Some(service) => {
                    self.shared.register_service(service.clone()).await;
                    self.emit(Event::ServiceDiscovered(service));
                }
                None => warn!("services response missing its key"),
            },
            M::ListEntitiesDoneResponse => {
                let entities = std::mem::take(&mut self.discovered);
                info!("discovered {} entities", entities.len());
                self.emit(Event::Entities(entities));
                let services = self.shared.services().await;
                if !services.is_empty() {
                    self.emit(Event::Services(services));
                }
                link.send_message(M::SubscribeStatesRequest, &[]).await?;
            }
            M::SubscribeLogsResponse => {
                self.emit(Event::Log(protocol::decode_log_entry(&map)));
            }
            M::CameraImageResponse => self.handle_camera(&map).await,
            M::VoiceAssistantRequest => {
                self.emit(Event::VoiceAssistantRequest(voice::decode_request(&map)));
            }
            M::VoiceAssistantAudio => {
                let (data, end) = voice::decode_audio(&map);
                self.emit(Event::VoiceAssistantAudio { data, end });
            }
            M::VoiceAssistantAnnounceFinished => {
                self.emit(Event::VoiceAssistantAnnounceFinished {
                    success: voice::decode_announce_finished(&map),
                });
            }
            M::VoiceAssistantConfigurationResponse => {
                self.emit(Event::VoiceAssistantConfiguration(voice::decode_configuration(
                    &map,
                )));
            }
            M::NoiseEncryptionSetKeyResponse => {
                let success = protocol::decode_noise_set_key_response(&map);
                if let Some(tx) = self.pending_key_set.take() {
                    let _ = tx.send(success);
                }
                self.emit(Event::NoiseKeySet { success });
            }
            other if protocol::list_entity_fields(other).is_some() => {
                match protocol::decode_list_entity(other, &map) {
                    Some(entity) => {
                        self.shared.register_entity(entity.clone()).await;
                        self.discovered.push(entity);
                    }
                    None => warn!("{other:?} missing its entity key"),
                }
            }
            other => match protocol::decode_state(other, &map) {
                Some(mut telemetry) => {
                    if let Some(entity) = self.shared.entity_by_key(telemetry.key).await {
                        telemetry.entity_id = Some(entity.entity_id());
                        if telemetry.device_id.is_none() {
                            telemetry.device_id = entity.device_id;
                        }
                    }
                    self.emit(Event::Telemetry(telemetry));
                }
                None => debug!("no handler for {other:?}"),
            },
        }
        Ok(true)
    }

    /// Accumulate camera image chunks until the `done` marker.
    async fn handle_camera(&mut self, map: &FieldMap) {
        let Some(chunk) = protocol::decode_camera_chunk(map) else {
            warn!("camera image response missing its key");
            return;
        };
        let buffer = self.camera_frames.entry(chunk.key).or_default();
        if buffer.len() + chunk.data.len() > MAX_CAMERA_IMAGE_SIZE {
            warn!(
                "camera image for key {} exceeds {MAX_CAMERA_IMAGE_SIZE} bytes, dropping",
                chunk.key
            );
            self.camera_frames.remove(&chunk.key);
            return;
        }
        buffer.extend_from_slice(&chunk.data);
        if chunk.done {
            let image = self.camera_frames.remove(&chunk.key).unwrap_or_default();
            let entity_id = self
                .shared
                .entity_by_key(chunk.key)
                .await
                .map(|entity| entity.entity_id());
            self.emit(Event::Camera {
                key: chunk.key,
                entity_id,
                image,
            });
        }
    }

    async fn handle_op(&mut self, link: &mut Link, op: Op) -> Result<(), ConnectionError> {
        match op {
            Op::Send { msg_type, payload } => link.send_message(msg_type, &payload).await,
            Op::SetNoiseKey { key, reply } => {
                if let Some(stale) = self.pending_key_set.replace(reply) {
                    let _ = stale.send(false);
                }
                link.send_message(
                    MessageType::NoiseEncryptionSetKeyRequest,
                    &protocol::encode_noise_set_key(&key),
                )
                .await
            }
            Op::Disconnect => Ok(()),
        }
    }

    fn emit(&self, event: Event) {
        let _ = self.events.send(event);
    }
}
