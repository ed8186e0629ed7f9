//! High-level client API.
//!
//! [`Client`] is the host-facing handle. It spawns one connection task per
//! `connect()` and talks to it over an op channel; everything the device
//! reports comes back on the [`EventStream`]. Registry lookups read shared
//! state the connection task maintains, so they answer without a device
//! round-trip.

mod config;
mod event;

pub use config::{ClientBuilder, Config};
pub use event::{Event, EventStream};

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use log::warn;
use tokio::sync::{Mutex, RwLock, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::core::{ClientError, NOISE_KEY_SET_TIMEOUT, PSK_SIZE};
use crate::model::{DeviceInfo, EntityInfo, EntityRegistry, LogLevel, ServiceInfo};
use crate::protocol::{
    ClimateCommand, CoverCommand, FanCommand, LightCommand, MediaPlayerCommand, MessageType,
    ServiceArgValue, SirenCommand, ValveCommand, command, voice,
};
use crate::protocol::{
    encode_camera_image_request, encode_subscribe_logs,
};
use crate::transport::{Connection, Op};

/// State shared between the host handle and the connection task.
pub(crate) struct SharedState {
    registry: RwLock<EntityRegistry>,
    device_info: RwLock<Option<DeviceInfo>>,
    connected: AtomicBool,
}

impl SharedState {
    fn new() -> Self {
        Self {
            registry: RwLock::new(EntityRegistry::new()),
            device_info: RwLock::new(None),
            connected: AtomicBool::new(false),
        }
    }

    /// Discard everything from the previous session.
    pub(crate) async fn reset(&self) {
        self.registry.write().await.clear();
        *self.device_info.write().await = None;
    }

    pub(crate) fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub(crate) async fn register_entity(&self, entity: EntityInfo) {
        self.registry.write().await.register(entity);
    }

    pub(crate) async fn register_service(&self, service: ServiceInfo) {
        self.registry.write().await.register_service(service);
    }

    pub(crate) async fn entity_by_key(&self, key: u32) -> Option<EntityInfo> {
        self.registry.read().await.entity_by_key(key).cloned()
    }

    pub(crate) async fn entity_by_id(&self, entity_id: &str) -> Option<EntityInfo> {
        self.registry.read().await.entity_by_id(entity_id).cloned()
    }

    pub(crate) async fn services(&self) -> Vec<ServiceInfo> {
        self.registry.read().await.services().to_vec()
    }

    pub(crate) async fn set_device_info(&self, info: DeviceInfo) {
        *self.device_info.write().await = Some(info);
    }
}

/// A client for one device. One client, one device, one session at a time.
pub struct Client {
    config: Arc<Config>,
    shared: Arc<SharedState>,
    events: mpsc::UnboundedSender<Event>,
    ops: Mutex<Option<mpsc::UnboundedSender<Op>>>,
    session: Mutex<Option<JoinHandle<()>>>,
}

impl Client {
    /// Create a client and the event stream it reports on.
    pub fn new(config: Config) -> (Self, EventStream) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let client = Self {
            config: Arc::new(config),
            shared: Arc::new(SharedState::new()),
            events: events_tx,
            ops: Mutex::new(None),
            session: Mutex::new(None),
        };
        (client, EventStream::new(events_rx))
    }

    /// Open a session to the device.
    ///
    /// Returns as soon as the connection task is running; progress and
    /// failures surface on the event stream (`Connected`, `Disconnected`
    /// with a classified reason). Connecting again after a disconnect fully
    /// re-initializes state.
    pub async fn connect(&self) -> Result<(), ClientError> {
        let mut session = self.session.lock().await;
        if session.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return Err(ClientError::AlreadyConnected);
        }
        let (ops_tx, ops_rx) = mpsc::unbounded_channel();
        *self.ops.lock().await = Some(ops_tx);
        let connection = Connection::new(
            Arc::clone(&self.config),
            Arc::clone(&self.shared),
            self.events.clone(),
            ops_rx,
        );
        *session = Some(tokio::spawn(connection.run()));
        Ok(())
    }

    /// Tear the session down.
    ///
    /// Cancels timers, closes the socket, releases cipher states and clears
    /// reassembly buffers; the stream ends with one `Disconnected` event.
    /// A no-op when no session is running.
    pub async fn disconnect(&self) {
        if let Some(ops) = self.ops.lock().await.take() {
            let _ = ops.send(Op::Disconnect);
        }
        if let Some(handle) = self.session.lock().await.take() {
            let _ = handle.await;
        }
    }

    /// Whether a session is established (HELLO and CONNECT both answered).
    pub fn is_connected(&self) -> bool {
        self.shared.is_connected()
    }

    async fn send_raw(&self, msg_type: MessageType, payload: Vec<u8>) {
        let guard = self.ops.lock().await;
        let sent = guard
            .as_ref()
            .is_some_and(|ops| ops.send(Op::Send { msg_type, payload }).is_ok());
        if !sent {
            warn!("not connected, dropping {msg_type:?}");
        }
    }

    /// Resolve a command target, logging and skipping unknown ids.
    async fn command_target(&self, entity_id: &str) -> Option<(u32, Option<u32>)> {
        match self.shared.entity_by_id(entity_id).await {
            Some(entity) => Some((entity.key, entity.device_id)),
            None => {
                warn!("unknown entity id {entity_id:?}, command skipped");
                None
            }
        }
    }

    /// Send a ping; the answering pong surfaces as a `Heartbeat` event.
    pub async fn send_ping(&self) {
        self.send_raw(MessageType::PingRequest, Vec::new()).await;
    }

    /// Rotate the device's Noise encryption key.
    ///
    /// Returns `true` once the device confirms the new key. A key that does
    /// not decode to 32 bytes fails immediately without touching the wire;
    /// no answer within five seconds fails too.
    pub async fn set_noise_encryption_key(&self, psk_base64: &str) -> bool {
        let raw = match BASE64.decode(psk_base64) {
            Ok(raw) if raw.len() == PSK_SIZE => raw,
            Ok(raw) => {
                warn!("new encryption key must be {PSK_SIZE} bytes, got {}", raw.len());
                return false;
            }
            Err(err) => {
                warn!("new encryption key is not valid base64: {err}");
                return false;
            }
        };
        let (reply_tx, reply_rx) = oneshot::channel();
        {
            let guard = self.ops.lock().await;
            let Some(ops) = guard.as_ref() else {
                warn!("not connected, cannot set encryption key");
                return false;
            };
            if ops
                .send(Op::SetNoiseKey {
                    key: raw,
                    reply: reply_tx,
                })
                .is_err()
            {
                warn!("not connected, cannot set encryption key");
                return false;
            }
        }
        matches!(timeout(NOISE_KEY_SET_TIMEOUT, reply_rx).await, Ok(Ok(true)))
    }

    // -------------------------------------------------------------------------
    // Commands
    // -------------------------------------------------------------------------

    /// Turn a switch on or off.
    pub async fn send_switch_command(&self, entity_id: &str, state: bool) {
        let Some((key, device_id)) = self.command_target(entity_id).await else {
            return;
        };
        self.send_raw(
            MessageType::SwitchCommandRequest,
            command::switch(key, device_id, state),
        )
        .await;
    }

    /// Press a button.
    pub async fn send_button_command(&self, entity_id: &str) {
        let Some((key, device_id)) = self.command_target(entity_id).await else {
            return;
        };
        self.send_raw(
            MessageType::ButtonCommandRequest,
            command::button(key, device_id),
        )
        .await;
    }

    /// Set a number entity.
    pub async fn send_number_command(&self, entity_id: &str, state: f32) {
        let Some((key, device_id)) = self.command_target(entity_id).await else {
            return;
        };
        self.send_raw(
            MessageType::NumberCommandRequest,
            command::number(key, device_id, state),
        )
        .await;
    }

    /// Choose a select option.
    pub async fn send_select_command(&self, entity_id: &str, option: &str) {
        let Some((key, device_id)) = self.command_target(entity_id).await else {
            return;
        };
        self.send_raw(
            MessageType::SelectCommandRequest,
            command::select(key, device_id, option),
        )
        .await;
    }

    /// Set a text entity.
    pub async fn send_text_command(&self, entity_id: &str, state: &str) {
        let Some((key, device_id)) = self.command_target(entity_id).await else {
            return;
        };
        self.send_raw(
            MessageType::TextCommandRequest,
            command::text(key, device_id, state),
        )
        .await;
    }

    /// Set a date entity.
    pub async fn send_date_command(&self, entity_id: &str, year: u32, month: u32, day: u32) {
        let Some((key, device_id)) = self.command_target(entity_id).await else {
            return;
        };
        self.send_raw(
            MessageType::DateCommandRequest,
            command::date(key, device_id, year, month, day),
        )
        .await;
    }

    /// Set a time entity.
    pub async fn send_time_command(&self, entity_id: &str, hour: u32, minute: u32, second: u32) {
        let Some((key, device_id)) = self.command_target(entity_id).await else {
            return;
        };
        self.send_raw(
            MessageType::TimeCommandRequest,
            command::time(key, device_id, hour, minute, second),
        )
        .await;
    }

    /// Set a datetime entity from epoch seconds.
    pub async fn send_datetime_command(&self, entity_id: &str, epoch_seconds: u32) {
        let Some((key, device_id)) = self.command_target(entity_id).await else {
            return;
        };
        self.send_raw(
            MessageType::DateTimeCommandRequest,
            command::datetime(key, device_id, epoch_seconds),
        )
        .await;
    }

    /// Operate a lock (wire enum: 0 unlock, 1 lock, 2 open).
    pub async fn send_lock_command(&self, entity_id: &str, lock_command: u32, code: Option<&str>) {
        let Some((key, device_id)) = self.command_target(entity_id).await else {
            return;
        };
        self.send_raw(
            MessageType::LockCommandRequest,
            command::lock(key, device_id, lock_command, code),
        )
        .await;
    }

    /// Operate an alarm control panel.
    pub async fn send_alarm_control_panel_command(
        &self,
        entity_id: &str,
        panel_command: u32,
        code: Option<&str>,
    ) {
        let Some((key, device_id)) = self.command_target(entity_id).await else {
            return;
        };
        self.send_raw(
            MessageType::AlarmControlPanelCommandRequest,
            command::alarm_control_panel(key, device_id, panel_command, code),
        )
        .await;
    }

    /// Operate an update slot (wire enum: 0 none, 1 install, 2 check).
    pub async fn send_update_command(&self, entity_id: &str, update_command: u32) {
        let Some((key, device_id)) = self.command_target(entity_id).await else {
            return;
        };
        self.send_raw(
            MessageType::UpdateCommandRequest,
            command::update(key, device_id, update_command),
        )
        .await;
    }

    /// Operate a cover. At least one option must be set.
    pub async fn send_cover_command(&self, entity_id: &str, cmd: &CoverCommand) {
        let Some((key, device_id)) = self.command_target(entity_id).await else {
            return;
        };
        match command::cover(key, device_id, cmd) {
            Ok(payload) => self.send_raw(MessageType::CoverCommandRequest, payload).await,
            Err(err) => warn!("{err}"),
        }
    }

    /// Operate a valve. At least one option must be set.
    pub async fn send_valve_command(&self, entity_id: &str, cmd: &ValveCommand) {
        let Some((key, device_id)) = self.command_target(entity_id).await else {
            return;
        };
        match command::valve(key, device_id, cmd) {
            Ok(payload) => self.send_raw(MessageType::ValveCommandRequest, payload).await,
            Err(err) => warn!("{err}"),
        }
    }

    /// Operate a fan. At least one option must be set.
    pub async fn send_fan_command(&self, entity_id: &str, cmd: &FanCommand) {
        let Some((key, device_id)) = self.command_target(entity_id).await else {
            return;
        };
        match command::fan(key, device_id, cmd) {
            Ok(payload) => self.send_raw(MessageType::FanCommandRequest, payload).await,
            Err(err) => warn!("{err}"),
        }
    }

    /// Operate a light.
    pub async fn send_light_command(&self, entity_id: &str, cmd: &LightCommand) {
        let Some((key, device_id)) = self.command_target(entity_id).await else {
            return;
        };
        self.send_raw(
            MessageType::LightCommandRequest,
            command::light(key, device_id, cmd),
        )
        .await;
    }

    /// Operate a climate unit. At least one option must be set.
    pub async fn send_climate_command(&self, entity_id: &str, cmd: &ClimateCommand) {
        let Some((key, device_id)) = self.command_target(entity_id).await else {
            return;
        };
        match command::climate(key, device_id, cmd) {
            Ok(payload) => {
                self.send_raw(MessageType::ClimateCommandRequest, payload)
                    .await
            }
            Err(err) => warn!("{err}"),
        }
    }

    /// Operate a siren. At least one option must be set.
    pub async fn send_siren_command(&self, entity_id: &str, cmd: &SirenCommand) {
        let Some((key, device_id)) = self.command_target(entity_id).await else {
            return;
        };
        match command::siren(key, device_id, cmd) {
            Ok(payload) => self.send_raw(MessageType::SirenCommandRequest, payload).await,
            Err(err) => warn!("{err}"),
        }
    }

    /// Operate a media player. At least one option must be set.
    pub async fn send_media_player_command(&self, entity_id: &str, cmd: &MediaPlayerCommand) {
        let Some((key, device_id)) = self.command_target(entity_id).await else {
            return;
        };
        match command::media_player(key, device_id, cmd) {
            Ok(payload) => {
                self.send_raw(MessageType::MediaPlayerCommandRequest, payload)
                    .await
            }
            Err(err) => warn!("{err}"),
        }
    }

    /// Call a user-defined service by name.
    pub async fn execute_service(&self, name: &str, args: &[ServiceArgValue]) {
        let service = self.shared.registry.read().await.service_by_name(name).cloned();
        match service {
            Some(service) => {
                self.send_raw(
                    MessageType::ExecuteServiceRequest,
                    command::execute_service(&service, args),
                )
                .await
            }
            None => warn!("unknown service {name:?}, call skipped"),
        }
    }

    /// Call a user-defined service by wire key.
    pub async fn execute_service_by_key(&self, key: u32, args: &[ServiceArgValue]) {
        let service = self.shared.registry.read().await.service_by_key(key).cloned();
        match service {
            Some(service) => {
                self.send_raw(
                    MessageType::ExecuteServiceRequest,
                    command::execute_service(&service, args),
                )
                .await
            }
            None => warn!("unknown service key {key}, call skipped"),
        }
    }

    // -------------------------------------------------------------------------
    // Side channels
    // -------------------------------------------------------------------------

    /// Subscribe to device logs at the given level.
    pub async fn subscribe_logs(&self, level: LogLevel, dump_config: bool) {
        self.send_raw(
            MessageType::SubscribeLogsRequest,
            encode_subscribe_logs(level, dump_config),
        )
        .await;
    }

    /// Request a camera image: a single shot, a stream, or both.
    pub async fn request_camera_image(&self, single: bool, stream: bool) {
        self.send_raw(
            MessageType::CameraImageRequest,
            encode_camera_image_request(single, stream),
        )
        .await;
    }

    /// Offer this client as the device's voice assistant pipeline.
    pub async fn subscribe_voice_assistant(&self, flags: u32) {
        self.send_raw(
            MessageType::SubscribeVoiceAssistantRequest,
            voice::encode_subscribe(true, flags),
        )
        .await;
    }

    /// Withdraw the voice assistant subscription.
    pub async fn unsubscribe_voice_assistant(&self) {
        self.send_raw(
            MessageType::SubscribeVoiceAssistantRequest,
            voice::encode_subscribe(false, 0),
        )
        .await;
    }

    /// Ask for the device's voice assistant configuration.
    pub async fn request_voice_assistant_configuration(&self) {
        self.send_raw(
            MessageType::VoiceAssistantConfigurationRequest,
            Vec::new(),
        )
        .await;
    }

    /// Change the set of active wake words.
    pub async fn set_voice_assistant_configuration(&self, active_wake_words: &[String]) {
        self.send_raw(
            MessageType::VoiceAssistantSetConfiguration,
            voice::encode_set_configuration(active_wake_words),
        )
        .await;
    }

    /// Answer a pipeline run request.
    pub async fn send_voice_assistant_response(&self, port: u32, error: bool) {
        self.send_raw(
            MessageType::VoiceAssistantResponse,
            voice::encode_response(port, error),
        )
        .await;
    }

    /// Report pipeline progress.
    pub async fn send_voice_assistant_event(&self, event_type: u32, data: &[(String, String)]) {
        self.send_raw(
            MessageType::VoiceAssistantEventResponse,
            voice::encode_event(event_type, data),
        )
        .await;
    }

    /// Stream voice audio to the device.
    pub async fn send_voice_assistant_audio(&self, data: &[u8], end: bool) {
        self.send_raw(
            MessageType::VoiceAssistantAudio,
            voice::encode_audio(data, end),
        )
        .await;
    }

    /// Report a timer event to the device.
    pub async fn send_voice_assistant_timer_event(
        &self,
        event_type: u32,
        timer_id: &str,
        name: &str,
        total_seconds: u32,
        seconds_left: u32,
        is_active: bool,
    ) {
        self.send_raw(
            MessageType::VoiceAssistantTimerEventResponse,
            voice::encode_timer_event(
                event_type,
                timer_id,
                name,
                total_seconds,
                seconds_left,
                is_active,
            ),
        )
        .await;
    }

    /// Ask the device to play an announcement.
    pub async fn send_voice_assistant_announce(
        &self,
        media_id: &str,
        text: &str,
        preannounce_media_id: &str,
        start_conversation: bool,
    ) {
        self.send_raw(
            MessageType::VoiceAssistantAnnounceRequest,
            voice::encode_announce(media_id, text, preannounce_media_id, start_conversation),
        )
        .await;
    }

    // -------------------------------------------------------------------------
    // Lookups
    // -------------------------------------------------------------------------

    /// Whether a string id resolves to a discovered entity.
    pub async fn has_entity(&self, entity_id: &str) -> bool {
        self.shared.registry.read().await.has_entity(entity_id)
    }

    /// Wire key for a string id.
    pub async fn entity_key(&self, entity_id: &str) -> Option<u32> {
        self.shared.registry.read().await.key_for_id(entity_id)
    }

    /// Full entity record for a string id.
    pub async fn entity_by_id(&self, entity_id: &str) -> Option<EntityInfo> {
        self.shared.entity_by_id(entity_id).await
    }

    /// All discovered entities, in discovery order.
    pub async fn entities(&self) -> Vec<EntityInfo> {
        self.shared.registry.read().await.entities()
    }

    /// Available string ids grouped by family prefix.
    pub async fn entity_ids_by_kind(&self) -> BTreeMap<String, Vec<String>> {
        self.shared.registry.read().await.ids_by_kind()
    }

    /// All discovered services.
    pub async fn services(&self) -> Vec<ServiceInfo> {
        self.shared.services().await
    }

    /// Device metadata, once DeviceInfoResponse has arrived.
    pub async fn device_info(&self) -> Option<DeviceInfo> {
        self.shared.device_info.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntityKind;
    use tokio::sync::mpsc::error::TryRecvError;

    fn test_client() -> (Client, EventStream) {
        Client::new(ClientBuilder::new("127.0.0.1").build())
    }

    /// Install an op channel without a running session, so tests can assert
    /// what would hit the wire.
    async fn install_ops(client: &Client) -> mpsc::UnboundedReceiver<Op> {
        let (tx, rx) = mpsc::unbounded_channel();
        *client.ops.lock().await = Some(tx);
        rx
    }

    #[tokio::test]
    async fn test_command_with_unknown_id_sends_nothing() {
        let (client, _events) = test_client();
        let mut ops = install_ops(&client).await;

        client.send_switch_command("switch-unknown", true).await;

        assert!(matches!(ops.try_recv(), Err(TryRecvError::Empty)));
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn test_command_with_known_id_sends_payload() {
        let (client, _events) = test_client();
        let mut ops = install_ops(&client).await;
        client
            .shared
            .register_entity(EntityInfo {
                key: 42,
                kind: EntityKind::Switch,
                object_id: "relay".into(),
                name: "Relay".into(),
                device_id: Some(7),
            })
            .await;

        client.send_switch_command("switch-relay", true).await;

        match ops.try_recv() {
            Ok(Op::Send { msg_type, payload }) => {
                assert_eq!(msg_type, MessageType::SwitchCommandRequest);
                let map = crate::wire::FieldMap::decode(&payload).unwrap();
                assert_eq!(map.fixed32(1), Some(42));
                assert_eq!(map.bool(2), Some(true));
                assert_eq!(map.u32(3), Some(7));
            }
            other => panic!("expected a send op, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_command_with_no_options_sends_nothing() {
        let (client, _events) = test_client();
        let mut ops = install_ops(&client).await;
        client
            .shared
            .register_entity(EntityInfo {
                key: 1,
                kind: EntityKind::Cover,
                object_id: "blind".into(),
                name: "Blind".into(),
                device_id: None,
            })
            .await;

        client
            .send_cover_command("cover-blind", &CoverCommand::default())
            .await;

        assert!(matches!(ops.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_set_noise_key_rejects_bad_length_without_send() {
        let (client, _events) = test_client();
        let mut ops = install_ops(&client).await;

        let short = BASE64.encode([0u8; 16]);
        assert!(!client.set_noise_encryption_key(&short).await);
        assert!(!client.set_noise_encryption_key("not base64!!!").await);
        assert!(matches!(ops.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_lookups_on_empty_registry() {
        let (client, _events) = test_client();
        assert!(!client.has_entity("switch-x").await);
        assert!(client.entity_key("switch-x").await.is_none());
        assert!(client.entities().await.is_empty());
        assert!(client.services().await.is_empty());
        assert!(client.device_info().await.is_none());
        assert!(client.entity_ids_by_kind().await.is_empty());
    }

    #[tokio::test]
    async fn test_disconnect_without_session_is_noop() {
        let (client, _events) = test_client();
        client.disconnect().await;
        client.disconnect().await;
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn test_execute_service_by_name() {
        let (client, _events) = test_client();
        let mut ops = install_ops(&client).await;
        client
            .shared
            .register_service(ServiceInfo {
                key: 12,
                name: "restart".into(),
                args: vec![],
            })
            .await;

        client.execute_service("restart", &[]).await;
        match ops.try_recv() {
            Ok(Op::Send { msg_type, payload }) => {
                assert_eq!(msg_type, MessageType::ExecuteServiceRequest);
                let map = crate::wire::FieldMap::decode(&payload).unwrap();
                assert_eq!(map.fixed32(1), Some(12));
            }
            other => panic!("expected a send op, got {other:?}"),
        }

        client.execute_service("missing", &[]).await;
        assert!(matches!(ops.try_recv(), Err(TryRecvError::Empty)));
    }
}
