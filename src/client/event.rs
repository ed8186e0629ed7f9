//! Events emitted to the host.

use tokio::sync::mpsc;

use crate::model::{DeviceInfo, EntityInfo, ServiceInfo};
use crate::protocol::{
    LogEntry, Telemetry, VoiceAssistantConfiguration, VoiceAssistantRequest,
};

/// Everything the client reports back to the host, as one tagged stream.
///
/// Telemetry arrives as the full tagged union; per-family projections are a
/// `match` away on [`Telemetry::state`].
#[derive(Debug)]
#[non_exhaustive]
pub enum Event {
    /// Session established; HELLO and CONNECT both answered.
    Connected {
        /// Whether the session runs over the Noise transport.
        encrypted: bool,
    },
    /// Session ended. Always the final event of a session.
    Disconnected {
        /// Classified reason, `None` for a host-requested disconnect.
        reason: Option<String>,
    },
    /// Raw view of every received message, before typed dispatch.
    Message {
        /// Wire message type.
        msg_type: u64,
        /// Undecoded payload.
        payload: Vec<u8>,
    },
    /// Device metadata answered to DeviceInfoRequest.
    DeviceInfo(DeviceInfo),
    /// Entity enumeration finished; the full discovered list.
    Entities(Vec<EntityInfo>),
    /// Service enumeration finished; emitted only when services exist.
    Services(Vec<ServiceInfo>),
    /// One user-defined service announced during enumeration.
    ServiceDiscovered(ServiceInfo),
    /// One state update.
    Telemetry(Telemetry),
    /// One device log line.
    Log(LogEntry),
    /// One fully reassembled camera image.
    Camera {
        /// Camera entity key.
        key: u32,
        /// Derived string id, when the key is known.
        entity_id: Option<String>,
        /// Complete image bytes.
        image: Vec<u8>,
    },
    /// A ping in either direction completed.
    Heartbeat,
    /// Device-sourced time response.
    TimeSync {
        /// Seconds since the Unix epoch.
        epoch_seconds: u32,
    },
    /// Device asked for a voice assistant pipeline run.
    VoiceAssistantRequest(VoiceAssistantRequest),
    /// Voice audio from the device.
    VoiceAssistantAudio {
        /// Audio samples.
        data: Vec<u8>,
        /// True on the final chunk.
        end: bool,
    },
    /// Device finished playing an announcement.
    VoiceAssistantAnnounceFinished {
        /// Whether playback succeeded.
        success: bool,
    },
    /// Device's voice assistant configuration.
    VoiceAssistantConfiguration(VoiceAssistantConfiguration),
    /// Result of a runtime encryption key rotation.
    NoiseKeySet {
        /// Whether the device accepted the new key.
        success: bool,
    },
}

/// Receiving half of the event stream.
pub struct EventStream {
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventStream {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<Event>) -> Self {
        Self { rx }
    }

    /// Receive the next event. Returns `None` once the client is dropped.
    pub async fn recv(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Take an event if one is already queued.
    pub fn try_recv(&mut self) -> Option<Event> {
        self.rx.try_recv().ok()
    }
}
