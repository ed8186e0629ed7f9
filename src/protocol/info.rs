//! Codecs for the session control messages: hello, device info, time,
//! logs, camera and the runtime key rotation.

use crate::core::{API_VERSION_MAJOR, API_VERSION_MINOR};
use crate::model::{DeviceInfo, LogLevel};
use crate::wire::{FieldMap, MessageBuilder};

/// HelloRequest: `client_info = 1`, `api_version_major = 2`,
/// `api_version_minor = 3`.
pub fn encode_hello_request(client_info: &str) -> Vec<u8> {
    MessageBuilder::new()
        .string(1, client_info)
        .varint(2, u64::from(API_VERSION_MAJOR))
        .varint(3, u64::from(API_VERSION_MINOR))
        .finish()
}

/// Decoded HelloResponse.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HelloResponse {
    /// Device's major API version.
    pub api_version_major: u32,
    /// Device's minor API version.
    pub api_version_minor: u32,
    /// Free-form server description.
    pub server_info: String,
    /// Node name.
    pub name: String,
}

/// HelloResponse: `api_version_major = 1`, `api_version_minor = 2`,
/// `server_info = 3`, `name = 4`.
pub fn decode_hello_response(map: &FieldMap) -> HelloResponse {
    HelloResponse {
        api_version_major: map.u32(1).unwrap_or_default(),
        api_version_minor: map.u32(2).unwrap_or_default(),
        server_info: map.string(3).unwrap_or_default().to_string(),
        name: map.string(4).unwrap_or_default().to_string(),
    }
}

/// ConnectRequest carries only the (unused) password field; the client
/// always sends it empty.
pub fn encode_connect_request() -> Vec<u8> {
    Vec::new()
}

/// DeviceInfoResponse, field numbers per the protocol: `uses_password = 1`,
/// `name = 2`, `mac_address = 3`, `esphome_version = 4`,
/// `compilation_time = 5`, `model = 6`, `has_deep_sleep = 7`,
/// `project_name = 8`, `project_version = 9`, `webserver_port = 10`,
/// `manufacturer = 12`, `friendly_name = 13`.
pub fn decode_device_info(map: &FieldMap) -> DeviceInfo {
    DeviceInfo {
        uses_password: map.bool(1).unwrap_or_default(),
        name: map.string(2).unwrap_or_default().to_string(),
        mac_address: map.string(3).unwrap_or_default().to_string(),
        esphome_version: map.string(4).unwrap_or_default().to_string(),
        compilation_time: map.string(5).unwrap_or_default().to_string(),
        model: map.string(6).unwrap_or_default().to_string(),
        has_deep_sleep: map.bool(7).unwrap_or_default(),
        project_name: map.string(8).unwrap_or_default().to_string(),
        project_version: map.string(9).unwrap_or_default().to_string(),
        webserver_port: map.u32(10).unwrap_or_default(),
        manufacturer: map.string(12).unwrap_or_default().to_string(),
        friendly_name: map.string(13).unwrap_or_default().to_string(),
    }
}

/// SubscribeLogsRequest: `level = 1`, `dump_config = 2`.
pub fn encode_subscribe_logs(level: LogLevel, dump_config: bool) -> Vec<u8> {
    let mut b = MessageBuilder::new();
    b.varint(1, level.to_wire());
    if dump_config {
        b.bool(2, true);
    }
    b.finish()
}

/// One device log record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    /// Severity the device assigned.
    pub level: LogLevel,
    /// Log line, ANSI color codes included.
    pub message: Vec<u8>,
}

/// SubscribeLogsResponse: `level = 1`, `message = 3`.
pub fn decode_log_entry(map: &FieldMap) -> LogEntry {
    LogEntry {
        level: map
            .varint(1)
            .and_then(LogLevel::from_wire)
            .unwrap_or(LogLevel::None),
        message: map.bytes(3).unwrap_or_default().to_vec(),
    }
}

/// GetTimeResponse: `epoch_seconds = 1 (fixed32)`. Used both to answer the
/// device's GetTimeRequest and to decode its own response.
pub fn encode_get_time_response(epoch_seconds: u32) -> Vec<u8> {
    MessageBuilder::new().fixed32(1, epoch_seconds).finish()
}

/// Seconds since the Unix epoch from a GetTimeResponse.
pub fn decode_get_time_response(map: &FieldMap) -> Option<u32> {
    map.fixed32(1)
}

/// CameraImageRequest: `single = 1`, `stream = 2`.
pub fn encode_camera_image_request(single: bool, stream: bool) -> Vec<u8> {
    let mut b = MessageBuilder::new();
    if single {
        b.bool(1, true);
    }
    if stream {
        b.bool(2, true);
    }
    b.finish()
}

/// One chunk of a camera image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CameraChunk {
    /// Camera entity key.
    pub key: u32,
    /// Image bytes of this chunk.
    pub data: Vec<u8>,
    /// True on the final chunk of an image.
    pub done: bool,
}

/// CameraImageResponse: `key = 1 (fixed32)`, `data = 2`, `done = 3`.
pub fn decode_camera_chunk(map: &FieldMap) -> Option<CameraChunk> {
    Some(CameraChunk {
        key: map.fixed32(1)?,
        data: map.bytes(2).unwrap_or_default().to_vec(),
        done: map.bool(3).unwrap_or_default(),
    })
}

/// NoiseEncryptionSetKeyRequest: `key = 1 (bytes)`, the raw 32-byte PSK.
pub fn encode_noise_set_key(key: &[u8]) -> Vec<u8> {
    MessageBuilder::new().bytes(1, key).finish()
}

/// NoiseEncryptionSetKeyResponse: `success = 1`.
pub fn decode_noise_set_key_response(map: &FieldMap) -> bool {
    map.bool(1).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hello_request_advertises_1_12() {
        let payload = encode_hello_request("esphome-client");
        let map = FieldMap::decode(&payload).unwrap();
        assert_eq!(map.string(1), Some("esphome-client"));
        assert_eq!(map.u32(2), Some(1));
        assert_eq!(map.u32(3), Some(12));
    }

    #[test]
    fn test_hello_response_decode() {
        let payload = MessageBuilder::new()
            .varint(1, 1)
            .varint(2, 10)
            .string(3, "ESPHome v2025.7.0")
            .string(4, "garage")
            .finish();
        let hello = decode_hello_response(&FieldMap::decode(&payload).unwrap());
        assert_eq!(hello.api_version_major, 1);
        assert_eq!(hello.api_version_minor, 10);
        assert_eq!(hello.server_info, "ESPHome v2025.7.0");
        assert_eq!(hello.name, "garage");
    }

    #[test]
    fn test_device_info_decode() {
        let payload = MessageBuilder::new()
            .bool(1, true)
            .string(2, "garage")
            .string(3, "AA:BB:CC:DD:EE:FF")
            .string(4, "2025.7.0")
            .string(6, "esp32dev")
            .varint(10, 80)
            .string(13, "Garage Door")
            .finish();
        let info = decode_device_info(&FieldMap::decode(&payload).unwrap());
        assert!(info.uses_password);
        assert_eq!(info.name, "garage");
        assert_eq!(info.mac_address, "AA:BB:CC:DD:EE:FF");
        assert_eq!(info.model, "esp32dev");
        assert_eq!(info.webserver_port, 80);
        assert_eq!(info.friendly_name, "Garage Door");
        assert_eq!(info.project_name, "");
    }

    #[test]
    fn test_subscribe_logs_encode() {
        let payload = encode_subscribe_logs(LogLevel::Debug, true);
        let map = FieldMap::decode(&payload).unwrap();
        assert_eq!(map.varint(1), Some(5));
        assert_eq!(map.bool(2), Some(true));

        let payload = encode_subscribe_logs(LogLevel::Info, false);
        let map = FieldMap::decode(&payload).unwrap();
        assert_eq!(map.varint(1), Some(3));
        assert_eq!(map.get(2), None);
    }

    #[test]
    fn test_log_entry_decode() {
        let payload = MessageBuilder::new()
            .varint(1, 2)
            .bytes(3, b"[W] wifi signal low")
            .finish();
        let entry = decode_log_entry(&FieldMap::decode(&payload).unwrap());
        assert_eq!(entry.level, LogLevel::Warn);
        assert_eq!(entry.message, b"[W] wifi signal low");
    }

    #[test]
    fn test_time_response_roundtrip() {
        let payload = encode_get_time_response(1_700_000_000);
        let map = FieldMap::decode(&payload).unwrap();
        assert_eq!(decode_get_time_response(&map), Some(1_700_000_000));
    }

    #[test]
    fn test_camera_chunk_decode() {
        let payload = MessageBuilder::new()
            .fixed32(1, 12)
            .bytes(2, &[0xff, 0xd8])
            .bool(3, true)
            .finish();
        let chunk = decode_camera_chunk(&FieldMap::decode(&payload).unwrap()).unwrap();
        assert_eq!(chunk.key, 12);
        assert_eq!(chunk.data, [0xff, 0xd8]);
        assert!(chunk.done);
    }

    #[test]
    fn test_noise_set_key_roundtrip() {
        let payload = encode_noise_set_key(&[0xaa; 32]);
        let map = FieldMap::decode(&payload).unwrap();
        assert_eq!(map.bytes(1), Some(&[0xaa; 32][..]));

        let ok = MessageBuilder::new().bool(1, true).finish();
        assert!(decode_noise_set_key_response(&FieldMap::decode(&ok).unwrap()));
        let empty: Vec<u8> = Vec::new();
        assert!(!decode_noise_set_key_response(
            &FieldMap::decode(&empty).unwrap()
        ));
    }
}
