//! Message registry, per-family codecs and telemetry decoders.

pub mod command;
mod entities;
mod info;
mod message;
mod telemetry;
pub mod voice;

pub use command::{
    ClimateCommand, CommandError, CoverCommand, FanCommand, LightCommand, MediaPlayerCommand,
    ServiceArgValue, SirenCommand, ValveCommand,
};
pub use entities::{ListEntityFields, decode_list_entity, decode_service, list_entity_fields};
pub use info::{
    CameraChunk, HelloResponse, LogEntry, decode_camera_chunk, decode_device_info,
    decode_get_time_response, decode_hello_response, decode_log_entry,
    decode_noise_set_key_response, encode_camera_image_request, encode_connect_request,
    encode_get_time_response, encode_hello_request, encode_noise_set_key, encode_subscribe_logs,
};
pub use message::MessageType;
pub use telemetry::{StateUpdate, Telemetry, decode_state};
pub use voice::{VoiceAssistantConfiguration, VoiceAssistantRequest, WakeWord};
