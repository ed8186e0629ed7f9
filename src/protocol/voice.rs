//! Voice assistant side-channel codecs.
//!
//! Once subscribed, the device can ask the client to run a voice pipeline;
//! audio flows in both directions and pipeline progress is reported back as
//! events.

use crate::wire::{FieldMap, MessageBuilder};

/// SubscribeVoiceAssistantRequest: `subscribe = 1`, `flags = 2`.
pub fn encode_subscribe(subscribe: bool, flags: u32) -> Vec<u8> {
    let mut b = MessageBuilder::new();
    if subscribe {
        b.bool(1, true);
    }
    if flags != 0 {
        b.varint(2, u64::from(flags));
    }
    b.finish()
}

/// A pipeline run request from the device.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VoiceAssistantRequest {
    /// True to start a pipeline, false to stop the running one.
    pub start: bool,
    /// Conversation id carried across turns.
    pub conversation_id: String,
    /// Capability flags the device asks for.
    pub flags: u32,
    /// Wake word phrase that triggered the run, when one did.
    pub wake_word_phrase: String,
}

/// VoiceAssistantRequest: `start = 1`, `conversation_id = 2`, `flags = 3`,
/// `wake_word_phrase = 5`.
pub fn decode_request(map: &FieldMap) -> VoiceAssistantRequest {
    VoiceAssistantRequest {
        start: map.bool(1).unwrap_or_default(),
        conversation_id: map.string(2).unwrap_or_default().to_string(),
        flags: map.u32(3).unwrap_or_default(),
        wake_word_phrase: map.string(5).unwrap_or_default().to_string(),
    }
}

/// VoiceAssistantResponse: `port = 1`, `error = 2`. Answers a pipeline run
/// request; `port` is the UDP audio port when the legacy transport is used.
pub fn encode_response(port: u32, error: bool) -> Vec<u8> {
    let mut b = MessageBuilder::new();
    if port != 0 {
        b.varint(1, u64::from(port));
    }
    if error {
        b.bool(2, true);
    }
    b.finish()
}

/// VoiceAssistantEventResponse: `event_type = 1`, `data = 2` repeated
/// nested messages of `name = 1`, `value = 2`.
pub fn encode_event(event_type: u32, data: &[(String, String)]) -> Vec<u8> {
    let mut b = MessageBuilder::new();
    b.varint(1, u64::from(event_type));
    for (name, value) in data {
        let nested = MessageBuilder::new()
            .string(1, name)
            .string(2, value)
            .finish();
        b.message(2, &nested);
    }
    b.finish()
}

/// VoiceAssistantAudio: `data = 1`, `end = 2`. Same layout both directions.
pub fn encode_audio(data: &[u8], end: bool) -> Vec<u8> {
    let mut b = MessageBuilder::new();
    b.bytes(1, data);
    if end {
        b.bool(2, true);
    }
    b.finish()
}

/// Decode a VoiceAssistantAudio message into `(samples, end)`.
pub fn decode_audio(map: &FieldMap) -> (Vec<u8>, bool) {
    (
        map.bytes(1).unwrap_or_default().to_vec(),
        map.bool(2).unwrap_or_default(),
    )
}

/// VoiceAssistantTimerEventResponse: `event_type = 1`, `timer_id = 2`,
/// `name = 3`, `total_seconds = 4`, `seconds_left = 5`, `is_active = 6`.
pub fn encode_timer_event(
    event_type: u32,
    timer_id: &str,
    name: &str,
    total_seconds: u32,
    seconds_left: u32,
    is_active: bool,
) -> Vec<u8> {
    MessageBuilder::new()
        .varint(1, u64::from(event_type))
        .string(2, timer_id)
        .string(3, name)
        .varint(4, u64::from(total_seconds))
        .varint(5, u64::from(seconds_left))
        .bool(6, is_active)
        .finish()
}

/// VoiceAssistantAnnounceRequest: `media_id = 1`, `text = 2`,
/// `preannounce_media_id = 3`, `start_conversation = 4`.
pub fn encode_announce(
    media_id: &str,
    text: &str,
    preannounce_media_id: &str,
    start_conversation: bool,
) -> Vec<u8> {
    let mut b = MessageBuilder::new();
    b.string(1, media_id).string(2, text);
    if !preannounce_media_id.is_empty() {
        b.string(3, preannounce_media_id);
    }
    if start_conversation {
        b.bool(4, true);
    }
    b.finish()
}

/// VoiceAssistantAnnounceFinished: `success = 1`.
pub fn decode_announce_finished(map: &FieldMap) -> bool {
    map.bool(1).unwrap_or_default()
}

/// One wake word the device can listen for.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WakeWord {
    /// Stable identifier.
    pub id: String,
    /// Spoken phrase.
    pub wake_word: String,
    /// Languages the model was trained on.
    pub trained_languages: Vec<String>,
}

/// Device-side voice assistant configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VoiceAssistantConfiguration {
    /// Wake words the device can use.
    pub available_wake_words: Vec<WakeWord>,
    /// Wake word ids currently active.
    pub active_wake_words: Vec<String>,
    /// How many wake words may be active at once.
    pub max_active_wake_words: u32,
}

/// VoiceAssistantConfigurationResponse: `available_wake_words = 1` repeated
/// nested messages of `id = 1`, `wake_word = 2`, `trained_languages = 3`;
/// `active_wake_words = 2`; `max_active_wake_words = 3`.
pub fn decode_configuration(map: &FieldMap) -> VoiceAssistantConfiguration {
    let mut available = Vec::new();
    for raw in map.repeated_bytes(1) {
        let Ok(nested) = FieldMap::decode(raw) else {
            continue;
        };
        available.push(WakeWord {
            id: nested.string(1).unwrap_or_default().to_string(),
            wake_word: nested.string(2).unwrap_or_default().to_string(),
            trained_languages: nested
                .repeated_strings(3)
                .map(str::to_string)
                .collect(),
        });
    }
    VoiceAssistantConfiguration {
        available_wake_words: available,
        active_wake_words: map.repeated_strings(2).map(str::to_string).collect(),
        max_active_wake_words: map.u32(3).unwrap_or_default(),
    }
}

/// VoiceAssistantSetConfiguration: `active_wake_words = 1`.
pub fn encode_set_configuration(active_wake_words: &[String]) -> Vec<u8> {
    let mut b = MessageBuilder::new();
    for id in active_wake_words {
        b.string(1, id);
    }
    b.finish()
}
