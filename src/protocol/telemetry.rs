//! State-response decoders producing tagged telemetry records.
//!
//! Every state message leads with its entity key in field 1 as a fixed32.
//! Float-bearing fields decode strictly from fixed32 bit patterns; enum
//! fields are carried as their raw wire values. Missing-state flags pass
//! through verbatim where the protocol exposes them.

use crate::model::EntityKind;
use crate::wire::FieldMap;

use super::message::MessageType;

const FIELD_KEY: u32 = 1;

/// One asynchronous state update from the device.
#[derive(Clone, Debug, PartialEq)]
pub struct Telemetry {
    /// Wire key of the entity.
    pub key: u32,
    /// Entity family, the discriminator of [`Telemetry::state`].
    pub kind: EntityKind,
    /// Derived string id, filled in from the registry when the key is known.
    pub entity_id: Option<String>,
    /// Sub-device id, when the family carries one.
    pub device_id: Option<u32>,
    /// Family-specific payload.
    pub state: StateUpdate,
}

/// Per-family state payloads.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum StateUpdate {
    /// Binary sensor on/off.
    BinarySensor {
        /// Current state.
        state: bool,
        /// True when the device has no state to report.
        missing_state: bool,
    },
    /// Numeric sensor reading.
    Sensor {
        /// Current reading.
        state: f32,
        /// True when the device has no state to report.
        missing_state: bool,
    },
    /// Text sensor value.
    TextSensor {
        /// Current value.
        state: String,
        /// True when the device has no state to report.
        missing_state: bool,
    },
    /// Switch on/off.
    Switch {
        /// Current state.
        state: bool,
    },
    /// Cover position report.
    Cover {
        /// Position, 0.0 closed to 1.0 open.
        position: f32,
        /// Tilt, 0.0 to 1.0.
        tilt: f32,
        /// Operation in progress (wire enum: 0 idle, 1 opening, 2 closing).
        current_operation: u32,
    },
    /// Climate unit report.
    Climate {
        /// Active HVAC mode (wire enum).
        mode: u32,
        /// Measured temperature.
        current_temperature: f32,
        /// Setpoint.
        target_temperature: f32,
        /// Lower setpoint of a two-point configuration.
        target_temperature_low: f32,
        /// Upper setpoint of a two-point configuration.
        target_temperature_high: f32,
        /// Legacy away flag.
        away: bool,
        /// Current action (wire enum).
        action: u32,
        /// Fan mode (wire enum).
        fan_mode: u32,
        /// Swing mode (wire enum).
        swing_mode: u32,
        /// Custom fan mode name.
        custom_fan_mode: String,
        /// Preset (wire enum).
        preset: u32,
        /// Custom preset name.
        custom_preset: String,
        /// Measured humidity.
        current_humidity: f32,
        /// Humidity setpoint.
        target_humidity: f32,
    },
    /// Light report.
    Light {
        /// On/off.
        state: bool,
        /// Master brightness, 0.0 to 1.0.
        brightness: f32,
        /// Red channel.
        red: f32,
        /// Green channel.
        green: f32,
        /// Blue channel.
        blue: f32,
        /// White channel.
        white: f32,
        /// Color temperature in mireds.
        color_temperature: f32,
        /// Active effect name.
        effect: String,
        /// Color brightness, 0.0 to 1.0.
        color_brightness: f32,
        /// Active color mode (wire enum).
        color_mode: u32,
        /// Cold white channel.
        cold_white: f32,
        /// Warm white channel.
        warm_white: f32,
    },
    /// Fan report.
    Fan {
        /// On/off.
        state: bool,
        /// Oscillation on/off.
        oscillating: bool,
        /// Direction (wire enum: 0 forward, 1 reverse).
        direction: u32,
        /// Discrete speed level.
        speed_level: u32,
        /// Active preset name.
        preset_mode: String,
    },
    /// Lock state (wire enum).
    Lock {
        /// Current lock state.
        state: u32,
    },
    /// Siren on/off.
    Siren {
        /// Current state.
        state: bool,
    },
    /// Media player report.
    MediaPlayer {
        /// Playback state (wire enum).
        state: u32,
        /// Volume, 0.0 to 1.0.
        volume: f32,
        /// Mute flag.
        muted: bool,
    },
    /// Number value.
    Number {
        /// Current value.
        state: f32,
        /// True when the device has no state to report.
        missing_state: bool,
    },
    /// Select value.
    Select {
        /// Current option.
        state: String,
        /// True when the device has no state to report.
        missing_state: bool,
    },
    /// Text value.
    Text {
        /// Current value.
        state: String,
        /// True when the device has no state to report.
        missing_state: bool,
    },
    /// Date value.
    Date {
        /// True when the device has no state to report.
        missing_state: bool,
        /// Year.
        year: u32,
        /// Month, 1-12.
        month: u32,
        /// Day of month.
        day: u32,
    },
    /// Time-of-day value.
    Time {
        /// True when the device has no state to report.
        missing_state: bool,
        /// Hour, 0-23.
        hour: u32,
        /// Minute.
        minute: u32,
        /// Second.
        second: u32,
    },
    /// Combined date-and-time value.
    DateTime {
        /// True when the device has no state to report.
        missing_state: bool,
        /// Seconds since the Unix epoch.
        epoch_seconds: u32,
    },
    /// Valve report.
    Valve {
        /// Position, 0.0 closed to 1.0 open.
        position: f32,
        /// Operation in progress (wire enum).
        current_operation: u32,
    },
    /// Alarm panel state (wire enum).
    AlarmControlPanel {
        /// Current panel state.
        state: u32,
    },
    /// Fired event.
    Event {
        /// Event type name.
        event_type: String,
    },
    /// Update slot report.
    Update {
        /// True when the device has no state to report.
        missing_state: bool,
        /// An update is being installed.
        in_progress: bool,
        /// Progress percentage is meaningful.
        has_progress: bool,
        /// Install progress percentage.
        progress: f32,
        /// Installed version.
        current_version: String,
        /// Available version.
        latest_version: String,
        /// Update title.
        title: String,
        /// Release summary text.
        release_summary: String,
        /// Release notes URL.
        release_url: String,
    },
}

/// Decode a state response into a telemetry record.
///
/// Returns `None` when `msg_type` is not a state response or the message is
/// missing its key; the caller logs and ignores those. `entity_id` is left
/// unresolved for the dispatcher to fill from the registry.
pub fn decode_state(msg_type: MessageType, map: &FieldMap) -> Option<Telemetry> {
    use MessageType as M;
    let key = map.fixed32(FIELD_KEY)?;
    let (kind, device_id_field, state) = match msg_type {
        M::BinarySensorStateResponse => (
            EntityKind::BinarySensor,
            4,
            StateUpdate::BinarySensor {
                state: map.bool(2).unwrap_or_default(),
                missing_state: map.bool(3).unwrap_or_default(),
            },
        ),
        M::SensorStateResponse => (
            EntityKind::Sensor,
            4,
            StateUpdate::Sensor {
                state: map.f32(2).unwrap_or_default(),
                missing_state: map.bool(3).unwrap_or_default(),
            },
        ),
        M::TextSensorStateResponse => (
            EntityKind::TextSensor,
            4,
            StateUpdate::TextSensor {
                state: map.string(2).unwrap_or_default().to_string(),
                missing_state: map.bool(3).unwrap_or_default(),
            },
        ),
        M::SwitchStateResponse => (
            EntityKind::Switch,
            3,
            StateUpdate::Switch {
                state: map.bool(2).unwrap_or_default(),
            },
        ),
        M::CoverStateResponse => (
            EntityKind::Cover,
            6,
            StateUpdate::Cover {
                position: map.f32(3).unwrap_or_default(),
                tilt: map.f32(4).unwrap_or_default(),
                current_operation: map.u32(5).unwrap_or_default(),
            },
        ),
        M::ClimateStateResponse => (
            EntityKind::Climate,
            16,
            StateUpdate::Climate {
                mode: map.u32(2).unwrap_or_default(),
                current_temperature: map.f32(3).unwrap_or_default(),
                target_temperature: map.f32(4).unwrap_or_default(),
                target_temperature_low: map.f32(5).unwrap_or_default(),
                target_temperature_high: map.f32(6).unwrap_or_default(),
                away: map.bool(7).unwrap_or_default(),
                action: map.u32(8).unwrap_or_default(),
                fan_mode: map.u32(9).unwrap_or_default(),
                swing_mode: map.u32(10).unwrap_or_default(),
                custom_fan_mode: map.string(11).unwrap_or_default().to_string(),
                preset: map.u32(12).unwrap_or_default(),
                custom_preset: map.string(13).unwrap_or_default().to_string(),
                current_humidity: map.f32(14).unwrap_or_default(),
                target_humidity: map.f32(15).unwrap_or_default(),
            },
        ),
        M::LightStateResponse => (
            EntityKind::Light,
            14,
            StateUpdate::Light {
                state: map.bool(2).unwrap_or_default(),
                brightness: map.f32(3).unwrap_or_default(),
                red: map.f32(4).unwrap_or_default(),
                green: map.f32(5).unwrap_or_default(),
                blue: map.f32(6).unwrap_or_default(),
                white: map.f32(7).unwrap_or_default(),
                color_temperature: map.f32(8).unwrap_or_default(),
                effect: map.string(9).unwrap_or_default().to_string(),
                color_brightness: map.f32(10).unwrap_or_default(),
                color_mode: map.u32(11).unwrap_or_default(),
                cold_white: map.f32(12).unwrap_or_default(),
                warm_white: map.f32(13).unwrap_or_default(),
            },
        ),
        M::FanStateResponse => (
            EntityKind::Fan,
            8,
            StateUpdate::Fan {
                state: map.bool(2).unwrap_or_default(),
                oscillating: map.bool(3).unwrap_or_default(),
                direction: map.u32(5).unwrap_or_default(),
                speed_level: map.u32(6).unwrap_or_default(),
                preset_mode: map.string(7).unwrap_or_default().to_string(),
            },
        ),
        M::LockStateResponse => (
            EntityKind::Lock,
            3,
            StateUpdate::Lock {
                state: map.u32(2).unwrap_or_default(),
            },
        ),
        M::SirenStateResponse => (
            EntityKind::Siren,
            3,
            StateUpdate::Siren {
                state: map.bool(2).unwrap_or_default(),
            },
        ),
        M::MediaPlayerStateResponse => (
            EntityKind::MediaPlayer,
            5,
            StateUpdate::MediaPlayer {
                state: map.u32(2).unwrap_or_default(),
                volume: map.f32(3).unwrap_or_default(),
                muted: map.bool(4).unwrap_or_default(),
            },
        ),
        M::NumberStateResponse => (
            EntityKind::Number,
            4,
            StateUpdate::Number {
                state: map.f32(2).unwrap_or_default(),
                missing_state: map.bool(3).unwrap_or_default(),
            },
        ),
        M::SelectStateResponse => (
            EntityKind::Select,
            4,
            StateUpdate::Select {
                state: map.string(2).unwrap_or_default().to_string(),
                missing_state: map.bool(3).unwrap_or_default(),
            },
        ),
        M::TextStateResponse => (
            EntityKind::Text,
            4,
            StateUpdate::Text {
                state: map.string(2).unwrap_or_default().to_string(),
                missing_state: map.bool(3).unwrap_or_default(),
            },
        ),
        M::DateStateResponse => (
            EntityKind::Date,
            6,
            StateUpdate::Date {
                missing_state: map.bool(2).unwrap_or_default(),
                year: map.u32(3).unwrap_or_default(),
                month: map.u32(4).unwrap_or_default(),
                day: map.u32(5).unwrap_or_default(),
            },
        ),
        M::TimeStateResponse => (
            EntityKind::Time,
            6,
            StateUpdate::Time {
                missing_state: map.bool(2).unwrap_or_default(),
                hour: map.u32(3).unwrap_or_default(),
                minute: map.u32(4).unwrap_or_default(),
                second: map.u32(5).unwrap_or_default(),
            },
        ),
        M::DateTimeStateResponse => (
            EntityKind::DateTime,
            4,
            StateUpdate::DateTime {
                missing_state: map.bool(2).unwrap_or_default(),
                epoch_seconds: map.fixed32(3).unwrap_or_default(),
            },
        ),
        M::ValveStateResponse => (
            EntityKind::Valve,
            4,
            StateUpdate::Valve {
                position: map.f32(2).unwrap_or_default(),
                current_operation: map.u32(3).unwrap_or_default(),
            },
        ),
        M::AlarmControlPanelStateResponse => (
            EntityKind::AlarmControlPanel,
            3,
            StateUpdate::AlarmControlPanel {
                state: map.u32(2).unwrap_or_default(),
            },
        ),
        M::EventResponse => (
            EntityKind::Event,
            3,
            StateUpdate::Event {
                event_type: map.string(2).unwrap_or_default().to_string(),
            },
        ),
        M::UpdateStateResponse => (
            EntityKind::Update,
            11,
            StateUpdate::Update {
                missing_state: map.bool(2).unwrap_or_default(),
                in_progress: map.bool(3).unwrap_or_default(),
                has_progress: map.bool(4).unwrap_or_default(),
                progress: map.f32(5).unwrap_or_default(),
                current_version: map.string(6).unwrap_or_default().to_string(),
                latest_version: map.string(7).unwrap_or_default().to_string(),
                title: map.string(8).unwrap_or_default().to_string(),
                release_summary: map.string(9).unwrap_or_default().to_string(),
                release_url: map.string(10).unwrap_or_default().to_string(),
            },
        ),
        _ => return None,
    };
    Some(Telemetry {
        key,
        kind,
        entity_id: None,
        device_id: map.u32(device_id_field),
        state,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::MessageBuilder;

    fn decode(msg_type: MessageType, payload: &[u8]) -> Option<Telemetry> {
        decode_state(msg_type, &FieldMap::decode(payload).unwrap())
    }

    #[test]
    fn test_cover_state_decode() {
        let payload = MessageBuilder::new()
            .fixed32(1, 11)
            .float(3, 0.5)
            .float(4, 1.0)
            .varint(5, 1)
            .finish();
        let telemetry = decode(MessageType::CoverStateResponse, &payload).unwrap();
        assert_eq!(telemetry.key, 11);
        assert_eq!(telemetry.kind, EntityKind::Cover);
        assert_eq!(
            telemetry.state,
            StateUpdate::Cover {
                position: 0.5,
                tilt: 1.0,
                current_operation: 1,
            }
        );
    }

    #[test]
    fn test_binary_sensor_state_decode() {
        let payload = MessageBuilder::new()
            .fixed32(1, 3)
            .bool(2, true)
            .varint(4, 9)
            .finish();
        let telemetry = decode(MessageType::BinarySensorStateResponse, &payload).unwrap();
        assert_eq!(telemetry.kind, EntityKind::BinarySensor);
        assert_eq!(telemetry.device_id, Some(9));
        assert_eq!(
            telemetry.state,
            StateUpdate::BinarySensor {
                state: true,
                missing_state: false,
            }
        );
    }

    #[test]
    fn test_sensor_state_is_strict_about_floats() {
        // A varint where the wire demands a fixed32 float is not coerced.
        let payload = MessageBuilder::new().fixed32(1, 3).varint(2, 42).finish();
        let telemetry = decode(MessageType::SensorStateResponse, &payload).unwrap();
        assert_eq!(
            telemetry.state,
            StateUpdate::Sensor {
                state: 0.0,
                missing_state: false,
            }
        );

        let payload = MessageBuilder::new()
            .fixed32(1, 3)
            .float(2, 21.5)
            .bool(3, false)
            .finish();
        let telemetry = decode(MessageType::SensorStateResponse, &payload).unwrap();
        assert_eq!(
            telemetry.state,
            StateUpdate::Sensor {
                state: 21.5,
                missing_state: false,
            }
        );
    }

    #[test]
    fn test_climate_state_decode() {
        let payload = MessageBuilder::new()
            .fixed32(1, 8)
            .varint(2, 3)
            .float(3, 21.5)
            .float(4, 23.0)
            .varint(8, 2)
            .string(12, "")
            .float(14, 45.0)
            .varint(16, 4)
            .finish();
        let telemetry = decode(MessageType::ClimateStateResponse, &payload).unwrap();
        assert_eq!(telemetry.device_id, Some(4));
        match telemetry.state {
            StateUpdate::Climate {
                mode,
                current_temperature,
                target_temperature,
                action,
                current_humidity,
                ..
            } => {
                assert_eq!(mode, 3);
                assert_eq!(current_temperature, 21.5);
                assert_eq!(target_temperature, 23.0);
                assert_eq!(action, 2);
                assert_eq!(current_humidity, 45.0);
            }
            other => panic!("wrong family: {other:?}"),
        }
    }

    #[test]
    fn test_light_state_decode() {
        let payload = MessageBuilder::new()
            .fixed32(1, 21)
            .bool(2, true)
            .float(3, 0.8)
            .float(4, 1.0)
            .float(5, 0.2)
            .float(6, 0.1)
            .string(9, "rainbow")
            .varint(11, 35)
            .finish();
        let telemetry = decode(MessageType::LightStateResponse, &payload).unwrap();
        match telemetry.state {
            StateUpdate::Light {
                state,
                brightness,
                red,
                effect,
                color_mode,
                ..
            } => {
                assert!(state);
                assert_eq!(brightness, 0.8);
                assert_eq!(red, 1.0);
                assert_eq!(effect, "rainbow");
                assert_eq!(color_mode, 35);
            }
            other => panic!("wrong family: {other:?}"),
        }
    }

    #[test]
    fn test_update_state_decode() {
        let payload = MessageBuilder::new()
            .fixed32(1, 5)
            .bool(3, true)
            .bool(4, true)
            .float(5, 62.5)
            .string(6, "2025.7.0")
            .string(7, "2025.8.1")
            .finish();
        let telemetry = decode(MessageType::UpdateStateResponse, &payload).unwrap();
        match telemetry.state {
            StateUpdate::Update {
                in_progress,
                progress,
                current_version,
                latest_version,
                ..
            } => {
                assert!(in_progress);
                assert_eq!(progress, 62.5);
                assert_eq!(current_version, "2025.7.0");
                assert_eq!(latest_version, "2025.8.1");
            }
            other => panic!("wrong family: {other:?}"),
        }
    }

    #[test]
    fn test_datetime_state_uses_fixed32_epoch() {
        let payload = MessageBuilder::new()
            .fixed32(1, 2)
            .fixed32(3, 1_700_000_000)
            .finish();
        let telemetry = decode(MessageType::DateTimeStateResponse, &payload).unwrap();
        assert_eq!(
            telemetry.state,
            StateUpdate::DateTime {
                missing_state: false,
                epoch_seconds: 1_700_000_000,
            }
        );
    }

    #[test]
    fn test_non_state_message_returns_none() {
        let payload = MessageBuilder::new().fixed32(1, 1).finish();
        assert!(decode(MessageType::PingRequest, &payload).is_none());
        assert!(decode(MessageType::ListEntitiesSwitchResponse, &payload).is_none());
    }

    #[test]
    fn test_missing_key_returns_none() {
        let payload = MessageBuilder::new().bool(2, true).finish();
        assert!(decode(MessageType::SwitchStateResponse, &payload).is_none());
    }
}
