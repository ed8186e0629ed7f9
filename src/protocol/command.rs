//! Command encoders, one per controllable entity family.
//!
//! Every command leads with the entity key in field 1 as a fixed32.
//! Optional parameters follow the protocol's `has_X`/`X` convention: a
//! presence flag in one field and the value in the next. When the target
//! entity's sub-device is known its id is appended at the family-specific
//! field number.

use thiserror::Error;

use crate::model::ServiceInfo;
use crate::wire::MessageBuilder;

/// Errors from command encoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Command family requires at least one option to be set.
    #[error("{family} command with no options set")]
    NoOptions {
        /// Entity family name.
        family: &'static str,
    },
}

fn keyed(key: u32) -> MessageBuilder {
    let mut builder = MessageBuilder::new();
    builder.fixed32(1, key);
    builder
}

fn finish(mut builder: MessageBuilder, device_id_field: u32, device_id: Option<u32>) -> Vec<u8> {
    if let Some(id) = device_id {
        builder.varint(device_id_field, u64::from(id));
    }
    builder.finish()
}

/// SwitchCommandRequest: `state = 2`, `device_id = 3`.
pub fn switch(key: u32, device_id: Option<u32>, state: bool) -> Vec<u8> {
    let mut b = keyed(key);
    b.bool(2, state);
    finish(b, 3, device_id)
}

/// ButtonCommandRequest: key only, `device_id = 2`.
pub fn button(key: u32, device_id: Option<u32>) -> Vec<u8> {
    finish(keyed(key), 2, device_id)
}

/// NumberCommandRequest: `state = 2 (float)`, `device_id = 3`.
pub fn number(key: u32, device_id: Option<u32>, state: f32) -> Vec<u8> {
    let mut b = keyed(key);
    b.float(2, state);
    finish(b, 3, device_id)
}

/// SelectCommandRequest: `state = 2 (string)`, `device_id = 3`.
pub fn select(key: u32, device_id: Option<u32>, option: &str) -> Vec<u8> {
    let mut b = keyed(key);
    b.string(2, option);
    finish(b, 3, device_id)
}

/// TextCommandRequest: `state = 2 (string)`, `device_id = 3`.
pub fn text(key: u32, device_id: Option<u32>, state: &str) -> Vec<u8> {
    let mut b = keyed(key);
    b.string(2, state);
    finish(b, 3, device_id)
}

/// DateCommandRequest: `year = 2`, `month = 3`, `day = 4`, `device_id = 5`.
pub fn date(key: u32, device_id: Option<u32>, year: u32, month: u32, day: u32) -> Vec<u8> {
    let mut b = keyed(key);
    b.varint(2, u64::from(year))
        .varint(3, u64::from(month))
        .varint(4, u64::from(day));
    finish(b, 5, device_id)
}

/// TimeCommandRequest: `hour = 2`, `minute = 3`, `second = 4`,
/// `device_id = 5`.
pub fn time(key: u32, device_id: Option<u32>, hour: u32, minute: u32, second: u32) -> Vec<u8> {
    let mut b = keyed(key);
    b.varint(2, u64::from(hour))
        .varint(3, u64::from(minute))
        .varint(4, u64::from(second));
    finish(b, 5, device_id)
}

/// DateTimeCommandRequest: `epoch_seconds = 2 (fixed32)`, `device_id = 3`.
pub fn datetime(key: u32, device_id: Option<u32>, epoch_seconds: u32) -> Vec<u8> {
    let mut b = keyed(key);
    b.fixed32(2, epoch_seconds);
    finish(b, 3, device_id)
}

/// LockCommandRequest: `command = 2`, `has_code = 3`/`code = 4`,
/// `device_id = 5`.
pub fn lock(key: u32, device_id: Option<u32>, command: u32, code: Option<&str>) -> Vec<u8> {
    let mut b = keyed(key);
    b.varint(2, u64::from(command));
    if let Some(code) = code {
        b.bool(3, true).string(4, code);
    }
    finish(b, 5, device_id)
}

/// AlarmControlPanelCommandRequest: `command = 2`, `code = 3`,
/// `device_id = 4`.
pub fn alarm_control_panel(
    key: u32,
    device_id: Option<u32>,
    command: u32,
    code: Option<&str>,
) -> Vec<u8> {
    let mut b = keyed(key);
    b.varint(2, u64::from(command));
    if let Some(code) = code {
        b.string(3, code);
    }
    finish(b, 4, device_id)
}

/// UpdateCommandRequest: `command = 2`, `device_id = 3`.
pub fn update(key: u32, device_id: Option<u32>, command: u32) -> Vec<u8> {
    let mut b = keyed(key);
    b.varint(2, u64::from(command));
    finish(b, 3, device_id)
}

/// Optional parameters of a cover command. At least one must be set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CoverCommand {
    /// Target position, 0.0 closed to 1.0 open.
    pub position: Option<f32>,
    /// Target tilt, 0.0 to 1.0.
    pub tilt: Option<f32>,
    /// Stop the cover where it is.
    pub stop: bool,
}

/// CoverCommandRequest: `has_position = 4`/`position = 5`,
/// `has_tilt = 6`/`tilt = 7`, `stop = 8`, `device_id = 9`.
pub fn cover(key: u32, device_id: Option<u32>, cmd: &CoverCommand) -> Result<Vec<u8>, CommandError> {
    if cmd.position.is_none() && cmd.tilt.is_none() && !cmd.stop {
        return Err(CommandError::NoOptions { family: "cover" });
    }
    let mut b = keyed(key);
    if let Some(position) = cmd.position {
        b.bool(4, true).float(5, position);
    }
    if let Some(tilt) = cmd.tilt {
        b.bool(6, true).float(7, tilt);
    }
    if cmd.stop {
        b.bool(8, true);
    }
    Ok(finish(b, 9, device_id))
}

/// Optional parameters of a valve command. At least one must be set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValveCommand {
    /// Target position, 0.0 closed to 1.0 open.
    pub position: Option<f32>,
    /// Stop the valve where it is.
    pub stop: bool,
}

/// ValveCommandRequest: `has_position = 2`/`position = 3`, `stop = 4`,
/// `device_id = 5`.
pub fn valve(key: u32, device_id: Option<u32>, cmd: &ValveCommand) -> Result<Vec<u8>, CommandError> {
    if cmd.position.is_none() && !cmd.stop {
        return Err(CommandError::NoOptions { family: "valve" });
    }
    let mut b = keyed(key);
    if let Some(position) = cmd.position {
        b.bool(2, true).float(3, position);
    }
    if cmd.stop {
        b.bool(4, true);
    }
    Ok(finish(b, 5, device_id))
}

/// Optional parameters of a fan command. At least one must be set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FanCommand {
    /// On/off.
    pub state: Option<bool>,
    /// Oscillation on/off.
    pub oscillating: Option<bool>,
    /// Direction (wire enum: 0 forward, 1 reverse).
    pub direction: Option<u32>,
    /// Discrete speed level.
    pub speed_level: Option<u32>,
    /// Preset name.
    pub preset_mode: Option<String>,
}

/// FanCommandRequest: `has_state = 2`/`state = 3`,
/// `has_oscillating = 6`/`oscillating = 7`, `has_direction = 8`/
/// `direction = 9`, `has_speed_level = 10`/`speed_level = 11`,
/// `has_preset_mode = 12`/`preset_mode = 13`, `device_id = 14`.
pub fn fan(key: u32, device_id: Option<u32>, cmd: &FanCommand) -> Result<Vec<u8>, CommandError> {
    if cmd.state.is_none()
        && cmd.oscillating.is_none()
        && cmd.direction.is_none()
        && cmd.speed_level.is_none()
        && cmd.preset_mode.is_none()
    {
        return Err(CommandError::NoOptions { family: "fan" });
    }
    let mut b = keyed(key);
    if let Some(state) = cmd.state {
        b.bool(2, true).bool(3, state);
    }
    if let Some(oscillating) = cmd.oscillating {
        b.bool(6, true).bool(7, oscillating);
    }
    if let Some(direction) = cmd.direction {
        b.bool(8, true).varint(9, u64::from(direction));
    }
    if let Some(level) = cmd.speed_level {
        b.bool(10, true).varint(11, u64::from(level));
    }
    if let Some(preset) = &cmd.preset_mode {
        b.bool(12, true).string(13, preset);
    }
    Ok(finish(b, 14, device_id))
}

/// Optional parameters of a light command.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LightCommand {
    /// On/off.
    pub state: Option<bool>,
    /// Master brightness, 0.0 to 1.0.
    pub brightness: Option<f32>,
    /// RGB channels, each 0.0 to 1.0.
    pub rgb: Option<(f32, f32, f32)>,
    /// White channel.
    pub white: Option<f32>,
    /// Color temperature in mireds.
    pub color_temperature: Option<f32>,
    /// Transition length in milliseconds.
    pub transition_length: Option<u32>,
    /// Flash length in milliseconds.
    pub flash_length: Option<u32>,
    /// Effect name.
    pub effect: Option<String>,
    /// Color brightness, 0.0 to 1.0.
    pub color_brightness: Option<f32>,
    /// Color mode (wire enum).
    pub color_mode: Option<u32>,
    /// Cold white channel.
    pub cold_white: Option<f32>,
    /// Warm white channel.
    pub warm_white: Option<f32>,
}

/// LightCommandRequest: `has_state = 2`/`state = 3`, `has_brightness = 4`/
/// `brightness = 5`, `has_rgb = 6`/`red = 7`/`green = 8`/`blue = 9`,
/// `has_white = 10`/`white = 11`, `has_color_temperature = 12`/
/// `color_temperature = 13`, `has_transition_length = 14`/
/// `transition_length = 15`, `has_flash_length = 16`/`flash_length = 17`,
/// `has_effect = 18`/`effect = 19`, `has_color_brightness = 20`/
/// `color_brightness = 21`, `has_color_mode = 22`/`color_mode = 23`,
/// `has_cold_white = 24`/`cold_white = 25`, `has_warm_white = 26`/
/// `warm_white = 27`, `device_id = 28`.
pub fn light(key: u32, device_id: Option<u32>, cmd: &LightCommand) -> Vec<u8> {
    let mut b = keyed(key);
    if let Some(state) = cmd.state {
        b.bool(2, true).bool(3, state);
    }
    if let Some(brightness) = cmd.brightness {
        b.bool(4, true).float(5, brightness);
    }
    if let Some((red, green, blue)) = cmd.rgb {
        b.bool(6, true).float(7, red).float(8, green).float(9, blue);
    }
    if let Some(white) = cmd.white {
        b.bool(10, true).float(11, white);
    }
    if let Some(mireds) = cmd.color_temperature {
        b.bool(12, true).float(13, mireds);
    }
    if let Some(ms) = cmd.transition_length {
        b.bool(14, true).varint(15, u64::from(ms));
    }
    if let Some(ms) = cmd.flash_length {
        b.bool(16, true).varint(17, u64::from(ms));
    }
    if let Some(effect) = &cmd.effect {
        b.bool(18, true).string(19, effect);
    }
    if let Some(brightness) = cmd.color_brightness {
        b.bool(20, true).float(21, brightness);
    }
    if let Some(mode) = cmd.color_mode {
        b.bool(22, true).varint(23, u64::from(mode));
    }
    if let Some(cold) = cmd.cold_white {
        b.bool(24, true).float(25, cold);
    }
    if let Some(warm) = cmd.warm_white {
        b.bool(26, true).float(27, warm);
    }
    finish(b, 28, device_id)
}

/// Optional parameters of a climate command. At least one must be set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClimateCommand {
    /// HVAC mode (wire enum).
    pub mode: Option<u32>,
    /// Setpoint.
    pub target_temperature: Option<f32>,
    /// Lower setpoint of a two-point configuration.
    pub target_temperature_low: Option<f32>,
    /// Upper setpoint of a two-point configuration.
    pub target_temperature_high: Option<f32>,
    /// Fan mode (wire enum).
    pub fan_mode: Option<u32>,
    /// Swing mode (wire enum).
    pub swing_mode: Option<u32>,
    /// Custom fan mode name.
    pub custom_fan_mode: Option<String>,
    /// Preset (wire enum).
    pub preset: Option<u32>,
    /// Custom preset name.
    pub custom_preset: Option<String>,
    /// Humidity setpoint.
    pub target_humidity: Option<f32>,
}

/// ClimateCommandRequest: `has_mode = 2`/`mode = 3`,
/// `has_target_temperature = 4`/`target_temperature = 5`,
/// `has_target_temperature_low = 6`/`target_temperature_low = 7`,
/// `has_target_temperature_high = 8`/`target_temperature_high = 9`,
/// `has_fan_mode = 12`/`fan_mode = 13`, `has_swing_mode = 14`/
/// `swing_mode = 15`, `has_custom_fan_mode = 16`/`custom_fan_mode = 17`,
/// `has_preset = 18`/`preset = 19`, `has_custom_preset = 20`/
/// `custom_preset = 21`, `has_target_humidity = 22`/`target_humidity = 23`,
/// `device_id = 24`.
pub fn climate(
    key: u32,
    device_id: Option<u32>,
    cmd: &ClimateCommand,
) -> Result<Vec<u8>, CommandError> {
    if cmd.mode.is_none()
        && cmd.target_temperature.is_none()
        && cmd.target_temperature_low.is_none()
        && cmd.target_temperature_high.is_none()
        && cmd.fan_mode.is_none()
        && cmd.swing_mode.is_none()
        && cmd.custom_fan_mode.is_none()
        && cmd.preset.is_none()
        && cmd.custom_preset.is_none()
        && cmd.target_humidity.is_none()
    {
        return Err(CommandError::NoOptions { family: "climate" });
    }
    let mut b = keyed(key);
    if let Some(mode) = cmd.mode {
        b.bool(2, true).varint(3, u64::from(mode));
    }
    if let Some(temperature) = cmd.target_temperature {
        b.bool(4, true).float(5, temperature);
    }
    if let Some(low) = cmd.target_temperature_low {
        b.bool(6, true).float(7, low);
    }
    if let Some(high) = cmd.target_temperature_high {
        b.bool(8, true).float(9, high);
    }
    if let Some(mode) = cmd.fan_mode {
        b.bool(12, true).varint(13, u64::from(mode));
    }
    if let Some(mode) = cmd.swing_mode {
        b.bool(14, true).varint(15, u64::from(mode));
    }
    if let Some(mode) = &cmd.custom_fan_mode {
        b.bool(16, true).string(17, mode);
    }
    if let Some(preset) = cmd.preset {
        b.bool(18, true).varint(19, u64::from(preset));
    }
    if let Some(preset) = &cmd.custom_preset {
        b.bool(20, true).string(21, preset);
    }
    if let Some(humidity) = cmd.target_humidity {
        b.bool(22, true).float(23, humidity);
    }
    Ok(finish(b, 24, device_id))
}

/// Optional parameters of a siren command. At least one must be set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SirenCommand {
    /// On/off.
    pub state: Option<bool>,
    /// Tone name.
    pub tone: Option<String>,
    /// Duration in milliseconds.
    pub duration: Option<u32>,
    /// Volume, 0.0 to 1.0.
    pub volume: Option<f32>,
}

/// SirenCommandRequest: `has_state = 2`/`state = 3`, `has_tone = 4`/
/// `tone = 5`, `has_duration = 6`/`duration = 7`, `has_volume = 8`/
/// `volume = 9`, `device_id = 10`.
pub fn siren(key: u32, device_id: Option<u32>, cmd: &SirenCommand) -> Result<Vec<u8>, CommandError> {
    if cmd.state.is_none() && cmd.tone.is_none() && cmd.duration.is_none() && cmd.volume.is_none() {
        return Err(CommandError::NoOptions { family: "siren" });
    }
    let mut b = keyed(key);
    if let Some(state) = cmd.state {
        b.bool(2, true).bool(3, state);
    }
    if let Some(tone) = &cmd.tone {
        b.bool(4, true).string(5, tone);
    }
    if let Some(duration) = cmd.duration {
        b.bool(6, true).varint(7, u64::from(duration));
    }
    if let Some(volume) = cmd.volume {
        b.bool(8, true).float(9, volume);
    }
    Ok(finish(b, 10, device_id))
}

/// Optional parameters of a media player command. At least one must be set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MediaPlayerCommand {
    /// Playback command (wire enum).
    pub command: Option<u32>,
    /// Volume, 0.0 to 1.0.
    pub volume: Option<f32>,
    /// Media URL to play.
    pub media_url: Option<String>,
    /// Play as an announcement.
    pub announcement: Option<bool>,
}

/// MediaPlayerCommandRequest: `has_command = 2`/`command = 3`,
/// `has_volume = 4`/`volume = 5`, `has_media_url = 6`/`media_url = 7`,
/// `has_announcement = 8`/`announcement = 9`, `device_id = 10`.
pub fn media_player(
    key: u32,
    device_id: Option<u32>,
    cmd: &MediaPlayerCommand,
) -> Result<Vec<u8>, CommandError> {
    if cmd.command.is_none()
        && cmd.volume.is_none()
        && cmd.media_url.is_none()
        && cmd.announcement.is_none()
    {
        return Err(CommandError::NoOptions {
            family: "media_player",
        });
    }
    let mut b = keyed(key);
    if let Some(command) = cmd.command {
        b.bool(2, true).varint(3, u64::from(command));
    }
    if let Some(volume) = cmd.volume {
        b.bool(4, true).float(5, volume);
    }
    if let Some(url) = &cmd.media_url {
        b.bool(6, true).string(7, url);
    }
    if let Some(announcement) = cmd.announcement {
        b.bool(8, true).bool(9, announcement);
    }
    Ok(finish(b, 10, device_id))
}

/// One argument value for a user-defined service call.
#[derive(Clone, Debug, PartialEq)]
pub enum ServiceArgValue {
    /// Boolean.
    Bool(bool),
    /// Signed integer, zigzag-encoded on the wire.
    Int(i32),
    /// 32-bit float.
    Float(f32),
    /// UTF-8 string.
    String(String),
    /// Array of booleans.
    BoolArray(Vec<bool>),
    /// Array of signed integers.
    IntArray(Vec<i32>),
    /// Array of floats.
    FloatArray(Vec<f32>),
    /// Array of strings.
    StringArray(Vec<String>),
}

fn encode_service_arg(value: &ServiceArgValue) -> Vec<u8> {
    let mut b = MessageBuilder::new();
    match value {
        ServiceArgValue::Bool(v) => {
            b.bool(1, *v);
        }
        ServiceArgValue::Int(v) => {
            b.sint32(5, *v);
        }
        ServiceArgValue::Float(v) => {
            b.float(3, *v);
        }
        ServiceArgValue::String(v) => {
            b.string(4, v);
        }
        ServiceArgValue::BoolArray(values) => {
            for v in values {
                b.bool(6, *v);
            }
        }
        ServiceArgValue::IntArray(values) => {
            for v in values {
                b.sint32(7, *v);
            }
        }
        ServiceArgValue::FloatArray(values) => {
            for v in values {
                b.float(8, *v);
            }
        }
        ServiceArgValue::StringArray(values) => {
            for v in values {
                b.string(9, v);
            }
        }
    }
    b.finish()
}

/// ExecuteServiceRequest: `key = 1 (fixed32)`, `args = 2` repeated nested
/// argument messages, one per declared argument in declaration order.
pub fn execute_service(service: &ServiceInfo, args: &[ServiceArgValue]) -> Vec<u8> {
    let mut b = MessageBuilder::new();
    b.fixed32(1, service.key);
    for arg in args {
        let encoded = encode_service_arg(arg);
        b.message(2, &encoded);
    }
    b.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::FieldMap;

    #[test]
    fn test_switch_command_layout() {
        let payload = switch(0x1234, Some(3), true);
        let map = FieldMap::decode(&payload).unwrap();
        assert_eq!(map.fixed32(1), Some(0x1234));
        assert_eq!(map.bool(2), Some(true));
        assert_eq!(map.u32(3), Some(3));
    }

    #[test]
    fn test_device_id_omitted_when_unknown() {
        let payload = switch(1, None, false);
        let map = FieldMap::decode(&payload).unwrap();
        assert_eq!(map.u32(3), None);
    }

    #[test]
    fn test_cover_requires_an_option() {
        assert_eq!(
            cover(1, None, &CoverCommand::default()),
            Err(CommandError::NoOptions { family: "cover" })
        );

        let payload = cover(
            1,
            None,
            &CoverCommand {
                position: Some(0.5),
                ..Default::default()
            },
        )
        .unwrap();
        let map = FieldMap::decode(&payload).unwrap();
        assert_eq!(map.bool(4), Some(true));
        assert_eq!(map.f32(5), Some(0.5));
        assert_eq!(map.get(6), None);
        assert_eq!(map.get(8), None);
    }

    #[test]
    fn test_cover_stop_alone_is_enough() {
        let payload = cover(
            9,
            Some(1),
            &CoverCommand {
                stop: true,
                ..Default::default()
            },
        )
        .unwrap();
        let map = FieldMap::decode(&payload).unwrap();
        assert_eq!(map.bool(8), Some(true));
        assert_eq!(map.u32(9), Some(1));
    }

    #[test]
    fn test_fan_command_pairs() {
        assert!(fan(1, None, &FanCommand::default()).is_err());

        let payload = fan(
            1,
            None,
            &FanCommand {
                state: Some(true),
                speed_level: Some(4),
                ..Default::default()
            },
        )
        .unwrap();
        let map = FieldMap::decode(&payload).unwrap();
        assert_eq!(map.bool(2), Some(true));
        assert_eq!(map.bool(3), Some(true));
        assert_eq!(map.bool(10), Some(true));
        assert_eq!(map.u32(11), Some(4));
        // Unset pairs leave both fields out.
        assert_eq!(map.get(6), None);
        assert_eq!(map.get(12), None);
    }

    #[test]
    fn test_light_command_rgb_and_effect() {
        let payload = light(
            5,
            Some(2),
            &LightCommand {
                state: Some(true),
                brightness: Some(0.75),
                rgb: Some((1.0, 0.5, 0.25)),
                effect: Some("pulse".into()),
                transition_length: Some(250),
                ..Default::default()
            },
        );
        let map = FieldMap::decode(&payload).unwrap();
        assert_eq!(map.fixed32(1), Some(5));
        assert_eq!(map.bool(6), Some(true));
        assert_eq!(map.f32(7), Some(1.0));
        assert_eq!(map.f32(8), Some(0.5));
        assert_eq!(map.f32(9), Some(0.25));
        assert_eq!(map.bool(14), Some(true));
        assert_eq!(map.u32(15), Some(250));
        assert_eq!(map.bool(18), Some(true));
        assert_eq!(map.string(19), Some("pulse"));
        assert_eq!(map.u32(28), Some(2));
    }

    #[test]
    fn test_climate_command_setpoints() {
        assert!(climate(1, None, &ClimateCommand::default()).is_err());

        let payload = climate(
            1,
            None,
            &ClimateCommand {
                mode: Some(3),
                target_temperature: Some(21.5),
                ..Default::default()
            },
        )
        .unwrap();
        let map = FieldMap::decode(&payload).unwrap();
        assert_eq!(map.bool(2), Some(true));
        assert_eq!(map.u32(3), Some(3));
        assert_eq!(map.bool(4), Some(true));
        assert_eq!(map.f32(5), Some(21.5));
    }

    #[test]
    fn test_siren_and_media_player_require_options() {
        assert!(siren(1, None, &SirenCommand::default()).is_err());
        assert!(media_player(1, None, &MediaPlayerCommand::default()).is_err());
        assert!(valve(1, None, &ValveCommand::default()).is_err());

        let payload = media_player(
            1,
            None,
            &MediaPlayerCommand {
                media_url: Some("http://radio.example/stream".into()),
                announcement: Some(true),
                ..Default::default()
            },
        )
        .unwrap();
        let map = FieldMap::decode(&payload).unwrap();
        assert_eq!(map.bool(6), Some(true));
        assert_eq!(map.string(7), Some("http://radio.example/stream"));
        assert_eq!(map.bool(8), Some(true));
        assert_eq!(map.bool(9), Some(true));
    }

    #[test]
    fn test_lock_with_code() {
        let payload = lock(2, None, 1, Some("1234"));
        let map = FieldMap::decode(&payload).unwrap();
        assert_eq!(map.u32(2), Some(1));
        assert_eq!(map.bool(3), Some(true));
        assert_eq!(map.string(4), Some("1234"));
    }

    #[test]
    fn test_datetime_command_is_fixed32() {
        let payload = datetime(1, None, 1_700_000_000);
        let map = FieldMap::decode(&payload).unwrap();
        assert_eq!(map.fixed32(2), Some(1_700_000_000));
    }

    #[test]
    fn test_execute_service_args() {
        let service = ServiceInfo {
            key: 55,
            name: "demo".into(),
            args: vec![],
        };
        let payload = execute_service(
            &service,
            &[
                ServiceArgValue::Bool(true),
                ServiceArgValue::Int(-5),
                ServiceArgValue::Float(1.5),
                ServiceArgValue::String("hi".into()),
                ServiceArgValue::IntArray(vec![-1, 2]),
            ],
        );
        let map = FieldMap::decode(&payload).unwrap();
        assert_eq!(map.fixed32(1), Some(55));
        let args: Vec<&[u8]> = map.repeated_bytes(2).collect();
        assert_eq!(args.len(), 5);

        let first = FieldMap::decode(args[0]).unwrap();
        assert_eq!(first.bool(1), Some(true));

        // Signed args ride on zigzag varints.
        let second = FieldMap::decode(args[1]).unwrap();
        assert_eq!(second.varint(5), Some(9));

        let third = FieldMap::decode(args[2]).unwrap();
        assert_eq!(third.f32(3), Some(1.5));

        let fourth = FieldMap::decode(args[3]).unwrap();
        assert_eq!(fourth.string(4), Some("hi"));

        let fifth = FieldMap::decode(args[4]).unwrap();
        let ints: Vec<u64> = fifth.repeated_varints(7).collect();
        assert_eq!(ints, [1, 4]);
    }
}
