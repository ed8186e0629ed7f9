//! Entity, service and device metadata types.

use std::fmt;

/// Entity families a device can expose.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum EntityKind {
    /// On/off sensor.
    BinarySensor,
    /// Positional cover (blind, garage door, awning).
    Cover,
    /// Fan.
    Fan,
    /// Light.
    Light,
    /// Numeric sensor.
    Sensor,
    /// Switch.
    Switch,
    /// String-valued sensor.
    TextSensor,
    /// Camera.
    Camera,
    /// Climate / thermostat.
    Climate,
    /// Settable number.
    Number,
    /// Option selector.
    Select,
    /// Siren.
    Siren,
    /// Lock.
    Lock,
    /// Momentary button.
    Button,
    /// Media player.
    MediaPlayer,
    /// Alarm control panel.
    AlarmControlPanel,
    /// Settable text.
    Text,
    /// Settable date.
    Date,
    /// Settable time of day.
    Time,
    /// Valve.
    Valve,
    /// Settable date and time.
    DateTime,
    /// Fire-and-forget event source.
    Event,
    /// Firmware update slot.
    Update,
}

impl EntityKind {
    /// Canonical lowercase name, used as the string-id prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BinarySensor => "binary_sensor",
            Self::Cover => "cover",
            Self::Fan => "fan",
            Self::Light => "light",
            Self::Sensor => "sensor",
            Self::Switch => "switch",
            Self::TextSensor => "text_sensor",
            Self::Camera => "camera",
            Self::Climate => "climate",
            Self::Number => "number",
            Self::Select => "select",
            Self::Siren => "siren",
            Self::Lock => "lock",
            Self::Button => "button",
            Self::MediaPlayer => "media_player",
            Self::AlarmControlPanel => "alarm_control_panel",
            Self::Text => "text",
            Self::Date => "date",
            Self::Time => "time",
            Self::Valve => "valve",
            Self::DateTime => "datetime",
            Self::Event => "event",
            Self::Update => "update",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One discovered entity.
///
/// `key` is the wire identity; `entity_id` is the host-facing string id
/// derived as `"<kind>-<object_id>"`, lowercased.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityInfo {
    /// Wire key, unique within a session.
    pub key: u32,
    /// Entity family.
    pub kind: EntityKind,
    /// Identifier token configured on the device.
    pub object_id: String,
    /// Display name.
    pub name: String,
    /// Sub-device the entity belongs to, when the device reports one.
    pub device_id: Option<u32>,
}

impl EntityInfo {
    /// Derived string id. Uses `object_id` rather than the display name so
    /// the result stays a stable identifier token.
    pub fn entity_id(&self) -> String {
        format!("{}-{}", self.kind.as_str(), self.object_id).to_lowercase()
    }
}

/// Argument types a user-defined service can declare.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServiceArgType {
    /// Boolean.
    Bool,
    /// Signed integer.
    Int,
    /// 32-bit float.
    Float,
    /// UTF-8 string.
    String,
    /// Array of booleans.
    BoolArray,
    /// Array of signed integers.
    IntArray,
    /// Array of floats.
    FloatArray,
    /// Array of strings.
    StringArray,
}

impl ServiceArgType {
    /// Decode the wire enum value.
    pub fn from_wire(value: u64) -> Option<Self> {
        match value {
            0 => Some(Self::Bool),
            1 => Some(Self::Int),
            2 => Some(Self::Float),
            3 => Some(Self::String),
            4 => Some(Self::BoolArray),
            5 => Some(Self::IntArray),
            6 => Some(Self::FloatArray),
            7 => Some(Self::StringArray),
            _ => None,
        }
    }
}

/// One declared argument of a user-defined service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceArg {
    /// Argument name.
    pub name: String,
    /// Declared type.
    pub arg_type: ServiceArgType,
}

/// One user-defined service exposed by the device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceInfo {
    /// Wire key used by ExecuteService.
    pub key: u32,
    /// Service name.
    pub name: String,
    /// Declared arguments, in declaration order.
    pub args: Vec<ServiceArg>,
}

/// Device metadata from DeviceInfoResponse.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Whether the device is password-protected. Read but never acted on.
    pub uses_password: bool,
    /// Node name.
    pub name: String,
    /// MAC address in colon-separated hex.
    pub mac_address: String,
    /// Firmware version string.
    pub esphome_version: String,
    /// Firmware build timestamp.
    pub compilation_time: String,
    /// Board model.
    pub model: String,
    /// Whether the device deep-sleeps between connections.
    pub has_deep_sleep: bool,
    /// Project name, when the firmware declares one.
    pub project_name: String,
    /// Project version, when the firmware declares one.
    pub project_version: String,
    /// Port of the built-in web server, 0 when disabled.
    pub webserver_port: u32,
    /// Board manufacturer.
    pub manufacturer: String,
    /// Human-friendly device name.
    pub friendly_name: String,
}

/// Log levels for the device log subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Logging disabled.
    None,
    /// Errors only.
    Error,
    /// Warnings and up.
    Warn,
    /// Informational and up.
    Info,
    /// Configuration dumps.
    Config,
    /// Debug and up.
    Debug,
    /// Verbose.
    Verbose,
    /// Everything.
    VeryVerbose,
}

impl LogLevel {
    /// Wire enum value.
    pub fn to_wire(self) -> u64 {
        match self {
            Self::None => 0,
            Self::Error => 1,
            Self::Warn => 2,
            Self::Info => 3,
            Self::Config => 4,
            Self::Debug => 5,
            Self::Verbose => 6,
            Self::VeryVerbose => 7,
        }
    }

    /// Decode the wire enum value.
    pub fn from_wire(value: u64) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Error),
            2 => Some(Self::Warn),
            3 => Some(Self::Info),
            4 => Some(Self::Config),
            5 => Some(Self::Debug),
            6 => Some(Self::Verbose),
            7 => Some(Self::VeryVerbose),
            _ => None,
        }
    }
}
