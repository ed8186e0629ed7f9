//! Message type registry.
//!
//! The numeric identifiers appear on the wire in every frame header and are
//! fixed by the protocol.

/// Every message type the client sends or understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
#[allow(missing_docs)]
pub enum MessageType {
    HelloRequest = 1,
    HelloResponse = 2,
    ConnectRequest = 3,
    ConnectResponse = 4,
    DisconnectRequest = 5,
    DisconnectResponse = 6,
    PingRequest = 7,
    PingResponse = 8,
    DeviceInfoRequest = 9,
    DeviceInfoResponse = 10,
    ListEntitiesRequest = 11,
    ListEntitiesBinarySensorResponse = 12,
    ListEntitiesCoverResponse = 13,
    ListEntitiesFanResponse = 14,
    ListEntitiesLightResponse = 15,
    ListEntitiesSensorResponse = 16,
    ListEntitiesSwitchResponse = 17,
    ListEntitiesTextSensorResponse = 18,
    ListEntitiesDoneResponse = 19,
    SubscribeStatesRequest = 20,
    BinarySensorStateResponse = 21,
    CoverStateResponse = 22,
    FanStateResponse = 23,
    LightStateResponse = 24,
    SensorStateResponse = 25,
    SwitchStateResponse = 26,
    TextSensorStateResponse = 27,
    SubscribeLogsRequest = 28,
    SubscribeLogsResponse = 29,
    CoverCommandRequest = 30,
    FanCommandRequest = 31,
    LightCommandRequest = 32,
    SwitchCommandRequest = 33,
    GetTimeRequest = 36,
    GetTimeResponse = 37,
    ListEntitiesServicesResponse = 41,
    ExecuteServiceRequest = 42,
    ListEntitiesCameraResponse = 43,
    CameraImageResponse = 44,
    CameraImageRequest = 45,
    ListEntitiesClimateResponse = 46,
    ClimateStateResponse = 47,
    ClimateCommandRequest = 48,
    ListEntitiesNumberResponse = 49,
    NumberStateResponse = 50,
    NumberCommandRequest = 51,
    ListEntitiesSelectResponse = 52,
    SelectStateResponse = 53,
    SelectCommandRequest = 54,
    ListEntitiesSirenResponse = 55,
    SirenStateResponse = 56,
    SirenCommandRequest = 57,
    ListEntitiesLockResponse = 58,
    LockStateResponse = 59,
    LockCommandRequest = 60,
    ListEntitiesButtonResponse = 61,
    ButtonCommandRequest = 62,
    ListEntitiesMediaPlayerResponse = 63,
    MediaPlayerStateResponse = 64,
    MediaPlayerCommandRequest = 65,
    SubscribeVoiceAssistantRequest = 89,
    VoiceAssistantRequest = 90,
    VoiceAssistantResponse = 91,
    VoiceAssistantEventResponse = 92,
    ListEntitiesAlarmControlPanelResponse = 94,
    AlarmControlPanelStateResponse = 95,
    AlarmControlPanelCommandRequest = 96,
    ListEntitiesTextResponse = 97,
    TextStateResponse = 98,
    TextCommandRequest = 99,
    ListEntitiesDateResponse = 100,
    DateStateResponse = 101,
    DateCommandRequest = 102,
    ListEntitiesTimeResponse = 103,
    TimeStateResponse = 104,
    TimeCommandRequest = 105,
    VoiceAssistantAudio = 106,
    ListEntitiesEventResponse = 107,
    EventResponse = 108,
    ListEntitiesValveResponse = 109,
    ValveStateResponse = 110,
    ValveCommandRequest = 111,
    ListEntitiesDateTimeResponse = 112,
    DateTimeStateResponse = 113,
    DateTimeCommandRequest = 114,
    VoiceAssistantTimerEventResponse = 115,
    ListEntitiesUpdateResponse = 116,
    UpdateStateResponse = 117,
    UpdateCommandRequest = 118,
    VoiceAssistantAnnounceRequest = 119,
    VoiceAssistantAnnounceFinished = 120,
    VoiceAssistantConfigurationRequest = 121,
    VoiceAssistantConfigurationResponse = 122,
    VoiceAssistantSetConfiguration = 123,
    NoiseEncryptionSetKeyRequest = 124,
    NoiseEncryptionSetKeyResponse = 125,
}

impl MessageType {
    /// All known message types.
    pub const ALL: &'static [MessageType] = &[
        Self::HelloRequest,
        Self::HelloResponse,
        Self::ConnectRequest,
        Self::ConnectResponse,
        Self::DisconnectRequest,
        Self::DisconnectResponse,
        Self::PingRequest,
        Self::PingResponse,
        Self::DeviceInfoRequest,
        Self::DeviceInfoResponse,
        Self::ListEntitiesRequest,
        Self::ListEntitiesBinarySensorResponse,
        Self::ListEntitiesCoverResponse,
        Self::ListEntitiesFanResponse,
        Self::ListEntitiesLightResponse,
        Self::ListEntitiesSensorResponse,
        Self::ListEntitiesSwitchResponse,
        Self::ListEntitiesTextSensorResponse,
        Self::ListEntitiesDoneResponse,
        Self::SubscribeStatesRequest,
        Self::BinarySensorStateResponse,
        Self::CoverStateResponse,
        Self::FanStateResponse,
        Self::LightStateResponse,
        Self::SensorStateResponse,
        Self::SwitchStateResponse,
        Self::TextSensorStateResponse,
        Self::SubscribeLogsRequest,
        Self::SubscribeLogsResponse,
        Self::CoverCommandRequest,
        Self::FanCommandRequest,
        Self::LightCommandRequest,
        Self::SwitchCommandRequest,
        Self::GetTimeRequest,
        Self::GetTimeResponse,
        Self::ListEntitiesServicesResponse,
        Self::ExecuteServiceRequest,
        Self::ListEntitiesCameraResponse,
        Self::CameraImageResponse,
        Self::CameraImageRequest,
        Self::ListEntitiesClimateResponse,
        Self::ClimateStateResponse,
        Self::ClimateCommandRequest,
        Self::ListEntitiesNumberResponse,
        Self::NumberStateResponse,
        Self::NumberCommandRequest,
        Self::ListEntitiesSelectResponse,
        Self::SelectStateResponse,
        Self::SelectCommandRequest,
        Self::ListEntitiesSirenResponse,
        Self::SirenStateResponse,
        Self::SirenCommandRequest,
        Self::ListEntitiesLockResponse,
        Self::LockStateResponse,
        Self::LockCommandRequest,
        Self::ListEntitiesButtonResponse,
        Self::ButtonCommandRequest,
        Self::ListEntitiesMediaPlayerResponse,
        Self::MediaPlayerStateResponse,
        Self::MediaPlayerCommandRequest,
        Self::SubscribeVoiceAssistantRequest,
        Self::VoiceAssistantRequest,
        Self::VoiceAssistantResponse,
        Self::VoiceAssistantEventResponse,
        Self::ListEntitiesAlarmControlPanelResponse,
        Self::AlarmControlPanelStateResponse,
        Self::AlarmControlPanelCommandRequest,
        Self::ListEntitiesTextResponse,
        Self::TextStateResponse,
        Self::TextCommandRequest,
        Self::ListEntitiesDateResponse,
        Self::DateStateResponse,
        Self::DateCommandRequest,
        Self::ListEntitiesTimeResponse,
        Self::TimeStateResponse,
        Self::TimeCommandRequest,
        Self::VoiceAssistantAudio,
        Self::ListEntitiesEventResponse,
        Self::EventResponse,
        Self::ListEntitiesValveResponse,
        Self::ValveStateResponse,
        Self::ValveCommandRequest,
        Self::ListEntitiesDateTimeResponse,
        Self::DateTimeStateResponse,
        Self::DateTimeCommandRequest,
        Self::VoiceAssistantTimerEventResponse,
        Self::ListEntitiesUpdateResponse,
        Self::UpdateStateResponse,
        Self::UpdateCommandRequest,
        Self::VoiceAssistantAnnounceRequest,
        Self::VoiceAssistantAnnounceFinished,
        Self::VoiceAssistantConfigurationRequest,
        Self::VoiceAssistantConfigurationResponse,
        Self::VoiceAssistantSetConfiguration,
        Self::NoiseEncryptionSetKeyRequest,
        Self::NoiseEncryptionSetKeyResponse,
    ];

    /// Wire identifier.
    pub const fn wire_id(self) -> u16 {
        self as u16
    }

    /// Resolve a wire identifier; `None` for unknown types.
    pub fn from_wire(value: u64) -> Option<Self> {
        let value = u16::try_from(value).ok()?;
        Self::ALL
            .iter()
            .copied()
            .find(|ty| ty.wire_id() == value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_ids_are_contract() {
        assert_eq!(MessageType::HelloRequest.wire_id(), 1);
        assert_eq!(MessageType::ListEntitiesDoneResponse.wire_id(), 19);
        assert_eq!(MessageType::SubscribeStatesRequest.wire_id(), 20);
        assert_eq!(MessageType::GetTimeRequest.wire_id(), 36);
        assert_eq!(MessageType::ListEntitiesServicesResponse.wire_id(), 41);
        assert_eq!(MessageType::MediaPlayerCommandRequest.wire_id(), 65);
        assert_eq!(MessageType::SubscribeVoiceAssistantRequest.wire_id(), 89);
        assert_eq!(MessageType::VoiceAssistantTimerEventResponse.wire_id(), 115);
        assert_eq!(MessageType::NoiseEncryptionSetKeyResponse.wire_id(), 125);
    }

    #[test]
    fn test_from_wire_roundtrip() {
        for &ty in MessageType::ALL {
            assert_eq!(MessageType::from_wire(u64::from(ty.wire_id())), Some(ty));
        }
    }

    #[test]
    fn test_from_wire_unknown() {
        assert_eq!(MessageType::from_wire(0), None);
        assert_eq!(MessageType::from_wire(34), None);
        assert_eq!(MessageType::from_wire(1000), None);
        assert_eq!(MessageType::from_wire(u64::MAX), None);
    }
}
