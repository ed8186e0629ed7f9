//! Decoders for the ListEntities*Response stream.
//!
//! Every family shares the same leading fields (`object_id = 1`,
//! `key = 2`, `name = 3`); the `device_id` field number differs per family
//! and lives in the static table below. Fields a family does not appear in
//! the table for are never guessed at.

use crate::model::{EntityInfo, EntityKind, ServiceArg, ServiceArgType, ServiceInfo};
use crate::wire::FieldMap;

use super::message::MessageType;

const FIELD_OBJECT_ID: u32 = 1;
const FIELD_KEY: u32 = 2;
const FIELD_NAME: u32 = 3;

/// Family-specific layout of a list-entities response.
#[derive(Clone, Copy, Debug)]
pub struct ListEntityFields {
    /// Entity family the message announces.
    pub kind: EntityKind,
    /// Field number carrying the sub-device id, if the family has one.
    pub device_id_field: u32,
}

/// Static table mapping list-entities message types to their family layout.
pub fn list_entity_fields(msg_type: MessageType) -> Option<ListEntityFields> {
    use EntityKind::*;
    use MessageType as M;
    let (kind, device_id_field) = match msg_type {
        M::ListEntitiesBinarySensorResponse => (BinarySensor, 10),
        M::ListEntitiesCoverResponse => (Cover, 13),
        M::ListEntitiesFanResponse => (Fan, 13),
        M::ListEntitiesLightResponse => (Light, 16),
        M::ListEntitiesSensorResponse => (Sensor, 14),
        M::ListEntitiesSwitchResponse => (Switch, 10),
        M::ListEntitiesTextSensorResponse => (TextSensor, 9),
        M::ListEntitiesCameraResponse => (Camera, 8),
        M::ListEntitiesClimateResponse => (Climate, 26),
        M::ListEntitiesNumberResponse => (Number, 14),
        M::ListEntitiesSelectResponse => (Select, 9),
        M::ListEntitiesSirenResponse => (Siren, 11),
        M::ListEntitiesLockResponse => (Lock, 12),
        M::ListEntitiesButtonResponse => (Button, 9),
        M::ListEntitiesMediaPlayerResponse => (MediaPlayer, 10),
        M::ListEntitiesAlarmControlPanelResponse => (AlarmControlPanel, 11),
        M::ListEntitiesTextResponse => (Text, 12),
        M::ListEntitiesDateResponse => (Date, 8),
        M::ListEntitiesTimeResponse => (Time, 8),
        M::ListEntitiesValveResponse => (Valve, 12),
        M::ListEntitiesDateTimeResponse => (DateTime, 8),
        M::ListEntitiesEventResponse => (Event, 10),
        M::ListEntitiesUpdateResponse => (Update, 9),
        _ => return None,
    };
    Some(ListEntityFields {
        kind,
        device_id_field,
    })
}

/// Decode one list-entities response into an [`EntityInfo`].
///
/// Returns `None` when `msg_type` is not a list-entities response or the
/// message is missing its wire key; the caller logs and ignores those.
pub fn decode_list_entity(msg_type: MessageType, map: &FieldMap) -> Option<EntityInfo> {
    let fields = list_entity_fields(msg_type)?;
    let key = map.fixed32(FIELD_KEY)?;
    Some(EntityInfo {
        key,
        kind: fields.kind,
        object_id: map.string(FIELD_OBJECT_ID).unwrap_or_default().to_string(),
        name: map.string(FIELD_NAME).unwrap_or_default().to_string(),
        device_id: map.u32(fields.device_id_field),
    })
}

/// Decode a ListEntitiesServicesResponse.
///
/// Layout: `name = 1`, `key = 2 (fixed32)`, `args = 3` repeated nested
/// messages of `name = 1`, `type = 2`.
pub fn decode_service(map: &FieldMap) -> Option<ServiceInfo> {
    let key = map.fixed32(2)?;
    let name = map.string(1).unwrap_or_default().to_string();
    let mut args = Vec::new();
    for raw in map.repeated_bytes(3) {
        let Ok(nested) = FieldMap::decode(raw) else {
            continue;
        };
        let arg_type = nested
            .varint(2)
            .and_then(ServiceArgType::from_wire)
            .unwrap_or(ServiceArgType::Bool);
        args.push(ServiceArg {
            name: nested.string(1).unwrap_or_default().to_string(),
            arg_type,
        });
    }
    Some(ServiceInfo { key, name, args })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::MessageBuilder;

    #[test]
    fn test_decode_switch_entity() {
        let payload = MessageBuilder::new()
            .string(1, "relay_1")
            .fixed32(2, 0xcafe)
            .string(3, "Relay 1")
            .varint(10, 2)
            .finish();
        let map = FieldMap::decode(&payload).unwrap();
        let entity = decode_list_entity(MessageType::ListEntitiesSwitchResponse, &map).unwrap();
        assert_eq!(entity.key, 0xcafe);
        assert_eq!(entity.kind, EntityKind::Switch);
        assert_eq!(entity.object_id, "relay_1");
        assert_eq!(entity.name, "Relay 1");
        assert_eq!(entity.device_id, Some(2));
        assert_eq!(entity.entity_id(), "switch-relay_1");
    }

    #[test]
    fn test_device_id_field_is_family_specific() {
        // Field 10 carries device_id for switches but not for covers.
        let payload = MessageBuilder::new()
            .string(1, "blind")
            .fixed32(2, 7)
            .string(3, "Blind")
            .varint(10, 5)
            .finish();
        let map = FieldMap::decode(&payload).unwrap();
        let cover = decode_list_entity(MessageType::ListEntitiesCoverResponse, &map).unwrap();
        assert_eq!(cover.device_id, None);

        let payload = MessageBuilder::new()
            .string(1, "blind")
            .fixed32(2, 7)
            .string(3, "Blind")
            .varint(13, 5)
            .finish();
        let map = FieldMap::decode(&payload).unwrap();
        let cover = decode_list_entity(MessageType::ListEntitiesCoverResponse, &map).unwrap();
        assert_eq!(cover.device_id, Some(5));
    }

    #[test]
    fn test_non_list_message_is_rejected() {
        let payload = MessageBuilder::new().fixed32(2, 1).finish();
        let map = FieldMap::decode(&payload).unwrap();
        assert!(decode_list_entity(MessageType::PingRequest, &map).is_none());
        assert!(decode_list_entity(MessageType::SwitchStateResponse, &map).is_none());
    }

    #[test]
    fn test_missing_key_is_rejected() {
        let payload = MessageBuilder::new().string(1, "x").finish();
        let map = FieldMap::decode(&payload).unwrap();
        assert!(decode_list_entity(MessageType::ListEntitiesSwitchResponse, &map).is_none());
    }

    #[test]
    fn test_decode_service_with_args() {
        let arg1 = MessageBuilder::new().string(1, "volume").varint(2, 2).finish();
        let arg2 = MessageBuilder::new().string(1, "song").varint(2, 3).finish();
        let payload = MessageBuilder::new()
            .string(1, "play_rtttl")
            .fixed32(2, 99)
            .message(3, &arg1)
            .message(3, &arg2)
            .finish();
        let map = FieldMap::decode(&payload).unwrap();
        let service = decode_service(&map).unwrap();
        assert_eq!(service.key, 99);
        assert_eq!(service.name, "play_rtttl");
        assert_eq!(service.args.len(), 2);
        assert_eq!(service.args[0].name, "volume");
        assert_eq!(service.args[0].arg_type, ServiceArgType::Float);
        assert_eq!(service.args[1].arg_type, ServiceArgType::String);
    }

    #[test]
    fn test_every_list_family_has_table_entry() {
        use MessageType as M;
        for msg in [
            M::ListEntitiesBinarySensorResponse,
            M::ListEntitiesCoverResponse,
            M::ListEntitiesFanResponse,
            M::ListEntitiesLightResponse,
            M::ListEntitiesSensorResponse,
            M::ListEntitiesSwitchResponse,
            M::ListEntitiesTextSensorResponse,
            M::ListEntitiesCameraResponse,
            M::ListEntitiesClimateResponse,
            M::ListEntitiesNumberResponse,
            M::ListEntitiesSelectResponse,
            M::ListEntitiesSirenResponse,
            M::ListEntitiesLockResponse,
            M::ListEntitiesButtonResponse,
            M::ListEntitiesMediaPlayerResponse,
            M::ListEntitiesAlarmControlPanelResponse,
            M::ListEntitiesTextResponse,
            M::ListEntitiesDateResponse,
            M::ListEntitiesTimeResponse,
            M::ListEntitiesValveResponse,
            M::ListEntitiesDateTimeResponse,
            M::ListEntitiesEventResponse,
            M::ListEntitiesUpdateResponse,
        ] {
            assert!(list_entity_fields(msg).is_some(), "{msg:?}");
        }
    }
}
