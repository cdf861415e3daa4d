//! Typed wrappers around the heterogeneous service resources of a location.

use crate::models::gardena::{
    CommonService, MowerService, PowerSocketService, SensorService, ServiceResource, ValveService,
    ValveSetService,
};
use log::debug;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    Common,
    Sensor,
    PowerSocket,
    ValveSet,
    Valve,
    Mower,
}

impl ServiceKind {
    /// Map the resource `type` discriminant to a kind; `None` for kinds we do not aggregate.
    pub fn from_wire(kind: &str) -> Option<Self> {
        match kind {
            "COMMON" => Some(ServiceKind::Common),
            "SENSOR" => Some(ServiceKind::Sensor),
            "POWER_SOCKET" => Some(ServiceKind::PowerSocket),
            "VALVE_SET" => Some(ServiceKind::ValveSet),
            "VALVE" => Some(ServiceKind::Valve),
            "MOWER" => Some(ServiceKind::Mower),
            _ => None,
        }
    }

    pub fn as_wire(self) -> &'static str {
        match self {
            ServiceKind::Common => "COMMON",
            ServiceKind::Sensor => "SENSOR",
            ServiceKind::PowerSocket => "POWER_SOCKET",
            ServiceKind::ValveSet => "VALVE_SET",
            ServiceKind::Valve => "VALVE",
            ServiceKind::Mower => "MOWER",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ServiceRecord {
    Common(CommonService),
    Sensor(SensorService),
    PowerSocket(PowerSocketService),
    ValveSet(ValveSetService),
    Valve(ValveService),
    Mower(MowerService),
}

impl ServiceRecord {
    /// Wrap one raw `included` item.
    ///
    /// Returns `None` for resources of an unrecognised kind and for resources
    /// whose shape does not match their kind; neither is an error.
    pub fn wrap(raw: Value) -> Option<Self> {
        let kind = raw.get("type").and_then(Value::as_str).and_then(ServiceKind::from_wire)?;
        let record = match kind {
            ServiceKind::Common => ServiceRecord::Common(decode(kind, raw)?),
            ServiceKind::Sensor => ServiceRecord::Sensor(decode(kind, raw)?),
            ServiceKind::PowerSocket => ServiceRecord::PowerSocket(decode(kind, raw)?),
            ServiceKind::ValveSet => ServiceRecord::ValveSet(decode(kind, raw)?),
            ServiceKind::Valve => ServiceRecord::Valve(decode(kind, raw)?),
            ServiceKind::Mower => ServiceRecord::Mower(decode(kind, raw)?),
        };
        Some(record)
    }

    pub fn kind(&self) -> ServiceKind {
        match self {
            ServiceRecord::Common(_) => ServiceKind::Common,
            ServiceRecord::Sensor(_) => ServiceKind::Sensor,
            ServiceRecord::PowerSocket(_) => ServiceKind::PowerSocket,
            ServiceRecord::ValveSet(_) => ServiceKind::ValveSet,
            ServiceRecord::Valve(_) => ServiceKind::Valve,
            ServiceRecord::Mower(_) => ServiceKind::Mower,
        }
    }

    /// Compound resource id, `""` when the API left it out.
    pub fn raw_id(&self) -> &str {
        let id = match self {
            ServiceRecord::Common(r) => &r.id,
            ServiceRecord::Sensor(r) => &r.id,
            ServiceRecord::PowerSocket(r) => &r.id,
            ServiceRecord::ValveSet(r) => &r.id,
            ServiceRecord::Valve(r) => &r.id,
            ServiceRecord::Mower(r) => &r.id,
        };
        id.as_deref().unwrap_or("")
    }

    /// Grouping key shared by every service of one physical device.
    pub fn device_key(&self) -> &str {
        device_key(self.raw_id())
    }
}

/// Prefix of a compound id up to the first `:`; the whole id when there is none.
pub fn device_key(raw_id: &str) -> &str {
    raw_id.split_once(':').map_or(raw_id, |(key, _)| key)
}

fn decode<A: DeserializeOwned>(kind: ServiceKind, raw: Value) -> Option<ServiceResource<A>> {
    match serde_json::from_value(raw) {
        Ok(resource) => Some(resource),
        Err(e) => {
            debug!("Dropping malformed {} resource: {}", kind, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::gardena::value_of;
    use serde_json::json;

    #[test]
    fn device_key_is_prefix_before_first_separator() {
        assert_eq!(device_key("abc:valve:1"), "abc");
        assert_eq!(device_key("abc"), "abc");
        assert_eq!(device_key(":common"), "");
        assert_eq!(device_key(""), "");
    }

    #[test]
    fn wraps_known_kinds() {
        let record = ServiceRecord::wrap(json!({
            "id": "dev-1:sensor",
            "type": "SENSOR",
            "attributes": { "soilHumidity": { "value": 30 } }
        }))
        .expect("sensor wrapped");
        assert_eq!(record.kind(), ServiceKind::Sensor);
        assert_eq!(record.raw_id(), "dev-1:sensor");
        assert_eq!(record.device_key(), "dev-1");
    }

    #[test]
    fn drops_unknown_and_malformed_resources() {
        assert_eq!(ServiceRecord::wrap(json!({ "id": "dev-1", "type": "DEVICE" })), None);
        assert_eq!(ServiceRecord::wrap(json!({ "id": "dev-1" })), None);
        assert_eq!(ServiceRecord::wrap(json!("not an object")), None);
        let malformed = json!({
            "id": "dev-1:sensor",
            "type": "SENSOR",
            "attributes": 17
        });
        assert_eq!(ServiceRecord::wrap(malformed), None);
    }

    #[test]
    fn odd_attribute_values_keep_the_record() {
        let record = ServiceRecord::wrap(json!({
            "id": "dev-1:sensor",
            "type": "SENSOR",
            "attributes": {
                "soilHumidity": { "value": "wet" },
                "ambientTemperature": { "value": 21.5 },
                "lightIntensity": { "value": 300 }
            }
        }))
        .expect("sensor wrapped");
        let ServiceRecord::Sensor(sensor) = record else {
            panic!("expected sensor record");
        };
        let attrs = sensor.attributes.expect("attributes present");
        assert_eq!(value_of(attrs.soil_humidity), None);
        assert_eq!(value_of(attrs.ambient_temperature), None);
        assert_eq!(value_of(attrs.light_intensity), Some(300));
    }

    #[test]
    fn missing_id_yields_empty_key() {
        let record = ServiceRecord::wrap(json!({ "type": "COMMON" })).expect("common wrapped");
        assert_eq!(record.raw_id(), "");
        assert_eq!(record.device_key(), "");
    }
}
