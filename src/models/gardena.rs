//! Wire models for the GARDENA smart system API (v2, JSON:API flavoured).
//!
//! Scope: types only. Resources inside a location's `included` array stay as
//! raw `serde_json::Value`s until `services::records` recognises their kind.
//!
//! Notes
//! - Every attribute is wrapped as `{ "value": ..., "timestamp": ... }`; both parts may be absent
//!   or unreadable, and either way they decode to `None`.
//! - Enum fields fall back to `Unknown` for values this crate does not know yet.

use chrono::{DateTime, Utc};
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// =====================
// Attribute wrapper
// =====================

/// Decoding never fails: a part that is missing or does not fit its type is
/// `None`, so one odd attribute cannot invalidate the resource around it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timestamped<T> {
    pub value: Option<T>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Timestamped<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Ok(Timestamped {
            value: lenient_field(&raw, "value"),
            timestamp: lenient_field(&raw, "timestamp"),
        })
    }
}

fn lenient_field<T: DeserializeOwned>(raw: &Value, name: &str) -> Option<T> {
    let field = raw.get(name)?;
    match T::deserialize(field) {
        Ok(v) => Some(v),
        Err(e) => {
            debug!("Ignoring attribute {} {}: {}", name, field, e);
            None
        }
    }
}

/// Unwrap an optional attribute into its optional value.
pub fn value_of<T>(attr: Option<Timestamped<T>>) -> Option<T> {
    attr.and_then(|a| a.value)
}

// =====================
// Enums
// =====================

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatteryState {
    Ok,
    Low,
    ReplaceNow,
    OutOfOperation,
    Charging,
    NoBattery,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RfLinkState {
    Online,
    Offline,
    #[serde(other)]
    Unknown,
}

/// Health of a controllable service (power socket, valve, valve set, mower).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceState {
    Ok,
    Warning,
    Error,
    Unavailable,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PowerSocketActivity {
    Off,
    ForeverOn,
    TimeLimitedOn,
    ScheduledOn,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValveActivity {
    Closed,
    ManualWatering,
    ScheduledWatering,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MowerActivity {
    Paused,
    OkCutting,
    OkCuttingTimerOverridden,
    OkSearching,
    OkLeaving,
    OkCharging,
    Parked,
    ParkedTimer,
    ParkedParkSelected,
    ParkedAutotimer,
    ParkedFrostSensor,
    StoppedInGarden,
    SearchingForSatellites,
    #[serde(rename = "NONE")]
    None_,
    #[serde(other)]
    Unknown,
}

/// Capability category a command is addressed to; doubles as the command `type` on the wire.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlType {
    MowerControl,
    PowerSocketControl,
    ValveControl,
    ValveSetControl,
}

// =====================
// Locations
// =====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LocationAttributes {
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Location {
    pub id: String,
    #[serde(rename = "type")]
    pub r#type: Option<String>,
    pub attributes: Option<LocationAttributes>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LocationsResponse {
    #[serde(default)]
    pub data: Vec<Location>,
}

/// A single location with every device and service resource it contains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LocationResponse {
    pub data: Location,
    pub included: Option<Vec<Value>>,
}

// =====================
// Service resources
// =====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CommonAttributes {
    pub name: Option<Timestamped<String>>,
    pub battery_level: Option<Timestamped<i32>>,
    pub battery_state: Option<Timestamped<BatteryState>>,
    pub rf_link_level: Option<Timestamped<i32>>,
    pub rf_link_state: Option<Timestamped<RfLinkState>>,
    pub serial: Option<Timestamped<String>>,
    pub model_type: Option<Timestamped<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SensorAttributes {
    pub soil_humidity: Option<Timestamped<i32>>,
    pub soil_temperature: Option<Timestamped<i32>>,
    pub ambient_temperature: Option<Timestamped<i32>>,
    pub light_intensity: Option<Timestamped<i32>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PowerSocketAttributes {
    pub state: Option<Timestamped<ServiceState>>,
    pub activity: Option<Timestamped<PowerSocketActivity>>,
    pub duration: Option<Timestamped<i64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ValveSetAttributes {
    pub state: Option<Timestamped<ServiceState>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ValveAttributes {
    pub name: Option<Timestamped<String>>,
    pub state: Option<Timestamped<ServiceState>>,
    pub activity: Option<Timestamped<ValveActivity>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MowerAttributes {
    pub state: Option<Timestamped<ServiceState>>,
    pub activity: Option<Timestamped<MowerActivity>>,
    pub operating_hours: Option<Timestamped<i64>>,
}

/// One service resource: `id` is `"<deviceId>[:<suffix>...]"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ServiceResource<A> {
    pub id: Option<String>,
    pub attributes: Option<A>,
}

pub type CommonService = ServiceResource<CommonAttributes>;
pub type SensorService = ServiceResource<SensorAttributes>;
pub type PowerSocketService = ServiceResource<PowerSocketAttributes>;
pub type ValveSetService = ServiceResource<ValveSetAttributes>;
pub type ValveService = ServiceResource<ValveAttributes>;
pub type MowerService = ServiceResource<MowerAttributes>;

// =====================
// Commands
// =====================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandAttributes {
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seconds: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandData {
    pub id: String,
    #[serde(rename = "type")]
    pub r#type: ControlType,
    pub attributes: CommandAttributes,
}

/// Body of `PUT /command/{serviceId}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandRequest {
    pub data: CommandData,
}
