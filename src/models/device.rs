//! Device entities merged from the service resources of one physical device.
//!
//! Every optional field means "not reported"; nothing is defaulted. The command
//! catalog of an entity depends only on its variant.

use crate::models::gardena::{
    BatteryState, MowerActivity, PowerSocketActivity, RfLinkState, ServiceState, ValveActivity,
};
use crate::services::commands::{
    Command, MOWER_COMMANDS, POWER_SOCKET_COMMANDS, SENSOR_COMMANDS, VALVE_COMMANDS,
    VALVE_SET_COMMANDS,
};
use crate::utils::serde_enum_name;
use serde::Serialize;
use std::fmt::{self, Display, Formatter};

/// Fields every device carries, sourced from its COMMON service.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceInfo {
    pub id: String,
    pub name: Option<String>,
    pub battery_level: Option<i32>,
    pub battery_state: Option<BatteryState>,
    pub rf_link_level: Option<i32>,
    pub rf_link_state: Option<RfLinkState>,
    pub serial: Option<String>,
    pub model_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorDevice {
    pub info: DeviceInfo,
    pub soil_humidity: Option<i32>,
    pub soil_temperature: Option<i32>,
    pub ambient_temperature: Option<i32>,
    pub light_intensity: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerSocketDevice {
    pub info: DeviceInfo,
    /// Id of the POWER_SOCKET service commands are addressed to.
    pub service_id: String,
    pub state: Option<ServiceState>,
    pub activity: Option<PowerSocketActivity>,
    /// Remaining on-time in seconds.
    pub duration: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Valve {
    pub id: String,
    pub name: Option<String>,
    pub state: Option<ServiceState>,
    pub activity: Option<ValveActivity>,
}

impl Valve {
    pub fn commands(&self) -> &'static [Command] {
        &VALVE_COMMANDS
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValveSetDevice {
    pub info: DeviceInfo,
    pub service_id: String,
    pub valve_set_state: Option<ServiceState>,
    pub valves: Vec<Valve>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MowerDevice {
    pub info: DeviceInfo,
    pub service_id: String,
    pub state: Option<ServiceState>,
    pub activity: Option<MowerActivity>,
    pub operating_hours: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Device {
    Sensor(SensorDevice),
    PowerSocket(PowerSocketDevice),
    ValveSet(ValveSetDevice),
    Mower(MowerDevice),
}

impl Device {
    pub fn info(&self) -> &DeviceInfo {
        match self {
            Device::Sensor(d) => &d.info,
            Device::PowerSocket(d) => &d.info,
            Device::ValveSet(d) => &d.info,
            Device::Mower(d) => &d.info,
        }
    }

    pub fn id(&self) -> &str {
        &self.info().id
    }

    pub fn type_label(&self) -> &'static str {
        match self {
            Device::Sensor(_) => "SensorDevice",
            Device::PowerSocket(_) => "PowerSocketDevice",
            Device::ValveSet(_) => "ValveSetDevice",
            Device::Mower(_) => "MowerDevice",
        }
    }

    /// Ordered command catalog of this variant.
    pub fn commands(&self) -> &'static [Command] {
        match self {
            Device::Sensor(_) => &SENSOR_COMMANDS,
            Device::PowerSocket(_) => &POWER_SOCKET_COMMANDS,
            Device::ValveSet(_) => &VALVE_SET_COMMANDS,
            Device::Mower(_) => &MOWER_COMMANDS,
        }
    }

    /// Service id commands are sent to; `None` for read-only devices.
    pub fn service_id(&self) -> Option<&str> {
        match self {
            Device::Sensor(_) => None,
            Device::PowerSocket(d) => Some(&d.service_id),
            Device::ValveSet(d) => Some(&d.service_id),
            Device::Mower(d) => Some(&d.service_id),
        }
    }
}

// Each helper starts a new line, so a rendered block never ends with a newline.

fn line<T: Display>(f: &mut Formatter<'_>, label: &str, value: Option<T>) -> fmt::Result {
    match value {
        Some(v) => write!(f, "\n{}: {}", label, v),
        None => Ok(()),
    }
}

fn enum_line<T: Serialize>(f: &mut Formatter<'_>, label: &str, value: Option<&T>) -> fmt::Result {
    line(f, label, value.and_then(serde_enum_name))
}

fn command_line(f: &mut Formatter<'_>, label: &str, catalog: &[Command]) -> fmt::Result {
    if catalog.is_empty() {
        return Ok(());
    }
    let keys = catalog.iter().map(|c| c.key).collect::<Vec<_>>().join(", ");
    write!(f, "\n{}: {}", label, keys)
}

impl Display for Valve {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "  - {} (ID: {})", self.name.as_deref().unwrap_or("Unknown"), self.id)?;
        if let Some(state) = self.state.as_ref().and_then(serde_enum_name) {
            write!(f, ", State: {}", state)?;
        }
        if let Some(activity) = self.activity.as_ref().and_then(serde_enum_name) {
            write!(f, ", Activity: {}", activity)?;
        }
        Ok(())
    }
}

impl Display for Device {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let info = self.info();
        write!(f, "Device: {}", info.name.as_deref().unwrap_or("Unknown"))?;
        write!(f, "\nID: {}", info.id)?;
        write!(f, "\nType: {}", self.type_label())?;
        line(f, "Serial", info.serial.as_deref())?;
        line(f, "Model", info.model_type.as_deref())?;
        line(f, "Battery", info.battery_level.map(|l| format!("{}%", l)))?;
        enum_line(f, "Battery State", info.battery_state.as_ref())?;
        line(f, "RF Link Level", info.rf_link_level)?;
        enum_line(f, "RF Link State", info.rf_link_state.as_ref())?;

        match self {
            Device::Sensor(d) => {
                line(f, "Soil Humidity", d.soil_humidity.map(|v| format!("{}%", v)))?;
                line(f, "Soil Temperature", d.soil_temperature.map(|v| format!("{} °C", v)))?;
                line(f, "Ambient Temperature", d.ambient_temperature.map(|v| format!("{} °C", v)))?;
                line(f, "Light Intensity", d.light_intensity.map(|v| format!("{} lx", v)))?;
            }
            Device::PowerSocket(d) => {
                enum_line(f, "State", d.state.as_ref())?;
                enum_line(f, "Activity", d.activity.as_ref())?;
                line(f, "Duration", d.duration.map(|s| format!("{}s", s)))?;
            }
            Device::ValveSet(d) => {
                enum_line(f, "Valve Set State", d.valve_set_state.as_ref())?;
                if !d.valves.is_empty() {
                    f.write_str("\nValves:")?;
                    for valve in &d.valves {
                        write!(f, "\n{}", valve)?;
                    }
                    command_line(f, "Valve Commands", &VALVE_COMMANDS)?;
                }
            }
            Device::Mower(d) => {
                enum_line(f, "State", d.state.as_ref())?;
                enum_line(f, "Activity", d.activity.as_ref())?;
                line(f, "Operating Hours", d.operating_hours)?;
            }
        }
        command_line(f, "Commands", self.commands())
    }
}
