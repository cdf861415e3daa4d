use crate::models::device::Device;
use crate::services::commands::{self, Command, CommandPayload};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{self, Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// No device (or valve) with this id in the current snapshot
    DeviceNotFound(String),
    /// The device exists but its catalog has no such command
    UnsupportedCommand { device_id: String, command: String },
}

impl Display for DispatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::DeviceNotFound(id) => write!(f, "Could not find device for id {}", id),
            DispatchError::UnsupportedCommand { device_id, command } => {
                write!(f, "device with id {} does not support {}", device_id, command)
            }
        }
    }
}

impl Error for DispatchError {}

/// A built command and the service it must be sent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub service_id: String,
    pub payload: CommandPayload,
}

/// Devices of one location snapshot, addressable by id.
#[derive(Debug, Clone, Default)]
pub struct DeviceIndex {
    devices: HashMap<String, Device>,
}

impl DeviceIndex {
    pub fn new(devices: Vec<Device>) -> Self {
        let devices = devices.into_iter().map(|d| (d.id().to_string(), d)).collect();
        DeviceIndex { devices }
    }

    pub fn get(&self, device_id: &str) -> Option<&Device> {
        self.devices.get(device_id)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Resolve an id to its catalog and command target. Device ids win; otherwise
    /// the id may name a valve of one of the valve sets.
    fn target(&self, id: &str) -> Option<(&'static [Command], &str)> {
        if let Some(device) = self.devices.get(id) {
            return Some((device.commands(), device.service_id().unwrap_or(device.id())));
        }
        self.devices.values().find_map(|device| match device {
            Device::ValveSet(set) => set
                .valves
                .iter()
                .find(|v| v.id == id)
                .map(|v| (v.commands(), v.id.as_str())),
            _ => None,
        })
    }

    /// Build the payload for `command` on `device_id`. No side effects.
    pub fn dispatch(&self, device_id: &str, command: &str, seconds: Option<i64>) -> Result<Dispatch, DispatchError> {
        let (catalog, service_id) = self
            .target(device_id)
            .ok_or_else(|| DispatchError::DeviceNotFound(device_id.to_string()))?;
        let definition = commands::find(catalog, command).ok_or_else(|| DispatchError::UnsupportedCommand {
            device_id: device_id.to_string(),
            command: command.to_string(),
        })?;
        Ok(Dispatch {
            service_id: service_id.to_string(),
            payload: definition.build(seconds),
        })
    }
}
