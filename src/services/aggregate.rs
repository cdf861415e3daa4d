//! Rebuild device entities from the flat `included` array of a location.
//!
//! Resources are grouped by device key in first-seen order. Inside a group the
//! primary capability decides the variant with a fixed precedence:
//! SENSOR, then POWER_SOCKET, then VALVE_SET, then MOWER. A group with none of
//! these, or with an empty key, produces no device.

use crate::models::device::{
    Device, DeviceInfo, MowerDevice, PowerSocketDevice, SensorDevice, Valve, ValveSetDevice,
};
use crate::models::gardena::{
    value_of, CommonService, MowerService, PowerSocketService, SensorService, ValveService,
    ValveSetService,
};
use crate::services::records::ServiceRecord;
use log::{debug, warn};
use serde_json::Value;
use std::collections::HashMap;

/// Services of one device, at most one of each primary kind.
#[derive(Debug, Default)]
struct Partition {
    common: Option<CommonService>,
    sensor: Option<SensorService>,
    power_socket: Option<PowerSocketService>,
    valve_set: Option<ValveSetService>,
    mower: Option<MowerService>,
    valves: Vec<ValveService>,
}

impl Partition {
    fn add(&mut self, record: ServiceRecord) {
        match record {
            ServiceRecord::Common(r) => keep_first(&mut self.common, r),
            ServiceRecord::Sensor(r) => keep_first(&mut self.sensor, r),
            ServiceRecord::PowerSocket(r) => keep_first(&mut self.power_socket, r),
            ServiceRecord::ValveSet(r) => keep_first(&mut self.valve_set, r),
            ServiceRecord::Mower(r) => keep_first(&mut self.mower, r),
            ServiceRecord::Valve(r) => self.valves.push(r),
        }
    }

    fn primary_count(&self) -> usize {
        [
            self.sensor.is_some(),
            self.power_socket.is_some(),
            self.valve_set.is_some(),
            self.mower.is_some(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count()
    }

    fn into_device(self, key: String) -> Option<Device> {
        if self.primary_count() > 1 {
            warn!("Device {} exposes several primary services; keeping the highest-precedence one", key);
        }
        let info = device_info(key, self.common);

        if let Some(sensor) = self.sensor {
            let attrs = sensor.attributes.unwrap_or_default();
            return Some(Device::Sensor(SensorDevice {
                info,
                soil_humidity: value_of(attrs.soil_humidity),
                soil_temperature: value_of(attrs.soil_temperature),
                ambient_temperature: value_of(attrs.ambient_temperature),
                light_intensity: value_of(attrs.light_intensity),
            }));
        }
        if let Some(socket) = self.power_socket {
            let attrs = socket.attributes.unwrap_or_default();
            return Some(Device::PowerSocket(PowerSocketDevice {
                service_id: socket.id.unwrap_or_else(|| info.id.clone()),
                info,
                state: value_of(attrs.state),
                activity: value_of(attrs.activity),
                duration: value_of(attrs.duration),
            }));
        }
        if let Some(valve_set) = self.valve_set {
            let attrs = valve_set.attributes.unwrap_or_default();
            return Some(Device::ValveSet(ValveSetDevice {
                service_id: valve_set.id.unwrap_or_else(|| info.id.clone()),
                info,
                valve_set_state: value_of(attrs.state),
                valves: self.valves.into_iter().map(valve).collect(),
            }));
        }
        if let Some(mower) = self.mower {
            let attrs = mower.attributes.unwrap_or_default();
            return Some(Device::Mower(MowerDevice {
                service_id: mower.id.unwrap_or_else(|| info.id.clone()),
                info,
                state: value_of(attrs.state),
                activity: value_of(attrs.activity),
                operating_hours: value_of(attrs.operating_hours),
            }));
        }

        debug!("Device {} has no controllable or sensor service; skipped", info.id);
        None
    }
}

fn keep_first<T>(slot: &mut Option<T>, record: T) {
    if slot.is_none() {
        *slot = Some(record);
    }
}

fn device_info(id: String, common: Option<CommonService>) -> DeviceInfo {
    let attrs = common.and_then(|c| c.attributes).unwrap_or_default();
    DeviceInfo {
        id,
        name: value_of(attrs.name),
        battery_level: value_of(attrs.battery_level),
        battery_state: value_of(attrs.battery_state),
        rf_link_level: value_of(attrs.rf_link_level),
        rf_link_state: value_of(attrs.rf_link_state),
        serial: value_of(attrs.serial),
        model_type: value_of(attrs.model_type),
    }
}

fn valve(service: ValveService) -> Valve {
    let attrs = service.attributes.unwrap_or_default();
    Valve {
        id: service.id.unwrap_or_default(),
        name: value_of(attrs.name),
        state: value_of(attrs.state),
        activity: value_of(attrs.activity),
    }
}

/// Aggregate the `included` resources of a location into devices.
///
/// Total over any input: `None`, an empty list, or a list without a single
/// recognisable resource all yield an empty vector.
pub fn aggregate(included: Option<Vec<Value>>) -> Vec<Device> {
    let Some(items) = included else {
        return Vec::new();
    };

    let mut order: Vec<String> = Vec::new();
    let mut partitions: HashMap<String, Partition> = HashMap::new();
    for record in items.into_iter().filter_map(ServiceRecord::wrap) {
        let key = record.device_key().to_string();
        if key.is_empty() {
            debug!("Ignoring {} resource without device id", record.kind());
            continue;
        }
        let partition = partitions.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            Partition::default()
        });
        partition.add(record);
    }

    order
        .into_iter()
        .filter_map(|key| {
            let partition = partitions.remove(&key)?;
            partition.into_device(key)
        })
        .collect()
}
