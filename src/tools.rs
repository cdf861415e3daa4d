//! Tool declarations and handlers exposed over the protocol loop.
//!
//! - `list_locations`: every location of the account.
//! - `get_devices`: aggregated devices of one location, rendered as text blocks.
//! - `send_command`: resolve a device (or valve) and send one catalog command.
//!
//! Handlers never fail the protocol. Every problem becomes a [`ToolResult`]
//! with `is_error` set and a message naming the offending input.

use crate::client::SmartSystem;
use crate::services::aggregate::aggregate;
use crate::services::dispatch::DeviceIndex;
use crate::utils::join_blocks;
use log::{debug, info, warn};
use rmcp::model::{CallToolResult, Content, JsonObject, Tool};
use serde_json::{Value, json};
use std::sync::Arc;

fn tool(name: &'static str, description: &'static str, schema: Value) -> Tool {
    let input_schema = match schema {
        Value::Object(map) => map,
        _ => JsonObject::new(),
    };
    Tool {
        name: name.into(),
        description: Some(description.into()),
        input_schema: Arc::new(input_schema),
        annotations: None,
    }
}

pub fn tool_definitions() -> Vec<Tool> {
    vec![
        tool(
            "list_locations",
            "Get all locations for the authenticated user.",
            json!({
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }),
        ),
        tool(
            "get_devices",
            "Get all devices of a location with their current state and supported commands.",
            json!({
                "type": "object",
                "properties": {
                    "locationId": {
                        "type": "string",
                        "description": "Location id as returned by list_locations."
                    }
                },
                "required": ["locationId"],
                "additionalProperties": false
            }),
        ),
        tool(
            "send_command",
            "Send a command to a device (mower, power socket, valve set) or to a single valve.",
            json!({
                "type": "object",
                "properties": {
                    "locationId": {
                        "type": "string",
                        "description": "Location the device belongs to."
                    },
                    "deviceId": {
                        "type": "string",
                        "description": "Device id, or valve id for a single valve, as returned by get_devices."
                    },
                    "command": {
                        "type": "string",
                        "description": "One of the command keys listed for the device, e.g. START_SECONDS_TO_OVERRIDE."
                    },
                    "seconds": {
                        "type": "integer",
                        "description": "Duration for START_SECONDS_TO_OVERRIDE. Ignored by other commands."
                    }
                },
                "required": ["locationId", "deviceId", "command"],
                "additionalProperties": false
            }),
        ),
    ]
}

/// Outcome of one tool call: a single text block, flagged when it reports a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub text: String,
    pub is_error: bool,
}

impl ToolResult {
    fn success(text: impl Into<String>) -> Self {
        ToolResult {
            text: text.into(),
            is_error: false,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!("Tool call failed: {}", message);
        ToolResult {
            text: format!("Error: {}", message),
            is_error: true,
        }
    }

    pub fn into_call_result(self) -> CallToolResult {
        let content = vec![Content::text(self.text)];
        if self.is_error {
            CallToolResult::error(content)
        } else {
            CallToolResult::success(content)
        }
    }
}

pub fn handle_tool_call(name: &str, args: &Value, api: &dyn SmartSystem) -> ToolResult {
    debug!("Tool call {} {}", name, args);
    match name {
        "list_locations" => handle_list_locations(api),
        "get_devices" => handle_get_devices(args, api),
        "send_command" => handle_send_command(args, api),
        _ => ToolResult::error(format!("Unknown tool: {}", name)),
    }
}

fn str_arg<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Fetch required string arguments, or an error naming every missing one.
fn required<'a, const N: usize>(args: &'a Value, keys: [&str; N]) -> Result<[&'a str; N], ToolResult> {
    let values = keys.map(|k| str_arg(args, k));
    let missing = keys
        .iter()
        .zip(values.iter())
        .filter(|(_, v)| v.is_none())
        .map(|(k, _)| *k)
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        let verb = if missing.len() == 1 { "is" } else { "are" };
        return Err(ToolResult::error(format!("{} {} required", missing.join(", "), verb)));
    }
    Ok(values.map(Option::unwrap_or_default))
}

/// `seconds` may arrive as a JSON integer or as a numeric string.
fn seconds_arg(args: &Value) -> Result<Option<i64>, ToolResult> {
    match args.get("seconds") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| ToolResult::error(format!("seconds must be an integer, got {}", n))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| ToolResult::error(format!("seconds must be an integer, got {:?}", s))),
        Some(other) => Err(ToolResult::error(format!("seconds must be an integer, got {}", other))),
    }
}

fn handle_list_locations(api: &dyn SmartSystem) -> ToolResult {
    let locations = match api.get_locations() {
        Ok(l) => l,
        Err(e) => return ToolResult::error(format!("failed to list locations: {}", e)),
    };
    info!("Listed {} location(s)", locations.data.len());
    let blocks = locations.data.iter().map(|location| {
        let name = location
            .attributes
            .as_ref()
            .and_then(|a| a.name.as_deref())
            .unwrap_or("Unknown");
        format!("Location: {}\nID: {}", name, location.id)
    });
    ToolResult::success(join_blocks(blocks))
}

fn handle_get_devices(args: &Value, api: &dyn SmartSystem) -> ToolResult {
    let [location_id] = match required(args, ["locationId"]) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let location = match api.get_location(location_id) {
        Ok(l) => l,
        Err(e) => return ToolResult::error(format!("failed to fetch location {}: {}", location_id, e)),
    };
    let devices = aggregate(location.included);
    info!("Location {} has {} device(s)", location_id, devices.len());
    ToolResult::success(join_blocks(devices.iter().map(ToString::to_string)))
}

fn handle_send_command(args: &Value, api: &dyn SmartSystem) -> ToolResult {
    let [location_id, device_id, command] = match required(args, ["locationId", "deviceId", "command"]) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let seconds = match seconds_arg(args) {
        Ok(s) => s,
        Err(e) => return e,
    };

    let location = match api.get_location(location_id) {
        Ok(l) => l,
        Err(e) => return ToolResult::error(format!("failed to fetch location {}: {}", location_id, e)),
    };
    let index = DeviceIndex::new(aggregate(location.included));
    debug!("Indexed {} device(s) of location {}", index.len(), location_id);
    let dispatch = match index.dispatch(device_id, command, seconds) {
        Ok(d) => d,
        Err(e) => return ToolResult::error(e.to_string()),
    };
    if let Some(device) = index.get(device_id) {
        debug!("Resolved {} as {}", device_id, device.type_label());
    }

    if let Err(e) = api.send_command(&dispatch.service_id, &dispatch.payload) {
        return ToolResult::error(format!("failed to send {} to device {}: {}", command, device_id, e));
    }
    ToolResult::success(format!("Sent command {} to device {}", command, device_id))
}
