//! Command catalogs, one per controllable capability.
//!
//! Catalogs are process-wide constant tables. A command either takes a duration,
//! in which case it has a default used when the caller gives none, or it takes
//! no duration and ignores whatever the caller passes.

use crate::models::gardena::{CommandAttributes, CommandData, CommandRequest, ControlType};
use serde::Serialize;

/// Neutral description of a command, free of any request envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandPayload {
    pub control: ControlType,
    pub command: &'static str,
    pub seconds: Option<i64>,
}

impl CommandPayload {
    pub fn into_request(self, request_id: String) -> CommandRequest {
        CommandRequest {
            data: CommandData {
                id: request_id,
                r#type: self.control,
                attributes: CommandAttributes {
                    command: self.command.to_string(),
                    seconds: self.seconds,
                },
            },
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Command {
    pub control: ControlType,
    pub key: &'static str,
    default_seconds: Option<i64>,
}

impl Command {
    const fn timed(control: ControlType, key: &'static str, default_seconds: i64) -> Self {
        Command {
            control,
            key,
            default_seconds: Some(default_seconds),
        }
    }

    const fn untimed(control: ControlType, key: &'static str) -> Self {
        Command {
            control,
            key,
            default_seconds: None,
        }
    }

    /// Build the payload. `seconds` is used verbatim (zero and negatives included)
    /// for timed commands and ignored for untimed ones.
    pub fn build(&self, seconds: Option<i64>) -> CommandPayload {
        CommandPayload {
            control: self.control,
            command: self.key,
            seconds: self.default_seconds.map(|default| seconds.unwrap_or(default)),
        }
    }
}

pub const MOWER_DEFAULT_SECONDS: i64 = 1800;
pub const POWER_SOCKET_DEFAULT_SECONDS: i64 = 1800;
pub const VALVE_DEFAULT_SECONDS: i64 = 3600;

pub static MOWER_COMMANDS: [Command; 4] = [
    Command::timed(ControlType::MowerControl, "START_SECONDS_TO_OVERRIDE", MOWER_DEFAULT_SECONDS),
    Command::untimed(ControlType::MowerControl, "START_DONT_OVERRIDE"),
    Command::untimed(ControlType::MowerControl, "PARK_UNTIL_NEXT_TASK"),
    Command::untimed(ControlType::MowerControl, "PARK_UNTIL_FURTHER_NOTICE"),
];

pub static POWER_SOCKET_COMMANDS: [Command; 5] = [
    Command::timed(
        ControlType::PowerSocketControl,
        "START_SECONDS_TO_OVERRIDE",
        POWER_SOCKET_DEFAULT_SECONDS,
    ),
    Command::untimed(ControlType::PowerSocketControl, "START_OVERRIDE"),
    Command::untimed(ControlType::PowerSocketControl, "STOP_UNTIL_NEXT_TASK"),
    Command::untimed(ControlType::PowerSocketControl, "PAUSE"),
    Command::untimed(ControlType::PowerSocketControl, "UNPAUSE"),
];

pub static VALVE_COMMANDS: [Command; 4] = [
    Command::timed(ControlType::ValveControl, "START_SECONDS_TO_OVERRIDE", VALVE_DEFAULT_SECONDS),
    Command::untimed(ControlType::ValveControl, "STOP_UNTIL_NEXT_TASK"),
    Command::untimed(ControlType::ValveControl, "PAUSE"),
    Command::untimed(ControlType::ValveControl, "UNPAUSE"),
];

pub static VALVE_SET_COMMANDS: [Command; 1] = [Command::untimed(ControlType::ValveSetControl, "STOP_UNTIL_NEXT_TASK")];

/// Sensors are read-only.
pub static SENSOR_COMMANDS: [Command; 0] = [];

pub fn find(catalog: &'static [Command], key: &str) -> Option<&'static Command> {
    catalog.iter().find(|c| c.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(catalog: &[Command]) -> Vec<&'static str> {
        catalog.iter().map(|c| c.key).collect()
    }

    #[test]
    fn catalogs_are_closed_and_ordered() {
        assert_eq!(
            keys(&MOWER_COMMANDS),
            [
                "START_SECONDS_TO_OVERRIDE",
                "START_DONT_OVERRIDE",
                "PARK_UNTIL_NEXT_TASK",
                "PARK_UNTIL_FURTHER_NOTICE"
            ]
        );
        assert_eq!(
            keys(&POWER_SOCKET_COMMANDS),
            ["START_SECONDS_TO_OVERRIDE", "START_OVERRIDE", "STOP_UNTIL_NEXT_TASK", "PAUSE", "UNPAUSE"]
        );
        assert_eq!(
            keys(&VALVE_COMMANDS),
            ["START_SECONDS_TO_OVERRIDE", "STOP_UNTIL_NEXT_TASK", "PAUSE", "UNPAUSE"]
        );
        assert_eq!(keys(&VALVE_SET_COMMANDS), ["STOP_UNTIL_NEXT_TASK"]);
        assert!(SENSOR_COMMANDS.is_empty());
    }

    #[test]
    fn power_socket_start_uses_default_or_given_seconds() {
        let start = find(&POWER_SOCKET_COMMANDS, "START_SECONDS_TO_OVERRIDE").expect("command present");
        assert_eq!(start.build(None).seconds, Some(1800));
        assert_eq!(start.build(Some(45)).seconds, Some(45));
        assert_eq!(start.build(None).control, ControlType::PowerSocketControl);
    }

    #[test]
    fn valve_and_mower_defaults() {
        let valve = find(&VALVE_COMMANDS, "START_SECONDS_TO_OVERRIDE").expect("command present");
        assert_eq!(valve.build(None).seconds, Some(3600));
        let mower = find(&MOWER_COMMANDS, "START_SECONDS_TO_OVERRIDE").expect("command present");
        assert_eq!(mower.build(None).seconds, Some(1800));
    }

    #[test]
    fn given_seconds_are_not_validated() {
        let start = find(&VALVE_COMMANDS, "START_SECONDS_TO_OVERRIDE").expect("command present");
        assert_eq!(start.build(Some(0)).seconds, Some(0));
        assert_eq!(start.build(Some(-5)).seconds, Some(-5));
    }

    #[test]
    fn untimed_commands_ignore_seconds() {
        let pause = find(&POWER_SOCKET_COMMANDS, "PAUSE").expect("command present");
        assert_eq!(
            pause.build(Some(120)),
            CommandPayload {
                control: ControlType::PowerSocketControl,
                command: "PAUSE",
                seconds: None,
            }
        );
        let park = find(&MOWER_COMMANDS, "PARK_UNTIL_FURTHER_NOTICE").expect("command present");
        assert_eq!(park.build(Some(60)).seconds, None);
    }

    #[test]
    fn unknown_keys_are_not_found() {
        assert!(find(&VALVE_SET_COMMANDS, "PAUSE").is_none());
        assert!(find(&SENSOR_COMMANDS, "START_SECONDS_TO_OVERRIDE").is_none());
        assert!(find(&POWER_SOCKET_COMMANDS, "pause").is_none());
    }

    #[test]
    fn payload_becomes_request_envelope() {
        let payload = VALVE_COMMANDS[0].build(Some(900));
        let req = payload.into_request("req-7".into());
        assert_eq!(req.data.id, "req-7");
        assert_eq!(req.data.r#type, ControlType::ValveControl);
        assert_eq!(req.data.attributes.command, "START_SECONDS_TO_OVERRIDE");
        assert_eq!(req.data.attributes.seconds, Some(900));
    }
}
