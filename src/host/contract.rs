//! Newline-delimited JSON contract for the host bridge.
//!
//! Requests carry a `cmd` tag and an optional `request_id` that is echoed
//! back. A line that is not a JSON object is taken as alarm text.

use crate::scheduler::{Firing, TriggerId};
use chime_grammar::AlarmSpec;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Event name for firing notifications.
pub const ALARM_FIRED_EVENT: &str = "alarm.fired";

/// Commands accepted on stdin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd")]
pub enum Command {
    /// Interpret `text` and schedule it.
    #[serde(rename = "alarm.set")]
    AlarmSet { text: String },
    #[serde(rename = "alarm.cancel")]
    AlarmCancel { id: TriggerId },
    #[serde(rename = "alarm.list")]
    AlarmList,
    #[serde(rename = "alarm.history")]
    AlarmHistory,
    /// Stop the bridge after responding.
    #[serde(rename = "host.stop")]
    HostStop,
}

/// A command plus its correlation id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(flatten)]
    pub command: Command,
}

impl Request {
    #[must_use]
    pub fn new(command: Command) -> Self {
        Self {
            request_id: None,
            command,
        }
    }

    /// Parse one input line.
    ///
    /// # Errors
    ///
    /// Returns a message when the line is a JSON object that is not a valid
    /// command.
    pub fn parse_line(line: &str) -> Result<Self, String> {
        match serde_json::from_str::<Value>(line) {
            Ok(value @ Value::Object(_)) => {
                serde_json::from_value(value).map_err(|e| format!("invalid command: {e}"))
            }
            _ => Ok(Self::new(Command::AlarmSet {
                text: line.to_owned(),
            })),
        }
    }
}

/// Response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Success,
    Error,
}

/// One response line. Fields other than `status`, `request_id` and `message`
/// depend on the command and are flattened into the object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Response {
    /// Successful response with the fields of `payload` (must be an object;
    /// anything else yields no extra fields).
    #[must_use]
    pub fn success(payload: Value) -> Self {
        Self {
            status: Status::Success,
            request_id: None,
            message: None,
            payload: match payload {
                Value::Object(map) => map,
                _ => Map::new(),
            },
        }
    }

    /// `{"status":"error","message":...}`.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            request_id: None,
            message: Some(message.into()),
            payload: Map::new(),
        }
    }

    /// Response to a scheduled alarm: `alarm_time`, `reason` and `id`.
    #[must_use]
    pub fn alarm_set(id: TriggerId, spec: &AlarmSpec) -> Self {
        Self::success(serde_json::json!({
            "alarm_time": spec.describe(),
            "reason": spec.reason(),
            "id": id,
        }))
    }

    /// Attach the request's correlation id.
    #[must_use]
    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.request_id = request_id;
        self
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

/// Firing notification written to stdout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiredEvent {
    pub event: String,
    #[serde(flatten)]
    pub firing: Firing,
}

impl From<Firing> for FiredEvent {
    fn from(firing: Firing) -> Self {
        Self {
            event: ALARM_FIRED_EVENT.to_owned(),
            firing,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use chime_grammar::TimeUnit;

    #[test]
    fn parses_tagged_commands() {
        let req = Request::parse_line(r#"{"cmd":"alarm.set","text":"every 5 minutes"}"#).unwrap();
        assert_eq!(
            req.command,
            Command::AlarmSet {
                text: "every 5 minutes".into()
            }
        );
        assert!(req.request_id.is_none());

        let req = Request::parse_line(r#"{"cmd":"alarm.cancel","id":3,"request_id":"r1"}"#).unwrap();
        assert_eq!(
            req.command,
            Command::AlarmCancel {
                id: TriggerId::new(3)
            }
        );
        assert_eq!(req.request_id.as_deref(), Some("r1"));

        assert_eq!(
            Request::parse_line(r#"{"cmd":"host.stop"}"#).unwrap().command,
            Command::HostStop
        );
    }

    #[test]
    fn plain_text_is_alarm_set() {
        let req = Request::parse_line("remind me in 5 minutes").unwrap();
        assert_eq!(
            req.command,
            Command::AlarmSet {
                text: "remind me in 5 minutes".into()
            }
        );
        // Valid JSON that is not an object is text too.
        let req = Request::parse_line("42").unwrap();
        assert_eq!(req.command, Command::AlarmSet { text: "42".into() });
    }

    #[test]
    fn unknown_command_object_is_rejected() {
        let err = Request::parse_line(r#"{"cmd":"alarm.snooze"}"#).unwrap_err();
        assert!(err.starts_with("invalid command:"));
        assert!(Request::parse_line(r#"{"cmd":"alarm.cancel"}"#).is_err());
    }

    #[test]
    fn alarm_set_response_shape() {
        let spec = AlarmSpec::Interval {
            every: 30,
            unit: TimeUnit::Minute.into(),
            reason: "drink water".into(),
        };
        let resp = Response::alarm_set(TriggerId::new(4), &spec).with_request_id(Some("r9".into()));
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "status": "success",
                "request_id": "r9",
                "alarm_time": "every 30 minutes",
                "reason": "drink water",
                "id": 4
            })
        );
    }

    #[test]
    fn error_response_shape() {
        let json = serde_json::to_value(Response::error("nope")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "error", "message": "nope"})
        );
    }

    #[test]
    fn response_round_trips() {
        let resp = Response::success(serde_json::json!({"cancelled": true}))
            .with_request_id(Some("r2".into()));
        let json = serde_json::to_string(&resp).unwrap();
        let back: Response = serde_json::from_str(&json).unwrap();
        assert_eq!(back, resp);
        assert!(back.is_success());
    }
}
