//! Command dispatch for the host bridge.

use crate::host::contract::{Command, Request, Response};
use crate::scheduler::Scheduler;
use chime_grammar::Interpreter;
use std::sync::Arc;

/// Routes bridge commands to the interpreter and scheduler.
#[derive(Debug)]
pub struct HostHandler {
    interpreter: Interpreter,
    scheduler: Arc<Scheduler>,
}

impl HostHandler {
    #[must_use]
    pub fn new(interpreter: Interpreter, scheduler: Arc<Scheduler>) -> Self {
        Self {
            interpreter,
            scheduler,
        }
    }

    /// The scheduler commands are dispatched to.
    #[must_use]
    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }

    /// Handle one request. Never fails; problems become error responses.
    pub fn handle(&self, request: Request) -> Response {
        let response = match request.command {
            Command::AlarmSet { text } => self.set_alarm(&text),
            Command::AlarmCancel { id } => {
                let cancelled = self.scheduler.cancel(id);
                if cancelled {
                    tracing::info!(trigger_id = %id, "alarm cancelled");
                    Response::success(serde_json::json!({ "id": id, "cancelled": true }))
                } else {
                    Response::error(format!("no alarm with id {id}"))
                }
            }
            Command::AlarmList => {
                Response::success(serde_json::json!({ "alarms": self.scheduler.pending() }))
            }
            Command::AlarmHistory => {
                Response::success(serde_json::json!({ "history": self.scheduler.history() }))
            }
            Command::HostStop => Response::success(serde_json::json!({ "stopping": true })),
        };
        response.with_request_id(request.request_id)
    }

    fn set_alarm(&self, text: &str) -> Response {
        match self.interpreter.interpret(text) {
            Ok(spec) => {
                let id = self.scheduler.submit(&spec);
                tracing::info!(
                    trigger_id = %id,
                    alarm_time = %spec.describe(),
                    "alarm set"
                );
                Response::alarm_set(id, &spec)
            }
            Err(e) => {
                tracing::debug!(error = %e, "alarm text rejected");
                Response::error(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::notify::ChannelNotifier;
    use crate::scheduler::TriggerId;

    fn handler() -> HostHandler {
        let (sink, _rx) = ChannelNotifier::channel();
        HostHandler::new(Interpreter::default(), Arc::new(Scheduler::new(sink)))
    }

    fn set(text: &str) -> Request {
        Request::new(Command::AlarmSet { text: text.into() })
    }

    #[test]
    fn set_interval_alarm() {
        let handler = handler();
        let resp = handler.handle(set("remind me to stretch every 10 minutes"));
        assert!(resp.is_success());
        assert_eq!(resp.payload["alarm_time"], "every 10 minutes");
        assert_eq!(resp.payload["reason"], "stretch");
        assert_eq!(resp.payload["id"], 1);
        assert_eq!(handler.scheduler().pending().len(), 1);
    }

    #[test]
    fn set_gibberish_is_error() {
        let handler = handler();
        let resp = handler.handle(set("asdkjhaslkdj"));
        assert!(!resp.is_success());
        assert_eq!(
            resp.message.as_deref(),
            Some("could not parse time from input: 'asdkjhaslkdj'")
        );
        assert!(handler.scheduler().pending().is_empty());
    }

    #[test]
    fn cancel_known_and_unknown() {
        let handler = handler();
        handler.handle(set("every 5 minutes"));

        let resp = handler.handle(Request::new(Command::AlarmCancel {
            id: TriggerId::new(1),
        }));
        assert!(resp.is_success());
        assert_eq!(resp.payload["cancelled"], true);

        let resp = handler.handle(Request::new(Command::AlarmCancel {
            id: TriggerId::new(1),
        }));
        assert_eq!(resp.message.as_deref(), Some("no alarm with id 1"));
    }

    #[test]
    fn list_reports_pending_alarms() {
        let handler = handler();
        handler.handle(set("remind me to drink water in 5 minutes"));
        let resp = handler.handle(Request::new(Command::AlarmList));
        let alarms = resp.payload["alarms"].as_array().unwrap();
        assert_eq!(alarms.len(), 1);
        assert_eq!(alarms[0]["reason"], "drink water");
        assert_eq!(alarms[0]["kind"]["type"], "absolute");
    }

    #[test]
    fn request_id_is_echoed() {
        let handler = handler();
        let mut request = Request::new(Command::AlarmHistory);
        request.request_id = Some("abc".into());
        let resp = handler.handle(request);
        assert_eq!(resp.request_id.as_deref(), Some("abc"));
        assert_eq!(resp.payload["history"], serde_json::json!([]));
    }
}
