use crate::calendar::CalendarError;
use crate::routine::RoutineError;
use crate::selection::SelectionError;
use serde_json::json;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_params(message: impl Into<String>) -> Self {
        Self::new("bad_params", message)
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

impl From<CalendarError> for HandlerErr {
    fn from(e: CalendarError) -> Self {
        Self::bad_params(e.to_string())
    }
}

impl From<RoutineError> for HandlerErr {
    fn from(e: RoutineError) -> Self {
        Self::bad_params(e.to_string())
    }
}

impl From<SelectionError> for HandlerErr {
    fn from(e: SelectionError) -> Self {
        match e {
            SelectionError::NoSelection { .. } => Self::new("no_selection", e.to_string()),
            SelectionError::Stale {
                generation,
                current,
                ..
            } => Self::new("stale_selection", e.to_string())
                .with_details(json!({ "generation": generation, "current": current })),
        }
    }
}

/// Collapses a handler result into the wire response.
pub fn respond(id: &str, result: Result<serde_json::Value, HandlerErr>) -> serde_json::Value {
    match result {
        Ok(v) => ok(id, v),
        Err(e) => e.response(id),
    }
}
