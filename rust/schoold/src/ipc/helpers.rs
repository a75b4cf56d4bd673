use crate::calendar::YearMonth;
use crate::ipc::error::HandlerErr;
use crate::ipc::types::AppState;
use crate::notice::Notice;
use crate::session::Role;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

pub fn required_str(params: &Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn opt_str<'a>(params: &'a Value, key: &str) -> Result<Option<&'a str>, HandlerErr> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(HandlerErr::bad_params(format!("{} must be a string", key))),
    }
}

pub fn required_i64(params: &Value, key: &str) -> Result<i64, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn required_u64(params: &Value, key: &str) -> Result<u64, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_u64())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

/// Deserializes `params[key]`, reporting the serde error as `bad_params`.
pub fn required_as<T: DeserializeOwned>(params: &Value, key: &str) -> Result<T, HandlerErr> {
    let v = params
        .get(key)
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))?;
    serde_json::from_value(v.clone())
        .map_err(|e| HandlerErr::bad_params(format!("invalid {}: {}", key, e)))
}

/// `monthKey` ("YYYY-MM") or `year` plus zero-based `month`.
pub fn month_param(params: &Value) -> Result<YearMonth, HandlerErr> {
    if let Some(key) = opt_str(params, "monthKey")? {
        return Ok(YearMonth::parse_key(key)?);
    }
    let year = required_i64(params, "year")?;
    let month = required_i64(params, "month")?;
    let year = i32::try_from(year).map_err(|_| HandlerErr::bad_params("year out of range"))?;
    let month = u32::try_from(month).map_err(|_| HandlerErr::bad_params("month must be 0..=11"))?;
    Ok(YearMonth::new(year, month)?)
}

/// Decodes each notice on its own; one that is not an object is skipped.
pub fn notices_param(params: &Value) -> Result<Vec<Notice>, HandlerErr> {
    let raw: Vec<Value> = required_as(params, "notices")?;
    Ok(raw
        .iter()
        .enumerate()
        .filter_map(|(index, v)| match Notice::deserialize(v) {
            Ok(n) => Some(n),
            Err(e) => {
                tracing::debug!(index, error = %e, "skipping undecodable notice");
                None
            }
        })
        .collect())
}

/// Per-call `role` override, else the session's role.
pub fn role_param(state: &AppState, params: &Value) -> Result<Role, HandlerErr> {
    match opt_str(params, "role")? {
        Some(raw) => Role::parse(raw)
            .ok_or_else(|| HandlerErr::bad_params(format!("unknown role: {}", raw))),
        None => Ok(state.session.role()),
    }
}

/// A fetch failure reported by the shell: `error` as a string or as
/// `{ "message": ... }`.
pub fn upstream_error(params: &Value) -> Option<String> {
    match params.get("error")? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(
            other
                .get("message")
                .and_then(|m| m.as_str())
                .map(|s| s.to_string())
                .unwrap_or_else(|| other.to_string()),
        ),
    }
}
