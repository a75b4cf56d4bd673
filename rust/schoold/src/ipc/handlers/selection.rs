use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::required_str;
use crate::ipc::types::{AppState, Request};
use crate::selection::SelectionError;
use serde_json::json;

fn handle_begin(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let scope = required_str(&req.params, "scope")?;
    let key = required_str(&req.params, "key")?;
    let sel = state.selections.begin(&scope, &key);
    tracing::debug!(
        scope = %sel.scope,
        key = %sel.key,
        generation = sel.generation,
        "selection begun"
    );
    Ok(json!(sel))
}

fn handle_current(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let scope = required_str(&req.params, "scope")?;
    let sel = state
        .selections
        .current(&scope)
        .ok_or(SelectionError::NoSelection { scope })?;
    Ok(json!(sel))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "selection.begin" => Some(respond(&req.id, handle_begin(state, req))),
        "selection.current" => Some(respond(&req.id, handle_current(state, req))),
        _ => None,
    }
}
