use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::session::{Session, SessionMarkers};
use serde_json::json;

fn session_json(session: &Session) -> serde_json::Value {
    json!({
        "role": session.role(),
        "markers": session.markers(),
    })
}

fn handle_set(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let markers: SessionMarkers = if req.params.is_null() {
        SessionMarkers::default()
    } else {
        serde_json::from_value(req.params.clone())
            .map_err(|e| HandlerErr::bad_params(format!("invalid session markers: {}", e)))?
    };
    let session = Session::from_markers(markers);
    if session.role() != state.session.role() {
        tracing::info!(
            from = state.session.role().as_str(),
            to = session.role().as_str(),
            "session role changed"
        );
    }
    state.session = session;
    Ok(session_json(&state.session))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "session.set" => Some(respond(&req.id, handle_set(state, req))),
        "session.get" => Some(respond(&req.id, Ok(session_json(&state.session)))),
        _ => None,
    }
}
