use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{required_as, required_i64, required_str, required_u64, upstream_error};
use crate::ipc::types::{AppState, LoadedRoutine, Request};
use crate::routine::{
    densify, flatten_form, text_value, Day, Densified, DroppedEntry, FlattenWarning, RoutineCell,
    RoutineForm, RoutineShape,
};
use serde_json::{json, Value};

const SCOPE: &str = "routine";

fn log_dropped(dropped: &[DroppedEntry]) {
    for d in dropped {
        tracing::warn!(
            index = d.index,
            day = ?d.day,
            period = ?d.period,
            reason = ?d.reason,
            "routine entry dropped"
        );
    }
}

fn log_warnings(warnings: &[FlattenWarning]) {
    for w in warnings {
        tracing::warn!(day = %w.day, label = %w.label, issue = ?w.issue, "routine cell skipped");
    }
}

/// `days`/`periods` override the configured shape for this call. `periods`
/// may be a count or a list of period labels.
fn shape_param(state: &AppState, params: &Value) -> Result<RoutineShape, HandlerErr> {
    let days = match params.get("days") {
        None | Some(Value::Null) => state.setup.routine.days().to_vec(),
        Some(_) => required_as::<Vec<Day>>(params, "days")?,
    };
    let periods = match params.get("periods") {
        None | Some(Value::Null) => state.setup.routine.periods(),
        Some(Value::Array(labels)) => u32::try_from(labels.len())
            .map_err(|_| HandlerErr::bad_params("too many periods"))?,
        Some(_) => u32::try_from(required_i64(params, "periods")?)
            .map_err(|_| HandlerErr::bad_params("periods must be positive"))?,
    };
    Ok(RoutineShape::new(days, periods)?)
}

fn handle_densify(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let shape = shape_param(state, &req.params)?;
    let entries: Vec<Value> = required_as(&req.params, "entries")?;
    let Densified { grid, dropped } = densify(&entries, &shape);
    log_dropped(&dropped);
    Ok(json!({
        "days": grid.shape().days(),
        "periods": grid.shape().periods(),
        "grid": grid,
        "dropped": dropped,
    }))
}

fn handle_flatten(req: &Request) -> Result<Value, HandlerErr> {
    let form: RoutineForm = required_as(&req.params, "grid")?;
    let out = flatten_form(&form);
    log_warnings(&out.warnings);
    Ok(json!({
        "entries": out.entries,
        "warnings": out.warnings,
    }))
}

/// Accepts the routine fetched for the selected teacher; stale generations
/// and fetch failures leave nothing half-loaded.
fn handle_load(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let generation = required_u64(&req.params, "generation")?;
    let teacher_id = required_str(&req.params, "teacherId")?;
    let selected = state.selections.check(SCOPE, generation).map_err(|e| {
        tracing::info!(generation, teacher_id = %teacher_id, "dropping stale routine load");
        HandlerErr::from(e)
    })?;
    if selected.key != teacher_id {
        return Err(HandlerErr::bad_params(format!(
            "teacherId {} does not match the current selection {}",
            teacher_id, selected.key
        )));
    }

    if let Some(message) = upstream_error(&req.params) {
        tracing::warn!(teacher_id = %teacher_id, %message, "routine fetch failed");
        state.routine = None;
        return Err(HandlerErr::new("upstream_failed", message));
    }
    let entries: Vec<Value> = required_as(&req.params, "entries")?;
    let Densified { grid, dropped } = densify(&entries, &state.setup.routine);
    log_dropped(&dropped);

    let out = json!({
        "teacherId": teacher_id,
        "generation": generation,
        "grid": grid,
        "dropped": dropped,
    });
    state.routine = Some(LoadedRoutine { teacher_id, grid });
    Ok(out)
}

fn cell_text(params: &Value, key: &str) -> String {
    params
        .get(key)
        .and_then(text_value)
        .unwrap_or_default()
        .trim()
        .to_string()
}

fn handle_set_cell(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let Some(loaded) = state.routine.as_mut() else {
        return Err(HandlerErr::new("not_loaded", "no routine loaded"));
    };
    let day: Day = required_as(&req.params, "day")?;
    let period = u32::try_from(required_i64(&req.params, "period")?)
        .map_err(|_| HandlerErr::bad_params("period must be positive"))?;
    let cell = RoutineCell {
        subject: cell_text(&req.params, "subject"),
        class: cell_text(&req.params, "class"),
    };
    let previous = loaded.grid.cell(day, period).cloned();
    loaded.grid.set_cell(day, period, cell.clone())?;
    Ok(json!({
        "teacherId": loaded.teacher_id,
        "day": day,
        "period": period,
        "cell": cell,
        "previous": previous,
    }))
}

fn handle_submit(state: &mut AppState) -> Result<Value, HandlerErr> {
    let Some(loaded) = state.routine.as_ref() else {
        return Err(HandlerErr::new("not_loaded", "no routine loaded"));
    };
    let entries = loaded.grid.flatten();
    tracing::info!(
        teacher_id = %loaded.teacher_id,
        entries = entries.len(),
        "routine flattened for submit"
    );
    Ok(json!({
        "teacherId": loaded.teacher_id,
        "entries": entries,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "routine.densify" => handle_densify(state, req),
        "routine.flatten" => handle_flatten(req),
        "routine.load" => handle_load(state, req),
        "routine.setCell" => handle_set_cell(state, req),
        "routine.submit" => handle_submit(state),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
