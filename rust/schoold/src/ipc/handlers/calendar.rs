use crate::calendar::{
    build_month_matrix, day_indicators, parse_date_param, CalendarIndex, MonthMatrix, YearMonth,
};
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{
    month_param, notices_param, opt_str, required_u64, role_param, upstream_error,
};
use crate::ipc::types::{AppState, LoadedMonth, Request};
use crate::notice::Notice;
use serde_json::{json, Value};

const SCOPE: &str = "calendar";

fn matrix_json(matrix: &MonthMatrix, today: Option<&str>) -> Result<Value, HandlerErr> {
    let mut out = json!(matrix);
    if let Some(today) = today.map(parse_date_param).transpose()?.flatten() {
        out["todayCell"] = json!(matrix.today_cell(today));
    }
    Ok(out)
}

fn month_model(
    state: &AppState,
    index: &CalendarIndex,
    month: &YearMonth,
    notices: &[Notice],
) -> Value {
    let days = index.index_by_month(notices, month);
    let indicators = day_indicators(&days, state.setup.calendar.max_indicator_titles);
    json!({
        "monthKey": month.key(),
        "role": index.role(),
        "days": days,
        "indicators": indicators,
    })
}

fn handle_month_matrix(req: &Request) -> Result<Value, HandlerErr> {
    let month = month_param(&req.params)?;
    let matrix = build_month_matrix(month.year(), month.month_index())?;
    matrix_json(&matrix, opt_str(&req.params, "today")?)
}

fn handle_index_by_month(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let month = month_param(&req.params)?;
    let notices = notices_param(&req.params)?;
    let index = CalendarIndex::new(role_param(state, &req.params)?);
    Ok(month_model(state, &index, &month, &notices))
}

fn handle_notices_for_date(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let raw_date = opt_str(&req.params, "date")?.unwrap_or("");
    let date = parse_date_param(raw_date)?;
    let notices = notices_param(&req.params)?;
    let index = CalendarIndex::new(role_param(state, &req.params)?);
    Ok(json!({
        "date": date.map(|d| d.to_string()),
        "notices": index.notices_for_date(&notices, date),
    }))
}

/// Accepts notices fetched for the selected month. A fetch failure clears the
/// loaded month and is reported as-is; nothing is synthesized in its place.
fn handle_load(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let generation = required_u64(&req.params, "generation")?;
    let month = month_param(&req.params)?;
    let selected = state.selections.check(SCOPE, generation).map_err(|e| {
        tracing::info!(generation, month = %month.key(), "dropping stale calendar load");
        HandlerErr::from(e)
    })?;
    if selected.key != month.key() {
        return Err(HandlerErr::bad_params(format!(
            "month {} does not match the current selection {}",
            month.key(),
            selected.key
        )));
    }

    if let Some(message) = upstream_error(&req.params) {
        tracing::warn!(month = %month.key(), %message, "notice fetch failed");
        state.calendar = None;
        return Err(HandlerErr::new("upstream_failed", message));
    }
    let notices = notices_param(&req.params)?;

    let index = CalendarIndex::new(state.session.role());
    let mut out = month_model(state, &index, &month, &notices);
    let matrix = build_month_matrix(month.year(), month.month_index())?;
    out["matrix"] = matrix_json(&matrix, opt_str(&req.params, "today")?)?;
    out["generation"] = json!(generation);

    tracing::debug!(month = %month.key(), notices = notices.len(), "calendar month loaded");
    state.calendar = Some(LoadedMonth { month, notices });
    Ok(out)
}

fn handle_day_notices(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let Some(loaded) = state.calendar.as_ref() else {
        return Err(HandlerErr::new("not_loaded", "no calendar month loaded"));
    };
    let raw_date = opt_str(&req.params, "date")?.unwrap_or("");
    let date = parse_date_param(raw_date)?;
    if let Some(d) = date {
        if !loaded.month.contains(d) {
            return Err(HandlerErr::bad_params(format!(
                "{} is outside the loaded month {}",
                d,
                loaded.month.key()
            )));
        }
    }
    let index = CalendarIndex::new(state.session.role());
    Ok(json!({
        "date": date.map(|d| d.to_string()),
        "notices": index.notices_for_date(&loaded.notices, date),
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "calendar.monthMatrix" => handle_month_matrix(req),
        "calendar.indexByMonth" => handle_index_by_month(state, req),
        "calendar.noticesForDate" => handle_notices_for_date(state, req),
        "calendar.load" => handle_load(state, req),
        "calendar.dayNotices" => handle_day_notices(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
