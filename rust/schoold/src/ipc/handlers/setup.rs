use crate::calendar::DEFAULT_MAX_INDICATOR_TITLES;
use crate::config::Config;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::required_str;
use crate::ipc::types::{AppState, Request};
use crate::routine::{Day, RoutineShape};
use serde_json::{json, Map, Value};

const MAX_INDICATOR_TITLES_LIMIT: u64 = 10;
const MAX_PERIODS: u64 = 16;

#[derive(Clone, Copy)]
enum SetupSection {
    Calendar,
    Routine,
}

impl SetupSection {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "calendar" => Some(Self::Calendar),
            "routine" => Some(Self::Routine),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CalendarSetup {
    pub max_indicator_titles: usize,
}

/// Runtime-tunable settings. Routine defaults are seeded from the process
/// config; calendar defaults are fixed.
#[derive(Debug, Clone)]
pub struct SetupState {
    pub calendar: CalendarSetup,
    pub routine: RoutineShape,
}

impl SetupState {
    pub fn new(config: &Config) -> Self {
        Self {
            calendar: CalendarSetup {
                max_indicator_titles: DEFAULT_MAX_INDICATOR_TITLES,
            },
            routine: config.routine.clone(),
        }
    }

    fn section_json(&self, section: SetupSection) -> Value {
        match section {
            SetupSection::Calendar => json!({
                "maxIndicatorTitles": self.calendar.max_indicator_titles,
            }),
            SetupSection::Routine => json!({
                "days": self.routine.days(),
                "periods": self.routine.periods(),
            }),
        }
    }
}

fn parse_days(v: &Value) -> Result<Vec<Day>, HandlerErr> {
    let Some(items) = v.as_array() else {
        return Err(HandlerErr::bad_params("routine.days must be an array of weekday names"));
    };
    items
        .iter()
        .map(|item| {
            item.as_str()
                .ok_or_else(|| HandlerErr::bad_params("routine.days entries must be strings"))
                .and_then(|s| s.parse::<Day>().map_err(HandlerErr::from))
        })
        .collect()
}

fn bounded_u64(v: &Value, key: &str, min: u64, max: u64) -> Result<u64, HandlerErr> {
    v.as_u64()
        .filter(|n| (min..=max).contains(n))
        .ok_or_else(|| HandlerErr::bad_params(format!("{} must be an integer {}..={}", key, min, max)))
}

/// Validates every key before applying any of them.
fn apply_patch(
    setup: &mut SetupState,
    section: SetupSection,
    patch: &Map<String, Value>,
) -> Result<(), HandlerErr> {
    match section {
        SetupSection::Calendar => {
            let mut next = setup.calendar.clone();
            for (key, value) in patch {
                match key.as_str() {
                    "maxIndicatorTitles" => {
                        next.max_indicator_titles =
                            bounded_u64(value, key, 0, MAX_INDICATOR_TITLES_LIMIT)? as usize;
                    }
                    _ => return Err(HandlerErr::bad_params(format!("unknown calendar key: {}", key))),
                }
            }
            setup.calendar = next;
        }
        SetupSection::Routine => {
            let mut days = setup.routine.days().to_vec();
            let mut periods = setup.routine.periods();
            for (key, value) in patch {
                match key.as_str() {
                    "days" => days = parse_days(value)?,
                    "periods" => periods = bounded_u64(value, key, 1, MAX_PERIODS)? as u32,
                    _ => return Err(HandlerErr::bad_params(format!("unknown routine key: {}", key))),
                }
            }
            setup.routine = RoutineShape::new(days, periods)?;
        }
    }
    Ok(())
}

fn section_param(req: &Request) -> Result<SetupSection, HandlerErr> {
    let raw = required_str(&req.params, "section")?;
    SetupSection::parse(&raw)
        .ok_or_else(|| HandlerErr::bad_params(format!("unknown setup section: {}", raw)))
}

fn handle_get(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let section = section_param(req)?;
    Ok(state.setup.section_json(section))
}

fn handle_update(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let section = section_param(req)?;
    let patch = req
        .params
        .get("patch")
        .and_then(|v| v.as_object())
        .ok_or_else(|| HandlerErr::bad_params("missing patch object"))?;
    apply_patch(&mut state.setup, section, patch)?;
    Ok(state.setup.section_json(section))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "setup.get" => Some(respond(&req.id, handle_get(state, req))),
        "setup.update" => Some(respond(&req.id, handle_update(state, req))),
        _ => None,
    }
}
