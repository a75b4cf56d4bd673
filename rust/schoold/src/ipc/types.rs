use crate::calendar::YearMonth;
use crate::config::Config;
use crate::notice::Notice;
use crate::routine::RoutineGrid;
use crate::selection::SelectionTracker;
use crate::session::Session;
use serde::Deserialize;

use super::handlers::setup::SetupState;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Notices fetched for the currently selected month.
pub struct LoadedMonth {
    pub month: YearMonth,
    pub notices: Vec<Notice>,
}

/// Routine of the currently selected teacher, as being edited.
pub struct LoadedRoutine {
    pub teacher_id: String,
    pub grid: RoutineGrid,
}

pub struct AppState {
    pub session: Session,
    pub setup: SetupState,
    pub selections: SelectionTracker,
    pub calendar: Option<LoadedMonth>,
    pub routine: Option<LoadedRoutine>,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            session: Session::public(),
            setup: SetupState::new(config),
            selections: SelectionTracker::default(),
            calendar: None,
            routine: None,
        }
    }
}
