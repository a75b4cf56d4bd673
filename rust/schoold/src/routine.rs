use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_PERIODS: u32 = 7;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoutineError {
    #[error("unknown weekday: {0}")]
    UnknownDay(String),
    #[error("routine needs at least one day")]
    NoDays,
    #[error("routine needs at least one period")]
    NoPeriods,
    #[error("{day} has no period {period} (configured: 1..={periods})")]
    CellOutOfRange { day: Day, period: u32, periods: u32 },
}

/// Weekdays in canonical (Sunday-first) order; `Ord` follows that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Day {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Sunday,
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Day::Sunday => "Sunday",
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
            Day::Friday => "Friday",
            Day::Saturday => "Saturday",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Day {
    type Err = RoutineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        Day::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(t))
            .ok_or_else(|| RoutineError::UnknownDay(t.to_string()))
    }
}

impl Serialize for Day {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Day {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// `"period3"`, `"Period 3"` and `"3"` all name period 3. Zero, signs and
/// any other prefix or trailing junk do not parse.
pub fn parse_period_label(label: &str) -> Option<u32> {
    let s = label.trim();
    let digits = match s.get(..6) {
        Some(prefix) if prefix.eq_ignore_ascii_case("period") => s[6..].trim_start(),
        _ => s,
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u32>().ok().filter(|&n| n > 0)
}

pub fn period_label(period: u32) -> String {
    format!("period{period}")
}

/// Period as sent by the routine service: an integer or a label. Anything
/// else is kept as received so it can be reported back.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PeriodRef {
    Number(i64),
    Label(String),
    Other(Value),
}

impl PeriodRef {
    pub fn resolve(&self) -> Option<u32> {
        match self {
            PeriodRef::Number(n) => u32::try_from(*n).ok().filter(|&n| n > 0),
            PeriodRef::Label(s) => parse_period_label(s),
            PeriodRef::Other(_) => None,
        }
    }
}

/// A routine row as received, before validation.
#[derive(Debug, Clone, Deserialize)]
struct RawRoutineEntry {
    #[serde(default, deserialize_with = "lenient_text")]
    day: Option<String>,
    #[serde(default)]
    period: Option<PeriodRef>,
    #[serde(default, deserialize_with = "lenient_text")]
    subject: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    class: Option<String>,
}

/// Strings as-is, numbers in their JSON form; anything else is no text.
/// Class names arrive as numbers from some endpoints.
pub fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(text_value))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RoutineCell {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub class: String,
}

impl RoutineCell {
    pub fn is_empty(&self) -> bool {
        self.subject.is_empty() && self.class.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RoutineEntry {
    pub day: Day,
    pub period: u32,
    pub subject: String,
    pub class: String,
}

/// Configured days and period count of a weekly routine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutineShape {
    days: Vec<Day>,
    periods: u32,
}

impl RoutineShape {
    pub fn new(days: impl IntoIterator<Item = Day>, periods: u32) -> Result<Self, RoutineError> {
        let mut days: Vec<Day> = days.into_iter().collect();
        days.sort();
        days.dedup();
        if days.is_empty() {
            return Err(RoutineError::NoDays);
        }
        if periods == 0 {
            return Err(RoutineError::NoPeriods);
        }
        Ok(Self { days, periods })
    }

    /// Sunday through Friday, seven periods.
    pub fn school_week() -> Self {
        Self {
            days: Day::ALL[..6].to_vec(),
            periods: DEFAULT_PERIODS,
        }
    }

    pub fn days(&self) -> &[Day] {
        &self.days
    }

    pub fn periods(&self) -> u32 {
        self.periods
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    Malformed,
    MissingDay,
    UnknownDay,
    BadPeriod,
    PeriodOutOfRange,
}

/// An input row densify could not place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DroppedEntry {
    pub index: usize,
    pub day: Option<String>,
    pub period: Option<Value>,
    pub reason: DropReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutineGrid {
    shape: RoutineShape,
    cells: BTreeMap<Day, BTreeMap<u32, RoutineCell>>,
}

impl RoutineGrid {
    pub fn empty(shape: RoutineShape) -> Self {
        let cells = shape
            .days
            .iter()
            .map(|&d| {
                let periods = (1..=shape.periods)
                    .map(|p| (p, RoutineCell::default()))
                    .collect();
                (d, periods)
            })
            .collect();
        Self { shape, cells }
    }

    pub fn shape(&self) -> &RoutineShape {
        &self.shape
    }

    pub fn cell(&self, day: Day, period: u32) -> Option<&RoutineCell> {
        self.cells.get(&day)?.get(&period)
    }

    pub fn set_cell(
        &mut self,
        day: Day,
        period: u32,
        cell: RoutineCell,
    ) -> Result<(), RoutineError> {
        let slot = self
            .cells
            .get_mut(&day)
            .and_then(|row| row.get_mut(&period))
            .ok_or(RoutineError::CellOutOfRange {
                day,
                period,
                periods: self.shape.periods,
            })?;
        *slot = cell;
        Ok(())
    }

    /// Non-empty cells in weekday then period order.
    pub fn flatten(&self) -> Vec<RoutineEntry> {
        self.cells
            .iter()
            .flat_map(|(&day, row)| {
                row.iter()
                    .filter(|(_, cell)| !cell.is_empty())
                    .map(move |(&period, cell)| RoutineEntry {
                        day,
                        period,
                        subject: cell.subject.clone(),
                        class: cell.class.clone(),
                    })
            })
            .collect()
    }
}

impl Serialize for RoutineGrid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (day, row) in &self.cells {
            let labelled: BTreeMap<String, &RoutineCell> =
                row.iter().map(|(&p, c)| (period_label(p), c)).collect();
            map.serialize_entry(day.name(), &labelled)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone)]
pub struct Densified {
    pub grid: RoutineGrid,
    pub dropped: Vec<DroppedEntry>,
}

/// Places entries into a fully populated grid. Later entries overwrite
/// earlier ones for the same cell; rows that are not objects or cannot be
/// placed are reported and skipped.
pub fn densify(entries: &[Value], shape: &RoutineShape) -> Densified {
    let mut grid = RoutineGrid::empty(shape.clone());
    let mut dropped = Vec::new();

    for (index, row) in entries.iter().enumerate() {
        let Ok(entry) = RawRoutineEntry::deserialize(row) else {
            dropped.push(DroppedEntry {
                index,
                day: None,
                period: None,
                reason: DropReason::Malformed,
            });
            continue;
        };
        let reason = match place(&entry, shape) {
            Ok((day, period)) => {
                let cell = RoutineCell {
                    subject: entry.subject.clone().unwrap_or_default(),
                    class: entry.class.clone().unwrap_or_default(),
                };
                if grid.set_cell(day, period, cell).is_ok() {
                    continue;
                }
                DropReason::PeriodOutOfRange
            }
            Err(reason) => reason,
        };
        dropped.push(DroppedEntry {
            index,
            day: entry.day,
            period: entry.period.as_ref().and_then(|p| serde_json::to_value(p).ok()),
            reason,
        });
    }

    Densified { grid, dropped }
}

fn place(entry: &RawRoutineEntry, shape: &RoutineShape) -> Result<(Day, u32), DropReason> {
    let raw_day = entry.day.as_deref().ok_or(DropReason::MissingDay)?;
    let day: Day = raw_day.parse().map_err(|_| DropReason::UnknownDay)?;
    if !shape.days.contains(&day) {
        return Err(DropReason::UnknownDay);
    }
    let period = entry
        .period
        .as_ref()
        .and_then(PeriodRef::resolve)
        .ok_or(DropReason::BadPeriod)?;
    if period > shape.periods {
        return Err(DropReason::PeriodOutOfRange);
    }
    Ok((day, period))
}

/// Grid as bound to an edit form: day name → period label → cell.
pub type RoutineForm = BTreeMap<String, BTreeMap<String, RoutineCell>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlattenIssue {
    UnknownDay,
    BadPeriodLabel,
    DuplicatePeriod,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlattenWarning {
    pub day: String,
    pub label: String,
    pub issue: FlattenIssue,
}

#[derive(Debug, Clone, Default)]
pub struct Flattened {
    pub entries: Vec<RoutineEntry>,
    pub warnings: Vec<FlattenWarning>,
}

/// Flattens a form grid, skipping cells whose day or period label does not
/// parse. Empty cells are never reported. When two labels of one day name the
/// same period, the later label (in key order) wins and is reported.
pub fn flatten_form(form: &RoutineForm) -> Flattened {
    let mut placed: BTreeMap<(Day, u32), RoutineCell> = BTreeMap::new();
    let mut warnings = Vec::new();

    for (day_name, row) in form {
        for (label, cell) in row {
            if cell.is_empty() {
                continue;
            }
            let Ok(day) = day_name.parse::<Day>() else {
                warnings.push(FlattenWarning {
                    day: day_name.clone(),
                    label: label.clone(),
                    issue: FlattenIssue::UnknownDay,
                });
                continue;
            };
            let Some(period) = parse_period_label(label) else {
                warnings.push(FlattenWarning {
                    day: day_name.clone(),
                    label: label.clone(),
                    issue: FlattenIssue::BadPeriodLabel,
                });
                continue;
            };
            if placed.insert((day, period), cell.clone()).is_some() {
                warnings.push(FlattenWarning {
                    day: day_name.clone(),
                    label: label.clone(),
                    issue: FlattenIssue::DuplicatePeriod,
                });
            }
        }
    }

    let entries = placed
        .into_iter()
        .map(|((day, period), cell)| RoutineEntry {
            day,
            period,
            subject: cell.subject,
            class: cell.class,
        })
        .collect();
    Flattened { entries, warnings }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(v: Value) -> Vec<Value> {
        v.as_array().cloned().expect("entries")
    }

    fn entry(day: Day, period: u32, subject: &str, class: &str) -> RoutineEntry {
        RoutineEntry {
            day,
            period,
            subject: subject.to_string(),
            class: class.to_string(),
        }
    }

    #[test]
    fn duplicate_cell_keeps_last_write() {
        let input = raw(json!([
            { "day": "Sunday", "period": 1, "subject": "Math", "class": "5" },
            { "day": "Sunday", "period": 1, "subject": "Science", "class": "5" }
        ]));
        let d = densify(&input, &RoutineShape::school_week());
        assert!(d.dropped.is_empty());
        assert_eq!(d.grid.flatten(), vec![entry(Day::Sunday, 1, "Science", "5")]);
    }

    #[test]
    fn empty_input_flattens_to_nothing() {
        let d = densify(&[], &RoutineShape::school_week());
        assert!(d.grid.flatten().is_empty());
        assert_eq!(
            d.grid.cell(Day::Friday, DEFAULT_PERIODS),
            Some(&RoutineCell::default())
        );
        assert_eq!(d.grid.cell(Day::Saturday, 1), None);
    }

    #[test]
    fn out_of_range_and_unknown_entries_are_dropped() {
        let input = raw(json!([
            { "day": "Monday", "period": "period9", "subject": "Art", "class": "4" },
            { "day": "Funday", "period": 2, "subject": "Art", "class": "4" },
            { "day": "Saturday", "period": 2, "subject": "Art", "class": "4" },
            { "day": "Monday", "period": "periodX", "subject": "Art", "class": "4" },
            { "period": 1, "subject": "Art" },
            { "day": "monday", "period": "period2", "subject": "Art", "class": 4 }
        ]));
        let d = densify(&input, &RoutineShape::school_week());
        let reasons: Vec<_> = d.dropped.iter().map(|x| (x.index, x.reason)).collect();
        assert_eq!(
            reasons,
            vec![
                (0, DropReason::PeriodOutOfRange),
                (1, DropReason::UnknownDay),
                (2, DropReason::UnknownDay),
                (3, DropReason::BadPeriod),
                (4, DropReason::MissingDay),
            ]
        );
        assert_eq!(d.grid.flatten(), vec![entry(Day::Monday, 2, "Art", "4")]);
    }

    #[test]
    fn malformed_rows_are_dropped_without_losing_good_ones() {
        let input = raw(json!([
            { "day": "Monday", "period": 1, "subject": "Good", "class": "3" },
            { "day": 3, "period": 1, "subject": "x" },
            { "day": "Sunday", "period": 2.5, "subject": "x" },
            { "day": "Sunday", "period": true, "subject": "x" },
            null,
            { "day": "Sunday", "period": "-3", "subject": "Math", "class": "5" }
        ]));
        let d = densify(&input, &RoutineShape::school_week());
        let reasons: Vec<_> = d.dropped.iter().map(|x| (x.index, x.reason)).collect();
        assert_eq!(
            reasons,
            vec![
                (1, DropReason::UnknownDay),
                (2, DropReason::BadPeriod),
                (3, DropReason::BadPeriod),
                (4, DropReason::Malformed),
                (5, DropReason::BadPeriod),
            ]
        );
        assert_eq!(d.dropped[0].day.as_deref(), Some("3"));
        assert_eq!(d.dropped[1].period, Some(json!(2.5)));
        assert_eq!(d.grid.flatten(), vec![entry(Day::Monday, 1, "Good", "3")]);
    }

    #[test]
    fn flatten_orders_by_weekday_then_period() {
        let input = raw(json!([
            { "day": "Tuesday", "period": 3, "subject": "B", "class": "" },
            { "day": "Sunday", "period": 7, "subject": "", "class": "9" },
            { "day": "Tuesday", "period": 1, "subject": "A", "class": "1" },
            { "day": "Sunday", "period": 2, "subject": "", "class": "" }
        ]));
        let d = densify(&input, &RoutineShape::school_week());
        assert_eq!(
            d.grid.flatten(),
            vec![
                entry(Day::Sunday, 7, "", "9"),
                entry(Day::Tuesday, 1, "A", "1"),
                entry(Day::Tuesday, 3, "B", ""),
            ]
        );
    }

    #[test]
    fn round_trip_ignores_input_order() {
        let a = raw(json!([
            { "day": "Monday", "period": 1, "subject": "Math", "class": "5" },
            { "day": "Friday", "period": "period4", "subject": "Music", "class": "6" },
            { "day": "Monday", "period": 1, "subject": "Nepali", "class": "5" }
        ]));
        let b = raw(json!([
            { "day": "Friday", "period": "period4", "subject": "Music", "class": "6" },
            { "day": "Monday", "period": 1, "subject": "Math", "class": "5" },
            { "day": "Monday", "period": 1, "subject": "Nepali", "class": "5" }
        ]));
        let shape = RoutineShape::school_week();
        assert_eq!(densify(&a, &shape).grid.flatten(), densify(&b, &shape).grid.flatten());
    }

    #[test]
    fn form_flatten_skips_bad_labels_and_keeps_going() {
        let form: RoutineForm = serde_json::from_value(json!({
            "Sunday": {
                "period1": { "subject": "Math", "class": "5" },
                "periodX": { "subject": "Lost", "class": "5" },
                "period2": { "subject": "", "class": "" }
            },
            "Someday": { "period1": { "subject": "Lost", "class": "1" } },
            "Monday": { "period10": { "subject": "PE", "class": "7" } }
        }))
        .expect("form");
        let out = flatten_form(&form);
        assert_eq!(
            out.entries,
            vec![entry(Day::Sunday, 1, "Math", "5"), entry(Day::Monday, 10, "PE", "7")]
        );
        assert_eq!(out.warnings.len(), 2);
        assert!(out
            .warnings
            .iter()
            .any(|w| w.label == "periodX" && w.issue == FlattenIssue::BadPeriodLabel));
        assert!(out
            .warnings
            .iter()
            .any(|w| w.day == "Someday" && w.issue == FlattenIssue::UnknownDay));
    }

    #[test]
    fn form_flatten_reports_labels_naming_the_same_period() {
        let form: RoutineForm = serde_json::from_value(json!({
            "Sunday": {
                "1": { "subject": "Early", "class": "5" },
                "period1": { "subject": "Late", "class": "5" }
            }
        }))
        .expect("form");
        let out = flatten_form(&form);
        assert_eq!(out.entries, vec![entry(Day::Sunday, 1, "Late", "5")]);
        assert_eq!(
            out.warnings,
            vec![FlattenWarning {
                day: "Sunday".to_string(),
                label: "period1".to_string(),
                issue: FlattenIssue::DuplicatePeriod,
            }]
        );
    }

    #[test]
    fn grid_serializes_with_period_labels() {
        let mut grid = RoutineGrid::empty(RoutineShape::new([Day::Sunday], 2).unwrap());
        grid.set_cell(
            Day::Sunday,
            2,
            RoutineCell {
                subject: "Math".into(),
                class: "5".into(),
            },
        )
        .unwrap();
        let v = serde_json::to_value(&grid).unwrap();
        assert_eq!(v["Sunday"]["period2"]["subject"], json!("Math"));
        assert_eq!(v["Sunday"]["period1"]["class"], json!(""));
        assert!(grid.set_cell(Day::Sunday, 3, RoutineCell::default()).is_err());
    }

    #[test]
    fn period_labels_parse_defensively() {
        assert_eq!(parse_period_label("period3"), Some(3));
        assert_eq!(parse_period_label("Period 12"), Some(12));
        assert_eq!(parse_period_label("4"), Some(4));
        assert_eq!(parse_period_label("period0"), None);
        assert_eq!(parse_period_label("period3b"), None);
        assert_eq!(parse_period_label("period"), None);
        assert_eq!(parse_period_label("period-3"), None);
        assert_eq!(parse_period_label("-3"), None);
        assert_eq!(parse_period_label("+3"), None);
        assert_eq!(parse_period_label("abc3"), None);
        assert_eq!(PeriodRef::Number(-1).resolve(), None);
    }

    #[test]
    fn shape_rejects_empty_configuration() {
        assert_eq!(RoutineShape::new(Vec::new(), 7), Err(RoutineError::NoDays));
        assert_eq!(RoutineShape::new([Day::Monday], 0), Err(RoutineError::NoPeriods));
        let s = RoutineShape::new([Day::Friday, Day::Sunday, Day::Friday], 3).unwrap();
        assert_eq!(s.days(), &[Day::Sunday, Day::Friday]);
    }
}
