use crate::notice::{parse_moment_str, Notice};
use crate::session::Role;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

pub const DEFAULT_MAX_INDICATOR_TITLES: usize = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CalendarError {
    #[error("month index {month_index} of {year} is out of range (expected 0..=11)")]
    InvalidMonth { year: i32, month_index: u32 },
    #[error("unparseable date: {0}")]
    InvalidDate(String),
}

/// A calendar month addressed by a zero-based month index (0 = January).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearMonth {
    year: i32,
    month_index: u32,
    first: NaiveDate,
}

impl YearMonth {
    pub fn new(year: i32, month_index: u32) -> Result<Self, CalendarError> {
        let invalid = CalendarError::InvalidMonth { year, month_index };
        if month_index > 11 {
            return Err(invalid);
        }
        let first = NaiveDate::from_ymd_opt(year, month_index + 1, 1).ok_or(invalid)?;
        Ok(Self {
            year,
            month_index,
            first,
        })
    }

    /// Parses `YYYY-MM` (one-based month).
    pub fn parse_key(key: &str) -> Result<Self, CalendarError> {
        let bad = || CalendarError::InvalidDate(key.to_string());
        let (y, m) = key.trim().split_once('-').ok_or_else(bad)?;
        let year = y.parse::<i32>().map_err(|_| bad())?;
        let month = m.parse::<u32>().map_err(|_| bad())?;
        if !(1..=12).contains(&month) {
            return Err(bad());
        }
        Self::new(year, month - 1)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month_index(&self) -> u32 {
        self.month_index
    }

    pub fn key(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month_index + 1)
    }

    /// 0 = Sunday .. 6 = Saturday.
    pub fn first_weekday(&self) -> u32 {
        self.first.weekday().num_days_from_sunday()
    }

    pub fn days_in_month(&self) -> u32 {
        days_in_month(self.year, self.month_index + 1)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month0() == self.month_index
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let leap = (year % 4 == 0 && year % 100 != 0) || year % 400 == 0;
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if leap => 29,
        _ => 28,
    }
}

pub type Week = [Option<u32>; 7];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthMatrix {
    pub year: i32,
    pub month: u32,
    pub days_in_month: u32,
    pub first_weekday: u32,
    pub weeks: Vec<Week>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CellPos {
    pub week: usize,
    pub weekday: usize,
}

impl MonthMatrix {
    pub fn position_of(&self, day: u32) -> Option<CellPos> {
        self.weeks.iter().enumerate().find_map(|(week, cells)| {
            cells
                .iter()
                .position(|c| *c == Some(day))
                .map(|weekday| CellPos { week, weekday })
        })
    }

    pub fn today_cell(&self, today: NaiveDate) -> Option<CellPos> {
        if today.year() != self.year || today.month0() != self.month {
            return None;
        }
        self.position_of(today.day())
    }
}

/// Lays the month out in Sunday-first weeks. Six rows are generated and
/// trailing empty rows dropped.
pub fn build_month_matrix(year: i32, month_index: u32) -> Result<MonthMatrix, CalendarError> {
    let ym = YearMonth::new(year, month_index)?;
    Ok(month_matrix(&ym))
}

fn month_matrix(ym: &YearMonth) -> MonthMatrix {
    let first_weekday = ym.first_weekday();
    let days = ym.days_in_month();

    let mut weeks: Vec<Week> = Vec::with_capacity(6);
    let mut day = 1u32;
    for row in 0..6 {
        let mut week: Week = [None; 7];
        for (col, cell) in week.iter_mut().enumerate() {
            let leading = row == 0 && (col as u32) < first_weekday;
            if !leading && day <= days {
                *cell = Some(day);
                day += 1;
            }
        }
        weeks.push(week);
    }
    while weeks
        .last()
        .is_some_and(|w| w.iter().all(Option::is_none))
    {
        weeks.pop();
    }

    MonthMatrix {
        year: ym.year(),
        month: ym.month_index(),
        days_in_month: days,
        first_weekday,
        weeks,
    }
}

/// Empty input is "no date selected", not an error.
pub fn parse_date_param(raw: &str) -> Result<Option<NaiveDate>, CalendarError> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    parse_moment_str(raw)
        .map(|m| Some(m.day))
        .ok_or_else(|| CalendarError::InvalidDate(raw.to_string()))
}

pub type MonthIndex = BTreeMap<u32, Vec<Notice>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayIndicator {
    pub count: usize,
    pub titles: Vec<String>,
    pub more: usize,
}

/// Role-filtered notice lookups for one viewer.
#[derive(Debug, Clone, Copy)]
pub struct CalendarIndex {
    role: Role,
}

impl CalendarIndex {
    pub fn new(role: Role) -> Self {
        Self { role }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn index_by_month(&self, notices: &[Notice], month: &YearMonth) -> MonthIndex {
        let mut index: BTreeMap<u32, Vec<&Notice>> = BTreeMap::new();
        for notice in notices {
            if !notice.is_visible(self.role) {
                continue;
            }
            let Some(effective) = notice.effective_date() else {
                tracing::debug!(id = %notice.id, "notice has no parseable date; excluded");
                continue;
            };
            tracing::trace!(
                id = %notice.id,
                field = ?effective.field,
                day = %effective.moment.day,
                "effective date"
            );
            if month.contains(effective.moment.day) {
                index
                    .entry(effective.moment.day.day())
                    .or_default()
                    .push(notice);
            }
        }
        index
            .into_iter()
            .map(|(day, bucket)| (day, newest_first(bucket)))
            .collect()
    }

    pub fn notices_for_date(&self, notices: &[Notice], date: Option<NaiveDate>) -> Vec<Notice> {
        let Some(date) = date else {
            return Vec::new();
        };
        let matching = notices.iter().filter(|n| {
            n.is_visible(self.role)
                && n.effective_date()
                    .is_some_and(|c| c.moment.day == date)
        });
        newest_first(matching.collect())
    }
}

fn newest_first(bucket: Vec<&Notice>) -> Vec<Notice> {
    let mut keyed: Vec<(Option<NaiveDateTime>, &Notice)> = bucket
        .into_iter()
        .map(|n| (n.creation_moment().map(|c| c.moment.instant), n))
        .collect();
    keyed.sort_by(|a, b| b.0.cmp(&a.0));
    keyed.into_iter().map(|(_, n)| n.clone()).collect()
}

pub fn day_indicators(index: &MonthIndex, max_titles: usize) -> BTreeMap<u32, DayIndicator> {
    index
        .iter()
        .map(|(&day, bucket)| {
            let titles: Vec<String> = bucket
                .iter()
                .take(max_titles)
                .map(|n| n.title.clone())
                .collect();
            let more = bucket.len() - titles.len();
            (
                day,
                DayIndicator {
                    count: bucket.len(),
                    titles,
                    more,
                },
            )
        })
        .collect()
}
