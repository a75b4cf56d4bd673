use crate::session::Role;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A notice as delivered by the notice service. Unknown fields are carried
/// through untouched so the shell can render them.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    #[serde(default)]
    pub id: Value,
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_date: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Value>,
    #[serde(default, deserialize_with = "strict_flag")]
    pub for_teachers: bool,
    #[serde(default, deserialize_with = "strict_flag")]
    pub for_students: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// Only a literal `true` sets an audience flag.
fn strict_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(matches!(Value::deserialize(deserializer)?, Value::Bool(true)))
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DateField {
    Date,
    PublishDate,
    CreatedAt,
}

impl DateField {
    fn raw(self, notice: &Notice) -> Option<&Value> {
        match self {
            Self::Date => notice.date.as_ref(),
            Self::PublishDate => notice.publish_date.as_ref(),
            Self::CreatedAt => notice.created_at.as_ref(),
        }
    }
}

/// Candidate order for the calendar day a notice belongs to.
pub const EFFECTIVE_DATE_ORDER: [DateField; 3] =
    [DateField::Date, DateField::PublishDate, DateField::CreatedAt];

/// Candidate order for the newest-first sort key.
pub const CREATION_MOMENT_ORDER: [DateField; 3] =
    [DateField::CreatedAt, DateField::Date, DateField::PublishDate];

/// A parsed timestamp: the calendar day as written plus an instant usable
/// for ordering (UTC when the source carried an offset).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Moment {
    pub day: NaiveDate,
    pub instant: NaiveDateTime,
}

/// Which candidate field produced a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateCandidate {
    pub field: DateField,
    pub moment: Moment,
}

const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

pub fn parse_moment_str(raw: &str) -> Option<Moment> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(Moment {
            day: dt.date_naive(),
            instant: dt.naive_utc(),
        });
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Moment {
                day: dt.date(),
                instant: dt,
            });
        }
    }
    let day = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    Some(Moment {
        day,
        instant: day.and_time(NaiveTime::MIN),
    })
}

/// Strings are parsed as dates/timestamps, integers as epoch milliseconds.
pub fn parse_moment(value: &Value) -> Option<Moment> {
    match value {
        Value::String(s) => parse_moment_str(s),
        Value::Number(n) => {
            let dt = DateTime::from_timestamp_millis(n.as_i64()?)?;
            Some(Moment {
                day: dt.date_naive(),
                instant: dt.naive_utc(),
            })
        }
        _ => None,
    }
}

fn first_parsed(notice: &Notice, order: &[DateField]) -> Option<DateCandidate> {
    order.iter().find_map(|&field| {
        let moment = parse_moment(field.raw(notice)?)?;
        Some(DateCandidate { field, moment })
    })
}

impl Notice {
    pub fn effective_date(&self) -> Option<DateCandidate> {
        first_parsed(self, &EFFECTIVE_DATE_ORDER)
    }

    pub fn creation_moment(&self) -> Option<DateCandidate> {
        first_parsed(self, &CREATION_MOMENT_ORDER)
    }

    pub fn is_public(&self) -> bool {
        !self.for_teachers && !self.for_students
    }

    pub fn is_visible(&self, role: Role) -> bool {
        match role {
            Role::Admin => true,
            Role::Teacher => self.for_teachers || self.is_public(),
            Role::Student => self.for_students || self.is_public(),
            Role::Public => self.is_public(),
        }
    }
}
