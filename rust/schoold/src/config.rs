use crate::routine::{Day, RoutineShape, DEFAULT_PERIODS};
use anyhow::Context;

pub const ENV_LOG: &str = "SCHOOLD_LOG";
pub const ENV_ROUTINE_DAYS: &str = "SCHOOLD_ROUTINE_DAYS";
pub const ENV_ROUTINE_PERIODS: &str = "SCHOOLD_ROUTINE_PERIODS";

/// Process-level settings read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub log_filter: Option<String>,
    pub routine: RoutineShape,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let log_filter = lookup(ENV_LOG).filter(|v| !v.trim().is_empty());

        let defaults = RoutineShape::school_week();
        let days = match lookup(ENV_ROUTINE_DAYS) {
            Some(raw) if !raw.trim().is_empty() => raw
                .split(',')
                .map(|d| d.parse::<Day>())
                .collect::<Result<Vec<_>, _>>()
                .with_context(|| format!("{ENV_ROUTINE_DAYS}={raw}"))?,
            _ => defaults.days().to_vec(),
        };
        let periods = match lookup(ENV_ROUTINE_PERIODS) {
            Some(raw) if !raw.trim().is_empty() => raw
                .trim()
                .parse::<u32>()
                .with_context(|| format!("{ENV_ROUTINE_PERIODS}={raw}"))?,
            _ => DEFAULT_PERIODS,
        };
        let routine = RoutineShape::new(days, periods).context("routine configuration")?;

        Ok(Self {
            log_filter,
            routine,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_to_school_week() {
        let cfg = Config::from_lookup(lookup(&[])).expect("config");
        assert_eq!(cfg.routine, RoutineShape::school_week());
        assert!(cfg.log_filter.is_none());
    }

    #[test]
    fn reads_days_and_periods() {
        let cfg = Config::from_lookup(lookup(&[
            (ENV_ROUTINE_DAYS, "monday, Tuesday,Wednesday"),
            (ENV_ROUTINE_PERIODS, "8"),
            (ENV_LOG, "schoold=debug"),
        ]))
        .expect("config");
        assert_eq!(
            cfg.routine.days(),
            &[Day::Monday, Day::Tuesday, Day::Wednesday]
        );
        assert_eq!(cfg.routine.periods(), 8);
        assert_eq!(cfg.log_filter.as_deref(), Some("schoold=debug"));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(Config::from_lookup(lookup(&[(ENV_ROUTINE_DAYS, "Moonday")])).is_err());
        assert!(Config::from_lookup(lookup(&[(ENV_ROUTINE_PERIODS, "0")])).is_err());
        assert!(Config::from_lookup(lookup(&[(ENV_ROUTINE_PERIODS, "six")])).is_err());
    }
}
