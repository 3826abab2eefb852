//! # Validated cron schedule.
//!
//! [`CronSchedule`] wraps a cron expression with an **explicit** field-count
//! classification: 5 fields (minute granularity) or 6 fields (second
//! granularity). The count is detected from the expression and validated,
//! never inferred downstream, so `"* * * * *"` and `"* * * * * *"` are
//! unambiguous. 5-field expressions are normalized internally by prepending
//! a `0` seconds field before handing them to the `cron` parser.
//!
//! ## Rules
//! - Anything other than 5 or 6 whitespace-separated fields is
//!   `InvalidSchedule`.
//! - A schedule must have at least one upcoming fire time at parse time
//!   (e.g. `"0 0 30 2 *"`, Feb 30, is rejected).
//! - [`CronSchedule::next_fire_time`] returns the next matching timestamp
//!   `>= after`, or `None` when the expression is exhausted.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use cron::Schedule;

use crate::error::OrchestratorError;

/// Field-count classification of a cron expression.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CronFields {
    /// 5 fields: `min hour dom month dow` (minute granularity).
    Minute,
    /// 6 fields: `sec min hour dom month dow` (second granularity).
    Second,
}

/// Parsed and validated cron schedule.
#[derive(Clone, Debug)]
pub struct CronSchedule {
    expr: Arc<str>,
    fields: CronFields,
    inner: Schedule,
}

impl CronSchedule {
    /// Parses a 5- or 6-field cron expression.
    ///
    /// Fails with [`OrchestratorError::InvalidSchedule`] when the field
    /// count is wrong, the expression does not parse, or it has no upcoming
    /// fire time.
    pub fn parse(expr: &str) -> Result<Self, OrchestratorError> {
        let expr = expr.trim();
        let invalid = |reason: String| OrchestratorError::InvalidSchedule {
            expr: expr.to_string(),
            reason,
        };

        let field_count = expr.split_whitespace().count();
        let (fields, normalized) = match field_count {
            5 => (CronFields::Minute, format!("0 {expr}")),
            6 => (CronFields::Second, expr.to_string()),
            n => {
                return Err(invalid(format!(
                    "expected 5 fields (min..dow) or 6 fields (sec..dow), found {n}"
                )))
            }
        };

        let inner = Schedule::from_str(&normalized).map_err(|e| invalid(e.to_string()))?;

        if inner.upcoming(Utc).next().is_none() {
            return Err(invalid("expression has no upcoming fire time".to_string()));
        }

        Ok(Self {
            expr: expr.into(),
            fields,
            inner,
        })
    }

    /// Returns the next timestamp `>= after` matching the expression, or
    /// `None` if the expression is exhausted (never, for standard cron).
    pub fn next_fire_time(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        // `Schedule::after` is exclusive; back off one nanosecond so a
        // timestamp that matches exactly is included.
        let exclusive = after - ChronoDuration::nanoseconds(1);
        self.inner.after(&exclusive).next()
    }

    /// Returns the original (un-normalized) expression.
    pub fn expression(&self) -> &str {
        &self.expr
    }

    /// Returns the explicit field-count classification.
    pub fn fields(&self) -> CronFields {
        self.fields
    }
}

impl std::fmt::Display for CronSchedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.expr)
    }
}

impl FromStr for CronSchedule {
    type Err = OrchestratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_five_field_minute_granularity() {
        let sched = CronSchedule::parse("* * * * *").unwrap();
        assert_eq!(sched.fields(), CronFields::Minute);
        assert_eq!(sched.expression(), "* * * * *");

        let after = Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 30).unwrap();
        let fire = sched.next_fire_time(after).unwrap();
        assert_eq!(fire, Utc.with_ymd_and_hms(2026, 8, 7, 12, 1, 0).unwrap());
    }

    #[test]
    fn test_six_field_second_granularity() {
        let sched = CronSchedule::parse("*/5 * * * * *").unwrap();
        assert_eq!(sched.fields(), CronFields::Second);

        let after = Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 1).unwrap();
        let fire = sched.next_fire_time(after).unwrap();
        assert_eq!(fire, Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 5).unwrap());
    }

    #[test]
    fn test_exact_match_is_included() {
        let sched = CronSchedule::parse("* * * * *").unwrap();
        let boundary = Utc.with_ymd_and_hms(2026, 8, 7, 12, 1, 0).unwrap();
        assert_eq!(sched.next_fire_time(boundary), Some(boundary));
    }

    #[test]
    fn test_wrong_field_count_rejected() {
        for expr in ["* * * *", "* * * * * * *", "", "*"] {
            let err = CronSchedule::parse(expr).unwrap_err();
            assert!(
                matches!(err, OrchestratorError::InvalidSchedule { .. }),
                "{expr:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_malformed_expression_rejected() {
        let err = CronSchedule::parse("61 * * * *").unwrap_err();
        assert!(matches!(err, OrchestratorError::InvalidSchedule { .. }));
    }

    #[test]
    fn test_never_firing_expression_rejected() {
        // February 30th does not exist.
        let err = CronSchedule::parse("0 0 30 2 *").unwrap_err();
        assert!(matches!(
            err,
            OrchestratorError::InvalidSchedule { ref reason, .. }
                if reason.contains("no upcoming fire time")
        ));
    }

    #[test]
    fn test_fire_times_strictly_increase_minute() {
        let sched = CronSchedule::parse("*/15 * * * *").unwrap();
        let mut t = Utc.with_ymd_and_hms(2026, 8, 7, 0, 0, 1).unwrap();
        let mut prev = None;
        for _ in 0..20 {
            let fire = sched.next_fire_time(t).unwrap();
            if let Some(p) = prev {
                assert!(fire > p, "{fire} must exceed {p}");
            }
            prev = Some(fire);
            t = fire + ChronoDuration::seconds(1);
        }
    }

    #[test]
    fn test_fire_times_strictly_increase_second() {
        let sched = CronSchedule::parse("* * * * * *").unwrap();
        let mut t = Utc.with_ymd_and_hms(2026, 8, 7, 0, 0, 0).unwrap();
        let mut prev = None;
        for _ in 0..20 {
            let fire = sched.next_fire_time(t).unwrap();
            if let Some(p) = prev {
                assert!(fire > p, "{fire} must exceed {p}");
            }
            prev = Some(fire);
            t = fire + ChronoDuration::seconds(1);
        }
    }

    #[test]
    fn test_from_str_round_trip() {
        let sched: CronSchedule = "0 9 * * 1-5".parse().unwrap();
        assert_eq!(sched.to_string(), "0 9 * * 1-5");
        assert_eq!(sched.fields(), CronFields::Minute);
    }
}
