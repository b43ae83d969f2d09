//! Booking windows
//!
//! Parses the per-vertical window fields of a [`BookingRequest`] into typed
//! dates/times and answers the overlap questions availability needs.

use chrono::{Duration, NaiveDate, NaiveTime};
use shared::models::{BookingRequest, BookingWindow, VenueKind};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("Invalid {field}: {value}")]
    Invalid { field: &'static str, value: String },

    #[error("{0}")]
    Order(String),
}

/// Typed booking window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedWindow {
    /// Same-day slot, `end` strictly after `start`
    Slot {
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    },
    /// Hotel stay, check-out exclusive
    Stay {
        check_in: NaiveDate,
        check_out: NaiveDate,
    },
    /// Hall days, both ends inclusive
    Days { start: NaiveDate, end: NaiveDate },
}

fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str, WindowError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(WindowError::Missing(field))
}

fn date(value: &str, field: &'static str) -> Result<NaiveDate, WindowError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| WindowError::Invalid {
        field,
        value: value.to_string(),
    })
}

fn time(value: &str, field: &'static str) -> Result<NaiveTime, WindowError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|_| WindowError::Invalid {
        field,
        value: value.to_string(),
    })
}

impl ResolvedWindow {
    /// Read the window fields relevant to `kind` from a request
    pub fn from_request(kind: VenueKind, req: &BookingRequest) -> Result<Self, WindowError> {
        match kind {
            VenueKind::Restaurant | VenueKind::Cafe => {
                let d = date(required(&req.date, "date")?, "date")?;
                let start = time(required(&req.start_time, "start_time")?, "start_time")?;
                let end = time(required(&req.end_time, "end_time")?, "end_time")?;
                Self::slot(d, start, end)
            }
            VenueKind::Hotel => {
                let check_in = date(required(&req.check_in, "check_in")?, "check_in")?;
                let check_out = date(required(&req.check_out, "check_out")?, "check_out")?;
                Self::stay(check_in, check_out)
            }
            VenueKind::Hall => {
                let start = date(required(&req.start_date, "start_date")?, "start_date")?;
                let end = date(required(&req.end_date, "end_date")?, "end_date")?;
                Self::days(start, end)
            }
        }
    }

    /// Rebuild from a persisted window
    pub fn from_stored(window: &BookingWindow) -> Result<Self, WindowError> {
        match window {
            BookingWindow::Slot {
                date: d,
                start_time,
                end_time,
            } => Self::slot(
                date(d, "date")?,
                time(start_time, "start_time")?,
                time(end_time, "end_time")?,
            ),
            BookingWindow::Stay {
                check_in,
                check_out,
            } => Self::stay(date(check_in, "check_in")?, date(check_out, "check_out")?),
            BookingWindow::Days {
                start_date,
                end_date,
            } => Self::days(date(start_date, "start_date")?, date(end_date, "end_date")?),
        }
    }

    pub fn slot(date: NaiveDate, start: NaiveTime, end: NaiveTime) -> Result<Self, WindowError> {
        if end <= start {
            return Err(WindowError::Order(
                "end_time must be after start_time".into(),
            ));
        }
        Ok(Self::Slot { date, start, end })
    }

    pub fn stay(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self, WindowError> {
        if check_out <= check_in {
            return Err(WindowError::Order(
                "check_out must be after check_in".into(),
            ));
        }
        Ok(Self::Stay {
            check_in,
            check_out,
        })
    }

    pub fn days(start: NaiveDate, end: NaiveDate) -> Result<Self, WindowError> {
        if end < start {
            return Err(WindowError::Order(
                "end_date must not be before start_date".into(),
            ));
        }
        Ok(Self::Days { start, end })
    }

    pub fn to_stored(&self) -> BookingWindow {
        match *self {
            Self::Slot { date, start, end } => BookingWindow::Slot {
                date: date.format("%Y-%m-%d").to_string(),
                start_time: start.format("%H:%M").to_string(),
                end_time: end.format("%H:%M").to_string(),
            },
            Self::Stay {
                check_in,
                check_out,
            } => BookingWindow::Stay {
                check_in: check_in.format("%Y-%m-%d").to_string(),
                check_out: check_out.format("%Y-%m-%d").to_string(),
            },
            Self::Days { start, end } => BookingWindow::Days {
                start_date: start.format("%Y-%m-%d").to_string(),
                end_date: end.format("%Y-%m-%d").to_string(),
            },
        }
    }

    /// First occupied date
    pub fn first_date(&self) -> NaiveDate {
        match *self {
            Self::Slot { date, .. } => date,
            Self::Stay { check_in, .. } => check_in,
            Self::Days { start, .. } => start,
        }
    }

    /// Last occupied date (inclusive)
    pub fn last_date(&self) -> NaiveDate {
        match *self {
            Self::Slot { date, .. } => date,
            Self::Stay { check_out, .. } => check_out - Duration::days(1),
            Self::Days { end, .. } => end,
        }
    }

    /// Start instant in local time (slot start or midnight of the first day)
    pub fn start_time(&self) -> NaiveTime {
        match *self {
            Self::Slot { start, .. } => start,
            _ => NaiveTime::MIN,
        }
    }

    /// Slot end time; `None` for day-based windows
    pub fn end_time(&self) -> Option<NaiveTime> {
        match *self {
            Self::Slot { end, .. } => Some(end),
            _ => None,
        }
    }

    /// Whole minutes of a slot; 0 for day-based windows
    pub fn minutes(&self) -> i64 {
        match *self {
            Self::Slot { start, end, .. } => (end - start).num_minutes(),
            _ => 0,
        }
    }

    /// Occupied days: nights for stays, inclusive days for halls, 1 for slots
    pub fn day_count(&self) -> i64 {
        match *self {
            Self::Slot { .. } => 1,
            Self::Stay {
                check_in,
                check_out,
            } => (check_out - check_in).num_days(),
            Self::Days { start, end } => (end - start).num_days() + 1,
        }
    }

    /// True if the two windows occupy a common instant
    ///
    /// Slots overlap only on the same date with intersecting half-open time
    /// ranges; day-based windows compare inclusive date ranges.
    pub fn overlaps(&self, other: &ResolvedWindow) -> bool {
        match (self, other) {
            (
                Self::Slot {
                    date: d1,
                    start: s1,
                    end: e1,
                },
                Self::Slot {
                    date: d2,
                    start: s2,
                    end: e2,
                },
            ) => d1 == d2 && s1 < e2 && s2 < e1,
            _ => self.first_date() <= other.last_date() && other.first_date() <= self.last_date(),
        }
    }

    /// True if the window occupies `date`
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.first_date() <= date && date <= self.last_date()
    }
}
