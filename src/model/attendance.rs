use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

use super::ids::Id;
use super::user::User;
use crate::error::{AppError, AppResult};

/// What a record counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceType {
    /// New visitors brought on a Sunday service.
    NuevosAsistentes,
    Reset,
    Conferencia,
}

impl AttendanceType {
    pub const ALL: &'static [AttendanceType] = &[
        AttendanceType::NuevosAsistentes,
        AttendanceType::Reset,
        AttendanceType::Conferencia,
    ];

    /// Fixed chart labels.
    pub fn label(&self) -> &'static str {
        match self {
            AttendanceType::NuevosAsistentes => "Nuevos asistentes",
            AttendanceType::Reset => "Reset",
            AttendanceType::Conferencia => "Conferencia",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "nuevos_asistentes" => Some(AttendanceType::NuevosAsistentes),
            "reset" => Some(AttendanceType::Reset),
            "conferencia" => Some(AttendanceType::Conferencia),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            AttendanceType::NuevosAsistentes => "nuevos_asistentes",
            AttendanceType::Reset => "reset",
            AttendanceType::Conferencia => "conferencia",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: Id<AttendanceRecord>,
    pub user_id: Id<User>,
    pub date: NaiveDate,
    pub attendance_type: AttendanceType,
    /// Whether the record owner attended too; only kept for new visitors.
    pub attended: Option<bool>,
    pub count: i64,
    pub created_at: NaiveDateTime,
}

impl AttendanceRecord {
    pub fn create(
        user_id: Id<User>,
        date: NaiveDate,
        attendance_type: AttendanceType,
        attended: Option<bool>,
        count: i64,
        created_at: NaiveDateTime,
    ) -> Self {
        Self {
            id: Id::generate(),
            user_id,
            date,
            attendance_type,
            attended,
            count,
            created_at,
        }
    }

    /// `count`, plus the owner themself when they attended a new-visitors Sunday.
    pub fn total(&self) -> i64 {
        let own = match (self.attendance_type, self.attended) {
            (AttendanceType::NuevosAsistentes, Some(true)) => 1,
            _ => 0,
        };
        self.count + own
    }
}

/// Records are keyed by local calendar day.
pub fn normalize_date(date: NaiveDateTime) -> NaiveDate {
    date.date()
}

pub fn is_sunday(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Sun
}

/// A reporting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    Month { year: i32, month: u32 },
    Year(i32),
}

impl Period {
    pub fn containing(date: NaiveDate) -> Self {
        Period::Month {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Half-open `[start, end)`.
    pub fn window(&self) -> AppResult<(NaiveDate, NaiveDate)> {
        match *self {
            Period::Month { year, month } => {
                let start = month_start(year, month)?;
                let (ny, nm) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
                Ok((start, month_start(ny, nm)?))
            }
            Period::Year(year) => Ok((month_start(year, 1)?, month_start(year + 1, 1)?)),
        }
    }

    /// Months plotted on the trend chart: the whole year, or the six months
    /// ending with the selected one.
    pub fn trend_months(&self) -> AppResult<Vec<(i32, u32)>> {
        match *self {
            Period::Year(year) => Ok((1..=12).map(|m| (year, m)).collect()),
            Period::Month { year, month } => {
                month_start(year, month)?;
                let last = year * 12 + month as i32 - 1;
                Ok((last - 5..=last)
                    .map(|idx| (idx.div_euclid(12), idx.rem_euclid(12) as u32 + 1))
                    .collect())
            }
        }
    }

    /// Parses `YYYY` or `YYYY-MM`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        match s.split_once('-') {
            Some((y, m)) => Some(Period::Month {
                year: y.parse().ok()?,
                month: m.parse().ok()?,
            }),
            None => s.parse().ok().map(Period::Year),
        }
    }
}

fn month_start(year: i32, month: u32) -> AppResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1).ok_or(AppError::OutOfRange {
        field: "month".into(),
        min: 1,
        max: 12,
    })
}
