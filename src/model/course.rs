use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::ids::Id;
use super::user::User;

pub const DEFAULT_DURATION_WEEKS: u32 = 9;

/// A school course offered by the church.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: Id<Course>,
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub duration_weeks: u32,
    pub created_at: NaiveDateTime,
}

impl Course {
    pub fn create(
        name: String,
        description: Option<String>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        duration_weeks: Option<u32>,
        created_at: NaiveDateTime,
    ) -> Self {
        Self {
            id: Id::generate(),
            name,
            description,
            start_date,
            end_date,
            duration_weeks: duration_weeks.unwrap_or(DEFAULT_DURATION_WEEKS),
            created_at,
        }
    }

    /// The week the course is in on `today`, within `1..=duration_weeks`.
    /// Week 1 when the course has no start date or has not started yet.
    pub fn current_week(&self, today: NaiveDate) -> u32 {
        let start = match self.start_date {
            Some(d) => d,
            None => return 1,
        };
        let elapsed_weeks = (today - start).num_days().div_euclid(7);
        let week = (elapsed_weeks + 1).min(self.duration_weeks as i64);
        week.max(1) as u32
    }

    /// Status of every week of the course, recomputed from scratch.
    pub fn week_statuses(
        &self,
        progress: Option<&CourseProgress>,
        today: NaiveDate,
    ) -> Vec<WeekProgress> {
        let current = self.current_week(today);
        (1..=self.duration_weeks)
            .map(|week| {
                let completed = progress.map_or(false, |p| p.is_week_completed(week));
                let status = if completed {
                    WeekStatus::AlDia
                } else if week <= current {
                    WeekStatus::Atrasado
                } else {
                    WeekStatus::Pendiente
                };
                WeekProgress { week, status }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeekStatus {
    #[serde(rename = "al-dia")]
    AlDia,
    #[serde(rename = "atrasado")]
    Atrasado,
    #[serde(rename = "pendiente")]
    Pendiente,
}

impl WeekStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeekStatus::AlDia => "al-dia",
            WeekStatus::Atrasado => "atrasado",
            WeekStatus::Pendiente => "pendiente",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekProgress {
    pub week: u32,
    pub status: WeekStatus,
}

/// Per-user progress through one course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseProgress {
    pub id: Id<CourseProgress>,
    pub user_id: Id<User>,
    pub course_id: Id<Course>,
    /// Sorted ascending, no duplicates.
    pub completed_weeks: Vec<u32>,
    pub completed_work_and_exam: bool,
    pub updated_at: NaiveDateTime,
}

impl CourseProgress {
    pub fn empty(user_id: Id<User>, course_id: Id<Course>, now: NaiveDateTime) -> Self {
        Self {
            id: Id::generate(),
            user_id,
            course_id,
            completed_weeks: Vec::new(),
            completed_work_and_exam: false,
            updated_at: now,
        }
    }

    pub fn is_week_completed(&self, week: u32) -> bool {
        self.completed_weeks.binary_search(&week).is_ok()
    }

    /// Flips `week` and returns whether it is now completed.
    pub fn toggle_week(&mut self, week: u32) -> bool {
        match self.completed_weeks.binary_search(&week) {
            Ok(pos) => {
                self.completed_weeks.remove(pos);
                false
            }
            Err(pos) => {
                self.completed_weeks.insert(pos, week);
                true
            }
        }
    }
}
