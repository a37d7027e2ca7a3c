use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;
use tracing::debug;

use crate::auth::{self, Identity};
use crate::db::{course_repo, progress_repo, user_repo};
use crate::error::{AppError, AppResult};
use crate::model::{Course, CourseProgress, Id, User, WeekProgress, WeekStatus};

/// An enrolled course as its student sees it.
#[derive(Debug, Clone, Serialize)]
pub struct CourseOverview {
    pub course: Course,
    pub progress: Option<CourseProgress>,
    pub current_week: u32,
    pub weeks: Vec<WeekProgress>,
}

impl CourseOverview {
    pub fn weeks_behind(&self) -> usize {
        self.weeks
            .iter()
            .filter(|w| w.status == WeekStatus::Atrasado)
            .count()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentProgress {
    pub user: User,
    pub completed_weeks: usize,
    pub weeks_behind: usize,
    pub completed_work_and_exam: bool,
}

pub fn list_courses(conn: &Connection, caller: Option<&Identity>) -> AppResult<Vec<Course>> {
    auth::current_user(conn, caller)?;
    course_repo::find_all(conn)
}

pub fn get_course(
    conn: &Connection,
    caller: Option<&Identity>,
    course_id: Id<Course>,
) -> AppResult<Course> {
    auth::current_user(conn, caller)?;
    course_repo::find_by_id(conn, course_id)?
        .ok_or_else(|| AppError::not_found("Course", course_id))
}

/// The caller's enrolled courses with week statuses as of `today`.
pub fn my_courses(
    conn: &Connection,
    caller: Option<&Identity>,
    today: NaiveDate,
) -> AppResult<Vec<CourseOverview>> {
    let user = auth::current_user(conn, caller)?;

    let mut overviews = Vec::new();
    for course_id in &user.current_courses {
        let course = match course_repo::find_by_id(conn, *course_id)? {
            Some(c) => c,
            None => continue,
        };
        let progress = progress_repo::find(conn, user.id, course.id)?;
        overviews.push(CourseOverview {
            current_week: course.current_week(today),
            weeks: course.week_statuses(progress.as_ref(), today),
            course,
            progress,
        });
    }
    debug!(user_id = %user.id, courses = overviews.len(), "my courses");
    Ok(overviews)
}

/// Every student enrolled in the course with a progress summary.
pub fn course_students(
    conn: &Connection,
    caller: Option<&Identity>,
    course_id: Id<Course>,
    today: NaiveDate,
) -> AppResult<Vec<StudentProgress>> {
    auth::require_staff(conn, caller)?;
    let course = course_repo::find_by_id(conn, course_id)?
        .ok_or_else(|| AppError::not_found("Course", course_id))?;

    let progress_rows = progress_repo::find_by_course(conn, course.id)?;
    let students = user_repo::find_by_course(conn, course.id)?;

    Ok(students
        .into_iter()
        .map(|user| {
            let progress = progress_rows.iter().find(|p| p.user_id == user.id);
            let weeks_behind = course
                .week_statuses(progress, today)
                .iter()
                .filter(|w| w.status == WeekStatus::Atrasado)
                .count();
            StudentProgress {
                completed_weeks: progress.map_or(0, |p| p.completed_weeks.len()),
                completed_work_and_exam: progress.map_or(false, |p| p.completed_work_and_exam),
                weeks_behind,
                user,
            }
        })
        .collect())
}
