use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use tracing::info;

use crate::auth::{self, Identity};
use crate::db::{course_repo, progress_repo, user_repo};
use crate::error::{AppError, AppResult};
use crate::model::{Course, CourseProgress, Id, User};
use crate::validation::{self, trim_optional};

pub fn create_course(
    conn: &Connection,
    caller: Option<&Identity>,
    name: &str,
    description: Option<&str>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    duration_weeks: Option<u32>,
    now: NaiveDateTime,
) -> AppResult<Course> {
    auth::require_admin(conn, caller)?;

    let valid_name = validation::non_blank(name, "name")?;
    validation::date_order(start_date, end_date)?;
    if let Some(d) = duration_weeks {
        validation::positive(d as i64, "duration_weeks")?;
    }

    let course = Course::create(
        valid_name,
        trim_optional(description),
        start_date,
        end_date,
        duration_weeks,
        now,
    );
    course_repo::insert(conn, &course)?;

    info!(course_id = %course.id, "created course");
    Ok(course)
}

pub fn update_course(
    conn: &Connection,
    caller: Option<&Identity>,
    course_id: Id<Course>,
    name: Option<&str>,
    description: Option<Option<&str>>,
    start_date: Option<Option<NaiveDate>>,
    end_date: Option<Option<NaiveDate>>,
    duration_weeks: Option<u32>,
) -> AppResult<Course> {
    auth::require_admin(conn, caller)?;
    let mut course = course_repo::find_by_id(conn, course_id)?
        .ok_or_else(|| AppError::not_found("Course", course_id))?;

    if let Some(n) = name {
        course.name = validation::non_blank(n, "name")?;
    }
    if let Some(d) = description {
        course.description = trim_optional(d);
    }
    if let Some(s) = start_date {
        course.start_date = s;
    }
    if let Some(e) = end_date {
        course.end_date = e;
    }
    validation::date_order(course.start_date, course.end_date)?;

    let shrunk = match duration_weeks {
        Some(d) => {
            validation::positive(d as i64, "duration_weeks")?;
            let shrunk = d < course.duration_weeks;
            course.duration_weeks = d;
            shrunk
        }
        None => false,
    };

    let tx = conn.unchecked_transaction()?;
    course_repo::update(&tx, &course)?;
    if shrunk {
        // Completed weeks must stay within the course length.
        for mut progress in progress_repo::find_by_course(&tx, course.id)? {
            let before = progress.completed_weeks.len();
            progress.completed_weeks.retain(|w| *w <= course.duration_weeks);
            if progress.completed_weeks.len() != before {
                progress_repo::save(&tx, &progress)?;
            }
        }
    }
    tx.commit()?;

    info!(course_id = %course.id, shrunk, "updated course");
    Ok(course)
}

/// Deletes the course with its progress rows and enrollments.
pub fn delete_course(
    conn: &Connection,
    caller: Option<&Identity>,
    course_id: Id<Course>,
) -> AppResult<()> {
    auth::require_admin(conn, caller)?;
    let course = course_repo::find_by_id(conn, course_id)?
        .ok_or_else(|| AppError::not_found("Course", course_id))?;

    let tx = conn.unchecked_transaction()?;
    let students = user_repo::find_by_course(&tx, course.id)?;
    for mut student in students {
        student.current_courses.retain(|id| *id != course.id);
        student.is_active_in_school = !student.current_courses.is_empty();
        user_repo::update(&tx, &student)?;
    }
    let removed = progress_repo::delete_by_course(&tx, course.id)?;
    course_repo::delete(&tx, course.id)?;
    tx.commit()?;

    info!(course_id = %course.id, progress_rows = removed, "deleted course");
    Ok(())
}

pub fn enroll_in_courses(
    conn: &Connection,
    caller: Option<&Identity>,
    course_ids: &[Id<Course>],
    now: NaiveDateTime,
) -> AppResult<User> {
    let mut user = auth::current_user(conn, caller)?;
    validation::non_empty_set(course_ids, "course_ids")?;

    for id in course_ids {
        course_repo::find_by_id(conn, *id)?.ok_or_else(|| AppError::not_found("Course", id))?;
    }

    let mut added = Vec::new();
    for id in course_ids {
        if !user.current_courses.contains(id) {
            user.current_courses.push(*id);
            added.push(*id);
        }
    }
    if !user.current_courses.is_empty() {
        user.is_active_in_school = true;
    }

    let tx = conn.unchecked_transaction()?;
    user_repo::update(&tx, &user)?;
    for course_id in &added {
        if progress_repo::find(&tx, user.id, *course_id)?.is_none() {
            progress_repo::save(&tx, &CourseProgress::empty(user.id, *course_id, now))?;
        }
    }
    tx.commit()?;

    info!(user_id = %user.id, added = added.len(), "enrolled in courses");
    Ok(user)
}

pub fn unenroll_from_courses(
    conn: &Connection,
    caller: Option<&Identity>,
    course_ids: &[Id<Course>],
) -> AppResult<User> {
    let mut user = auth::current_user(conn, caller)?;
    validation::non_empty_set(course_ids, "course_ids")?;

    user.current_courses.retain(|id| !course_ids.contains(id));
    if user.current_courses.is_empty() {
        user.is_active_in_school = false;
    }

    let tx = conn.unchecked_transaction()?;
    user_repo::update(&tx, &user)?;
    for course_id in course_ids {
        progress_repo::delete(&tx, user.id, *course_id)?;
    }
    tx.commit()?;

    info!(user_id = %user.id, removed = course_ids.len(), "unenrolled from courses");
    Ok(user)
}

/// Flips completion of `week` for the caller. Returns the saved progress.
pub fn toggle_week_completion(
    conn: &Connection,
    caller: Option<&Identity>,
    course_id: Id<Course>,
    week: u32,
    now: NaiveDateTime,
) -> AppResult<CourseProgress> {
    let user = auth::current_user(conn, caller)?;
    let course = course_repo::find_by_id(conn, course_id)?
        .ok_or_else(|| AppError::not_found("Course", course_id))?;

    validation::in_range(week as i64, "week", 1, course.duration_weeks as i64)?;
    ensure_enrolled(&user, &course)?;

    let mut progress = progress_repo::get_or_default(conn, user.id, course.id, now)?;
    let completed = progress.toggle_week(week);
    progress.updated_at = now;
    progress_repo::save(conn, &progress)?;

    info!(user_id = %user.id, course_id = %course.id, week, completed, "toggled week");
    Ok(progress)
}

pub fn toggle_work_and_exam(
    conn: &Connection,
    caller: Option<&Identity>,
    course_id: Id<Course>,
    now: NaiveDateTime,
) -> AppResult<CourseProgress> {
    let user = auth::current_user(conn, caller)?;
    let course = course_repo::find_by_id(conn, course_id)?
        .ok_or_else(|| AppError::not_found("Course", course_id))?;
    ensure_enrolled(&user, &course)?;

    let mut progress = progress_repo::get_or_default(conn, user.id, course.id, now)?;
    progress.completed_work_and_exam = !progress.completed_work_and_exam;
    progress.updated_at = now;
    progress_repo::save(conn, &progress)?;

    info!(user_id = %user.id, course_id = %course.id, completed = progress.completed_work_and_exam, "toggled work and exam");
    Ok(progress)
}

fn ensure_enrolled(user: &User, course: &Course) -> AppResult<()> {
    if !user.is_enrolled_in(course.id) {
        return Err(AppError::forbidden("you are not enrolled in this course"));
    }
    Ok(())
}
