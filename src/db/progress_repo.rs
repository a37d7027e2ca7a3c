use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row};

use crate::error::AppResult;
use crate::model::{Course, CourseProgress, Id, User};

/// Writes the whole progress row (scalar fields and completed weeks),
/// inserting it if it does not exist yet.
pub fn save(conn: &Connection, progress: &CourseProgress) -> AppResult<()> {
    conn.execute(
        "INSERT INTO course_progress (id, user_id, course_id, completed_work_and_exam, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(id) DO UPDATE SET
            completed_work_and_exam = excluded.completed_work_and_exam,
            updated_at = excluded.updated_at",
        params![
            progress.id,
            progress.user_id,
            progress.course_id,
            progress.completed_work_and_exam,
            progress.updated_at,
        ],
    )?;

    conn.execute(
        "DELETE FROM course_progress_weeks WHERE progress_id = ?1",
        params![progress.id],
    )?;
    for week in &progress.completed_weeks {
        conn.execute(
            "INSERT INTO course_progress_weeks (progress_id, week) VALUES (?1, ?2)",
            params![progress.id, week],
        )?;
    }
    Ok(())
}

pub fn find(
    conn: &Connection,
    user_id: Id<User>,
    course_id: Id<Course>,
) -> AppResult<Option<CourseProgress>> {
    let result = conn.query_row(
        "SELECT id, user_id, course_id, completed_work_and_exam, updated_at
         FROM course_progress WHERE user_id = ?1 AND course_id = ?2",
        params![user_id, course_id],
        row_to_progress,
    );

    match result {
        Ok(progress) => Ok(Some(with_weeks(conn, progress)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// The stored row, or a fresh empty one that has not been written yet.
pub fn get_or_default(
    conn: &Connection,
    user_id: Id<User>,
    course_id: Id<Course>,
    now: NaiveDateTime,
) -> AppResult<CourseProgress> {
    Ok(find(conn, user_id, course_id)?
        .unwrap_or_else(|| CourseProgress::empty(user_id, course_id, now)))
}

pub fn find_by_course(conn: &Connection, course_id: Id<Course>) -> AppResult<Vec<CourseProgress>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, course_id, completed_work_and_exam, updated_at
         FROM course_progress WHERE course_id = ?1",
    )?;

    let rows = stmt
        .query_map(params![course_id], row_to_progress)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(|p| with_weeks(conn, p)).collect()
}

pub fn delete(conn: &Connection, user_id: Id<User>, course_id: Id<Course>) -> AppResult<usize> {
    let n = conn.execute(
        "DELETE FROM course_progress WHERE user_id = ?1 AND course_id = ?2",
        params![user_id, course_id],
    )?;
    Ok(n)
}

pub fn delete_by_course(conn: &Connection, course_id: Id<Course>) -> AppResult<usize> {
    let n = conn.execute(
        "DELETE FROM course_progress WHERE course_id = ?1",
        params![course_id],
    )?;
    Ok(n)
}

fn with_weeks(conn: &Connection, mut progress: CourseProgress) -> AppResult<CourseProgress> {
    let mut stmt = conn.prepare(
        "SELECT week FROM course_progress_weeks WHERE progress_id = ?1 ORDER BY week",
    )?;
    progress.completed_weeks = stmt
        .query_map(params![progress.id], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(progress)
}

fn row_to_progress(row: &Row) -> rusqlite::Result<CourseProgress> {
    Ok(CourseProgress {
        id: row.get(0)?,
        user_id: row.get(1)?,
        course_id: row.get(2)?,
        completed_weeks: Vec::new(),
        completed_work_and_exam: row.get(3)?,
        updated_at: row.get(4)?,
    })
}
