use rusqlite::{params, Connection, Row};

use crate::error::AppResult;
use crate::model::{Course, Id};

const COURSE_COLUMNS: &str =
    "id, name, description, start_date, end_date, duration_weeks, created_at";

pub fn insert(conn: &Connection, course: &Course) -> AppResult<()> {
    conn.execute(
        "INSERT INTO courses (id, name, description, start_date, end_date, duration_weeks, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            course.id,
            course.name,
            course.description,
            course.start_date,
            course.end_date,
            course.duration_weeks,
            course.created_at,
        ],
    )?;
    Ok(())
}

pub fn update(conn: &Connection, course: &Course) -> AppResult<()> {
    conn.execute(
        "UPDATE courses SET name = ?1, description = ?2, start_date = ?3, end_date = ?4,
         duration_weeks = ?5 WHERE id = ?6",
        params![
            course.name,
            course.description,
            course.start_date,
            course.end_date,
            course.duration_weeks,
            course.id,
        ],
    )?;
    Ok(())
}

/// Removes the course and every enrollment pointing at it.
pub fn delete(conn: &Connection, id: Id<Course>) -> AppResult<()> {
    conn.execute("DELETE FROM user_courses WHERE course_id = ?1", params![id])?;
    conn.execute("DELETE FROM courses WHERE id = ?1", params![id])?;
    Ok(())
}

pub fn find_by_id(conn: &Connection, id: Id<Course>) -> AppResult<Option<Course>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM courses WHERE id = ?1", COURSE_COLUMNS))?;

    match stmt.query_row(params![id], row_to_course) {
        Ok(course) => Ok(Some(course)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// All courses in creation order.
pub fn find_all(conn: &Connection) -> AppResult<Vec<Course>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM courses ORDER BY created_at, rowid",
        COURSE_COLUMNS
    ))?;

    let courses = stmt
        .query_map([], row_to_course)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(courses)
}

fn row_to_course(row: &Row) -> rusqlite::Result<Course> {
    Ok(Course {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        start_date: row.get(3)?,
        end_date: row.get(4)?,
        duration_weeks: row.get(5)?,
        created_at: row.get(6)?,
    })
}
