use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};

use crate::error::AppResult;
use crate::model::{AttendanceRecord, Id, User};

const RECORD_COLUMNS: &str = "id, user_id, date, attendance_type, attended, count, created_at";

pub fn insert(conn: &Connection, record: &AttendanceRecord) -> AppResult<()> {
    conn.execute(
        "INSERT INTO attendance_records (id, user_id, date, attendance_type, attended, count, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            record.id,
            record.user_id,
            record.date,
            record.attendance_type,
            record.attended,
            record.count,
            record.created_at,
        ],
    )?;
    Ok(())
}

pub fn update(conn: &Connection, record: &AttendanceRecord) -> AppResult<()> {
    conn.execute(
        "UPDATE attendance_records SET date = ?1, attendance_type = ?2, attended = ?3, count = ?4
         WHERE id = ?5",
        params![
            record.date,
            record.attendance_type,
            record.attended,
            record.count,
            record.id,
        ],
    )?;
    Ok(())
}

pub fn delete(conn: &Connection, id: Id<AttendanceRecord>) -> AppResult<()> {
    conn.execute("DELETE FROM attendance_records WHERE id = ?1", params![id])?;
    Ok(())
}

pub fn find_by_id(conn: &Connection, id: Id<AttendanceRecord>) -> AppResult<Option<AttendanceRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM attendance_records WHERE id = ?1",
        RECORD_COLUMNS
    ))?;

    match stmt.query_row(params![id], row_to_record) {
        Ok(record) => Ok(Some(record)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Records of one user with `from <= date < to`, oldest first.
pub fn find_by_user_in_range(
    conn: &Connection,
    user_id: Id<User>,
    from: NaiveDate,
    to: NaiveDate,
) -> AppResult<Vec<AttendanceRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM attendance_records
         WHERE user_id = ?1 AND date >= ?2 AND date < ?3 ORDER BY date, created_at",
        RECORD_COLUMNS
    ))?;

    let records = stmt
        .query_map(params![user_id, from, to], row_to_record)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(records)
}

/// Every user's records with `from <= date < to`.
pub fn find_in_range(
    conn: &Connection,
    from: NaiveDate,
    to: NaiveDate,
) -> AppResult<Vec<AttendanceRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM attendance_records WHERE date >= ?1 AND date < ?2 ORDER BY date, created_at",
        RECORD_COLUMNS
    ))?;

    let records = stmt
        .query_map(params![from, to], row_to_record)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(records)
}

fn row_to_record(row: &Row) -> rusqlite::Result<AttendanceRecord> {
    Ok(AttendanceRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        date: row.get(2)?,
        attendance_type: row.get(3)?,
        attended: row.get(4)?,
        count: row.get(5)?,
        created_at: row.get(6)?,
    })
}
