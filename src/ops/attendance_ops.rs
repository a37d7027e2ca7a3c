use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use tracing::info;

use crate::auth::{self, Identity};
use crate::db::attendance_repo;
use crate::error::{AppError, AppResult};
use crate::model::attendance::{is_sunday, normalize_date};
use crate::model::{AttendanceRecord, AttendanceType, Id, User};
use crate::validation;

pub fn record_attendance(
    conn: &Connection,
    caller: Option<&Identity>,
    date: NaiveDateTime,
    attendance_type: AttendanceType,
    attended: Option<bool>,
    count: i64,
    now: NaiveDateTime,
) -> AppResult<AttendanceRecord> {
    let user = auth::current_user(conn, caller)?;
    let (day, attended) = validate_entry(date, attendance_type, attended, count)?;

    let record = AttendanceRecord::create(user.id, day, attendance_type, attended, count, now);
    attendance_repo::insert(conn, &record)?;

    info!(record_id = %record.id, user_id = %user.id, kind = attendance_type.to_db_str(), "recorded attendance");
    Ok(record)
}

pub fn update_attendance(
    conn: &Connection,
    caller: Option<&Identity>,
    record_id: Id<AttendanceRecord>,
    date: NaiveDateTime,
    attendance_type: AttendanceType,
    attended: Option<bool>,
    count: i64,
) -> AppResult<AttendanceRecord> {
    let user = auth::current_user(conn, caller)?;
    let mut record = find_owned(conn, &user, record_id)?;

    let (day, attended) = validate_entry(date, attendance_type, attended, count)?;
    record.date = day;
    record.attendance_type = attendance_type;
    record.attended = attended;
    record.count = count;

    attendance_repo::update(conn, &record)?;
    info!(record_id = %record.id, "updated attendance record");
    Ok(record)
}

pub fn delete_attendance(
    conn: &Connection,
    caller: Option<&Identity>,
    record_id: Id<AttendanceRecord>,
) -> AppResult<()> {
    let user = auth::current_user(conn, caller)?;
    let record = find_owned(conn, &user, record_id)?;

    attendance_repo::delete(conn, record.id)?;
    info!(record_id = %record.id, "deleted attendance record");
    Ok(())
}

fn find_owned(
    conn: &Connection,
    user: &User,
    record_id: Id<AttendanceRecord>,
) -> AppResult<AttendanceRecord> {
    let record = attendance_repo::find_by_id(conn, record_id)?
        .ok_or_else(|| AppError::not_found("AttendanceRecord", record_id))?;
    if record.user_id != user.id {
        return Err(AppError::forbidden("you can only change your own records"));
    }
    Ok(record)
}

/// Normalizes the date and applies the per-type rules. `attended` is dropped
/// for types other than new visitors.
fn validate_entry(
    date: NaiveDateTime,
    attendance_type: AttendanceType,
    attended: Option<bool>,
    count: i64,
) -> AppResult<(NaiveDate, Option<bool>)> {
    let day = normalize_date(date);
    validation::non_negative(count, "count")?;

    match attendance_type {
        AttendanceType::NuevosAsistentes => {
            if !is_sunday(day) {
                return Err(AppError::NotSunday(day));
            }
            if attended.is_none() {
                return Err(AppError::MissingField {
                    field: "attended".into(),
                });
            }
            Ok((day, attended))
        }
        AttendanceType::Reset | AttendanceType::Conferencia => Ok((day, None)),
    }
}
