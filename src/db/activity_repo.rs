use rusqlite::{params, Connection, Row};

use crate::error::AppResult;
use crate::model::{Activity, Group, Id};

const ACTIVITY_COLUMNS: &str =
    "id, group_id, name, address, date_time, description, created_by, created_at";

pub fn insert(conn: &Connection, activity: &Activity) -> AppResult<()> {
    conn.execute(
        "INSERT INTO activities (id, group_id, name, address, date_time, description, created_by, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            activity.id,
            activity.group_id,
            activity.name,
            activity.address,
            activity.date_time,
            activity.description,
            activity.created_by,
            activity.created_at,
        ],
    )?;
    Ok(())
}

pub fn update(conn: &Connection, activity: &Activity) -> AppResult<()> {
    conn.execute(
        "UPDATE activities SET name = ?1, address = ?2, date_time = ?3, description = ?4
         WHERE id = ?5",
        params![
            activity.name,
            activity.address,
            activity.date_time,
            activity.description,
            activity.id,
        ],
    )?;
    Ok(())
}

pub fn delete(conn: &Connection, id: Id<Activity>) -> AppResult<()> {
    conn.execute("DELETE FROM activities WHERE id = ?1", params![id])?;
    Ok(())
}

pub fn find_by_id(conn: &Connection, id: Id<Activity>) -> AppResult<Option<Activity>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM activities WHERE id = ?1",
        ACTIVITY_COLUMNS
    ))?;

    match stmt.query_row(params![id], row_to_activity) {
        Ok(activity) => Ok(Some(activity)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Activities of a group, soonest first.
pub fn find_by_group(conn: &Connection, group_id: Id<Group>) -> AppResult<Vec<Activity>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM activities WHERE group_id = ?1 ORDER BY date_time",
        ACTIVITY_COLUMNS
    ))?;

    let activities = stmt
        .query_map(params![group_id], row_to_activity)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(activities)
}

pub fn find_all(conn: &Connection) -> AppResult<Vec<Activity>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM activities ORDER BY date_time",
        ACTIVITY_COLUMNS
    ))?;

    let activities = stmt
        .query_map([], row_to_activity)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(activities)
}

fn row_to_activity(row: &Row) -> rusqlite::Result<Activity> {
    Ok(Activity {
        id: row.get(0)?,
        group_id: row.get(1)?,
        name: row.get(2)?,
        address: row.get(3)?,
        date_time: row.get(4)?,
        description: row.get(5)?,
        created_by: row.get(6)?,
        created_at: row.get(7)?,
    })
}
