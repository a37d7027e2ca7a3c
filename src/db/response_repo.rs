use rusqlite::{params, Connection, Row};

use crate::error::AppResult;
use crate::model::{Activity, ActivityResponse, Id, User};

/// Inserts the response, or overwrites status and timestamp of the existing
/// row for the same (activity, user). Returns the stored row.
pub fn upsert(conn: &Connection, response: &ActivityResponse) -> AppResult<ActivityResponse> {
    conn.execute(
        "INSERT INTO activity_responses (id, activity_id, user_id, status, responded_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(activity_id, user_id)
         DO UPDATE SET status = excluded.status, responded_at = excluded.responded_at",
        params![
            response.id,
            response.activity_id,
            response.user_id,
            response.status,
            response.responded_at,
        ],
    )?;

    let stored = conn.query_row(
        "SELECT id, activity_id, user_id, status, responded_at FROM activity_responses
         WHERE activity_id = ?1 AND user_id = ?2",
        params![response.activity_id, response.user_id],
        row_to_response,
    )?;
    Ok(stored)
}

pub fn find(
    conn: &Connection,
    activity_id: Id<Activity>,
    user_id: Id<User>,
) -> AppResult<Option<ActivityResponse>> {
    let result = conn.query_row(
        "SELECT id, activity_id, user_id, status, responded_at FROM activity_responses
         WHERE activity_id = ?1 AND user_id = ?2",
        params![activity_id, user_id],
        row_to_response,
    );

    match result {
        Ok(r) => Ok(Some(r)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn find_by_activity(
    conn: &Connection,
    activity_id: Id<Activity>,
) -> AppResult<Vec<ActivityResponse>> {
    let mut stmt = conn.prepare(
        "SELECT id, activity_id, user_id, status, responded_at FROM activity_responses
         WHERE activity_id = ?1 ORDER BY responded_at",
    )?;

    let responses = stmt
        .query_map(params![activity_id], row_to_response)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(responses)
}

pub fn delete_by_activity(conn: &Connection, activity_id: Id<Activity>) -> AppResult<usize> {
    let n = conn.execute(
        "DELETE FROM activity_responses WHERE activity_id = ?1",
        params![activity_id],
    )?;
    Ok(n)
}

fn row_to_response(row: &Row) -> rusqlite::Result<ActivityResponse> {
    Ok(ActivityResponse {
        id: row.get(0)?,
        activity_id: row.get(1)?,
        user_id: row.get(2)?,
        status: row.get(3)?,
        responded_at: row.get(4)?,
    })
}
