use chrono::Weekday;
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};

use crate::error::AppResult;
use crate::model::{AgeRange, Group, Id, User};

const GROUP_COLUMNS: &str =
    "id, name, address, district, min_age, max_age, day, time, invitation_code, created_at";

pub fn insert(conn: &Connection, group: &Group) -> AppResult<()> {
    conn.execute(
        "INSERT INTO connection_groups (id, name, address, district, min_age, max_age, day, time,
         invitation_code, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            group.id,
            group.name,
            group.address,
            group.district,
            group.age_range.map(|r| r.min_age),
            group.age_range.map(|r| r.max_age),
            group.day.to_string(),
            group.time,
            group.invitation_code,
            group.created_at,
        ],
    )?;
    set_leaders(conn, group.id, &group.leaders)?;
    for user_id in &group.disciples {
        add_disciple(conn, group.id, *user_id)?;
    }
    Ok(())
}

/// Updates the scalar fields. Leaders are fixed at creation; disciples are
/// written through `add_disciple`.
pub fn update(conn: &Connection, group: &Group) -> AppResult<()> {
    conn.execute(
        "UPDATE connection_groups SET name = ?1, address = ?2, district = ?3, min_age = ?4,
         max_age = ?5, day = ?6, time = ?7 WHERE id = ?8",
        params![
            group.name,
            group.address,
            group.district,
            group.age_range.map(|r| r.min_age),
            group.age_range.map(|r| r.max_age),
            group.day.to_string(),
            group.time,
            group.id,
        ],
    )?;
    Ok(())
}

fn set_leaders(conn: &Connection, group_id: Id<Group>, leaders: &[Id<User>]) -> AppResult<()> {
    conn.execute(
        "DELETE FROM group_leaders WHERE group_id = ?1",
        params![group_id],
    )?;
    for (position, user_id) in leaders.iter().enumerate() {
        conn.execute(
            "INSERT INTO group_leaders (group_id, user_id, position) VALUES (?1, ?2, ?3)",
            params![group_id, user_id, position as i64],
        )?;
    }
    Ok(())
}

/// Appends a disciple at the end of the list. Re-adding is a no-op.
pub fn add_disciple(conn: &Connection, group_id: Id<Group>, user_id: Id<User>) -> AppResult<()> {
    conn.execute(
        "INSERT OR IGNORE INTO group_disciples (group_id, user_id, position)
         VALUES (?1, ?2, (SELECT COALESCE(MAX(position), -1) + 1 FROM group_disciples WHERE group_id = ?1))",
        params![group_id, user_id],
    )?;
    Ok(())
}

pub fn find_by_id(conn: &Connection, id: Id<Group>) -> AppResult<Option<Group>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM connection_groups WHERE id = ?1",
        GROUP_COLUMNS
    ))?;

    let result = stmt.query_row(params![id], row_to_group);

    match result {
        Ok(group) => Ok(Some(with_members(conn, group)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn find_by_invitation_code(conn: &Connection, code: &str) -> AppResult<Option<Group>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM connection_groups WHERE invitation_code = ?1",
        GROUP_COLUMNS
    ))?;

    let result = stmt.query_row(params![code], row_to_group);

    match result {
        Ok(group) => Ok(Some(with_members(conn, group)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn find_by_leader(conn: &Connection, user_id: Id<User>) -> AppResult<Vec<Group>> {
    query_groups(
        conn,
        &format!(
            "SELECT {} FROM connection_groups WHERE id IN
             (SELECT group_id FROM group_leaders WHERE user_id = ?1) ORDER BY created_at",
            GROUP_COLUMNS
        ),
        user_id,
    )
}

pub fn find_by_disciple(conn: &Connection, user_id: Id<User>) -> AppResult<Vec<Group>> {
    query_groups(
        conn,
        &format!(
            "SELECT {} FROM connection_groups WHERE id IN
             (SELECT group_id FROM group_disciples WHERE user_id = ?1) ORDER BY created_at",
            GROUP_COLUMNS
        ),
        user_id,
    )
}

pub fn find_all(conn: &Connection) -> AppResult<Vec<Group>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM connection_groups ORDER BY created_at",
        GROUP_COLUMNS
    ))?;
    let groups = stmt
        .query_map([], row_to_group)?
        .collect::<Result<Vec<_>, _>>()?;
    groups.into_iter().map(|g| with_members(conn, g)).collect()
}

pub fn count(conn: &Connection) -> AppResult<i64> {
    let n = conn.query_row("SELECT COUNT(*) FROM connection_groups", [], |row| row.get(0))?;
    Ok(n)
}

fn query_groups(conn: &Connection, sql: &str, user_id: Id<User>) -> AppResult<Vec<Group>> {
    let mut stmt = conn.prepare(sql)?;
    let groups = stmt
        .query_map(params![user_id], row_to_group)?
        .collect::<Result<Vec<_>, _>>()?;
    groups.into_iter().map(|g| with_members(conn, g)).collect()
}

fn with_members(conn: &Connection, mut group: Group) -> AppResult<Group> {
    group.leaders = member_ids(conn, "group_leaders", group.id)?;
    group.disciples = member_ids(conn, "group_disciples", group.id)?;
    Ok(group)
}

fn member_ids(conn: &Connection, table: &str, group_id: Id<Group>) -> AppResult<Vec<Id<User>>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT user_id FROM {} WHERE group_id = ?1 ORDER BY position",
        table
    ))?;
    let ids = stmt
        .query_map(params![group_id], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids)
}

fn row_to_group(row: &Row) -> rusqlite::Result<Group> {
    let min_age: Option<i32> = row.get(4)?;
    let max_age: Option<i32> = row.get(5)?;
    let day_str: String = row.get(6)?;
    let day = day_str.parse::<Weekday>().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            6,
            Type::Text,
            format!("invalid weekday: {}", day_str).into(),
        )
    })?;

    Ok(Group {
        id: row.get(0)?,
        name: row.get(1)?,
        address: row.get(2)?,
        district: row.get(3)?,
        age_range: match (min_age, max_age) {
            (Some(min_age), Some(max_age)) => Some(AgeRange { min_age, max_age }),
            _ => None,
        },
        day,
        time: row.get(7)?,
        leaders: Vec::new(),
        disciples: Vec::new(),
        invitation_code: row.get(8)?,
        created_at: row.get(9)?,
    })
}
