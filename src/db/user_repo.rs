use rusqlite::{params, Connection, Row};

use crate::error::AppResult;
use crate::model::{Course, Id, Service, User};

const USER_COLUMNS: &str = "id, auth_subject, name, email, phone, birth_date, gender, role,
    leader_id, service_id, is_active_in_school, is_admin";

pub fn insert(conn: &Connection, user: &User) -> AppResult<()> {
    conn.execute(
        "INSERT INTO users (id, auth_subject, name, email, phone, birth_date, gender, role,
         leader_id, service_id, is_active_in_school, is_admin)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            user.id,
            user.auth_subject,
            user.name,
            user.email,
            user.phone,
            user.birth_date,
            user.gender,
            user.role,
            user.leader_id,
            user.service_id,
            user.is_active_in_school,
            user.is_admin,
        ],
    )?;
    write_courses(conn, user)?;
    Ok(())
}

/// Rewrites every field of the user, including the enrolled course list.
pub fn update(conn: &Connection, user: &User) -> AppResult<()> {
    conn.execute(
        "UPDATE users SET name = ?1, email = ?2, phone = ?3, birth_date = ?4, gender = ?5,
         role = ?6, leader_id = ?7, service_id = ?8, is_active_in_school = ?9, is_admin = ?10
         WHERE id = ?11",
        params![
            user.name,
            user.email,
            user.phone,
            user.birth_date,
            user.gender,
            user.role,
            user.leader_id,
            user.service_id,
            user.is_active_in_school,
            user.is_admin,
            user.id,
        ],
    )?;
    conn.execute(
        "DELETE FROM user_courses WHERE user_id = ?1",
        params![user.id],
    )?;
    write_courses(conn, user)?;
    Ok(())
}

pub fn find_by_id(conn: &Connection, id: Id<User>) -> AppResult<Option<User>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS))?;

    let result = stmt.query_row(params![id], row_to_user);

    match result {
        Ok(user) => Ok(Some(with_courses(conn, user)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn find_by_subject(conn: &Connection, subject: &str) -> AppResult<Option<User>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM users WHERE auth_subject = ?1",
        USER_COLUMNS
    ))?;

    let result = stmt.query_row(params![subject], row_to_user);

    match result {
        Ok(user) => Ok(Some(with_courses(conn, user)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Resolves each id individually; ids without a user are dropped.
pub fn find_many(conn: &Connection, ids: &[Id<User>]) -> AppResult<Vec<User>> {
    let mut users = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(user) = find_by_id(conn, *id)? {
            users.push(user);
        }
    }
    Ok(users)
}

pub fn find_all(conn: &Connection) -> AppResult<Vec<User>> {
    query_users(
        conn,
        &format!("SELECT {} FROM users ORDER BY name", USER_COLUMNS),
        params![],
    )
}

pub fn find_by_leader(conn: &Connection, leader_id: Id<User>) -> AppResult<Vec<User>> {
    query_users(
        conn,
        &format!("SELECT {} FROM users WHERE leader_id = ?1 ORDER BY name", USER_COLUMNS),
        params![leader_id],
    )
}

pub fn find_by_service(conn: &Connection, service_id: Id<Service>) -> AppResult<Vec<User>> {
    query_users(
        conn,
        &format!("SELECT {} FROM users WHERE service_id = ?1 ORDER BY name", USER_COLUMNS),
        params![service_id],
    )
}

pub fn find_by_course(conn: &Connection, course_id: Id<Course>) -> AppResult<Vec<User>> {
    query_users(
        conn,
        &format!(
            "SELECT {} FROM users WHERE id IN
             (SELECT user_id FROM user_courses WHERE course_id = ?1) ORDER BY name",
            USER_COLUMNS
        ),
        params![course_id],
    )
}

pub fn count_by_course(conn: &Connection, course_id: Id<Course>) -> AppResult<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM user_courses WHERE course_id = ?1",
        params![course_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Clears the service reference on every user pointing at `service_id`.
pub fn clear_service(conn: &Connection, service_id: Id<Service>) -> AppResult<usize> {
    let n = conn.execute(
        "UPDATE users SET service_id = NULL WHERE service_id = ?1",
        params![service_id],
    )?;
    Ok(n)
}

fn query_users(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> AppResult<Vec<User>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, row_to_user)?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter().map(|u| with_courses(conn, u)).collect()
}

fn write_courses(conn: &Connection, user: &User) -> AppResult<()> {
    for (position, course_id) in user.current_courses.iter().enumerate() {
        conn.execute(
            "INSERT OR IGNORE INTO user_courses (user_id, course_id, position) VALUES (?1, ?2, ?3)",
            params![user.id, course_id, position as i64],
        )?;
    }
    Ok(())
}

fn with_courses(conn: &Connection, mut user: User) -> AppResult<User> {
    let mut stmt = conn.prepare(
        "SELECT course_id FROM user_courses WHERE user_id = ?1 ORDER BY position",
    )?;
    user.current_courses = stmt
        .query_map(params![user.id], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(user)
}

fn row_to_user(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        auth_subject: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        birth_date: row.get(5)?,
        gender: row.get(6)?,
        role: row.get(7)?,
        leader_id: row.get(8)?,
        service_id: row.get(9)?,
        current_courses: Vec::new(),
        is_active_in_school: row.get(10)?,
        is_admin: row.get(11)?,
    })
}
