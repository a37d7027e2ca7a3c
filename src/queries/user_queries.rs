use rusqlite::Connection;

use crate::auth::{self, Identity};
use crate::db::user_repo;
use crate::error::{AppError, AppResult};
use crate::model::{Id, User};

pub fn me(conn: &Connection, caller: Option<&Identity>) -> AppResult<User> {
    auth::current_user(conn, caller)
}

/// Visible to the user themself, their leader, their disciples and staff.
pub fn get_user(conn: &Connection, caller: Option<&Identity>, user_id: Id<User>) -> AppResult<User> {
    let viewer = auth::current_user(conn, caller)?;
    let user = user_repo::find_by_id(conn, user_id)?
        .ok_or_else(|| AppError::not_found("User", user_id))?;

    let allowed = viewer.id == user.id
        || viewer.is_staff()
        || user.leader_id == Some(viewer.id)
        || viewer.leader_id == Some(user.id);
    if !allowed {
        return Err(AppError::forbidden("you cannot view this profile"));
    }
    Ok(user)
}

pub fn my_disciples(conn: &Connection, caller: Option<&Identity>) -> AppResult<Vec<User>> {
    let user = auth::current_user(conn, caller)?;
    user_repo::find_by_leader(conn, user.id)
}

pub fn list_users(conn: &Connection, caller: Option<&Identity>) -> AppResult<Vec<User>> {
    auth::require_staff(conn, caller)?;
    user_repo::find_all(conn)
}
