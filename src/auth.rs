use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::user_repo;
use crate::error::{AppError, AppResult};
use crate::model::User;

/// The authenticated caller as asserted by the external auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub subject: String,
}

impl Identity {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
        }
    }
}

/// Resolves the caller to their user row. Every handler calls this first.
pub fn current_user(conn: &Connection, caller: Option<&Identity>) -> AppResult<User> {
    let identity = caller.ok_or(AppError::Unauthenticated)?;
    user_repo::find_by_subject(conn, &identity.subject)?
        .ok_or_else(|| AppError::not_found("User", &identity.subject))
}

pub fn require_admin(conn: &Connection, caller: Option<&Identity>) -> AppResult<User> {
    let user = current_user(conn, caller)?;
    if !user.is_admin {
        return Err(AppError::forbidden("administrators only"));
    }
    Ok(user)
}

/// Pastors and administrators.
pub fn require_staff(conn: &Connection, caller: Option<&Identity>) -> AppResult<User> {
    let user = current_user(conn, caller)?;
    if !user.is_staff() {
        return Err(AppError::forbidden("pastors and administrators only"));
    }
    Ok(user)
}
