use chrono::NaiveDate;
use rusqlite::Connection;
use tracing::info;

use crate::auth::{self, Identity};
use crate::db::{group_repo, user_repo};
use crate::error::{AppError, AppResult};
use crate::model::{Gender, Id, Role, User};
use crate::validation::{self, trim_optional};

/// Creates the caller's user row on first sign-in.
pub fn register_user(
    conn: &Connection,
    caller: Option<&Identity>,
    name: &str,
    email: &str,
    gender: Gender,
    birth_date: Option<NaiveDate>,
) -> AppResult<User> {
    let identity = caller.ok_or(AppError::Unauthenticated)?;

    if user_repo::find_by_subject(conn, &identity.subject)?.is_some() {
        return Err(AppError::AlreadyExists {
            entity_type: "User".into(),
            identifier: identity.subject.clone(),
        });
    }

    let valid_name = validation::non_blank(name, "name")?;
    let mut user = User::create(
        identity.subject.clone(),
        valid_name,
        email.trim().to_string(),
        gender,
    );
    user.birth_date = birth_date;

    user_repo::insert(conn, &user)?;
    info!(user_id = %user.id, "registered user");
    Ok(user)
}

pub fn update_profile(
    conn: &Connection,
    caller: Option<&Identity>,
    name: Option<&str>,
    phone: Option<Option<&str>>,
    birth_date: Option<Option<NaiveDate>>,
    gender: Option<Gender>,
) -> AppResult<User> {
    let mut user = auth::current_user(conn, caller)?;

    if let Some(n) = name {
        user.name = validation::non_blank(n, "name")?;
    }
    if let Some(p) = phone {
        user.phone = trim_optional(p);
    }
    if let Some(bd) = birth_date {
        user.birth_date = bd;
    }
    if let Some(g) = gender {
        if g != user.gender {
            ensure_gender_unbound(conn, &user)?;
        }
        user.gender = g;
    }

    user_repo::update(conn, &user)?;
    info!(user_id = %user.id, "updated profile");
    Ok(user)
}

/// Two-leader groups pair leaders of different genders and assign disciples
/// by gender, so neither side may change it.
fn ensure_gender_unbound(conn: &Connection, user: &User) -> AppResult<()> {
    if group_repo::find_by_leader(conn, user.id)?
        .iter()
        .any(|g| g.leaders.len() > 1)
    {
        return Err(AppError::GenderLocked("co-lead a group".into()));
    }
    if user.leader_id.is_some()
        && group_repo::find_by_disciple(conn, user.id)?
            .iter()
            .any(|g| g.leaders.len() > 1)
    {
        return Err(AppError::GenderLocked(
            "belong to a group with two leaders".into(),
        ));
    }
    Ok(())
}

pub fn set_role(
    conn: &Connection,
    caller: Option<&Identity>,
    user_id: Id<User>,
    role: Role,
) -> AppResult<User> {
    auth::require_admin(conn, caller)?;
    let mut user = user_repo::find_by_id(conn, user_id)?
        .ok_or_else(|| AppError::not_found("User", user_id))?;

    user.role = role;
    user_repo::update(conn, &user)?;
    info!(user_id = %user.id, role = role.to_db_str(), "changed role");
    Ok(user)
}

pub fn set_admin(
    conn: &Connection,
    caller: Option<&Identity>,
    user_id: Id<User>,
    is_admin: bool,
) -> AppResult<User> {
    let admin = auth::require_admin(conn, caller)?;
    if admin.id == user_id && !is_admin {
        return Err(AppError::forbidden("cannot revoke your own administrator rights"));
    }

    let mut user = user_repo::find_by_id(conn, user_id)?
        .ok_or_else(|| AppError::not_found("User", user_id))?;

    user.is_admin = is_admin;
    user_repo::update(conn, &user)?;
    info!(user_id = %user.id, is_admin, "changed admin flag");
    Ok(user)
}
