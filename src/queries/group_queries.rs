use rusqlite::Connection;
use serde::Serialize;
use tracing::debug;

use crate::auth::{self, Identity};
use crate::db::{group_repo, user_repo};
use crate::error::{AppError, AppResult};
use crate::model::{Group, Id, User};

/// A group with its member ids expanded into users.
#[derive(Debug, Clone, Serialize)]
pub struct GroupDetails {
    pub group: Group,
    pub leaders: Vec<User>,
    pub disciples: Vec<User>,
}

pub fn get_group_by_id(
    conn: &Connection,
    caller: Option<&Identity>,
    group_id: Id<Group>,
) -> AppResult<GroupDetails> {
    let user = auth::current_user(conn, caller)?;
    let group = group_repo::find_by_id(conn, group_id)?
        .ok_or_else(|| AppError::not_found("Group", group_id))?;

    if !group.is_member(user.id) {
        return Err(AppError::forbidden("you are not a member of this group"));
    }

    enrich(conn, group)
}

pub fn get_groups_as_leader(
    conn: &Connection,
    caller: Option<&Identity>,
) -> AppResult<Vec<GroupDetails>> {
    let user = auth::current_user(conn, caller)?;
    let groups = group_repo::find_by_leader(conn, user.id)?;
    debug!(user_id = %user.id, groups = groups.len(), "groups as leader");
    groups.into_iter().map(|g| enrich(conn, g)).collect()
}

/// The group the caller joined, if any.
pub fn get_group_as_disciple(
    conn: &Connection,
    caller: Option<&Identity>,
) -> AppResult<Option<GroupDetails>> {
    let user = auth::current_user(conn, caller)?;
    match group_repo::find_by_disciple(conn, user.id)?.into_iter().next() {
        Some(group) => Ok(Some(enrich(conn, group)?)),
        None => Ok(None),
    }
}

/// Preview of the group behind an invitation code. Knowing the code is
/// enough to see it.
pub fn get_group_by_code(
    conn: &Connection,
    caller: Option<&Identity>,
    code: &str,
) -> AppResult<GroupDetails> {
    auth::current_user(conn, caller)?;
    let code = crate::model::group::normalize_invitation_code(code);
    let group = group_repo::find_by_invitation_code(conn, &code)?
        .ok_or_else(|| AppError::not_found("Group", &code))?;
    enrich(conn, group)
}

fn enrich(conn: &Connection, group: Group) -> AppResult<GroupDetails> {
    let leaders = user_repo::find_many(conn, &group.leaders)?;
    let disciples = user_repo::find_many(conn, &group.disciples)?;
    Ok(GroupDetails {
        group,
        leaders,
        disciples,
    })
}
