use chrono::{NaiveDateTime, NaiveTime, Weekday};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::auth::{self, Identity};
use crate::db::{group_repo, user_repo};
use crate::error::{AppError, AppResult};
use crate::model::group::{self, MAX_LEADERS};
use crate::model::{AgeRange, Group, Id, User};
use crate::validation;

pub fn create_group(
    conn: &Connection,
    caller: Option<&Identity>,
    name: &str,
    address: &str,
    district: &str,
    age_range: Option<AgeRange>,
    day: Weekday,
    time: NaiveTime,
    co_leader_id: Option<Id<User>>,
    now: NaiveDateTime,
) -> AppResult<Group> {
    let user = auth::current_user(conn, caller)?;

    let valid_name = validation::non_blank(name, "name")?;
    let valid_address = validation::non_blank(address, "address")?;
    let valid_district = validation::non_blank(district, "district")?;
    if let Some(range) = age_range {
        validation::age_range(range.min_age, range.max_age)?;
    }

    let mut leaders = vec![user.id];
    if let Some(co_id) = co_leader_id {
        let co_leader = user_repo::find_by_id(conn, co_id)?
            .ok_or_else(|| AppError::not_found("User", co_id))?;
        if co_leader.id == user.id {
            return Err(AppError::SelfCoLeader);
        }
        if co_leader.gender == user.gender {
            return Err(AppError::SameGenderCoLeader);
        }
        leaders.push(co_leader.id);
    }
    if leaders.len() > MAX_LEADERS {
        return Err(AppError::TooManyLeaders { max: MAX_LEADERS });
    }

    let code = group::generate_invitation_code();
    if group_repo::find_by_invitation_code(conn, &code)?.is_some() {
        warn!(code = %code, "invitation code collision");
        return Err(AppError::Integrity(
            "generated invitation code is already in use, please try again".into(),
        ));
    }

    let group = Group::create(
        valid_name,
        valid_address,
        valid_district,
        age_range,
        day,
        time,
        leaders,
        code,
        now,
    );

    let tx = conn.unchecked_transaction()?;
    group_repo::insert(&tx, &group)?;
    tx.commit()?;

    info!(group_id = %group.id, leader_id = %user.id, "created group");
    Ok(group)
}

/// Joins the group behind `invitation_code` as a disciple. A user joins at
/// most one group, ever.
pub fn join_group(
    conn: &Connection,
    caller: Option<&Identity>,
    invitation_code: &str,
) -> AppResult<Group> {
    let mut user = auth::current_user(conn, caller)?;

    if user.leader_id.is_some() {
        return Err(AppError::AlreadyInGroup);
    }

    let code = group::normalize_invitation_code(invitation_code);
    let mut group = group_repo::find_by_invitation_code(conn, &code)?
        .ok_or_else(|| AppError::not_found("Group", &code))?;

    if group.is_member(user.id) {
        return Err(AppError::AlreadyMember);
    }

    let leader_id = assign_leader(conn, &group, &user)?;

    let tx = conn.unchecked_transaction()?;
    group_repo::add_disciple(&tx, group.id, user.id)?;
    user.leader_id = Some(leader_id);
    user_repo::update(&tx, &user)?;
    tx.commit()?;

    group.disciples.push(user.id);
    info!(group_id = %group.id, user_id = %user.id, leader_id = %leader_id, "joined group");
    Ok(group)
}

/// One leader: that leader. Two leaders: the one sharing the disciple's gender.
pub(crate) fn assign_leader(conn: &Connection, group: &Group, user: &User) -> AppResult<Id<User>> {
    match group.leaders.as_slice() {
        [only] => Ok(*only),
        [_, _] => {
            let leaders = user_repo::find_many(conn, &group.leaders)?;
            match leaders.iter().find(|l| l.gender == user.gender) {
                Some(leader) => Ok(leader.id),
                None => {
                    warn!(group_id = %group.id, "no leader matches disciple gender");
                    Err(AppError::Integrity(
                        "no leader of this group matches your gender".into(),
                    ))
                }
            }
        }
        other => {
            warn!(group_id = %group.id, leaders = other.len(), "unexpected leader count");
            Err(AppError::Integrity(format!(
                "group has {} leaders",
                other.len()
            )))
        }
    }
}

pub fn update_group(
    conn: &Connection,
    caller: Option<&Identity>,
    group_id: Id<Group>,
    name: Option<&str>,
    address: Option<&str>,
) -> AppResult<Group> {
    let user = auth::current_user(conn, caller)?;
    let mut group = group_repo::find_by_id(conn, group_id)?
        .ok_or_else(|| AppError::not_found("Group", group_id))?;

    if !group.is_leader(user.id) {
        return Err(AppError::forbidden("only the group's leaders can edit it"));
    }

    if let Some(n) = name {
        group.name = validation::non_blank(n, "name")?;
    }
    if let Some(a) = address {
        group.address = validation::non_blank(a, "address")?;
    }

    group_repo::update(conn, &group)?;
    info!(group_id = %group.id, "updated group");
    Ok(group)
}
