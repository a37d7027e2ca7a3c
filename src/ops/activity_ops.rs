use chrono::NaiveDateTime;
use rusqlite::Connection;
use tracing::info;

use crate::auth::{self, Identity};
use crate::db::{activity_repo, group_repo, response_repo};
use crate::error::{AppError, AppResult};
use crate::model::activity::{MIN_ADDRESS_LEN, MIN_DESCRIPTION_LEN, MIN_NAME_LEN};
use crate::model::{Activity, ActivityResponse, Group, Id, ResponseStatus};
use crate::validation;

pub fn create_activity(
    conn: &Connection,
    caller: Option<&Identity>,
    group_id: Id<Group>,
    name: &str,
    address: &str,
    date_time: NaiveDateTime,
    description: &str,
    now: NaiveDateTime,
) -> AppResult<Activity> {
    let user = auth::current_user(conn, caller)?;
    let group = group_repo::find_by_id(conn, group_id)?
        .ok_or_else(|| AppError::not_found("Group", group_id))?;

    if !group.is_leader(user.id) {
        return Err(AppError::forbidden("only group leaders can create activities"));
    }

    let valid_name = validation::min_length(name, "name", MIN_NAME_LEN)?;
    let valid_address = validation::min_length(address, "address", MIN_ADDRESS_LEN)?;
    ensure_future(date_time, now)?;
    let valid_description =
        validation::min_length(description, "description", MIN_DESCRIPTION_LEN)?;

    let activity = Activity::create(
        group.id,
        valid_name,
        valid_address,
        date_time,
        valid_description,
        user.id,
        now,
    );
    activity_repo::insert(conn, &activity)?;

    info!(activity_id = %activity.id, group_id = %group.id, "created activity");
    Ok(activity)
}

/// Records the caller's answer, replacing any earlier one.
pub fn respond_to_activity(
    conn: &Connection,
    caller: Option<&Identity>,
    activity_id: Id<Activity>,
    status: ResponseStatus,
    now: NaiveDateTime,
) -> AppResult<ActivityResponse> {
    let user = auth::current_user(conn, caller)?;
    let activity = activity_repo::find_by_id(conn, activity_id)?
        .ok_or_else(|| AppError::not_found("Activity", activity_id))?;
    let group = group_repo::find_by_id(conn, activity.group_id)?
        .ok_or_else(|| AppError::not_found("Group", activity.group_id))?;

    if !group.is_member(user.id) {
        return Err(AppError::forbidden("only members of the group can respond"));
    }

    let response = ActivityResponse::create(activity.id, user.id, status, now);
    let stored = response_repo::upsert(conn, &response)?;

    info!(activity_id = %activity.id, user_id = %user.id, status = status.to_db_str(), "activity response");
    Ok(stored)
}

pub fn update_activity(
    conn: &Connection,
    caller: Option<&Identity>,
    activity_id: Id<Activity>,
    name: Option<&str>,
    address: Option<&str>,
    date_time: Option<NaiveDateTime>,
    description: Option<&str>,
    now: NaiveDateTime,
) -> AppResult<Activity> {
    let user = auth::current_user(conn, caller)?;
    let mut activity = activity_repo::find_by_id(conn, activity_id)?
        .ok_or_else(|| AppError::not_found("Activity", activity_id))?;

    if activity.created_by != user.id {
        return Err(AppError::forbidden("only the activity's creator can edit it"));
    }

    if let Some(n) = name {
        activity.name = validation::min_length(n, "name", MIN_NAME_LEN)?;
    }
    if let Some(a) = address {
        activity.address = validation::min_length(a, "address", MIN_ADDRESS_LEN)?;
    }
    if let Some(dt) = date_time {
        ensure_future(dt, now)?;
        activity.date_time = dt;
    }
    if let Some(d) = description {
        activity.description = validation::min_length(d, "description", MIN_DESCRIPTION_LEN)?;
    }

    activity_repo::update(conn, &activity)?;
    info!(activity_id = %activity.id, "updated activity");
    Ok(activity)
}

/// Removes the activity's responses, then the activity.
pub fn delete_activity(
    conn: &Connection,
    caller: Option<&Identity>,
    activity_id: Id<Activity>,
) -> AppResult<()> {
    let user = auth::current_user(conn, caller)?;
    let activity = activity_repo::find_by_id(conn, activity_id)?
        .ok_or_else(|| AppError::not_found("Activity", activity_id))?;

    if activity.created_by != user.id {
        return Err(AppError::forbidden("only the activity's creator can delete it"));
    }

    let tx = conn.unchecked_transaction()?;
    let removed = response_repo::delete_by_activity(&tx, activity.id)?;
    activity_repo::delete(&tx, activity.id)?;
    tx.commit()?;

    info!(activity_id = %activity.id, responses = removed, "deleted activity");
    Ok(())
}

fn ensure_future(date_time: NaiveDateTime, now: NaiveDateTime) -> AppResult<()> {
    if date_time <= now {
        return Err(AppError::NotInFuture {
            field: "date_time".into(),
        });
    }
    Ok(())
}
