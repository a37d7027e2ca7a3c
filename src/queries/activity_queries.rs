use std::collections::HashSet;

use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::Serialize;
use tracing::debug;

use crate::auth::{self, Identity};
use crate::db::{activity_repo, group_repo, response_repo, user_repo};
use crate::error::{AppError, AppResult};
use crate::model::{Activity, ActivityResponse, Group, Id, ResponseStatus, User};

/// One member's line in an activity's attendance list. Members who never
/// answered show up as pending with no `response_id`.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseEntry {
    pub response_id: Option<Id<ActivityResponse>>,
    pub user: User,
    pub status: ResponseStatus,
    pub responded_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityDetails {
    pub activity: Activity,
    pub group_name: String,
    pub confirmed: Vec<ResponseEntry>,
    pub pending: Vec<ResponseEntry>,
    pub denied: Vec<ResponseEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpcomingActivity {
    pub activity: Activity,
    pub group_name: String,
    pub my_status: Option<ResponseStatus>,
}

pub fn get_activity_with_responses(
    conn: &Connection,
    caller: Option<&Identity>,
    activity_id: Id<Activity>,
) -> AppResult<ActivityDetails> {
    let user = auth::current_user(conn, caller)?;
    let activity = activity_repo::find_by_id(conn, activity_id)?
        .ok_or_else(|| AppError::not_found("Activity", activity_id))?;
    let group = group_repo::find_by_id(conn, activity.group_id)?
        .ok_or_else(|| AppError::not_found("Group", activity.group_id))?;

    if !group.is_member(user.id) {
        return Err(AppError::forbidden("you are not a member of this group"));
    }

    let responses = response_repo::find_by_activity(conn, activity.id)?;
    let mut details = ActivityDetails {
        activity,
        group_name: group.name.clone(),
        confirmed: Vec::new(),
        pending: Vec::new(),
        denied: Vec::new(),
    };

    let mut answered = HashSet::new();
    for response in responses {
        answered.insert(response.user_id);
        let member = match user_repo::find_by_id(conn, response.user_id)? {
            Some(u) => u,
            None => continue,
        };
        let entry = ResponseEntry {
            response_id: Some(response.id),
            user: member,
            status: response.status,
            responded_at: Some(response.responded_at),
        };
        match response.status {
            ResponseStatus::Confirmed => details.confirmed.push(entry),
            ResponseStatus::Pending => details.pending.push(entry),
            ResponseStatus::Denied => details.denied.push(entry),
        }
    }

    let silent: Vec<Id<User>> = group
        .member_ids()
        .into_iter()
        .filter(|id| !answered.contains(id))
        .collect();
    for member in user_repo::find_many(conn, &silent)? {
        details.pending.push(ResponseEntry {
            response_id: None,
            user: member,
            status: ResponseStatus::Pending,
            responded_at: None,
        });
    }

    debug!(
        activity_id = %details.activity.id,
        confirmed = details.confirmed.len(),
        pending = details.pending.len(),
        denied = details.denied.len(),
        "activity responses"
    );
    Ok(details)
}

pub fn group_activities(
    conn: &Connection,
    caller: Option<&Identity>,
    group_id: Id<Group>,
) -> AppResult<Vec<Activity>> {
    let user = auth::current_user(conn, caller)?;
    let group = group_repo::find_by_id(conn, group_id)?
        .ok_or_else(|| AppError::not_found("Group", group_id))?;

    if !group.is_member(user.id) {
        return Err(AppError::forbidden("you are not a member of this group"));
    }
    activity_repo::find_by_group(conn, group.id)
}

/// Future activities of every group the caller leads or belongs to, soonest first.
pub fn my_upcoming_activities(
    conn: &Connection,
    caller: Option<&Identity>,
    now: NaiveDateTime,
) -> AppResult<Vec<UpcomingActivity>> {
    let user = auth::current_user(conn, caller)?;

    let mut groups = group_repo::find_by_leader(conn, user.id)?;
    groups.extend(group_repo::find_by_disciple(conn, user.id)?);

    let mut upcoming = Vec::new();
    for group in &groups {
        for activity in activity_repo::find_by_group(conn, group.id)? {
            if activity.date_time <= now {
                continue;
            }
            let my_status = response_repo::find(conn, activity.id, user.id)?.map(|r| r.status);
            upcoming.push(UpcomingActivity {
                activity,
                group_name: group.name.clone(),
                my_status,
            });
        }
    }

    upcoming.sort_by_key(|u| u.activity.date_time);
    Ok(upcoming)
}
