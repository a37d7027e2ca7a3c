use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::group::Group;
use super::ids::Id;
use super::user::User;

pub const MIN_NAME_LEN: usize = 2;
pub const MIN_ADDRESS_LEN: usize = 5;
pub const MIN_DESCRIPTION_LEN: usize = 10;

/// A member's answer to an activity invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Confirmed,
    Pending,
    Denied,
}

impl ResponseStatus {
    pub const ALL: &'static [ResponseStatus] = &[
        ResponseStatus::Confirmed,
        ResponseStatus::Pending,
        ResponseStatus::Denied,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            ResponseStatus::Confirmed => "Confirmado",
            ResponseStatus::Pending => "Pendiente",
            ResponseStatus::Denied => "No asistirá",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "confirmed" => Some(ResponseStatus::Confirmed),
            "pending" => Some(ResponseStatus::Pending),
            "denied" => Some(ResponseStatus::Denied),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            ResponseStatus::Confirmed => "confirmed",
            ResponseStatus::Pending => "pending",
            ResponseStatus::Denied => "denied",
        }
    }
}

/// A scheduled event of a group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: Id<Activity>,
    pub group_id: Id<Group>,
    pub name: String,
    pub address: String,
    pub date_time: NaiveDateTime,
    pub description: String,
    pub created_by: Id<User>,
    pub created_at: NaiveDateTime,
}

impl Activity {
    pub fn create(
        group_id: Id<Group>,
        name: String,
        address: String,
        date_time: NaiveDateTime,
        description: String,
        created_by: Id<User>,
        created_at: NaiveDateTime,
    ) -> Self {
        Self {
            id: Id::generate(),
            group_id,
            name,
            address,
            date_time,
            description,
            created_by,
            created_at,
        }
    }
}

/// One row per (activity, user).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityResponse {
    pub id: Id<ActivityResponse>,
    pub activity_id: Id<Activity>,
    pub user_id: Id<User>,
    pub status: ResponseStatus,
    pub responded_at: NaiveDateTime,
}

impl ActivityResponse {
    pub fn create(
        activity_id: Id<Activity>,
        user_id: Id<User>,
        status: ResponseStatus,
        responded_at: NaiveDateTime,
    ) -> Self {
        Self {
            id: Id::generate(),
            activity_id,
            user_id,
            status,
            responded_at,
        }
    }
}
