use chrono::{NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ids::Id;
use super::user::User;

pub const INVITATION_CODE_LEN: usize = 6;
pub const MAX_LEADERS: usize = 2;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeRange {
    pub min_age: i32,
    pub max_age: i32,
}

/// A connection group: one or two leaders and the disciples who joined them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: Id<Group>,
    pub name: String,
    pub address: String,
    pub district: String,
    pub age_range: Option<AgeRange>,
    pub day: Weekday,
    pub time: NaiveTime,
    pub leaders: Vec<Id<User>>,
    pub disciples: Vec<Id<User>>,
    pub invitation_code: String,
    pub created_at: NaiveDateTime,
}

impl Group {
    pub fn create(
        name: String,
        address: String,
        district: String,
        age_range: Option<AgeRange>,
        day: Weekday,
        time: NaiveTime,
        leaders: Vec<Id<User>>,
        invitation_code: String,
        created_at: NaiveDateTime,
    ) -> Self {
        Self {
            id: Id::generate(),
            name,
            address,
            district,
            age_range,
            day,
            time,
            leaders,
            disciples: Vec::new(),
            invitation_code,
            created_at,
        }
    }

    pub fn is_leader(&self, user_id: Id<User>) -> bool {
        self.leaders.contains(&user_id)
    }

    pub fn is_disciple(&self, user_id: Id<User>) -> bool {
        self.disciples.contains(&user_id)
    }

    pub fn is_member(&self, user_id: Id<User>) -> bool {
        self.is_leader(user_id) || self.is_disciple(user_id)
    }

    /// Leaders first, then disciples.
    pub fn member_ids(&self) -> Vec<Id<User>> {
        self.leaders
            .iter()
            .chain(self.disciples.iter())
            .copied()
            .collect()
    }
}

/// Six uppercase alphanumerics drawn from a fresh v4 UUID.
pub fn generate_invitation_code() -> String {
    let bytes = Uuid::new_v4().into_bytes();
    bytes[..INVITATION_CODE_LEN]
        .iter()
        .map(|b| CODE_ALPHABET[*b as usize % CODE_ALPHABET.len()] as char)
        .collect()
}

/// Canonical form of a code typed by a user.
pub fn normalize_invitation_code(code: &str) -> String {
    code.trim().to_uppercase()
}

pub fn day_display_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Lunes",
        Weekday::Tue => "Martes",
        Weekday::Wed => "Miércoles",
        Weekday::Thu => "Jueves",
        Weekday::Fri => "Viernes",
        Weekday::Sat => "Sábado",
        Weekday::Sun => "Domingo",
    }
}

/// Accepts chrono's English names ("sun", "Sunday") and Spanish day names.
pub fn parse_day(s: &str) -> Option<Weekday> {
    let lower = s.trim().to_lowercase();
    if let Ok(day) = lower.parse::<Weekday>() {
        return Some(day);
    }
    match lower.as_str() {
        "lunes" => Some(Weekday::Mon),
        "martes" => Some(Weekday::Tue),
        "miercoles" | "miércoles" => Some(Weekday::Wed),
        "jueves" => Some(Weekday::Thu),
        "viernes" => Some(Weekday::Fri),
        "sabado" | "sábado" => Some(Weekday::Sat),
        "domingo" => Some(Weekday::Sun),
        _ => None,
    }
}
