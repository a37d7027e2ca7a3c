use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::course::Course;
use super::ids::Id;
use super::service::Service;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const ALL: &'static [Gender] = &[Gender::Male, Gender::Female];

    pub fn display_name(&self) -> &'static str {
        match self {
            Gender::Male => "Masculino",
            Gender::Female => "Femenino",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "Male" => Some(Gender::Male),
            "Female" => Some(Gender::Female),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }

    /// Lenient parse for user input ("m", "female", "femenino", ...).
    pub fn parse_input(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "m" | "male" | "masculino" | "h" | "hombre" => Some(Gender::Male),
            "f" | "female" | "femenino" | "mujer" => Some(Gender::Female),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Pastor,
    Member,
}

impl Role {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "Pastor" => Some(Role::Pastor),
            "Member" => Some(Role::Member),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            Role::Pastor => "Pastor",
            Role::Member => "Member",
        }
    }
}

/// A registered member of the church.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Id<User>,
    /// Subject issued by the external auth provider.
    pub auth_subject: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Gender,
    pub role: Role,
    /// Set once, when the user joins a group as a disciple.
    pub leader_id: Option<Id<User>>,
    pub current_courses: Vec<Id<Course>>,
    pub service_id: Option<Id<Service>>,
    pub is_active_in_school: bool,
    pub is_admin: bool,
}

impl User {
    pub fn create(auth_subject: String, name: String, email: String, gender: Gender) -> Self {
        Self {
            id: Id::generate(),
            auth_subject,
            name,
            email,
            phone: None,
            birth_date: None,
            gender,
            role: Role::Member,
            leader_id: None,
            current_courses: Vec::new(),
            service_id: None,
            is_active_in_school: false,
            is_admin: false,
        }
    }

    /// Pastors and admins see dashboard statistics and course rosters.
    pub fn is_staff(&self) -> bool {
        self.is_admin || self.role == Role::Pastor
    }

    pub fn is_enrolled_in(&self, course_id: Id<Course>) -> bool {
        self.current_courses.contains(&course_id)
    }

    /// Age in whole years on `today`, if a birth date is known.
    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        let birth = self.birth_date?;
        if birth > today {
            return Some(0);
        }
        let mut years = today.year() - birth.year();
        if (today.month(), today.day()) < (birth.month(), birth.day()) {
            years -= 1;
        }
        Some(years.max(0) as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_born(y: i32, m: u32, d: u32) -> User {
        let mut u = User::create("sub".into(), "Ana".into(), "ana@example.com".into(), Gender::Female);
        u.birth_date = NaiveDate::from_ymd_opt(y, m, d);
        u
    }

    #[test]
    fn age_counts_completed_years() {
        let u = user_born(2000, 6, 15);
        let before = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
        let on = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert_eq!(u.age_on(before), Some(23));
        assert_eq!(u.age_on(on), Some(24));
    }

    #[test]
    fn age_unknown_without_birth_date() {
        let u = User::create("sub".into(), "Ana".into(), String::new(), Gender::Female);
        assert_eq!(u.age_on(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()), None);
    }

    #[test]
    fn gender_parse_input_is_lenient() {
        assert_eq!(Gender::parse_input(" F "), Some(Gender::Female));
        assert_eq!(Gender::parse_input("Masculino"), Some(Gender::Male));
        assert_eq!(Gender::parse_input("x"), None);
    }
}
