use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use serde::Serialize;
use tracing::debug;

use crate::auth::{self, Identity};
use crate::db::{activity_repo, attendance_repo, course_repo, group_repo, service_repo, user_repo};
use crate::error::AppResult;
use crate::model::{AttendanceType, Course, Gender, Id, Period, Role, Service, User};

pub const DEFAULT_POPULAR_LIMIT: usize = 10;
pub const NO_SERVICE_LABEL: &str = "Sin servicio";
pub const UNKNOWN_AGE_LABEL: &str = "unknown";

/// Upper bounds (inclusive) of each age band; anything past the last is "56+".
const AGE_BANDS: &[(u32, &str)] = &[
    (12, "-13"),
    (17, "13-17"),
    (25, "18-25"),
    (35, "26-35"),
    (45, "36-45"),
    (55, "46-55"),
];
const OLDEST_BAND: &str = "56+";

const MONTH_LABELS: [&str; 12] = [
    "Ene", "Feb", "Mar", "Abr", "May", "Jun", "Jul", "Ago", "Sep", "Oct", "Nov", "Dic",
];

#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub total_members: usize,
    pub pastors: usize,
    pub admins: usize,
    pub leaders: usize,
    pub total_groups: i64,
    pub total_courses: usize,
    pub active_students: usize,
    pub total_services: usize,
    pub upcoming_activities: usize,
    /// Members with neither a leader nor a group of their own.
    pub unconnected_members: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LabeledCount {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeTotal {
    pub attendance_type: AttendanceType,
    pub label: &'static str,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendPoint {
    pub year: i32,
    pub month: u32,
    pub label: String,
    pub totals: Vec<TypeTotal>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SchoolParticipation {
    pub active: usize,
    pub inactive: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoursePopularity {
    pub course_id: Id<Course>,
    pub name: String,
    pub enrolled: i64,
}

/// Band label for an age in years.
pub fn age_band(age: u32) -> &'static str {
    AGE_BANDS
        .iter()
        .find(|(upper, _)| age <= *upper)
        .map_or(OLDEST_BAND, |(_, label)| *label)
}

pub fn month_label(year: i32, month: u32) -> String {
    let name = MONTH_LABELS
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("?");
    format!("{} {}", name, year)
}

pub fn overview(conn: &Connection, caller: Option<&Identity>, now: NaiveDateTime) -> AppResult<Overview> {
    auth::require_staff(conn, caller)?;

    let users = user_repo::find_all(conn)?;
    let groups = group_repo::find_all(conn)?;

    let leader_ids: HashSet<Id<User>> = groups.iter().flat_map(|g| g.leaders.iter().copied()).collect();
    let unconnected = users
        .iter()
        .filter(|u| u.leader_id.is_none() && !leader_ids.contains(&u.id))
        .count();

    let upcoming = activity_repo::find_all(conn)?
        .iter()
        .filter(|a| a.date_time > now)
        .count();

    debug!(users = users.len(), groups = groups.len(), "computed overview");

    Ok(Overview {
        total_members: users.len(),
        pastors: users.iter().filter(|u| u.role == Role::Pastor).count(),
        admins: users.iter().filter(|u| u.is_admin).count(),
        leaders: leader_ids.len(),
        total_groups: group_repo::count(conn)?,
        total_courses: course_repo::find_all(conn)?.len(),
        active_students: users.iter().filter(|u| u.is_active_in_school).count(),
        total_services: service_repo::find_all(conn)?.len(),
        upcoming_activities: upcoming,
        unconnected_members: unconnected,
    })
}

pub fn gender_distribution(conn: &Connection, caller: Option<&Identity>) -> AppResult<Vec<LabeledCount>> {
    auth::require_staff(conn, caller)?;
    let users = user_repo::find_all(conn)?;

    Ok(Gender::ALL
        .iter()
        .map(|g| LabeledCount {
            label: g.display_name().to_string(),
            count: users.iter().filter(|u| u.gender == *g).count(),
        })
        .collect())
}

/// Counts per fixed band, youngest first, with users lacking a birth date last.
pub fn age_distribution(
    conn: &Connection,
    caller: Option<&Identity>,
    today: NaiveDate,
) -> AppResult<Vec<LabeledCount>> {
    auth::require_staff(conn, caller)?;
    let users = user_repo::find_all(conn)?;

    let mut counts: HashMap<&'static str, usize> = HashMap::new();
    for user in &users {
        let band = user.age_on(today).map_or(UNKNOWN_AGE_LABEL, age_band);
        *counts.entry(band).or_insert(0) += 1;
    }

    Ok(AGE_BANDS
        .iter()
        .map(|(_, label)| *label)
        .chain([OLDEST_BAND, UNKNOWN_AGE_LABEL])
        .map(|label| LabeledCount {
            label: label.to_string(),
            count: counts.get(label).copied().unwrap_or(0),
        })
        .collect())
}

/// Per-month totals for every attendance type across all users.
pub fn monthly_attendance_trend(
    conn: &Connection,
    caller: Option<&Identity>,
    period: Period,
) -> AppResult<Vec<TrendPoint>> {
    auth::require_staff(conn, caller)?;

    let mut points = Vec::new();
    for (year, month) in period.trend_months()? {
        let (from, to) = Period::Month { year, month }.window()?;
        let records = attendance_repo::find_in_range(conn, from, to)?;
        let totals = AttendanceType::ALL
            .iter()
            .map(|t| TypeTotal {
                attendance_type: *t,
                label: t.label(),
                total: records
                    .iter()
                    .filter(|r| r.attendance_type == *t)
                    .map(|r| r.total())
                    .sum(),
            })
            .collect();
        points.push(TrendPoint {
            year,
            month,
            label: month_label(year, month),
            totals,
        });
    }
    Ok(points)
}

/// Users per service, in service order, with the unassigned bucket last.
pub fn service_distribution(conn: &Connection, caller: Option<&Identity>) -> AppResult<Vec<LabeledCount>> {
    auth::require_staff(conn, caller)?;
    let users = user_repo::find_all(conn)?;
    let services = service_repo::find_all(conn)?;

    let mut per_service: HashMap<Id<Service>, usize> = HashMap::new();
    let mut unassigned = 0;
    for user in &users {
        match user.service_id {
            Some(id) if services.iter().any(|s| s.id == id) => *per_service.entry(id).or_insert(0) += 1,
            _ => unassigned += 1,
        }
    }

    let mut out: Vec<LabeledCount> = services
        .iter()
        .map(|s| LabeledCount {
            label: s.name.clone(),
            count: per_service.get(&s.id).copied().unwrap_or(0),
        })
        .collect();
    out.push(LabeledCount {
        label: NO_SERVICE_LABEL.to_string(),
        count: unassigned,
    });
    Ok(out)
}

pub fn school_participation(conn: &Connection, caller: Option<&Identity>) -> AppResult<SchoolParticipation> {
    auth::require_staff(conn, caller)?;
    let users = user_repo::find_all(conn)?;
    let active = users.iter().filter(|u| u.is_active_in_school).count();
    Ok(SchoolParticipation {
        active,
        inactive: users.len() - active,
    })
}

/// Courses by enrollment, most popular first. Ties keep creation order.
pub fn popular_courses(
    conn: &Connection,
    caller: Option<&Identity>,
    limit: Option<usize>,
) -> AppResult<Vec<CoursePopularity>> {
    auth::require_staff(conn, caller)?;

    let mut ranked = Vec::new();
    for course in course_repo::find_all(conn)? {
        ranked.push(CoursePopularity {
            enrolled: user_repo::count_by_course(conn, course.id)?,
            course_id: course.id,
            name: course.name,
        });
    }
    ranked.sort_by(|a, b| b.enrolled.cmp(&a.enrolled));
    debug!(courses = ranked.len(), "ranked courses");
    ranked.truncate(limit.unwrap_or(DEFAULT_POPULAR_LIMIT));
    Ok(ranked)
}
