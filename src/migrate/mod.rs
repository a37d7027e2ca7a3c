use std::collections::HashMap;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use serde_json::Value;

use crate::db::{course_repo, group_repo, progress_repo, schema, service_repo, user_repo};
use crate::error::{AppError, AppResult};
use crate::model::*;
use crate::ops::group_ops;
use crate::validation;

/// Seeds services, courses and users from a JSON export into a SQLite
/// database. Entries that already exist (same service or course name, same
/// user subject) are skipped. A user's `leader` only takes effect when that
/// leader already leads a group: the user then joins it as a disciple.
pub fn import_json(json_path: &Path, db_path: &Path) -> AppResult<ImportStats> {
    let json_str = std::fs::read_to_string(json_path)?;
    let json: Value = serde_json::from_str(&json_str)?;

    let conn = Connection::open(db_path)?;
    schema::initialize(&conn)?;

    import_value(&conn, &json, chrono::Local::now().naive_local())
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportStats {
    pub services: usize,
    pub courses: usize,
    pub users: usize,
    pub skipped: usize,
    /// Users placed in their leader's group.
    pub linked: usize,
}

/// Imports an already parsed export. Runs in a single transaction.
pub fn import_value(conn: &Connection, json: &Value, now: NaiveDateTime) -> AppResult<ImportStats> {
    let tx = conn.unchecked_transaction()?;
    let mut stats = ImportStats::default();

    // Services by lowercase name, existing ones included, for user lookups.
    let mut services: HashMap<String, Id<Service>> = service_repo::find_all(&tx)?
        .into_iter()
        .map(|s| (s.name.to_lowercase(), s.id))
        .collect();
    for val in array(json, "services") {
        let name = match val.as_str().or_else(|| val["name"].as_str()) {
            Some(n) if !n.trim().is_empty() => n.trim().to_string(),
            _ => {
                stats.skipped += 1;
                continue;
            }
        };
        if services.contains_key(&name.to_lowercase()) {
            stats.skipped += 1;
            continue;
        }
        let mut service = Service::create(name);
        if let Some(id) = optional_id(val)? {
            service.id = id;
        }
        service_repo::insert(&tx, &service)?;
        services.insert(service.name.to_lowercase(), service.id);
        stats.services += 1;
    }

    let mut courses: HashMap<String, Id<Course>> = course_repo::find_all(&tx)?
        .into_iter()
        .map(|c| (c.name.to_lowercase(), c.id))
        .collect();
    for val in array(json, "courses") {
        let course = parse_course(val, now)?;
        if courses.contains_key(&course.name.to_lowercase()) {
            stats.skipped += 1;
            continue;
        }
        course_repo::insert(&tx, &course)?;
        courses.insert(course.name.to_lowercase(), course.id);
        stats.courses += 1;
    }

    // Leaders are resolved after every user exists.
    let mut by_subject: HashMap<String, Id<User>> = HashMap::new();
    let mut pending_leaders: Vec<(Id<User>, String)> = Vec::new();
    for val in array(json, "users") {
        let mut user = match parse_user(val)? {
            Some(u) => u,
            None => {
                stats.skipped += 1;
                continue;
            }
        };
        if user_repo::find_by_subject(&tx, &user.auth_subject)?.is_some() {
            tracing::warn!(subject = %user.auth_subject, "user already exists, skipping");
            stats.skipped += 1;
            continue;
        }

        user.service_id = val["service"]
            .as_str()
            .and_then(|name| services.get(&name.trim().to_lowercase()).copied());

        for name in array(val, "currentCourses") {
            let course_id = name
                .as_str()
                .and_then(|n| courses.get(&n.trim().to_lowercase()).copied());
            match course_id {
                Some(id) if !user.current_courses.contains(&id) => user.current_courses.push(id),
                Some(_) => {}
                None => tracing::warn!(subject = %user.auth_subject, course = %name, "unknown course in export"),
            }
        }
        user.is_active_in_school = !user.current_courses.is_empty();

        user_repo::insert(&tx, &user)?;
        for course_id in &user.current_courses {
            progress_repo::save(&tx, &CourseProgress::empty(user.id, *course_id, now))?;
        }

        if let Some(leader) = val["leader"].as_str() {
            pending_leaders.push((user.id, leader.trim().to_string()));
        }
        by_subject.insert(user.auth_subject.clone(), user.id);
        stats.users += 1;
    }

    for (user_id, leader_subject) in pending_leaders {
        if link_leader(&tx, user_id, &leader_subject, &by_subject)? {
            stats.linked += 1;
        }
    }

    tx.commit()?;
    tracing::info!(
        services = stats.services,
        courses = stats.courses,
        users = stats.users,
        skipped = stats.skipped,
        linked = stats.linked,
        "import finished"
    );
    Ok(stats)
}

/// Joins the user to the group led by `leader_subject`, the way `join_group`
/// would. Returns false, leaving the user unattached, when that is impossible.
fn link_leader(
    conn: &Connection,
    user_id: Id<User>,
    leader_subject: &str,
    by_subject: &HashMap<String, Id<User>>,
) -> AppResult<bool> {
    let leader_id = match by_subject.get(leader_subject) {
        Some(id) => Some(*id),
        None => user_repo::find_by_subject(conn, leader_subject)?.map(|u| u.id),
    };
    let leader_id = match leader_id {
        Some(id) if id != user_id => id,
        _ => {
            tracing::warn!(%user_id, leader = %leader_subject, "leader not found in export");
            return Ok(false);
        }
    };

    let group = match group_repo::find_by_leader(conn, leader_id)?.into_iter().next() {
        Some(g) => g,
        None => {
            tracing::warn!(%user_id, leader = %leader_subject, "leader has no group, leader ignored");
            return Ok(false);
        }
    };
    let mut user = match user_repo::find_by_id(conn, user_id)? {
        Some(u) => u,
        None => return Ok(false),
    };

    let assigned = match group_ops::assign_leader(conn, &group, &user) {
        Ok(id) => id,
        Err(AppError::Integrity(_)) => return Ok(false),
        Err(e) => return Err(e),
    };
    if assigned != leader_id {
        tracing::warn!(%user_id, leader = %leader_subject, "leader does not match the group's assignment");
        return Ok(false);
    }

    group_repo::add_disciple(conn, group.id, user.id)?;
    user.leader_id = Some(assigned);
    user_repo::update(conn, &user)?;
    Ok(true)
}

fn array<'a>(json: &'a Value, key: &str) -> &'a [Value] {
    json[key].as_array().map(Vec::as_slice).unwrap_or(&[])
}

fn parse_id<T>(s: &str) -> AppResult<Id<T>> {
    Id::parse(s).map_err(|e| AppError::Other(format!("Invalid UUID '{}': {}", s, e)))
}

fn optional_id<T>(val: &Value) -> AppResult<Option<Id<T>>> {
    val["id"].as_str().map(parse_id).transpose()
}

fn parse_date(val: &Value) -> Option<NaiveDate> {
    val.as_str()
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}

fn parse_course(val: &Value, now: NaiveDateTime) -> AppResult<Course> {
    let name = validation::non_blank(val["name"].as_str().unwrap_or(""), "course name")?;

    let start = parse_date(&val["startDate"]);
    let end = parse_date(&val["endDate"]);
    validation::date_order(start, end)?;

    let duration = match val["durationWeeks"].as_i64() {
        Some(weeks) => {
            validation::in_range(weeks, "durationWeeks", 1, u32::MAX as i64)?;
            Some(weeks as u32)
        }
        None => None,
    };

    let mut course = Course::create(
        name,
        validation::trim_optional(val["description"].as_str()),
        start,
        end,
        duration,
        now,
    );
    if let Some(id) = optional_id(val)? {
        course.id = id;
    }
    Ok(course)
}

/// `None` when the entry lacks a subject, a name or a recognizable gender.
fn parse_user(val: &Value) -> AppResult<Option<User>> {
    let subject = val["authSubject"].as_str().map(str::trim).unwrap_or("");
    let name = val["name"].as_str().map(str::trim).unwrap_or("");
    let gender = val["gender"].as_str().and_then(Gender::parse_input);

    let gender = match gender {
        Some(g) if !subject.is_empty() && !name.is_empty() => g,
        _ => {
            tracing::warn!(subject, name, "incomplete user entry, skipping");
            return Ok(None);
        }
    };

    let mut user = User::create(
        subject.to_string(),
        name.to_string(),
        val["email"].as_str().unwrap_or("").trim().to_string(),
        gender,
    );
    if let Some(id) = optional_id(val)? {
        user.id = id;
    }
    user.phone = validation::trim_optional(val["phone"].as_str());
    user.birth_date = parse_date(&val["birthDate"]);
    user.role = val["role"].as_str().and_then(Role::from_db_str).unwrap_or(Role::Member);
    user.is_admin = val["isAdmin"].as_bool().unwrap_or(false);
    Ok(Some(user))
}
