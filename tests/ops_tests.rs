use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use conexion::auth::Identity;
use conexion::db::*;
use conexion::error::AppError;
use conexion::model::group::generate_invitation_code;
use conexion::model::*;
use conexion::ops::*;
use rusqlite::Connection;

fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, 0, 0).unwrap()
}

fn now() -> NaiveDateTime {
    at(2024, 3, 1, 10)
}

fn register(conn: &Connection, subject: &str, name: &str, gender: Gender) -> (Identity, User) {
    let id = Identity::new(subject);
    let user = user_ops::register_user(conn, Some(&id), name, "", gender, None).unwrap();
    (id, user)
}

fn make_admin(conn: &Connection, user: &User) {
    let mut u = user.clone();
    u.is_admin = true;
    user_repo::update(conn, &u).unwrap();
}

/// A fresh database with a male leader (L1) registered.
fn setup() -> (Connection, Identity, User) {
    let conn = schema::test_connection();
    let (id, leader) = register(&conn, "l1", "Luis", Gender::Male);
    (conn, id, leader)
}

fn create_group(conn: &Connection, leader: &Identity, co_leader: Option<Id<User>>) -> Result<Group, AppError> {
    group_ops::create_group(
        conn,
        Some(leader),
        "Conexión Norte",
        "Calle 45 #12-30",
        "Norte",
        Some(AgeRange { min_age: 18, max_age: 35 }),
        Weekday::Fri,
        NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
        co_leader,
        now(),
    )
}

fn create_course(conn: &Connection, admin: &Identity, name: &str, weeks: Option<u32>) -> Course {
    course_ops::create_course(conn, Some(admin), name, None, Some(NaiveDate::from_ymd_opt(2024, 2, 19).unwrap()), None, weeks, now()).unwrap()
}

// ==========================================================================
// USER OPS TESTS
// ==========================================================================

#[test]
fn register_trims_and_defaults_to_member() {
    let conn = schema::test_connection();
    let id = Identity::new("s-1");
    let user = user_ops::register_user(&conn, Some(&id), "  Ana  ", " ana@example.com ", Gender::Female, None).unwrap();
    assert_eq!(user.name, "Ana");
    assert_eq!(user.email, "ana@example.com");
    assert_eq!(user.role, Role::Member);
}

#[test]
fn register_twice_fails() {
    let (conn, id, _) = setup();
    let result = user_ops::register_user(&conn, Some(&id), "Luis", "", Gender::Male, None);
    assert!(matches!(result, Err(AppError::AlreadyExists { .. })));
}

#[test]
fn operations_without_identity_are_unauthenticated() {
    let (conn, _, _) = setup();
    let result = service_ops::leave_service(&conn, None);
    assert!(matches!(result, Err(AppError::Unauthenticated)));
}

#[test]
fn unknown_identity_is_not_found() {
    let (conn, _, _) = setup();
    let stranger = Identity::new("ghost");
    let result = service_ops::leave_service(&conn, Some(&stranger));
    assert!(matches!(result, Err(AppError::NotFound { .. })));
}

#[test]
fn update_profile_changes_only_given_fields() {
    let (conn, id, _) = setup();
    let birth = NaiveDate::from_ymd_opt(1990, 1, 15).unwrap();
    let user = user_ops::update_profile(&conn, Some(&id), None, Some(Some(" 555-1234 ")), Some(Some(birth)), None).unwrap();
    assert_eq!(user.name, "Luis");
    assert_eq!(user.phone.as_deref(), Some("555-1234"));
    assert_eq!(user.birth_date, Some(birth));

    let cleared = user_ops::update_profile(&conn, Some(&id), None, Some(None), None, None).unwrap();
    assert!(cleared.phone.is_none());
    assert_eq!(cleared.birth_date, Some(birth));
}

#[test]
fn co_leader_cannot_change_gender() {
    let (conn, id, _) = setup();
    let (co_id, co) = register(&conn, "l2", "Lina", Gender::Female);
    create_group(&conn, &id, Some(co.id)).unwrap();

    let result = user_ops::update_profile(&conn, Some(&co_id), Some("Lina M."), None, None, Some(Gender::Male));
    assert!(matches!(result, Err(AppError::GenderLocked(_))));

    let stored = user_repo::find_by_id(&conn, co.id).unwrap().unwrap();
    assert_eq!(stored.gender, Gender::Female);
    assert_eq!(stored.name, "Lina");
}

#[test]
fn disciple_of_a_pair_cannot_change_gender() {
    let (conn, id, _) = setup();
    let (_, co) = register(&conn, "l2", "Lina", Gender::Female);
    let group = create_group(&conn, &id, Some(co.id)).unwrap();
    let (u_id, _) = register(&conn, "u1", "Sara", Gender::Female);
    group_ops::join_group(&conn, Some(&u_id), &group.invitation_code).unwrap();

    let result = user_ops::update_profile(&conn, Some(&u_id), None, None, None, Some(Gender::Male));
    assert!(matches!(result, Err(AppError::GenderLocked(_))));
}

#[test]
fn gender_change_is_free_outside_pairs() {
    let (conn, id, _) = setup();
    let group = create_group(&conn, &id, None).unwrap();
    let (u_id, _) = register(&conn, "u1", "Sara", Gender::Female);
    group_ops::join_group(&conn, Some(&u_id), &group.invitation_code).unwrap();

    let leader = user_ops::update_profile(&conn, Some(&id), None, None, None, Some(Gender::Female)).unwrap();
    assert_eq!(leader.gender, Gender::Female);
    let disciple = user_ops::update_profile(&conn, Some(&u_id), None, None, None, Some(Gender::Male)).unwrap();
    assert_eq!(disciple.gender, Gender::Male);

    // Re-stating the current gender is not a change.
    let (co_id, co) = register(&conn, "l2", "Lina", Gender::Male);
    let (_, other) = register(&conn, "l3", "Marta", Gender::Female);
    create_group(&conn, &co_id, Some(other.id)).unwrap();
    assert!(user_ops::update_profile(&conn, Some(&co_id), None, None, None, Some(co.gender)).is_ok());
}

#[test]
fn only_admins_change_roles() {
    let (conn, id, leader) = setup();
    let (_, other) = register(&conn, "u2", "Eva", Gender::Female);

    let denied = user_ops::set_role(&conn, Some(&id), other.id, Role::Pastor);
    assert!(matches!(denied, Err(AppError::Forbidden(_))));

    make_admin(&conn, &leader);
    let updated = user_ops::set_role(&conn, Some(&id), other.id, Role::Pastor).unwrap();
    assert_eq!(updated.role, Role::Pastor);
}

#[test]
fn admin_cannot_revoke_own_rights() {
    let (conn, id, leader) = setup();
    make_admin(&conn, &leader);
    assert!(user_ops::set_admin(&conn, Some(&id), leader.id, false).is_err());
    assert!(user_repo::find_by_id(&conn, leader.id).unwrap().unwrap().is_admin);
}

// ==========================================================================
// GROUP OPS TESTS
// ==========================================================================

#[test]
fn create_group_with_single_leader() {
    let (conn, id, leader) = setup();
    let group = create_group(&conn, &id, None).unwrap();
    assert_eq!(group.leaders, vec![leader.id]);
    assert!(group.disciples.is_empty());
    assert_eq!(group.invitation_code.len(), 6);

    let stored = group_repo::find_by_id(&conn, group.id).unwrap().unwrap();
    assert_eq!(stored.invitation_code, group.invitation_code);
}

#[test]
fn co_leader_must_differ_in_gender() {
    let (conn, id, _) = setup();
    let (_, same) = register(&conn, "l2", "Mario", Gender::Male);
    let (_, other) = register(&conn, "l3", "Marta", Gender::Female);

    assert!(matches!(create_group(&conn, &id, Some(same.id)), Err(AppError::SameGenderCoLeader)));
    let group = create_group(&conn, &id, Some(other.id)).unwrap();
    assert_eq!(group.leaders.len(), 2);

    // Every stored group has 1-2 leaders, never two of the same gender.
    let stored = group_repo::find_by_id(&conn, group.id).unwrap().unwrap();
    let leaders = user_repo::find_many(&conn, &stored.leaders).unwrap();
    assert_ne!(leaders[0].gender, leaders[1].gender);
}

#[test]
fn self_co_leader_is_rejected() {
    let (conn, id, leader) = setup();
    assert!(matches!(create_group(&conn, &id, Some(leader.id)), Err(AppError::SelfCoLeader)));
}

#[test]
fn inverted_age_range_creates_nothing() {
    let (conn, id, _) = setup();
    let result = group_ops::create_group(
        &conn,
        Some(&id),
        "Grupo",
        "Calle 1",
        "Sur",
        Some(AgeRange { min_age: 30, max_age: 18 }),
        Weekday::Sat,
        NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        None,
        now(),
    );
    assert!(matches!(result, Err(AppError::InvalidAgeRange)));
    assert_eq!(group_repo::count(&conn).unwrap(), 0);
}

#[test]
fn blank_group_fields_are_rejected() {
    let (conn, id, _) = setup();
    let result = group_ops::create_group(
        &conn,
        Some(&id),
        "   ",
        "Calle 1",
        "Sur",
        None,
        Weekday::Sat,
        NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        None,
        now(),
    );
    assert!(matches!(result, Err(AppError::BlankField { .. })));
}

#[test]
fn join_assigns_the_only_leader() {
    let (conn, id, leader) = setup();
    let group = create_group(&conn, &id, None).unwrap();
    let (u_id, u) = register(&conn, "u1", "Sofía", Gender::Female);

    let joined = group_ops::join_group(&conn, Some(&u_id), &group.invitation_code.to_lowercase()).unwrap();
    assert!(joined.disciples.contains(&u.id));

    let u = user_repo::find_by_id(&conn, u.id).unwrap().unwrap();
    assert_eq!(u.leader_id, Some(leader.id));
    let stored = group_repo::find_by_id(&conn, group.id).unwrap().unwrap();
    assert_eq!(stored.disciples, vec![u.id]);
}

#[test]
fn join_matches_leader_by_gender() {
    let (conn, id, leader) = setup();
    let (_, co) = register(&conn, "l2", "Lina", Gender::Female);
    let group = create_group(&conn, &id, Some(co.id)).unwrap();

    let (w_id, w) = register(&conn, "u1", "Sara", Gender::Female);
    let (m_id, m) = register(&conn, "u2", "Tomás", Gender::Male);
    group_ops::join_group(&conn, Some(&w_id), &group.invitation_code).unwrap();
    group_ops::join_group(&conn, Some(&m_id), &group.invitation_code).unwrap();

    assert_eq!(user_repo::find_by_id(&conn, w.id).unwrap().unwrap().leader_id, Some(co.id));
    assert_eq!(user_repo::find_by_id(&conn, m.id).unwrap().unwrap().leader_id, Some(leader.id));
}

#[test]
fn a_user_joins_at_most_one_group() {
    let (conn, id, _) = setup();
    let first = create_group(&conn, &id, None).unwrap();
    let (other_leader, _) = register(&conn, "l2", "Pablo", Gender::Male);
    let second = create_group(&conn, &other_leader, None).unwrap();

    let (u_id, u) = register(&conn, "u1", "Iván", Gender::Male);
    group_ops::join_group(&conn, Some(&u_id), &first.invitation_code).unwrap();

    let again = group_ops::join_group(&conn, Some(&u_id), &first.invitation_code);
    assert!(matches!(again, Err(AppError::AlreadyInGroup)));
    let elsewhere = group_ops::join_group(&conn, Some(&u_id), &second.invitation_code);
    assert!(matches!(elsewhere, Err(AppError::AlreadyInGroup)));

    let stored = group_repo::find_by_id(&conn, first.id).unwrap().unwrap();
    assert_eq!(stored.disciples.iter().filter(|d| **d == u.id).count(), 1);
}

/// Stores a group directly, bypassing the co-leader rules.
fn seed_group(conn: &Connection, leaders: Vec<Id<User>>) -> Group {
    let group = Group::create(
        "Grupo sembrado".into(),
        "Calle 9 #9-9".into(),
        "Sur".into(),
        None,
        Weekday::Sun,
        NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
        leaders,
        generate_invitation_code(),
        now(),
    );
    group_repo::insert(conn, &group).unwrap();
    group
}

fn assert_join_fails_cleanly(conn: &Connection, group: &Group, joiner: &Identity, user: &User) {
    let result = group_ops::join_group(conn, Some(joiner), &group.invitation_code);
    assert!(matches!(result, Err(AppError::Integrity(_))));
    assert!(user_repo::find_by_id(conn, user.id).unwrap().unwrap().leader_id.is_none());
    assert!(group_repo::find_by_id(conn, group.id).unwrap().unwrap().disciples.is_empty());
}

#[test]
fn same_gender_pair_cannot_take_disciples_of_the_other_gender() {
    let (conn, _, leader) = setup();
    let (_, twin) = register(&conn, "l2", "Mario", Gender::Male);
    let group = seed_group(&conn, vec![leader.id, twin.id]);
    let (u_id, u) = register(&conn, "u1", "Sara", Gender::Female);

    assert_join_fails_cleanly(&conn, &group, &u_id, &u);
}

#[test]
fn unexpected_leader_count_blocks_joining() {
    let (conn, _, leader) = setup();
    let (_, second) = register(&conn, "l2", "Lina", Gender::Female);
    let (_, third) = register(&conn, "l3", "Mario", Gender::Male);
    let crowded = seed_group(&conn, vec![leader.id, second.id, third.id]);
    let empty = seed_group(&conn, vec![]);
    let (u_id, u) = register(&conn, "u1", "Sara", Gender::Female);

    assert_join_fails_cleanly(&conn, &crowded, &u_id, &u);
    assert_join_fails_cleanly(&conn, &empty, &u_id, &u);
}

#[test]
fn leader_cannot_join_own_group() {
    let (conn, id, _) = setup();
    let group = create_group(&conn, &id, None).unwrap();
    let result = group_ops::join_group(&conn, Some(&id), &group.invitation_code);
    assert!(matches!(result, Err(AppError::AlreadyMember)));
}

#[test]
fn unknown_code_is_not_found() {
    let (conn, id, _) = setup();
    let result = group_ops::join_group(&conn, Some(&id), "ZZZZZZ");
    assert!(matches!(result, Err(AppError::NotFound { .. })));
}

#[test]
fn only_leaders_update_groups() {
    let (conn, id, _) = setup();
    let group = create_group(&conn, &id, None).unwrap();
    let (u_id, _) = register(&conn, "u1", "Sofía", Gender::Female);
    group_ops::join_group(&conn, Some(&u_id), &group.invitation_code).unwrap();

    let denied = group_ops::update_group(&conn, Some(&u_id), group.id, Some("Otro"), None);
    assert!(matches!(denied, Err(AppError::Forbidden(_))));

    let updated = group_ops::update_group(&conn, Some(&id), group.id, Some(" Conexión Sur "), None).unwrap();
    assert_eq!(updated.name, "Conexión Sur");
    assert_eq!(updated.address, group.address);
}

// ==========================================================================
// ACTIVITY OPS TESTS
// ==========================================================================

fn create_activity(conn: &Connection, leader: &Identity, group: &Group) -> Activity {
    activity_ops::create_activity(
        conn,
        Some(leader),
        group.id,
        "Vigilia",
        "Templo principal",
        at(2024, 3, 15, 20),
        "Noche de oración y alabanza",
        now(),
    )
    .unwrap()
}

#[test]
fn activity_must_be_in_the_future() {
    let (conn, id, _) = setup();
    let group = create_group(&conn, &id, None).unwrap();
    let result = activity_ops::create_activity(&conn, Some(&id), group.id, "Vigilia", "Templo principal", now(), "Noche de oración", now());
    assert!(matches!(result, Err(AppError::NotInFuture { .. })));
}

#[test]
fn activity_fields_have_minimum_lengths() {
    let (conn, id, _) = setup();
    let group = create_group(&conn, &id, None).unwrap();
    let short_name = activity_ops::create_activity(&conn, Some(&id), group.id, "V", "Templo principal", at(2024, 4, 1, 9), "Noche de oración", now());
    assert!(matches!(short_name, Err(AppError::TooShort { .. })));
    let short_desc = activity_ops::create_activity(&conn, Some(&id), group.id, "Vigilia", "Templo principal", at(2024, 4, 1, 9), "Oración", now());
    assert!(matches!(short_desc, Err(AppError::TooShort { .. })));
}

#[test]
fn disciples_cannot_create_activities() {
    let (conn, id, _) = setup();
    let group = create_group(&conn, &id, None).unwrap();
    let (u_id, _) = register(&conn, "u1", "Sofía", Gender::Female);
    group_ops::join_group(&conn, Some(&u_id), &group.invitation_code).unwrap();

    let result = activity_ops::create_activity(&conn, Some(&u_id), group.id, "Vigilia", "Templo principal", at(2024, 4, 1, 9), "Noche de oración", now());
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[test]
fn responding_twice_keeps_one_response() {
    let (conn, id, _) = setup();
    let group = create_group(&conn, &id, None).unwrap();
    let (u_id, _) = register(&conn, "u1", "Sofía", Gender::Female);
    group_ops::join_group(&conn, Some(&u_id), &group.invitation_code).unwrap();
    let activity = create_activity(&conn, &id, &group);

    let first = activity_ops::respond_to_activity(&conn, Some(&u_id), activity.id, ResponseStatus::Confirmed, now()).unwrap();
    let second = activity_ops::respond_to_activity(&conn, Some(&u_id), activity.id, ResponseStatus::Denied, at(2024, 3, 2, 9)).unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.status, ResponseStatus::Denied);
    assert_eq!(response_repo::find_by_activity(&conn, activity.id).unwrap().len(), 1);
}

#[test]
fn outsiders_cannot_respond() {
    let (conn, id, _) = setup();
    let group = create_group(&conn, &id, None).unwrap();
    let activity = create_activity(&conn, &id, &group);
    let (o_id, _) = register(&conn, "o1", "Otto", Gender::Male);

    let result = activity_ops::respond_to_activity(&conn, Some(&o_id), activity.id, ResponseStatus::Confirmed, now());
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[test]
fn update_activity_revalidates_date() {
    let (conn, id, _) = setup();
    let group = create_group(&conn, &id, None).unwrap();
    let activity = create_activity(&conn, &id, &group);

    let past = activity_ops::update_activity(&conn, Some(&id), activity.id, None, None, Some(at(2024, 2, 1, 9)), None, now());
    assert!(matches!(past, Err(AppError::NotInFuture { .. })));

    let moved = activity_ops::update_activity(&conn, Some(&id), activity.id, Some("Vigilia especial"), None, Some(at(2024, 3, 22, 20)), None, now()).unwrap();
    assert_eq!(moved.name, "Vigilia especial");
    assert_eq!(activity_repo::find_by_id(&conn, activity.id).unwrap().unwrap().date_time, at(2024, 3, 22, 20));
}

#[test]
fn deleting_activity_removes_its_responses() {
    let (conn, id, _) = setup();
    let group = create_group(&conn, &id, None).unwrap();
    let (u_id, _) = register(&conn, "u1", "Sofía", Gender::Female);
    group_ops::join_group(&conn, Some(&u_id), &group.invitation_code).unwrap();
    let activity = create_activity(&conn, &id, &group);
    activity_ops::respond_to_activity(&conn, Some(&u_id), activity.id, ResponseStatus::Confirmed, now()).unwrap();
    activity_ops::respond_to_activity(&conn, Some(&id), activity.id, ResponseStatus::Confirmed, now()).unwrap();

    let denied = activity_ops::delete_activity(&conn, Some(&u_id), activity.id);
    assert!(matches!(denied, Err(AppError::Forbidden(_))));

    activity_ops::delete_activity(&conn, Some(&id), activity.id).unwrap();
    assert!(activity_repo::find_by_id(&conn, activity.id).unwrap().is_none());
    assert!(response_repo::find_by_activity(&conn, activity.id).unwrap().is_empty());
}

// ==========================================================================
// COURSE OPS TESTS
// ==========================================================================

#[test]
fn only_admins_create_courses() {
    let (conn, id, leader) = setup();
    let denied = course_ops::create_course(&conn, Some(&id), "Fundamentos", None, None, None, None, now());
    assert!(matches!(denied, Err(AppError::Forbidden(_))));

    make_admin(&conn, &leader);
    let course = course_ops::create_course(&conn, Some(&id), "Fundamentos", Some("  "), None, None, None, now()).unwrap();
    assert_eq!(course.duration_weeks, 9);
    assert!(course.description.is_none());
}

#[test]
fn course_dates_must_be_ordered() {
    let (conn, id, leader) = setup();
    make_admin(&conn, &leader);
    let d = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    let result = course_ops::create_course(&conn, Some(&id), "Fundamentos", None, Some(d), Some(d), None, now());
    assert!(matches!(result, Err(AppError::InvalidDateRange)));
}

#[test]
fn enroll_then_unenroll_restores_state() {
    let (conn, admin_id, admin) = setup();
    make_admin(&conn, &admin);
    let a = create_course(&conn, &admin_id, "Fundamentos", None);
    let b = create_course(&conn, &admin_id, "Vida", None);
    let (u_id, u) = register(&conn, "u1", "Sofía", Gender::Female);

    let before = user_repo::find_by_id(&conn, u.id).unwrap().unwrap();
    let enrolled = course_ops::enroll_in_courses(&conn, Some(&u_id), &[a.id, b.id, a.id], now()).unwrap();
    assert_eq!(enrolled.current_courses, vec![a.id, b.id]);
    assert!(enrolled.is_active_in_school);
    assert!(progress_repo::find(&conn, u.id, a.id).unwrap().is_some());
    assert!(progress_repo::find(&conn, u.id, b.id).unwrap().is_some());

    let after = course_ops::unenroll_from_courses(&conn, Some(&u_id), &[a.id, b.id]).unwrap();
    assert_eq!(after.current_courses, before.current_courses);
    assert_eq!(after.is_active_in_school, before.is_active_in_school);
    assert!(progress_repo::find(&conn, u.id, a.id).unwrap().is_none());
    assert!(progress_repo::find(&conn, u.id, b.id).unwrap().is_none());
}

#[test]
fn enroll_rejects_unknown_courses_without_writing() {
    let (conn, id, leader) = setup();
    make_admin(&conn, &leader);
    let a = create_course(&conn, &id, "Fundamentos", None);

    let result = course_ops::enroll_in_courses(&conn, Some(&id), &[a.id, Id::generate()], now());
    assert!(matches!(result, Err(AppError::NotFound { .. })));
    assert!(user_repo::find_by_id(&conn, leader.id).unwrap().unwrap().current_courses.is_empty());

    let empty = course_ops::enroll_in_courses(&conn, Some(&id), &[], now());
    assert!(matches!(empty, Err(AppError::EmptySet { .. })));
}

#[test]
fn partial_unenroll_keeps_school_flag() {
    let (conn, id, leader) = setup();
    make_admin(&conn, &leader);
    let a = create_course(&conn, &id, "Fundamentos", None);
    let b = create_course(&conn, &id, "Vida", None);
    course_ops::enroll_in_courses(&conn, Some(&id), &[a.id, b.id], now()).unwrap();

    let user = course_ops::unenroll_from_courses(&conn, Some(&id), &[a.id]).unwrap();
    assert_eq!(user.current_courses, vec![b.id]);
    assert!(user.is_active_in_school);
}

#[test]
fn toggle_week_on_off_on() {
    let (conn, id, leader) = setup();
    make_admin(&conn, &leader);
    let course = create_course(&conn, &id, "Fundamentos", Some(9));
    course_ops::enroll_in_courses(&conn, Some(&id), &[course.id], now()).unwrap();

    let p = course_ops::toggle_week_completion(&conn, Some(&id), course.id, 3, now()).unwrap();
    assert_eq!(p.completed_weeks, vec![3]);
    let p = course_ops::toggle_week_completion(&conn, Some(&id), course.id, 3, now()).unwrap();
    assert!(p.completed_weeks.is_empty());
    let p = course_ops::toggle_week_completion(&conn, Some(&id), course.id, 3, now()).unwrap();
    assert_eq!(p.completed_weeks, vec![3]);

    course_ops::toggle_week_completion(&conn, Some(&id), course.id, 1, now()).unwrap();
    let stored = progress_repo::find(&conn, leader.id, course.id).unwrap().unwrap();
    assert_eq!(stored.completed_weeks, vec![1, 3]);
}

#[test]
fn toggle_week_outside_course_fails() {
    let (conn, id, leader) = setup();
    make_admin(&conn, &leader);
    let course = create_course(&conn, &id, "Fundamentos", Some(9));
    course_ops::enroll_in_courses(&conn, Some(&id), &[course.id], now()).unwrap();

    for week in [0, 10] {
        let result = course_ops::toggle_week_completion(&conn, Some(&id), course.id, week, now());
        assert!(matches!(result, Err(AppError::OutOfRange { .. })));
    }
}

#[test]
fn toggle_week_requires_enrollment() {
    let (conn, id, leader) = setup();
    make_admin(&conn, &leader);
    let course = create_course(&conn, &id, "Fundamentos", None);
    let result = course_ops::toggle_week_completion(&conn, Some(&id), course.id, 1, now());
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[test]
fn toggle_work_and_exam_flips() {
    let (conn, id, leader) = setup();
    make_admin(&conn, &leader);
    let course = create_course(&conn, &id, "Fundamentos", None);
    course_ops::enroll_in_courses(&conn, Some(&id), &[course.id], now()).unwrap();

    assert!(course_ops::toggle_work_and_exam(&conn, Some(&id), course.id, now()).unwrap().completed_work_and_exam);
    assert!(!course_ops::toggle_work_and_exam(&conn, Some(&id), course.id, now()).unwrap().completed_work_and_exam);
}

#[test]
fn shrinking_a_course_drops_late_weeks() {
    let (conn, id, leader) = setup();
    make_admin(&conn, &leader);
    let course = create_course(&conn, &id, "Fundamentos", Some(9));
    course_ops::enroll_in_courses(&conn, Some(&id), &[course.id], now()).unwrap();
    for w in [2, 7, 9] {
        course_ops::toggle_week_completion(&conn, Some(&id), course.id, w, now()).unwrap();
    }

    let updated = course_ops::update_course(&conn, Some(&id), course.id, None, None, None, None, Some(6)).unwrap();
    assert_eq!(updated.duration_weeks, 6);
    let stored = progress_repo::find(&conn, leader.id, course.id).unwrap().unwrap();
    assert_eq!(stored.completed_weeks, vec![2]);
}

#[test]
fn deleting_course_unenrolls_students() {
    let (conn, id, leader) = setup();
    make_admin(&conn, &leader);
    let course = create_course(&conn, &id, "Fundamentos", None);
    let (u_id, u) = register(&conn, "u1", "Sofía", Gender::Female);
    course_ops::enroll_in_courses(&conn, Some(&u_id), &[course.id], now()).unwrap();

    course_ops::delete_course(&conn, Some(&id), course.id).unwrap();

    assert!(course_repo::find_by_id(&conn, course.id).unwrap().is_none());
    let u = user_repo::find_by_id(&conn, u.id).unwrap().unwrap();
    assert!(u.current_courses.is_empty());
    assert!(!u.is_active_in_school);
    assert!(progress_repo::find(&conn, u.id, course.id).unwrap().is_none());
}

// ==========================================================================
// SERVICE OPS TESTS
// ==========================================================================

#[test]
fn service_names_are_unique() {
    let (conn, id, leader) = setup();
    make_admin(&conn, &leader);
    service_ops::create_service(&conn, Some(&id), "Alabanza").unwrap();
    let dup = service_ops::create_service(&conn, Some(&id), " ALABANZA ");
    assert!(matches!(dup, Err(AppError::AlreadyExists { .. })));
}

#[test]
fn rename_cannot_take_another_services_name() {
    let (conn, id, leader) = setup();
    make_admin(&conn, &leader);
    service_ops::create_service(&conn, Some(&id), "Alabanza").unwrap();
    let ushers = service_ops::create_service(&conn, Some(&id), "Ujieres").unwrap();

    let dup = service_ops::rename_service(&conn, Some(&id), ushers.id, "alabanza");
    assert!(matches!(dup, Err(AppError::AlreadyExists { .. })));
    assert_eq!(service_repo::find_by_id(&conn, ushers.id).unwrap().unwrap().name, "Ujieres");

    let recased = service_ops::rename_service(&conn, Some(&id), ushers.id, "UJIERES").unwrap();
    assert_eq!(recased.name, "UJIERES");
}

#[test]
fn assigning_a_service_replaces_the_previous_one() {
    let (conn, id, leader) = setup();
    make_admin(&conn, &leader);
    let a = service_ops::create_service(&conn, Some(&id), "Alabanza").unwrap();
    let b = service_ops::create_service(&conn, Some(&id), "Ujieres").unwrap();

    service_ops::assign_service(&conn, Some(&id), a.id).unwrap();
    let user = service_ops::assign_service(&conn, Some(&id), b.id).unwrap();
    assert_eq!(user.service_id, Some(b.id));

    let user = service_ops::leave_service(&conn, Some(&id)).unwrap();
    assert!(user.service_id.is_none());
}

#[test]
fn deleting_a_service_clears_members() {
    let (conn, id, leader) = setup();
    make_admin(&conn, &leader);
    let service = service_ops::create_service(&conn, Some(&id), "Alabanza").unwrap();
    let (u_id, u) = register(&conn, "u1", "Sofía", Gender::Female);
    service_ops::assign_service(&conn, Some(&u_id), service.id).unwrap();

    service_ops::delete_service(&conn, Some(&id), service.id).unwrap();
    assert!(service_repo::find_by_id(&conn, service.id).unwrap().is_none());
    assert!(user_repo::find_by_id(&conn, u.id).unwrap().unwrap().service_id.is_none());
}

// ==========================================================================
// ATTENDANCE OPS TESTS
// ==========================================================================

#[test]
fn new_visitors_only_on_sunday() {
    let (conn, id, _) = setup();
    let monday = at(2024, 3, 4, 11);
    let result = attendance_ops::record_attendance(&conn, Some(&id), monday, AttendanceType::NuevosAsistentes, Some(true), 2, now());
    assert!(matches!(result, Err(AppError::NotSunday(_))));
    assert!(attendance_repo::find_in_range(&conn, monday.date(), at(2024, 3, 5, 0).date()).unwrap().is_empty());

    let sunday = at(2024, 3, 3, 11);
    let record = attendance_ops::record_attendance(&conn, Some(&id), sunday, AttendanceType::NuevosAsistentes, Some(true), 2, now()).unwrap();
    assert_eq!(record.date, sunday.date());
    assert_eq!(record.total(), 3);
}

#[test]
fn other_types_accept_any_day_and_drop_attended() {
    let (conn, id, _) = setup();
    let record = attendance_ops::record_attendance(&conn, Some(&id), at(2024, 3, 6, 19), AttendanceType::Reset, Some(true), 4, now()).unwrap();
    assert_eq!(record.attended, None);
    assert_eq!(record.total(), 4);
}

#[test]
fn new_visitors_require_attended_and_non_negative_count() {
    let (conn, id, _) = setup();
    let sunday = at(2024, 3, 3, 11);
    let missing = attendance_ops::record_attendance(&conn, Some(&id), sunday, AttendanceType::NuevosAsistentes, None, 2, now());
    assert!(matches!(missing, Err(AppError::MissingField { .. })));
    let negative = attendance_ops::record_attendance(&conn, Some(&id), sunday, AttendanceType::Conferencia, None, -1, now());
    assert!(matches!(negative, Err(AppError::Negative { .. })));
}

#[test]
fn only_owner_edits_records() {
    let (conn, id, _) = setup();
    let (o_id, _) = register(&conn, "o1", "Otto", Gender::Male);
    let record = attendance_ops::record_attendance(&conn, Some(&id), at(2024, 3, 6, 19), AttendanceType::Reset, None, 4, now()).unwrap();

    let denied = attendance_ops::update_attendance(&conn, Some(&o_id), record.id, at(2024, 3, 6, 19), AttendanceType::Reset, None, 5);
    assert!(matches!(denied, Err(AppError::Forbidden(_))));
    assert!(matches!(attendance_ops::delete_attendance(&conn, Some(&o_id), record.id), Err(AppError::Forbidden(_))));

    let bad_day = attendance_ops::update_attendance(&conn, Some(&id), record.id, at(2024, 3, 6, 19), AttendanceType::NuevosAsistentes, Some(false), 5);
    assert!(matches!(bad_day, Err(AppError::NotSunday(_))));

    let updated = attendance_ops::update_attendance(&conn, Some(&id), record.id, at(2024, 3, 10, 9), AttendanceType::NuevosAsistentes, Some(false), 5).unwrap();
    assert_eq!(updated.total(), 5);

    attendance_ops::delete_attendance(&conn, Some(&id), record.id).unwrap();
    assert!(attendance_repo::find_by_id(&conn, record.id).unwrap().is_none());
}
