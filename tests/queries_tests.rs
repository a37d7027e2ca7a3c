use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use conexion::auth::Identity;
use conexion::db::*;
use conexion::error::AppError;
use conexion::model::*;
use conexion::ops::*;
use conexion::queries::*;
use rusqlite::Connection;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(h, 0, 0).unwrap()
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
    let mut u = user_repo::find_by_id(conn, user.id).unwrap().unwrap();
    u.is_admin = true;
    user_repo::update(conn, &u).unwrap();
}

/// Leader L1 (male) with a group and one female disciple.
fn setup() -> (Connection, Identity, Identity, Group) {
    let conn = schema::test_connection();
    let (leader, _) = register(&conn, "l1", "Luis", Gender::Male);
    let group = group_ops::create_group(
        &conn,
        Some(&leader),
        "Conexión Norte",
        "Calle 45 #12-30",
        "Norte",
        None,
        Weekday::Fri,
        NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
        None,
        now(),
    )
    .unwrap();
    let (disciple, _) = register(&conn, "u1", "Sofía", Gender::Female);
    let group = group_ops::join_group(&conn, Some(&disciple), &group.invitation_code).unwrap();
    (conn, leader, disciple, group)
}

// ==========================================================================
// USER & GROUP QUERY TESTS
// ==========================================================================

#[test]
fn profiles_are_visible_along_the_leader_line() {
    let (conn, leader, disciple, _) = setup();
    let (stranger, stranger_user) = register(&conn, "o1", "Otto", Gender::Male);
    let disciple_user = user_queries::me(&conn, Some(&disciple)).unwrap();
    let leader_user = user_queries::me(&conn, Some(&leader)).unwrap();

    assert_eq!(user_queries::get_user(&conn, Some(&leader), disciple_user.id).unwrap().name, "Sofía");
    assert_eq!(user_queries::get_user(&conn, Some(&disciple), leader_user.id).unwrap().name, "Luis");
    assert_eq!(user_queries::get_user(&conn, Some(&stranger), stranger_user.id).unwrap().name, "Otto");

    let denied = user_queries::get_user(&conn, Some(&stranger), disciple_user.id);
    assert!(matches!(denied, Err(AppError::Forbidden(_))));

    make_admin(&conn, &stranger_user);
    assert!(user_queries::get_user(&conn, Some(&stranger), disciple_user.id).is_ok());
}

#[test]
fn disciples_list_and_staff_only_directory() {
    let (conn, leader, disciple, _) = setup();
    let disciples = user_queries::my_disciples(&conn, Some(&leader)).unwrap();
    assert_eq!(disciples.len(), 1);
    assert_eq!(disciples[0].name, "Sofía");

    let denied = user_queries::list_users(&conn, Some(&disciple));
    assert!(matches!(denied, Err(AppError::Forbidden(_))));
}

#[test]
fn group_details_expand_members() {
    let (conn, leader, disciple, group) = setup();

    let details = group_queries::get_group_by_id(&conn, Some(&disciple), group.id).unwrap();
    assert_eq!(details.leaders[0].name, "Luis");
    assert_eq!(details.disciples[0].name, "Sofía");

    let mine = group_queries::get_group_as_disciple(&conn, Some(&disciple)).unwrap().unwrap();
    assert_eq!(mine.group.id, group.id);
    assert!(group_queries::get_group_as_disciple(&conn, Some(&leader)).unwrap().is_none());
    assert_eq!(group_queries::get_groups_as_leader(&conn, Some(&leader)).unwrap().len(), 1);
}

#[test]
fn outsiders_only_see_groups_through_the_code() {
    let (conn, _, _, group) = setup();
    let (stranger, _) = register(&conn, "o1", "Otto", Gender::Male);

    let denied = group_queries::get_group_by_id(&conn, Some(&stranger), group.id);
    assert!(matches!(denied, Err(AppError::Forbidden(_))));

    let preview = group_queries::get_group_by_code(&conn, Some(&stranger), &group.invitation_code.to_lowercase()).unwrap();
    assert_eq!(preview.group.id, group.id);
}

// ==========================================================================
// ACTIVITY QUERY TESTS
// ==========================================================================

#[test]
fn silent_members_show_as_pending() {
    let (conn, leader, disciple, group) = setup();
    let (second, _) = register(&conn, "u2", "Tomás", Gender::Male);
    group_ops::join_group(&conn, Some(&second), &group.invitation_code).unwrap();

    let activity = activity_ops::create_activity(
        &conn,
        Some(&leader),
        group.id,
        "Vigilia",
        "Templo principal",
        at(2024, 3, 15, 20),
        "Noche de oración y alabanza",
        now(),
    )
    .unwrap();
    activity_ops::respond_to_activity(&conn, Some(&disciple), activity.id, ResponseStatus::Confirmed, now()).unwrap();

    let details = activity_queries::get_activity_with_responses(&conn, Some(&second), activity.id).unwrap();
    assert_eq!(details.group_name, "Conexión Norte");
    assert_eq!(details.confirmed.len(), 1);
    assert_eq!(details.confirmed[0].user.name, "Sofía");
    assert!(details.confirmed[0].response_id.is_some());
    assert!(details.denied.is_empty());

    let mut pending: Vec<&str> = details.pending.iter().map(|e| e.user.name.as_str()).collect();
    pending.sort();
    assert_eq!(pending, vec!["Luis", "Tomás"]);
    assert!(details.pending.iter().all(|e| e.response_id.is_none() && e.responded_at.is_none()));
}

#[test]
fn upcoming_activities_skip_the_past() {
    let (conn, leader, disciple, group) = setup();
    for (name, when) in [("Picnic", at(2024, 3, 20, 10)), ("Vigilia", at(2024, 3, 10, 20))] {
        activity_ops::create_activity(&conn, Some(&leader), group.id, name, "Parque central", when, "Encuentro del grupo", now()).unwrap();
    }

    let later = at(2024, 3, 12, 0);
    let upcoming = activity_queries::my_upcoming_activities(&conn, Some(&disciple), later).unwrap();
    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0].activity.name, "Picnic");
    assert!(upcoming[0].my_status.is_none());

    let all = activity_queries::my_upcoming_activities(&conn, Some(&disciple), now()).unwrap();
    let names: Vec<&str> = all.iter().map(|u| u.activity.name.as_str()).collect();
    assert_eq!(names, vec!["Vigilia", "Picnic"]);
}

// ==========================================================================
// COURSE QUERY TESTS
// ==========================================================================

#[test]
fn my_courses_reports_week_statuses() {
    let (conn, leader, disciple, _) = setup();
    let leader_user = user_queries::me(&conn, Some(&leader)).unwrap();
    make_admin(&conn, &leader_user);
    let course = course_ops::create_course(&conn, Some(&leader), "Fundamentos", None, Some(date(2024, 3, 4)), None, Some(9), now()).unwrap();

    course_ops::enroll_in_courses(&conn, Some(&disciple), &[course.id], now()).unwrap();
    course_ops::toggle_week_completion(&conn, Some(&disciple), course.id, 1, now()).unwrap();

    let today = date(2024, 3, 14);
    let overviews = course_queries::my_courses(&conn, Some(&disciple), today).unwrap();
    assert_eq!(overviews.len(), 1);
    let overview = &overviews[0];
    assert_eq!(overview.current_week, 2);
    assert_eq!(overview.weeks[0].status, WeekStatus::AlDia);
    assert_eq!(overview.weeks[1].status, WeekStatus::Atrasado);
    assert_eq!(overview.weeks[2].status, WeekStatus::Pendiente);
    assert_eq!(overview.weeks_behind(), 1);

    let students = course_queries::course_students(&conn, Some(&leader), course.id, today).unwrap();
    assert_eq!(students.len(), 1);
    assert_eq!(students[0].completed_weeks, 1);
    assert_eq!(students[0].weeks_behind, 1);

    let denied = course_queries::course_students(&conn, Some(&disciple), course.id, today);
    assert!(matches!(denied, Err(AppError::Forbidden(_))));
}

// ==========================================================================
// ATTENDANCE QUERY TESTS
// ==========================================================================

#[test]
fn monthly_report_sums_own_records() {
    let (conn, _, disciple, _) = setup();
    attendance_ops::record_attendance(&conn, Some(&disciple), at(2024, 3, 3, 11), AttendanceType::NuevosAsistentes, Some(true), 2, now()).unwrap();
    attendance_ops::record_attendance(&conn, Some(&disciple), at(2024, 3, 6, 19), AttendanceType::Reset, None, 4, now()).unwrap();
    attendance_ops::record_attendance(&conn, Some(&disciple), at(2024, 4, 7, 11), AttendanceType::Conferencia, None, 9, now()).unwrap();

    let march = Period::Month { year: 2024, month: 3 };
    let report = attendance_queries::my_monthly_report(&conn, Some(&disciple), march).unwrap();
    assert_eq!(report.summaries.len(), 3);
    assert_eq!(report.grand_total.total, 7);
    assert_eq!(report.grand_total.female, 7);
    assert_eq!(attendance_queries::my_records(&conn, Some(&disciple), march).unwrap().len(), 2);

    let year = attendance_queries::my_monthly_report(&conn, Some(&disciple), Period::Year(2024)).unwrap();
    assert_eq!(year.grand_total.total, 16);
}

#[test]
fn group_report_keeps_leader_numbers_apart() {
    let (conn, leader, disciple, _) = setup();
    attendance_ops::record_attendance(&conn, Some(&leader), at(2024, 3, 6, 19), AttendanceType::Reset, None, 5, now()).unwrap();
    attendance_ops::record_attendance(&conn, Some(&disciple), at(2024, 3, 3, 11), AttendanceType::NuevosAsistentes, Some(true), 2, now()).unwrap();

    let report = attendance_queries::group_attendance_report(&conn, Some(&leader), Period::Month { year: 2024, month: 3 }).unwrap();
    assert_eq!(report.my_total, 5);
    assert_eq!(report.disciples_total, 3);
    assert_eq!(report.group_total.total, 3);
    assert_eq!(report.group_total.female, 3);
    assert_eq!(report.group_total.male, 0);
    assert_eq!(report.per_disciple.len(), 1);
    assert_eq!(report.per_disciple[0].total, 3);
}

#[test]
fn group_report_requires_leading() {
    let (conn, _, disciple, _) = setup();
    let denied = attendance_queries::group_attendance_report(&conn, Some(&disciple), Period::Month { year: 2024, month: 3 });
    assert!(matches!(denied, Err(AppError::Forbidden(_))));
}

// ==========================================================================
// STATS QUERY TESTS
// ==========================================================================

/// Setup plus admin rights for the leader.
fn staff_setup() -> (Connection, Identity, Identity, Group) {
    let (conn, leader, disciple, group) = setup();
    let leader_user = user_queries::me(&conn, Some(&leader)).unwrap();
    make_admin(&conn, &leader_user);
    (conn, leader, disciple, group)
}

#[test]
fn stats_are_staff_only() {
    let (conn, _, disciple, _) = setup();
    assert!(matches!(stats_queries::overview(&conn, Some(&disciple), now()), Err(AppError::Forbidden(_))));
    assert!(matches!(stats_queries::gender_distribution(&conn, Some(&disciple)), Err(AppError::Forbidden(_))));
    assert!(matches!(stats_queries::popular_courses(&conn, Some(&disciple), None), Err(AppError::Forbidden(_))));
    assert!(matches!(stats_queries::overview(&conn, None, now()), Err(AppError::Unauthenticated)));
}

#[test]
fn pastors_see_stats() {
    let (conn, leader, disciple, _) = staff_setup();
    let disciple_user = user_queries::me(&conn, Some(&disciple)).unwrap();
    user_ops::set_role(&conn, Some(&leader), disciple_user.id, Role::Pastor).unwrap();
    assert!(stats_queries::school_participation(&conn, Some(&disciple)).is_ok());
}

#[test]
fn overview_counts_members_and_groups() {
    let (conn, leader, _, _) = staff_setup();
    register(&conn, "o1", "Otto", Gender::Male);

    let o = stats_queries::overview(&conn, Some(&leader), now()).unwrap();
    assert_eq!(o.total_members, 3);
    assert_eq!(o.admins, 1);
    assert_eq!(o.leaders, 1);
    assert_eq!(o.total_groups, 1);
    assert_eq!(o.unconnected_members, 1);
    assert_eq!(o.upcoming_activities, 0);
}

#[test]
fn gender_distribution_covers_both() {
    let (conn, leader, _, _) = staff_setup();
    let rows = stats_queries::gender_distribution(&conn, Some(&leader)).unwrap();
    let counts: Vec<usize> = rows.iter().map(|r| r.count).collect();
    assert_eq!(counts, vec![1, 1]);
}

#[test]
fn age_distribution_has_unknown_bucket() {
    let (conn, leader, _, _) = staff_setup();
    user_ops::update_profile(&conn, Some(&leader), None, None, Some(Some(date(1990, 1, 15))), None).unwrap();

    let rows = stats_queries::age_distribution(&conn, Some(&leader), date(2024, 3, 1)).unwrap();
    assert_eq!(rows.len(), 8);
    assert_eq!(rows.iter().find(|r| r.label == "26-35").unwrap().count, 1);
    let last = rows.last().unwrap();
    assert_eq!(last.label, stats_queries::UNKNOWN_AGE_LABEL);
    assert_eq!(last.count, 1);
}

#[test]
fn trend_for_a_month_spans_six_months() {
    let (conn, leader, disciple, _) = staff_setup();
    attendance_ops::record_attendance(&conn, Some(&disciple), at(2024, 3, 6, 19), AttendanceType::Reset, None, 4, now()).unwrap();

    let points = stats_queries::monthly_attendance_trend(&conn, Some(&leader), Period::Month { year: 2024, month: 3 }).unwrap();
    assert_eq!(points.len(), 6);
    assert_eq!(points[0].label, "Oct 2023");
    assert_eq!(points[5].label, "Mar 2024");

    let reset = points[5].totals.iter().find(|t| t.attendance_type == AttendanceType::Reset).unwrap();
    assert_eq!(reset.total, 4);
    assert!(points[0].totals.iter().all(|t| t.total == 0));

    let year = stats_queries::monthly_attendance_trend(&conn, Some(&leader), Period::Year(2024)).unwrap();
    assert_eq!(year.len(), 12);
}

#[test]
fn service_distribution_ends_with_unassigned() {
    let (conn, leader, _, _) = staff_setup();
    let praise = service_ops::create_service(&conn, Some(&leader), "Alabanza").unwrap();
    service_ops::create_service(&conn, Some(&leader), "Ujieres").unwrap();
    service_ops::assign_service(&conn, Some(&leader), praise.id).unwrap();

    let rows = stats_queries::service_distribution(&conn, Some(&leader)).unwrap();
    let pairs: Vec<(&str, usize)> = rows.iter().map(|r| (r.label.as_str(), r.count)).collect();
    assert_eq!(pairs, vec![("Alabanza", 1), ("Ujieres", 0), ("Sin servicio", 1)]);
}

#[test]
fn popular_courses_keep_creation_order_on_ties() {
    let (conn, leader, disciple, _) = staff_setup();
    let a = course_ops::create_course(&conn, Some(&leader), "A", None, None, None, None, now()).unwrap();
    let b = course_ops::create_course(&conn, Some(&leader), "B", None, None, None, None, now()).unwrap();
    course_ops::create_course(&conn, Some(&leader), "C", None, None, None, None, now()).unwrap();
    course_ops::enroll_in_courses(&conn, Some(&leader), &[b.id], now()).unwrap();
    course_ops::enroll_in_courses(&conn, Some(&disciple), &[b.id], now()).unwrap();

    let ranked = stats_queries::popular_courses(&conn, Some(&leader), None).unwrap();
    let names: Vec<&str> = ranked.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["B", "A", "C"]);
    assert_eq!(ranked[0].enrolled, 2);

    let top = stats_queries::popular_courses(&conn, Some(&leader), Some(2)).unwrap();
    assert_eq!(top.len(), 2);
    assert_eq!(top[1].course_id, a.id);

    let school = stats_queries::school_participation(&conn, Some(&leader)).unwrap();
    assert_eq!(school.active, 2);
    assert_eq!(school.inactive, 0);
}
