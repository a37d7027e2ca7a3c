use crate::cli::context::CLIContext;
use crate::model::*;
use crate::ops::*;
use crate::queries::*;

fn date_range(course: &Course) -> String {
    match (course.start_date, course.end_date) {
        (Some(s), Some(e)) => format!("{} to {}", s, e),
        (Some(s), None) => format!("from {}", s),
        (None, Some(e)) => format!("until {}", e),
        (None, None) => "no dates".into(),
    }
}

pub fn list(ctx: &CLIContext) {
    match course_queries::list_courses(&ctx.conn, ctx.caller()) {
        Ok(courses) if courses.is_empty() => println!("No courses yet."),
        Ok(courses) => {
            println!("Courses ({}):", courses.len());
            for (i, c) in courses.iter().enumerate() {
                println!("  {}. {} ({} weeks, {})", i + 1, c.name, c.duration_weeks, date_range(c));
            }
        }
        Err(e) => ctx.print_error(&e),
    }
}

pub fn mine(ctx: &CLIContext) {
    let overviews = match course_queries::my_courses(&ctx.conn, ctx.caller(), CLIContext::today()) {
        Ok(o) => o,
        Err(e) => {
            ctx.print_error(&e);
            return;
        }
    };
    if overviews.is_empty() {
        println!("You are not enrolled in any course. Use 'enroll <name>'.");
        return;
    }
    for o in &overviews {
        println!();
        println!("{} (week {} of {})", o.course.name, o.current_week, o.course.duration_weeks);
        let line: Vec<String> = o
            .weeks
            .iter()
            .map(|w| format!("{}:{}", w.week, w.status.as_str()))
            .collect();
        println!("  {}", line.join("  "));
        let exam = o.progress.as_ref().map_or(false, |p| p.completed_work_and_exam);
        println!("  Weeks behind: {}  Work and exam: {}", o.weeks_behind(), if exam { "done" } else { "pending" });
    }
    println!();
}

fn prompt_dates(ctx: &CLIContext) -> Option<(Option<chrono::NaiveDate>, Option<chrono::NaiveDate>)> {
    let mut out = Vec::with_capacity(2);
    for label in ["Start date", "End date"] {
        match ctx.prompt_optional(&format!("{} (YYYY-MM-DD, optional): ", label)) {
            Some(s) => match CLIContext::parse_date(&s) {
                Some(d) => out.push(Some(d)),
                None => {
                    println!("Invalid date. Use YYYY-MM-DD.");
                    return None;
                }
            },
            None => out.push(None),
        }
    }
    Some((out[0], out[1]))
}

pub fn add(ctx: &CLIContext, args: &str) {
    let name = if !args.is_empty() {
        args.to_string()
    } else {
        match ctx.prompt("Course name: ") {
            Some(s) if !s.is_empty() => s,
            _ => {
                println!("Name cannot be empty.");
                return;
            }
        }
    };
    let description = ctx.prompt_optional("Description (optional): ");
    let (start, end) = match prompt_dates(ctx) {
        Some(d) => d,
        None => return,
    };
    let weeks = match ctx.prompt_optional("Duration in weeks (default 9): ") {
        Some(s) => match s.parse::<u32>() {
            Ok(w) => Some(w),
            Err(_) => {
                println!("Weeks must be a number.");
                return;
            }
        },
        None => None,
    };

    match course_ops::create_course(&ctx.conn, ctx.caller(), &name, description.as_deref(), start, end, weeks, CLIContext::now()) {
        Ok(c) => println!("Created course: {} ({} weeks)", c.name, c.duration_weeks),
        Err(e) => ctx.print_error(&e),
    }
}

pub fn edit(ctx: &CLIContext, args: &str) {
    if args.is_empty() {
        println!("Usage: edit-course <name>");
        return;
    }
    let course = match ctx.find_course(args) {
        Some(c) => c,
        None => return,
    };
    println!("Editing course: {} (press Enter to keep, '-' clears)", course.name);

    let name = ctx.prompt_optional("Name: ");
    let description = ctx.prompt_optional("Description: ");
    let description_change = description.as_deref().map(|d| if d == "-" { None } else { Some(d) });

    let mut date_changes = Vec::with_capacity(2);
    for label in ["Start date", "End date"] {
        let change = match ctx.prompt_optional(&format!("{} (YYYY-MM-DD): ", label)).as_deref() {
            None => None,
            Some("-") => Some(None),
            Some(s) => match CLIContext::parse_date(s) {
                Some(d) => Some(Some(d)),
                None => {
                    println!("Invalid date. Use YYYY-MM-DD.");
                    return;
                }
            },
        };
        date_changes.push(change);
    }

    let weeks = match ctx.prompt_optional("Duration in weeks: ") {
        Some(s) => match s.parse::<u32>() {
            Ok(w) => Some(w),
            Err(_) => {
                println!("Weeks must be a number.");
                return;
            }
        },
        None => None,
    };

    match course_ops::update_course(
        &ctx.conn,
        ctx.caller(),
        course.id,
        name.as_deref(),
        description_change,
        date_changes[0],
        date_changes[1],
        weeks,
    ) {
        Ok(c) => println!("Updated course: {}", c.name),
        Err(e) => ctx.print_error(&e),
    }
}

pub fn delete(ctx: &CLIContext, args: &str) {
    if args.is_empty() {
        println!("Usage: delete-course <name>");
        return;
    }
    let course = match ctx.find_course(args) {
        Some(c) => c,
        None => return,
    };
    if !ctx.confirm(&format!("Delete {} and every student's progress in it?", course.name)) {
        return;
    }
    match course_ops::delete_course(&ctx.conn, ctx.caller(), course.id) {
        Ok(()) => println!("Deleted course: {}", course.name),
        Err(e) => ctx.print_error(&e),
    }
}

/// Resolves a comma separated list of course names.
fn course_ids(ctx: &CLIContext, args: &str) -> Option<Vec<Id<Course>>> {
    let mut ids = Vec::new();
    for part in args.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        ids.push(ctx.find_course(part)?.id);
    }
    if ids.is_empty() {
        return None;
    }
    Some(ids)
}

pub fn enroll(ctx: &CLIContext, args: &str) {
    if args.is_empty() {
        println!("Usage: enroll <course>[, <course>...]");
        return;
    }
    let ids = match course_ids(ctx, args) {
        Some(ids) => ids,
        None => return,
    };
    match course_ops::enroll_in_courses(&ctx.conn, ctx.caller(), &ids, CLIContext::now()) {
        Ok(u) => println!("Enrolled. You now take {} course(s).", u.current_courses.len()),
        Err(e) => ctx.print_error(&e),
    }
}

pub fn unenroll(ctx: &CLIContext, args: &str) {
    if args.is_empty() {
        println!("Usage: unenroll <course>[, <course>...]");
        return;
    }
    let ids = match course_ids(ctx, args) {
        Some(ids) => ids,
        None => return,
    };
    match course_ops::unenroll_from_courses(&ctx.conn, ctx.caller(), &ids) {
        Ok(u) if u.current_courses.is_empty() => println!("Unenrolled. You are no longer active in school."),
        Ok(u) => println!("Unenrolled. You now take {} course(s).", u.current_courses.len()),
        Err(e) => ctx.print_error(&e),
    }
}

pub fn toggle_week(ctx: &CLIContext, args: &str) {
    let (course_q, week) = match args.rsplit_once(' ').map(|(c, w)| (c, w.trim().parse::<u32>())) {
        Some((c, Ok(w))) => (c, w),
        _ => {
            println!("Usage: week <course> <n>");
            return;
        }
    };
    let course = match ctx.find_course(course_q) {
        Some(c) => c,
        None => return,
    };
    match course_ops::toggle_week_completion(&ctx.conn, ctx.caller(), course.id, week, CLIContext::now()) {
        Ok(p) if p.is_week_completed(week) => println!("Week {} of {} marked completed", week, course.name),
        Ok(_) => println!("Week {} of {} marked not completed", week, course.name),
        Err(e) => ctx.print_error(&e),
    }
}

pub fn toggle_exam(ctx: &CLIContext, args: &str) {
    if args.is_empty() {
        println!("Usage: exam <course>");
        return;
    }
    let course = match ctx.find_course(args) {
        Some(c) => c,
        None => return,
    };
    match course_ops::toggle_work_and_exam(&ctx.conn, ctx.caller(), course.id, CLIContext::now()) {
        Ok(p) if p.completed_work_and_exam => println!("Work and exam of {} marked completed", course.name),
        Ok(_) => println!("Work and exam of {} marked pending", course.name),
        Err(e) => ctx.print_error(&e),
    }
}

pub fn students(ctx: &CLIContext, args: &str) {
    if args.is_empty() {
        println!("Usage: students <course>");
        return;
    }
    let course = match ctx.find_course(args) {
        Some(c) => c,
        None => return,
    };
    match course_queries::course_students(&ctx.conn, ctx.caller(), course.id, CLIContext::today()) {
        Ok(list) if list.is_empty() => println!("No students in {}.", course.name),
        Ok(list) => {
            println!("Students of {} ({}):", course.name, list.len());
            for s in &list {
                println!(
                    "  {} - {}/{} weeks, {} behind{}",
                    s.user.name,
                    s.completed_weeks,
                    course.duration_weeks,
                    s.weeks_behind,
                    if s.completed_work_and_exam { ", exam done" } else { "" }
                );
            }
        }
        Err(e) => ctx.print_error(&e),
    }
}
