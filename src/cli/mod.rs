pub mod context;
pub mod profile_commands;
pub mod group_commands;
pub mod activity_commands;
pub mod course_commands;
pub mod service_commands;
pub mod attendance_commands;
pub mod stats_commands;

use std::path::Path;
use rusqlite::Connection;

use crate::auth::Identity;
use crate::db::{schema, user_repo};
use crate::model::*;
use crate::ops::*;
use context::CLIContext;

/// Run the interactive REPL as `subject`, asking for one if not given.
pub fn run(db_path: &Path, subject: Option<&str>) {
    println!("Conexion");
    println!("Type 'help' for commands, 'exit' to quit.");
    println!();

    let conn = match Connection::open(db_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error opening database: {}", e);
            return;
        }
    };

    if let Err(e) = schema::initialize(&conn) {
        eprintln!("Error initializing database: {}", e);
        return;
    }

    let ctx = match load_or_register(conn, subject) {
        Some(ctx) => ctx,
        None => return,
    };

    repl_loop(&ctx);
}

fn load_or_register(conn: Connection, subject: Option<&str>) -> Option<CLIContext> {
    let subject = match subject {
        Some(s) => s.trim().to_string(),
        None => {
            let ctx = CLIContext::new(conn, Identity::new(""));
            let s = ctx.prompt("Auth subject: ")?;
            if s.is_empty() || matches!(s.to_lowercase().as_str(), "exit" | "quit" | "q") {
                return None;
            }
            return load_or_register(ctx.conn, Some(&s));
        }
    };

    match user_repo::find_by_subject(&conn, &subject) {
        Ok(Some(user)) => {
            println!("Welcome back, {}.", user.name);
            Some(CLIContext::new(conn, Identity::new(subject)))
        }
        Ok(None) => {
            println!("No profile found for '{}'. Let's create one.", subject);
            register(CLIContext::new(conn, Identity::new(subject)))
        }
        Err(e) => {
            eprintln!("Error loading profile: {}", e);
            None
        }
    }
}

fn register(ctx: CLIContext) -> Option<CLIContext> {
    let name = ctx.prompt("Name: ")?;
    let email = ctx.prompt("Email: ").unwrap_or_default();
    let gender = match ctx.prompt("Gender (m/f): ").as_deref().and_then(Gender::parse_input) {
        Some(g) => g,
        None => {
            println!("Gender must be m or f. Please restart and try again.");
            return None;
        }
    };
    let birth_date = ctx
        .prompt_optional("Birth date (YYYY-MM-DD, optional): ")
        .and_then(|s| CLIContext::parse_date(&s));

    match user_ops::register_user(&ctx.conn, ctx.caller(), &name, &email, gender, birth_date) {
        Ok(user) => {
            println!("Welcome, {}! Your profile has been created.", user.name);
            println!();
            Some(ctx)
        }
        Err(e) => {
            ctx.print_error(&e);
            None
        }
    }
}

fn repl_loop(ctx: &CLIContext) {
    loop {
        let input = match ctx.read_line("> ") {
            Some(s) => s,
            None => break,
        };

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        let (command, args) = parse_command(input);

        match command {
            "help" | "?" => print_help(),
            "quit" | "exit" | "q" => break,

            // Profile
            "me" => profile_commands::me(ctx),
            "edit-profile" => profile_commands::edit(ctx),
            "disciples" => profile_commands::disciples(ctx),
            "users" => profile_commands::list(ctx),
            "show-user" => profile_commands::show(ctx, args),
            "set-role" => profile_commands::set_role(ctx, args),
            "set-admin" => profile_commands::set_admin(ctx, args),

            // Groups
            "groups" => group_commands::list(ctx),
            "create-group" => group_commands::create(ctx, args),
            "show-group" => group_commands::show(ctx, args),
            "join" => group_commands::join(ctx, args),
            "edit-group" => group_commands::edit(ctx, args),

            // Activities
            "activities" => activity_commands::upcoming(ctx),
            "group-activities" => activity_commands::for_group(ctx, args),
            "add-activity" => activity_commands::add(ctx, args),
            "show-activity" => activity_commands::show(ctx, args),
            "rsvp" => activity_commands::respond(ctx, args),
            "edit-activity" => activity_commands::edit(ctx, args),
            "delete-activity" => activity_commands::delete(ctx, args),

            // Courses
            "courses" => course_commands::list(ctx),
            "my-courses" => course_commands::mine(ctx),
            "add-course" => course_commands::add(ctx, args),
            "edit-course" => course_commands::edit(ctx, args),
            "delete-course" => course_commands::delete(ctx, args),
            "enroll" => course_commands::enroll(ctx, args),
            "unenroll" => course_commands::unenroll(ctx, args),
            "week" => course_commands::toggle_week(ctx, args),
            "exam" => course_commands::toggle_exam(ctx, args),
            "students" => course_commands::students(ctx, args),

            // Services
            "services" => service_commands::list(ctx),
            "add-service" => service_commands::add(ctx, args),
            "rename-service" => service_commands::rename(ctx, args),
            "delete-service" => service_commands::delete(ctx, args),
            "serve" => service_commands::assign(ctx, args),
            "leave-service" => service_commands::leave(ctx),
            "service-members" => service_commands::members(ctx, args),

            // Attendance
            "attend" => attendance_commands::record(ctx),
            "records" => attendance_commands::records(ctx, args),
            "edit-record" => attendance_commands::edit(ctx, args),
            "delete-record" => attendance_commands::delete(ctx, args),
            "report" => attendance_commands::my_report(ctx, args),
            "group-report" => attendance_commands::group_report(ctx, args),

            // Dashboard
            "stats" => stats_commands::overview(ctx),
            "chart" => stats_commands::chart(ctx, args),

            _ => println!("Unknown command: {}. Type 'help' for commands.", command),
        }
    }
}

/// Split input into command and args.
fn parse_command(input: &str) -> (&str, &str) {
    let input = input.trim();
    match input.find(|c: char| c == ' ' || c == '\t') {
        Some(pos) => (&input[..pos], input[pos..].trim()),
        None => (input, ""),
    }
}

fn print_help() {
    println!(r#"
COMMANDS:

  Profile:
    me                        Show your profile
    edit-profile              Edit name, phone, birth date, gender
    disciples                 List your disciples
    users                     List all users (pastors/admins)
    show-user <name>          Show a user
    set-role <name>           Make a user Pastor or Member (admins)
    set-admin <name>          Grant or revoke admin rights (admins)

  Groups:
    groups                    List your groups
    create-group [name]       Create a group you lead
    show-group [name]         Show group details and members
    join <code>               Join a group by invitation code
    edit-group [name]         Rename or move a group you lead

  Activities:
    activities                Your upcoming activities
    group-activities [group]  All activities of a group
    add-activity [group]      Schedule an activity (leaders)
    show-activity <n>         Show an upcoming activity with responses
    rsvp <n>                  Confirm, deny or leave pending
    edit-activity <n>         Edit an activity (leaders)
    delete-activity <n>       Delete an activity and its responses

  Courses:
    courses                   List courses
    my-courses                Your courses and weekly status
    add-course [name]         Create a course (admins)
    edit-course <name>        Edit a course (admins)
    delete-course <name>      Delete a course (admins)
    enroll <name>[, ...]      Enroll in one or more courses
    unenroll <name>[, ...]    Leave one or more courses
    week <course> <n>         Toggle week n as completed
    exam <course>             Toggle work and exam as completed
    students <course>         Course roster with progress (pastors/admins)

  Services:
    services                  List services
    add-service [name]        Create a service (admins)
    rename-service <name>     Rename a service (admins)
    delete-service <name>     Delete a service (admins)
    serve <name>              Join a service
    leave-service             Leave your service
    service-members <name>    List members of a service

  Attendance:
    attend                    Record attendance
    records [YYYY-MM]         Your records for a month or year
    edit-record <n>           Edit one of this month's records
    delete-record <n>         Delete one of this month's records
    report [YYYY[-MM]]        Your totals by type
    group-report [YYYY[-MM]]  Your disciples' totals (leaders)

  Dashboard (pastors/admins):
    stats                     Overview
    chart <kind> [period]     gender | age | trend | services | school | courses

  Other:
    help                      Show this help
    exit / quit / q           Exit

TIPS:
  - Names are case-insensitive and partial matches work
  - Lists are numbered; a number picks that entry"#);
}

/// Parses a period argument, defaulting to the current month.
pub(crate) fn period_arg(args: &str) -> Option<Period> {
    if args.trim().is_empty() {
        return Some(Period::containing(CLIContext::today()));
    }
    let period = Period::parse(args);
    if period.is_none() {
        println!("Period must be YYYY or YYYY-MM");
    }
    period
}
