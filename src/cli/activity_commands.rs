use crate::cli::context::CLIContext;
use crate::model::*;
use crate::ops::*;
use crate::queries::*;
use crate::queries::activity_queries::{ResponseEntry, UpcomingActivity};

fn upcoming_list(ctx: &CLIContext) -> Vec<UpcomingActivity> {
    activity_queries::my_upcoming_activities(&ctx.conn, ctx.caller(), CLIContext::now()).unwrap_or_default()
}

fn find_upcoming(ctx: &CLIContext, args: &str, usage: &str) -> Option<Activity> {
    if args.is_empty() {
        println!("Usage: {}", usage);
        return None;
    }
    let list = upcoming_list(ctx);
    ctx.pick(&list, args, "activity", |u| &u.activity.name).map(|u| u.activity.clone())
}

pub fn upcoming(ctx: &CLIContext) {
    let list = upcoming_list(ctx);
    if list.is_empty() {
        println!("No upcoming activities.");
        return;
    }
    println!("Upcoming activities ({}):", list.len());
    for (i, u) in list.iter().enumerate() {
        let status = u.my_status.map_or("sin respuesta", |s| s.display_name());
        println!(
            "  {}. {} - {} [{}] ({})",
            i + 1,
            u.activity.date_time.format("%Y-%m-%d %H:%M"),
            u.activity.name,
            u.group_name,
            status
        );
    }
}

pub fn for_group(ctx: &CLIContext, args: &str) {
    let details = match ctx.find_group(args) {
        Some(d) => d,
        None => return,
    };
    match activity_queries::group_activities(&ctx.conn, ctx.caller(), details.group.id) {
        Ok(list) if list.is_empty() => println!("No activities for {}.", details.group.name),
        Ok(list) => {
            println!("Activities of {} ({}):", details.group.name, list.len());
            for a in &list {
                println!("  {} - {}", a.date_time.format("%Y-%m-%d %H:%M"), a.name);
            }
        }
        Err(e) => ctx.print_error(&e),
    }
}

pub fn add(ctx: &CLIContext, args: &str) {
    let details = match ctx.find_group(args) {
        Some(d) => d,
        None => {
            if args.is_empty() { println!("Usage: add-activity <group>"); }
            return;
        }
    };

    let name = ctx.prompt("Activity name: ").unwrap_or_default();
    let address = ctx.prompt("Address: ").unwrap_or_default();
    let date_time = match ctx.prompt("When (YYYY-MM-DD HH:MM): ").as_deref().and_then(CLIContext::parse_date_time) {
        Some(dt) => dt,
        None => {
            println!("Invalid date. Use YYYY-MM-DD HH:MM.");
            return;
        }
    };
    let description = ctx.prompt("Description: ").unwrap_or_default();

    match activity_ops::create_activity(
        &ctx.conn,
        ctx.caller(),
        details.group.id,
        &name,
        &address,
        date_time,
        &description,
        CLIContext::now(),
    ) {
        Ok(a) => println!("Scheduled {} for {}", a.name, a.date_time.format("%Y-%m-%d %H:%M")),
        Err(e) => ctx.print_error(&e),
    }
}

fn print_entries(title: &str, entries: &[ResponseEntry]) {
    if entries.is_empty() {
        return;
    }
    let names: Vec<&str> = entries.iter().map(|e| e.user.name.as_str()).collect();
    println!("{} ({}): {}", title, entries.len(), names.join(", "));
}

pub fn show(ctx: &CLIContext, args: &str) {
    let activity = match find_upcoming(ctx, args, "show-activity <n>") {
        Some(a) => a,
        None => return,
    };
    match activity_queries::get_activity_with_responses(&ctx.conn, ctx.caller(), activity.id) {
        Ok(d) => {
            println!();
            println!("{} ({})", d.activity.name, d.group_name);
            println!("When: {}", d.activity.date_time.format("%Y-%m-%d %H:%M"));
            println!("Where: {}", d.activity.address);
            println!("{}", d.activity.description);
            println!();
            print_entries(ResponseStatus::Confirmed.display_name(), &d.confirmed);
            print_entries(ResponseStatus::Pending.display_name(), &d.pending);
            print_entries(ResponseStatus::Denied.display_name(), &d.denied);
            println!();
        }
        Err(e) => ctx.print_error(&e),
    }
}

pub fn respond(ctx: &CLIContext, args: &str) {
    let activity = match find_upcoming(ctx, args, "rsvp <n>") {
        Some(a) => a,
        None => return,
    };
    let status = match ctx.prompt("Attending? (y = yes, n = no, p = pending): ").as_deref() {
        Some("y") | Some("s") => ResponseStatus::Confirmed,
        Some("n") => ResponseStatus::Denied,
        Some("p") => ResponseStatus::Pending,
        _ => {
            println!("Answer y, n or p.");
            return;
        }
    };
    match activity_ops::respond_to_activity(&ctx.conn, ctx.caller(), activity.id, status, CLIContext::now()) {
        Ok(r) => println!("{}: {}", activity.name, r.status.display_name()),
        Err(e) => ctx.print_error(&e),
    }
}

pub fn edit(ctx: &CLIContext, args: &str) {
    let activity = match find_upcoming(ctx, args, "edit-activity <n>") {
        Some(a) => a,
        None => return,
    };
    println!("Editing {} (press Enter to keep)", activity.name);
    let name = ctx.prompt_optional("Name: ");
    let address = ctx.prompt_optional("Address: ");
    let date_time = match ctx.prompt_optional("When (YYYY-MM-DD HH:MM): ") {
        Some(s) => match CLIContext::parse_date_time(&s) {
            Some(dt) => Some(dt),
            None => {
                println!("Invalid date. Use YYYY-MM-DD HH:MM.");
                return;
            }
        },
        None => None,
    };
    let description = ctx.prompt_optional("Description: ");

    match activity_ops::update_activity(
        &ctx.conn,
        ctx.caller(),
        activity.id,
        name.as_deref(),
        address.as_deref(),
        date_time,
        description.as_deref(),
        CLIContext::now(),
    ) {
        Ok(a) => println!("Updated {}", a.name),
        Err(e) => ctx.print_error(&e),
    }
}

pub fn delete(ctx: &CLIContext, args: &str) {
    let activity = match find_upcoming(ctx, args, "delete-activity <n>") {
        Some(a) => a,
        None => return,
    };
    if !ctx.confirm(&format!("Delete {} and all its responses?", activity.name)) {
        return;
    }
    match activity_ops::delete_activity(&ctx.conn, ctx.caller(), activity.id) {
        Ok(()) => println!("Deleted {}", activity.name),
        Err(e) => ctx.print_error(&e),
    }
}
