use crate::cli::context::CLIContext;
use crate::model::group::{day_display_name, parse_day};
use crate::model::*;
use crate::ops::*;
use crate::queries::*;

pub fn list(ctx: &CLIContext) {
    let groups = ctx.my_groups();
    if groups.is_empty() {
        println!("You are not in a group yet. Use 'join <code>' or 'create-group'.");
        return;
    }
    println!("Groups ({}):", groups.len());
    for (i, details) in groups.iter().enumerate() {
        let g = &details.group;
        let role = if details.leaders.iter().any(|l| l.auth_subject == ctx.identity.subject) { "leader" } else { "disciple" };
        println!(
            "  {}. {} - {} {} ({} disciples, you are {})",
            i + 1,
            g.name,
            day_display_name(g.day),
            g.time.format("%H:%M"),
            g.disciples.len(),
            role
        );
    }
}

pub fn create(ctx: &CLIContext, args: &str) {
    let name = if !args.is_empty() {
        args.to_string()
    } else {
        match ctx.prompt("Group name: ") {
            Some(s) if !s.is_empty() => s,
            _ => {
                println!("Name cannot be empty.");
                return;
            }
        }
    };

    let address = ctx.prompt("Address: ").unwrap_or_default();
    let district = ctx.prompt("District: ").unwrap_or_default();

    let day = match ctx.prompt("Day (e.g. viernes, fri): ").as_deref().and_then(parse_day) {
        Some(d) => d,
        None => {
            println!("Unknown day.");
            return;
        }
    };
    let time = match ctx.prompt("Time (HH:MM): ").as_deref().and_then(CLIContext::parse_time) {
        Some(t) => t,
        None => {
            println!("Invalid time. Use HH:MM.");
            return;
        }
    };

    let age_range = match ctx.prompt_optional("Age range (e.g. 18-30, optional): ") {
        None => None,
        Some(s) => {
            let parsed = s
                .split_once('-')
                .and_then(|(a, b)| Some((a.trim().parse::<i32>().ok()?, b.trim().parse::<i32>().ok()?)));
            match parsed {
                Some((min_age, max_age)) => Some(AgeRange { min_age, max_age }),
                None => {
                    println!("Age range must look like 18-30.");
                    return;
                }
            }
        }
    };

    let co_leader = match ctx.prompt_optional("Co-leader name (optional): ") {
        Some(q) => match ctx.find_user(&q) {
            Some(u) => Some(u.id),
            None => return,
        },
        None => None,
    };

    match group_ops::create_group(
        &ctx.conn,
        ctx.caller(),
        &name,
        &address,
        &district,
        age_range,
        day,
        time,
        co_leader,
        CLIContext::now(),
    ) {
        Ok(group) => {
            println!("Created group: {}", group.name);
            println!("Invitation code: {}", group.invitation_code);
        }
        Err(e) => ctx.print_error(&e),
    }
}

pub fn show(ctx: &CLIContext, args: &str) {
    let details = match ctx.find_group(args) {
        Some(d) => d,
        None => {
            if args.is_empty() { println!("Usage: show-group <name>"); }
            return;
        }
    };
    let g = &details.group;
    println!();
    println!("Name: {}", g.name);
    println!("Address: {} ({})", g.address, g.district);
    println!("Meets: {} {}", day_display_name(g.day), g.time.format("%H:%M"));
    if let Some(range) = g.age_range {
        println!("Ages: {}-{}", range.min_age, range.max_age);
    }
    println!("Invitation code: {}", g.invitation_code);
    let leaders: Vec<&str> = details.leaders.iter().map(|u| u.name.as_str()).collect();
    println!("Leaders: {}", leaders.join(", "));
    if details.disciples.is_empty() {
        println!("Disciples: (none)");
    } else {
        let names: Vec<&str> = details.disciples.iter().map(|u| u.name.as_str()).collect();
        println!("Disciples: {}", names.join(", "));
    }
    println!();
}

pub fn join(ctx: &CLIContext, args: &str) {
    let code = if !args.is_empty() {
        args.to_string()
    } else {
        match ctx.prompt("Invitation code: ") {
            Some(s) if !s.is_empty() => s,
            _ => return,
        }
    };

    // Preview first so the user sees what they're joining.
    let preview = match group_queries::get_group_by_code(&ctx.conn, ctx.caller(), &code) {
        Ok(d) => d,
        Err(e) => {
            ctx.print_error(&e);
            return;
        }
    };
    let leaders: Vec<&str> = preview.leaders.iter().map(|u| u.name.as_str()).collect();
    if !ctx.confirm(&format!("Join '{}' led by {}?", preview.group.name, leaders.join(" & "))) {
        return;
    }

    match group_ops::join_group(&ctx.conn, ctx.caller(), &code) {
        Ok(group) => {
            let me = user_queries::me(&ctx.conn, ctx.caller()).ok();
            let leader = me
                .and_then(|u| u.leader_id)
                .and_then(|id| preview.leaders.iter().find(|l| l.id == id))
                .map(|l| l.name.clone())
                .unwrap_or_default();
            println!("Joined {}. Your leader is {}.", group.name, leader);
        }
        Err(e) => ctx.print_error(&e),
    }
}

pub fn edit(ctx: &CLIContext, args: &str) {
    let details = match ctx.find_group(args) {
        Some(d) => d,
        None => return,
    };
    println!("Editing group: {} (press Enter to keep)", details.group.name);
    let name = ctx.prompt_optional("New name: ");
    let address = ctx.prompt_optional("New address: ");

    match group_ops::update_group(&ctx.conn, ctx.caller(), details.group.id, name.as_deref(), address.as_deref()) {
        Ok(g) => println!("Updated group: {}", g.name),
        Err(e) => ctx.print_error(&e),
    }
}
