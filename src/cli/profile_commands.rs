use crate::cli::context::CLIContext;
use crate::model::*;
use crate::ops::*;
use crate::queries::*;

fn print_user(user: &User) {
    println!();
    println!("Name: {}", user.name);
    println!("Email: {}", if user.email.is_empty() { "(none)" } else { &user.email });
    println!("Phone: {}", user.phone.as_deref().unwrap_or("(none)"));
    match user.birth_date {
        Some(d) => println!("Birth date: {} ({} years)", d, user.age_on(CLIContext::today()).unwrap_or(0)),
        None => println!("Birth date: (none)"),
    }
    println!("Gender: {}", user.gender.display_name());
    println!("Role: {}{}", user.role.to_db_str(), if user.is_admin { ", admin" } else { "" });
    println!("Courses: {}", user.current_courses.len());
    println!("Active in school: {}", if user.is_active_in_school { "yes" } else { "no" });
    println!();
}

pub fn me(ctx: &CLIContext) {
    match user_queries::me(&ctx.conn, ctx.caller()) {
        Ok(user) => {
            print_user(&user);
            if let Some(leader_id) = user.leader_id {
                if let Ok(leader) = user_queries::get_user(&ctx.conn, ctx.caller(), leader_id) {
                    println!("Leader: {}", leader.name);
                }
            }
            if let Some(service_id) = user.service_id {
                let services = service_queries::list_services(&ctx.conn, ctx.caller()).unwrap_or_default();
                if let Some(s) = services.iter().find(|s| s.id == service_id) {
                    println!("Service: {}", s.name);
                }
            }
        }
        Err(e) => ctx.print_error(&e),
    }
}

pub fn edit(ctx: &CLIContext) {
    let current = match user_queries::me(&ctx.conn, ctx.caller()) {
        Ok(u) => u,
        Err(e) => {
            ctx.print_error(&e);
            return;
        }
    };
    println!("Press Enter to keep a value, '-' to clear an optional one.");

    let name = ctx.prompt_optional(&format!("Name [{}]: ", current.name));
    let phone = ctx.prompt_optional(&format!("Phone [{}]: ", current.phone.as_deref().unwrap_or("")));
    let birth = ctx.prompt_optional("Birth date (YYYY-MM-DD): ");
    let gender = ctx.prompt_optional(&format!("Gender (m/f) [{}]: ", current.gender.display_name()));

    let phone_change = phone.as_deref().map(|p| if p == "-" { None } else { Some(p) });
    let birth_change = match birth.as_deref() {
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
    let gender_change = match gender.as_deref() {
        None => None,
        Some(s) => match Gender::parse_input(s) {
            Some(g) => Some(g),
            None => {
                println!("Gender must be m or f.");
                return;
            }
        },
    };

    match user_ops::update_profile(&ctx.conn, ctx.caller(), name.as_deref(), phone_change, birth_change, gender_change) {
        Ok(user) => println!("Updated profile for {}", user.name),
        Err(e) => ctx.print_error(&e),
    }
}

pub fn disciples(ctx: &CLIContext) {
    match user_queries::my_disciples(&ctx.conn, ctx.caller()) {
        Ok(list) if list.is_empty() => println!("No disciples yet. Share your group's invitation code."),
        Ok(list) => {
            println!("Disciples ({}):", list.len());
            for (i, u) in list.iter().enumerate() {
                println!("  {}. {} ({})", i + 1, u.name, u.gender.display_name());
            }
        }
        Err(e) => ctx.print_error(&e),
    }
}

pub fn list(ctx: &CLIContext) {
    match user_queries::list_users(&ctx.conn, ctx.caller()) {
        Ok(users) => {
            println!("Users ({}):", users.len());
            for (i, u) in users.iter().enumerate() {
                let admin = if u.is_admin { ", admin" } else { "" };
                println!("  {}. {} ({}{})", i + 1, u.name, u.role.to_db_str(), admin);
            }
        }
        Err(e) => ctx.print_error(&e),
    }
}

pub fn show(ctx: &CLIContext, args: &str) {
    if args.is_empty() {
        println!("Usage: show-user <name>");
        return;
    }
    if let Some(user) = ctx.find_user(args) {
        match user_queries::get_user(&ctx.conn, ctx.caller(), user.id) {
            Ok(u) => print_user(&u),
            Err(e) => ctx.print_error(&e),
        }
    }
}

pub fn set_role(ctx: &CLIContext, args: &str) {
    if args.is_empty() {
        println!("Usage: set-role <name>");
        return;
    }
    let user = match ctx.find_user(args) {
        Some(u) => u,
        None => return,
    };
    let role = match ctx.prompt("Role (pastor/member): ").map(|s| s.to_lowercase()).as_deref() {
        Some("pastor") | Some("p") => Role::Pastor,
        Some("member") | Some("m") => Role::Member,
        _ => {
            println!("Role must be pastor or member.");
            return;
        }
    };
    match user_ops::set_role(&ctx.conn, ctx.caller(), user.id, role) {
        Ok(u) => println!("{} is now {}", u.name, u.role.to_db_str()),
        Err(e) => ctx.print_error(&e),
    }
}

pub fn set_admin(ctx: &CLIContext, args: &str) {
    if args.is_empty() {
        println!("Usage: set-admin <name>");
        return;
    }
    let user = match ctx.find_user(args) {
        Some(u) => u,
        None => return,
    };
    let grant = ctx.confirm(&format!("Grant admin rights to {}?", user.name));
    match user_ops::set_admin(&ctx.conn, ctx.caller(), user.id, grant) {
        Ok(u) if u.is_admin => println!("{} is now an admin", u.name),
        Ok(u) => println!("{} is no longer an admin", u.name),
        Err(e) => ctx.print_error(&e),
    }
}
