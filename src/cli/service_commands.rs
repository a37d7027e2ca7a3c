use crate::cli::context::CLIContext;
use crate::ops::*;
use crate::queries::*;

pub fn list(ctx: &CLIContext) {
    match service_queries::list_services(&ctx.conn, ctx.caller()) {
        Ok(services) if services.is_empty() => println!("No services yet."),
        Ok(services) => {
            println!("Services ({}):", services.len());
            for (i, s) in services.iter().enumerate() {
                println!("  {}. {}", i + 1, s.name);
            }
        }
        Err(e) => ctx.print_error(&e),
    }
}

pub fn add(ctx: &CLIContext, args: &str) {
    let name = if !args.is_empty() {
        args.to_string()
    } else {
        match ctx.prompt("Service name: ") {
            Some(s) if !s.is_empty() => s,
            _ => {
                println!("Name cannot be empty.");
                return;
            }
        }
    };
    match service_ops::create_service(&ctx.conn, ctx.caller(), &name) {
        Ok(s) => println!("Created service: {}", s.name),
        Err(e) => ctx.print_error(&e),
    }
}

pub fn rename(ctx: &CLIContext, args: &str) {
    if args.is_empty() {
        println!("Usage: rename-service <name>");
        return;
    }
    let service = match ctx.find_service(args) {
        Some(s) => s,
        None => return,
    };
    let name = match ctx.prompt(&format!("New name for {}: ", service.name)) {
        Some(s) if !s.is_empty() => s,
        _ => return,
    };
    match service_ops::rename_service(&ctx.conn, ctx.caller(), service.id, &name) {
        Ok(s) => println!("Renamed to {}", s.name),
        Err(e) => ctx.print_error(&e),
    }
}

pub fn delete(ctx: &CLIContext, args: &str) {
    if args.is_empty() {
        println!("Usage: delete-service <name>");
        return;
    }
    let service = match ctx.find_service(args) {
        Some(s) => s,
        None => return,
    };
    if !ctx.confirm(&format!("Delete {}? Its members will have no service.", service.name)) {
        return;
    }
    match service_ops::delete_service(&ctx.conn, ctx.caller(), service.id) {
        Ok(()) => println!("Deleted service: {}", service.name),
        Err(e) => ctx.print_error(&e),
    }
}

pub fn assign(ctx: &CLIContext, args: &str) {
    if args.is_empty() {
        println!("Usage: serve <service>");
        return;
    }
    let service = match ctx.find_service(args) {
        Some(s) => s,
        None => return,
    };
    match service_ops::assign_service(&ctx.conn, ctx.caller(), service.id) {
        Ok(_) => println!("You now serve in {}", service.name),
        Err(e) => ctx.print_error(&e),
    }
}

pub fn leave(ctx: &CLIContext) {
    match service_ops::leave_service(&ctx.conn, ctx.caller()) {
        Ok(_) => println!("You no longer serve in any service."),
        Err(e) => ctx.print_error(&e),
    }
}

pub fn members(ctx: &CLIContext, args: &str) {
    if args.is_empty() {
        println!("Usage: service-members <service>");
        return;
    }
    let service = match ctx.find_service(args) {
        Some(s) => s,
        None => return,
    };
    match service_queries::service_members(&ctx.conn, ctx.caller(), service.id) {
        Ok(users) if users.is_empty() => println!("Nobody serves in {} yet.", service.name),
        Ok(users) => {
            let names: Vec<&str> = users.iter().map(|u| u.name.as_str()).collect();
            println!("{} ({}): {}", service.name, users.len(), names.join(", "));
        }
        Err(e) => ctx.print_error(&e),
    }
}
