use crate::cli::context::CLIContext;
use crate::cli::period_arg;
use crate::queries::*;
use crate::queries::stats_queries::LabeledCount;

pub fn overview(ctx: &CLIContext) {
    match stats_queries::overview(&ctx.conn, ctx.caller(), CLIContext::now()) {
        Ok(s) => {
            println!();
            println!("Members: {} ({} pastors, {} admins)", s.total_members, s.pastors, s.admins);
            println!("Groups: {} with {} leaders", s.total_groups, s.leaders);
            if s.unconnected_members > 0 {
                println!("  Not in a group: {}", s.unconnected_members);
            }
            println!("Courses: {} ({} active students)", s.total_courses, s.active_students);
            println!("Services: {}", s.total_services);
            if s.upcoming_activities > 0 {
                println!("Upcoming activities: {}", s.upcoming_activities);
            }
            println!();
        }
        Err(e) => ctx.print_error(&e),
    }
}

fn print_bars(rows: &[LabeledCount]) {
    let max = rows.iter().map(|r| r.count).max().unwrap_or(0).max(1);
    for r in rows {
        let bar = "#".repeat(r.count * 30 / max);
        println!("  {:<14} {:>4} {}", r.label, r.count, bar);
    }
}

pub fn chart(ctx: &CLIContext, args: &str) {
    let (kind, rest) = match args.split_once(' ') {
        Some((k, r)) => (k, r.trim()),
        None => (args, ""),
    };

    let rows = match kind {
        "gender" => stats_queries::gender_distribution(&ctx.conn, ctx.caller()),
        "age" => stats_queries::age_distribution(&ctx.conn, ctx.caller(), CLIContext::today()),
        "services" => stats_queries::service_distribution(&ctx.conn, ctx.caller()),
        "school" => {
            match stats_queries::school_participation(&ctx.conn, ctx.caller()) {
                Ok(p) => println!("Active in school: {}  Inactive: {}", p.active, p.inactive),
                Err(e) => ctx.print_error(&e),
            }
            return;
        }
        "courses" => {
            let limit = rest.parse::<usize>().ok();
            match stats_queries::popular_courses(&ctx.conn, ctx.caller(), limit) {
                Ok(list) => {
                    for (i, c) in list.iter().enumerate() {
                        println!("  {}. {} ({} enrolled)", i + 1, c.name, c.enrolled);
                    }
                }
                Err(e) => ctx.print_error(&e),
            }
            return;
        }
        "trend" => {
            let period = match period_arg(rest) {
                Some(p) => p,
                None => return,
            };
            match stats_queries::monthly_attendance_trend(&ctx.conn, ctx.caller(), period) {
                Ok(points) => {
                    for p in &points {
                        let cols: Vec<String> = p.totals.iter().map(|t| format!("{} {}", t.label, t.total)).collect();
                        println!("  {:<9} {}", p.label, cols.join(" | "));
                    }
                }
                Err(e) => ctx.print_error(&e),
            }
            return;
        }
        _ => {
            println!("Usage: chart gender | age | trend [period] | services | school | courses [limit]");
            return;
        }
    };

    match rows {
        Ok(rows) => print_bars(&rows),
        Err(e) => ctx.print_error(&e),
    }
}
