use chrono::NaiveDateTime;

use crate::cli::context::CLIContext;
use crate::cli::period_arg;
use crate::model::*;
use crate::ops::*;
use crate::queries::*;
use crate::queries::attendance_queries::TypeSummary;

struct Entry {
    date: NaiveDateTime,
    attendance_type: AttendanceType,
    attended: Option<bool>,
    count: i64,
}

fn prompt_entry(ctx: &CLIContext) -> Option<Entry> {
    let date = match ctx.prompt_optional("Date (YYYY-MM-DD, default today): ") {
        Some(s) => CLIContext::parse_date(&s),
        None => Some(CLIContext::today()),
    };
    let date = match date.and_then(|d| d.and_hms_opt(0, 0, 0)) {
        Some(d) => d,
        None => {
            println!("Invalid date. Use YYYY-MM-DD.");
            return None;
        }
    };

    println!("Type:");
    for (i, t) in AttendanceType::ALL.iter().enumerate() {
        println!("  {}. {}", i + 1, t.label());
    }
    let attendance_type = match ctx.prompt("Type: ").and_then(|s| s.parse::<usize>().ok()) {
        Some(n) if (1..=AttendanceType::ALL.len()).contains(&n) => AttendanceType::ALL[n - 1],
        _ => {
            println!("Pick one of the listed numbers.");
            return None;
        }
    };

    let attended = if attendance_type == AttendanceType::NuevosAsistentes {
        Some(ctx.confirm("Did you attend too?"))
    } else {
        None
    };

    let count = match ctx.prompt("How many people: ").and_then(|s| s.parse::<i64>().ok()) {
        Some(c) => c,
        None => {
            println!("Count must be a number.");
            return None;
        }
    };

    Some(Entry { date, attendance_type, attended, count })
}

fn month_records(ctx: &CLIContext) -> Vec<AttendanceRecord> {
    attendance_queries::my_records(&ctx.conn, ctx.caller(), Period::containing(CLIContext::today()))
        .unwrap_or_default()
}

fn describe(r: &AttendanceRecord) -> String {
    let attended = match r.attended {
        Some(true) => ", attended",
        Some(false) => ", did not attend",
        None => "",
    };
    format!("{} {} x{}{} (total {})", r.date, r.attendance_type.label(), r.count, attended, r.total())
}

fn find_record(ctx: &CLIContext, args: &str, usage: &str) -> Option<AttendanceRecord> {
    let n = match args.trim().parse::<usize>() {
        Ok(n) => n,
        Err(_) => {
            println!("Usage: {}", usage);
            return None;
        }
    };
    let records = month_records(ctx);
    let record = records.get(n.wrapping_sub(1)).cloned();
    if record.is_none() {
        println!("No record numbered {} this month. See 'records'.", n);
    }
    record
}

pub fn record(ctx: &CLIContext) {
    let entry = match prompt_entry(ctx) {
        Some(e) => e,
        None => return,
    };
    match attendance_ops::record_attendance(
        &ctx.conn,
        ctx.caller(),
        entry.date,
        entry.attendance_type,
        entry.attended,
        entry.count,
        CLIContext::now(),
    ) {
        Ok(r) => println!("Recorded: {}", describe(&r)),
        Err(e) => ctx.print_error(&e),
    }
}

pub fn records(ctx: &CLIContext, args: &str) {
    let period = match period_arg(args) {
        Some(p) => p,
        None => return,
    };
    match attendance_queries::my_records(&ctx.conn, ctx.caller(), period) {
        Ok(list) if list.is_empty() => println!("No records in this period."),
        Ok(list) => {
            println!("Records ({}):", list.len());
            for (i, r) in list.iter().enumerate() {
                println!("  {}. {}", i + 1, describe(r));
            }
        }
        Err(e) => ctx.print_error(&e),
    }
}

pub fn edit(ctx: &CLIContext, args: &str) {
    let record = match find_record(ctx, args, "edit-record <n>") {
        Some(r) => r,
        None => return,
    };
    println!("Editing: {}", describe(&record));
    let entry = match prompt_entry(ctx) {
        Some(e) => e,
        None => return,
    };
    match attendance_ops::update_attendance(
        &ctx.conn,
        ctx.caller(),
        record.id,
        entry.date,
        entry.attendance_type,
        entry.attended,
        entry.count,
    ) {
        Ok(r) => println!("Updated: {}", describe(&r)),
        Err(e) => ctx.print_error(&e),
    }
}

pub fn delete(ctx: &CLIContext, args: &str) {
    let record = match find_record(ctx, args, "delete-record <n>") {
        Some(r) => r,
        None => return,
    };
    if !ctx.confirm(&format!("Delete {}?", describe(&record))) {
        return;
    }
    match attendance_ops::delete_attendance(&ctx.conn, ctx.caller(), record.id) {
        Ok(()) => println!("Deleted."),
        Err(e) => ctx.print_error(&e),
    }
}

fn print_summaries(summaries: &[TypeSummary]) {
    for s in summaries {
        println!(
            "  {:<18} {:>5}  (H {} / M {}, {} records)",
            s.label, s.totals.total, s.totals.male, s.totals.female, s.records
        );
    }
}

pub fn my_report(ctx: &CLIContext, args: &str) {
    let period = match period_arg(args) {
        Some(p) => p,
        None => return,
    };
    match attendance_queries::my_monthly_report(&ctx.conn, ctx.caller(), period) {
        Ok(report) => {
            println!();
            println!("Report {} to {}", report.from, report.to.pred_opt().unwrap_or(report.to));
            print_summaries(&report.summaries);
            println!("  Total: {}", report.grand_total.total);
            println!();
        }
        Err(e) => ctx.print_error(&e),
    }
}

pub fn group_report(ctx: &CLIContext, args: &str) {
    let period = match period_arg(args) {
        Some(p) => p,
        None => return,
    };
    match attendance_queries::group_attendance_report(&ctx.conn, ctx.caller(), period) {
        Ok(report) => {
            println!();
            println!("Group report {} to {}", report.from, report.to.pred_opt().unwrap_or(report.to));
            print_summaries(&report.group);
            println!("  Disciples total: {}", report.disciples_total);
            println!("  My total: {}", report.my_total);
            if !report.per_disciple.is_empty() {
                println!("  Per disciple:");
                for d in &report.per_disciple {
                    println!("    {}: {}", d.name, d.total);
                }
            }
            println!();
        }
        Err(e) => ctx.print_error(&e),
    }
}
