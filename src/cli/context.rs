use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::Connection;
use std::io::{self, Write};

use crate::auth::Identity;
use crate::model::*;
use crate::queries::*;

pub struct CLIContext {
    pub conn: Connection,
    pub identity: Identity,
}

impl CLIContext {
    pub fn new(conn: Connection, identity: Identity) -> Self {
        Self { conn, identity }
    }

    pub fn caller(&self) -> Option<&Identity> {
        Some(&self.identity)
    }

    /// Prompt and read a line from stdin. Returns None on EOF.
    pub fn read_line(&self, prompt: &str) -> Option<String> {
        print!("{}", prompt);
        io::stdout().flush().ok();
        let mut buf = String::new();
        match io::stdin().read_line(&mut buf) {
            Ok(0) => None,
            Ok(_) => Some(buf.trim_end_matches('\n').trim_end_matches('\r').to_string()),
            Err(_) => None,
        }
    }

    /// Read a line, trimmed.
    pub fn prompt(&self, prompt: &str) -> Option<String> {
        self.read_line(prompt).map(|s| s.trim().to_string())
    }

    /// Prompt for an optional field. Empty input means "keep".
    pub fn prompt_optional(&self, prompt: &str) -> Option<String> {
        self.prompt(prompt).filter(|s| !s.is_empty())
    }

    pub fn confirm(&self, prompt: &str) -> bool {
        matches!(
            self.prompt(&format!("{} (y/n): ", prompt)).as_deref(),
            Some("y") | Some("Y") | Some("yes") | Some("s") | Some("si")
        )
    }

    pub fn now() -> NaiveDateTime {
        Local::now().naive_local()
    }

    pub fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    pub fn parse_date(s: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
    }

    pub fn parse_time(s: &str) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(s.trim(), "%H:%M").ok()
    }

    /// `YYYY-MM-DD HH:MM`
    pub fn parse_date_time(s: &str) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M").ok()
    }

    /// Pick one item from a list by 1-based number or by a name match.
    /// Prints why nothing was picked.
    pub fn pick<'a, T, F>(&self, items: &'a [T], query: &str, kind: &str, name_of: F) -> Option<&'a T>
    where
        F: Fn(&T) -> &str,
    {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        if let Ok(n) = query.parse::<usize>() {
            return match items.get(n.wrapping_sub(1)) {
                Some(item) => Some(item),
                None => {
                    println!("No {} numbered {}", kind, n);
                    None
                }
            };
        }

        let lower = query.to_lowercase();
        let matches: Vec<&T> = items
            .iter()
            .filter(|i| name_of(i).to_lowercase().contains(&lower))
            .collect();

        match matches.len() {
            0 => {
                println!("No {} found matching '{}'", kind, query);
                None
            }
            1 => Some(matches[0]),
            _ => {
                if let Some(exact) = matches.iter().find(|i| name_of(i).eq_ignore_ascii_case(query)) {
                    return Some(*exact);
                }
                println!("Multiple matches found:");
                for i in &matches {
                    println!("  {}", name_of(i));
                }
                println!("Please be more specific.");
                None
            }
        }
    }

    /// Groups the caller leads, then the one they belong to.
    pub fn my_groups(&self) -> Vec<group_queries::GroupDetails> {
        let mut groups = group_queries::get_groups_as_leader(&self.conn, self.caller()).unwrap_or_default();
        if let Ok(Some(g)) = group_queries::get_group_as_disciple(&self.conn, self.caller()) {
            groups.push(g);
        }
        groups
    }

    pub fn find_group(&self, args: &str) -> Option<group_queries::GroupDetails> {
        let groups = self.my_groups();
        if groups.len() == 1 && args.trim().is_empty() {
            return groups.into_iter().next();
        }
        self.pick(&groups, args, "group", |g| &g.group.name).cloned()
    }

    pub fn find_course(&self, args: &str) -> Option<Course> {
        let courses = course_queries::list_courses(&self.conn, self.caller()).unwrap_or_default();
        self.pick(&courses, args, "course", |c| &c.name).cloned()
    }

    pub fn find_service(&self, args: &str) -> Option<Service> {
        let services = service_queries::list_services(&self.conn, self.caller()).unwrap_or_default();
        self.pick(&services, args, "service", |s| &s.name).cloned()
    }

    /// Users the caller may reference: everyone for staff, else their disciples.
    pub fn find_user(&self, args: &str) -> Option<User> {
        let users = match user_queries::list_users(&self.conn, self.caller()) {
            Ok(all) => all,
            Err(_) => user_queries::my_disciples(&self.conn, self.caller()).unwrap_or_default(),
        };
        self.pick(&users, args, "user", |u| &u.name).cloned()
    }

    pub fn print_error(&self, e: &crate::error::AppError) {
        println!("Error: {}", e);
    }
}
