use std::path::PathBuf;

use conexion::config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut args = std::env::args().skip(1);
    let mut db_path: Option<PathBuf> = None;
    let mut import_path: Option<PathBuf> = None;
    let mut subject = config.subject.clone();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--file" | "-f" => {
                db_path = args.next().map(PathBuf::from);
                if db_path.is_none() {
                    eprintln!("Error: --file requires a path argument");
                    std::process::exit(1);
                }
            }
            "--import" => {
                import_path = args.next().map(PathBuf::from);
                if import_path.is_none() {
                    eprintln!("Error: --import requires a JSON file path");
                    std::process::exit(1);
                }
            }
            "--as" => {
                subject = args.next();
                if subject.is_none() {
                    eprintln!("Error: --as requires an auth subject");
                    std::process::exit(1);
                }
            }
            "--help" | "-h" => {
                println!("Conexion - church community manager");
                println!();
                println!("Usage: conexion [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -f, --file <PATH>      Database file path (default: $CONEXION_DB or .data/conexion.db)");
                println!("  --import <JSON_PATH>   Seed users, services and courses from a JSON export");
                println!("  --as <SUBJECT>         Act as this auth subject (default: $CONEXION_SUBJECT)");
                println!("  -h, --help             Show this help");
                return;
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                eprintln!("Use --help for usage information.");
                std::process::exit(1);
            }
        }
    }

    let db_path = db_path.unwrap_or(config.db_path);
    if let Some(dir) = db_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!("Error: cannot create {}: {}", dir.display(), e);
            std::process::exit(1);
        }
    }

    if let Some(json_path) = import_path {
        println!("Importing from {}...", json_path.display());
        match conexion::migrate::import_json(&json_path, &db_path) {
            Ok(stats) => {
                println!("Import complete!");
                println!("  Services: {}", stats.services);
                println!("  Courses: {}", stats.courses);
                println!("  Users: {}", stats.users);
                println!("  Skipped: {}", stats.skipped);
                println!("  Placed in a group: {}", stats.linked);
            }
            Err(e) => {
                eprintln!("Import failed: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    conexion::cli::run(&db_path, subject.as_deref());
}
