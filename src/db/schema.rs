use rusqlite::Connection;

use crate::error::AppResult;

/// Initialize the database schema. Creates all tables and lookup indexes if
/// they don't exist.
pub fn initialize(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS services (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY NOT NULL,
            auth_subject TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            email TEXT NOT NULL DEFAULT '',
            phone TEXT,
            birth_date TEXT,
            gender TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'Member',
            leader_id TEXT REFERENCES users(id),
            service_id TEXT REFERENCES services(id),
            is_active_in_school INTEGER NOT NULL DEFAULT 0,
            is_admin INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_users_leader ON users(leader_id);
        CREATE INDEX IF NOT EXISTS idx_users_service ON users(service_id);

        CREATE TABLE IF NOT EXISTS courses (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            description TEXT,
            start_date TEXT,
            end_date TEXT,
            duration_weeks INTEGER NOT NULL DEFAULT 9,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS user_courses (
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            course_id TEXT NOT NULL REFERENCES courses(id),
            position INTEGER NOT NULL,
            PRIMARY KEY (user_id, course_id)
        );
        CREATE INDEX IF NOT EXISTS idx_user_courses_course ON user_courses(course_id);

        CREATE TABLE IF NOT EXISTS course_progress (
            id TEXT PRIMARY KEY NOT NULL,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            course_id TEXT NOT NULL REFERENCES courses(id),
            completed_work_and_exam INTEGER NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL,
            UNIQUE(user_id, course_id)
        );

        CREATE TABLE IF NOT EXISTS course_progress_weeks (
            progress_id TEXT NOT NULL REFERENCES course_progress(id) ON DELETE CASCADE,
            week INTEGER NOT NULL,
            PRIMARY KEY (progress_id, week)
        );

        CREATE TABLE IF NOT EXISTS connection_groups (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            address TEXT NOT NULL,
            district TEXT NOT NULL,
            min_age INTEGER,
            max_age INTEGER,
            day TEXT NOT NULL,
            time TEXT NOT NULL,
            invitation_code TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS group_leaders (
            group_id TEXT NOT NULL REFERENCES connection_groups(id) ON DELETE CASCADE,
            user_id TEXT NOT NULL REFERENCES users(id),
            position INTEGER NOT NULL,
            PRIMARY KEY (group_id, user_id)
        );
        CREATE INDEX IF NOT EXISTS idx_group_leaders_user ON group_leaders(user_id);

        CREATE TABLE IF NOT EXISTS group_disciples (
            group_id TEXT NOT NULL REFERENCES connection_groups(id) ON DELETE CASCADE,
            user_id TEXT NOT NULL REFERENCES users(id),
            position INTEGER NOT NULL,
            PRIMARY KEY (group_id, user_id)
        );
        CREATE INDEX IF NOT EXISTS idx_group_disciples_user ON group_disciples(user_id);

        CREATE TABLE IF NOT EXISTS activities (
            id TEXT PRIMARY KEY NOT NULL,
            group_id TEXT NOT NULL REFERENCES connection_groups(id),
            name TEXT NOT NULL,
            address TEXT NOT NULL,
            date_time TEXT NOT NULL,
            description TEXT NOT NULL,
            created_by TEXT NOT NULL REFERENCES users(id),
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_activities_group ON activities(group_id);

        CREATE TABLE IF NOT EXISTS activity_responses (
            id TEXT PRIMARY KEY NOT NULL,
            activity_id TEXT NOT NULL REFERENCES activities(id),
            user_id TEXT NOT NULL REFERENCES users(id),
            status TEXT NOT NULL,
            responded_at TEXT NOT NULL,
            UNIQUE(activity_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS attendance_records (
            id TEXT PRIMARY KEY NOT NULL,
            user_id TEXT NOT NULL REFERENCES users(id),
            date TEXT NOT NULL,
            attendance_type TEXT NOT NULL,
            attended INTEGER,
            count INTEGER NOT NULL,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_attendance_user_date ON attendance_records(user_id, date);
        ",
    )?;
    Ok(())
}

/// Create an in-memory connection for testing.
pub fn test_connection() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    initialize(&conn).unwrap();
    conn
}
