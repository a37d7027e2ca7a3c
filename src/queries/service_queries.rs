use rusqlite::Connection;

use crate::auth::{self, Identity};
use crate::db::{service_repo, user_repo};
use crate::error::{AppError, AppResult};
use crate::model::{Id, Service, User};

pub fn list_services(conn: &Connection, caller: Option<&Identity>) -> AppResult<Vec<Service>> {
    auth::current_user(conn, caller)?;
    service_repo::find_all(conn)
}

pub fn service_members(
    conn: &Connection,
    caller: Option<&Identity>,
    service_id: Id<Service>,
) -> AppResult<Vec<User>> {
    auth::current_user(conn, caller)?;
    service_repo::find_by_id(conn, service_id)?
        .ok_or_else(|| AppError::not_found("Service", service_id))?;
    user_repo::find_by_service(conn, service_id)
}
