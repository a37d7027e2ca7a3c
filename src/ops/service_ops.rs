use rusqlite::Connection;
use tracing::info;

use crate::auth::{self, Identity};
use crate::db::{service_repo, user_repo};
use crate::error::{AppError, AppResult};
use crate::model::{Id, Service, User};
use crate::validation;

pub fn create_service(
    conn: &Connection,
    caller: Option<&Identity>,
    name: &str,
) -> AppResult<Service> {
    auth::require_admin(conn, caller)?;
    let valid_name = validation::non_blank(name, "name")?;

    if service_repo::find_by_name(conn, &valid_name)?.is_some() {
        return Err(AppError::AlreadyExists {
            entity_type: "Service".into(),
            identifier: valid_name,
        });
    }

    let service = Service::create(valid_name);
    service_repo::insert(conn, &service)?;
    info!(service_id = %service.id, "created service");
    Ok(service)
}

pub fn rename_service(
    conn: &Connection,
    caller: Option<&Identity>,
    service_id: Id<Service>,
    name: &str,
) -> AppResult<Service> {
    auth::require_admin(conn, caller)?;
    let mut service = service_repo::find_by_id(conn, service_id)?
        .ok_or_else(|| AppError::not_found("Service", service_id))?;

    let valid_name = validation::non_blank(name, "name")?;
    if let Some(existing) = service_repo::find_by_name(conn, &valid_name)? {
        if existing.id != service.id {
            return Err(AppError::AlreadyExists {
                entity_type: "Service".into(),
                identifier: valid_name,
            });
        }
    }

    service.name = valid_name;
    service_repo::update(conn, &service)?;
    info!(service_id = %service.id, "renamed service");
    Ok(service)
}

/// Deletes the service and clears it from every member serving in it.
pub fn delete_service(
    conn: &Connection,
    caller: Option<&Identity>,
    service_id: Id<Service>,
) -> AppResult<()> {
    auth::require_admin(conn, caller)?;
    service_repo::find_by_id(conn, service_id)?
        .ok_or_else(|| AppError::not_found("Service", service_id))?;

    let tx = conn.unchecked_transaction()?;
    let cleared = user_repo::clear_service(&tx, service_id)?;
    service_repo::delete(&tx, service_id)?;
    tx.commit()?;

    info!(service_id = %service_id, members = cleared, "deleted service");
    Ok(())
}

/// A user serves in at most one service; assigning replaces the previous one.
pub fn assign_service(
    conn: &Connection,
    caller: Option<&Identity>,
    service_id: Id<Service>,
) -> AppResult<User> {
    let mut user = auth::current_user(conn, caller)?;
    service_repo::find_by_id(conn, service_id)?
        .ok_or_else(|| AppError::not_found("Service", service_id))?;

    user.service_id = Some(service_id);
    user_repo::update(conn, &user)?;
    info!(user_id = %user.id, service_id = %service_id, "assigned service");
    Ok(user)
}

pub fn leave_service(conn: &Connection, caller: Option<&Identity>) -> AppResult<User> {
    let mut user = auth::current_user(conn, caller)?;
    user.service_id = None;
    user_repo::update(conn, &user)?;
    info!(user_id = %user.id, "left service");
    Ok(user)
}
